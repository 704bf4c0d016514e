pub(crate) mod config;
pub(crate) mod observability;
pub(crate) mod shutdown;
pub(crate) mod state;
