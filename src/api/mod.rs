pub(crate) mod anticheat;
pub(crate) mod errors;
pub(crate) mod exams;
pub(crate) mod handlers;
pub(crate) mod router;
pub(crate) mod transcripts;
pub(crate) mod uploads;
pub(crate) mod validation;
