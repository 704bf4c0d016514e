#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = viva_api::run().await {
        eprintln!("viva-api fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
