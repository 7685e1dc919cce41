#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = quizdesk_rust::run().await {
        eprintln!("quizdesk-rust fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
