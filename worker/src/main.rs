use anyhow::Result;
use clap::Parser;
use tracing::info;
use worker::worker::Worker;

/// Tone-mapping worker process. Joins the coordinator's pool and executes
/// dispatched jobs until told to finish.
#[derive(Parser)]
struct Args {
    /// Address the coordinator is listening on.
    #[arg(long, default_value = "127.0.0.1:8388")]
    connect: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    utils::logger::init(&utils::logger::Config {
        level: "info".to_string(),
    })?;

    let args = Args::parse();
    info!(addr = %args.connect, "running worker");

    let mut worker = Worker::join(&args.connect).await?;
    worker.run().await
}
