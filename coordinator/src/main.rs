use anyhow::{Context, Result};
use clap::Parser;
use coordinator::{
    cli::{self, Args},
    coordinator::{pool, report::ReportSink, Coordinator},
};
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    utils::logger::init(&utils::logger::Config {
        level: "info".to_string(),
    })?;

    let args = Args::parse();
    let jobs = cli::build_jobs(&args)?;
    info!(jobs = jobs.len(), workers = args.workers, "batch ready");

    std::fs::create_dir_all(&args.results_dst)
        .with_context(|| format!("create {}", args.results_dst.display()))?;

    let listener = TcpListener::bind(&args.listen)
        .await
        .with_context(|| format!("bind {}", args.listen))?;
    let links = pool::bootstrap(listener, args.workers).await?;

    let mut sink = ReportSink::new(&args.output_separator);
    Coordinator::new(links).run(jobs, &mut sink).await?;

    let completed = sink.close();
    info!(completed, "batch complete");
    Ok(())
}
