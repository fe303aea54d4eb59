use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use treemirror::{Config, Dispatcher, Job, JobEvent, JobStatus, LocalStore};

/// Mirror a directory tree onto a destination, once or on a schedule.
#[derive(Debug, Parser)]
#[command(name = "treemirror", version, about)]
struct Cli {
    /// Source directory to mirror from
    source: PathBuf,

    /// Destination directory to mirror onto
    destination: PathBuf,

    /// Delete destination files that have no source counterpart
    #[arg(long)]
    delete_extra: bool,

    /// Keep running and re-sync every N seconds (Ctrl-C to stop)
    #[arg(long, value_name = "SECONDS")]
    interval: Option<u64>,

    /// Per-run time budget in seconds
    #[arg(long, default_value_t = 1800, value_name = "SECONDS")]
    timeout: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    info!(version = treemirror::VERSION, "treemirror starting");

    let config = Config {
        run_timeout_secs: cli.timeout,
        delete_extra_files: cli.delete_extra,
        ..Config::default()
    };
    config.validate()?;

    let (dispatcher, mut events) = Dispatcher::new(&config);
    let job = Job::new(
        "mirror",
        &cli.source,
        &cli.destination,
        Arc::new(LocalStore::new()),
    )
    .with_delete_extra_files(cli.delete_extra);
    dispatcher.register(job).await;

    match cli.interval {
        Some(secs) => {
            dispatcher.run_all().await;
            dispatcher.start_scheduler(std::time::Duration::from_secs(secs));

            loop {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {
                        info!("interrupt received, shutting down");
                        break;
                    }
                    event = events.recv() => {
                        match event {
                            Some(event) => log_event(&event),
                            None => break,
                        }
                    }
                }
            }
            dispatcher.stop().await;
            // Drain whatever completed during shutdown.
            while let Some(event) = events.recv().await {
                log_event(&event);
            }
            Ok(())
        }
        None => {
            dispatcher.run_now("mirror").await?;
            let event = events.recv().await.context("event stream closed early")?;
            log_event(&event);
            dispatcher.stop().await;

            if event.status == JobStatus::Failed {
                anyhow::bail!("sync finished with errors");
            }
            Ok(())
        }
    }
}

fn log_event(event: &JobEvent) {
    match (&event.error, &event.outcome) {
        (None, Some(outcome)) => info!(
            job = %event.job,
            created = outcome.created,
            updated = outcome.updated,
            deleted = outcome.deleted,
            bytes = outcome.bytes_transferred,
            "sync completed"
        ),
        (Some(e), _) => error!(job = %event.job, error = %e, "sync failed"),
        _ => {}
    }
}
