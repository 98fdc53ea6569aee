//! Vertical shorts worker binary.
//!
//! Triggers one run with the environment's configuration and waits for it.

use anyhow::Context;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use vshorts_models::JobStatus;
use vshorts_worker::{JobController, RunProcessor, Trigger, WorkerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env().add_directive("vshorts=info".parse()?);

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }

    info!("Starting vshorts-worker");

    let config = WorkerConfig::from_env().context("invalid worker configuration")?;
    info!("Worker config: {:?}", config);

    if let Err(e) = vshorts_media::check_ffmpeg() {
        warn!("{}", e);
    }

    let controller = JobController::new(RunProcessor::from_config(config));
    let handle = match controller.trigger() {
        Trigger::Started(handle) => handle,
        Trigger::AlreadyProcessing(record) => {
            info!(progress = record.progress, "Run already in progress");
            return Ok(());
        }
    };

    let mut updates = handle.subscribe();
    let progress_log = tokio::spawn(async move {
        let mut last = 0;
        while updates.changed().await.is_ok() {
            let progress = updates.borrow_and_update().progress;
            if progress != last {
                info!(progress, "Progress");
                last = progress;
            }
        }
    });

    let record = handle.wait().await;
    progress_log.abort();

    match record.status {
        JobStatus::Completed => {
            if let Some(output) = &record.output {
                info!(output = %output.display(), "Worker finished");
            }
            Ok(())
        }
        _ => {
            let message = record.error.unwrap_or_else(|| "unknown error".to_string());
            error!("Run failed: {}", message);
            anyhow::bail!(message)
        }
    }
}
