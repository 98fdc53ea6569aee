//! Single-job controller.
//!
//! Holds the one [`JobRecord`] in a `watch` channel. A trigger either starts a
//! background run or, while one is in progress, returns the current snapshot
//! untouched. Only the owning run mutates the record.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn, Instrument};

use vshorts_models::{JobId, JobRecord};

use crate::error::{WorkerError, WorkerResult};
use crate::logging::JobLogger;
use crate::metrics;

/// Work executed by a triggered run.
#[async_trait]
pub trait JobRunner: Send + Sync + 'static {
    /// Run to completion, returning the final artifact path.
    async fn run(&self, job_id: &JobId, progress: ProgressReporter) -> WorkerResult<PathBuf>;
}

/// Monotonic progress updates for the record owned by one run.
#[derive(Clone)]
pub struct ProgressReporter {
    tx: Arc<watch::Sender<JobRecord>>,
}

impl ProgressReporter {
    fn new(tx: Arc<watch::Sender<JobRecord>>) -> Self {
        Self { tx }
    }

    /// Reporter over a private record, for runs outside a controller.
    pub fn detached(job_id: JobId) -> Self {
        let (tx, _) = watch::channel(JobRecord::started(job_id));
        Self::new(Arc::new(tx))
    }

    /// Raise progress to `percent`. Lower values are ignored.
    pub fn report(&self, percent: u8) {
        self.tx.send_if_modified(|record| record.advance(percent));
    }

    pub fn current(&self) -> u8 {
        self.tx.borrow().progress
    }
}

/// Outcome of [`JobController::trigger`].
#[derive(Debug)]
pub enum Trigger {
    Started(RunHandle),
    /// A run is already in progress; its snapshot is returned unchanged
    AlreadyProcessing(JobRecord),
}

/// Handle to a background run.
#[derive(Debug)]
pub struct RunHandle {
    pub job_id: JobId,
    status: watch::Receiver<JobRecord>,
    join: JoinHandle<()>,
}

impl RunHandle {
    /// Latest snapshot of the record.
    pub fn status(&self) -> JobRecord {
        self.status.borrow().clone()
    }

    /// Receiver for status changes.
    pub fn subscribe(&self) -> watch::Receiver<JobRecord> {
        self.status.clone()
    }

    /// Wait for the run to finish and return the terminal record.
    pub async fn wait(self) -> JobRecord {
        if let Err(e) = self.join.await {
            error!(job_id = %self.job_id, error = %e, "Run task failed to join");
        }
        self.status.borrow().clone()
    }
}

/// Owns the job record and starts runs.
pub struct JobController<R: JobRunner> {
    runner: Arc<R>,
    state: Arc<watch::Sender<JobRecord>>,
}

impl<R: JobRunner> JobController<R> {
    pub fn new(runner: R) -> Self {
        let (tx, _) = watch::channel(JobRecord::default());
        Self {
            runner: Arc::new(runner),
            state: Arc::new(tx),
        }
    }

    /// Current record snapshot.
    pub fn status(&self) -> JobRecord {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<JobRecord> {
        self.state.subscribe()
    }

    /// Start a run unless one is already processing.
    ///
    /// The check and the reset to processing/0 happen under the channel lock,
    /// so two concurrent triggers cannot both start.
    pub fn trigger(&self) -> Trigger {
        let job_id = JobId::new();
        let started = self.state.send_if_modified(|record| {
            if record.is_processing() {
                return false;
            }
            *record = JobRecord::started(job_id.clone());
            true
        });

        if !started {
            let snapshot = self.status();
            info!(progress = snapshot.progress, "Run already in progress, ignoring trigger");
            return Trigger::AlreadyProcessing(snapshot);
        }

        let status = self.state.subscribe();
        let join = self.spawn_run(job_id.clone());
        Trigger::Started(RunHandle {
            job_id,
            status,
            join,
        })
    }

    fn spawn_run(&self, job_id: JobId) -> JoinHandle<()> {
        let runner = Arc::clone(&self.runner);
        let state = Arc::clone(&self.state);
        let logger = JobLogger::new(&job_id, "generate_short");
        let span = logger.create_span();

        tokio::spawn(
            async move {
                logger.log_start("pipeline triggered");
                metrics::record_run_started();
                let started = Instant::now();

                let reporter = ProgressReporter::new(Arc::clone(&state));
                let run_id = job_id.clone();
                // Inner task so a panicking run still lands in the error state
                let result = match tokio::spawn(async move { runner.run(&run_id, reporter).await }).await {
                    Ok(result) => result,
                    Err(e) => Err(WorkerError::Internal(format!("run task aborted: {}", e))),
                };

                let elapsed = started.elapsed().as_secs_f64();
                match &result {
                    Ok(output) => {
                        logger.log_completion(&format!("{} ({:.1}s)", output.display(), elapsed));
                        metrics::record_run_finished("completed", elapsed);
                    }
                    Err(e) if e.is_soft_failure() => {
                        logger.log_warning(&e.job_message());
                        metrics::record_run_finished(e.kind(), elapsed);
                    }
                    Err(e) => {
                        logger.log_error(&e.job_message());
                        metrics::record_run_finished(e.kind(), elapsed);
                    }
                }

                state.send_modify(|record| apply_outcome(record, result));
            }
            .instrument(span),
        )
    }
}

/// Move a record to its terminal state.
fn apply_outcome(record: &mut JobRecord, result: WorkerResult<PathBuf>) {
    match result {
        Ok(output) => record.complete(output),
        Err(e) => {
            record.fail(e.job_message());
            if let WorkerError::IntegrityWarning { path, .. } = e {
                warn!(path = %path.display(), "Keeping undersized output");
                record.output = Some(path);
            }
        }
    }
}
