//! Temporary files of one run.
//!
//! Every intermediate a run creates is registered here and removed when the
//! run ends, on success, failure, timeout or cancellation. Removal happens in
//! `Drop`, so a run future that is dropped mid-pass still cleans up.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use vshorts_models::JobId;

#[derive(Debug)]
pub struct RunArtifacts {
    dir: PathBuf,
    files: Vec<PathBuf>,
    removed: bool,
}

impl RunArtifacts {
    /// Artifacts rooted at `<work_dir>/<job_id>`.
    pub fn new(work_dir: &Path, job_id: &JobId) -> Self {
        Self {
            dir: work_dir.join(job_id.as_str()),
            files: Vec::new(),
            removed: false,
        }
    }

    /// Create the run directory.
    pub async fn prepare(&self) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.dir).await
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path for the Pass-1 output of segment `index`, registered for cleanup.
    pub fn segment_path(&mut self, index: usize) -> PathBuf {
        self.track(self.dir.join(format!("segment_{:03}.mp4", index)))
    }

    /// Path for the concat manifest, registered for cleanup.
    pub fn manifest_path(&mut self) -> PathBuf {
        self.track(self.dir.join("concat_list.txt"))
    }

    /// Path for the concatenated intermediate, registered for cleanup.
    pub fn concat_path(&mut self) -> PathBuf {
        self.track(self.dir.join("concatenated.mp4"))
    }

    /// Path for the caption track, registered for cleanup.
    pub fn subtitles_path(&mut self) -> PathBuf {
        self.track(self.dir.join("subtitles.srt"))
    }

    /// Register any other path for cleanup. Returns it for convenience.
    pub fn track(&mut self, path: PathBuf) -> PathBuf {
        if !self.files.contains(&path) {
            self.files.push(path.clone());
        }
        path
    }

    /// Registered paths, in registration order.
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Remove every registered file and the run directory if it is empty.
    ///
    /// Returns the number of files removed. Safe to call more than once.
    pub fn cleanup(&mut self) -> usize {
        if self.removed {
            return 0;
        }
        self.removed = true;

        let mut removed = 0;
        for path in &self.files {
            match std::fs::remove_file(path) {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove temp file"),
            }
        }
        // Only succeeds when nothing else was left behind
        let _ = std::fs::remove_dir(&self.dir);

        debug!(dir = %self.dir.display(), removed, "Cleaned up run artifacts");
        removed
    }
}

impl Drop for RunArtifacts {
    fn drop(&mut self) {
        self.cleanup();
    }
}
