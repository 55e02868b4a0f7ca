//! Age-based cleanup of the storage directories
//!
//! Cleanup is strictly best effort: nothing here returns an error. Races with
//! requests that delete their own intermediates are expected and harmless.

use crate::config::StorageConfig;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tracing::{debug, info, warn};

/// Outcome of one cleanup pass
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CleanupReport {
    /// Files removed for being older than the age limit
    pub deleted: usize,
    /// Entries that vanished or could not be inspected
    pub skipped: usize,
    /// Deletions that failed (permissions, ...)
    pub failed: usize,
}

impl std::ops::AddAssign for CleanupReport {
    fn add_assign(&mut self, rhs: Self) {
        self.deleted += rhs.deleted;
        self.skipped += rhs.skipped;
        self.failed += rhs.failed;
    }
}

/// Deletes stored files once they exceed the configured age
#[derive(Debug, Clone)]
pub struct Janitor {
    directories: Vec<PathBuf>,
    max_age: Duration,
}

impl Janitor {
    #[must_use]
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            directories: config
                .directories()
                .iter()
                .map(|d| d.to_path_buf())
                .collect(),
            max_age: config.max_age(),
        }
    }

    /// Delete regular files in `directory` (non-recursive) older than `max_age`
    pub fn cleanup(directory: &Path, max_age: Duration) -> CleanupReport {
        let mut report = CleanupReport::default();
        let now = SystemTime::now();

        let entries = match fs::read_dir(directory) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(
                    "Error listing directory {} for cleanup: {}",
                    directory.display(),
                    e
                );
                return report;
            },
        };

        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Failed to read entry in {}: {}", directory.display(), e);
                    report.skipped += 1;
                    continue;
                },
            };
            let path = entry.path();

            let metadata = match fs::metadata(&path) {
                Ok(metadata) => metadata,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    debug!("File vanished during cleanup check: {}", path.display());
                    report.skipped += 1;
                    continue;
                },
                Err(e) => {
                    warn!("Cannot inspect {} during cleanup: {}", path.display(), e);
                    report.skipped += 1;
                    continue;
                },
            };
            if !metadata.is_file() {
                continue;
            }

            let age = metadata
                .modified()
                .ok()
                .and_then(|mtime| now.duration_since(mtime).ok())
                .unwrap_or_default();
            if age <= max_age {
                continue;
            }

            match fs::remove_file(&path) {
                Ok(()) => {
                    debug!("Deleted old file: {}", path.display());
                    report.deleted += 1;
                },
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    debug!("File already gone: {}", path.display());
                    report.skipped += 1;
                },
                Err(e) => {
                    warn!("Error deleting file {}: {}", path.display(), e);
                    report.failed += 1;
                },
            }
        }

        if report.deleted == 0 {
            debug!("No old files found to clean in {}", directory.display());
        } else {
            info!(
                "Cleaned up {} old files from {}",
                report.deleted,
                directory.display()
            );
        }
        report
    }

    /// Run [`Janitor::cleanup`] over every storage directory
    pub fn sweep(&self) -> CleanupReport {
        let mut total = CleanupReport::default();
        for dir in &self.directories {
            total += Self::cleanup(dir, self.max_age);
        }
        total
    }

    /// Sweep on a fixed interval until the runtime shuts down
    ///
    /// The first sweep runs immediately. Each sweep runs on the blocking pool
    /// so directory scans never stall request handling.
    pub fn spawn_periodic(self: Arc<Self>, interval: Duration) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let janitor = Arc::clone(&self);
                match tokio::task::spawn_blocking(move || janitor.sweep()).await {
                    Ok(report) => debug!(?report, "Storage sweep finished"),
                    Err(e) => warn!("Storage sweep task failed: {}", e),
                }
            }
        })
    }
}
