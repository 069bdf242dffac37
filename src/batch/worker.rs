//! Background directory scans.

use std::path::PathBuf;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{unbounded, Receiver};

use crate::host::HostApplication;

use super::walker::{BatchReport, FileReport, WalkOptions, Walker};

/// Progress of a background scan.
#[derive(Debug, Clone)]
pub enum BatchEvent {
    /// Candidate files were listed
    Started {
        /// Number of files to process
        total: usize,
    },
    /// One file was processed or skipped
    FileDone(FileReport),
    /// The scan completed
    Finished(BatchReport),
    /// The directory could not be listed
    Failed(String),
}

/// Run a directory scan on one worker thread.
///
/// Events arrive in order and end with `Finished` or `Failed`. A started scan
/// cannot be cancelled; dropping the receiver only discards its events.
pub fn spawn_walk<A>(
    app: Arc<A>,
    dir: PathBuf,
    options: WalkOptions,
) -> (Receiver<BatchEvent>, JoinHandle<()>)
where
    A: HostApplication + 'static,
{
    let (tx, rx) = unbounded();
    let handle = thread::spawn(move || {
        let walker = Walker::new(app.as_ref(), options);
        let total = match walker.list(&dir) {
            Ok(names) => names.len(),
            Err(e) => {
                log::error!("Cannot list {}: {}", dir.display(), e);
                let _ = tx.send(BatchEvent::Failed(e.to_string()));
                return;
            }
        };
        let _ = tx.send(BatchEvent::Started { total });

        let result = walker.scan_with(&dir, |report| {
            let _ = tx.send(BatchEvent::FileDone(report.clone()));
        });
        let event = match result {
            Ok(report) => BatchEvent::Finished(report),
            Err(e) => BatchEvent::Failed(e.to_string()),
        };
        let _ = tx.send(event);
        log::debug!("Scan worker for {} finished", dir.display());
    });
    (rx, handle)
}
