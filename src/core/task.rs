//=========================================================================
// Worker Task
//
// Background work whose progress is polled from the frame thread.
//
// Flow:
// ```text
//   worker thread                         frame thread
//   work(reporter) ──report(pct)──> [crossbeam channel] ──poll──> LoadTask
//                 <──cancelled flag (AtomicBool)────────── cancel()/drop
// ```
//
// Notes:
// The frame thread never blocks on the worker: progress is drained with
// try_recv once per poll. After cancel() the shared flag is raised and
// further reports are discarded on both ends, so a task that finishes
// after its owner left the loading state has no effect.
//
//=========================================================================

//=== Standard Library Imports ============================================

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

//=== External Crates =====================================================

use crossbeam_channel::{unbounded, Receiver, Sender, TryRecvError};
use log::{debug, error, info};

//=== Internal Modules ====================================================

use crate::core::state::{LoadTask, TaskError};

//=== ProgressReporter ====================================================

/// Handle the worker uses to publish progress.
#[derive(Debug, Clone)]
pub struct ProgressReporter {
    tx: Sender<f32>,
    cancelled: Arc<AtomicBool>,
}

impl ProgressReporter {
    /// Publishes progress in percent. Returns `false` once the task has been
    /// cancelled or its owner dropped; the worker should stop then.
    pub fn report(&self, percent: f32) -> bool {
        if self.is_cancelled() {
            return false;
        }
        self.tx.send(percent.clamp(0.0, 100.0)).is_ok()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

//=== WorkerTask ==========================================================

/// [`LoadTask`] backed by a named OS thread.
pub struct WorkerTask {
    name: String,
    rx: Receiver<f32>,
    cancelled: Arc<AtomicBool>,
    latest: f32,
    disconnected: bool,
    handle: thread::JoinHandle<()>,
}

impl WorkerTask {
    /// Runs `work` on a new thread named `name`.
    ///
    /// The worker should call [`ProgressReporter::report`] as it goes and
    /// finish with `report(100.0)`.
    pub fn spawn<F>(name: impl Into<String>, work: F) -> Result<Self, TaskError>
    where
        F: FnOnce(ProgressReporter) + Send + 'static,
    {
        let name = name.into();
        let (tx, rx) = unbounded();
        let cancelled = Arc::new(AtomicBool::new(false));
        let reporter = ProgressReporter {
            tx,
            cancelled: Arc::clone(&cancelled),
        };

        let handle = thread::Builder::new()
            .name(name.clone())
            .spawn(move || work(reporter))?;

        info!("Worker '{}' spawned", name);

        Ok(Self {
            name,
            rx,
            cancelled,
            latest: 0.0,
            disconnected: false,
            handle,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Whether the worker thread has returned.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Drains queued reports without blocking and keeps the latest value.
    fn drain(&mut self) {
        if self.is_cancelled() {
            return;
        }

        loop {
            match self.rx.try_recv() {
                Ok(percent) => self.latest = percent,
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if !self.disconnected && self.latest < 100.0 {
                        error!(
                            "Worker '{}' stopped at {:.0}% without finishing",
                            self.name, self.latest
                        );
                    }
                    self.disconnected = true;
                    break;
                }
            }
        }
    }
}

impl LoadTask for WorkerTask {
    fn percent_complete(&mut self) -> f32 {
        self.drain();
        self.latest
    }

    fn cancel(&mut self) {
        if !self.cancelled.swap(true, Ordering::AcqRel) {
            debug!("Worker '{}' cancelled at {:.0}%", self.name, self.latest);
        }
    }
}

impl Drop for WorkerTask {
    fn drop(&mut self) {
        // Detached: the worker observes the flag and winds down on its own
        self.cancel();
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
