//! Background classification worker
//!
//! Frame sampling must never wait on the model. The worker owns the monitor
//! and runs one classification at a time on the blocking pool. At most one
//! further request is queued; anything submitted while both slots are taken
//! is dropped and counted.

use crate::analysis::DrowsinessEstimate;
use crate::detector::FrameBatch;
use crate::{DmsError, DrowsinessMonitor};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, watch, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Result of offering a window to the worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Accepted,
    /// Worker busy with a full queue; the window was discarded
    Dropped,
}

#[derive(Debug, Default)]
struct Counters {
    submitted: AtomicU64,
    dropped: AtomicU64,
    completed: AtomicU64,
    failed: AtomicU64,
}

/// Snapshot of worker counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WorkerStats {
    pub submitted: u64,
    pub dropped: u64,
    pub completed: u64,
    pub failed: u64,
}

/// Cloneable submission side of the worker
#[derive(Clone)]
pub struct WorkerHandle {
    sender: mpsc::Sender<FrameBatch>,
    latest: watch::Receiver<Option<DrowsinessEstimate>>,
    counters: Arc<Counters>,
}

impl WorkerHandle {
    /// Offer a window without waiting
    pub fn submit(&self, frames: FrameBatch) -> Result<SubmitOutcome, DmsError> {
        self.counters.submitted.fetch_add(1, Ordering::Relaxed);
        match self.sender.try_send(frames) {
            Ok(()) => Ok(SubmitOutcome::Accepted),
            Err(mpsc::error::TrySendError::Full(_)) => {
                self.counters.dropped.fetch_add(1, Ordering::Relaxed);
                debug!("Classifier busy, dropping window");
                Ok(SubmitOutcome::Dropped)
            }
            Err(mpsc::error::TrySendError::Closed(_)) => Err(DmsError::WorkerStopped),
        }
    }

    /// Most recent successful estimate
    pub fn latest(&self) -> Option<DrowsinessEstimate> {
        self.latest.borrow().clone()
    }

    /// Receiver that is notified on every new estimate
    pub fn subscribe(&self) -> watch::Receiver<Option<DrowsinessEstimate>> {
        self.latest.clone()
    }

    pub fn stats(&self) -> WorkerStats {
        WorkerStats {
            submitted: self.counters.submitted.load(Ordering::Relaxed),
            dropped: self.counters.dropped.load(Ordering::Relaxed),
            completed: self.counters.completed.load(Ordering::Relaxed),
            failed: self.counters.failed.load(Ordering::Relaxed),
        }
    }
}

/// Owner of the worker task
pub struct ClassificationWorker {
    handle: WorkerHandle,
    shutdown: Arc<Notify>,
    task: JoinHandle<DrowsinessMonitor>,
}

impl ClassificationWorker {
    /// Move the monitor onto a background task. Must be called inside a
    /// Tokio runtime.
    pub fn spawn(monitor: DrowsinessMonitor) -> Self {
        let (sender, receiver) = mpsc::channel(1);
        let (publisher, latest) = watch::channel(None);
        let counters = Arc::new(Counters::default());
        let shutdown = Arc::new(Notify::new());

        let task = tokio::spawn(run(
            monitor,
            receiver,
            publisher,
            counters.clone(),
            shutdown.clone(),
        ));

        info!("Classification worker started");
        Self {
            handle: WorkerHandle {
                sender,
                latest,
                counters,
            },
            shutdown,
            task,
        }
    }

    pub fn handle(&self) -> WorkerHandle {
        self.handle.clone()
    }

    /// Stop the worker after the in-flight window and hand the monitor back.
    /// A queued window that has not started is discarded.
    pub async fn shutdown(self) -> Result<DrowsinessMonitor, DmsError> {
        self.shutdown.notify_one();
        self.task.await.map_err(|e| {
            error!("Classification worker panicked: {}", e);
            DmsError::WorkerStopped
        })
    }
}

async fn run(
    mut monitor: DrowsinessMonitor,
    mut receiver: mpsc::Receiver<FrameBatch>,
    publisher: watch::Sender<Option<DrowsinessEstimate>>,
    counters: Arc<Counters>,
    shutdown: Arc<Notify>,
) -> DrowsinessMonitor {
    loop {
        let frames = tokio::select! {
            biased;
            _ = shutdown.notified() => break,
            next = receiver.recv() => match next {
                Some(frames) => frames,
                None => break,
            },
        };

        let (returned, result) = match tokio::task::spawn_blocking(move || {
            let result = monitor.classify(frames);
            (monitor, result)
        })
        .await
        {
            Ok(pair) => pair,
            Err(e) => {
                // The monitor was lost with the panicking task
                error!("Classification task failed: {}", e);
                std::panic::resume_unwind(e.into_panic());
            }
        };
        monitor = returned;

        match result {
            Ok(estimate) => {
                counters.completed.fetch_add(1, Ordering::Relaxed);
                publisher.send_replace(Some(estimate));
            }
            Err(e) => {
                counters.failed.fetch_add(1, Ordering::Relaxed);
                warn!("Window classification failed: {}", e);
            }
        }
    }

    info!("Classification worker stopped");
    monitor
}
