//! Progress reporting and cooperative cancellation for batch runs.
//!
//! The orchestrator only emits `(completed, total)` notifications; pacing or
//! animation belongs to whoever consumes them.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// One progress notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchProgress {
    pub completed: usize,
    pub total: usize,
}

/// Receives progress for a running batch.
///
/// `report()` is called once per completed property on a cache miss, from
/// whichever thread finished it. Implementations must be fast and must not
/// block; reported `completed` counts never decrease.
pub trait ProgressSink: Send + Sync {
    fn report(&self, completed: usize, total: usize);
}

/// Discards every notification.
#[derive(Clone, Default)]
pub struct NoOpProgressSink;

impl ProgressSink for NoOpProgressSink {
    fn report(&self, _completed: usize, _total: usize) {}
}

/// Adapts a closure into a sink.
pub struct FnProgressSink<F>(pub F);

impl<F> ProgressSink for FnProgressSink<F>
where
    F: Fn(usize, usize) + Send + Sync,
{
    fn report(&self, completed: usize, total: usize) {
        (self.0)(completed, total)
    }
}

/// Forwards notifications into a tokio channel, e.g. for a UI task.
#[derive(Clone)]
pub struct ChannelProgressSink {
    sender: mpsc::UnboundedSender<BatchProgress>,
}

impl ChannelProgressSink {
    pub fn new(sender: mpsc::UnboundedSender<BatchProgress>) -> Self {
        Self { sender }
    }

    /// Creates a sink together with the receiving end.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<BatchProgress>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self::new(sender), receiver)
    }
}

impl ProgressSink for ChannelProgressSink {
    fn report(&self, completed: usize, total: usize) {
        // A dropped receiver only means nobody is watching
        let _ = self.sender.send(BatchProgress { completed, total });
    }
}

/// Mock sink for testing - collects notifications.
#[derive(Clone, Default)]
pub struct MockProgressSink {
    events: Arc<Mutex<Vec<BatchProgress>>>,
}

impl MockProgressSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<BatchProgress> {
        self.events.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn len(&self) -> usize {
        self.events.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ProgressSink for MockProgressSink {
    fn report(&self, completed: usize, total: usize) {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(BatchProgress { completed, total });
    }
}

/// Shared flag checked before each property is started.
#[derive(Clone, Debug, Default)]
pub struct CancellationFlag {
    cancelled: Arc<AtomicBool>,
}

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}
