//! The redraw task's only output: a request that the painter repaint.
//!
//! The painter runs on its own execution context and reads the latest
//! published state when it gets there. Requests carry no data and do not
//! queue; several requests before the painter wakes collapse into one.

use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::Notify;

/// Receiver of repaint requests.
pub trait RepaintSink: Send + Sync {
    /// Asks for a repaint. Must not block.
    fn request_repaint(&self);
}

impl<F> RepaintSink for F
where
    F: Fn() + Send + Sync,
{
    fn request_repaint(&self) {
        self()
    }
}

/// A coalescing repaint signal a painter task can await.
#[derive(Debug, Default)]
pub struct RepaintSignal {
    notify: Notify,
    requests: AtomicU64,
}

impl RepaintSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves once a repaint has been requested since the last wake-up.
    pub async fn wait(&self) {
        self.notify.notified().await;
    }

    /// Total requests received, including coalesced ones.
    pub fn requests(&self) -> u64 {
        self.requests.load(Ordering::Relaxed)
    }
}

impl RepaintSink for RepaintSignal {
    fn request_repaint(&self) {
        self.requests.fetch_add(1, Ordering::Relaxed);
        self.notify.notify_one();
    }
}
