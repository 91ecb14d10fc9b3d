//! Marshalling work onto the UI thread.
//!
//! The loader never runs callbacks itself; it hands them to a [`UiDispatcher`]
//! that queues them for whatever thread owns the UI. The stock implementation
//! is a channel whose receiving end, [`UiRunLoop`], is drained by that thread.

use tokio::sync::mpsc;

/// A unit of work to run on the UI thread.
pub type UiTask = Box<dyn FnOnce() + Send>;

/// "Run this on the UI thread" primitive.
pub trait UiDispatcher: Send + Sync {
    /// Queue `task` for the UI thread. Must not run it inline.
    fn dispatch(&self, task: UiTask);
}

/// Sending half of a UI channel.
#[derive(Clone)]
pub struct UiHandle {
    tx: mpsc::UnboundedSender<UiTask>,
}

impl UiDispatcher for UiHandle {
    fn dispatch(&self, task: UiTask) {
        if self.tx.send(task).is_err() {
            tracing::debug!("UI run loop is gone, dropping task");
        }
    }
}

/// Receiving half of a UI channel, owned by the UI thread.
pub struct UiRunLoop {
    rx: mpsc::UnboundedReceiver<UiTask>,
}

impl UiRunLoop {
    /// Run every task that is already queued, without waiting.
    ///
    /// Returns how many tasks ran.
    pub fn run_pending(&mut self) -> usize {
        let mut ran = 0;
        while let Ok(task) = self.rx.try_recv() {
            task();
            ran += 1;
        }
        ran
    }

    /// Wait for the next task and run it.
    ///
    /// Returns `false` once every [`UiHandle`] has been dropped.
    pub async fn run_next(&mut self) -> bool {
        match self.rx.recv().await {
            Some(task) => {
                task();
                true
            }
            None => false,
        }
    }

    /// Blocking variant of [`run_next`](Self::run_next) for non-async UI threads.
    ///
    /// Must not be called from inside an async runtime.
    pub fn blocking_run_next(&mut self) -> bool {
        match self.rx.blocking_recv() {
            Some(task) => {
                task();
                true
            }
            None => false,
        }
    }
}

/// Create a connected dispatcher / run loop pair.
pub fn ui_channel() -> (UiHandle, UiRunLoop) {
    let (tx, rx) = mpsc::unbounded_channel();
    (UiHandle { tx }, UiRunLoop { rx })
}
