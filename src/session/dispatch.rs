//! UI Context Dispatch
//!
//! Widget state may only be read on the host's UI context. Work that needs it
//! is handed off through a single-consumer queue instead of running on the
//! event-delivery path.

use tokio::sync::{mpsc, oneshot};
use tracing::debug;

/// Deferred unit of work for the UI context
pub type UiTask = Box<dyn FnOnce() + Send + 'static>;

/// Schedules work on the UI-affinity context
///
/// Fire-and-forget: the task runs later, possibly after further events have
/// already been delivered.
pub trait UiExecutor: Send + Sync {
    fn run_on_ui(&self, task: UiTask);
}

/// Producer half of the UI queue
#[derive(Clone)]
pub struct UiQueue {
    tx: mpsc::UnboundedSender<UiTask>,
}

/// Consumer half of the UI queue; owned by whatever drives the UI context
pub struct UiContext {
    rx: mpsc::UnboundedReceiver<UiTask>,
}

impl UiQueue {
    pub fn new() -> (Self, UiContext) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, UiContext { rx })
    }

    /// Resolves once every task queued before this call has run
    pub fn barrier(&self) -> oneshot::Receiver<()> {
        let (tx, rx) = oneshot::channel();
        self.run_on_ui(Box::new(move || {
            let _ = tx.send(());
        }));
        rx
    }
}

impl UiExecutor for UiQueue {
    fn run_on_ui(&self, task: UiTask) {
        if self.tx.send(task).is_err() {
            debug!("UI context is gone, dropping task");
        }
    }
}

impl UiContext {
    /// Run tasks until every queue handle is dropped
    pub async fn run(mut self) {
        while let Some(task) = self.rx.recv().await {
            task();
        }
        debug!("UI context stopped");
    }

    /// Run whatever is queued right now, including tasks queued by those
    /// tasks. Returns how many ran.
    pub fn run_pending(&mut self) -> usize {
        let mut ran = 0;
        while let Ok(task) = self.rx.try_recv() {
            task();
            ran += 1;
        }
        ran
    }
}
