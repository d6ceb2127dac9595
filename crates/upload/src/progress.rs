//! Progress reporting for deployment runs.
//!
//! A passive observer: the scheduler pushes `(completed, total)` events
//! with `try_send` and never waits on the display, so a slow terminal
//! cannot serialize upload workers.

use std::io::Write;
use std::sync::{Arc, RwLock};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::types::DeployEvent;

/// Callback invoked with `(completed, total)` file counts.
pub type ProgressCallback = Box<dyn Fn(u64, u64) + Send + Sync>;

/// Consumes deploy events, re-rendering a status line and notifying
/// registered callbacks on every progress update.
pub struct ProgressReporter {
    callbacks: Arc<RwLock<Vec<ProgressCallback>>>,
    render: bool,
}

impl ProgressReporter {
    /// Creates a reporter. `render` controls the stderr status line
    /// (callbacks fire either way).
    pub fn new(render: bool) -> Self {
        Self {
            callbacks: Arc::new(RwLock::new(Vec::new())),
            render,
        }
    }

    /// Registers a progress callback.
    pub fn on_progress(&self, callback: ProgressCallback) {
        self.callbacks.write().unwrap().push(callback);
    }

    /// Spawns a task draining `events_rx` until the channel closes.
    ///
    /// Returns the join handle so callers can await the final render.
    pub fn attach(&self, mut events_rx: mpsc::Receiver<DeployEvent>) -> JoinHandle<()> {
        let callbacks = Arc::clone(&self.callbacks);
        let render = self.render;

        tokio::spawn(async move {
            let mut rendered = false;
            while let Some(event) = events_rx.recv().await {
                if let DeployEvent::Progress { completed, total } = event {
                    for cb in callbacks.read().unwrap().iter() {
                        cb(completed, total);
                    }
                    if render {
                        render_status_line(completed, total);
                        rendered = true;
                    }
                }
            }
            if rendered {
                let _ = writeln!(std::io::stderr());
            }
        })
    }
}

fn render_status_line(completed: u64, total: u64) {
    let mut err = std::io::stderr();
    let _ = write!(err, "\rUploading... ({completed}/{total})");
    let _ = err.flush();
}
