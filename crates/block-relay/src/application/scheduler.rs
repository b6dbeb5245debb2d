//! # Task Scheduler
//!
//! Runs ticking tasks on the tokio worker pool until shutdown is signalled.
//!
//! A tick is never cancelled midway: shutdown is observed between ticks and
//! while a task waits out its delay, so in-flight boundary calls complete.

use std::io;
use tokio::runtime::{Builder, Runtime};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

use super::tasks::TickingTask;

/// Multi-threaded tokio runtime with `worker_threads` workers.
pub fn build_runtime(worker_threads: usize) -> io::Result<Runtime> {
    Builder::new_multi_thread()
        .worker_threads(worker_threads.max(1))
        .thread_name("relay-worker")
        .enable_all()
        .build()
}

/// Set of spawned tasks sharing one shutdown signal.
pub struct TaskPool {
    shutdown_tx: watch::Sender<bool>,
    handles: Vec<(&'static str, JoinHandle<()>)>,
}

impl Default for TaskPool {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskPool {
    /// Empty pool.
    pub fn new() -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            shutdown_tx,
            handles: Vec::new(),
        }
    }

    /// Spawn `task` on the current runtime.
    pub fn spawn<T>(&mut self, task: T)
    where
        T: TickingTask + 'static,
    {
        let name = task.name();
        let shutdown = self.shutdown_tx.subscribe();
        let handle = tokio::spawn(drive(task, shutdown));
        self.handles.push((name, handle));
    }

    /// Number of spawned tasks, finished ones included.
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// True if nothing was spawned.
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Names of tasks that are still running.
    pub fn running(&self) -> Vec<&'static str> {
        self.handles
            .iter()
            .filter(|(_, handle)| !handle.is_finished())
            .map(|(name, _)| *name)
            .collect()
    }

    /// Signal shutdown and wait for every task to finish its current tick.
    pub async fn shutdown(mut self) {
        info!("[scheduler] Shutting down {} tasks", self.handles.len());
        self.signal_shutdown();
        for (name, handle) in std::mem::take(&mut self.handles) {
            if let Err(e) = handle.await {
                error!("[scheduler] Task {} did not stop cleanly: {}", name, e);
            }
        }
    }

    fn signal_shutdown(&self) {
        // Receivers are held by the spawned tasks; an error only means all
        // of them have already exited.
        let _ = self.shutdown_tx.send(true);
    }
}

/// Dropping the pool stops its tasks at their next tick boundary without
/// waiting for them.
impl Drop for TaskPool {
    fn drop(&mut self) {
        self.signal_shutdown();
    }
}

async fn drive<T: TickingTask>(mut task: T, mut shutdown: watch::Receiver<bool>) {
    let name = task.name();
    info!("[scheduler] Task {} started", name);

    loop {
        if *shutdown.borrow() {
            break;
        }

        if let Err(e) = task.tick().await {
            error!("[scheduler] Task {} stopped: {}", name, e);
            break;
        }

        let delay = task.next_delay();
        if delay.is_zero() {
            tokio::task::yield_now().await;
            if shutdown.has_changed().is_err() {
                break;
            }
            continue;
        }

        tokio::select! {
            changed = shutdown.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            _ = tokio::time::sleep(delay) => {}
        }
    }

    info!("[scheduler] Task {} exited", name);
}
