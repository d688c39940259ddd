//! Single-threaded execution context for blocking generation work.
//!
//! One dedicated OS thread drains a FIFO queue, so at most one task runs at a
//! time and tasks finish in submission order. Submitters get a [`TaskHandle`]
//! they can await without tying up an async runtime thread.

use parking_lot::Mutex;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use tokio::sync::{mpsc, oneshot};

type Task = Box<dyn FnOnce() + Send + 'static>;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExecutorError {
    #[error("generation queue is full ({0} jobs pending)")]
    Busy(usize),
    #[error("generation worker has shut down")]
    Closed,
    #[error("generation task panicked: {0}")]
    Panicked(String),
}

/// Completion of a submitted task
pub struct TaskHandle<T> {
    receiver: oneshot::Receiver<Result<T, ExecutorError>>,
}

impl<T> TaskHandle<T> {
    pub async fn wait(self) -> Result<T, ExecutorError> {
        self.receiver
            .await
            .unwrap_or(Err(ExecutorError::Closed))
    }
}

pub struct SingleWorkerExecutor {
    sender: Mutex<Option<mpsc::UnboundedSender<Task>>>,
    worker: Mutex<Option<thread::JoinHandle<()>>>,
    pending: Arc<AtomicUsize>,
    max_pending: usize,
}

impl SingleWorkerExecutor {
    /// Spawn the worker thread. `max_pending` bounds queued plus running tasks.
    pub fn new(name: &str, max_pending: usize) -> std::io::Result<Self> {
        let (sender, mut receiver) = mpsc::unbounded_channel::<Task>();

        let worker = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                tracing::debug!("Generation worker started");
                while let Some(task) = receiver.blocking_recv() {
                    task();
                }
                tracing::debug!("Generation worker stopped");
            })?;

        Ok(Self {
            sender: Mutex::new(Some(sender)),
            worker: Mutex::new(Some(worker)),
            pending: Arc::new(AtomicUsize::new(0)),
            max_pending: max_pending.max(1),
        })
    }

    /// Queue `work` behind everything submitted before it.
    ///
    /// A panic inside `work` is caught and reported through the handle; the
    /// worker keeps serving later tasks.
    pub fn submit<F, T>(&self, work: F) -> Result<TaskHandle<T>, ExecutorError>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let max_pending = self.max_pending;
        self.pending
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                (n < max_pending).then_some(n + 1)
            })
            .map_err(ExecutorError::Busy)?;

        let (tx, rx) = oneshot::channel();
        let pending = Arc::clone(&self.pending);
        let task: Task = Box::new(move || {
            let outcome = panic::catch_unwind(AssertUnwindSafe(work))
                .map_err(|payload| ExecutorError::Panicked(panic_message(payload.as_ref())));
            pending.fetch_sub(1, Ordering::SeqCst);
            // The submitter may have stopped listening
            let _ = tx.send(outcome);
        });

        let sent = match self.sender.lock().as_ref() {
            Some(sender) => sender.send(task).map_err(|_| ExecutorError::Closed),
            None => Err(ExecutorError::Closed),
        };
        if let Err(err) = sent {
            self.pending.fetch_sub(1, Ordering::SeqCst);
            return Err(err);
        }

        Ok(TaskHandle { receiver: rx })
    }

    /// Tasks queued or running
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    pub fn max_pending(&self) -> usize {
        self.max_pending
    }

    /// Stop accepting work, let the queue drain, and join the worker.
    ///
    /// Blocks until the last queued task has finished.
    pub fn shutdown(&self) {
        self.sender.lock().take();
        if let Some(worker) = self.worker.lock().take() {
            if worker.join().is_err() {
                tracing::error!("Generation worker exited abnormally");
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
