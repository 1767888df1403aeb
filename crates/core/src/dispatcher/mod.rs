//! Background job dispatch.
//!
//! The request path hands pipeline runs to a [`Dispatcher`] and returns
//! immediately. A bounded channel connects it to the [`DispatchWorker`];
//! when the queue is full, submission fails synchronously instead of
//! silently dropping the job, and the caller decides how to surface that.

use std::future::Future;
use std::pin::Pin;

use thiserror::Error;
use tokio::sync::mpsc;

/// A queued unit of work.
pub type DispatchJob = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error("Dispatch queue is full")]
    QueueFull,

    #[error("Dispatcher is shut down")]
    Closed,
}

/// Cheap cloneable handle for submitting jobs.
#[derive(Clone)]
pub struct Dispatcher {
    tx: mpsc::Sender<DispatchJob>,
}

impl Dispatcher {
    /// Queue a job for background execution. Never blocks.
    pub fn submit<F>(&self, job: F) -> Result<(), DispatchError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.tx.try_send(Box::pin(job)).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => DispatchError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => DispatchError::Closed,
        })
    }
}

/// Consumes queued jobs. Runs until every [`Dispatcher`] handle is dropped
/// and the queue has drained.
pub struct DispatchWorker {
    rx: mpsc::Receiver<DispatchJob>,
}

impl DispatchWorker {
    pub async fn run(mut self) {
        tracing::info!("Dispatch worker started");

        while let Some(job) = self.rx.recv().await {
            // Each job runs in its own task so a panic inside one job
            // cannot take the worker loop down with it.
            if let Err(e) = tokio::spawn(job).await {
                tracing::error!("Dispatched job panicked: {}", e);
            }
        }

        tracing::info!("Dispatch worker shut down");
    }
}

/// Create a dispatcher and its worker with the given queue capacity.
pub fn channel(queue_size: usize) -> (Dispatcher, DispatchWorker) {
    let (tx, rx) = mpsc::channel(queue_size);
    (Dispatcher { tx }, DispatchWorker { rx })
}
