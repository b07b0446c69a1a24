// src/exec/pool.rs

//! Bounded pool of workers for module tasks.
//!
//! Every submitted job runs as its own Tokio task but must first take one
//! of `max_concurrent` permits, which it holds until it is completely done
//! (including waiting for the child process to exit). Submitting never
//! blocks the caller.

use std::future::Future;
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::errors::{ModrunError, Result};
use crate::future::ModuleFuture;

#[derive(Debug, Clone)]
pub struct WorkerPool {
    handle: Handle,
    permits: Arc<Semaphore>,
    max_concurrent: usize,
}

impl WorkerPool {
    /// Create a pool on the current Tokio runtime.
    pub fn new(max_concurrent: usize) -> Result<Self> {
        let handle = Handle::try_current().map_err(|err| {
            ModrunError::Other(anyhow::anyhow!(
                "worker pool needs a running Tokio runtime: {err}"
            ))
        })?;
        Ok(Self::with_handle(handle, max_concurrent))
    }

    pub fn with_handle(handle: Handle, max_concurrent: usize) -> Self {
        let max_concurrent = max_concurrent.max(1);
        Self {
            handle,
            permits: Arc::new(Semaphore::new(max_concurrent)),
            max_concurrent,
        }
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Number of jobs currently holding a worker.
    pub fn active_count(&self) -> usize {
        self.max_concurrent - self.permits.available_permits()
    }

    /// Stop accepting work. Jobs still waiting for a worker are canceled.
    pub fn shutdown(&self) {
        debug!("worker pool shutting down");
        self.permits.close();
    }

    /// Schedule `job` once a worker is free.
    ///
    /// `future` is the handle the job reports to; it is canceled if the pool
    /// shuts down before the job got a worker.
    pub fn submit<F>(&self, future: ModuleFuture, job: F) -> JoinHandle<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let permits = Arc::clone(&self.permits);
        self.handle.spawn(async move {
            let Ok(_permit) = permits.acquire_owned().await else {
                warn!("worker pool shut down before task got a worker; canceling it");
                future.cancel();
                return;
            };
            job.await;
        })
    }
}
