//! # Request Executor
//!
//! The execution-loop driver: takes requests off the queue, applies them to
//! their destinations and returns them to the pool.
//!
//! ## Frame Usage
//!
//! ```rust,ignore
//! loop {
//!     executor.drain()?;        // apply everything the control side sent
//!     update_transforms();      // read execute values
//!     render();
//! }
//! ```

use std::sync::Arc;

use crate::config::ExecutorConfig;
use crate::error::PoolResult;
use crate::memory::{RequestHandle, RequestPool};
use crate::property::DispatchOutcome;

use super::queue::RequestReceiver;

/// Counts from one `drain` or `run` call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DrainReport {
    /// Requests taken off the queue.
    pub dispatched: usize,
    /// Requests a property consumed.
    pub consumed: usize,
    /// Requests no property claimed.
    pub inert: usize,
    /// Requests rejected with a type mismatch.
    pub mismatched: usize,
}

impl DrainReport {
    fn record(&mut self, outcome: &DispatchOutcome) {
        self.dispatched += 1;
        match outcome {
            DispatchOutcome::Consumed { .. } => self.consumed += 1,
            DispatchOutcome::Inert => self.inert += 1,
            DispatchOutcome::Mismatched(_) => self.mismatched += 1,
        }
    }
}

/// Applies queued requests on the execution thread.
pub struct RequestExecutor {
    pool: Arc<RequestPool>,
    receiver: RequestReceiver,
    config: ExecutorConfig,
}

impl RequestExecutor {
    /// Creates an executor returning requests to `pool`.
    #[must_use]
    pub fn new(pool: Arc<RequestPool>, receiver: RequestReceiver, config: ExecutorConfig) -> Self {
        Self {
            pool,
            receiver,
            config,
        }
    }

    /// Number of requests waiting.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.receiver.len()
    }

    /// Applies one request and recycles it.
    ///
    /// # Errors
    ///
    /// [`PoolError::Uninitialized`](crate::PoolError::Uninitialized) if the
    /// pool was stopped while the request was in flight.
    ///
    /// # Panics
    ///
    /// Protocol violation if the request's destination is gone.
    pub fn execute(&self, request: RequestHandle) -> PoolResult<DispatchOutcome> {
        let outcome = request.apply();
        match &outcome {
            DispatchOutcome::Consumed { property } => {
                tracing::trace!(%request, property, "request applied");
            }
            DispatchOutcome::Inert => {
                tracing::trace!(%request, "request inert: no property matched");
            }
            DispatchOutcome::Mismatched(err) => {
                tracing::warn!(%request, %err, "request rejected");
            }
        }
        self.pool.recycle(request)?;
        Ok(outcome)
    }

    /// Applies queued requests without blocking.
    ///
    /// Stops when the queue is empty or `drain_budget` requests have been
    /// applied, whichever comes first.
    ///
    /// # Errors
    ///
    /// As [`RequestExecutor::execute`].
    pub fn drain(&self) -> PoolResult<DrainReport> {
        let budget = match self.config.drain_budget {
            0 => usize::MAX,
            n => n,
        };

        let mut report = DrainReport::default();
        while report.dispatched < budget {
            let Some(request) = self.receiver.try_recv() else {
                break;
            };
            let outcome = self.execute(request)?;
            report.record(&outcome);
        }
        Ok(report)
    }

    /// Applies requests as they arrive until every sender is dropped.
    ///
    /// For a dedicated execution thread with no frame loop of its own.
    ///
    /// # Errors
    ///
    /// As [`RequestExecutor::execute`].
    pub fn run(&self) -> PoolResult<DrainReport> {
        let mut report = DrainReport::default();
        while let Some(request) = self.receiver.recv() {
            let outcome = self.execute(request)?;
            report.record(&outcome);
        }
        tracing::debug!(?report, "request queue closed");
        Ok(report)
    }
}
