//! # Runtime Assembly
//!
//! ```text
//! Runtime::start(config)
//!   ├─ RequestPool::new + start    (preload)
//!   ├─ request_channel()
//!   ├─ RequestLink       → handed to every destination
//!   └─ RequestExecutor   → owned by the execution loop
//!
//! Runtime::shutdown()
//!   ├─ drain until the queue is empty
//!   └─ RequestPool::stop
//! ```

use std::sync::Arc;

use tandem_core::{
    request_channel, DrainReport, PoolError, PoolStats, RequestExecutor, RequestLink, RequestPool,
    TandemConfig,
};

/// The pool, queue and executor of one control/execution pair.
pub struct Runtime {
    pool: Arc<RequestPool>,
    link: RequestLink,
    executor: RequestExecutor,
}

impl Runtime {
    /// Starts the pool and connects the queue.
    #[must_use]
    pub fn start(config: &TandemConfig) -> Self {
        let pool = Arc::new(RequestPool::new(config.pool.clone()));
        pool.start();

        let (sender, receiver) = request_channel();
        let link = RequestLink::new(Arc::clone(&pool), sender);
        let executor = RequestExecutor::new(Arc::clone(&pool), receiver, config.executor.clone());

        tracing::info!(preload = config.pool.preload, "runtime started");
        Self {
            pool,
            link,
            executor,
        }
    }

    /// Link for building destinations on the control side.
    #[must_use]
    pub fn link(&self) -> &RequestLink {
        &self.link
    }

    /// Returns the request pool.
    #[must_use]
    pub fn pool(&self) -> &Arc<RequestPool> {
        &self.pool
    }

    /// Returns the executor for the execution loop.
    #[must_use]
    pub fn executor(&self) -> &RequestExecutor {
        &self.executor
    }

    /// Returns the pool counters.
    ///
    /// # Errors
    ///
    /// [`PoolError::Uninitialized`] after shutdown.
    pub fn stats(&self) -> Result<PoolStats, PoolError> {
        self.pool.stats()
    }

    /// Applies everything still queued and stops the pool.
    ///
    /// Destinations must still be alive while this runs.
    ///
    /// # Errors
    ///
    /// [`PoolError::RequestsOutstanding`] if a request is held outside the
    /// queue, for example by a control thread that is still writing.
    pub fn shutdown(self) -> Result<DrainReport, PoolError> {
        let mut total = DrainReport::default();
        loop {
            let report = self.executor.drain()?;
            if report.dispatched == 0 {
                break;
            }
            total.dispatched += report.dispatched;
            total.consumed += report.consumed;
            total.inert += report.inert;
            total.mismatched += report.mismatched;
        }

        let stats = self.pool.stats()?;
        self.pool.stop()?;
        tracing::info!(
            allocated = stats.allocated,
            peak_outstanding = stats.peak_outstanding,
            mean_in_flight_us = stats.mean_in_flight.as_micros(),
            "runtime stopped"
        );
        Ok(total)
    }
}
