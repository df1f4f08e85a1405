//! # Request Pool
//!
//! FIFO recycler for [`RequestObject`]s.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;

use crate::config::PoolConfig;
use crate::error::{protocol_violation, PoolError, PoolResult, ProtocolViolation};

use super::request::{Operation, RequestHandle, RequestObject};

/// A growable pool of request objects.
///
/// Requests are handed out from the front of the free queue and returned to
/// the back, so the oldest returned object is reused first. When the queue
/// is empty, `get` allocates one more object. The pool never shrinks.
///
/// The pool is an explicitly constructed context object: create it once in
/// the application assembly, `start()` it before the first write and
/// `stop()` it after the request queue has been drained.
///
/// # Thread Safety
///
/// The free queue and counters sit behind one mutex. `Property::set` takes
/// requests on the control thread while the executor returns them on the
/// execution thread, so the pool must be shareable.
///
/// # Example
///
/// ```rust,ignore
/// let pool = RequestPool::new(PoolConfig::default());
/// pool.start();
///
/// let request = pool.get(Operation::Update)?;
/// // ... fill, send, apply ...
/// pool.recycle(request)?;
///
/// pool.stop()?;
/// ```
pub struct RequestPool {
    /// Stamped on every object this pool allocates.
    id: u64,
    config: PoolConfig,
    state: Mutex<Option<PoolState>>,
}

static NEXT_POOL_ID: AtomicU64 = AtomicU64::new(1);

struct PoolState {
    /// Free requests, oldest returned at the front.
    free: VecDeque<RequestHandle>,
    /// Objects ever allocated.
    allocated: usize,
    /// `get` calls served from the free queue, preloaded objects included.
    reused: u64,
    /// Requests currently out of the pool.
    outstanding: usize,
    peak_outstanding: usize,
    /// Requests returned so far, for the in-flight mean.
    completed: u64,
    total_in_flight: Duration,
}

/// Snapshot of pool counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Total objects ever allocated.
    pub allocated: usize,
    /// Objects currently sitting in the free queue.
    pub available: usize,
    /// Objects currently issued or queued.
    pub outstanding: usize,
    /// Number of `get` calls served from the free queue without
    /// allocating. Handing out a preloaded object counts.
    pub reused: u64,
    /// Highest `outstanding` value seen.
    pub peak_outstanding: usize,
    /// Mean time between `get` and `recycle`.
    pub mean_in_flight: Duration,
}

impl RequestPool {
    /// Creates a stopped pool.
    #[must_use]
    pub fn new(config: PoolConfig) -> Self {
        Self {
            id: NEXT_POOL_ID.fetch_add(1, Ordering::Relaxed),
            config,
            state: Mutex::new(None),
        }
    }

    /// Starts the pool and preloads `config.preload` requests.
    ///
    /// Calling this on a started pool does nothing.
    pub fn start(&self) {
        let mut state = self.state.lock();
        if state.is_some() {
            return;
        }

        let preload = self.config.preload;
        let free: VecDeque<RequestHandle> =
            (0..preload).map(|_| Box::new(RequestObject::new(self.id))).collect();

        *state = Some(PoolState {
            free,
            allocated: preload,
            reused: 0,
            outstanding: 0,
            peak_outstanding: 0,
            completed: 0,
            total_in_flight: Duration::ZERO,
        });
        tracing::debug!(preload, "request pool started");
    }

    /// Returns whether the pool has been started and not yet stopped.
    #[must_use]
    pub fn is_started(&self) -> bool {
        self.state.lock().is_some()
    }

    /// Takes a request out of the pool, allocating if the pool is empty.
    ///
    /// The returned request carries `operation` and is otherwise cleared.
    ///
    /// # Errors
    ///
    /// [`PoolError::Uninitialized`] if the pool is not started.
    ///
    /// # Panics
    ///
    /// Protocol violation if the object at the front of the free queue is
    /// not marked as pooled.
    pub fn get(&self, operation: Operation) -> PoolResult<RequestHandle> {
        let mut guard = self.state.lock();
        let state = guard.as_mut().ok_or(PoolError::Uninitialized)?;

        let mut request = if let Some(request) = state.free.pop_front() {
            state.reused += 1;
            request
        } else {
            state.allocated += 1;
            tracing::debug!(allocated = state.allocated, "request pool grew");
            Box::new(RequestObject::new(self.id))
        };

        request.checkout(operation);
        state.outstanding += 1;
        state.peak_outstanding = state.peak_outstanding.max(state.outstanding);
        Ok(request)
    }

    /// Clears a request and puts it at the back of the free queue.
    ///
    /// # Errors
    ///
    /// [`PoolError::Uninitialized`] if the pool is not started. The request
    /// is dropped in that case.
    ///
    /// # Panics
    ///
    /// Protocol violation if the request is already marked as pooled, or
    /// if it was not issued by this pool.
    pub fn recycle(&self, mut request: RequestHandle) -> PoolResult<()> {
        let mut guard = self.state.lock();
        let Some(state) = guard.as_mut() else {
            drop(guard);
            return Err(PoolError::Uninitialized);
        };

        if request.owner() != self.id {
            drop(guard);
            protocol_violation(ProtocolViolation::ForeignReturn);
        }
        let in_flight = request.checkin();
        let Some(outstanding) = state.outstanding.checked_sub(1) else {
            drop(guard);
            protocol_violation(ProtocolViolation::ForeignReturn);
        };
        state.outstanding = outstanding;
        state.completed += 1;
        state.total_in_flight += in_flight;
        state.free.push_back(request);
        Ok(())
    }

    /// Total number of request objects ever allocated.
    ///
    /// Diagnostic only: the pool is unbounded.
    ///
    /// # Errors
    ///
    /// [`PoolError::Uninitialized`] if the pool is not started.
    pub fn size(&self) -> PoolResult<usize> {
        self.state
            .lock()
            .as_ref()
            .map(|state| state.allocated)
            .ok_or(PoolError::Uninitialized)
    }

    /// Returns a snapshot of the pool counters.
    ///
    /// # Errors
    ///
    /// [`PoolError::Uninitialized`] if the pool is not started.
    pub fn stats(&self) -> PoolResult<PoolStats> {
        let guard = self.state.lock();
        let state = guard.as_ref().ok_or(PoolError::Uninitialized)?;

        let mean_in_flight = if state.completed == 0 {
            Duration::ZERO
        } else {
            let nanos = state.total_in_flight.as_nanos() / u128::from(state.completed);
            Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
        };

        Ok(PoolStats {
            allocated: state.allocated,
            available: state.free.len(),
            outstanding: state.outstanding,
            reused: state.reused,
            peak_outstanding: state.peak_outstanding,
            mean_in_flight,
        })
    }

    /// Stops the pool and releases every pooled request.
    ///
    /// Stopping a stopped pool does nothing.
    ///
    /// # Errors
    ///
    /// [`PoolError::RequestsOutstanding`] if any request is still issued or
    /// queued. The pool stays started; drain the queue and try again.
    pub fn stop(&self) -> PoolResult<()> {
        let mut state = self.state.lock();
        let Some(current) = state.as_ref() else {
            return Ok(());
        };
        if current.outstanding > 0 {
            return Err(PoolError::RequestsOutstanding {
                count: current.outstanding,
            });
        }

        let allocated = current.allocated;
        *state = None;
        tracing::debug!(allocated, "request pool stopped");
        Ok(())
    }
}

impl Default for RequestPool {
    fn default() -> Self {
        Self::new(PoolConfig::default())
    }
}
