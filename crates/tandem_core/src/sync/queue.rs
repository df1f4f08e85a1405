//! # Request Queue
//!
//! Unbounded FIFO channel carrying issued requests from the control context
//! to the execution context. Uses crossbeam for lock-free hand-off.

use std::sync::{Arc, Weak};

use crate::error::{SetError, SetResult};
use crate::memory::{CorrelationId, Operation, RequestHandle, RequestPool};
use crate::property::{Destination, Payload};

/// Creates a connected sender/receiver pair.
#[must_use]
pub fn request_channel() -> (RequestSender, RequestReceiver) {
    let (sender, receiver) = crossbeam_channel::unbounded();
    (RequestSender { sender }, RequestReceiver { receiver })
}

/// Control-side end of the request queue.
#[derive(Clone)]
pub struct RequestSender {
    sender: crossbeam_channel::Sender<RequestHandle>,
}

impl RequestSender {
    /// Enqueues a request. Never blocks.
    ///
    /// # Errors
    ///
    /// Gives the request back if the receiver has been dropped.
    pub fn send(&self, request: RequestHandle) -> Result<(), RequestHandle> {
        self.sender.send(request).map_err(|err| err.into_inner())
    }
}

/// Execution-side end of the request queue.
pub struct RequestReceiver {
    receiver: crossbeam_channel::Receiver<RequestHandle>,
}

impl RequestReceiver {
    /// Takes the oldest queued request, if any. Never blocks.
    #[must_use]
    pub fn try_recv(&self) -> Option<RequestHandle> {
        self.receiver.try_recv().ok()
    }

    /// Waits for the next request.
    ///
    /// Returns `None` once every sender is gone and the queue is empty.
    #[must_use]
    pub fn recv(&self) -> Option<RequestHandle> {
        self.receiver.recv().ok()
    }

    /// Number of requests waiting.
    #[must_use]
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    /// Returns whether no request is waiting.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }
}

/// The pool plus the sending end of the queue.
///
/// Cloned into every [`PropertyBinding`](crate::PropertyBinding).
#[derive(Clone)]
pub struct RequestLink {
    pool: Arc<RequestPool>,
    sender: RequestSender,
}

impl RequestLink {
    /// Creates a link issuing requests from `pool` into `sender`.
    #[must_use]
    pub fn new(pool: Arc<RequestPool>, sender: RequestSender) -> Self {
        Self { pool, sender }
    }

    /// Returns the pool requests are drawn from.
    #[must_use]
    pub fn pool(&self) -> &Arc<RequestPool> {
        &self.pool
    }

    /// Issues and enqueues one request.
    ///
    /// `payload` goes into slot 0. Once this returns `Ok` the caller has
    /// no access to the request any more.
    ///
    /// # Errors
    ///
    /// [`SetError::Pool`] if no request could be taken,
    /// [`SetError::QueueClosed`] if the execution side is gone (the request
    /// is recycled first).
    pub fn submit(
        &self,
        operation: Operation,
        property: CorrelationId,
        destination: &Weak<dyn Destination>,
        payload: Payload,
    ) -> SetResult<()> {
        let mut request = self.pool.get(operation)?;
        request.set_correlation_id(property);
        request.set_destination(Weak::clone(destination));
        request.set_payload(0, payload);

        match self.sender.send(request) {
            Ok(()) => Ok(()),
            Err(request) => {
                self.pool.recycle(request)?;
                Err(SetError::QueueClosed)
            }
        }
    }
}
