//! # Request Memory
//!
//! Recycled request objects for allocation-free property writes.
//!
//! ## Design Philosophy
//!
//! Requests are small, short-lived and extremely frequent (one per property
//! write). They are allocated once and then cycled:
//!
//! ```text
//! FREE ──get──> ISSUED ──send──> QUEUED ──apply──> DISPATCHED ──recycle──> FREE
//! ```
//!
//! Every object carries an in-pool flag, so a double get or double return
//! fails immediately instead of corrupting a live request.

mod pool;
mod request;

pub use pool::{PoolStats, RequestPool};
pub use request::{CorrelationId, Operation, RequestHandle, RequestObject, PAYLOAD_SLOTS};
