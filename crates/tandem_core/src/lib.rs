//! # TANDEM Core
//!
//! Cross-context property synchronization for a control thread (scripting,
//! authoring) and an execution thread (the real-time update/render loop).
//!
//! ## Architecture Rules
//!
//! 1. **No direct cross-context mutation** - the control side writes its own
//!    value and emits a request, the execution side applies requests
//! 2. **No per-write allocation** - request objects are recycled by a pool
//! 3. **Loud failure on misuse** - double get, double return and dispatch to a
//!    dead destination abort instead of corrupting state
//!
//! ## Example
//!
//! ```rust,ignore
//! use tandem_core::{request_channel, RequestExecutor, RequestLink, RequestPool};
//!
//! let pool = Arc::new(RequestPool::new(PoolConfig::default()));
//! pool.start();
//! let (sender, receiver) = request_channel();
//! let link = RequestLink::new(Arc::clone(&pool), sender);
//!
//! // Control thread
//! node.alpha.set(0.5)?;
//!
//! // Execution thread, once per frame
//! executor.drain()?;
//! let alpha = node.alpha.execute_get();
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod error;
pub mod memory;
pub mod property;
pub mod sync;

pub use config::{ExecutorConfig, PoolConfig, TandemConfig};
pub use error::{
    ConfigError, ConfigResult, MismatchReason, PoolError, PoolResult, ProtocolViolation, SetError,
    SetResult, TypeMismatch,
};
pub use memory::{
    CorrelationId, Operation, PoolStats, RequestHandle, RequestObject, RequestPool, PAYLOAD_SLOTS,
};
pub use property::{
    dispatch_to, ApplyRequest, Destination, DispatchOutcome, ListProperty, OpaqueHandle, Payload,
    PayloadKind, PayloadValue, Property, PropertyBinding, Vec3,
};
pub use sync::{
    request_channel, DrainReport, RequestExecutor, RequestLink, RequestReceiver, RequestSender,
};
