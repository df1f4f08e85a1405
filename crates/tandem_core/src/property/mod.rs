//! # Dual-Context Properties
//!
//! Every attribute of a destination keeps two values:
//!
//! ```text
//! Control thread (scripting):   set(v) ──> control value   (visible now)
//!                                  │
//!                                  └──> request ──> queue ──> execution thread
//!                                                               │
//! Execution thread (render):    execute value  <── try_apply ───┘
//! ```
//!
//! Neither side ever writes the other side's value. They converge only
//! through requests, applied in the order they were sent.

mod binding;
mod destination;
mod list;
mod payload;
mod value;

pub use binding::PropertyBinding;
pub use destination::{dispatch_to, ApplyRequest, Destination, DispatchOutcome};
pub use list::ListProperty;
pub use payload::{OpaqueHandle, Payload, PayloadKind, PayloadValue, Vec3};
pub use value::Property;
