//! # Cross-Context Hand-Off
//!
//! ARCHITECT'S ORDER: the control thread never touches execution state.
//!
//! ## The Problem
//!
//! ```text
//! Thread 1 (Control/Script):   WRITE properties
//! Thread 2 (Execution/Render): READ properties every frame
//!
//! Shared mutable fields: RACE CONDITION → CORRUPT FRAME
//! ```
//!
//! ## The Solution: Request Queue
//!
//! ```text
//! Control:    set(v) → pool.get() → fill → sender.send()
//!                                              │  FIFO, unbounded
//! Execution:  receiver.try_recv() → apply() → pool.recycle()
//! ```
//!
//! The producer never blocks, and requests are applied in send order, so the
//! last write to a property wins.

mod executor;
mod queue;

pub use executor::{DrainReport, RequestExecutor};
pub use queue::{request_channel, RequestLink, RequestReceiver, RequestSender};
