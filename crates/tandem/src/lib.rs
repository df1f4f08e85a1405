//! # TANDEM
//!
//! Application assembly on top of `tandem_core`.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────┐                 ┌──────────────────────────┐
//! │   CONTROL THREAD         │                 │   EXECUTION THREAD       │
//! │                          │   RequestQueue  │                          │
//! │  node.alpha.set(0.5) ────┼────────────────>│  executor.drain()        │
//! │  node.alpha.get()        │   (FIFO, SPSC)  │  node.alpha.execute_get()│
//! └────────────┬─────────────┘                 └────────────┬─────────────┘
//!              │              ┌──────────────┐              │
//!              └────── get ──>│ RequestPool  │<── recycle ──┘
//!                             └──────────────┘
//! ```
//!
//! ## Modules
//!
//! - `runtime`: builds and tears down the pool, queue and executor
//! - `nodes`: reference destinations for render nodes

pub mod nodes;
pub mod runtime;

pub use tandem_core as core;

pub use nodes::{ImageAttributes, NodeAttributes, ALL_RENDER_SETS};
pub use runtime::Runtime;
