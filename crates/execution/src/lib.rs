#![deny(missing_docs)]

//! Execution-layer primitives used by the query façade.
//!
//! Architecture role:
//! - vectorized evaluation of bound expressions
//! - builtin scalar function kernels
//! - batch stream abstractions
//! - pull-based operators for every physical plan node
//!
//! Key modules:
//! - [`exec`]
//! - [`expressions`]
//! - [`functions`]
//! - [`stream`]

pub mod exec;
pub mod expressions;
pub mod functions;
pub mod stream;

// Re-export only what you want at the crate root (no globs).
pub use exec::execute_plan;
pub use expressions::{evaluate, ColumnarValue};
pub use stream::{
    empty_stream, stop_after_error, RecordBatchStream, SendableRecordBatchStream, StreamAdapter,
};
