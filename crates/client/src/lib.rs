//! Query façade: build frames, compile them and collect results.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use arrow::array::{ArrayRef, Int64Array, StringArray};
//! use mqe_client::{col, lit, Engine};
//! use mqe_common::EngineConfig;
//!
//! let engine = Engine::new(EngineConfig::default())?;
//! let df = engine.from_columns(vec![
//!     ("id", Arc::new(Int64Array::from(vec![1, 2, 3])) as ArrayRef),
//!     ("first_name", Arc::new(StringArray::from(vec!["Niko", "Alice", "Joy"])) as ArrayRef),
//! ])?;
//! let result = df
//!     .filter(col("first_name").eq(lit("Niko")))
//!     .select(vec![col("id"), (col("id") * lit(2)).alias("new_id")])
//!     .collect_blocking()?;
//! println!("{result}");
//! # Ok::<(), mqe_common::MqeError>(())
//! ```

mod session;

pub mod dataframe;
pub mod engine;
pub mod expr;
pub mod result;

pub use dataframe::DataFrame;
pub use engine::Engine;
pub use expr::*;
pub use result::QueryResult;
