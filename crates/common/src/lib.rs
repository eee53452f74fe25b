//! Shared configuration, error types and display primitives for MQE crates.
//!
//! Architecture role:
//! - defines engine configuration passed from the façade down to memory sources
//! - provides the common [`MqeError`] / [`Result`] contracts
//! - renders Arrow types and schemas the way explain prints them
//!
//! Key modules:
//! - [`config`]
//! - [`display`]
//! - [`error`]

pub mod config;
pub mod display;
pub mod error;

pub use config::EngineConfig;
pub use display::{schema_fields, type_name};
pub use error::{MqeError, Result};
