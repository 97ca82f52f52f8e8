//! TarnKV common types, errors, and utilities.
//!
//! This crate provides shared definitions used across all TarnKV components.

pub mod buffer;
pub mod config;
pub mod error;

pub use buffer::GatherBuffer;
pub use config::LogConfig;
pub use error::{Result, TarnError};
