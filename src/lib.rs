//! Filmdepot Library
//!
//! This library exposes the internal modules for testing and potential reuse.

pub mod awards;
pub mod config;
pub mod error;
pub mod loader;
pub mod normalize;
pub mod pipeline;
pub mod resolver;
pub mod source;
pub mod sqlite_persistence;
pub mod warehouse;

// Re-export commonly used types for convenience
pub use error::EtlError;
pub use pipeline::{Pipeline, RowErrorPolicy, StageResult, STAGES};
pub use warehouse::{Table, WarehouseStore};
