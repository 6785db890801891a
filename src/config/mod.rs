//! Task-sets file parsing and validation
//!
//! This module handles discovery and parsing of slap.yml files and turns
//! them into runnable task sets.

pub mod parse;
pub mod schema;
pub mod types;

// Re-export main types
pub use parse::*;
pub use schema::*;
pub use types::*;
