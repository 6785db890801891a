//! CLI interface and argument parsing
//!
//! This module handles command-line parsing and hands the requested task
//! sets to the runner.

pub mod app;

// Re-export main types
pub use app::*;
