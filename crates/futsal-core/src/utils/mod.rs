//! Utility functions for text output.

pub mod format;

pub use format::{format_timestamp, or_dash, truncate};
