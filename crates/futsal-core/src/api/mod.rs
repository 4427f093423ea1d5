//! REST API client module for the tournament server.
//!
//! This module provides the `ApiClient` for reading and writing the six
//! record collections. Every method issues exactly one request; retry
//! policy lives with the caller (see `sync::DataSyncController`).

pub mod client;
pub mod error;

pub use client::ApiClient;
pub use error::ApiError;
