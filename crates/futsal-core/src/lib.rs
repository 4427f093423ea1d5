//! Core library for the futsal tournament dashboard.
//!
//! The dashboard reads six collections from the tournament REST server
//! (teams, matches, upcoming, points, semifinals, finals) and lets one
//! administrator edit them.
//!
//! - [`sync::DataSyncController`] loads collections with retry, backoff and
//!   a time-boxed cache
//! - [`sync::MutationGateway`] writes records and refreshes what it touched
//! - [`auth::AuthProvider`] supplies the signed-in identity; [`auth::is_admin`]
//!   gates editing

pub mod api;
pub mod auth;
pub mod cache;
pub mod config;
pub mod models;
pub mod sync;
pub mod utils;

pub use api::{ApiClient, ApiError};
pub use cache::CacheManager;
pub use config::{Config, RetryPolicy};
pub use models::{Collection, Records};
pub use sync::{DataSyncController, LoadStatus, MutationGateway, Refresh};
