//! Data synchronisation with the tournament server.
//!
//! - `DataSyncController`: fetches collections with retry and backoff,
//!   serves fresh cache entries, and tracks a `LoadStatus` per collection
//! - `MutationGateway`: sends create/update/delete requests and re-fetches
//!   the affected collection afterwards

pub mod controller;
pub mod gateway;
pub mod status;

pub use controller::{DataSyncController, FetchError};
pub use gateway::{MutationError, MutationGateway};
pub use status::{LoadStatus, Refresh, Snapshot};
