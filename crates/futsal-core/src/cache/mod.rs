//! Collection caching module.
//!
//! This module provides the `CacheManager`, which keeps the last successful
//! payload of each collection together with the time it was fetched. An
//! entry is served without a network call while it is younger than the
//! configured TTL (5 minutes by default).
//!
//! Entries can optionally be written through to a directory as JSON so a
//! later process starts warm.

pub mod clock;
pub mod manager;

pub use clock::{Clock, ManualClock, SystemClock};
pub use manager::{CacheAges, CacheManager, CachedData};
