//! Data models for tournament records.
//!
//! This module contains the record types served by the tournament API:
//!
//! - `Team`, `Group`: registered teams and their group tag
//! - `Match`, `UpcomingMatch`, `KnockoutMatch`: completed, scheduled and knockout fixtures
//! - `PointsRow`: one line of the group standings
//! - `Collection`, `Records`: the six collections and their parsed payloads

pub mod collection;
mod de;
pub mod fixture;
pub mod standings;
pub mod team;

pub use collection::{Collection, Records, UnknownCollection};
pub use fixture::{Final, KnockoutMatch, Match, Semifinal, UpcomingMatch};
pub use standings::{standings, PointsRow};
pub use team::{Group, Team};

use serde::Serialize;

/// A record that can be submitted to the API as a new entry.
///
/// `missing_field` is the presence check run before any request is sent.
pub trait Draft: Serialize {
    /// Collection the record is created in.
    const COLLECTION: Collection;

    /// Name of the first required field that is blank, if any.
    fn missing_field(&self) -> Option<&'static str>;
}

pub(crate) fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}
