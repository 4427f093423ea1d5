use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::models::{Collection, KnockoutMatch, Match, PointsRow, Records, Team, UpcomingMatch};

/// Whether a collection should be served from cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Refresh {
    /// Use a cached entry while it is younger than the TTL.
    #[default]
    IfStale,
    /// Always go to the network.
    Force,
}

/// Load state of one collection.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum LoadStatus {
    #[default]
    Loading,
    Ready(Arc<Records>),
    Error(String),
}

impl LoadStatus {
    pub fn is_loading(&self) -> bool {
        matches!(self, LoadStatus::Loading)
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, LoadStatus::Ready(_))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, LoadStatus::Error(_))
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            LoadStatus::Error(cause) => Some(cause),
            _ => None,
        }
    }
}

impl fmt::Display for LoadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadStatus::Loading => f.write_str("loading"),
            LoadStatus::Ready(records) => write!(f, "ready ({} records)", records.len()),
            LoadStatus::Error(cause) => write!(f, "error: {}", cause),
        }
    }
}

/// The result of loading every collection at once.
///
/// Collections that failed to load hold an empty sequence.
#[derive(Debug, Clone)]
pub struct Snapshot {
    records: HashMap<Collection, Arc<Records>>,
}

impl Snapshot {
    pub(crate) fn new(records: HashMap<Collection, Arc<Records>>) -> Self {
        Self { records }
    }

    /// Records of `collection`, empty when it was not loaded.
    pub fn get(&self, collection: Collection) -> Arc<Records> {
        self.records
            .get(&collection)
            .cloned()
            .unwrap_or_else(|| Arc::new(Records::empty(collection)))
    }

    fn slice<'a, T>(&'a self, collection: Collection, view: fn(&'a Records) -> &'a [T]) -> &'a [T] {
        self.records
            .get(&collection)
            .map(|records| view(records))
            .unwrap_or(&[])
    }

    pub fn teams(&self) -> &[Team] {
        self.slice(Collection::Teams, Records::as_teams)
    }

    pub fn matches(&self) -> &[Match] {
        self.slice(Collection::Matches, Records::as_matches)
    }

    pub fn upcoming(&self) -> &[UpcomingMatch] {
        self.slice(Collection::Upcoming, Records::as_upcoming)
    }

    pub fn points(&self) -> &[PointsRow] {
        self.slice(Collection::Points, Records::as_points)
    }

    pub fn semifinals(&self) -> &[KnockoutMatch] {
        self.slice(Collection::Semifinals, Records::as_knockouts)
    }

    pub fn finals(&self) -> &[KnockoutMatch] {
        self.slice(Collection::Finals, Records::as_knockouts)
    }
}
