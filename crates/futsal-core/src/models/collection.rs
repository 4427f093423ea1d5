use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{KnockoutMatch, Match, PointsRow, Team, UpcomingMatch};

/// One of the six resource collections served by the tournament API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub enum Collection {
    Teams,
    Matches,
    Upcoming,
    Points,
    Semifinals,
    Finals,
}

impl Collection {
    /// All collections, in the order the dashboard loads and lists them.
    pub const ALL: [Collection; 6] = [
        Collection::Teams,
        Collection::Matches,
        Collection::Upcoming,
        Collection::Points,
        Collection::Semifinals,
        Collection::Finals,
    ];

    /// Path segment under the API base URL.
    pub fn path(&self) -> &'static str {
        match self {
            Collection::Teams => "teams",
            Collection::Matches => "matches",
            Collection::Upcoming => "upcoming",
            Collection::Points => "points",
            Collection::Semifinals => "semifinals",
            Collection::Finals => "finals",
        }
    }

    /// Human readable label used in status output.
    pub fn label(&self) -> &'static str {
        match self {
            Collection::Teams => "Teams",
            Collection::Matches => "Matches",
            Collection::Upcoming => "Upcoming matches",
            Collection::Points => "Points table",
            Collection::Semifinals => "Semifinals",
            Collection::Finals => "Finals",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown collection: {0}")]
pub struct UnknownCollection(pub String);

impl FromStr for Collection {
    type Err = UnknownCollection;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        Collection::ALL
            .into_iter()
            .find(|c| c.path() == lower)
            .ok_or_else(|| UnknownCollection(s.to_string()))
    }
}

/// A parsed collection payload.
///
/// The variant always matches the collection it was fetched from, so
/// semifinals and finals share a record type but stay distinguishable.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Records {
    Teams(Vec<Team>),
    Matches(Vec<Match>),
    Upcoming(Vec<UpcomingMatch>),
    Points(Vec<PointsRow>),
    Semifinals(Vec<KnockoutMatch>),
    Finals(Vec<KnockoutMatch>),
}

impl Records {
    /// An empty sequence for `collection`, substituted when a load fails.
    pub fn empty(collection: Collection) -> Self {
        match collection {
            Collection::Teams => Records::Teams(Vec::new()),
            Collection::Matches => Records::Matches(Vec::new()),
            Collection::Upcoming => Records::Upcoming(Vec::new()),
            Collection::Points => Records::Points(Vec::new()),
            Collection::Semifinals => Records::Semifinals(Vec::new()),
            Collection::Finals => Records::Finals(Vec::new()),
        }
    }

    /// Parse a JSON array body into the record type of `collection`.
    pub fn from_slice(collection: Collection, body: &[u8]) -> serde_json::Result<Self> {
        Ok(match collection {
            Collection::Teams => Records::Teams(serde_json::from_slice(body)?),
            Collection::Matches => Records::Matches(serde_json::from_slice(body)?),
            Collection::Upcoming => Records::Upcoming(serde_json::from_slice(body)?),
            Collection::Points => Records::Points(serde_json::from_slice(body)?),
            Collection::Semifinals => Records::Semifinals(serde_json::from_slice(body)?),
            Collection::Finals => Records::Finals(serde_json::from_slice(body)?),
        })
    }

    /// Same as [`Records::from_slice`] for an already decoded JSON value.
    pub fn from_value(collection: Collection, value: serde_json::Value) -> serde_json::Result<Self> {
        Ok(match collection {
            Collection::Teams => Records::Teams(serde_json::from_value(value)?),
            Collection::Matches => Records::Matches(serde_json::from_value(value)?),
            Collection::Upcoming => Records::Upcoming(serde_json::from_value(value)?),
            Collection::Points => Records::Points(serde_json::from_value(value)?),
            Collection::Semifinals => Records::Semifinals(serde_json::from_value(value)?),
            Collection::Finals => Records::Finals(serde_json::from_value(value)?),
        })
    }

    pub fn collection(&self) -> Collection {
        match self {
            Records::Teams(_) => Collection::Teams,
            Records::Matches(_) => Collection::Matches,
            Records::Upcoming(_) => Collection::Upcoming,
            Records::Points(_) => Collection::Points,
            Records::Semifinals(_) => Collection::Semifinals,
            Records::Finals(_) => Collection::Finals,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Records::Teams(v) => v.len(),
            Records::Matches(v) => v.len(),
            Records::Upcoming(v) => v.len(),
            Records::Points(v) => v.len(),
            Records::Semifinals(v) | Records::Finals(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_teams(&self) -> &[Team] {
        match self {
            Records::Teams(v) => v,
            _ => &[],
        }
    }

    pub fn as_matches(&self) -> &[Match] {
        match self {
            Records::Matches(v) => v,
            _ => &[],
        }
    }

    pub fn as_upcoming(&self) -> &[UpcomingMatch] {
        match self {
            Records::Upcoming(v) => v,
            _ => &[],
        }
    }

    pub fn as_points(&self) -> &[PointsRow] {
        match self {
            Records::Points(v) => v,
            _ => &[],
        }
    }

    /// Knockout fixtures, for either the semifinals or the finals collection.
    pub fn as_knockouts(&self) -> &[KnockoutMatch] {
        match self {
            Records::Semifinals(v) | Records::Finals(v) => v,
            _ => &[],
        }
    }
}
