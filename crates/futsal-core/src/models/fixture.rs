use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{is_blank, Collection, Draft};

/// A completed group-stage match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Match {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(deserialize_with = "super::de::text")]
    pub team1: String,
    #[serde(deserialize_with = "super::de::text")]
    pub team2: String,
    #[serde(default, deserialize_with = "super::de::text")]
    pub score: String,
    #[serde(default, deserialize_with = "super::de::text")]
    pub scorer: String,
    /// Man of the match.
    #[serde(default, deserialize_with = "super::de::text")]
    pub motm: String,
}

impl Draft for Match {
    const COLLECTION: Collection = Collection::Matches;

    fn missing_field(&self) -> Option<&'static str> {
        missing_team(&self.team1, &self.team2)
    }
}

impl fmt::Display for Match {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} vs {}", self.team1, self.team2)?;
        if !is_blank(&self.score) {
            write!(f, "  {}", self.score)?;
        }
        if !is_blank(&self.scorer) {
            write!(f, "  scorers: {}", self.scorer)?;
        }
        if !is_blank(&self.motm) {
            write!(f, "  MOTM: {}", self.motm)?;
        }
        Ok(())
    }
}

/// A scheduled fixture that has not been played yet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct UpcomingMatch {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(deserialize_with = "super::de::text")]
    pub team1: String,
    #[serde(deserialize_with = "super::de::text")]
    pub team2: String,
    /// `YYYY-MM-DD` when set.
    #[serde(default, deserialize_with = "super::de::text")]
    pub date: String,
    #[serde(default, deserialize_with = "super::de::text")]
    pub time: String,
}

impl UpcomingMatch {
    /// Kick-off date, accepting either a bare date or an RFC 3339 timestamp.
    pub fn kickoff_date(&self) -> Option<NaiveDate> {
        let date = self.date.trim();
        NaiveDate::parse_from_str(date, "%Y-%m-%d").ok().or_else(|| {
            chrono::DateTime::parse_from_rfc3339(date)
                .ok()
                .map(|dt| dt.date_naive())
        })
    }
}

impl Draft for UpcomingMatch {
    const COLLECTION: Collection = Collection::Upcoming;

    fn missing_field(&self) -> Option<&'static str> {
        missing_team(&self.team1, &self.team2)
    }
}

impl fmt::Display for UpcomingMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} vs {}", self.team1, self.team2)?;
        match self.kickoff_date() {
            Some(date) => write!(f, "  {}", date.format("%b %d, %Y"))?,
            None if !is_blank(&self.date) => write!(f, "  {}", self.date.trim())?,
            None => {}
        }
        if !is_blank(&self.time) {
            write!(f, " {}", self.time.trim())?;
        }
        Ok(())
    }
}

/// A semifinal or final. Which one is decided by the collection it lives in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct KnockoutMatch {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(deserialize_with = "super::de::text")]
    pub team1: String,
    #[serde(deserialize_with = "super::de::text")]
    pub team2: String,
    #[serde(default, deserialize_with = "super::de::text")]
    pub score: String,
}

impl fmt::Display for KnockoutMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} vs {}", self.team1, self.team2)?;
        if is_blank(&self.score) {
            write!(f, "  (not played)")
        } else {
            write!(f, "  {}", self.score)
        }
    }
}

/// Draft for the semifinals collection.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct Semifinal(pub KnockoutMatch);

/// Draft for the finals collection.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct Final(pub KnockoutMatch);

impl Draft for Semifinal {
    const COLLECTION: Collection = Collection::Semifinals;

    fn missing_field(&self) -> Option<&'static str> {
        missing_team(&self.0.team1, &self.0.team2)
    }
}

impl Draft for Final {
    const COLLECTION: Collection = Collection::Finals;

    fn missing_field(&self) -> Option<&'static str> {
        missing_team(&self.0.team1, &self.0.team2)
    }
}

fn missing_team(team1: &str, team2: &str) -> Option<&'static str> {
    if is_blank(team1) {
        Some("team1")
    } else if is_blank(team2) {
        Some("team2")
    } else {
        None
    }
}
