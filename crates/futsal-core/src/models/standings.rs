use std::cmp::Reverse;

use serde::{Deserialize, Serialize};

use super::{is_blank, Collection, Draft, Group};

/// One team's line in the group standings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct PointsRow {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(deserialize_with = "super::de::text")]
    pub team: String,
    #[serde(default, deserialize_with = "super::de::count")]
    pub played: u32,
    #[serde(default, deserialize_with = "super::de::count")]
    pub won: u32,
    #[serde(default, deserialize_with = "super::de::count")]
    pub lost: u32,
    #[serde(default, deserialize_with = "super::de::count")]
    pub draw: u32,
    #[serde(default, deserialize_with = "super::de::signed")]
    pub points: i32,
    /// Goal difference.
    #[serde(default, deserialize_with = "super::de::signed")]
    pub gd: i32,
    #[serde(default, deserialize_with = "super::de::group")]
    pub group: Group,
}

impl PointsRow {
    pub fn new(team: impl Into<String>, group: Group) -> Self {
        Self {
            team: team.into(),
            group,
            ..Default::default()
        }
    }

    /// Rows with an id are edits of an existing row, the rest are new.
    pub fn is_existing(&self) -> bool {
        self.id.as_deref().is_some_and(|id| !is_blank(id))
    }
}

impl Draft for PointsRow {
    const COLLECTION: Collection = Collection::Points;

    fn missing_field(&self) -> Option<&'static str> {
        is_blank(&self.team).then_some("team")
    }
}

/// Standings of one group: points descending, then goal difference descending.
///
/// The sort is stable so fully tied rows keep the order the server sent.
pub fn standings(rows: &[PointsRow], group: Group) -> Vec<&PointsRow> {
    let mut table: Vec<&PointsRow> = rows.iter().filter(|r| r.group == group).collect();
    table.sort_by_key(|r| (Reverse(r.points), Reverse(r.gd)));
    table
}
