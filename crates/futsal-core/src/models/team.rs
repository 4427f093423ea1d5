use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{is_blank, Collection, Draft};

/// Group tag for the group stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub enum Group {
    #[default]
    A,
    B,
}

impl Group {
    pub const ALL: [Group; 2] = [Group::A, Group::B];
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Group::A => write!(f, "A"),
            Group::B => write!(f, "B"),
        }
    }
}

impl FromStr for Group {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "A" | "a" => Ok(Group::A),
            "B" | "b" => Ok(Group::B),
            other => Err(format!("unknown group '{}', expected A or B", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Team {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(deserialize_with = "super::de::text")]
    pub name: String,
    #[serde(default, deserialize_with = "super::de::group")]
    pub group: Group,
}

impl Team {
    pub fn new(name: impl Into<String>, group: Group) -> Self {
        Self {
            id: None,
            name: name.into(),
            group,
        }
    }

    /// Teams of one group, in server order.
    pub fn in_group(teams: &[Team], group: Group) -> Vec<&Team> {
        teams.iter().filter(|t| t.group == group).collect()
    }
}

impl Draft for Team {
    const COLLECTION: Collection = Collection::Teams;

    fn missing_field(&self) -> Option<&'static str> {
        is_blank(&self.name).then_some("name")
    }
}
