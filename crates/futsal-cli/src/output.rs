//! Plain text and JSON rendering of collections.

use std::fmt::Display;

use futsal_core::models::{standings, Collection, Group, PointsRow, Records, Team};
use futsal_core::sync::LoadStatus;
use futsal_core::utils::{or_dash, truncate};

/// Width of the team column in the standings table.
const TEAM_WIDTH: usize = 18;

pub struct TextOptions {
    pub ids: bool,
}

/// One collection as text: a header line, then one line per record.
pub fn render_text(records: &Records, status: &LoadStatus, options: &TextOptions) -> String {
    let collection = records.collection();
    let mut out = format!("== {} ({}) ==\n", collection.label(), records.len());

    if let Some(cause) = status.error() {
        out.push_str(&format!("  failed to load: {}\n", cause));
        return out;
    }
    if records.is_empty() {
        out.push_str("  (none)\n");
        return out;
    }

    match records {
        Records::Teams(teams) => render_teams(&mut out, teams, options),
        Records::Points(rows) => render_standings(&mut out, rows, options),
        Records::Matches(v) => render_lines(&mut out, v.iter().map(|m| (&m.id, m)), options),
        Records::Upcoming(v) => render_lines(&mut out, v.iter().map(|m| (&m.id, m)), options),
        Records::Semifinals(v) | Records::Finals(v) => {
            render_lines(&mut out, v.iter().map(|m| (&m.id, m)), options)
        }
    }
    out
}

fn id_prefix(id: &Option<String>, options: &TextOptions) -> String {
    if options.ids {
        format!("[{}] ", or_dash(id.as_deref().unwrap_or_default()))
    } else {
        String::new()
    }
}

fn render_lines<'a, T: Display + 'a>(
    out: &mut String,
    items: impl Iterator<Item = (&'a Option<String>, &'a T)>,
    options: &TextOptions,
) {
    for (id, item) in items {
        out.push_str(&format!("  {}{}\n", id_prefix(id, options), item));
    }
}

fn render_teams(out: &mut String, teams: &[Team], options: &TextOptions) {
    for group in Group::ALL {
        let members = Team::in_group(teams, group);
        if members.is_empty() {
            continue;
        }
        out.push_str(&format!("Group {}\n", group));
        for team in members {
            out.push_str(&format!("  {}{}\n", id_prefix(&team.id, options), team.name));
        }
    }
}

fn render_standings(out: &mut String, rows: &[PointsRow], options: &TextOptions) {
    for group in Group::ALL {
        let table = standings(rows, group);
        if table.is_empty() {
            continue;
        }
        out.push_str(&format!("Group {}\n", group));
        out.push_str(&format!(
            "  {:>2}  {:<width$} {:>3} {:>3} {:>3} {:>3} {:>4} {:>4}\n",
            "#",
            "Team",
            "P",
            "W",
            "D",
            "L",
            "GD",
            "Pts",
            width = TEAM_WIDTH
        ));
        for (rank, row) in table.iter().enumerate() {
            out.push_str(&format!(
                "  {:>2}  {:<width$} {:>3} {:>3} {:>3} {:>3} {:>4} {:>4}",
                rank + 1,
                truncate(&row.team, TEAM_WIDTH),
                row.played,
                row.won,
                row.draw,
                row.lost,
                row.gd,
                row.points,
                width = TEAM_WIDTH
            ));
            if options.ids {
                out.push_str(&format!("  {}", id_prefix(&row.id, options).trim_end()));
            }
            out.push('\n');
        }
    }
}

/// One collection as a single-line JSON object.
pub fn render_json(records: &Records, status: &LoadStatus) -> serde_json::Result<String> {
    let value = serde_json::json!({
        "collection": records.collection(),
        "status": status_label(status),
        "error": status.error(),
        "records": records,
    });
    serde_json::to_string(&value)
}

pub fn status_label(status: &LoadStatus) -> &'static str {
    match status {
        LoadStatus::Loading => "loading",
        LoadStatus::Ready(_) => "ready",
        LoadStatus::Error(_) => "error",
    }
}

/// One line of `futsal status`.
pub fn render_status_line(collection: Collection, status: &LoadStatus, age: &str) -> String {
    format!(
        "{:<18} {:<40} cached {}",
        collection.label(),
        truncate(&status.to_string(), 40),
        age
    )
}
