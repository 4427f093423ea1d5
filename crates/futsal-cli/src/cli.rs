use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use futsal_core::models::{Collection, Group, PointsRow};

/// ICE Futsal Fest tournament dashboard.
///
/// Shows teams, group standings, results and fixtures from the tournament
/// server. Collections are cached for a few minutes between runs; use
/// `--refresh` or `futsal refresh` to bypass the cache.
#[derive(Parser, Debug)]
#[command(name = "futsal", version, about, long_about = None)]
pub struct Cli {
    /// Also write logs to this file (RUST_LOG controls the level).
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print collections (all of them by default)
    Show {
        /// teams, matches, upcoming, points, semifinals, finals
        collections: Vec<Collection>,

        /// Ignore cached data
        #[arg(short, long)]
        refresh: bool,

        /// One JSON object per collection instead of text
        #[arg(long)]
        json: bool,

        /// Prefix records with their server id
        #[arg(long)]
        ids: bool,
    },

    /// Print load status and cache age of every collection
    Status {
        /// Reload collections that failed to load
        #[arg(long)]
        retry_failed: bool,
    },

    /// Drop cached data and fetch again (all collections by default)
    Refresh { collections: Vec<Collection> },

    /// Sign in as the tournament admin
    Login {
        /// Defaults to the configured admin address
        #[arg(long)]
        email: Option<String>,

        /// Remember the password in the OS keychain
        #[arg(long)]
        remember: bool,
    },

    /// Sign out
    Logout {
        /// Also remove the remembered password
        #[arg(long)]
        forget: bool,
    },

    /// Show the signed-in identity
    Whoami,

    /// Create a record (admin only)
    Add {
        #[command(subcommand)]
        record: AddCommand,
    },

    /// Edit a row of the points table (admin only)
    UpdatePoints {
        id: String,

        #[arg(long)]
        team: Option<String>,

        #[arg(long)]
        group: Option<Group>,

        #[command(flatten)]
        stats: PointsStats,
    },

    /// Delete a record (admin only)
    Delete { collection: Collection, id: String },
}

#[derive(Subcommand, Debug)]
pub enum AddCommand {
    Team {
        name: String,
        #[arg(long, default_value = "A")]
        group: Group,
    },
    Match {
        team1: String,
        team2: String,
        #[arg(long, default_value = "")]
        score: String,
        /// Goal scorers, free text
        #[arg(long, default_value = "")]
        scorer: String,
        /// Man of the match
        #[arg(long, default_value = "")]
        motm: String,
    },
    Upcoming {
        team1: String,
        team2: String,
        /// YYYY-MM-DD
        #[arg(long, default_value = "")]
        date: String,
        #[arg(long, default_value = "")]
        time: String,
    },
    Points {
        team: String,
        #[arg(long, default_value = "A")]
        group: Group,
        #[command(flatten)]
        stats: PointsStats,
    },
    Semifinal {
        team1: String,
        team2: String,
        #[arg(long, default_value = "")]
        score: String,
    },
    Final {
        team1: String,
        team2: String,
        #[arg(long, default_value = "")]
        score: String,
    },
}

/// Standings columns. Unset columns are left as they are.
#[derive(Args, Debug, Default, Clone)]
pub struct PointsStats {
    #[arg(long)]
    pub played: Option<u32>,
    #[arg(long)]
    pub won: Option<u32>,
    #[arg(long)]
    pub lost: Option<u32>,
    #[arg(long)]
    pub draw: Option<u32>,
    #[arg(long, allow_negative_numbers = true)]
    pub points: Option<i32>,
    /// Goal difference
    #[arg(long, allow_negative_numbers = true)]
    pub gd: Option<i32>,
}

impl PointsStats {
    pub fn apply(&self, row: &mut PointsRow) {
        if let Some(played) = self.played {
            row.played = played;
        }
        if let Some(won) = self.won {
            row.won = won;
        }
        if let Some(lost) = self.lost {
            row.lost = lost;
        }
        if let Some(draw) = self.draw {
            row.draw = draw;
        }
        if let Some(points) = self.points {
            row.points = points;
        }
        if let Some(gd) = self.gd {
            row.gd = gd;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_show() {
        let cli = Cli::try_parse_from(["futsal", "show", "teams", "points", "--refresh"]).unwrap();
        match cli.command {
            Command::Show {
                collections,
                refresh,
                json,
                ..
            } => {
                assert_eq!(collections, vec![Collection::Teams, Collection::Points]);
                assert!(refresh);
                assert!(!json);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_collection_rejected() {
        assert!(Cli::try_parse_from(["futsal", "delete", "players", "x1"]).is_err());
    }

    #[test]
    fn test_negative_goal_difference() {
        let cli =
            Cli::try_parse_from(["futsal", "update-points", "p1", "--gd", "-3", "--points", "1"])
                .unwrap();
        let Command::UpdatePoints { id, stats, .. } = cli.command else {
            panic!("expected update-points");
        };
        assert_eq!(id, "p1");

        let mut row = PointsRow::new("Owls", Group::B);
        row.won = 2;
        stats.apply(&mut row);
        assert_eq!(row.gd, -3);
        assert_eq!(row.points, 1);
        assert_eq!(row.won, 2);
    }

    #[test]
    fn test_add_team_defaults_to_group_a() {
        let cli = Cli::try_parse_from(["futsal", "add", "team", "Sharks"]).unwrap();
        match cli.command {
            Command::Add {
                record: AddCommand::Team { name, group },
            } => {
                assert_eq!(name, "Sharks");
                assert_eq!(group, Group::A);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
