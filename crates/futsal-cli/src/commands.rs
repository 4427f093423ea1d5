use anyhow::{anyhow, bail, Result};
use futsal_core::auth::AuthProvider;
use futsal_core::models::{
    Collection, Final, Group, KnockoutMatch, Match, PointsRow, Records, Semifinal, Team, UpcomingMatch,
};
use futsal_core::sync::{LoadStatus, MutationGateway, Refresh};
use futsal_core::utils::format_timestamp;

use crate::app::App;
use crate::cli::{AddCommand, Command, PointsStats};
use crate::output::{render_json, render_status_line, render_text, TextOptions};

const FAILED_LOAD_HINT: &str =
    "Some data failed to load. Run `futsal status --retry-failed` to try again.";

pub async fn run(app: &App, command: Command) -> Result<()> {
    match command {
        Command::Show {
            collections,
            refresh,
            json,
            ids,
        } => show(app, &collections, refresh, json, ids).await,
        Command::Status { retry_failed } => status(app, retry_failed).await,
        Command::Refresh { collections } => refresh(app, &collections).await,
        Command::Login { email, remember } => {
            let email = email.unwrap_or_else(|| app.config.admin_email.clone());
            let identity = app.login(&email, remember).await?;
            println!(
                "Signed in as {}{}",
                identity.email.as_deref().unwrap_or(&identity.uid),
                if app.is_admin() { " (admin)" } else { "" }
            );
            Ok(())
        }
        Command::Logout { forget } => {
            app.logout(forget).await?;
            println!("Signed out");
            Ok(())
        }
        Command::Whoami => {
            whoami(app);
            Ok(())
        }
        Command::Add { record } => add(app, record).await,
        Command::UpdatePoints {
            id,
            team,
            group,
            stats,
        } => update_points(app, &id, team, group, &stats).await,
        Command::Delete { collection, id } => {
            let gateway = app.admin_gateway()?;
            let records = gateway.delete(collection, &id).await?;
            println!("Deleted {} from {}", id, collection);
            print_after_mutation(&gateway, &records);
            Ok(())
        }
    }
}

fn selected(collections: &[Collection]) -> Vec<Collection> {
    if collections.is_empty() {
        Collection::ALL.to_vec()
    } else {
        collections.to_vec()
    }
}

async fn show(
    app: &App,
    collections: &[Collection],
    force: bool,
    json: bool,
    ids: bool,
) -> Result<()> {
    let collections = selected(collections);
    let refresh = if force { Refresh::Force } else { Refresh::IfStale };
    let snapshot = app.sync.load_many(&collections, refresh).await;

    let options = TextOptions { ids };
    for collection in &collections {
        let records = snapshot.get(*collection);
        let status = app.sync.status(*collection);
        if json {
            println!("{}", render_json(&records, &status)?);
        } else {
            print!("{}", render_text(&records, &status, &options));
            println!();
        }
    }

    if !json && collections.iter().any(|c| app.sync.status(*c).is_error()) {
        eprintln!("{}", FAILED_LOAD_HINT);
    }
    Ok(())
}

async fn status(app: &App, retry_failed: bool) -> Result<()> {
    app.sync.load_all(Refresh::IfStale).await;

    if retry_failed {
        let retried = app.sync.retry_failed().await;
        if !retried.is_empty() {
            let names: Vec<&str> = retried.iter().map(|c| c.path()).collect();
            println!("Retried: {}", names.join(", "));
        }
    }

    let ages = app.sync.cache().ages();
    for (collection, status) in app.sync.statuses() {
        println!(
            "{}",
            render_status_line(collection, &status, &ages.age_of(collection))
        );
    }

    let (settled, total) = app.sync.progress();
    println!();
    println!("Loaded {}/{} collections", settled, total);
    match app.sync.cache().last_updated() {
        Some(at) => println!(
            "Last updated: {} ({})",
            format_timestamp(at),
            ages.last_updated()
        ),
        None => println!("Last updated: never"),
    }

    if !app.sync.all_ready() && !retry_failed {
        eprintln!("{}", FAILED_LOAD_HINT);
    }
    Ok(())
}

async fn refresh(app: &App, collections: &[Collection]) -> Result<()> {
    for collection in selected(collections) {
        let records = app.sync.refresh(collection).await;
        println!("{:<18} {}", collection.label(), app.sync.status(collection));
        tracing::debug!(%collection, count = records.len(), "Refreshed");
    }
    Ok(())
}

fn whoami(app: &App) {
    match app.auth.current_user() {
        Some(user) => {
            let minutes = user.minutes_until_expiry(app.sync.cache().now());
            println!(
                "{}{}",
                user.email.as_deref().unwrap_or(&user.uid),
                if app.is_admin() { " (admin)" } else { "" }
            );
            println!("Session expires in {} minutes", minutes);
        }
        None => println!("Not signed in"),
    }
}

async fn add(app: &App, record: AddCommand) -> Result<()> {
    let gateway = app.admin_gateway()?;
    let records = match record {
        AddCommand::Team { name, group } => gateway.create_record(&Team::new(name, group)).await?,
        AddCommand::Match {
            team1,
            team2,
            score,
            scorer,
            motm,
        } => {
            gateway
                .create_record(&Match {
                    id: None,
                    team1,
                    team2,
                    score,
                    scorer,
                    motm,
                })
                .await?
        }
        AddCommand::Upcoming {
            team1,
            team2,
            date,
            time,
        } => {
            gateway
                .create_record(&UpcomingMatch {
                    id: None,
                    team1,
                    team2,
                    date,
                    time,
                })
                .await?
        }
        AddCommand::Points { team, group, stats } => {
            let mut row = PointsRow::new(team, group);
            stats.apply(&mut row);
            gateway.save_points(&row).await?
        }
        AddCommand::Semifinal {
            team1,
            team2,
            score,
        } => {
            gateway
                .create_record(&Semifinal(knockout(team1, team2, score)))
                .await?
        }
        AddCommand::Final {
            team1,
            team2,
            score,
        } => {
            gateway
                .create_record(&Final(knockout(team1, team2, score)))
                .await?
        }
    };

    println!("Saved to {}", records.collection());
    print_after_mutation(&gateway, &records);
    Ok(())
}

fn knockout(team1: String, team2: String, score: String) -> KnockoutMatch {
    KnockoutMatch {
        id: None,
        team1,
        team2,
        score,
    }
}

async fn update_points(
    app: &App,
    id: &str,
    team: Option<String>,
    group: Option<Group>,
    stats: &PointsStats,
) -> Result<()> {
    let gateway = app.admin_gateway()?;
    let current = app.sync.load(Collection::Points, Refresh::Force).await;
    let mut row = points_row(&current, &app.sync.status(Collection::Points), id)?;

    if let Some(team) = team {
        row.team = team;
    }
    if let Some(group) = group {
        row.group = group;
    }
    stats.apply(&mut row);

    let records = gateway.save_points(&row).await?;
    println!("Updated {} in points", id);
    print_after_mutation(&gateway, &records);
    Ok(())
}

/// Find the row to edit, telling a failed load apart from a missing id.
fn points_row(current: &Records, status: &LoadStatus, id: &str) -> Result<PointsRow> {
    if let Some(cause) = status.error() {
        bail!("Could not load the points table: {}", cause);
    }
    current
        .as_points()
        .iter()
        .find(|row| row.id.as_deref() == Some(id))
        .cloned()
        .ok_or_else(|| anyhow!("No points row with id {}", id))
}

fn print_after_mutation(gateway: &MutationGateway, records: &Records) {
    let collection = records.collection();
    let status = gateway.sync().status(collection);
    print!("{}", render_text(records, &status, &TextOptions { ids: true }));
    if status.is_error() {
        eprintln!("The change was saved but {} could not be reloaded.", collection);
    }
}
