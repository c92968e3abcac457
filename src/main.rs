use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use segment_league::api::{build_router, cors_layer, state::AppState};
use segment_league::cache::{CachedDirectory, ParticipantDirectory};
use segment_league::calculate::format_duration;
use segment_league::config::AppConfig;
use segment_league::league::{season_jerseys, season_standings, week_leaderboard, LeagueSnapshot};
use segment_league::models::{ParticipantId, WeekId};
use segment_league::storage::{remove_participant, set_week_multiplier, StorageConfig};

#[derive(Parser)]
#[command(name = "segment-league")]
#[command(about = "Club segment league: weekly leaderboards, season standings and jerseys")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "./config.toml")]
    config: PathBuf,

    /// Data directory path (overrides config)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); overrides config
    #[arg(long)]
    log_level: Option<String>,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the API server
    Serve {
        /// Bind address (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port number (overrides config)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Print a week's leaderboard
    Leaderboard {
        #[arg(long)]
        week: String,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Print season standings
    Standings {
        #[arg(long)]
        season: String,

        #[arg(long)]
        json: bool,
    },

    /// Print climb and flat jersey tallies
    Jerseys {
        #[arg(long)]
        season: String,

        #[arg(long)]
        json: bool,
    },

    /// Delete a participant and all of their results
    DeleteParticipant {
        #[arg(long)]
        participant: String,
    },

    /// Change a week's points multiplier
    SetMultiplier {
        #[arg(long)]
        week: String,

        #[arg(long)]
        multiplier: u32,
    },
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load_or_default(&cli.config)
        .with_context(|| format!("Failed to load config from {}", cli.config.display()))?;
    if let Some(dir) = cli.data_dir.clone() {
        config.data_dir = dir;
    }
    let log_level = cli.log_level.clone().unwrap_or_else(|| config.log_level.clone());

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level));
    let registry = tracing_subscriber::registry().with(filter);
    if cli.json_logs {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::info!("Starting segment-league v{}", env!("CARGO_PKG_VERSION"));

    let storage = StorageConfig::new(config.data_dir.clone());
    let directory = Arc::new(CachedDirectory::new(
        storage.clone(),
        config.cache.ttl(),
        config.cache.max_profiles,
    ));

    match cli.command {
        Commands::Serve { host, port } => {
            let host = host.unwrap_or(config.server.host.clone());
            let port = port.unwrap_or(config.server.port);

            let state = AppState::new(storage, directory);
            let app = build_router(state).layer(cors_layer(&config.server.cors_origin));
            let addr = format!("{}:{}", host, port);
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            tracing::info!("Listening on http://{}", addr);
            axum::serve(listener, app).await?;
        }
        Commands::Leaderboard { week, json } => {
            let snapshot = LeagueSnapshot::load(&storage)?;
            let board = week_leaderboard(&snapshot, directory.as_ref(), &week.into())?;
            if json {
                return print_json(&board);
            }

            println!(
                "\n=== {} ({} x{}, {} lap(s)) ===",
                board.week.name,
                board.week.segment_name.as_deref().unwrap_or("unknown segment"),
                board.week.multiplier,
                board.week.required_laps
            );
            if board.entries.is_empty() {
                println!("No results yet.");
            }
            for e in &board.entries {
                let ghost = e
                    .ghost
                    .as_ref()
                    .and_then(|g| g.delta_seconds)
                    .map(|d| format!(" (ghost {:+}s)", d))
                    .unwrap_or_default();
                println!(
                    "{:>3}. {:<24} {:>9}  +{:<6} {:>3} pts{}",
                    e.rank,
                    e.name,
                    e.time,
                    format_duration(e.gap_to_leader_seconds),
                    e.points.total,
                    ghost
                );
            }
            if !board.skipped_results.is_empty() {
                println!("\nSkipped results:");
                for r in &board.skipped_results {
                    println!("  - {}: {}", r.participant_id, r.reason);
                }
            }
        }
        Commands::Standings { season, json } => {
            let snapshot = LeagueSnapshot::load(&storage)?;
            let view = season_standings(&snapshot, directory.as_ref(), &season.into())?;
            if json {
                return print_json(&view);
            }

            println!("\n=== {} standings ({} weeks) ===", view.season_name, view.weeks_scored);
            for row in &view.standings {
                println!(
                    "{:>3}. {:<24} {:>4} pts  {} week(s)",
                    row.rank, row.name, row.total_points, row.weeks_completed
                );
            }
            if !view.skipped_weeks.is_empty() {
                println!("\nSkipped weeks:");
                for w in &view.skipped_weeks {
                    println!("  - {}: {}", w.week_id, w.reason);
                }
            }
        }
        Commands::Jerseys { season, json } => {
            let snapshot = LeagueSnapshot::load(&storage)?;
            let view = season_jerseys(&snapshot, directory.as_ref(), &season.into())?;
            if json {
                return print_json(&view);
            }

            println!("\n=== {} jerseys ===", view.season_name);
            for standings in [&view.jerseys.climb, &view.jerseys.flat] {
                println!("\n{} ({} weeks)", standings.category, standings.weeks);
                for w in &standings.wins {
                    println!(
                        "  {:<24} {} win(s)",
                        directory.display_name(&w.participant_id),
                        w.wins
                    );
                }
            }
            println!(
                "\nClimb champion: {}",
                view.climb_champion_name.as_deref().unwrap_or("-")
            );
            println!(
                "Flat champion:  {}",
                view.flat_champion_name.as_deref().unwrap_or("-")
            );
        }
        Commands::DeleteParticipant { participant } => {
            let id: ParticipantId = participant.into();
            let summary = remove_participant(&storage, &id)?;
            directory.invalidate(&id);
            println!(
                "Removed participant {} (profile: {}, results: {})",
                id,
                if summary.participant_removed { "yes" } else { "no" },
                summary.submissions_removed
            );
        }
        Commands::SetMultiplier { week, multiplier } => {
            let id: WeekId = week.into();
            if set_week_multiplier(&storage, &id, multiplier)? {
                println!("Week {} multiplier set to {}", id, multiplier);
            } else {
                anyhow::bail!("Week not found: {}", id);
            }
        }
    }

    Ok(())
}
