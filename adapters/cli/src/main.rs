#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that replays a scripted skirmish scenario headlessly.

mod scenario;

use std::{path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use tile_skirmish_core::{AgentKind, Event};
use tile_skirmish_session::Session;
use tile_skirmish_world::TextMap;

use crate::scenario::Scenario;

/// Replays a skirmish scenario and logs every world event.
#[derive(Debug, Parser)]
#[command(name = "tile-skirmish", version, about)]
struct Cli {
    /// Path to the TOML scenario file.
    #[arg(long)]
    scenario: PathBuf,
    /// Number of frames to simulate.
    #[arg(long, default_value_t = 20)]
    ticks: u32,
    /// Milliseconds of simulated time between two frames.
    #[arg(long, default_value_t = 100)]
    frame_ms: u64,
    /// Overrides the scenario's random seed.
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    run(Cli::parse())
}

fn run(cli: Cli) -> Result<()> {
    let scenario = Scenario::load(&cli.scenario)?;

    let mut config = scenario.session;
    if let Some(seed) = cli.seed {
        config.seed = seed;
    }

    let mut session = Session::new(config).context("invalid session configuration")?;
    let map = TextMap::parse(&scenario.map, config.tags).context("invalid scenario map")?;
    log_events(&session.on_map_load(&map).context("failed to load scenario map")?);

    if let Some(player) = &scenario.player {
        session
            .place_player(player.config(), player.tile(), player.facing)
            .context("failed to place player")?;
    }

    for entry in &scenario.agents {
        let agent = session
            .register_agent(entry.config(), entry.tile(), entry.facing)
            .with_context(|| format!("failed to register {:?} at {:?}", entry.kind, entry.tile()))?;
        tracing::info!(agent = agent.get(), kind = ?entry.kind, tile = ?entry.tile(), "agent registered");
    }

    let mut alerts = scenario.alerts.clone();
    alerts.sort_by_key(|alert| alert.at_ms);
    let mut alerts = alerts.into_iter().peekable();

    let frame = Duration::from_millis(cli.frame_ms);
    for index in 0..cli.ticks {
        let now = frame.saturating_mul(index);

        while let Some(alert) = alerts.next_if(|alert| alert.at() <= now) {
            tracing::info!(tile = ?alert.tile(), "alert raised");
            session.raise_alert(alert.tile(), now);
        }

        if player_faces_enemy(&session) {
            log_events(&session.player_attack(now));
        }

        log_events(&session.tick(now));
    }

    print_summary(&session);
    Ok(())
}

fn player_faces_enemy(session: &Session) -> bool {
    let Some(facing) = session.player().and_then(|player| player.facing_tile()) else {
        return false;
    };
    session
        .agents()
        .of_kind(AgentKind::Enemy)
        .any(|agent| agent.tile == facing)
}

fn log_events(events: &[Event]) {
    for event in events {
        tracing::info!(?event, "world event");
    }
}

fn print_summary(session: &Session) {
    println!("distance maps built: {}", session.distance_map_builds());
    if let Some(player) = session.player() {
        println!(
            "player at ({}, {}) with {} health",
            player.tile.x(),
            player.tile.y(),
            player.health.get()
        );
    }
    for agent in session.agents().iter() {
        println!(
            "{:?} #{} at ({}, {}) with {} health, {:?} toward {:?}",
            agent.kind,
            agent.id.get(),
            agent.tile.x(),
            agent.tile.y(),
            agent.health.get(),
            session.agent_state(agent.id),
            agent.pathfind_target
        );
    }
}
