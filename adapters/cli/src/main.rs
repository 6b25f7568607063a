#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that plays the geocache game against a session file.
//!
//! Every invocation loads the session, applies one command and writes the
//! session back when the command changed anything.

mod config;
mod session_transfer;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use geocache_core::{Cell, CollectError, Command, Direction, Event, Point};
use geocache_storage::FileStore;
use geocache_system_autosave::Autosave;
use geocache_system_movement::{Config as MovementConfig, Movement, MovementInput, Tracking};
use geocache_world::{apply, query, World};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::session_transfer::SessionSnapshot;

/// Most steps a single `move` may take.
const MAX_STEPS: u32 = 10_000;

/// Plays the geocache coin collecting game from the terminal.
#[derive(Debug, Parser)]
#[command(name = "geocache", version, about)]
struct Cli {
    /// File holding the persisted session.
    #[arg(long, global = true, default_value = "geocache-session.json")]
    state: PathBuf,
    /// Optional TOML file overriding the game configuration.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Debug, Subcommand)]
enum CliCommand {
    /// Lists the caches visible from the player's position.
    Nearby,
    /// Prints the geographic rectangle covered by a cell.
    #[command(allow_negative_numbers = true)]
    Bounds {
        /// Cell row.
        i: i32,
        /// Cell column.
        j: i32,
    },
    /// Lists the coins held by the cache in a cell.
    #[command(allow_negative_numbers = true)]
    Coins {
        /// Cell row.
        i: i32,
        /// Cell column.
        j: i32,
    },
    /// Takes one coin from the cache in a cell.
    #[command(allow_negative_numbers = true)]
    Collect {
        /// Cell row.
        i: i32,
        /// Cell column.
        j: i32,
    },
    /// Walks one cell width per step in a cardinal direction.
    Move {
        /// Direction to walk in.
        #[arg(value_enum)]
        direction: DirectionArg,
        /// Number of steps to take.
        #[arg(
            long,
            default_value_t = 1,
            value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_STEPS))
        )]
        steps: u32,
    },
    /// Jumps to a position as if reported by the geolocation sensor.
    #[command(allow_negative_numbers = true)]
    Goto {
        /// Latitude in degrees.
        lat: f64,
        /// Longitude in degrees.
        lng: f64,
    },
    /// Lists the coins the player has collected.
    Inventory,
    /// Prints the trail of visited positions.
    Trail,
    /// Erases the session and returns the player to the origin.
    Reset,
    /// Prints the session as a single-line transfer string.
    Export,
    /// Replaces the session with a previously exported transfer string.
    Import {
        /// Transfer string produced by `export`.
        payload: String,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum DirectionArg {
    North,
    East,
    South,
    West,
}

impl From<DirectionArg> for Direction {
    fn from(value: DirectionArg) -> Self {
        match value {
            DirectionArg::North => Direction::North,
            DirectionArg::East => Direction::East,
            DirectionArg::South => Direction::South,
            DirectionArg::West => Direction::West,
        }
    }
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    run(cli)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let config = config::load(cli.config.as_deref())?;
    let mut store = FileStore::open(&cli.state)
        .with_context(|| format!("failed to open session {}", cli.state.display()))?;
    let mut world = World::new(config);
    let report = world
        .load_session(&store)
        .context("failed to load session")?;
    if !report.is_clean() {
        warn!(discarded = ?report.discarded, "session records were discarded");
    }

    let mut events = Vec::new();
    match cli.command {
        CliCommand::Nearby => print_nearby(&world),
        CliCommand::Bounds { i, j } => {
            let bounds = query::cell_bounds(&world, Cell::new(i, j))?;
            println!(
                "{}: ({}, {}) .. ({}, {})",
                Cell::new(i, j).key(),
                bounds.south_west.lat(),
                bounds.south_west.lng(),
                bounds.north_east.lat(),
                bounds.north_east.lng()
            );
        }
        CliCommand::Coins { i, j } => {
            let cell = Cell::new(i, j);
            if !query::hosts_cache(&world, cell) {
                println!("{} hosts no cache", cell.key());
            }
            for coin in query::coins_in_cell(&world, cell) {
                println!("{}#{}", coin.cell().key(), coin.serial());
            }
        }
        CliCommand::Collect { i, j } => apply(
            &mut world,
            Command::CollectCoin {
                cell: Cell::new(i, j),
            },
            &mut events,
        ),
        CliCommand::Move { direction, steps } => {
            let input = MovementInput::Step(direction.into());
            for _ in 0..steps {
                drive(&mut world, Tracking::Manual, &[input], &mut events);
            }
        }
        CliCommand::Goto { lat, lng } => {
            let fix = Point::new(lat, lng)?;
            drive(
                &mut world,
                Tracking::Sensor,
                &[MovementInput::SensorFix(fix)],
                &mut events,
            );
        }
        CliCommand::Inventory => {
            let coins = query::collected_coins(&world);
            println!("{} coin(s) collected", coins.len());
            for coin in coins {
                println!("{}#{}", coin.cell().key(), coin.serial());
            }
        }
        CliCommand::Trail => {
            for point in query::trail(&world) {
                println!("{}, {}", point.lat(), point.lng());
            }
        }
        CliCommand::Reset => {
            world
                .clear_session(&mut store)
                .context("failed to clear session")?;
            println!("session cleared");
        }
        CliCommand::Export => {
            let snapshot = SessionSnapshot::capture(&store).context("failed to read session")?;
            println!("{}", snapshot.encode());
        }
        CliCommand::Import { payload } => {
            let snapshot = SessionSnapshot::decode(&payload)?;
            snapshot
                .install(&mut store)
                .context("failed to write imported session")?;
            let report = world
                .load_session(&store)
                .context("failed to load imported session")?;
            if !report.is_clean() {
                warn!(discarded = ?report.discarded, "imported records were discarded");
                world
                    .save_session(&mut store)
                    .context("failed to rewrite imported session")?;
            }
            println!(
                "imported {} record(s), discarded {}",
                report.loaded.len(),
                report.discarded.len()
            );
        }
    }

    for event in &events {
        println!("{}", describe(event));
    }

    let mut autosave = Autosave::new();
    if autosave.handle(&events) {
        world
            .save_session(&mut store)
            .context("failed to save session")?;
        autosave.mark_saved();
        info!(path = %store.path().display(), "session saved");
    }
    Ok(())
}

fn drive(world: &mut World, tracking: Tracking, inputs: &[MovementInput], events: &mut Vec<Event>) {
    let step_length = query::config(world).tile_width();
    let mut movement = Movement::new(MovementConfig::new(step_length, tracking));
    let mut commands = Vec::new();
    movement.handle(inputs, query::position(world), &mut commands);
    for command in commands {
        apply(world, command, events);
    }
}

fn print_nearby(world: &World) {
    let position = query::position(world);
    let player_cell = query::player_cell(world);
    println!(
        "at {}, {} in cell {}",
        position.lat(),
        position.lng(),
        player_cell.key()
    );
    for cell in query::nearby_caches(world) {
        println!(
            "{}: {} coin(s)",
            cell.key(),
            query::coins_in_cell(world, cell).len()
        );
    }
}

fn describe(event: &Event) -> String {
    match event {
        Event::PlayerMoved { to, cell, .. } => {
            format!("moved to {}, {} in cell {}", to.lat(), to.lng(), cell.key())
        }
        Event::CoinCollected { coin, remaining } => format!(
            "collected {}#{} ({remaining} left)",
            coin.cell().key(),
            coin.serial()
        ),
        Event::CollectRejected { cell, reason } => {
            let reason = match reason {
                CollectError::OutOfRange => "out of range",
                CollectError::NoCache => "no cache here",
                CollectError::CacheEmpty => "cache is empty",
            };
            format!("cannot collect from {}: {reason}", cell.key())
        }
    }
}
