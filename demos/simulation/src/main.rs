//! # simulation
//!
//! A small particle simulation on top of the ECS: a ring of particles is
//! spawned, pulled down by gravity, and destroyed as their lifetimes run out.
//!
//! ```text
//! simulation --entities 64 --ticks 120
//! simulation --config world.json
//! RUST_LOG=simulation=debug,ecs_system=trace simulation
//! ```

mod components;
mod systems;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use ecs_world::{Coordinator, WorldConfig};
use glam::Vec3;
use tracing::info;
use tracing_subscriber::EnvFilter;

use systems::{Accelerate, ExpireLifetimes, IntegrateVelocity, ReportPositions, SpawnParticles};

/// Downward acceleration in units per second squared.
const GRAVITY: Vec3 = Vec3::new(0.0, -9.81, 0.0);

#[derive(Parser)]
#[command(name = "simulation", about = "Particle simulation over the ECS runtime")]
struct Args {
    /// Number of ticks to run; overrides the config file (0 = until interrupted)
    #[arg(short, long)]
    ticks: Option<u64>,

    /// Number of particles to spawn
    #[arg(short, long, default_value_t = 32)]
    entities: u32,

    /// Initial particle speed in units per second
    #[arg(short, long, default_value_t = 5.0)]
    speed: f32,

    /// Path to a JSON world configuration
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("simulation=info".parse()?))
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => WorldConfig::from_json_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => WorldConfig::default().with_max_ticks(120),
    };
    if let Some(ticks) = args.ticks {
        config = config.with_max_ticks(ticks);
    }

    info!(
        entities = args.entities,
        max_entities = config.max_entities,
        tick_rate = config.tick_rate,
        max_ticks = config.max_ticks,
        "simulation starting"
    );

    let mut coordinator = Coordinator::with_config(config)?;
    coordinator.register_system(SpawnParticles::new(args.entities, args.speed))?;
    coordinator.register_system(Accelerate::new(GRAVITY))?;
    coordinator.register_system(IntegrateVelocity)?;
    coordinator.register_system(ExpireLifetimes::default())?;
    coordinator.register_system(ReportPositions::default())?;

    coordinator.run()?;

    let expired = coordinator
        .scheduler()
        .get::<ExpireLifetimes>()
        .map_or(0, ExpireLifetimes::expired);
    info!(
        ticks = coordinator.tick_id(),
        expired,
        remaining = coordinator.world().entity_count(),
        "simulation finished"
    );
    Ok(())
}
