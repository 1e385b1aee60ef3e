use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use swarm_conquest::game::constants::physics::{DT, TICK_RATE};
use swarm_conquest::game::systems::ai::AiController;
use swarm_conquest::{SimConfig, Simulation};

/// Default tick limit: five simulated minutes
const DEFAULT_MAX_TICKS: u64 = TICK_RATE as u64 * 300;

/// Most ticks run per wakeup before the accumulator is dropped
const MAX_CATCH_UP_TICKS: u32 = 5;

/// Ticks between shutdown checks in flat-out mode
const FLAT_OUT_BATCH: u64 = 1_000;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    info!("Swarm Conquest v{}", env!("CARGO_PKG_VERSION"));

    let config = SimConfig::load_or_default();
    config.validate().context("invalid simulation config")?;
    info!(
        "Configuration loaded: {} players x {} particles, {}x{} canvas, seed={}",
        config.player_count, config.particles_per_player, config.width, config.height, config.seed
    );

    let max_ticks: u64 = env_or("SWARM_MAX_TICKS", DEFAULT_MAX_TICKS);
    let realtime = env_or("SWARM_REALTIME", 1u8) != 0;

    let seed = config.seed;
    let player_count = config.player_count;
    let mut sim = Simulation::with_generated_obstacles(config).context("failed to create match")?;
    for id in 0..player_count {
        let controller = match id % 3 {
            0 => AiController::Aggressive,
            1 => AiController::CenterOfMass,
            _ => AiController::random(seed.wrapping_add(id as u64)),
        };
        sim.register_controller(id, controller)?;
    }

    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_flag = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Shutdown signal received");
                shutdown_flag.store(true, Ordering::Relaxed);
            }
            Err(e) => warn!("Failed to install Ctrl+C handler: {}", e),
        }
    });

    let started = Instant::now();
    if realtime {
        run_realtime(&mut sim, max_ticks, &shutdown).await;
    } else {
        run_flat_out(&mut sim, max_ticks, &shutdown).await;
    }

    let summary = sim.summary();
    info!(
        "Match finished after {} ticks ({:.1}s simulated, {:.2}s wall), winner={:?}",
        summary.ticks,
        summary.elapsed_secs,
        started.elapsed().as_secs_f64(),
        summary.winner
    );
    println!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(())
}

fn should_stop(sim: &Simulation, max_ticks: u64, shutdown: &AtomicBool) -> bool {
    sim.winner().is_some() || sim.tick() >= max_ticks || shutdown.load(Ordering::Relaxed)
}

/// Wall-clock paced loop with a fixed-timestep accumulator
async fn run_realtime(sim: &mut Simulation, max_ticks: u64, shutdown: &AtomicBool) {
    let tick_duration = Duration::from_secs_f32(DT);
    let mut ticker = interval(tick_duration);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!("Simulation loop started at {} Hz", TICK_RATE);
    let mut last = Instant::now();
    let mut accumulator = Duration::ZERO;

    while !should_stop(sim, max_ticks, shutdown) {
        ticker.tick().await;
        let now = Instant::now();
        accumulator += now - last;
        last = now;

        let mut steps = 0;
        while accumulator >= tick_duration && steps < MAX_CATCH_UP_TICKS {
            sim.advance(DT);
            accumulator -= tick_duration;
            steps += 1;
            if should_stop(sim, max_ticks, shutdown) {
                return;
            }
        }
        if steps == MAX_CATCH_UP_TICKS {
            // Fell behind; drop the backlog instead of spiralling
            accumulator = Duration::ZERO;
        }

        // Log standings every 10 simulated seconds
        if sim.tick() % (TICK_RATE as u64 * 10) < steps as u64 {
            log_standings(sim);
        }
    }
}

/// Run as fast as possible, yielding between batches to notice Ctrl+C
async fn run_flat_out(sim: &mut Simulation, max_ticks: u64, shutdown: &AtomicBool) {
    info!("Simulation loop started (flat out)");
    while !should_stop(sim, max_ticks, shutdown) {
        for _ in 0..FLAT_OUT_BATCH {
            sim.advance(DT);
            if should_stop(sim, max_ticks, shutdown) {
                return;
            }
        }
        log_standings(sim);
        tokio::task::yield_now().await;
    }
}

fn log_standings(sim: &Simulation) {
    let counts: Vec<usize> = sim.players().iter().map(|p| p.particle_count).collect();
    let stats = sim.index_stats();
    debug!(
        tick = sim.tick(),
        occupied_cells = stats.occupied_cells,
        max_per_cell = stats.max_per_cell,
        "Standings: {:?}",
        counts
    );
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("Ignoring invalid {}={:?}", key, raw);
            default
        }),
        Err(_) => default,
    }
}
