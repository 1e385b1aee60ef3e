use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::{SimError, SimResult};
use crate::game::constants::{arena, conversion, cursor, grid, obstacles, physics, victory};

/// Particle motion parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhysicsConfig {
    pub particle_radius: f32,
    /// Seek acceleration toward the owner's cursor
    pub acceleration: f32,
    pub max_velocity: f32,
    /// Velocity multiplier applied once per tick
    pub friction_per_tick: f32,
    pub repulsion_radius: f32,
    pub repulsion_strength: f32,
    pub enemy_repulsion_multiplier: f32,
    /// Fraction of speed lost on obstacle and wall bounces
    pub bounce_energy_loss: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            particle_radius: physics::PARTICLE_RADIUS,
            acceleration: physics::ACCELERATION,
            max_velocity: physics::MAX_VELOCITY,
            friction_per_tick: physics::FRICTION_PER_TICK,
            repulsion_radius: physics::REPULSION_RADIUS,
            repulsion_strength: physics::REPULSION_STRENGTH,
            enemy_repulsion_multiplier: physics::ENEMY_REPULSION_MULTIPLIER,
            bounce_energy_loss: physics::BOUNCE_ENERGY_LOSS,
        }
    }
}

/// Ownership conversion parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionConfig {
    pub radius: f32,
    /// Progress gained per second while outnumbered
    pub rate: f32,
    pub threshold: f32,
    pub decay_multiplier: f32,
    /// Discount on friendly neighbors, in (0, 1]
    pub friendly_support_factor: f32,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            radius: conversion::RADIUS,
            rate: conversion::RATE,
            threshold: conversion::THRESHOLD,
            decay_multiplier: conversion::DECAY_MULTIPLIER,
            friendly_support_factor: conversion::FRIENDLY_SUPPORT_FACTOR,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CursorConfig {
    pub speed: f32,
    pub radius: f32,
}

impl Default for CursorConfig {
    fn default() -> Self {
        Self {
            speed: cursor::SPEED,
            radius: cursor::RADIUS,
        }
    }
}

/// Match-ending policy, fixed per match
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum WinCondition {
    /// Ends once any player drops to `threshold` particles or fewer
    Elimination { threshold: usize },
    /// Ends once any player owns at least `threshold` of all particles
    Percentage { threshold: f32 },
}

impl Default for WinCondition {
    fn default() -> Self {
        Self::Elimination {
            threshold: victory::ELIMINATION_THRESHOLD,
        }
    }
}

/// Simulation configuration, immutable for the lifetime of a match
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    pub width: f32,
    pub height: f32,
    pub player_count: usize,
    pub particles_per_player: usize,
    /// Seed for spawning, obstacle generation and random controllers
    pub seed: u64,
    pub obstacle_count: usize,
    /// Spatial index cell size; must be >= every exact query radius
    pub grid_cell_size: f32,
    pub physics: PhysicsConfig,
    pub conversion: ConversionConfig,
    pub cursor: CursorConfig,
    pub win_condition: WinCondition,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            width: arena::WIDTH,
            height: arena::HEIGHT,
            player_count: arena::PLAYER_COUNT,
            particles_per_player: arena::PARTICLES_PER_PLAYER,
            seed: 42,
            obstacle_count: obstacles::COUNT,
            grid_cell_size: grid::CELL_SIZE,
            physics: PhysicsConfig::default(),
            conversion: ConversionConfig::default(),
            cursor: CursorConfig::default(),
            win_condition: WinCondition::default(),
        }
    }
}

/// Read and parse an environment variable, warning and returning None on bad input
fn env_parse<T: FromStr>(name: &str, valid: impl Fn(&T) -> bool) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    match raw.parse::<T>() {
        Ok(parsed) if valid(&parsed) => Some(parsed),
        Ok(_) => {
            tracing::warn!("{} '{}' out of range, using default", name, raw);
            None
        }
        Err(_) => {
            tracing::warn!("Invalid {} '{}', using default", name, raw);
            None
        }
    }
}

impl SimConfig {
    /// Load config from environment or use defaults
    pub fn load_or_default() -> Self {
        let mut config = Self::default();

        if let Some(players) = env_parse::<usize>("SWARM_PLAYERS", |&n| (2..=16).contains(&n)) {
            config.player_count = players;
        }
        if let Some(per_player) =
            env_parse::<usize>("SWARM_PARTICLES_PER_PLAYER", |&n| n > 0 && n <= 100_000)
        {
            config.particles_per_player = per_player;
        }
        if let Some(width) = env_parse::<f32>("SWARM_WIDTH", |&w| w > 0.0) {
            config.width = width;
        }
        if let Some(height) = env_parse::<f32>("SWARM_HEIGHT", |&h| h > 0.0) {
            config.height = height;
        }
        if let Some(seed) = env_parse::<u64>("SWARM_SEED", |_| true) {
            config.seed = seed;
        }
        if let Some(count) = env_parse::<usize>("SWARM_OBSTACLES", |&n| n <= 64) {
            config.obstacle_count = count;
        }

        if let Ok(mode) = std::env::var("SWARM_WIN_MODE") {
            match mode.to_ascii_lowercase().as_str() {
                "elimination" => {
                    let threshold =
                        env_parse::<usize>("SWARM_ELIMINATION_THRESHOLD", |_| true)
                            .unwrap_or(victory::ELIMINATION_THRESHOLD);
                    config.win_condition = WinCondition::Elimination { threshold };
                }
                "percentage" => {
                    let threshold = env_parse::<f32>("SWARM_PERCENTAGE_THRESHOLD", |&t| {
                        t > 0.0 && t <= 1.0
                    })
                    .unwrap_or(victory::PERCENTAGE_THRESHOLD);
                    config.win_condition = WinCondition::Percentage { threshold };
                }
                _ => tracing::warn!("Invalid SWARM_WIN_MODE '{}', using default", mode),
            }
        }

        config
    }

    pub fn total_particles(&self) -> usize {
        self.player_count * self.particles_per_player
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> SimResult<()> {
        let invalid = |msg: &str| Err(SimError::InvalidConfig(msg.to_string()));

        if self.player_count < 2 {
            return invalid("player_count must be at least 2");
        }
        if self.particles_per_player == 0 {
            return invalid("particles_per_player must be at least 1");
        }
        if !(self.width > 0.0 && self.height > 0.0) {
            return invalid("canvas width and height must be positive");
        }
        if !(self.grid_cell_size > 0.0) {
            return invalid("grid_cell_size must be positive");
        }
        if self.grid_cell_size < self.physics.repulsion_radius
            || self.grid_cell_size < self.conversion.radius
        {
            return invalid("grid_cell_size must cover repulsion and conversion radii");
        }
        if !(self.physics.friction_per_tick > 0.0 && self.physics.friction_per_tick <= 1.0) {
            return invalid("friction_per_tick must be in (0, 1]");
        }
        if !(0.0..=1.0).contains(&self.physics.bounce_energy_loss) {
            return invalid("bounce_energy_loss must be in [0, 1]");
        }
        if !(self.conversion.threshold > 0.0) {
            return invalid("conversion threshold must be positive");
        }
        if !(self.conversion.friendly_support_factor > 0.0
            && self.conversion.friendly_support_factor <= 1.0)
        {
            return invalid("friendly_support_factor must be in (0, 1]");
        }
        if self.conversion.rate < 0.0 || self.conversion.decay_multiplier < 0.0 {
            return invalid("conversion rates must not be negative");
        }
        if self.cursor.radius * 2.0 > self.width.min(self.height) {
            return invalid("cursor radius does not fit the canvas");
        }
        if let WinCondition::Percentage { threshold } = self.win_condition {
            if !(threshold > 0.0 && threshold <= 1.0) {
                return invalid("percentage threshold must be in (0, 1]");
            }
        }
        Ok(())
    }
}
