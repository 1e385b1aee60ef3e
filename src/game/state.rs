//! Simulation entity definitions
//!
//! Particles live in a flat arena: a particle's index in the particle vector is
//! its stable identity for the whole match. Per-particle side tables (conversion
//! progress, render frames) are parallel arrays indexed the same way.

use serde::{Deserialize, Serialize};

use crate::util::vec2::Vec2;

/// Player identifier, dense in 0..player_count
pub type PlayerId = usize;

/// Stable particle identity (arena slot)
pub type ParticleId = usize;

/// 8-bit RGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Player palette, cycled when there are more players than entries
pub const PLAYER_COLORS: [Rgb; 8] = [
    Rgb::new(0xe6, 0x39, 0x46), // red
    Rgb::new(0x45, 0x7b, 0x9d), // blue
    Rgb::new(0x2a, 0x9d, 0x8f), // teal
    Rgb::new(0xf4, 0xa2, 0x61), // orange
    Rgb::new(0x9b, 0x5d, 0xe5), // violet
    Rgb::new(0xe9, 0xc4, 0x6a), // yellow
    Rgb::new(0xf1, 0x5b, 0xb5), // pink
    Rgb::new(0x8a, 0xc9, 0x26), // green
];

#[inline]
pub fn player_color(id: PlayerId) -> Rgb {
    PLAYER_COLORS[id % PLAYER_COLORS.len()]
}

/// A swarm particle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Particle {
    pub position: Vec2,
    pub velocity: Vec2,
    pub owner: PlayerId,
    /// Cached from the owner, updated on conversion
    pub color: Rgb,
}

impl Particle {
    pub fn new(position: Vec2, owner: PlayerId) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
            owner,
            color: player_color(owner),
        }
    }

    /// Transfer ownership, keeping the cached color in sync
    pub fn set_owner(&mut self, owner: PlayerId) {
        self.owner = owner;
        self.color = player_color(owner);
    }
}

/// A player and their cursor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub color: Rgb,
    pub cursor: Vec2,
    /// Number of particles with `owner == id`; maintained by the conversion pass
    pub particle_count: usize,
    /// True while an AI controller is registered for this player
    pub is_ai: bool,
}

impl Player {
    pub fn new(id: PlayerId, cursor: Vec2) -> Self {
        Self {
            id,
            color: player_color(id),
            cursor,
            particle_count: 0,
            is_ai: false,
        }
    }

    pub fn is_eliminated(&self) -> bool {
        self.particle_count == 0
    }
}

/// Static obstacle geometry, resolved to its shape once at creation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum Obstacle {
    /// Axis-aligned rectangle with top-left corner (x, y)
    Rectangle { x: f32, y: f32, width: f32, height: f32 },
    Circle { x: f32, y: f32, radius: f32 },
}

/// Match phase. The only transition is Playing -> GameOver.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchPhase {
    #[default]
    Playing,
    GameOver,
}
