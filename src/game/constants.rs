/// Canvas and swarm sizing
pub mod arena {
    /// Default canvas width in pixels
    pub const WIDTH: f32 = 1200.0;
    /// Default canvas height in pixels
    pub const HEIGHT: f32 = 800.0;
    /// Default number of players
    pub const PLAYER_COUNT: usize = 4;
    /// Default particles spawned per player
    pub const PARTICLES_PER_PLAYER: usize = 250;
    /// Radius of the spawn cloud around each player's anchor
    pub const SPAWN_SPREAD: f32 = 90.0;
    /// Distance of spawn anchors from the canvas edge
    pub const SPAWN_MARGIN: f32 = 120.0;
    /// Maximum placement attempts for a particle before it falls back to the anchor
    pub const MAX_SPAWN_ATTEMPTS: u32 = 30;
}

/// Particle physics. Friction is a per-tick multiplier, not a drag coefficient.
pub mod physics {
    /// Particle disc radius
    pub const PARTICLE_RADIUS: f32 = 2.0;
    /// Seek acceleration toward the owner's cursor (px/s²)
    pub const ACCELERATION: f32 = 600.0;
    /// Maximum particle speed (px/s)
    pub const MAX_VELOCITY: f32 = 220.0;
    /// Velocity multiplier applied once per tick
    pub const FRICTION_PER_TICK: f32 = 0.95;
    /// Neighbor distance under which particles push apart
    pub const REPULSION_RADIUS: f32 = 8.0;
    /// Peak repulsion acceleration at zero separation (px/s²)
    pub const REPULSION_STRENGTH: f32 = 900.0;
    /// Extra push applied between particles of different owners
    pub const ENEMY_REPULSION_MULTIPLIER: f32 = 1.5;
    /// Fraction of speed lost on an obstacle or wall bounce
    pub const BOUNCE_ENERGY_LOSS: f32 = 0.7;
    /// Fixed tick rate in Hz
    pub const TICK_RATE: u32 = 60;
    /// Delta time per tick in seconds
    pub const DT: f32 = 1.0 / 60.0;
    /// Push-out passes per particle before falling back to its previous position
    pub const MAX_RESOLVE_PASSES: u32 = 4;
}

/// Ownership conversion
pub mod conversion {
    /// Neighbor distance counted when judging a contest
    pub const RADIUS: f32 = 12.0;
    /// Progress gained per second while outnumbered
    pub const RATE: f32 = 2.0;
    /// Progress at which ownership flips
    pub const THRESHOLD: f32 = 1.0;
    /// Decay speed relative to RATE when not outnumbered
    pub const DECAY_MULTIPLIER: f32 = 0.5;
    /// Discount applied to friendly neighbors when testing for outnumbering
    pub const FRIENDLY_SUPPORT_FACTOR: f32 = 0.8;
}

/// Player cursors
pub mod cursor {
    /// Cursor speed (px/s)
    pub const SPEED: f32 = 320.0;
    /// Cursor radius, keeps the cursor this far from the canvas edge
    pub const RADIUS: f32 = 10.0;
}

/// Spatial index
pub mod grid {
    /// Grid cell size; must cover the largest exact-distance query radius
    pub const CELL_SIZE: f32 = 16.0;
}

/// Win conditions
pub mod victory {
    /// Elimination mode: a player at or below this many particles ends the match
    pub const ELIMINATION_THRESHOLD: usize = 0;
    /// Percentage mode: share of all particles a player needs to win
    pub const PERCENTAGE_THRESHOLD: f32 = 0.75;
}

/// Obstacle generation
pub mod obstacles {
    /// Default number of generated obstacles
    pub const COUNT: usize = 6;
    /// Rectangle side length range
    pub const RECT_MIN_SIDE: f32 = 40.0;
    pub const RECT_MAX_SIDE: f32 = 160.0;
    /// Circle radius range
    pub const CIRCLE_MIN_RADIUS: f32 = 25.0;
    pub const CIRCLE_MAX_RADIUS: f32 = 70.0;
    /// Clearance kept around spawn anchors
    pub const SPAWN_CLEARANCE: f32 = 140.0;
    /// Clearance kept from the canvas edge
    pub const EDGE_CLEARANCE: f32 = 30.0;
    /// Placement attempts per obstacle
    pub const MAX_PLACEMENT_ATTEMPTS: u32 = 50;
    /// Minimum gap between generated obstacles; wider than a particle so none gets wedged
    pub const MIN_GAP: f32 = 12.0;
}

/// AI controllers
pub mod ai {
    /// Ticks between random controller retargets
    pub const RANDOM_RETARGET_TICKS: u64 = 90;
    /// How far past the enemy centroid the aggressive controller aims (fraction of the gap)
    pub const AGGRESSIVE_OVERSHOOT: f32 = 0.25;
}
