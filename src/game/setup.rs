//! Match setup: spawn anchors and initial swarms

use rand::Rng;
use std::f32::consts::{FRAC_PI_4, TAU};

use crate::config::SimConfig;
use crate::game::constants::arena::{MAX_SPAWN_ATTEMPTS, SPAWN_MARGIN, SPAWN_SPREAD};
use crate::game::state::{Obstacle, Particle};
use crate::util::vec2::Vec2;

/// Spawn anchors spread evenly around an inset ellipse, starting top-left.
/// Two players start in opposite corners, four in all four.
pub fn spawn_anchors(config: &SimConfig) -> Vec<Vec2> {
    let center = Vec2::new(config.width * 0.5, config.height * 0.5);
    let rx = (config.width * 0.5 - SPAWN_MARGIN).max(0.0);
    let ry = (config.height * 0.5 - SPAWN_MARGIN).max(0.0);
    let n = config.player_count.max(1);

    (0..config.player_count)
        .map(|i| {
            let angle = -3.0 * FRAC_PI_4 + TAU * i as f32 / n as f32;
            // Push toward the corners: scale the unit circle onto the box
            let (sin, cos) = angle.sin_cos();
            let scale = 1.0 / cos.abs().max(sin.abs()).max(f32::EPSILON);
            center + Vec2::new(cos * scale * rx, sin * scale * ry)
        })
        .collect()
}

/// Spawn each player's swarm in a disc around its anchor, player-major order.
///
/// Positions that leave the canvas or land in an obstacle are redrawn; after
/// too many misses the particle is placed on the anchor itself.
pub fn spawn_particles<R: Rng>(
    config: &SimConfig,
    anchors: &[Vec2],
    obstacles: &[Obstacle],
    rng: &mut R,
) -> Vec<Particle> {
    let radius = config.physics.particle_radius;
    let mut particles = Vec::with_capacity(config.total_particles());

    for (owner, &anchor) in anchors.iter().enumerate() {
        for _ in 0..config.particles_per_player {
            let position = (0..MAX_SPAWN_ATTEMPTS)
                .map(|_| {
                    let angle = rng.gen_range(0.0..TAU);
                    let dist = SPAWN_SPREAD * rng.gen::<f32>().sqrt();
                    anchor + Vec2::new(angle.cos() * dist, angle.sin() * dist)
                })
                .find(|&p| is_clear(p, radius, config, obstacles))
                .unwrap_or(anchor);
            particles.push(Particle::new(position, owner));
        }
    }

    particles
}

fn is_clear(position: Vec2, radius: f32, config: &SimConfig, obstacles: &[Obstacle]) -> bool {
    position.x >= radius
        && position.y >= radius
        && position.x <= config.width - radius
        && position.y <= config.height - radius
        && obstacles.iter().all(|o| o.contact(position, radius).is_none())
}
