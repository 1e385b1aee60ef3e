use rayon::prelude::*;

use crate::config::{PhysicsConfig, SimConfig};
use crate::game::constants::physics::MAX_RESOLVE_PASSES;
use crate::game::spatial::SpatialIndex;
use crate::game::state::{Obstacle, Particle, ParticleId};
use crate::util::vec2::Vec2;

/// Integrate every particle one tick.
///
/// Forces are computed from a frozen snapshot (positions, owners, cursors and
/// the index built this tick) in parallel, then written back in one pass, so
/// the result does not depend on thread scheduling.
/// CRITICAL: friction is a per-tick multiplier (velocity *= friction), NOT a drag coefficient
pub fn update(
    particles: &mut [Particle],
    cursors: &[Vec2],
    obstacles: &[Obstacle],
    index: &SpatialIndex,
    config: &SimConfig,
    dt: f32,
    scratch: &mut Vec<(Vec2, Vec2)>,
) {
    let snapshot: &[Particle] = particles;
    snapshot
        .par_iter()
        .enumerate()
        .map(|(id, particle)| {
            let cursor = cursors[particle.owner];
            step_particle(id, particle, cursor, snapshot, obstacles, index, config, dt)
        })
        .collect_into_vec(scratch);

    for (particle, &(position, velocity)) in particles.iter_mut().zip(scratch.iter()) {
        particle.position = position;
        particle.velocity = velocity;
    }
}

/// Compute one particle's next (position, velocity)
#[allow(clippy::too_many_arguments)]
pub fn step_particle(
    id: ParticleId,
    particle: &Particle,
    cursor: Vec2,
    particles: &[Particle],
    obstacles: &[Obstacle],
    index: &SpatialIndex,
    config: &SimConfig,
    dt: f32,
) -> (Vec2, Vec2) {
    let physics = &config.physics;

    let force = seek_force(particle.position, cursor, physics.acceleration)
        + repulsion_force(id, particle, particles, index, physics);

    let mut velocity = (particle.velocity + force * dt) * physics.friction_per_tick;
    velocity = velocity.clamp_length(physics.max_velocity);
    let mut position = particle.position + velocity * dt;

    resolve_obstacles(
        &mut position,
        &mut velocity,
        particle.position,
        physics.particle_radius,
        obstacles,
        physics.bounce_energy_loss,
    );
    resolve_walls(
        &mut position,
        &mut velocity,
        physics.particle_radius,
        config.width,
        config.height,
        physics.bounce_energy_loss,
    );

    (position, velocity)
}

/// Acceleration toward the owner's cursor (zero when sitting on it)
#[inline]
pub fn seek_force(position: Vec2, cursor: Vec2, acceleration: f32) -> Vec2 {
    (cursor - position).normalize() * acceleration
}

/// Sum of pushes from neighbors inside the repulsion radius.
///
/// Falls off linearly to zero at the radius. A neighbor at exactly the same
/// position counts as being at the radius and contributes nothing.
pub fn repulsion_force(
    id: ParticleId,
    particle: &Particle,
    particles: &[Particle],
    index: &SpatialIndex,
    physics: &PhysicsConfig,
) -> Vec2 {
    let radius = physics.repulsion_radius;
    let radius_sq = radius * radius;
    let mut force = Vec2::ZERO;

    for other_id in index.query_nearby(particle.position) {
        if other_id == id {
            continue;
        }
        let other = &particles[other_id];
        let delta = particle.position - other.position;
        if delta.length_sq() >= radius_sq {
            continue;
        }

        let (dir, dist) = delta.normalize_with_length();
        let dist = if dist > 0.0 { dist } else { radius };
        let mut magnitude = physics.repulsion_strength * (1.0 - dist / radius);
        if other.owner != particle.owner {
            magnitude *= physics.enemy_repulsion_multiplier;
        }
        force += dir * magnitude;
    }

    force
}

/// Reflect velocity off a surface and bleed energy; no-op when already separating
#[inline]
pub fn bounce(velocity: Vec2, normal: Vec2, energy_loss: f32) -> Vec2 {
    if velocity.dot(normal) < 0.0 {
        velocity.reflect(normal) * (1.0 - energy_loss)
    } else {
        velocity
    }
}

/// Push a disc out of every overlapping obstacle, bouncing its velocity.
///
/// Repeats until no obstacle reports a contact, since leaving one obstacle can
/// land the disc in a neighbor. If the passes run out (a pocket between
/// overlapping obstacles), the disc returns to `previous` and stops.
pub fn resolve_obstacles(
    position: &mut Vec2,
    velocity: &mut Vec2,
    previous: Vec2,
    radius: f32,
    obstacles: &[Obstacle],
    energy_loss: f32,
) {
    for _ in 0..MAX_RESOLVE_PASSES {
        let mut touched = false;
        for obstacle in obstacles {
            if let Some(contact) = obstacle.contact(*position, radius) {
                *velocity = bounce(*velocity, contact.normal, energy_loss);
                *position = contact.resolved;
                touched = true;
            }
        }
        if !touched {
            return;
        }
    }

    if obstacles.iter().any(|o| o.contact(*position, radius).is_some())
        && obstacles.iter().all(|o| o.contact(previous, radius).is_none())
    {
        *position = previous;
        *velocity = Vec2::ZERO;
    }
}

/// Keep a disc inside the canvas, bouncing off the walls like an obstacle
pub fn resolve_walls(
    position: &mut Vec2,
    velocity: &mut Vec2,
    radius: f32,
    width: f32,
    height: f32,
    energy_loss: f32,
) {
    if position.x < radius {
        position.x = radius;
        *velocity = bounce(*velocity, Vec2::RIGHT, energy_loss);
    } else if position.x > width - radius {
        position.x = width - radius;
        *velocity = bounce(*velocity, Vec2::LEFT, energy_loss);
    }

    if position.y < radius {
        position.y = radius;
        *velocity = bounce(*velocity, Vec2::DOWN, energy_loss);
    } else if position.y > height - radius {
        position.y = height - radius;
        *velocity = bounce(*velocity, Vec2::UP, energy_loss);
    }
}
