//! Ownership conversion
//!
//! Every particle carries a progress scalar in [0, threshold). While it is
//! locally outnumbered by enemies the progress climbs; otherwise it decays.
//! Crossing the threshold hands the particle to the dominant enemy player.
//!
//! Decisions for a tick are made in parallel against one ownership snapshot,
//! then the resulting transfers are applied sequentially so the per-player
//! counters are never updated concurrently.

use rayon::prelude::*;
use smallvec::SmallVec;

use crate::config::ConversionConfig;
use crate::game::spatial::SpatialIndex;
use crate::game::state::{Particle, ParticleId, Player, PlayerId};

/// Neighbor census around one particle
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NeighborTally {
    pub friendly: u32,
    /// (player, count) per enemy player, in first-seen order
    pub enemies: SmallVec<[(PlayerId, u32); 4]>,
}

impl NeighborTally {
    pub fn enemy_total(&self) -> u32 {
        self.enemies.iter().map(|&(_, count)| count).sum()
    }

    /// Enemy player with the most neighbors; ties go to the lowest player id
    pub fn dominant_enemy(&self) -> Option<PlayerId> {
        self.enemies
            .iter()
            .copied()
            .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(&a.0)))
            .map(|(player, _)| player)
    }

    fn add_enemy(&mut self, player: PlayerId) {
        match self.enemies.iter_mut().find(|(id, _)| *id == player) {
            Some((_, count)) => *count += 1,
            None => self.enemies.push((player, 1)),
        }
    }
}

/// Count friendly and enemy neighbors within `radius` of a particle (excluding itself)
pub fn tally_neighbors(
    id: ParticleId,
    particles: &[Particle],
    index: &SpatialIndex,
    radius: f32,
) -> NeighborTally {
    let particle = &particles[id];
    let radius_sq = radius * radius;
    let mut tally = NeighborTally::default();

    for other_id in index.query_nearby(particle.position) {
        if other_id == id {
            continue;
        }
        let other = &particles[other_id];
        if particle.position.distance_sq_to(other.position) > radius_sq {
            continue;
        }
        if other.owner == particle.owner {
            tally.friendly += 1;
        } else {
            tally.add_enemy(other.owner);
        }
    }

    tally
}

/// Outcome of one particle's conversion step
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Step {
    /// Ownership unchanged; carries the new progress value
    Hold(f32),
    /// Ownership moves to this player; progress resets
    Convert(PlayerId),
}

/// Advance one particle's progress given its neighbor census
pub fn next_step(progress: f32, tally: &NeighborTally, config: &ConversionConfig, dt: f32) -> Step {
    let enemies = tally.enemy_total();
    let outnumbered =
        enemies > 0 && enemies as f32 > tally.friendly as f32 * config.friendly_support_factor;

    if !outnumbered {
        let decayed = progress - config.rate * config.decay_multiplier * dt;
        return Step::Hold(decayed.max(0.0));
    }

    let raised = progress + config.rate * dt;
    if raised < config.threshold {
        return Step::Hold(raised);
    }

    match tally.dominant_enemy() {
        Some(player) => Step::Convert(player),
        // Unreachable with enemies present; keep ownership and stay in range
        None => Step::Hold(0.0),
    }
}

/// An ownership change applied this tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transfer {
    pub particle: ParticleId,
    pub from: PlayerId,
    pub to: PlayerId,
}

/// Per-particle decision computed in the parallel pass
#[derive(Debug, Clone, Copy)]
struct Assessment {
    step: Step,
    dominant: Option<PlayerId>,
}

/// Per-tick output buffer for renderers and AI observers.
///
/// Overwritten by every conversion pass; only valid until the next tick.
#[derive(Debug, Clone, Default)]
pub struct ConversionFrame {
    /// Dominant enemy of each contested particle this tick
    dominant: Vec<Option<PlayerId>>,
    /// Ownership changes applied this tick, in particle order
    transfers: Vec<Transfer>,
    assessments: Vec<Assessment>,
}

impl ConversionFrame {
    pub fn with_capacity(particles: usize) -> Self {
        Self {
            dominant: vec![None; particles],
            transfers: Vec::new(),
            assessments: Vec::with_capacity(particles),
        }
    }

    /// Enemy player currently pressing on a particle, if any
    pub fn converting_into(&self, particle: ParticleId) -> Option<PlayerId> {
        self.dominant.get(particle).copied().flatten()
    }

    pub fn transfers(&self) -> &[Transfer] {
        &self.transfers
    }
}

/// Run the conversion state machine over every particle.
///
/// `progress` is indexed by particle slot and holds 0.0 for "no progress".
/// Returns the number of conversions applied.
pub fn update(
    particles: &mut [Particle],
    players: &mut [Player],
    progress: &mut [f32],
    frame: &mut ConversionFrame,
    index: &SpatialIndex,
    config: &ConversionConfig,
    dt: f32,
) -> usize {
    let snapshot: &[Particle] = particles;
    let current: &[f32] = progress;
    snapshot
        .par_iter()
        .enumerate()
        .map(|(id, _)| {
            let tally = tally_neighbors(id, snapshot, index, config.radius);
            Assessment {
                step: next_step(current[id], &tally, config, dt),
                dominant: tally.dominant_enemy(),
            }
        })
        .collect_into_vec(&mut frame.assessments);

    frame.dominant.resize(particles.len(), None);
    frame.transfers.clear();

    for (id, assessment) in frame.assessments.iter().enumerate() {
        frame.dominant[id] = assessment.dominant;
        match assessment.step {
            Step::Hold(value) => progress[id] = value,
            Step::Convert(to) => {
                let particle = &mut particles[id];
                let from = particle.owner;
                players[from].particle_count -= 1;
                players[to].particle_count += 1;
                particle.set_owner(to);
                progress[id] = 0.0;
                frame.transfers.push(Transfer { particle: id, from, to });
            }
        }
    }

    frame.transfers.len()
}
