//! Win-condition evaluation and match summaries

use serde::Serialize;

use crate::config::WinCondition;
use crate::game::state::{Player, PlayerId};

/// Evaluate the win condition against current particle counts.
///
/// Players are scanned in id order and the first one that satisfies the
/// trigger decides the outcome:
/// - Elimination: the first player at or below the threshold ends the match;
///   the winner is whoever holds the most particles (lowest id on ties).
/// - Percentage: the first player whose share reaches the threshold wins.
pub fn check_winner(players: &[Player], total_particles: usize, condition: WinCondition) -> Option<PlayerId> {
    match condition {
        WinCondition::Elimination { threshold } => {
            players.iter().find(|p| p.particle_count <= threshold)?;
            leader(players)
        }
        WinCondition::Percentage { threshold } => {
            if total_particles == 0 {
                return None;
            }
            players
                .iter()
                .find(|p| p.particle_count as f64 / total_particles as f64 >= threshold as f64)
                .map(|p| p.id)
        }
    }
}

/// Player with the most particles, lowest id on ties
pub fn leader(players: &[Player]) -> Option<PlayerId> {
    players
        .iter()
        .min_by_key(|p| (std::cmp::Reverse(p.particle_count), p.id))
        .map(|p| p.id)
}

/// One row of the final standings
#[derive(Debug, Clone, Serialize)]
pub struct Standing {
    pub player_id: PlayerId,
    pub rank: u32,
    pub particle_count: usize,
    /// Share of all particles, 0..=1
    pub share: f32,
    pub is_ai: bool,
    pub controller: Option<String>,
    pub color: String,
}

/// Match summary for logging and JSON output
#[derive(Debug, Clone, Serialize)]
pub struct MatchSummary {
    pub winner: Option<PlayerId>,
    pub win_condition: WinCondition,
    pub ticks: u64,
    pub elapsed_secs: f64,
    pub total_particles: usize,
    pub standings: Vec<Standing>,
}

/// Rank players by particle count (desc), then id (asc)
pub fn standings(players: &[Player], total_particles: usize, controller_names: &[Option<String>]) -> Vec<Standing> {
    let mut ordered: Vec<&Player> = players.iter().collect();
    ordered.sort_by_key(|p| (std::cmp::Reverse(p.particle_count), p.id));

    ordered
        .into_iter()
        .enumerate()
        .map(|(i, p)| Standing {
            player_id: p.id,
            rank: (i + 1) as u32,
            particle_count: p.particle_count,
            share: if total_particles > 0 {
                p.particle_count as f32 / total_particles as f32
            } else {
                0.0
            },
            is_ai: p.is_ai,
            controller: controller_names.get(p.id).cloned().flatten(),
            color: p.color.to_hex(),
        })
        .collect()
}
