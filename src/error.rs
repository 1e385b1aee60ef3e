use crate::game::state::PlayerId;

/// Errors surfaced by the simulation's public API
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SimError {
    #[error("Player id {id} out of range (match has {player_count} players)")]
    InvalidPlayer { id: PlayerId, player_count: usize },
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type SimResult<T> = Result<T, SimError>;
