//! Swarm Conquest simulation library
//!
//! A deterministic, fixed-timestep territory simulation: each player steers a
//! swarm of particles with a cursor, and particles that are locally outnumbered
//! by an enemy swarm gradually convert to it.
//!
//! The entry point is [`game::simulation::Simulation`]. Rendering, input
//! devices and networking live outside this crate; they drive it through
//! `advance`, the controller registry and the read-only accessors.

pub mod config;
pub mod error;
pub mod game;
pub mod util;

pub use config::SimConfig;
pub use error::{SimError, SimResult};
pub use game::simulation::Simulation;
