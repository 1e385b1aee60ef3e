pub mod constants;
pub mod match_result;
pub mod obstacles;
pub mod setup;
pub mod simulation;
pub mod spatial;
pub mod state;
pub mod systems;
