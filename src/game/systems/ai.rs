//! AI cursor controllers
//!
//! Every controller answers the same question once per tick: where, in
//! normalized canvas coordinates, should this player's cursor head? The
//! simulation treats the answer as an absolute target and never looks at
//! which variant produced it.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::game::constants::ai::*;
use crate::game::state::{Obstacle, Particle, Player, PlayerId};
use crate::util::vec2::Vec2;

/// Canvas center in normalized coordinates, the fallback target
pub const CENTER: Vec2 = Vec2 { x: 0.5, y: 0.5 };

/// Read-only view of the simulation handed to controllers
#[derive(Debug, Clone, Copy)]
pub struct SimulationView<'a> {
    pub particles: &'a [Particle],
    pub players: &'a [Player],
    pub obstacles: &'a [Obstacle],
    pub width: f32,
    pub height: f32,
    pub tick: u64,
}

impl<'a> SimulationView<'a> {
    /// Mean position of a player's particles, or None if they own none
    pub fn centroid_of(&self, player: PlayerId) -> Option<Vec2> {
        centroid(self.particles.iter().filter(|p| p.owner == player))
    }

    /// Mean position of every particle not owned by `player`
    pub fn enemy_centroid(&self, player: PlayerId) -> Option<Vec2> {
        centroid(self.particles.iter().filter(|p| p.owner != player))
    }

    /// Convert a canvas position to [0, 1] coordinates
    pub fn normalize(&self, position: Vec2) -> Vec2 {
        Vec2::new(
            (position.x / self.width).clamp(0.0, 1.0),
            (position.y / self.height).clamp(0.0, 1.0),
        )
    }
}

fn centroid<'p>(particles: impl Iterator<Item = &'p Particle>) -> Option<Vec2> {
    let mut sum = Vec2::ZERO;
    let mut count = 0usize;
    for particle in particles {
        sum += particle.position;
        count += 1;
    }
    (count > 0).then(|| sum * (1.0 / count as f32))
}

/// Decision-provider capability plugged in from outside the core
pub trait TargetProvider: Send {
    /// Normalized [0, 1] cursor target for `player` this tick
    fn action(&mut self, view: &SimulationView<'_>, player: PlayerId) -> Vec2;

    /// Clear any internal state
    fn reset(&mut self) {}

    fn name(&self) -> &str;
}

/// Built-in controller variants plus a slot for external providers
pub enum AiController {
    /// Wanders between random targets
    Random(RandomController),
    /// Heads for the centroid of all enemy particles
    CenterOfMass,
    /// Chases the weakest surviving enemy, aiming past its centroid
    Aggressive,
    External(Box<dyn TargetProvider>),
}

impl AiController {
    pub fn random(seed: u64) -> Self {
        Self::Random(RandomController::new(seed))
    }

    pub fn external(provider: impl TargetProvider + 'static) -> Self {
        Self::External(Box::new(provider))
    }
}

impl std::fmt::Debug for AiController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AiController({})", self.name())
    }
}

impl TargetProvider for AiController {
    fn action(&mut self, view: &SimulationView<'_>, player: PlayerId) -> Vec2 {
        match self {
            AiController::Random(controller) => controller.action(view, player),
            AiController::CenterOfMass => view
                .enemy_centroid(player)
                .map(|target| view.normalize(target))
                .unwrap_or(CENTER),
            AiController::Aggressive => aggressive_target(view, player),
            AiController::External(provider) => provider.action(view, player),
        }
    }

    fn reset(&mut self) {
        match self {
            AiController::Random(controller) => controller.reset(),
            AiController::External(provider) => provider.reset(),
            AiController::CenterOfMass | AiController::Aggressive => {}
        }
    }

    fn name(&self) -> &str {
        match self {
            AiController::Random(_) => "random",
            AiController::CenterOfMass => "center-of-mass",
            AiController::Aggressive => "aggressive",
            AiController::External(provider) => provider.name(),
        }
    }
}

/// Target the weakest enemy still on the board (lowest id on ties)
fn aggressive_target(view: &SimulationView<'_>, player: PlayerId) -> Vec2 {
    let weakest = view
        .players
        .iter()
        .filter(|p| p.id != player && !p.is_eliminated())
        .min_by_key(|p| (p.particle_count, p.id));

    let Some(enemy_centroid) = weakest.and_then(|p| view.centroid_of(p.id)) else {
        return CENTER;
    };

    let target = match view.centroid_of(player) {
        Some(own) => enemy_centroid + (enemy_centroid - own) * AGGRESSIVE_OVERSHOOT,
        None => enemy_centroid,
    };
    view.normalize(target)
}

/// Seeded wandering controller
#[derive(Debug, Clone)]
pub struct RandomController {
    seed: u64,
    rng: StdRng,
    target: Vec2,
    next_retarget: u64,
}

impl RandomController {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: StdRng::seed_from_u64(seed),
            target: CENTER,
            next_retarget: 0,
        }
    }
}

impl TargetProvider for RandomController {
    fn action(&mut self, view: &SimulationView<'_>, _player: PlayerId) -> Vec2 {
        if view.tick >= self.next_retarget {
            self.target = Vec2::new(self.rng.gen_range(0.0..=1.0), self.rng.gen_range(0.0..=1.0));
            self.next_retarget = view.tick + RANDOM_RETARGET_TICKS;
        }
        self.target
    }

    fn reset(&mut self) {
        *self = Self::new(self.seed);
    }

    fn name(&self) -> &str {
        "random"
    }
}

/// Provider fed by an outside decision process over a channel.
///
/// Drains whatever arrived since the last tick and keeps the most recent
/// target; holds the previous target when nothing new came in.
pub struct ChannelProvider {
    name: String,
    receiver: Receiver<Vec2>,
    last: Vec2,
}

/// Clonable sending half of a [`ChannelProvider`]
#[derive(Clone)]
pub struct TargetSender {
    sender: Sender<Vec2>,
}

/// Target channel errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetSendError {
    /// Buffer is full (backpressure)
    Full,
    /// Provider dropped
    Disconnected,
}

impl TargetSender {
    /// Submit a normalized target (non-blocking)
    pub fn try_send(&self, target: Vec2) -> Result<(), TargetSendError> {
        self.sender.try_send(target).map_err(|e| match e {
            TrySendError::Full(_) => TargetSendError::Full,
            TrySendError::Disconnected(_) => TargetSendError::Disconnected,
        })
    }
}

impl ChannelProvider {
    /// Create a provider and the sender an outside process uses to drive it
    pub fn new(name: impl Into<String>, capacity: usize) -> (TargetSender, Self) {
        let (sender, receiver) = bounded(capacity);
        (
            TargetSender { sender },
            Self {
                name: name.into(),
                receiver,
                last: CENTER,
            },
        )
    }
}

impl TargetProvider for ChannelProvider {
    fn action(&mut self, _view: &SimulationView<'_>, _player: PlayerId) -> Vec2 {
        if let Some(latest) = self.receiver.try_iter().last() {
            self.last = latest;
        }
        self.last
    }

    fn reset(&mut self) {
        while self.receiver.try_recv().is_ok() {}
        self.last = CENTER;
    }

    fn name(&self) -> &str {
        &self.name
    }
}
