//! Projectile entities and their lifecycle

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::grid::PieceColor;
use super::trajectory::Facing;
use crate::consts::*;

/// Which shooter fired a projectile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Owner {
    /// Bottom launcher
    Player,
    /// Top launcher
    Opponent,
}

impl Owner {
    pub fn facing(self) -> Facing {
        match self {
            Owner::Player => Facing::Up,
            Owner::Opponent => Facing::Down,
        }
    }

    pub fn launch_point(self) -> Vec2 {
        match self {
            Owner::Player => PLAYER_LAUNCH,
            Owner::Opponent => OPPONENT_LAUNCH,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Owner::Player => "player",
            Owner::Opponent => "opponent",
        }
    }
}

/// Projectile lifecycle: `Loaded → InFlight → {Attached | Popped | OutOfBounds}`.
/// Terminal states are discarded at the end of the tick they are reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectileState {
    /// Sitting in the launcher, not yet moving
    Loaded,
    InFlight,
    /// Handed to the attachment resolver
    Attached,
    /// Crossed the far boundary
    Popped,
    /// Left through its own side or exceeded its flight time
    OutOfBounds,
}

impl ProjectileState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ProjectileState::Attached | ProjectileState::Popped | ProjectileState::OutOfBounds
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projectile {
    pub id: u32,
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub color: PieceColor,
    pub owner: Owner,
    pub state: ProjectileState,
    /// Ticks spent in flight
    pub age_ticks: u32,
}

impl Projectile {
    /// A loaded projectile at the owner's launcher
    pub fn new(id: u32, color: PieceColor, owner: Owner) -> Self {
        Self {
            id,
            pos: owner.launch_point(),
            vel: Vec2::ZERO,
            radius: PROJECTILE_RADIUS,
            color,
            owner,
            state: ProjectileState::Loaded,
            age_ticks: 0,
        }
    }

    /// Start moving along `angle_degrees` (owner's facing convention)
    pub fn launch(&mut self, angle_degrees: f32, speed: f32) {
        if self.state == ProjectileState::Loaded {
            self.vel = self.owner.facing().direction(angle_degrees) * speed;
            self.state = ProjectileState::InFlight;
        }
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.state == ProjectileState::InFlight
    }

    /// Crossed the boundary on the far side from its launcher
    pub fn past_far_boundary(&self, height: f32) -> bool {
        match self.owner.facing() {
            Facing::Up => self.pos.y + self.radius < 0.0,
            Facing::Down => self.pos.y - self.radius > height,
        }
    }

    /// Came back out through its own launcher's side
    pub fn past_own_boundary(&self, height: f32) -> bool {
        match self.owner.facing() {
            Facing::Up => self.pos.y - self.radius > height,
            Facing::Down => self.pos.y + self.radius < 0.0,
        }
    }
}
