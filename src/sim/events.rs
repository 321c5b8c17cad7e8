//! Outbound events for the presentation layer
//!
//! Sound, particles and score UI subscribe to these; the core never calls
//! back into them.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use super::grid::{Piece, PieceColor};
use super::hex::HexCoordinate;
use super::projectile::Owner;
use crate::consts::MAX_PENDING_EVENTS;

/// Why a projectile left play without attaching
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PopReason {
    /// Crossed the far (absorbing) boundary
    FarBoundary,
    /// Left through its own side or flew too long
    OutOfBounds,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GameEvent {
    ProjectileAttached {
        projectile_id: u32,
        owner: Owner,
        piece: Piece,
        hex: HexCoordinate,
    },
    ProjectilePopped {
        projectile_id: u32,
        owner: Owner,
        reason: PopReason,
    },
    MatchFound {
        owner: Owner,
        removed: Vec<Piece>,
        falling: Vec<Piece>,
    },
    DecisionMade {
        angle_degrees: f32,
        color: PieceColor,
        reasoning: String,
    },
}

/// Bounded FIFO of pending events; the oldest are dropped when full
#[derive(Debug, Clone)]
pub struct EventQueue {
    events: VecDeque<GameEvent>,
    capacity: usize,
    dropped: u64,
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::with_capacity(MAX_PENDING_EVENTS)
    }
}

impl EventQueue {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(capacity.min(64)),
            capacity: capacity.max(1),
            dropped: 0,
        }
    }

    pub fn push(&mut self, event: GameEvent) {
        if self.events.len() >= self.capacity {
            self.events.pop_front();
            self.dropped += 1;
            log::warn!("Event queue full ({}), dropped oldest event", self.capacity);
        }
        self.events.push_back(event);
    }

    /// Take every pending event in emission order
    pub fn drain(&mut self) -> Vec<GameEvent> {
        self.events.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Total events lost to the cap since creation
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    pub fn iter(&self) -> impl Iterator<Item = &GameEvent> {
        self.events.iter()
    }
}
