//! Short memory of the opponent's recent shots

use std::collections::VecDeque;

use crate::sim::{HexCoordinate, PieceColor};

/// Score removed from a candidate that repeats a remembered shot
pub const REPEAT_PENALTY: f32 = 15.0;

#[derive(Debug, Clone, Default)]
pub struct ShotMemory {
    window: usize,
    recent: VecDeque<(PieceColor, HexCoordinate)>,
}

impl ShotMemory {
    pub fn new(window: usize) -> Self {
        Self {
            window,
            recent: VecDeque::with_capacity(window),
        }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Shrinking the window forgets the oldest entries
    pub fn set_window(&mut self, window: usize) {
        self.window = window;
        while self.recent.len() > window {
            self.recent.pop_front();
        }
    }

    pub fn remember(&mut self, color: PieceColor, cell: HexCoordinate) {
        if self.window == 0 {
            return;
        }
        if self.recent.len() == self.window {
            self.recent.pop_front();
        }
        self.recent.push_back((color, cell));
    }

    /// Penalty for aiming `color` at `cell`: full for the same color on the
    /// same or an adjacent cell, half for another color on the same cell
    pub fn penalty(&self, color: PieceColor, cell: HexCoordinate) -> f32 {
        self.recent
            .iter()
            .map(|&(c, h)| {
                let dist = h.distance(cell);
                if c == color && dist <= 1 {
                    REPEAT_PENALTY
                } else if dist == 0 {
                    REPEAT_PENALTY * 0.5
                } else {
                    0.0
                }
            })
            .fold(0.0, f32::max)
    }

    pub fn len(&self) -> usize {
        self.recent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recent.is_empty()
    }

    pub fn clear(&mut self) {
        self.recent.clear();
    }
}
