//! Snapping projectiles into the lattice
//!
//! The simulator only decides *when* a projectile touches the grid. Where it
//! lands and what happens next (matches, falls) belongs to an
//! [`AttachmentResolver`]. [`MatchResolver`] is the standard one.

use std::collections::HashSet;

use glam::Vec2;

use super::connectivity;
use super::events::{EventQueue, GameEvent};
use super::grid::Grid;
use super::hex::{HexCoordinate, spiral};
use super::projectile::Projectile;
use crate::consts::MATCH_THRESHOLD;
use crate::distance_sq;

pub trait AttachmentResolver {
    /// Nearest cell a projectile at `position` could occupy, if any
    fn nearest_open_cell(&self, grid: &Grid, position: Vec2) -> Option<HexCoordinate>;

    /// Insert the projectile at `cell` and apply the consequences.
    /// Returns false if the cell could not take it.
    fn attach(&mut self, grid: &mut Grid, projectile: &Projectile, cell: HexCoordinate, events: &mut EventQueue) -> bool;
}

/// Inserts the piece, pops same-color clusters of `threshold` or more, and
/// drops whatever loses support as a result.
#[derive(Debug, Clone)]
pub struct MatchResolver {
    pub threshold: usize,
    /// Pieces popped since creation (matched + fallen)
    pub total_removed: u64,
}

impl Default for MatchResolver {
    fn default() -> Self {
        Self {
            threshold: MATCH_THRESHOLD,
            total_removed: 0,
        }
    }
}

impl MatchResolver {
    pub fn new(threshold: usize) -> Self {
        Self {
            threshold,
            ..Self::default()
        }
    }

    /// A cell can hold a new piece if it is open and either supported by a
    /// neighbor or part of the anchor region
    fn can_hold(grid: &Grid, cell: HexCoordinate) -> bool {
        grid.is_open(cell) && (grid.is_anchor(cell) || cell.neighbors().iter().any(|n| grid.contains(*n)))
    }
}

impl AttachmentResolver for MatchResolver {
    fn nearest_open_cell(&self, grid: &Grid, position: Vec2) -> Option<HexCoordinate> {
        let home = grid.layout().pixel_to_hex(position);
        spiral(home, 1)
            .into_iter()
            .filter(|h| Self::can_hold(grid, *h))
            .min_by(|a, b| {
                distance_sq(grid.pixel_of(*a), position)
                    .total_cmp(&distance_sq(grid.pixel_of(*b), position))
                    .then(a.cmp(b))
            })
    }

    fn attach(&mut self, grid: &mut Grid, projectile: &Projectile, cell: HexCoordinate, events: &mut EventQueue) -> bool {
        let Some(piece) = grid.place(cell, projectile.color, false).cloned() else {
            log::warn!("Attach rejected: cell {} unavailable", cell);
            return false;
        };

        events.push(GameEvent::ProjectileAttached {
            projectile_id: projectile.id,
            owner: projectile.owner,
            piece,
            hex: cell,
        });

        let cluster = grid.cluster_at(cell, usize::MAX);
        if cluster.len() < self.threshold {
            return true;
        }

        let removal: HashSet<HexCoordinate> = cluster.iter().copied().collect();
        let support = connectivity::solve(grid, &removal);
        let removed = grid.remove_all(&cluster);
        let falling = grid.remove_all(&support.falling);
        self.total_removed += (removed.len() + falling.len()) as u64;

        log::info!(
            "{} match at {}: {} removed, {} falling",
            projectile.owner.as_str(),
            cell,
            removed.len(),
            falling.len()
        );

        events.push(GameEvent::MatchFound {
            owner: projectile.owner,
            removed,
            falling,
        });
        true
    }
}
