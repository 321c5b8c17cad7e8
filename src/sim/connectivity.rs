//! Support analysis: which pieces stay attached to the anchor region
//!
//! Used for real removals after a match and speculatively by the opponent's
//! lookahead, so it only ever reads the grid.

use std::collections::{HashSet, VecDeque};

use super::grid::Grid;
use super::hex::HexCoordinate;

/// Result of a support pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Connectivity {
    /// Remaining pieces with a path back to an anchor cell
    pub connected: HashSet<HexCoordinate>,
    /// Remaining pieces without one, in coordinate order
    pub falling: Vec<HexCoordinate>,
}

/// Split `grid − removal` into anchored and falling pieces.
///
/// BFS seeds from every occupied anchor cell that survives the removal. If the
/// removal empties the anchor region, nothing is connected and every remaining
/// piece falls.
pub fn solve(grid: &Grid, removal: &HashSet<HexCoordinate>) -> Connectivity {
    let present = |h: &HexCoordinate| grid.contains(*h) && !removal.contains(h);

    let mut connected: HashSet<HexCoordinate> = HashSet::with_capacity(grid.len());
    let mut queue = VecDeque::new();

    for anchor in grid.anchors() {
        if present(anchor) && connected.insert(*anchor) {
            queue.push_back(*anchor);
        }
    }

    while let Some(hex) = queue.pop_front() {
        for n in hex.neighbors() {
            if present(&n) && connected.insert(n) {
                queue.push_back(n);
            }
        }
    }

    // Grid iteration is in coordinate order, so `falling` comes out sorted
    let falling = grid
        .pieces()
        .map(|p| p.hex)
        .filter(|h| !removal.contains(h) && !connected.contains(h))
        .collect();

    Connectivity { connected, falling }
}

/// Number of pieces that would fall if `removal` were popped
pub fn falling_count(grid: &Grid, removal: &HashSet<HexCoordinate>) -> usize {
    solve(grid, removal).falling.len()
}
