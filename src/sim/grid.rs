//! Lattice-addressed piece storage
//!
//! The grid owns every attached piece. Iteration order is by coordinate so
//! that anything walking the grid (scoring, attachment, board generation)
//! stays deterministic for a given seed.

use std::collections::{BTreeMap, HashSet, VecDeque};
use std::ops::Index;

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::hex::{HexCoordinate, HexLayout, spiral};

/// Piece colors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PieceColor {
    Red,
    Green,
    Blue,
    Yellow,
    Purple,
    Orange,
}

impl PieceColor {
    pub const ALL: [PieceColor; 6] = [
        PieceColor::Red,
        PieceColor::Green,
        PieceColor::Blue,
        PieceColor::Yellow,
        PieceColor::Purple,
        PieceColor::Orange,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PieceColor::Red => "red",
            PieceColor::Green => "green",
            PieceColor::Blue => "blue",
            PieceColor::Yellow => "yellow",
            PieceColor::Purple => "purple",
            PieceColor::Orange => "orange",
        }
    }
}

/// A piece attached to the lattice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Piece {
    pub id: u32,
    pub color: PieceColor,
    pub hex: HexCoordinate,
    pub pixel: Vec2,
    /// Carries a power-up; consumers decide what popping it does
    pub special: bool,
}

/// Map from lattice cell to piece
#[derive(Debug, Clone)]
pub struct Grid {
    layout: HexLayout,
    /// Cells beyond this distance from the origin are never open
    radius: i32,
    /// Cells treated as structurally supported
    anchors: Vec<HexCoordinate>,
    pieces: BTreeMap<HexCoordinate, Piece>,
    next_id: u32,
}

impl Grid {
    /// Empty grid anchored at the lattice origin
    pub fn new(layout: HexLayout, radius: i32) -> Self {
        Self {
            layout,
            radius,
            anchors: vec![HexCoordinate::ORIGIN],
            pieces: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Replace the anchor region
    pub fn with_anchors(mut self, anchors: Vec<HexCoordinate>) -> Self {
        self.anchors = anchors;
        self
    }

    pub fn layout(&self) -> &HexLayout {
        &self.layout
    }

    pub fn radius(&self) -> i32 {
        self.radius
    }

    pub fn anchors(&self) -> &[HexCoordinate] {
        &self.anchors
    }

    /// The cell the shooters are scored against (first anchor)
    pub fn objective(&self) -> HexCoordinate {
        self.anchors.first().copied().unwrap_or(HexCoordinate::ORIGIN)
    }

    pub fn is_anchor(&self, hex: HexCoordinate) -> bool {
        self.anchors.contains(&hex)
    }

    pub fn in_bounds(&self, hex: HexCoordinate) -> bool {
        hex.distance(HexCoordinate::ORIGIN) <= self.radius
    }

    /// In bounds and unoccupied
    pub fn is_open(&self, hex: HexCoordinate) -> bool {
        self.in_bounds(hex) && !self.pieces.contains_key(&hex)
    }

    pub fn len(&self) -> usize {
        self.pieces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }

    pub fn contains(&self, hex: HexCoordinate) -> bool {
        self.pieces.contains_key(&hex)
    }

    pub fn get(&self, hex: HexCoordinate) -> Option<&Piece> {
        self.pieces.get(&hex)
    }

    /// Pieces in coordinate order
    pub fn pieces(&self) -> impl Iterator<Item = &Piece> {
        self.pieces.values()
    }

    pub fn pixel_of(&self, hex: HexCoordinate) -> Vec2 {
        self.layout.hex_to_pixel(hex)
    }

    /// Attach a new piece. Returns `None` when the cell is taken or out of bounds.
    pub fn place(&mut self, hex: HexCoordinate, color: PieceColor, special: bool) -> Option<&Piece> {
        if !self.is_open(hex) {
            return None;
        }
        let id = self.next_id;
        self.next_id += 1;
        let piece = Piece {
            id,
            color,
            hex,
            pixel: self.layout.hex_to_pixel(hex),
            special,
        };
        self.pieces.insert(hex, piece);
        self.pieces.get(&hex)
    }

    pub fn remove(&mut self, hex: HexCoordinate) -> Option<Piece> {
        self.pieces.remove(&hex)
    }

    /// Remove every listed cell, returning the pieces that were present
    pub fn remove_all<'a>(&mut self, cells: impl IntoIterator<Item = &'a HexCoordinate>) -> Vec<Piece> {
        cells.into_iter().filter_map(|h| self.pieces.remove(h)).collect()
    }

    /// Colors currently on the board, in `PieceColor` order
    pub fn colors_present(&self) -> Vec<PieceColor> {
        let mut colors: Vec<PieceColor> = self.pieces.values().map(|p| p.color).collect();
        colors.sort();
        colors.dedup();
        colors
    }

    /// Same-color cluster reachable from the pieces adjacent to `cell`.
    ///
    /// `cell` itself is not included (it may be empty). Search stops once
    /// `cap` pieces have been collected.
    pub fn touching_cluster(&self, cell: HexCoordinate, color: PieceColor, cap: usize) -> Vec<HexCoordinate> {
        let seeds: Vec<HexCoordinate> = cell
            .neighbors()
            .into_iter()
            .filter(|h| self.get(*h).is_some_and(|p| p.color == color))
            .collect();
        self.flood_color(&seeds, color, cap, Some(cell))
    }

    /// Same-color cluster containing the piece at `start`, inclusive
    pub fn cluster_at(&self, start: HexCoordinate, cap: usize) -> Vec<HexCoordinate> {
        match self.get(start) {
            Some(piece) => self.flood_color(&[start], piece.color, cap, None),
            None => Vec::new(),
        }
    }

    fn flood_color(
        &self,
        seeds: &[HexCoordinate],
        color: PieceColor,
        cap: usize,
        skip: Option<HexCoordinate>,
    ) -> Vec<HexCoordinate> {
        let mut seen: HashSet<HexCoordinate> = HashSet::new();
        let mut queue = VecDeque::new();
        let mut cluster = Vec::new();

        for &seed in seeds {
            if seen.insert(seed) {
                queue.push_back(seed);
            }
        }

        while let Some(hex) = queue.pop_front() {
            cluster.push(hex);
            if cluster.len() >= cap {
                break;
            }
            for n in hex.neighbors() {
                if Some(n) == skip || seen.contains(&n) {
                    continue;
                }
                if self.get(n).is_some_and(|p| p.color == color) {
                    seen.insert(n);
                    queue.push_back(n);
                }
            }
        }

        cluster.sort();
        cluster
    }
}

impl Index<HexCoordinate> for Grid {
    type Output = Piece;

    /// Panics if the cell was never filled; callers must only index cells
    /// they got from the grid itself.
    fn index(&self, hex: HexCoordinate) -> &Piece {
        match self.pieces.get(&hex) {
            Some(piece) => piece,
            None => panic!("no piece at {hex}"),
        }
    }
}

/// Chance (out of 100) that a generated piece carries a power-up
const SPECIAL_CHANCE: u32 = 4;

/// Fill the first `rings` rings around the origin with random colors.
///
/// Uses only the first `palette` colors so early boards have bigger clusters.
pub fn generate_board<R: Rng>(grid: &mut Grid, rng: &mut R, rings: i32, palette: usize) {
    let palette = palette.clamp(1, PieceColor::ALL.len());
    let rings = rings.min(grid.radius());

    for hex in spiral(HexCoordinate::ORIGIN, rings) {
        let color = PieceColor::ALL[rng.random_range(0..palette)];
        let special = rng.random_range(0..100) < SPECIAL_CHANCE;
        grid.place(hex, color, special);
    }

    log::info!(
        "Generated board: rings={}, palette={}, pieces={}",
        rings,
        palette,
        grid.len()
    );
}
