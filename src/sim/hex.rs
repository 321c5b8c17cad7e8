//! Hex lattice coordinate math
//!
//! Cube coordinates (q, r, s) with q + r + s == 0, and a flat-top pixel layout
//! in screen space (y grows downward). With this layout `(0, +1, -1)` sits
//! directly below its origin, which is what the shooters aim "straight" at.

use std::ops::Add;

use glam::Vec2;
use serde::{Deserialize, Serialize};

const SQRT_3: f32 = 1.732_050_8;

/// Neighbor offsets in the fixed enumeration order
pub const DIRECTIONS: [HexCoordinate; 6] = [
    HexCoordinate { q: 1, r: 0, s: -1 },
    HexCoordinate { q: 1, r: -1, s: 0 },
    HexCoordinate { q: 0, r: -1, s: 1 },
    HexCoordinate { q: -1, r: 0, s: 1 },
    HexCoordinate { q: -1, r: 1, s: 0 },
    HexCoordinate { q: 0, r: 1, s: -1 },
];

/// A lattice cell in cube coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "CubeTriple")]
pub struct HexCoordinate {
    q: i32,
    r: i32,
    s: i32,
}

/// Unchecked wire form; only becomes a `HexCoordinate` if it sums to zero
#[derive(Deserialize)]
struct CubeTriple {
    q: i32,
    r: i32,
    s: i32,
}

/// A cube triple whose components don't sum to zero
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OffLattice {
    pub q: i32,
    pub r: i32,
    pub s: i32,
}

impl std::fmt::Display for OffLattice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "cube coordinate ({}, {}, {}) is off the lattice", self.q, self.r, self.s)
    }
}

impl std::error::Error for OffLattice {}

impl TryFrom<CubeTriple> for HexCoordinate {
    type Error = OffLattice;

    fn try_from(raw: CubeTriple) -> Result<Self, Self::Error> {
        let CubeTriple { q, r, s } = raw;
        HexCoordinate::try_new(q, r, s).ok_or(OffLattice { q, r, s })
    }
}

impl HexCoordinate {
    pub const ORIGIN: Self = Self { q: 0, r: 0, s: 0 };

    /// Build from cube components. Panics in debug builds if they don't sum to zero.
    pub fn new(q: i32, r: i32, s: i32) -> Self {
        debug_assert_eq!(q + r + s, 0, "cube coordinate ({q}, {r}, {s}) off the lattice");
        Self { q, r, s }
    }

    /// Build from cube components, rejecting triples off the lattice
    pub fn try_new(q: i32, r: i32, s: i32) -> Option<Self> {
        (q + r + s == 0).then_some(Self { q, r, s })
    }

    /// Build from axial components (s is derived)
    pub const fn axial(q: i32, r: i32) -> Self {
        Self { q, r, s: -q - r }
    }

    #[inline]
    pub fn q(&self) -> i32 {
        self.q
    }

    #[inline]
    pub fn r(&self) -> i32 {
        self.r
    }

    #[inline]
    pub fn s(&self) -> i32 {
        self.s
    }

    pub fn scale(self, k: i32) -> Self {
        Self::axial(self.q * k, self.r * k)
    }

    /// The six adjacent cells in `DIRECTIONS` order
    pub fn neighbors(self) -> [HexCoordinate; 6] {
        DIRECTIONS.map(|d| self + d)
    }

    /// Lattice distance: (|dq| + |dr| + |ds|) / 2
    pub fn distance(self, other: HexCoordinate) -> i32 {
        ((self.q - other.q).abs() + (self.r - other.r).abs() + (self.s - other.s).abs()) / 2
    }

    /// Round a fractional cube coordinate to the nearest cell
    pub fn round(q: f32, r: f32, s: f32) -> Self {
        let mut rq = q.round();
        let mut rr = r.round();
        let rs = s.round();

        let dq = (rq - q).abs();
        let dr = (rr - r).abs();
        let ds = (rs - s).abs();

        // Recompute the component with the largest rounding error
        if dq > dr && dq > ds {
            rq = -rr - rs;
        } else if dr > ds {
            rr = -rq - rs;
        }
        Self::axial(rq as i32, rr as i32)
    }
}

impl Add for HexCoordinate {
    type Output = HexCoordinate;

    fn add(self, rhs: HexCoordinate) -> HexCoordinate {
        HexCoordinate::axial(self.q + rhs.q, self.r + rhs.r)
    }
}

impl std::fmt::Display for HexCoordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.q, self.r, self.s)
    }
}

/// Cells at exactly `radius` steps from `center`, walking the ring in
/// `DIRECTIONS` order. Radius 0 yields the center only.
pub fn ring(center: HexCoordinate, radius: i32) -> Vec<HexCoordinate> {
    if radius <= 0 {
        return vec![center];
    }
    let mut cells = Vec::with_capacity(6 * radius as usize);
    let mut cursor = center + DIRECTIONS[4].scale(radius);
    for dir in DIRECTIONS {
        for _ in 0..radius {
            cells.push(cursor);
            cursor = cursor + dir;
        }
    }
    cells
}

/// All cells within `radius` of `center`, ring by ring
pub fn spiral(center: HexCoordinate, radius: i32) -> Vec<HexCoordinate> {
    (0..=radius.max(0)).flat_map(|k| ring(center, k)).collect()
}

/// Flat-top pixel layout
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HexLayout {
    /// Center-to-corner distance of a cell
    pub size: f32,
    /// Pixel position of `HexCoordinate::ORIGIN`
    pub origin: Vec2,
}

impl HexLayout {
    pub fn new(size: f32, origin: Vec2) -> Self {
        Self { size, origin }
    }

    /// Pixel center of a cell
    pub fn hex_to_pixel(&self, h: HexCoordinate) -> Vec2 {
        let q = h.q as f32;
        let r = h.r as f32;
        let x = self.size * 1.5 * q;
        let y = self.size * (SQRT_3 / 2.0 * q + SQRT_3 * r);
        self.origin + Vec2::new(x, y)
    }

    /// Cell containing a pixel
    pub fn pixel_to_hex(&self, p: Vec2) -> HexCoordinate {
        let local = (p - self.origin) / self.size;
        let q = 2.0 / 3.0 * local.x;
        let r = -1.0 / 3.0 * local.x + SQRT_3 / 3.0 * local.y;
        HexCoordinate::round(q, r, -q - r)
    }

    /// Distance between the centers of two adjacent cells
    pub fn neighbor_spacing(&self) -> f32 {
        self.size * SQRT_3
    }
}
