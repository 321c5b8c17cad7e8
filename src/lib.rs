//! Hex Duel - tactical core of a hexagonal bubble-matching arena
//!
//! Core modules:
//! - `sim`: Deterministic simulation (hex lattice, grid, trajectories, projectiles)
//! - `ai`: Opponent shot evaluation and decision state machine
//! - `arena`: Inbound interface wiring the simulation and the opponent together
//! - `settings`: Difficulty presets and profiles

pub mod ai;
pub mod arena;
pub mod settings;
pub mod sim;

pub use arena::Arena;
pub use settings::{Difficulty, DifficultyProfile};

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    use glam::Vec2;

    /// Simulation rate
    pub const TICKS_PER_SECOND: u64 = 120;
    /// Fixed simulation timestep (120 Hz for smooth physics)
    pub const SIM_DT: f32 = 1.0 / TICKS_PER_SECOND as f32;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Arena dimensions (screen space, y grows downward)
    pub const ARENA_WIDTH: f32 = 600.0;
    pub const ARENA_HEIGHT: f32 = 600.0;
    /// Pixel position of the lattice origin (the anchor cell)
    pub const GRID_CENTER: Vec2 = Vec2::new(300.0, 300.0);
    /// Launch points for the two shooters
    pub const PLAYER_LAUNCH: Vec2 = Vec2::new(300.0, 560.0);
    pub const OPPONENT_LAUNCH: Vec2 = Vec2::new(300.0, 40.0);

    /// Lattice geometry
    pub const HEX_SIZE: f32 = 18.0;
    /// Cells further than this from the center never hold pieces
    pub const BOARD_RADIUS: i32 = 7;
    /// Rings filled when a board is generated
    pub const START_RINGS: i32 = 4;

    /// Piece and projectile defaults
    pub const PIECE_RADIUS: f32 = 15.0;
    pub const PROJECTILE_RADIUS: f32 = 15.0;
    pub const PROJECTILE_SPEED: f32 = 600.0;
    /// Fraction of closing speed kept after projectile-projectile contact
    pub const RESTITUTION: f32 = 0.9;
    /// Max distance between a projectile and a resolved cell center to attach
    pub const SNAP_TOLERANCE: f32 = HEX_SIZE * 1.25;

    /// Aiming cone (degrees, 90 = straight at the grid)
    pub const AIM_MIN_DEGREES: f32 = 15.0;
    pub const AIM_MAX_DEGREES: f32 = 165.0;

    /// Same-color cluster size that pops
    pub const MATCH_THRESHOLD: usize = 3;

    /// Resource caps
    pub const MAX_PROJECTILES: usize = 16;
    pub const MAX_PENDING_EVENTS: usize = 256;
    pub const MAX_CANDIDATES: usize = 96;
    /// Ten seconds of flight
    pub const MAX_FLIGHT_TICKS: u32 = 10 * TICKS_PER_SECOND as u32;
}

/// Normalize an angle in degrees to [0, 360)
#[inline]
pub fn normalize_degrees(angle: f32) -> f32 {
    angle.rem_euclid(360.0)
}

/// Convert milliseconds to whole simulation ticks (rounded up, never zero)
#[inline]
pub fn ms_to_ticks(ms: u32) -> u64 {
    (ms as u64 * consts::TICKS_PER_SECOND).div_ceil(1000).max(1)
}

/// Squared distance helper for hot loops
#[inline]
pub fn distance_sq(a: Vec2, b: Vec2) -> f32 {
    (a - b).length_squared()
}
