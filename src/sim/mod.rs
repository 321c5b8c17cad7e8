//! Deterministic simulation module
//!
//! Everything the two shooters share lives here. This module must be pure and
//! deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (grid by coordinate, projectiles by id)
//! - No rendering, audio or platform dependencies

pub mod attach;
pub mod collision;
pub mod connectivity;
pub mod events;
pub mod grid;
pub mod hex;
pub mod projectile;
pub mod scheduler;
pub mod simulator;
pub mod trajectory;

pub use attach::{AttachmentResolver, MatchResolver};
pub use collision::{CollisionResult, resolve_pair};
pub use connectivity::{Connectivity, solve as solve_connectivity};
pub use events::{EventQueue, GameEvent, PopReason};
pub use grid::{Grid, Piece, PieceColor, generate_board};
pub use hex::{HexCoordinate, HexLayout, OffLattice, ring, spiral};
pub use projectile::{Owner, Projectile, ProjectileState};
pub use scheduler::{Scheduler, Ticket};
pub use simulator::{ProjectileSimulator, SimConfig};
pub use trajectory::{AimCone, BounceShot, Facing, TrajectoryValidator, Wall};
