//! Shot path validation
//!
//! Ray-marches straight shots against the grid and builds wall bounces with
//! the mirror-image construction: a shot that reflects once off a vertical
//! wall reaches `target` exactly when the straight shot toward `target`
//! mirrored across that wall would.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::grid::Grid;
use super::hex::HexCoordinate;
use crate::consts::*;
use crate::distance_sq;

/// Which way a launcher faces the grid.
///
/// Angles are degrees from the +x axis, turned toward the grid: 90 is always
/// straight at it, whichever side the launcher sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Facing {
    /// Bottom launcher, shooting toward smaller y
    Up,
    /// Top launcher, shooting toward larger y
    Down,
}

impl Facing {
    /// Unit direction for a launch angle
    pub fn direction(self, angle_degrees: f32) -> Vec2 {
        let (sin, cos) = angle_degrees.to_radians().sin_cos();
        match self {
            Facing::Up => Vec2::new(cos, -sin),
            Facing::Down => Vec2::new(cos, sin),
        }
    }

    /// Launch angle pointing from `origin` at `target`
    pub fn angle_to(self, origin: Vec2, target: Vec2) -> f32 {
        let d = target - origin;
        let forward = match self {
            Facing::Up => -d.y,
            Facing::Down => d.y,
        };
        forward.atan2(d.x).to_degrees()
    }
}

/// Vertical boundary a bounce shot reflects off
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Wall {
    Left,
    Right,
}

impl Wall {
    pub const BOTH: [Wall; 2] = [Wall::Left, Wall::Right];

    /// Mirror a point across this wall (left wall at x = 0, right at x = width)
    pub fn mirror(self, p: Vec2, bounds_width: f32) -> Vec2 {
        match self {
            Wall::Left => Vec2::new(-p.x, p.y),
            Wall::Right => Vec2::new(2.0 * bounds_width - p.x, p.y),
        }
    }

    pub fn x(self, bounds_width: f32) -> f32 {
        match self {
            Wall::Left => 0.0,
            Wall::Right => bounds_width,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Wall::Left => "left",
            Wall::Right => "right",
        }
    }
}

/// Allowed launch angles
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AimCone {
    pub min_degrees: f32,
    pub max_degrees: f32,
}

impl Default for AimCone {
    fn default() -> Self {
        Self {
            min_degrees: AIM_MIN_DEGREES,
            max_degrees: AIM_MAX_DEGREES,
        }
    }
}

impl AimCone {
    pub fn contains(&self, angle_degrees: f32) -> bool {
        angle_degrees >= self.min_degrees && angle_degrees <= self.max_degrees
    }

    pub fn clamp(&self, angle_degrees: f32) -> f32 {
        angle_degrees.clamp(self.min_degrees, self.max_degrees)
    }

    /// Part of the cone that points toward `wall`
    pub fn toward(&self, wall: Wall, angle_degrees: f32) -> bool {
        match wall {
            Wall::Left => angle_degrees > 90.0 && angle_degrees <= self.max_degrees,
            Wall::Right => angle_degrees >= self.min_degrees && angle_degrees < 90.0,
        }
    }
}

/// Sample spacing along a marched ray (pixels)
pub const MARCH_STEP: f32 = 4.0;

/// A bounce shot found by [`TrajectoryValidator::reflected_angle`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BounceShot {
    pub angle_degrees: f32,
    pub wall: Wall,
    /// Where the shot meets the wall
    pub wall_point: Vec2,
}

/// Path checks for one launcher
#[derive(Debug, Clone)]
pub struct TrajectoryValidator {
    pub facing: Facing,
    pub cone: AimCone,
    pub piece_radius: f32,
    pub projectile_radius: f32,
    pub bounds_width: f32,
    pub step: f32,
}

impl TrajectoryValidator {
    pub fn new(facing: Facing) -> Self {
        Self {
            facing,
            cone: AimCone::default(),
            piece_radius: PIECE_RADIUS,
            projectile_radius: PROJECTILE_RADIUS,
            bounds_width: ARENA_WIDTH,
            step: MARCH_STEP,
        }
    }

    /// True when a shot at `angle_degrees` reaches `target` without touching
    /// any piece first. Touching a piece close enough to `target` that the
    /// shot would snap into the target cell counts as arriving.
    pub fn is_path_clear(&self, origin: Vec2, angle_degrees: f32, target: Vec2, grid: &Grid) -> bool {
        self.cone.contains(angle_degrees) && self.first_obstruction(origin, angle_degrees, target, grid).is_none()
    }

    /// First piece the shot would hit before reaching `target`, if any.
    ///
    /// Ignores the aiming cone; `is_path_clear` applies it.
    pub fn first_obstruction(
        &self,
        origin: Vec2,
        angle_degrees: f32,
        target: Vec2,
        grid: &Grid,
    ) -> Option<HexCoordinate> {
        let dir = self.facing.direction(angle_degrees);
        let length = (target - origin).length();
        self.march(origin, dir, length, target, grid)
    }

    /// Angle for a single bounce off `wall` that lands on `target`.
    ///
    /// Accepted only when the angle points toward that wall and the leg from
    /// `origin` to the wall is clear.
    pub fn reflected_angle(&self, origin: Vec2, target: Vec2, wall: Wall, grid: &Grid) -> Option<f32> {
        self.bounce(origin, target, wall, grid).map(|b| b.angle_degrees)
    }

    /// Like [`Self::reflected_angle`] but also reports the wall contact point
    pub fn bounce(&self, origin: Vec2, target: Vec2, wall: Wall, grid: &Grid) -> Option<BounceShot> {
        let mirrored = wall.mirror(target, self.bounds_width);
        let angle = self.facing.angle_to(origin, mirrored);
        if !self.cone.toward(wall, angle) {
            return None;
        }

        let wall_x = wall.x(self.bounds_width);
        let span = mirrored.x - origin.x;
        if span.abs() < f32::EPSILON {
            return None;
        }
        let t = (wall_x - origin.x) / span;
        let wall_point = origin + (mirrored - origin) * t;

        if !self.is_path_clear(origin, angle, wall_point, grid) {
            return None;
        }
        Some(BounceShot {
            angle_degrees: angle,
            wall,
            wall_point,
        })
    }

    /// Checks the post-bounce leg from the wall contact to `target`
    pub fn bounce_path_clear(&self, shot: &BounceShot, target: Vec2, grid: &Grid) -> bool {
        let leg = target - shot.wall_point;
        let length = leg.length();
        if length < f32::EPSILON {
            return true;
        }
        self.march(shot.wall_point, leg / length, length, target, grid).is_none()
    }

    /// First piece touched before the shot arrives at `target`. A first
    /// contact within half a cell spacing of `target` snaps into the target
    /// cell, so it is an arrival rather than an obstruction.
    fn march(&self, origin: Vec2, dir: Vec2, length: f32, target: Vec2, grid: &Grid) -> Option<HexCoordinate> {
        let hit_dist = self.piece_radius + self.projectile_radius;
        let hit_sq = hit_dist * hit_dist;
        let arrive = grid.layout().neighbor_spacing() * 0.5;
        let arrive_sq = arrive * arrive;

        // Only pieces near the segment can be hit
        let end = origin + dir * length;
        let lo = origin.min(end) - Vec2::splat(hit_dist);
        let hi = origin.max(end) + Vec2::splat(hit_dist);
        let nearby: Vec<(HexCoordinate, Vec2)> = grid
            .pieces()
            .filter(|p| p.pixel.cmpge(lo).all() && p.pixel.cmple(hi).all())
            .map(|p| (p.hex, p.pixel))
            .collect();
        if nearby.is_empty() {
            return None;
        }

        let steps = (length / self.step).ceil() as u32;
        for i in 0..=steps {
            let d = (i as f32 * self.step).min(length);
            let sample = origin + dir * d;
            if let Some((hex, _)) = nearby.iter().find(|(_, c)| distance_sq(*c, sample) < hit_sq) {
                if distance_sq(sample, target) <= arrive_sq {
                    return None;
                }
                return Some(*hex);
            }
        }
        None
    }
}
