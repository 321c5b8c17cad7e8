//! Collision detection and response for circles on a bounded plane
//!
//! Projectiles are equal-mass circles. Contacts between two projectiles are
//! resolved with a restitution impulse along the contact normal; the side
//! walls reflect perfectly.

use glam::Vec2;
use rand::Rng;

/// Result of a collision check
#[derive(Debug, Clone)]
pub struct CollisionResult {
    /// Whether a collision occurred
    pub hit: bool,
    /// Contact normal, pointing from the first body toward the second
    pub normal: Vec2,
    /// Penetration depth (for position correction)
    pub penetration: f32,
}

impl CollisionResult {
    pub fn miss() -> Self {
        Self {
            hit: false,
            normal: Vec2::ZERO,
            penetration: 0.0,
        }
    }
}

/// Check overlap between two circles
pub fn circle_circle_collision(a_pos: Vec2, a_radius: f32, b_pos: Vec2, b_radius: f32) -> CollisionResult {
    let delta = b_pos - a_pos;
    let dist_sq = delta.length_squared();
    let reach = a_radius + b_radius;
    if dist_sq >= reach * reach {
        return CollisionResult::miss();
    }

    let dist = dist_sq.sqrt();
    // Coincident centers: pick a fixed axis so the outcome stays deterministic
    let normal = if dist > 1e-6 { delta / dist } else { Vec2::X };
    CollisionResult {
        hit: true,
        normal,
        penetration: reach - dist,
    }
}

/// Separate two overlapping equal-mass bodies and apply a restitution impulse.
///
/// Returns false (and leaves velocities alone) when the bodies don't touch or
/// are already moving apart.
pub fn resolve_pair(
    a_pos: &mut Vec2,
    a_vel: &mut Vec2,
    b_pos: &mut Vec2,
    b_vel: &mut Vec2,
    radius: f32,
    restitution: f32,
) -> bool {
    let contact = circle_circle_collision(*a_pos, radius, *b_pos, radius);
    if !contact.hit {
        return false;
    }

    // Equal masses share the correction
    let correction = contact.normal * (contact.penetration * 0.5);
    *a_pos -= correction;
    *b_pos += correction;

    // Positive when closing along the normal
    let closing = (*a_vel - *b_vel).dot(contact.normal);
    if closing < 0.0 {
        return false;
    }

    let impulse = contact.normal * (closing * (1.0 + restitution) * 0.5);
    *a_vel -= impulse;
    *b_vel += impulse;
    true
}

/// Max rotation applied after a contact so two bodies can't lock together
pub const DEADLOCK_JITTER_RADIANS: f32 = 0.05;

/// Rotate a velocity by a small random angle, keeping its speed
pub fn perturb_velocity<R: Rng>(velocity: Vec2, rng: &mut R) -> Vec2 {
    let angle = rng.random_range(-DEADLOCK_JITTER_RADIANS..=DEADLOCK_JITTER_RADIANS);
    Vec2::from_angle(angle).rotate(velocity)
}

/// Reflect velocity off a surface
///
/// Standard reflection: v' = v - 2(v·n)n
#[inline]
pub fn reflect_velocity(velocity: Vec2, normal: Vec2) -> Vec2 {
    velocity - 2.0 * velocity.dot(normal) * normal
}

/// Check a circle against the two side walls (x = 0 and x = width)
pub fn side_wall_collision(pos: Vec2, radius: f32, width: f32) -> CollisionResult {
    if pos.x - radius < 0.0 {
        return CollisionResult {
            hit: true,
            normal: Vec2::X,
            penetration: radius - pos.x,
        };
    }
    if pos.x + radius > width {
        return CollisionResult {
            hit: true,
            normal: Vec2::NEG_X,
            penetration: pos.x + radius - width,
        };
    }
    CollisionResult::miss()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_circle_circle_collision() {
        let result = circle_circle_collision(Vec2::ZERO, 10.0, Vec2::new(15.0, 0.0), 10.0);
        assert!(result.hit);
        assert!((result.penetration - 5.0).abs() < 1e-4);
        assert!((result.normal - Vec2::X).length() < 1e-4);

        let result = circle_circle_collision(Vec2::ZERO, 10.0, Vec2::new(25.0, 0.0), 10.0);
        assert!(!result.hit);
    }

    #[test]
    fn test_head_on_elastic_exchanges_velocities() {
        let mut a_pos = Vec2::new(100.0, 100.0);
        let mut b_pos = Vec2::new(125.0, 100.0);
        let mut a_vel = Vec2::new(200.0, 0.0);
        let mut b_vel = Vec2::new(-200.0, 0.0);

        assert!(resolve_pair(&mut a_pos, &mut a_vel, &mut b_pos, &mut b_vel, 15.0, 1.0));
        assert!((a_vel - Vec2::new(-200.0, 0.0)).length() < 1e-3);
        assert!((b_vel - Vec2::new(200.0, 0.0)).length() < 1e-3);

        // Pushed apart to exactly touching
        assert!(((b_pos - a_pos).length() - 30.0).abs() < 1e-3);
    }

    #[test]
    fn test_restitution_loses_energy() {
        let mut a_pos = Vec2::ZERO;
        let mut b_pos = Vec2::new(20.0, 0.0);
        let mut a_vel = Vec2::new(100.0, 0.0);
        let mut b_vel = Vec2::ZERO;

        assert!(resolve_pair(&mut a_pos, &mut a_vel, &mut b_pos, &mut b_vel, 15.0, 0.5));
        let before = 100.0f32 * 100.0;
        let after = a_vel.length_squared() + b_vel.length_squared();
        assert!(after < before);
        // Separating afterwards
        assert!((a_vel - b_vel).dot(Vec2::X) < 0.0);
    }

    #[test]
    fn test_separating_pair_skipped() {
        let mut a_pos = Vec2::ZERO;
        let mut b_pos = Vec2::new(20.0, 0.0);
        let mut a_vel = Vec2::new(-50.0, 0.0);
        let mut b_vel = Vec2::new(50.0, 0.0);

        assert!(!resolve_pair(&mut a_pos, &mut a_vel, &mut b_pos, &mut b_vel, 15.0, 1.0));
        assert_eq!(a_vel, Vec2::new(-50.0, 0.0));
        assert_eq!(b_vel, Vec2::new(50.0, 0.0));
    }

    #[test]
    fn test_perturb_keeps_speed() {
        let mut rng = Pcg32::seed_from_u64(3);
        let v = Vec2::new(300.0, -400.0);
        for _ in 0..20 {
            let p = perturb_velocity(v, &mut rng);
            assert!((p.length() - 500.0).abs() < 1e-2);
            assert!(p.angle_to(v).abs() <= DEADLOCK_JITTER_RADIANS + 1e-4);
        }
    }

    #[test]
    fn test_reflect_velocity() {
        let velocity = Vec2::new(100.0, -50.0);
        let reflected = reflect_velocity(velocity, Vec2::X);
        assert!((reflected - Vec2::new(-100.0, -50.0)).length() < 1e-3);
    }

    #[test]
    fn test_side_walls() {
        assert!(!side_wall_collision(Vec2::new(300.0, 10.0), 15.0, 600.0).hit);
        let left = side_wall_collision(Vec2::new(10.0, 10.0), 15.0, 600.0);
        assert!(left.hit);
        assert_eq!(left.normal, Vec2::X);
        let right = side_wall_collision(Vec2::new(590.0, 10.0), 15.0, 600.0);
        assert!(right.hit);
        assert_eq!(right.normal, Vec2::NEG_X);
        assert!((right.penetration - 5.0).abs() < 1e-4);
    }
}
