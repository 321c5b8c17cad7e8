//! Fixed timestep projectile simulation
//!
//! One call to [`ProjectileSimulator::tick`] runs, in order: integration,
//! pairwise projectile contacts, side-wall reflection, grid attachment and
//! boundary despawn. Every projectile either advances or reaches a terminal
//! state within the tick; terminal ones are dropped before it returns.

use glam::Vec2;
use rand::Rng;

use super::attach::AttachmentResolver;
use super::collision::{perturb_velocity, reflect_velocity, resolve_pair, side_wall_collision};
use super::events::{EventQueue, GameEvent, PopReason};
use super::grid::{Grid, PieceColor};
use super::projectile::{Owner, Projectile, ProjectileState};
use super::trajectory::AimCone;
use crate::consts::*;
use crate::distance_sq;

/// Tunables for the simulation
#[derive(Debug, Clone)]
pub struct SimConfig {
    pub width: f32,
    pub height: f32,
    pub speed: f32,
    pub restitution: f32,
    /// Center distance to a piece that counts as touching the grid
    pub attach_range: f32,
    /// Max distance from a resolved cell center for the snap to happen
    pub snap_tolerance: f32,
    pub max_projectiles: usize,
    pub max_flight_ticks: u32,
    pub cone: AimCone,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            width: ARENA_WIDTH,
            height: ARENA_HEIGHT,
            speed: PROJECTILE_SPEED,
            restitution: RESTITUTION,
            attach_range: PIECE_RADIUS + PROJECTILE_RADIUS,
            snap_tolerance: SNAP_TOLERANCE,
            max_projectiles: MAX_PROJECTILES,
            max_flight_ticks: MAX_FLIGHT_TICKS,
            cone: AimCone::default(),
        }
    }
}

/// Owns every projectile from launch until it attaches or despawns
#[derive(Debug, Clone)]
pub struct ProjectileSimulator {
    pub config: SimConfig,
    /// Sorted by id
    projectiles: Vec<Projectile>,
    next_id: u32,
}

impl Default for ProjectileSimulator {
    fn default() -> Self {
        Self::new(SimConfig::default())
    }
}

impl ProjectileSimulator {
    pub fn new(config: SimConfig) -> Self {
        Self {
            config,
            projectiles: Vec::new(),
            next_id: 1,
        }
    }

    pub fn projectiles(&self) -> &[Projectile] {
        &self.projectiles
    }

    pub fn in_flight(&self, owner: Owner) -> usize {
        self.projectiles.iter().filter(|p| p.owner == owner && p.is_active()).count()
    }

    /// Launch a projectile from `owner`'s launcher. The angle is clamped to the
    /// aiming cone. Returns `None` when the in-flight cap is reached.
    pub fn fire(&mut self, angle_degrees: f32, color: PieceColor, owner: Owner) -> Option<u32> {
        if self.projectiles.len() >= self.config.max_projectiles {
            log::warn!(
                "Projectile cap ({}) reached, {} shot refused",
                self.config.max_projectiles,
                owner.as_str()
            );
            return None;
        }

        let id = self.next_id;
        self.next_id += 1;
        let mut projectile = Projectile::new(id, color, owner);
        projectile.launch(self.config.cone.clamp(angle_degrees), self.config.speed);
        self.projectiles.push(projectile);
        log::debug!("{} fired #{} at {:.1} deg", owner.as_str(), id, angle_degrees);
        Some(id)
    }

    /// Advance all projectiles by `dt` seconds
    pub fn tick<A, R>(&mut self, dt: f32, grid: &mut Grid, resolver: &mut A, rng: &mut R, events: &mut EventQueue)
    where
        A: AttachmentResolver + ?Sized,
        R: Rng,
    {
        self.integrate(dt);
        self.resolve_contacts(rng);
        self.reflect_off_walls();
        self.attach_to_grid(grid, resolver, events);
        self.despawn_out_of_play(events);

        self.projectiles.retain(|p| !p.state.is_terminal());
    }

    fn integrate(&mut self, dt: f32) {
        for p in self.projectiles.iter_mut().filter(|p| p.is_active()) {
            p.pos += p.vel * dt;
            p.age_ticks += 1;
        }
    }

    /// Pairwise in index order; a body in several contacts is resolved against
    /// each partner in turn within the same tick.
    fn resolve_contacts<R: Rng>(&mut self, rng: &mut R) {
        let restitution = self.config.restitution;
        let n = self.projectiles.len();
        for i in 0..n {
            for j in (i + 1)..n {
                let (head, tail) = self.projectiles.split_at_mut(j);
                let a = &mut head[i];
                let b = &mut tail[0];
                if !a.is_active() || !b.is_active() {
                    continue;
                }
                let radius = a.radius.max(b.radius);
                if resolve_pair(&mut a.pos, &mut a.vel, &mut b.pos, &mut b.vel, radius, restitution) {
                    a.vel = perturb_velocity(a.vel, rng);
                    b.vel = perturb_velocity(b.vel, rng);
                }
            }
        }
    }

    fn reflect_off_walls(&mut self) {
        let width = self.config.width;
        for p in self.projectiles.iter_mut().filter(|p| p.is_active()) {
            let wall = side_wall_collision(p.pos, p.radius, width);
            if wall.hit {
                p.pos += wall.normal * wall.penetration;
                // Only flip when heading into the wall
                if p.vel.dot(wall.normal) < 0.0 {
                    p.vel = reflect_velocity(p.vel, wall.normal);
                }
            }
        }
    }

    fn attach_to_grid<A>(&mut self, grid: &mut Grid, resolver: &mut A, events: &mut EventQueue)
    where
        A: AttachmentResolver + ?Sized,
    {
        let range_sq = self.config.attach_range * self.config.attach_range;
        let snap_sq = self.config.snap_tolerance * self.config.snap_tolerance;

        for p in self.projectiles.iter_mut().filter(|p| p.is_active()) {
            if !touches_grid(grid, p.pos, range_sq) {
                continue;
            }
            let Some(cell) = resolver.nearest_open_cell(grid, p.pos) else {
                continue;
            };
            if distance_sq(grid.pixel_of(cell), p.pos) > snap_sq {
                continue;
            }

            p.state = ProjectileState::Attached;
            if !resolver.attach(grid, p, cell, events) {
                p.state = ProjectileState::InFlight;
            }
        }
    }

    fn despawn_out_of_play(&mut self, events: &mut EventQueue) {
        let height = self.config.height;
        let max_age = self.config.max_flight_ticks;

        for p in self.projectiles.iter_mut().filter(|p| p.is_active()) {
            let reason = if p.past_far_boundary(height) {
                p.state = ProjectileState::Popped;
                PopReason::FarBoundary
            } else if p.past_own_boundary(height) || p.age_ticks >= max_age {
                p.state = ProjectileState::OutOfBounds;
                PopReason::OutOfBounds
            } else {
                continue;
            };

            events.push(GameEvent::ProjectilePopped {
                projectile_id: p.id,
                owner: p.owner,
                reason,
            });
        }
    }
}

/// Within `range` of a piece, or of an empty anchor cell (so an empty board
/// can still be rebuilt)
fn touches_grid(grid: &Grid, pos: Vec2, range_sq: f32) -> bool {
    grid.pieces().any(|piece| distance_sq(piece.pixel, pos) < range_sq)
        || grid
            .anchors()
            .iter()
            .any(|&a| !grid.contains(a) && distance_sq(grid.pixel_of(a), pos) < range_sq)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::attach::MatchResolver;
    use crate::sim::hex::{HexCoordinate, HexLayout};
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    struct Fixture {
        sim: ProjectileSimulator,
        grid: Grid,
        resolver: MatchResolver,
        rng: Pcg32,
        events: EventQueue,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                sim: ProjectileSimulator::default(),
                grid: Grid::new(HexLayout::new(HEX_SIZE, GRID_CENTER), BOARD_RADIUS),
                resolver: MatchResolver::default(),
                rng: Pcg32::seed_from_u64(11),
                events: EventQueue::default(),
            }
        }

        fn step(&mut self) {
            self.sim
                .tick(SIM_DT, &mut self.grid, &mut self.resolver, &mut self.rng, &mut self.events);
        }

        fn run(&mut self, ticks: u32) {
            for _ in 0..ticks {
                self.step();
            }
        }
    }

    #[test]
    fn test_straight_shot_attaches_below_anchor() {
        let mut f = Fixture::new();
        f.grid.place(HexCoordinate::ORIGIN, PieceColor::Red, false);
        f.sim.fire(90.0, PieceColor::Blue, Owner::Player).unwrap();

        f.run(120);

        assert!(f.sim.projectiles().is_empty());
        let below = HexCoordinate::new(0, 1, -1);
        assert_eq!(f.grid[below].color, PieceColor::Blue);
        let events = f.events.drain();
        assert!(events.iter().any(|e| matches!(
            e,
            GameEvent::ProjectileAttached { hex, owner: Owner::Player, .. } if *hex == below
        )));
    }

    #[test]
    fn test_never_active_and_attached() {
        let mut f = Fixture::new();
        f.grid.place(HexCoordinate::ORIGIN, PieceColor::Red, false);
        let id = f.sim.fire(90.0, PieceColor::Blue, Owner::Player).unwrap();

        for _ in 0..120 {
            f.step();
            let in_flight = f.sim.projectiles().iter().any(|p| p.id == id && p.is_active());
            let attached = f.grid.len() == 2;
            assert!(!(in_flight && attached));
        }
    }

    #[test]
    fn test_far_boundary_pops() {
        let mut f = Fixture::new();
        // Nothing to attach to anywhere
        f.grid = f.grid.clone().with_anchors(Vec::new());
        f.sim.fire(30.0, PieceColor::Green, Owner::Opponent).unwrap();

        f.run(600);

        assert!(f.sim.projectiles().is_empty());
        let events = f.events.drain();
        assert!(events.iter().any(|e| matches!(
            e,
            GameEvent::ProjectilePopped { reason: PopReason::FarBoundary, owner: Owner::Opponent, .. }
        )));
    }

    #[test]
    fn test_side_wall_reflection() {
        let mut f = Fixture::new();
        f.sim.config.max_flight_ticks = u32::MAX;
        f.sim.fire(20.0, PieceColor::Red, Owner::Player).unwrap();
        let start_vel = f.sim.projectiles()[0].vel;
        assert!(start_vel.x > 0.0);

        let mut reflected = false;
        for _ in 0..120 {
            f.step();
            let Some(p) = f.sim.projectiles().first() else { break };
            assert!(p.pos.x + p.radius <= ARENA_WIDTH + 1e-3);
            if p.vel.x < 0.0 {
                reflected = true;
                // No energy lost to the wall
                assert!((p.vel.length() - start_vel.length()).abs() < 1e-2);
                break;
            }
        }
        assert!(reflected);
    }

    #[test]
    fn test_flight_time_limit_despawns() {
        let mut f = Fixture::new();
        f.sim.config.max_flight_ticks = 5;
        f.sim.fire(90.0, PieceColor::Red, Owner::Player).unwrap();
        f.run(5);
        assert!(f.sim.projectiles().is_empty());
        let events = f.events.drain();
        assert!(matches!(
            events[0],
            GameEvent::ProjectilePopped { reason: PopReason::OutOfBounds, .. }
        ));
    }

    #[test]
    fn test_projectile_cap() {
        let mut f = Fixture::new();
        f.sim.config.max_projectiles = 2;
        assert!(f.sim.fire(90.0, PieceColor::Red, Owner::Player).is_some());
        assert!(f.sim.fire(90.0, PieceColor::Red, Owner::Opponent).is_some());
        assert!(f.sim.fire(60.0, PieceColor::Red, Owner::Player).is_none());
        assert_eq!(f.sim.in_flight(Owner::Player), 1);
    }

    #[test]
    fn test_fire_clamps_to_cone() {
        let mut f = Fixture::new();
        f.sim.fire(2.0, PieceColor::Red, Owner::Player).unwrap();
        let v = f.sim.projectiles()[0].vel;
        let angle = Owner::Player.facing().angle_to(Vec2::ZERO, v);
        assert!((angle - AIM_MIN_DEGREES).abs() < 1e-3);
    }

    #[test]
    fn test_head_on_projectiles_bounce_apart() {
        let mut f = Fixture::new();
        f.sim.config.restitution = 1.0;
        f.sim.fire(90.0, PieceColor::Red, Owner::Player).unwrap();
        f.sim.fire(90.0, PieceColor::Blue, Owner::Opponent).unwrap();

        // Launchers face each other along x = 300 with no grid in between
        f.grid = f.grid.clone().with_anchors(Vec::new());
        let mut collided = false;
        for _ in 0..120 {
            f.step();
            let ps = f.sim.projectiles();
            if ps.len() == 2 && ps[0].vel.y > 0.0 && ps[1].vel.y < 0.0 {
                collided = true;
                // Velocities roughly exchanged (up to jitter)
                assert!((ps[0].vel.length() - PROJECTILE_SPEED).abs() < 1.0);
                assert!((ps[0].pos - ps[1].pos).length() >= 2.0 * PROJECTILE_RADIUS - 1e-2);
                break;
            }
        }
        assert!(collided);
    }
}
