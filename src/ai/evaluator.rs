//! Opponent shot selection
//!
//! Scoring priorities, strongest first: pieces that would fall, size of the
//! matched cluster, closeness to the objective cell. When no direct shot is
//! open the evaluator falls back to wall bounces, then to the least crowded
//! clear sector of the aiming cone, then to a random legal angle. The last
//! step always succeeds, so `evaluate` always returns a shot.

use std::collections::{BTreeSet, HashSet};

use glam::Vec2;
use rand::Rng;

use super::memory::ShotMemory;
use crate::consts::*;
use crate::distance_sq;
use crate::settings::DifficultyProfile;
use crate::sim::connectivity::falling_count;
use crate::sim::{Grid, HexCoordinate, Owner, PieceColor, TrajectoryValidator, Wall};

/// Points per existing piece in the touched cluster
pub const MATCH_WEIGHT: f32 = 10.0;
/// Flat bonus when the shot completes a match
pub const POP_BONUS: f32 = 25.0;
/// Points per piece that would fall; dominates everything else
pub const FALL_WEIGHT: f32 = 40.0;
/// Points per step inside the objective radius
pub const PROXIMITY_WEIGHT: f32 = 4.0;
pub const PROXIMITY_RADIUS: i32 = 2;
/// Max bonus for shooting straight at the grid
pub const STRAIGHT_WEIGHT: f32 = 2.0;
/// Flat cost of needing a wall bounce
pub const BOUNCE_DISCOUNT: f32 = 8.0;
/// Raw lead the best shot needs over the runner-up to skip the repetition penalty
pub const CLEAR_MARGIN: f32 = 20.0;
/// Horizontal offset of the near-miss aim points (pixels)
pub const NEAR_MISS_PX: f32 = PIECE_RADIUS * 0.5;
/// Bound on the same-color flood fill per candidate
pub const MATCH_SEARCH_CAP: usize = 24;
/// Sectors the aiming cone is split into for the open-sector fallback
pub const SECTOR_COUNT: usize = 10;

/// How a decision was reached; kept so it can be rechecked before firing
#[derive(Debug, Clone, PartialEq)]
pub enum ShotPlan {
    Direct {
        hex: HexCoordinate,
        target: Vec2,
        /// Angle before jitter
        aim_degrees: f32,
    },
    Bounce {
        hex: HexCoordinate,
        target: Vec2,
        wall: Wall,
    },
    OpenSector {
        sector: usize,
    },
    Random,
}

/// A scored placement; lives for one evaluation only
#[derive(Debug, Clone)]
pub struct ShotCandidate {
    pub target_pixel: Vec2,
    pub target_hex: HexCoordinate,
    pub angle_degrees: f32,
    pub color: PieceColor,
    /// Existing same-color pieces the shot would join
    pub match_size: usize,
    pub base_score: f32,
    pub fall_bonus: f32,
    pub total_score: f32,
    /// Penalty from the repetition memory (already subtracted)
    pub repeat_penalty: f32,
    /// Wall for bounce shots
    pub bounce: Option<Wall>,
    pub reasoning: String,
}

impl ShotCandidate {
    pub fn plan(&self) -> ShotPlan {
        match self.bounce {
            Some(wall) => ShotPlan::Bounce {
                hex: self.target_hex,
                target: self.target_pixel,
                wall,
            },
            None => ShotPlan::Direct {
                hex: self.target_hex,
                target: self.target_pixel,
                aim_degrees: self.angle_degrees,
            },
        }
    }
}

/// Evaluator output
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub angle_degrees: f32,
    pub color: PieceColor,
    /// Diagnostic only
    pub reasoning: String,
    pub plan: ShotPlan,
}

/// Scores shots for one launcher
#[derive(Debug, Clone)]
pub struct ShotEvaluator {
    pub origin: Vec2,
    pub validator: TrajectoryValidator,
    pub match_threshold: usize,
}

impl ShotEvaluator {
    pub fn new(origin: Vec2, validator: TrajectoryValidator) -> Self {
        Self {
            origin,
            validator,
            match_threshold: MATCH_THRESHOLD,
        }
    }

    /// Evaluator for a shooter's own launcher
    pub fn for_owner(owner: Owner) -> Self {
        Self::new(owner.launch_point(), TrajectoryValidator::new(owner.facing()))
    }

    /// Pick a shot for `color` on a grid snapshot
    pub fn evaluate<R: Rng>(
        &self,
        snapshot: &Grid,
        color: PieceColor,
        memory: &ShotMemory,
        profile: &DifficultyProfile,
        rng: &mut R,
    ) -> Decision {
        let mut pool = self.direct_candidates(snapshot, color, memory, profile);
        let source = if pool.is_empty() {
            pool = self.bounce_candidates(snapshot, color, memory, profile);
            "bounce"
        } else {
            "direct"
        };
        log::debug!("{} {} candidates for {}", pool.len(), source, color.as_str());

        if !pool.is_empty() {
            let flat_random = rng.random::<f32>() < profile.random_shot_probability;
            let chosen = if flat_random && pool.len() > 1 {
                // Any candidate except the best
                let mut pick = pool.swap_remove(rng.random_range(1..pool.len()));
                pick.reasoning = format!("random pick over best: {}", pick.reasoning);
                pick
            } else {
                pool.swap_remove(0)
            };
            return self.aim(chosen, profile, rng);
        }

        if let Some((angle, sector, occupancy)) = self.open_sector(snapshot) {
            return Decision {
                angle_degrees: angle,
                color,
                reasoning: format!("open sector {sector} ({occupancy} pieces) at {angle:.1} deg"),
                plan: ShotPlan::OpenSector { sector },
            };
        }

        let cone = self.validator.cone;
        let angle = rng.random_range(cone.min_degrees..=cone.max_degrees);
        Decision {
            angle_degrees: angle,
            color,
            reasoning: format!("no open path, random angle {angle:.1} deg"),
            plan: ShotPlan::Random,
        }
    }

    /// Direct candidates, best first
    pub fn direct_candidates(
        &self,
        grid: &Grid,
        color: PieceColor,
        memory: &ShotMemory,
        profile: &DifficultyProfile,
    ) -> Vec<ShotCandidate> {
        let facing = self.validator.facing;
        let mut candidates = Vec::new();

        for cell in self.target_cells(grid, color) {
            let center = grid.pixel_of(cell);
            let aim_points = [
                center,
                center - Vec2::new(NEAR_MISS_PX, 0.0),
                center + Vec2::new(NEAR_MISS_PX, 0.0),
            ];
            let clear = aim_points.into_iter().find_map(|target| {
                let angle = facing.angle_to(self.origin, target);
                self.validator
                    .is_path_clear(self.origin, angle, target, grid)
                    .then_some((target, angle))
            });
            if let Some((target, angle)) = clear {
                candidates.push(self.score(grid, cell, target, angle, color, None));
            }
        }

        self.rank(candidates, memory, profile)
    }

    /// Wall-bounce candidates, best first
    pub fn bounce_candidates(
        &self,
        grid: &Grid,
        color: PieceColor,
        memory: &ShotMemory,
        profile: &DifficultyProfile,
    ) -> Vec<ShotCandidate> {
        let mut candidates = Vec::new();

        for cell in self.target_cells(grid, color) {
            let target = grid.pixel_of(cell);
            let best = Wall::BOTH
                .into_iter()
                .filter_map(|wall| self.validator.bounce(self.origin, target, wall, grid))
                .filter(|shot| self.validator.bounce_path_clear(shot, target, grid))
                .map(|shot| self.score(grid, cell, target, shot.angle_degrees, color, Some(shot.wall)))
                .max_by(|a, b| a.total_score.total_cmp(&b.total_score));
            if let Some(candidate) = best {
                candidates.push(candidate);
            }
        }

        self.rank(candidates, memory, profile)
    }

    /// Whether a decision made on an older snapshot still holds on `grid`
    pub fn still_valid(&self, decision: &Decision, grid: &Grid) -> bool {
        match &decision.plan {
            ShotPlan::Direct { hex, target, aim_degrees } => {
                grid.is_open(*hex) && self.validator.is_path_clear(self.origin, *aim_degrees, *target, grid)
            }
            ShotPlan::Bounce { hex, target, wall } => {
                grid.is_open(*hex)
                    && self
                        .validator
                        .bounce(self.origin, *target, *wall, grid)
                        .is_some_and(|shot| self.validator.bounce_path_clear(&shot, *target, grid))
            }
            ShotPlan::OpenSector { .. } | ShotPlan::Random => true,
        }
    }

    /// Open cells next to pieces of `color`
    fn target_cells(&self, grid: &Grid, color: PieceColor) -> BTreeSet<HexCoordinate> {
        grid.pieces()
            .filter(|p| p.color == color)
            .flat_map(|p| p.hex.neighbors())
            .filter(|h| grid.is_open(*h))
            .collect()
    }

    fn score(
        &self,
        grid: &Grid,
        cell: HexCoordinate,
        target: Vec2,
        angle: f32,
        color: PieceColor,
        bounce: Option<Wall>,
    ) -> ShotCandidate {
        let cluster = grid.touching_cluster(cell, color, MATCH_SEARCH_CAP);
        let match_size = cluster.len();
        let pops = match_size + 1 >= self.match_threshold;

        let falls = if pops {
            let removal: HashSet<HexCoordinate> = cluster.into_iter().collect();
            falling_count(grid, &removal)
        } else {
            0
        };
        let fall_bonus = falls as f32 * FALL_WEIGHT;

        let dist = cell.distance(grid.objective());
        let proximity = (PROXIMITY_RADIUS - dist + 1).max(0) as f32 * PROXIMITY_WEIGHT;

        let mut base = match_size as f32 * MATCH_WEIGHT + proximity;
        if pops {
            base += POP_BONUS;
        }
        match bounce {
            Some(_) => base -= BOUNCE_DISCOUNT,
            None => base += STRAIGHT_WEIGHT * (1.0 - (angle - 90.0).abs() / 75.0).max(0.0),
        }

        let kind = match bounce {
            Some(wall) => format!("{} bounce", wall.as_str()),
            None => "direct".to_string(),
        };
        let reasoning = format!(
            "{kind} to {cell}: match {match_size}{}, falls {falls}, objective dist {dist}",
            if pops { " (pops)" } else { "" },
        );

        ShotCandidate {
            target_pixel: target,
            target_hex: cell,
            angle_degrees: angle,
            color,
            match_size,
            base_score: base,
            fall_bonus,
            total_score: base + fall_bonus,
            repeat_penalty: 0.0,
            bounce,
            reasoning,
        }
    }

    /// Apply the repetition memory, sort best first and cap the list
    fn rank(
        &self,
        mut candidates: Vec<ShotCandidate>,
        memory: &ShotMemory,
        profile: &DifficultyProfile,
    ) -> Vec<ShotCandidate> {
        sort_by_score(&mut candidates, self.origin);

        // A clear winner keeps its raw score when the profile allows it
        let exempt = match candidates.as_slice() {
            [best, runner_up, ..] if profile.clear_shot_override => {
                (best.total_score - runner_up.total_score >= CLEAR_MARGIN).then_some(best.target_hex)
            }
            [best] if profile.clear_shot_override => Some(best.target_hex),
            _ => None,
        };

        for candidate in candidates.iter_mut() {
            if Some(candidate.target_hex) == exempt {
                continue;
            }
            let penalty = memory.penalty(candidate.color, candidate.target_hex);
            if penalty > 0.0 {
                candidate.repeat_penalty = penalty;
                candidate.base_score -= penalty;
                candidate.total_score -= penalty;
                candidate.reasoning.push_str(", repeat penalty");
            }
        }

        sort_by_score(&mut candidates, self.origin);
        if candidates.len() > MAX_CANDIDATES {
            log::debug!("Truncating {} candidates to {}", candidates.len(), MAX_CANDIDATES);
            candidates.truncate(MAX_CANDIDATES);
        }
        candidates
    }

    /// Turn a candidate into a decision, applying the profile's jitter
    fn aim<R: Rng>(&self, candidate: ShotCandidate, profile: &DifficultyProfile, rng: &mut R) -> Decision {
        let facing = self.validator.facing;
        let mut angle = candidate.angle_degrees;

        if profile.position_jitter_pixels > 0.0 {
            let j = profile.position_jitter_pixels;
            let offset = Vec2::new(rng.random_range(-j..=j), rng.random_range(-j..=j));
            let aim_point = candidate.target_pixel + offset;
            angle = match candidate.bounce {
                Some(wall) => facing.angle_to(self.origin, wall.mirror(aim_point, self.validator.bounds_width)),
                None => facing.angle_to(self.origin, aim_point),
            };
        }
        if profile.angle_jitter_degrees > 0.0 {
            let j = profile.angle_jitter_degrees;
            angle += rng.random_range(-j..=j);
        }
        let angle = self.validator.cone.clamp(angle);

        log::debug!(
            "Chose {} (score {:.1}) at {:.1} deg",
            candidate.reasoning,
            candidate.total_score,
            angle
        );

        Decision {
            angle_degrees: angle,
            color: candidate.color,
            plan: candidate.plan(),
            reasoning: format!("{} [score {:.1}]", candidate.reasoning, candidate.total_score),
        }
    }

    /// Least crowded sector whose center ray reaches the objective's distance
    /// unobstructed. Returns (angle, sector index, pieces in sector).
    fn open_sector(&self, grid: &Grid) -> Option<(f32, usize, usize)> {
        let facing = self.validator.facing;
        let cone = self.validator.cone;
        let width = (cone.max_degrees - cone.min_degrees) / SECTOR_COUNT as f32;

        let mut occupancy = [0usize; SECTOR_COUNT];
        for piece in grid.pieces() {
            let angle = facing.angle_to(self.origin, piece.pixel);
            if cone.contains(angle) {
                let idx = (((angle - cone.min_degrees) / width) as usize).min(SECTOR_COUNT - 1);
                occupancy[idx] += 1;
            }
        }

        let center = |i: usize| cone.min_degrees + width * (i as f32 + 0.5);
        let mut order: Vec<usize> = (0..SECTOR_COUNT).collect();
        order.sort_by(|&a, &b| {
            occupancy[a]
                .cmp(&occupancy[b])
                .then((center(a) - 90.0).abs().total_cmp(&(center(b) - 90.0).abs()))
        });

        let reach = (grid.pixel_of(grid.objective()) - self.origin).length();
        order.into_iter().find_map(|i| {
            let angle = center(i);
            let target = self.origin + facing.direction(angle) * reach;
            self.validator
                .is_path_clear(self.origin, angle, target, grid)
                .then_some((angle, i, occupancy[i]))
        })
    }
}

/// Highest score first. Equal scores prefer the cell nearer the launcher,
/// then coordinate order.
fn sort_by_score(candidates: &mut [ShotCandidate], origin: Vec2) {
    candidates.sort_by(|a, b| {
        b.total_score
            .total_cmp(&a.total_score)
            .then(distance_sq(a.target_pixel, origin).total_cmp(&distance_sq(b.target_pixel, origin)))
            .then(a.target_hex.cmp(&b.target_hex))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::memory::REPEAT_PENALTY;
    use crate::settings::Difficulty;
    use crate::sim::{EventQueue, GameEvent, HexLayout, MatchResolver, ProjectileSimulator, spiral};
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn grid() -> Grid {
        Grid::new(HexLayout::new(HEX_SIZE, GRID_CENTER), BOARD_RADIUS)
    }

    fn player_evaluator() -> ShotEvaluator {
        ShotEvaluator::for_owner(Owner::Player)
    }

    #[test]
    fn test_single_piece_straight_up() {
        let mut g = grid();
        g.place(HexCoordinate::new(0, 0, 0), PieceColor::Red, false);
        assert_eq!(g[HexCoordinate::ORIGIN].pixel, Vec2::new(300.0, 300.0));

        let eval = player_evaluator();
        assert_eq!(eval.origin, Vec2::new(300.0, 560.0));
        let memory = ShotMemory::default();
        let profile = DifficultyProfile::perfect();

        let candidates = eval.direct_candidates(&g, PieceColor::Red, &memory, &profile);
        let best = &candidates[0];
        assert_eq!(best.target_hex, HexCoordinate::new(0, 1, -1));
        assert_eq!(best.match_size, 1);
        assert_eq!(best.fall_bonus, 0.0);
        assert!(eval.validator.is_path_clear(eval.origin, best.angle_degrees, best.target_pixel, &g));

        let decision = eval.evaluate(&g, PieceColor::Red, &memory, &profile, &mut Pcg32::seed_from_u64(1));
        assert!((decision.angle_degrees - 90.0).abs() < 0.5);
        assert_eq!(decision.color, PieceColor::Red);
        assert!(matches!(decision.plan, ShotPlan::Direct { .. }));
    }

    #[test]
    fn test_falls_dominate_match_size() {
        let mut g = grid();
        // Red pair holding up a blue tail, hanging up and to the right of the anchor
        g.place(HexCoordinate::ORIGIN, PieceColor::Green, false);
        g.place(HexCoordinate::axial(1, -1), PieceColor::Red, false);
        g.place(HexCoordinate::axial(2, -2), PieceColor::Red, false);
        g.place(HexCoordinate::axial(3, -3), PieceColor::Blue, false);
        g.place(HexCoordinate::axial(4, -4), PieceColor::Blue, false);
        // A bigger red group down and to the left that holds nothing up
        g.place(HexCoordinate::axial(-1, 1), PieceColor::Red, false);
        g.place(HexCoordinate::axial(-2, 2), PieceColor::Red, false);
        g.place(HexCoordinate::axial(-3, 3), PieceColor::Red, false);

        let eval = player_evaluator();
        let candidates =
            eval.direct_candidates(&g, PieceColor::Red, &ShotMemory::default(), &DifficultyProfile::perfect());
        let best = &candidates[0];
        assert_eq!(best.match_size, 2);
        assert_eq!(best.fall_bonus, 2.0 * FALL_WEIGHT);

        let bigger = candidates
            .iter()
            .find(|c| c.match_size >= 3)
            .expect("the three-piece group should be reachable");
        assert_eq!(bigger.fall_bonus, 0.0);
        assert!(best.total_score > bigger.total_score);
    }

    #[test]
    fn test_blocked_direct_falls_back_to_bounce() {
        let mut g = grid();
        g.place(HexCoordinate::ORIGIN, PieceColor::Red, false);
        // Blue row between the launcher and the red piece
        for (q, r) in [(-3, 4), (-2, 4), (-1, 3), (-1, 4), (0, 3), (1, 2), (1, 3), (2, 2), (3, 1)] {
            g.place(HexCoordinate::axial(q, r), PieceColor::Blue, false);
        }

        let eval = player_evaluator();
        let memory = ShotMemory::default();
        let profile = DifficultyProfile::perfect();
        assert!(eval.direct_candidates(&g, PieceColor::Red, &memory, &profile).is_empty());
        let bounce = eval.bounce_candidates(&g, PieceColor::Red, &memory, &profile);
        assert!(!bounce.is_empty());
        assert!(bounce.iter().all(|c| c.bounce.is_some()));

        let decision = eval.evaluate(&g, PieceColor::Red, &memory, &profile, &mut Pcg32::seed_from_u64(2));
        assert!(matches!(decision.plan, ShotPlan::Bounce { .. }));
        assert!(eval.validator.cone.contains(decision.angle_degrees));
        assert!(eval.still_valid(&decision, &g));
    }

    #[test]
    fn test_cell_behind_a_piece_is_not_targeted() {
        let mut g = grid();
        g.place(HexCoordinate::ORIGIN, PieceColor::Red, false);
        g.place(HexCoordinate::new(0, -2, 2), PieceColor::Red, false);
        g.place(HexCoordinate::new(1, -1, 0), PieceColor::Blue, false);
        g.place(HexCoordinate::new(1, -2, 1), PieceColor::Blue, false);

        let eval = player_evaluator();
        let memory = ShotMemory::default();
        let profile = DifficultyProfile::perfect();
        let behind = HexCoordinate::new(0, -1, 1);
        let candidates = eval.direct_candidates(&g, PieceColor::Red, &memory, &profile);
        assert!(candidates.iter().all(|c| c.target_hex != behind));

        let decision = eval.evaluate(&g, PieceColor::Red, &memory, &profile, &mut Pcg32::seed_from_u64(6));
        let ShotPlan::Direct { hex: planned, .. } = decision.plan else {
            panic!("expected direct plan");
        };
        assert_eq!(planned, HexCoordinate::new(0, 1, -1));

        // The real shot lands where the evaluator planned
        let mut sim = ProjectileSimulator::default();
        let mut resolver = MatchResolver::default();
        let mut events = EventQueue::default();
        let mut rng = Pcg32::seed_from_u64(6);
        sim.fire(decision.angle_degrees, PieceColor::Red, Owner::Player).unwrap();
        for _ in 0..240 {
            sim.tick(SIM_DT, &mut g, &mut resolver, &mut rng, &mut events);
        }
        let landed = events.drain().into_iter().find_map(|e| match e {
            GameEvent::ProjectileAttached { hex, .. } => Some(hex),
            _ => None,
        });
        assert_eq!(landed, Some(planned));
    }

    #[test]
    fn test_random_pick_skips_best() {
        let mut g = grid();
        g.place(HexCoordinate::ORIGIN, PieceColor::Red, false);
        let eval = player_evaluator();
        let memory = ShotMemory::default();
        let mut profile = DifficultyProfile::perfect();
        let best = eval.direct_candidates(&g, PieceColor::Red, &memory, &profile)[0].target_hex;

        profile.random_shot_probability = 1.0;
        let mut rng = Pcg32::seed_from_u64(12);
        for _ in 0..20 {
            let decision = eval.evaluate(&g, PieceColor::Red, &memory, &profile, &mut rng);
            let ShotPlan::Direct { hex, .. } = decision.plan else {
                panic!("expected direct plan");
            };
            assert_ne!(hex, best);
            assert!(decision.reasoning.starts_with("random pick over best"));
        }
    }

    #[test]
    fn test_bounce_scored_with_discount() {
        let mut g = grid();
        g.place(HexCoordinate::ORIGIN, PieceColor::Red, false);
        let eval = player_evaluator();
        let memory = ShotMemory::default();
        let profile = DifficultyProfile::perfect();

        let direct = eval.direct_candidates(&g, PieceColor::Red, &memory, &profile);
        let bounce = eval.bounce_candidates(&g, PieceColor::Red, &memory, &profile);
        assert!(!bounce.is_empty());
        for b in &bounce {
            let d = direct.iter().find(|d| d.target_hex == b.target_hex);
            if let Some(d) = d {
                assert!(b.total_score < d.total_score);
            }
            assert!(eval.validator.cone.contains(b.angle_degrees));
        }
    }

    #[test]
    fn test_pathological_grid_still_decides() {
        // Lattice centered right above the launcher so pieces surround it
        let layout = HexLayout::new(HEX_SIZE, Vec2::new(300.0, 520.0));
        let mut g = Grid::new(layout, BOARD_RADIUS);
        for (i, cell) in spiral(HexCoordinate::ORIGIN, BOARD_RADIUS - 1).into_iter().enumerate() {
            let color = if i % 2 == 0 { PieceColor::Red } else { PieceColor::Blue };
            g.place(cell, color, false);
        }

        let eval = player_evaluator();
        let memory = ShotMemory::default();
        let profile = DifficultyProfile::perfect();
        assert!(eval.direct_candidates(&g, PieceColor::Red, &memory, &profile).is_empty());
        assert!(eval.bounce_candidates(&g, PieceColor::Red, &memory, &profile).is_empty());

        let mut rng = Pcg32::seed_from_u64(99);
        for _ in 0..10 {
            let decision = eval.evaluate(&g, PieceColor::Red, &memory, &profile, &mut rng);
            assert_eq!(decision.color, PieceColor::Red);
            assert_eq!(decision.plan, ShotPlan::Random);
            assert!(eval.validator.cone.contains(decision.angle_degrees));
        }
    }

    #[test]
    fn test_color_absent_uses_open_sector() {
        let mut g = grid();
        g.place(HexCoordinate::ORIGIN, PieceColor::Red, false);
        let eval = player_evaluator();
        let decision = eval.evaluate(
            &g,
            PieceColor::Yellow,
            &ShotMemory::default(),
            &DifficultyProfile::perfect(),
            &mut Pcg32::seed_from_u64(5),
        );
        assert!(matches!(decision.plan, ShotPlan::OpenSector { .. }));
        assert!(eval.validator.cone.contains(decision.angle_degrees));
        // The only piece sits straight ahead, so the chosen sector avoids 90
        assert!((decision.angle_degrees - 90.0).abs() > 5.0);
    }

    #[test]
    fn test_repetition_memory_shifts_choice() {
        let mut g = grid();
        g.place(HexCoordinate::ORIGIN, PieceColor::Red, false);
        let eval = player_evaluator();
        let mut profile = DifficultyProfile::perfect();
        profile.repetition_avoidance_window = 3;
        profile.clear_shot_override = false;

        let fresh = ShotMemory::new(3);
        let first = eval.direct_candidates(&g, PieceColor::Red, &fresh, &profile)[0].target_hex;

        let mut memory = ShotMemory::new(3);
        memory.remember(PieceColor::Red, first);
        let second = &eval.direct_candidates(&g, PieceColor::Red, &memory, &profile)[0];
        assert!(second.target_hex.distance(first) > 1);
    }

    fn candidate(hex: HexCoordinate, score: f32) -> ShotCandidate {
        ShotCandidate {
            target_pixel: Vec2::ZERO,
            target_hex: hex,
            angle_degrees: 90.0,
            color: PieceColor::Red,
            match_size: 2,
            base_score: score,
            fall_bonus: 0.0,
            total_score: score,
            repeat_penalty: 0.0,
            bounce: None,
            reasoning: String::new(),
        }
    }

    #[test]
    fn test_clear_winner_ignores_memory() {
        let eval = player_evaluator();
        let winner = HexCoordinate::axial(0, 1);
        let runner_up = HexCoordinate::axial(3, -1);
        let mut memory = ShotMemory::new(3);
        memory.remember(PieceColor::Red, winner);

        let mut profile = DifficultyProfile::perfect();
        profile.clear_shot_override = true;
        let ranked = eval.rank(vec![candidate(runner_up, 50.0), candidate(winner, 100.0)], &memory, &profile);
        assert_eq!(ranked[0].target_hex, winner);
        assert_eq!(ranked[0].repeat_penalty, 0.0);
        assert_eq!(ranked[0].total_score, 100.0);

        profile.clear_shot_override = false;
        let ranked = eval.rank(vec![candidate(runner_up, 50.0), candidate(winner, 100.0)], &memory, &profile);
        assert_eq!(ranked[0].target_hex, winner);
        assert_eq!(ranked[0].repeat_penalty, REPEAT_PENALTY);

        // A narrow lead doesn't earn the exemption
        profile.clear_shot_override = true;
        let ranked = eval.rank(vec![candidate(runner_up, 95.0), candidate(winner, 100.0)], &memory, &profile);
        assert_eq!(ranked[0].target_hex, runner_up);
    }

    #[test]
    fn test_candidate_list_is_capped() {
        let eval = player_evaluator();
        let many: Vec<ShotCandidate> = spiral(HexCoordinate::ORIGIN, 7)
            .into_iter()
            .enumerate()
            .map(|(i, h)| candidate(h, i as f32))
            .collect();
        assert!(many.len() > MAX_CANDIDATES);
        let ranked = eval.rank(many, &ShotMemory::default(), &DifficultyProfile::perfect());
        assert_eq!(ranked.len(), MAX_CANDIDATES);
        assert!(ranked.windows(2).all(|w| w[0].total_score >= w[1].total_score));
    }

    #[test]
    fn test_jitter_stays_in_cone() {
        let mut g = grid();
        g.place(HexCoordinate::ORIGIN, PieceColor::Red, false);
        g.place(HexCoordinate::axial(3, -1), PieceColor::Red, false);
        let eval = player_evaluator();
        let mut profile = Difficulty::Easy.profile();
        profile.angle_jitter_degrees = 200.0;
        let mut rng = Pcg32::seed_from_u64(8);
        for _ in 0..50 {
            let d = eval.evaluate(&g, PieceColor::Red, &ShotMemory::default(), &profile, &mut rng);
            assert!(eval.validator.cone.contains(d.angle_degrees));
        }
    }

    #[test]
    fn test_still_valid_detects_stale_direct_shot() {
        let mut g = grid();
        g.place(HexCoordinate::ORIGIN, PieceColor::Red, false);
        let eval = player_evaluator();
        let decision = eval.evaluate(
            &g,
            PieceColor::Red,
            &ShotMemory::default(),
            &DifficultyProfile::perfect(),
            &mut Pcg32::seed_from_u64(3),
        );
        assert!(eval.still_valid(&decision, &g));

        // Something lands in the target cell before the shot goes out
        let ShotPlan::Direct { hex, .. } = decision.plan else {
            panic!("expected direct plan");
        };
        g.place(hex, PieceColor::Blue, false);
        assert!(!eval.still_valid(&decision, &g));
    }

    #[test]
    fn test_opponent_side_evaluator_aims_down() {
        let mut g = grid();
        g.place(HexCoordinate::ORIGIN, PieceColor::Green, false);
        let eval = ShotEvaluator::for_owner(Owner::Opponent);
        let decision = eval.evaluate(
            &g,
            PieceColor::Green,
            &ShotMemory::default(),
            &DifficultyProfile::perfect(),
            &mut Pcg32::seed_from_u64(4),
        );
        let ShotPlan::Direct { hex, .. } = decision.plan else {
            panic!("expected direct plan");
        };
        // Straight down from the top launcher is the cell above the anchor
        assert_eq!(hex, HexCoordinate::new(0, -1, 1));
        assert!((decision.angle_degrees - 90.0).abs() < 0.5);
    }
}
