//! Match facade
//!
//! Owns the grid, the projectile simulator, the attachment resolver, the
//! opponent and its scheduler, the RNG and the outbound event queue. This is
//! the inbound surface a presentation layer drives: fire shots, ask the
//! opponent to decide, tick.

use rand::SeedableRng;
use rand_pcg::Pcg32;

use crate::ai::{Opponent, ScheduledTask};
use crate::consts::*;
use crate::settings::{Difficulty, DifficultyProfile};
use crate::sim::{
    EventQueue, GameEvent, Grid, HexLayout, MatchResolver, Owner, PieceColor, ProjectileSimulator, Scheduler,
    SimConfig, generate_board,
};

/// Colors used by a freshly generated board
const START_PALETTE: usize = 4;

pub struct Arena {
    /// Seed the match was created with
    pub seed: u64,
    rng: Pcg32,
    grid: Grid,
    simulator: ProjectileSimulator,
    resolver: MatchResolver,
    opponent: Opponent,
    scheduler: Scheduler<ScheduledTask>,
    events: EventQueue,
    time_ticks: u64,
    accumulator: f32,
}

impl Arena {
    /// New match on a generated board
    pub fn new(seed: u64, profile: DifficultyProfile) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        let mut grid = Grid::new(HexLayout::new(HEX_SIZE, GRID_CENTER), BOARD_RADIUS);
        generate_board(&mut grid, &mut rng, START_RINGS, START_PALETTE);
        log::info!("Arena seeded with {} ({} pieces)", seed, grid.len());
        Self::from_parts(seed, rng, grid, profile)
    }

    /// New match on a caller-built grid
    pub fn with_grid(seed: u64, grid: Grid, profile: DifficultyProfile) -> Self {
        Self::from_parts(seed, Pcg32::seed_from_u64(seed), grid, profile)
    }

    fn from_parts(seed: u64, rng: Pcg32, grid: Grid, profile: DifficultyProfile) -> Self {
        Self {
            seed,
            rng,
            grid,
            simulator: ProjectileSimulator::new(SimConfig::default()),
            resolver: MatchResolver::default(),
            opponent: Opponent::new(profile),
            scheduler: Scheduler::new(),
            events: EventQueue::default(),
            time_ticks: 0,
            accumulator: 0.0,
        }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn simulator(&self) -> &ProjectileSimulator {
        &self.simulator
    }

    pub fn opponent(&self) -> &Opponent {
        &self.opponent
    }

    pub fn resolver(&self) -> &MatchResolver {
        &self.resolver
    }

    /// Ticks simulated so far
    pub fn time_ticks(&self) -> u64 {
        self.time_ticks
    }

    /// Scheduled opponent work not yet run
    pub fn pending_tasks(&self) -> usize {
        self.scheduler.len()
    }

    /// Enqueue a projectile. Returns its id, or `None` at the projectile cap.
    pub fn fire_shot(&mut self, angle_degrees: f32, color: PieceColor, owner: Owner) -> Option<u32> {
        self.simulator.fire(angle_degrees, color, owner)
    }

    /// Start an opponent decision cycle. Returns false if one is already
    /// running or the opponent is stopped.
    pub fn request_opponent_decision(&mut self) -> bool {
        self.opponent
            .request_decision(self.time_ticks, &self.grid, &mut self.rng, &mut self.scheduler)
    }

    /// True when the opponent can take a new decision request
    pub fn opponent_ready(&self) -> bool {
        self.opponent.is_idle() && !self.opponent.is_stopped()
    }

    /// One simulation step: run due scheduled work, then advance projectiles
    pub fn tick(&mut self, dt: f32) {
        self.time_ticks += 1;

        for task in self.scheduler.drain_due(self.time_ticks) {
            match task {
                ScheduledTask::OpponentThink => self.opponent.on_think(
                    self.time_ticks,
                    &self.grid,
                    &mut self.rng,
                    &mut self.scheduler,
                    &mut self.events,
                ),
                ScheduledTask::OpponentFire => {
                    if let Some((angle, color)) = self.opponent.on_fire(&self.grid, &mut self.rng, &mut self.events) {
                        self.simulator.fire(angle, color, Owner::Opponent);
                    }
                }
            }
        }

        self.simulator
            .tick(dt, &mut self.grid, &mut self.resolver, &mut self.rng, &mut self.events);
    }

    /// Feed a variable frame time; runs whole `SIM_DT` steps, at most
    /// `MAX_SUBSTEPS` per call. Returns the number of steps taken.
    pub fn advance(&mut self, frame_dt: f32) -> u32 {
        if !frame_dt.is_finite() {
            log::warn!("Ignoring non-finite frame time {}", frame_dt);
            return 0;
        }
        self.accumulator += frame_dt.clamp(0.0, 0.1);

        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            self.tick(SIM_DT);
            self.accumulator -= SIM_DT;
            substeps += 1;
        }
        // Drop the backlog instead of spiralling
        if substeps == MAX_SUBSTEPS {
            self.accumulator = self.accumulator.min(SIM_DT);
        }
        substeps
    }

    /// Cancel pending opponent work (game over, teardown)
    pub fn stop_opponent(&mut self) -> usize {
        self.opponent.stop(&mut self.scheduler)
    }

    pub fn resume_opponent(&mut self) {
        self.opponent.resume();
    }

    pub fn set_difficulty(&mut self, difficulty: Difficulty) {
        log::info!("Difficulty set to {}", difficulty.as_str());
        self.opponent.set_profile(difficulty.profile());
    }

    pub fn set_profile(&mut self, profile: DifficultyProfile) {
        self.opponent.set_profile(profile);
    }

    /// Take every pending outbound event, oldest first
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        self.events.drain()
    }

    /// Events lost to the queue cap so far
    pub fn dropped_events(&self) -> u64 {
        self.events.dropped()
    }
}
