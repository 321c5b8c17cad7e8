//! Opponent decision cycle
//!
//! `Idle → Thinking → Evaluating → Decided → Idle`. Thinking and the aim hold
//! after a decision are scheduler entries, so nothing blocks the tick. The
//! grid is cloned once when evaluation starts; the decision is checked
//! against the live grid again right before it is fired.

use rand::Rng;

use super::evaluator::{Decision, ShotEvaluator, ShotPlan};
use super::memory::ShotMemory;
use crate::ms_to_ticks;
use crate::settings::DifficultyProfile;
use crate::sim::{EventQueue, GameEvent, Grid, Owner, PieceColor, Scheduler, Ticket};

/// Colors drawn from when the grid is empty
const FALLBACK_PALETTE: usize = 4;

/// Deferred work driven by the arena's tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduledTask {
    OpponentThink,
    OpponentFire,
}

impl ScheduledTask {
    pub fn is_opponent(self) -> bool {
        matches!(self, ScheduledTask::OpponentThink | ScheduledTask::OpponentFire)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum OpponentState {
    Idle,
    Thinking { ticket: Ticket },
    /// Only observable from inside `on_think`
    Evaluating,
    Decided { decision: Decision, ticket: Ticket },
}

impl OpponentState {
    pub fn as_str(&self) -> &'static str {
        match self {
            OpponentState::Idle => "idle",
            OpponentState::Thinking { .. } => "thinking",
            OpponentState::Evaluating => "evaluating",
            OpponentState::Decided { .. } => "decided",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Opponent {
    evaluator: ShotEvaluator,
    profile: DifficultyProfile,
    memory: ShotMemory,
    state: OpponentState,
    loaded: Option<PieceColor>,
    stopped: bool,
}

impl Opponent {
    pub fn new(profile: DifficultyProfile) -> Self {
        let profile = profile.sanitized();
        Self {
            evaluator: ShotEvaluator::for_owner(Owner::Opponent),
            memory: ShotMemory::new(profile.repetition_avoidance_window),
            profile,
            state: OpponentState::Idle,
            loaded: None,
            stopped: false,
        }
    }

    pub fn state(&self) -> &OpponentState {
        &self.state
    }

    pub fn profile(&self) -> &DifficultyProfile {
        &self.profile
    }

    pub fn memory(&self) -> &ShotMemory {
        &self.memory
    }

    pub fn evaluator(&self) -> &ShotEvaluator {
        &self.evaluator
    }

    /// Color in the launcher for the current cycle
    pub fn loaded_color(&self) -> Option<PieceColor> {
        self.loaded
    }

    pub fn is_idle(&self) -> bool {
        self.state == OpponentState::Idle
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Swap in another profile. Takes effect from the next evaluation.
    pub fn set_profile(&mut self, profile: DifficultyProfile) {
        self.profile = profile.sanitized();
        self.memory.set_window(self.profile.repetition_avoidance_window);
    }

    /// Start a decision cycle: load a color and schedule the think delay.
    ///
    /// Returns false when stopped or already mid-cycle.
    pub fn request_decision<R: Rng>(
        &mut self,
        now: u64,
        grid: &Grid,
        rng: &mut R,
        scheduler: &mut Scheduler<ScheduledTask>,
    ) -> bool {
        if self.stopped || !self.is_idle() {
            return false;
        }

        let present = grid.colors_present();
        let color = if present.is_empty() {
            PieceColor::ALL[rng.random_range(0..FALLBACK_PALETTE)]
        } else {
            present[rng.random_range(0..present.len())]
        };
        self.loaded = Some(color);

        let (lo, hi) = self.profile.think_delay_range_ms;
        let delay_ms = rng.random_range(lo..=hi);
        let ticket = scheduler.schedule(now + ms_to_ticks(delay_ms), ScheduledTask::OpponentThink);
        self.state = OpponentState::Thinking { ticket };
        log::debug!("Opponent thinking for {}ms with {}", delay_ms, color.as_str());
        true
    }

    /// Think delay expired: evaluate a snapshot and schedule the shot
    pub fn on_think<R: Rng>(
        &mut self,
        now: u64,
        grid: &Grid,
        rng: &mut R,
        scheduler: &mut Scheduler<ScheduledTask>,
        events: &mut EventQueue,
    ) {
        if !matches!(self.state, OpponentState::Thinking { .. }) {
            log::debug!("Ignoring think task while {}", self.state.as_str());
            return;
        }
        let Some(color) = self.loaded else {
            self.state = OpponentState::Idle;
            return;
        };

        self.state = OpponentState::Evaluating;
        let snapshot = grid.clone();
        let decision = self
            .evaluator
            .evaluate(&snapshot, color, &self.memory, &self.profile, rng);
        log::info!(
            "Opponent decided {:.1} deg {}: {}",
            decision.angle_degrees,
            color.as_str(),
            decision.reasoning
        );
        events.push(decision_event(&decision));

        let ticket = scheduler.schedule(now + ms_to_ticks(self.profile.aim_hold_ms), ScheduledTask::OpponentFire);
        self.state = OpponentState::Decided { decision, ticket };
    }

    /// Aim hold expired: revalidate and hand back the shot to fire
    pub fn on_fire<R: Rng>(&mut self, grid: &Grid, rng: &mut R, events: &mut EventQueue) -> Option<(f32, PieceColor)> {
        let decision = match std::mem::replace(&mut self.state, OpponentState::Idle) {
            OpponentState::Decided { decision, .. } => decision,
            other => {
                log::debug!("Ignoring fire task while {}", other.as_str());
                self.state = other;
                return None;
            }
        };
        self.loaded = None;

        let decision = if self.evaluator.still_valid(&decision, grid) {
            decision
        } else {
            log::info!("Opponent shot went stale, re-evaluating on the live grid");
            let fresh = self
                .evaluator
                .evaluate(grid, decision.color, &self.memory, &self.profile, rng);
            events.push(decision_event(&fresh));
            fresh
        };

        match decision.plan {
            ShotPlan::Direct { hex, .. } | ShotPlan::Bounce { hex, .. } => self.memory.remember(decision.color, hex),
            ShotPlan::OpenSector { .. } | ShotPlan::Random => {}
        }
        Some((decision.angle_degrees, decision.color))
    }

    /// Cancel every pending opponent task and refuse new cycles until resumed.
    /// Returns the number of tasks cancelled.
    pub fn stop(&mut self, scheduler: &mut Scheduler<ScheduledTask>) -> usize {
        let cancelled = scheduler.cancel_where(|task| task.is_opponent());
        self.state = OpponentState::Idle;
        self.loaded = None;
        self.stopped = true;
        log::info!("Opponent stopped, cancelled {} pending tasks", cancelled);
        cancelled
    }

    pub fn resume(&mut self) {
        self.stopped = false;
    }
}

fn decision_event(decision: &Decision) -> GameEvent {
    GameEvent::DecisionMade {
        angle_degrees: decision.angle_degrees,
        color: decision.color,
        reasoning: decision.reasoning.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::*;
    use crate::sim::{HexCoordinate, HexLayout};
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn grid() -> Grid {
        let mut g = Grid::new(HexLayout::new(HEX_SIZE, GRID_CENTER), BOARD_RADIUS);
        g.place(HexCoordinate::ORIGIN, PieceColor::Red, false);
        g
    }

    fn quick_profile() -> DifficultyProfile {
        DifficultyProfile {
            think_delay_range_ms: (100, 100),
            aim_hold_ms: 50,
            ..DifficultyProfile::perfect()
        }
    }

    #[test]
    fn test_full_cycle() {
        let g = grid();
        let mut rng = Pcg32::seed_from_u64(1);
        let mut scheduler = Scheduler::new();
        let mut events = EventQueue::default();
        let mut opp = Opponent::new(quick_profile());

        assert!(opp.request_decision(0, &g, &mut rng, &mut scheduler));
        // Only red is on the board
        assert_eq!(opp.loaded_color(), Some(PieceColor::Red));
        assert_eq!(opp.state().as_str(), "thinking");
        assert!(!opp.request_decision(0, &g, &mut rng, &mut scheduler));

        assert!(scheduler.drain_due(ms_to_ticks(100) - 1).is_empty());
        let due = scheduler.drain_due(ms_to_ticks(100));
        assert_eq!(due, vec![ScheduledTask::OpponentThink]);

        let now = ms_to_ticks(100);
        opp.on_think(now, &g, &mut rng, &mut scheduler, &mut events);
        assert_eq!(opp.state().as_str(), "decided");
        assert!(matches!(events.iter().next(), Some(GameEvent::DecisionMade { .. })));

        let due = scheduler.drain_due(now + ms_to_ticks(50));
        assert_eq!(due, vec![ScheduledTask::OpponentFire]);
        let (angle, color) = opp.on_fire(&g, &mut rng, &mut events).unwrap();
        assert_eq!(color, PieceColor::Red);
        assert!(opp.evaluator().validator.cone.contains(angle));
        assert!(opp.is_idle());
        assert_eq!(opp.loaded_color(), None);
    }

    #[test]
    fn test_stop_cancels_pending_think() {
        let g = grid();
        let mut rng = Pcg32::seed_from_u64(2);
        let mut scheduler = Scheduler::new();
        let mut opp = Opponent::new(quick_profile());

        opp.request_decision(0, &g, &mut rng, &mut scheduler);
        assert_eq!(opp.stop(&mut scheduler), 1);
        assert!(scheduler.is_empty());
        assert!(opp.is_idle());
        assert!(!opp.request_decision(0, &g, &mut rng, &mut scheduler));

        opp.resume();
        assert!(opp.request_decision(0, &g, &mut rng, &mut scheduler));
    }

    #[test]
    fn test_stray_tasks_are_ignored() {
        let g = grid();
        let mut rng = Pcg32::seed_from_u64(3);
        let mut scheduler = Scheduler::new();
        let mut events = EventQueue::default();
        let mut opp = Opponent::new(quick_profile());

        opp.on_think(0, &g, &mut rng, &mut scheduler, &mut events);
        assert!(opp.is_idle());
        assert!(events.is_empty());
        assert!(opp.on_fire(&g, &mut rng, &mut events).is_none());
    }

    #[test]
    fn test_stale_decision_is_revalidated() {
        let mut g = grid();
        let mut rng = Pcg32::seed_from_u64(4);
        let mut scheduler = Scheduler::new();
        let mut events = EventQueue::default();
        let mut opp = Opponent::new(quick_profile());

        opp.request_decision(0, &g, &mut rng, &mut scheduler);
        opp.on_think(12, &g, &mut rng, &mut scheduler, &mut events);
        let OpponentState::Decided { decision, .. } = opp.state().clone() else {
            panic!("expected a decision");
        };
        let ShotPlan::Direct { hex, .. } = decision.plan else {
            panic!("expected a direct shot");
        };

        // A player shot lands in the chosen cell during the aim hold
        g.place(hex, PieceColor::Blue, false);
        let before = events.len();
        let (_, color) = opp.on_fire(&g, &mut rng, &mut events).unwrap();
        assert_eq!(color, PieceColor::Red);
        // The replacement decision is announced
        assert_eq!(events.len(), before + 1);
    }

    #[test]
    fn test_fired_shots_are_remembered() {
        let g = grid();
        let mut rng = Pcg32::seed_from_u64(5);
        let mut scheduler = Scheduler::new();
        let mut events = EventQueue::default();
        let mut profile = quick_profile();
        profile.repetition_avoidance_window = 2;
        let mut opp = Opponent::new(profile);

        opp.request_decision(0, &g, &mut rng, &mut scheduler);
        opp.on_think(12, &g, &mut rng, &mut scheduler, &mut events);
        opp.on_fire(&g, &mut rng, &mut events);
        assert_eq!(opp.memory().len(), 1);

        opp.set_profile(DifficultyProfile::perfect());
        assert_eq!(opp.memory().window(), 0);
        assert!(opp.memory().is_empty());
    }
}
