//! Hex Duel headless entry point
//!
//! Plays a seeded match between a scripted player and the opponent AI and
//! reports every outbound event.
//!
//! Usage: `hex-duel [seed] [easy|normal|hard] [--json]`

use clap::Parser;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use hex_duel::ai::{ShotEvaluator, ShotMemory, ShotPlan};
use hex_duel::consts::*;
use hex_duel::sim::{GameEvent, Owner};
use hex_duel::{Arena, Difficulty, DifficultyProfile};

/// Simulated match length
const MATCH_SECONDS: u64 = 60;
/// Time between scripted player shots
const PLAYER_COOLDOWN_TICKS: u64 = 90;

#[derive(Parser, Debug)]
#[command(name = "hex-duel")]
#[command(about = "Play a seeded headless match against the opponent AI and print every event")]
struct Cli {
    /// Seed for the board and every random draw
    #[arg(default_value_t = 1)]
    seed: u64,
    /// Opponent difficulty (easy, normal, hard)
    #[arg(default_value = "normal", value_parser = parse_difficulty)]
    difficulty: Difficulty,
    /// Print events as JSON lines
    #[arg(long)]
    json: bool,
}

fn parse_difficulty(s: &str) -> Result<Difficulty, String> {
    Difficulty::from_str(s).ok_or_else(|| format!("unknown difficulty {s:?}, expected easy, normal or hard"))
}

fn report(event: &GameEvent, json: bool) {
    if json {
        match serde_json::to_string(event) {
            Ok(line) => println!("{line}"),
            Err(e) => log::error!("Failed to serialize event: {}", e),
        }
        return;
    }
    match event {
        GameEvent::ProjectileAttached { owner, piece, hex, .. } => {
            println!("{:>8} attached {} at {}", owner.as_str(), piece.color.as_str(), hex)
        }
        GameEvent::ProjectilePopped { projectile_id, owner, reason } => {
            println!("{:>8} shot #{} popped ({:?})", owner.as_str(), projectile_id, reason)
        }
        GameEvent::MatchFound { owner, removed, falling } => println!(
            "{:>8} matched {} pieces, {} fell",
            owner.as_str(),
            removed.len(),
            falling.len()
        ),
        GameEvent::DecisionMade {
            angle_degrees,
            color,
            reasoning,
        } => println!(
            "opponent aims {} at {:.1} deg: {}",
            color.as_str(),
            angle_degrees,
            reasoning
        ),
    }
}

fn main() {
    env_logger::init();
    let options = Cli::parse();
    log::info!(
        "Hex Duel starting (seed {}, {})",
        options.seed,
        options.difficulty.as_str()
    );

    let mut arena = Arena::new(options.seed, options.difficulty.profile());

    // The scripted player uses the same evaluator with a sloppy profile
    let player = ShotEvaluator::for_owner(Owner::Player);
    let player_profile = DifficultyProfile {
        random_shot_probability: 0.5,
        ..Difficulty::Easy.profile()
    };
    let mut player_memory = ShotMemory::new(player_profile.repetition_avoidance_window);
    let mut player_rng = Pcg32::seed_from_u64(options.seed.wrapping_add(1));

    let mut next_player_shot = PLAYER_COOLDOWN_TICKS;
    while arena.time_ticks() < MATCH_SECONDS * TICKS_PER_SECOND {
        if arena.opponent_ready() {
            arena.request_opponent_decision();
        }

        if arena.time_ticks() >= next_player_shot && arena.simulator().in_flight(Owner::Player) == 0 {
            let colors = arena.grid().colors_present();
            if colors.is_empty() {
                log::info!("Board cleared");
                break;
            }
            let color = colors[player_rng.random_range(0..colors.len())];
            let decision = player.evaluate(arena.grid(), color, &player_memory, &player_profile, &mut player_rng);
            if let ShotPlan::Direct { hex, .. } | ShotPlan::Bounce { hex, .. } = decision.plan {
                player_memory.remember(color, hex);
            }
            arena.fire_shot(decision.angle_degrees, color, Owner::Player);
            next_player_shot = arena.time_ticks() + PLAYER_COOLDOWN_TICKS;
        }

        arena.tick(SIM_DT);
        for event in arena.drain_events() {
            report(&event, options.json);
        }
    }

    arena.stop_opponent();
    log::info!(
        "Match over after {} ticks: {} pieces left, {} removed, {} events dropped",
        arena.time_ticks(),
        arena.grid().len(),
        arena.resolver().total_removed,
        arena.dropped_events()
    );
}
