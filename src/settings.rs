//! Difficulty presets and profiles
//!
//! A profile is plain configuration handed to the opponent at construction.
//! Changing difficulty mid-match means swapping in another profile.

use serde::{Deserialize, Serialize};

/// Difficulty preset levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Difficulty {
    Easy,
    #[default]
    Normal,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Normal => "Normal",
            Difficulty::Hard => "Hard",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "normal" | "medium" | "med" => Some(Difficulty::Normal),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }

    /// Profile for this preset
    pub fn profile(&self) -> DifficultyProfile {
        match self {
            Difficulty::Easy => DifficultyProfile {
                think_delay_range_ms: (1200, 2200),
                random_shot_probability: 0.35,
                angle_jitter_degrees: 6.0,
                position_jitter_pixels: 12.0,
                repetition_avoidance_window: 2,
                aim_hold_ms: 300,
                clear_shot_override: false,
            },
            Difficulty::Normal => DifficultyProfile {
                think_delay_range_ms: (700, 1400),
                random_shot_probability: 0.15,
                angle_jitter_degrees: 3.0,
                position_jitter_pixels: 6.0,
                repetition_avoidance_window: 3,
                aim_hold_ms: 200,
                clear_shot_override: true,
            },
            Difficulty::Hard => DifficultyProfile {
                think_delay_range_ms: (350, 800),
                random_shot_probability: 0.03,
                angle_jitter_degrees: 0.75,
                position_jitter_pixels: 1.5,
                repetition_avoidance_window: 1,
                aim_hold_ms: 120,
                clear_shot_override: true,
            },
        }
    }
}

/// How the opponent plays
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DifficultyProfile {
    /// Min/max think time before evaluating (ms)
    pub think_delay_range_ms: (u32, u32),
    /// Chance of throwing away the best shot for a random one (0.0 - 1.0)
    pub random_shot_probability: f32,
    /// Max additive error on the launch angle (degrees)
    pub angle_jitter_degrees: f32,
    /// Max additive error on the aim point (pixels)
    pub position_jitter_pixels: f32,
    /// How many recent shots are remembered and penalized (0 = off)
    pub repetition_avoidance_window: usize,

    /// Delay between deciding and firing (ms); the decision is revalidated
    /// against the live grid when it expires
    #[serde(default = "default_aim_hold_ms")]
    pub aim_hold_ms: u32,
    /// Ignore the repetition penalty when one shot clearly dominates
    #[serde(default)]
    pub clear_shot_override: bool,
}

fn default_aim_hold_ms() -> u32 {
    150
}

impl Default for DifficultyProfile {
    fn default() -> Self {
        Difficulty::default().profile()
    }
}

impl DifficultyProfile {
    /// No randomness, no jitter, no memory. Plays the best candidate every time.
    pub fn perfect() -> Self {
        Self {
            think_delay_range_ms: (0, 0),
            random_shot_probability: 0.0,
            angle_jitter_degrees: 0.0,
            position_jitter_pixels: 0.0,
            repetition_avoidance_window: 0,
            aim_hold_ms: 0,
            clear_shot_override: true,
        }
    }

    /// Parse a profile from JSON
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let profile: Self = serde_json::from_str(json)?;
        Ok(profile.sanitized())
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Clamp values into usable ranges (swapped delay bounds, negative jitter)
    pub fn sanitized(mut self) -> Self {
        let (lo, hi) = self.think_delay_range_ms;
        if lo > hi {
            log::warn!("Think delay range {}..{} reversed, swapping", lo, hi);
            self.think_delay_range_ms = (hi, lo);
        }
        self.random_shot_probability = self.random_shot_probability.clamp(0.0, 1.0);
        self.angle_jitter_degrees = self.angle_jitter_degrees.abs();
        self.position_jitter_pixels = self.position_jitter_pixels.abs();
        self
    }
}
