use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizerParams {
    /// Sessions whose rejection ratio exceeds this are unusable.
    pub max_rejected_ratio: f64,
}

impl Default for NormalizerParams {
    fn default() -> Self {
        Self {
            max_rejected_ratio: 0.5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EfficiencyWeights {
    pub efficient: f64,
    pub trial_and_error: f64,
    pub guessing: f64,
    /// Weight for correct answers whose strategy tag could not be
    /// recognized at ingestion. Neutral midpoint by default.
    pub unknown: f64,
}

impl Default for EfficiencyWeights {
    fn default() -> Self {
        Self {
            efficient: 1.0,
            trial_and_error: 0.5,
            guessing: 0.0,
            unknown: 0.5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadParams {
    pub stress_weight: f64,
    pub change_weight: f64,
    pub tempo_weight: f64,
    /// Answer-change count that saturates the change term.
    pub change_norm: f64,
    /// EWMA factor for the scalar load index.
    pub smoothing: f64,
}

impl Default for LoadParams {
    fn default() -> Self {
        Self {
            stress_weight: 0.5,
            change_weight: 0.25,
            tempo_weight: 0.25,
            change_norm: 5.0,
            smoothing: 0.3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyThresholds {
    /// Multiplier over the chapter reference time below which an answer
    /// still counts as methodical.
    pub efficient_time_factor: f64,
    pub max_efficient_changes: u32,
    /// Responses faster than this read as near-random answering.
    pub guess_floor_ms: i64,
    pub high_stress: f64,
    pub snap_response_ms: i64,
    /// Fallback when the curriculum catalog has no baseline for a chapter.
    pub default_reference_time_ms: i64,
}

impl Default for StrategyThresholds {
    fn default() -> Self {
        Self {
            efficient_time_factor: 1.2,
            max_efficient_changes: 1,
            guess_floor_ms: 1000,
            high_stress: 70.0,
            snap_response_ms: 1500,
            default_reference_time_ms: 60_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferParams {
    /// Below this many application contexts the transfer score is
    /// insufficient evidence and stays null.
    pub min_contexts: usize,
}

impl Default for TransferParams {
    fn default() -> Self {
        Self { min_contexts: 2 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressionParams {
    pub base_xp: f64,
    pub score_xp_weight: f64,
    pub efficiency_xp_weight: f64,
    pub streak_window_hours: i64,
    pub rank_streak_bonus: f64,
}

impl Default for ProgressionParams {
    fn default() -> Self {
        Self {
            base_xp: 25.0,
            score_xp_weight: 1.0,
            efficiency_xp_weight: 0.5,
            streak_window_hours: 24,
            rank_streak_bonus: 25.0,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    pub normalizer: NormalizerParams,
    pub efficiency: EfficiencyWeights,
    pub load: LoadParams,
    pub strategy: StrategyThresholds,
    pub transfer: TransferParams,
    pub progression: ProgressionParams,
}

impl EngineConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("AIDAS_MAX_REJECTED_RATIO") {
            config.normalizer.max_rejected_ratio =
                val.parse().unwrap_or(config.normalizer.max_rejected_ratio);
        }
        if let Ok(val) = std::env::var("AIDAS_LOAD_SMOOTHING") {
            config.load.smoothing = val.parse().unwrap_or(config.load.smoothing);
        }
        if let Ok(val) = std::env::var("AIDAS_GUESS_FLOOR_MS") {
            config.strategy.guess_floor_ms =
                val.parse().unwrap_or(config.strategy.guess_floor_ms);
        }
        if let Ok(val) = std::env::var("AIDAS_EFFICIENT_TIME_FACTOR") {
            config.strategy.efficient_time_factor =
                val.parse().unwrap_or(config.strategy.efficient_time_factor);
        }
        if let Ok(val) = std::env::var("AIDAS_STREAK_WINDOW_HOURS") {
            config.progression.streak_window_hours =
                val.parse().unwrap_or(config.progression.streak_window_hours);
        }

        config
    }
}
