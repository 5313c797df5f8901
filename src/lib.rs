//! Telemetry aggregation and scoring engine for the AI-DAS learning
//! analytics platform.
//!
//! Converts a completed test session (an ordered batch of per-question
//! attempt events) into the derived metrics the dashboard renders —
//! efficiency score, cognitive load index, Learning Transferability
//! Index, strategy mix, emotional timeline — and folds each scored
//! session into the longitudinal user profile (XP/level, streak,
//! optimal learning state, achievements).
//!
//! Per-session scoring is a pure function of the session's events;
//! sessions score in parallel freely. Profile mutation is serialized per
//! user behind the [`engine::ScoringEngine`] aggregate. Rendering,
//! routing, authentication and storage are collaborators, not concerns
//! of this crate.

pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod normalize;
pub mod profile;
pub mod scoring;
pub mod types;

pub use catalog::{ConceptContext, CurriculumCatalog};
pub use config::EngineConfig;
pub use engine::{FoldOutcome, ScoreOutcome, ScoringEngine, SessionReport};
pub use error::EngineError;
pub use normalize::normalize_session;
pub use profile::{
    default_achievements, AchievementCondition, AchievementDef, AchievementStatus,
    AchievementUnlock, OptimalLearningState, TimeOfDay, UserProfile,
};
pub use scoring::{
    build_heatmap, cognitive_load_index, efficiency_score, emotional_timeline,
    strategy_breakdown, ConceptTransferRecord, HeatmapCell, HeatmapRow, TransferBand,
};
pub use types::*;
