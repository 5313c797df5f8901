pub mod achievements;
pub mod progression;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub use achievements::{
    achievement_board, default_achievements, unlock_new, AchievementCondition, AchievementDef,
    AchievementStatus, AchievementUnlock,
};
pub use progression::{
    advance_streak, best_slot, level_for_xp, xp_gain, OptimalLearningState, SlotStats, TimeOfDay,
};

use crate::config::ProgressionParams;
use crate::types::DerivedMetrics;

/// Longitudinal per-user state. Created at the first session, updated on
/// every subsequent one, never deleted. Only the profile aggregator
/// mutates it, one session at a time per user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub user_id: String,
    pub level: u32,
    pub xp: i64,
    pub streak_days: u32,
    /// Position on the leaderboard, recomputed externally and pushed back
    /// onto the profile. 0 until first ranked.
    pub rank: u32,
    /// The engine's contribution to ranking: the score the external
    /// leaderboard consumes.
    pub ranking_score: f64,
    pub optimal_learning_state: OptimalLearningState,
    pub achievements: BTreeMap<String, AchievementUnlock>,
    pub sessions_completed: u32,
    pub lifetime_attempted: u64,
    pub lifetime_correct: u64,
    pub best_score: i32,
    pub best_efficiency: i32,
    pub slot_stats: BTreeMap<TimeOfDay, SlotStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_session_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl UserProfile {
    pub fn new(user_id: impl Into<String>, now_ms: i64) -> Self {
        Self {
            user_id: user_id.into(),
            level: 1,
            xp: 0,
            streak_days: 0,
            rank: 0,
            ranking_score: 0.0,
            optimal_learning_state: OptimalLearningState::default(),
            achievements: BTreeMap::new(),
            sessions_completed: 0,
            lifetime_attempted: 0,
            lifetime_correct: 0,
            best_score: 0,
            best_efficiency: 0,
            slot_stats: BTreeMap::new(),
            last_session_at: None,
            created_at: now_ms,
            updated_at: now_ms,
        }
    }

    /// Folds one scored session into the profile: streak, XP/level,
    /// lifetime counters, time-of-day stats and the ranking input.
    /// Returns the XP gained and whether a level-up happened. Achievement
    /// evaluation runs afterwards, against this updated state.
    pub fn apply_session(
        &mut self,
        metrics: &DerivedMetrics,
        session_started_at: i64,
        params: &ProgressionParams,
        now_ms: i64,
    ) -> SessionProgress {
        self.streak_days = advance_streak(
            self.last_session_at,
            session_started_at,
            self.streak_days,
            params.streak_window_hours,
        );
        self.last_session_at = Some(session_started_at);

        let gained = xp_gain(metrics, params);
        self.xp += gained;
        let computed = level_for_xp(self.xp);
        let leveled_up = computed > self.level;
        // level never decreases, even if the threshold table changes
        self.level = self.level.max(computed);

        self.sessions_completed += 1;
        self.lifetime_attempted += u64::from(metrics.attempted);
        self.lifetime_correct += u64::from(metrics.correct);
        self.best_score = self.best_score.max(metrics.score);
        if let Some(efficiency) = metrics.efficiency {
            self.best_efficiency = self.best_efficiency.max(efficiency);
        }

        if let Some(slot) = TimeOfDay::from_timestamp_ms(session_started_at) {
            let focus = f64::from(100 - metrics.cognitive_load_index);
            self.slot_stats
                .entry(slot)
                .or_default()
                .observe(focus, f64::from(metrics.score));
            if let Some(best) = best_slot(&self.slot_stats) {
                self.optimal_learning_state = best;
            }
        }

        self.ranking_score =
            self.xp as f64 + f64::from(self.streak_days) * params.rank_streak_bonus;
        self.updated_at = now_ms;

        SessionProgress {
            xp_gained: gained,
            leveled_up,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionProgress {
    pub xp_gained: i64,
    pub leveled_up: bool,
}
