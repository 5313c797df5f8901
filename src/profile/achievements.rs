use serde::{Deserialize, Serialize};

use crate::profile::UserProfile;
use crate::types::DerivedMetrics;

/// Unlock predicate, evaluated against the already-updated profile and
/// the session that triggered the evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AchievementCondition {
    StreakDays(u32),
    SessionsCompleted(u32),
    ScoreAtLeast(i32),
    EfficiencyAtLeast(i32),
    LoadAtMost(i32),
    TransferAtLeast(i32),
    LevelReached(u32),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AchievementDef {
    pub id: String,
    pub title: String,
    pub icon: String,
    pub condition: AchievementCondition,
}

impl AchievementDef {
    pub fn new(
        id: &str,
        title: &str,
        icon: &str,
        condition: AchievementCondition,
    ) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            icon: icon.to_string(),
            condition,
        }
    }
}

/// A persisted unlock. The timestamp is written exactly once; re-checking
/// an unlocked achievement never touches it again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AchievementUnlock {
    pub record_id: String,
    pub achievement_id: String,
    pub title: String,
    pub icon: String,
    pub unlocked_at: i64,
}

/// Presentation row: every defined achievement with its unlock status,
/// the way the dashboard renders the trophy grid.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AchievementStatus {
    pub id: String,
    pub title: String,
    pub icon: String,
    pub unlocked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unlocked_at: Option<i64>,
}

pub fn default_achievements() -> Vec<AchievementDef> {
    vec![
        AchievementDef::new(
            "first-steps",
            "First Steps",
            "🎯",
            AchievementCondition::SessionsCompleted(1),
        ),
        AchievementDef::new(
            "week-warrior",
            "Week Warrior",
            "🔥",
            AchievementCondition::StreakDays(7),
        ),
        AchievementDef::new(
            "marathon-mind",
            "Marathon Mind",
            "🏃",
            AchievementCondition::StreakDays(30),
        ),
        AchievementDef::new(
            "sharpshooter",
            "Sharpshooter",
            "🏹",
            AchievementCondition::ScoreAtLeast(90),
        ),
        AchievementDef::new(
            "efficiency-expert",
            "Efficiency Expert",
            "⚡",
            AchievementCondition::EfficiencyAtLeast(85),
        ),
        AchievementDef::new(
            "cool-head",
            "Cool Under Pressure",
            "🧊",
            AchievementCondition::LoadAtMost(30),
        ),
        AchievementDef::new(
            "concept-connector",
            "Concept Connector",
            "🔗",
            AchievementCondition::TransferAtLeast(80),
        ),
        AchievementDef::new(
            "centurion",
            "Centurion",
            "💯",
            AchievementCondition::SessionsCompleted(100),
        ),
        AchievementDef::new(
            "rising-star",
            "Rising Star",
            "🏆",
            AchievementCondition::LevelReached(10),
        ),
    ]
}

pub fn eligible(
    condition: &AchievementCondition,
    profile: &UserProfile,
    metrics: &DerivedMetrics,
) -> bool {
    match condition {
        AchievementCondition::StreakDays(days) => profile.streak_days >= *days,
        AchievementCondition::SessionsCompleted(count) => profile.sessions_completed >= *count,
        AchievementCondition::ScoreAtLeast(score) => {
            metrics.attempted > 0 && metrics.score >= *score
        }
        AchievementCondition::EfficiencyAtLeast(value) => {
            metrics.efficiency.is_some_and(|e| e >= *value)
        }
        AchievementCondition::LoadAtMost(value) => {
            metrics.attempted > 0 && metrics.cognitive_load_index <= *value
        }
        AchievementCondition::TransferAtLeast(value) => metrics.lti.is_some_and(|l| l >= *value),
        AchievementCondition::LevelReached(level) => profile.level >= *level,
    }
}

/// Runs every predicate against the updated profile and unlocks what
/// newly qualifies. Idempotent: already-unlocked ids are skipped before
/// evaluation, so a repeated fold can neither duplicate an unlock nor
/// move its timestamp.
pub fn unlock_new(
    defs: &[AchievementDef],
    profile: &mut UserProfile,
    metrics: &DerivedMetrics,
    now_ms: i64,
) -> Vec<AchievementUnlock> {
    let mut newly = Vec::new();
    for def in defs {
        if profile.achievements.contains_key(&def.id) {
            continue;
        }
        if eligible(&def.condition, profile, metrics) {
            let unlock = AchievementUnlock {
                record_id: uuid::Uuid::new_v4().to_string(),
                achievement_id: def.id.clone(),
                title: def.title.clone(),
                icon: def.icon.clone(),
                unlocked_at: now_ms,
            };
            tracing::info!(
                user_id = %profile.user_id,
                achievement = %def.id,
                "achievement unlocked"
            );
            profile.achievements.insert(def.id.clone(), unlock.clone());
            newly.push(unlock);
        }
    }
    newly
}

pub fn achievement_board(defs: &[AchievementDef], profile: &UserProfile) -> Vec<AchievementStatus> {
    defs.iter()
        .map(|def| {
            let unlocked_at = profile
                .achievements
                .get(&def.id)
                .map(|unlock| unlock.unlocked_at);
            AchievementStatus {
                id: def.id.clone(),
                title: def.title.clone(),
                icon: def.icon.clone(),
                unlocked: unlocked_at.is_some(),
                unlocked_at,
            }
        })
        .collect()
}
