use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};

use crate::catalog::CurriculumCatalog;
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::metrics::StageId;
use crate::normalize::normalize_session;
use crate::profile::{
    achievement_board, default_achievements, unlock_new, AchievementDef, AchievementStatus,
    AchievementUnlock, SessionProgress, UserProfile,
};
use crate::scoring::{
    build_heatmap, cognitive_load_index, efficiency_score, emotional_timeline, session_lti,
    session_transfer_records, strategy_breakdown, ConceptTransferRecord, HeatmapRow,
};
use crate::track_stage;
use crate::types::{
    AttemptCounts, DerivedMetrics, PartialDataWarning, TestSession, TimelinePoint,
};

/// Result of the pure per-session computation: the derived metrics, the
/// session's concept/context transfer cells and, when events were
/// dropped, the non-fatal partial-data warning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreOutcome {
    pub metrics: DerivedMetrics,
    pub transfer: Vec<ConceptTransferRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<PartialDataWarning>,
}

/// Result of folding a scored session into the longitudinal profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoldOutcome {
    pub profile: UserProfile,
    pub progress: SessionProgress,
    pub newly_unlocked: Vec<AchievementUnlock>,
}

/// Full report for one processed session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionReport {
    pub metrics: DerivedMetrics,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<PartialDataWarning>,
    pub profile: UserProfile,
    pub progress: SessionProgress,
    pub newly_unlocked: Vec<AchievementUnlock>,
}

/// Per-user aggregate behind the serialization boundary: the profile and
/// the concept transfer records accumulated across sessions.
#[derive(Debug)]
struct UserEntry {
    profile: UserProfile,
    transfer: BTreeMap<String, ConceptTransferRecord>,
}

impl UserEntry {
    fn new(user_id: &str, now_ms: i64) -> Self {
        Self {
            profile: UserProfile::new(user_id, now_ms),
            transfer: BTreeMap::new(),
        }
    }
}

/// The telemetry scoring engine.
///
/// Per-session scoring is stateless and side-effect-free, so any number
/// of sessions may be scored concurrently. The profile fold is the single
/// point of shared mutable state: each user's aggregate sits behind its
/// own mutex, so same-user folds apply in arrival order while different
/// users never contend.
pub struct ScoringEngine {
    config: Arc<parking_lot::RwLock<EngineConfig>>,
    catalog: Arc<CurriculumCatalog>,
    achievements: Arc<Vec<AchievementDef>>,
    users: Arc<RwLock<HashMap<String, Arc<Mutex<UserEntry>>>>>,
}

impl ScoringEngine {
    pub fn new(config: EngineConfig, catalog: Arc<CurriculumCatalog>) -> Self {
        Self {
            config: Arc::new(parking_lot::RwLock::new(config)),
            catalog,
            achievements: Arc::new(default_achievements()),
            users: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Replaces the achievement catalog (before first use).
    pub fn with_achievements(mut self, defs: Vec<AchievementDef>) -> Self {
        self.achievements = Arc::new(defs);
        self
    }

    pub fn config(&self) -> EngineConfig {
        self.config.read().clone()
    }

    pub fn reload_config(&self) {
        let new_config = EngineConfig::from_env();
        *self.config.write() = new_config;
        tracing::info!("engine config reloaded from environment");
    }

    /// Scores one completed session. Pure: no profile is touched, and a
    /// failure here cannot affect any other session or existing state.
    pub fn compute_derived_metrics(
        &self,
        session: &TestSession,
    ) -> Result<ScoreOutcome, EngineError> {
        let config = self.config.read().clone();
        self.compute_with(&config, session)
    }

    /// Scores independent sessions in parallel; one corrupt session fails
    /// only its own slot.
    pub fn score_batch(&self, sessions: &[TestSession]) -> Vec<Result<ScoreOutcome, EngineError>> {
        let config = self.config.read().clone();
        sessions
            .par_iter()
            .map(|session| self.compute_with(&config, session))
            .collect()
    }

    fn compute_with(
        &self,
        config: &EngineConfig,
        session: &TestSession,
    ) -> Result<ScoreOutcome, EngineError> {
        let normalized = match track_stage!(
            StageId::Normalize,
            normalize_session(session, &config.normalizer)
        ) {
            Ok(normalized) => normalized,
            Err(err) => {
                crate::metrics::registry().record_error(StageId::Normalize);
                return Err(err);
            }
        };

        let events = &normalized.events;
        let counts = AttemptCounts::from_events(events);
        debug_assert_eq!(counts.attempted + counts.unattempted, events.len() as u32);

        let efficiency = track_stage!(
            StageId::Efficiency,
            efficiency_score(events, &config.efficiency)
        );

        let (timeline, load_index): (Vec<TimelinePoint>, i32) = track_stage!(
            StageId::CognitiveLoad,
            (
                emotional_timeline(events, &config.load).collect(),
                cognitive_load_index(events, &config.load),
            )
        );

        let reference_time = self
            .catalog
            .reference_time_ms(&session.subject, &session.chapter)
            .unwrap_or(config.strategy.default_reference_time_ms);
        let breakdown = track_stage!(
            StageId::Strategy,
            strategy_breakdown(events, reference_time, &config.strategy)
        );

        let (transfer, lti) = track_stage!(StageId::Transfer, {
            let records = session_transfer_records(events, &self.catalog);
            let lti = session_lti(&records, &config.transfer);
            (records, lti)
        });

        let metrics = DerivedMetrics {
            session_id: session.session_id.clone(),
            score: counts.score_pct(),
            efficiency,
            cognitive_load_index: load_index,
            lti,
            strategy_breakdown: breakdown,
            emotional_timeline: timeline,
            attempted: counts.attempted,
            correct: counts.correct,
            wrong: counts.wrong,
            unattempted: counts.unattempted,
            computed_at: chrono::Utc::now().timestamp_millis(),
        };

        tracing::debug!(
            session_id = %session.session_id,
            score = metrics.score,
            efficiency = ?metrics.efficiency,
            load = metrics.cognitive_load_index,
            "session scored"
        );

        Ok(ScoreOutcome {
            metrics,
            transfer,
            warning: normalized.warning(),
        })
    }

    /// Folds a scored session into its user's profile. Serialized per
    /// user: the caller may invoke this from any number of tasks, but a
    /// given user's sessions apply one at a time, in lock order.
    pub async fn fold_into_profile(
        &self,
        session: &TestSession,
        outcome: &ScoreOutcome,
    ) -> FoldOutcome {
        let config = self.config.read().clone();
        let now_ms = chrono::Utc::now().timestamp_millis();
        let entry = self.entry_for(&session.user_id, now_ms).await;
        let mut guard = entry.lock().await;
        let entry = &mut *guard;

        let fold = track_stage!(StageId::Profile, {
            let progress = entry.profile.apply_session(
                &outcome.metrics,
                session.started_at,
                &config.progression,
                now_ms,
            );

            for record in &outcome.transfer {
                entry
                    .transfer
                    .entry(record.concept.clone())
                    .or_insert_with(|| ConceptTransferRecord::new(record.concept.clone()))
                    .merge(record);
            }

            let newly_unlocked = unlock_new(
                &self.achievements,
                &mut entry.profile,
                &outcome.metrics,
                now_ms,
            );

            FoldOutcome {
                profile: entry.profile.clone(),
                progress,
                newly_unlocked,
            }
        });

        tracing::debug!(
            user_id = %session.user_id,
            xp_gained = fold.progress.xp_gained,
            streak = fold.profile.streak_days,
            unlocked = fold.newly_unlocked.len(),
            "session folded into profile"
        );

        fold
    }

    /// Scores the session and, only on success, folds it into the
    /// profile. A scoring failure leaves the profile untouched.
    pub async fn process_session(
        &self,
        session: &TestSession,
    ) -> Result<SessionReport, EngineError> {
        let outcome = self.compute_derived_metrics(session)?;
        let fold = self.fold_into_profile(session, &outcome).await;
        Ok(SessionReport {
            metrics: outcome.metrics,
            warning: outcome.warning,
            profile: fold.profile,
            progress: fold.progress,
            newly_unlocked: fold.newly_unlocked,
        })
    }

    pub async fn profile(&self, user_id: &str) -> Option<UserProfile> {
        let entry = {
            let users = self.users.read().await;
            users.get(user_id).cloned()
        }?;
        let guard = entry.lock().await;
        Some(guard.profile.clone())
    }

    /// The longitudinal LTI heatmap for one user, built from every
    /// transfer record folded so far.
    pub async fn heatmap(&self, user_id: &str) -> Vec<HeatmapRow> {
        let Some(entry) = ({
            let users = self.users.read().await;
            users.get(user_id).cloned()
        }) else {
            return Vec::new();
        };
        let config = self.config.read().clone();
        let guard = entry.lock().await;
        let records: Vec<ConceptTransferRecord> = guard.transfer.values().cloned().collect();
        build_heatmap(&records, &config.transfer)
    }

    /// Every defined achievement with its unlock status for one user; all
    /// locked for a user the engine has never seen.
    pub async fn achievement_board(&self, user_id: &str) -> Vec<AchievementStatus> {
        let entry = {
            let users = self.users.read().await;
            users.get(user_id).cloned()
        };
        match entry {
            Some(entry) => {
                let guard = entry.lock().await;
                achievement_board(&self.achievements, &guard.profile)
            }
            None => self
                .achievements
                .iter()
                .map(|def| AchievementStatus {
                    id: def.id.clone(),
                    title: def.title.clone(),
                    icon: def.icon.clone(),
                    unlocked: false,
                    unlocked_at: None,
                })
                .collect(),
        }
    }

    /// Accepts the externally recomputed rank. Returns false for an
    /// unknown user.
    pub async fn record_rank(&self, user_id: &str, rank: u32) -> bool {
        let entry = {
            let users = self.users.read().await;
            users.get(user_id).cloned()
        };
        match entry {
            Some(entry) => {
                let mut guard = entry.lock().await;
                guard.profile.rank = rank;
                true
            }
            None => false,
        }
    }

    async fn entry_for(&self, user_id: &str, now_ms: i64) -> Arc<Mutex<UserEntry>> {
        {
            let users = self.users.read().await;
            if let Some(entry) = users.get(user_id) {
                return Arc::clone(entry);
            }
        }
        let mut users = self.users.write().await;
        Arc::clone(
            users
                .entry(user_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(UserEntry::new(user_id, now_ms)))),
        )
    }
}
