use chrono::Timelike;
use serde::{Deserialize, Serialize};

use crate::config::ProgressionParams;
use crate::types::DerivedMetrics;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum TimeOfDay {
    #[default]
    Morning,
    Afternoon,
    Evening,
    Night,
}

impl TimeOfDay {
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            5..=11 => Self::Morning,
            12..=16 => Self::Afternoon,
            17..=21 => Self::Evening,
            _ => Self::Night,
        }
    }

    pub fn from_timestamp_ms(timestamp: i64) -> Option<Self> {
        chrono::DateTime::from_timestamp_millis(timestamp).map(|dt| Self::from_hour(dt.hour()))
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Morning => "Morning",
            Self::Afternoon => "Afternoon",
            Self::Evening => "Evening",
            Self::Night => "Night",
        }
    }
}

/// Per time-of-day accumulator backing the optimal-state estimate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotStats {
    pub sessions: u32,
    pub focus_sum: f64,
    pub score_sum: f64,
}

impl SlotStats {
    pub fn observe(&mut self, focus: f64, score: f64) {
        self.sessions += 1;
        self.focus_sum += focus;
        self.score_sum += score;
    }

    pub fn avg_focus(&self) -> f64 {
        if self.sessions == 0 {
            0.0
        } else {
            self.focus_sum / f64::from(self.sessions)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimalLearningState {
    pub focus: i32,
    pub time_of_day: TimeOfDay,
}

impl Default for OptimalLearningState {
    fn default() -> Self {
        Self {
            focus: 0,
            time_of_day: TimeOfDay::Morning,
        }
    }
}

/// XP awarded for one session: a base for showing up plus weighted score
/// and efficiency components (a null efficiency contributes nothing).
pub fn xp_gain(metrics: &DerivedMetrics, params: &ProgressionParams) -> i64 {
    let efficiency = metrics.efficiency.unwrap_or(0);
    let gain = params.base_xp
        + params.score_xp_weight * f64::from(metrics.score)
        + params.efficiency_xp_weight * f64::from(efficiency);
    gain.round().max(0.0) as i64
}

/// Level from cumulative XP. The per-level requirement grows by 50 XP
/// each level, so the cumulative thresholds are strictly increasing.
pub fn level_for_xp(xp: i64) -> u32 {
    let mut level = 1u32;
    let mut step = 100i64;
    let mut next = step;
    while xp >= next {
        level += 1;
        step += 50;
        next += step;
    }
    level
}

/// Streak update: first session ever starts at 1; a session within the
/// window of the previous one extends the run; a longer gap resets to 1.
pub fn advance_streak(
    previous_session_at: Option<i64>,
    session_at: i64,
    current: u32,
    window_hours: i64,
) -> u32 {
    match previous_session_at {
        None => 1,
        Some(previous) => {
            let gap_ms = session_at - previous;
            if gap_ms <= window_hours * 3_600_000 {
                current.saturating_add(1).max(1)
            } else {
                1
            }
        }
    }
}

/// The slot where the user historically focuses best; ties go to the
/// slot with more observed sessions.
pub fn best_slot(
    slots: &std::collections::BTreeMap<TimeOfDay, SlotStats>,
) -> Option<OptimalLearningState> {
    slots
        .iter()
        .filter(|(_, stats)| stats.sessions > 0)
        .max_by(|(_, a), (_, b)| {
            a.avg_focus()
                .partial_cmp(&b.avg_focus())
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.sessions.cmp(&b.sessions))
        })
        .map(|(slot, stats)| OptimalLearningState {
            focus: (stats.avg_focus().round() as i32).clamp(0, 100),
            time_of_day: *slot,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    const HOUR_MS: i64 = 3_600_000;

    #[test]
    fn streak_extends_within_24h_and_resets_after() {
        let t0 = 1_700_000_000_000;
        let mut streak = advance_streak(None, t0, 0, 24);
        assert_eq!(streak, 1);
        streak = advance_streak(Some(t0), t0 + 23 * HOUR_MS, streak, 24);
        assert_eq!(streak, 2);
        streak = advance_streak(Some(t0 + 23 * HOUR_MS), t0 + 46 * HOUR_MS, streak, 24);
        assert_eq!(streak, 3);
        streak = advance_streak(Some(t0 + 46 * HOUR_MS), t0 + 96 * HOUR_MS, streak, 24);
        assert_eq!(streak, 1);
    }

    #[test]
    fn gap_of_exactly_24h_still_extends() {
        assert_eq!(advance_streak(Some(0), 24 * HOUR_MS, 4, 24), 5);
        assert_eq!(advance_streak(Some(0), 24 * HOUR_MS + 1, 4, 24), 1);
    }

    #[test]
    fn levels_never_skip_and_thresholds_increase() {
        assert_eq!(level_for_xp(0), 1);
        assert_eq!(level_for_xp(99), 1);
        assert_eq!(level_for_xp(100), 2);
        assert_eq!(level_for_xp(249), 2);
        assert_eq!(level_for_xp(250), 3);
        let mut last = 0;
        for xp in (0..20_000).step_by(37) {
            let level = level_for_xp(xp);
            assert!(level >= last);
            last = level;
        }
    }

    #[test]
    fn time_of_day_buckets_cover_all_hours() {
        assert_eq!(TimeOfDay::from_hour(6), TimeOfDay::Morning);
        assert_eq!(TimeOfDay::from_hour(13), TimeOfDay::Afternoon);
        assert_eq!(TimeOfDay::from_hour(19), TimeOfDay::Evening);
        assert_eq!(TimeOfDay::from_hour(2), TimeOfDay::Night);
        assert_eq!(TimeOfDay::from_hour(23), TimeOfDay::Night);
    }

    #[test]
    fn best_slot_prefers_highest_average_focus() {
        let mut slots = BTreeMap::new();
        slots.insert(
            TimeOfDay::Morning,
            SlotStats {
                sessions: 3,
                focus_sum: 240.0,
                score_sum: 210.0,
            },
        );
        slots.insert(
            TimeOfDay::Night,
            SlotStats {
                sessions: 1,
                focus_sum: 60.0,
                score_sum: 40.0,
            },
        );
        let best = best_slot(&slots).unwrap();
        assert_eq!(best.time_of_day, TimeOfDay::Morning);
        assert_eq!(best.focus, 80);
    }

    #[test]
    fn best_slot_is_none_without_observations() {
        assert_eq!(best_slot(&BTreeMap::new()), None);
    }
}
