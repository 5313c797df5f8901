use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Correctness {
    Correct,
    Incorrect,
    Unattempted,
}

impl Correctness {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Correct => "correct",
            Self::Incorrect => "incorrect",
            Self::Unattempted => "unattempted",
        }
    }

    /// Strict parse: ingestion drops events whose correctness is missing
    /// or unrecognizable, so there is no fallback variant here.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "correct" | "right" => Some(Self::Correct),
            "incorrect" | "wrong" => Some(Self::Incorrect),
            "unattempted" | "skipped" => Some(Self::Unattempted),
            _ => None,
        }
    }

    pub fn is_attempted(&self) -> bool {
        !matches!(self, Self::Unattempted)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[derive(Default)]
pub enum StrategyTag {
    Efficient,
    TrialAndError,
    Guessing,
    #[default]
    Unknown,
}

impl StrategyTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Efficient => "efficient",
            Self::TrialAndError => "trialAndError",
            Self::Guessing => "guessing",
            Self::Unknown => "unknown",
        }
    }

    /// Unrecognized tags map to `Unknown` rather than rejecting the event.
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().replace(['-', '_', ' ', '&'], "").as_str() {
            "efficient" => Self::Efficient,
            "trialanderror" | "trialerror" => Self::TrialAndError,
            "guessing" | "guess" => Self::Guessing,
            _ => Self::Unknown,
        }
    }
}

/// One attempt record as delivered by the ingestion layer, before
/// validation. Identifier and correctness are optional on purpose: events
/// missing either are dropped by the normalizer.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RawAttempt {
    #[serde(default)]
    pub question_id: Option<String>,
    #[serde(default)]
    pub correctness: Option<String>,
    #[serde(default)]
    pub strategy: Option<String>,
    #[serde(default)]
    pub timestamp: i64,
    #[serde(default)]
    pub time_spent_ms: i64,
    #[serde(default)]
    pub stress_signal: Option<f64>,
    #[serde(default)]
    pub answer_changes: i64,
}

/// A validated attempt event. Immutable once produced by the normalizer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptEvent {
    pub question_id: String,
    pub subject: String,
    pub chapter: String,
    pub timestamp: i64,
    pub time_spent_ms: i64,
    pub correctness: Correctness,
    pub strategy: StrategyTag,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stress_signal: Option<f64>,
    pub answer_changes: u32,
}

/// A completed test session: one user, subject, chapter and date, owning
/// its attempt events exclusively, in answer order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestSession {
    pub session_id: String,
    pub user_id: String,
    pub subject: String,
    pub chapter: String,
    pub started_at: i64,
    pub attempts: Vec<RawAttempt>,
}

/// Normalizer output: the valid ordered subset plus rejection metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedSession {
    pub session_id: String,
    pub user_id: String,
    pub subject: String,
    pub chapter: String,
    pub started_at: i64,
    pub events: Vec<AttemptEvent>,
    pub rejected: u32,
    pub total: u32,
}

impl NormalizedSession {
    pub fn rejection_ratio(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            f64::from(self.rejected) / f64::from(self.total)
        }
    }

    pub fn warning(&self) -> Option<PartialDataWarning> {
        (self.rejected > 0).then_some(PartialDataWarning {
            rejected: self.rejected,
            total: self.total,
        })
    }
}

/// Non-fatal: some events were dropped but the session was still scored.
/// Recorded alongside the result, never raised as an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialDataWarning {
    pub rejected: u32,
    pub total: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptCounts {
    pub attempted: u32,
    pub correct: u32,
    pub wrong: u32,
    pub unattempted: u32,
}

impl AttemptCounts {
    pub fn from_events(events: &[AttemptEvent]) -> Self {
        let mut counts = Self::default();
        for event in events {
            match event.correctness {
                Correctness::Correct => {
                    counts.attempted += 1;
                    counts.correct += 1;
                }
                Correctness::Incorrect => {
                    counts.attempted += 1;
                    counts.wrong += 1;
                }
                Correctness::Unattempted => counts.unattempted += 1,
            }
        }
        counts
    }

    /// Plain accuracy over attempted questions, 0 when nothing was attempted.
    pub fn score_pct(&self) -> i32 {
        if self.attempted == 0 {
            return 0;
        }
        let pct = 100.0 * f64::from(self.correct) / f64::from(self.attempted);
        (pct.round() as i32).clamp(0, 100)
    }
}

/// One point of the emotional timeline, in original question order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelinePoint {
    pub question_number: u32,
    pub intensity: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyBreakdown {
    pub efficient: u32,
    pub trial_and_error: u32,
    pub guessing: u32,
}

impl StrategyBreakdown {
    pub fn total(&self) -> u32 {
        self.efficient + self.trial_and_error + self.guessing
    }
}

/// Everything the presentation layer renders for one scored session.
/// Computed, never hand-edited.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedMetrics {
    pub session_id: String,
    pub score: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub efficiency: Option<i32>,
    pub cognitive_load_index: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lti: Option<i32>,
    pub strategy_breakdown: StrategyBreakdown,
    pub emotional_timeline: Vec<TimelinePoint>,
    pub attempted: u32,
    pub correct: u32,
    pub wrong: u32,
    pub unattempted: u32,
    pub computed_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn correctness_parse_accepts_aliases() {
        assert_eq!(Correctness::parse("Correct"), Some(Correctness::Correct));
        assert_eq!(Correctness::parse("wrong"), Some(Correctness::Incorrect));
        assert_eq!(
            Correctness::parse("SKIPPED"),
            Some(Correctness::Unattempted)
        );
        assert_eq!(Correctness::parse("maybe"), None);
    }

    #[test]
    fn strategy_parse_maps_unrecognized_to_unknown() {
        assert_eq!(StrategyTag::parse("efficient"), StrategyTag::Efficient);
        assert_eq!(
            StrategyTag::parse("trial_and_error"),
            StrategyTag::TrialAndError
        );
        assert_eq!(StrategyTag::parse("Trial & Error"), StrategyTag::TrialAndError);
        assert_eq!(StrategyTag::parse("guess"), StrategyTag::Guessing);
        assert_eq!(StrategyTag::parse("telepathy"), StrategyTag::Unknown);
    }

    #[test]
    fn attempt_counts_partition_event_total() {
        let events = vec![
            event(Correctness::Correct),
            event(Correctness::Incorrect),
            event(Correctness::Unattempted),
            event(Correctness::Correct),
        ];
        let counts = AttemptCounts::from_events(&events);
        assert_eq!(counts.attempted, 3);
        assert_eq!(counts.correct, 2);
        assert_eq!(counts.wrong, 1);
        assert_eq!(counts.unattempted, 1);
        assert_eq!(
            counts.attempted + counts.unattempted,
            events.len() as u32
        );
        assert_eq!(counts.score_pct(), 67);
    }

    fn event(correctness: Correctness) -> AttemptEvent {
        AttemptEvent {
            question_id: "q1".to_string(),
            subject: "Physics".to_string(),
            chapter: "Kinematics".to_string(),
            timestamp: 0,
            time_spent_ms: 1000,
            correctness,
            strategy: StrategyTag::Efficient,
            stress_signal: None,
            answer_changes: 0,
        }
    }
}
