use crate::config::EfficiencyWeights;
use crate::types::{AttemptEvent, Correctness, StrategyTag};

impl EfficiencyWeights {
    pub fn for_tag(&self, tag: StrategyTag) -> f64 {
        match tag {
            StrategyTag::Efficient => self.efficient,
            StrategyTag::TrialAndError => self.trial_and_error,
            StrategyTag::Guessing => self.guessing,
            StrategyTag::Unknown => self.unknown,
        }
    }
}

/// How much of the session's correctness came from methodical work rather
/// than trial-and-error or guessing, weighted by time economy.
///
/// Each correct attempt contributes its strategy weight; the sum is
/// normalized by the attempted count. An all-skipped session has no
/// efficiency signal at all and yields `None`, never 0.
pub fn efficiency_score(events: &[AttemptEvent], weights: &EfficiencyWeights) -> Option<i32> {
    let attempted = events
        .iter()
        .filter(|e| e.correctness.is_attempted())
        .count();
    if attempted == 0 {
        return None;
    }

    let weighted: f64 = events
        .iter()
        .filter(|e| e.correctness == Correctness::Correct)
        .map(|e| weights.for_tag(e.strategy))
        .sum();

    let pct = 100.0 * weighted / attempted as f64;
    Some((pct.round() as i32).clamp(0, 100))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(correctness: Correctness, strategy: StrategyTag) -> AttemptEvent {
        AttemptEvent {
            question_id: "q".to_string(),
            subject: "Math".to_string(),
            chapter: "Algebra".to_string(),
            timestamp: 0,
            time_spent_ms: 1000,
            correctness,
            strategy,
            stress_signal: None,
            answer_changes: 0,
        }
    }

    #[test]
    fn worked_example_rounds_to_33() {
        // correct/Efficient + correct/Guessing + incorrect/TrialAndError + skip
        let events = vec![
            event(Correctness::Correct, StrategyTag::Efficient),
            event(Correctness::Correct, StrategyTag::Guessing),
            event(Correctness::Incorrect, StrategyTag::TrialAndError),
            event(Correctness::Unattempted, StrategyTag::Unknown),
        ];
        assert_eq!(
            efficiency_score(&events, &EfficiencyWeights::default()),
            Some(33)
        );
    }

    #[test]
    fn all_skipped_session_has_no_signal() {
        let events = vec![
            event(Correctness::Unattempted, StrategyTag::Unknown),
            event(Correctness::Unattempted, StrategyTag::Unknown),
        ];
        assert_eq!(efficiency_score(&events, &EfficiencyWeights::default()), None);
        assert_eq!(efficiency_score(&[], &EfficiencyWeights::default()), None);
    }

    #[test]
    fn all_efficient_correct_is_100() {
        let events = vec![
            event(Correctness::Correct, StrategyTag::Efficient),
            event(Correctness::Correct, StrategyTag::Efficient),
        ];
        assert_eq!(
            efficiency_score(&events, &EfficiencyWeights::default()),
            Some(100)
        );
    }

    #[test]
    fn incorrect_attempts_dilute_the_score() {
        let events = vec![
            event(Correctness::Correct, StrategyTag::Efficient),
            event(Correctness::Incorrect, StrategyTag::Efficient),
        ];
        assert_eq!(
            efficiency_score(&events, &EfficiencyWeights::default()),
            Some(50)
        );
    }

    #[test]
    fn unknown_strategy_uses_neutral_weight() {
        let events = vec![event(Correctness::Correct, StrategyTag::Unknown)];
        assert_eq!(
            efficiency_score(&events, &EfficiencyWeights::default()),
            Some(50)
        );
    }
}
