use crate::config::StrategyThresholds;
use crate::types::{AttemptEvent, StrategyBreakdown, StrategyTag};

/// Labels one attempt from its behavioral signature, independent of
/// correctness. Precedence Efficient > Guessing > TrialAndError when
/// several conditions fire; the result is never `Unknown`.
pub fn classify_attempt(
    event: &AttemptEvent,
    reference_time_ms: i64,
    thresholds: &StrategyThresholds,
) -> StrategyTag {
    let within_reference = event.time_spent_ms as f64
        <= thresholds.efficient_time_factor * reference_time_ms as f64;
    if within_reference && event.answer_changes <= thresholds.max_efficient_changes {
        return StrategyTag::Efficient;
    }

    let rapid = event.time_spent_ms < thresholds.guess_floor_ms;
    let stressed_snap = event
        .stress_signal
        .is_some_and(|s| s >= thresholds.high_stress)
        && event.time_spent_ms < thresholds.snap_response_ms;
    if rapid || stressed_snap {
        return StrategyTag::Guessing;
    }

    StrategyTag::TrialAndError
}

/// Strategy mix over the attempted questions, as percentages that sum to
/// exactly 100 via the largest-remainder method. Independent rounding can
/// drift from 100; this never does.
pub fn strategy_breakdown(
    events: &[AttemptEvent],
    reference_time_ms: i64,
    thresholds: &StrategyThresholds,
) -> StrategyBreakdown {
    let mut counts = [0u32; 3];
    for event in events.iter().filter(|e| e.correctness.is_attempted()) {
        match classify_attempt(event, reference_time_ms, thresholds) {
            StrategyTag::Efficient => counts[0] += 1,
            StrategyTag::Guessing => counts[2] += 1,
            _ => counts[1] += 1,
        }
    }
    let [efficient, trial_and_error, guessing] = largest_remainder(counts);
    StrategyBreakdown {
        efficient,
        trial_and_error,
        guessing,
    }
}

/// Largest-remainder apportionment of 100 points across three counts.
/// Remainder ties resolve toward the earlier entry (stable sort).
fn largest_remainder(counts: [u32; 3]) -> [u32; 3] {
    let total: u32 = counts.iter().sum();
    if total == 0 {
        return [0; 3];
    }

    let mut floors = [0u32; 3];
    let mut remainders = [(0usize, 0.0_f64); 3];
    for (i, &count) in counts.iter().enumerate() {
        let exact = f64::from(count) * 100.0 / f64::from(total);
        floors[i] = exact.floor() as u32;
        remainders[i] = (i, exact - exact.floor());
    }

    remainders.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    let mut leftover = 100 - floors.iter().sum::<u32>();
    for (index, _) in remainders.iter().cycle() {
        if leftover == 0 {
            break;
        }
        floors[*index] += 1;
        leftover -= 1;
    }

    floors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Correctness;

    const REFERENCE_MS: i64 = 60_000;

    fn event(time_ms: i64, changes: u32, stress: Option<f64>) -> AttemptEvent {
        AttemptEvent {
            question_id: "q".to_string(),
            subject: "Math".to_string(),
            chapter: "Trigonometry".to_string(),
            timestamp: 0,
            time_spent_ms: time_ms,
            correctness: Correctness::Correct,
            strategy: StrategyTag::Unknown,
            stress_signal: stress,
            answer_changes: changes,
        }
    }

    #[test]
    fn fast_clean_answer_is_efficient() {
        let thresholds = StrategyThresholds::default();
        assert_eq!(
            classify_attempt(&event(50_000, 1, None), REFERENCE_MS, &thresholds),
            StrategyTag::Efficient
        );
        // 1.2x the reference is still inside the window
        assert_eq!(
            classify_attempt(&event(72_000, 0, None), REFERENCE_MS, &thresholds),
            StrategyTag::Efficient
        );
    }

    #[test]
    fn efficient_wins_over_guessing_on_ties() {
        // 300ms is under the guess floor, but the answer was clean and
        // fast: precedence keeps it Efficient
        let thresholds = StrategyThresholds::default();
        assert_eq!(
            classify_attempt(&event(300, 0, None), REFERENCE_MS, &thresholds),
            StrategyTag::Efficient
        );
    }

    #[test]
    fn rapid_churned_answer_is_guessing() {
        let thresholds = StrategyThresholds::default();
        assert_eq!(
            classify_attempt(&event(400, 3, None), REFERENCE_MS, &thresholds),
            StrategyTag::Guessing
        );
    }

    #[test]
    fn stressed_snap_answer_is_guessing() {
        let thresholds = StrategyThresholds::default();
        // over the guess floor but high stress with a near-instant answer
        assert_eq!(
            classify_attempt(&event(1200, 4, Some(85.0)), REFERENCE_MS, &thresholds),
            StrategyTag::Guessing
        );
    }

    #[test]
    fn slow_churned_answer_is_trial_and_error() {
        let thresholds = StrategyThresholds::default();
        assert_eq!(
            classify_attempt(&event(90_000, 4, None), REFERENCE_MS, &thresholds),
            StrategyTag::TrialAndError
        );
    }

    #[test]
    fn breakdown_sums_to_exactly_100() {
        let thresholds = StrategyThresholds::default();
        // 1 efficient, 1 guessing, 1 trial-and-error: 33/33/33 would
        // drift; largest remainder lands on 34/33/33
        let events = vec![
            event(10_000, 0, None),
            event(400, 3, None),
            event(90_000, 4, None),
        ];
        let breakdown = strategy_breakdown(&events, REFERENCE_MS, &thresholds);
        assert_eq!(breakdown.total(), 100);
        assert_eq!(breakdown.efficient, 34);
        assert_eq!(breakdown.trial_and_error, 33);
        assert_eq!(breakdown.guessing, 33);
    }

    #[test]
    fn unattempted_events_do_not_enter_the_mix() {
        let thresholds = StrategyThresholds::default();
        let mut skipped = event(0, 0, None);
        skipped.correctness = Correctness::Unattempted;
        let events = vec![event(10_000, 0, None), skipped];
        let breakdown = strategy_breakdown(&events, REFERENCE_MS, &thresholds);
        assert_eq!(breakdown.efficient, 100);
        assert_eq!(breakdown.total(), 100);
    }

    #[test]
    fn empty_mix_is_all_zero() {
        let thresholds = StrategyThresholds::default();
        let breakdown = strategy_breakdown(&[], REFERENCE_MS, &thresholds);
        assert_eq!(breakdown.total(), 0);
    }

    #[test]
    fn largest_remainder_exact_splits_unchanged() {
        assert_eq!(largest_remainder([1, 1, 2]), [25, 25, 50]);
        assert_eq!(largest_remainder([10, 0, 0]), [100, 0, 0]);
    }

    #[test]
    fn largest_remainder_distributes_by_fraction() {
        // 2/7, 2/7, 3/7 -> 28.57, 28.57, 42.86 -> floors 28+28+42 = 98,
        // two leftovers go to the largest remainders
        assert_eq!(largest_remainder([2, 2, 3]), [29, 28, 43]);
    }
}
