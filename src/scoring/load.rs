use crate::config::LoadParams;
use crate::types::{AttemptEvent, TimelinePoint};

/// Per-question raw intensity in [0, 1]: a weighted blend of the
/// normalized stress signal, the answer-change churn and the deviation of
/// time-spent from the session median. Stress gaps are imputed from the
/// running mean of prior in-session signals; when no signal has been seen
/// yet the stress term is dropped and the remaining weights renormalized,
/// so a session without any stress data is scored purely from
/// timing/answer-change evidence.
fn raw_intensities<'a>(
    events: &'a [AttemptEvent],
    params: &LoadParams,
) -> impl Iterator<Item = f64> + 'a {
    let median_ms = median_time_ms(events);
    let params = params.clone();
    let mut stress_sum = 0.0_f64;
    let mut stress_seen = 0_u32;

    events.iter().map(move |event| {
        let imputed = (stress_seen > 0).then(|| stress_sum / f64::from(stress_seen));
        let stress = event.stress_signal.or(imputed);
        if let Some(signal) = event.stress_signal {
            stress_sum += signal;
            stress_seen += 1;
        }

        let change_term = (f64::from(event.answer_changes) / params.change_norm).min(1.0);
        let tempo_term = if median_ms > 0.0 {
            ((event.time_spent_ms as f64 - median_ms).abs() / median_ms).min(1.0)
        } else {
            0.0
        };

        match stress {
            Some(signal) => {
                let denom = params.stress_weight + params.change_weight + params.tempo_weight;
                if denom <= f64::EPSILON {
                    return 0.0;
                }
                (params.stress_weight * (signal / 100.0)
                    + params.change_weight * change_term
                    + params.tempo_weight * tempo_term)
                    / denom
            }
            None => {
                let denom = params.change_weight + params.tempo_weight;
                if denom <= f64::EPSILON {
                    return 0.0;
                }
                (params.change_weight * change_term + params.tempo_weight * tempo_term) / denom
            }
        }
    })
}

/// The emotional timeline: raw per-question intensity scaled to 0-100, in
/// original order. Restartable: every call re-derives the sequence from
/// the same events, nothing is mutated incrementally.
pub fn emotional_timeline<'a>(
    events: &'a [AttemptEvent],
    params: &LoadParams,
) -> impl Iterator<Item = TimelinePoint> + 'a {
    raw_intensities(events, params)
        .enumerate()
        .map(|(idx, intensity)| TimelinePoint {
            question_number: idx as u32 + 1,
            intensity: (intensity * 1000.0).round() / 10.0,
        })
}

/// Scalar load index: exponentially-weighted moving average over the raw
/// intensities, so one anomalous question cannot dominate, scaled to
/// [0, 100]. An empty session carries no load.
pub fn cognitive_load_index(events: &[AttemptEvent], params: &LoadParams) -> i32 {
    let mut smoothed: Option<f64> = None;
    for raw in raw_intensities(events, params) {
        smoothed = Some(match smoothed {
            Some(prev) => params.smoothing * raw + (1.0 - params.smoothing) * prev,
            None => raw,
        });
    }
    smoothed
        .map(|value| ((value * 100.0).round() as i32).clamp(0, 100))
        .unwrap_or(0)
}

fn median_time_ms(events: &[AttemptEvent]) -> f64 {
    if events.is_empty() {
        return 0.0;
    }
    let mut times: Vec<i64> = events.iter().map(|e| e.time_spent_ms).collect();
    times.sort_unstable();
    let mid = times.len() / 2;
    if times.len() % 2 == 0 {
        (times[mid - 1] + times[mid]) as f64 / 2.0
    } else {
        times[mid] as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Correctness, StrategyTag};

    fn event(time_ms: i64, stress: Option<f64>, changes: u32) -> AttemptEvent {
        AttemptEvent {
            question_id: "q".to_string(),
            subject: "Physics".to_string(),
            chapter: "Optics".to_string(),
            timestamp: 0,
            time_spent_ms: time_ms,
            correctness: Correctness::Correct,
            strategy: StrategyTag::Efficient,
            stress_signal: stress,
            answer_changes: changes,
        }
    }

    #[test]
    fn timeline_is_ordered_and_restartable() {
        let events = vec![
            event(1000, Some(20.0), 0),
            event(4000, Some(60.0), 2),
            event(2000, None, 1),
        ];
        let params = LoadParams::default();
        let first: Vec<_> = emotional_timeline(&events, &params).collect();
        let second: Vec<_> = emotional_timeline(&events, &params).collect();
        assert_eq!(first.len(), 3);
        assert_eq!(first, second);
        assert_eq!(first[0].question_number, 1);
        assert_eq!(first[2].question_number, 3);
    }

    #[test]
    fn intensities_stay_in_range() {
        let events = vec![
            event(0, Some(100.0), 50),
            event(600_000, Some(100.0), 50),
            event(10, None, 0),
        ];
        let params = LoadParams::default();
        for point in emotional_timeline(&events, &params) {
            assert!(point.intensity >= 0.0 && point.intensity <= 100.0);
        }
        let index = cognitive_load_index(&events, &params);
        assert!((0..=100).contains(&index));
    }

    #[test]
    fn missing_stress_imputes_prior_mean() {
        // second question has no signal; it should inherit the running
        // mean (40) instead of reading as calm
        let events = vec![event(2000, Some(40.0), 0), event(2000, None, 0)];
        let params = LoadParams::default();
        let points: Vec<_> = emotional_timeline(&events, &params).collect();
        assert_eq!(points[0].intensity, points[1].intensity);
    }

    #[test]
    fn no_stress_anywhere_scores_from_timing_only() {
        let steady = vec![event(2000, None, 0), event(2000, None, 0)];
        let erratic = vec![event(100, None, 5), event(20_000, None, 5)];
        let params = LoadParams::default();
        assert_eq!(cognitive_load_index(&steady, &params), 0);
        assert!(cognitive_load_index(&erratic, &params) > 50);
    }

    #[test]
    fn single_spike_is_damped_by_smoothing() {
        let mut events = vec![event(2000, Some(10.0), 0); 9];
        events.push(event(2000, Some(100.0), 5));
        let params = LoadParams::default();
        let index = cognitive_load_index(&events, &params);
        // the spike alone would read 75; the EWMA keeps it well below
        assert!(index < 40, "index {index} not damped");
    }

    #[test]
    fn empty_session_has_zero_load() {
        let params = LoadParams::default();
        assert_eq!(cognitive_load_index(&[], &params), 0);
        assert_eq!(emotional_timeline(&[], &params).count(), 0);
    }

    #[test]
    fn median_handles_even_and_odd() {
        assert_eq!(median_time_ms(&[event(1000, None, 0)]), 1000.0);
        assert_eq!(
            median_time_ms(&[event(1000, None, 0), event(3000, None, 0)]),
            2000.0
        );
    }
}
