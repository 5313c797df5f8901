use crate::config::NormalizerParams;
use crate::error::EngineError;
use crate::types::{AttemptEvent, Correctness, NormalizedSession, RawAttempt, StrategyTag, TestSession};

/// Validates and sanitizes a session's raw attempts.
///
/// Events missing a question id or a parseable correctness, or carrying a
/// negative time-spent, are dropped and counted. Out-of-range stress
/// signals become absent, unrecognized strategy tags become `Unknown`,
/// negative answer-change counts become 0. If more than
/// `max_rejected_ratio` of the events are dropped the whole session is
/// unusable and an error is returned; otherwise scoring proceeds on the
/// valid subset with the rejection count reported alongside.
pub fn normalize_session(
    session: &TestSession,
    params: &NormalizerParams,
) -> Result<NormalizedSession, EngineError> {
    let total = session.attempts.len() as u32;
    let mut events = Vec::with_capacity(session.attempts.len());
    let mut rejected = 0u32;

    for raw in &session.attempts {
        match sanitize_attempt(raw, session) {
            Some(event) => events.push(event),
            None => rejected += 1,
        }
    }

    if total > 0 && f64::from(rejected) / f64::from(total) > params.max_rejected_ratio {
        tracing::warn!(
            session_id = %session.session_id,
            rejected,
            total,
            "session rejected: too many malformed events"
        );
        return Err(EngineError::Validation {
            session_id: session.session_id.clone(),
            rejected,
            total,
        });
    }

    if rejected > 0 {
        tracing::debug!(
            session_id = %session.session_id,
            rejected,
            total,
            "scoring session with partial data"
        );
    }

    Ok(NormalizedSession {
        session_id: session.session_id.clone(),
        user_id: session.user_id.clone(),
        subject: session.subject.clone(),
        chapter: session.chapter.clone(),
        started_at: session.started_at,
        events,
        rejected,
        total,
    })
}

fn sanitize_attempt(raw: &RawAttempt, session: &TestSession) -> Option<AttemptEvent> {
    let question_id = raw
        .question_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())?
        .to_string();
    let correctness = Correctness::parse(raw.correctness.as_deref()?)?;

    if raw.time_spent_ms < 0 {
        return None;
    }

    let stress_signal = raw
        .stress_signal
        .filter(|s| s.is_finite() && (0.0..=100.0).contains(s));
    let strategy = raw
        .strategy
        .as_deref()
        .map(StrategyTag::parse)
        .unwrap_or(StrategyTag::Unknown);

    Some(AttemptEvent {
        question_id,
        subject: session.subject.clone(),
        chapter: session.chapter.clone(),
        timestamp: raw.timestamp,
        time_spent_ms: raw.time_spent_ms,
        correctness,
        strategy,
        stress_signal,
        answer_changes: raw.answer_changes.max(0) as u32,
    })
}
