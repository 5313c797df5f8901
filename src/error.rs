use thiserror::Error;

/// Failures that make a whole session unusable. Everything non-fatal
/// (dropped events, missing transfer evidence) is carried alongside
/// successful results instead of surfacing here.
#[derive(Debug, Clone, Error)]
pub enum EngineError {
    #[error("session {session_id} unusable: {rejected} of {total} events failed validation")]
    Validation {
        session_id: String,
        rejected: u32,
        total: u32,
    },
}
