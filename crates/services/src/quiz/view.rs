use assess_core::model::QuizResult;
use assess_core::session::{LockState, QuizSession, SessionStatus};

/// Presentation-agnostic snapshot of a quiz session.
///
/// This is intentionally **not** a UI view-model:
/// - no pre-formatted strings (the UI derives `M:SS` from
///   `elapsed_seconds` with `assess_core::time::format_elapsed`)
/// - no localization assumptions
///
/// The voided flag lets the UI distinguish the terminal, non-recoverable
/// message from a retryable submission failure.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub status: SessionStatus,
    pub cursor: usize,
    pub total: usize,
    pub lock_state: LockState,
    pub elapsed_seconds: u64,
    pub answered: usize,
    pub submission_in_flight: bool,
    pub voided: bool,
    pub result: Option<QuizResult>,
}

impl SessionSnapshot {
    #[must_use]
    pub fn from_session(session: &QuizSession) -> Self {
        Self {
            status: session.status(),
            cursor: session.cursor(),
            total: session.total_questions(),
            lock_state: session.lock_state(),
            elapsed_seconds: session.elapsed_seconds(),
            answered: session.answered_count(),
            submission_in_flight: session.is_submission_in_flight(),
            voided: session.is_voided(),
            result: session.result().cloned(),
        }
    }
}
