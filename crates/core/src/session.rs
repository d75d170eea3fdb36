use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

use crate::model::{
    CHOICES_PER_QUESTION, Question, QuestionId, QuizResult, SessionId, SubmissionPayload,
};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionError {
    #[error("a quiz session needs at least one question")]
    NoQuestions,
}

//
// ─── STATES ────────────────────────────────────────────────────────────────────
//

/// Lifecycle of one quiz attempt.
///
/// `Voided` and `Finished` are terminal: once reached, answers, cursor and
/// elapsed time are frozen. A voided session is discarded; retrying means
/// constructing a fresh `QuizSession`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Intro,
    Active,
    Voided,
    Finished,
}

impl SessionStatus {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionStatus::Voided | SessionStatus::Finished)
    }
}

/// Per-question gate. Once locked, only advancing or an explicit unlock
/// are legal; the stored answer survives an unlock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LockState {
    #[default]
    Unlocked,
    Locked,
}

/// Outcome of an `advance` call.
#[derive(Debug, Clone, PartialEq)]
pub enum Advance {
    /// Moved to the next question; the lock resets to `Unlocked`.
    Moved,
    /// The last question was confirmed. The submission flag is now set and
    /// the payload must be handed to the grading collaborator.
    Submit(SubmissionPayload),
    /// The call was not legal in the current state and had no effect.
    Ignored,
}

/// What happened to a grading result handed back to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionDisposition {
    /// The session transitioned to `Finished` and stored the result.
    Applied,
    /// The session was voided while the grading call was outstanding;
    /// the stale result was dropped.
    Discarded,
    /// No submission was in flight; nothing changed.
    Ignored,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// Single source of truth for one timed quiz attempt.
///
/// The session owns the answer/lock/advance protocol, the per-second
/// elapsed counter, the integrity policy, and the at-most-once submission
/// guard. All invalid transitions are silent no-ops so a caller that races
/// its own UI guards cannot corrupt state.
///
/// Timestamps (`start`, `report_integrity_violation`, `apply_result`) come
/// from the services-layer clock to keep time deterministic in tests.
pub struct QuizSession {
    id: SessionId,
    questions: Vec<Question>,
    answers: HashMap<QuestionId, u8>,
    cursor: usize,
    lock_state: LockState,
    elapsed_seconds: u64,
    status: SessionStatus,
    submission_in_flight: bool,
    frozen_elapsed: Option<u64>,
    result: Option<QuizResult>,
    started_at: Option<DateTime<Utc>>,
    concluded_at: Option<DateTime<Utc>>,
}

impl QuizSession {
    /// Create a session in `Intro` over a fixed question set.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NoQuestions` if the set is empty.
    pub fn new(questions: Vec<Question>) -> Result<Self, SessionError> {
        if questions.is_empty() {
            return Err(SessionError::NoQuestions);
        }

        Ok(Self {
            id: SessionId::generate(),
            questions,
            answers: HashMap::new(),
            cursor: 0,
            lock_state: LockState::Unlocked,
            elapsed_seconds: 0,
            status: SessionStatus::Intro,
            submission_in_flight: false,
            frozen_elapsed: None,
            result: None,
            started_at: None,
            concluded_at: None,
        })
    }

    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    #[must_use]
    pub fn status(&self) -> SessionStatus {
        self.status
    }

    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    #[must_use]
    pub fn lock_state(&self) -> LockState {
        self.lock_state
    }

    #[must_use]
    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed_seconds
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// Total number of questions in this session.
    #[must_use]
    pub fn total_questions(&self) -> usize {
        self.questions.len()
    }

    /// Number of questions with a recorded answer.
    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.answers.len()
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.cursor)
    }

    /// The recorded choice for a question, if any.
    #[must_use]
    pub fn answer_for(&self, id: QuestionId) -> Option<u8> {
        self.answers.get(&id).copied()
    }

    #[must_use]
    pub fn is_submission_in_flight(&self) -> bool {
        self.submission_in_flight
    }

    #[must_use]
    pub fn is_voided(&self) -> bool {
        self.status == SessionStatus::Voided
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    #[must_use]
    pub fn result(&self) -> Option<&QuizResult> {
        self.result.as_ref()
    }

    #[must_use]
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    /// When the session reached a terminal state (finished or voided).
    #[must_use]
    pub fn concluded_at(&self) -> Option<DateTime<Utc>> {
        self.concluded_at
    }

    //
    // ─── TRANSITIONS ───────────────────────────────────────────────────────────
    //

    /// Begin the attempt: `Intro` → `Active`.
    ///
    /// Resets the cursor, answers, lock, and elapsed counter. Rejected
    /// outside `Intro`; a voided session is never restarted in place.
    pub fn start(&mut self, started_at: DateTime<Utc>) {
        if self.status != SessionStatus::Intro {
            return;
        }

        self.cursor = 0;
        self.answers.clear();
        self.lock_state = LockState::Unlocked;
        self.elapsed_seconds = 0;
        self.submission_in_flight = false;
        self.frozen_elapsed = None;
        self.result = None;
        self.started_at = Some(started_at);
        self.status = SessionStatus::Active;
    }

    /// Advance the elapsed counter by one second.
    ///
    /// Gated on `Active`: a tick arriving after a terminal transition is
    /// dropped, so the driver can never corrupt a concluded session.
    pub fn tick(&mut self) {
        if self.status == SessionStatus::Active {
            self.elapsed_seconds = self.elapsed_seconds.saturating_add(1);
        }
    }

    /// Record a choice for the current question, overwriting any earlier
    /// choice. Rejected while locked, outside `Active`, or for an
    /// out-of-range choice index.
    pub fn select_choice(&mut self, choice: u8) {
        if self.status != SessionStatus::Active || self.lock_state == LockState::Locked {
            return;
        }
        if usize::from(choice) >= CHOICES_PER_QUESTION {
            return;
        }
        let Some(question) = self.questions.get(self.cursor) else {
            return;
        };
        self.answers.insert(question.id(), choice);
    }

    /// Freeze the current answer: `Unlocked` → `Locked`.
    ///
    /// No-op until an answer exists for the current question; the caller
    /// blocks the affordance until a choice is made.
    pub fn confirm_lock(&mut self) {
        if self.status != SessionStatus::Active || self.lock_state == LockState::Locked {
            return;
        }
        let Some(question) = self.questions.get(self.cursor) else {
            return;
        };
        if self.answers.contains_key(&question.id()) {
            self.lock_state = LockState::Locked;
        }
    }

    /// Reopen the current question for editing. The stored answer is kept.
    pub fn unlock(&mut self) {
        if self.status != SessionStatus::Active {
            return;
        }
        self.lock_state = LockState::Unlocked;
    }

    /// Move past the current locked question.
    ///
    /// On any question but the last: cursor moves forward one and the lock
    /// resets. On the last question: the submission flag is set and the
    /// frozen payload is returned for the grading call. Only legal while
    /// `Active` and `Locked`; a second call while a submission is in
    /// flight is ignored (double-tap guard).
    pub fn advance(&mut self) -> Advance {
        if self.status != SessionStatus::Active || self.lock_state != LockState::Locked {
            return Advance::Ignored;
        }

        if self.cursor + 1 < self.questions.len() {
            self.cursor += 1;
            self.lock_state = LockState::Unlocked;
            return Advance::Moved;
        }

        if self.submission_in_flight {
            return Advance::Ignored;
        }

        Advance::Submit(self.begin_submission())
    }

    /// Explicit submission entry point.
    ///
    /// Returns the frozen payload when the session is `Active`, every
    /// question has an answer, and no submission is already in flight;
    /// `None` otherwise.
    pub fn finish(&mut self) -> Option<SubmissionPayload> {
        if self.status != SessionStatus::Active || self.submission_in_flight {
            return None;
        }
        if self.answers.len() < self.questions.len() {
            return None;
        }

        Some(self.begin_submission())
    }

    /// Report that the grading call failed.
    ///
    /// Clears the in-flight flag so the caller can retry; answers and the
    /// frozen elapsed value are untouched, so the retry re-sends the
    /// identical payload.
    pub fn submission_failed(&mut self) {
        if self.status == SessionStatus::Active {
            self.submission_in_flight = false;
        }
    }

    /// Hand a grading result back to the session.
    ///
    /// Applied only when the session is still `Active` with a submission
    /// in flight. A result arriving for a session voided in the meantime
    /// is discarded rather than applied.
    pub fn apply_result(&mut self, result: QuizResult, at: DateTime<Utc>) -> SubmissionDisposition {
        match self.status {
            SessionStatus::Voided => SubmissionDisposition::Discarded,
            SessionStatus::Active if self.submission_in_flight => {
                self.submission_in_flight = false;
                self.result = Some(result);
                self.concluded_at = Some(at);
                self.status = SessionStatus::Finished;
                SubmissionDisposition::Applied
            }
            _ => SubmissionDisposition::Ignored,
        }
    }

    /// Force the terminal `Voided` state from `Active`.
    ///
    /// The single entry point for the host-environment violation detector.
    /// Idempotent, and a strict no-op from `Intro` and `Finished` so a
    /// late signal cannot void a session that never started or already
    /// concluded. Answers, cursor, and elapsed time are retained for
    /// audit but frozen.
    pub fn report_integrity_violation(&mut self, at: DateTime<Utc>) {
        if self.status != SessionStatus::Active {
            return;
        }
        self.status = SessionStatus::Voided;
        self.submission_in_flight = false;
        self.concluded_at = Some(at);
    }

    fn begin_submission(&mut self) -> SubmissionPayload {
        self.submission_in_flight = true;
        // First submission freezes the counter; retries re-use the value.
        let elapsed = *self.frozen_elapsed.get_or_insert(self.elapsed_seconds);
        SubmissionPayload {
            answers: self.answers.clone(),
            elapsed_seconds: elapsed,
        }
    }
}

impl fmt::Debug for QuizSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizSession")
            .field("id", &self.id)
            .field("questions_len", &self.questions.len())
            .field("cursor", &self.cursor)
            .field("lock_state", &self.lock_state)
            .field("status", &self.status)
            .field("elapsed_seconds", &self.elapsed_seconds)
            .field("submission_in_flight", &self.submission_in_flight)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::QuestionOutcome;
    use crate::time::fixed_now;

    fn build_question(id: u64) -> Question {
        Question::new(
            QuestionId::new(id),
            format!("Q{id}"),
            [
                "A".to_string(),
                "B".to_string(),
                "C".to_string(),
                "D".to_string(),
            ],
            "general",
        )
    }

    fn build_session(count: u64) -> QuizSession {
        let questions = (1..=count).map(build_question).collect();
        QuizSession::new(questions).unwrap()
    }

    fn active_session(count: u64) -> QuizSession {
        let mut session = build_session(count);
        session.start(fixed_now());
        session
    }

    fn build_result() -> QuizResult {
        QuizResult {
            score: 2,
            total: 3,
            percent: 67,
            passed: true,
            per_question: vec![QuestionOutcome {
                question_id: QuestionId::new(1),
                chosen: Some(1),
                correct_choice: 1,
                is_correct: true,
            }],
        }
    }

    #[test]
    fn new_rejects_empty_question_set() {
        let err = QuizSession::new(Vec::new()).unwrap_err();
        assert!(matches!(err, SessionError::NoQuestions));
    }

    #[test]
    fn session_starts_in_intro() {
        let session = build_session(3);
        assert_eq!(session.status(), SessionStatus::Intro);
        assert_eq!(session.cursor(), 0);
        assert_eq!(session.elapsed_seconds(), 0);
        assert_eq!(session.total_questions(), 3);
        assert_eq!(session.questions().len(), 3);
        assert!(session.started_at().is_none());
        assert!(!session.is_terminal());
    }

    #[test]
    fn start_activates_and_records_timestamp() {
        let mut session = build_session(3);
        session.start(fixed_now());
        assert_eq!(session.status(), SessionStatus::Active);
        assert_eq!(session.started_at(), Some(fixed_now()));
    }

    #[test]
    fn start_is_rejected_outside_intro() {
        let mut session = active_session(2);
        session.select_choice(1);
        session.confirm_lock();

        // A second start must not reset an active attempt.
        session.start(fixed_now());
        assert_eq!(session.answered_count(), 1);
        assert_eq!(session.lock_state(), LockState::Locked);

        session.report_integrity_violation(fixed_now());
        session.start(fixed_now());
        assert_eq!(session.status(), SessionStatus::Voided);
    }

    #[test]
    fn tick_advances_only_while_active() {
        let mut session = build_session(2);
        session.tick();
        assert_eq!(session.elapsed_seconds(), 0);

        session.start(fixed_now());
        session.tick();
        session.tick();
        assert_eq!(session.elapsed_seconds(), 2);

        session.report_integrity_violation(fixed_now());
        session.tick();
        assert_eq!(session.elapsed_seconds(), 2);
    }

    #[test]
    fn select_choice_overwrites_previous_answer() {
        let mut session = active_session(2);
        let current = session.current_question().unwrap().id();

        session.select_choice(0);
        session.select_choice(3);
        assert_eq!(session.answer_for(current), Some(3));
        assert_eq!(session.answered_count(), 1);
    }

    #[test]
    fn select_choice_rejects_out_of_range_index() {
        let mut session = active_session(2);
        let current = session.current_question().unwrap().id();

        session.select_choice(4);
        assert_eq!(session.answer_for(current), None);
    }

    #[test]
    fn select_choice_has_no_effect_while_locked() {
        let mut session = active_session(2);
        let current = session.current_question().unwrap().id();

        session.select_choice(1);
        session.confirm_lock();
        assert_eq!(session.lock_state(), LockState::Locked);

        session.select_choice(2);
        assert_eq!(session.answer_for(current), Some(1));
    }

    #[test]
    fn confirm_lock_requires_an_answer() {
        let mut session = active_session(2);
        session.confirm_lock();
        assert_eq!(session.lock_state(), LockState::Unlocked);

        session.select_choice(0);
        session.confirm_lock();
        assert_eq!(session.lock_state(), LockState::Locked);
    }

    #[test]
    fn unlock_keeps_the_stored_answer() {
        let mut session = active_session(2);
        let current = session.current_question().unwrap().id();

        session.select_choice(2);
        session.confirm_lock();
        session.unlock();

        assert_eq!(session.lock_state(), LockState::Unlocked);
        assert_eq!(session.answer_for(current), Some(2));
    }

    #[test]
    fn advance_moves_cursor_and_resets_lock() {
        let mut session = active_session(3);
        session.select_choice(1);
        session.confirm_lock();

        let outcome = session.advance();
        assert_eq!(outcome, Advance::Moved);
        assert_eq!(session.cursor(), 1);
        assert_eq!(session.lock_state(), LockState::Unlocked);
    }

    #[test]
    fn advance_is_ignored_while_unlocked() {
        let mut session = active_session(3);
        session.select_choice(1);

        assert_eq!(session.advance(), Advance::Ignored);
        assert_eq!(session.cursor(), 0);
    }

    #[test]
    fn advance_on_last_question_freezes_payload() {
        let mut session = active_session(3);

        session.select_choice(1);
        session.confirm_lock();
        assert_eq!(session.advance(), Advance::Moved);

        session.select_choice(0);
        session.confirm_lock();
        assert_eq!(session.advance(), Advance::Moved);

        session.tick();
        session.tick();
        session.select_choice(2);
        session.confirm_lock();

        let Advance::Submit(payload) = session.advance() else {
            panic!("expected submission on last question");
        };

        assert!(session.is_submission_in_flight());
        assert_eq!(payload.elapsed_seconds, 2);
        assert_eq!(payload.answers.len(), 3);
        assert_eq!(payload.answers[&QuestionId::new(1)], 1);
        assert_eq!(payload.answers[&QuestionId::new(2)], 0);
        assert_eq!(payload.answers[&QuestionId::new(3)], 2);
    }

    #[test]
    fn double_advance_submits_only_once() {
        let mut session = active_session(1);
        session.select_choice(1);
        session.confirm_lock();

        assert!(matches!(session.advance(), Advance::Submit(_)));
        // Double-tap while the grading call is outstanding.
        assert_eq!(session.advance(), Advance::Ignored);
    }

    #[test]
    fn failed_submission_is_retryable_with_frozen_elapsed() {
        let mut session = active_session(1);
        session.tick();
        session.select_choice(0);
        session.confirm_lock();

        let Advance::Submit(first) = session.advance() else {
            panic!("expected submission");
        };
        session.submission_failed();
        assert!(!session.is_submission_in_flight());
        assert_eq!(session.status(), SessionStatus::Active);

        // Time keeps ticking while active, but the retry payload re-uses
        // the frozen value.
        session.tick();
        session.tick();
        let Advance::Submit(second) = session.advance() else {
            panic!("expected retry submission");
        };
        assert_eq!(second.elapsed_seconds, first.elapsed_seconds);
        assert_eq!(second.answers, first.answers);
    }

    #[test]
    fn apply_result_finishes_the_session() {
        let mut session = active_session(1);
        session.select_choice(1);
        session.confirm_lock();
        assert!(matches!(session.advance(), Advance::Submit(_)));

        let disposition = session.apply_result(build_result(), fixed_now());
        assert_eq!(disposition, SubmissionDisposition::Applied);
        assert_eq!(session.status(), SessionStatus::Finished);
        assert!(session.result().is_some());
        assert_eq!(session.concluded_at(), Some(fixed_now()));
    }

    #[test]
    fn apply_result_without_submission_is_ignored() {
        let mut session = active_session(1);
        let disposition = session.apply_result(build_result(), fixed_now());
        assert_eq!(disposition, SubmissionDisposition::Ignored);
        assert_eq!(session.status(), SessionStatus::Active);
        assert!(session.result().is_none());
    }

    #[test]
    fn stale_result_after_void_is_discarded() {
        let mut session = active_session(1);
        session.select_choice(1);
        session.confirm_lock();
        assert!(matches!(session.advance(), Advance::Submit(_)));

        // Violation wins over the in-flight submission.
        session.report_integrity_violation(fixed_now());
        assert_eq!(session.status(), SessionStatus::Voided);

        let disposition = session.apply_result(build_result(), fixed_now());
        assert_eq!(disposition, SubmissionDisposition::Discarded);
        assert_eq!(session.status(), SessionStatus::Voided);
        assert!(session.result().is_none());
    }

    #[test]
    fn violation_is_idempotent() {
        let mut session = active_session(3);
        session.report_integrity_violation(fixed_now());
        let concluded = session.concluded_at();

        session.report_integrity_violation(fixed_now() + chrono::Duration::seconds(5));
        assert_eq!(session.status(), SessionStatus::Voided);
        assert_eq!(session.concluded_at(), concluded);
    }

    #[test]
    fn violation_outside_active_has_no_effect() {
        let mut intro = build_session(2);
        intro.report_integrity_violation(fixed_now());
        assert_eq!(intro.status(), SessionStatus::Intro);

        let mut finished = active_session(1);
        finished.select_choice(0);
        finished.confirm_lock();
        assert!(matches!(finished.advance(), Advance::Submit(_)));
        finished.apply_result(build_result(), fixed_now());
        finished.report_integrity_violation(fixed_now());
        assert_eq!(finished.status(), SessionStatus::Finished);
    }

    #[test]
    fn voided_session_blocks_all_mutation() {
        let mut session = active_session(3);
        session.select_choice(1);
        session.confirm_lock();
        assert_eq!(session.advance(), Advance::Moved);

        session.report_integrity_violation(fixed_now());
        let cursor = session.cursor();
        let answered = session.answered_count();
        let elapsed = session.elapsed_seconds();

        session.select_choice(2);
        session.confirm_lock();
        assert_eq!(session.advance(), Advance::Ignored);
        session.unlock();
        session.tick();

        assert!(session.is_voided());
        assert!(session.is_terminal());
        assert_eq!(session.cursor(), cursor);
        assert_eq!(session.answered_count(), answered);
        assert_eq!(session.elapsed_seconds(), elapsed);
        // Data is retained for audit.
        assert_eq!(session.answer_for(QuestionId::new(1)), Some(1));
    }

    #[test]
    fn finish_requires_all_questions_answered() {
        let mut session = active_session(2);
        session.select_choice(1);
        assert!(session.finish().is_none());

        session.confirm_lock();
        assert_eq!(session.advance(), Advance::Moved);
        session.select_choice(3);

        let payload = session.finish().expect("all questions answered");
        assert_eq!(payload.answers.len(), 2);
        assert!(session.is_submission_in_flight());

        // A second explicit finish while in flight is rejected.
        assert!(session.finish().is_none());
    }
}
