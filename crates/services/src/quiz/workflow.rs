use std::sync::{Arc, Mutex};
use std::time::Duration;

use assess_core::Clock;
use assess_core::model::{QuizResult, SubmissionPayload};
use assess_core::session::{Advance, QuizSession, SessionStatus};

use crate::error::QuizServiceError;
use crate::grading::{QuestionSource, QuizGrader};

//
// ─── ADVANCE RESULT ────────────────────────────────────────────────────────────
//

/// Result of driving the session forward by one user action.
#[derive(Debug, Clone, PartialEq)]
pub struct QuizAdvanceResult {
    pub status: SessionStatus,
    pub result: Option<QuizResult>,
}

impl QuizAdvanceResult {
    fn from_session(session: &QuizSession) -> Self {
        Self {
            status: session.status(),
            result: session.result().cloned(),
        }
    }
}

//
// ─── WORKFLOW ──────────────────────────────────────────────────────────────────
//

/// Orchestrates question fetch, session lifecycle, and the exactly-once
/// submission handshake with the grading collaborator.
#[derive(Clone)]
pub struct QuizLoopService {
    clock: Clock,
    questions: Arc<dyn QuestionSource>,
    grader: Arc<dyn QuizGrader>,
}

impl QuizLoopService {
    #[must_use]
    pub fn new(clock: Clock, questions: Arc<dyn QuestionSource>, grader: Arc<dyn QuizGrader>) -> Self {
        Self {
            clock,
            questions,
            grader,
        }
    }

    /// Fetch the fixed question set and construct a session in `Intro`.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::Grading` if the fetch fails, or
    /// `QuizServiceError::Session` for an empty question set.
    pub async fn open_session(&self) -> Result<QuizSession, QuizServiceError> {
        let questions = self.questions.fetch_questions().await?;
        Ok(QuizSession::new(questions)?)
    }

    /// Start the attempt at the service clock's current time.
    pub fn begin(&self, session: &mut QuizSession) {
        session.start(self.clock.now());
    }

    /// Drive the session forward by one confirmed step.
    ///
    /// On any question but the last this is a pure state transition. On the
    /// last question it issues the grading call: the in-flight flag is set
    /// synchronously inside `QuizSession::advance` before the await, so a
    /// concurrent double-advance cannot produce a second submission.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::Grading` when the grading call fails; the
    /// session rolls back to Active and a later call retries with the
    /// identical frozen payload.
    pub async fn advance(
        &self,
        session: &mut QuizSession,
    ) -> Result<QuizAdvanceResult, QuizServiceError> {
        match session.advance() {
            Advance::Submit(payload) => self.settle(session, payload).await,
            Advance::Moved | Advance::Ignored => Ok(QuizAdvanceResult::from_session(session)),
        }
    }

    /// Explicit submission entry point; same settlement as an advance on
    /// the last question. A call that is not currently legal (unanswered
    /// questions, submission already in flight, terminal session) is a
    /// no-op returning the current state.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::Grading` when the grading call fails.
    pub async fn finish(
        &self,
        session: &mut QuizSession,
    ) -> Result<QuizAdvanceResult, QuizServiceError> {
        match session.finish() {
            Some(payload) => self.settle(session, payload).await,
            None => Ok(QuizAdvanceResult::from_session(session)),
        }
    }

    async fn settle(
        &self,
        session: &mut QuizSession,
        payload: SubmissionPayload,
    ) -> Result<QuizAdvanceResult, QuizServiceError> {
        match self.grader.grade_quiz(&payload).await {
            Ok(result) => {
                // State-gated: a result for a session voided while the call
                // was outstanding is discarded inside apply_result.
                session.apply_result(result, self.clock.now());
                Ok(QuizAdvanceResult::from_session(session))
            }
            Err(err) => {
                session.submission_failed();
                Err(err.into())
            }
        }
    }
}

//
// ─── TICKER ────────────────────────────────────────────────────────────────────
//

/// Drive the elapsed counter once per second while the session is Active.
///
/// Spawn after `begin`; the task exits as soon as the session leaves
/// Active, on the violation path as well as normal completion, so exactly
/// one logical timer exists per session and none survives a terminal
/// transition.
pub async fn run_ticker(session: Arc<Mutex<QuizSession>>) {
    loop {
        tokio::time::sleep(Duration::from_secs(1)).await;
        let Ok(mut guard) = session.lock() else {
            return;
        };
        if guard.status() != SessionStatus::Active {
            return;
        }
        guard.tick();
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
