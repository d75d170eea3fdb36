use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AttemptError {
    #[error("score {provided} is outside 0-100")]
    ScoreOutOfRange { provided: u8 },

    #[error("step number must be at least 1")]
    StepOutOfRange,

    #[error("override score {provided} is outside 0-100")]
    OverrideOutOfRange { provided: u8 },
}

//
// ─── STEP ATTEMPT ──────────────────────────────────────────────────────────────
//

/// One accepted, scored submission against a process stage.
///
/// Attempts are append-only: once the external grader accepts a submission
/// the attempt is never mutated or deleted, and `sequence_index` fixes its
/// position in submission order. The full ordered set of attempts for a
/// project is the sole input to the progression calculator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepAttempt {
    step_number: u8,
    score: u8,
    sequence_index: u32,
    submitted_at: DateTime<Utc>,
    instructor_override: Option<u8>,
}

impl StepAttempt {
    /// Record a graded submission.
    ///
    /// The upper stage bound is deliberately not checked here; stage count
    /// is progression configuration and histories fetched from the backend
    /// are taken as-is.
    ///
    /// # Errors
    ///
    /// Returns `AttemptError::ScoreOutOfRange` if `score` exceeds 100.
    /// Returns `AttemptError::StepOutOfRange` if `step_number` is zero.
    pub fn new(
        step_number: u8,
        score: u8,
        sequence_index: u32,
        submitted_at: DateTime<Utc>,
    ) -> Result<Self, AttemptError> {
        if score > 100 {
            return Err(AttemptError::ScoreOutOfRange { provided: score });
        }
        if step_number == 0 {
            return Err(AttemptError::StepOutOfRange);
        }

        Ok(Self {
            step_number,
            score,
            sequence_index,
            submitted_at,
            instructor_override: None,
        })
    }

    /// Attach an instructor override score.
    ///
    /// The override is an overlay for display and reporting. It never
    /// replaces the graded score and never feeds into progression.
    ///
    /// # Errors
    ///
    /// Returns `AttemptError::OverrideOutOfRange` if the value exceeds 100.
    pub fn with_instructor_override(mut self, score: u8) -> Result<Self, AttemptError> {
        if score > 100 {
            return Err(AttemptError::OverrideOutOfRange { provided: score });
        }
        self.instructor_override = Some(score);
        Ok(self)
    }

    #[must_use]
    pub fn step_number(&self) -> u8 {
        self.step_number
    }

    /// The score awarded by the grader. Progression reads this field only.
    #[must_use]
    pub fn score(&self) -> u8 {
        self.score
    }

    #[must_use]
    pub fn sequence_index(&self) -> u32 {
        self.sequence_index
    }

    #[must_use]
    pub fn submitted_at(&self) -> DateTime<Utc> {
        self.submitted_at
    }

    #[must_use]
    pub fn instructor_override(&self) -> Option<u8> {
        self.instructor_override
    }

    /// The score to display: the instructor override when present,
    /// otherwise the graded score.
    #[must_use]
    pub fn effective_score(&self) -> u8 {
        self.instructor_override.unwrap_or(self.score)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
