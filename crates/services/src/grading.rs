use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use assess_core::model::{ProjectId, Question, QuizResult, StepAttempt, SubmissionPayload};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// Errors surfaced by the remote grading and question collaborators.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GradingError {
    #[error("request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),

    #[error("collaborator returned an undecodable payload: {0}")]
    InvalidPayload(String),

    #[error("submission rejected: {0}")]
    Rejected(String),

    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

impl GradingError {
    /// Whether a retry with the same payload can reasonably succeed.
    ///
    /// Everything except an explicit rejection is treated as transient;
    /// callers keep their state and retry.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        !matches!(self, GradingError::Rejected(_))
    }
}

//
// ─── STEP GRADING TYPES ────────────────────────────────────────────────────────
//

/// Content submitted for grading against one process stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepSubmission {
    pub step_number: u8,
    pub content: String,
}

/// Per-criterion detail of a graded step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriterionScore {
    pub criterion: String,
    pub awarded: u8,
    pub available: u8,
}

/// Result returned by the step-grading collaborator.
///
/// `breakdown` is optional by design: a freshly graded submission carries
/// it, a locally re-derived result does not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradedStep {
    pub step_number: u8,
    pub score: u8,
    pub feedback: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub breakdown: Option<Vec<CriterionScore>>,
}

//
// ─── COLLABORATOR CONTRACTS ────────────────────────────────────────────────────
//

/// Grading collaborator for project steps.
///
/// The backend owns scoring and the attempt history; this side only
/// submits content and reads the history back.
#[async_trait]
pub trait StepGrader: Send + Sync {
    /// Grade step content for a project.
    ///
    /// # Errors
    ///
    /// Returns `GradingError::Rejected` when the collaborator refuses the
    /// submission, or a transient error for transport failures.
    async fn grade_step(
        &self,
        project: ProjectId,
        submission: StepSubmission,
    ) -> Result<GradedStep, GradingError>;

    /// Fetch the ordered attempt history for a project.
    ///
    /// # Errors
    ///
    /// Returns a transient error for transport failures or an undecodable
    /// history payload.
    async fn list_attempts(&self, project: ProjectId) -> Result<Vec<StepAttempt>, GradingError>;
}

/// Source of the fixed question set for a quiz session.
#[async_trait]
pub trait QuestionSource: Send + Sync {
    /// Fetch the ordered question set for a new session.
    ///
    /// The set is assumed stable for the lifetime of one session.
    ///
    /// # Errors
    ///
    /// Returns a transient error for transport failures.
    async fn fetch_questions(&self) -> Result<Vec<Question>, GradingError>;
}

/// Grading collaborator for completed quiz submissions.
#[async_trait]
pub trait QuizGrader: Send + Sync {
    /// Grade a frozen answer set.
    ///
    /// # Errors
    ///
    /// Returns a transient error for transport failures; the caller keeps
    /// the payload and retries.
    async fn grade_quiz(&self, payload: &SubmissionPayload) -> Result<QuizResult, GradingError>;
}
