//! Shared error types for the services crate.

use thiserror::Error;

use assess_core::model::AttemptError;
use assess_core::session::SessionError;

use crate::grading::GradingError;

/// Errors emitted by the quiz workflow.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuizServiceError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Grading(#[from] GradingError),
}

impl QuizServiceError {
    /// Whether retrying the same call can reasonably succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            QuizServiceError::Grading(err) => err.is_transient(),
            QuizServiceError::Session(_) => false,
        }
    }
}

/// Errors emitted by `ProjectJournalService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum JournalError {
    #[error(transparent)]
    Attempt(#[from] AttemptError),
    #[error(transparent)]
    Grading(#[from] GradingError),
}
