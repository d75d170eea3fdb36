#![forbid(unsafe_code)]

pub mod error;
pub mod grading;
pub mod http;
pub mod journal;
pub mod quiz;

pub use assess_core::Clock;

pub use error::{JournalError, QuizServiceError};
pub use grading::{
    CriterionScore, GradedStep, GradingError, QuestionSource, QuizGrader, StepGrader,
    StepSubmission,
};
pub use journal::{ProjectJournalService, StepSubmissionOutcome};
pub use quiz::{QuizAdvanceResult, QuizLoopService, QuizProgress, SessionSnapshot, run_ticker};
