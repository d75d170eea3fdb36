mod attempt;
mod ids;
mod question;

pub use attempt::{AttemptError, StepAttempt};
pub use ids::{ParseIdError, ProjectId, QuestionId, SessionId};
pub use question::{
    CHOICES_PER_QUESTION, Question, QuestionOutcome, QuizResult, SubmissionPayload,
};
