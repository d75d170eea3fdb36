use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::model::ids::QuestionId;

/// Number of answer choices every quiz question carries.
pub const CHOICES_PER_QUESTION: usize = 4;

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A single multiple-choice question.
///
/// The question set is fetched once per session and is immutable for the
/// session's lifetime; choice order is fixed by the source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    id: QuestionId,
    prompt: String,
    choices: [String; CHOICES_PER_QUESTION],
    category: String,
}

impl Question {
    #[must_use]
    pub fn new(
        id: QuestionId,
        prompt: impl Into<String>,
        choices: [String; CHOICES_PER_QUESTION],
        category: impl Into<String>,
    ) -> Self {
        Self {
            id,
            prompt: prompt.into(),
            choices,
            category: category.into(),
        }
    }

    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn choices(&self) -> &[String; CHOICES_PER_QUESTION] {
        &self.choices
    }

    /// The choice text at `index`, or `None` when the index is out of range.
    #[must_use]
    pub fn choice(&self, index: u8) -> Option<&str> {
        self.choices.get(usize::from(index)).map(String::as_str)
    }

    #[must_use]
    pub fn category(&self) -> &str {
        &self.category
    }
}

//
// ─── SUBMISSION PAYLOAD ────────────────────────────────────────────────────────
//

/// The answer set handed to the quiz grading collaborator.
///
/// `elapsed_seconds` is frozen at the instant submission is first issued;
/// a retry after a transient failure re-sends the identical payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionPayload {
    pub answers: HashMap<QuestionId, u8>,
    pub elapsed_seconds: u64,
}

//
// ─── QUIZ RESULT ───────────────────────────────────────────────────────────────
//

/// Grading detail for a single question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionOutcome {
    pub question_id: QuestionId,
    pub chosen: Option<u8>,
    pub correct_choice: u8,
    pub is_correct: bool,
}

/// Result returned by the quiz grading collaborator for one submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizResult {
    pub score: u32,
    pub total: u32,
    pub percent: u8,
    pub passed: bool,
    pub per_question: Vec<QuestionOutcome>,
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn build_question() -> Question {
        Question::new(
            QuestionId::new(7),
            "Which phase comes first?",
            [
                "Ask".to_string(),
                "Imagine".to_string(),
                "Plan".to_string(),
                "Create".to_string(),
            ],
            "process",
        )
    }

    #[test]
    fn choice_lookup_respects_bounds() {
        let question = build_question();
        assert_eq!(question.choice(0), Some("Ask"));
        assert_eq!(question.choice(3), Some("Create"));
        assert_eq!(question.choice(4), None);
    }

    #[test]
    fn accessors_expose_fixed_fields() {
        let question = build_question();
        assert_eq!(question.id(), QuestionId::new(7));
        assert_eq!(question.prompt(), "Which phase comes first?");
        assert_eq!(question.category(), "process");
        assert_eq!(question.choices().len(), CHOICES_PER_QUESTION);
    }
}
