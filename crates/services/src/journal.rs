use std::sync::Arc;

use assess_core::Clock;
use assess_core::model::{ProjectId, StepAttempt};
use assess_core::progression::{ProgressionConfig, ProgressionState, compute_progression};

use crate::error::JournalError;
use crate::grading::{GradedStep, StepGrader, StepSubmission};

//
// ─── OUTCOME ───────────────────────────────────────────────────────────────────
//

/// Result of submitting step content: the appended attempt, the grader's
/// feedback, and the recomputed progression.
#[derive(Debug, Clone, PartialEq)]
pub struct StepSubmissionOutcome {
    pub attempt: StepAttempt,
    pub graded: GradedStep,
    pub progression: ProgressionState,
}

//
// ─── SERVICE ───────────────────────────────────────────────────────────────────
//

/// Coordinates step submissions with the external grader and keeps the
/// attempt history append-only.
///
/// The history itself is owned by the caller (it is server ground truth,
/// mirrored client-side); this service only appends accepted attempts and
/// derives progression from whatever history it is handed.
#[derive(Clone)]
pub struct ProjectJournalService {
    clock: Clock,
    grader: Arc<dyn StepGrader>,
    config: ProgressionConfig,
}

impl ProjectJournalService {
    #[must_use]
    pub fn new(clock: Clock, grader: Arc<dyn StepGrader>) -> Self {
        Self {
            clock,
            grader,
            config: ProgressionConfig::default(),
        }
    }

    /// Override the progression rules (threshold / stage count).
    #[must_use]
    pub fn with_config(mut self, config: ProgressionConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn config(&self) -> &ProgressionConfig {
        &self.config
    }

    /// Recompute progression for a history.
    ///
    /// Pure and cheap; safe to call on every render or polling refresh.
    #[must_use]
    pub fn progression(&self, history: &[StepAttempt]) -> ProgressionState {
        compute_progression(history, &self.config)
    }

    /// Load the attempt history from the backend and derive progression,
    /// so the UI can resume after a reload.
    ///
    /// # Errors
    ///
    /// Returns `JournalError::Grading` on collaborator failures.
    pub async fn resume(
        &self,
        project: ProjectId,
    ) -> Result<(Vec<StepAttempt>, ProgressionState), JournalError> {
        let history = self.grader.list_attempts(project).await?;
        let progression = self.progression(&history);
        Ok((history, progression))
    }

    /// Submit step content for grading and append the accepted attempt.
    ///
    /// On grader failure nothing is appended: the history is untouched and
    /// the submission can be retried with the same content.
    ///
    /// # Errors
    ///
    /// Returns `JournalError::Grading` when the collaborator fails, or
    /// `JournalError::Attempt` if the graded result cannot form a valid
    /// attempt.
    pub async fn submit_step(
        &self,
        project: ProjectId,
        step_number: u8,
        content: impl Into<String> + Send,
        history: &mut Vec<StepAttempt>,
    ) -> Result<StepSubmissionOutcome, JournalError> {
        let graded = self
            .grader
            .grade_step(
                project,
                StepSubmission {
                    step_number,
                    content: content.into(),
                },
            )
            .await?;

        let next_index = history
            .iter()
            .map(StepAttempt::sequence_index)
            .max()
            .map_or(0, |index| index.saturating_add(1));
        let attempt = StepAttempt::new(
            graded.step_number,
            graded.score,
            next_index,
            self.clock.now(),
        )?;

        history.push(attempt.clone());

        Ok(StepSubmissionOutcome {
            attempt,
            graded,
            progression: compute_progression(history, &self.config),
        })
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
