use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::StepAttempt;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProgressionConfigError {
    #[error("pass threshold must be at most 100, got {provided}")]
    InvalidThreshold { provided: u8 },
    #[error("stage count must be at least 1")]
    InvalidStageCount,
}

//
// ─── CONFIG ────────────────────────────────────────────────────────────────────
//

/// Score a submission must reach to pass its stage.
pub const DEFAULT_PASS_THRESHOLD: u8 = 60;

/// Number of stages in one full cycle of the process.
pub const DEFAULT_STAGE_COUNT: u8 = 6;

/// Named configuration for the progression rules.
///
/// Defaults to the six-stage process with a 60/100 pass threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressionConfig {
    pass_threshold: u8,
    stage_count: u8,
}

impl ProgressionConfig {
    /// Create a configuration with explicit threshold and stage count.
    ///
    /// # Errors
    ///
    /// Returns `InvalidThreshold` if the threshold exceeds 100.
    /// Returns `InvalidStageCount` if the stage count is zero.
    pub fn new(pass_threshold: u8, stage_count: u8) -> Result<Self, ProgressionConfigError> {
        if pass_threshold > 100 {
            return Err(ProgressionConfigError::InvalidThreshold {
                provided: pass_threshold,
            });
        }
        if stage_count == 0 {
            return Err(ProgressionConfigError::InvalidStageCount);
        }

        Ok(Self {
            pass_threshold,
            stage_count,
        })
    }

    #[must_use]
    pub fn pass_threshold(&self) -> u8 {
        self.pass_threshold
    }

    #[must_use]
    pub fn stage_count(&self) -> u8 {
        self.stage_count
    }
}

impl Default for ProgressionConfig {
    fn default() -> Self {
        Self {
            pass_threshold: DEFAULT_PASS_THRESHOLD,
            stage_count: DEFAULT_STAGE_COUNT,
        }
    }
}

//
// ─── PROGRESSION STATE ─────────────────────────────────────────────────────────
//

/// Whether the current stage is being attempted fresh or redone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProgressionMode {
    /// The stage has not been passed or failed yet in this cycle.
    Fresh,
    /// The most recent submission for this stage fell below the threshold
    /// and must be resubmitted.
    Revision,
}

/// Derived answer to "what should the student work on next?".
///
/// Never stored: recomputed from the attempt history on every change so the
/// UI can resume after a reload from the history alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressionState {
    pub current_step: u8,
    pub mode: ProgressionMode,
    pub cycle_complete: bool,
}

//
// ─── CALCULATOR ────────────────────────────────────────────────────────────────
//

/// Compute the current progression from an attempt history.
///
/// The latest attempt is the one with the highest `sequence_index`, so an
/// unsorted history still resolves correctly. A passing score (`>=`
/// threshold) moves to the next stage in `Fresh` mode; a failing score
/// keeps the same stage in `Revision` mode. Stepping past the last stage
/// reports a completed cycle restarting at stage 1.
///
/// Step numbers are not validated here: a history with out-of-range stages
/// flows through and callers guard the resulting `current_step`.
#[must_use]
pub fn compute_progression(
    attempts: &[StepAttempt],
    config: &ProgressionConfig,
) -> ProgressionState {
    let Some(last) = attempts.iter().max_by_key(|a| a.sequence_index()) else {
        return ProgressionState {
            current_step: 1,
            mode: ProgressionMode::Fresh,
            cycle_complete: false,
        };
    };

    let (tentative, mode) = if last.score() >= config.pass_threshold() {
        (last.step_number().saturating_add(1), ProgressionMode::Fresh)
    } else {
        (last.step_number(), ProgressionMode::Revision)
    };

    if tentative > config.stage_count() {
        return ProgressionState {
            current_step: 1,
            mode: ProgressionMode::Fresh,
            cycle_complete: true,
        };
    }

    ProgressionState {
        current_step: tentative,
        mode,
        cycle_complete: false,
    }
}

/// `compute_progression` with the default six-stage, 60-point configuration.
#[must_use]
pub fn compute_progression_default(attempts: &[StepAttempt]) -> ProgressionState {
    compute_progression(attempts, &ProgressionConfig::default())
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
