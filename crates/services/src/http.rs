use std::env;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;

use assess_core::model::{
    CHOICES_PER_QUESTION, ProjectId, Question, QuestionId, QuestionOutcome, QuizResult,
    StepAttempt, SubmissionPayload,
};

use crate::grading::{
    CriterionScore, GradedStep, GradingError, QuestionSource, QuizGrader, StepGrader,
    StepSubmission,
};

//
// ─── CONFIG ────────────────────────────────────────────────────────────────────
//

#[derive(Clone, Debug)]
pub struct ApiConfig {
    pub base_url: String,
    pub token: String,
}

impl ApiConfig {
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let token = env::var("ASSESS_API_TOKEN").ok()?;
        if token.trim().is_empty() {
            return None;
        }
        let base_url = env::var("ASSESS_API_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:8000/api".into());
        Some(Self { base_url, token })
    }
}

//
// ─── CLIENT ────────────────────────────────────────────────────────────────────
//

/// HTTP adapter for the remote assessment backend.
///
/// Implements all three collaborator contracts over a shared client.
/// Responses are decoded into DTOs and converted to domain types at this
/// boundary; nothing reqwest- or JSON-shaped leaks past it.
#[derive(Clone)]
pub struct HttpAssessmentApi {
    client: Client,
    config: ApiConfig,
}

impl HttpAssessmentApi {
    #[must_use]
    pub fn new(config: ApiConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    async fn check(response: Response) -> Result<Response, GradingError> {
        let status = response.status();
        if status == StatusCode::UNPROCESSABLE_ENTITY {
            let detail = response.text().await.unwrap_or_default();
            return Err(GradingError::Rejected(detail));
        }
        if !status.is_success() {
            return Err(GradingError::HttpStatus(status));
        }
        Ok(response)
    }
}

#[async_trait]
impl StepGrader for HttpAssessmentApi {
    async fn grade_step(
        &self,
        project: ProjectId,
        submission: StepSubmission,
    ) -> Result<GradedStep, GradingError> {
        let response = self
            .client
            .post(self.url(&format!("projects/{project}/steps")))
            .bearer_auth(&self.config.token)
            .json(&submission)
            .send()
            .await?;

        let body: GradedStepDto = Self::check(response).await?.json().await?;
        body.into_domain()
    }

    async fn list_attempts(&self, project: ProjectId) -> Result<Vec<StepAttempt>, GradingError> {
        let response = self
            .client
            .get(self.url(&format!("projects/{project}/attempts")))
            .bearer_auth(&self.config.token)
            .send()
            .await?;

        let body: Vec<StepAttemptDto> = Self::check(response).await?.json().await?;
        body.into_iter().map(StepAttemptDto::into_domain).collect()
    }
}

#[async_trait]
impl QuestionSource for HttpAssessmentApi {
    async fn fetch_questions(&self) -> Result<Vec<Question>, GradingError> {
        let response = self
            .client
            .get(self.url("quiz/questions"))
            .bearer_auth(&self.config.token)
            .send()
            .await?;

        let body: Vec<QuestionDto> = Self::check(response).await?.json().await?;
        body.into_iter().map(QuestionDto::into_domain).collect()
    }
}

#[async_trait]
impl QuizGrader for HttpAssessmentApi {
    async fn grade_quiz(&self, payload: &SubmissionPayload) -> Result<QuizResult, GradingError> {
        let response = self
            .client
            .post(self.url("quiz/attempts"))
            .bearer_auth(&self.config.token)
            .json(payload)
            .send()
            .await?;

        let body: QuizResultDto = Self::check(response).await?.json().await?;
        Ok(body.into_domain())
    }
}

//
// ─── DTOS ──────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Deserialize)]
struct GradedStepDto {
    step_number: u8,
    score: u8,
    feedback: String,
    #[serde(default)]
    breakdown: Option<Vec<CriterionScoreDto>>,
}

#[derive(Debug, Deserialize)]
struct CriterionScoreDto {
    criterion: String,
    awarded: u8,
    available: u8,
}

impl GradedStepDto {
    fn into_domain(self) -> Result<GradedStep, GradingError> {
        if self.score > 100 {
            return Err(GradingError::InvalidPayload(format!(
                "step score {} out of range",
                self.score
            )));
        }
        Ok(GradedStep {
            step_number: self.step_number,
            score: self.score,
            feedback: self.feedback,
            breakdown: self.breakdown.map(|items| {
                items
                    .into_iter()
                    .map(|item| CriterionScore {
                        criterion: item.criterion,
                        awarded: item.awarded,
                        available: item.available,
                    })
                    .collect()
            }),
        })
    }
}

#[derive(Debug, Deserialize)]
struct StepAttemptDto {
    step_number: u8,
    score: u8,
    sequence_index: u32,
    submitted_at: DateTime<Utc>,
    #[serde(default)]
    instructor_override: Option<u8>,
}

impl StepAttemptDto {
    fn into_domain(self) -> Result<StepAttempt, GradingError> {
        let attempt = StepAttempt::new(
            self.step_number,
            self.score,
            self.sequence_index,
            self.submitted_at,
        )
        .map_err(|err| GradingError::InvalidPayload(err.to_string()))?;

        match self.instructor_override {
            Some(score) => attempt
                .with_instructor_override(score)
                .map_err(|err| GradingError::InvalidPayload(err.to_string())),
            None => Ok(attempt),
        }
    }
}

#[derive(Debug, Deserialize)]
struct QuestionDto {
    id: u64,
    prompt: String,
    choices: Vec<String>,
    category: String,
}

impl QuestionDto {
    fn into_domain(self) -> Result<Question, GradingError> {
        let count = self.choices.len();
        let choices: [String; CHOICES_PER_QUESTION] =
            self.choices.try_into().map_err(|_| {
                GradingError::InvalidPayload(format!(
                    "question {} carries {count} choices, expected {CHOICES_PER_QUESTION}",
                    self.id
                ))
            })?;
        Ok(Question::new(
            QuestionId::new(self.id),
            self.prompt,
            choices,
            self.category,
        ))
    }
}

#[derive(Debug, Deserialize)]
struct QuizResultDto {
    score: u32,
    total: u32,
    percent: u8,
    passed: bool,
    per_question: Vec<QuestionOutcomeDto>,
}

#[derive(Debug, Deserialize)]
struct QuestionOutcomeDto {
    question_id: u64,
    #[serde(default)]
    chosen: Option<u8>,
    correct_choice: u8,
    is_correct: bool,
}

impl QuizResultDto {
    fn into_domain(self) -> QuizResult {
        QuizResult {
            score: self.score,
            total: self.total,
            percent: self.percent,
            passed: self.passed,
            per_question: self
                .per_question
                .into_iter()
                .map(|item| QuestionOutcome {
                    question_id: QuestionId::new(item.question_id),
                    chosen: item.chosen,
                    correct_choice: item.correct_choice,
                    is_correct: item.is_correct,
                })
                .collect(),
        }
    }
}
