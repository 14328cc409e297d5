//! Completed interviews and their evaluations

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::agent::{AgentError, AgentGateway, EvaluationResult};
use crate::session::{PositionLevel, TranscriptBundle};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterviewStatus {
    /// Transcript available, not evaluated yet
    Completed,
    Evaluated,
}

/// A finished interview
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterviewRecord {
    pub id: String,
    pub date: NaiveDate,
    pub status: InterviewStatus,
    /// Overall score of the latest evaluation
    pub score: Option<f64>,
    pub bundle: TranscriptBundle,
    pub evaluation: Option<EvaluationResult>,
}

/// Row of the interview list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterviewSummary {
    pub id: String,
    pub candidate_name: String,
    pub position_level: PositionLevel,
    pub date: NaiveDate,
    pub status: InterviewStatus,
    pub score: Option<f64>,
}

impl InterviewRecord {
    pub fn completed(id: impl Into<String>, bundle: TranscriptBundle) -> Self {
        Self {
            id: id.into(),
            date: Utc::now().date_naive(),
            status: InterviewStatus::Completed,
            score: None,
            bundle,
            evaluation: None,
        }
    }

    /// Replace any previous evaluation with `result`
    pub fn apply_evaluation(&mut self, result: EvaluationResult) {
        self.score = Some(result.overall_score.weighted_average);
        self.evaluation = Some(result);
        self.status = InterviewStatus::Evaluated;
    }

    pub fn summary(&self) -> InterviewSummary {
        InterviewSummary {
            id: self.id.clone(),
            candidate_name: self.bundle.candidate_name.clone(),
            position_level: self.bundle.position_level,
            date: self.date,
            status: self.status,
            score: self.score,
        }
    }
}

/// Request an evaluation of `record` and store it on success
///
/// On failure the record is left untouched.
pub async fn evaluate(
    record: &mut InterviewRecord,
    gateway: &dyn AgentGateway,
) -> Result<EvaluationResult, AgentError> {
    info!("Evaluating interview {} ({})", record.id, record.bundle.candidate_name);

    match gateway.request_evaluation(&record.bundle).await {
        Ok(result) => {
            record.apply_evaluation(result.clone());
            Ok(result)
        }
        Err(e) => {
            warn!("Evaluation of interview {} failed: {}", record.id, e);
            Err(e)
        }
    }
}
