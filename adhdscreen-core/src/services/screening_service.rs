use std::sync::Arc;

use serde_json::Value;
use tracing::{error, info};

use adhdscreen_common::error::ScoreError;
use adhdscreen_common::models::{ActivityAction, NewScreeningResult, Principal, ScreeningResult};
use adhdscreen_common::traits::ResultRepository;
use crate::Error;
use crate::scoring::{score, validate, FeatureSchema, ModelHandle, RawPayload, ScoreResult};
use crate::services::ActivityLog;

#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionOutcome {
    pub result_id: i64,
    pub score: ScoreResult,
}

/// Validate -> score -> persist -> audit, for one authenticated principal.
pub struct ScreeningService {
    model: ModelHandle,
    results: Arc<dyn ResultRepository>,
    activity: ActivityLog,
    dashboard_limit: i64,
}

impl ScreeningService {
    pub fn new(
        model: ModelHandle,
        results: Arc<dyn ResultRepository>,
        activity: ActivityLog,
        dashboard_limit: i64,
    ) -> Self {
        Self { model, results, activity, dashboard_limit }
    }

    /// The questionnaire fields, in model order.
    pub fn features(&self) -> Result<&FeatureSchema, ScoreError> {
        Ok(self.model.bundle()?.schema())
    }

    /// Scores a submission and stores it under `principal`.
    ///
    /// Nothing is written unless validation and scoring both succeed. The
    /// activity entry is written after the result and may be lost on its own.
    pub async fn submit(&self, principal: &Principal, raw: RawPayload) -> Result<SubmissionOutcome, Error> {
        let bundle = self.model.bundle().inspect_err(|e| {
            error!("Scoring requested while model is unavailable: {}", e);
        })?;

        let vector = validate(&raw, bundle.schema())?;

        let outcome = score(&vector, bundle.classifier(), bundle.normalizer()).inspect_err(|e| {
            error!("Scoring defect for user {}: {}", principal.id, e);
        })?;

        let new_result = NewScreeningResult {
            user_id: principal.id,
            score: outcome.score,
            percentage: outcome.percentage,
            message: outcome.message.clone(),
            risk_level: outcome.risk_level,
            responses: Value::Object(raw),
        };
        let result_id = self.results.create(&new_result).await?;
        info!(
            "Stored result {} for user {} ({} / {})",
            result_id, principal.id, outcome.percentage, outcome.risk_level
        );

        let details = format!("Predicted ADHD Confidence Score: {:?}", outcome.percentage);
        self.activity
            .record(principal.id, ActivityAction::Prediction, Some(&details))
            .await;

        Ok(SubmissionOutcome { result_id, score: outcome })
    }

    /// Owner-scoped read; someone else's result comes back as `None`.
    pub async fn result(&self, principal: &Principal, result_id: i64) -> Result<Option<ScreeningResult>, Error> {
        self.results.get(result_id, principal.id).await
    }

    pub async fn dashboard(&self, principal: &Principal) -> Result<Vec<ScreeningResult>, Error> {
        self.results.list_recent(principal.id, self.dashboard_limit).await
    }
}
