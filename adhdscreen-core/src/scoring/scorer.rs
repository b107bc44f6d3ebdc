// src/scoring/scorer.rs

use std::fmt::Debug;

use serde::Serialize;

use adhdscreen_common::error::ScoreError;
use adhdscreen_common::models::RiskLevel;

/// Input rescaling fitted at training time. Read-only while serving.
pub trait FrozenNormalizer: Send + Sync + Debug {
    fn input_width(&self) -> usize;

    /// Callers guarantee `x.len() == self.input_width()`.
    fn transform(&self, x: &[f64]) -> Vec<f64>;
}

/// A trained model producing a probability-like confidence.
pub trait FrozenClassifier: Send + Sync + Debug {
    fn input_width(&self) -> usize;

    /// Callers guarantee `x.len() == self.input_width()`.
    fn predict(&self, x: &[f64]) -> f64;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreResult {
    pub raw_output: f64,
    /// `raw_output * 100`, rounded to two decimals.
    pub percentage: f64,
    /// The percentage truncated toward zero.
    pub score: i32,
    pub risk_level: RiskLevel,
    pub message: String,
}

/// Scores one validated vector. Pure apart from reading the frozen model.
pub fn score(
    vector: &[f64],
    model: &dyn FrozenClassifier,
    normalizer: &dyn FrozenNormalizer,
) -> Result<ScoreResult, ScoreError> {
    if vector.len() != normalizer.input_width() {
        return Err(ScoreError::NormalizerShapeMismatch {
            expected: normalizer.input_width(),
            actual: vector.len(),
        });
    }
    let normalized = normalizer.transform(vector);
    if normalized.len() != model.input_width() {
        return Err(ScoreError::NormalizerShapeMismatch {
            expected: model.input_width(),
            actual: normalized.len(),
        });
    }

    let raw_output = model.predict(&normalized);
    if !raw_output.is_finite() {
        return Err(ScoreError::InvalidModelOutput(raw_output));
    }

    let percentage = round2(raw_output * 100.0);
    if !percentage.is_finite() {
        return Err(ScoreError::InvalidModelOutput(raw_output));
    }
    if !(0.0..=100.0).contains(&percentage) {
        return Err(ScoreError::OutputOutOfRange(raw_output));
    }
    // Truncated toward zero, not rounded.
    let score = percentage.trunc() as i32;
    let risk_level = RiskLevel::from_percentage(percentage);

    Ok(ScoreResult {
        raw_output,
        percentage,
        score,
        risk_level,
        message: advisory_message(raw_output),
    })
}

pub fn advisory_message(raw_output: f64) -> String {
    format!(
        "ADHD Confidence Score: {:.2}. Higher scores may suggest attention challenges. \
         Consult a professional for advice.",
        raw_output
    )
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}
