// src/scoring/validator.rs

use std::collections::HashSet;

use serde_json::{Map, Value};

use adhdscreen_common::error::ValidationError;
use crate::Error;

/// A submission as received: feature name -> number or numeric string.
pub type RawPayload = Map<String, Value>;

/// Ordered feature names the model was trained on. The order defines the
/// vector layout handed to the scorer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureSchema {
    names: Vec<String>,
}

impl FeatureSchema {
    pub fn new(names: Vec<String>) -> Result<Self, Error> {
        if names.is_empty() {
            return Err(Error::InvalidInput("feature schema is empty".into()));
        }
        let mut seen = HashSet::new();
        for name in &names {
            if name.trim().is_empty() {
                return Err(Error::InvalidInput("feature schema contains a blank name".into()));
            }
            if !seen.insert(name.as_str()) {
                return Err(Error::InvalidInput(format!("duplicate feature '{}'", name)));
            }
        }
        Ok(Self { names })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Builds the model input vector in schema order.
///
/// Keys in `raw` that are not part of the schema are ignored. The first
/// missing or non-numeric feature (in schema order) fails the whole payload.
pub fn validate(raw: &RawPayload, schema: &FeatureSchema) -> Result<Vec<f64>, ValidationError> {
    let mut vector = Vec::with_capacity(schema.len());
    for name in schema.names() {
        let value = raw
            .get(name)
            .ok_or_else(|| ValidationError::MissingFeature(name.clone()))?;
        let number = coerce(value).ok_or_else(|| ValidationError::InvalidFeatureValue {
            name: name.clone(),
            raw: display_raw(value),
        })?;
        vector.push(number);
    }
    Ok(vector)
}

fn coerce(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    // "nan" / "inf" parse fine but are not numeric literals.
    parsed.is_finite().then_some(parsed)
}

fn display_raw(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
