use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Percentages strictly above this are `High`.
pub const HIGH_RISK_ABOVE: f64 = 66.67;
/// Percentages strictly above this (and not `High`) are `Medium`.
pub const MEDIUM_RISK_ABOVE: f64 = 33.33;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// The only way a tier is ever produced.
    pub fn from_percentage(percentage: f64) -> Self {
        if percentage > HIGH_RISK_ABOVE {
            RiskLevel::High
        } else if percentage > MEDIUM_RISK_ABOVE {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiskLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Low" => Ok(RiskLevel::Low),
            "Medium" => Ok(RiskLevel::Medium),
            "High" => Ok(RiskLevel::High),
            other => Err(Error::Integrity(format!("Unknown risk level: {}", other))),
        }
    }
}

/// One stored scoring attempt. Never updated after insert.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScreeningResult {
    pub id: i64,
    pub user_id: i64,
    pub score: i32,
    pub percentage: f64,
    pub message: String,
    pub risk_level: RiskLevel,
    /// Raw submitted mapping of feature name to value, as received.
    pub responses: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl ScreeningResult {
    /// Ownership gate for reads. A record belonging to someone else is
    /// indistinguishable from a missing one.
    pub fn owned_by(self, owner_id: i64) -> Option<Self> {
        if self.user_id == owner_id {
            Some(self)
        } else {
            None
        }
    }

    /// Rejects rows whose stored tier disagrees with their percentage.
    pub fn verify_tier(&self) -> Result<(), Error> {
        let expected = RiskLevel::from_percentage(self.percentage);
        if expected != self.risk_level {
            return Err(Error::Integrity(format!(
                "result {} stores tier {} but percentage {} maps to {}",
                self.id, self.risk_level, self.percentage, expected
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewScreeningResult {
    pub user_id: i64,
    pub score: i32,
    pub percentage: f64,
    pub message: String,
    pub risk_level: RiskLevel,
    pub responses: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_boundaries_follow_strict_inequalities() {
        assert_eq!(RiskLevel::from_percentage(66.68), RiskLevel::High);
        assert_eq!(RiskLevel::from_percentage(66.67), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_percentage(33.34), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_percentage(33.33), RiskLevel::Low);
        assert_eq!(RiskLevel::from_percentage(0.0), RiskLevel::Low);
        assert_eq!(RiskLevel::from_percentage(100.0), RiskLevel::High);
    }

    #[test]
    fn risk_level_parses_its_own_display() {
        for level in [RiskLevel::Low, RiskLevel::Medium, RiskLevel::High] {
            assert_eq!(level.to_string().parse::<RiskLevel>().unwrap(), level);
        }
        assert!("Severe".parse::<RiskLevel>().is_err());
    }

    fn sample(user_id: i64, percentage: f64, risk_level: RiskLevel) -> ScreeningResult {
        ScreeningResult {
            id: 7,
            user_id,
            score: percentage as i32,
            percentage,
            message: "m".into(),
            risk_level,
            responses: serde_json::json!({}),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn owned_by_hides_foreign_records() {
        assert!(sample(1, 10.0, RiskLevel::Low).owned_by(1).is_some());
        assert!(sample(1, 10.0, RiskLevel::Low).owned_by(2).is_none());
    }

    #[test]
    fn verify_tier_catches_inconsistent_rows() {
        assert!(sample(1, 80.0, RiskLevel::High).verify_tier().is_ok());
        assert!(matches!(
            sample(1, 80.0, RiskLevel::Low).verify_tier(),
            Err(Error::Integrity(_))
        ));
    }
}
