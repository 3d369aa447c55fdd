//! Alert model as reported by the scanner daemon, plus risk ranking.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Severity attached to every alert, ordered from least to most severe.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RiskLevel {
    #[serde(alias = "Info")]
    Informational,
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Ordinal rank used for threshold comparison.
    pub fn rank(&self) -> u8 {
        match self {
            Self::Informational => 0,
            Self::Low => 1,
            Self::Medium => 2,
            Self::High => 3,
        }
    }
}

/// Minimum severity retained when aggregating alerts.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskThreshold {
    Low,
    #[default]
    Medium,
    High,
}

impl RiskThreshold {
    /// The lowest risk level that passes this threshold.
    pub fn level(&self) -> RiskLevel {
        match self {
            Self::Low => RiskLevel::Low,
            Self::Medium => RiskLevel::Medium,
            Self::High => RiskLevel::High,
        }
    }

    /// Inclusive: the threshold level and everything above it pass.
    pub fn admits(&self, risk: RiskLevel) -> bool {
        risk.rank() >= self.level().rank()
    }
}

impl FromStr for RiskThreshold {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "LOW" => Ok(Self::Low),
            "MEDIUM" => Ok(Self::Medium),
            "HIGH" => Ok(Self::High),
            other => Err(format!("unknown risk level '{other}'")),
        }
    }
}

impl fmt::Display for RiskThreshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
        };
        f.write_str(s)
    }
}

/// A single finding emitted by the scanner daemon.
///
/// Field names follow the daemon's JSON alert record. Everything except
/// `risk` is carried through untouched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub plugin_id: String,
    #[serde(default)]
    pub alert: String,
    pub risk: RiskLevel,
    #[serde(default)]
    pub confidence: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub param: String,
    #[serde(default)]
    pub attack: String,
    #[serde(default)]
    pub evidence: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub solution: String,
    #[serde(default)]
    pub reference: String,
    #[serde(default)]
    pub cweid: String,
    #[serde(default)]
    pub wascid: String,
    #[serde(default)]
    pub message_id: String,
}

impl Alert {
    /// Minimal alert carrying only a name and risk.
    pub fn new(alert: &str, risk: RiskLevel) -> Self {
        Self {
            id: String::new(),
            plugin_id: String::new(),
            alert: alert.to_string(),
            risk,
            confidence: String::new(),
            url: String::new(),
            method: String::new(),
            param: String::new(),
            attack: String::new(),
            evidence: String::new(),
            description: String::new(),
            solution: String::new(),
            reference: String::new(),
            cweid: String::new(),
            wascid: String::new(),
            message_id: String::new(),
        }
    }
}
