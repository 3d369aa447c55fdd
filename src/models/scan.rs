//! Scan phases, scanner-side settings, and the aggregated scan report.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::alert::{Alert, RiskThreshold};

// -- Scanner-side settings --

/// How hard the active scanner pushes each rule.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttackStrength {
    Default,
    Low,
    Medium,
    High,
    Insane,
}

impl AttackStrength {
    /// Value as accepted by the daemon API.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "DEFAULT",
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Insane => "INSANE",
        }
    }
}

impl FromStr for AttackStrength {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DEFAULT" => Ok(Self::Default),
            "LOW" => Ok(Self::Low),
            "MEDIUM" => Ok(Self::Medium),
            "HIGH" => Ok(Self::High),
            "INSANE" => Ok(Self::Insane),
            other => Err(format!("unknown attack strength '{other}'")),
        }
    }
}

/// Per-rule alert threshold applied inside the daemon.
///
/// Unrelated to [`RiskThreshold`], which filters what we report.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertThreshold {
    Off,
    Default,
    Low,
    Medium,
    High,
}

impl AlertThreshold {
    /// Value as accepted by the daemon API.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Off => "OFF",
            Self::Default => "DEFAULT",
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
        }
    }
}

impl FromStr for AlertThreshold {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "OFF" => Ok(Self::Off),
            "DEFAULT" => Ok(Self::Default),
            "LOW" => Ok(Self::Low),
            "MEDIUM" => Ok(Self::Medium),
            "HIGH" => Ok(Self::High),
            other => Err(format!("unknown alert threshold '{other}'")),
        }
    }
}

// -- Phases --

/// One step of a scan run. Active phases run once per attack class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanPhase {
    Passive,
    Active(String),
    Spider,
}

impl ScanPhase {
    /// Key under which the phase's alerts are recorded.
    pub fn label(&self) -> String {
        match self {
            Self::Passive => "PASSIVE SCAN".to_string(),
            Self::Active(class) => format!("ACTIVE SCAN | {class}"),
            Self::Spider => "SPIDER SCAN".to_string(),
        }
    }
}

impl fmt::Display for ScanPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// Filtered alerts produced by one completed phase.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScanPhaseResult {
    pub phase_label: String,
    pub findings: Vec<Alert>,
}

/// Phase label to alerts, in the order phases completed.
///
/// A missing label means the phase did not complete; a present label with
/// no findings means it completed cleanly.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct PhaseResults(Vec<ScanPhaseResult>);

impl PhaseResults {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a phase, replacing the findings of an existing label in place.
    pub fn insert(&mut self, phase_label: String, findings: Vec<Alert>) {
        match self.0.iter_mut().find(|r| r.phase_label == phase_label) {
            Some(existing) => existing.findings = findings,
            None => self.0.push(ScanPhaseResult {
                phase_label,
                findings,
            }),
        }
    }

    pub fn get(&self, phase_label: &str) -> Option<&[Alert]> {
        self.0
            .iter()
            .find(|r| r.phase_label == phase_label)
            .map(|r| r.findings.as_slice())
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|r| r.phase_label.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScanPhaseResult> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Total findings across all phases.
    pub fn total_findings(&self) -> usize {
        self.0.iter().map(|r| r.findings.len()).sum()
    }
}

// -- Report --

/// Outcome of one `run_scanner` call against a target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    pub id: Uuid,
    pub target_url: String,
    pub risk_threshold: RiskThreshold,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub phases: PhaseResults,
    /// Where the daemon's HTML report was saved, if it was.
    pub report_file: Option<String>,
}
