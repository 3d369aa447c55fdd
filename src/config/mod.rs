use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::models::alert::RiskThreshold;
use crate::models::scan::{AlertThreshold, AttackStrength};

/// A setting that was present but could not be understood.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value '{value}' for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub zap: ZapConfig,
    pub scan: OrchestratorConfig,
}

/// Where and how to reach the scanner daemon.
#[derive(Debug, Clone)]
pub struct ZapConfig {
    pub host: String,
    pub port: u16,
    pub api_key: Option<String>,
    pub request_timeout_secs: u64,
}

impl Default for ZapConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 9090,
            api_key: None,
            request_timeout_secs: 30,
        }
    }
}

/// Settings for one scan orchestrator.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub scanner_strength: AttackStrength,
    /// Scanner-side per-rule threshold, applied inside the daemon.
    pub scanner_threshold: AlertThreshold,
    /// Minimum risk kept in the aggregated results.
    pub risk_level: RiskThreshold,
    pub enable_passive_scan: bool,
    pub enable_active_scan: bool,
    pub enable_spider_scan: bool,
    pub scan_policy_name: String,
    pub spider_thread_count: u32,
    pub spider_max_depth: u32,
    pub spider_max_duration_minutes: u32,
    /// Consecutive polls stuck at 99% before the spider is aborted.
    pub spider_stuck_poll_limit: u32,
    pub poll_interval: Duration,
    /// When set, the daemon's HTML report is written here after each run.
    pub report_path: Option<PathBuf>,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            scanner_strength: AttackStrength::High,
            scanner_threshold: AlertThreshold::Low,
            risk_level: RiskThreshold::Medium,
            enable_passive_scan: true,
            enable_active_scan: true,
            enable_spider_scan: true,
            scan_policy_name: "Default Policy".to_string(),
            spider_thread_count: 50,
            spider_max_depth: 5,
            spider_max_duration_minutes: 30,
            spider_stuck_poll_limit: 300,
            poll_interval: Duration::from_secs(1),
            report_path: Some(PathBuf::from("target/zapReport/report.html")),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from any key lookup, falling back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let zap_defaults = ZapConfig::default();
        let scan_defaults = OrchestratorConfig::default();

        let report_path = if parse_enum(&lookup, "GENERATE_REPORT", true)? {
            let dir = lookup("REPORT_DIR").unwrap_or_else(|| "target/zapReport/".to_string());
            let file = lookup("REPORT_FILE_NAME").unwrap_or_else(|| "report.html".to_string());
            Some(PathBuf::from(dir).join(file))
        } else {
            None
        };

        Ok(Self {
            host: lookup("BACKEND_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(&lookup, "BACKEND_PORT", 3000),
            zap: ZapConfig {
                host: lookup("ZAP_HOST").unwrap_or(zap_defaults.host),
                port: parse_or(&lookup, "ZAP_PORT", zap_defaults.port),
                api_key: lookup("ZAP_API_KEY").filter(|k| !k.is_empty()),
                request_timeout_secs: parse_or(
                    &lookup,
                    "ZAP_REQUEST_TIMEOUT_SECS",
                    zap_defaults.request_timeout_secs,
                ),
            },
            scan: OrchestratorConfig {
                scanner_strength: parse_enum(
                    &lookup,
                    "SCANNER_STRENGTH",
                    scan_defaults.scanner_strength,
                )?,
                scanner_threshold: parse_enum(
                    &lookup,
                    "SCANNER_THRESHOLD",
                    scan_defaults.scanner_threshold,
                )?,
                risk_level: parse_enum(&lookup, "RISK_LEVEL", scan_defaults.risk_level)?,
                enable_passive_scan: parse_enum(&lookup, "ENABLE_PASSIVE_SCAN", true)?,
                enable_active_scan: parse_enum(&lookup, "ENABLE_ACTIVE_SCAN", true)?,
                enable_spider_scan: parse_enum(&lookup, "ENABLE_SPIDER_SCAN", true)?,
                scan_policy_name: lookup("SCAN_POLICY_NAME")
                    .unwrap_or(scan_defaults.scan_policy_name),
                spider_thread_count: parse_or(
                    &lookup,
                    "SPIDER_THREAD_COUNT",
                    scan_defaults.spider_thread_count,
                ),
                spider_max_depth: parse_or(
                    &lookup,
                    "SPIDER_MAX_DEPTH",
                    scan_defaults.spider_max_depth,
                ),
                spider_max_duration_minutes: parse_or(
                    &lookup,
                    "SPIDER_MAX_DURATION_MINUTES",
                    scan_defaults.spider_max_duration_minutes,
                ),
                spider_stuck_poll_limit: parse_or(
                    &lookup,
                    "SPIDER_STUCK_POLL_LIMIT",
                    scan_defaults.spider_stuck_poll_limit,
                ),
                poll_interval: Duration::from_millis(parse_or(&lookup, "POLL_INTERVAL_MS", 1000)),
                report_path,
            },
        })
    }
}

/// Numeric settings fall back to the default when unparseable.
fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Enumerated settings must parse when present.
fn parse_enum<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .to_ascii_lowercase()
            .parse()
            .map_err(|e: T::Err| ConfigError::Invalid {
                key,
                value: value.clone(),
                reason: e.to_string(),
            }),
    }
}
