//! Scanner daemon client interface.
//!
//! The orchestrator only talks to the daemon through `ScanClient`, which
//! groups the alert, passive-scan, active-scan, and spider sub-APIs it needs.
//! `zap::ZapClient` is the HTTP implementation.

pub mod zap;

#[cfg(test)]
pub(crate) mod fake;

use async_trait::async_trait;

use crate::errors::ScanError;
use crate::models::alert::Alert;
use crate::models::scan::{AlertThreshold, AttackStrength};

/// Operations required from a remote scanning daemon.
#[async_trait]
pub trait ScanClient: Send + Sync {
    /// Daemon version string, used for readiness checks.
    async fn version(&self) -> Result<String, ScanError>;

    // -- Alerts --

    /// Remove every alert from the daemon's shared alert store.
    async fn delete_all_alerts(&self) -> Result<(), ScanError>;

    /// Alerts whose URL starts with `base_url`; an empty string means all.
    async fn alerts(&self, base_url: &str) -> Result<Vec<Alert>, ScanError>;

    // -- Passive scan --

    async fn enable_all_passive_scanners(&self) -> Result<(), ScanError>;

    /// Ids of every registered passive scanner.
    async fn passive_scanner_ids(&self) -> Result<Vec<String>, ScanError>;

    async fn set_passive_scanner_alert_threshold(
        &self,
        id: &str,
        threshold: AlertThreshold,
    ) -> Result<(), ScanError>;

    /// Records still queued for passive analysis.
    async fn records_to_scan(&self) -> Result<u32, ScanError>;

    // -- Active scan --

    /// Switch the daemon into attack mode so active rules may fire.
    async fn set_attack_mode(&self) -> Result<(), ScanError>;

    async fn disable_all_active_scanners(&self, policy: &str) -> Result<(), ScanError>;

    async fn enable_active_scanners(&self, ids: &[&str], policy: &str) -> Result<(), ScanError>;

    async fn set_active_scanner_attack_strength(
        &self,
        id: &str,
        strength: AttackStrength,
        policy: &str,
    ) -> Result<(), ScanError>;

    async fn set_active_scanner_alert_threshold(
        &self,
        id: &str,
        threshold: AlertThreshold,
        policy: &str,
    ) -> Result<(), ScanError>;

    /// Start an active scan and return its scan id.
    async fn start_active_scan(&self, url: &str, policy: &str) -> Result<String, ScanError>;

    /// Active scan progress, 0 to 100.
    async fn active_scan_progress(&self, scan_id: &str) -> Result<u32, ScanError>;

    // -- Spider --

    async fn set_spider_thread_count(&self, threads: u32) -> Result<(), ScanError>;

    async fn set_spider_max_depth(&self, depth: u32) -> Result<(), ScanError>;

    async fn set_spider_max_duration(&self, minutes: u32) -> Result<(), ScanError>;

    /// Start a spider crawl and return its scan id.
    async fn start_spider_scan(&self, url: &str) -> Result<String, ScanError>;

    /// Spider progress, 0 to 100.
    async fn spider_scan_progress(&self, scan_id: &str) -> Result<u32, ScanError>;

    async fn stop_all_spider_scans(&self) -> Result<(), ScanError>;

    async fn remove_all_spider_scans(&self) -> Result<(), ScanError>;

    // -- Reports --

    /// HTML report rendered by the daemon over its current session.
    async fn html_report(&self) -> Result<String, ScanError>;
}
