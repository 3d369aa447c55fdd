//! In-memory `ScanClient` that records calls and replays scripted progress.

use std::collections::{HashSet, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::errors::ScanError;
use crate::models::alert::Alert;
use crate::models::scan::{AlertThreshold, AttackStrength};
use crate::scanner::ScanClient;

#[derive(Debug, Default)]
struct FakeState {
    calls: Vec<String>,
    alerts: Vec<Alert>,
    passive_scanners: Vec<String>,
    records_to_scan: VecDeque<u32>,
    active_progress: VecDeque<u32>,
    spider_progress: VecDeque<u32>,
    spider_stuck: bool,
    failing: HashSet<String>,
    failing_rule: Option<String>,
    enabled_rules: Vec<String>,
    next_scan_id: u32,
}

#[derive(Debug, Default)]
pub(crate) struct FakeScanClient {
    state: Mutex<FakeState>,
}

impl FakeScanClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_alerts(&self, alerts: Vec<Alert>) {
        self.state.lock().unwrap().alerts = alerts;
    }

    pub fn set_passive_scanners(&self, ids: &[&str]) {
        self.state.lock().unwrap().passive_scanners = ids.iter().map(|s| s.to_string()).collect();
    }

    /// Values returned by successive `records_to_scan` polls, then 0.
    pub fn script_records_to_scan(&self, values: &[u32]) {
        self.state.lock().unwrap().records_to_scan = values.iter().copied().collect();
    }

    /// Values returned by successive active status polls, then 100.
    pub fn script_active_progress(&self, values: &[u32]) {
        self.state.lock().unwrap().active_progress = values.iter().copied().collect();
    }

    /// Values returned by successive spider status polls, then 100.
    pub fn script_spider_progress(&self, values: &[u32]) {
        self.state.lock().unwrap().spider_progress = values.iter().copied().collect();
    }

    /// Spider reports 99% forever.
    pub fn stick_spider(&self) {
        self.state.lock().unwrap().spider_stuck = true;
    }

    /// Make the named operation return a daemon fault.
    pub fn fail(&self, operation: &str) {
        self.state.lock().unwrap().failing.insert(operation.to_string());
    }

    /// Fail `ascan.scan` whenever `rule_id` is among the enabled rules.
    pub fn fail_active_scan_for_rule(&self, rule_id: &str) {
        self.state.lock().unwrap().failing_rule = Some(rule_id.to_string());
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn count_calls(&self, prefix: &str) -> usize {
        self.calls().iter().filter(|c| c.starts_with(prefix)).count()
    }

    fn record(&self, operation: &str, detail: &str) -> Result<(), ScanError> {
        let mut state = self.state.lock().unwrap();
        if detail.is_empty() {
            state.calls.push(operation.to_string());
        } else {
            state.calls.push(format!("{operation}:{detail}"));
        }
        if state.failing.contains(operation) {
            return Err(ScanError::Daemon {
                code: "internal_error".to_string(),
                message: format!("{operation} failed"),
            });
        }
        Ok(())
    }

    fn next_scan_id(&self) -> String {
        let mut state = self.state.lock().unwrap();
        let id = state.next_scan_id;
        state.next_scan_id += 1;
        id.to_string()
    }
}

#[async_trait]
impl ScanClient for FakeScanClient {
    async fn version(&self) -> Result<String, ScanError> {
        self.record("core.version", "")?;
        Ok("2.14.0".to_string())
    }

    async fn delete_all_alerts(&self) -> Result<(), ScanError> {
        self.record("alert.deleteAllAlerts", "")
    }

    async fn alerts(&self, base_url: &str) -> Result<Vec<Alert>, ScanError> {
        self.record("core.alerts", base_url)?;
        Ok(self.state.lock().unwrap().alerts.clone())
    }

    async fn enable_all_passive_scanners(&self) -> Result<(), ScanError> {
        self.record("pscan.enableAllScanners", "")
    }

    async fn passive_scanner_ids(&self) -> Result<Vec<String>, ScanError> {
        self.record("pscan.scanners", "")?;
        Ok(self.state.lock().unwrap().passive_scanners.clone())
    }

    async fn set_passive_scanner_alert_threshold(
        &self,
        id: &str,
        threshold: AlertThreshold,
    ) -> Result<(), ScanError> {
        self.record(
            "pscan.setScannerAlertThreshold",
            &format!("{id}:{}", threshold.as_str()),
        )
    }

    async fn records_to_scan(&self) -> Result<u32, ScanError> {
        self.record("pscan.recordsToScan", "")?;
        Ok(self
            .state
            .lock()
            .unwrap()
            .records_to_scan
            .pop_front()
            .unwrap_or(0))
    }

    async fn set_attack_mode(&self) -> Result<(), ScanError> {
        self.record("core.setMode", "attack")
    }

    async fn disable_all_active_scanners(&self, policy: &str) -> Result<(), ScanError> {
        self.record("ascan.disableAllScanners", policy)?;
        self.state.lock().unwrap().enabled_rules.clear();
        Ok(())
    }

    async fn enable_active_scanners(&self, ids: &[&str], _policy: &str) -> Result<(), ScanError> {
        self.record("ascan.enableScanners", &ids.join(","))?;
        self.state
            .lock()
            .unwrap()
            .enabled_rules
            .extend(ids.iter().map(|s| s.to_string()));
        Ok(())
    }

    async fn set_active_scanner_attack_strength(
        &self,
        id: &str,
        strength: AttackStrength,
        _policy: &str,
    ) -> Result<(), ScanError> {
        self.record(
            "ascan.setScannerAttackStrength",
            &format!("{id}:{}", strength.as_str()),
        )
    }

    async fn set_active_scanner_alert_threshold(
        &self,
        id: &str,
        threshold: AlertThreshold,
        _policy: &str,
    ) -> Result<(), ScanError> {
        self.record(
            "ascan.setScannerAlertThreshold",
            &format!("{id}:{}", threshold.as_str()),
        )
    }

    async fn start_active_scan(&self, url: &str, _policy: &str) -> Result<String, ScanError> {
        self.record("ascan.scan", url)?;
        {
            let state = self.state.lock().unwrap();
            if let Some(rule) = &state.failing_rule {
                if state.enabled_rules.contains(rule) {
                    return Err(ScanError::Daemon {
                        code: "scan_failed".to_string(),
                        message: format!("rule {rule} crashed"),
                    });
                }
            }
        }
        Ok(self.next_scan_id())
    }

    async fn active_scan_progress(&self, scan_id: &str) -> Result<u32, ScanError> {
        self.record("ascan.status", scan_id)?;
        Ok(self
            .state
            .lock()
            .unwrap()
            .active_progress
            .pop_front()
            .unwrap_or(100))
    }

    async fn set_spider_thread_count(&self, threads: u32) -> Result<(), ScanError> {
        self.record("spider.setOptionThreadCount", &threads.to_string())
    }

    async fn set_spider_max_depth(&self, depth: u32) -> Result<(), ScanError> {
        self.record("spider.setOptionMaxDepth", &depth.to_string())
    }

    async fn set_spider_max_duration(&self, minutes: u32) -> Result<(), ScanError> {
        self.record("spider.setOptionMaxDuration", &minutes.to_string())
    }

    async fn start_spider_scan(&self, url: &str) -> Result<String, ScanError> {
        self.record("spider.scan", url)?;
        Ok(self.next_scan_id())
    }

    async fn spider_scan_progress(&self, scan_id: &str) -> Result<u32, ScanError> {
        self.record("spider.status", scan_id)?;
        let mut state = self.state.lock().unwrap();
        if state.spider_stuck {
            return Ok(99);
        }
        Ok(state.spider_progress.pop_front().unwrap_or(100))
    }

    async fn stop_all_spider_scans(&self) -> Result<(), ScanError> {
        self.record("spider.stopAllScans", "")
    }

    async fn remove_all_spider_scans(&self) -> Result<(), ScanError> {
        self.record("spider.removeAllScans", "")
    }

    async fn html_report(&self) -> Result<String, ScanError> {
        self.record("core.htmlreport", "")?;
        Ok("<html><body>ZAP Scanning Report</body></html>".to_string())
    }
}
