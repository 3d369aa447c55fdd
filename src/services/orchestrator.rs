//! Scan orchestration against a single scanner daemon.
//!
//! A run walks the target through passive, active (one sub-run per attack
//! class), and spider phases in that fixed order, skipping disabled ones.
//! Each phase clears the daemon's alert store, drives its job to completion,
//! then files the alerts at or above the configured risk under its label.
//!
//! Phase failures are logged and never abort the run. The only way a run
//! yields nothing is the repeat-target guard: a target equal to the
//! previous run's target is skipped outright.

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::config::OrchestratorConfig;
use crate::errors::ScanError;
use crate::models::scan::{PhaseResults, ScanPhase, ScanReport};
use crate::scanner::ScanClient;
use crate::services::alert_aggregator;
use crate::services::attack_catalog::{AttackCatalog, AttackClass};
use crate::services::polling::{poll_until, PollOutcome, PollPolicy, Progress};

/// Spider progress value that counts as stalled.
const SPIDER_STALL_PERCENT: u32 = 99;

/// Drives scan runs for one daemon endpoint.
///
/// Runs are serialised: the daemon's alert store is shared, so a second
/// `run_scanner` waits until the first one has finished.
pub struct ScanOrchestrator {
    client: Arc<dyn ScanClient>,
    config: OrchestratorConfig,
    catalog: AttackCatalog,
    /// Target of the last completed run; the lock is held for a whole run.
    previous_url: Mutex<Option<String>>,
}

impl ScanOrchestrator {
    pub fn new(client: Arc<dyn ScanClient>, config: OrchestratorConfig) -> Self {
        Self::with_catalog(client, config, AttackCatalog::default())
    }

    pub fn with_catalog(
        client: Arc<dyn ScanClient>,
        config: OrchestratorConfig,
        catalog: AttackCatalog,
    ) -> Self {
        Self {
            client,
            config,
            catalog,
            previous_url: Mutex::new(None),
        }
    }

    pub fn client(&self) -> &Arc<dyn ScanClient> {
        &self.client
    }

    pub fn catalog(&self) -> &AttackCatalog {
        &self.catalog
    }

    /// Target of the most recent run, if any. Waits for a run in progress.
    pub async fn previous_url(&self) -> Option<String> {
        self.previous_url.lock().await.clone()
    }

    /// Scan `url` through every enabled phase.
    ///
    /// Returns `None` only when `url` is the target of the previous run.
    /// Otherwise the report lists every phase that completed; a phase that
    /// failed has no entry. The target is remembered even if phases failed.
    pub async fn run_scanner(&self, url: &str) -> Option<ScanReport> {
        let mut previous = self.previous_url.lock().await;
        if previous.as_deref() == Some(url) {
            tracing::info!(url, "Target matches the previous run, skipping scan");
            return None;
        }

        let started_at = Utc::now();
        let mut phases = PhaseResults::new();
        tracing::info!(url, risk_level = %self.config.risk_level, "Starting scan run");

        if self.config.enable_passive_scan {
            let outcome = self.passive_scan().await;
            self.finish_phase(ScanPhase::Passive, outcome, &mut phases).await;
        }

        if self.config.enable_active_scan {
            for class in self.catalog.classes() {
                let outcome = self.active_scan(url, class).await;
                let phase = ScanPhase::Active(class.name.to_string());
                self.finish_phase(phase, outcome, &mut phases).await;
            }
        }

        if self.config.enable_spider_scan {
            let outcome = self.spider_scan(url).await;
            self.finish_phase(ScanPhase::Spider, outcome, &mut phases).await;
        }

        let report_file = self.save_html_report().await;
        *previous = Some(url.to_string());

        tracing::info!(
            url,
            phases = phases.len(),
            findings = phases.total_findings(),
            "Scan run finished"
        );

        Some(ScanReport {
            id: Uuid::new_v4(),
            target_url: url.to_string(),
            risk_threshold: self.config.risk_level,
            started_at,
            finished_at: Utc::now(),
            phases,
            report_file,
        })
    }

    /// Aggregate alerts for a phase that completed, or log why it did not.
    async fn finish_phase(
        &self,
        phase: ScanPhase,
        outcome: Result<(), ScanError>,
        phases: &mut PhaseResults,
    ) {
        match outcome {
            Ok(()) => {
                if let Err(e) = alert_aggregator::collect_phase(
                    self.client.as_ref(),
                    phases,
                    phase.label(),
                    self.config.risk_level,
                )
                .await
                {
                    tracing::error!(phase = %phase, error = %e, "Failed to collect alerts");
                }
            }
            Err(e @ ScanError::PhaseTimeout { .. }) => {
                tracing::warn!(phase = %phase, error = %e, "Scan phase abandoned");
            }
            Err(e) => {
                tracing::error!(phase = %phase, error = %e, "Scan phase failed");
            }
        }
    }

    async fn passive_scan(&self) -> Result<(), ScanError> {
        tracing::info!("Starting passive scan");
        self.client.delete_all_alerts().await?;
        self.client.enable_all_passive_scanners().await?;
        self.configure_passive_thresholds().await;

        let client = &self.client;
        let policy = PollPolicy::unbounded(self.config.poll_interval);
        let outcome = poll_until(&policy, || async move {
            let remaining = client.records_to_scan().await?;
            Ok::<_, ScanError>(if remaining == 0 {
                Progress::Done
            } else {
                Progress::Pending
            })
        })
        .await;

        match outcome {
            PollOutcome::Completed { polls, elapsed } => {
                tracing::info!(polls, elapsed_secs = elapsed.as_secs(), "Passive scan completed");
                Ok(())
            }
            PollOutcome::TimedOut { polls, .. } => Err(ScanError::PhaseTimeout { polls }),
            PollOutcome::Failed(e) => Err(e),
        }
    }

    /// Apply the scanner-side threshold to every passive scanner.
    async fn configure_passive_thresholds(&self) {
        let threshold = self.config.scanner_threshold;
        let result = async {
            for id in self.client.passive_scanner_ids().await? {
                self.client
                    .set_passive_scanner_alert_threshold(&id, threshold)
                    .await?;
            }
            Ok::<_, ScanError>(())
        }
        .await;

        if let Err(e) = result {
            tracing::error!(error = %e, "Failed to set passive scan thresholds");
        }
    }

    async fn active_scan(&self, url: &str, class: &AttackClass) -> Result<(), ScanError> {
        let policy_name = self.config.scan_policy_name.as_str();
        tracing::info!(
            url,
            attack_class = class.name,
            rule_ids = ?class.rule_ids,
            "Starting active scan"
        );

        self.client.delete_all_alerts().await?;
        self.client.disable_all_active_scanners(policy_name).await?;
        self.client.set_attack_mode().await?;
        self.client
            .enable_active_scanners(class.rule_ids, policy_name)
            .await?;
        for id in class.rule_ids {
            self.client
                .set_active_scanner_attack_strength(id, self.config.scanner_strength, policy_name)
                .await?;
            self.client
                .set_active_scanner_alert_threshold(id, self.config.scanner_threshold, policy_name)
                .await?;
        }

        let scan_id = self.client.start_active_scan(url, policy_name).await?;
        let client = &self.client;
        let scan_id_ref = scan_id.as_str();
        // No stall limit: active scans are waited on until they finish.
        let policy = PollPolicy::unbounded(self.config.poll_interval);
        let outcome = poll_until(&policy, || async move {
            let percent = client.active_scan_progress(scan_id_ref).await?;
            Ok::<_, ScanError>(Progress::from_percent(percent, None))
        })
        .await;

        match outcome {
            PollOutcome::Completed { polls, elapsed } => {
                tracing::info!(
                    attack_class = class.name,
                    scan_id = %scan_id,
                    polls,
                    elapsed_secs = elapsed.as_secs(),
                    "Active scan completed"
                );
                Ok(())
            }
            PollOutcome::TimedOut { polls, .. } => Err(ScanError::PhaseTimeout { polls }),
            PollOutcome::Failed(e) => Err(e),
        }
    }

    async fn spider_scan(&self, url: &str) -> Result<(), ScanError> {
        tracing::info!(url, "Starting spider scan");
        self.client.delete_all_alerts().await?;
        self.client
            .set_spider_thread_count(self.config.spider_thread_count)
            .await?;
        self.client
            .set_spider_max_depth(self.config.spider_max_depth)
            .await?;
        self.client
            .set_spider_max_duration(self.config.spider_max_duration_minutes)
            .await?;

        let scan_id = self.client.start_spider_scan(url).await?;
        let client = &self.client;
        let scan_id_ref = scan_id.as_str();
        let policy = PollPolicy::with_stall_limit(
            self.config.poll_interval,
            self.config.spider_stuck_poll_limit,
        );
        let outcome = poll_until(&policy, || async move {
            let percent = client.spider_scan_progress(scan_id_ref).await?;
            Ok::<_, ScanError>(Progress::from_percent(percent, Some(SPIDER_STALL_PERCENT)))
        })
        .await;

        match outcome {
            PollOutcome::Completed { polls, elapsed } => {
                tracing::info!(
                    scan_id = %scan_id,
                    polls,
                    elapsed_secs = elapsed.as_secs(),
                    "Spider scan completed"
                );
                Ok(())
            }
            PollOutcome::TimedOut { polls, elapsed } => {
                tracing::warn!(
                    scan_id = %scan_id,
                    polls,
                    elapsed_secs = elapsed.as_secs(),
                    "Spider scan stuck, stopping all spiders"
                );
                self.abort_spiders().await;
                Err(ScanError::PhaseTimeout {
                    polls: self.config.spider_stuck_poll_limit,
                })
            }
            PollOutcome::Failed(e) => Err(e),
        }
    }

    async fn abort_spiders(&self) {
        if let Err(e) = self.client.stop_all_spider_scans().await {
            tracing::error!(error = %e, "Failed to stop spider scans");
        }
        if let Err(e) = self.client.remove_all_spider_scans().await {
            tracing::error!(error = %e, "Failed to remove spider scans");
        }
    }

    /// Write the daemon's HTML report when a report path is configured.
    async fn save_html_report(&self) -> Option<String> {
        let path = self.config.report_path.as_deref()?;
        match self.write_html_report(path).await {
            Ok(()) => {
                tracing::info!(path = %path.display(), "HTML report written");
                Some(path.display().to_string())
            }
            Err(e) => {
                tracing::error!(
                    path = %path.display(),
                    error = %e,
                    "Failed to generate HTML report"
                );
                None
            }
        }
    }

    async fn write_html_report(&self, path: &Path) -> Result<(), anyhow::Error> {
        let html = self.client.html_report().await?;
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir).await?;
        }
        tokio::fs::write(path, html).await?;
        Ok(())
    }
}
