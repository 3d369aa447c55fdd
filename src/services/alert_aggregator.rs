//! Risk-threshold filtering of daemon alerts, bucketed per scan phase.

use crate::errors::ScanError;
use crate::models::alert::{Alert, RiskThreshold};
use crate::models::scan::PhaseResults;
use crate::scanner::ScanClient;

/// Keep alerts at or above `threshold`, preserving their order.
pub fn filter_by_threshold(alerts: Vec<Alert>, threshold: RiskThreshold) -> Vec<Alert> {
    alerts
        .into_iter()
        .filter(|a| threshold.admits(a.risk))
        .collect()
}

/// Record a phase's filtered alerts, replacing any earlier entry for the label.
pub fn record_phase(results: &mut PhaseResults, phase_label: String, alerts: Vec<Alert>) {
    results.insert(phase_label, alerts);
}

/// Snapshot every alert currently held by the daemon and file the ones
/// passing `threshold` under `phase_label`. Returns how many were kept.
pub async fn collect_phase(
    client: &dyn ScanClient,
    results: &mut PhaseResults,
    phase_label: String,
    threshold: RiskThreshold,
) -> Result<usize, ScanError> {
    let alerts = client.alerts("").await?;
    let total = alerts.len();
    let kept = filter_by_threshold(alerts, threshold);
    let count = kept.len();

    tracing::info!(
        phase = %phase_label,
        total,
        kept = count,
        threshold = %threshold,
        "Alerts aggregated"
    );
    record_phase(results, phase_label, kept);
    Ok(count)
}
