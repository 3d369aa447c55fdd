//! OWASP ZAP daemon client over its JSON API.
//!
//! Every call is a GET against `/{format}/{component}/{view|action}/{name}/`
//! with query parameters. Views answer with a single-key JSON object, actions
//! with `{"Result": "OK"}`, and faults with `{"code": .., "message": ..}`.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Url;
use serde_json::Value;

use crate::config::ZapConfig;
use crate::errors::ScanError;
use crate::models::alert::Alert;
use crate::models::scan::{AlertThreshold, AttackStrength};
use crate::scanner::ScanClient;

/// Header carrying the API key on every request.
const API_KEY_HEADER: &str = "X-ZAP-API-Key";

/// HTTP client for a single ZAP daemon endpoint.
#[derive(Debug, Clone)]
pub struct ZapClient {
    http: reqwest::Client,
    base_url: Url,
    api_key: Option<String>,
}

impl ZapClient {
    pub fn new(config: &ZapConfig) -> Result<Self, anyhow::Error> {
        let base_url = Url::parse(&format!("http://{}:{}/", config.host, config.port))
            .with_context(|| format!("invalid ZAP endpoint {}:{}", config.host, config.port))?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url,
            api_key: config.api_key.clone(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(
        &self,
        format: &str,
        component: &str,
        kind: &str,
        name: &str,
        params: &[(&str, &str)],
    ) -> Result<Url, ScanError> {
        let mut url = self
            .base_url
            .join(&format!("{format}/{component}/{kind}/{name}/"))
            .map_err(|e| ScanError::UnexpectedResponse(format!("bad endpoint path: {e}")))?;
        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params);
        }
        Ok(url)
    }

    async fn fetch(&self, url: Url) -> Result<(reqwest::StatusCode, String), ScanError> {
        tracing::debug!(path = %url.path(), "ZAP request");
        let mut request = self.http.get(url);
        if let Some(key) = &self.api_key {
            request = request.header(API_KEY_HEADER, key);
        }
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        Ok((status, body))
    }

    /// Issue a JSON API call and return the decoded body, mapping faults.
    async fn call(
        &self,
        component: &str,
        kind: &str,
        name: &str,
        params: &[(&str, &str)],
    ) -> Result<Value, ScanError> {
        let url = self.endpoint("JSON", component, kind, name, params)?;
        let (status, body) = self.fetch(url).await?;

        let value: Value = serde_json::from_str(&body).map_err(|e| {
            ScanError::UnexpectedResponse(format!(
                "{component}/{name} returned HTTP {status} with non-JSON body: {e}"
            ))
        })?;

        if let Some(fault) = fault_from(&value) {
            return Err(fault);
        }
        if !status.is_success() {
            return Err(ScanError::UnexpectedResponse(format!(
                "{component}/{name} returned HTTP {status}"
            )));
        }
        Ok(value)
    }

    async fn action(
        &self,
        component: &str,
        name: &str,
        params: &[(&str, &str)],
    ) -> Result<(), ScanError> {
        let value = self.call(component, "action", name, params).await?;
        match value.get("Result").and_then(Value::as_str) {
            Some("OK") | None => Ok(()),
            Some(other) => Err(ScanError::UnexpectedResponse(format!(
                "{component}/{name} answered '{other}'"
            ))),
        }
    }

    /// Scan-starting actions answer with `{"scan": "<id>"}` instead of `Result`.
    async fn start_scan(
        &self,
        component: &str,
        params: &[(&str, &str)],
    ) -> Result<String, ScanError> {
        let value = self.call(component, "action", "scan", params).await?;
        string_field(&value, "scan")
    }

    async fn view_string(
        &self,
        component: &str,
        name: &str,
        key: &str,
        params: &[(&str, &str)],
    ) -> Result<String, ScanError> {
        let value = self.call(component, "view", name, params).await?;
        string_field(&value, key)
    }

    async fn view_count(
        &self,
        component: &str,
        name: &str,
        key: &str,
        params: &[(&str, &str)],
    ) -> Result<u32, ScanError> {
        let raw = self.view_string(component, name, key, params).await?;
        parse_count(&raw)
    }
}

/// Decode a `{"code", "message"}` fault envelope.
fn fault_from(value: &Value) -> Option<ScanError> {
    let code = value.get("code")?.as_str()?;
    let message = value
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or_default();
    Some(ScanError::Daemon {
        code: code.to_string(),
        message: message.to_string(),
    })
}

fn string_field(value: &Value, key: &str) -> Result<String, ScanError> {
    value
        .get(key)
        .and_then(Value::as_str)
        .map(String::from)
        .ok_or_else(|| ScanError::UnexpectedResponse(format!("missing '{key}' in {value}")))
}

/// Decode an alert list, skipping records that do not fit the model.
fn decode_alerts(list: Value) -> Result<Vec<Alert>, ScanError> {
    let records = match list {
        Value::Array(records) => records,
        other => {
            return Err(ScanError::UnexpectedResponse(format!(
                "expected an alert list, got {other}"
            )))
        }
    };

    let total = records.len();
    let alerts: Vec<Alert> = records
        .into_iter()
        .filter_map(|record| match serde_json::from_value::<Alert>(record) {
            Ok(alert) => Some(alert),
            Err(e) => {
                tracing::warn!(error = %e, "Skipping malformed alert");
                None
            }
        })
        .collect();

    if alerts.len() < total {
        tracing::warn!(total, decoded = alerts.len(), "Some alerts were skipped");
    }
    Ok(alerts)
}

/// The daemon reports counts and percentages as decimal strings.
fn parse_count(raw: &str) -> Result<u32, ScanError> {
    raw.trim()
        .parse::<u32>()
        .map_err(|_| ScanError::UnexpectedResponse(format!("expected a number, got '{raw}'")))
}

#[async_trait]
impl ScanClient for ZapClient {
    async fn version(&self) -> Result<String, ScanError> {
        self.view_string("core", "version", "version", &[]).await
    }

    async fn delete_all_alerts(&self) -> Result<(), ScanError> {
        self.action("alert", "deleteAllAlerts", &[]).await
    }

    async fn alerts(&self, base_url: &str) -> Result<Vec<Alert>, ScanError> {
        let mut value = self
            .call("core", "view", "alerts", &[("baseurl", base_url)])
            .await?;
        let list = value
            .get_mut("alerts")
            .map(Value::take)
            .ok_or_else(|| ScanError::UnexpectedResponse("missing 'alerts' list".to_string()))?;
        decode_alerts(list)
    }

    async fn enable_all_passive_scanners(&self) -> Result<(), ScanError> {
        self.action("pscan", "enableAllScanners", &[]).await
    }

    async fn passive_scanner_ids(&self) -> Result<Vec<String>, ScanError> {
        let value = self.call("pscan", "view", "scanners", &[]).await?;
        let scanners = value
            .get("scanners")
            .and_then(Value::as_array)
            .ok_or_else(|| ScanError::UnexpectedResponse("missing 'scanners' list".to_string()))?;
        scanners.iter().map(|s| string_field(s, "id")).collect()
    }

    async fn set_passive_scanner_alert_threshold(
        &self,
        id: &str,
        threshold: AlertThreshold,
    ) -> Result<(), ScanError> {
        self.action(
            "pscan",
            "setScannerAlertThreshold",
            &[("id", id), ("alertThreshold", threshold.as_str())],
        )
        .await
    }

    async fn records_to_scan(&self) -> Result<u32, ScanError> {
        self.view_count("pscan", "recordsToScan", "recordsToScan", &[])
            .await
    }

    async fn set_attack_mode(&self) -> Result<(), ScanError> {
        self.action("core", "setMode", &[("mode", "attack")]).await
    }

    async fn disable_all_active_scanners(&self, policy: &str) -> Result<(), ScanError> {
        self.action("ascan", "disableAllScanners", &[("scanPolicyName", policy)])
            .await
    }

    async fn enable_active_scanners(&self, ids: &[&str], policy: &str) -> Result<(), ScanError> {
        let joined = ids.join(",");
        self.action(
            "ascan",
            "enableScanners",
            &[("ids", joined.as_str()), ("scanPolicyName", policy)],
        )
        .await
    }

    async fn set_active_scanner_attack_strength(
        &self,
        id: &str,
        strength: AttackStrength,
        policy: &str,
    ) -> Result<(), ScanError> {
        self.action(
            "ascan",
            "setScannerAttackStrength",
            &[
                ("id", id),
                ("attackStrength", strength.as_str()),
                ("scanPolicyName", policy),
            ],
        )
        .await
    }

    async fn set_active_scanner_alert_threshold(
        &self,
        id: &str,
        threshold: AlertThreshold,
        policy: &str,
    ) -> Result<(), ScanError> {
        self.action(
            "ascan",
            "setScannerAlertThreshold",
            &[
                ("id", id),
                ("alertThreshold", threshold.as_str()),
                ("scanPolicyName", policy),
            ],
        )
        .await
    }

    async fn start_active_scan(&self, url: &str, policy: &str) -> Result<String, ScanError> {
        self.start_scan(
            "ascan",
            &[
                ("url", url),
                ("recurse", "true"),
                ("inScopeOnly", "false"),
                ("scanPolicyName", policy),
            ],
        )
        .await
    }

    async fn active_scan_progress(&self, scan_id: &str) -> Result<u32, ScanError> {
        self.view_count("ascan", "status", "status", &[("scanId", scan_id)])
            .await
    }

    async fn set_spider_thread_count(&self, threads: u32) -> Result<(), ScanError> {
        let value = threads.to_string();
        self.action("spider", "setOptionThreadCount", &[("Integer", value.as_str())])
            .await
    }

    async fn set_spider_max_depth(&self, depth: u32) -> Result<(), ScanError> {
        let value = depth.to_string();
        self.action("spider", "setOptionMaxDepth", &[("Integer", value.as_str())])
            .await
    }

    async fn set_spider_max_duration(&self, minutes: u32) -> Result<(), ScanError> {
        let value = minutes.to_string();
        self.action("spider", "setOptionMaxDuration", &[("Integer", value.as_str())])
            .await
    }

    async fn start_spider_scan(&self, url: &str) -> Result<String, ScanError> {
        self.start_scan("spider", &[("url", url)]).await
    }

    async fn spider_scan_progress(&self, scan_id: &str) -> Result<u32, ScanError> {
        self.view_count("spider", "status", "status", &[("scanId", scan_id)])
            .await
    }

    async fn stop_all_spider_scans(&self) -> Result<(), ScanError> {
        self.action("spider", "stopAllScans", &[]).await
    }

    async fn remove_all_spider_scans(&self) -> Result<(), ScanError> {
        self.action("spider", "removeAllScans", &[]).await
    }

    async fn html_report(&self) -> Result<String, ScanError> {
        let url = self.endpoint("OTHER", "core", "other", "htmlreport", &[])?;
        let (status, body) = self.fetch(url).await?;
        if !status.is_success() {
            if let Some(fault) = serde_json::from_str::<Value>(&body)
                .ok()
                .as_ref()
                .and_then(fault_from)
            {
                return Err(fault);
            }
            return Err(ScanError::UnexpectedResponse(format!(
                "htmlreport returned HTTP {status}"
            )));
        }
        Ok(body)
    }
}
