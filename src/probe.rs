//! Health probing for configured backends.
//!
//! One probe is a single GET against the backend's health endpoint. The JSON
//! report is reduced to a [`PingResult`]: every component detail that is not
//! `"ok"` becomes a [`ComponentFailure`], in report order. The HTTP status
//! code is recorded but carries no meaning for failure detection; a backend
//! answering 500 with a decodable report still produces a result.

use std::fmt;
use std::time::Duration;

use serde::Serialize;
use tracing::{instrument, trace};

use crate::HealthReport;
use crate::config::BackendConfig;

/// One component of a backend that did not report `"ok"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComponentFailure {
    pub name: String,
    pub reason: String,
    pub fatal: bool,
}

/// Outcome of one completed probe, the data model templates render against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PingResult {
    /// Configured backend name (not taken from the report)
    pub backend: String,

    /// Raw HTTP status code observed on the wire
    pub status_code: u16,

    /// Report timestamp, passed through verbatim
    pub timestamp: String,

    /// Non-ok components, in report order; empty when all components are ok
    pub failures: Vec<ComponentFailure>,
}

impl PingResult {
    /// Reduces a decoded health report to the failed components.
    pub fn from_report(backend: &str, status_code: u16, report: HealthReport) -> Self {
        let failures = report
            .details
            .into_iter()
            .filter(|detail| !detail.is_ok())
            .map(|detail| ComponentFailure {
                name: detail.name,
                reason: detail.error.unwrap_or_default(),
                fatal: detail.fatal,
            })
            .collect();

        Self {
            backend: backend.to_string(),
            status_code,
            timestamp: report.timestamp,
            failures,
        }
    }
}

/// Errors that can end a probe
#[derive(Debug)]
pub enum ProbeError {
    /// Request could not be sent or the body could not be read
    Transport(reqwest::Error),

    /// Response body was not a decodable health report
    Shape(serde_json::Error),
}

impl fmt::Display for ProbeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeError::Transport(err) => write!(f, "failed to reach backend: {}", err),
            ProbeError::Shape(err) => write!(f, "could not decode health report: {}", err),
        }
    }
}

impl std::error::Error for ProbeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ProbeError::Transport(err) => Some(err),
            ProbeError::Shape(err) => Some(err),
        }
    }
}

impl From<reqwest::Error> for ProbeError {
    fn from(err: reqwest::Error) -> Self {
        ProbeError::Transport(err)
    }
}

impl From<serde_json::Error> for ProbeError {
    fn from(err: serde_json::Error) -> Self {
        ProbeError::Shape(err)
    }
}

/// Probes backend health endpoints over a reused HTTP client.
pub struct HealthProber {
    client: reqwest::Client,
}

impl HealthProber {
    pub fn new() -> Self {
        Self::with_timeout(Duration::from_secs(30))
    }

    /// Builds a prober with a custom request timeout.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .expect("Failed to build HTTP client"),
        }
    }

    /// Performs one probe against the backend's configured URL.
    #[instrument(skip_all, fields(backend = %backend.name))]
    pub async fn probe(&self, backend: &BackendConfig) -> Result<PingResult, ProbeError> {
        trace!("requesting health report from {}", backend.url);

        // Build request with optional basic auth
        let mut request = self.client.get(&backend.url);

        if let Some(auth) = &backend.basic_auth {
            request = request.basic_auth(&auth.username, Some(&auth.password));
        }

        let response = request.send().await?;

        // The status code is informational; the body decides
        let status_code = response.status().as_u16();

        let body = response.text().await?;
        let report: HealthReport = serde_json::from_str(&body)?;

        trace!(
            "decoded health report with {} component details",
            report.details.len()
        );

        Ok(PingResult::from_report(&backend.name, status_code, report))
    }
}

impl Default for HealthProber {
    fn default() -> Self {
        Self::new()
    }
}
