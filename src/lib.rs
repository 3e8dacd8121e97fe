pub mod config;
pub mod dispatch;
pub mod informers;
pub mod monitor;
pub mod probe;
pub mod templates;
pub mod util;

use serde::{Deserialize, Serialize};

/// Component status string a healthy component reports.
pub const STATUS_OK: &str = "ok";

/// Component status string a failed component reports.
pub const STATUS_FAILED: &str = "failed";

/// Health report served by a backend under `GET /healthy`.
///
/// Absent fields take their zero values so a sparse report still decodes;
/// only malformed JSON or mismatched types are decode errors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub details: Vec<ComponentReport>,
}

/// Health of a single component inside a [`HealthReport`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentReport {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub fatal: bool,
}

impl ComponentReport {
    /// Anything other than the literal `"ok"` counts as failed.
    pub fn is_ok(&self) -> bool {
        self.status == STATUS_OK
    }
}
