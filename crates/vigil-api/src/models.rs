// Wire-level data shapes
//
// These structs mirror the vendor JSON 1:1 and exist only at the
// boundary: `vigil-core` normalizes them into vendor-agnostic snapshots
// before anything else sees them.

use serde::{Deserialize, Serialize};

// ── Query envelope ──────────────────────────────────────────────────

/// Request envelope accepted by the query endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphQlRequest {
    pub operation_name: &'static str,
    pub variables: serde_json::Value,
    pub query: &'static str,
}

/// Response envelope. Vendor-specific failure markers ride inside the
/// body and are handled by the executor before this is parsed; the
/// `errors` array covers ordinary query-shape failures.
#[derive(Debug, Deserialize)]
pub struct GraphQlEnvelope {
    pub data: Option<serde_json::Value>,
    #[serde(default)]
    pub errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
pub struct GraphQlError {
    #[serde(default)]
    pub message: String,
}

// ── Directory ───────────────────────────────────────────────────────

/// One tenant installation as listed by the account directory query.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireDirectoryEntry {
    pub installation_id: String,
    pub display_name: String,
}

// ── Per-category device payloads ────────────────────────────────────

/// Installation-level arm state.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireArmState {
    /// `ARMED_AWAY`, `ARMED_HOME` or `DISARMED`.
    pub status: String,
    pub changed_by: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireDoorLock {
    pub device_label: String,
    pub area: Option<String>,
    pub locked: bool,
    pub method: Option<String>,
    pub user: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireDoorWindow {
    pub device_label: String,
    pub area: Option<String>,
    /// `OPEN` or `CLOSE`.
    pub state: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireClimate {
    pub device_label: String,
    pub area: Option<String>,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireSmartPlug {
    pub device_label: String,
    pub area: Option<String>,
    /// `ON` or `OFF`.
    pub state: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireBroadband {
    pub connected: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireUserPresence {
    pub web_account: String,
    /// `HOME` or `AWAY`.
    pub status: String,
}

/// Mouse-detection unit. Carries climate readings as a side channel --
/// the synchronizer lifts those into the climate category.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireMouseDetection {
    pub device_label: String,
    pub area: Option<String>,
    #[serde(default)]
    pub detections_last24h: u32,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
}
