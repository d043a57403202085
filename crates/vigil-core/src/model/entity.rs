// ── Entity identity, categories, and normalized state ──

use std::fmt;

use serde::{Deserialize, Serialize};

use super::InstallationId;

/// Identifier of one physical device instance. Globally unique within a
/// category; the snapshot store keys on `(Category, EntityId)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Device type grouping, queried and normalized uniformly.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Alarm,
    SmartLock,
    DoorWindow,
    Climate,
    SmartPlug,
    Broadband,
    UserPresence,
    MouseDetection,
}

impl Category {
    /// Every category, in sync order.
    pub const ALL: [Self; 8] = [
        Self::Alarm,
        Self::SmartLock,
        Self::DoorWindow,
        Self::Climate,
        Self::SmartPlug,
        Self::Broadband,
        Self::UserPresence,
        Self::MouseDetection,
    ];
}

/// Alarm arming mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArmMode {
    Away,
    Home,
    Disarmed,
}

/// Normalized per-category payload. Structural equality of this value is
/// the change-detection predicate: listeners fire only when it differs
/// from the previously stored one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EntityState {
    Alarm {
        armed: ArmMode,
        changed_by: Option<String>,
    },
    Lock {
        locked: bool,
        method: Option<String>,
        user: Option<String>,
    },
    DoorWindow {
        open: bool,
    },
    Climate {
        temperature_c: Option<f64>,
        humidity_pct: Option<f64>,
    },
    Plug {
        on: bool,
    },
    Broadband {
        connected: bool,
    },
    Presence {
        home: bool,
        user: Option<String>,
    },
    Mice {
        detections_last_24h: u32,
    },
}

/// Last-known normalized state of one device instance.
///
/// Created on first observation, replaced wholesale on every change,
/// never partially mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySnapshot {
    pub entity_id: EntityId,
    pub installation_id: InstallationId,
    pub category: Category,
    pub state: EntityState,
    /// Location/area label, when the vendor reports one.
    pub area: Option<String>,
}
