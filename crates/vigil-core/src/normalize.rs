// ── Wire-to-domain normalization ──
//
// The only place that understands vendor JSON. Each category's payload
// is lifted into vendor-agnostic `EntitySnapshot`s here; a missing field
// in `data.installation` simply means zero entities of that category.

use serde::de::DeserializeOwned;
use serde_json::Value;

use vigil_api::models::{
    WireArmState, WireBroadband, WireClimate, WireDoorLock, WireDoorWindow, WireMouseDetection,
    WireSmartPlug, WireUserPresence,
};

use crate::error::CoreError;
use crate::model::{ArmMode, Category, EntityId, EntitySnapshot, EntityState, Installation};

/// Normalize one category's query response.
///
/// Mouse-detection payloads may yield more snapshots than devices: the
/// units carry climate readings as a side channel, and those are emitted
/// under [`Category::Climate`] without duplicating the mouse entity.
pub(crate) fn parse_category(
    category: Category,
    installation: &Installation,
    data: &Value,
) -> Result<Vec<EntitySnapshot>, CoreError> {
    match category {
        Category::Alarm => parse_alarm(installation, data),
        Category::SmartLock => parse_locks(installation, data),
        Category::DoorWindow => parse_door_windows(installation, data),
        Category::Climate => parse_climates(installation, data),
        Category::SmartPlug => parse_plugs(installation, data),
        Category::Broadband => parse_broadband(installation, data),
        Category::UserPresence => parse_presences(installation, data),
        Category::MouseDetection => parse_mice(installation, data),
    }
}

/// Fetch `data.installation.<field>`, absent or null meaning "no entities".
fn field<'a>(data: &'a Value, name: &str) -> Option<&'a Value> {
    let value = data.get("installation")?.get(name)?;
    if value.is_null() { None } else { Some(value) }
}

fn decode<T: DeserializeOwned>(category: Category, value: &Value) -> Result<T, CoreError> {
    serde_json::from_value(value.clone()).map_err(|e| CoreError::Parse {
        category,
        message: e.to_string(),
    })
}

fn parse_alarm(
    installation: &Installation,
    data: &Value,
) -> Result<Vec<EntitySnapshot>, CoreError> {
    let Some(raw) = field(data, "armState") else {
        return Ok(Vec::new());
    };
    let wire: WireArmState = decode(Category::Alarm, raw)?;

    let armed = match wire.status.as_str() {
        "ARMED_AWAY" => ArmMode::Away,
        "ARMED_HOME" => ArmMode::Home,
        "DISARMED" => ArmMode::Disarmed,
        other => {
            return Err(CoreError::Parse {
                category: Category::Alarm,
                message: format!("unknown arm status {other:?}"),
            });
        }
    };

    Ok(vec![EntitySnapshot {
        entity_id: EntityId::new(format!("alarm:{}", installation.id)),
        installation_id: installation.id.clone(),
        category: Category::Alarm,
        state: EntityState::Alarm {
            armed,
            changed_by: wire.changed_by,
        },
        area: None,
    }])
}

fn parse_locks(
    installation: &Installation,
    data: &Value,
) -> Result<Vec<EntitySnapshot>, CoreError> {
    let Some(raw) = field(data, "doorLocks") else {
        return Ok(Vec::new());
    };
    let wires: Vec<WireDoorLock> = decode(Category::SmartLock, raw)?;

    Ok(wires
        .into_iter()
        .map(|w| EntitySnapshot {
            entity_id: EntityId::from(w.device_label),
            installation_id: installation.id.clone(),
            category: Category::SmartLock,
            state: EntityState::Lock {
                locked: w.locked,
                method: w.method,
                user: w.user,
            },
            area: w.area,
        })
        .collect())
}

fn parse_door_windows(
    installation: &Installation,
    data: &Value,
) -> Result<Vec<EntitySnapshot>, CoreError> {
    let Some(raw) = field(data, "doorWindows") else {
        return Ok(Vec::new());
    };
    let wires: Vec<WireDoorWindow> = decode(Category::DoorWindow, raw)?;

    Ok(wires
        .into_iter()
        .map(|w| EntitySnapshot {
            entity_id: EntityId::from(w.device_label),
            installation_id: installation.id.clone(),
            category: Category::DoorWindow,
            state: EntityState::DoorWindow {
                open: w.state == "OPEN",
            },
            area: w.area,
        })
        .collect())
}

fn parse_climates(
    installation: &Installation,
    data: &Value,
) -> Result<Vec<EntitySnapshot>, CoreError> {
    let Some(raw) = field(data, "climates") else {
        return Ok(Vec::new());
    };
    let wires: Vec<WireClimate> = decode(Category::Climate, raw)?;

    Ok(wires
        .into_iter()
        .map(|w| EntitySnapshot {
            entity_id: EntityId::from(w.device_label),
            installation_id: installation.id.clone(),
            category: Category::Climate,
            state: EntityState::Climate {
                temperature_c: w.temperature,
                humidity_pct: w.humidity,
            },
            area: w.area,
        })
        .collect())
}

fn parse_plugs(
    installation: &Installation,
    data: &Value,
) -> Result<Vec<EntitySnapshot>, CoreError> {
    let Some(raw) = field(data, "smartPlugs") else {
        return Ok(Vec::new());
    };
    let wires: Vec<WireSmartPlug> = decode(Category::SmartPlug, raw)?;

    Ok(wires
        .into_iter()
        .map(|w| EntitySnapshot {
            entity_id: EntityId::from(w.device_label),
            installation_id: installation.id.clone(),
            category: Category::SmartPlug,
            state: EntityState::Plug { on: w.state == "ON" },
            area: w.area,
        })
        .collect())
}

fn parse_broadband(
    installation: &Installation,
    data: &Value,
) -> Result<Vec<EntitySnapshot>, CoreError> {
    let Some(raw) = field(data, "broadband") else {
        return Ok(Vec::new());
    };
    let wire: WireBroadband = decode(Category::Broadband, raw)?;

    Ok(vec![EntitySnapshot {
        entity_id: EntityId::new(format!("broadband:{}", installation.id)),
        installation_id: installation.id.clone(),
        category: Category::Broadband,
        state: EntityState::Broadband {
            connected: wire.connected,
        },
        area: None,
    }])
}

fn parse_presences(
    installation: &Installation,
    data: &Value,
) -> Result<Vec<EntitySnapshot>, CoreError> {
    let Some(raw) = field(data, "userPresences") else {
        return Ok(Vec::new());
    };
    let wires: Vec<WireUserPresence> = decode(Category::UserPresence, raw)?;

    Ok(wires
        .into_iter()
        .map(|w| EntitySnapshot {
            entity_id: EntityId::new(format!("presence:{}", w.web_account)),
            installation_id: installation.id.clone(),
            category: Category::UserPresence,
            state: EntityState::Presence {
                home: w.status == "HOME",
                user: Some(w.web_account),
            },
            area: None,
        })
        .collect())
}

fn parse_mice(
    installation: &Installation,
    data: &Value,
) -> Result<Vec<EntitySnapshot>, CoreError> {
    let Some(raw) = field(data, "mouseDetections") else {
        return Ok(Vec::new());
    };
    let wires: Vec<WireMouseDetection> = decode(Category::MouseDetection, raw)?;

    let mut snapshots = Vec::with_capacity(wires.len());
    for w in wires {
        let entity_id = EntityId::from(w.device_label.clone());

        snapshots.push(EntitySnapshot {
            entity_id: entity_id.clone(),
            installation_id: installation.id.clone(),
            category: Category::MouseDetection,
            state: EntityState::Mice {
                detections_last_24h: w.detections_last24h,
            },
            area: w.area.clone(),
        });

        // Side-channel climate readings ride on the same unit; lift them
        // into the climate category instead of duplicating the mouse entity.
        if w.temperature.is_some() || w.humidity.is_some() {
            snapshots.push(EntitySnapshot {
                entity_id,
                installation_id: installation.id.clone(),
                category: Category::Climate,
                state: EntityState::Climate {
                    temperature_c: w.temperature,
                    humidity_pct: w.humidity,
                },
                area: w.area,
            });
        }
    }
    Ok(snapshots)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::model::InstallationId;

    fn installation() -> Installation {
        Installation {
            id: InstallationId::from("inst-1"),
            display_name: "Home".into(),
            pin: None,
        }
    }

    #[test]
    fn missing_field_yields_zero_entities() {
        let data = json!({ "installation": {} });
        for category in Category::ALL {
            let snaps = parse_category(category, &installation(), &data).unwrap();
            assert!(snaps.is_empty(), "{category} should be empty");
        }
    }

    #[test]
    fn alarm_state_is_normalized() {
        let data = json!({
            "installation": { "armState": { "status": "ARMED_HOME", "changedBy": "alice" } }
        });
        let snaps = parse_category(Category::Alarm, &installation(), &data).unwrap();

        assert_eq!(snaps.len(), 1);
        assert_eq!(snaps[0].entity_id.as_str(), "alarm:inst-1");
        assert_eq!(
            snaps[0].state,
            EntityState::Alarm {
                armed: ArmMode::Home,
                changed_by: Some("alice".into()),
            }
        );
    }

    #[test]
    fn unknown_arm_status_is_a_parse_error() {
        let data = json!({
            "installation": { "armState": { "status": "PANIC" } }
        });
        let result = parse_category(Category::Alarm, &installation(), &data);
        assert!(matches!(
            result,
            Err(CoreError::Parse {
                category: Category::Alarm,
                ..
            })
        ));
    }

    #[test]
    fn door_window_open_flag_follows_state_string() {
        let data = json!({
            "installation": { "doorWindows": [
                { "deviceLabel": "dw-1", "area": "kitchen", "state": "OPEN" },
                { "deviceLabel": "dw-2", "area": "hall", "state": "CLOSE" },
            ]}
        });
        let snaps = parse_category(Category::DoorWindow, &installation(), &data).unwrap();

        assert_eq!(snaps.len(), 2);
        assert_eq!(snaps[0].state, EntityState::DoorWindow { open: true });
        assert_eq!(snaps[1].state, EntityState::DoorWindow { open: false });
        assert_eq!(snaps[0].area.as_deref(), Some("kitchen"));
    }

    #[test]
    fn mouse_unit_emits_climate_side_channel() {
        let data = json!({
            "installation": { "mouseDetections": [{
                "deviceLabel": "mouse-1",
                "area": "attic",
                "detectionsLast24h": 3,
                "temperature": 18.5,
                "humidity": 55.0,
            }]}
        });
        let snaps = parse_category(Category::MouseDetection, &installation(), &data).unwrap();

        assert_eq!(snaps.len(), 2);
        assert_eq!(snaps[0].category, Category::MouseDetection);
        assert_eq!(
            snaps[0].state,
            EntityState::Mice {
                detections_last_24h: 3,
            }
        );
        assert_eq!(snaps[1].category, Category::Climate);
        assert_eq!(snaps[1].entity_id, snaps[0].entity_id);
        assert_eq!(
            snaps[1].state,
            EntityState::Climate {
                temperature_c: Some(18.5),
                humidity_pct: Some(55.0),
            }
        );
    }

    #[test]
    fn mouse_unit_without_readings_emits_no_climate() {
        let data = json!({
            "installation": { "mouseDetections": [{
                "deviceLabel": "mouse-1",
                "detectionsLast24h": 0,
            }]}
        });
        let snaps = parse_category(Category::MouseDetection, &installation(), &data).unwrap();
        assert_eq!(snaps.len(), 1);
        assert_eq!(snaps[0].category, Category::MouseDetection);
    }

    #[test]
    fn malformed_array_is_a_parse_error() {
        let data = json!({ "installation": { "doorLocks": "not-an-array" } });
        let result = parse_category(Category::SmartLock, &installation(), &data);
        assert!(matches!(result, Err(CoreError::Parse { .. })));
    }
}
