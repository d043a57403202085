// Query builders
//
// One builder per operation, each producing the `{operationName,
// variables, query}` envelope the query endpoint accepts. Responses come
// back as `{data: {...}}` with vendor failure markers in-band; the
// executor strips those before callers parse `data`.

use serde_json::json;

use crate::models::GraphQlRequest;

/// Path of the query endpoint, relative to the active API host.
pub const QUERY_PATH: &str = "/graphql";

/// List every installation visible to the authenticated account.
pub fn account_installations() -> GraphQlRequest {
    GraphQlRequest {
        operation_name: "AccountInstallations",
        variables: json!({}),
        query: "query AccountInstallations { account { installations { \
                installationId displayName } } }",
    }
}

/// Installation-level arm state.
pub fn arm_state(installation_id: &str) -> GraphQlRequest {
    GraphQlRequest {
        operation_name: "ArmState",
        variables: json!({ "installationId": installation_id }),
        query: "query ArmState($installationId: String!) { \
                installation(id: $installationId) { armState { status changedBy } } }",
    }
}

/// Door locks of an installation.
pub fn door_locks(installation_id: &str) -> GraphQlRequest {
    GraphQlRequest {
        operation_name: "DoorLocks",
        variables: json!({ "installationId": installation_id }),
        query: "query DoorLocks($installationId: String!) { \
                installation(id: $installationId) { doorLocks { \
                deviceLabel area locked method user } } }",
    }
}

/// Door and window contact sensors.
pub fn door_windows(installation_id: &str) -> GraphQlRequest {
    GraphQlRequest {
        operation_name: "DoorWindows",
        variables: json!({ "installationId": installation_id }),
        query: "query DoorWindows($installationId: String!) { \
                installation(id: $installationId) { doorWindows { \
                deviceLabel area state } } }",
    }
}

/// Climate readings (temperature / humidity sensors).
pub fn climates(installation_id: &str) -> GraphQlRequest {
    GraphQlRequest {
        operation_name: "Climates",
        variables: json!({ "installationId": installation_id }),
        query: "query Climates($installationId: String!) { \
                installation(id: $installationId) { climates { \
                deviceLabel area temperature humidity } } }",
    }
}

/// Smart plugs.
pub fn smart_plugs(installation_id: &str) -> GraphQlRequest {
    GraphQlRequest {
        operation_name: "SmartPlugs",
        variables: json!({ "installationId": installation_id }),
        query: "query SmartPlugs($installationId: String!) { \
                installation(id: $installationId) { smartPlugs { \
                deviceLabel area state } } }",
    }
}

/// Broadband uplink status of the installation's gateway.
pub fn broadband(installation_id: &str) -> GraphQlRequest {
    GraphQlRequest {
        operation_name: "Broadband",
        variables: json!({ "installationId": installation_id }),
        query: "query Broadband($installationId: String!) { \
                installation(id: $installationId) { broadband { connected } } }",
    }
}

/// Presence status per registered user.
pub fn user_presences(installation_id: &str) -> GraphQlRequest {
    GraphQlRequest {
        operation_name: "UserPresences",
        variables: json!({ "installationId": installation_id }),
        query: "query UserPresences($installationId: String!) { \
                installation(id: $installationId) { userPresences { \
                webAccount status } } }",
    }
}

/// Mouse-detection units. The response also carries climate readings for
/// the same devices, which the synchronizer lifts into the climate
/// category.
pub fn mouse_detections(installation_id: &str) -> GraphQlRequest {
    GraphQlRequest {
        operation_name: "MouseDetections",
        variables: json!({ "installationId": installation_id }),
        query: "query MouseDetections($installationId: String!) { \
                installation(id: $installationId) { mouseDetections { \
                deviceLabel area detectionsLast24h temperature humidity } } }",
    }
}
