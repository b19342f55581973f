//! Status condition extraction and readiness evaluation
//!
//! Custom resources are fetched as `DynamicObject`s, so `status` is an
//! untyped JSON value. Extraction is best-effort: anything that does not
//! look like a condition is dropped instead of failing the whole poll.

use k8s_openapi::serde_json::{self, Value};
use serde::Deserialize;

/// Condition type that signals readiness
pub const READY_CONDITION: &str = "Ready";

/// Status value that counts as satisfied
pub const CONDITION_TRUE: &str = "True";

/// One entry of `status.conditions`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Condition {
    pub type_: String,
    pub status: String,
    pub last_transition_time: String,
    pub reason: String,
    pub message: String,
}

/// Wire shape of a condition. Absent and `null` fields are accepted, a field
/// holding the wrong JSON type is not.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCondition {
    #[serde(rename = "type")]
    type_: Option<String>,
    status: Option<String>,
    last_transition_time: Option<String>,
    reason: Option<String>,
    message: Option<String>,
}

impl From<RawCondition> for Condition {
    fn from(raw: RawCondition) -> Self {
        Self {
            type_: raw.type_.unwrap_or_default(),
            status: raw.status.unwrap_or_default(),
            last_transition_time: raw.last_transition_time.unwrap_or_default(),
            reason: raw.reason.unwrap_or_default(),
            message: raw.message.unwrap_or_default(),
        }
    }
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}={}", self.type_, self.status)?;
        if !self.reason.is_empty() {
            write!(f, " ({})", self.reason)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        Ok(())
    }
}

/// Extract `status.conditions` from a resource body.
///
/// Returns an empty list when `status` is missing or not an object, or when
/// `conditions` is missing or not an array. Entries that are not objects, or
/// that carry non-string fields, are skipped; the rest keep their order.
#[must_use]
pub fn extract_conditions(object: &Value) -> Vec<Condition> {
    let Some(entries) = object
        .get("status")
        .and_then(Value::as_object)
        .and_then(|status| status.get("conditions"))
        .and_then(Value::as_array)
    else {
        return Vec::new();
    };

    entries
        .iter()
        .filter(|entry| entry.is_object())
        .filter_map(|entry| serde_json::from_value::<RawCondition>(entry.clone()).ok())
        .map(Condition::from)
        .collect()
}

/// True iff some condition is exactly `Ready`/`True`
#[must_use]
pub fn is_ready(conditions: &[Condition]) -> bool {
    conditions
        .iter()
        .any(|c| c.type_ == READY_CONDITION && c.status == CONDITION_TRUE)
}

/// Render a condition list for the per-tick log line
#[must_use]
pub fn format_conditions(conditions: &[Condition]) -> String {
    let rendered: Vec<String> = conditions.iter().map(ToString::to_string).collect();
    format!("[{}]", rendered.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::serde_json::json;

    fn cond(type_: &str, status: &str) -> Condition {
        Condition {
            type_: type_.to_string(),
            status: status.to_string(),
            ..Condition::default()
        }
    }

    #[test]
    fn test_missing_status_yields_nothing() {
        assert!(extract_conditions(&json!({})).is_empty());
        assert!(extract_conditions(&json!({"spec": {"refreshInterval": "1h"}})).is_empty());
    }

    #[test]
    fn test_status_not_an_object_yields_nothing() {
        assert!(extract_conditions(&json!({"status": "Ready"})).is_empty());
        assert!(extract_conditions(&json!({"status": [1, 2]})).is_empty());
        assert!(extract_conditions(&json!({"status": null})).is_empty());
    }

    #[test]
    fn test_conditions_not_an_array_yields_nothing() {
        assert!(extract_conditions(&json!({"status": {}})).is_empty());
        assert!(extract_conditions(&json!({"status": {"conditions": {"type": "Ready"}}})).is_empty());
        assert!(extract_conditions(&json!({"status": {"conditions": "Ready"}})).is_empty());
    }

    #[test]
    fn test_full_condition_decodes() {
        let body = json!({"status": {"conditions": [{
            "type": "Ready",
            "status": "False",
            "lastTransitionTime": "2024-01-01T00:00:00Z",
            "reason": "SecretSyncedError",
            "message": "could not get secret data from provider"
        }]}});
        let conditions = extract_conditions(&body);
        assert_eq!(
            conditions,
            vec![Condition {
                type_: "Ready".to_string(),
                status: "False".to_string(),
                last_transition_time: "2024-01-01T00:00:00Z".to_string(),
                reason: "SecretSyncedError".to_string(),
                message: "could not get secret data from provider".to_string(),
            }]
        );
    }

    #[test]
    fn test_invalid_entries_dropped_order_kept() {
        let body = json!({"status": {"conditions": [
            {"type": "Synced", "status": "True"},
            "not-a-map",
            42,
            {"type": "Ready", "status": true},
            null,
            {"type": "Ready", "status": "True", "reason": null},
            ["nested"]
        ]}});
        let conditions = extract_conditions(&body);
        assert_eq!(conditions, vec![cond("Synced", "True"), cond("Ready", "True")]);
    }

    #[test]
    fn test_extraction_is_idempotent() {
        let body = json!({"status": {"conditions": [
            {"type": "Ready", "status": "Unknown", "reason": "Pending"},
            7
        ]}});
        assert_eq!(extract_conditions(&body), extract_conditions(&body));
    }

    #[test]
    fn test_is_ready_truth_table() {
        assert!(!is_ready(&[]));
        assert!(!is_ready(&[cond("Ready", "False")]));
        assert!(!is_ready(&[cond("Ready", "Unknown")]));
        assert!(!is_ready(&[cond("Ready", "true")]));
        assert!(!is_ready(&[cond("ready", "True")]));
        assert!(!is_ready(&[cond("Synced", "True")]));
        assert!(is_ready(&[cond("Ready", "True")]));
        assert!(is_ready(&[cond("Ready", "False"), cond("Ready", "True")]));
    }

    #[test]
    fn test_format_conditions() {
        assert_eq!(format_conditions(&[]), "[]");
        let mut retrying = cond("Ready", "False");
        retrying.reason = "Retrying".to_string();
        assert_eq!(
            format_conditions(&[retrying, cond("Synced", "True")]),
            "[Ready=False (Retrying), Synced=True]"
        );
    }
}
