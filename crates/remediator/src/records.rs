//! Typed records parsed from raw cluster objects.
//!
//! The lister returns raw JSON items; everything downstream works on the
//! explicit records built here. Absent fields become `None` at this boundary,
//! never silent lookup failures deeper in the engine.

use chrono::{DateTime, Utc};
use serde_json::Value;
use thiserror::Error;

/// Annotation linking a request or order back to its Certificate resource.
pub const CERTIFICATE_NAME_ANNOTATION: &str = "cert-manager.io/certificate-name";

/// Literal value of a succeeded condition's status field.
pub const CONDITION_SUCCESS: &str = "True";

/// A record whose timestamp cannot be trusted is excluded from remediation,
/// never assumed eligible.
#[derive(Error, Debug)]
pub enum TimestampFormatError {
    #[error("no creation or managed-fields timestamp present")]
    Missing,

    #[error("unparseable timestamp '{value}': {source}")]
    Unparseable {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("timestamp '{value}' is not UTC")]
    NotUtc { value: String },
}

#[derive(Error, Debug)]
pub enum RecordParseError {
    #[error("record has no metadata.name")]
    MissingName,

    #[error("record '{name}' has no metadata.namespace")]
    MissingNamespace { name: String },

    #[error("record '{namespace}/{name}': {source}")]
    Timestamp {
        namespace: String,
        name: String,
        #[source]
        source: TimestampFormatError,
    },
}

/// Primary status condition of a certificate request.
#[derive(Debug, Clone)]
pub struct RequestCondition {
    /// Success indicator, the literal `"True"` when the request succeeded.
    pub status: String,
    pub reason: Option<String>,
    pub message: Option<String>,
}

/// One `CertificateRequest` as observed in a cluster snapshot.
///
/// `namespace`/`name` are unique within the snapshot. Observed read-only; only
/// the executor ever deletes one.
#[derive(Debug, Clone)]
pub struct CertificateRequestRecord {
    pub name: String,
    pub namespace: String,
    /// Owning Certificate, from the `cert-manager.io/certificate-name` annotation.
    pub certificate_name: Option<String>,
    pub observed_at: DateTime<Utc>,
    pub condition: Option<RequestCondition>,
}

impl CertificateRequestRecord {
    /// Human-readable condition summary for plan review.
    #[must_use]
    pub fn status_summary(&self) -> String {
        match &self.condition {
            Some(cond) => format!(
                "{}: {}",
                cond.reason.as_deref().unwrap_or("Unknown reason"),
                cond.message.as_deref().unwrap_or("Unknown msg")
            ),
            None => "Unknown status".to_string(),
        }
    }
}

/// One ACME `Order` as observed in a cluster snapshot.
///
/// Any number of orders may reference the same owning certificate; stale runs
/// leave more than one.
#[derive(Debug, Clone)]
pub struct OrderRecord {
    pub name: String,
    pub namespace: String,
    pub certificate_name: Option<String>,
}

/// Parse one raw `CertificateRequest` item.
///
/// # Errors
///
/// Returns `RecordParseError` when identity fields are missing or the
/// observation timestamp is absent, malformed, or not UTC.
pub fn parse_certificate_request(
    item: &Value,
) -> Result<CertificateRequestRecord, RecordParseError> {
    let (name, namespace) = identity(item)?;

    let observed_at = observed_timestamp(item).map_err(|source| RecordParseError::Timestamp {
        namespace: namespace.clone(),
        name: name.clone(),
        source,
    })?;

    let condition = item
        .get("status")
        .and_then(|s| s.get("conditions"))
        .and_then(|c| c.get(0))
        .map(|cond| RequestCondition {
            status: str_field(cond, "status").unwrap_or_default(),
            reason: str_field(cond, "reason"),
            message: str_field(cond, "message"),
        });

    Ok(CertificateRequestRecord {
        certificate_name: annotation(item, CERTIFICATE_NAME_ANNOTATION),
        name,
        namespace,
        observed_at,
        condition,
    })
}

/// Parse one raw `Order` item.
///
/// # Errors
///
/// Returns `RecordParseError` when identity fields are missing.
pub fn parse_order(item: &Value) -> Result<OrderRecord, RecordParseError> {
    let (name, namespace) = identity(item)?;

    Ok(OrderRecord {
        certificate_name: annotation(item, CERTIFICATE_NAME_ANNOTATION),
        name,
        namespace,
    })
}

fn identity(item: &Value) -> Result<(String, String), RecordParseError> {
    let metadata = item.get("metadata");

    let name = metadata
        .and_then(|m| m.get("name"))
        .and_then(Value::as_str)
        .map(|n| n.trim().to_string())
        .ok_or(RecordParseError::MissingName)?;

    let namespace = metadata
        .and_then(|m| m.get("namespace"))
        .and_then(Value::as_str)
        .map(ToString::to_string)
        .ok_or_else(|| RecordParseError::MissingNamespace { name: name.clone() })?;

    Ok((name, namespace))
}

fn annotation(item: &Value, key: &str) -> Option<String> {
    item.get("metadata")
        .and_then(|m| m.get("annotations"))
        .and_then(|a| a.get(key))
        .and_then(Value::as_str)
        .map(ToString::to_string)
}

fn str_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(ToString::to_string)
}

/// Observation timestamp: first managed-fields entry when present, falling
/// back to the creation timestamp. Must parse as RFC 3339 and carry a UTC
/// offset.
fn observed_timestamp(item: &Value) -> Result<DateTime<Utc>, TimestampFormatError> {
    let metadata = item.get("metadata");

    let raw = metadata
        .and_then(|m| m.get("managedFields"))
        .and_then(|f| f.get(0))
        .and_then(|f| f.get("time"))
        .and_then(Value::as_str)
        .or_else(|| {
            metadata
                .and_then(|m| m.get("creationTimestamp"))
                .and_then(Value::as_str)
        })
        .ok_or(TimestampFormatError::Missing)?;

    let parsed =
        DateTime::parse_from_rfc3339(raw).map_err(|source| TimestampFormatError::Unparseable {
            value: raw.to_string(),
            source,
        })?;

    if parsed.offset().local_minus_utc() != 0 {
        return Err(TimestampFormatError::NotUtc {
            value: raw.to_string(),
        });
    }

    Ok(parsed.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request_item(ts: &str) -> Value {
        json!({
            "metadata": {
                "name": "web-tls-abc12",
                "namespace": "storefront",
                "annotations": { CERTIFICATE_NAME_ANNOTATION: "web-tls" },
                "managedFields": [ { "manager": "cert-manager", "time": ts } ]
            },
            "status": {
                "conditions": [
                    { "status": "False", "reason": "Failed", "message": "order is in errored state" }
                ]
            }
        })
    }

    #[test]
    fn test_parse_request_full() {
        let record = parse_certificate_request(&request_item("2024-03-01T10:00:00Z")).unwrap();
        assert_eq!(record.name, "web-tls-abc12");
        assert_eq!(record.namespace, "storefront");
        assert_eq!(record.certificate_name.as_deref(), Some("web-tls"));

        let cond = record.condition.expect("condition present");
        assert_eq!(cond.status, "False");
        assert_eq!(cond.reason.as_deref(), Some("Failed"));
    }

    #[test]
    fn test_parse_request_trims_name() {
        let mut item = request_item("2024-03-01T10:00:00Z");
        item["metadata"]["name"] = json!("  web-tls-abc12 ");
        let record = parse_certificate_request(&item).unwrap();
        assert_eq!(record.name, "web-tls-abc12");
    }

    #[test]
    fn test_parse_request_without_status() {
        let mut item = request_item("2024-03-01T10:00:00Z");
        item.as_object_mut().unwrap().remove("status");
        let record = parse_certificate_request(&item).unwrap();
        assert!(record.condition.is_none());
        assert_eq!(record.status_summary(), "Unknown status");
    }

    #[test]
    fn test_parse_request_falls_back_to_creation_timestamp() {
        let mut item = request_item("2024-03-01T10:00:00Z");
        item["metadata"].as_object_mut().unwrap().remove("managedFields");
        item["metadata"]["creationTimestamp"] = json!("2024-03-01T09:30:00Z");
        let record = parse_certificate_request(&item).unwrap();
        assert_eq!(
            record.observed_at,
            DateTime::parse_from_rfc3339("2024-03-01T09:30:00Z").unwrap()
        );
    }

    #[test]
    fn test_parse_request_rejects_malformed_timestamp() {
        let err = parse_certificate_request(&request_item("yesterday")).unwrap_err();
        assert!(matches!(
            err,
            RecordParseError::Timestamp {
                source: TimestampFormatError::Unparseable { .. },
                ..
            }
        ));
    }

    #[test]
    fn test_parse_request_rejects_non_utc_timestamp() {
        let err =
            parse_certificate_request(&request_item("2024-03-01T10:00:00+02:00")).unwrap_err();
        assert!(matches!(
            err,
            RecordParseError::Timestamp {
                source: TimestampFormatError::NotUtc { .. },
                ..
            }
        ));
    }

    #[test]
    fn test_parse_request_rejects_missing_timestamp() {
        let mut item = request_item("2024-03-01T10:00:00Z");
        item["metadata"].as_object_mut().unwrap().remove("managedFields");
        let err = parse_certificate_request(&item).unwrap_err();
        assert!(matches!(
            err,
            RecordParseError::Timestamp {
                source: TimestampFormatError::Missing,
                ..
            }
        ));
    }

    #[test]
    fn test_parse_order() {
        let item = json!({
            "metadata": {
                "name": "web-tls-abc12-1001",
                "namespace": "storefront",
                "annotations": { CERTIFICATE_NAME_ANNOTATION: "web-tls" }
            }
        });
        let order = parse_order(&item).unwrap();
        assert_eq!(order.name, "web-tls-abc12-1001");
        assert_eq!(order.certificate_name.as_deref(), Some("web-tls"));
    }

    #[test]
    fn test_parse_order_without_annotation() {
        let item = json!({
            "metadata": { "name": "orphan-order", "namespace": "storefront" }
        });
        let order = parse_order(&item).unwrap();
        assert!(order.certificate_name.is_none());
    }

    #[test]
    fn test_parse_rejects_missing_name() {
        let err = parse_order(&json!({ "metadata": { "namespace": "storefront" } })).unwrap_err();
        assert!(matches!(err, RecordParseError::MissingName));
    }
}
