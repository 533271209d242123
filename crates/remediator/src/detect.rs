//! Staleness filter and problem detector.

use chrono::{DateTime, Duration, Utc};

use crate::records::{CertificateRequestRecord, CONDITION_SUCCESS};

/// Requests younger than this may still be legitimately in flight; deleting
/// them would destroy healthy in-progress work.
pub const DEFAULT_MINIMUM_AGE_MINUTES: i64 = 60;

#[must_use]
pub fn default_minimum_age() -> Duration {
    Duration::minutes(DEFAULT_MINIMUM_AGE_MINUTES)
}

/// Health of a certificate request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestHealth {
    Ok,
    Problematic,
}

/// A record is old enough for remediation once `now - observed_at` reaches
/// `minimum_age`. Boundary inclusive.
#[must_use]
pub fn is_stale(observed_at: DateTime<Utc>, now: DateTime<Utc>, minimum_age: Duration) -> bool {
    now - observed_at >= minimum_age
}

/// OK if and only if a condition is present and its status is exactly the
/// success literal. No status at all, a failed condition, and any other
/// literal are all problematic.
#[must_use]
pub fn classify(record: &CertificateRequestRecord) -> RequestHealth {
    match &record.condition {
        Some(cond) if cond.status == CONDITION_SUCCESS => RequestHealth::Ok,
        _ => RequestHealth::Problematic,
    }
}
