// Roster snapshot codec
//
// Current layout: {"schema_version": 1, "students": [...]}.
// The unversioned layout written by the first version of the app (a bare JSON array of
// students) is migrated on decode, see `legacy`.

use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entities::Student;
use crate::error::StoreError;
use crate::legacy;

pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Serialize)]
struct SnapshotRef<'a> {
    schema_version: u32,
    students: &'a [Student],
}

#[derive(Debug, Deserialize)]
struct SnapshotV1 {
    students: Vec<Student>,
}

/// Where a decoded roster came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotOrigin {
    Current,
    /// Migrated from the unversioned layout; should be re-saved
    Legacy,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Decoded {
    pub students: Vec<Student>,
    pub origin: SnapshotOrigin,
}

pub fn encode(students: &[Student]) -> Result<String, StoreError> {
    let snapshot = SnapshotRef {
        schema_version: SCHEMA_VERSION,
        students,
    };
    Ok(serde_json::to_string(&snapshot)?)
}

pub fn decode(raw: &str) -> Result<Decoded, StoreError> {
    let value: Value = serde_json::from_str(raw)?;

    match value {
        Value::Array(_) => {
            let students = legacy::migrate(value)?;
            info!("Migrated {} students from unversioned snapshot", students.len());
            Ok(Decoded {
                students,
                origin: SnapshotOrigin::Legacy,
            })
        }
        Value::Object(ref map) => {
            let version = map
                .get("schema_version")
                .and_then(Value::as_u64)
                .ok_or_else(|| StoreError::Corrupt("missing schema_version".to_string()))?;
            let version = u32::try_from(version)
                .map_err(|_| StoreError::UnsupportedVersion(u32::MAX))?;

            match version {
                1 => {
                    let snapshot: SnapshotV1 = serde_json::from_value(value)?;
                    warn_misaligned(&snapshot.students);
                    Ok(Decoded {
                        students: snapshot.students,
                        origin: SnapshotOrigin::Current,
                    })
                }
                other => Err(StoreError::UnsupportedVersion(other)),
            }
        }
        _ => Err(StoreError::Corrupt(
            "snapshot is neither an object nor an array".to_string(),
        )),
    }
}

fn warn_misaligned(students: &[Student]) {
    for student in students.iter().filter(|s| !s.payment.is_aligned()) {
        warn!(
            "Payment record of {} ({}) has {} slots but {} schedules {}",
            student.name,
            student.id,
            student.payment.statuses.len(),
            student.payment.billing_mode,
            student.payment.billing_mode.installments()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{BillingMode, StudentDraft};
    use pretty_assertions::assert_eq;

    fn sample() -> Vec<Student> {
        let mut ana = Student::from_draft(&StudentDraft::new("Ana", BillingMode::Bimonthly, "2024-01-10"))
            .unwrap();
        ana.payment.mark_paid(0);
        vec![Student::seed(), ana]
    }

    #[test]
    fn test_roundtrip_is_structurally_equal() {
        let students = sample();
        let raw = encode(&students).unwrap();
        let decoded = decode(&raw).unwrap();

        assert_eq!(decoded.origin, SnapshotOrigin::Current);
        assert_eq!(decoded.students, students);
    }

    #[test]
    fn test_encoded_snapshot_carries_version() {
        let raw = encode(&sample()).unwrap();
        let value: Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["schema_version"], 1);
        assert_eq!(value["students"][1]["name"], "Ana");
        assert_eq!(value["students"][1]["payment"]["statuses"][0], "Paid");
    }

    #[test]
    fn test_future_version_rejected() {
        let err = decode(r#"{"schema_version": 7, "students": []}"#).unwrap_err();
        assert!(matches!(err, StoreError::UnsupportedVersion(7)));
    }

    #[test]
    fn test_missing_version_is_corrupt() {
        let err = decode(r#"{"students": []}"#).unwrap_err();
        assert!(matches!(err, StoreError::Corrupt(_)));
    }

    #[test]
    fn test_garbage_is_a_serde_error() {
        assert!(matches!(decode("not json"), Err(StoreError::Serde(_))));
        assert!(matches!(decode("42"), Err(StoreError::Corrupt(_))));
    }
}
