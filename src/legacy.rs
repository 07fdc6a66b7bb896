// Legacy snapshot migration
//
// The first version of the app stored a bare JSON array of students, with
// Spanish field names and display strings as enum values, and no ids.
// `migrate` maps that layout onto schema version 1.

use log::warn;
use serde::Deserialize;
use serde_json::Value;

use crate::entities::{
    parse_date, ActiveStatus, Attendance, BillingMode, ClassEntry, ClassEntryId, HomeworkDone,
    PaymentRecord, PaymentStatus, Student, StudentId,
};
use crate::error::StoreError;

#[derive(Debug, Deserialize)]
struct LegacyStudent {
    #[serde(rename = "nombre")]
    name: String,
    #[serde(rename = "correo", default)]
    email: String,
    #[serde(rename = "telefono", default)]
    phone: String,
    #[serde(rename = "modalidad")]
    billing_mode: LegacyBillingMode,
    #[serde(rename = "fechaInicio")]
    start_date: String,
    #[serde(rename = "estado", default = "legacy_active")]
    status: LegacyStatus,
    #[serde(rename = "clases", default)]
    classes: Vec<LegacyClass>,
    #[serde(rename = "pagos")]
    payments: Option<LegacyPayments>,
}

#[derive(Debug, Deserialize)]
struct LegacyClass {
    #[serde(rename = "fecha", default)]
    date: String,
    #[serde(rename = "asistencia")]
    attendance: LegacyAttendance,
    #[serde(rename = "tareaRealizada")]
    homework_done: LegacyHomework,
    #[serde(rename = "tarea", default)]
    next_assignment: String,
    #[serde(rename = "observacion", default)]
    notes: String,
}

#[derive(Debug, Deserialize)]
struct LegacyPayments {
    #[serde(rename = "modalidad")]
    billing_mode: LegacyBillingMode,
    #[serde(rename = "estado", default)]
    statuses: Vec<LegacyPaymentStatus>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
enum LegacyBillingMode {
    #[serde(rename = "Mensual")]
    Monthly,
    #[serde(rename = "Bimestral")]
    Bimonthly,
    #[serde(rename = "Pago completo")]
    PaidInFull,
}

#[derive(Debug, Clone, Copy, Deserialize)]
enum LegacyStatus {
    #[serde(rename = "Activo")]
    Active,
    #[serde(rename = "Inactivo")]
    Inactive,
}

#[derive(Debug, Clone, Copy, Deserialize)]
enum LegacyAttendance {
    #[serde(rename = "Clase tomada")]
    Taken,
    #[serde(rename = "Clase no tomada")]
    NotTaken,
}

#[derive(Debug, Clone, Copy, Deserialize)]
enum LegacyHomework {
    #[serde(rename = "Sí")]
    Yes,
    #[serde(rename = "No")]
    No,
}

#[derive(Debug, Clone, Copy, Deserialize)]
enum LegacyPaymentStatus {
    #[serde(rename = "PENDIENTE")]
    Pending,
    #[serde(rename = "PAGADO")]
    Paid,
}

fn legacy_active() -> LegacyStatus {
    LegacyStatus::Active
}

impl From<LegacyBillingMode> for BillingMode {
    fn from(mode: LegacyBillingMode) -> Self {
        match mode {
            LegacyBillingMode::Monthly => BillingMode::Monthly,
            LegacyBillingMode::Bimonthly => BillingMode::Bimonthly,
            LegacyBillingMode::PaidInFull => BillingMode::PaidInFull,
        }
    }
}

/// Convert an unversioned snapshot (a JSON array) into current students
pub fn migrate(value: Value) -> Result<Vec<Student>, StoreError> {
    let legacy: Vec<LegacyStudent> = serde_json::from_value(value)?;
    legacy.into_iter().map(migrate_student).collect()
}

fn migrate_student(legacy: LegacyStudent) -> Result<Student, StoreError> {
    let start_date = parse_date(&legacy.start_date).ok_or_else(|| {
        StoreError::Corrupt(format!(
            "student {:?} has unparseable start date {:?}",
            legacy.name, legacy.start_date
        ))
    })?;
    let billing_mode = BillingMode::from(legacy.billing_mode);

    let class_log = legacy
        .classes
        .into_iter()
        .map(|class| {
            let date = parse_date(&class.date).unwrap_or_else(|| {
                warn!(
                    "Class of {} has date {:?}; using start date {}",
                    legacy.name, class.date, start_date
                );
                start_date
            });
            ClassEntry {
                id: ClassEntryId::new(),
                date,
                attendance: match class.attendance {
                    LegacyAttendance::Taken => Attendance::Taken,
                    LegacyAttendance::NotTaken => Attendance::NotTaken,
                },
                homework_done: match class.homework_done {
                    LegacyHomework::Yes => HomeworkDone::Yes,
                    LegacyHomework::No => HomeworkDone::No,
                },
                next_assignment: class.next_assignment,
                notes: class.notes,
            }
        })
        .collect();

    let payment = match legacy.payments {
        Some(payments) => PaymentRecord {
            billing_mode: payments.billing_mode.into(),
            statuses: payments
                .statuses
                .into_iter()
                .map(|status| match status {
                    LegacyPaymentStatus::Pending => PaymentStatus::Pending,
                    LegacyPaymentStatus::Paid => PaymentStatus::Paid,
                })
                .collect(),
        },
        None => PaymentRecord::seeded(billing_mode),
    };
    if payment.billing_mode != billing_mode {
        warn!(
            "Student {} is {} but was billed {}; payments follow {}",
            legacy.name, billing_mode, payment.billing_mode, payment.billing_mode
        );
    }

    Ok(Student {
        id: StudentId::new(),
        name: legacy.name,
        email: legacy.email,
        phone: legacy.phone,
        billing_mode,
        start_date,
        status: match legacy.status {
            LegacyStatus::Active => ActiveStatus::Active,
            LegacyStatus::Inactive => ActiveStatus::Inactive,
        },
        class_log,
        payment,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{decode, SnapshotOrigin};
    use chrono::NaiveDate;

    const LEGACY: &str = r#"[
      {
        "nombre": "Elena González",
        "correo": "elena.gonzalez@example.com",
        "telefono": "987-654-3210",
        "modalidad": "Mensual",
        "fechaInicio": "2024-07-01",
        "estado": "Activo",
        "clases": [
          {"fecha": "2024-07-01", "asistencia": "Clase tomada", "tareaRealizada": "Sí",
           "tarea": "Escala de Do", "observacion": "Bien hecha"},
          {"fecha": "", "asistencia": "Clase no tomada", "tareaRealizada": "No",
           "tarea": "Lectura musical", "observacion": ""}
        ],
        "pagos": {"modalidad": "Mensual", "estado": ["PAGADO", "PENDIENTE", "PENDIENTE", "PENDIENTE"]}
      },
      {
        "nombre": "Luis",
        "correo": "",
        "telefono": "",
        "modalidad": "Pago completo",
        "fechaInicio": "2024-09-02",
        "estado": "Inactivo",
        "clases": [],
        "pagos": {"modalidad": "Pago completo", "estado": ["PENDIENTE"]}
      }
    ]"#;

    #[test]
    fn test_legacy_snapshot_decodes() {
        let decoded = decode(LEGACY).unwrap();
        assert_eq!(decoded.origin, SnapshotOrigin::Legacy);

        let students = decoded.students;
        assert_eq!(students.len(), 2);

        let elena = &students[0];
        assert_eq!(elena.name, "Elena González");
        assert_eq!(elena.billing_mode, BillingMode::Monthly);
        assert_eq!(elena.class_log.len(), 2);
        assert_eq!(elena.class_log[0].attendance, Attendance::Taken);
        assert_eq!(elena.class_log[0].homework_done, HomeworkDone::Yes);
        assert_eq!(elena.class_log[0].next_assignment, "Escala de Do");
        assert_eq!(elena.payment.statuses[0], PaymentStatus::Paid);
        assert_eq!(elena.payment.paid_count(), 1);

        let luis = &students[1];
        assert_eq!(luis.status, ActiveStatus::Inactive);
        assert_eq!(luis.payment.billing_mode, BillingMode::PaidInFull);
        assert_ne!(elena.id, luis.id);
    }

    #[test]
    fn test_blank_class_date_falls_back_to_start() {
        let students = decode(LEGACY).unwrap().students;
        assert_eq!(
            students[0].class_log[1].date,
            NaiveDate::from_ymd_opt(2024, 7, 1).unwrap()
        );
    }

    #[test]
    fn test_bad_start_date_is_corrupt() {
        let raw = r#"[{"nombre": "X", "modalidad": "Mensual", "fechaInicio": ""}]"#;
        assert!(matches!(decode(raw), Err(StoreError::Corrupt(_))));
    }

    #[test]
    fn test_payment_mode_wins_on_disagreement() {
        let raw = r#"[{"nombre": "X", "modalidad": "Mensual", "fechaInicio": "2024-02-01",
                      "pagos": {"modalidad": "Bimestral", "estado": ["PAGADO", "PENDIENTE"]}}]"#;
        let student = &decode(raw).unwrap().students[0];
        assert_eq!(student.billing_mode, BillingMode::Monthly);
        assert_eq!(student.payment.billing_mode, BillingMode::Bimonthly);

        let rows = crate::payments::payment_rows(student, crate::schedule::MonthRollover::Overflow)
            .unwrap();
        let dues: Vec<_> = rows.iter().map(|r| r.due).collect();
        assert_eq!(
            dues,
            vec![
                NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 4, 1).unwrap()
            ]
        );
        assert_eq!(rows[0].status, PaymentStatus::Paid);
    }

    #[test]
    fn test_missing_payments_are_seeded() {
        let raw = r#"[{"nombre": "X", "modalidad": "Bimestral", "fechaInicio": "2024-02-01"}]"#;
        let students = decode(raw).unwrap().students;
        assert_eq!(students[0].payment.statuses.len(), 2);
        assert!(students[0].class_log.is_empty());
        assert_eq!(students[0].status, ActiveStatus::Active);
    }
}
