//! Practice statistics over a small seeded practice.

use chrono::NaiveDate;
use clinic_records_core::db::Database;
use clinic_records_core::dto::{DiagnosisRecord, PersonRecord, RoleRecord, SickLeaveRecord};
use clinic_records_core::{Services, PATIENT_ROLE};

struct Practice {
    db: Database,
    house: String,
    wilson: String,
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn seed_practice() -> Practice {
    let db = Database::open_in_memory().unwrap();
    let s = Services::new(&db);
    s.roles().ensure_default_roles().unwrap();

    let mut house = PersonRecord::new("Gregory", "House");
    house.doctor_unique_id = Some("DOC-H".into());
    house.is_personal_doctor = Some(true);
    let house = s.persons().create_doctor(house).unwrap().id.unwrap();

    let mut wilson = PersonRecord::new("James", "Wilson");
    wilson.doctor_unique_id = Some("DOC-W".into());
    wilson.is_personal_doctor = Some(true);
    let wilson = s.persons().create_doctor(wilson).unwrap().id.unwrap();

    for (code, doctor) in [("PAT1", &house), ("PAT2", &house), ("PAT3", &wilson)] {
        let mut patient = PersonRecord::new("Pat", code);
        patient.roles = vec![RoleRecord::named(PATIENT_ROLE)];
        patient.patient_unique_id = Some(code.into());
        patient.insurance_paid_last_6_months = Some(code != "PAT3");
        patient.personal_doctor_id = Some(doctor.clone());
        s.persons().create_patient(patient).unwrap();
    }

    Practice { db, house, wilson }
}

fn leave(
    s: Services<'_>,
    patient_id: &str,
    doctor_id: &str,
    start: NaiveDate,
    end: NaiveDate,
    diagnosis_id: &str,
) {
    let mut record = SickLeaveRecord::new(start, end, patient_id, doctor_id);
    record.diagnosis_ids = Some([diagnosis_id.to_string()].into_iter().collect());
    s.sick_leaves().create(record).unwrap();
}

#[test]
fn test_most_common_diagnoses_ordering() {
    let practice = seed_practice();
    let s = Services::new(&practice.db);
    let patient = s.persons().get_patient_by_unique_id("PAT1").unwrap().id.unwrap();

    let d1 = s.diagnoses().create(DiagnosisRecord::new("D1", None)).unwrap().id.unwrap();
    let d2 = s.diagnoses().create(DiagnosisRecord::new("D2", None)).unwrap().id.unwrap();
    for day in [1, 10, 20] {
        leave(s, &patient, &practice.house, date(2025, 3, day), date(2025, 3, day), &d1);
    }
    leave(s, &patient, &practice.wilson, date(2025, 4, 1), date(2025, 4, 2), &d2);

    let ranking = s.reporting().most_common_diagnoses().unwrap();
    let summary: Vec<_> = ranking
        .iter()
        .map(|f| (f.diagnosis_name.as_str(), f.sick_leave_count))
        .collect();
    assert_eq!(summary, vec![("D1", 3), ("D2", 1)]);
}

#[test]
fn test_leave_rankings() {
    let practice = seed_practice();
    let s = Services::new(&practice.db);
    let patient = s.persons().get_patient_by_unique_id("PAT3").unwrap().id.unwrap();
    let flu = s.diagnoses().create(DiagnosisRecord::new("Influenza", None)).unwrap().id.unwrap();

    leave(s, &patient, &practice.wilson, date(2024, 11, 3), date(2024, 11, 5), &flu);
    leave(s, &patient, &practice.wilson, date(2025, 11, 8), date(2025, 11, 9), &flu);
    leave(s, &patient, &practice.house, date(2025, 1, 8), date(2025, 1, 9), &flu);

    let months = s.reporting().month_with_most_leaves().unwrap();
    assert_eq!((months[0].month, months[0].leave_count), (11, 2));
    assert_eq!(months[0].month_name(), Some("November"));

    let doctors = s.reporting().doctors_with_most_leaves().unwrap();
    assert_eq!(doctors[0].doctor.id, practice.wilson);
    assert_eq!(doctors[0].leave_count, 2);
}

#[test]
fn test_personal_doctor_counts() {
    let practice = seed_practice();
    let s = Services::new(&practice.db);

    assert_eq!(s.reporting().patient_count_for_doctor(&practice.house).unwrap(), 2);
    assert_eq!(s.reporting().patient_count_for_doctor(&practice.wilson).unwrap(), 1);

    let per_doctor = s.reporting().patients_per_doctor().unwrap();
    assert_eq!(per_doctor[0].doctor.id, practice.house);
    assert_eq!(per_doctor[0].patient_count, 2);
    assert_eq!(s.persons().list_insured_patients().unwrap().len(), 2);
}

#[test]
fn test_practice_report_json() {
    let practice = seed_practice();
    let s = Services::new(&practice.db);

    let report = s.reporting().practice_report().unwrap();
    assert_eq!(report.totals.doctors, 2);
    assert_eq!(report.totals.patients, 3);
    assert_eq!(report.totals.sick_leaves, 0);

    let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
    assert_eq!(json["totals"]["patients"], 3);
    assert!(json["generated_at"].is_string());
}
