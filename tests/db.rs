mod common;

use chrono::{Duration, TimeZone, Utc};
use doseplan::Error;
use doseplan::models::{CaregiverLink, DoseEvent, DoseStatus, IntervalUnit, MedicationSchedule};

use common::{date, local, time};

fn full_schedule() -> MedicationSchedule {
    let created = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
    let mut s = MedicationSchedule::new("me", "Losartan", time(8, 30), 2, IntervalUnit::Weeks, created);
    s.dosage = "50mg".into();
    s.window_start_date = Some(date(2024, 1, 1));
    s.window_end_date = Some(date(2024, 6, 30));
    s.package_size = Some(30);
    s.reorder_lead_days = Some(5);
    s.initial_quantity = Some(30);
    s.current_quantity = Some(12);
    s.reorder_threshold = Some(4);
    s.reorder_date = Some(date(2025, 2, 15));
    s
}

// ---------------------------------------------------------------------------
// Schedules
// ---------------------------------------------------------------------------

#[test]
fn schedule_fields_survive_storage() {
    let (_dir, db) = common::setup_db();
    let s = full_schedule();
    db.insert_schedule(&s).unwrap();

    let got = db.get_schedule(&s.id).unwrap().unwrap();

    assert_eq!(got, s);
}

#[test]
fn unknown_schedule_is_none() {
    let (_dir, db) = common::setup_db();
    assert!(db.get_schedule("nope").unwrap().is_none());
    assert!(!db.set_current_quantity("nope", Some(1)).unwrap());
    assert!(!db.delete_schedule_row("nope").unwrap());
}

#[test]
fn list_is_per_user_and_sorted() {
    let (_dir, db) = common::setup_db();
    let now = Utc::now();
    for (user, name) in [("me", "Zinc"), ("me", "Aspirin"), ("you", "Iron")] {
        let s = MedicationSchedule::new(user, name, time(8, 0), 1, IntervalUnit::Days, now);
        db.insert_schedule(&s).unwrap();
    }

    let names: Vec<_> = db
        .list_schedules("me", false)
        .unwrap()
        .into_iter()
        .map(|s| s.name)
        .collect();

    assert_eq!(names, vec!["Aspirin", "Zinc"]);
}

#[test]
fn duplicate_schedule_id_is_conflict() {
    let (_dir, db) = common::setup_db();
    let s = full_schedule();
    db.insert_schedule(&s).unwrap();
    let err = db.insert_schedule(&s).unwrap_err();
    assert!(matches!(err, Error::Conflict(_)));
}

// ---------------------------------------------------------------------------
// Dose events
// ---------------------------------------------------------------------------

#[test]
fn same_slot_is_stored_once() {
    let (_dir, db) = common::setup_db();
    let at = local(2024, 3, 10, 8, 0);
    let a = DoseEvent::pending("s1", "me", at);
    let b = DoseEvent::pending("s1", "me", at);
    let other = DoseEvent::pending("s2", "me", at);

    assert_eq!(db.insert_dose_events(&[a.clone(), b, other]).unwrap(), 2);

    let stored = db.events_for_schedule("s1").unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].id, a.id);
}

#[test]
fn transition_is_conditional() {
    let (_dir, db) = common::setup_db();
    let e = DoseEvent::pending("s1", "me", local(2024, 3, 10, 8, 0));
    db.insert_dose_events(std::slice::from_ref(&e)).unwrap();
    let done = local(2024, 3, 10, 8, 3);

    assert!(db
        .transition_dose(&e.id, DoseStatus::Pending, DoseStatus::Taken, done)
        .unwrap());
    assert!(!db
        .transition_dose(&e.id, DoseStatus::Pending, DoseStatus::Skipped, done)
        .unwrap());

    let got = db.get_dose_event(&e.id).unwrap().unwrap();
    assert_eq!(got.status, DoseStatus::Taken);
    assert_eq!(got.completed_at, Some(done));
}

#[test]
fn range_query_is_half_open() {
    let (_dir, db) = common::setup_db();
    let start = local(2024, 3, 10, 0, 0);
    let events: Vec<_> = (0..4)
        .map(|i| DoseEvent::pending("s1", "me", start + Duration::hours(6 * i)))
        .collect();
    db.insert_dose_events(&events).unwrap();

    let got = db
        .events_for_user_between("me", start, start + Duration::hours(18))
        .unwrap();

    assert_eq!(got.len(), 3);
    assert_eq!(got[0].scheduled_at, start);
}

#[test]
fn pending_delete_spares_resolved() {
    let (_dir, db) = common::setup_db();
    let start = local(2024, 3, 10, 0, 0);
    let events: Vec<_> = (0..3)
        .map(|i| DoseEvent::pending("s1", "me", start + Duration::hours(8 * i)))
        .collect();
    db.insert_dose_events(&events).unwrap();
    db.transition_dose(&events[0].id, DoseStatus::Pending, DoseStatus::Skipped, start)
        .unwrap();

    assert_eq!(db.delete_pending_for_schedule("s1").unwrap(), 2);
    let left = db.events_for_schedule("s1").unwrap();
    assert_eq!(left.len(), 1);
    assert_eq!(left[0].status, DoseStatus::Skipped);
}

#[test]
fn failed_transaction_rolls_back() {
    let (_dir, db) = common::setup_db();
    let e = DoseEvent::pending("s1", "me", local(2024, 3, 10, 8, 0));

    let result: doseplan::Result<()> = db.in_transaction(|db| {
        db.insert_dose_events(std::slice::from_ref(&e))?;
        Err(Error::invalid("abort"))
    });

    assert!(result.is_err());
    assert!(db.get_dose_event(&e.id).unwrap().is_none());
}

// ---------------------------------------------------------------------------
// Caregiver links
// ---------------------------------------------------------------------------

#[test]
fn caregiver_link_is_unique_per_pair() {
    let (_dir, db) = common::setup_db();
    let at = Utc::now();
    db.insert_caregiver_link(&CaregiverLink::new("nurse", "patient", at))
        .unwrap();

    let err = db
        .insert_caregiver_link(&CaregiverLink::new("nurse", "patient", at))
        .unwrap_err();

    assert!(matches!(err, Error::Conflict(_)));
    assert!(db.is_caregiver_of("nurse", "patient").unwrap());
    assert!(!db.is_caregiver_of("patient", "nurse").unwrap());
    assert_eq!(db.caregiver_links_for("patient").unwrap().len(), 1);
}
