mod common;

use doseplan::Error;
use doseplan::core::access;
use doseplan::core::dose;
use doseplan::core::Settings;
use doseplan::core::schedule::{self, GenerationReport, Regeneration};
use doseplan::core::signal::CollectingNotifier;
use doseplan::models::config::EditPolicy;
use doseplan::models::{DoseStatus, SchedulePatch};

use common::{clock_at, date, draft, local, settings, stocked_draft, time};

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

#[test]
fn create_saves_and_generates() {
    let (_dir, db) = common::setup_db();
    let clock = clock_at(2024, 3, 10, 9, 0);

    let outcome = schedule::create_schedule(
        &db,
        &clock,
        &settings(),
        "me",
        draft("me", "Amoxicillin", 8, time(8, 0), date(2024, 3, 10)),
    )
    .unwrap();

    assert_eq!(
        outcome.generation,
        GenerationReport::Generated(Regeneration {
            removed: 0,
            inserted: 270,
            skipped: 0,
        })
    );
    let stored = schedule::get_schedule(&db, &outcome.schedule.id).unwrap();
    assert_eq!(stored.name, "Amoxicillin");
    assert_eq!(stored.start_time, time(8, 0));

    let events = db.events_for_schedule(&stored.id).unwrap();
    assert_eq!(events.len(), 270);
    assert_eq!(events[0].scheduled_at, local(2024, 3, 10, 16, 0));
}

#[test]
fn create_predicts_reorder_date() {
    let (_dir, db) = common::setup_db();
    let clock = clock_at(2024, 1, 1, 7, 0);

    let outcome = schedule::create_schedule(
        &db,
        &clock,
        &settings(),
        "me",
        stocked_draft("me", "Losartan", 8, time(8, 0), date(2024, 1, 1), 30, 5),
    )
    .unwrap();

    // 30 units every 8h last 10 days, minus 2 days lead
    assert_eq!(outcome.schedule.reorder_date, Some(date(2024, 1, 9)));
    assert_eq!(outcome.schedule.current_quantity, Some(30));
    let stored = schedule::get_schedule(&db, &outcome.schedule.id).unwrap();
    assert_eq!(stored.reorder_date, Some(date(2024, 1, 9)));
}

#[test]
fn invalid_draft_writes_nothing() {
    let (_dir, db) = common::setup_db();
    let clock = clock_at(2024, 3, 10, 9, 0);
    let mut d = draft("me", "Amoxicillin", 8, time(8, 0), date(2024, 3, 10));
    d.interval_count = 0;

    let err = schedule::create_schedule(&db, &clock, &settings(), "me", d).unwrap_err();

    assert!(matches!(err, Error::InvalidInput(_)));
    assert!(schedule::list_schedules(&db, "me", true).unwrap().is_empty());
}

#[test]
fn failed_generation_keeps_schedule_for_retry() {
    let (_dir, db) = common::setup_db();
    let clock = clock_at(2024, 3, 10, 9, 0);
    let overflowing = Settings {
        horizon_days: u32::MAX,
        ..settings()
    };

    let outcome = schedule::create_schedule(
        &db,
        &clock,
        &overflowing,
        "me",
        draft("me", "Amoxicillin", 8, time(8, 0), date(2024, 3, 10)),
    )
    .unwrap();

    assert!(matches!(outcome.generation, GenerationReport::Failed { .. }));
    let id = outcome.schedule.id;
    assert_eq!(schedule::get_schedule(&db, &id).unwrap().name, "Amoxicillin");
    assert!(db.events_for_schedule(&id).unwrap().is_empty());

    let regen = schedule::regenerate(&db, &clock, &settings(), "me", &id).unwrap();
    assert_eq!(
        regen,
        Regeneration {
            removed: 0,
            inserted: 270,
            skipped: 0,
        }
    );
    assert_eq!(db.events_for_schedule(&id).unwrap().len(), 270);
}

#[test]
fn caregiver_needs_a_link() {
    let (_dir, db) = common::setup_db();
    let clock = clock_at(2024, 3, 10, 9, 0);
    let d = || draft("patient", "Metformin", 12, time(8, 0), date(2024, 3, 10));

    let err = schedule::create_schedule(&db, &clock, &settings(), "nurse", d()).unwrap_err();
    assert!(matches!(err, Error::Unauthorized(_)));

    access::link_caregiver(&db, &clock, "nurse", "patient").unwrap();
    let outcome = schedule::create_schedule(&db, &clock, &settings(), "nurse", d()).unwrap();
    assert_eq!(outcome.schedule.user_id, "patient");
}

// ---------------------------------------------------------------------------
// Regenerate
// ---------------------------------------------------------------------------

#[test]
fn regenerate_is_idempotent() {
    let (_dir, db) = common::setup_db();
    let clock = clock_at(2024, 3, 10, 9, 0);
    let s = schedule::create_schedule(
        &db,
        &clock,
        &settings(),
        "me",
        draft("me", "Amoxicillin", 8, time(8, 0), date(2024, 3, 10)),
    )
    .unwrap()
    .schedule;

    let regen = schedule::regenerate(&db, &clock, &settings(), "me", &s.id).unwrap();

    assert_eq!(regen.removed, 270);
    assert_eq!(regen.inserted, 270);
    assert_eq!(db.events_for_schedule(&s.id).unwrap().len(), 270);
}

#[test]
fn taken_dose_never_returns_as_pending() {
    let (_dir, db) = common::setup_db();
    let clock = clock_at(2024, 3, 10, 9, 0);
    let s = schedule::create_schedule(
        &db,
        &clock,
        &settings(),
        "me",
        draft("me", "Amoxicillin", 8, time(8, 0), date(2024, 3, 10)),
    )
    .unwrap()
    .schedule;
    let first = db.events_for_schedule(&s.id).unwrap().remove(0);
    dose::confirm_dose(&db, &clock, &CollectingNotifier::default(), "me", &first.id).unwrap();

    let regen = schedule::regenerate(&db, &clock, &settings(), "me", &s.id).unwrap();

    assert_eq!(regen.skipped, 1);
    let events = db.events_for_schedule(&s.id).unwrap();
    assert_eq!(events.len(), 270);
    let at_slot: Vec<_> = events
        .iter()
        .filter(|e| e.scheduled_at == first.scheduled_at)
        .collect();
    assert_eq!(at_slot.len(), 1);
    assert_eq!(at_slot[0].id, first.id);
    assert_eq!(at_slot[0].status, DoseStatus::Taken);
}

// ---------------------------------------------------------------------------
// Edit
// ---------------------------------------------------------------------------

fn seeded(db: &doseplan::db::Database) -> doseplan::models::MedicationSchedule {
    schedule::create_schedule(
        db,
        &clock_at(2024, 3, 10, 9, 0),
        &settings(),
        "me",
        draft("me", "Amoxicillin", 8, time(8, 0), date(2024, 3, 10)),
    )
    .unwrap()
    .schedule
}

#[test]
fn edit_regenerates_from_now() {
    let (_dir, db) = common::setup_db();
    let s = seeded(&db);
    let patch = SchedulePatch {
        start_time: Some(time(10, 0)),
        ..Default::default()
    };

    let outcome = schedule::edit_schedule(
        &db,
        &clock_at(2024, 3, 10, 9, 30),
        &settings(),
        "me",
        &s.id,
        patch,
        EditPolicy::RegenerateFromNow,
    )
    .unwrap();

    assert!(matches!(outcome.generation, GenerationReport::Generated(_)));
    let events = db.events_for_schedule(&s.id).unwrap();
    assert_eq!(events[0].scheduled_at, local(2024, 3, 10, 10, 0));
    assert_eq!(events[1].scheduled_at, local(2024, 3, 10, 18, 0));
    assert!(
        events
            .iter()
            .all(|e| e.scheduled_at != local(2024, 3, 10, 16, 0))
    );
}

#[test]
fn edit_can_keep_existing_events() {
    let (_dir, db) = common::setup_db();
    let s = seeded(&db);
    let patch = SchedulePatch {
        start_time: Some(time(10, 0)),
        dosage: Some("250mg".into()),
        ..Default::default()
    };

    let outcome = schedule::edit_schedule(
        &db,
        &clock_at(2024, 3, 10, 9, 30),
        &settings(),
        "me",
        &s.id,
        patch,
        EditPolicy::KeepExisting,
    )
    .unwrap();

    assert_eq!(outcome.generation, GenerationReport::Kept);
    assert_eq!(outcome.schedule.dosage, "250mg");
    let events = db.events_for_schedule(&s.id).unwrap();
    assert_eq!(events[0].scheduled_at, local(2024, 3, 10, 16, 0));
}

#[test]
fn edit_corrects_stock_count() {
    let (_dir, db) = common::setup_db();
    let clock = clock_at(2024, 1, 1, 7, 0);
    let s = schedule::create_schedule(
        &db,
        &clock,
        &settings(),
        "me",
        stocked_draft("me", "Losartan", 8, time(8, 0), date(2024, 1, 1), 30, 5),
    )
    .unwrap()
    .schedule;
    let before = db.events_for_schedule(&s.id).unwrap().len();
    let patch = SchedulePatch {
        current_quantity: Some(Some(12)),
        ..Default::default()
    };

    let outcome = schedule::edit_schedule(
        &db,
        &clock,
        &settings(),
        "me",
        &s.id,
        patch,
        EditPolicy::KeepExisting,
    )
    .unwrap();

    assert_eq!(outcome.schedule.current_quantity, Some(12));
    let stored = schedule::get_schedule(&db, &s.id).unwrap();
    assert_eq!(stored.current_quantity, Some(12));
    // reorder date follows package size, not the count on hand
    assert_eq!(stored.reorder_date, Some(date(2024, 1, 9)));
    assert_eq!(db.events_for_schedule(&s.id).unwrap().len(), before);
}

#[test]
fn deactivating_clears_pending_doses() {
    let (_dir, db) = common::setup_db();
    let s = seeded(&db);
    let patch = SchedulePatch {
        active: Some(false),
        ..Default::default()
    };

    schedule::edit_schedule(
        &db,
        &clock_at(2024, 3, 10, 9, 30),
        &settings(),
        "me",
        &s.id,
        patch,
        EditPolicy::RegenerateFromNow,
    )
    .unwrap();

    assert!(db.events_for_schedule(&s.id).unwrap().is_empty());
    assert!(schedule::list_schedules(&db, "me", false).unwrap().is_empty());
    assert_eq!(schedule::list_schedules(&db, "me", true).unwrap().len(), 1);
}

#[test]
fn edit_unknown_schedule_is_not_found() {
    let (_dir, db) = common::setup_db();
    let err = schedule::edit_schedule(
        &db,
        &clock_at(2024, 3, 10, 9, 30),
        &settings(),
        "me",
        "missing",
        SchedulePatch::default(),
        EditPolicy::RegenerateFromNow,
    )
    .unwrap_err();
    assert!(matches!(err, Error::NotFound { .. }));
}

// ---------------------------------------------------------------------------
// Delete / restock
// ---------------------------------------------------------------------------

#[test]
fn delete_cascades_to_events() {
    let (_dir, db) = common::setup_db();
    let s = seeded(&db);

    let removed = schedule::delete_schedule(&db, "me", &s.id).unwrap();

    assert_eq!(removed, 270);
    assert!(db.events_for_schedule(&s.id).unwrap().is_empty());
    assert!(matches!(
        schedule::get_schedule(&db, &s.id),
        Err(Error::NotFound { .. })
    ));
}

#[test]
fn delete_by_stranger_is_unauthorized() {
    let (_dir, db) = common::setup_db();
    let s = seeded(&db);
    let err = schedule::delete_schedule(&db, "someone-else", &s.id).unwrap_err();
    assert!(matches!(err, Error::Unauthorized(_)));
    assert_eq!(db.events_for_schedule(&s.id).unwrap().len(), 270);
}

#[test]
fn restock_defaults_to_one_package() {
    let (_dir, db) = common::setup_db();
    let s = schedule::create_schedule(
        &db,
        &clock_at(2024, 1, 1, 7, 0),
        &settings(),
        "me",
        stocked_draft("me", "Losartan", 24, time(8, 0), date(2024, 1, 1), 5, 3),
    )
    .unwrap()
    .schedule;

    let after = schedule::restock(&db, "me", &s.id, None).unwrap();
    assert_eq!(after.current_quantity, Some(35));

    let after = schedule::restock(&db, "me", &s.id, Some(10)).unwrap();
    assert_eq!(after.current_quantity, Some(45));
    assert_eq!(
        schedule::get_schedule(&db, &s.id).unwrap().current_quantity,
        Some(45)
    );
}

#[test]
fn restock_without_package_size_needs_units() {
    let (_dir, db) = common::setup_db();
    let s = seeded(&db);
    let err = schedule::restock(&db, "me", &s.id, None).unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)));
}
