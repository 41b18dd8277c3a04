use rusqlite::Connection;

use crate::error::Result;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schedules (
            id                TEXT PRIMARY KEY,
            user_id           TEXT NOT NULL,
            name              TEXT NOT NULL,
            dosage            TEXT NOT NULL DEFAULT '',
            start_time        TEXT NOT NULL,
            interval_count    INTEGER NOT NULL CHECK (interval_count >= 1),
            interval_unit     TEXT NOT NULL,
            window_start_date TEXT,
            window_end_date   TEXT,
            package_size      INTEGER,
            reorder_lead_days INTEGER,
            initial_quantity  INTEGER,
            current_quantity  INTEGER CHECK (current_quantity IS NULL OR current_quantity >= 0),
            reorder_threshold INTEGER,
            reorder_date      TEXT,
            active            INTEGER NOT NULL DEFAULT 1,
            created_at        TEXT NOT NULL,
            updated_at        TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_schedules_user ON schedules(user_id, active);

        CREATE TABLE IF NOT EXISTS dose_events (
            id           TEXT PRIMARY KEY,
            schedule_id  TEXT NOT NULL,
            user_id      TEXT NOT NULL,
            scheduled_at INTEGER NOT NULL,
            status       TEXT NOT NULL DEFAULT 'pending',
            completed_at TEXT,
            UNIQUE (schedule_id, scheduled_at)
        );
        CREATE INDEX IF NOT EXISTS idx_dose_events_user_ts ON dose_events(user_id, scheduled_at);
        CREATE INDEX IF NOT EXISTS idx_dose_events_status ON dose_events(schedule_id, status);

        CREATE TABLE IF NOT EXISTS caregiver_links (
            id           TEXT PRIMARY KEY,
            caregiver_id TEXT NOT NULL,
            patient_id   TEXT NOT NULL,
            linked_at    TEXT NOT NULL,
            UNIQUE (caregiver_id, patient_id)
        );",
    )?;
    Ok(())
}
