use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rusqlite::params;

use crate::error::Result;
use crate::models::{IntervalUnit, MedicationSchedule};

use super::{Database, corrupt};

const DATE_FMT: &str = "%Y-%m-%d";
const TIME_FMT: &str = "%H:%M";

struct ScheduleRow {
    id: String,
    user_id: String,
    name: String,
    dosage: String,
    start_time: String,
    interval_count: u32,
    interval_unit: String,
    window_start_date: Option<String>,
    window_end_date: Option<String>,
    package_size: Option<u32>,
    reorder_lead_days: Option<u32>,
    initial_quantity: Option<u32>,
    current_quantity: Option<u32>,
    reorder_threshold: Option<u32>,
    reorder_date: Option<String>,
    active: bool,
    created_at: String,
    updated_at: String,
}

fn parse_date(column: &str, s: Option<String>) -> Result<Option<NaiveDate>> {
    match s {
        Some(ref v) => NaiveDate::parse_from_str(v, DATE_FMT)
            .map(Some)
            .map_err(|_| corrupt(column, v)),
        None => Ok(None),
    }
}

fn parse_ts(column: &str, s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|_| corrupt(column, s))
}

fn row_to_schedule(r: ScheduleRow) -> Result<MedicationSchedule> {
    let start_time = NaiveTime::parse_from_str(&r.start_time, TIME_FMT)
        .map_err(|_| corrupt("start_time", &r.start_time))?;
    let interval_unit: IntervalUnit = r
        .interval_unit
        .parse()
        .map_err(|_| corrupt("interval_unit", &r.interval_unit))?;

    Ok(MedicationSchedule {
        id: r.id,
        user_id: r.user_id,
        name: r.name,
        dosage: r.dosage,
        start_time,
        interval_count: r.interval_count,
        interval_unit,
        window_start_date: parse_date("window_start_date", r.window_start_date)?,
        window_end_date: parse_date("window_end_date", r.window_end_date)?,
        package_size: r.package_size,
        reorder_lead_days: r.reorder_lead_days,
        initial_quantity: r.initial_quantity,
        current_quantity: r.current_quantity,
        reorder_threshold: r.reorder_threshold,
        reorder_date: parse_date("reorder_date", r.reorder_date)?,
        active: r.active,
        created_at: parse_ts("created_at", &r.created_at)?,
        updated_at: parse_ts("updated_at", &r.updated_at)?,
    })
}

fn fmt_date(d: Option<NaiveDate>) -> Option<String> {
    d.map(|d| d.format(DATE_FMT).to_string())
}

const SELECT_COLS: &str = "id, user_id, name, dosage, start_time, interval_count, interval_unit, window_start_date, window_end_date, package_size, reorder_lead_days, initial_quantity, current_quantity, reorder_threshold, reorder_date, active, created_at, updated_at";

macro_rules! map_row {
    ($row:expr) => {
        Ok(ScheduleRow {
            id: $row.get(0)?,
            user_id: $row.get(1)?,
            name: $row.get(2)?,
            dosage: $row.get(3)?,
            start_time: $row.get(4)?,
            interval_count: $row.get(5)?,
            interval_unit: $row.get(6)?,
            window_start_date: $row.get(7)?,
            window_end_date: $row.get(8)?,
            package_size: $row.get(9)?,
            reorder_lead_days: $row.get(10)?,
            initial_quantity: $row.get(11)?,
            current_quantity: $row.get(12)?,
            reorder_threshold: $row.get(13)?,
            reorder_date: $row.get(14)?,
            active: $row.get(15)?,
            created_at: $row.get(16)?,
            updated_at: $row.get(17)?,
        })
    };
}

impl Database {
    pub fn insert_schedule(&self, s: &MedicationSchedule) -> Result<()> {
        self.conn.execute(
            &format!(
                "INSERT INTO schedules ({SELECT_COLS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)"
            ),
            params![
                s.id,
                s.user_id,
                s.name,
                s.dosage,
                s.start_time.format(TIME_FMT).to_string(),
                s.interval_count,
                s.interval_unit.to_string(),
                fmt_date(s.window_start_date),
                fmt_date(s.window_end_date),
                s.package_size,
                s.reorder_lead_days,
                s.initial_quantity,
                s.current_quantity,
                s.reorder_threshold,
                fmt_date(s.reorder_date),
                s.active as i32,
                s.created_at.to_rfc3339(),
                s.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn get_schedule(&self, id: &str) -> Result<Option<MedicationSchedule>> {
        let sql = format!("SELECT {SELECT_COLS} FROM schedules WHERE id = ?1");
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query_map(params![id], |row| map_row!(row))?;
        match rows.next() {
            Some(row) => Ok(Some(row_to_schedule(row?)?)),
            None => Ok(None),
        }
    }

    pub fn list_schedules(
        &self,
        user_id: &str,
        include_inactive: bool,
    ) -> Result<Vec<MedicationSchedule>> {
        let sql = if include_inactive {
            format!("SELECT {SELECT_COLS} FROM schedules WHERE user_id = ?1 ORDER BY name ASC")
        } else {
            format!(
                "SELECT {SELECT_COLS} FROM schedules WHERE user_id = ?1 AND active = 1 ORDER BY name ASC"
            )
        };
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![user_id], |row| map_row!(row))?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row_to_schedule(row?)?);
        }
        Ok(out)
    }

    /// Overwrite every mutable field. Returns false when the id is unknown.
    pub fn update_schedule(&self, s: &MedicationSchedule) -> Result<bool> {
        let count = self.conn.execute(
            "UPDATE schedules SET
                name = ?2, dosage = ?3, start_time = ?4, interval_count = ?5,
                interval_unit = ?6, window_start_date = ?7, window_end_date = ?8,
                package_size = ?9, reorder_lead_days = ?10, initial_quantity = ?11,
                current_quantity = ?12, reorder_threshold = ?13, reorder_date = ?14,
                active = ?15, updated_at = ?16
             WHERE id = ?1",
            params![
                s.id,
                s.name,
                s.dosage,
                s.start_time.format(TIME_FMT).to_string(),
                s.interval_count,
                s.interval_unit.to_string(),
                fmt_date(s.window_start_date),
                fmt_date(s.window_end_date),
                s.package_size,
                s.reorder_lead_days,
                s.initial_quantity,
                s.current_quantity,
                s.reorder_threshold,
                fmt_date(s.reorder_date),
                s.active as i32,
                s.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(count > 0)
    }

    pub fn set_current_quantity(&self, id: &str, quantity: Option<u32>) -> Result<bool> {
        let count = self.conn.execute(
            "UPDATE schedules SET current_quantity = ?1 WHERE id = ?2",
            params![quantity, id],
        )?;
        Ok(count > 0)
    }

    pub fn delete_schedule_row(&self, id: &str) -> Result<bool> {
        let count = self
            .conn
            .execute("DELETE FROM schedules WHERE id = ?1", params![id])?;
        Ok(count > 0)
    }
}
