use chrono::{DateTime, Utc};
use rusqlite::params;

use crate::error::Result;
use crate::models::{DoseEvent, DoseStatus};

use super::{Database, corrupt};

struct DoseRow {
    id: String,
    schedule_id: String,
    user_id: String,
    scheduled_at: i64,
    status: String,
    completed_at: Option<String>,
}

fn row_to_event(r: DoseRow) -> Result<DoseEvent> {
    let scheduled_at = DateTime::<Utc>::from_timestamp(r.scheduled_at, 0)
        .ok_or_else(|| corrupt("scheduled_at", &r.scheduled_at.to_string()))?;
    let status: DoseStatus = r.status.parse().map_err(|_| corrupt("status", &r.status))?;
    let completed_at = match r.completed_at {
        Some(ref s) => Some(
            DateTime::parse_from_rfc3339(s)
                .map_err(|_| corrupt("completed_at", s))?
                .with_timezone(&Utc),
        ),
        None => None,
    };
    Ok(DoseEvent {
        id: r.id,
        schedule_id: r.schedule_id,
        user_id: r.user_id,
        scheduled_at,
        status,
        completed_at,
    })
}

/// Smallest whole second not before `t`. Stored instants are whole
/// seconds, so `x >= t` is `x >= ceil_secs(t)` and likewise for `<`.
fn ceil_secs(t: DateTime<Utc>) -> i64 {
    t.timestamp() + i64::from(t.timestamp_subsec_nanos() > 0)
}

const SELECT_COLS: &str = "id, schedule_id, user_id, scheduled_at, status, completed_at";

macro_rules! map_row {
    ($row:expr) => {
        Ok(DoseRow {
            id: $row.get(0)?,
            schedule_id: $row.get(1)?,
            user_id: $row.get(2)?,
            scheduled_at: $row.get(3)?,
            status: $row.get(4)?,
            completed_at: $row.get(5)?,
        })
    };
}

impl Database {
    fn query_events(&self, sql: &str, args: impl rusqlite::Params) -> Result<Vec<DoseEvent>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(args, |row| map_row!(row))?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row_to_event(row?)?);
        }
        Ok(out)
    }

    /// Insert events, silently skipping slots that already exist for the
    /// same schedule. Returns how many rows were actually inserted.
    pub fn insert_dose_events(&self, events: &[DoseEvent]) -> Result<usize> {
        let mut stmt = self.conn.prepare(
            "INSERT OR IGNORE INTO dose_events (id, schedule_id, user_id, scheduled_at, status, completed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )?;
        let mut inserted = 0;
        for e in events {
            inserted += stmt.execute(params![
                e.id,
                e.schedule_id,
                e.user_id,
                e.scheduled_at.timestamp(),
                e.status.as_str(),
                e.completed_at.map(|t| t.to_rfc3339()),
            ])?;
        }
        Ok(inserted)
    }

    pub fn get_dose_event(&self, id: &str) -> Result<Option<DoseEvent>> {
        let sql = format!("SELECT {SELECT_COLS} FROM dose_events WHERE id = ?1");
        Ok(self.query_events(&sql, params![id])?.into_iter().next())
    }

    /// Conditional status change: only applies while the stored status is
    /// still `from`. Returns whether a row changed.
    pub fn transition_dose(
        &self,
        id: &str,
        from: DoseStatus,
        to: DoseStatus,
        completed_at: DateTime<Utc>,
    ) -> Result<bool> {
        let count = self.conn.execute(
            "UPDATE dose_events SET status = ?1, completed_at = ?2
             WHERE id = ?3 AND status = ?4",
            params![to.as_str(), completed_at.to_rfc3339(), id, from.as_str()],
        )?;
        Ok(count > 0)
    }

    pub fn events_for_schedule(&self, schedule_id: &str) -> Result<Vec<DoseEvent>> {
        let sql = format!(
            "SELECT {SELECT_COLS} FROM dose_events WHERE schedule_id = ?1 ORDER BY scheduled_at ASC"
        );
        self.query_events(&sql, params![schedule_id])
    }

    /// Events of `user_id` scheduled in `[from, to)`, oldest first.
    pub fn events_for_user_between(
        &self,
        user_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<DoseEvent>> {
        let sql = format!(
            "SELECT {SELECT_COLS} FROM dose_events
             WHERE user_id = ?1 AND scheduled_at >= ?2 AND scheduled_at < ?3
             ORDER BY scheduled_at ASC"
        );
        self.query_events(&sql, params![user_id, ceil_secs(from), ceil_secs(to)])
    }

    /// Pending events at or after `from`, soonest first.
    pub fn pending_for_user_from(
        &self,
        user_id: &str,
        from: DateTime<Utc>,
        limit: u32,
    ) -> Result<Vec<DoseEvent>> {
        let sql = format!(
            "SELECT {SELECT_COLS} FROM dose_events
             WHERE user_id = ?1 AND status = 'pending' AND scheduled_at >= ?2
             ORDER BY scheduled_at ASC LIMIT ?3"
        );
        self.query_events(&sql, params![user_id, ceil_secs(from), limit])
    }

    /// Pending events at or before `until`, most recent first.
    pub fn pending_for_user_until(
        &self,
        user_id: &str,
        until: DateTime<Utc>,
    ) -> Result<Vec<DoseEvent>> {
        let sql = format!(
            "SELECT {SELECT_COLS} FROM dose_events
             WHERE user_id = ?1 AND status = 'pending' AND scheduled_at <= ?2
             ORDER BY scheduled_at DESC"
        );
        self.query_events(&sql, params![user_id, until.timestamp()])
    }

    pub fn delete_pending_for_schedule(&self, schedule_id: &str) -> Result<usize> {
        let count = self.conn.execute(
            "DELETE FROM dose_events WHERE schedule_id = ?1 AND status = 'pending'",
            params![schedule_id],
        )?;
        Ok(count)
    }

    pub fn delete_events_for_schedule(&self, schedule_id: &str) -> Result<usize> {
        let count = self.conn.execute(
            "DELETE FROM dose_events WHERE schedule_id = ?1",
            params![schedule_id],
        )?;
        Ok(count)
    }
}
