use chrono::{DateTime, Utc};
use rusqlite::params;

use crate::error::Result;
use crate::models::CaregiverLink;

use super::{Database, corrupt};

impl Database {
    pub fn insert_caregiver_link(&self, link: &CaregiverLink) -> Result<()> {
        self.conn.execute(
            "INSERT INTO caregiver_links (id, caregiver_id, patient_id, linked_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                link.id,
                link.caregiver_id,
                link.patient_id,
                link.linked_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn remove_caregiver_link(&self, caregiver_id: &str, patient_id: &str) -> Result<bool> {
        let count = self.conn.execute(
            "DELETE FROM caregiver_links WHERE caregiver_id = ?1 AND patient_id = ?2",
            params![caregiver_id, patient_id],
        )?;
        Ok(count > 0)
    }

    pub fn is_caregiver_of(&self, caregiver_id: &str, patient_id: &str) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM caregiver_links WHERE caregiver_id = ?1 AND patient_id = ?2",
            params![caregiver_id, patient_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Links where `user_id` is either side, newest first.
    pub fn caregiver_links_for(&self, user_id: &str) -> Result<Vec<CaregiverLink>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, caregiver_id, patient_id, linked_at FROM caregiver_links
             WHERE caregiver_id = ?1 OR patient_id = ?1
             ORDER BY linked_at DESC",
        )?;
        let rows = stmt.query_map(params![user_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;

        let mut links = Vec::new();
        for row in rows {
            let (id, caregiver_id, patient_id, linked_at) = row?;
            let linked_at = DateTime::parse_from_rfc3339(&linked_at)
                .map_err(|_| corrupt("linked_at", &linked_at))?
                .with_timezone(&Utc);
            links.push(CaregiverLink {
                id,
                caregiver_id,
                patient_id,
                linked_at,
            });
        }
        Ok(links)
    }
}
