//! Who may write to whose schedules.

use tracing::info;

use crate::core::clock::Clock;
use crate::db::Database;
use crate::error::{Error, Result};
use crate::models::CaregiverLink;

/// Patients manage their own schedules; anyone else needs a caregiver link.
pub fn ensure_can_manage(db: &Database, actor: &str, patient: &str) -> Result<()> {
    if actor == patient || db.is_caregiver_of(actor, patient)? {
        return Ok(());
    }
    Err(Error::Unauthorized(format!(
        "'{actor}' is not a caregiver of '{patient}'"
    )))
}

pub fn link_caregiver(
    db: &Database,
    clock: &dyn Clock,
    caregiver_id: &str,
    patient_id: &str,
) -> Result<CaregiverLink> {
    if caregiver_id.trim().is_empty() || patient_id.trim().is_empty() {
        return Err(Error::invalid("caregiver and patient ids are required"));
    }
    if caregiver_id == patient_id {
        return Err(Error::invalid("a user cannot be their own caregiver"));
    }
    let link = CaregiverLink::new(caregiver_id, patient_id, clock.now());
    db.insert_caregiver_link(&link).map_err(|e| match e {
        Error::Conflict(_) => Error::Conflict(format!(
            "'{caregiver_id}' is already linked to '{patient_id}'"
        )),
        other => other,
    })?;
    info!(caregiver = caregiver_id, patient = patient_id, "caregiver linked");
    Ok(link)
}

pub fn unlink_caregiver(db: &Database, caregiver_id: &str, patient_id: &str) -> Result<()> {
    if db.remove_caregiver_link(caregiver_id, patient_id)? {
        info!(caregiver = caregiver_id, patient = patient_id, "caregiver unlinked");
        Ok(())
    } else {
        Err(Error::not_found(
            "caregiver link",
            format!("{caregiver_id} -> {patient_id}"),
        ))
    }
}

pub fn list_links(db: &Database, user_id: &str) -> Result<Vec<CaregiverLink>> {
    db.caregiver_links_for(user_id)
}
