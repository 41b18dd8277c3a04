use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A caregiver allowed to manage a patient's schedules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaregiverLink {
    pub id: String,
    pub caregiver_id: String,
    pub patient_id: String,
    pub linked_at: DateTime<Utc>,
}

impl CaregiverLink {
    pub fn new(
        caregiver_id: impl Into<String>,
        patient_id: impl Into<String>,
        linked_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            caregiver_id: caregiver_id.into(),
            patient_id: patient_id.into(),
            linked_at,
        }
    }
}
