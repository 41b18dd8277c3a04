pub mod caregiver;
pub mod config;
pub mod dose;
pub mod schedule;

pub use caregiver::CaregiverLink;
pub use dose::{DoseEvent, DoseStatus};
pub use schedule::{IntervalUnit, MedicationSchedule, ScheduleDraft, SchedulePatch};
