pub mod access;
pub mod adherence;
pub mod clock;
pub mod dose;
pub mod generator;
pub mod schedule;
pub mod settings;
pub mod signal;
pub mod stock;

pub use clock::{Clock, FixedClock, SystemClock};
pub use settings::Settings;
