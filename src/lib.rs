#![forbid(unsafe_code)]

//! Medication reminder core: recurring dose generation, stock prediction
//! and adherence aggregation over a SQLite store.

pub mod core;
pub mod db;
pub mod error;
pub mod logging;
pub mod models;
pub mod output;

pub use error::{Error, Result};
