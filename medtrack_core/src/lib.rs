#![forbid(unsafe_code)]

//! Core domain model and business logic for medtrack.
//!
//! This crate provides:
//! - Domain types (medicines, recurrence days, stock, profile)
//! - Recurrence engine and daily rosters
//! - Stock projection and supply ordering
//! - Persistence (key-value store, repository)
//! - Reminder alert derivation
//! - Medicine catalog import and search

pub mod types;
pub mod error;
pub mod config;
pub mod logging;
pub mod store;
pub mod recurrence;
pub mod roster;
pub mod stock;
pub mod notify;
pub mod intake;
pub mod repository;
pub mod profile;
pub mod sample;
pub mod catalog;

#[cfg(test)]
mod test_support;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use config::Config;
pub use store::{FileStore, KvStore, MemoryStore};
pub use recurrence::{is_due_on, weekday_name};
pub use roster::{build_roster, daily_rosters, DailyRosters};
pub use stock::{days_remaining, depletion_date, sort_medicines, SortOrder};
pub use notify::{due_alerts, AlertScheduler, DueAlert, RecordingScheduler, TracingScheduler};
pub use intake::MedicineForm;
pub use repository::MedicineRepository;
pub use sample::sample_medicines;
