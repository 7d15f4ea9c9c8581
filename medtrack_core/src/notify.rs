//! Reminder alerts for doses due today.
//!
//! Delivery is platform-owned; this module only decides what should be
//! scheduled or cancelled and hands it to an [`AlertScheduler`].

use crate::roster::build_roster;
use crate::{Medicine, Result, TimeOfDay};
use chrono::NaiveDate;

/// A reminder for one medicine at its time of day
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DueAlert {
    pub medicine_id: String,
    pub time: TimeOfDay,
    pub message: String,
}

impl DueAlert {
    pub fn for_medicine(medicine: &Medicine) -> Self {
        Self {
            medicine_id: medicine.id.clone(),
            time: medicine.time,
            message: alert_message(medicine),
        }
    }
}

/// Reminder text, e.g. "Take 2x Metformin (Teva)"
pub fn alert_message(medicine: &Medicine) -> String {
    if medicine.brand.trim().is_empty() {
        format!("Take {}x {}", medicine.amount, medicine.name)
    } else {
        format!(
            "Take {}x {} ({})",
            medicine.amount, medicine.name, medicine.brand
        )
    }
}

/// Alerts for every medicine due on `today` with reminders enabled,
/// in time order
pub fn due_alerts(medicines: &[Medicine], today: NaiveDate) -> Vec<DueAlert> {
    build_roster(medicines, today)
        .into_iter()
        .filter(|m| m.notification_enabled)
        .map(DueAlert::for_medicine)
        .collect()
}

/// Receiver of schedule/cancel requests
pub trait AlertScheduler {
    fn schedule(&mut self, alert: &DueAlert) -> Result<()>;
    fn cancel(&mut self, medicine_id: &str) -> Result<()>;
}

/// Scheduler that only logs requests
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingScheduler;

impl AlertScheduler for TracingScheduler {
    fn schedule(&mut self, alert: &DueAlert) -> Result<()> {
        tracing::info!("Scheduled alert at {}: {}", alert.time, alert.message);
        Ok(())
    }

    fn cancel(&mut self, medicine_id: &str) -> Result<()> {
        tracing::info!("Cancelled alerts for medicine {}", medicine_id);
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AlertEvent {
    Scheduled(DueAlert),
    Cancelled(String),
}

/// Scheduler that keeps every request, in order
#[derive(Clone, Debug, Default)]
pub struct RecordingScheduler {
    pub events: Vec<AlertEvent>,
}

impl RecordingScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Alerts still scheduled after replaying every event
    pub fn pending(&self) -> Vec<&DueAlert> {
        let mut pending: Vec<&DueAlert> = Vec::new();
        for event in &self.events {
            match event {
                AlertEvent::Scheduled(alert) => {
                    pending.retain(|a| a.medicine_id != alert.medicine_id);
                    pending.push(alert);
                }
                AlertEvent::Cancelled(id) => pending.retain(|a| &a.medicine_id != id),
            }
        }
        pending
    }

    pub fn cancelled(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|e| match e {
                AlertEvent::Cancelled(id) => Some(id.as_str()),
                AlertEvent::Scheduled(_) => None,
            })
            .collect()
    }
}

impl AlertScheduler for RecordingScheduler {
    fn schedule(&mut self, alert: &DueAlert) -> Result<()> {
        self.events.push(AlertEvent::Scheduled(alert.clone()));
        Ok(())
    }

    fn cancel(&mut self, medicine_id: &str) -> Result<()> {
        self.events.push(AlertEvent::Cancelled(medicine_id.to_string()));
        Ok(())
    }
}
