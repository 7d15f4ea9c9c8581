//! The medicine repository: authoritative in-memory state backed by a
//! key-value store.
//!
//! Every mutation follows the same sequence:
//! 1. Copy the current collection and apply the change to the copy
//! 2. Save the full copy under its key
//! 3. Replace the in-memory collection only once the save succeeded
//!
//! A failed write therefore leaves both the store and memory untouched and
//! is returned to the caller.

use crate::config::RetentionConfig;
use crate::notify::{due_alerts, AlertScheduler, DueAlert};
use crate::recurrence::is_due_on;
use crate::roster::{daily_rosters, DailyRosters};
use crate::stock::{sort_medicines, SortOrder};
use crate::store::{load_collection, save_collection, KvStore};
use crate::store::{DELETED_MEDICINES_KEY, MEDICINES_KEY};
use crate::{DeletedMedicine, Error, Medicine, MedicineForm, Result, TimeOfDay};
use chrono::{Days, NaiveDate};
use uuid::Uuid;

pub struct MedicineRepository<S: KvStore, N: AlertScheduler> {
    store: S,
    scheduler: N,
    retention: RetentionConfig,
    medicines: Vec<Medicine>,
    deleted: Vec<DeletedMedicine>,
}

impl<S: KvStore, N: AlertScheduler> MedicineRepository<S, N> {
    /// Load both collections. Missing or unreadable data starts empty.
    pub fn open(store: S, scheduler: N, retention: RetentionConfig) -> Self {
        let mut repo = Self {
            store,
            scheduler,
            retention,
            medicines: Vec::new(),
            deleted: Vec::new(),
        };
        repo.reload();
        repo
    }

    /// Discard in-memory state and read everything back from the store
    pub fn reload(&mut self) {
        self.medicines = load_collection(&self.store, MEDICINES_KEY).unwrap_or_default();
        self.deleted = load_collection(&self.store, DELETED_MEDICINES_KEY).unwrap_or_default();
        tracing::info!(
            "Loaded {} medicines and {} deleted entries",
            self.medicines.len(),
            self.deleted.len()
        );
    }

    pub fn medicines(&self) -> &[Medicine] {
        &self.medicines
    }

    pub fn deleted(&self) -> &[DeletedMedicine] {
        &self.deleted
    }

    pub fn get(&self, id: &str) -> Option<&Medicine> {
        self.medicines.iter().find(|m| m.id == id)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn scheduler(&self) -> &N {
        &self.scheduler
    }

    /// Validate the form, assign a fresh id and persist the new medicine
    pub fn add(&mut self, form: &MedicineForm, today: NaiveDate) -> Result<Medicine> {
        let medicine = form.validate(Uuid::new_v4().to_string())?;

        let mut next = self.medicines.clone();
        next.push(medicine.clone());
        self.commit_medicines(next)?;

        tracing::info!("Added medicine {} ({})", medicine.name, medicine.id);
        if medicine.notification_enabled && is_due_on(&medicine, today) {
            self.scheduler.schedule(&DueAlert::for_medicine(&medicine))?;
        }
        Ok(medicine)
    }

    /// Replace the whole collection, e.g. with sample data
    pub fn replace_all(&mut self, medicines: Vec<Medicine>) -> Result<()> {
        for medicine in &self.medicines {
            self.scheduler.cancel(&medicine.id)?;
        }
        self.commit_medicines(medicines)
    }

    /// Archive a snapshot in the deletion log, then remove the medicine.
    ///
    /// If the medicine collection cannot be saved, the previous log is
    /// written back so a retry does not archive the medicine twice.
    pub fn delete(&mut self, id: &str, today: NaiveDate) -> Result<DeletedMedicine> {
        let index = self.index_of(id)?;
        let snapshot = DeletedMedicine::new(self.medicines[index].clone(), today);

        let mut log = self.deleted.clone();
        log.push(snapshot.clone());
        let log = prune_deleted(log, today, self.retention);
        save_collection(&mut self.store, DELETED_MEDICINES_KEY, &log)?;

        let mut next = self.medicines.clone();
        next.remove(index);
        if let Err(e) = self.commit_medicines(next) {
            let restored = save_collection(&mut self.store, DELETED_MEDICINES_KEY, &self.deleted);
            if let Err(restore) = restored {
                tracing::warn!("Could not restore deletion log: {}", restore);
                self.deleted = log;
            }
            return Err(e);
        }
        self.deleted = log;

        self.scheduler.cancel(id)?;
        tracing::info!("Deleted medicine {} ({})", snapshot.medicine.name, id);
        Ok(snapshot)
    }

    pub fn set_stock(&mut self, id: &str, value: i64) -> Result<Medicine> {
        self.update(id, |m| m.set_stock(value))
    }

    pub fn increment_stock(&mut self, id: &str) -> Result<Medicine> {
        self.update(id, |m| {
            m.increment_stock();
            Ok(())
        })
    }

    pub fn decrement_stock(&mut self, id: &str) -> Result<Medicine> {
        self.update(id, |m| {
            m.decrement_stock();
            Ok(())
        })
    }

    /// Switch reminders on or off. Any pending alert is cancelled first, so
    /// switching on twice still leaves a single alert.
    pub fn set_notifications(
        &mut self,
        id: &str,
        enabled: bool,
        today: NaiveDate,
    ) -> Result<Medicine> {
        let updated = self.update(id, |m| {
            m.notification_enabled = enabled;
            Ok(())
        })?;

        self.scheduler.cancel(id)?;
        if enabled && is_due_on(&updated, today) {
            self.scheduler.schedule(&DueAlert::for_medicine(&updated))?;
        }
        Ok(updated)
    }

    /// Move a medicine to a new time of day; existing alerts are cancelled
    /// and re-issued for the new time
    pub fn set_time(&mut self, id: &str, time: TimeOfDay, today: NaiveDate) -> Result<Medicine> {
        let previous = self.get(id).map(|m| m.time);
        let updated = self.update(id, |m| {
            m.time = time;
            Ok(())
        })?;

        if previous != Some(time) {
            self.scheduler.cancel(id)?;
            if updated.notification_enabled && is_due_on(&updated, today) {
                self.scheduler.schedule(&DueAlert::for_medicine(&updated))?;
            }
        }
        Ok(updated)
    }

    /// Today's and tomorrow's rosters
    pub fn rosters(&self, today: NaiveDate) -> DailyRosters<'_> {
        daily_rosters(&self.medicines, today)
    }

    /// Medicines in supply-view order
    pub fn supply(&self, order: SortOrder) -> Vec<Medicine> {
        let mut medicines = self.medicines.clone();
        sort_medicines(&mut medicines, order);
        medicines
    }

    /// Cancel every alert and schedule the ones due today
    pub fn reschedule(&mut self, today: NaiveDate) -> Result<Vec<DueAlert>> {
        for medicine in &self.medicines {
            self.scheduler.cancel(&medicine.id)?;
        }

        let alerts = due_alerts(&self.medicines, today);
        for alert in &alerts {
            self.scheduler.schedule(alert)?;
        }
        tracing::info!("Scheduled {} alerts for {}", alerts.len(), today);
        Ok(alerts)
    }

    fn index_of(&self, id: &str) -> Result<usize> {
        self.medicines
            .iter()
            .position(|m| m.id == id)
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }

    /// Apply `f` to a copy of the medicine and persist the copy
    fn update<F>(&mut self, id: &str, f: F) -> Result<Medicine>
    where
        F: FnOnce(&mut Medicine) -> Result<()>,
    {
        let index = self.index_of(id)?;
        let mut next = self.medicines.clone();
        f(&mut next[index])?;

        let updated = next[index].clone();
        self.commit_medicines(next)?;
        Ok(updated)
    }

    fn commit_medicines(&mut self, next: Vec<Medicine>) -> Result<()> {
        save_collection(&mut self.store, MEDICINES_KEY, &next)?;
        self.medicines = next;
        Ok(())
    }
}

/// Drop log entries older than the retention window
fn prune_deleted(
    mut log: Vec<DeletedMedicine>,
    today: NaiveDate,
    retention: RetentionConfig,
) -> Vec<DeletedMedicine> {
    if retention.max_age_days == 0 {
        return log;
    }
    let Some(cutoff) = today.checked_sub_days(Days::new(u64::from(retention.max_age_days))) else {
        return log;
    };

    let before = log.len();
    log.retain(|entry| entry.deletion_date >= cutoff);
    if log.len() < before {
        tracing::debug!(
            "Pruned {} deleted entries older than {}",
            before - log.len(),
            cutoff
        );
    }
    log
}
