//! Validation of the add-medicine form.
//!
//! The form carries raw text as typed by the user. Nothing reaches the
//! store until every field has been checked.

use crate::{DaySet, DayTag, Error, Medicine, Result, Stock, TimeOfDay, WeightUnit};

/// Raw add-medicine input
#[derive(Clone, Debug, Default)]
pub struct MedicineForm {
    pub name: String,
    pub brand: String,
    /// Day names, e.g. `["Monday", "Friday"]` or `["Daily"]`
    pub days: Vec<String>,
    /// `HH:MM` or minutes since midnight
    pub time: String,
    pub amount: String,
    pub weight: String,
    pub weight_unit: String,
    /// Empty or missing means stock is not tracked
    pub stock: Option<String>,
    pub notification_enabled: bool,
}

impl MedicineForm {
    /// Check every field and build a medicine with the given id.
    ///
    /// All problems are reported together in one `Validation` error.
    pub fn validate(&self, id: String) -> Result<Medicine> {
        let mut problems = Vec::new();

        let name = self.name.trim();
        if name.is_empty() {
            problems.push("name is required".to_string());
        }
        let brand = self.brand.trim();
        if brand.is_empty() {
            problems.push("brand is required".to_string());
        }

        let mut days = DaySet::default();
        for raw in &self.days {
            match raw.parse::<DayTag>() {
                Ok(tag) => days.select(tag),
                Err(e) => problems.push(reason(e)),
            }
        }
        if days.is_empty() && self.days.is_empty() {
            problems.push("at least one day is required".to_string());
        }

        let time = self
            .time
            .parse::<TimeOfDay>()
            .map_err(|e| problems.push(reason(e)))
            .ok();

        let amount = match self.amount.trim().parse::<u32>() {
            Ok(n) if n > 0 => Some(n),
            _ => {
                problems.push(format!(
                    "amount must be a positive whole number, got {:?}",
                    self.amount
                ));
                None
            }
        };

        let weight = match self.weight.trim().parse::<f64>() {
            Ok(w) if w.is_finite() && w > 0.0 => Some(w),
            _ => {
                problems.push(format!(
                    "weight must be a positive number, got {:?}",
                    self.weight
                ));
                None
            }
        };

        let weight_unit = if self.weight_unit.trim().is_empty() {
            Some(WeightUnit::default())
        } else {
            self.weight_unit
                .parse::<WeightUnit>()
                .map_err(|e| problems.push(reason(e)))
                .ok()
        };

        let stock = match self.stock.as_deref().map(str::trim) {
            None | Some("") => Some(Stock::Untracked),
            Some(raw) => match raw.parse::<u32>() {
                Ok(n) => Some(Stock::Tracked(n)),
                Err(_) => {
                    problems.push(format!(
                        "stock must be a non-negative whole number, got {:?}",
                        raw
                    ));
                    None
                }
            },
        };

        match (time, amount, weight, weight_unit, stock) {
            (Some(time), Some(amount), Some(weight), Some(weight_unit), Some(stock))
                if problems.is_empty() =>
            {
                Ok(Medicine {
                    id,
                    name: name.to_string(),
                    brand: brand.to_string(),
                    days,
                    time,
                    amount,
                    weight,
                    weight_unit,
                    stock,
                    notification_enabled: self.notification_enabled,
                })
            }
            _ => Err(Error::Validation(problems.join("; "))),
        }
    }
}

fn reason(e: Error) -> String {
    match e {
        Error::Validation(msg) => msg,
        other => other.to_string(),
    }
}
