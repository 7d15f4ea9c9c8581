//! Shared fixtures for unit tests.

use crate::{DaySet, Medicine, Stock, TimeOfDay, WeightUnit};

/// A medicine named after its id, one 100 mg unit per intake
pub fn medicine(id: &str, days: DaySet, minutes: u16) -> Medicine {
    Medicine {
        id: id.to_string(),
        name: id.to_string(),
        brand: "Generic".to_string(),
        days,
        time: TimeOfDay::new(minutes).expect("test time within a day"),
        amount: 1,
        weight: 100.0,
        weight_unit: WeightUnit::Mg,
        stock: Stock::Untracked,
        notification_enabled: true,
    }
}
