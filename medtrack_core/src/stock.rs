//! Stock projection, stock adjustments and supply ordering.
//!
//! Days of supply is `floor(stock / amount)`: one scheduled intake per day
//! consumes `amount` units. Untracked stock has no projection.

use crate::{Error, Medicine, Result, Stock};
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Whole days the current stock lasts, or `None` when stock is untracked
pub fn days_remaining(medicine: &Medicine) -> Option<u32> {
    medicine
        .stock
        .count()
        .and_then(|stock| stock.checked_div(medicine.amount))
}

/// Date the supply runs out: `today` plus the remaining whole days
pub fn depletion_date(medicine: &Medicine, today: NaiveDate) -> Option<NaiveDate> {
    days_remaining(medicine).and_then(|days| today.checked_add_days(Days::new(u64::from(days))))
}

/// Render a date the way the supply view shows it, `DD-MM-YYYY`
pub fn format_date(date: NaiveDate) -> String {
    date.format("%d-%m-%Y").to_string()
}

impl Medicine {
    /// Add one unit. Untracked stock starts counting at 1.
    pub fn increment_stock(&mut self) {
        let current = self.stock.count().unwrap_or(0);
        self.stock = Stock::Tracked(current.saturating_add(1));
    }

    /// Remove one unit; does nothing at zero or when untracked
    pub fn decrement_stock(&mut self) {
        if let Stock::Tracked(n) = self.stock {
            if n > 0 {
                self.stock = Stock::Tracked(n - 1);
            }
        }
    }

    /// Set an absolute stock count. Negative values are rejected and the
    /// previous stock is kept.
    pub fn set_stock(&mut self, value: i64) -> Result<()> {
        if value < 0 {
            return Err(Error::InvalidStock(value));
        }
        let count = u32::try_from(value)
            .map_err(|_| Error::Validation(format!("stock {} is too large", value)))?;
        self.stock = Stock::Tracked(count);
        Ok(())
    }
}

/// Orderings offered by the supply view
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortOrder {
    #[default]
    NameAZ,
    NameZA,
    MostStock,
    LeastStock,
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SortOrder::NameAZ => "nameAZ",
            SortOrder::NameZA => "nameZA",
            SortOrder::MostStock => "mostStock",
            SortOrder::LeastStock => "leastStock",
        };
        f.write_str(s)
    }
}

impl FromStr for SortOrder {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let normalized: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_lowercase();
        match normalized.as_str() {
            "nameaz" | "name" => Ok(SortOrder::NameAZ),
            "nameza" => Ok(SortOrder::NameZA),
            "moststock" => Ok(SortOrder::MostStock),
            "leaststock" => Ok(SortOrder::LeastStock),
            _ => Err(Error::Validation(format!("unknown sort order {:?}", s))),
        }
    }
}

/// Sort medicines in place. Every ordering is stable.
///
/// Stock orderings compare `stock / amount` exactly; untracked medicines
/// go after all tracked ones in both directions.
pub fn sort_medicines(medicines: &mut [Medicine], order: SortOrder) {
    match order {
        SortOrder::NameAZ => medicines.sort_by(compare_names),
        SortOrder::NameZA => medicines.sort_by(|a, b| compare_names(b, a)),
        SortOrder::LeastStock => medicines.sort_by(|a, b| compare_supply(a, b, false)),
        SortOrder::MostStock => medicines.sort_by(|a, b| compare_supply(a, b, true)),
    }
}

fn compare_names(a: &Medicine, b: &Medicine) -> Ordering {
    a.name.to_lowercase().cmp(&b.name.to_lowercase())
}

fn compare_supply(a: &Medicine, b: &Medicine, descending: bool) -> Ordering {
    match (a.stock.count(), b.stock.count()) {
        (Some(sa), Some(sb)) => {
            // sa/aa vs sb/ab without floating point
            let lhs = u64::from(sa) * u64::from(b.amount);
            let rhs = u64::from(sb) * u64::from(a.amount);
            if descending {
                rhs.cmp(&lhs)
            } else {
                lhs.cmp(&rhs)
            }
        }
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
