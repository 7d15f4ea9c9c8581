//! Daily rosters: which medicines are due on a date, in intake order.

use crate::recurrence::is_due_on;
use crate::Medicine;
use chrono::{Duration, NaiveDate};

/// Medicines due on `date`, ordered by time of day.
///
/// The sort is stable: medicines sharing a time keep their collection order.
pub fn build_roster(medicines: &[Medicine], date: NaiveDate) -> Vec<&Medicine> {
    let mut due: Vec<&Medicine> = medicines.iter().filter(|m| is_due_on(m, date)).collect();
    due.sort_by_key(|m| m.time);
    due
}

/// The two lists shown on the home screen
#[derive(Clone, Debug)]
pub struct DailyRosters<'a> {
    pub today: NaiveDate,
    pub today_items: Vec<&'a Medicine>,
    pub tomorrow: NaiveDate,
    pub tomorrow_items: Vec<&'a Medicine>,
}

/// Build today's and tomorrow's rosters, each from its own reference date
pub fn daily_rosters(medicines: &[Medicine], today: NaiveDate) -> DailyRosters<'_> {
    let tomorrow = today + Duration::days(1);
    let rosters = DailyRosters {
        today,
        today_items: build_roster(medicines, today),
        tomorrow,
        tomorrow_items: build_roster(medicines, tomorrow),
    };

    tracing::debug!(
        "Built rosters: {} due {}, {} due {}",
        rosters.today_items.len(),
        today,
        rosters.tomorrow_items.len(),
        tomorrow
    );
    rosters
}
