//! Weekly recurrence: is a medicine due on a given date?

use crate::{DayTag, Medicine, WEEKDAYS};
use chrono::{Datelike, NaiveDate};

/// Weekday tag for a date, using the Sunday-first enumeration
pub fn weekday_of(date: NaiveDate) -> DayTag {
    WEEKDAYS[date.weekday().num_days_from_sunday() as usize]
}

/// Weekday name for a date ("Sunday".."Saturday")
pub fn weekday_name(date: NaiveDate) -> &'static str {
    weekday_of(date).name()
}

/// True when the medicine is taken daily or on the weekday of `date`
pub fn is_due_on(medicine: &Medicine, date: NaiveDate) -> bool {
    medicine.days.is_daily() || medicine.days.contains(weekday_of(date))
}
