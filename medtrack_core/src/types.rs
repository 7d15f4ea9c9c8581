//! Core domain types for medtrack.
//!
//! This module defines the fundamental types used throughout the system:
//! - Recurrence tags and the `DaySet` that enforces `Daily` exclusivity
//! - Time of day, stock and dose units
//! - Medicines, the deletion log entries and the user profile
//!
//! Field names serialize in camelCase so stored collections stay readable
//! by older app versions, which also wrote several numbers as strings.

use crate::Error;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Recurrence
// ============================================================================

/// A single recurrence tag
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DayTag {
    Daily,
    Sunday,
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
}

/// Weekday tags, Sunday first
pub const WEEKDAYS: [DayTag; 7] = [
    DayTag::Sunday,
    DayTag::Monday,
    DayTag::Tuesday,
    DayTag::Wednesday,
    DayTag::Thursday,
    DayTag::Friday,
    DayTag::Saturday,
];

impl DayTag {
    pub fn name(self) -> &'static str {
        match self {
            DayTag::Daily => "Daily",
            DayTag::Sunday => "Sunday",
            DayTag::Monday => "Monday",
            DayTag::Tuesday => "Tuesday",
            DayTag::Wednesday => "Wednesday",
            DayTag::Thursday => "Thursday",
            DayTag::Friday => "Friday",
            DayTag::Saturday => "Saturday",
        }
    }
}

impl fmt::Display for DayTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DayTag {
    type Err = Error;

    /// Case-insensitive; accepts full names and three-letter abbreviations.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        std::iter::once(DayTag::Daily)
            .chain(WEEKDAYS)
            .find(|tag| {
                let name = tag.name().to_lowercase();
                lower == name || (lower.len() == 3 && name.starts_with(&lower))
            })
            .ok_or_else(|| Error::Validation(format!("unknown day {:?}", s)))
    }
}

/// The set of days a medicine is taken on.
///
/// Holds either exactly `{Daily}` or any set of weekdays, never both.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<DayTag>")]
pub struct DaySet {
    tags: BTreeSet<DayTag>,
}

impl DaySet {
    pub fn daily() -> Self {
        let mut set = Self::default();
        set.select(DayTag::Daily);
        set
    }

    /// Build a set from a list of tags. If `Daily` appears anywhere the
    /// result is `{Daily}`.
    pub fn from_tags<I: IntoIterator<Item = DayTag>>(tags: I) -> Self {
        let tags: BTreeSet<DayTag> = tags.into_iter().collect();
        if tags.contains(&DayTag::Daily) {
            Self::daily()
        } else {
            Self { tags }
        }
    }

    /// Add a tag. Selecting `Daily` clears every weekday; selecting a
    /// weekday clears `Daily`.
    pub fn select(&mut self, tag: DayTag) {
        if tag == DayTag::Daily {
            self.tags.clear();
        } else {
            self.tags.remove(&DayTag::Daily);
        }
        self.tags.insert(tag);
    }

    pub fn contains(&self, tag: DayTag) -> bool {
        self.tags.contains(&tag)
    }

    pub fn is_daily(&self) -> bool {
        self.contains(DayTag::Daily)
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = DayTag> + '_ {
        self.tags.iter().copied()
    }
}

impl From<Vec<String>> for DaySet {
    fn from(raw: Vec<String>) -> Self {
        let tags = raw.iter().filter_map(|s| match s.parse::<DayTag>() {
            Ok(tag) => Some(tag),
            Err(_) => {
                tracing::warn!("Ignoring unknown day tag {:?}", s);
                None
            }
        });
        DaySet::from_tags(tags.collect::<Vec<_>>())
    }
}

impl From<DaySet> for Vec<DayTag> {
    fn from(set: DaySet) -> Self {
        set.tags.into_iter().collect()
    }
}

impl fmt::Display for DaySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.iter().map(DayTag::name).collect();
        f.write_str(&names.join(", "))
    }
}

// ============================================================================
// Time, stock and units
// ============================================================================

/// Minutes since midnight, 0..=1439
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct TimeOfDay(u16);

impl TimeOfDay {
    pub const MINUTES_PER_DAY: u16 = 24 * 60;

    pub fn new(minutes: u16) -> Option<Self> {
        (minutes < Self::MINUTES_PER_DAY).then_some(Self(minutes))
    }

    pub fn from_hm(hours: u16, minutes: u16) -> Option<Self> {
        if hours >= 24 || minutes >= 60 {
            return None;
        }
        Self::new(hours * 60 + minutes)
    }

    /// Constructor for fixed tables. Used in a `const` item, an
    /// out-of-range time fails compilation.
    pub(crate) const fn at(hours: u16, minutes: u16) -> Self {
        assert!(hours < 24 && minutes < 60, "time of day out of range");
        Self(hours * 60 + minutes)
    }

    pub fn minutes(self) -> u16 {
        self.0
    }

    pub fn hour(self) -> u16 {
        self.0 / 60
    }

    pub fn minute(self) -> u16 {
        self.0 % 60
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

impl FromStr for TimeOfDay {
    type Err = Error;

    /// Accepts `HH:MM` or a bare minute count.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = || Error::Validation(format!("invalid time {:?}, expected HH:MM", s));

        let parsed = match s.split_once(':') {
            Some((h, m)) => {
                let h = h.parse::<u16>().map_err(|_| invalid())?;
                let m = m.parse::<u16>().map_err(|_| invalid())?;
                Self::from_hm(h, m)
            }
            None => s.parse::<u16>().ok().and_then(Self::new),
        };
        parsed.ok_or_else(invalid)
    }
}

impl TryFrom<u16> for TimeOfDay {
    type Error = String;

    fn try_from(minutes: u16) -> Result<Self, Self::Error> {
        TimeOfDay::new(minutes)
            .ok_or_else(|| format!("time {} is outside 0..=1439 minutes", minutes))
    }
}

impl From<TimeOfDay> for u16 {
    fn from(time: TimeOfDay) -> Self {
        time.0
    }
}

/// Remaining unit count, or not tracked at all
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Option<u32>", into = "Option<u32>")]
pub enum Stock {
    Tracked(u32),
    #[default]
    Untracked,
}

impl Stock {
    pub fn is_untracked(&self) -> bool {
        matches!(self, Stock::Untracked)
    }

    pub fn count(self) -> Option<u32> {
        match self {
            Stock::Tracked(n) => Some(n),
            Stock::Untracked => None,
        }
    }
}

impl From<Option<u32>> for Stock {
    fn from(value: Option<u32>) -> Self {
        value.map_or(Stock::Untracked, Stock::Tracked)
    }
}

impl From<Stock> for Option<u32> {
    fn from(stock: Stock) -> Self {
        stock.count()
    }
}

/// Unit of the per-unit dose weight
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum WeightUnit {
    #[default]
    Mg,
    Mcg,
}

impl fmt::Display for WeightUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WeightUnit::Mg => f.write_str("mg"),
            WeightUnit::Mcg => f.write_str("mcg"),
        }
    }
}

impl FromStr for WeightUnit {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mg" => Ok(WeightUnit::Mg),
            "mcg" | "µg" | "ug" => Ok(WeightUnit::Mcg),
            other => Err(Error::Validation(format!("unknown weight unit {:?}", other))),
        }
    }
}

// ============================================================================
// Medicines
// ============================================================================

/// A recurring prescription entry
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Medicine {
    #[serde(deserialize_with = "lenient::id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub days: DaySet,
    #[serde(deserialize_with = "lenient::time")]
    pub time: TimeOfDay,
    #[serde(deserialize_with = "lenient::positive_u32")]
    pub amount: u32,
    #[serde(default, deserialize_with = "lenient::number")]
    pub weight: f64,
    #[serde(default)]
    pub weight_unit: WeightUnit,
    #[serde(
        default,
        deserialize_with = "lenient::stock",
        skip_serializing_if = "Stock::is_untracked"
    )]
    pub stock: Stock,
    #[serde(default = "default_notification_enabled")]
    pub notification_enabled: bool,
}

fn default_notification_enabled() -> bool {
    true
}

/// Archived snapshot of a deleted medicine
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedMedicine {
    #[serde(flatten)]
    pub medicine: Medicine,
    pub deletion_date: NaiveDate,
}

impl DeletedMedicine {
    pub fn new(medicine: Medicine, deletion_date: NaiveDate) -> Self {
        Self {
            medicine,
            deletion_date,
        }
    }
}

/// Profile shown in the app header
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_photo_ref: Option<String>,
}

/// Deserializers that accept both numbers and numeric strings.
mod lenient {
    use super::{Stock, TimeOfDay};
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    pub enum Raw {
        Int(u64),
        Float(f64),
        Text(String),
    }

    impl Raw {
        pub fn as_u64(&self) -> Result<u64, String> {
            match self {
                Raw::Int(n) => Ok(*n),
                Raw::Float(f) if f.fract() == 0.0 && *f >= 0.0 => Ok(*f as u64),
                Raw::Float(f) => Err(format!("expected a whole number, got {}", f)),
                Raw::Text(s) => s
                    .trim()
                    .parse()
                    .map_err(|_| format!("expected a whole number, got {:?}", s)),
            }
        }
    }

    pub fn id<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        Ok(match Raw::deserialize(d)? {
            Raw::Int(n) => n.to_string(),
            Raw::Float(f) => f.to_string(),
            Raw::Text(s) => s,
        })
    }

    pub fn positive_u32<'de, D: Deserializer<'de>>(d: D) -> Result<u32, D::Error> {
        let n = Raw::deserialize(d)?
            .as_u64()
            .map_err(serde::de::Error::custom)?;
        match u32::try_from(n) {
            Ok(n) if n > 0 => Ok(n),
            _ => Err(serde::de::Error::custom(format!(
                "amount must be a positive integer, got {}",
                n
            ))),
        }
    }

    pub fn time<'de, D: Deserializer<'de>>(d: D) -> Result<TimeOfDay, D::Error> {
        let minutes = Raw::deserialize(d)?
            .as_u64()
            .map_err(serde::de::Error::custom)?;
        u16::try_from(minutes)
            .ok()
            .and_then(TimeOfDay::new)
            .ok_or_else(|| {
                serde::de::Error::custom(format!(
                    "time {} is outside 0..=1439 minutes",
                    minutes
                ))
            })
    }

    /// `null` and the empty string mean untracked
    pub fn stock<'de, D: Deserializer<'de>>(d: D) -> Result<Stock, D::Error> {
        match Option::<Raw>::deserialize(d)? {
            None => Ok(Stock::Untracked),
            Some(Raw::Text(s)) if s.trim().is_empty() => Ok(Stock::Untracked),
            Some(raw) => {
                let n = raw.as_u64().map_err(serde::de::Error::custom)?;
                u32::try_from(n).map(Stock::Tracked).map_err(|_| {
                    serde::de::Error::custom(format!("stock {} is too large", n))
                })
            }
        }
    }

    pub fn number<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
        match Raw::deserialize(d)? {
            Raw::Int(n) => Ok(n as f64),
            Raw::Float(f) => Ok(f),
            Raw::Text(s) => s.trim().parse().map_err(|_| {
                serde::de::Error::custom(format!("expected a number, got {:?}", s))
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_selecting_daily_clears_weekdays() {
        let mut days = DaySet::from_tags([DayTag::Monday, DayTag::Friday]);
        days.select(DayTag::Daily);
        assert!(days.is_daily());
        assert_eq!(days.iter().count(), 1);
    }

    #[test]
    fn test_selecting_weekday_clears_daily() {
        let mut days = DaySet::daily();
        days.select(DayTag::Tuesday);
        assert!(!days.is_daily());
        assert!(days.contains(DayTag::Tuesday));
        assert_eq!(days.iter().count(), 1);
    }

    #[test]
    fn test_stored_days_with_daily_collapse() {
        let days: DaySet = serde_json::from_value(json!(["Monday", "Daily"])).unwrap();
        assert_eq!(days, DaySet::daily());
    }

    #[test]
    fn test_unknown_day_tags_are_dropped() {
        let days: DaySet = serde_json::from_value(json!(["Funday", "Monday"])).unwrap();
        assert_eq!(days, DaySet::from_tags([DayTag::Monday]));
    }

    #[test]
    fn test_day_tag_parsing() {
        assert_eq!("monday".parse::<DayTag>().unwrap(), DayTag::Monday);
        assert_eq!("Sat".parse::<DayTag>().unwrap(), DayTag::Saturday);
        assert_eq!("DAILY".parse::<DayTag>().unwrap(), DayTag::Daily);
        assert!("someday".parse::<DayTag>().is_err());
    }

    #[test]
    fn test_time_of_day_bounds_and_format() {
        assert!(TimeOfDay::new(1439).is_some());
        assert!(TimeOfDay::new(1440).is_none());
        assert_eq!(TimeOfDay::new(540).unwrap().to_string(), "09:00");
        assert_eq!("07:05".parse::<TimeOfDay>().unwrap().minutes(), 425);
        assert_eq!("600".parse::<TimeOfDay>().unwrap().minutes(), 600);
        assert!("24:00".parse::<TimeOfDay>().is_err());
        assert!("9h".parse::<TimeOfDay>().is_err());
    }

    #[test]
    fn test_medicine_json_shape() {
        let medicine = Medicine {
            id: "m1".into(),
            name: "Metformin".into(),
            brand: "Teva".into(),
            days: DaySet::from_tags([DayTag::Monday]),
            time: TimeOfDay::new(540).unwrap(),
            amount: 2,
            weight: 500.0,
            weight_unit: WeightUnit::Mg,
            stock: Stock::Untracked,
            notification_enabled: true,
        };

        let value = serde_json::to_value(&medicine).unwrap();
        assert_eq!(value["weightUnit"], "mg");
        assert_eq!(value["notificationEnabled"], true);
        assert_eq!(value["days"], json!(["Monday"]));
        assert_eq!(value["time"], 540);
        assert!(value.get("stock").is_none());
    }

    #[test]
    fn test_legacy_string_numbers_are_accepted() {
        let value = json!({
            "id": 5,
            "name": "Sample Medicine 1",
            "brand": "Sample Brand 1",
            "days": ["Daily"],
            "time": "1200",
            "amount": "3",
            "weight": "250",
            "weightUnit": "mg",
            "stock": "14"
        });

        let medicine: Medicine = serde_json::from_value(value).unwrap();
        assert_eq!(medicine.id, "5");
        assert_eq!(medicine.time.minutes(), 1200);
        assert_eq!(medicine.amount, 3);
        assert_eq!(medicine.weight, 250.0);
        assert_eq!(medicine.stock, Stock::Tracked(14));
        assert!(medicine.notification_enabled);
    }

    #[test]
    fn test_blank_or_null_stock_is_untracked() {
        for stock in [json!(""), json!(null)] {
            let value = json!({
                "id": "x", "name": "n", "days": ["Daily"], "time": 0, "amount": 1,
                "stock": stock
            });
            let medicine: Medicine = serde_json::from_value(value).unwrap();
            assert_eq!(medicine.stock, Stock::Untracked);
        }
    }

    #[test]
    fn test_zero_amount_is_rejected() {
        let value = json!({
            "id": "x", "name": "n", "days": ["Daily"], "time": 0, "amount": 0
        });
        assert!(serde_json::from_value::<Medicine>(value).is_err());
    }

    #[test]
    fn test_deleted_medicine_flattens_fields() {
        let value = json!({
            "id": "m1",
            "name": "Aspirin",
            "brand": "Bayer",
            "days": ["Sunday"],
            "time": 480,
            "amount": 1,
            "weight": 2.5,
            "weightUnit": "mg",
            "stock": 12,
            "notificationEnabled": false,
            "deletionDate": "2024-03-01"
        });

        let deleted: DeletedMedicine = serde_json::from_value(value.clone()).unwrap();
        assert_eq!(deleted.medicine.stock, Stock::Tracked(12));
        assert_eq!(
            deleted.deletion_date,
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
        );
        assert_eq!(serde_json::to_value(&deleted).unwrap(), value);
    }
}
