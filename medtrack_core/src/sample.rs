//! Built-in demonstration data.

use crate::types::*;
use once_cell::sync::Lazy;

/// Cached sample collection - built once and reused
static SAMPLE_MEDICINES: Lazy<Vec<Medicine>> = Lazy::new(build_sample_medicines);

/// Sample medicines for trying the app out
pub fn sample_medicines() -> &'static [Medicine] {
    &SAMPLE_MEDICINES
}

type SampleRow = (
    &'static str,
    &'static str,
    &'static str,
    &'static [DayTag],
    TimeOfDay,
    u32,
    f64,
    WeightUnit,
    Option<u32>,
);

const SAMPLE_ROWS: [SampleRow; 6] = [
    ("sample-1", "Paracetamol", "Sandoz", &[DayTag::Daily], TimeOfDay::at(8, 0), 2, 500.0, WeightUnit::Mg, Some(40)),
    ("sample-2", "Levothyroxine", "Teva", &[DayTag::Daily], TimeOfDay::at(7, 0), 1, 100.0, WeightUnit::Mcg, Some(90)),
    ("sample-3", "Metformin", "Mylan", &[DayTag::Daily], TimeOfDay::at(18, 0), 1, 850.0, WeightUnit::Mg, Some(25)),
    ("sample-4", "Methotrexate", "Accord", &[DayTag::Monday], TimeOfDay::at(9, 0), 4, 2.5, WeightUnit::Mg, Some(24)),
    ("sample-5", "Folic acid", "Teva", &[DayTag::Tuesday, DayTag::Thursday], TimeOfDay::at(9, 0), 1, 5.0, WeightUnit::Mg, None),
    ("sample-6", "Vitamin D", "Davitamon", &[DayTag::Sunday], TimeOfDay::at(10, 0), 1, 25.0, WeightUnit::Mcg, Some(12)),
];

fn build_sample_medicines() -> Vec<Medicine> {
    SAMPLE_ROWS
        .iter()
        .map(
            |&(id, name, brand, days, time, amount, weight, weight_unit, stock)| Medicine {
                id: id.into(),
                name: name.into(),
                brand: brand.into(),
                days: DaySet::from_tags(days.iter().copied()),
                time,
                amount,
                weight,
                weight_unit,
                stock: stock.into(),
                notification_enabled: true,
            },
        )
        .collect()
}
