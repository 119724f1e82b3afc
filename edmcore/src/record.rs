use chrono::NaiveDateTime;

use crate::schema::{self, NUM_FIELDS};

/// Requested output unit for engine temperatures.
///
/// `Original` emits whatever unit the instrument recorded in, per bit 28 of
/// the flight flags word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TempUnit {
    #[default]
    Original,
    Celsius,
    Fahrenheit,
}

/// One decoded engine sample.
///
/// `values` is ordered by [`schema::FIELDS`]; hosts that prefer key access can
/// go through [`Sample::value`]. Coordinates are `None` until the GPS filter
/// has a reliable fix.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub time: NaiveDateTime,
    pub values: [f64; NUM_FIELDS],
    pub lat: Option<f64>,
    pub long: Option<f64>,
}

impl Sample {
    pub fn value(&self, name: &str) -> Option<f64> {
        schema::field_index(name).map(|idx| self.values[idx])
    }
}
