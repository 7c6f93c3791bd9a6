use std::fmt;

use crate::constants::KG_TO_LB;

/// Raw weights are hundredths of a kilogram.
pub fn kg_of(raw: u16) -> f64 {
    f64::from(raw) / 100.0
}

/// Pounds rounded to one decimal place, halves away from zero.
pub fn lb_of(kg: f64) -> f64 {
    (kg * KG_TO_LB * 10.0).round() / 10.0
}

/// A weight as reported by the scale together with its conversions.
///
/// The fields are private so that `kg` and `lb` can only ever be derived
/// from the same `raw` value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightReading {
    raw: u16,
    kg: f64,
    lb: f64,
}

impl WeightReading {
    pub fn from_raw(raw: u16) -> Self {
        let kg = kg_of(raw);
        Self {
            raw,
            kg,
            lb: lb_of(kg),
        }
    }

    pub fn raw(&self) -> u16 {
        self.raw
    }

    pub fn kg(&self) -> f64 {
        self.kg
    }

    pub fn lb(&self) -> f64 {
        self.lb
    }
}

impl fmt::Display for WeightReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Raw: {} {}kg {}lb", self.raw, self.kg, self.lb)
    }
}
