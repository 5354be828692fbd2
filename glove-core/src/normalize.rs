use std::fmt;

use serde::{Deserialize, Serialize};

/// Adjusted values below this are an open finger.
pub const LOWER_BOUND: u32 = 10;
/// Adjusted values above this are a closed finger.
pub const UPPER_BOUND: u32 = 40;
/// Full scale of the glove's 10-bit ADC.
pub const ADC_FULL_SCALE: f64 = 1023.0;

/// Three-level flex quantization consumed downstream. Only 0, 50 and 100 exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FlexBucket {
    Open,
    Half,
    Closed,
}

impl FlexBucket {
    pub const fn from_adjusted(adjusted: u32) -> Self {
        if adjusted < LOWER_BOUND {
            FlexBucket::Open
        } else if adjusted > UPPER_BOUND {
            FlexBucket::Closed
        } else {
            FlexBucket::Half
        }
    }

    pub const fn value(self) -> u32 {
        match self {
            FlexBucket::Open => 0,
            FlexBucket::Half => 50,
            FlexBucket::Closed => 100,
        }
    }
}

impl fmt::Display for FlexBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}

/// `floor(raw / max_scale * 100)`, saturating.
pub fn adjust(raw: u32, max_scale: f64) -> u32 {
    (f64::from(raw) * 100.0 / max_scale).floor() as u32
}

pub fn normalize(raw: u32, max_scale: f64) -> FlexBucket {
    FlexBucket::from_adjusted(adjust(raw, max_scale))
}

/// [`normalize`] bound to one full-scale value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlexNormalizer {
    max_scale: f64,
}

impl FlexNormalizer {
    pub fn new(max_scale: f64) -> Self {
        Self { max_scale }
    }

    pub fn normalize(&self, raw: u32) -> FlexBucket {
        normalize(raw, self.max_scale)
    }
}

impl Default for FlexNormalizer {
    fn default() -> Self {
        Self::new(ADC_FULL_SCALE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_boundaries() {
        assert_eq!(FlexBucket::from_adjusted(9), FlexBucket::Open);
        assert_eq!(FlexBucket::from_adjusted(10), FlexBucket::Half);
        assert_eq!(FlexBucket::from_adjusted(40), FlexBucket::Half);
        assert_eq!(FlexBucket::from_adjusted(41), FlexBucket::Closed);
    }

    #[test]
    fn adjust_floors_onto_percent_scale() {
        assert_eq!(adjust(0, ADC_FULL_SCALE), 0);
        assert_eq!(adjust(1023, ADC_FULL_SCALE), 100);
        // 102 / 1023 * 100 = 9.97
        assert_eq!(adjust(102, ADC_FULL_SCALE), 9);
        assert_eq!(adjust(41, 100.0), 41);
    }

    #[test]
    fn boundaries_through_raw_values() {
        assert_eq!(normalize(9, 100.0).value(), 0);
        assert_eq!(normalize(10, 100.0).value(), 50);
        assert_eq!(normalize(40, 100.0).value(), 50);
        assert_eq!(normalize(41, 100.0).value(), 100);
    }

    #[test]
    fn output_is_three_valued_and_monotonic() {
        let normalizer = FlexNormalizer::default();
        let mut previous = FlexBucket::Open;
        for raw in 0..=2048 {
            let bucket = normalizer.normalize(raw);
            assert!([0, 50, 100].contains(&bucket.value()));
            assert!(bucket >= previous, "raw {raw} went down");
            previous = bucket;
        }
        assert_eq!(normalizer.normalize(u32::MAX), FlexBucket::Closed);
    }

    #[test]
    fn displays_as_bucket_value() {
        assert_eq!(FlexBucket::Half.to_string(), "50");
    }
}
