//! Length units for reported measurements and numeric rounding helpers.

/// Unit attached to every linear field of a measurement.
///
/// `Pixels` is a sentinel for uncalibrated output: the pipeline still runs
/// and reports geometry, but no real-world scale was available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LengthUnit {
    /// Millimeters. Default reporting unit.
    #[default]
    Millimeters,
    /// Centimeters.
    Centimeters,
    /// Meters.
    Meters,
    /// Inches.
    Inches,
    /// Raw pixels, used when no valid calibration exists.
    Pixels,
}

impl LengthUnit {
    /// Millimeters per one of this unit.
    ///
    /// `Pixels` carries no physical size; it maps to 1.0 so that converting
    /// through it is the identity and never divides by zero.
    pub fn millimeters_per_unit(self) -> f64 {
        match self {
            LengthUnit::Millimeters | LengthUnit::Pixels => 1.0,
            LengthUnit::Centimeters => 10.0,
            LengthUnit::Meters => 1000.0,
            LengthUnit::Inches => 25.4,
        }
    }

    /// Converts a length expressed in `self` into `target`.
    pub fn convert(self, value: f64, target: LengthUnit) -> f64 {
        if self == target {
            return value;
        }
        value * self.millimeters_per_unit() / target.millimeters_per_unit()
    }

    /// Converts an area expressed in `self()²` into `target²`.
    pub fn convert_area(self, value: f64, target: LengthUnit) -> f64 {
        if self == target {
            return value;
        }
        let f = self.millimeters_per_unit() / target.millimeters_per_unit();
        value * f * f
    }

    /// Short suffix for display ("mm", "cm", "m", "in", "px").
    pub fn suffix(self) -> &'static str {
        match self {
            LengthUnit::Millimeters => "mm",
            LengthUnit::Centimeters => "cm",
            LengthUnit::Meters => "m",
            LengthUnit::Inches => "in",
            LengthUnit::Pixels => "px",
        }
    }
}

/// Rounds `value` to `decimals` decimal places (half away from zero).
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_round_trip_is_lossless() {
        let mm = 125.7;
        let cm = LengthUnit::Millimeters.convert(mm, LengthUnit::Centimeters);
        assert!((cm - 12.57).abs() < 1e-12);
        let back = LengthUnit::Centimeters.convert(cm, LengthUnit::Millimeters);
        assert!((back - mm).abs() < 1e-9);
    }

    #[test]
    fn inch_conversion_uses_exact_factor() {
        let inches = LengthUnit::Millimeters.convert(25.4, LengthUnit::Inches);
        assert!((inches - 1.0).abs() < 1e-12);
    }

    #[test]
    fn area_conversion_squares_the_factor() {
        let cm2 = LengthUnit::Millimeters.convert_area(100.0, LengthUnit::Centimeters);
        assert!((cm2 - 1.0).abs() < 1e-12);
    }

    #[test]
    fn pixels_convert_as_identity() {
        let v = LengthUnit::Pixels.convert(42.0, LengthUnit::Pixels);
        assert_eq!(v, 42.0);
    }

    #[test]
    fn rounding_respects_decimals() {
        assert_eq!(round_to(1.23456, 2), 1.23);
        assert_eq!(round_to(2.5, 0), 3.0);
        assert_eq!(round_to(-2.5, 0), -3.0);
        assert_eq!(round_to(7.0, 3), 7.0);
    }
}
