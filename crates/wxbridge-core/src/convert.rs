//! Unit conversion helpers.
//!
//! Stations report imperial units only. Every helper takes the raw query
//! text, parses it as a float and returns a rounded number. Absent fields
//! never reach these functions; callers check presence first.

use crate::error::ConvertError;

/// inHg to hPa factor.
pub const HPA_PER_INHG: f64 = 33.8639;
/// mph to km/h factor.
pub const KMH_PER_MPH: f64 = 1.60934;
/// inch to mm factor.
pub const MM_PER_INCH: f64 = 25.4;

/// Parse a raw query value as a float.
pub fn parse_number(raw: &str) -> Result<f64, ConvertError> {
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|_| ConvertError::InvalidNumber(raw.to_string()))?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ConvertError::InvalidNumber(raw.to_string()))
    }
}

/// Round to `decimals` places, ties to even on the exact binary value.
///
/// Precision formatting is exact, so `2.25` rounds to `2.2` and `2.675`
/// (stored slightly below) to `2.67`.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let rounded = format!("{:.*}", decimals as usize, value)
        .parse::<f64>()
        .unwrap_or(value);
    // Avoid rendering "-0.0".
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

/// Round a converted value, rejecting overflow.
fn finish(raw: &str, value: f64, decimals: u32) -> Result<f64, ConvertError> {
    if value.is_finite() {
        Ok(round_to(value, decimals))
    } else {
        Err(ConvertError::InvalidNumber(raw.to_string()))
    }
}

pub fn fahrenheit_to_celsius(raw: &str) -> Result<f64, ConvertError> {
    let f = parse_number(raw)?;
    finish(raw, (f - 32.0) * 5.0 / 9.0, 1)
}

pub fn inhg_to_hpa(raw: &str) -> Result<f64, ConvertError> {
    finish(raw, parse_number(raw)? * HPA_PER_INHG, 1)
}

pub fn mph_to_kmh(raw: &str) -> Result<f64, ConvertError> {
    finish(raw, parse_number(raw)? * KMH_PER_MPH, 1)
}

pub fn inch_to_mm(raw: &str) -> Result<f64, ConvertError> {
    finish(raw, parse_number(raw)? * MM_PER_INCH, 1)
}

/// Round without converting, used for the imperial unit system.
pub fn round_raw(raw: &str, decimals: u32) -> Result<f64, ConvertError> {
    finish(raw, parse_number(raw)?, decimals)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() <= 0.1 + f64::EPSILON
    }

    #[test]
    fn test_fahrenheit_fixed_points() {
        assert_eq!(fahrenheit_to_celsius("32").unwrap(), 0.0);
        assert_eq!(fahrenheit_to_celsius("212").unwrap(), 100.0);
        assert_eq!(fahrenheit_to_celsius("-40").unwrap(), -40.0);
    }

    #[test]
    fn test_freezing_point_is_not_negative_zero() {
        let c = fahrenheit_to_celsius("32.0").unwrap();
        assert!(c.is_sign_positive());
        assert_eq!(format!("{:?}", c), "0.0");
    }

    #[test]
    fn test_pressure() {
        assert!(close(inhg_to_hpa("29.92").unwrap(), 1013.2));
    }

    #[test]
    fn test_speed() {
        assert!(close(mph_to_kmh("10").unwrap(), 16.1));
        assert_eq!(mph_to_kmh("0").unwrap(), 0.0);
    }

    #[test]
    fn test_length() {
        assert_eq!(inch_to_mm("1").unwrap(), 25.4);
        assert_eq!(inch_to_mm("0.01").unwrap(), 0.3);
    }

    #[test]
    fn test_round_raw() {
        assert_eq!(round_raw("0.126", 2).unwrap(), 0.13);
        assert_eq!(round_raw("71.26", 1).unwrap(), 71.3);
    }

    #[test]
    fn test_round_ties_to_even() {
        assert_eq!(round_raw("2.25", 1).unwrap(), 2.2);
        assert_eq!(round_raw("0.125", 2).unwrap(), 0.12);
        assert_eq!(round_raw("0.25", 1).unwrap(), 0.2);
        assert_eq!(round_raw("0.375", 2).unwrap(), 0.38);
        // 2.675 is stored just below the tie.
        assert_eq!(round_raw("2.675", 2).unwrap(), 2.67);
        assert_eq!(round_raw("-0.04", 1).unwrap().to_string(), "0");
    }

    #[test]
    fn test_overflow_is_invalid() {
        assert!(matches!(
            inhg_to_hpa("1e308"),
            Err(ConvertError::InvalidNumber(s)) if s == "1e308"
        ));
        assert!(mph_to_kmh("1.7e308").is_err());
        assert!(inch_to_mm("-1e308").is_err());
        assert!(fahrenheit_to_celsius("1.7e308").is_err());
    }

    #[test]
    fn test_invalid_number() {
        assert!(matches!(
            fahrenheit_to_celsius("abc"),
            Err(ConvertError::InvalidNumber(s)) if s == "abc"
        ));
        assert!(inhg_to_hpa("").is_err());
        assert!(mph_to_kmh("NaN").is_err());
        assert!(inch_to_mm("inf").is_err());
    }

    #[test]
    fn test_whitespace_is_tolerated() {
        assert_eq!(inch_to_mm(" 1 ").unwrap(), 25.4);
    }
}
