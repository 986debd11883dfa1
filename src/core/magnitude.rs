//! Scale-suffixed magnitudes such as `"$83.2B"` or `"750M"`.
//!
//! Parsing and formatting share one suffix table so a value rendered with
//! [`format_magnitude`] parses back to (approximately) the same number.
use serde::{Deserialize, Serialize};
use std::fmt::Display;

const SCALES: [(char, f64); 3] = [('B', 1e9), ('M', 1e6), ('K', 1e3)];
const CURRENCY_SYMBOLS: [char; 4] = ['$', '€', '£', '¥'];

/// A magnitude as it arrives from a provider: either a raw total or a
/// pre-formatted display string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Magnitude {
    Amount(f64),
    Text(String),
}

impl Magnitude {
    /// Numeric form, if the magnitude can be parsed.
    pub fn value(&self) -> Option<f64> {
        parse_magnitude(Some(self))
    }

    /// Human-scaled display form. Text is returned as given.
    pub fn display(&self) -> String {
        match self {
            Magnitude::Amount(v) => format_magnitude(*v),
            Magnitude::Text(s) => s.clone(),
        }
    }
}

impl Display for Magnitude {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display())
    }
}

impl From<f64> for Magnitude {
    fn from(value: f64) -> Self {
        Magnitude::Amount(value)
    }
}

impl From<&str> for Magnitude {
    fn from(value: &str) -> Self {
        Magnitude::Text(value.to_string())
    }
}

/// Converts an optional magnitude into a plain number.
///
/// `None` and the `"N/A"` sentinel give `None`, numbers pass through
/// unchanged and text goes through [`parse_magnitude_str`].
pub fn parse_magnitude(value: Option<&Magnitude>) -> Option<f64> {
    match value? {
        Magnitude::Amount(v) => v.is_finite().then_some(*v),
        Magnitude::Text(s) => parse_magnitude_str(s),
    }
}

/// Parses text like `"$1.50B"`, `"750m"`, `"-$2,500K"` or `"1234.5"`.
///
/// Never fails loudly: anything that does not reduce to a finite float is
/// `None`.
pub fn parse_magnitude_str(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("N/A") {
        return None;
    }

    let (negative, rest) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest.trim_start()),
        None => (false, trimmed),
    };
    let rest = rest.strip_prefix(CURRENCY_SYMBOLS).unwrap_or(rest);
    if negative && rest.trim_start().starts_with(['-', '+']) {
        return None;
    }
    let mut clean: String = rest.chars().filter(|c| *c != ',').collect();
    clean = clean.trim().to_string();

    let mut multiplier = 1.0;
    if let Some(last) = clean.chars().last() {
        let upper = last.to_ascii_uppercase();
        if let Some((_, scale)) = SCALES.iter().find(|(suffix, _)| *suffix == upper) {
            multiplier = *scale;
            clean.pop();
        }
    }

    let number: f64 = clean.trim_end().parse().ok()?;
    let signed = if negative { -number } else { number };
    let result = signed * multiplier;
    result.is_finite().then_some(result)
}

/// Renders a total as `"$X.XXB"`, `"$X.XXM"`, `"$X.XXK"` or `"$X.XX"`.
pub fn format_magnitude(value: f64) -> String {
    let sign = if value < 0.0 { "-" } else { "" };
    let abs = value.abs();
    match SCALES.iter().find(|(_, scale)| abs >= *scale) {
        Some((suffix, scale)) => format!("{sign}${:.2}{suffix}", abs / scale),
        None => format!("{sign}${abs:.2}"),
    }
}

/// Renders a share volume as `"X.XM"`, `"X.XK"` or a whole number.
pub fn format_volume(volume: f64) -> String {
    if volume >= 1e6 {
        format!("{:.1}M", volume / 1e6)
    } else if volume >= 1e3 {
        format!("{:.1}K", volume / 1e3)
    } else {
        format!("{volume:.0}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_suffixes() {
        assert_eq!(parse_magnitude_str("$1.50B"), Some(1_500_000_000.0));
        assert_eq!(parse_magnitude_str("750M"), Some(750_000_000.0));
        assert_eq!(parse_magnitude_str("12k"), Some(12_000.0));
        assert_eq!(parse_magnitude_str("$83.2b"), Some(83_200_000_000.0));
        assert_eq!(parse_magnitude_str("1,234.5"), Some(1234.5));
        assert_eq!(parse_magnitude_str("  $2,500K "), Some(2_500_000.0));
    }

    #[test]
    fn test_parse_sentinels_and_garbage() {
        assert_eq!(parse_magnitude(None), None);
        assert_eq!(parse_magnitude_str("N/A"), None);
        assert_eq!(parse_magnitude_str("n/a"), None);
        assert_eq!(parse_magnitude_str(""), None);
        assert_eq!(parse_magnitude_str("$"), None);
        assert_eq!(parse_magnitude_str("B"), None);
        assert_eq!(parse_magnitude_str("lots"), None);
        assert_eq!(parse_magnitude_str("inf"), None);
        assert_eq!(parse_magnitude_str("NaN"), None);
    }

    #[test]
    fn test_parse_keeps_sign() {
        assert_eq!(parse_magnitude_str("-750M"), Some(-750_000_000.0));
        assert_eq!(parse_magnitude_str("-$1.5B"), Some(-1_500_000_000.0));
        assert_eq!(parse_magnitude_str("$-2K"), Some(-2_000.0));
    }

    #[test]
    fn test_parse_rejects_doubled_sign() {
        assert_eq!(parse_magnitude_str("--5"), None);
        assert_eq!(parse_magnitude_str("- -5M"), None);
        assert_eq!(parse_magnitude_str("-$-1.5B"), None);
        assert_eq!(parse_magnitude_str("-+5"), None);
    }

    #[test]
    fn test_numeric_input_is_unchanged() {
        assert_eq!(parse_magnitude(Some(&Magnitude::Amount(42.0))), Some(42.0));
        assert_eq!(parse_magnitude(Some(&Magnitude::Amount(-3.5))), Some(-3.5));
        assert_eq!(parse_magnitude(Some(&Magnitude::Amount(f64::NAN))), None);
        let once = parse_magnitude(Some(&Magnitude::from("$10B"))).unwrap();
        assert_eq!(parse_magnitude(Some(&Magnitude::Amount(once))), Some(once));
    }

    #[test]
    fn test_format_magnitude() {
        assert_eq!(format_magnitude(83_200_000_000.0), "$83.20B");
        assert_eq!(format_magnitude(1_500_000.0), "$1.50M");
        assert_eq!(format_magnitude(2_500.0), "$2.50K");
        assert_eq!(format_magnitude(999.0), "$999.00");
        assert_eq!(format_magnitude(0.0), "$0.00");
        assert_eq!(format_magnitude(-1_500_000_000.0), "-$1.50B");
    }

    #[test]
    fn test_format_parse_round_trip() {
        for value in [1_500_000_000.0, 83_200_000_000.0, 750_000_000.0, 12_340.0, 42.5] {
            let parsed = parse_magnitude_str(&format_magnitude(value)).unwrap();
            assert!((parsed - value).abs() / value < 0.005, "{value} -> {parsed}");
        }
        for text in ["$1.50B", "$750.00M", "$12.00K", "$9.99"] {
            let value = parse_magnitude_str(text).unwrap();
            assert_eq!(format_magnitude(value), text);
        }
    }

    #[test]
    fn test_magnitude_display() {
        assert_eq!(Magnitude::Amount(10e9).display(), "$10.00B");
        assert_eq!(Magnitude::from("$10B").display(), "$10B");
        assert_eq!(Magnitude::from("$10B").value(), Some(10e9));
    }

    #[test]
    fn test_format_volume() {
        assert_eq!(format_volume(3_456_789.0), "3.5M");
        assert_eq!(format_volume(45_600.0), "45.6K");
        assert_eq!(format_volume(999.0), "999");
        assert_eq!(format_volume(0.0), "0");
    }

    #[test]
    fn test_magnitude_deserializes_untagged() {
        let m: Magnitude = serde_json::from_str("83200000000").unwrap();
        assert_eq!(m, Magnitude::Amount(83_200_000_000.0));
        let m: Magnitude = serde_json::from_str("\"$83.2B\"").unwrap();
        assert_eq!(m, Magnitude::Text("$83.2B".to_string()));
    }
}
