// SPDX-License-Identifier: Apache-2.0

//! Scalar value formatting and comparison: integers with no
//! fractional part, doubles at 15 significant digits, floats at 6,
//! enumerated values as a label or an ordinal, strings quoted when
//! they contain whitespace.

#[derive(Debug, Clone, PartialEq)]
pub enum ScalarKind {
    Integer,
    Double,
    Float,
    Enumerated { labels: Vec<String>, numerical: bool },
}

pub fn format_scalar(value: f64, kind: &ScalarKind) -> String {
    match kind {
        ScalarKind::Integer => format!("{}", value.round() as i64),
        ScalarKind::Double => format_significant(value, 15),
        ScalarKind::Float => format_significant(value, 6),
        ScalarKind::Enumerated { labels, numerical } => {
            let ordinal = value.round() as i64;
            if *numerical {
                ordinal.to_string()
            } else {
                labels
                    .get(ordinal as usize)
                    .cloned()
                    .unwrap_or_else(|| ordinal.to_string())
            }
        }
    }
}

pub fn format_string_value(s: &str) -> String {
    if s.chars().any(char::is_whitespace) {
        format!("\"{s}\"")
    } else {
        s.to_string()
    }
}

/// Fixed-point rendering with `sig_figs` significant digits. Not a
/// general-purpose float formatter: adequate for the measurement
/// ranges a save/restore snapshot actually carries.
pub fn format_significant(value: f64, sig_figs: i32) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    let exponent = value.abs().log10().floor() as i32;
    let decimals = (sig_figs - 1 - exponent).max(0) as usize;
    format!("{value:.decimals$}")
}

/// Compares two restore-path readings: equal at 15 significant
/// digits, or within the channel's published precision on retry.
pub fn values_match(saved: f64, restored: f64, published_precision: Option<f64>) -> bool {
    if format_significant(saved, 15) == format_significant(restored, 15) {
        return true;
    }
    match published_precision {
        Some(precision) if precision > 0.0 => (saved - restored).abs() <= precision,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_formatting_drops_fraction() {
        assert_eq!(format_scalar(42.0, &ScalarKind::Integer), "42");
    }

    #[test]
    fn double_keeps_fifteen_significant_digits() {
        let formatted = format_scalar(std::f64::consts::PI, &ScalarKind::Double);
        let digits: usize = formatted.chars().filter(|c| c.is_ascii_digit()).count();
        assert_eq!(digits, 15);
    }

    #[test]
    fn float_keeps_six_significant_digits() {
        let formatted = format_scalar(std::f64::consts::PI, &ScalarKind::Float);
        let digits: usize = formatted.chars().filter(|c| c.is_ascii_digit()).count();
        assert_eq!(digits, 6);
    }

    #[test]
    fn enumerated_uses_label_unless_numerical() {
        let kind = ScalarKind::Enumerated {
            labels: vec!["OFF".to_string(), "ON".to_string()],
            numerical: false,
        };
        assert_eq!(format_scalar(1.0, &kind), "ON");
        let numeric_kind = ScalarKind::Enumerated {
            labels: vec!["OFF".to_string(), "ON".to_string()],
            numerical: true,
        };
        assert_eq!(format_scalar(1.0, &numeric_kind), "1");
    }

    #[test]
    fn string_with_whitespace_is_quoted() {
        assert_eq!(format_string_value("hello world"), "\"hello world\"");
        assert_eq!(format_string_value("hello"), "hello");
    }

    #[test]
    fn values_match_retries_at_published_precision() {
        let saved = 1.0;
        let restored = 1.0 + 1e-6;
        assert!(!values_match(saved, restored, None));
        assert!(values_match(saved, restored, Some(1e-5)));
    }
}
