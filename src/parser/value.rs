//! Numeric cell parsing
//!
//! Testers write values like `650.2`, `1.20E-08`, `12.5mV` or `3.2mOHM`.
//! A cell is a number, an optional SI prefix, and an optional unit.

/// Outcome of reading one cell
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CellValue {
    Value(f64),
    /// Blank or an explicit placeholder such as `-`
    Empty,
    /// Text that is not a number
    Invalid,
}

impl CellValue {
    pub fn value(self) -> Option<f64> {
        match self {
            CellValue::Value(v) => Some(v),
            CellValue::Empty | CellValue::Invalid => None,
        }
    }
}

const PLACEHOLDERS: &[&str] = &["-", "--", "N/A", "n/a", "NA", "NaN", "nan"];

// Longest first so "OHM" is not read as "M" + "OHM" leftovers
const UNITS: &[&str] = &["OHM", "Ohm", "ohm", "Ω", "V", "A", "S", "W"];

fn si_multiplier(prefix: &str) -> Option<f64> {
    match prefix {
        "" => Some(1.0),
        "p" => Some(1e-12),
        "n" => Some(1e-9),
        "u" | "µ" | "μ" => Some(1e-6),
        "m" => Some(1e-3),
        "k" | "K" => Some(1e3),
        "M" => Some(1e6),
        "G" => Some(1e9),
        _ => None,
    }
}

/// Length in bytes of the leading decimal / scientific number in `s`
fn numeric_prefix_len(s: &str) -> usize {
    let bytes = s.as_bytes();
    let mut i = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        i += 1;
    }
    let int_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    let mut digits = i - int_start;
    if i < bytes.len() && bytes[i] == b'.' {
        let frac_start = i + 1;
        let mut j = frac_start;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        digits += j - frac_start;
        i = j;
    }
    if digits == 0 {
        return 0;
    }
    // Exponent only counts when digits follow it
    if i < bytes.len() && matches!(bytes[i], b'e' | b'E') {
        let mut j = i + 1;
        if j < bytes.len() && matches!(bytes[j], b'+' | b'-') {
            j += 1;
        }
        let exp_start = j;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        if j > exp_start {
            i = j;
        }
    }
    i
}

fn is_ohm(unit: &str) -> bool {
    matches!(unit, "OHM" | "Ohm" | "ohm" | "Ω")
}

/// Parse one measurement cell
pub fn parse_value(raw: &str) -> CellValue {
    parse_cell(raw, true)
}

/// Parse one `LimitU` / `LimitL` cell
///
/// Resistance data cells are plain milliohm numbers, so a `mOHM` limit keeps
/// its number as written to stay on the same scale.
pub fn parse_limit(raw: &str) -> CellValue {
    parse_cell(raw, false)
}

fn parse_cell(raw: &str, scale_milliohm: bool) -> CellValue {
    let text = raw.trim();
    if text.is_empty() || PLACEHOLDERS.contains(&text) {
        return CellValue::Empty;
    }

    let split = numeric_prefix_len(text);
    if split == 0 {
        return CellValue::Invalid;
    }
    let Ok(number) = text[..split].parse::<f64>() else {
        return CellValue::Invalid;
    };

    let suffix = text[split..].trim_start();
    let (prefix, unit) = UNITS
        .iter()
        .find_map(|unit| suffix.strip_suffix(unit).map(|p| (p, *unit)))
        .unwrap_or((suffix, ""));

    let multiplier = if prefix == "m" && is_ohm(unit) && !scale_milliohm {
        Some(1.0)
    } else {
        si_multiplier(prefix)
    };
    match multiplier {
        Some(mult) if (number * mult).is_finite() => CellValue::Value(number * mult),
        _ => CellValue::Invalid,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(cell: CellValue, expected: f64) -> bool {
        match cell {
            CellValue::Value(v) => ((v - expected) / expected).abs() < 1e-12,
            _ => false,
        }
    }

    #[test]
    fn test_plain_numbers() {
        assert_eq!(parse_value("650.2"), CellValue::Value(650.2));
        assert_eq!(parse_value("-3"), CellValue::Value(-3.0));
        assert_eq!(parse_value("+.5"), CellValue::Value(0.5));
        assert_eq!(parse_value("  42  "), CellValue::Value(42.0));
    }

    #[test]
    fn test_scientific_notation() {
        assert!(close(parse_value("1.20E-08"), 1.2e-8));
        assert!(close(parse_value("3e2"), 300.0));
        assert!(close(parse_value("-4.5e+3"), -4500.0));
    }

    #[test]
    fn test_prefixes_and_units() {
        assert!(close(parse_value("12.5mV"), 0.0125));
        assert!(close(parse_value("3.2mOHM"), 0.0032));
        assert!(close(parse_value("20nA"), 2e-8));
        assert!(close(parse_value("1.5u"), 1.5e-6));
        assert!(close(parse_value("7 µA"), 7e-6));
        assert!(close(parse_value("700V"), 700.0));
        assert!(close(parse_value("2k"), 2000.0));
        assert!(close(parse_value("1.1MOHM"), 1.1e6));
    }

    #[test]
    fn test_limit_milliohm_stays_unscaled() {
        assert_eq!(parse_limit("3.2mOHM"), CellValue::Value(3.2));
        assert_eq!(parse_limit("1.0mohm"), CellValue::Value(1.0));
        assert!(close(parse_limit("12.5mV"), 0.0125));
        assert!(close(parse_limit("20nA"), 2e-8));
        assert!(close(parse_limit("1.1MOHM"), 1.1e6));
        assert_eq!(parse_limit("-"), CellValue::Empty);
    }

    #[test]
    fn test_placeholders_are_empty() {
        assert_eq!(parse_value(""), CellValue::Empty);
        assert_eq!(parse_value("   "), CellValue::Empty);
        assert_eq!(parse_value("-"), CellValue::Empty);
        assert_eq!(parse_value("N/A"), CellValue::Empty);
    }

    #[test]
    fn test_garbage_is_invalid() {
        assert_eq!(parse_value("FAIL"), CellValue::Invalid);
        assert_eq!(parse_value("12.3.4"), CellValue::Invalid);
        assert_eq!(parse_value("5xyz"), CellValue::Invalid);
        assert_eq!(parse_value("."), CellValue::Invalid);
        assert_eq!(parse_value("1e"), CellValue::Invalid);
        assert_eq!(parse_value("1e999"), CellValue::Invalid);
    }
}
