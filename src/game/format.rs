//! Scaled number formatting for resource displays.

/// Suffixes for successive powers of 1000 above the plain range.
const SUFFIXES: &[&str] = &["k", "M", "B", "T", "P", "E"];

/// Two-decimal rendering that never displays the tier boundary itself:
/// values that would round up to "1000.00" clamp to "999.99", so crossing
/// into the next tier is decided by the value, not by rounding.
fn two_decimals(value: f64) -> String {
    let s = format!("{:.2}", value);
    if s == "1000.00" {
        "999.99".to_string()
    } else {
        s
    }
}

/// Format a non-negative magnitude for display.
///
/// Values below 1000 render at two-decimal precision (or as a floored
/// integer in `integer_mode`). From 1000 upward the value is scaled down
/// by powers of 1000 through the suffix table; past the last suffix it
/// falls back to scientific notation with two fractional digits.
pub fn format_scaled(value: f64, integer_mode: bool) -> String {
    if value < 1000.0 {
        return if integer_mode {
            format!("{}", value.floor() as u64)
        } else {
            two_decimals(value)
        };
    }

    let mut tier = 0usize;
    let mut probe = value;
    while probe >= 1000.0 && tier < SUFFIXES.len() {
        probe /= 1000.0;
        tier += 1;
    }
    if probe >= 1000.0 {
        return exponential(value);
    }

    // Single division for the displayed mantissa.
    let scaled = value / 1000f64.powi(tier as i32);
    let suffix = SUFFIXES[tier - 1];
    if integer_mode {
        format!("{}{}", scaled.floor() as u64, suffix)
    } else {
        format!("{}{}", two_decimals(scaled), suffix)
    }
}

/// `m.mme+X` with two fractional digits, for magnitudes past the suffix table.
fn exponential(value: f64) -> String {
    let mut mantissa = value;
    let mut exp = 0u32;
    while mantissa >= 10.0 {
        mantissa /= 10.0;
        exp += 1;
    }
    format!("{:.2}e+{}", mantissa, exp)
}
