/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! printf-style number formatting for the text files consumed by backengines

/// Format `value` like C's `%.{precision}e` (or `%E` when `uppercase` is set).
///
/// Rust's `{:e}` omits the exponent sign and padding (`1.5e-9`), while the
/// Fortran and C codes reading our files expect `1.5e-09`.
pub fn format_exponent(value: f64, precision: usize, uppercase: bool) -> String {
    if !value.is_finite() {
        let text = if value.is_nan() {
            "nan".to_string()
        } else if value > 0.0 {
            "inf".to_string()
        } else {
            "-inf".to_string()
        };
        return if uppercase { text.to_uppercase() } else { text };
    }

    let formatted = format!("{:.*e}", precision, value);
    let (mantissa, exponent) = match formatted.split_once('e') {
        Some(parts) => parts,
        None => return formatted,
    };
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let sign = if exponent < 0 { '-' } else { '+' };
    let marker = if uppercase { 'E' } else { 'e' };

    format!("{}{}{}{:02}", mantissa, marker, sign, exponent.abs())
}
