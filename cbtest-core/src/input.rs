//! Conversions applied where user input enters the state store.
//!
//! Rates are edited as percentages (`3` meaning 3%) but stored as fractions
//! (`0.03`). The compiler only ever sees the stored fraction, so these
//! functions are the one place the two representations meet.

/// `3.0` → `0.03`.
pub fn percent_to_fraction(percent: f64) -> f64 {
    percent / 100.0
}

/// `0.03` → `3.0`, for display in percent form.
pub fn fraction_to_percent(fraction: f64) -> f64 {
    fraction * 100.0
}

/// Coerce free text to a number.
///
/// Anything that does not parse as a decimal (including empty input) becomes
/// NaN. The store accepts NaN so typing is never blocked; compilation rejects it.
pub fn coerce_number(text: &str) -> f64 {
    text.trim().parse::<f64>().unwrap_or(f64::NAN)
}

/// Coerce percent text (`"3"`) to a stored fraction (`0.03`).
pub fn coerce_percent(text: &str) -> f64 {
    percent_to_fraction(coerce_number(text))
}
