//! Result rounding and canonical decimal rendering.

/// Fraction digits kept on the display.
pub const DEFAULT_DECIMAL_PLACES: u32 = 8;

/// Round half away from zero at `places` fraction digits.
///
/// Values too large to scale are returned unchanged; they have no
/// representable fraction digits at that magnitude anyway. The same holds
/// for place counts beyond `i32::MAX`.
pub fn round_to_places(value: f64, places: u32) -> f64 {
    let exponent = i32::try_from(places).unwrap_or(i32::MAX);
    let factor = 10f64.powi(exponent);
    let scaled = value * factor;
    if !scaled.is_finite() {
        return value;
    }
    scaled.round() / factor
}

/// Shortest round-tripping decimal text, never in exponent form.
pub fn format_result(value: f64) -> String {
    if value == 0.0 {
        // Covers -0.0 as well.
        return "0".to_string();
    }
    format!("{}", value)
}

/// Round then render, as done for every successful evaluation.
pub fn format_rounded(value: f64, places: u32) -> String {
    format_result(round_to_places(value, places))
}
