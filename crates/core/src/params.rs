//! Helpers for reading field constants out of a `serde_json::Value` object.
//!
//! Missing keys and wrongly typed values fall back to the supplied default,
//! so a field can always be built from a partial (or empty) params object.

use glam::DVec2;
use serde_json::Value;

/// Extracts an `f64` from `params[name]`, returning `default` if missing or wrong type.
///
/// Accepts both JSON numbers (including integers) and converts them to f64.
pub fn param_f64(params: &Value, name: &str, default: f64) -> f64 {
    params.get(name).and_then(Value::as_f64).unwrap_or(default)
}

/// Extracts a point from the pair of keys `x_name`/`y_name`.
///
/// Each coordinate falls back independently to the matching component of `default`.
pub fn param_point(params: &Value, x_name: &str, y_name: &str, default: DVec2) -> DVec2 {
    DVec2::new(
        param_f64(params, x_name, default.x),
        param_f64(params, y_name, default.y),
    )
}
