// src/utils/rounding.rs

/// Rounds `value` half away from zero to `decimals` places.
///
/// Used only for presentation; algorithms keep full precision.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// Formats a point as `[x.xx ; y.yy]`, two decimals per coordinate.
pub fn format_point<'a, I>(coords: I) -> String
where
    I: IntoIterator<Item = &'a f64>,
{
    let parts: Vec<String> = coords.into_iter().map(|c| format!("{:.2}", c)).collect();
    format!("[{}]", parts.join(" ; "))
}
