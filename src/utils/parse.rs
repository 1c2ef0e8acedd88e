// src/utils/parse.rs
use crate::core::{Dataset, MiningError, Points, Result};

/// Parses comma-separated coordinates, one point per line.
///
/// Blank lines are skipped. Every point must have the same number of
/// coordinates as the first one.
pub fn parse_points(text: &str) -> Result<Points> {
    let mut width: Option<usize> = None;
    let mut values: Vec<f64> = Vec::new();
    let mut n_points = 0;

    for (idx, line) in text.lines().enumerate() {
        let line_no = idx + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let coords = trimmed
            .split(',')
            .map(|field| {
                field.trim().parse::<f64>().map_err(|e| MiningError::Parse {
                    line: line_no,
                    message: format!("'{}' is not a number ({})", field.trim(), e),
                })
            })
            .collect::<Result<Vec<f64>>>()?;

        match width {
            None => width = Some(coords.len()),
            Some(w) if w != coords.len() => {
                return Err(MiningError::Parse {
                    line: line_no,
                    message: format!("expected {} coordinates, found {}", w, coords.len()),
                });
            }
            Some(_) => {}
        }
        values.extend(coords);
        n_points += 1;
    }

    Ok(Points::from_shape_vec((n_points, width.unwrap_or(0)), values)?)
}

/// Pulls two numeric columns out of a table as a point matrix.
pub fn points_from_columns(data: &Dataset, x: &str, y: &str) -> Result<Points> {
    let xi = data.require_column(x)?;
    let yi = data.require_column(y)?;

    let mut values = Vec::with_capacity(data.len() * 2);
    for (r, row) in data.rows().iter().enumerate() {
        for &c in &[xi, yi] {
            let v = row[c].as_f64().ok_or_else(|| {
                MiningError::invalid_dataset(format!(
                    "row {} column '{}' holds non-numeric value '{}'",
                    r, data.columns()[c], row[c]
                ))
            })?;
            values.push(v);
        }
    }
    Ok(Points::from_shape_vec((data.len(), 2), values)?)
}
