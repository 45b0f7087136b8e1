//! Plain-text dataset ingest.
//!
//! The accepted format is one `(x, y)` pair per line. Values are separated at
//! the last space on the line, or at the last tab when there is no space, so
//! exports from spreadsheets and hand-edited files both load without
//! preprocessing. Blank and malformed lines are skipped, but each skip is
//! recorded so the caller can report what happened.

use std::fs;
use std::path::Path;

use crate::domain::DataPoint;
use crate::error::AppError;

/// A line that could not be parsed into a data point.
#[derive(Debug, Clone)]
pub struct LineError {
    /// 1-based line number in the input.
    pub line: usize,
    pub message: String,
}

/// Ingest output: parsed points plus skip diagnostics.
#[derive(Debug, Clone)]
pub struct ParsedData {
    pub points: Vec<DataPoint>,
    pub line_errors: Vec<LineError>,
    pub lines_read: usize,
}

/// Load data points from a text file.
pub fn load_datapoints(path: &Path) -> Result<ParsedData, AppError> {
    let text = fs::read_to_string(path).map_err(|e| {
        AppError::usage(format!("Failed to read data file '{}': {e}", path.display()))
    })?;
    let parsed = parse_datapoints(&text);
    if parsed.points.is_empty() {
        return Err(AppError::insufficient(format!(
            "No valid data points in '{}'.",
            path.display()
        )));
    }
    Ok(parsed)
}

/// Parse data points from raw text.
pub fn parse_datapoints(text: &str) -> ParsedData {
    let mut points = Vec::new();
    let mut line_errors = Vec::new();
    let mut lines_read = 0;

    for (idx, raw) in text.lines().enumerate() {
        let line = idx + 1;
        lines_read += 1;

        // Trim before locating the separator so trailing whitespace from
        // pasted spreadsheet text cannot become an empty y-value.
        let raw = raw.trim();
        if raw.is_empty() {
            continue;
        }

        match parse_line(raw) {
            Ok(point) => points.push(point),
            Err(message) => line_errors.push(LineError { line, message }),
        }
    }

    ParsedData {
        points,
        line_errors,
        lines_read,
    }
}

fn parse_line(line: &str) -> Result<DataPoint, String> {
    // Split at the last space; fall back to the last tab. Splitting from the
    // right keeps x-values that contain their own separators intact only when
    // the y-value does not, which matches how pasted tables break.
    let split = line
        .rfind(' ')
        .or_else(|| line.rfind('\t'))
        .ok_or_else(|| "No separator (space or tab) found.".to_string())?;

    let (x_str, y_str) = line.split_at(split);
    let y_str = &y_str[1..];

    let x: f64 = x_str
        .trim()
        .parse()
        .map_err(|_| format!("Invalid x value '{}'.", x_str.trim()))?;
    let y: f64 = y_str
        .trim()
        .parse()
        .map_err(|_| format!("Invalid y value '{}'.", y_str.trim()))?;

    if !(x.is_finite() && y.is_finite()) {
        return Err("Non-finite value.".to_string());
    }

    Ok(DataPoint { x, y })
}
