//! Hand-rolled CSV loader for `backtest_engine`. No quoting support — the
//! expected input is a plain numeric OHLCV export, not arbitrary CSV, so a
//! dependency on a general-purpose CSV crate buys nothing here.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use tc_primitives::{Candle, Decimal8};

#[derive(Debug)]
pub enum LoadError {
    Io(std::io::Error),
    EmptyFile,
    MissingColumn(&'static str),
    BadRow { line: usize, detail: String },
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::Io(e) => write!(f, "io error: {e}"),
            LoadError::EmptyFile => write!(f, "csv file has no rows"),
            LoadError::MissingColumn(c) => write!(f, "missing required column: {c}"),
            LoadError::BadRow { line, detail } => write!(f, "line {line}: {detail}"),
        }
    }
}

impl std::error::Error for LoadError {}

impl From<std::io::Error> for LoadError {
    fn from(e: std::io::Error) -> Self {
        LoadError::Io(e)
    }
}

/// Splits on commas with no quoting or escaping. Good enough for the plain
/// `time,open,high,low,close,tick_volume` exports this command consumes.
fn split_csv_line(line: &str) -> Vec<&str> {
    line.split(',').map(|s| s.trim()).collect()
}

fn header_index(header: &[&str]) -> BTreeMap<String, usize> {
    header.iter().enumerate().map(|(i, name)| (name.to_lowercase(), i)).collect()
}

fn parse_time(raw: &str, line: usize) -> Result<DateTime<Utc>, LoadError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    // Accept a bare `YYYY-MM-DDTHH:MM:SS` with no offset, treated as UTC —
    // the most common export shape from charting tools.
    let with_z = format!("{raw}Z");
    DateTime::parse_from_rfc3339(&with_z)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| LoadError::BadRow { line, detail: format!("bad time '{raw}': {e}") })
}

fn parse_decimal(raw: &str, field: &'static str, line: usize) -> Result<Decimal8, LoadError> {
    raw.parse::<f64>()
        .map(Decimal8::from_f64)
        .map_err(|e| LoadError::BadRow { line, detail: format!("bad {field} '{raw}': {e}") })
}

fn parse_tick_volume(raw: Option<&str>) -> i64 {
    raw.and_then(|s| if s.is_empty() { None } else { s.parse::<i64>().ok() }).unwrap_or(0)
}

/// Columns: `time,open,high,low,close[,tick_volume]`. Extra columns are
/// ignored; `tick_volume` defaults to 0 when absent or blank.
pub fn parse_csv_bars(content: &str) -> Result<Vec<Candle>, LoadError> {
    let mut lines = content.lines();
    let header_line = lines.next().ok_or(LoadError::EmptyFile)?;
    let header = split_csv_line(header_line);
    let idx = header_index(&header);

    let time_i = *idx.get("time").ok_or(LoadError::MissingColumn("time"))?;
    let open_i = *idx.get("open").ok_or(LoadError::MissingColumn("open"))?;
    let high_i = *idx.get("high").ok_or(LoadError::MissingColumn("high"))?;
    let low_i = *idx.get("low").ok_or(LoadError::MissingColumn("low"))?;
    let close_i = *idx.get("close").ok_or(LoadError::MissingColumn("close"))?;
    let volume_i = idx.get("tick_volume").copied();

    let mut bars = Vec::new();
    for (offset, raw_line) in lines.enumerate() {
        let line = offset + 2; // 1-based, header consumed line 1
        if raw_line.trim().is_empty() {
            continue;
        }
        let fields = split_csv_line(raw_line);
        let field = |i: usize| -> Option<&str> { fields.get(i).copied() };

        let time = parse_time(field(time_i).unwrap_or(""), line)?;
        let open = parse_decimal(field(open_i).unwrap_or(""), "open", line)?;
        let high = parse_decimal(field(high_i).unwrap_or(""), "high", line)?;
        let low = parse_decimal(field(low_i).unwrap_or(""), "low", line)?;
        let close = parse_decimal(field(close_i).unwrap_or(""), "close", line)?;
        let tick_volume = parse_tick_volume(volume_i.and_then(field));

        bars.push(Candle::new(time, open, high, low, close, tick_volume));
    }

    bars.sort_by_key(|c| c.time);
    Ok(bars)
}

/// Loads `path`, keeping only the most recent `limit` bars when given.
pub fn load_csv_file(path: impl AsRef<Path>, limit: Option<usize>) -> Result<Vec<Candle>, LoadError> {
    let content = fs::read_to_string(path)?;
    let bars = parse_csv_bars(&content)?;
    Ok(match limit {
        Some(n) if bars.len() > n => bars[bars.len() - n..].to_vec(),
        _ => bars,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_columns_with_default_volume() {
        let csv = "time,open,high,low,close\n2024-01-01T00:00:00Z,1.1,1.2,1.0,1.15\n";
        let bars = parse_csv_bars(csv).unwrap();
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].tick_volume, 0);
        assert!((bars[0].close.to_f64() - 1.15).abs() < 1e-9);
    }

    #[test]
    fn sorts_rows_by_time_regardless_of_input_order() {
        let csv = "time,open,high,low,close,tick_volume\n\
                   2024-01-02T00:00:00Z,2,2,2,2,5\n\
                   2024-01-01T00:00:00Z,1,1,1,1,3\n";
        let bars = parse_csv_bars(csv).unwrap();
        assert_eq!(bars[0].tick_volume, 3);
        assert_eq!(bars[1].tick_volume, 5);
    }

    #[test]
    fn missing_column_is_reported_by_name() {
        let csv = "time,open,high,low\n2024-01-01T00:00:00Z,1,1,1\n";
        let err = parse_csv_bars(csv).unwrap_err();
        assert!(matches!(err, LoadError::MissingColumn("close")));
    }

    #[test]
    fn bad_numeric_field_names_the_offending_line() {
        let csv = "time,open,high,low,close\n2024-01-01T00:00:00Z,x,1.2,1.0,1.15\n";
        let err = parse_csv_bars(csv).unwrap_err();
        match err {
            LoadError::BadRow { line, .. } => assert_eq!(line, 2),
            other => panic!("expected BadRow, got {other:?}"),
        }
    }

    #[test]
    fn limit_keeps_only_the_most_recent_bars() {
        let csv = "time,open,high,low,close\n\
                   2024-01-01T00:00:00Z,1,1,1,1\n\
                   2024-01-02T00:00:00Z,2,2,2,2\n\
                   2024-01-03T00:00:00Z,3,3,3,3\n";
        let bars = parse_csv_bars(csv).unwrap();
        let limited: Vec<_> = if bars.len() > 2 { bars[bars.len() - 2..].to_vec() } else { bars };
        assert_eq!(limited.len(), 2);
        assert_eq!(limited[0].open.to_f64(), 2.0);
    }
}
