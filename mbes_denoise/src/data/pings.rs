//! Plain-text MBES ping files.
//!
//! One sounding per line: `ping_id x y z`. Consecutive lines sharing a ping id
//! form one ping. Blank lines and lines starting with `#` are skipped.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use mbes_core::Point3;

use crate::error::{DenoiseError, Result};

/// Soundings of a single swath, in beam order.
pub type Ping = Vec<Point3>;

/// Load all pings from a file.
pub fn load_pings(path: impl AsRef<Path>) -> Result<Vec<Ping>> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let pings = parse_pings(BufReader::new(file))?;
    log::debug!("Loaded {} pings from {}", pings.len(), path.display());
    Ok(pings)
}

/// Parse pings from any buffered reader.
pub fn parse_pings<R: BufRead>(reader: R) -> Result<Vec<Ping>> {
    let mut pings: Vec<Ping> = Vec::new();
    let mut current_id: Option<u64> = None;

    for (line_idx, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let (ping_id, point) = parse_line(line).ok_or_else(|| {
            DenoiseError::InvalidData(format!(
                "line {}: expected `ping_id x y z`, got `{}`",
                line_idx + 1,
                line
            ))
        })?;

        match pings.last_mut() {
            Some(ping) if current_id == Some(ping_id) => ping.push(point),
            _ => {
                pings.push(vec![point]);
                current_id = Some(ping_id);
            }
        }
    }

    Ok(pings)
}

fn parse_line(line: &str) -> Option<(u64, Point3)> {
    let mut parts = line.split_whitespace();
    let ping_id = parts.next()?.parse().ok()?;
    let x = parts.next()?.parse().ok()?;
    let y = parts.next()?.parse().ok()?;
    let z = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some((ping_id, Point3::new(x, y, z)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};

    #[test]
    fn test_groups_consecutive_ping_ids() {
        let text = "# ping x y z\n\
                    0 1.0 2.0 -30.0\n\
                    0 1.5 2.0 -30.1\n\
                    \n\
                    1 1.0 2.5 -30.2\n\
                    2 1.0 3.0 -30.3\n\
                    2 1.5 3.0 -30.4\n";

        let pings = parse_pings(Cursor::new(text)).unwrap();

        assert_eq!(pings.len(), 3);
        assert_eq!(pings[0].len(), 2);
        assert_eq!(pings[1], vec![Point3::new(1.0, 2.5, -30.2)]);
        assert_eq!(pings[2][1], Point3::new(1.5, 3.0, -30.4));
    }

    #[test]
    fn test_malformed_line_reports_line_number() {
        let text = "0 1.0 2.0 3.0\n0 1.0 oops 3.0\n";
        let err = parse_pings(Cursor::new(text)).unwrap_err();
        match err {
            DenoiseError::InvalidData(msg) => assert!(msg.starts_with("line 2"), "{}", msg),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_extra_column_is_rejected() {
        assert!(parse_pings(Cursor::new("0 1 2 3 4\n")).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("pings.txt");
        let mut file = File::create(&path).unwrap();
        writeln!(file, "7 0.0 0.0 -10.0").unwrap();
        writeln!(file, "8 0.0 1.0 -10.0").unwrap();
        drop(file);

        let pings = load_pings(&path).unwrap();
        assert_eq!(pings.len(), 2);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load_pings("/nonexistent/pings.txt").unwrap_err();
        assert!(matches!(err, DenoiseError::Io(_)));
    }
}
