//! Reader for CLUSTAL-formatted alignments.

use crate::error::{Error, Result};
use itertools::Itertools;
use std::collections::HashMap;

const HEADER: &str = "CLUSTAL";

/// Whether `text` opens with a CLUSTAL header line.
pub fn is_clustal(text: &[u8]) -> bool {
    text.trim_ascii_start().starts_with(HEADER.as_bytes())
}

/// Reads the rows of a CLUSTAL alignment as `(name, row)` pairs, in the
/// order the names first appear.
///
/// Rows keep their gap symbols. The segments of a name are concatenated
/// across blocks; conservation lines (which start with whitespace) and the
/// optional residue counts after each segment are ignored.
pub fn parse_clustal(text: &[u8]) -> Result<Vec<(String, Vec<u8>)>> {
    let text = String::from_utf8_lossy(text);
    let mut lines = text.lines().skip_while(|line| line.trim().is_empty());

    match lines.next() {
        Some(header) if header.starts_with(HEADER) => {}
        _ => {
            return Err(Error::ClustalParse(
                "missing 'CLUSTAL' header line".to_string(),
            ));
        }
    }

    let mut rows: Vec<(String, Vec<u8>)> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for line in lines {
        if line.trim().is_empty() || line.starts_with(char::is_whitespace) {
            continue;
        }

        let mut fields = line.split_whitespace();
        let (Some(name), Some(segment)) = (fields.next(), fields.next()) else {
            return Err(Error::ClustalParse(format!(
                "line '{line}' has no sequence segment"
            )));
        };

        let idx = *positions.entry(name.to_string()).or_insert_with(|| {
            rows.push((name.to_string(), Vec::new()));
            rows.len() - 1
        });
        rows[idx].1.extend_from_slice(segment.as_bytes());
    }

    if rows.is_empty() {
        return Err(Error::EmptyInput);
    }
    if !rows.iter().map(|(_, row)| row.len()).all_equal() {
        return Err(Error::ClustalParse(
            "alignment rows have different lengths".to_string(),
        ));
    }

    Ok(rows)
}
