/// Delimited-table loading for the applicant dataset.
///
/// Supported format:
/// - UTF-8, comma-separated, first row is the header
/// - Double-quoted fields with embedded commas and `""` escapes
/// - Blank lines are skipped

use std::path::Path;

use tracing::debug;

use crate::error::{Error, Result};

/// A header plus string cells, one `Vec` per data row.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    /// Normalised header names (see [`normalize_header`]).
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Position of the first column whose normalised name is in `aliases`.
    pub fn column_index(&self, aliases: &[&str]) -> Option<usize> {
        aliases.iter()
            .find_map(|alias| self.headers.iter().position(|h| h == alias))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Reads the table at `path`.
pub fn load_table<P: AsRef<Path>>(path: P) -> Result<RawTable> {
    let path = path.as_ref();
    let source = path.display().to_string();
    let bytes = std::fs::read(path).map_err(|e| Error::DataLoad {
        path: source.clone(),
        reason: e.to_string(),
    })?;
    let text = String::from_utf8(bytes).map_err(|_| Error::DataLoad {
        path: source.clone(),
        reason: "file is not valid UTF-8".into(),
    })?;
    let table = parse_table(&text, &source)?;
    debug!(path = %source, rows = table.len(), columns = table.headers.len(), "table parsed");
    Ok(table)
}

/// Parses CSV text; `source` only labels error messages.
pub fn parse_table(text: &str, source: &str) -> Result<RawTable> {
    let fail = |reason: String| Error::DataLoad { path: source.to_owned(), reason };

    // Strip a UTF-8 BOM some spreadsheet exports prepend.
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut lines = text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty());

    let (_, header_line) = lines.next().ok_or_else(|| fail("file is empty".into()))?;
    let headers: Vec<String> = parse_csv_row(header_line)
        .iter()
        .map(|h| normalize_header(h))
        .collect();

    let mut rows = Vec::new();
    for (line_idx, line) in lines {
        let cells = parse_csv_row(line);
        if cells.len() != headers.len() {
            return Err(fail(format!(
                "line {}: expected {} fields, got {}",
                line_idx + 1,
                headers.len(),
                cells.len()
            )));
        }
        rows.push(cells.into_iter().map(|c| c.trim().to_owned()).collect());
    }

    if rows.is_empty() {
        return Err(fail("no data rows after the header".into()));
    }

    Ok(RawTable { headers, rows })
}

/// Lower-cases a header and folds spaces, dots and dashes into `_`, so
/// `"LOR "`, `"University Rating"` and `"Chance of Admit"` all resolve.
pub fn normalize_header(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.trim().chars() {
        match c {
            ' ' | '.' | '-' | '_' => {
                if !out.ends_with('_') {
                    out.push('_');
                }
            }
            c => out.extend(c.to_lowercase()),
        }
    }
    out.trim_matches('_').to_owned()
}

/// Parses a single CSV row, handling double-quoted fields.
fn parse_csv_row(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                // Escaped quote inside quoted field.
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            c => current.push(c),
        }
    }
    fields.push(current);
    fields
}
