//! Field-book CSV import/export.
//!
//! ## Import columns (case-insensitive, order-independent)
//!
//! | Column     | Aliases                                | Required |
//! |------------|----------------------------------------|----------|
//! | `bs`       | `back_sight`                           | yes      |
//! | `is`       | `intermediate`, `intermediate_sight`   | yes      |
//! | `fs`       | `fore_sight`                           | yes      |
//! | `rl`       | `reduced_level`                        | no       |
//! | `distance` | `d`                                    | no       |
//! | `remarks`  | `remark`, `comments`                   | no       |
//!
//! Blank cells mean "not observed" (0). Other columns are ignored, so an
//! exported book (which adds `rise`/`fall`) imports back unchanged.
//!
//! Import is all-or-nothing: every row is parsed before anything is
//! recorded, and [`crate::record_readings`] appends the parsed rows in one
//! store call.

use std::collections::HashMap;
use std::fmt;
use std::io::{Read, Write};
use std::path::Path;

use lvl_core::{FieldInput, ParseError, RawReading, Reading};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum FieldBookError {
    /// An I/O or CSV-library error.
    Csv(String),
    /// The header row is missing a required column.
    MissingHeader(&'static str),
    /// A cell could not be parsed. `row` is the 1-based line in the file.
    ParseField {
        row: u64,
        column: &'static str,
        source: ParseError,
    },
}

impl fmt::Display for FieldBookError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldBookError::Csv(msg) => write!(f, "field book csv error: {msg}"),
            FieldBookError::MissingHeader(col) => {
                write!(f, "field book missing required header column: '{col}'")
            }
            FieldBookError::ParseField {
                row,
                column,
                source,
            } => write!(f, "field book row {row}, column '{column}': {source}"),
        }
    }
}

impl std::error::Error for FieldBookError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FieldBookError::ParseField { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<csv::Error> for FieldBookError {
    fn from(e: csv::Error) -> Self {
        FieldBookError::Csv(e.to_string())
    }
}

// ---------------------------------------------------------------------------
// Header mapping
// ---------------------------------------------------------------------------

struct Column {
    name: &'static str,
    aliases: &'static [&'static str],
    required: bool,
}

const COLUMNS: &[Column] = &[
    Column { name: "bs", aliases: &["back_sight"], required: true },
    Column { name: "is", aliases: &["intermediate", "intermediate_sight"], required: true },
    Column { name: "fs", aliases: &["fore_sight"], required: true },
    Column { name: "rl", aliases: &["reduced_level"], required: false },
    Column { name: "distance", aliases: &["d"], required: false },
    Column { name: "remarks", aliases: &["remark", "comments"], required: false },
];

fn build_col_index(headers: &csv::StringRecord) -> Result<HashMap<&'static str, usize>, FieldBookError> {
    let mut idx = HashMap::new();
    for (i, h) in headers.iter().enumerate() {
        let h = h.trim().to_ascii_lowercase();
        if let Some(col) = COLUMNS
            .iter()
            .find(|c| c.name == h || c.aliases.iter().any(|a| *a == h))
        {
            idx.entry(col.name).or_insert(i);
        }
    }
    for col in COLUMNS.iter().filter(|c| c.required) {
        if !idx.contains_key(col.name) {
            return Err(FieldBookError::MissingHeader(col.name));
        }
    }
    Ok(idx)
}

// ---------------------------------------------------------------------------
// Import
// ---------------------------------------------------------------------------

pub fn parse_fieldbook_reader<R: Read>(rdr: R) -> Result<Vec<RawReading>, FieldBookError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(rdr);

    let col_idx = build_col_index(rdr.headers()?)?;

    let mut out = Vec::new();
    for record in rdr.records() {
        let record = record?;
        if record.iter().all(|c| c.is_empty()) {
            continue;
        }
        let row = record.position().map(|p| p.line()).unwrap_or(0);
        let input = FieldInput {
            back_sight: cell(&record, &col_idx, "bs"),
            intermediate_sight: cell(&record, &col_idx, "is"),
            fore_sight: cell(&record, &col_idx, "fs"),
            reduced_level: cell(&record, &col_idx, "rl"),
            distance: cell(&record, &col_idx, "distance"),
            remarks: cell(&record, &col_idx, "remarks"),
        };
        let raw = input.parse().map_err(|source| FieldBookError::ParseField {
            row,
            column: column_for(source.field()),
            source,
        })?;
        out.push(raw);
    }
    Ok(out)
}

fn cell<'r>(record: &'r csv::StringRecord, idx: &HashMap<&'static str, usize>, name: &str) -> &'r str {
    idx.get(name).and_then(|&i| record.get(i)).unwrap_or("")
}

pub fn parse_fieldbook_str(src: &str) -> Result<Vec<RawReading>, FieldBookError> {
    parse_fieldbook_reader(src.as_bytes())
}

pub fn parse_fieldbook_file(path: &Path) -> Result<Vec<RawReading>, FieldBookError> {
    let file = std::fs::File::open(path)
        .map_err(|e| FieldBookError::Csv(format!("open '{}': {e}", path.display())))?;
    parse_fieldbook_reader(file)
}

fn column_for(field: &'static str) -> &'static str {
    match field {
        "back_sight" => "bs",
        "intermediate_sight" => "is",
        "fore_sight" => "fs",
        "reduced_level" => "rl",
        other => other,
    }
}

// ---------------------------------------------------------------------------
// Export
// ---------------------------------------------------------------------------

pub const EXPORT_HEADER: [&str; 8] = ["bs", "is", "fs", "rise", "fall", "rl", "distance", "remarks"];

/// Write reduced readings as CSV, 3 decimals per length.
pub fn write_fieldbook<W: Write>(w: W, readings: &[Reading]) -> Result<(), FieldBookError> {
    let mut wtr = csv::Writer::from_writer(w);
    wtr.write_record(EXPORT_HEADER)?;
    for r in readings {
        wtr.write_record([
            r.back_sight.to_string(),
            r.intermediate_sight.to_string(),
            r.fore_sight.to_string(),
            r.rise.to_string(),
            r.fall.to_string(),
            r.reduced_level.to_string(),
            r.distance.to_string(),
            r.remarks.clone(),
        ])?;
    }
    wtr.flush()
        .map_err(|e| FieldBookError::Csv(format!("flush: {e}")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lvl_core::{reduce_all, Mm};

    #[test]
    fn header_is_case_insensitive_and_accepts_aliases() {
        let src = "Remarks,FORE_SIGHT,Back_Sight,Intermediate,RL\nBM1,,1.5,,100\ntp,0.75,,,\n";
        let raws = parse_fieldbook_str(src).unwrap();
        assert_eq!(raws.len(), 2);
        assert_eq!(raws[0].back_sight, Mm::new(1_500));
        assert_eq!(raws[0].reduced_level, Mm::new(100_000));
        assert_eq!(raws[0].remarks, "BM1");
        assert_eq!(raws[1].fore_sight, Mm::new(750));
    }

    #[test]
    fn missing_required_column_is_reported() {
        let err = parse_fieldbook_str("bs,fs\n1.0,0.5\n").unwrap_err();
        assert!(matches!(err, FieldBookError::MissingHeader("is")), "got: {err}");
    }

    #[test]
    fn bad_cell_names_line_and_column() {
        let src = "bs,is,fs\n1.5,,\n,abc,\n";
        let err = parse_fieldbook_str(src).unwrap_err();
        match err {
            FieldBookError::ParseField { row, column, .. } => {
                assert_eq!(row, 3);
                assert_eq!(column, "is");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn blank_lines_are_skipped() {
        let raws = parse_fieldbook_str("bs,is,fs\n1.5,,\n,,\n,1.2,\n").unwrap();
        assert_eq!(raws.len(), 2);
    }

    #[test]
    fn export_prints_three_decimals_and_reimports() {
        let raws = parse_fieldbook_str("bs,is,fs,rl,remarks\n1.5,,,100,BM\n,1.25,,,peg\n").unwrap();
        let readings = reduce_all(&raws);

        let mut buf = Vec::new();
        write_fieldbook(&mut buf, &readings).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("bs,is,fs,rise,fall,rl,distance,remarks"));
        assert_eq!(lines.next(), Some("1.500,0.000,0.000,0.000,0.000,100.000,0.000,BM"));
        assert_eq!(lines.next(), Some("0.000,1.250,0.000,0.250,0.000,100.250,0.000,peg"));

        let again = reduce_all(&parse_fieldbook_str(&text).unwrap());
        assert_eq!(again, readings);
    }
}
