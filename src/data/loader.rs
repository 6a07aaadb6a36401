use std::collections::{HashMap, HashSet};
use std::path::Path;

use anyhow::{Context, Result};
use thiserror::Error;

use super::model::{CellValue, Column, Dataset};

/// Failure to turn uploaded bytes into a [`Dataset`].
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("the file has no header row")]
    NoColumns,
}

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Cell spellings that mean "missing", the usual NA markers spreadsheets and
/// statistics packages write.
const NULL_TOKENS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Read a CSV file from disk and parse it.
pub fn load_file(path: &Path) -> Result<Dataset> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    load_bytes(&bytes).with_context(|| format!("parsing {}", path.display()))
}

/// Parse comma-separated text with a header row.
///
/// Column names are the header tokens in order (duplicates become `name.1`,
/// `name.2`, …). Any row whose width differs from the header, or any invalid
/// UTF-8, fails the whole load; no partial dataset is returned.
pub fn load_bytes(bytes: &[u8]) -> Result<Dataset, LoadError> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    if headers.is_empty() || headers.iter().all(String::is_empty) {
        return Err(LoadError::NoColumns);
    }
    let names = dedupe_names(headers);

    let mut cells: Vec<Vec<CellValue>> = vec![Vec::new(); names.len()];
    for result in reader.records() {
        let record = result?;
        for (col, value) in record.iter().enumerate() {
            cells[col].push(guess_cell_type(value));
        }
    }

    let columns = names
        .into_iter()
        .zip(cells)
        .map(|(name, values)| Column::new(name, values))
        .collect();
    Ok(Dataset::from_columns(columns))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Rename repeated header names: `a, a, a` → `a, a.1, a.2`.
fn dedupe_names(headers: Vec<String>) -> Vec<String> {
    let mut used: HashSet<String> = HashSet::new();
    let mut counters: HashMap<String, usize> = HashMap::new();
    let mut names = Vec::with_capacity(headers.len());
    for header in headers {
        let mut name = header.clone();
        if used.contains(&name) {
            let counter = counters.entry(header.clone()).or_insert(0);
            loop {
                *counter += 1;
                name = format!("{header}.{counter}");
                if !used.contains(&name) {
                    break;
                }
            }
        }
        used.insert(name.clone());
        names.push(name);
    }
    names
}

fn guess_cell_type(s: &str) -> CellValue {
    if NULL_TOKENS.contains(&s) {
        return CellValue::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return CellValue::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        // `f64` parsing accepts any spelling of NaN; NaN is always missing.
        return if f.is_nan() { CellValue::Null } else { CellValue::Float(f) };
    }
    match s {
        "true" | "True" | "TRUE" => CellValue::Bool(true),
        "false" | "False" | "FALSE" => CellValue::Bool(false),
        _ => CellValue::String(s.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::ColumnKind;

    #[test]
    fn header_tokens_become_column_names_in_order() {
        let ds = load_bytes(b"zeta,alpha,mid\n1,2,3\n4,5,6\n").unwrap();
        assert_eq!(ds.column_names(), vec!["zeta", "alpha", "mid"]);
        assert_eq!(ds.len(), 2);
    }

    #[test]
    fn cells_are_typed_and_columns_tagged() {
        let csv = "n,f,label,flag\n1,1.5,a,true\n2,,b,False\n3,2.5,NA,true\n";
        let ds = load_bytes(csv.as_bytes()).unwrap();

        let n = ds.column("n").unwrap();
        assert_eq!(n.kind, ColumnKind::Numeric);
        assert_eq!(n.values[2], CellValue::Integer(3));

        let f = ds.column("f").unwrap();
        assert_eq!(f.kind, ColumnKind::Numeric);
        assert_eq!(f.values[1], CellValue::Null);

        let label = ds.column("label").unwrap();
        assert_eq!(label.kind, ColumnKind::Categorical);
        assert_eq!(label.values[2], CellValue::Null);

        let flag = ds.column("flag").unwrap();
        assert_eq!(flag.kind, ColumnKind::Categorical);
        assert_eq!(flag.values[1], CellValue::Bool(false));
    }

    #[test]
    fn nan_spellings_and_na_markers_are_missing() {
        let ds = load_bytes(b"v,w\n1,1\n-nan,n/a\n3,3\nNAN,4\n+NaN,#N/A\n5,<NA>\n").unwrap();

        let v = ds.column("v").unwrap();
        assert_eq!(v.kind, ColumnKind::Numeric);
        assert_eq!(v.present_numbers(), vec![1.0, 3.0, 5.0]);
        assert!(v.values[1].is_null() && v.values[3].is_null() && v.values[4].is_null());

        let w = ds.column("w").unwrap();
        assert_eq!(w.kind, ColumnKind::Numeric);
        assert_eq!(w.present_numbers(), vec![1.0, 3.0, 4.0]);
    }

    #[test]
    fn infinities_stay_numeric() {
        let ds = load_bytes(b"v\ninf\n-inf\n").unwrap();
        let v = ds.column("v").unwrap();
        assert_eq!(v.present_numbers(), vec![f64::INFINITY, f64::NEG_INFINITY]);
    }

    #[test]
    fn inconsistent_row_width_fails() {
        let err = load_bytes(b"a,b\n1,2\n3\n").unwrap_err();
        assert!(matches!(err, LoadError::Csv(_)));

        let err = load_bytes(b"a,b\n1,2,3\n").unwrap_err();
        assert!(matches!(err, LoadError::Csv(_)));
    }

    #[test]
    fn invalid_utf8_fails() {
        let err = load_bytes(b"a,b\n1,\xFF\xFE\n").unwrap_err();
        assert!(matches!(err, LoadError::Csv(_)));
    }

    #[test]
    fn empty_input_has_no_columns() {
        assert!(matches!(load_bytes(b"").unwrap_err(), LoadError::NoColumns));
    }

    #[test]
    fn header_only_file_has_zero_rows() {
        let ds = load_bytes(b"a,b\n").unwrap();
        assert_eq!(ds.column_names(), vec!["a", "b"]);
        assert!(ds.is_empty());
    }

    #[test]
    fn duplicate_headers_are_suffixed() {
        let ds = load_bytes(b"a,b,a,a\n1,2,3,4\n").unwrap();
        assert_eq!(ds.column_names(), vec!["a", "b", "a.1", "a.2"]);
    }

    #[test]
    fn byte_order_mark_is_ignored() {
        let ds = load_bytes(b"\xEF\xBB\xBFx,y\n1,2\n").unwrap();
        assert_eq!(ds.column_names(), vec!["x", "y"]);
    }
}
