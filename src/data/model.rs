use std::fmt;

// ---------------------------------------------------------------------------
// CellValue – a single cell of the table
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value as inferred from the CSV text.
/// Categories key `BTreeMap`s downstream, so `CellValue` must be `Ord`.
#[derive(Debug, Clone)]
pub enum CellValue {
    Integer(i64),
    Float(f64),
    Bool(bool),
    String(String),
    Null,
}

// -- Manual Eq/Ord so we can put CellValue in BTreeMap keys --
// Equality follows `Ord` (floats by `total_cmp`), matching the bitwise hash.

impl PartialEq for CellValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == std::cmp::Ordering::Equal
    }
}

impl Eq for CellValue {}

impl PartialOrd for CellValue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CellValue {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use CellValue::*;
        fn discriminant(v: &CellValue) -> u8 {
            match v {
                Null => 0,
                Bool(_) => 1,
                Integer(_) => 2,
                Float(_) => 3,
                String(_) => 4,
            }
        }
        let da = discriminant(self);
        let db = discriminant(other);
        if da != db {
            return da.cmp(&db);
        }
        match (self, other) {
            (Null, Null) => std::cmp::Ordering::Equal,
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (String(a), String(b)) => a.cmp(b),
            _ => std::cmp::Ordering::Equal,
        }
    }
}

impl std::hash::Hash for CellValue {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            CellValue::String(s) => s.hash(state),
            CellValue::Integer(i) => i.hash(state),
            CellValue::Float(f) => f.to_bits().hash(state),
            CellValue::Bool(b) => b.hash(state),
            CellValue::Null => {}
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::String(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v:.4}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Null => write!(f, "<null>"),
        }
    }
}

impl CellValue {
    /// Interpret the value as an `f64` when it is numeric.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float(v) => Some(*v),
            CellValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }
}

// ---------------------------------------------------------------------------
// Column – one named, typed column
// ---------------------------------------------------------------------------

/// Type tag fixed once at load time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Numeric,
    Categorical,
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnKind::Numeric => write!(f, "numeric"),
            ColumnKind::Categorical => write!(f, "categorical"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
    pub values: Vec<CellValue>,
}

impl Column {
    /// Build a column and infer its kind: numeric when every non-null cell
    /// is an integer or float (an all-null column counts as numeric).
    /// Integers in a column that also holds floats are widened to floats.
    pub fn new(name: impl Into<String>, mut values: Vec<CellValue>) -> Self {
        let numeric = values
            .iter()
            .all(|v| matches!(v, CellValue::Null | CellValue::Integer(_) | CellValue::Float(_)));
        if numeric && values.iter().any(|v| matches!(v, CellValue::Float(_))) {
            for v in &mut values {
                if let CellValue::Integer(i) = *v {
                    *v = CellValue::Float(i as f64);
                }
            }
        }
        Column {
            name: name.into(),
            kind: if numeric {
                ColumnKind::Numeric
            } else {
                ColumnKind::Categorical
            },
            values,
        }
    }

    pub fn is_numeric(&self) -> bool {
        self.kind == ColumnKind::Numeric
    }

    /// Numeric view of the column, `None` for nulls and non-numeric cells.
    pub fn numeric_values(&self) -> Vec<Option<f64>> {
        self.values.iter().map(CellValue::as_f64).collect()
    }

    /// Non-null numeric values only, in row order.
    pub fn present_numbers(&self) -> Vec<f64> {
        self.values.iter().filter_map(CellValue::as_f64).collect()
    }
}

// ---------------------------------------------------------------------------
// Dataset – the complete loaded table
// ---------------------------------------------------------------------------

/// An ordered set of row-aligned columns. Immutable once loaded.
#[derive(Debug, Clone)]
pub struct Dataset {
    columns: Vec<Column>,
    n_rows: usize,
}

impl Dataset {
    /// Assemble a dataset from columns of equal length.
    ///
    /// Panics if the columns are not row-aligned; the loader guarantees this.
    pub fn from_columns(columns: Vec<Column>) -> Self {
        let n_rows = columns.first().map(|c| c.values.len()).unwrap_or(0);
        assert!(
            columns.iter().all(|c| c.values.len() == n_rows),
            "dataset columns must be row-aligned"
        );
        Dataset { columns, n_rows }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn first_column(&self) -> Option<&Column> {
        self.columns.first()
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.n_rows
    }

    /// Whether the dataset has no rows.
    pub fn is_empty(&self) -> bool {
        self.n_rows == 0
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// All cells of one row, in column order.
    pub fn row(&self, index: usize) -> Vec<(&str, &CellValue)> {
        self.columns
            .iter()
            .filter_map(|c| c.values.get(index).map(|v| (c.name.as_str(), v)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_kind_is_inferred_from_non_null_cells() {
        let numeric = Column::new(
            "a",
            vec![CellValue::Integer(1), CellValue::Null, CellValue::Float(2.5)],
        );
        assert_eq!(numeric.kind, ColumnKind::Numeric);
        assert_eq!(numeric.values[0], CellValue::Float(1.0));

        let categorical = Column::new(
            "b",
            vec![CellValue::Integer(1), CellValue::String("x".into())],
        );
        assert_eq!(categorical.kind, ColumnKind::Categorical);

        let flags = Column::new("c", vec![CellValue::Bool(true), CellValue::Bool(false)]);
        assert_eq!(flags.kind, ColumnKind::Categorical);

        let empty = Column::new("d", vec![CellValue::Null, CellValue::Null]);
        assert!(empty.is_numeric());
    }

    #[test]
    fn integers_and_floats_are_distinct_categories() {
        use std::collections::{BTreeSet, HashSet};

        let cells = [CellValue::Integer(1), CellValue::Float(1.0), CellValue::String("a".into())];
        assert_ne!(cells[0], cells[1]);
        let ordered: BTreeSet<_> = cells.iter().cloned().collect();
        let hashed: HashSet<_> = cells.iter().cloned().collect();
        assert_eq!(ordered.len(), 3);
        assert_eq!(hashed.len(), 3);

        let column = Column::new("c", cells.to_vec());
        assert_eq!(column.kind, ColumnKind::Categorical);
        assert_eq!(column.values[1], CellValue::Float(1.0));
    }

    #[test]
    fn cells_order_by_kind_then_value() {
        assert!(CellValue::Null < CellValue::Bool(false));
        assert!(CellValue::Integer(5) < CellValue::Float(0.5));
        assert!(CellValue::Float(1.5) < CellValue::Float(2.5));
        assert!(CellValue::Float(-0.0) < CellValue::Float(0.0));
    }

    #[test]
    fn row_returns_cells_in_column_order() {
        let ds = Dataset::from_columns(vec![
            Column::new("x", vec![CellValue::Integer(1), CellValue::Integer(2)]),
            Column::new("y", vec![CellValue::String("a".into()), CellValue::Null]),
        ]);
        let row = ds.row(1);
        assert_eq!(row, vec![("x", &CellValue::Integer(2)), ("y", &CellValue::Null)]);
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.width(), 2);
    }
}
