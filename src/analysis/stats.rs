use std::collections::HashMap;

use crate::data::model::{CellValue, Column, Dataset};

// ---------------------------------------------------------------------------
// Summary types
// ---------------------------------------------------------------------------

/// Descriptive summary of one numeric column. Undefined entries are `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct NumericSummary {
    pub column: String,
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub q25: Option<f64>,
    pub median: Option<f64>,
    pub q75: Option<f64>,
    pub max: Option<f64>,
}

impl NumericSummary {
    pub const ROW_LABELS: [&'static str; 8] =
        ["count", "mean", "std", "min", "25%", "50%", "75%", "max"];

    /// Values in the order of [`NumericSummary::ROW_LABELS`].
    pub fn values(&self) -> [Option<f64>; 8] {
        [
            Some(self.count as f64),
            self.mean,
            self.std,
            self.min,
            self.q25,
            self.median,
            self.q75,
            self.max,
        ]
    }
}

/// Summary of a non-numeric column.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoricalSummary {
    pub column: String,
    pub count: usize,
    pub unique: usize,
    /// Most frequent value; ties go to the value seen first.
    pub top: Option<String>,
    pub freq: usize,
}

/// Result of [`describe`]: numeric columns when there are any, otherwise
/// the categorical summary.
#[derive(Debug, Clone, PartialEq)]
pub enum StatsTable {
    Numeric(Vec<NumericSummary>),
    Categorical(Vec<CategoricalSummary>),
}

// ---------------------------------------------------------------------------
// describe
// ---------------------------------------------------------------------------

/// Per-column count, mean, sample std, min, quartiles and max for every
/// numeric column of the dataset.
pub fn describe(dataset: &Dataset) -> StatsTable {
    let numeric: Vec<NumericSummary> = dataset
        .columns()
        .iter()
        .filter(|c| c.is_numeric())
        .map(summarize_numeric)
        .collect();

    if !numeric.is_empty() {
        return StatsTable::Numeric(numeric);
    }

    StatsTable::Categorical(dataset.columns().iter().map(summarize_categorical).collect())
}

fn summarize_numeric(column: &Column) -> NumericSummary {
    let mut values = column.present_numbers();
    values.sort_by(f64::total_cmp);

    NumericSummary {
        column: column.name.clone(),
        count: values.len(),
        mean: mean(&values),
        std: sample_std(&values),
        min: values.first().copied(),
        q25: quantile_sorted(&values, 0.25),
        median: quantile_sorted(&values, 0.5),
        q75: quantile_sorted(&values, 0.75),
        max: values.last().copied(),
    }
}

fn summarize_categorical(column: &Column) -> CategoricalSummary {
    let mut counts: HashMap<&CellValue, (usize, usize)> = HashMap::new();
    let mut count = 0;
    for (row, value) in column.values.iter().enumerate() {
        if value.is_null() {
            continue;
        }
        count += 1;
        counts.entry(value).or_insert((0, row)).0 += 1;
    }

    let top = counts
        .iter()
        .max_by(|(_, (fa, ra)), (_, (fb, rb))| fa.cmp(fb).then(rb.cmp(ra)))
        .map(|(value, (freq, _))| (value.to_string(), *freq));

    CategoricalSummary {
        column: column.name.clone(),
        count,
        unique: counts.len(),
        freq: top.as_ref().map_or(0, |(_, f)| *f),
        top: top.map(|(v, _)| v),
    }
}

// ---------------------------------------------------------------------------
// Shared numeric helpers
// ---------------------------------------------------------------------------

pub(crate) fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Standard deviation with the `n - 1` denominator.
pub(crate) fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    Some((ss / (values.len() - 1) as f64).sqrt())
}

/// Quantile of already sorted data, linearly interpolating between the two
/// nearest order statistics.
pub(crate) fn quantile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::testing::{assert_close, numeric_column, text_column};

    #[test]
    fn describes_one_to_five() {
        let ds = Dataset::from_columns(vec![numeric_column("v", &[1.0, 2.0, 3.0, 4.0, 5.0])]);
        let StatsTable::Numeric(rows) = describe(&ds) else {
            panic!("expected numeric summary");
        };
        let s = &rows[0];
        assert_eq!(s.count, 5);
        assert_eq!(s.mean, Some(3.0));
        assert_eq!(s.min, Some(1.0));
        assert_eq!(s.max, Some(5.0));
        assert_close(s.std.unwrap(), 1.581_138_830_084_19, 1e-12);
        assert_eq!(s.q25, Some(2.0));
        assert_eq!(s.median, Some(3.0));
        assert_eq!(s.q75, Some(4.0));
    }

    #[test]
    fn only_numeric_columns_are_described_and_nulls_skipped() {
        let mut values: Vec<CellValue> = [10.0, 20.0].iter().map(|v| CellValue::Float(*v)).collect();
        values.push(CellValue::Null);
        let ds = Dataset::from_columns(vec![
            text_column("name", &["a", "b", "c"]),
            Column::new("score", values),
        ]);
        let StatsTable::Numeric(rows) = describe(&ds) else {
            panic!("expected numeric summary");
        };
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].column, "score");
        assert_eq!(rows[0].count, 2);
        assert_eq!(rows[0].mean, Some(15.0));
        assert_eq!(rows[0].q25, Some(12.5));
    }

    #[test]
    fn nan_cells_from_a_file_are_not_counted() {
        let ds = crate::data::loader::load_bytes(b"v,w\n1,1\n-nan,n/a\n3,3\nNAN,4\n").unwrap();
        let StatsTable::Numeric(rows) = describe(&ds) else {
            panic!("expected numeric summary");
        };
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].count, 2);
        assert_eq!(rows[0].mean, Some(2.0));
        assert_eq!(rows[0].max, Some(3.0));
        assert_eq!(rows[1].column, "w");
        assert_eq!(rows[1].count, 3);
    }

    #[test]
    fn single_value_has_no_std() {
        let ds = Dataset::from_columns(vec![numeric_column("v", &[7.0])]);
        let StatsTable::Numeric(rows) = describe(&ds) else {
            panic!("expected numeric summary");
        };
        assert_eq!(rows[0].std, None);
        assert_eq!(rows[0].median, Some(7.0));
    }

    #[test]
    fn categorical_only_dataset_reports_top_values() {
        let ds = Dataset::from_columns(vec![text_column("fruit", &["apple", "pear", "pear", "fig"])]);
        let StatsTable::Categorical(rows) = describe(&ds) else {
            panic!("expected categorical summary");
        };
        assert_eq!(
            rows[0],
            CategoricalSummary {
                column: "fruit".into(),
                count: 4,
                unique: 3,
                top: Some("pear".into()),
                freq: 2,
            }
        );
    }

    #[test]
    fn categorical_ties_go_to_first_seen() {
        let ds = Dataset::from_columns(vec![text_column("c", &["b", "a", "a", "b"])]);
        let StatsTable::Categorical(rows) = describe(&ds) else {
            panic!("expected categorical summary");
        };
        assert_eq!(rows[0].top.as_deref(), Some("b"));
    }
}
