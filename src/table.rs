//! Typed input tables and feature type tagging.
//!
//! The core never reads files. A collaborator hands it a rectangular
//! [`Table`] whose row order defines record indices `0..n`, plus one
//! [`FeatureKind`] per column.
//!
//! ```text
//!          year    state   firespots
//! row 0    1999    "PA"    12.0
//! row 1    1999    "PA"    Missing
//! row 2    2005    "MT"    40.0
//! ```
//!
//! Booleans (dummy indicators) count as numeric 0/1. A column is
//! categorical as soon as it carries text.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// One cell of a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Real-valued observation. `NaN` counts as missing.
    Number(f64),
    /// Indicator value, compared as 0/1.
    Bool(bool),
    /// Category label.
    Text(String),
    /// No observation.
    Missing,
}

impl Value {
    /// `true` when the cell holds no usable observation.
    pub fn is_missing(&self) -> bool {
        match self {
            Value::Missing => true,
            Value::Number(x) => x.is_nan(),
            _ => false,
        }
    }

    /// Numeric reading of the cell, if it has one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(x) if !x.is_nan() => Some(*x),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    /// Category equality: text by content, numbers and booleans by value.
    pub(crate) fn same_category(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Text(_), _) | (_, Value::Text(_)) => false,
            _ => match (self.as_f64(), other.as_f64()) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            },
        }
    }

    /// Short rendering used for report keys.
    pub fn label(&self) -> String {
        match self {
            Value::Number(x) if x.is_nan() => "NaN".to_string(),
            Value::Number(x) if x.fract() == 0.0 && x.abs() < 1e15 => format!("{}", *x as i64),
            Value::Number(x) => format!("{x}"),
            Value::Bool(b) => b.to_string(),
            Value::Text(s) => s.clone(),
            Value::Missing => "NaN".to_string(),
        }
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Number(x)
    }
}

impl From<i64> for Value {
    fn from(x: i64) -> Self {
        Value::Number(x as f64)
    }
}

impl From<i32> for Value {
    fn from(x: i32) -> Self {
        Value::Number(x as f64)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Missing, Into::into)
    }
}

/// Attribute type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeatureKind {
    /// Compared by range-normalized absolute difference.
    Numeric,
    /// Compared by equality.
    Categorical,
}

impl FeatureKind {
    /// Tags from a boolean vector where `true` marks a categorical column.
    pub fn from_flags(flags: &[bool]) -> Vec<FeatureKind> {
        flags
            .iter()
            .map(|&cat| {
                if cat {
                    FeatureKind::Categorical
                } else {
                    FeatureKind::Numeric
                }
            })
            .collect()
    }

    /// Inverse of [`FeatureKind::from_flags`].
    pub fn to_flags(kinds: &[FeatureKind]) -> Vec<bool> {
        kinds
            .iter()
            .map(|k| matches!(k, FeatureKind::Categorical))
            .collect()
    }
}

/// Rectangular table of typed values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    /// Create a table, checking that every row has one value per column.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Result<Self> {
        let f = columns.len();
        if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != f) {
            return Err(Error::shape(
                format!("{f} values per row"),
                format!("{} values in row {i}", row.len()),
            ));
        }
        Ok(Self { columns, rows })
    }

    /// Build a table from named columns of equal length.
    pub fn from_columns(columns: Vec<(String, Vec<Value>)>) -> Result<Self> {
        let n = columns.first().map_or(0, |(_, c)| c.len());
        if let Some((name, col)) = columns.iter().find(|(_, c)| c.len() != n) {
            return Err(Error::shape(
                format!("{n} values per column"),
                format!("{} values in column '{name}'", col.len()),
            ));
        }
        let names: Vec<String> = columns.iter().map(|(name, _)| name.clone()).collect();
        let mut rows = vec![Vec::with_capacity(names.len()); n];
        for (_, col) in columns {
            for (row, value) in rows.iter_mut().zip(col) {
                row.push(value);
            }
        }
        Ok(Self {
            columns: names,
            rows,
        })
    }

    /// Number of records.
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    /// Number of attributes.
    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    /// Column names in order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// All records.
    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    /// One record.
    pub fn row(&self, i: usize) -> Option<&[Value]> {
        self.rows.get(i).map(Vec::as_slice)
    }

    /// Position of a column by name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Iterate over one column's values.
    pub fn column(&self, j: usize) -> impl Iterator<Item = &Value> + '_ {
        self.rows.iter().map(move |r| &r[j])
    }

    /// Append a column; `values` must have one entry per record.
    pub fn push_column(&mut self, name: impl Into<String>, values: Vec<Value>) -> Result<()> {
        if values.len() != self.rows.len() {
            return Err(Error::shape(
                format!("{} values", self.rows.len()),
                format!("{} values", values.len()),
            ));
        }
        self.columns.push(name.into());
        for (row, value) in self.rows.iter_mut().zip(values) {
            row.push(value);
        }
        Ok(())
    }
}

/// Infer one type tag per column.
///
/// Any text makes a column categorical. Numbers, booleans and columns with
/// no observations at all are numeric.
pub fn classify_columns(table: &Table) -> Vec<FeatureKind> {
    (0..table.n_cols())
        .map(|j| {
            if table.column(j).any(|v| matches!(v, Value::Text(_))) {
                FeatureKind::Categorical
            } else {
                FeatureKind::Numeric
            }
        })
        .collect()
}

/// Check that `kinds` lines up with `table` and that numeric columns hold
/// only finite numbers, booleans or missing values.
pub(crate) fn check_kinds(table: &Table, kinds: &[FeatureKind]) -> Result<()> {
    if kinds.len() != table.n_cols() {
        return Err(Error::shape(
            format!("{} feature kinds", table.n_cols()),
            format!("{} feature kinds", kinds.len()),
        ));
    }
    for (j, kind) in kinds.iter().enumerate() {
        if *kind != FeatureKind::Numeric {
            continue;
        }
        for (i, v) in table.column(j).enumerate() {
            match v {
                Value::Text(_) => {
                    return Err(Error::Input(format!(
                        "text value in numeric column '{}' at row {i}",
                        table.columns[j]
                    )));
                }
                Value::Number(x) if x.is_infinite() => {
                    return Err(Error::Input(format!(
                        "infinite value in numeric column '{}' at row {i}",
                        table.columns[j]
                    )));
                }
                _ => {}
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        Table::from_columns(vec![
            ("year".into(), vec![1999.into(), 2005.into(), Value::Missing]),
            ("state".into(), vec!["PA".into(), "MT".into(), "PA".into()]),
            ("dummy".into(), vec![true.into(), false.into(), true.into()]),
            ("empty".into(), vec![Value::Missing, Value::Missing, Value::Missing]),
        ])
        .unwrap()
    }

    #[test]
    fn test_classify_columns() {
        let kinds = classify_columns(&sample());
        assert_eq!(
            kinds,
            vec![
                FeatureKind::Numeric,
                FeatureKind::Categorical,
                FeatureKind::Numeric,
                FeatureKind::Numeric,
            ]
        );
        assert_eq!(
            FeatureKind::to_flags(&kinds),
            vec![false, true, false, false]
        );
        assert_eq!(FeatureKind::from_flags(&[false, true, false, false]), kinds);
    }

    #[test]
    fn test_ragged_rows_rejected() {
        let err = Table::new(
            vec!["a".into(), "b".into()],
            vec![vec![1.into(), 2.into()], vec![3.into()]],
        );
        assert!(matches!(err, Err(Error::Shape { .. })));
    }

    #[test]
    fn test_text_in_numeric_column_rejected() {
        let table = sample();
        let kinds = vec![FeatureKind::Numeric; 4];
        assert!(matches!(check_kinds(&table, &kinds), Err(Error::Input(_))));
        assert!(matches!(
            check_kinds(&table, &kinds[..3]),
            Err(Error::Shape { .. })
        ));
    }

    #[test]
    fn test_infinite_numbers_rejected() {
        let table = Table::from_columns(vec![(
            "firespots".into(),
            vec![f64::INFINITY.into(), 1.0.into(), 2.0.into()],
        )])
        .unwrap();
        let err = check_kinds(&table, &[FeatureKind::Numeric]).unwrap_err();
        assert!(matches!(err, Error::Input(ref m) if m.contains("infinite")));

        // NaN is a missing marker, not an error
        let table = Table::from_columns(vec![(
            "firespots".into(),
            vec![f64::NAN.into(), 1.0.into(), 2.0.into()],
        )])
        .unwrap();
        assert!(check_kinds(&table, &[FeatureKind::Numeric]).is_ok());
    }

    #[test]
    fn test_missing_values() {
        assert!(Value::Number(f64::NAN).is_missing());
        assert!(Value::Missing.is_missing());
        assert_eq!(Value::Bool(true).as_f64(), Some(1.0));
        assert!(Value::from(None::<f64>).is_missing());
        assert!(Value::from("PA").same_category(&Value::from("PA")));
        assert!(!Value::from("1").same_category(&Value::from(1)));
        assert_eq!(Value::from(2019).label(), "2019");
    }

    #[test]
    fn test_push_column() {
        let mut table = sample();
        table
            .push_column("grupo_3", vec![1.into(), 2.into(), 1.into()])
            .unwrap();
        assert_eq!(table.n_cols(), 5);
        assert_eq!(table.column_index("grupo_3"), Some(4));
        assert!(table.push_column("bad", vec![1.into()]).is_err());
    }
}
