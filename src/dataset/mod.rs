//! In-memory tabular dataset
//!
//! The pipeline does not read files or URLs; a loading collaborator hands it
//! a [`Dataset`] and the column schema is the only contract. Columns are
//! numeric or categorical, all of equal length, and the dataset is read-only
//! once built — subsets are produced by copying selected rows.

mod encoder;

pub use encoder::OneHotEncoder;

use crate::error::{EvalError, Result};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// A single column of the dataset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Column {
    Numeric(Vec<f64>),
    Categorical(Vec<String>),
}

impl Column {
    pub fn len(&self) -> usize {
        match self {
            Column::Numeric(v) => v.len(),
            Column::Categorical(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Column::Numeric(_))
    }

    fn take(&self, indices: &[usize]) -> Column {
        match self {
            Column::Numeric(v) => Column::Numeric(indices.iter().map(|&i| v[i]).collect()),
            Column::Categorical(v) => {
                Column::Categorical(indices.iter().map(|&i| v[i].clone()).collect())
            }
        }
    }
}

/// Ordered collection of records, column-major
///
/// All columns share the same length; this is enforced on construction and
/// holds for every subset produced by [`Dataset::take`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dataset {
    columns: Vec<(String, Column)>,
    n_rows: usize,
}

impl Dataset {
    /// Create an empty dataset
    pub fn new() -> Self {
        Self {
            columns: Vec::new(),
            n_rows: 0,
        }
    }

    /// Add a numeric column
    pub fn with_numeric(self, name: impl Into<String>, values: Vec<f64>) -> Result<Self> {
        self.push_column(name.into(), Column::Numeric(values))
    }

    /// Add a categorical column
    pub fn with_categorical(self, name: impl Into<String>, values: Vec<String>) -> Result<Self> {
        self.push_column(name.into(), Column::Categorical(values))
    }

    fn push_column(mut self, name: String, column: Column) -> Result<Self> {
        if self.columns.iter().any(|(n, _)| *n == name) {
            return Err(EvalError::DataError(format!(
                "duplicate column name: {name}"
            )));
        }
        if !self.columns.is_empty() && column.len() != self.n_rows {
            return Err(EvalError::ShapeError {
                expected: format!("column of length {}", self.n_rows),
                actual: format!("column '{}' of length {}", name, column.len()),
            });
        }
        self.n_rows = column.len();
        self.columns.push((name, column));
        Ok(self)
    }

    /// Number of records
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    /// Number of columns
    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    /// Column names in insertion order
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|(n, _)| n.as_str()).collect()
    }

    /// Look up a column by name
    pub fn column(&self, name: &str) -> Result<&Column> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, c)| c)
            .ok_or_else(|| EvalError::ColumnNotFound(name.to_string()))
    }

    /// Numeric column values, failing on categorical columns
    pub fn numeric(&self, name: &str) -> Result<&[f64]> {
        match self.column(name)? {
            Column::Numeric(v) => Ok(v),
            Column::Categorical(_) => Err(EvalError::DataError(format!(
                "column '{name}' is categorical, expected numeric"
            ))),
        }
    }

    /// Outcome column as an owned array
    pub fn outcome(&self, name: &str) -> Result<Array1<f64>> {
        Ok(Array1::from_vec(self.numeric(name)?.to_vec()))
    }

    /// Copy the selected rows into a fresh dataset; the source is unchanged
    pub fn take(&self, indices: &[usize]) -> Result<Dataset> {
        if let Some(&bad) = indices.iter().find(|&&i| i >= self.n_rows) {
            return Err(EvalError::DataError(format!(
                "row index {} out of range for dataset with {} rows",
                bad, self.n_rows
            )));
        }
        Ok(Dataset {
            columns: self
                .columns
                .iter()
                .map(|(n, c)| (n.clone(), c.take(indices)))
                .collect(),
            n_rows: indices.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Dataset {
        Dataset::new()
            .with_numeric("dose", vec![25.0, 37.5, 50.0, 25.0])
            .unwrap()
            .with_categorical(
                "sex",
                vec!["f".into(), "m".into(), "f".into(), "m".into()],
            )
            .unwrap()
    }

    #[test]
    fn test_schema_enforced() {
        let result = Dataset::new()
            .with_numeric("a", vec![1.0, 2.0])
            .unwrap()
            .with_numeric("b", vec![1.0]);
        assert!(matches!(result, Err(EvalError::ShapeError { .. })));
    }

    #[test]
    fn test_duplicate_column_rejected() {
        let result = Dataset::new()
            .with_numeric("a", vec![1.0])
            .unwrap()
            .with_numeric("a", vec![2.0]);
        assert!(result.is_err());
    }

    #[test]
    fn test_take_copies_rows() {
        let ds = sample();
        let subset = ds.take(&[2, 0]).unwrap();
        assert_eq!(subset.n_rows(), 2);
        assert_eq!(subset.numeric("dose").unwrap(), &[50.0, 25.0]);
        // source untouched
        assert_eq!(ds.n_rows(), 4);
    }

    #[test]
    fn test_take_out_of_range() {
        let ds = sample();
        assert!(ds.take(&[0, 7]).is_err());
    }

    #[test]
    fn test_numeric_rejects_categorical() {
        let ds = sample();
        assert!(ds.numeric("sex").is_err());
        assert!(matches!(
            ds.column("missing"),
            Err(EvalError::ColumnNotFound(_))
        ));
    }
}
