//! Data structures for raw observation tables and cleaned feature tables.
//!
//! `ObservationTable` is what the loader produces: header names and
//! row-major string cells where `None` marks a missing value.
//! `CleanedTable` is the fully numeric result of the cleaner, and
//! `ClassEncoding` maps label strings to the `usize` class indices every
//! model works with.
use std::collections::{BTreeSet, HashMap};

use ndarray::{Array1, Array2, Axis};

use crate::error::DataShapeError;

#[derive(Debug, Clone, PartialEq)]
pub struct ObservationTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl ObservationTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Option<String>>>) -> Self {
        ObservationTable { headers, rows }
    }

    pub fn nrows(&self) -> usize {
        self.rows.len()
    }

    pub fn ncols(&self) -> usize {
        self.headers.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Keep only the columns at `indices`, in the given order.
    pub fn select_columns(&self, indices: &[usize]) -> ObservationTable {
        ObservationTable {
            headers: indices.iter().map(|&i| self.headers[i].clone()).collect(),
            rows: self
                .rows
                .iter()
                .map(|row| indices.iter().map(|&i| row[i].clone()).collect())
                .collect(),
        }
    }

    pub fn count_missing(&self) -> usize {
        self.rows
            .iter()
            .map(|row| row.iter().filter(|cell| cell.is_none()).count())
            .sum()
    }
}

/// Fully numeric table produced by the cleaner.
#[derive(Debug, Clone)]
pub struct CleanedTable {
    pub feature_names: Vec<String>,
    pub x: Array2<f64>,
    /// Label per row (training data only).
    pub labels: Option<Vec<String>>,
    /// Row identifiers, when the table carries an id column.
    pub ids: Option<Vec<String>>,
}

impl CleanedTable {
    pub fn nrows(&self) -> usize {
        self.x.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.x.ncols()
    }

    pub fn log_summary(&self, name: &str) {
        log::info!(
            "{}: {} rows x {} feature columns{}",
            name,
            self.nrows(),
            self.n_features(),
            if self.labels.is_some() { " (labelled)" } else { "" }
        );
    }
}

/// Sorted distinct labels of the training data.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ClassEncoding {
    pub classes: Vec<String>,
}

impl ClassEncoding {
    pub fn fit(labels: &[String]) -> Self {
        let classes: BTreeSet<&String> = labels.iter().collect();
        ClassEncoding {
            classes: classes.into_iter().cloned().collect(),
        }
    }

    pub fn n_classes(&self) -> usize {
        self.classes.len()
    }

    pub fn encode(&self, labels: &[String]) -> anyhow::Result<Array1<usize>> {
        let lookup: HashMap<&str, usize> = self
            .classes
            .iter()
            .enumerate()
            .map(|(i, c)| (c.as_str(), i))
            .collect();
        let encoded = labels
            .iter()
            .map(|label| {
                lookup
                    .get(label.as_str())
                    .copied()
                    .ok_or_else(|| DataShapeError::UnknownLabel(label.clone()))
            })
            .collect::<Result<Vec<usize>, _>>()?;
        Ok(Array1::from_vec(encoded))
    }

    pub fn decode(&self, indices: &Array1<usize>) -> Vec<String> {
        indices.iter().map(|&i| self.classes[i].clone()).collect()
    }
}

/// Feature matrix with encoded labels, as used for model fitting.
#[derive(Debug, Clone)]
pub struct LabeledData {
    pub x: Array2<f64>,
    pub y: Array1<usize>,
}

impl LabeledData {
    pub fn new(x: Array2<f64>, y: Array1<usize>) -> Result<Self, DataShapeError> {
        if x.nrows() != y.len() {
            return Err(DataShapeError::LengthMismatch {
                left: x.nrows(),
                right: y.len(),
            });
        }
        Ok(LabeledData { x, y })
    }

    pub fn select(&self, indices: &[usize]) -> LabeledData {
        LabeledData {
            x: self.x.select(Axis(0), indices),
            y: self.y.select(Axis(0), indices),
        }
    }
}
