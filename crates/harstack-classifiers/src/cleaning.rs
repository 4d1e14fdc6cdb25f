//! Column cleaning: drop missing-valued columns, drop the metadata prefix,
//! and convert what is left into a numeric feature matrix.

use anyhow::Result;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::data_handling::{CleanedTable, ObservationTable};
use crate::error::DataShapeError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleaningConfig {
    /// Number of leading non-sensor columns removed after missing-column removal.
    pub metadata_columns: usize,
    /// Categorical label column (training data).
    pub label_column: String,
    /// Row identifier column (test data), never used as a feature.
    pub id_column: Option<String>,
}

impl Default for CleaningConfig {
    fn default() -> Self {
        Self {
            metadata_columns: 7,
            label_column: "classe".to_string(),
            id_column: Some("problem_id".to_string()),
        }
    }
}

/// A cell is missing when it is absent or holds a non-finite number such as
/// `NaN` or `inf`.
fn is_missing(cell: &Option<String>) -> bool {
    match cell {
        None => true,
        Some(value) => value.parse::<f64>().map_or(false, |v| !v.is_finite()),
    }
}

/// Remove every column that contains at least one missing cell.
pub fn drop_missing_columns(table: &ObservationTable) -> ObservationTable {
    let keep: Vec<usize> = (0..table.ncols())
        .filter(|&c| !table.rows.iter().any(|row| is_missing(&row[c])))
        .collect();
    let dropped = table.ncols() - keep.len();
    if dropped > 0 {
        log::debug!("Dropping {} columns with missing values", dropped);
    }
    table.select_columns(&keep)
}

/// Remove the first `n` columns.
pub fn drop_leading_columns(
    table: &ObservationTable,
    n: usize,
) -> Result<ObservationTable, DataShapeError> {
    if table.ncols() < n {
        return Err(DataShapeError::TooFewColumns {
            required: n,
            found: table.ncols(),
        });
    }
    let keep: Vec<usize> = (n..table.ncols()).collect();
    Ok(table.select_columns(&keep))
}

/// Clean a training table. The label column must be present.
pub fn clean_training(table: &ObservationTable, config: &CleaningConfig) -> Result<CleanedTable> {
    let cleaned = clean(table, config)?;
    if cleaned.labels.is_none() {
        return Err(DataShapeError::MissingColumn(config.label_column.clone()).into());
    }
    Ok(cleaned)
}

/// Drop missing-valued columns, then the metadata prefix, split off the label
/// and id columns, and parse the remaining cells as `f64`.
pub fn clean(table: &ObservationTable, config: &CleaningConfig) -> Result<CleanedTable> {
    let complete = drop_missing_columns(table);
    let trimmed = drop_leading_columns(&complete, config.metadata_columns)?;

    let label_idx = trimmed.column_index(&config.label_column);
    let id_idx = config
        .id_column
        .as_deref()
        .and_then(|name| trimmed.column_index(name));

    let feature_indices: Vec<usize> = (0..trimmed.ncols())
        .filter(|&c| Some(c) != label_idx && Some(c) != id_idx)
        .collect();
    if feature_indices.is_empty() {
        return Err(DataShapeError::NoFeatureColumns.into());
    }

    let nrows = trimmed.nrows();
    let mut data = Vec::with_capacity(nrows * feature_indices.len());
    for (r, row) in trimmed.rows.iter().enumerate() {
        for &c in &feature_indices {
            // Every cell is present after drop_missing_columns.
            let value = row[c].as_deref().unwrap_or_default();
            let parsed = value
                .parse::<f64>()
                .map_err(|_| DataShapeError::NonNumericCell {
                    column: trimmed.headers[c].clone(),
                    row: r + 1,
                    value: value.to_string(),
                })?;
            data.push(parsed);
        }
    }
    let x = Array2::from_shape_vec((nrows, feature_indices.len()), data)?;

    let column_values = |idx: Option<usize>| {
        idx.map(|c| {
            trimmed
                .rows
                .iter()
                .map(|row| row[c].clone().unwrap_or_default())
                .collect::<Vec<String>>()
        })
    };

    Ok(CleanedTable {
        feature_names: feature_indices
            .iter()
            .map(|&c| trimmed.headers[c].clone())
            .collect(),
        x,
        labels: column_values(label_idx),
        ids: column_values(id_idx),
    })
}
