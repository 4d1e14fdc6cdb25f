use std::error::Error;
use std::fmt;

/// Errors raised when tables, feature matrices or prediction frames do not
/// have the shape a pipeline stage expects.
#[derive(Debug, Clone, PartialEq)]
pub enum DataShapeError {
    MissingColumn(String),
    TooFewColumns { required: usize, found: usize },
    NoFeatureColumns,
    NonNumericCell { column: String, row: usize, value: String },
    FeatureMismatch {
        missing_in_test: Vec<String>,
        extra_in_test: Vec<String>,
    },
    ColumnOrderMismatch,
    DimensionMismatch { expected: usize, found: usize },
    LengthMismatch { left: usize, right: usize },
    EnsembleLayout(String),
    UnknownLabel(String),
}

impl fmt::Display for DataShapeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DataShapeError::MissingColumn(name) => write!(f, "Missing expected column '{}'", name),
            DataShapeError::TooFewColumns { required, found } => write!(
                f,
                "Expected at least {} columns but the table has {}",
                required, found
            ),
            DataShapeError::NoFeatureColumns => {
                write!(f, "No feature columns left after cleaning")
            }
            DataShapeError::NonNumericCell { column, row, value } => write!(
                f,
                "Non-numeric value '{}' in feature column '{}' at row {}",
                value, column, row
            ),
            DataShapeError::FeatureMismatch {
                missing_in_test,
                extra_in_test,
            } => write!(
                f,
                "Training and test feature columns differ (missing in test: {:?}, extra in test: {:?})",
                missing_in_test, extra_in_test
            ),
            DataShapeError::ColumnOrderMismatch => write!(
                f,
                "Training and test feature columns are in a different order"
            ),
            DataShapeError::DimensionMismatch { expected, found } => write!(
                f,
                "Expected {} feature columns but got {}",
                expected, found
            ),
            DataShapeError::LengthMismatch { left, right } => write!(
                f,
                "Arrays must have equal length ({} vs {})",
                left, right
            ),
            DataShapeError::EnsembleLayout(msg) => write!(f, "Ensemble layout mismatch: {}", msg),
            DataShapeError::UnknownLabel(label) => {
                write!(f, "Label '{}' is not one of the training classes", label)
            }
        }
    }
}

impl Error for DataShapeError {}
