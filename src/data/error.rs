use thiserror::Error;

/// Failures that abort a dataset load before any chart is rendered.
#[derive(Error, Debug)]
pub enum DataError {
    /// Source unreachable, unsupported, or not decodable as a table.
    #[error("Failed to load dataset from {location}: {reason}")]
    Load { location: String, reason: String },

    /// A date cell did not match the expected source format.
    #[error("Row {row}: '{value}' in column '{column}' does not match date format '{format}'")]
    Parse {
        row: usize,
        column: String,
        value: String,
        format: String,
    },

    /// A chrono date pattern with an unknown or incomplete specifier.
    #[error("Invalid date format '{format}'")]
    Format { format: String },

    /// One or more required columns are absent from the header.
    #[error("Dataset is missing required column(s): {}", .missing.join(", "))]
    Schema { missing: Vec<String> },
}

impl DataError {
    pub fn load(location: &str, reason: impl ToString) -> Self {
        DataError::Load {
            location: location.to_string(),
            reason: reason.to_string(),
        }
    }
}
