// 🚨 Error Types - Allocation pipeline failures
// Coercion problems are absorbed (see resolver::CoercionReport);
// everything here stops the request before any output is produced.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AllocatorError {
    #[error("Could not detect an amount column (available columns: {})", .columns.join(", "))]
    AmountColumnNotFound { columns: Vec<String> },

    #[error("Column '{column}' not found (available columns: {})", .columns.join(", "))]
    UnknownColumn { column: String, columns: Vec<String> },

    #[error("Amount policy '{policy}' is not applicable: {reason}")]
    MissingPolicyColumn { policy: String, reason: String },

    #[error("Row {row}: value '{value}' in column '{column}' is not numeric")]
    InvalidNumeric {
        column: String,
        row: usize,
        value: String,
    },

    #[error("Invalid entity set: {0}")]
    InvalidEntitySet(String),

    #[error("Invalid table: {0}")]
    InvalidTable(String),

    #[error("Failed to parse {path}: {message}")]
    Parse { path: String, message: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AllocatorError {
    /// True when the caller can retry the same table with a manual column choice
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AllocatorError::AmountColumnNotFound { .. }
                | AllocatorError::UnknownColumn { .. }
                | AllocatorError::MissingPolicyColumn { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, AllocatorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_errors() {
        let not_found = AllocatorError::AmountColumnNotFound {
            columns: vec!["Date".to_string(), "Memo".to_string()],
        };
        assert!(not_found.is_recoverable());
        assert_eq!(
            not_found.to_string(),
            "Could not detect an amount column (available columns: Date, Memo)"
        );

        let parse = AllocatorError::Parse {
            path: "statement.csv".to_string(),
            message: "unequal row lengths".to_string(),
        };
        assert!(!parse.is_recoverable());
    }
}
