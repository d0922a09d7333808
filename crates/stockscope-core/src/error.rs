//! Error types shared across the workspace.
//!
//! Binaries wrap these in `anyhow`; library crates return them directly.

use thiserror::Error;

/// Upstream data provider errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DataError {
    #[error("Symbol not found: {0}")]
    SymbolNotFound(String),

    #[error("No data available for the requested range")]
    NoDataAvailable,

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Upstream returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Missing API token: set {0}")]
    MissingToken(String),

    #[error("{provider} does not support {operation}")]
    Unsupported {
        provider: String,
        operation: &'static str,
    },
}

impl DataError {
    /// Build an `Unsupported` error for a provider/operation pair.
    pub fn unsupported(provider: &str, operation: &'static str) -> Self {
        DataError::Unsupported {
            provider: provider.to_string(),
            operation,
        }
    }
}

/// Indicator calculation errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IndicatorError {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Model validation errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Feature rows ({rows}) and labels ({labels}) differ in length")]
    LengthMismatch { rows: usize, labels: usize },

    #[error("Training failed: {0}")]
    Training(String),

    #[error("Model backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("Prediction failed: {0}")]
    Prediction(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_names_provider_and_operation() {
        let err = DataError::unsupported("twse", "institutional_flow");
        assert_eq!(err.to_string(), "twse does not support institutional_flow");
    }

    #[test]
    fn missing_token_points_at_variable() {
        let err = DataError::MissingToken("FINMIND_TOKEN".into());
        assert!(err.to_string().ends_with("FINMIND_TOKEN"));
    }
}
