//! Common error types used across all GovMap crates
//! Provides consistent error handling and reporting

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Base error type for all GovMap operations
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "details")]
pub enum GovMapError {
    // Data-related errors
    #[error("Data fetch failed for {resource}: {message}")]
    DataFetch { resource: String, message: String },

    #[error("Data parse error in {resource}: {message}")]
    DataParse { resource: String, message: String },

    #[error("Data not found: {resource}")]
    DataNotFound { resource: String },

    // Configuration errors
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        message: String,
        field: Option<String>,
    },

    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    // Instance errors
    #[error("Instance not found: {id}")]
    InstanceNotFound { id: String },

    // Network errors
    #[error("Network request failed: {message}")]
    Network { message: String },

    // Generic errors
    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Result type alias for GovMap operations
pub type GovMapResult<T> = Result<T, GovMapError>;

/// Error response structure for JavaScript interop
#[derive(Serialize, Deserialize, Debug)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: GovMapError,
    pub timestamp: u64,
    pub context: Option<ErrorContext>,
}

/// Additional context for error reporting
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ErrorContext {
    pub component: String,
    pub operation: String,
    pub metadata: serde_json::Value,
}

impl ErrorResponse {
    /// Create a new error response
    pub fn new(error: GovMapError) -> Self {
        Self {
            success: false,
            error,
            timestamp: chrono::Utc::now().timestamp_millis() as u64,
            context: None,
        }
    }

    /// Add context to the error response
    pub fn with_context(mut self, component: &str, operation: &str) -> Self {
        self.context = Some(ErrorContext {
            component: component.to_string(),
            operation: operation.to_string(),
            metadata: serde_json::Value::Null,
        });
        self
    }

    /// Convert to JSON string for JavaScript
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            r#"{"success":false,"error":{"type":"Internal","details":{"message":"Failed to serialize error"}}}"#.to_string()
        })
    }
}

impl From<serde_json::Error> for GovMapError {
    fn from(err: serde_json::Error) -> Self {
        GovMapError::DataParse {
            resource: format!("line {}", err.line()),
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_serialization() {
        let error = GovMapError::DataFetch {
            resource: "proposals/cosmos.json".to_string(),
            message: "HTTP 404".to_string(),
        };

        let response = ErrorResponse::new(error).with_context("DataManager", "load_chain");

        let json = response.to_json();
        assert!(json.contains("DataFetch"));
        assert!(json.contains("proposals/cosmos.json"));
        assert!(json.contains("load_chain"));
    }

    #[test]
    fn test_error_conversion() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{oops").unwrap_err();
        let err: GovMapError = parse_err.into();

        match err {
            GovMapError::DataParse { message, .. } => assert!(!message.is_empty()),
            _ => panic!("Wrong error variant"),
        }
    }
}
