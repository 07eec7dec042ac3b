//! Errors raised by model stores.
//!
//! A model store is an external collaborator of the validation engine. The
//! engine never propagates these errors to its callers: a failed lookup while
//! validating becomes a field error, a failed lookup while building a
//! validator becomes a [`BuildError::Storage`](crate::error::BuildError).

use std::fmt;

/// Errors that can occur during model store operations.
#[derive(Debug)]
pub enum StorageError {
    /// No model definition is stored under this name.
    ModelNotFound { model: String },

    /// No record is stored under this key.
    RecordNotFound { model: String, id: String },

    /// Data cannot be stored as given.
    InvalidData { message: String },

    /// The backend is temporarily unavailable.
    Unavailable { message: String },

    /// Generic internal storage error.
    Internal {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::ModelNotFound { model } => write!(f, "Model not found: {}", model),
            StorageError::RecordNotFound { model, id } => {
                write!(f, "Record not found: {}/{}", model, id)
            }
            StorageError::InvalidData { message } => write!(f, "Invalid data: {}", message),
            StorageError::Unavailable { message } => {
                write!(f, "Storage unavailable: {}", message)
            }
            StorageError::Internal { message, .. } => {
                write!(f, "Internal storage error: {}", message)
            }
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StorageError::Internal {
                source: Some(source),
                ..
            } => Some(source.as_ref()),
            _ => None,
        }
    }
}

impl StorageError {
    /// Create a model not found error.
    pub fn model_not_found(model: impl Into<String>) -> Self {
        Self::ModelNotFound {
            model: model.into(),
        }
    }

    /// Create a record not found error.
    pub fn record_not_found(model: impl Into<String>, id: impl Into<String>) -> Self {
        Self::RecordNotFound {
            model: model.into(),
            id: id.into(),
        }
    }

    /// Create an invalid data error.
    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::InvalidData {
            message: message.into(),
        }
    }

    /// Create an unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// Whether the error means "not there" rather than "broken".
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StorageError::ModelNotFound { .. } | StorageError::RecordNotFound { .. }
        )
    }

    /// Whether retrying the operation may succeed.
    pub fn is_temporary(&self) -> bool {
        matches!(self, StorageError::Unavailable { .. })
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(error: serde_json::Error) -> Self {
        Self::InvalidData {
            message: error.to_string(),
        }
    }
}
