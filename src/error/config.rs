//! Configuration errors

use super::StencilError;

/// Creates an invalid configuration error for a field
pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> StencilError {
    StencilError::ConfigInvalid {
        field: field.into(),
        message: message.into(),
    }
}

/// Creates a config parse failed error
pub fn parse_failed(path: impl Into<String>, reason: impl Into<String>) -> StencilError {
    StencilError::ConfigParseFailed {
        path: path.into(),
        reason: reason.into(),
    }
}

/// Creates a config read failed error
pub fn read_failed(path: impl Into<String>, reason: impl Into<String>) -> StencilError {
    StencilError::ConfigReadFailed {
        path: path.into(),
        reason: reason.into(),
    }
}
