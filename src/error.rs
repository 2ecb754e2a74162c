//! Error handling for the overload engines
//!
//! Configuration errors are hard failures, environment errors are
//! recoverable once the host retries (usually after a user gesture).

use thiserror::Error;

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, OverloadError>;

/// Main error type for engine operations
#[derive(Error, Debug)]
pub enum OverloadError {
    // Configuration Errors
    #[error("Unknown source type '{source_type}' for layer '{layer_id}'")]
    UnknownSourceType {
        layer_id: String,
        source_type: String,
    },

    #[error("Invalid colour: {value}")]
    InvalidColor { value: String },

    #[error("Invalid engine settings: {reason}")]
    InvalidSettings { reason: String },

    // Environment Errors
    #[error("Audio backend unavailable: {reason}")]
    BackendUnavailable { reason: String },

    #[error("Drawing surface unavailable: {reason}")]
    SurfaceUnavailable { reason: String },

    // Asset Errors
    #[error("Sample not found: {sample_ref}")]
    SampleNotFound { sample_ref: String },

    #[error("Invalid audio file: {reason}")]
    InvalidAudio { reason: String },

    // I/O Errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    // Serialization Errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl OverloadError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            OverloadError::UnknownSourceType { .. } => "UNKNOWN_SOURCE_TYPE",
            OverloadError::InvalidColor { .. } => "INVALID_COLOR",
            OverloadError::InvalidSettings { .. } => "INVALID_SETTINGS",
            OverloadError::BackendUnavailable { .. } => "BACKEND_UNAVAILABLE",
            OverloadError::SurfaceUnavailable { .. } => "SURFACE_UNAVAILABLE",
            OverloadError::SampleNotFound { .. } => "SAMPLE_NOT_FOUND",
            OverloadError::InvalidAudio { .. } => "INVALID_AUDIO",
            OverloadError::Io(_) => "IO_ERROR",
            OverloadError::Wav(_) => "WAV_ERROR",
            OverloadError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Check if the host can recover by retrying the operation
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            OverloadError::BackendUnavailable { .. }
                | OverloadError::SurfaceUnavailable { .. }
                | OverloadError::SampleNotFound { .. }
        )
    }

    /// Get recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            OverloadError::UnknownSourceType { .. } => vec![
                "Use one of the supported source types: oscillator, noise, sample",
                "Check the layer definition in the soundscape config",
            ],
            OverloadError::BackendUnavailable { .. } => vec![
                "Retry initialization after a user interaction",
                "Check that an audio output device is available",
            ],
            OverloadError::SurfaceUnavailable { .. } => vec![
                "Make sure the drawing surface has a non-zero size",
                "Recreate the engine after the surface has been laid out",
            ],
            OverloadError::SampleNotFound { .. } => vec![
                "Register the sample with the engine before building the soundscape",
                "Check the sample path is correct",
            ],
            OverloadError::InvalidColor { .. } => {
                vec!["Colours are written as #rgb, #rrggbb or #rrggbbaa"]
            }
            _ => vec![],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = OverloadError::UnknownSourceType {
            layer_id: "crowd".to_string(),
            source_type: "bogus".to_string(),
        };
        assert_eq!(err.error_code(), "UNKNOWN_SOURCE_TYPE");
        assert!(err.to_string().contains("bogus"));
    }

    #[test]
    fn test_environment_errors_are_recoverable() {
        let err = OverloadError::BackendUnavailable {
            reason: "no gesture".to_string(),
        };
        assert!(err.is_recoverable());
        assert!(!err.recovery_suggestions().is_empty());

        let err = OverloadError::UnknownSourceType {
            layer_id: "a".to_string(),
            source_type: "b".to_string(),
        };
        assert!(!err.is_recoverable());
    }
}
