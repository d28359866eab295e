use thiserror::Error;

pub type Result<T> = std::result::Result<T, TaipoError>;

/// Exit status for a usage error (nothing to correct).
pub const EXIT_USAGE: i32 = 2;
/// Exit status when no corrected command was run.
pub const EXIT_NOT_RUN: i32 = 127;
/// Exit status for user cancellation (128 + SIGINT).
pub const EXIT_CANCELLED: i32 = 130;

#[derive(Error, Debug)]
pub enum TaipoError {
    #[error("Credential error: {message}")]
    CredentialError { message: String },

    #[error("API error: {message}")]
    ApiError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Network error: {message}")]
    NetworkError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Execution error: {message}")]
    ExecutionError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Input error: {message}")]
    InputError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("System error: {message}")]
    SystemError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Cancelled by user")]
    Cancelled,
}

impl TaipoError {
    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Self::CredentialError { message } => {
                format!("Missing credential: {}", message)
            }
            Self::ApiError { message, .. } => {
                format!("OpenAI error: {}", message)
            }
            Self::NetworkError { message, .. } => {
                format!("Network error: {}", message)
            }
            Self::ExecutionError { message, .. } => {
                format!("Could not run command: {}", message)
            }
            Self::InputError { message, .. } => {
                format!("Usage: {}", message)
            }
            Self::SystemError { message, .. } => {
                format!("System error: {}", message)
            }
            Self::Cancelled => "Cancelled.".to_string(),
        }
    }

    /// Get an appropriate exit code for the error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::InputError { .. } => EXIT_USAGE,
            Self::Cancelled => EXIT_CANCELLED,
            _ => 1,
        }
    }

    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

impl From<std::io::Error> for TaipoError {
    fn from(error: std::io::Error) -> Self {
        if error.kind() == std::io::ErrorKind::Interrupted {
            return TaipoError::Cancelled;
        }
        TaipoError::SystemError {
            message: format!("I/O error: {}", error),
            source: Some(Box::new(error)),
        }
    }
}

impl From<reqwest::Error> for TaipoError {
    fn from(error: reqwest::Error) -> Self {
        let message = if error.is_timeout() {
            "request to OpenAI timed out".to_string()
        } else if error.is_connect() {
            format!("could not connect to OpenAI: {}", error)
        } else {
            format!("request to OpenAI failed: {}", error)
        };
        TaipoError::NetworkError {
            message,
            source: Some(Box::new(error)),
        }
    }
}
