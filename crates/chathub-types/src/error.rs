use thiserror::Error;

/// Errors from storage context and repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("storage connection error: {0}")]
    Connection(String),

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("storage I/O error: {0}")]
    Io(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("remote store returned {status}: {message}")]
    Remote { status: u16, message: String },
}

/// Startup configuration errors. Always fatal.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {message}")]
    Read { path: String, message: String },

    #[error("failed to parse config file: {0}")]
    Parse(String),

    #[error("[{section}] section is required when {option}.type is '{kind}'")]
    MissingSection {
        option: &'static str,
        kind: &'static str,
        section: &'static str,
    },

    #[error("{field} is required when {option}.type is '{kind}'")]
    MissingField {
        option: &'static str,
        kind: &'static str,
        field: &'static str,
    },

    #[error("invalid value for {field}: {message}")]
    Invalid {
        field: &'static str,
        message: String,
    },
}

/// Errors from OCR engines.
#[derive(Debug, Error)]
pub enum OcrError {
    #[error("OCR support is not configured")]
    NotSupported,

    #[error("unsupported image format: {0}")]
    UnsupportedFormat(String),

    #[error("OCR service error: {0}")]
    Service(String),

    #[error("OCR engine error: {0}")]
    Engine(String),

    #[error("OCR operation did not complete in time")]
    Timeout,
}

/// Errors from authentication schemes.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing bearer token")]
    MissingToken,

    #[error("invalid token: {0}")]
    InvalidToken(String),

    #[error("signing keys unavailable: {0}")]
    Jwks(String),
}

/// Errors from chat service operations.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("chat not found")]
    NotFound,

    #[error("user '{0}' is already a participant of this chat")]
    AlreadyParticipant(String),

    #[error("invalid request: {0}")]
    Validation(String),

    #[error(transparent)]
    Storage(#[from] RepositoryError),

    #[error(transparent)]
    Ocr(#[from] OcrError),
}
