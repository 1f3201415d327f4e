use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for the application
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the application
#[derive(Debug, Error)]
pub enum Error {
    #[error("Project path does not exist: {}", .0.display())]
    ProjectNotFound(PathBuf),

    #[error("No Spring Boot controllers found in project: {}", .0.display())]
    NoControllersFound(PathBuf),

    #[error("Failed to fetch OpenAPI spec from {source_name}: {message}")]
    FetchFailed { source_name: String, message: String },

    #[error("Invalid OpenAPI specification: {0}")]
    InvalidDocument(String),

    #[error("Failed to parse Java file {}: {message}", file.display())]
    ParseError { file: PathBuf, message: String },

    #[error("Failed to convert to Postman collection: {0}")]
    ConversionFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// Stable, machine-readable code for the error kind.
    pub fn code(&self) -> &'static str {
        match self {
            Error::ProjectNotFound(_) => "PROJECT_NOT_FOUND",
            Error::NoControllersFound(_) => "NO_CONTROLLERS_FOUND",
            Error::FetchFailed { .. } => "OPENAPI_FETCH_FAILED",
            Error::InvalidDocument(_) => "INVALID_OPENAPI",
            Error::ParseError { .. } => "PARSE_ERROR",
            Error::ConversionFailed(_) => "CONVERSION_FAILED",
            Error::Io(_) => "IO_ERROR",
            Error::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(format!("JSON error: {}", err))
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::Serialization(format!("YAML error: {}", err))
    }
}
