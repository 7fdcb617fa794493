use miette::Diagnostic;
use thiserror::Error;

/// Main error type for the application
#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error("API error (HTTP {status}): {message}")]
    #[diagnostic(code(lukkari::api))]
    Api { status: u16, message: String },

    #[error("Authentication error: {0}")]
    #[diagnostic(
        code(lukkari::auth),
        help("store a token with the set_api_token binary")
    )]
    Auth(String),

    #[error("HTTP error: {0}")]
    #[diagnostic(code(lukkari::http))]
    Http(#[from] reqwest::Error),

    #[error("Parse error: {0}")]
    #[diagnostic(code(lukkari::parse))]
    Parse(String),

    #[error("Validation error: {0}")]
    #[diagnostic(code(lukkari::validation))]
    Validation(String),

    #[error("Storage error: {0}")]
    #[diagnostic(code(lukkari::storage))]
    Storage(String),

    #[error("Environment error: {0}")]
    #[diagnostic(code(lukkari::environment))]
    Environment(String),

    #[error("Configuration error: {0}")]
    #[diagnostic(code(lukkari::config))]
    Config(String),

    #[error("Component error: {0}")]
    #[diagnostic(code(lukkari::component))]
    Component(String),

    #[error(transparent)]
    #[diagnostic(code(lukkari::io))]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    #[diagnostic(code(lukkari::serialization))]
    Serialization(String),

    #[error("Other error: {0}")]
    #[diagnostic(code(lukkari::other))]
    Other(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<redis::RedisError> for Error {
    fn from(err: redis::RedisError) -> Self {
        Error::Storage(err.to_string())
    }
}

/// Type alias for Result with our Error type
pub type PlannerResult<T> = Result<T, Error>;

/// Helper to create environment errors
pub fn env_error(var: &str) -> Error {
    Error::Environment(format!("Missing environment variable: {}", var))
}

/// Helper to create configuration errors
pub fn config_error(message: &str) -> Error {
    Error::Config(message.to_string())
}

/// Helper to create API errors from a non-success response
pub fn api_error(status: u16, message: &str) -> Error {
    Error::Api {
        status,
        message: message.to_string(),
    }
}

/// Helper to create authentication errors
pub fn auth_error(message: &str) -> Error {
    Error::Auth(message.to_string())
}

/// Helper to create parse errors
pub fn parse_error(message: &str) -> Error {
    Error::Parse(message.to_string())
}

/// Helper to create validation errors
pub fn validation_error(message: &str) -> Error {
    Error::Validation(message.to_string())
}

/// Helper to create storage errors
pub fn storage_error(message: &str) -> Error {
    Error::Storage(message.to_string())
}

/// Helper to create component errors
pub fn component_error(message: &str) -> Error {
    Error::Component(message.to_string())
}

/// Helper to create other errors
pub fn other_error(message: &str) -> Error {
    Error::Other(message.to_string())
}
