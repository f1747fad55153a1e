/**
* filename : error
* author : HAMA
* date: 2025. 11. 3.
* description:
**/

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TerminalError {
    #[error("Data fetch failed: {0}")]
    DataFetch(String),

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Analysis error: {0}")]
    Analysis(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Credentials missing: {0}")]
    CredentialsMissing(String),

    #[error("User already exists: {0}")]
    UserExists(String),

    #[error("Invalid credentials for {0}")]
    InvalidCredentials(String),

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Registration is disabled in hosted mode")]
    RegistrationDisabled,

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl TerminalError {
    /// 분석 실패 분류 (`DataFetch` | `InsufficientData` | `Analysis`)
    pub fn kind(&self) -> &'static str {
        match self {
            TerminalError::DataFetch(_) | TerminalError::Http(_) => "DataFetch",
            TerminalError::InsufficientData(_) => "InsufficientData",
            _ => "Analysis",
        }
    }
}
