use thiserror::Error;

/// Message shown to the user for every failed translation attempt.
pub const TRANSLATION_FAILED: &str = "Translation failed. Please try again.";

/// Failures talking to the translation service. Never shown verbatim to the
/// user; the controller collapses all of them into [`TRANSLATION_FAILED`].
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("request to translation service failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("translation service returned status {0}")]
    Status(u16),
    #[error("translation service returned an empty body")]
    EmptyBody,
    #[error("failed to build multipart payload: {0}")]
    Payload(String),
}

/// Reasons the upload widget refuses a drop or picker selection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadRejection {
    #[error("only one file can be translated at a time")]
    TooManyFiles,
    #[error("unsupported file type: {0} (expected .pptx, .docx or .pdf)")]
    UnsupportedType(String),
    #[error("file type {mime} does not match extension of {name}")]
    MimeMismatch { name: String, mime: String },
    #[error("file is larger than the {limit_mb} MB upload limit")]
    TooLarge { limit_mb: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown target language code: {0}")]
pub struct UnknownLanguage(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("session limit of {0} reached")]
pub struct SessionLimitReached(pub usize);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] ::config::ConfigError),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}
