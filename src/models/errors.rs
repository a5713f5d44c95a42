//! Centralized Error Handling Module
//!
//! Every failure carries a unique, stable error code so that log lines and
//! API responses can be grepped and monitored.
//!
//! Error codes follow pattern: CATEGORY_SPECIFIC_ERROR
//! - CFG_xxx: Configuration / secrets errors
//! - ENV_xxx: `.env` file errors
//! - APIFY_xxx, AI_xxx: External service errors
//! - API_xxx: HTTP API errors

use std::fmt;

/// Application-wide error type
#[derive(Debug)]
pub struct AppError {
    /// Unique error code for logging/monitoring
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Optional underlying error
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new AppError
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Create AppError with source error
    pub fn with_source(
        code: ErrorCode,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Get error code as string (for logging)
    pub fn code_str(&self) -> &'static str {
        self.code.as_str()
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Unique error codes for monitoring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // ============================================
    // Configuration Errors
    // ============================================
    /// Invalid configuration value
    ConfigInvalidValue,
    /// Missing API key
    ConfigMissingApiKey,
    /// Secrets file could not be read or written
    ConfigSecretsFile,
    /// Unknown secrets file format
    ConfigUnknownFormat,

    // ============================================
    // Env File Errors
    // ============================================
    /// Line is neither blank, a comment, nor KEY=VALUE
    EnvSyntax,

    // ============================================
    // External Service Errors
    // ============================================
    /// Apify API error
    ApifyError,
    /// Apify rejected the token
    ApifyUnauthorized,
    /// Gemini / OpenAI error
    AiProviderError,
    /// AI reply was not the expected JSON
    AiInvalidResponse,
    /// External service timeout
    ExternalTimeout,
    /// Connection to external service failed
    ExternalConnectionFailed,

    // ============================================
    // Feature Errors
    // ============================================
    /// Feature switched off in configuration
    FeatureDisabled,

    // ============================================
    // API Errors
    // ============================================
    /// Invalid request format
    ApiBadRequest,
    /// Resource not found
    ApiNotFound,
    /// Internal server error
    ApiInternalError,

    // ============================================
    // Generic Errors
    // ============================================
    /// Unknown error
    Unknown,
}

impl ErrorCode {
    /// Get string representation of error code
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ConfigInvalidValue => "CFG_INVALID_VALUE",
            Self::ConfigMissingApiKey => "CFG_MISSING_API_KEY",
            Self::ConfigSecretsFile => "CFG_SECRETS_FILE",
            Self::ConfigUnknownFormat => "CFG_UNKNOWN_FORMAT",

            Self::EnvSyntax => "ENV_SYNTAX",

            Self::ApifyError => "APIFY_ERROR",
            Self::ApifyUnauthorized => "APIFY_UNAUTHORIZED",
            Self::AiProviderError => "AI_PROVIDER_ERROR",
            Self::AiInvalidResponse => "AI_INVALID_RESPONSE",
            Self::ExternalTimeout => "EXTERNAL_TIMEOUT",
            Self::ExternalConnectionFailed => "EXTERNAL_CONNECTION_FAILED",

            Self::FeatureDisabled => "FEATURE_DISABLED",

            Self::ApiBadRequest => "API_BAD_REQUEST",
            Self::ApiNotFound => "API_NOT_FOUND",
            Self::ApiInternalError => "API_INTERNAL_ERROR",

            Self::Unknown => "UNKNOWN_ERROR",
        }
    }

    /// Get HTTP status code for API responses
    pub fn http_status(&self) -> u16 {
        match self {
            Self::ApiBadRequest
            | Self::ConfigInvalidValue
            | Self::EnvSyntax
            | Self::ConfigUnknownFormat => 400,
            Self::ConfigMissingApiKey | Self::ApifyUnauthorized => 401,
            Self::FeatureDisabled => 403,
            Self::ApiNotFound => 404,
            Self::ApifyError | Self::AiProviderError | Self::AiInvalidResponse => 502,
            Self::ExternalTimeout => 504,
            _ => 500,
        }
    }

    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ExternalTimeout | Self::ExternalConnectionFailed | Self::ApifyError
        )
    }
}

// ============================================
// Convenience constructors
// ============================================

impl AppError {
    /// Invalid configuration value
    pub fn invalid_value(key: &str, value: &str, expected: &str) -> Self {
        Self::new(
            ErrorCode::ConfigInvalidValue,
            format!("{}={:?} is invalid (expected {})", key, value, expected),
        )
    }

    /// Missing API key
    pub fn missing_api_key(key_name: &str) -> Self {
        Self::new(
            ErrorCode::ConfigMissingApiKey,
            format!("Missing API key: {}", key_name),
        )
    }

    /// Env file syntax error at a line
    pub fn env_syntax(line: usize, msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::EnvSyntax, format!("line {}: {}", line, msg.into()))
    }

    /// Apify error
    pub fn apify_error(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ApifyError, msg)
    }

    /// AI provider error
    pub fn ai_error(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::AiProviderError, msg)
    }

    /// Feature switched off
    pub fn feature_disabled(feature: &str) -> Self {
        Self::new(
            ErrorCode::FeatureDisabled,
            format!("{} is disabled in configuration", feature),
        )
    }

    /// API bad request
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ApiBadRequest, msg)
    }

    /// API internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ApiInternalError, msg)
    }
}

// ============================================
// Result type alias
// ============================================

/// Application Result type
pub type AppResult<T> = Result<T, AppError>;

// ============================================
// Conversion from common error types
// ============================================

impl From<eyre::Report> for AppError {
    fn from(err: eyre::Report) -> Self {
        Self::new(ErrorCode::Unknown, err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::with_source(ErrorCode::ConfigSecretsFile, "IO error", err)
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::new(ErrorCode::ExternalTimeout, "Request timeout")
        } else if err.is_connect() {
            Self::new(ErrorCode::ExternalConnectionFailed, "Connection failed")
        } else {
            Self::new(ErrorCode::Unknown, err.to_string())
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(ErrorCode::AiInvalidResponse, "JSON parse error", err)
    }
}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        Self::with_source(ErrorCode::ConfigSecretsFile, "TOML parse error", err)
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::with_source(ErrorCode::ConfigSecretsFile, "YAML error", err)
    }
}
