/*!
 * Error types for the lingobridge library.
 *
 * Two layers are kept apart:
 * - `ProviderError` is raised where a remote call fails (transport, status, body).
 * - `TranslateError` is the taxonomy callers see; adapters map provider errors into it.
 */

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Errors raised by a single remote call to a provider API
#[derive(Error, Debug, Clone)]
pub enum ProviderError {
    /// The request could not be sent or the response could not be read
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// The response body did not have the expected shape
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// The API answered with a non-success status
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API, or the raw body when it carries none
        message: String,
    },

    /// The connection could not be established or timed out
    #[error("Connection error: {0}")]
    ConnectionError(String),
}

impl ProviderError {
    /// HTTP status carried by the error, if the server answered at all
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::ApiError { status_code, .. } => Some(*status_code),
            _ => None,
        }
    }

    /// The underlying message without the variant prefix
    pub fn message(&self) -> &str {
        match self {
            Self::RequestFailed(message)
            | Self::ParseError(message)
            | Self::ConnectionError(message) => message,
            Self::ApiError { message, .. } => message,
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(error: reqwest::Error) -> Self {
        // Some providers carry the credential in the query string
        let error = error.without_url();

        if error.is_connect() || error.is_timeout() || error.is_request() || error.is_body() {
            Self::ConnectionError(error.to_string())
        } else if error.is_decode() {
            Self::ParseError(error.to_string())
        } else {
            Self::RequestFailed(error.to_string())
        }
    }
}

static DAILY_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)per[ -]day|\bdaily\b|\brpd\b").expect("valid daily pattern"));

static HOURLY_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)per[ -]hour|\bhourly\b").expect("valid hourly pattern"));

static MINUTE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)per[ -]minute|\brpm\b|\btpm\b").expect("valid minute pattern"));

/// Time window a rate limit applies to, as far as the provider message reveals it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RateLimitWindow {
    Daily,
    Hourly,
    Minute,
    Unspecified,
}

impl RateLimitWindow {
    /// Infer the window from a provider message
    pub fn from_message(message: &str) -> Self {
        if DAILY_PATTERN.is_match(message) {
            Self::Daily
        } else if HOURLY_PATTERN.is_match(message) {
            Self::Hourly
        } else if MINUTE_PATTERN.is_match(message) {
            Self::Minute
        } else {
            Self::Unspecified
        }
    }
}

impl fmt::Display for RateLimitWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Daily => "daily",
            Self::Hourly => "hourly",
            Self::Minute => "per-minute",
            Self::Unspecified => "unspecified",
        };
        write!(f, "{}", label)
    }
}

/// Discriminant of `TranslateError`, for callers that branch on the kind only
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    ApiKeyMissing,
    ApiKeyInvalid,
    RateLimitExceeded,
    NetworkError,
    TranslationError,
    TextEmpty,
    TextTooLong,
    ProviderNotFound,
    NoProviderSelected,
}

/// Errors surfaced to callers of the adapter and manager APIs
#[derive(Error, Debug, Clone)]
pub enum TranslateError {
    /// No credential stored for the provider
    #[error("{message}")]
    ApiKeyMissing { message: String },

    /// Credential failed the shape check or was rejected by the API
    #[error("{message}")]
    ApiKeyInvalid { message: String },

    /// The provider refused the request because of quota or rate limits
    #[error("{message}")]
    RateLimitExceeded {
        /// Window the limit applies to
        window: RateLimitWindow,
        message: String,
    },

    /// The provider could not be reached
    #[error("{message}")]
    NetworkError { message: String },

    /// Any other remote failure
    #[error("{message}")]
    Translation {
        /// HTTP status when the provider answered
        status_code: Option<u16>,
        message: String,
    },

    /// Text is blank or shorter than the configured minimum
    #[error("Text to translate is empty")]
    TextEmpty,

    /// Text exceeds the configured maximum
    #[error("Text is too long: {length} characters (maximum {max})")]
    TextTooLong { length: usize, max: usize },

    /// The provider id is not part of the registry
    #[error("Unknown translation provider: {0}")]
    ProviderNotFound(String),

    /// No provider has been loaded yet
    #[error("No translation provider selected")]
    NoProviderSelected,
}

impl TranslateError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ApiKeyMissing { .. } => ErrorKind::ApiKeyMissing,
            Self::ApiKeyInvalid { .. } => ErrorKind::ApiKeyInvalid,
            Self::RateLimitExceeded { .. } => ErrorKind::RateLimitExceeded,
            Self::NetworkError { .. } => ErrorKind::NetworkError,
            Self::Translation { .. } => ErrorKind::TranslationError,
            Self::TextEmpty => ErrorKind::TextEmpty,
            Self::TextTooLong { .. } => ErrorKind::TextTooLong,
            Self::ProviderNotFound(_) => ErrorKind::ProviderNotFound,
            Self::NoProviderSelected => ErrorKind::NoProviderSelected,
        }
    }

    /// Rate-limit window, when this is a rate-limit error
    pub fn rate_limit_window(&self) -> Option<RateLimitWindow> {
        match self {
            Self::RateLimitExceeded { window, .. } => Some(*window),
            _ => None,
        }
    }
}
