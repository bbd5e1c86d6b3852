//! Typed error taxonomy for the Guru backend.
//!
//! A closed set of gateway/startup errors (spec §4). `Service` and
//! `ResponseFormat` surface to the user as the same themed narration; they are
//! distinguished here only for logging and testing.

/// A specialized `Result` type for Guru backend operations.
pub type Result<T> = std::result::Result<T, GuruError>;

/// Errors raised by configuration and the model gateway.
#[derive(Debug, thiserror::Error)]
pub enum GuruError {
  /// The required API key environment variable is missing. Fatal at startup.
  #[error("missing required environment variable: {var}")]
  MissingApiKey {
    /// Name of the missing environment variable.
    var: &'static str,
  },

  /// Transport/HTTP/auth/quota failure of a model call.
  #[error("model service error: {message}")]
  Service {
    /// Description of the failure.
    message: String,
  },

  /// Call succeeded but the payload is not valid JSON after fence stripping,
  /// or misses required fields.
  #[error("model response format error: {message}")]
  ResponseFormat {
    /// Description of the format violation.
    message: String,
  },
}

impl GuruError {
  /// Creates a `Service` error from anything string-like.
  #[must_use]
  pub fn service(message: impl Into<String>) -> Self {
    Self::Service { message: message.into() }
  }

  /// Creates a `ResponseFormat` error from anything string-like.
  #[must_use]
  pub fn response_format(message: impl Into<String>) -> Self {
    Self::ResponseFormat { message: message.into() }
  }

  /// A stable, log-safe label for the error variant (used as a tracing field).
  #[must_use]
  pub const fn kind(&self) -> &'static str {
    match self {
      Self::MissingApiKey { .. } => "missing_api_key",
      Self::Service { .. } => "service",
      Self::ResponseFormat { .. } => "response_format",
    }
  }
}
