use thiserror::Error;

/// Errors reported by the language client layer.
///
/// Every failure carries a human-readable message, and connection failures
/// keep the underlying error text so callers can log a single line without
/// losing the cause.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The supplied configuration cannot describe a working connection.
    #[error("configuration error: {message}")]
    Configuration { message: String },

    /// The transport could not be opened, or the client handshake failed.
    #[error("connection error: {message}{}", fmt_cause(.cause))]
    Connection {
        message: String,
        cause: Option<String>,
    },

    /// A lifecycle operation was attempted in a state that cannot honor it.
    #[error("lifecycle error: {message}")]
    Lifecycle { message: String },
}

fn fmt_cause(cause: &Option<String>) -> String {
    match cause {
        Some(cause) => format!(" ({})", cause),
        None => String::new(),
    }
}

impl ClientError {
    pub fn configuration(message: impl Into<String>) -> Self {
        ClientError::Configuration {
            message: message.into(),
        }
    }

    pub fn connection(message: impl Into<String>) -> Self {
        ClientError::Connection {
            message: message.into(),
            cause: None,
        }
    }

    pub fn connection_with(message: impl Into<String>, cause: impl std::fmt::Display) -> Self {
        ClientError::Connection {
            message: message.into(),
            cause: Some(cause.to_string()),
        }
    }

    pub fn lifecycle(message: impl Into<String>) -> Self {
        ClientError::Lifecycle {
            message: message.into(),
        }
    }
}
