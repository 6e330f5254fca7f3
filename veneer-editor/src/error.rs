use thiserror::Error;

/// Errors reported by the editor side of the wrapper.
#[derive(Debug, Error)]
pub enum EditorError {
    /// The supplied configuration cannot produce a working editor.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The embedding host failed to deliver a command to the editor page.
    #[error("editor host error: {0}")]
    Host(String),

    /// The embedded web assets could not be extracted.
    #[error("asset error: {0}")]
    Assets(String),
}

impl EditorError {
    pub fn configuration(message: impl Into<String>) -> Self {
        EditorError::Configuration(message.into())
    }

    pub fn host(message: impl Into<String>) -> Self {
        EditorError::Host(message.into())
    }

    pub fn assets(message: impl Into<String>) -> Self {
        EditorError::Assets(message.into())
    }
}
