use thiserror::Error;

/// Anything the top-level wrapper can fail with.
#[derive(Debug, Error)]
pub enum WrapperError {
    #[error(transparent)]
    Editor(#[from] veneer_editor::EditorError),
    #[error(transparent)]
    Client(#[from] veneer_client::ClientError),
}
