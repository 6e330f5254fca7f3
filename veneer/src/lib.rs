//! Top-level wrapper tying a Monaco editor app to an optional language
//! client. See `veneer-editor` for the editor protocol and config diffing,
//! and `veneer-client` for transports and the client lifecycle.

pub mod config;
pub mod error;
pub mod wrapper;

pub use config::WrapperConfig;
pub use error::WrapperError;
pub use wrapper::EditorWrapper;

pub use veneer_client as client;
pub use veneer_editor as editor;
