pub mod app;
pub mod assets;
pub mod config;
pub mod diff;
pub mod error;
pub mod protocol;

pub use app::{AppliedUpdate, EditorApp, EditorHost};
pub use config::{CodeResource, EditorAppConfig, EditorAppKind, WorkerFactoryRegistry};
pub use diff::{model_update_kind, requires_editor_recreation, ModelUpdate};
pub use error::EditorError;
