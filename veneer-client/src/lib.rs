//! Language client plumbing for Veneer: connection configs, WebSocket and
//! worker transports, a JSON-RPC client, and the lifecycle wrapper owning
//! one connection per editor.

pub mod client;
pub mod config;
pub mod error;
pub mod transport;
pub mod url;
pub mod worker;
pub mod wrapper;

pub use client::{LanguageClient, LanguageClientEvent};
pub use config::{ConnectionConfig, LanguageClientConfig};
pub use error::ClientError;
pub use url::create_url;
pub use worker::LanguageWorker;
pub use wrapper::{ClientState, LanguageClientWrapper};
