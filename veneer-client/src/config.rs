use serde::{Deserialize, Serialize};

/// How a language client reaches its server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ConnectionConfig {
    /// WebSocket endpoint assembled from parts.
    WebSocket {
        #[serde(default)]
        secured: bool,
        host: String,
        #[serde(default)]
        port: Option<u16>,
        #[serde(default)]
        path: Option<String>,
    },
    /// WebSocket endpoint given as a literal `ws://`/`wss://` URL.
    WebSocketUrl { url: String },
    /// Dedicated language-server worker process spawned from a command line.
    ///
    /// A pre-spawned process is attached through
    /// [`crate::wrapper::LanguageClientWrapper::set_worker`] instead; the
    /// command here is then only used for reporting.
    Worker {
        command: String,
        #[serde(default)]
        args: Vec<String>,
    },
}

/// Description of one language client, owned by exactly one wrapper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageClientConfig {
    /// Display name used in logs and status reports.
    #[serde(default)]
    pub name: Option<String>,
    /// Document selector; filled in from the editor config when empty.
    #[serde(default)]
    pub language_id: String,
    pub connection: ConnectionConfig,
    /// Passed verbatim as the `initialize` request's initializationOptions.
    #[serde(default)]
    pub initialization_options: Option<serde_json::Value>,
    /// Settings object used to answer `workspace/configuration` requests,
    /// keyed by (dotted) section name.
    #[serde(default)]
    pub configuration_options: Option<serde_json::Value>,
    /// Workspace folder reported to the server, when there is one.
    #[serde(default)]
    pub workspace_uri: Option<String>,
}

impl LanguageClientConfig {
    pub fn client_name(&self) -> String {
        if let Some(name) = &self.name {
            return name.clone();
        }
        if self.language_id.is_empty() {
            "language client".to_string()
        } else {
            format!("{} language client", self.language_id)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_config_is_tagged_on_type() {
        let config = ConnectionConfig::WebSocket {
            secured: false,
            host: "localhost".to_string(),
            port: Some(3000),
            path: Some("sampleServer".to_string()),
        };
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["type"], "WebSocket");
        assert_eq!(json["host"], "localhost");

        let back: ConnectionConfig = serde_json::from_value(json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn worker_args_default_to_empty() {
        let config: ConnectionConfig =
            serde_json::from_str(r#"{"type": "Worker", "command": "clangd"}"#).unwrap();
        assert_eq!(
            config,
            ConnectionConfig::Worker {
                command: "clangd".to_string(),
                args: vec![],
            }
        );
    }

    #[test]
    fn client_name_falls_back_to_language_id() {
        let config = LanguageClientConfig {
            name: None,
            language_id: "json".to_string(),
            connection: ConnectionConfig::WebSocketUrl {
                url: "ws://localhost/lsp".to_string(),
            },
            initialization_options: None,
            configuration_options: None,
            workspace_uri: None,
        };
        assert_eq!(config.client_name(), "json language client");
    }
}
