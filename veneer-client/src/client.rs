use std::collections::HashMap;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot, watch, Mutex as TokioMutex};

use crate::error::ClientError;
use crate::transport::TransportChannels;

type PendingRequests =
    Arc<TokioMutex<HashMap<i64, oneshot::Sender<Result<serde_json::Value, String>>>>>;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Serialize)]
struct JsonRpcRequest {
    jsonrpc: &'static str,
    id: i64,
    method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    params: Option<serde_json::Value>,
}

#[derive(Deserialize, Debug)]
struct JsonRpcMessage {
    // Required for JSON-RPC protocol deserialization; not read directly.
    #[allow(dead_code)]
    jsonrpc: String,
    id: Option<serde_json::Value>,
    result: Option<serde_json::Value>,
    error: Option<JsonRpcError>,
    method: Option<String>,
    params: Option<serde_json::Value>,
}

#[derive(Deserialize, Debug)]
struct JsonRpcError {
    code: i64,
    message: String,
}

/// Notifications surfaced to the embedding application.
#[derive(Debug)]
pub enum LanguageClientEvent {
    Initialized {
        name: String,
    },
    Diagnostics {
        uri: String,
        version: Option<i32>,
        diagnostics: Vec<lsp_types::Diagnostic>,
    },
    Error {
        name: String,
        message: String,
    },
    Stopped {
        name: String,
    },
}

/// Pieces of the client config the protocol layer needs.
#[derive(Debug, Default, Clone)]
pub struct ClientStartOptions {
    pub initialization_options: Option<serde_json::Value>,
    pub configuration_options: Option<serde_json::Value>,
    pub workspace_uri: Option<String>,
}

fn parse_uri(s: &str) -> Result<lsp_types::Uri, ClientError> {
    lsp_types::Uri::from_str(s)
        .map_err(|e| ClientError::configuration(format!("invalid document uri '{}': {}", s, e)))
}

fn workspace_folder_name(root_uri: &str) -> String {
    root_uri
        .rsplit('/')
        .find(|segment| !segment.is_empty())
        .unwrap_or("workspace")
        .to_string()
}

fn send_jsonrpc_result(
    sender: &mpsc::UnboundedSender<Vec<u8>>,
    id: serde_json::Value,
    result: serde_json::Value,
) {
    let msg = serde_json::json!({
        "jsonrpc": "2.0",
        "id": id,
        "result": result,
    });
    if let Ok(body) = serde_json::to_vec(&msg) {
        let _ = sender.send(body);
    }
}

fn send_jsonrpc_error(
    sender: &mpsc::UnboundedSender<Vec<u8>>,
    id: serde_json::Value,
    code: i64,
    message: &str,
) {
    let msg = serde_json::json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": {
            "code": code,
            "message": message,
        }
    });
    if let Ok(body) = serde_json::to_vec(&msg) {
        let _ = sender.send(body);
    }
}

/// Walk a dotted section path into the configured settings object.
fn lookup_section<'a>(
    config: &'a serde_json::Value,
    section: &str,
) -> Option<&'a serde_json::Value> {
    let mut current = config;
    for part in section.split('.') {
        current = current.get(part)?;
    }
    Some(current)
}

/// A JSON-RPC language client bound to one open transport.
///
/// Created by [`crate::wrapper::LanguageClientWrapper`]; the transport is
/// already open when `start` runs, and the initialize handshake has
/// completed by the time `start` returns.
pub struct LanguageClient {
    sender: mpsc::UnboundedSender<Vec<u8>>,
    pending: PendingRequests,
    next_id: Arc<TokioMutex<i64>>,
    pub capabilities: Arc<TokioMutex<Option<lsp_types::ServerCapabilities>>>,
    event_tx: mpsc::UnboundedSender<LanguageClientEvent>,
    name: String,
    stopped: Arc<AtomicBool>,
    closed: watch::Receiver<bool>,
}

impl LanguageClient {
    pub async fn start(
        name: &str,
        transport: TransportChannels,
        options: ClientStartOptions,
        event_tx: mpsc::UnboundedSender<LanguageClientEvent>,
    ) -> Result<Self, ClientError> {
        let TransportChannels {
            outbound,
            inbound,
            closed,
        } = transport;

        let pending: PendingRequests = Arc::new(TokioMutex::new(HashMap::new()));
        let stopped = Arc::new(AtomicBool::new(false));

        tokio::spawn(Self::dispatch_task(
            inbound,
            pending.clone(),
            outbound.clone(),
            event_tx.clone(),
            name.to_string(),
            options.clone(),
            stopped.clone(),
        ));

        let client = LanguageClient {
            sender: outbound,
            pending,
            next_id: Arc::new(TokioMutex::new(1i64)),
            capabilities: Arc::new(TokioMutex::new(None)),
            event_tx: event_tx.clone(),
            name: name.to_string(),
            stopped,
            closed,
        };

        client.initialize(&options).await?;
        log::info!("language client '{}' initialized", name);

        Ok(client)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// True while the transport is open and the client was not shut down.
    pub fn is_running(&self) -> bool {
        !self.stopped.load(Ordering::SeqCst) && !*self.closed.borrow()
    }

    async fn dispatch_task(
        mut inbound: mpsc::UnboundedReceiver<Vec<u8>>,
        pending: PendingRequests,
        sender: mpsc::UnboundedSender<Vec<u8>>,
        event_tx: mpsc::UnboundedSender<LanguageClientEvent>,
        name: String,
        options: ClientStartOptions,
        stopped: Arc<AtomicBool>,
    ) {
        while let Some(body) = inbound.recv().await {
            let msg: JsonRpcMessage = match serde_json::from_slice(&body) {
                Ok(msg) => msg,
                Err(e) => {
                    log::warn!("failed to parse message from language server: {}", e);
                    continue;
                }
            };

            if let Some(id) = msg.id.clone() {
                if msg.method.is_none() {
                    if let Some(id_num) = id.as_i64() {
                        let mut pending = pending.lock().await;
                        if let Some(tx) = pending.remove(&id_num) {
                            if let Some(error) = msg.error {
                                let _ = tx.send(Err(format!(
                                    "server error {}: {}",
                                    error.code, error.message
                                )));
                            } else {
                                let _ =
                                    tx.send(Ok(msg.result.unwrap_or(serde_json::Value::Null)));
                            }
                        }
                    }
                    continue;
                }
            }

            if let Some(method) = &msg.method {
                if let Some(id) = msg.id {
                    Self::handle_server_request(method, id, msg.params, &sender, &options);
                    continue;
                }
                Self::handle_server_notification(method, msg.params, &event_tx);
            }
        }

        // The transport is gone; fail anything still waiting so callers
        // get an error instead of hanging.
        stopped.store(true, Ordering::SeqCst);
        {
            let mut pending = pending.lock().await;
            let count = pending.len();
            if count > 0 {
                log::warn!(
                    "draining {} pending request(s) for '{}' after transport close",
                    count,
                    name
                );
                for (_, tx) in pending.drain() {
                    let _ = tx.send(Err("language server connection closed".to_string()));
                }
            }
        }
        let _ = event_tx.send(LanguageClientEvent::Stopped { name });
    }

    fn handle_server_request(
        method: &str,
        id: serde_json::Value,
        params: Option<serde_json::Value>,
        sender: &mpsc::UnboundedSender<Vec<u8>>,
        options: &ClientStartOptions,
    ) {
        match method {
            "workspace/configuration" => {
                let answers = params
                    .as_ref()
                    .and_then(|p| p.get("items"))
                    .and_then(|v| v.as_array())
                    .map(|items| {
                        items
                            .iter()
                            .map(|item| {
                                let section = item.get("section").and_then(|s| s.as_str());
                                match (section, options.configuration_options.as_ref()) {
                                    (Some(section), Some(config)) => lookup_section(config, section)
                                        .cloned()
                                        .unwrap_or(serde_json::Value::Null),
                                    _ => serde_json::Value::Null,
                                }
                            })
                            .collect::<Vec<_>>()
                    })
                    .unwrap_or_default();
                send_jsonrpc_result(sender, id, serde_json::Value::Array(answers));
            }
            "window/workDoneProgress/create" => {
                send_jsonrpc_result(sender, id, serde_json::Value::Null);
            }
            "workspace/workspaceFolders" => {
                let folders = match &options.workspace_uri {
                    Some(uri) => {
                        let folder = serde_json::json!({
                            "uri": uri,
                            "name": workspace_folder_name(uri),
                        });
                        vec![folder]
                    }
                    None => vec![],
                };
                send_jsonrpc_result(sender, id, serde_json::Value::Array(folders));
            }
            "client/registerCapability" | "client/unregisterCapability" => {
                send_jsonrpc_result(sender, id, serde_json::Value::Null);
            }
            _ => {
                send_jsonrpc_error(sender, id, -32601, "Method not found");
            }
        }
    }

    fn handle_server_notification(
        method: &str,
        params: Option<serde_json::Value>,
        event_tx: &mpsc::UnboundedSender<LanguageClientEvent>,
    ) {
        match method {
            "textDocument/publishDiagnostics" => {
                if let Some(params) = params {
                    if let Ok(diag_params) =
                        serde_json::from_value::<lsp_types::PublishDiagnosticsParams>(params)
                    {
                        let _ = event_tx.send(LanguageClientEvent::Diagnostics {
                            uri: diag_params.uri.to_string(),
                            version: diag_params.version,
                            diagnostics: diag_params.diagnostics,
                        });
                    }
                }
            }
            "window/logMessage" | "window/showMessage" | "$/logTrace" | "$/progress" => {}
            _ => {
                log::debug!("unhandled language server notification: {}", method);
            }
        }
    }

    pub async fn request<P: Serialize>(
        &self,
        method: &str,
        params: P,
    ) -> Result<serde_json::Value, ClientError> {
        let id = {
            let mut next = self.next_id.lock().await;
            let id = *next;
            *next += 1;
            id
        };

        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            id,
            method: method.to_string(),
            params: Some(
                serde_json::to_value(params)
                    .map_err(|e| ClientError::connection_with("failed to encode request", e))?,
            ),
        };
        let body = serde_json::to_vec(&request)
            .map_err(|e| ClientError::connection_with("failed to encode request", e))?;

        let (tx, rx) = oneshot::channel();
        {
            let mut pending = self.pending.lock().await;
            pending.insert(id, tx);
        }

        self.sender
            .send(body)
            .map_err(|_| ClientError::connection("language server connection closed"))?;

        match tokio::time::timeout(REQUEST_TIMEOUT, rx).await {
            Ok(result) => result
                .map_err(|_| ClientError::connection(format!("request '{}' cancelled", method)))?
                .map_err(|e| {
                    ClientError::connection_with(format!("request '{}' failed", method), e)
                }),
            Err(_) => {
                // Remove the pending entry so the oneshot sender is dropped
                let mut pending = self.pending.lock().await;
                pending.remove(&id);
                Err(ClientError::connection(format!(
                    "request '{}' timed out after {}s",
                    method,
                    REQUEST_TIMEOUT.as_secs()
                )))
            }
        }
    }

    pub fn notify<P: Serialize>(&self, method: &str, params: P) -> Result<(), ClientError> {
        let msg = serde_json::json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": serde_json::to_value(params)
                .map_err(|e| ClientError::connection_with("failed to encode notification", e))?,
        });
        let body = serde_json::to_vec(&msg)
            .map_err(|e| ClientError::connection_with("failed to encode notification", e))?;
        self.sender
            .send(body)
            .map_err(|_| ClientError::connection("language server connection closed"))
    }

    #[allow(deprecated)]
    async fn initialize(&self, options: &ClientStartOptions) -> Result<(), ClientError> {
        let (root_uri, workspace_folders) = match &options.workspace_uri {
            Some(uri) => {
                let folder = lsp_types::WorkspaceFolder {
                    uri: parse_uri(uri)?,
                    name: workspace_folder_name(uri),
                };
                (Some(parse_uri(uri)?), Some(vec![folder]))
            }
            None => (None, None),
        };

        let params = lsp_types::InitializeParams {
            root_uri,
            workspace_folders,
            initialization_options: options.initialization_options.clone(),
            capabilities: lsp_types::ClientCapabilities {
                workspace: Some(lsp_types::WorkspaceClientCapabilities {
                    configuration: Some(true),
                    workspace_folders: Some(true),
                    ..Default::default()
                }),
                text_document: Some(lsp_types::TextDocumentClientCapabilities {
                    completion: Some(lsp_types::CompletionClientCapabilities {
                        completion_item: Some(lsp_types::CompletionItemCapability {
                            snippet_support: Some(true),
                            documentation_format: Some(vec![
                                lsp_types::MarkupKind::PlainText,
                                lsp_types::MarkupKind::Markdown,
                            ]),
                            insert_replace_support: Some(true),
                            ..Default::default()
                        }),
                        ..Default::default()
                    }),
                    hover: Some(lsp_types::HoverClientCapabilities {
                        content_format: Some(vec![
                            lsp_types::MarkupKind::PlainText,
                            lsp_types::MarkupKind::Markdown,
                        ]),
                        ..Default::default()
                    }),
                    publish_diagnostics: Some(lsp_types::PublishDiagnosticsClientCapabilities {
                        related_information: Some(true),
                        version_support: Some(true),
                        ..Default::default()
                    }),
                    definition: Some(lsp_types::GotoCapability {
                        link_support: Some(true),
                        ..Default::default()
                    }),
                    ..Default::default()
                }),
                ..Default::default()
            },
            client_info: Some(lsp_types::ClientInfo {
                name: "Veneer".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
            ..Default::default()
        };

        let result = self.request("initialize", params).await?;

        if let Ok(init_result) = serde_json::from_value::<lsp_types::InitializeResult>(result) {
            *self.capabilities.lock().await = Some(init_result.capabilities);
        }

        self.notify("initialized", lsp_types::InitializedParams {})?;

        let _ = self.event_tx.send(LanguageClientEvent::Initialized {
            name: self.name.clone(),
        });

        Ok(())
    }

    pub fn did_open(
        &self,
        uri: &str,
        language_id: &str,
        version: i32,
        text: &str,
    ) -> Result<(), ClientError> {
        self.notify(
            "textDocument/didOpen",
            lsp_types::DidOpenTextDocumentParams {
                text_document: lsp_types::TextDocumentItem {
                    uri: parse_uri(uri)?,
                    language_id: language_id.to_string(),
                    version,
                    text: text.to_string(),
                },
            },
        )
    }

    pub fn did_change(&self, uri: &str, version: i32, text: &str) -> Result<(), ClientError> {
        self.notify(
            "textDocument/didChange",
            lsp_types::DidChangeTextDocumentParams {
                text_document: lsp_types::VersionedTextDocumentIdentifier {
                    uri: parse_uri(uri)?,
                    version,
                },
                content_changes: vec![lsp_types::TextDocumentContentChangeEvent {
                    range: None,
                    range_length: None,
                    text: text.to_string(),
                }],
            },
        )
    }

    pub fn did_save(&self, uri: &str) -> Result<(), ClientError> {
        self.notify(
            "textDocument/didSave",
            lsp_types::DidSaveTextDocumentParams {
                text_document: lsp_types::TextDocumentIdentifier {
                    uri: parse_uri(uri)?,
                },
                text: None,
            },
        )
    }

    pub fn did_close(&self, uri: &str) -> Result<(), ClientError> {
        self.notify(
            "textDocument/didClose",
            lsp_types::DidCloseTextDocumentParams {
                text_document: lsp_types::TextDocumentIdentifier {
                    uri: parse_uri(uri)?,
                },
            },
        )
    }

    pub async fn completion(
        &self,
        uri: &str,
        line: u32,
        character: u32,
    ) -> Result<Vec<lsp_types::CompletionItem>, ClientError> {
        let result = self
            .request(
                "textDocument/completion",
                lsp_types::CompletionParams {
                    text_document_position: lsp_types::TextDocumentPositionParams {
                        text_document: lsp_types::TextDocumentIdentifier {
                            uri: parse_uri(uri)?,
                        },
                        position: lsp_types::Position { line, character },
                    },
                    context: Some(lsp_types::CompletionContext {
                        trigger_kind: lsp_types::CompletionTriggerKind::INVOKED,
                        trigger_character: None,
                    }),
                    work_done_progress_params: Default::default(),
                    partial_result_params: Default::default(),
                },
            )
            .await?;

        if let Ok(list) = serde_json::from_value::<lsp_types::CompletionResponse>(result) {
            match list {
                lsp_types::CompletionResponse::Array(items) => Ok(items),
                lsp_types::CompletionResponse::List(list) => Ok(list.items),
            }
        } else {
            Ok(vec![])
        }
    }

    pub async fn hover(
        &self,
        uri: &str,
        line: u32,
        character: u32,
    ) -> Result<Option<lsp_types::Hover>, ClientError> {
        let result = self
            .request(
                "textDocument/hover",
                lsp_types::HoverParams {
                    text_document_position_params: lsp_types::TextDocumentPositionParams {
                        text_document: lsp_types::TextDocumentIdentifier {
                            uri: parse_uri(uri)?,
                        },
                        position: lsp_types::Position { line, character },
                    },
                    work_done_progress_params: Default::default(),
                },
            )
            .await?;

        if result.is_null() {
            Ok(None)
        } else {
            serde_json::from_value(result)
                .map_err(|e| ClientError::connection_with("invalid hover response", e))
        }
    }

    pub async fn definition(
        &self,
        uri: &str,
        line: u32,
        character: u32,
    ) -> Result<Option<lsp_types::GotoDefinitionResponse>, ClientError> {
        let result = self
            .request(
                "textDocument/definition",
                lsp_types::GotoDefinitionParams {
                    text_document_position_params: lsp_types::TextDocumentPositionParams {
                        text_document: lsp_types::TextDocumentIdentifier {
                            uri: parse_uri(uri)?,
                        },
                        position: lsp_types::Position { line, character },
                    },
                    work_done_progress_params: Default::default(),
                    partial_result_params: Default::default(),
                },
            )
            .await?;

        if result.is_null() {
            Ok(None)
        } else {
            serde_json::from_value(result)
                .map_err(|e| ClientError::connection_with("invalid definition response", e))
        }
    }

    /// Politely stop the server, then tell it to exit.
    pub async fn shutdown(&self) -> Result<(), ClientError> {
        // Give the server a few seconds to answer shutdown
        let _ = tokio::time::timeout(
            SHUTDOWN_TIMEOUT,
            self.request("shutdown", serde_json::Value::Null),
        )
        .await;
        // Drain any remaining pending requests before sending exit
        {
            let mut pending = self.pending.lock().await;
            for (_, tx) in pending.drain() {
                let _ = tx.send(Err("language server shutting down".to_string()));
            }
        }
        let result = self.notify("exit", serde_json::Value::Null);
        self.stopped.store(true, Ordering::SeqCst);
        result
    }
}
