use std::sync::Arc;

use tokio::sync::mpsc;

use crate::client::{ClientStartOptions, LanguageClient, LanguageClientEvent};
use crate::config::{ConnectionConfig, LanguageClientConfig};
use crate::error::ClientError;
use crate::transport::{self, TransportChannels};
use crate::url::create_url;
use crate::worker::LanguageWorker;

/// Lifecycle phase of a [`LanguageClientWrapper`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientState {
    Uninitialized,
    Connecting,
    Running,
    Stopped,
    Disposed,
}

/// Owns at most one live language-client connection bound to one language id.
///
/// `start` is idempotent while the client is running; `dispose` stops the
/// client before the worker is terminated.
pub struct LanguageClientWrapper {
    config: Option<LanguageClientConfig>,
    client: Option<Arc<LanguageClient>>,
    worker: Option<LanguageWorker>,
    state: ClientState,
    event_tx: mpsc::UnboundedSender<LanguageClientEvent>,
}

impl LanguageClientWrapper {
    pub fn new(
        config: Option<LanguageClientConfig>,
        event_tx: mpsc::UnboundedSender<LanguageClientEvent>,
    ) -> Self {
        LanguageClientWrapper {
            config,
            client: None,
            worker: None,
            state: ClientState::Uninitialized,
            event_tx,
        }
    }

    pub fn name(&self) -> String {
        self.config
            .as_ref()
            .map(LanguageClientConfig::client_name)
            .unwrap_or_else(|| "language client".to_string())
    }

    pub fn config(&self) -> Option<&LanguageClientConfig> {
        self.config.as_ref()
    }

    /// True iff a client exists and its transport reports running.
    pub fn is_started(&self) -> bool {
        matches!(&self.client, Some(client) if client.is_running())
    }

    /// The last transition, corrected for a transport that died underneath.
    pub fn state(&self) -> ClientState {
        if self.state == ClientState::Running && !self.is_started() {
            ClientState::Stopped
        } else {
            self.state
        }
    }

    pub fn client(&self) -> Option<Arc<LanguageClient>> {
        self.client.clone()
    }

    /// Attach a pre-spawned worker for the next `start`.
    ///
    /// Replacing a previous worker leaves that process to its owner.
    pub fn set_worker(&mut self, worker: LanguageWorker) {
        if self.worker.replace(worker).is_some() {
            log::debug!("replaced worker for '{}'", self.name());
        }
    }

    /// Open the transport and run the client handshake.
    ///
    /// A no-op success while the client is already running; no second
    /// transport is created.
    pub async fn start(&mut self) -> Result<(), ClientError> {
        if self.is_started() {
            log::debug!("language client '{}' is already running", self.name());
            return Ok(());
        }
        match self.connect().await {
            Ok(()) => Ok(()),
            Err(e) => {
                self.state = ClientState::Stopped;
                let _ = self.event_tx.send(LanguageClientEvent::Error {
                    name: self.name(),
                    message: e.to_string(),
                });
                Err(e)
            }
        }
    }

    async fn connect(&mut self) -> Result<(), ClientError> {
        let config = self
            .config
            .clone()
            .ok_or_else(|| ClientError::configuration("no language client configuration present"))?;

        self.state = ClientState::Connecting;
        let transport = match &config.connection {
            ConnectionConfig::WebSocket { .. } | ConnectionConfig::WebSocketUrl { .. } => {
                let url = create_url(&config.connection)?;
                transport::open_websocket(&url).await?
            }
            ConnectionConfig::Worker { command, args } => {
                if self.worker.is_none() {
                    self.worker = Some(LanguageWorker::spawn(command, args)?);
                }
                match self.worker.as_mut() {
                    Some(worker) => transport::open_worker(worker)?,
                    None => {
                        return Err(ClientError::connection("language worker unavailable"));
                    }
                }
            }
        };

        self.attach(transport, &config).await
    }

    pub(crate) async fn attach(
        &mut self,
        transport: TransportChannels,
        config: &LanguageClientConfig,
    ) -> Result<(), ClientError> {
        let options = ClientStartOptions {
            initialization_options: config.initialization_options.clone(),
            configuration_options: config.configuration_options.clone(),
            workspace_uri: config.workspace_uri.clone(),
        };
        let name = config.client_name();
        let client =
            LanguageClient::start(&name, transport, options, self.event_tx.clone()).await?;
        self.client = Some(Arc::new(client));
        self.state = ClientState::Running;
        log::info!("language client '{}' is running", name);
        Ok(())
    }

    /// Dispose the current client and start over.
    ///
    /// A replacement worker, when given, is installed before the new start;
    /// `keep_worker` spares the old process from termination.
    pub async fn restart(
        &mut self,
        new_worker: Option<LanguageWorker>,
        keep_worker: bool,
    ) -> Result<(), ClientError> {
        log::info!("restarting language client '{}'", self.name());
        if self.client.is_some() {
            self.dispose(keep_worker).await?;
        }
        if let Some(worker) = new_worker {
            self.set_worker(worker);
        }
        self.start().await
    }

    /// Stop the client and tear the connection down.
    ///
    /// Without a client this only terminates an assigned worker (unless
    /// kept). A client that exists but is not running is a lifecycle error.
    pub async fn dispose(&mut self, keep_worker: bool) -> Result<(), ClientError> {
        match self.client.take() {
            None => {
                self.terminate_worker(keep_worker).await;
                self.state = ClientState::Disposed;
                Ok(())
            }
            Some(client) => {
                if client.is_running() {
                    if let Err(e) = client.shutdown().await {
                        log::warn!("language client '{}' shutdown reported: {}", self.name(), e);
                    }
                    self.terminate_worker(keep_worker).await;
                    self.state = ClientState::Disposed;
                    Ok(())
                } else {
                    self.client = Some(client);
                    Err(ClientError::lifecycle(format!(
                        "language client '{}' exists but is not running",
                        self.name()
                    )))
                }
            }
        }
    }

    async fn terminate_worker(&mut self, keep_worker: bool) {
        if keep_worker {
            return;
        }
        if let Some(mut worker) = self.worker.take() {
            worker.terminate().await;
        }
    }

    /// Human-readable status lines; diagnostic only, no side effects.
    pub fn report_status(&self) -> Vec<String> {
        vec![
            format!("language client '{}':", self.name()),
            format!("  state: {:?}", self.state()),
            format!("  running: {}", self.is_started()),
            format!("  worker attached: {}", self.worker.is_some()),
        ]
    }
}
