use tokio::sync::mpsc;

use veneer_client::{LanguageClientEvent, LanguageClientWrapper};
use veneer_editor::app::{EditorApp, EditorHost};

use crate::config::WrapperConfig;
use crate::error::WrapperError;

/// Orchestrates one editor app and its optional language client.
///
/// The editor is created first; the language client only starts once the
/// editor exists, bound to the resolved language id. Disposal runs in the
/// opposite order.
pub struct EditorWrapper {
    config: WrapperConfig,
    editor_app: Option<EditorApp>,
    language_client: Option<LanguageClientWrapper>,
    event_tx: mpsc::UnboundedSender<LanguageClientEvent>,
}

impl EditorWrapper {
    pub fn new(
        config: WrapperConfig,
        event_tx: mpsc::UnboundedSender<LanguageClientEvent>,
    ) -> Result<Self, WrapperError> {
        config.validate()?;
        Ok(EditorWrapper {
            config,
            editor_app: None,
            language_client: None,
            event_tx,
        })
    }

    pub fn config(&self) -> &WrapperConfig {
        &self.config
    }

    pub fn editor_app(&self) -> Option<&EditorApp> {
        self.editor_app.as_ref()
    }

    pub fn language_client(&mut self) -> Option<&mut LanguageClientWrapper> {
        self.language_client.as_mut()
    }

    /// Create the editor, then start the language client when configured.
    pub async fn start(&mut self, host: Box<dyn EditorHost>) -> Result<(), WrapperError> {
        let mut app = EditorApp::new(self.config.editor_app.clone(), host)?;
        app.init()?;
        self.editor_app = Some(app);

        if let Some(client_config) = self.config.resolved_language_client() {
            let mut client = LanguageClientWrapper::new(Some(client_config), self.event_tx.clone());
            client.start().await?;
            self.language_client = Some(client);
        }
        Ok(())
    }

    /// Apply a replacement config, recreating as little as possible.
    ///
    /// The language client is only restarted when its own config changed.
    pub async fn update(&mut self, config: WrapperConfig) -> Result<(), WrapperError> {
        config.validate()?;

        if let Some(app) = self.editor_app.as_mut() {
            app.update_config(config.editor_app.clone())?;
        }

        let previous_client = self.config.resolved_language_client();
        let next_client = config.resolved_language_client();
        if previous_client != next_client {
            if let Some(client) = self.language_client.as_mut() {
                if let Err(e) = client.dispose(false).await {
                    log::warn!("disposing previous language client: {}", e);
                }
            }
            self.language_client = None;
            if let Some(client_config) = next_client {
                let mut client =
                    LanguageClientWrapper::new(Some(client_config), self.event_tx.clone());
                client.start().await?;
                self.language_client = Some(client);
            }
        }

        self.config = config;
        Ok(())
    }

    /// Stop the language client before tearing down the editor.
    pub async fn dispose(&mut self) -> Result<(), WrapperError> {
        if let Some(mut client) = self.language_client.take() {
            if let Err(e) = client.dispose(false).await {
                log::warn!("language client dispose reported: {}", e);
            }
        }
        if let Some(mut app) = self.editor_app.take() {
            app.dispose()?;
        }
        Ok(())
    }

    pub fn is_started(&self) -> bool {
        self.editor_app
            .as_ref()
            .map(EditorApp::is_started)
            .unwrap_or(false)
    }

    /// Aggregated status lines for the editor and the language client.
    pub fn report_status(&self) -> Vec<String> {
        let mut lines = Vec::new();
        match &self.editor_app {
            Some(app) => lines.extend(app.report_status()),
            None => lines.push("editor app: not created".to_string()),
        }
        match &self.language_client {
            Some(client) => lines.extend(client.report_status()),
            None => lines.push("language client: none configured".to_string()),
        }
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;
    use veneer_editor::protocol::EditorCommand;
    use veneer_editor::{CodeResource, EditorAppConfig, EditorError};

    #[derive(Clone, Default)]
    struct RecordingHost {
        commands: Rc<RefCell<Vec<EditorCommand>>>,
    }

    impl EditorHost for RecordingHost {
        fn dispatch(&self, command: &EditorCommand) -> Result<(), EditorError> {
            self.commands.borrow_mut().push(command.clone());
            Ok(())
        }
    }

    fn events() -> mpsc::UnboundedSender<LanguageClientEvent> {
        let (tx, _rx) = mpsc::unbounded_channel();
        tx
    }

    fn editor_only_config(text: &str) -> WrapperConfig {
        WrapperConfig {
            editor_app: EditorAppConfig {
                language_id: "rust".to_string(),
                code: Some(CodeResource::with_uri(text, "inmemory://model/1")),
                ..Default::default()
            },
            language_client: None,
        }
    }

    #[test]
    fn invalid_editor_config_is_rejected() {
        let mut config = editor_only_config("x");
        config.editor_app.use_diff_editor = true;
        assert!(EditorWrapper::new(config, events()).is_err());
    }

    #[tokio::test]
    async fn start_without_language_client_only_builds_the_editor() {
        let host = RecordingHost::default();
        let mut wrapper = EditorWrapper::new(editor_only_config("fn main() {}"), events()).unwrap();
        assert!(!wrapper.is_started());

        wrapper.start(Box::new(host.clone())).await.unwrap();
        assert!(wrapper.is_started());
        assert!(wrapper.language_client.is_none());

        let commands = host.commands.borrow();
        assert!(matches!(commands[0], EditorCommand::Init { .. }));
        assert!(matches!(commands[1], EditorCommand::OpenModel { .. }));
    }

    #[tokio::test]
    async fn update_with_text_change_stays_in_place() {
        let host = RecordingHost::default();
        let mut wrapper = EditorWrapper::new(editor_only_config("fn main() {}"), events()).unwrap();
        wrapper.start(Box::new(host.clone())).await.unwrap();
        host.commands.borrow_mut().clear();

        wrapper
            .update(editor_only_config("fn main() { todo!() }"))
            .await
            .unwrap();

        let commands = host.commands.borrow();
        assert_eq!(commands.len(), 1);
        assert!(matches!(commands[0], EditorCommand::SetModelValue { .. }));
    }

    #[tokio::test]
    async fn dispose_tears_down_the_editor() {
        let host = RecordingHost::default();
        let mut wrapper = EditorWrapper::new(editor_only_config("fn main() {}"), events()).unwrap();
        wrapper.start(Box::new(host.clone())).await.unwrap();

        wrapper.dispose().await.unwrap();
        assert!(!wrapper.is_started());
        assert!(matches!(
            host.commands.borrow().last(),
            Some(EditorCommand::Dispose)
        ));
    }

    #[tokio::test]
    async fn status_reports_both_components() {
        let mut wrapper = EditorWrapper::new(editor_only_config("fn main() {}"), events()).unwrap();
        let lines = wrapper.report_status();
        assert!(lines.iter().any(|line| line.contains("not created")));

        wrapper
            .start(Box::new(RecordingHost::default()))
            .await
            .unwrap();
        let lines = wrapper.report_status();
        assert!(lines.iter().any(|line| line.contains("editor app")));
        assert!(lines.iter().any(|line| line.contains("none configured")));
    }
}
