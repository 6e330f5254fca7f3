use crate::config::EditorAppConfig;
use crate::diff::{model_update_kind, requires_editor_recreation, ModelUpdate};
use crate::error::EditorError;
use crate::protocol::{DiffSide, EditorCommand, InitPayload};

/// The seam to the embedding frontend: delivers protocol commands to the
/// editor page, e.g. by evaluating JavaScript in a WebView.
pub trait EditorHost {
    fn dispatch(&self, command: &EditorCommand) -> Result<(), EditorError>;
}

/// What applying a config update actually did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppliedUpdate {
    None,
    Code,
    Model,
    Recreated,
}

/// Owns one editor instance's configuration and drives the external widget
/// through the protocol.
pub struct EditorApp {
    config: EditorAppConfig,
    host: Box<dyn EditorHost>,
    started: bool,
}

impl EditorApp {
    pub fn new(config: EditorAppConfig, host: Box<dyn EditorHost>) -> Result<Self, EditorError> {
        config.validate()?;
        Ok(EditorApp {
            config,
            host,
            started: false,
        })
    }

    pub fn config(&self) -> &EditorAppConfig {
        &self.config
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Build the editor and open the configured model(s).
    pub fn init(&mut self) -> Result<(), EditorError> {
        log::info!(
            "creating {} editor for language '{}'",
            self.config.kind.as_str(),
            self.config.language_id
        );
        self.host.dispatch(&EditorCommand::Init {
            payload: init_payload(&self.config),
        })?;
        self.open_models()?;
        self.started = true;
        Ok(())
    }

    fn open_models(&self) -> Result<(), EditorError> {
        if self.config.use_diff_editor {
            let original = self.config.code_original.clone().ok_or_else(|| {
                EditorError::configuration("diff editor requested without original content")
            })?;
            let modified = self.config.code.clone().unwrap_or_default();
            self.host.dispatch(&EditorCommand::OpenDiffModels {
                original: DiffSide {
                    text: original.text,
                    uri: original.uri,
                },
                modified: DiffSide {
                    text: modified.text,
                    uri: modified.uri,
                },
                language: self.config.language_id.clone(),
            })
        } else if let Some(code) = &self.config.code {
            self.host.dispatch(&EditorCommand::OpenModel {
                text: code.text.clone(),
                uri: code.uri.clone(),
                language: self.config.language_id.clone(),
            })
        } else {
            Ok(())
        }
    }

    /// Apply a replacement config, doing as little work as the diff allows.
    pub fn update_config(&mut self, update: EditorAppConfig) -> Result<AppliedUpdate, EditorError> {
        update.validate()?;

        if !self.started {
            self.config = update;
            return Ok(AppliedUpdate::None);
        }

        if requires_editor_recreation(&self.config, &update) {
            log::info!("structural config change, recreating editor");
            self.host.dispatch(&EditorCommand::Dispose)?;
            self.config = update;
            self.host.dispatch(&EditorCommand::Init {
                payload: init_payload(&self.config),
            })?;
            self.open_models()?;
            return Ok(AppliedUpdate::Recreated);
        }

        if self.config.editor_options != update.editor_options {
            self.host.dispatch(&EditorCommand::UpdateOptions {
                options: update.editor_options.clone(),
            })?;
        }
        if self.config.diff_editor_options != update.diff_editor_options {
            self.host.dispatch(&EditorCommand::UpdateDiffOptions {
                options: update.diff_editor_options.clone(),
            })?;
        }

        match model_update_kind(&self.config, &update) {
            ModelUpdate::Model => {
                self.config = update;
                self.open_models()?;
                Ok(AppliedUpdate::Model)
            }
            ModelUpdate::Code => {
                if self.config.code_text() != update.code_text() {
                    if let Some(text) = update.code_text() {
                        self.host.dispatch(&EditorCommand::SetModelValue {
                            text: text.to_string(),
                            original: false,
                        })?;
                    }
                }
                if self.config.code_original_text() != update.code_original_text() {
                    if let Some(text) = update.code_original_text() {
                        self.host.dispatch(&EditorCommand::SetModelValue {
                            text: text.to_string(),
                            original: true,
                        })?;
                    }
                }
                self.config = update;
                Ok(AppliedUpdate::Code)
            }
            ModelUpdate::None => {
                self.config = update;
                Ok(AppliedUpdate::None)
            }
        }
    }

    pub fn dispose(&mut self) -> Result<(), EditorError> {
        if self.started {
            self.host.dispatch(&EditorCommand::Dispose)?;
            self.started = false;
        }
        Ok(())
    }

    /// Human-readable status lines; diagnostic only.
    pub fn report_status(&self) -> Vec<String> {
        vec![
            format!("editor app ({}):", self.config.kind.as_str()),
            format!("  language: {}", self.config.language_id),
            format!("  diff editor: {}", self.config.use_diff_editor),
            format!("  started: {}", self.started),
        ]
    }
}

fn init_payload(config: &EditorAppConfig) -> InitPayload {
    InitPayload {
        kind: config.kind.as_str().to_string(),
        theme: config.theme.clone(),
        use_diff_editor: config.use_diff_editor,
        options: config.editor_options.clone(),
        diff_options: config.diff_editor_options.clone(),
        user_configuration: config.user_configuration.clone(),
        workers: config.worker_factories.entries().clone(),
        default_worker: config.worker_factories.default_script().map(str::to_string),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CodeResource;
    use std::cell::RefCell;
    use std::rc::Rc;

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

    fn config_with_code(text: &str) -> EditorAppConfig {
        EditorAppConfig {
            language_id: "rust".to_string(),
            code: Some(CodeResource::with_uri(text, "inmemory://model/1")),
            ..Default::default()
        }
    }

    fn started_app(host: &RecordingHost) -> EditorApp {
        let mut app =
            EditorApp::new(config_with_code("fn main() {}"), Box::new(host.clone())).unwrap();
        app.init().unwrap();
        host.commands.borrow_mut().clear();
        app
    }

    #[test]
    fn init_emits_init_then_open_model() {
        let host = RecordingHost::default();
        let mut app =
            EditorApp::new(config_with_code("fn main() {}"), Box::new(host.clone())).unwrap();
        assert!(!app.is_started());
        app.init().unwrap();
        assert!(app.is_started());

        let commands = host.commands.borrow();
        assert_eq!(commands.len(), 2);
        assert!(matches!(commands[0], EditorCommand::Init { .. }));
        assert!(matches!(commands[1], EditorCommand::OpenModel { .. }));
    }

    #[test]
    fn invalid_config_is_rejected_at_construction() {
        let config = EditorAppConfig {
            use_diff_editor: true,
            ..config_with_code("x")
        };
        assert!(EditorApp::new(config, Box::<RecordingHost>::default()).is_err());
    }

    #[test]
    fn unchanged_config_is_a_noop() {
        let host = RecordingHost::default();
        let mut app = started_app(&host);
        let applied = app.update_config(config_with_code("fn main() {}")).unwrap();
        assert_eq!(applied, AppliedUpdate::None);
        assert!(host.commands.borrow().is_empty());
    }

    #[test]
    fn text_change_sets_value_in_place() {
        let host = RecordingHost::default();
        let mut app = started_app(&host);
        let applied = app.update_config(config_with_code("fn main() { }")).unwrap();
        assert_eq!(applied, AppliedUpdate::Code);

        let commands = host.commands.borrow();
        assert_eq!(commands.len(), 1);
        assert!(matches!(
            commands[0],
            EditorCommand::SetModelValue { original: false, .. }
        ));
    }

    #[test]
    fn language_change_swaps_the_model() {
        let host = RecordingHost::default();
        let mut app = started_app(&host);
        let mut update = config_with_code("fn main() {}");
        update.language_id = "toml".to_string();
        let applied = app.update_config(update).unwrap();
        assert_eq!(applied, AppliedUpdate::Model);

        let commands = host.commands.borrow();
        assert_eq!(commands.len(), 1);
        assert!(matches!(commands[0], EditorCommand::OpenModel { .. }));
    }

    #[test]
    fn theme_change_recreates_the_editor() {
        let host = RecordingHost::default();
        let mut app = started_app(&host);
        let mut update = config_with_code("fn main() {}");
        update.theme = "vs-dark".to_string();
        let applied = app.update_config(update).unwrap();
        assert_eq!(applied, AppliedUpdate::Recreated);

        let commands = host.commands.borrow();
        assert!(matches!(commands[0], EditorCommand::Dispose));
        assert!(matches!(commands[1], EditorCommand::Init { .. }));
        assert!(matches!(commands[2], EditorCommand::OpenModel { .. }));
    }

    #[test]
    fn cosmetic_option_change_updates_in_place() {
        let host = RecordingHost::default();
        let mut app = started_app(&host);
        let mut update = config_with_code("fn main() {}");
        update.editor_options.font_size = Some(16);
        let applied = app.update_config(update).unwrap();
        assert_eq!(applied, AppliedUpdate::None);

        let commands = host.commands.borrow();
        assert_eq!(commands.len(), 1);
        assert!(matches!(commands[0], EditorCommand::UpdateOptions { .. }));
    }

    #[test]
    fn dispose_is_idempotent() {
        let host = RecordingHost::default();
        let mut app = started_app(&host);
        app.dispose().unwrap();
        app.dispose().unwrap();
        assert_eq!(host.commands.borrow().len(), 1);
        assert!(!app.is_started());
    }
}
