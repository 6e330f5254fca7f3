use serde::{Deserialize, Serialize};

use veneer_client::LanguageClientConfig;
use veneer_editor::EditorAppConfig;

use crate::error::WrapperError;

/// Top-level configuration: one editor app plus an optional language client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WrapperConfig {
    pub editor_app: EditorAppConfig,
    #[serde(default)]
    pub language_client: Option<LanguageClientConfig>,
}

impl WrapperConfig {
    pub fn validate(&self) -> Result<(), WrapperError> {
        self.editor_app.validate()?;
        Ok(())
    }

    /// The language client config with its document selector resolved: an
    /// empty language id inherits the editor's language.
    pub fn resolved_language_client(&self) -> Option<LanguageClientConfig> {
        self.language_client.clone().map(|mut config| {
            if config.language_id.is_empty() {
                config.language_id = self.editor_app.language_id.clone();
            }
            config
        })
    }
}
