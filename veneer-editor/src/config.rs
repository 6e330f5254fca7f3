use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::EditorError;
use crate::protocol::{DiffEditorOptions, EditorOptions};

/// Which flavor of editor app a config describes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EditorAppKind {
    #[default]
    Classic,
    Extended,
    VscodeApi,
}

impl EditorAppKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EditorAppKind::Classic => "classic",
            EditorAppKind::Extended => "extended",
            EditorAppKind::VscodeApi => "vscodeApi",
        }
    }
}

/// A piece of text content plus the model URI it should live under.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CodeResource {
    pub text: String,
    #[serde(default)]
    pub uri: Option<String>,
}

impl CodeResource {
    pub fn new(text: impl Into<String>) -> Self {
        CodeResource {
            text: text.into(),
            uri: None,
        }
    }

    pub fn with_uri(text: impl Into<String>, uri: impl Into<String>) -> Self {
        CodeResource {
            text: text.into(),
            uri: Some(uri.into()),
        }
    }
}

/// Maps Monaco worker labels to the scripts that provide them.
///
/// Each editor app carries its own registry, serialized into the init
/// payload for the page-side worker factory; nothing is process-wide.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkerFactoryRegistry {
    #[serde(default)]
    workers: HashMap<String, String>,
    #[serde(default)]
    default_worker: Option<String>,
}

impl WorkerFactoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, label: impl Into<String>, script: impl Into<String>) {
        self.workers.insert(label.into(), script.into());
    }

    pub fn set_default(&mut self, script: impl Into<String>) {
        self.default_worker = Some(script.into());
    }

    /// The worker script for a label, falling back to the default worker.
    pub fn resolve(&self, label: &str) -> Option<&str> {
        self.workers
            .get(label)
            .map(String::as_str)
            .or(self.default_worker.as_deref())
    }

    pub fn entries(&self) -> &HashMap<String, String> {
        &self.workers
    }

    pub fn default_script(&self) -> Option<&str> {
        self.default_worker.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty() && self.default_worker.is_none()
    }
}

/// Full description of one editor app instance.
///
/// Built once per wrapper start and replaced wholesale on reconfiguration;
/// the diff logic in [`crate::diff`] decides how much of the running editor
/// a replacement actually touches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorAppConfig {
    pub kind: EditorAppKind,
    pub language_id: String,
    pub code: Option<CodeResource>,
    pub code_original: Option<CodeResource>,
    pub use_diff_editor: bool,
    pub theme: String,
    pub editor_options: EditorOptions,
    pub diff_editor_options: DiffEditorOptions,
    /// Extra settings for the extended and vscode-api flavors, passed to the
    /// page verbatim.
    pub user_configuration: Option<serde_json::Value>,
    pub worker_factories: WorkerFactoryRegistry,
}

impl Default for EditorAppConfig {
    fn default() -> Self {
        EditorAppConfig {
            kind: EditorAppKind::Classic,
            language_id: "plaintext".to_string(),
            code: None,
            code_original: None,
            use_diff_editor: false,
            theme: "vs".to_string(),
            editor_options: EditorOptions::default(),
            diff_editor_options: DiffEditorOptions::default(),
            user_configuration: None,
            worker_factories: WorkerFactoryRegistry::default(),
        }
    }
}

impl EditorAppConfig {
    /// Reject configs that cannot produce a working editor.
    pub fn validate(&self) -> Result<(), EditorError> {
        if self.use_diff_editor && self.code_original.is_none() {
            return Err(EditorError::configuration(
                "diff editor requested without original content",
            ));
        }
        Ok(())
    }

    pub fn code_text(&self) -> Option<&str> {
        self.code.as_ref().map(|code| code.text.as_str())
    }

    pub fn code_uri(&self) -> Option<&str> {
        self.code.as_ref().and_then(|code| code.uri.as_deref())
    }

    pub fn code_original_text(&self) -> Option<&str> {
        self.code_original.as_ref().map(|code| code.text.as_str())
    }

    pub fn code_original_uri(&self) -> Option<&str> {
        self.code_original.as_ref().and_then(|code| code.uri.as_deref())
    }
}
