use std::collections::HashMap;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Commands: host → editor page (delivered through the embedding WebView)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum EditorCommand {
    /// Build the editor widget from scratch.
    Init { payload: InitPayload },
    OpenModel {
        text: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        uri: Option<String>,
        language: String,
    },
    OpenDiffModels {
        original: DiffSide,
        modified: DiffSide,
        language: String,
    },
    /// Replace the text of the existing model; `original` targets the
    /// left-hand side of a diff editor.
    SetModelValue {
        text: String,
        #[serde(default)]
        original: bool,
    },
    UpdateOptions { options: EditorOptions },
    UpdateDiffOptions { options: DiffEditorOptions },
    SetTheme { theme: String },
    SetReadOnly { read_only: bool },
    Dispose,
}

/// One side of a diff editor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiffSide {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
}

/// Everything the bootstrap script needs to build an editor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitPayload {
    pub kind: String,
    pub theme: String,
    pub use_diff_editor: bool,
    pub options: EditorOptions,
    pub diff_options: DiffEditorOptions,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_configuration: Option<serde_json::Value>,
    /// Worker label → script path, consumed by the page-side worker factory.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub workers: HashMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_worker: Option<String>,
}

// ---------------------------------------------------------------------------
// Events: editor page → host (sent via postMessage)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum EditorEvent {
    Ready,
    ContentChanged {
        content: String,
        version: u32,
        #[serde(default)]
        original: bool,
    },
    CursorMoved {
        line: u32,
        column: u32,
    },
    FocusChanged {
        focused: bool,
    },
    Disposed,
    Error {
        message: String,
    },
}

// ---------------------------------------------------------------------------
// Supporting Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EditorOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tab_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insert_spaces: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub word_wrap: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimap_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_numbers: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_only: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub render_whitespace: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rulers: Option<Vec<u32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folding: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub glyph_margin: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor_style: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor_blinking: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scroll_beyond_last_line: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub smooth_scrolling: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub automatic_layout: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiffEditorOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub render_side_by_side: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ignore_trim_whitespace: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_editable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub render_overview_ruler: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_split_view_resizing: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_are_tagged_on_type() {
        let cmd = EditorCommand::SetTheme {
            theme: "vs-dark".to_string(),
        };
        let json = serde_json::to_value(&cmd).unwrap();
        assert_eq!(json["type"], "SetTheme");
        assert_eq!(json["theme"], "vs-dark");
    }

    #[test]
    fn events_round_trip() {
        let event = EditorEvent::ContentChanged {
            content: "fn main() {}".to_string(),
            version: 3,
            original: false,
        };
        let json = serde_json::to_string(&event).unwrap();
        let back: EditorEvent = serde_json::from_str(&json).unwrap();
        match back {
            EditorEvent::ContentChanged {
                content, version, ..
            } => {
                assert_eq!(content, "fn main() {}");
                assert_eq!(version, 3);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn unset_options_are_not_serialized() {
        let options = EditorOptions {
            font_size: Some(14),
            ..Default::default()
        };
        let json = serde_json::to_value(&options).unwrap();
        assert_eq!(json, serde_json::json!({ "font_size": 14 }));
    }
}
