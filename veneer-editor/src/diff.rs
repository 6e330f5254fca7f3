use crate::config::EditorAppConfig;

/// How much of the running editor a replacement config touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelUpdate {
    /// Nothing relevant changed.
    None,
    /// Same model, new text: set the value in place.
    Code,
    /// Language id or model URI changed: the model must be swapped.
    Model,
}

/// Classify a config update against the currently active config.
///
/// A changed language id or model URI always forces a model swap, even when
/// the text happens to be identical; text-only changes stay cheap.
pub fn model_update_kind(current: &EditorAppConfig, update: &EditorAppConfig) -> ModelUpdate {
    if current.language_id != update.language_id
        || current.code_uri() != update.code_uri()
        || current.code_original_uri() != update.code_original_uri()
    {
        return ModelUpdate::Model;
    }
    if current.code_text() != update.code_text()
        || current.code_original_text() != update.code_original_text()
    {
        return ModelUpdate::Code;
    }
    ModelUpdate::None
}

/// Whether the whole editor, not just its model, must be torn down and
/// rebuilt. Structural options are compared field by field; everything else
/// can be applied to the live editor.
pub fn requires_editor_recreation(current: &EditorAppConfig, update: &EditorAppConfig) -> bool {
    current.kind != update.kind
        || current.theme != update.theme
        || current.use_diff_editor != update.use_diff_editor
        || current.editor_options.read_only != update.editor_options.read_only
        || current.user_configuration != update.user_configuration
        || current.worker_factories != update.worker_factories
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CodeResource, EditorAppKind};

    fn base() -> EditorAppConfig {
        EditorAppConfig {
            language_id: "typescript".to_string(),
            code: Some(CodeResource::with_uri(
                "console.log('hi');",
                "inmemory://model/1",
            )),
            ..Default::default()
        }
    }

    #[test]
    fn identical_configs_need_nothing() {
        assert_eq!(model_update_kind(&base(), &base()), ModelUpdate::None);
        assert!(!requires_editor_recreation(&base(), &base()));
    }

    #[test]
    fn text_change_is_a_cheap_update() {
        let mut update = base();
        update.code = Some(CodeResource::with_uri(
            "console.log('bye');",
            "inmemory://model/1",
        ));
        assert_eq!(model_update_kind(&base(), &update), ModelUpdate::Code);
    }

    #[test]
    fn original_text_change_is_a_cheap_update() {
        let mut current = base();
        current.code_original = Some(CodeResource::new("a"));
        let mut update = current.clone();
        update.code_original = Some(CodeResource::new("b"));
        assert_eq!(model_update_kind(&current, &update), ModelUpdate::Code);
    }

    #[test]
    fn language_change_forces_model_swap_even_with_same_text() {
        let mut update = base();
        update.language_id = "javascript".to_string();
        assert_eq!(model_update_kind(&base(), &update), ModelUpdate::Model);
    }

    #[test]
    fn uri_change_forces_model_swap() {
        let mut update = base();
        update.code = Some(CodeResource::with_uri(
            "console.log('hi');",
            "inmemory://model/2",
        ));
        assert_eq!(model_update_kind(&base(), &update), ModelUpdate::Model);
    }

    #[test]
    fn uri_change_beats_simultaneous_text_change() {
        let mut update = base();
        update.code = Some(CodeResource::with_uri(
            "console.log('bye');",
            "inmemory://model/2",
        ));
        assert_eq!(model_update_kind(&base(), &update), ModelUpdate::Model);
    }

    #[test]
    fn theme_change_recreates_the_editor() {
        let mut update = base();
        update.theme = "vs-dark".to_string();
        assert!(requires_editor_recreation(&base(), &update));
    }

    #[test]
    fn read_only_toggle_recreates_the_editor() {
        let mut update = base();
        update.editor_options.read_only = Some(true);
        assert!(requires_editor_recreation(&base(), &update));
    }

    #[test]
    fn diff_mode_toggle_recreates_the_editor() {
        let mut update = base();
        update.use_diff_editor = true;
        update.code_original = Some(CodeResource::new(""));
        assert!(requires_editor_recreation(&base(), &update));
    }

    #[test]
    fn kind_change_recreates_the_editor() {
        let mut update = base();
        update.kind = EditorAppKind::Extended;
        assert!(requires_editor_recreation(&base(), &update));
    }

    #[test]
    fn worker_registry_change_recreates_the_editor() {
        let mut update = base();
        update
            .worker_factories
            .register("typescript", "workers/ts.worker.js");
        assert!(requires_editor_recreation(&base(), &update));
    }

    #[test]
    fn cosmetic_option_change_does_not_recreate() {
        let mut update = base();
        update.editor_options.font_size = Some(16);
        assert!(!requires_editor_recreation(&base(), &update));
        assert_eq!(model_update_kind(&base(), &update), ModelUpdate::None);
    }
}
