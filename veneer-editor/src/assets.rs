use fs2::FileExt;
use include_dir::{include_dir, Dir};
use std::path::{Path, PathBuf};

use crate::error::EditorError;

/// Version stamp for the extracted assets; bumping the crate re-extracts.
pub const WEB_ASSETS_VERSION: &str = env!("CARGO_PKG_VERSION");

static WEB_DIR: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/web");

/// Ensure the editor host page and bootstrap script are extracted to the
/// local data directory.
///
/// Returns the extraction directory
/// (e.g. `~/.local/share/veneer/web/<version>/` on Linux). The embedding
/// application is expected to place a Monaco distribution in a `monaco/`
/// directory next to the extracted files.
pub fn ensure_web_assets_extracted() -> Result<PathBuf, EditorError> {
    let data_dir = dirs::data_dir()
        .ok_or_else(|| EditorError::assets("cannot determine data home directory"))?;
    extract_web_assets(&data_dir.join("veneer").join("web"))
}

/// Extract the embedded assets into `<root>/<version>/`.
///
/// An exclusive lock makes the check-and-extract atomic across concurrent
/// instances; the completion marker is written last so an interrupted
/// extraction retries next time.
pub fn extract_web_assets(root: &Path) -> Result<PathBuf, EditorError> {
    let target = root.join(WEB_ASSETS_VERSION);

    let lock_path = root.join(".extract.lock");
    std::fs::create_dir_all(root)
        .map_err(|e| EditorError::assets(format!("failed to create {:?}: {}", root, e)))?;
    let lock_file = std::fs::File::create(&lock_path)
        .map_err(|e| EditorError::assets(format!("failed to create lock file: {}", e)))?;
    lock_file
        .lock_exclusive()
        .map_err(|e| EditorError::assets(format!("failed to acquire extraction lock: {}", e)))?;

    let marker = target.join(".complete");

    if marker.is_file() {
        if let Ok(version) = std::fs::read_to_string(&marker) {
            if version.trim() == WEB_ASSETS_VERSION {
                return Ok(target);
            }
        }
        log::info!("web asset version mismatch, re-extracting");
        let _ = std::fs::remove_dir_all(&target);
    }

    log::info!(
        "extracting editor web assets v{} to {:?}",
        WEB_ASSETS_VERSION,
        target
    );
    std::fs::create_dir_all(&target)
        .map_err(|e| EditorError::assets(format!("failed to create {:?}: {}", target, e)))?;

    extract_dir_recursive(&WEB_DIR, &target)?;

    std::fs::write(&marker, WEB_ASSETS_VERSION)
        .map_err(|e| EditorError::assets(format!("failed to write completion marker: {}", e)))?;

    Ok(target)
}

fn extract_dir_recursive(dir: &Dir<'_>, target: &Path) -> Result<(), EditorError> {
    for file in dir.files() {
        let path = target.join(file.path());
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                EditorError::assets(format!("failed to create directory {:?}: {}", parent, e))
            })?;
        }
        std::fs::write(&path, file.contents())
            .map_err(|e| EditorError::assets(format!("failed to write {:?}: {}", path, e)))?;
    }
    for subdir in dir.dirs() {
        extract_dir_recursive(subdir, target)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extraction_writes_files_and_marker() {
        let root = tempfile::tempdir().unwrap();
        let target = extract_web_assets(root.path()).unwrap();

        assert!(target.join("editor.html").is_file());
        assert!(target.join("editor.js").is_file());
        let marker = std::fs::read_to_string(target.join(".complete")).unwrap();
        assert_eq!(marker, WEB_ASSETS_VERSION);
    }

    #[test]
    fn extraction_is_idempotent() {
        let root = tempfile::tempdir().unwrap();
        let first = extract_web_assets(root.path()).unwrap();
        let second = extract_web_assets(root.path()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn stale_version_is_re_extracted() {
        let root = tempfile::tempdir().unwrap();
        let target = extract_web_assets(root.path()).unwrap();
        std::fs::write(target.join(".complete"), "0.0.0").unwrap();

        let again = extract_web_assets(root.path()).unwrap();
        let marker = std::fs::read_to_string(again.join(".complete")).unwrap();
        assert_eq!(marker, WEB_ASSETS_VERSION);
    }
}
