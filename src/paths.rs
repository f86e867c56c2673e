//! Cache directory resolution.

use std::fs;
use std::path::{Path, PathBuf};

use crate::provider::DataError;

/// Directory name under the OS user cache root.
const APP_DIR: &str = "marketlab";

/// Per-application cache directory under the OS user cache root, e.g.
/// `~/.cache/marketlab/cache` on Linux.
///
/// When `create` is true the directory is created if absent. Resolution and
/// creation failures propagate.
pub fn default_cache_dir(create: bool) -> Result<PathBuf, DataError> {
    let root = dirs::cache_dir()
        .ok_or_else(|| DataError::CacheError("no user cache directory on this platform".into()))?;
    let dir = cache_dir_under(&root);
    if create && !dir.exists() {
        fs::create_dir_all(&dir).map_err(|e| {
            DataError::CacheError(format!("failed to create cache dir {}: {e}", dir.display()))
        })?;
    }
    Ok(dir)
}

/// Cache layout below an arbitrary root. Split out so tests never touch the
/// real user cache directory.
fn cache_dir_under(root: &Path) -> PathBuf {
    root.join(APP_DIR).join("cache")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_is_app_then_cache() {
        let dir = cache_dir_under(Path::new("/tmp/root"));
        assert_eq!(dir, PathBuf::from("/tmp/root/marketlab/cache"));
    }

    #[test]
    fn no_create_does_not_touch_disk() {
        // Resolution without `create` must not make the directory.
        if let Ok(dir) = default_cache_dir(false) {
            assert!(dir.ends_with("marketlab/cache"));
        }
    }
}
