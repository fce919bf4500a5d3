//! Removal of truncated output left behind by a killed rasterizer.

use std::path::Path;

use glob::Pattern;
use tracing::{debug, warn};

/// Delete regular files in `directory` matching `file_pattern`.
///
/// Returns how many files were removed. Failures are logged and skipped;
/// this runs on the timeout path and must never replace the timeout error.
pub fn remove_partial_outputs(directory: &Path, file_pattern: &str) -> usize {
    let dir = Pattern::escape(&directory.to_string_lossy());
    let full = format!("{}/{}", dir.trim_end_matches('/'), file_pattern);

    let entries = match glob::glob(&full) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(pattern = %full, error = %e, "Invalid cleanup pattern");
            return 0;
        }
    };

    let mut removed = 0;
    for entry in entries {
        match entry {
            Ok(path) if path.is_file() => match std::fs::remove_file(&path) {
                Ok(()) => {
                    debug!(path = %path.display(), "Removed partial output");
                    removed += 1;
                }
                Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove partial output"),
            },
            Ok(_) => {}
            Err(e) => warn!(error = %e, "Unreadable path while cleaning partial output"),
        }
    }
    removed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removes_only_matching_files() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["doc-1.png", "doc-2.png", "doc-1.jpg", "other-1.png"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        std::fs::create_dir(dir.path().join("doc-9.png")).unwrap();

        let removed = remove_partial_outputs(dir.path(), "doc-*.png");

        assert_eq!(removed, 2);
        assert!(!dir.path().join("doc-1.png").exists());
        assert!(!dir.path().join("doc-2.png").exists());
        assert!(dir.path().join("doc-1.jpg").exists());
        assert!(dir.path().join("other-1.png").exists());
        assert!(dir.path().join("doc-9.png").is_dir());
    }

    #[test]
    fn directory_with_glob_characters() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("out [draft]");
        std::fs::create_dir(&dir).unwrap();
        std::fs::write(dir.join("doc-1.png"), b"x").unwrap();

        assert_eq!(remove_partial_outputs(&dir, "doc-*.png"), 1);
    }

    #[test]
    fn missing_directory_removes_nothing() {
        assert_eq!(remove_partial_outputs(Path::new("/nonexistent/dir"), "*.png"), 0);
    }
}
