//! Course page and docs index writers.

use std::path::{Path, PathBuf};

use tracing::debug;

use coursedocs_shared::{CourseDocsError, Result};

/// Write `docs_dir/<topic>/<course>.md`.
///
/// The page is the readme's raw bytes (when there is one), then `"\n\n"`, then
/// the listing fragment. The topic directory is created if needed.
pub fn generate_page(
    docs_dir: &Path,
    topic: &str,
    course: &str,
    fragment: &str,
    readme: Option<&Path>,
) -> Result<PathBuf> {
    let mut content = match readme {
        Some(path) => std::fs::read(path).map_err(|e| CourseDocsError::io(path, e))?,
        None => Vec::new(),
    };
    content.extend_from_slice(b"\n\n");
    content.extend_from_slice(fragment.as_bytes());

    let topic_dir = docs_dir.join(topic);
    std::fs::create_dir_all(&topic_dir).map_err(|e| CourseDocsError::io(&topic_dir, e))?;

    let page_path = topic_dir.join(format!("{course}.md"));
    std::fs::write(&page_path, &content).map_err(|e| CourseDocsError::io(&page_path, e))?;

    debug!(path = %page_path.display(), bytes = content.len(), has_readme = readme.is_some(), "wrote page");
    Ok(page_path)
}

/// Copy the repository readme byte-for-byte into the docs index, replacing
/// any previous index. Returns the number of bytes copied.
pub fn copy_root_readme(root_readme: &Path, index_path: &Path) -> Result<u64> {
    let bytes = std::fs::read(root_readme).map_err(|e| CourseDocsError::io(root_readme, e))?;
    std::fs::write(index_path, &bytes).map_err(|e| CourseDocsError::io(index_path, e))?;

    debug!(from = %root_readme.display(), to = %index_path.display(), "copied root readme");
    Ok(bytes.len() as u64)
}
