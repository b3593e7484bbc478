//! Topic and course enumeration.
//!
//! Topics are the directories directly under the course root; courses are the
//! directories directly under a topic. The same denylist applies at both levels.

use std::path::Path;

use tracing::{debug, warn};

use coursedocs_shared::{CourseDocsError, Result, SiteConfig};

/// List topic directory names under `root`, sorted lexically.
pub fn list_topics(root: &Path, config: &SiteConfig) -> Result<Vec<String>> {
    list_dirs(root, config)
}

/// List course directory names under `topic_dir`, sorted lexically.
pub fn list_courses(topic_dir: &Path, config: &SiteConfig) -> Result<Vec<String>> {
    list_dirs(topic_dir, config)
}

fn list_dirs(parent: &Path, config: &SiteConfig) -> Result<Vec<String>> {
    let entries = std::fs::read_dir(parent).map_err(|e| CourseDocsError::io(parent, e))?;

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| CourseDocsError::io(parent, e))?;
        let path = entry.path();
        // Follows symlinks, like a plain `is_dir` check on the joined path.
        if !path.is_dir() {
            continue;
        }

        let Ok(name) = entry.file_name().into_string() else {
            warn!(path = %path.display(), "skipping directory with non UTF-8 name");
            continue;
        };

        if config.is_excluded(&name) {
            debug!(%name, "excluded directory");
            continue;
        }
        names.push(name);
    }

    names.sort();
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn topics_skip_denylist_and_files() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        for dir in ["physics", "math", ".git", "docs", "zips", "images"] {
            fs::create_dir(root.join(dir)).unwrap();
        }
        fs::write(root.join("README.md"), "# Courses").unwrap();

        let topics = list_topics(root, &SiteConfig::default()).unwrap();
        assert_eq!(topics, ["math", "physics"]);
    }

    #[test]
    fn courses_use_same_denylist() {
        let tmp = tempfile::tempdir().unwrap();
        let topic = tmp.path().join("math");
        for dir in ["calc2", "calc1", "images", "site"] {
            fs::create_dir_all(topic.join(dir)).unwrap();
        }
        fs::write(topic.join("notes.txt"), "loose file").unwrap();

        let courses = list_courses(&topic, &SiteConfig::default()).unwrap();
        assert_eq!(courses, ["calc1", "calc2"]);
    }

    #[test]
    fn custom_output_dir_is_excluded() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir(tmp.path().join("public")).unwrap();
        fs::create_dir(tmp.path().join("math")).unwrap();

        let mut config = SiteConfig::default();
        config.paths.docs_dir = "public".into();

        let topics = list_topics(tmp.path(), &config).unwrap();
        assert_eq!(topics, ["math"]);
    }

    #[test]
    fn missing_root_is_io_error() {
        let tmp = tempfile::tempdir().unwrap();
        let err = list_topics(&tmp.path().join("nope"), &SiteConfig::default()).unwrap_err();
        assert!(matches!(err, CourseDocsError::Io { .. }));
    }
}
