//! Site configuration for coursedocs.
//!
//! An optional `coursedocs.toml` lives at the root of the course repository.
//! Every field has a built-in default, so a missing file (or a partial one)
//! resolves to the stock layout and link templates.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{CourseDocsError, Result};

/// Default configuration file name, looked up in the course root.
pub const CONFIG_FILE_NAME: &str = "coursedocs.toml";

/// 100 MiB: archives strictly larger than this are split.
const DEFAULT_SPLIT_BYTES: u64 = 100 * 1024 * 1024;

// ---------------------------------------------------------------------------
// Config structs (matching coursedocs.toml schema)
// ---------------------------------------------------------------------------

/// Top-level site config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Output locations, relative to the course root.
    #[serde(default)]
    pub paths: PathsConfig,

    /// External URL prefixes used when rendering links.
    #[serde(default)]
    pub links: LinksConfig,

    /// Archive packaging limits.
    #[serde(default)]
    pub archive: ArchiveConfig,

    /// Enumeration and file classification rules.
    #[serde(default)]
    pub listing: ListingConfig,

    /// Headings written into generated pages.
    #[serde(default)]
    pub page: PageConfig,
}

/// `[paths]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Generated documentation root.
    #[serde(default = "default_docs_dir")]
    pub docs_dir: String,

    /// Archive output root.
    #[serde(default = "default_archive_dir")]
    pub archive_dir: String,

    /// Repository readme copied into the docs index.
    #[serde(default = "default_root_readme")]
    pub root_readme: String,

    /// Index page name inside `docs_dir`.
    #[serde(default = "default_index_file")]
    pub index_file: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            docs_dir: default_docs_dir(),
            archive_dir: default_archive_dir(),
            root_readme: default_root_readme(),
            index_file: default_index_file(),
        }
    }
}

fn default_docs_dir() -> String {
    "docs".into()
}
fn default_archive_dir() -> String {
    "zips".into()
}
fn default_root_readme() -> String {
    "README.md".into()
}
fn default_index_file() -> String {
    "index.md".into()
}

/// `[links]` section. Prefixes are concatenated with repository-relative paths.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinksConfig {
    /// "View" prefix for text and markdown files.
    #[serde(default = "default_text_prefix")]
    pub text_prefix: String,

    /// "Raw" prefix for every other file.
    #[serde(default = "default_binary_prefix")]
    pub binary_prefix: String,

    /// CDN prefix for archives. Reserved: no link is rendered with it.
    #[serde(default = "default_cdn_prefix")]
    pub cdn_prefix: String,

    /// Prefix for whole and split archive download links.
    #[serde(default = "default_archive_raw_prefix")]
    pub archive_raw_prefix: String,

    /// Directory-browser preview prefix.
    #[serde(default = "default_preview_prefix")]
    pub preview_prefix: String,
}

impl Default for LinksConfig {
    fn default() -> Self {
        Self {
            text_prefix: default_text_prefix(),
            binary_prefix: default_binary_prefix(),
            cdn_prefix: default_cdn_prefix(),
            archive_raw_prefix: default_archive_raw_prefix(),
            preview_prefix: default_preview_prefix(),
        }
    }
}

fn default_text_prefix() -> String {
    "https://github.com/beiyuouo/hainanu-course-comments/blob/main/".into()
}
fn default_binary_prefix() -> String {
    "https://github.com/beiyuouo/hainanu-course-comments/raw/main/".into()
}
fn default_cdn_prefix() -> String {
    "https://dl.capoo.xyz/".into()
}
fn default_archive_raw_prefix() -> String {
    "https://github.com/beiyuouo/hainanu-course-comments/blob/zips/".into()
}
fn default_preview_prefix() -> String {
    "https://i.ros.services/".into()
}

/// `[archive]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveConfig {
    /// Archives strictly larger than this many bytes are split.
    #[serde(default = "default_split_bytes")]
    pub split_threshold: u64,

    /// Size of every split part except the last.
    #[serde(default = "default_split_bytes")]
    pub chunk_size: u64,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            split_threshold: DEFAULT_SPLIT_BYTES,
            chunk_size: DEFAULT_SPLIT_BYTES,
        }
    }
}

fn default_split_bytes() -> u64 {
    DEFAULT_SPLIT_BYTES
}

/// `[listing]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingConfig {
    /// Directory names never treated as topics or courses.
    #[serde(default = "default_exclude_dirs")]
    pub exclude_dirs: Vec<String>,

    /// Case-sensitive readme file names.
    #[serde(default = "default_readme_names")]
    pub readme_names: Vec<String>,

    /// Extensions rendered with the text "view" prefix.
    #[serde(default = "default_text_extensions")]
    pub text_extensions: Vec<String>,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            exclude_dirs: default_exclude_dirs(),
            readme_names: default_readme_names(),
            text_extensions: default_text_extensions(),
        }
    }
}

fn default_exclude_dirs() -> Vec<String> {
    [
        ".git",
        "docs",
        ".vscode",
        "overrides",
        ".github",
        "script",
        "images",
        "zips",
        "site",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}
fn default_readme_names() -> Vec<String> {
    vec!["README.md".into(), "readme.md".into(), "index.md".into()]
}
fn default_text_extensions() -> Vec<String> {
    vec!["md".into(), "txt".into()]
}

/// `[page]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageConfig {
    /// Heading that opens the generated file list.
    #[serde(default = "default_file_list_heading")]
    pub file_list_heading: String,

    /// Heading above the preview link.
    #[serde(default = "default_preview_heading")]
    pub preview_heading: String,

    /// Heading above archive links and the file tree.
    #[serde(default = "default_original_links_heading")]
    pub original_links_heading: String,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            file_list_heading: default_file_list_heading(),
            preview_heading: default_preview_heading(),
            original_links_heading: default_original_links_heading(),
        }
    }
}

fn default_file_list_heading() -> String {
    "## 文件列表".into()
}
fn default_preview_heading() -> String {
    "### Alist 预览和下载链接".into()
}
fn default_original_links_heading() -> String {
    "### GitHub 原始链接".into()
}

impl SiteConfig {
    /// Whether `name` must be skipped during topic/course enumeration.
    ///
    /// The configured output directories are always excluded, even when a
    /// custom `exclude_dirs` list leaves them out.
    pub fn is_excluded(&self, name: &str) -> bool {
        name == self.paths.docs_dir
            || name == self.paths.archive_dir
            || self.listing.exclude_dirs.iter().any(|d| d == name)
    }

    /// Whether `name` is one of the recognised readme file names.
    pub fn is_readme(&self, name: &str) -> bool {
        self.listing.readme_names.iter().any(|r| r == name)
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Load the site config for a course root. Returns defaults if the root has no
/// `coursedocs.toml`.
pub fn load_config(root: &Path) -> Result<SiteConfig> {
    let path = root.join(CONFIG_FILE_NAME);

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(SiteConfig::default());
    }

    load_config_from(&path)
}

/// Load and validate the site config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<SiteConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| CourseDocsError::io(path, e))?;

    let config: SiteConfig = toml::from_str(&content).map_err(|e| {
        CourseDocsError::config(format!("failed to parse {}: {e}", path.display()))
    })?;

    validate_config(&config)?;
    tracing::debug!(?path, "loaded config file");
    Ok(config)
}

/// Write a default `coursedocs.toml` into `root`. Returns the path written.
///
/// Refuses to overwrite an existing file.
pub fn init_config(root: &Path) -> Result<PathBuf> {
    let path = root.join(CONFIG_FILE_NAME);
    if path.exists() {
        return Err(CourseDocsError::config(format!(
            "{} already exists",
            path.display()
        )));
    }

    let content = toml::to_string_pretty(&SiteConfig::default())
        .map_err(|e| CourseDocsError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| CourseDocsError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Check link prefixes and archive limits.
pub fn validate_config(config: &SiteConfig) -> Result<()> {
    let links = &config.links;
    let prefixes = [
        ("text_prefix", &links.text_prefix),
        ("binary_prefix", &links.binary_prefix),
        ("cdn_prefix", &links.cdn_prefix),
        ("archive_raw_prefix", &links.archive_raw_prefix),
        ("preview_prefix", &links.preview_prefix),
    ];

    for (key, prefix) in prefixes {
        Url::parse(prefix).map_err(|e| {
            CourseDocsError::config(format!("links.{key} is not a valid URL ({prefix}): {e}"))
        })?;
        if !prefix.ends_with('/') {
            return Err(CourseDocsError::config(format!(
                "links.{key} must end with '/': {prefix}"
            )));
        }
    }

    if config.archive.chunk_size == 0 {
        return Err(CourseDocsError::config("archive.chunk_size must be positive"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = SiteConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("docs_dir"));
        assert!(toml_str.contains("https://i.ros.services/"));
    }

    #[test]
    fn config_roundtrip() {
        let config = SiteConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: SiteConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.archive.split_threshold, 100 * 1024 * 1024);
        assert_eq!(parsed.listing.readme_names, ["README.md", "readme.md", "index.md"]);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[archive]
split_threshold = 1024

[links]
preview_prefix = "https://preview.example.com/"
"#;
        let config: SiteConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.archive.split_threshold, 1024);
        assert_eq!(config.archive.chunk_size, 100 * 1024 * 1024);
        assert_eq!(config.links.preview_prefix, "https://preview.example.com/");
        assert_eq!(config.paths.docs_dir, "docs");
    }

    #[test]
    fn output_dirs_always_excluded() {
        let mut config = SiteConfig::default();
        config.listing.exclude_dirs.clear();
        config.paths.archive_dir = "dist".into();

        assert!(config.is_excluded("docs"));
        assert!(config.is_excluded("dist"));
        assert!(!config.is_excluded("zips"));
        assert!(!config.is_excluded("math"));
    }

    #[test]
    fn readme_names_are_case_sensitive() {
        let config = SiteConfig::default();
        assert!(config.is_readme("README.md"));
        assert!(config.is_readme("index.md"));
        assert!(!config.is_readme("Readme.md"));
    }

    #[test]
    fn validation_rejects_bad_prefix() {
        let mut config = SiteConfig::default();
        assert!(validate_config(&config).is_ok());

        config.links.text_prefix = "https://example.com/blob/main".into();
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("must end with '/'"));

        config.links.text_prefix = "not a url/".into();
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("links.text_prefix"));
    }

    #[test]
    fn validation_rejects_zero_chunk() {
        let mut config = SiteConfig::default();
        config.archive.chunk_size = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn load_missing_file_uses_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.paths.archive_dir, "zips");
    }

    #[test]
    fn init_then_load() {
        let tmp = tempfile::tempdir().unwrap();
        let path = init_config(tmp.path()).unwrap();
        assert!(path.ends_with(CONFIG_FILE_NAME));

        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.page.file_list_heading, "## 文件列表");

        // Second init must not clobber the file.
        assert!(init_config(tmp.path()).is_err());
    }
}
