//! Shared types, error model, and configuration for coursedocs.
//!
//! This crate is the foundation depended on by the other coursedocs crates.
//! It provides:
//! - [`CourseDocsError`] — the unified error type
//! - Domain types ([`DirNode`], [`FileEntry`], [`ArchiveLayout`], [`BuildReport`])
//! - Configuration ([`SiteConfig`], config loading and validation)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    ArchiveConfig, CONFIG_FILE_NAME, LinksConfig, ListingConfig, PageConfig, PathsConfig,
    SiteConfig, init_config, load_config, load_config_from, validate_config,
};
pub use error::{CourseDocsError, Result};
pub use types::{ArchiveLayout, ArchivePart, BuildReport, DirNode, FileClass, FileEntry};
