//! Core domain types for course trees and their archives.

use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Course tree
// ---------------------------------------------------------------------------

/// Content class of a file, derived from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileClass {
    /// Markdown or plain text, linked through the "view" prefix.
    Text,
    /// Everything else, linked through the "raw" prefix.
    Binary,
}

/// A regular file inside a course tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// File name (last path component).
    pub name: String,
    /// Path relative to the course root.
    pub rel_path: PathBuf,
    /// Size in bytes.
    pub size: u64,
}

/// A directory inside a course tree. Files and subdirectories are kept sorted
/// by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirNode {
    /// Directory name (the course name for the root node).
    pub name: String,
    /// Path relative to the course root (empty for the root node).
    pub rel_path: PathBuf,
    pub files: Vec<FileEntry>,
    pub dirs: Vec<DirNode>,
}

impl DirNode {
    pub fn new(name: impl Into<String>, rel_path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            rel_path: rel_path.into(),
            files: Vec::new(),
            dirs: Vec::new(),
        }
    }

    /// Depth-first iterator over every file in the tree: a directory's own
    /// files come before those of its subdirectories.
    pub fn iter_files(&self) -> Box<dyn Iterator<Item = &FileEntry> + '_> {
        Box::new(
            self.files
                .iter()
                .chain(self.dirs.iter().flat_map(|d| d.iter_files())),
        )
    }

    /// Total number of files in the tree.
    pub fn file_count(&self) -> usize {
        self.files.len() + self.dirs.iter().map(DirNode::file_count).sum::<usize>()
    }
}

// ---------------------------------------------------------------------------
// Archives
// ---------------------------------------------------------------------------

/// One file of a split archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchivePart {
    pub path: PathBuf,
    pub size: u64,
}

impl ArchivePart {
    /// File name of the part (`calc1.zip.aa`).
    pub fn file_name(&self) -> String {
        file_name_of(&self.path)
    }
}

/// How a course archive exists on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveLayout {
    /// A single `<course>.zip`.
    Whole { path: PathBuf, size: u64 },
    /// `<course>.zip.aa`, `<course>.zip.ab`, … in ascending suffix order.
    Split { parts: Vec<ArchivePart> },
}

impl ArchiveLayout {
    /// Combined size of the archive on disk.
    pub fn total_size(&self) -> u64 {
        match self {
            ArchiveLayout::Whole { size, .. } => *size,
            ArchiveLayout::Split { parts } => parts.iter().map(|p| p.size).sum(),
        }
    }

    pub fn is_split(&self) -> bool {
        matches!(self, ArchiveLayout::Split { .. })
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// BuildReport
// ---------------------------------------------------------------------------

/// Summary of a full site build.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildReport {
    pub topics: usize,
    pub courses: usize,
    /// Courses packaged as a single zip.
    pub whole_archives: usize,
    /// Courses whose zip was split into parts.
    pub split_archives: usize,
    /// Bytes written across all archives.
    pub archive_bytes: u64,
    /// Per-course pages written (the index page is not counted).
    pub pages: usize,
    /// Path of the copied docs index.
    pub index_path: PathBuf,
}
