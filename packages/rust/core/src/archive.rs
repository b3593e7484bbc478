//! Course archive packaging.
//!
//! A course directory is scanned into a [`DirNode`] tree and zipped with
//! deflate. When the zip is larger than the configured threshold it is split
//! into fixed-size parts named `<course>.zip.aa`, `<course>.zip.ab`, …
//!
//! Splitting happens in-process. The parts are verified against the original
//! size before the unsplit zip is deleted; on any mismatch the original stays.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument, warn};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use coursedocs_shared::{
    ArchiveConfig, ArchiveLayout, ArchivePart, CourseDocsError, DirNode, FileEntry, Result,
};

/// Two lowercase letters: `aa` through `zz`.
pub const MAX_SPLIT_PARTS: u64 = 26 * 26;

/// Entries at or above this size need zip64 headers.
const ZIP64_THRESHOLD: u64 = u32::MAX as u64;

// ---------------------------------------------------------------------------
// Scanning
// ---------------------------------------------------------------------------

/// Walk `course_dir` into a tree sorted by file name.
///
/// Symlinked directories are not descended into and are left out of the tree.
#[instrument(skip_all, fields(course = %course_dir.display()))]
pub fn scan_course(course_dir: &Path) -> Result<DirNode> {
    let root_name = course_dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    // stack[d] is the open directory at depth d.
    let mut stack = vec![DirNode::new(root_name, PathBuf::new())];

    for entry in WalkDir::new(course_dir).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| walk_error(course_dir, e))?;
        close_dirs(&mut stack, entry.depth());

        let path = entry.path();
        let name = entry.file_name().to_string_lossy().into_owned();
        let rel_path = path
            .strip_prefix(course_dir)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| PathBuf::from(entry.file_name()));

        if entry.file_type().is_dir() {
            stack.push(DirNode::new(name, rel_path));
            continue;
        }

        if entry.path_is_symlink() && path.is_dir() {
            warn!(path = %path.display(), "skipping symlinked directory");
            continue;
        }

        let size = std::fs::metadata(path)
            .map_err(|e| CourseDocsError::io(path, e))?
            .len();
        if let Some(current) = stack.last_mut() {
            current.files.push(FileEntry {
                name,
                rel_path,
                size,
            });
        }
    }

    close_dirs(&mut stack, 1);
    let tree = stack
        .pop()
        .ok_or_else(|| CourseDocsError::validation("course tree has no root"))?;

    debug!(files = tree.file_count(), "course scanned");
    Ok(tree)
}

/// Pop finished directories until `depth` levels remain open.
fn close_dirs(stack: &mut Vec<DirNode>, depth: usize) {
    while stack.len() > depth {
        let Some(done) = stack.pop() else { break };
        if let Some(parent) = stack.last_mut() {
            parent.dirs.push(done);
        } else {
            // The root itself; keep it.
            stack.push(done);
            break;
        }
    }
}

fn walk_error(course_dir: &Path, err: walkdir::Error) -> CourseDocsError {
    let path = err.path().unwrap_or(course_dir).to_path_buf();
    CourseDocsError::io(path, err.into())
}

// ---------------------------------------------------------------------------
// Zip writing
// ---------------------------------------------------------------------------

/// A course-relative path with components joined by `/`, as used for zip
/// entry names and URLs.
pub fn slash_path(rel_path: &Path) -> String {
    rel_path
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Write every file of `tree` (read from `course_dir`) into a deflate zip at
/// `zip_path`. Returns the archive size in bytes.
#[instrument(skip_all, fields(zip = %zip_path.display(), files = tree.file_count()))]
pub fn make_zip(tree: &DirNode, course_dir: &Path, zip_path: &Path) -> Result<u64> {
    let file = File::create(zip_path).map_err(|e| CourseDocsError::io(zip_path, e))?;
    let mut writer = ZipWriter::new(BufWriter::new(file));

    for entry in tree.iter_files() {
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .large_file(entry.size >= ZIP64_THRESHOLD);

        let name = slash_path(&entry.rel_path);
        writer
            .start_file(name.as_str(), options)
            .map_err(|e| CourseDocsError::archive(zip_path, format!("{name}: {e}")))?;

        let source = course_dir.join(&entry.rel_path);
        let mut input = File::open(&source).map_err(|e| CourseDocsError::io(&source, e))?;
        io::copy(&mut input, &mut writer).map_err(|e| CourseDocsError::io(&source, e))?;
        debug!(entry = %name, size = entry.size, "added to archive");
    }

    let mut inner = writer
        .finish()
        .map_err(|e| CourseDocsError::archive(zip_path, e.to_string()))?;
    inner.flush().map_err(|e| CourseDocsError::io(zip_path, e))?;
    drop(inner);

    let size = std::fs::metadata(zip_path)
        .map_err(|e| CourseDocsError::io(zip_path, e))?
        .len();
    Ok(size)
}

// ---------------------------------------------------------------------------
// Splitting
// ---------------------------------------------------------------------------

/// Suffix for the `index`-th split part: `aa`, `ab`, …, `az`, `ba`, …, `zz`.
pub fn split_suffix(index: u64) -> Option<String> {
    if index >= MAX_SPLIT_PARTS {
        return None;
    }
    let first = (b'a' + (index / 26) as u8) as char;
    let second = (b'a' + (index % 26) as u8) as char;
    Some(format!("{first}{second}"))
}

/// Whether `name` is a split part of the archive named `zip_name`
/// (`calc1.zip.aa` for `calc1.zip`).
pub fn is_split_part(name: &str, zip_name: &str) -> bool {
    name.strip_prefix(zip_name)
        .and_then(|rest| rest.strip_prefix('.'))
        .is_some_and(|suffix| !suffix.is_empty() && suffix.bytes().all(|b| b.is_ascii_lowercase()))
}

fn part_path(zip_path: &Path, suffix: &str) -> Result<PathBuf> {
    let mut name = zip_path
        .file_name()
        .ok_or_else(|| CourseDocsError::split(zip_path, "archive path has no file name"))?
        .to_os_string();
    name.push(".");
    name.push(suffix);
    Ok(zip_path.with_file_name(name))
}

/// Split `zip_path` into `chunk_size` parts next to it, then delete it.
///
/// Parts are stat'ed on disk and their sizes compared with the original
/// before deletion. If the archive would need more than [`MAX_SPLIT_PARTS`]
/// parts, nothing is written.
#[instrument(skip_all, fields(zip = %zip_path.display(), chunk_size))]
pub fn split_archive(zip_path: &Path, chunk_size: u64) -> Result<Vec<ArchivePart>> {
    if chunk_size == 0 {
        return Err(CourseDocsError::split(zip_path, "chunk size must be positive"));
    }

    let total = std::fs::metadata(zip_path)
        .map_err(|e| CourseDocsError::io(zip_path, e))?
        .len();
    let part_count = total.div_ceil(chunk_size);
    if part_count > MAX_SPLIT_PARTS {
        return Err(CourseDocsError::split(
            zip_path,
            format!("{part_count} parts needed, at most {MAX_SPLIT_PARTS} supported"),
        ));
    }

    let input = File::open(zip_path).map_err(|e| CourseDocsError::io(zip_path, e))?;
    let mut reader = BufReader::new(input);
    let mut written = Vec::with_capacity(part_count as usize);

    for index in 0..part_count {
        let suffix = split_suffix(index)
            .ok_or_else(|| CourseDocsError::split(zip_path, "ran out of part suffixes"))?;
        let path = part_path(zip_path, &suffix)?;

        let file = File::create(&path).map_err(|e| CourseDocsError::io(&path, e))?;
        let mut out = BufWriter::new(file);
        io::copy(&mut (&mut reader).take(chunk_size), &mut out)
            .map_err(|e| CourseDocsError::io(&path, e))?;
        out.flush().map_err(|e| CourseDocsError::io(&path, e))?;

        written.push(path);
    }

    let parts = verify_parts(zip_path, &written, total, chunk_size)?;

    std::fs::remove_file(zip_path).map_err(|e| CourseDocsError::io(zip_path, e))?;
    debug!(parts = parts.len(), total, "archive split, original removed");
    Ok(parts)
}

/// Stat every part: all but the last must be exactly `chunk_size`, and the
/// sizes must add up to `total`.
fn verify_parts(
    zip_path: &Path,
    paths: &[PathBuf],
    total: u64,
    chunk_size: u64,
) -> Result<Vec<ArchivePart>> {
    let mut parts = Vec::with_capacity(paths.len());
    for (i, path) in paths.iter().enumerate() {
        let size = std::fs::metadata(path)
            .map_err(|e| CourseDocsError::io(path, e))?
            .len();
        let is_last = i + 1 == paths.len();
        if size == 0 || (!is_last && size != chunk_size) || size > chunk_size {
            return Err(CourseDocsError::split(
                zip_path,
                format!("part {} has unexpected size {size}", path.display()),
            ));
        }
        parts.push(ArchivePart {
            path: path.clone(),
            size,
        });
    }

    let sum: u64 = parts.iter().map(|p| p.size).sum();
    if sum != total {
        return Err(CourseDocsError::split(
            zip_path,
            format!("parts add up to {sum} bytes, archive has {total}"),
        ));
    }
    Ok(parts)
}

/// Delete split parts of `zip_path` left over from an earlier build.
/// Returns how many were removed.
pub fn remove_stale_parts(zip_path: &Path) -> Result<usize> {
    let (Some(dir), Some(zip_name)) = (zip_path.parent(), zip_path.file_name()) else {
        return Ok(0);
    };
    let zip_name = zip_name.to_string_lossy();

    let entries = std::fs::read_dir(dir).map_err(|e| CourseDocsError::io(dir, e))?;
    let mut removed = 0;
    for entry in entries {
        let entry = entry.map_err(|e| CourseDocsError::io(dir, e))?;
        let name = entry.file_name();
        if is_split_part(&name.to_string_lossy(), &zip_name) {
            let path = entry.path();
            std::fs::remove_file(&path).map_err(|e| CourseDocsError::io(&path, e))?;
            removed += 1;
        }
    }
    Ok(removed)
}

// ---------------------------------------------------------------------------
// Whole step
// ---------------------------------------------------------------------------

/// Package a scanned course: clear stale parts, zip, and split if the zip is
/// larger than `limits.split_threshold`.
#[instrument(skip_all, fields(zip = %zip_path.display()))]
pub fn build_archive(
    tree: &DirNode,
    course_dir: &Path,
    zip_path: &Path,
    limits: &ArchiveConfig,
) -> Result<ArchiveLayout> {
    let stale = remove_stale_parts(zip_path)?;
    if stale > 0 {
        debug!(stale, "removed parts from a previous build");
    }

    let size = make_zip(tree, course_dir, zip_path)?;

    if size > limits.split_threshold {
        let parts = split_archive(zip_path, limits.chunk_size)?;
        info!(size, parts = parts.len(), "archive split");
        Ok(ArchiveLayout::Split { parts })
    } else {
        Ok(ArchiveLayout::Whole {
            path: zip_path.to_path_buf(),
            size,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
