//! Markdown file listing for a course.
//!
//! Produces the fragment appended to every course page: a heading, the
//! directory-browser preview link, archive download links, and a nested
//! bullet tree linking every file to its hosted copy.

use std::path::{Path, PathBuf};

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use tracing::{info, instrument};

use coursedocs_shared::{
    ArchiveLayout, ArchivePart, CourseDocsError, DirNode, FileClass, FileEntry, Result,
    SiteConfig,
};

use crate::archive::{is_split_part, slash_path};

/// Characters left unescaped in link paths: ASCII alphanumerics, `-._~` and `/`.
const PATH_ESCAPE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~')
    .remove(b'/');

/// A rendered course listing.
#[derive(Debug, Clone)]
pub struct Listing {
    /// The markdown fragment.
    pub markdown: String,
    /// Root-level readme, if the course has one.
    pub readme: Option<PathBuf>,
    /// Archive layout found on disk when the listing was rendered.
    pub archive: ArchiveLayout,
}

// ---------------------------------------------------------------------------
// Small helpers
// ---------------------------------------------------------------------------

/// Human-readable size in binary units: `512B`, `2.00KB`, `5.00MB`, `2.00GB`.
pub fn format_size(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    const GB: f64 = MB * 1024.0;

    let b = bytes as f64;
    if b < KB {
        format!("{bytes}B")
    } else if b < MB {
        format!("{:.2}KB", b / KB)
    } else if b < GB {
        format!("{:.2}MB", b / MB)
    } else {
        format!("{:.2}GB", b / GB)
    }
}

/// Percent-encode a `/`-separated path for use in a URL.
pub fn encode_path(path: &str) -> String {
    utf8_percent_encode(path, PATH_ESCAPE).to_string()
}

/// Classify a file by the text after its last `.`; a name without a dot is
/// its own extension.
pub fn classify(name: &str, text_extensions: &[String]) -> FileClass {
    let ext = name.rsplit('.').next().unwrap_or(name);
    if text_extensions.iter().any(|t| t == ext) {
        FileClass::Text
    } else {
        FileClass::Binary
    }
}

/// First root-level readme in sorted order, as a course-relative path.
pub fn find_readme(tree: &DirNode, config: &SiteConfig) -> Option<PathBuf> {
    tree.files
        .iter()
        .find(|f| config.is_readme(&f.name))
        .map(|f| f.rel_path.clone())
}

/// Find the archive of `course` in `archive_dir`.
///
/// A whole `<course>.zip` wins; otherwise every `<course>.zip.<suffix>` part
/// is returned in lexical order. No archive at all yields an empty split.
pub fn locate_archive(archive_dir: &Path, course: &str) -> Result<ArchiveLayout> {
    let zip_name = format!("{course}.zip");
    let zip_path = archive_dir.join(&zip_name);

    if zip_path.is_file() {
        let size = std::fs::metadata(&zip_path)
            .map_err(|e| CourseDocsError::io(&zip_path, e))?
            .len();
        return Ok(ArchiveLayout::Whole {
            path: zip_path,
            size,
        });
    }

    let entries =
        std::fs::read_dir(archive_dir).map_err(|e| CourseDocsError::io(archive_dir, e))?;
    let mut parts = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| CourseDocsError::io(archive_dir, e))?;
        if !is_split_part(&entry.file_name().to_string_lossy(), &zip_name) {
            continue;
        }
        let path = entry.path();
        let size = entry
            .metadata()
            .map_err(|e| CourseDocsError::io(&path, e))?
            .len();
        parts.push(ArchivePart { path, size });
    }
    parts.sort_by(|a, b| a.path.cmp(&b.path));

    Ok(ArchiveLayout::Split { parts })
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

fn indent(depth: usize) -> String {
    " ".repeat(4 * depth)
}

fn file_link(file: &FileEntry, course_url: &str, config: &SiteConfig) -> String {
    let prefix = match classify(&file.name, &config.listing.text_extensions) {
        FileClass::Text => &config.links.text_prefix,
        FileClass::Binary => &config.links.binary_prefix,
    };
    let path = format!("{course_url}/{}", slash_path(&file.rel_path));
    format!("{prefix}{}", encode_path(&path))
}

/// Render the file tree as markdown bullet lines.
///
/// Each directory is a bullet indented four spaces per level, followed by its
/// files one level deeper and then by its subdirectories. Readme files are
/// left out at every level. `course_url` is the repository path of the course
/// (`math/calc1`).
pub fn render_tree(tree: &DirNode, course_url: &str, config: &SiteConfig) -> Vec<String> {
    let mut lines = Vec::new();
    render_dir(tree, 0, course_url, config, &mut lines);
    lines
}

fn render_dir(
    dir: &DirNode,
    depth: usize,
    course_url: &str,
    config: &SiteConfig,
    lines: &mut Vec<String>,
) {
    lines.push(format!("{}- {}", indent(depth), dir.name));

    let sub = indent(depth + 1);
    lines.extend(
        dir.files
            .iter()
            .filter(|f| !config.is_readme(&f.name))
            .map(|f| format!("{sub}- [{}]({})", f.name, file_link(f, course_url, config))),
    );

    for child in &dir.dirs {
        render_dir(child, depth + 1, course_url, config, lines);
    }
}

/// Render the archive download links (whole zip or one line per part).
pub fn render_archive_links(
    topic: &str,
    course: &str,
    archive: &ArchiveLayout,
    config: &SiteConfig,
) -> String {
    let prefix = &config.links.archive_raw_prefix;
    match archive {
        ArchiveLayout::Whole { size, .. } => format!(
            "- [{course}.zip({})]({prefix}{topic}/{course}.zip)\n\n",
            format_size(*size)
        ),
        ArchiveLayout::Split { parts } => {
            let mut md = String::new();
            for part in parts {
                let name = part.file_name();
                md.push_str(&format!(
                    "- [{name}({})]({prefix}{topic}/{name})\n",
                    format_size(part.size)
                ));
            }
            md.push('\n');
            md
        }
    }
}

/// Assemble the full listing fragment for a course.
pub fn render_listing(
    topic: &str,
    course: &str,
    tree: &DirNode,
    archive: &ArchiveLayout,
    config: &SiteConfig,
) -> String {
    let page = &config.page;
    let course_url = format!("{topic}/{course}");

    let mut md = String::new();
    md.push_str(&format!("{}\n\n", page.file_list_heading));

    md.push_str(&format!("{}\n\n", page.preview_heading));
    md.push_str(&format!(
        "- [{course}]({}{course_url})\n\n",
        config.links.preview_prefix
    ));

    md.push_str(&format!("{}\n\n", page.original_links_heading));
    md.push_str(&render_archive_links(topic, course, archive, config));

    for line in render_tree(tree, &course_url, config) {
        md.push_str(&line);
        md.push('\n');
    }
    md
}

/// Locate the course archive in `archive_dir`, render the listing, and pick
/// out the readme.
#[instrument(skip_all, fields(topic = %topic, course = %course))]
pub fn list_files(
    topic: &str,
    course: &str,
    course_dir: &Path,
    tree: &DirNode,
    archive_dir: &Path,
    config: &SiteConfig,
) -> Result<Listing> {
    let archive = locate_archive(archive_dir, course)?;
    match &archive {
        ArchiveLayout::Whole { path, size } => {
            info!(archive = %path.display(), size = %format_size(*size), "course archive");
        }
        ArchiveLayout::Split { parts } => {
            for part in parts {
                info!(archive = %part.path.display(), size = %format_size(part.size), "course archive part");
            }
        }
    }

    let markdown = render_listing(topic, course, tree, &archive, config);
    let readme = find_readme(tree, config).map(|rel| course_dir.join(rel));

    Ok(Listing {
        markdown,
        readme,
        archive,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEXT: &str = "https://github.com/beiyuouo/hainanu-course-comments/blob/main/";
    const RAW: &str = "https://github.com/beiyuouo/hainanu-course-comments/raw/main/";
    const ZIPS: &str = "https://github.com/beiyuouo/hainanu-course-comments/blob/zips/";

    fn file(rel: &str, size: u64) -> FileEntry {
        let rel_path = PathBuf::from(rel);
        FileEntry {
            name: rel_path.file_name().unwrap().to_string_lossy().into_owned(),
            rel_path,
            size,
        }
    }

    /// ```text
    /// calc1/
    ///   README.md
    ///   notes.md
    ///   slides.pdf
    ///   hw/
    ///     assignment.pdf
    ///     readme.md
    ///     week 2/
    ///       sheet.txt
    /// ```
    fn sample_tree() -> DirNode {
        let mut week2 = DirNode::new("week 2", "hw/week 2");
        week2.files.push(file("hw/week 2/sheet.txt", 5));

        let mut hw = DirNode::new("hw", "hw");
        hw.files.push(file("hw/assignment.pdf", 4));
        hw.files.push(file("hw/readme.md", 3));
        hw.dirs.push(week2);

        let mut root = DirNode::new("calc1", "");
        root.files.push(file("README.md", 8));
        root.files.push(file("notes.md", 17));
        root.files.push(file("slides.pdf", 2048));
        root.dirs.push(hw);
        root
    }

    #[test]
    fn size_formatting() {
        assert_eq!(format_size(0), "0B");
        assert_eq!(format_size(512), "512B");
        assert_eq!(format_size(1023), "1023B");
        assert_eq!(format_size(2048), "2.00KB");
        assert_eq!(format_size(1536), "1.50KB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.00MB");
        assert_eq!(format_size(2 * 1024 * 1024 * 1024), "2.00GB");
        assert_eq!(format_size(3 * 1024 * 1024 * 1024 * 1024), "3072.00GB");
    }

    #[test]
    fn path_encoding_matches_url_quote() {
        assert_eq!(encode_path("math/calc1/notes.md"), "math/calc1/notes.md");
        assert_eq!(encode_path("math/calc1/week 2/a&b.txt"), "math/calc1/week%202/a%26b.txt");
        assert_eq!(encode_path("a-b_c.d~e"), "a-b_c.d~e");
        assert_eq!(encode_path("高数/笔记.md"), "%E9%AB%98%E6%95%B0/%E7%AC%94%E8%AE%B0.md");
    }

    #[test]
    fn classification_by_extension() {
        let exts = SiteConfig::default().listing.text_extensions;
        assert_eq!(classify("notes.md", &exts), FileClass::Text);
        assert_eq!(classify("a.b.txt", &exts), FileClass::Text);
        assert_eq!(classify("slides.pdf", &exts), FileClass::Binary);
        assert_eq!(classify("Makefile", &exts), FileClass::Binary);
        assert_eq!(classify("notes.MD", &exts), FileClass::Binary);
    }

    #[test]
    fn readme_only_from_course_root() {
        let config = SiteConfig::default();
        let tree = sample_tree();
        assert_eq!(find_readme(&tree, &config), Some(PathBuf::from("README.md")));

        let mut no_root_readme = sample_tree();
        no_root_readme.files.retain(|f| f.name != "README.md");
        assert_eq!(find_readme(&no_root_readme, &config), None);
    }

    #[test]
    fn first_sorted_readme_wins() {
        let config = SiteConfig::default();
        let mut root = DirNode::new("calc1", "");
        root.files.push(file("README.md", 1));
        root.files.push(file("index.md", 1));
        root.files.push(file("readme.md", 1));
        assert_eq!(find_readme(&root, &config), Some(PathBuf::from("README.md")));
    }

    #[test]
    fn tree_lines_link_by_class() {
        let config = SiteConfig::default();
        let lines = render_tree(&sample_tree(), "math/calc1", &config);

        let expected = vec![
            "- calc1".to_string(),
            format!("    - [notes.md]({TEXT}math/calc1/notes.md)"),
            format!("    - [slides.pdf]({RAW}math/calc1/slides.pdf)"),
            "    - hw".to_string(),
            format!("        - [assignment.pdf]({RAW}math/calc1/hw/assignment.pdf)"),
            "        - week 2".to_string(),
            format!("            - [sheet.txt]({TEXT}math/calc1/hw/week%202/sheet.txt)"),
        ];
        assert_eq!(lines, expected);
    }

    #[test]
    fn readmes_never_rendered() {
        let config = SiteConfig::default();
        let lines = render_tree(&sample_tree(), "math/calc1", &config);
        assert!(lines.iter().all(|l| !l.contains("README.md")));
        assert!(lines.iter().all(|l| !l.contains("readme.md")));
    }

    #[test]
    fn whole_archive_link() {
        let config = SiteConfig::default();
        let archive = ArchiveLayout::Whole {
            path: "zips/math/calc1.zip".into(),
            size: 2048,
        };
        assert_eq!(
            render_archive_links("math", "calc1", &archive, &config),
            format!("- [calc1.zip(2.00KB)]({ZIPS}math/calc1.zip)\n\n")
        );
    }

    #[test]
    fn split_archive_links() {
        let config = SiteConfig::default();
        let archive = ArchiveLayout::Split {
            parts: vec![
                ArchivePart {
                    path: "zips/math/calc1.zip.aa".into(),
                    size: 100 * 1024 * 1024,
                },
                ArchivePart {
                    path: "zips/math/calc1.zip.ab".into(),
                    size: 512,
                },
            ],
        };
        assert_eq!(
            render_archive_links("math", "calc1", &archive, &config),
            format!(
                "- [calc1.zip.aa(100.00MB)]({ZIPS}math/calc1.zip.aa)\n\
                 - [calc1.zip.ab(512B)]({ZIPS}math/calc1.zip.ab)\n\n"
            )
        );
    }

    #[test]
    fn listing_layout() {
        let config = SiteConfig::default();
        let archive = ArchiveLayout::Whole {
            path: "zips/math/calc1.zip".into(),
            size: 512,
        };
        let md = render_listing("math", "calc1", &sample_tree(), &archive, &config);

        let expected_head = format!(
            "## 文件列表\n\n\
             ### Alist 预览和下载链接\n\n\
             - [calc1](https://i.ros.services/math/calc1)\n\n\
             ### GitHub 原始链接\n\n\
             - [calc1.zip(512B)]({ZIPS}math/calc1.zip)\n\n\
             - calc1\n"
        );
        assert!(md.starts_with(&expected_head), "unexpected listing:\n{md}");
        assert!(md.ends_with("sheet.txt)\n"));
    }

    #[test]
    fn locate_prefers_whole_zip() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("calc1.zip"), [0u8; 10]).unwrap();

        let layout = locate_archive(tmp.path(), "calc1").unwrap();
        assert_eq!(
            layout,
            ArchiveLayout::Whole {
                path: tmp.path().join("calc1.zip"),
                size: 10
            }
        );
    }

    #[test]
    fn locate_sorts_parts_and_ignores_other_courses() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("calc1.zip.ab"), [0u8; 3]).unwrap();
        std::fs::write(tmp.path().join("calc1.zip.aa"), [0u8; 5]).unwrap();
        std::fs::write(tmp.path().join("calc10.zip"), [0u8; 1]).unwrap();
        std::fs::write(tmp.path().join("calc10.zip.aa"), [0u8; 1]).unwrap();

        let ArchiveLayout::Split { parts } = locate_archive(tmp.path(), "calc1").unwrap() else {
            panic!("expected split layout");
        };
        let names: Vec<_> = parts.iter().map(ArchivePart::file_name).collect();
        assert_eq!(names, ["calc1.zip.aa", "calc1.zip.ab"]);
        assert_eq!(parts[0].size, 5);
    }
}
