//! End-to-end site build: topics → courses → archive → listing → page,
//! then the docs index.

use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{info, instrument};

use coursedocs_shared::{ArchiveLayout, BuildReport, CourseDocsError, Result, SiteConfig};

use crate::archive::{build_archive, scan_course};
use crate::enumerate::{list_courses, list_topics};
use crate::listing::{format_size, list_files};
use crate::page::{copy_root_readme, generate_page};

/// Where a build reads from and writes to.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Course repository root (topics live directly under it).
    pub root: PathBuf,
    /// Resolved site configuration.
    pub config: SiteConfig,
}

impl BuildOptions {
    pub fn new(root: impl Into<PathBuf>, config: SiteConfig) -> Self {
        Self {
            root: root.into(),
            config,
        }
    }

    pub fn docs_dir(&self) -> PathBuf {
        self.root.join(&self.config.paths.docs_dir)
    }

    pub fn archive_dir(&self) -> PathBuf {
        self.root.join(&self.config.paths.archive_dir)
    }
}

/// Progress callback for reporting build status.
pub trait ProgressReporter {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called before a course is processed. `current` is 1-based within the topic.
    fn course_started(&self, topic: &str, course: &str, current: usize, total: usize);
    /// Called when the build completes.
    fn done(&self, report: &BuildReport);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn course_started(&self, _topic: &str, _course: &str, _current: usize, _total: usize) {}
    fn done(&self, _report: &BuildReport) {}
}

/// Run the full build.
///
/// 1. Ensure the docs and archive roots exist
/// 2. For every topic, ensure its archive directory exists
/// 3. For every course: scan, archive, list files, write page
/// 4. Copy the root readme into the docs index
///
/// Any error stops the build immediately.
#[instrument(skip_all, fields(root = %options.root.display()))]
pub fn build_site(options: &BuildOptions, progress: &dyn ProgressReporter) -> Result<BuildReport> {
    let start = Instant::now();
    let config = &options.config;
    let docs_dir = options.docs_dir();
    let archive_dir = options.archive_dir();

    progress.phase("Preparing output directories");
    ensure_dir(&docs_dir)?;
    ensure_dir(&archive_dir)?;

    let mut report = BuildReport::default();

    let topics = list_topics(&options.root, config)?;
    info!(topics = topics.len(), "starting build");

    for topic in &topics {
        progress.phase(&format!("Topic {topic}"));
        let topic_dir = options.root.join(topic);
        let topic_archive_dir = archive_dir.join(topic);
        ensure_dir(&topic_archive_dir)?;

        let courses = list_courses(&topic_dir, config)?;
        for (i, course) in courses.iter().enumerate() {
            progress.course_started(topic, course, i + 1, courses.len());
            let layout = build_course(
                topic,
                course,
                &topic_dir.join(course),
                &topic_archive_dir,
                &docs_dir,
                config,
            )?;

            report.courses += 1;
            report.pages += 1;
            report.archive_bytes += layout.total_size();
            if layout.is_split() {
                report.split_archives += 1;
            } else {
                report.whole_archives += 1;
            }
        }
        report.topics += 1;
    }

    progress.phase("Copying index");
    let index_path = docs_dir.join(&config.paths.index_file);
    copy_root_readme(&options.root.join(&config.paths.root_readme), &index_path)?;
    report.index_path = index_path;

    info!(
        topics = report.topics,
        courses = report.courses,
        split = report.split_archives,
        archive_bytes = %format_size(report.archive_bytes),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "build complete"
    );
    progress.done(&report);

    Ok(report)
}

/// Archive one course and write its page. Returns the archive layout on disk.
#[instrument(skip_all, fields(topic = %topic, course = %course))]
pub fn build_course(
    topic: &str,
    course: &str,
    course_dir: &Path,
    topic_archive_dir: &Path,
    docs_dir: &Path,
    config: &SiteConfig,
) -> Result<ArchiveLayout> {
    let tree = scan_course(course_dir)?;

    let zip_path = topic_archive_dir.join(format!("{course}.zip"));
    let layout = build_archive(&tree, course_dir, &zip_path, &config.archive)?;

    let listing = list_files(topic, course, course_dir, &tree, topic_archive_dir, config)?;
    let page = generate_page(
        docs_dir,
        topic,
        course,
        &listing.markdown,
        listing.readme.as_deref(),
    )?;

    info!(
        files = tree.file_count(),
        archive = %format_size(layout.total_size()),
        page = %page.display(),
        "course done"
    );
    Ok(layout)
}

fn ensure_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir).map_err(|e| CourseDocsError::io(dir, e))
}
