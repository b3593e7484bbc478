//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use coursedocs_core::listing::format_size;
use coursedocs_core::pipeline::{BuildOptions, ProgressReporter, build_site};
use coursedocs_shared::{BuildReport, SiteConfig, init_config, load_config, load_config_from};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// coursedocs — package course materials and generate their docs pages.
#[derive(Parser)]
#[command(
    name = "coursedocs",
    version,
    about = "Zip course directories and generate markdown index pages with download links.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Course repository root (defaults to the current directory).
    #[arg(long, default_value = ".", global = true)]
    pub root: PathBuf,

    /// Config file (defaults to <root>/coursedocs.toml when present).
    #[arg(long, env = "COURSEDOCS_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Defaults to `build`.
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Archive every course and regenerate the docs tree.
    Build,

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Write a coursedocs.toml with the default settings into the root.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "coursedocs=info",
        1 => "coursedocs=debug",
        _ => "coursedocs=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.as_deref();
    match cli.command.unwrap_or(Command::Build) {
        Command::Build => cmd_build(&cli.root, config_path),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(&cli.root),
            ConfigAction::Show => cmd_config_show(&cli.root, config_path),
        },
    }
}

/// Resolve the config: explicit `--config` file, else `<root>/coursedocs.toml`,
/// else built-in defaults.
fn resolve_config(root: &Path, config_path: Option<&Path>) -> Result<SiteConfig> {
    let config = match config_path {
        Some(path) => load_config_from(path)?,
        None => load_config(root)?,
    };
    Ok(config)
}

fn cmd_build(root: &Path, config_path: Option<&Path>) -> Result<()> {
    if !root.is_dir() {
        return Err(eyre!("root '{}' is not a directory", root.display()));
    }

    let config = resolve_config(root, config_path)?;
    let options = BuildOptions::new(root, config);

    info!(root = %root.display(), "building course docs");

    let reporter = CliProgress::new();
    let report = build_site(&options, &reporter)?;

    print_report(&report);
    Ok(())
}

fn print_report(report: &BuildReport) {
    println!();
    println!("  Course docs built!");
    println!("  Topics:   {}", report.topics);
    println!("  Courses:  {}", report.courses);
    println!(
        "  Archives: {} whole, {} split ({})",
        report.whole_archives,
        report.split_archives,
        format_size(report.archive_bytes)
    );
    println!("  Pages:    {}", report.pages);
    println!("  Index:    {}", report.index_path.display());
    println!();
}

fn cmd_config_init(root: &Path) -> Result<()> {
    let path = init_config(root)?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(root: &Path, config_path: Option<&Path>) -> Result<()> {
    let config = resolve_config(root, config_path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
        spinner.set_style(style);
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn course_started(&self, topic: &str, course: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Packaging [{current}/{total}] {topic}/{course}"));
    }

    fn done(&self, _report: &BuildReport) {
        self.spinner.finish_and_clear();
    }
}

impl Drop for CliProgress {
    fn drop(&mut self) {
        // Clears the spinner when the build bails out early.
        if !self.spinner.is_finished() {
            self.spinner.finish_and_clear();
        }
    }
}
