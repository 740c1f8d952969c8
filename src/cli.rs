//! Command-line interface module for sortdir.
//!
//! This module handles:
//! - Argument parsing
//! - Root and configuration validation
//! - Running the selected strategies in order
//! - Reporting each result

use crate::classifier::Strategy;
use crate::config::OrganizerConfig;
use crate::file_organizer::{FileOrganizer, RunReport, validate_root};
use crate::output::OutputFormatter;
use clap::Parser;
use indicatif::ProgressBar;
use std::path::PathBuf;

/// Sort the files of a directory into subfolders.
#[derive(Debug, Clone, Parser)]
#[command(name = "sortdir", version, about)]
pub struct Args {
    /// The directory path to organize.
    pub path: PathBuf,

    /// Organize files by extension.
    #[arg(short = 'e', long)]
    pub by_extension: bool,

    /// Organize files by modification date.
    #[arg(short = 'd', long)]
    pub by_date: bool,

    /// Organize files by size.
    #[arg(short = 's', long)]
    pub by_size: bool,

    /// Organize files in subdirectories too, flattening them into the root's folders.
    #[arg(short, long)]
    pub recursive: bool,

    /// Show what changes would be made without moving files.
    #[arg(long)]
    pub dry_run: bool,

    /// Template for extension-based folder names [default: {ext}].
    #[arg(long, value_name = "TEMPLATE")]
    pub ext_template: Option<String>,

    /// Template for date-based folder names [default: {YYYY}-{MM}-{DD}].
    #[arg(long, value_name = "TEMPLATE")]
    pub date_template: Option<String>,

    /// Template for size-based folder names [default: {size}].
    #[arg(long, value_name = "TEMPLATE")]
    pub size_template: Option<String>,

    /// TOML file with default templates and exclusion rules.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print the results as JSON instead of colored text.
    #[arg(long)]
    pub json: bool,
}

impl Args {
    /// The selected strategies, always in extension, date, size order.
    pub fn selected_strategies(&self) -> Vec<Strategy> {
        Strategy::ALL
            .into_iter()
            .filter(|strategy| match strategy {
                Strategy::ByExtension => self.by_extension,
                Strategy::ByDate => self.by_date,
                Strategy::BySize => self.by_size,
            })
            .collect()
    }

    /// The template given on the command line for `strategy`, if any.
    pub fn template_override(&self, strategy: Strategy) -> Option<&str> {
        match strategy {
            Strategy::ByExtension => self.ext_template.as_deref(),
            Strategy::ByDate => self.date_template.as_deref(),
            Strategy::BySize => self.size_template.as_deref(),
        }
    }
}

/// What a CLI invocation did.
#[derive(Debug)]
pub enum RunStatus {
    /// No strategy flag was given; nothing was read or moved.
    NothingSelected,
    /// One report per strategy, in the order they ran.
    Completed(Vec<RunReport>),
}

impl RunStatus {
    /// Returns true if any file failed under any strategy.
    pub fn has_failures(&self) -> bool {
        match self {
            RunStatus::NothingSelected => false,
            RunStatus::Completed(reports) => reports.iter().any(RunReport::has_failures),
        }
    }
}

/// Runs the CLI application with parsed arguments.
///
/// Fatal problems (invalid root, unreadable configuration) are returned as
/// errors before any file is touched. Per-file problems are reported in the
/// returned [`RunStatus`].
///
/// # Examples
///
/// ```no_run
/// use clap::Parser;
/// use sortdir::cli::{Args, run_cli};
///
/// let args = Args::parse_from(["sortdir", "/path/to/directory", "--by-extension", "--dry-run"]);
/// match run_cli(&args) {
///     Ok(status) => println!("failures: {}", status.has_failures()),
///     Err(e) => eprintln!("Error: {}", e),
/// }
/// ```
pub fn run_cli(args: &Args) -> Result<RunStatus, String> {
    let strategies = args.selected_strategies();
    if strategies.is_empty() {
        OutputFormatter::warning(
            "No organization mode selected. Please specify an option like \
             --by-extension, --by-date, or --by-size.",
        );
        return Ok(RunStatus::NothingSelected);
    }

    let root = validate_root(&args.path).map_err(|e| e.to_string())?;

    let config = OrganizerConfig::load(args.config.as_deref())
        .map_err(|e| format!("Error loading configuration: {}", e))?;
    let filters = config
        .compile_filters()
        .map_err(|e| format!("Error compiling filters: {}", e))?;
    let organizer = FileOrganizer::new(filters);

    let mut reports = Vec::with_capacity(strategies.len());
    for strategy in strategies {
        let template = config
            .templates
            .resolve(strategy, args.template_override(strategy));

        if !args.json {
            OutputFormatter::info(&format!(
                "\nOrganizing {} by {}...",
                root.display(),
                strategy
            ));
        }

        let snapshot = FileOrganizer::snapshot(&root, args.recursive);
        let pb = if args.json {
            ProgressBar::hidden()
        } else {
            OutputFormatter::create_progress_bar(snapshot.len() as u64)
        };

        let report = organizer.process(&root, snapshot, strategy, &template, args.dry_run, |result| {
            if !args.json {
                let line = OutputFormatter::result_line(result, &root);
                pb.suspend(|| println!("{}", line));
            }
            pb.inc(1);
        });
        pb.finish_and_clear();

        if !args.json {
            OutputFormatter::summary_table(&report);
        }
        reports.push(report);
    }

    if args.json {
        let json = OutputFormatter::json(&reports)
            .map_err(|e| format!("Error serializing report: {}", e))?;
        println!("{}", json);
    } else if args.dry_run {
        println!();
        OutputFormatter::dry_run_notice("Dry run complete. No files were modified.");
    } else if reports.iter().any(RunReport::has_failures) {
        println!();
        OutputFormatter::warning("Some files could not be organized. Please review errors above.");
    } else {
        println!();
        OutputFormatter::success("Organization complete!");
    }

    Ok(RunStatus::Completed(reports))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selected_strategies_fixed_order() {
        let args = Args::parse_from(["sortdir", "/tmp", "--by-size", "-e", "--by-date"]);
        assert_eq!(
            args.selected_strategies(),
            vec![Strategy::ByExtension, Strategy::ByDate, Strategy::BySize]
        );
    }

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["sortdir", "/tmp"]);
        assert!(args.selected_strategies().is_empty());
        assert!(!args.recursive);
        assert!(!args.dry_run);
        assert_eq!(args.template_override(Strategy::ByDate), None);
    }

    #[test]
    fn test_template_override() {
        let args = Args::parse_from(["sortdir", "/tmp", "-d", "--date-template", "{YYYY}"]);
        assert_eq!(args.template_override(Strategy::ByDate), Some("{YYYY}"));
        assert_eq!(args.template_override(Strategy::ByExtension), None);
    }

    #[test]
    fn test_nothing_selected_skips_root_validation() {
        let args = Args::parse_from(["sortdir", "/non/existent/path"]);
        let status = run_cli(&args).unwrap();
        assert!(matches!(status, RunStatus::NothingSelected));
        assert!(!status.has_failures());
    }

    #[test]
    fn test_invalid_root_is_fatal() {
        let args = Args::parse_from(["sortdir", "/non/existent/path", "-e"]);
        let err = run_cli(&args).unwrap_err();
        assert!(err.contains("Invalid root directory"));
    }
}
