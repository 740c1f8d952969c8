//! Output formatting and styling module.
//!
//! Every line the CLI prints goes through [`OutputFormatter`]: colored status
//! lines, the per-result lines, the progress bar, the summary table and the
//! JSON report.

use crate::classifier::{SkipReason, Strategy};
use crate::file_organizer::{OrganizeResult, RunReport};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::path::Path;

/// Manages all CLI output with consistent styling and formatting.
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    ///
    /// # Arguments
    ///
    /// * `message` - The message to display
    ///
    /// # Example
    ///
    /// ```no_run
    /// use sortdir::output::OutputFormatter;
    /// OutputFormatter::success("Organization complete!");
    /// ```
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red with an X mark.
    ///
    /// # Arguments
    ///
    /// * `message` - The message to display
    ///
    /// # Example
    ///
    /// ```no_run
    /// use sortdir::output::OutputFormatter;
    /// OutputFormatter::error("Invalid root directory");
    /// ```
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow with a warning symbol.
    ///
    /// # Arguments
    ///
    /// * `message` - The message to display
    ///
    /// # Example
    ///
    /// ```no_run
    /// use sortdir::output::OutputFormatter;
    /// OutputFormatter::warning("Some files could not be organized");
    /// ```
    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    /// Prints an info message in cyan.
    ///
    /// # Arguments
    ///
    /// * `message` - The message to display
    ///
    /// # Example
    ///
    /// ```no_run
    /// use sortdir::output::OutputFormatter;
    /// OutputFormatter::info("Organizing /data by file extension...");
    /// ```
    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    /// Prints a section header in bold, preceded by a blank line.
    ///
    /// # Arguments
    ///
    /// * `header` - The header text
    ///
    /// # Example
    ///
    /// ```no_run
    /// use sortdir::output::OutputFormatter;
    /// OutputFormatter::header("SUMMARY");
    /// ```
    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Prints a dry-run notice message.
    ///
    /// # Arguments
    ///
    /// * `message` - The message to display
    ///
    /// # Example
    ///
    /// ```no_run
    /// use sortdir::output::OutputFormatter;
    /// OutputFormatter::dry_run_notice("Dry run complete. No files were modified.");
    /// ```
    pub fn dry_run_notice(message: &str) {
        println!("{}", format!("[DRY RUN] {}", message).yellow());
    }

    /// Creates a progress bar for `total` entries. It draws to stderr and
    /// stays hidden when stderr is not a terminal.
    ///
    /// # Arguments
    ///
    /// * `total` - Number of entries in the snapshot being processed
    ///
    /// # Example
    ///
    /// ```no_run
    /// use sortdir::output::OutputFormatter;
    /// let pb = OutputFormatter::create_progress_bar(42);
    /// pb.inc(1);
    /// pb.finish_and_clear();
    /// ```
    pub fn create_progress_bar(total: u64) -> ProgressBar {
        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█▓░"),
        );
        pb
    }

    /// Formats the line reported for one result. Paths are shown relative
    /// to `root`.
    ///
    /// # Arguments
    ///
    /// * `result` - The outcome for one entry
    /// * `root` - The organized root
    ///
    /// # Example
    ///
    /// ```
    /// use sortdir::classifier::SkipReason;
    /// use sortdir::file_organizer::OrganizeResult;
    /// use sortdir::output::OutputFormatter;
    /// use std::path::{Path, PathBuf};
    ///
    /// colored::control::set_override(false);
    /// let skipped = OrganizeResult::Skipped {
    ///     path: PathBuf::from("/data/README"),
    ///     reason: SkipReason::NoExtension,
    /// };
    /// let line = OutputFormatter::result_line(&skipped, Path::new("/data"));
    /// assert_eq!(line, "Skipping 'README' (no extension)");
    /// ```
    pub fn result_line(result: &OrganizeResult, root: &Path) -> String {
        match result {
            OrganizeResult::Moved {
                source,
                destination,
            } => format!(
                "{} Moved '{}' to '{}/'",
                "✓".green(),
                relative(source, root),
                folder_of(destination, root)
            ),
            OrganizeResult::WouldMove {
                source,
                destination,
            } => format!(
                "[DRY RUN] Would move '{}' to '{}/'",
                relative(source, root),
                folder_of(destination, root)
            )
            .yellow()
            .to_string(),
            OrganizeResult::Skipped { path, reason } => {
                let line = format!("Skipping '{}' ({})", relative(path, root), reason);
                match reason {
                    SkipReason::Directory | SkipReason::Hidden => line.dimmed().to_string(),
                    _ => line.yellow().to_string(),
                }
            }
            OrganizeResult::Failed { path, error } => format!(
                "{} Error organizing '{}': {}",
                "✗".red(),
                relative(path, root),
                error
            )
            .red()
            .bold()
            .to_string(),
        }
    }

    /// Prints a summary table of moved files per folder for one run, followed
    /// by the skipped and failed counts.
    ///
    /// # Arguments
    ///
    /// * `report` - The report of one strategy's walk
    ///
    /// # Example
    ///
    /// ```no_run
    /// use sortdir::classifier::Strategy;
    /// use sortdir::file_organizer::{FileOrganizer, RunOptions};
    /// use sortdir::output::OutputFormatter;
    /// use sortdir::template::FolderNameTemplate;
    /// use std::path::Path;
    ///
    /// let report = FileOrganizer::default().run(
    ///     Path::new("/path/to/downloads"),
    ///     Strategy::BySize,
    ///     &FolderNameTemplate::new("{size}"),
    ///     RunOptions { recursive: false, dry_run: true },
    /// );
    /// OutputFormatter::summary_table(&report);
    /// ```
    pub fn summary_table(report: &RunReport) {
        Self::header(&format!("SUMMARY ({})", report.strategy));

        let counts = report.folder_counts();
        let max_folder_len = counts
            .keys()
            .map(|name| name.len())
            .max()
            .unwrap_or(0)
            .max(6); // At least "Folder" width

        println!(
            "{:<width$} | {}",
            "Folder".bold(),
            "Files".bold(),
            width = max_folder_len
        );
        println!("{}", "-".repeat(max_folder_len + 10));

        for (folder, count) in &counts {
            println!(
                "{:<width$} | {} {}",
                folder,
                count.to_string().green(),
                plural(*count),
                width = max_folder_len
            );
        }

        let placed = report.moved_count() + report.would_move_count();
        println!("{}", "-".repeat(max_folder_len + 10));
        println!(
            "{:<width$} | {} {}",
            "Total".bold(),
            placed.to_string().green().bold(),
            plural(placed),
            width = max_folder_len
        );
        println!(
            "Skipped: {}  Failed: {}",
            report.skipped_count(),
            if report.has_failures() {
                report.failed_count().to_string().red().to_string()
            } else {
                report.failed_count().to_string()
            }
        );
    }

    /// Renders the reports as a pretty-printed JSON array, one object per
    /// strategy with its counts and per-entry results.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn json(reports: &[RunReport]) -> serde_json::Result<String> {
        let records: Vec<_> = reports.iter().map(ReportRecord::from).collect();
        serde_json::to_string_pretty(&records)
    }
}

#[derive(Serialize)]
struct ReportRecord {
    strategy: Strategy,
    root: String,
    dry_run: bool,
    moved: usize,
    would_move: usize,
    skipped: usize,
    failed: usize,
    results: Vec<ResultRecord>,
}

impl From<&RunReport> for ReportRecord {
    fn from(report: &RunReport) -> Self {
        Self {
            strategy: report.strategy,
            root: report.root.display().to_string(),
            dry_run: report.dry_run,
            moved: report.moved_count(),
            would_move: report.would_move_count(),
            skipped: report.skipped_count(),
            failed: report.failed_count(),
            results: report.results.iter().map(ResultRecord::from).collect(),
        }
    }
}

#[derive(Serialize)]
struct ResultRecord {
    outcome: &'static str,
    path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    destination: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<SkipReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl From<&OrganizeResult> for ResultRecord {
    fn from(result: &OrganizeResult) -> Self {
        let (outcome, reason, error) = match result {
            OrganizeResult::Moved { .. } => ("moved", None, None),
            OrganizeResult::WouldMove { .. } => ("would_move", None, None),
            OrganizeResult::Skipped { reason, .. } => ("skipped", Some(*reason), None),
            OrganizeResult::Failed { error, .. } => ("failed", None, Some(error.to_string())),
        };
        Self {
            outcome,
            path: result.path().display().to_string(),
            destination: result.destination().map(|d| d.display().to_string()),
            reason,
            error,
        }
    }
}

fn relative(path: &Path, root: &Path) -> String {
    path.strip_prefix(root).unwrap_or(path).display().to_string()
}

fn folder_of(destination: &Path, root: &Path) -> String {
    destination
        .parent()
        .map(|parent| relative(parent, root))
        .unwrap_or_default()
}

fn plural(count: usize) -> &'static str {
    if count == 1 { "file" } else { "files" }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file_organizer::OrganizeError;
    use std::path::PathBuf;

    fn report(results: Vec<OrganizeResult>) -> RunReport {
        RunReport {
            root: PathBuf::from("/data"),
            strategy: Strategy::ByExtension,
            dry_run: false,
            results,
        }
    }

    #[test]
    fn test_result_line_uses_relative_paths() {
        colored::control::set_override(false);
        let moved = OrganizeResult::Moved {
            source: PathBuf::from("/data/sub/a.txt"),
            destination: PathBuf::from("/data/txt/a.txt"),
        };
        assert_eq!(
            OutputFormatter::result_line(&moved, Path::new("/data")),
            "✓ Moved 'sub/a.txt' to 'txt/'"
        );

        let skipped = OrganizeResult::Skipped {
            path: PathBuf::from("/data/Makefile"),
            reason: SkipReason::NoExtension,
        };
        assert_eq!(
            OutputFormatter::result_line(&skipped, Path::new("/data")),
            "Skipping 'Makefile' (no extension)"
        );
    }

    #[test]
    fn test_json_report() {
        let report = report(vec![
            OrganizeResult::Moved {
                source: PathBuf::from("/data/a.txt"),
                destination: PathBuf::from("/data/txt/a.txt"),
            },
            OrganizeResult::Skipped {
                path: PathBuf::from("/data/.env"),
                reason: SkipReason::Hidden,
            },
            OrganizeResult::Failed {
                path: PathBuf::from("/data/b.txt"),
                error: OrganizeError::DestinationNotDirectory {
                    path: PathBuf::from("/data/txt"),
                },
            },
        ]);

        let json = OutputFormatter::json(&[report]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let entry = &value[0];

        assert_eq!(entry["strategy"], "by_extension");
        assert_eq!(entry["moved"], 1);
        assert_eq!(entry["skipped"], 1);
        assert_eq!(entry["failed"], 1);
        assert_eq!(entry["results"][0]["outcome"], "moved");
        assert_eq!(entry["results"][0]["destination"], "/data/txt/a.txt");
        assert_eq!(entry["results"][1]["reason"], "hidden");
        assert!(entry["results"][1].get("destination").is_none());
        assert!(
            entry["results"][2]["error"]
                .as_str()
                .unwrap()
                .contains("not a directory")
        );
    }
}
