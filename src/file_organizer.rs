/// File organization engine.
///
/// This module walks a root directory, classifies each entry under one
/// strategy, and moves eligible files into `root/<folder>/`. Every entry
/// produces exactly one [`OrganizeResult`]; per-file errors are reported and
/// never stop the walk.
///
/// The walk is a snapshot: all paths are collected before the first move, so
/// a strategy never revisits folders it creates while running. Each call to
/// [`FileOrganizer::run`] walks again from scratch.
use crate::classifier::{self, Classification, ClassifyError, FileEntry, SkipReason, Strategy};
use crate::config::CompiledFilters;
use crate::template::{FolderNameTemplate, TemplateError};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Errors that can occur while organizing a root directory.
#[derive(Debug, Error)]
pub enum OrganizeError {
    /// The folder-name template could not be rendered for this file.
    #[error("Template error: {0}")]
    Template(#[from] TemplateError),
    /// The file's modification time has no calendar date.
    #[error("Modification time of {} is outside the supported date range", path.display())]
    DateOutOfRange { path: PathBuf },
    /// Failed to read an entry's metadata (it may have vanished).
    #[error("Failed to read metadata of {}: {source}", path.display())]
    Metadata { path: PathBuf, source: io::Error },
    /// Failed to enumerate part of the directory tree.
    #[error("Failed to read {}: {message}", path.display())]
    Walk { path: PathBuf, message: String },
    /// Failed to create a destination directory.
    #[error("Failed to create directory {}: {source}", path.display())]
    DirectoryCreationFailed { path: PathBuf, source: io::Error },
    /// A path that should be a destination directory is something else.
    #[error("Destination {} exists and is not a directory", path.display())]
    DestinationNotDirectory { path: PathBuf },
    /// Failed to move a file to its destination.
    #[error("Failed to move {} to {}: {source}", from.display(), to.display())]
    FileMoveFailure {
        from: PathBuf,
        to: PathBuf,
        source: io::Error,
    },
    /// The root path does not exist, is not a directory, or cannot be read.
    #[error("Invalid root directory {}: {reason}", path.display())]
    InvalidRoot { path: PathBuf, reason: String },
}

impl From<ClassifyError> for OrganizeError {
    fn from(error: ClassifyError) -> Self {
        match error {
            ClassifyError::Template(e) => OrganizeError::Template(e),
            ClassifyError::DateOutOfRange { path } => OrganizeError::DateOutOfRange { path },
        }
    }
}

/// Result of processing one entry.
#[derive(Debug)]
pub enum OrganizeResult {
    /// The file was moved.
    Moved { source: PathBuf, destination: PathBuf },
    /// Dry run: the file would have been moved.
    WouldMove { source: PathBuf, destination: PathBuf },
    /// The entry was left alone.
    Skipped { path: PathBuf, reason: SkipReason },
    /// Processing this entry failed.
    Failed { path: PathBuf, error: OrganizeError },
}

impl OrganizeResult {
    /// The path of the entry this result describes, before any move.
    pub fn path(&self) -> &Path {
        match self {
            Self::Moved { source, .. } | Self::WouldMove { source, .. } => source,
            Self::Skipped { path, .. } | Self::Failed { path, .. } => path,
        }
    }

    /// The destination, for moved and would-move results.
    pub fn destination(&self) -> Option<&Path> {
        match self {
            Self::Moved { destination, .. } | Self::WouldMove { destination, .. } => {
                Some(destination)
            }
            _ => None,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// One entry of a directory snapshot.
#[derive(Debug)]
pub enum WalkItem {
    /// A path found under the root.
    Entry(PathBuf),
    /// Part of the tree could not be read.
    Error { path: PathBuf, message: String },
}

/// Per-run flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Walk all descendants instead of direct children only.
    pub recursive: bool,
    /// Report moves without touching the filesystem.
    pub dry_run: bool,
}

/// Outcome of one strategy's walk over a root.
#[derive(Debug)]
pub struct RunReport {
    pub root: PathBuf,
    pub strategy: Strategy,
    pub dry_run: bool,
    pub results: Vec<OrganizeResult>,
}

impl RunReport {
    pub fn moved_count(&self) -> usize {
        self.count(|r| matches!(r, OrganizeResult::Moved { .. }))
    }

    pub fn would_move_count(&self) -> usize {
        self.count(|r| matches!(r, OrganizeResult::WouldMove { .. }))
    }

    pub fn skipped_count(&self) -> usize {
        self.count(|r| matches!(r, OrganizeResult::Skipped { .. }))
    }

    pub fn failed_count(&self) -> usize {
        self.count(OrganizeResult::is_failure)
    }

    /// Returns true if any entry failed.
    pub fn has_failures(&self) -> bool {
        self.results.iter().any(OrganizeResult::is_failure)
    }

    /// Number of moved (or would-move) files per destination folder, keyed
    /// by the folder path relative to the root.
    pub fn folder_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for destination in self.results.iter().filter_map(OrganizeResult::destination) {
            let folder = destination
                .parent()
                .and_then(|parent| parent.strip_prefix(&self.root).ok())
                .map(|folder| folder.to_string_lossy().into_owned())
                .unwrap_or_default();
            *counts.entry(folder).or_insert(0) += 1;
        }
        counts
    }

    fn count(&self, predicate: impl Fn(&OrganizeResult) -> bool) -> usize {
        self.results.iter().filter(|r| predicate(*r)).count()
    }
}

/// Checks that `path` is an existing, readable and writable directory and
/// returns its canonical absolute form.
///
/// Writability is judged from the permission bits, so nothing is created in
/// the root to find out.
pub fn validate_root(path: &Path) -> Result<PathBuf, OrganizeError> {
    let invalid = |reason: String| OrganizeError::InvalidRoot {
        path: path.to_path_buf(),
        reason,
    };

    let root = path.canonicalize().map_err(|e| invalid(e.to_string()))?;
    let metadata = fs::metadata(&root).map_err(|e| invalid(e.to_string()))?;
    if !metadata.is_dir() {
        return Err(invalid("not a directory".to_string()));
    }
    if metadata.permissions().readonly() {
        return Err(invalid("not writable".to_string()));
    }
    fs::read_dir(&root).map_err(|e| invalid(e.to_string()))?;
    Ok(root)
}

/// Organizes files by moving them into classification folders.
///
/// The organizer only holds its exclusion rules; each run is independent.
#[derive(Debug, Clone, Default)]
pub struct FileOrganizer {
    filters: CompiledFilters,
}

impl FileOrganizer {
    /// Creates an organizer that skips files matched by `filters`.
    pub fn new(filters: CompiledFilters) -> Self {
        Self { filters }
    }

    /// Walks `root` once under `strategy` and moves (or, under dry run,
    /// reports) every eligible file.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use sortdir::classifier::Strategy;
    /// use sortdir::file_organizer::{FileOrganizer, RunOptions};
    /// use sortdir::template::FolderNameTemplate;
    /// use std::path::Path;
    ///
    /// let report = FileOrganizer::default().run(
    ///     Path::new("/path/to/downloads"),
    ///     Strategy::ByExtension,
    ///     &FolderNameTemplate::new("{ext}"),
    ///     RunOptions { recursive: false, dry_run: true },
    /// );
    /// println!("{} files would move", report.would_move_count());
    /// ```
    pub fn run(
        &self,
        root: &Path,
        strategy: Strategy,
        template: &FolderNameTemplate,
        options: RunOptions,
    ) -> RunReport {
        let snapshot = Self::snapshot(root, options.recursive);
        self.process(root, snapshot, strategy, template, options.dry_run, |_| {})
    }

    /// Lists the entries under `root` depth-first, without the root itself.
    ///
    /// Unreadable parts of the tree are returned as [`WalkItem::Error`]
    /// instead of aborting the listing.
    pub fn snapshot(root: &Path, recursive: bool) -> Vec<WalkItem> {
        let max_depth = if recursive { usize::MAX } else { 1 };
        WalkDir::new(root)
            .min_depth(1)
            .max_depth(max_depth)
            .into_iter()
            .map(|entry| match entry {
                Ok(entry) => WalkItem::Entry(entry.into_path()),
                Err(e) => WalkItem::Error {
                    path: e.path().unwrap_or(root).to_path_buf(),
                    message: e
                        .io_error()
                        .map(|io| io.to_string())
                        .unwrap_or_else(|| e.to_string()),
                },
            })
            .collect()
    }

    /// Processes a snapshot taken by [`FileOrganizer::snapshot`], calling
    /// `observer` after each result is produced.
    pub fn process(
        &self,
        root: &Path,
        snapshot: Vec<WalkItem>,
        strategy: Strategy,
        template: &FolderNameTemplate,
        dry_run: bool,
        mut observer: impl FnMut(&OrganizeResult),
    ) -> RunReport {
        info!(
            root = %root.display(),
            %strategy,
            %template,
            dry_run,
            entries = snapshot.len(),
            "organizing"
        );

        let mut results = Vec::with_capacity(snapshot.len());
        for item in snapshot {
            let result = match item {
                WalkItem::Entry(path) => self.process_entry(root, path, strategy, template, dry_run),
                WalkItem::Error { path, message } => OrganizeResult::Failed {
                    path: path.clone(),
                    error: OrganizeError::Walk { path, message },
                },
            };
            match &result {
                OrganizeResult::Failed { path, error } => {
                    warn!(path = %path.display(), %error, "failed to organize entry");
                }
                OrganizeResult::Skipped { path, reason } => {
                    debug!(path = %path.display(), %reason, "skipped");
                }
                OrganizeResult::Moved { source, destination }
                | OrganizeResult::WouldMove { source, destination } => {
                    debug!(
                        source = %source.display(),
                        destination = %destination.display(),
                        dry_run,
                        "placed"
                    );
                }
            }
            observer(&result);
            results.push(result);
        }

        let report = RunReport {
            root: root.to_path_buf(),
            strategy,
            dry_run,
            results,
        };
        info!(
            %strategy,
            moved = report.moved_count(),
            would_move = report.would_move_count(),
            skipped = report.skipped_count(),
            failed = report.failed_count(),
            "finished"
        );
        report
    }

    fn process_entry(
        &self,
        root: &Path,
        path: PathBuf,
        strategy: Strategy,
        template: &FolderNameTemplate,
        dry_run: bool,
    ) -> OrganizeResult {
        let entry = match FileEntry::from_path(&path) {
            Ok(entry) => entry,
            Err(source) => {
                return OrganizeResult::Failed {
                    error: OrganizeError::Metadata {
                        path: path.clone(),
                        source,
                    },
                    path,
                };
            }
        };

        if entry.is_file && !self.filters.is_empty() {
            let relative = path.strip_prefix(root).unwrap_or(&path);
            if self.filters.is_excluded(relative) {
                return OrganizeResult::Skipped {
                    path,
                    reason: SkipReason::Excluded,
                };
            }
        }

        let folder = match classifier::classify(&entry, strategy, template) {
            Ok(Classification::Folder(folder)) => folder,
            Ok(Classification::Skip(reason)) => return OrganizeResult::Skipped { path, reason },
            Err(e) => {
                return OrganizeResult::Failed {
                    path,
                    error: e.into(),
                };
            }
        };

        let folder_path = root.join(&folder);
        let destination = folder_path.join(&entry.file_name);

        if destination == path {
            return OrganizeResult::Skipped {
                path,
                reason: SkipReason::AlreadyInPlace,
            };
        }

        if dry_run {
            return OrganizeResult::WouldMove {
                source: path,
                destination,
            };
        }

        match Self::move_into(&path, &folder_path, &destination) {
            Ok(()) => OrganizeResult::Moved {
                source: path,
                destination,
            },
            Err(error) => OrganizeResult::Failed { path, error },
        }
    }

    /// Creates `folder_path` if needed and renames `file_path` to
    /// `destination`.
    ///
    /// Directory creation is not recursive. An existing file at
    /// `destination` is replaced where the platform's rename allows it.
    pub fn move_into(
        file_path: &Path,
        folder_path: &Path,
        destination: &Path,
    ) -> Result<(), OrganizeError> {
        Self::ensure_folder(folder_path)?;

        fs::rename(file_path, destination).map_err(|e| OrganizeError::FileMoveFailure {
            from: file_path.to_path_buf(),
            to: destination.to_path_buf(),
            source: e,
        })
    }

    fn ensure_folder(folder_path: &Path) -> Result<(), OrganizeError> {
        match fs::create_dir(folder_path) {
            Ok(()) => {
                debug!(folder = %folder_path.display(), "created folder");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                if folder_path.is_dir() {
                    Ok(())
                } else {
                    Err(OrganizeError::DestinationNotDirectory {
                        path: folder_path.to_path_buf(),
                    })
                }
            }
            Err(e) => Err(OrganizeError::DirectoryCreationFailed {
                path: folder_path.to_path_buf(),
                source: e,
            }),
        }
    }
}
