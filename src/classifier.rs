//! File classification for organizing files into folders.
//!
//! This module maps a file's metadata to the name of the folder it belongs in,
//! under one of three strategies: by extension, by modification date, or by
//! size bucket. Nothing here touches the filesystem except
//! [`FileEntry::from_path`], which reads metadata once.
//!
//! # Examples
//!
//! ```
//! use sortdir::classifier::SizeBucket;
//!
//! assert_eq!(SizeBucket::for_size(0), Some(SizeBucket::Tiny));
//! assert_eq!(SizeBucket::for_size(1024), Some(SizeBucket::Small));
//! assert_eq!(SizeBucket::for_size(1_048_576), Some(SizeBucket::Medium));
//! ```

use crate::template::{FolderNameTemplate, TemplateError};
use chrono::{DateTime, Datelike, Days, Local, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::ffi::OsString;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use thiserror::Error;

/// Folder name used when a size falls outside every bucket.
pub const UNKNOWN_BUCKET: &str = "Unknown";

/// A filesystem item under the organized root.
#[derive(Debug, Clone)]
pub struct FileEntry {
    /// The full path to the item.
    pub path: PathBuf,
    /// The base name exactly as stored on disk. Destinations are built
    /// from this, never from `name`.
    pub file_name: OsString,
    /// The base name for display and the hidden-file check. Bytes that are
    /// not valid UTF-8 are replaced.
    pub name: String,
    /// Whether the item is a directory.
    pub is_dir: bool,
    /// Whether the item is a regular file, or a symlink to one. Devices,
    /// dangling links and links to directories are not.
    pub is_file: bool,
    /// Lower-cased extension without the leading dot, empty if none.
    pub extension: String,
    /// Last modification time. For a symlink, the target's.
    pub modified: SystemTime,
    /// Size in bytes. For a symlink, the target's.
    pub size: u64,
}

impl FileEntry {
    /// Reads the metadata of `path`.
    ///
    /// A symlink whose target is a regular file counts as a file and takes
    /// its modification time and size from the target; moving it still moves
    /// the link. Other symlinks are described by the link itself and are
    /// never followed into directories.
    pub fn from_path(path: &Path) -> io::Result<Self> {
        let mut metadata = fs::symlink_metadata(path)?;
        if metadata.file_type().is_symlink() {
            if let Some(target) = fs::metadata(path).ok().filter(|target| target.is_file()) {
                metadata = target;
            }
        }
        let file_type = metadata.file_type();
        let file_name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        Ok(Self {
            path: path.to_path_buf(),
            name: file_name.to_string_lossy().into_owned(),
            file_name,
            is_dir: file_type.is_dir(),
            is_file: file_type.is_file(),
            extension: extension_of(path),
            modified: metadata.modified()?,
            size: metadata.len(),
        })
    }
}

/// Returns the lower-cased extension of `path`, or an empty string.
pub fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

/// A classification rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Group by lower-cased file extension.
    ByExtension,
    /// Group by local modification date.
    ByDate,
    /// Group by size bucket.
    BySize,
}

impl Strategy {
    /// All strategies, in the order they run within one invocation.
    pub const ALL: [Strategy; 3] = [Strategy::ByExtension, Strategy::ByDate, Strategy::BySize];

    /// Returns the built-in folder-name template for this strategy.
    ///
    /// ```
    /// use sortdir::classifier::Strategy;
    ///
    /// assert_eq!(Strategy::ByExtension.default_template(), "{ext}");
    /// assert_eq!(Strategy::ByDate.default_template(), "{YYYY}-{MM}-{DD}");
    /// assert_eq!(Strategy::BySize.default_template(), "{size}");
    /// ```
    pub fn default_template(&self) -> &'static str {
        match self {
            Strategy::ByExtension => "{ext}",
            Strategy::ByDate => "{YYYY}-{MM}-{DD}",
            Strategy::BySize => "{size}",
        }
    }

    /// Returns a human-readable description of this strategy.
    pub fn description(&self) -> &'static str {
        match self {
            Strategy::ByExtension => "file extension",
            Strategy::ByDate => "modification date",
            Strategy::BySize => "file size",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// A named, half-open byte range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SizeBucket {
    /// Under 1 KiB.
    Tiny,
    /// 1 KiB up to 1 MiB.
    Small,
    /// 1 MiB up to 128 MiB.
    Medium,
    /// 128 MiB up to 1 GiB.
    Large,
    /// 1 GiB and above.
    Huge,
}

impl SizeBucket {
    /// Buckets in ascending order with their `[min, max)` bounds.
    /// `None` as the upper bound means unbounded.
    pub const PARTITION: [(SizeBucket, u64, Option<u64>); 5] = [
        (SizeBucket::Tiny, 0, Some(1_024)),
        (SizeBucket::Small, 1_024, Some(1_048_576)),
        (SizeBucket::Medium, 1_048_576, Some(134_217_728)),
        (SizeBucket::Large, 134_217_728, Some(1_073_741_824)),
        (SizeBucket::Huge, 1_073_741_824, None),
    ];

    /// Returns the first bucket containing `size`.
    pub fn for_size(size: u64) -> Option<Self> {
        Self::PARTITION
            .iter()
            .find(|(_, min, max)| size >= *min && max.is_none_or(|max| size < max))
            .map(|(bucket, _, _)| *bucket)
    }

    pub fn name(&self) -> &'static str {
        match self {
            SizeBucket::Tiny => "Tiny",
            SizeBucket::Small => "Small",
            SizeBucket::Medium => "Medium",
            SizeBucket::Large => "Large",
            SizeBucket::Huge => "Huge",
        }
    }
}

/// Why an entry was left where it is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The entry is a directory; its contents are only visited when recursive.
    Directory,
    /// Sockets, devices, dangling symlinks and symlinks to directories.
    NotRegularFile,
    /// The name starts with `.`.
    Hidden,
    /// Extension strategy only: the name has no suffix after a dot.
    NoExtension,
    /// Matched an exclusion rule from the configuration file.
    Excluded,
    /// The file already sits in its destination folder.
    AlreadyInPlace,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            SkipReason::Directory => "directory",
            SkipReason::NotRegularFile => "not a regular file",
            SkipReason::Hidden => "hidden file",
            SkipReason::NoExtension => "no extension",
            SkipReason::Excluded => "excluded by filter",
            SkipReason::AlreadyInPlace => "already in place",
        };
        f.write_str(reason)
    }
}

/// Errors produced while classifying an eligible file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClassifyError {
    /// The folder-name template could not be rendered.
    #[error(transparent)]
    Template(#[from] TemplateError),
    /// The modification time cannot be expressed as a calendar date.
    #[error("modification time of {} is outside the supported date range", path.display())]
    DateOutOfRange { path: PathBuf },
}

/// Outcome of classifying a single entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// Move into this folder, relative to the root.
    Folder(String),
    /// Leave the entry alone.
    Skip(SkipReason),
}

/// Checks the precondition shared by all strategies: the entry is a regular
/// file whose name does not start with `.`.
pub fn check_eligible(entry: &FileEntry) -> Result<(), SkipReason> {
    if entry.is_dir {
        return Err(SkipReason::Directory);
    }
    if entry.name.starts_with('.') {
        return Err(SkipReason::Hidden);
    }
    if !entry.is_file {
        return Err(SkipReason::NotRegularFile);
    }
    Ok(())
}

/// Applies the eligibility filter, then the strategy's classification.
pub fn classify(
    entry: &FileEntry,
    strategy: Strategy,
    template: &FolderNameTemplate,
) -> Result<Classification, ClassifyError> {
    if let Err(reason) = check_eligible(entry) {
        return Ok(Classification::Skip(reason));
    }
    match strategy {
        Strategy::ByExtension => Ok(classify_by_extension(entry, template)?),
        Strategy::ByDate => classify_by_date(entry, template).map(Classification::Folder),
        Strategy::BySize => Ok(classify_by_size(entry, template).map(Classification::Folder)?),
    }
}

/// Fills `{ext}` with the entry's lower-cased extension.
pub fn classify_by_extension(
    entry: &FileEntry,
    template: &FolderNameTemplate,
) -> Result<Classification, TemplateError> {
    if entry.extension.is_empty() {
        return Ok(Classification::Skip(SkipReason::NoExtension));
    }
    let values = HashMap::from([("ext", entry.extension.to_lowercase())]);
    template.render(&values).map(Classification::Folder)
}

/// Fills `{YYYY}`, `{MM}` and `{DD}` from the local modification date.
pub fn classify_by_date(
    entry: &FileEntry,
    template: &FolderNameTemplate,
) -> Result<String, ClassifyError> {
    let modified = local_date_time(entry.modified).ok_or_else(|| ClassifyError::DateOutOfRange {
        path: entry.path.clone(),
    })?;
    let values = HashMap::from([
        ("YYYY", modified.year().to_string()),
        ("MM", format!("{:02}", modified.month())),
        ("DD", format!("{:02}", modified.day())),
    ]);
    Ok(template.render(&values)?)
}

/// Converts `time` to local time, or `None` when it falls outside the range
/// chrono can represent.
fn local_date_time(time: SystemTime) -> Option<DateTime<Local>> {
    let (secs, nanos) = match time.duration_since(SystemTime::UNIX_EPOCH) {
        Ok(after) => (i64::try_from(after.as_secs()).ok()?, after.subsec_nanos()),
        Err(e) => {
            let before = e.duration();
            let secs = i64::try_from(before.as_secs()).ok()?;
            match before.subsec_nanos() {
                0 => (-secs, 0),
                nanos => (-secs - 1, 1_000_000_000 - nanos),
            }
        }
    };
    let utc = DateTime::<Utc>::from_timestamp(secs, nanos)?;
    // UTC offsets stay under a day; keep that much headroom at the range ends.
    utc.checked_add_days(Days::new(1))?;
    utc.checked_sub_days(Days::new(1))?;
    Some(utc.with_timezone(&Local))
}

/// Fills `{size}` with the name of the entry's size bucket.
pub fn classify_by_size(
    entry: &FileEntry,
    template: &FolderNameTemplate,
) -> Result<String, TemplateError> {
    let bucket = SizeBucket::for_size(entry.size)
        .map(|bucket| bucket.name())
        .unwrap_or(UNKNOWN_BUCKET);
    let values = HashMap::from([("size", bucket.to_string())]);
    template.render(&values)
}
