//! sortdir - sort the files of a directory into subfolders
//!
//! This library classifies files by extension, modification date, or size
//! bucket, and moves them into `root/<folder>/` with dry-run and recursive
//! modes. Folder names come from per-strategy templates such as `{ext}` or
//! `{YYYY}-{MM}-{DD}`.

pub mod classifier;
pub mod cli;
pub mod config;
pub mod file_organizer;
pub mod logging;
pub mod output;
pub mod template;

pub use classifier::{Classification, ClassifyError, FileEntry, SizeBucket, SkipReason, Strategy};
pub use config::{CompiledFilters, ConfigError, OrganizerConfig};
pub use file_organizer::{
    FileOrganizer, OrganizeError, OrganizeResult, RunOptions, RunReport, validate_root,
};
pub use template::{FolderNameTemplate, TemplateError};

pub use cli::{Args, RunStatus, run_cli};
