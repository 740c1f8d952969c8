//! Optional configuration file support.
//!
//! A configuration file can set default folder-name templates for each
//! strategy and list files that should never be moved. It is only read,
//! never written, and is loaded only when passed with `--config`.
//!
//! # Configuration File Format
//!
//! ```toml
//! [templates]
//! extension = "{ext}"
//! date = "{YYYY}-{MM}-{DD}"
//! size = "{size}"
//!
//! [filters.exclude]
//! filenames = ["Thumbs.db", "desktop.ini"]
//! patterns = ["*.part", "node_modules/**"]
//! extensions = ["tmp", "crdownload"]
//! regex = ["^~\\$"]
//! ```
//!
//! Patterns are matched against the path relative to the organized root.
//! Hidden files are always skipped, whatever the configuration says.

use crate::classifier::{Strategy, extension_of};
use crate::template::FolderNameTemplate;
use glob::Pattern;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during configuration loading and compilation.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Configuration file not found at the specified path.
    #[error("Configuration file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),
    /// Invalid TOML syntax or structure.
    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),
    /// Invalid glob pattern provided.
    #[error("Invalid glob pattern '{pattern}': {reason}")]
    InvalidGlobPattern { pattern: String, reason: String },
    /// Invalid regex pattern provided with the actual error reason.
    #[error("Invalid regex pattern '{pattern}': {reason}")]
    InvalidRegexPattern {
        /// The regex pattern that failed to compile.
        pattern: String,
        /// The reason why the pattern is invalid.
        reason: String,
    },
    /// IO error while reading configuration.
    #[error("IO error reading configuration: {0}")]
    IoError(String),
}

/// Top-level configuration file contents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrganizerConfig {
    #[serde(default)]
    pub templates: TemplateConfig,
    #[serde(default)]
    pub filters: FilterRules,
}

/// Per-strategy folder-name templates. Unset entries fall back to the
/// strategy's built-in default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TemplateConfig {
    pub extension: Option<String>,
    pub date: Option<String>,
    pub size: Option<String>,
}

impl TemplateConfig {
    /// Returns the configured template for `strategy`, if any.
    pub fn get(&self, strategy: Strategy) -> Option<&str> {
        match strategy {
            Strategy::ByExtension => self.extension.as_deref(),
            Strategy::ByDate => self.date.as_deref(),
            Strategy::BySize => self.size.as_deref(),
        }
    }

    /// Resolves the template for `strategy`: `override_template` first, then
    /// this configuration, then the built-in default.
    pub fn resolve(&self, strategy: Strategy, override_template: Option<&str>) -> FolderNameTemplate {
        let raw = override_template
            .or_else(|| self.get(strategy))
            .unwrap_or_else(|| strategy.default_template());
        FolderNameTemplate::new(raw)
    }
}

/// Filter rules section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilterRules {
    /// Rules for excluding files.
    #[serde(default)]
    pub exclude: ExcludeRules,
}

/// Rules for excluding files from organization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExcludeRules {
    /// Exact filenames to exclude (e.g., "Thumbs.db").
    #[serde(default)]
    pub filenames: Vec<String>,

    /// Glob patterns to exclude (e.g., "*.part", "node_modules/**").
    #[serde(default)]
    pub patterns: Vec<String>,

    /// File extensions to exclude (e.g., "tmp", "crdownload").
    #[serde(default)]
    pub extensions: Vec<String>,

    /// Regex patterns matched against the file name.
    #[serde(default)]
    pub regex: Vec<String>,
}

impl OrganizerConfig {
    /// Loads configuration from `config_path`, or returns the defaults when
    /// no path is given.
    ///
    /// # Errors
    ///
    /// Returns an error if a configuration file is given but cannot be read
    /// or parsed.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        match config_path {
            Some(path) => Self::load_from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Self::from_toml(&content)
    }

    /// Parses configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ConfigInvalid(e.to_string()))
    }

    /// Compiles the filter rules into matchers.
    ///
    /// # Errors
    ///
    /// Returns an error if any regex or glob patterns are invalid.
    pub fn compile_filters(&self) -> Result<CompiledFilters, ConfigError> {
        CompiledFilters::new(&self.filters)
    }
}

/// Compiled exclusion rules, ready for matching.
#[derive(Debug, Clone, Default)]
pub struct CompiledFilters {
    exclude_filenames: HashSet<String>,
    exclude_extensions: HashSet<String>,
    exclude_patterns: Vec<Pattern>,
    exclude_regexes: Vec<Regex>,
}

impl CompiledFilters {
    /// Create compiled filters from filter rules.
    ///
    /// # Errors
    ///
    /// Returns an error if any glob or regex patterns are invalid.
    pub fn new(rules: &FilterRules) -> Result<Self, ConfigError> {
        let exclude_patterns = rules
            .exclude
            .patterns
            .iter()
            .map(|pattern| {
                Pattern::new(pattern).map_err(|e| ConfigError::InvalidGlobPattern {
                    pattern: pattern.clone(),
                    reason: e.msg.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let exclude_regexes = rules
            .exclude
            .regex
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| ConfigError::InvalidRegexPattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            exclude_filenames: rules.exclude.filenames.iter().cloned().collect(),
            exclude_extensions: rules
                .exclude
                .extensions
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_lowercase())
                .collect(),
            exclude_patterns,
            exclude_regexes,
        })
    }

    /// Returns true if there are no rules at all.
    pub fn is_empty(&self) -> bool {
        self.exclude_filenames.is_empty()
            && self.exclude_extensions.is_empty()
            && self.exclude_patterns.is_empty()
            && self.exclude_regexes.is_empty()
    }

    /// Checks whether a file is excluded.
    ///
    /// `relative_path` is the file's path relative to the organized root.
    /// Checks run in this order: exact filename, extension, glob pattern,
    /// regex on the file name.
    pub fn is_excluded(&self, relative_path: &Path) -> bool {
        let file_name = relative_path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();

        if self.exclude_filenames.contains(file_name.as_ref()) {
            return true;
        }

        let ext = extension_of(relative_path);
        if !ext.is_empty() && self.exclude_extensions.contains(&ext) {
            return true;
        }

        if self
            .exclude_patterns
            .iter()
            .any(|pattern| pattern.matches_path(relative_path))
        {
            return true;
        }

        self.exclude_regexes
            .iter()
            .any(|regex| regex.is_match(&file_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exclude(rules: ExcludeRules) -> CompiledFilters {
        CompiledFilters::new(&FilterRules { exclude: rules }).unwrap()
    }

    #[test]
    fn test_default_config_has_no_rules() {
        let config = OrganizerConfig::default();
        let compiled = config.compile_filters().unwrap();
        assert!(compiled.is_empty());
        assert!(!compiled.is_excluded(Path::new("file.txt")));
    }

    #[test]
    fn test_load_without_path_uses_defaults() {
        let config = OrganizerConfig::load(None).unwrap();
        assert_eq!(config, OrganizerConfig::default());
    }

    #[test]
    fn test_load_missing_file() {
        let result = OrganizerConfig::load(Some(Path::new("/non/existent/sortdir.toml")));
        assert!(matches!(result, Err(ConfigError::ConfigNotFound(_))));
    }

    #[test]
    fn test_parse_full_config() {
        let config = OrganizerConfig::from_toml(
            r#"
            [templates]
            extension = "ext_{ext}"
            date = "{YYYY}/{MM}"

            [filters.exclude]
            filenames = ["Thumbs.db"]
            extensions = ["tmp"]
            "#,
        )
        .unwrap();

        assert_eq!(config.templates.extension.as_deref(), Some("ext_{ext}"));
        assert_eq!(config.templates.date.as_deref(), Some("{YYYY}/{MM}"));
        assert_eq!(config.templates.size, None);
        assert_eq!(config.filters.exclude.filenames, vec!["Thumbs.db"]);
        assert!(config.filters.exclude.patterns.is_empty());
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let result = OrganizerConfig::from_toml("[templates]\nextention = \"{ext}\"\n");
        assert!(matches!(result, Err(ConfigError::ConfigInvalid(_))));
    }

    #[test]
    fn test_template_resolution_order() {
        let templates = TemplateConfig {
            extension: Some("files_{ext}".to_string()),
            ..Default::default()
        };

        assert_eq!(
            templates.resolve(Strategy::ByExtension, Some("{ext}_x")).as_str(),
            "{ext}_x"
        );
        assert_eq!(
            templates.resolve(Strategy::ByExtension, None).as_str(),
            "files_{ext}"
        );
        assert_eq!(
            templates.resolve(Strategy::BySize, None).as_str(),
            "{size}"
        );
    }

    #[test]
    fn test_exclude_exact_filename() {
        let compiled = exclude(ExcludeRules {
            filenames: vec!["Thumbs.db".to_string()],
            ..Default::default()
        });

        assert!(compiled.is_excluded(Path::new("Thumbs.db")));
        assert!(compiled.is_excluded(Path::new("photos/Thumbs.db")));
        assert!(!compiled.is_excluded(Path::new("image.jpg")));
    }

    #[test]
    fn test_exclude_extensions() {
        let compiled = exclude(ExcludeRules {
            extensions: vec!["bak".to_string(), ".tmp".to_string()],
            ..Default::default()
        });

        assert!(compiled.is_excluded(Path::new("file.bak")));
        assert!(compiled.is_excluded(Path::new("file.tmp")));
        assert!(compiled.is_excluded(Path::new("file.BAK"))); // Case-insensitive
        assert!(!compiled.is_excluded(Path::new("file.txt")));
        assert!(!compiled.is_excluded(Path::new("bak")));
    }

    #[test]
    fn test_exclude_glob_patterns() {
        let compiled = exclude(ExcludeRules {
            patterns: vec!["*.part".to_string(), "node_modules/**".to_string()],
            ..Default::default()
        });

        assert!(compiled.is_excluded(Path::new("movie.part")));
        assert!(compiled.is_excluded(Path::new("node_modules/package.json")));
        assert!(!compiled.is_excluded(Path::new("file.txt")));
    }

    #[test]
    fn test_glob_pattern_directory_boundary_semantics() {
        let compiled = exclude(ExcludeRules {
            patterns: vec!["**/logs/**".to_string()],
            ..Default::default()
        });

        assert!(compiled.is_excluded(Path::new("logs/file.txt")));
        assert!(compiled.is_excluded(Path::new("app/logs/file.txt")));
        assert!(!compiled.is_excluded(Path::new("my_logs/file.txt")));
    }

    #[test]
    fn test_exclude_regex() {
        let compiled = exclude(ExcludeRules {
            regex: vec![r"^~\$".to_string()],
            ..Default::default()
        });

        assert!(compiled.is_excluded(Path::new("~$report.docx")));
        assert!(compiled.is_excluded(Path::new("office/~$budget.xlsx")));
        assert!(!compiled.is_excluded(Path::new("report.docx")));
    }

    #[test]
    fn test_invalid_regex_returns_error() {
        let rules = FilterRules {
            exclude: ExcludeRules {
                regex: vec!["[invalid(".to_string()],
                ..Default::default()
            },
        };

        let result = CompiledFilters::new(&rules);
        assert!(matches!(
            result,
            Err(ConfigError::InvalidRegexPattern { .. })
        ));
    }

    #[test]
    fn test_invalid_glob_pattern_returns_error() {
        let rules = FilterRules {
            exclude: ExcludeRules {
                patterns: vec!["[invalid".to_string()], // Unclosed bracket
                ..Default::default()
            },
        };

        let result = CompiledFilters::new(&rules);
        assert!(matches!(result, Err(ConfigError::InvalidGlobPattern { .. })));
    }
}
