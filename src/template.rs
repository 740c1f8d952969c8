//! Folder-name templates.
//!
//! A template is a plain string with `{name}` placeholders, for example
//! `{YYYY}-{MM}-{DD}` or `sorted_{ext}`. `{{` and `}}` produce literal braces.
//! Each strategy supplies a fixed set of placeholder values; a template that
//! names anything else fails to render.

use std::collections::HashMap;
use std::fmt;
use std::path::{Component, Path, is_separator};
use thiserror::Error;

/// Errors produced while rendering a folder-name template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    /// The template references a placeholder the strategy does not define.
    #[error("unknown placeholder '{{{placeholder}}}' in template '{template}' (expected one of: {expected})")]
    UnknownPlaceholder {
        placeholder: String,
        template: String,
        expected: String,
    },
    /// A `{` without a closing `}`, or a lone `}`.
    #[error("unbalanced brace at byte {position} in template '{template}'")]
    UnbalancedBrace { template: String, position: usize },
    /// The rendered name cannot be used as a single folder under the root.
    #[error("template '{template}' produced an invalid folder name '{name}'")]
    InvalidFolderName { template: String, name: String },
}

/// A folder-name template string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderNameTemplate {
    raw: String,
}

impl FolderNameTemplate {
    pub fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Renders the template with the given placeholder values.
    ///
    /// The result must be a relative path made only of normal components, so
    /// a template can never point outside the organized root.
    ///
    /// # Examples
    ///
    /// ```
    /// use sortdir::template::FolderNameTemplate;
    /// use std::collections::HashMap;
    ///
    /// let template = FolderNameTemplate::new("files_{ext}");
    /// let values = HashMap::from([("ext", "pdf".to_string())]);
    /// assert_eq!(template.render(&values).unwrap(), "files_pdf");
    /// ```
    pub fn render(&self, values: &HashMap<&str, String>) -> Result<String, TemplateError> {
        let mut out = String::with_capacity(self.raw.len());
        let mut chars = self.raw.char_indices().peekable();

        while let Some((position, c)) = chars.next() {
            match c {
                '{' => {
                    if chars.next_if(|&(_, next)| next == '{').is_some() {
                        out.push('{');
                        continue;
                    }
                    let mut name = String::new();
                    let mut closed = false;
                    for (_, inner) in chars.by_ref() {
                        if inner == '}' {
                            closed = true;
                            break;
                        }
                        name.push(inner);
                    }
                    if !closed {
                        return Err(TemplateError::UnbalancedBrace {
                            template: self.raw.clone(),
                            position,
                        });
                    }
                    match values.get(name.as_str()) {
                        Some(value) => out.push_str(value),
                        None => {
                            return Err(TemplateError::UnknownPlaceholder {
                                placeholder: name,
                                template: self.raw.clone(),
                                expected: expected_names(values),
                            });
                        }
                    }
                }
                '}' => {
                    if chars.next_if(|&(_, next)| next == '}').is_none() {
                        return Err(TemplateError::UnbalancedBrace {
                            template: self.raw.clone(),
                            position,
                        });
                    }
                    out.push('}');
                }
                _ => out.push(c),
            }
        }

        self.check_folder_name(out)
    }

    fn check_folder_name(&self, name: String) -> Result<String, TemplateError> {
        // `components()` folds away `a/./b` and `a//b`, so check raw segments too.
        let valid = name
            .split(is_separator)
            .all(|segment| !matches!(segment, "" | "." | ".."))
            && Path::new(&name)
                .components()
                .all(|component| matches!(component, Component::Normal(_)));
        if valid {
            Ok(name)
        } else {
            Err(TemplateError::InvalidFolderName {
                template: self.raw.clone(),
                name,
            })
        }
    }
}

impl fmt::Display for FolderNameTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn expected_names(values: &HashMap<&str, String>) -> String {
    let mut names: Vec<_> = values.keys().map(|name| format!("{{{}}}", name)).collect();
    names.sort();
    names.join(", ")
}
