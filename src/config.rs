use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::error::SqlfoldError;
use crate::mode::Mode;
use crate::options::{Case, FormatOptions};

const PYPROJECT: &str = "pyproject.toml";
const CONFIG_FILE: &str = "sqlfold.toml";

/// Settings read from `[tool.sqlfold]` in pyproject.toml, or from the top
/// level of sqlfold.toml. Every key is optional; unknown keys are rejected.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub keyword_case: Option<Case>,
    pub identifier_case: Option<Case>,
    pub strip_comments: Option<bool>,
    pub strip_whitespace: Option<bool>,
    pub truncate_strings: Option<usize>,
    pub truncate_char: Option<String>,
    pub use_space_around_operators: Option<bool>,
    pub reindent: Option<bool>,
    pub indent_tabs: Option<bool>,
    pub indent_width: Option<usize>,
    pub indent_after_first: Option<bool>,
    pub indent_columns: Option<bool>,
    pub wrap_after: Option<usize>,
    pub comma_first: Option<bool>,
    pub max_grouping_depth: Option<usize>,
    pub max_grouping_tokens: Option<usize>,
    pub exclude: Option<Vec<String>>,
}

impl FileConfig {
    /// Overlay the values present in this file onto `mode`.
    pub fn apply(self, mode: &mut Mode) {
        let f: &mut FormatOptions = &mut mode.format;
        if let Some(case) = self.keyword_case {
            f.keyword_case = Some(case);
        }
        if let Some(case) = self.identifier_case {
            f.identifier_case = Some(case);
        }
        if let Some(width) = self.truncate_strings {
            f.truncate_strings = Some(width);
        }
        set(&mut f.strip_comments, self.strip_comments);
        set(&mut f.strip_whitespace, self.strip_whitespace);
        set(&mut f.truncate_char, self.truncate_char);
        set(&mut f.use_space_around_operators, self.use_space_around_operators);
        set(&mut f.reindent, self.reindent);
        set(&mut f.indent_tabs, self.indent_tabs);
        set(&mut f.indent_width, self.indent_width);
        set(&mut f.indent_after_first, self.indent_after_first);
        set(&mut f.indent_columns, self.indent_columns);
        set(&mut f.wrap_after, self.wrap_after);
        set(&mut f.comma_first, self.comma_first);
        set(&mut f.limits.max_depth, self.max_grouping_depth);
        set(&mut f.limits.max_tokens, self.max_grouping_tokens);
        set(&mut mode.exclude, self.exclude);
    }
}

fn set<T>(target: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *target = value;
    }
}

/// Load sqlfold configuration for a run over `files`.
///
/// An explicit `config_path` must exist. Otherwise the parent directories of
/// the inputs are searched for pyproject.toml or sqlfold.toml, falling back
/// to `<config dir>/sqlfold/sqlfold.toml`.
pub fn load_config(files: &[PathBuf], config_path: Option<&Path>) -> Result<Mode, SqlfoldError> {
    let mut mode = Mode::default();

    let config_file = match config_path {
        Some(path) => {
            if path.exists() {
                Some(path.to_path_buf())
            } else {
                return Err(SqlfoldError::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
        }
        None => find_config_file(files).or_else(user_config_file),
    };

    if let Some(path) = config_file {
        debug!(path = %path.display(), "loading config");
        load_config_from_path(&path)?.apply(&mut mode);
        mode.format.validate()?;
    }

    Ok(mode)
}

/// Search for a config file in the common parent directories of the given files.
fn find_config_file(files: &[PathBuf]) -> Option<PathBuf> {
    for parent in get_common_parents(files) {
        for name in [PYPROJECT, CONFIG_FILE] {
            let config = parent.join(name);
            if config.is_file() {
                return Some(config);
            }
        }
    }
    None
}

fn user_config_file() -> Option<PathBuf> {
    let path = dirs::config_dir()?.join("sqlfold").join(CONFIG_FILE);
    path.is_file().then_some(path)
}

/// Get the common parent directories of the given file paths, ordered
/// from most specific to least specific.
fn get_common_parents(files: &[PathBuf]) -> Vec<PathBuf> {
    let mut parents = Vec::new();

    for file in files {
        let start = if file.as_os_str() == "-" {
            PathBuf::from(".")
        } else if file.is_dir() {
            file.clone()
        } else {
            file.parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("."))
        };
        let start = start.canonicalize().unwrap_or(start);

        let mut current = Some(start.as_path());
        while let Some(dir) = current {
            let dir_buf = dir.to_path_buf();
            if !parents.contains(&dir_buf) {
                parents.push(dir_buf);
            }
            current = dir.parent();
        }
    }

    parents
}

/// Read the sqlfold section of a TOML file.
pub fn load_config_from_path(path: &Path) -> Result<FileConfig, SqlfoldError> {
    let content = std::fs::read_to_string(path)?;
    let is_pyproject = path.file_name().is_some_and(|n| n == PYPROJECT);
    parse_config(&content, is_pyproject)
}

fn parse_config(content: &str, is_pyproject: bool) -> Result<FileConfig, SqlfoldError> {
    let parsed: toml::Value = content.parse()?;
    let section = if is_pyproject {
        parsed.get("tool").and_then(|t| t.get("sqlfold")).cloned()
    } else {
        Some(parsed)
    };
    match section {
        Some(value) => Ok(value.try_into()?),
        None => Ok(FileConfig::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sqlfold_toml() {
        let config = parse_config(
            "reindent = true\nkeyword_case = \"upper\"\nindent_width = 4\nexclude = [\"build\"]\n",
            false,
        )
        .unwrap();
        let mut mode = Mode::default();
        config.apply(&mut mode);
        assert!(mode.format.reindent);
        assert_eq!(mode.format.keyword_case, Some(Case::Upper));
        assert_eq!(mode.format.indent_width, 4);
        assert_eq!(mode.exclude, vec!["build".to_string()]);
    }

    #[test]
    fn test_parse_pyproject_section() {
        let content = "[project]\nname = \"x\"\n\n[tool.sqlfold]\nmax_grouping_tokens = 500\n";
        let config = parse_config(content, true).unwrap();
        assert_eq!(config.max_grouping_tokens, Some(500));

        let config = parse_config("[project]\nname = \"x\"\n", true).unwrap();
        assert_eq!(config, FileConfig::default());
    }

    #[test]
    fn test_unknown_config_key_error() {
        assert!(parse_config("line_length = 88\n", false).is_err());
        assert!(parse_config("keyword_case = \"shouting\"\n", false).is_err());
    }

    #[test]
    fn test_missing_explicit_config() {
        let result = load_config(&[], Some(Path::new("/nonexistent/sqlfold.toml")));
        assert!(matches!(result, Err(SqlfoldError::Config(_))));
    }

    #[test]
    fn test_config_found_in_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "comma_first = true\n").unwrap();
        let nested = dir.path().join("models");
        std::fs::create_dir(&nested).unwrap();
        let file = nested.join("a.sql");
        std::fs::write(&file, "select 1\n").unwrap();

        let mode = load_config(&[file], None).unwrap();
        assert!(mode.format.comma_first);
    }

    #[test]
    fn test_invalid_value_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "indent_width = 0\n").unwrap();
        assert!(load_config(&[], Some(&path)).is_err());
    }
}
