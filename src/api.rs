use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::analyzer::Analyzer;
use crate::error::SqlfoldError;
use crate::formatter::QueryFormatter;
use crate::keywords;
use crate::lexer;
use crate::mode::Mode;
use crate::options::FormatOptions;
use crate::query::Query;
use crate::report::{FileResult, FileStatus, Report};
use crate::splitter::split_statements;
use crate::token::{Token, TokenType};

/// Format a SQL string.
///
/// Any text is accepted; errors come only from invalid options or, when
/// `options.safety_check` is set, from output that does not re-lex to the
/// same tokens as the input.
pub fn format(sql: &str, options: &FormatOptions) -> Result<String, SqlfoldError> {
    let mut query = parse(sql, options)?;
    let formatted = QueryFormatter::new(options).format(&mut query);

    if options.safety_check {
        safety_check(sql, &formatted, options)?;
    }
    Ok(formatted)
}

/// Parse SQL into a grouped query tree without formatting it.
pub fn parse(sql: &str, options: &FormatOptions) -> Result<Query, SqlfoldError> {
    options.validate()?;
    Ok(Analyzer::new(options.limits).parse_query(sql))
}

/// Split SQL text into its statements, each trimmed. Blank statements are
/// dropped.
pub fn split(sql: &str) -> Vec<String> {
    let tokens = lexer::lex(sql);
    split_statements(&tokens)
        .into_iter()
        .map(|range| {
            let text: String = tokens[range].iter().map(|t| t.text.as_str()).collect();
            text.trim().to_string()
        })
        .filter(|s| !s.is_empty())
        .collect()
}

/// Lex SQL text into tokens.
pub fn tokenize(sql: &str) -> Vec<Token> {
    lexer::lex(sql)
}

/// Run the formatter on a collection of files and directories.
pub fn run(files: &[PathBuf], mode: &Mode) -> Report {
    let matching_paths = get_matching_paths(files, mode);
    let options = mode.format_options();
    let mut report = Report::new(mode.check || mode.diff);

    debug!(files = matching_paths.len(), "formatting files");
    for path in &matching_paths {
        report.add(format_file(path, mode, &options));
    }
    report
}

/// Format a single file.
fn format_file(path: &Path, mode: &Mode, options: &FormatOptions) -> FileResult {
    let source = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => return FileResult::error(path.to_path_buf(), format!("Read error: {e}")),
    };

    let formatted = match format(&source, options) {
        Ok(f) => with_trailing_newline(&source, f),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "could not format file");
            return FileResult::error(path.to_path_buf(), e.to_string());
        }
    };

    if source == formatted {
        debug!(path = %path.display(), "unchanged");
        return FileResult::new(path.to_path_buf(), FileStatus::Unchanged);
    }

    if mode.check || mode.diff {
        if mode.diff {
            print_diff(path, &source, &formatted);
        }
        return FileResult::new(path.to_path_buf(), FileStatus::Changed);
    }

    match std::fs::write(path, &formatted) {
        Ok(()) => FileResult::new(path.to_path_buf(), FileStatus::Changed),
        Err(e) => FileResult::error(path.to_path_buf(), format!("Write error: {e}")),
    }
}

/// Files keep a final newline if they had one.
pub fn with_trailing_newline(source: &str, mut formatted: String) -> String {
    if source.ends_with('\n') && !formatted.is_empty() && !formatted.ends_with('\n') {
        formatted.push('\n');
    }
    formatted
}

/// Get all SQL file paths that match the given inputs.
pub fn get_matching_paths(paths: &[PathBuf], mode: &Mode) -> Vec<PathBuf> {
    let extensions = mode.sql_extensions();
    let exclude: Vec<glob::Pattern> = mode
        .exclude
        .iter()
        .filter_map(|p| match glob::Pattern::new(p) {
            Ok(pattern) => Some(pattern),
            Err(e) => {
                warn!(pattern = %p, error = %e, "ignoring invalid exclude pattern");
                None
            }
        })
        .collect();
    let mut result = HashSet::new();

    for path in paths {
        if path.is_file() {
            if is_sql_file(path, extensions) {
                result.insert(path.clone());
            }
        } else if path.is_dir() {
            collect_sql_files(path, extensions, &exclude, &mut result);
        }
    }

    let mut sorted: Vec<PathBuf> = result.into_iter().collect();
    sorted.sort();
    sorted
}

/// Check if a file has a SQL extension.
fn is_sql_file(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .is_some_and(|ext| extensions.contains(&ext.as_str()))
}

/// Collect SQL files under a directory, skipping hidden and excluded entries.
fn collect_sql_files(
    root: &Path,
    extensions: &[&str],
    exclude: &[glob::Pattern],
    result: &mut HashSet<PathBuf>,
) {
    let mut pending = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        let entries = match std::fs::read_dir(&dir) {
            Ok(e) => e,
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "cannot read directory");
                continue;
            }
        };

        for entry in entries.flatten() {
            let path = entry.path();
            let name = entry.file_name().to_string_lossy().to_string();
            if name.starts_with('.') || exclude.iter().any(|p| p.matches(&name)) {
                continue;
            }
            if path.is_dir() {
                pending.push(path);
            } else if is_sql_file(&path, extensions) {
                result.insert(path);
            }
        }
    }
}

/// Re-lex the formatted output and verify that its tokens match the input.
///
/// Whitespace is ignored, token text is compared case-insensitively with
/// whitespace inside multi-word keywords collapsed. Comments are ignored when
/// they were stripped; the check is skipped when strings were truncated.
pub fn safety_check(
    original: &str,
    formatted: &str,
    options: &FormatOptions,
) -> Result<(), SqlfoldError> {
    if options.truncate_strings.is_some() {
        debug!("string truncation changes tokens; safety check skipped");
        return Ok(());
    }

    let keep = |t: &Token| {
        !(t.token_type == TokenType::Whitespace || options.strip_comments && t.token_type.is_comment())
    };
    let before = lexer::lex(original);
    let after = lexer::lex(formatted);
    let mut before = before.iter().filter(|t| keep(t));
    let mut after = after.iter().filter(|t| keep(t));

    let mut position = 0;
    loop {
        match (before.next(), after.next()) {
            (None, None) => return Ok(()),
            (Some(t1), Some(t2)) => {
                if t1.token_type != t2.token_type {
                    return Err(SqlfoldError::Equivalence(format!(
                        "Token type mismatch at position {position}: original {:?} '{}', formatted {:?} '{}'",
                        t1.token_type, t1.text, t2.token_type, t2.text
                    )));
                }
                if comparable_text(t1) != comparable_text(t2) {
                    return Err(SqlfoldError::Equivalence(format!(
                        "Token text mismatch at position {position}: original '{}', formatted '{}'",
                        t1.text, t2.text
                    )));
                }
            }
            (Some(t), None) | (None, Some(t)) => {
                return Err(SqlfoldError::Equivalence(format!(
                    "Token count mismatch at position {position} near '{}'",
                    t.text
                )));
            }
        }
        position += 1;
    }
}

fn comparable_text(token: &Token) -> String {
    match token.token_type {
        TokenType::String | TokenType::QuotedName | TokenType::CommentSingle | TokenType::CommentMultiline => {
            token.text.to_string()
        }
        _ => keywords::normalize_keyword(&token.text).to_lowercase(),
    }
}

/// Print a unified-style diff between original and formatted content.
pub fn print_diff(path: &Path, original: &str, formatted: &str) {
    use similar::{ChangeTag, TextDiff};

    eprintln!("--- {}", path.display());
    eprintln!("+++ {}", path.display());

    let diff = TextDiff::from_lines(original, formatted);
    for change in diff.iter_all_changes() {
        let sign = match change.tag() {
            ChangeTag::Delete => "-",
            ChangeTag::Insert => "+",
            ChangeTag::Equal => " ",
        };
        eprint!("{}{}", sign, change);
        if change.missing_newline() {
            eprintln!();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Case;

    #[test]
    fn test_format_default_is_identity() {
        let sql = "select a ,b from t";
        assert_eq!(format(sql, &FormatOptions::default()).unwrap(), sql);
    }

    #[test]
    fn test_format_rejects_invalid_options() {
        let options = FormatOptions {
            indent_width: 0,
            ..FormatOptions::default()
        };
        assert!(matches!(
            format("select 1", &options),
            Err(SqlfoldError::Config(_))
        ));
    }

    #[test]
    fn test_format_with_safety_check() {
        let options = FormatOptions {
            reindent: true,
            keyword_case: Some(Case::Upper),
            identifier_case: Some(Case::Lower),
            strip_comments: true,
            use_space_around_operators: true,
            safety_check: true,
            ..FormatOptions::default()
        };
        let sql = "select A, b -- x\nfrom T where a=1 order\n by b; insert into t values (1, 'Q')";
        assert!(format(sql, &options).is_ok());
    }

    #[test]
    fn test_safety_check_detects_changes() {
        let options = FormatOptions::default();
        assert!(safety_check("select a from t", "SELECT  a\nFROM t", &options).is_ok());
        assert!(safety_check("select a from t", "select b from t", &options).is_err());
        assert!(safety_check("select a from t", "select a from", &options).is_err());
        assert!(safety_check("select 'a'", "select 'A'", &options).is_err());
    }

    #[test]
    fn test_split() {
        assert_eq!(
            split("select 1;  select 2 ;\n\n"),
            vec!["select 1;".to_string(), "select 2 ;".to_string()]
        );
        assert!(split("  \n").is_empty());
    }

    #[test]
    fn test_tokenize() {
        let tokens = tokenize("select 1");
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[0].token_type, TokenType::Dml);
        assert_eq!(tokens[2].token_type, TokenType::Integer);
    }

    #[test]
    fn test_with_trailing_newline() {
        assert_eq!(with_trailing_newline("a\n", "b".to_string()), "b\n");
        assert_eq!(with_trailing_newline("a", "b".to_string()), "b");
        assert_eq!(with_trailing_newline("\n", String::new()), "");
    }

    #[test]
    fn test_is_sql_file() {
        let extensions = &["sql", "ddl"];
        assert!(is_sql_file(Path::new("test.sql"), extensions));
        assert!(is_sql_file(Path::new("TEST.SQL"), extensions));
        assert!(!is_sql_file(Path::new("test.py"), extensions));
        assert!(!is_sql_file(Path::new("sql"), extensions));
    }

    #[test]
    fn test_get_matching_paths_excludes() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.sql"), "select 1").unwrap();
        std::fs::write(dir.path().join("b.txt"), "nope").unwrap();
        std::fs::create_dir(dir.path().join("target")).unwrap();
        std::fs::write(dir.path().join("target").join("c.sql"), "select 2").unwrap();

        let mode = Mode {
            exclude: vec!["target".to_string()],
            ..Mode::default()
        };
        let paths = get_matching_paths(&[dir.path().to_path_buf()], &mode);
        assert_eq!(paths, vec![dir.path().join("a.sql")]);
    }
}
