use serde::Deserialize;

use crate::error::SqlfoldError;

/// Default nesting depth at which parentheses and `CASE` blocks stop being
/// grouped.
pub const DEFAULT_MAX_GROUPING_DEPTH: usize = 100;

/// Default number of children above which a list skips expression grouping.
pub const DEFAULT_MAX_GROUPING_TOKENS: usize = 10_000;

/// Letter case applied to keywords or identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Case {
    Upper,
    Lower,
    Capitalize,
}

impl Case {
    pub fn apply(self, text: &str) -> String {
        match self {
            Case::Upper => text.to_uppercase(),
            Case::Lower => text.to_lowercase(),
            Case::Capitalize => {
                let mut chars = text.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                    None => String::new(),
                }
            }
        }
    }
}

/// Ceilings that keep grouping linear and the call stack flat on
/// adversarial input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupingLimits {
    /// Maximum number of simultaneously open parenthesis/`CASE` groups.
    pub max_depth: usize,
    /// Child lists longer than this skip expression grouping.
    pub max_tokens: usize,
}

impl Default for GroupingLimits {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_GROUPING_DEPTH,
            max_tokens: DEFAULT_MAX_GROUPING_TOKENS,
        }
    }
}

/// FormatOptions holds everything that changes the formatted output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatOptions {
    pub keyword_case: Option<Case>,
    pub identifier_case: Option<Case>,
    pub strip_comments: bool,
    pub strip_whitespace: bool,
    /// Truncate string literals longer than this many characters.
    pub truncate_strings: Option<usize>,
    pub truncate_char: String,
    pub use_space_around_operators: bool,
    pub reindent: bool,
    pub indent_tabs: bool,
    pub indent_width: usize,
    pub indent_after_first: bool,
    pub indent_columns: bool,
    /// Column limit for comma-separated lists; 0 puts every item on its own line.
    pub wrap_after: usize,
    pub comma_first: bool,
    pub limits: GroupingLimits,
    /// Re-lex the output and compare it with the input token stream.
    pub safety_check: bool,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            keyword_case: None,
            identifier_case: None,
            strip_comments: false,
            strip_whitespace: false,
            truncate_strings: None,
            truncate_char: "[...]".to_string(),
            use_space_around_operators: false,
            reindent: false,
            indent_tabs: false,
            indent_width: 2,
            indent_after_first: false,
            indent_columns: false,
            wrap_after: 0,
            comma_first: false,
            limits: GroupingLimits::default(),
            safety_check: false,
        }
    }
}

impl FormatOptions {
    /// Reindenting always works on whitespace-stripped statements.
    pub fn should_strip_whitespace(&self) -> bool {
        self.strip_whitespace || self.reindent
    }

    pub fn validate(&self) -> Result<(), SqlfoldError> {
        if self.indent_width == 0 {
            return Err(SqlfoldError::Config(
                "indent_width requires a positive integer".to_string(),
            ));
        }
        if self.truncate_strings == Some(0) {
            return Err(SqlfoldError::Config(
                "truncate_strings requires a positive integer".to_string(),
            ));
        }
        if self.truncate_strings.is_some() && self.truncate_char.is_empty() {
            return Err(SqlfoldError::Config(
                "truncate_char must not be empty".to_string(),
            ));
        }
        if self.limits.max_depth == 0 {
            return Err(SqlfoldError::Config(
                "max_grouping_depth requires a positive integer".to_string(),
            ));
        }
        if self.limits.max_tokens == 0 {
            return Err(SqlfoldError::Config(
                "max_grouping_tokens requires a positive integer".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let opts = FormatOptions::default();
        assert!(!opts.reindent);
        assert_eq!(opts.indent_width, 2);
        assert_eq!(opts.limits.max_depth, 100);
        assert_eq!(opts.limits.max_tokens, 10_000);
        assert!(opts.validate().is_ok());
    }

    #[test]
    fn test_reindent_implies_strip_whitespace() {
        let opts = FormatOptions {
            reindent: true,
            ..FormatOptions::default()
        };
        assert!(opts.should_strip_whitespace());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let bad = [
            FormatOptions {
                indent_width: 0,
                ..FormatOptions::default()
            },
            FormatOptions {
                truncate_strings: Some(0),
                ..FormatOptions::default()
            },
            FormatOptions {
                truncate_strings: Some(5),
                truncate_char: String::new(),
                ..FormatOptions::default()
            },
            FormatOptions {
                limits: GroupingLimits {
                    max_depth: 0,
                    max_tokens: 10,
                },
                ..FormatOptions::default()
            },
        ];
        for opts in bad {
            assert!(opts.validate().is_err(), "{opts:?} should be rejected");
        }
    }

    #[test]
    fn test_case_apply() {
        assert_eq!(Case::Upper.apply("select"), "SELECT");
        assert_eq!(Case::Lower.apply("SeLeCt"), "select");
        assert_eq!(Case::Capitalize.apply("oRDER BY"), "Order by");
        assert_eq!(Case::Capitalize.apply(""), "");
    }
}
