use compact_str::CompactString;

use crate::filters::Filter;
use crate::query::Query;
use crate::token::TokenType;

/// Shortens single-quoted string literals whose body is longer than `width`
/// characters, marking the cut with `suffix` inside the quotes.
pub struct TruncateStringFilter {
    width: usize,
    suffix: String,
}

impl TruncateStringFilter {
    pub fn new(width: usize, suffix: &str) -> Self {
        Self {
            width,
            suffix: suffix.to_string(),
        }
    }

    fn truncate(&self, literal: &str) -> Option<String> {
        let body = literal.strip_prefix('\'')?.strip_suffix('\'')?;
        if body.chars().count() <= self.width {
            return None;
        }
        let kept: String = body.chars().take(self.width).collect();
        Some(format!("'{kept}{}'", self.suffix))
    }
}

impl Filter for TruncateStringFilter {
    fn name(&self) -> &'static str {
        "truncate_strings"
    }

    fn process(&self, query: &mut Query) {
        for leaf in query.all_leaves() {
            let node = &mut query.arena[leaf];
            if !node.is_leaf(TokenType::String) {
                continue;
            }
            if let Some(short) = self.truncate(&node.value) {
                node.value = CompactString::from(short);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::Analyzer;
    use crate::options::GroupingLimits;

    fn run(width: usize, sql: &str) -> String {
        let mut q = Analyzer::new(GroupingLimits::default()).parse_query(sql);
        TruncateStringFilter::new(width, "[...]").process(&mut q);
        q.render()
    }

    #[test]
    fn test_truncates_long_strings() {
        assert_eq!(
            run(5, "insert into t values ('abcdefgh', 'abc')"),
            "insert into t values ('abcde[...]', 'abc')"
        );
    }

    #[test]
    fn test_leaves_prefixed_and_unterminated_strings() {
        assert_eq!(run(2, "select E'abcdef'"), "select E'abcdef'");
        assert_eq!(run(2, "select 'abcdef"), "select 'abcdef");
    }

    #[test]
    fn test_counts_characters_not_bytes() {
        assert_eq!(run(3, "select 'éééé'"), "select 'ééé[...]'");
    }
}
