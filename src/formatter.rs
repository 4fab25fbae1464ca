use tracing::trace;

use crate::filters::{self, Filter};
use crate::options::FormatOptions;
use crate::query::Query;
use crate::reindent::Reindenter;

/// QueryFormatter runs the formatting pipeline over a parsed query:
///   1. Apply the filters enabled by the options, in order
///   2. Render each statement, reindented or as-is
///   3. Join the statements
pub struct QueryFormatter<'a> {
    options: &'a FormatOptions,
    filters: Vec<Box<dyn Filter>>,
}

impl<'a> QueryFormatter<'a> {
    pub fn new(options: &'a FormatOptions) -> Self {
        Self {
            options,
            filters: filters::build_pipeline(options),
        }
    }

    /// Run the full pipeline and return the formatted text.
    pub fn format(&self, query: &mut Query) -> String {
        for filter in &self.filters {
            trace!(filter = filter.name(), "applying filter");
            filter.process(query);
        }

        if self.options.reindent {
            self.render_reindented(query)
        } else if self.options.should_strip_whitespace() {
            self.render_stripped(query)
        } else {
            query.render()
        }
    }

    /// Statements separated by a blank line.
    fn render_reindented(&self, query: &Query) -> String {
        let reindenter = Reindenter::new(query, self.options);
        join_statements(
            query.statements.iter().map(|&stmt| reindenter.statement(stmt)),
            "\n\n",
        )
    }

    /// Trimmed statements, one per line.
    fn render_stripped(&self, query: &Query) -> String {
        join_statements(
            query.statements.iter().map(|&stmt| query.render_node(stmt)),
            "\n",
        )
    }
}

/// Drops empty statements. A statement that is only `;` stays on the line of
/// the one before it.
fn join_statements(texts: impl Iterator<Item = String>, separator: &str) -> String {
    let mut statements: Vec<String> = Vec::new();
    for text in texts.filter(|text| !text.is_empty()) {
        match statements.last_mut() {
            Some(prev) if text.bytes().all(|b| b == b';') => prev.push_str(&text),
            _ => statements.push(text),
        }
    }
    statements.join(separator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::Analyzer;
    use crate::options::Case;
    use pretty_assertions::assert_eq;

    fn format_sql(sql: &str, options: &FormatOptions) -> String {
        let mut query = Analyzer::new(options.limits).parse_query(sql);
        QueryFormatter::new(options).format(&mut query)
    }

    #[test]
    fn test_empty_statement_stays_on_previous_line() {
        let reindent = FormatOptions {
            reindent: true,
            keyword_case: Some(Case::Upper),
            ..FormatOptions::default()
        };
        assert_eq!(format_sql("select 1;;select 2", &reindent), "SELECT 1;;\n\nSELECT 2");
        let strip = FormatOptions {
            strip_whitespace: true,
            ..FormatOptions::default()
        };
        assert_eq!(format_sql("select 1; ;\nselect 2", &strip), "select 1;;\nselect 2");
    }

    #[test]
    fn test_no_options_is_identity() {
        let sql = "select a,\n  b -- c\nfrom   t;\n\nselect 2";
        assert_eq!(format_sql(sql, &FormatOptions::default()), sql);
    }

    #[test]
    fn test_strip_whitespace_joins_statements() {
        let options = FormatOptions {
            strip_whitespace: true,
            ..FormatOptions::default()
        };
        assert_eq!(
            format_sql("select  1 ;\n\n  select 2;\n", &options),
            "select 1;\nselect 2;"
        );
    }

    #[test]
    fn test_reindent_separates_statements() {
        let options = FormatOptions {
            reindent: true,
            keyword_case: Some(Case::Upper),
            ..FormatOptions::default()
        };
        assert_eq!(
            format_sql("select 1; select a from t;", &options),
            "SELECT 1;\n\nSELECT a\nFROM t;"
        );
    }

    #[test]
    fn test_combined_filters() {
        let options = FormatOptions {
            keyword_case: Some(Case::Upper),
            identifier_case: Some(Case::Lower),
            strip_comments: true,
            use_space_around_operators: true,
            strip_whitespace: true,
            ..FormatOptions::default()
        };
        assert_eq!(
            format_sql("select A+B /* sum */ from T -- done\nwhere X=1", &options),
            "SELECT a + b FROM t WHERE x = 1"
        );
    }
}
