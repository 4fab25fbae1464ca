use std::ops::Range;

use crate::token::{Token, TokenType};

/// StatementSplitter tracks just enough nesting to decide whether a
/// semicolon ends the current statement:
/// - parentheses
/// - `BEGIN ... END` bodies of `CREATE FUNCTION/PROCEDURE/TRIGGER` that are
///   not dollar-quoted (with `CASE`/`IF`/`LOOP` blocks inside them)
#[derive(Debug, Default)]
struct StatementSplitter {
    paren_depth: usize,
    block_depth: usize,
    seen_create: bool,
    is_routine: bool,
    after_end: bool,
    seen_significant: bool,
}

impl StatementSplitter {
    /// Feed one token; returns true if the statement ends after it.
    fn process(&mut self, token: &Token) -> bool {
        let tt = token.token_type;
        if tt.is_trivia() {
            return false;
        }

        let first = !self.seen_significant;
        self.seen_significant = true;
        let after_end = std::mem::take(&mut self.after_end);

        match tt {
            TokenType::ParenOpen => self.paren_depth += 1,
            TokenType::ParenClose => self.paren_depth = self.paren_depth.saturating_sub(1),
            TokenType::Ddl if first && token.text.eq_ignore_ascii_case("create") => {
                self.seen_create = true;
            }
            TokenType::Semicolon => {
                if self.paren_depth == 0 && self.block_depth == 0 {
                    *self = Self::default();
                    return true;
                }
            }
            _ => self.track_blocks(token, after_end),
        }
        false
    }

    fn track_blocks(&mut self, token: &Token, after_end: bool) {
        let text = token.text.as_str();
        if self.seen_create
            && token.token_type.is_keyword()
            && ["function", "procedure", "trigger"]
                .iter()
                .any(|kw| text.eq_ignore_ascii_case(kw))
        {
            self.is_routine = true;
        }
        if !self.is_routine {
            return;
        }
        if text.eq_ignore_ascii_case("begin") {
            self.block_depth += 1;
        } else if text.eq_ignore_ascii_case("end") && self.block_depth > 0 {
            self.block_depth -= 1;
            self.after_end = true;
        } else if self.block_depth > 0
            && !after_end
            && ["case", "if", "loop"]
                .iter()
                .any(|kw| text.eq_ignore_ascii_case(kw))
        {
            self.block_depth += 1;
        }
    }
}

/// Split a token stream into statement ranges.
///
/// Each statement ends with its semicolon; whitespace after a semicolon
/// belongs to the next statement. A trailing remainder without a semicolon
/// is a statement of its own, even if it holds only whitespace.
pub fn split_statements(tokens: &[Token]) -> Vec<Range<usize>> {
    let mut ranges = Vec::new();
    let mut splitter = StatementSplitter::default();
    let mut start = 0;

    for (i, token) in tokens.iter().enumerate() {
        if splitter.process(token) {
            ranges.push(start..i + 1);
            start = i + 1;
        }
    }
    if start < tokens.len() {
        ranges.push(start..tokens.len());
    }
    ranges
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;

    fn split_text(sql: &str) -> Vec<String> {
        let tokens = lex(sql);
        split_statements(&tokens)
            .into_iter()
            .map(|r| tokens[r].iter().map(|t| t.text.as_str()).collect())
            .collect()
    }

    #[test]
    fn test_split_simple() {
        assert_eq!(
            split_text("select 1; select 2;"),
            vec!["select 1;", " select 2;"]
        );
    }

    #[test]
    fn test_trailing_remainder() {
        assert_eq!(split_text("select 1;\n"), vec!["select 1;", "\n"]);
        assert_eq!(split_text("select 1"), vec!["select 1"]);
    }

    #[test]
    fn test_semicolon_inside_string_or_parens() {
        assert_eq!(split_text("select ';' ; x"), vec!["select ';' ;", " x"]);
        assert_eq!(split_text("select (1;2); y"), vec!["select (1;2);", " y"]);
    }

    #[test]
    fn test_routine_body_is_one_statement() {
        let sql = "CREATE FUNCTION f() RETURNS int AS BEGIN IF x THEN y; END IF; RETURN 1; END; select 2;";
        let parts = split_text(sql);
        assert_eq!(parts.len(), 2);
        assert!(parts[0].ends_with("RETURN 1; END;"));
        assert_eq!(parts[1], " select 2;");
    }

    #[test]
    fn test_empty_input() {
        assert!(split_text("").is_empty());
    }
}
