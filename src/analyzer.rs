use smallvec::SmallVec;
use tracing::debug;

use crate::grouping;
use crate::lexer;
use crate::node::{GroupKind, NodeIndex};
use crate::options::GroupingLimits;
use crate::query::Query;
use crate::splitter::split_statements;
use crate::token::{Token, TokenType};

/// An open bracket-like group while building a statement.
#[derive(Debug)]
struct Frame {
    kind: GroupKind,
    children: Vec<NodeIndex>,
}

impl Frame {
    fn new(kind: GroupKind) -> Self {
        Self {
            kind,
            children: Vec::new(),
        }
    }
}

/// The Analyzer turns SQL source into a grouped Query:
///   1. Lex the source into tokens
///   2. Split tokens into statements
///   3. Build bracket structure (parentheses and `CASE ... END`) with an
///      explicit stack capped at `limits.max_depth`
///   4. Run the grouping passes over every child list
pub struct Analyzer {
    pub limits: GroupingLimits,
}

impl Analyzer {
    pub fn new(limits: GroupingLimits) -> Self {
        Self { limits }
    }

    /// Main entry point: parse source string into a Query.
    pub fn parse_query(&self, source: &str) -> Query {
        let tokens = lexer::lex(source);
        let mut query = Query::new();
        for range in split_statements(&tokens) {
            let stmt = self.build_statement(&mut query, &tokens[range]);
            query.statements.push(stmt);
        }
        grouping::group_query(&mut query, self.limits);
        debug!(
            tokens = tokens.len(),
            statements = query.statements.len(),
            nodes = query.arena.len(),
            "parsed query"
        );
        query
    }

    /// Build the bracket structure of one statement.
    ///
    /// Openers beyond the depth ceiling stay plain leaves; `overflow` remembers
    /// them so that their closers become leaves too instead of closing a real
    /// group early.
    fn build_statement(&self, query: &mut Query, tokens: &[Token]) -> NodeIndex {
        let mut builder = StatementBuilder::default();
        let mut overflow: Vec<GroupKind> = Vec::new();
        let mut ceiling_logged = false;

        for token in tokens {
            let leaf = query.push_leaf(token.token_type, token.text.clone());

            if let Some(kind) = opener_kind(token) {
                if builder.depth() >= self.limits.max_depth || !overflow.is_empty() {
                    if !ceiling_logged {
                        debug!(
                            max_depth = self.limits.max_depth,
                            "grouping depth ceiling reached; deeper brackets stay flat"
                        );
                        ceiling_logged = true;
                    }
                    overflow.push(kind);
                    builder.push(leaf);
                } else {
                    builder.open(kind, leaf);
                }
                continue;
            }

            match closer_kind(token) {
                Some(kind) if !overflow.is_empty() => {
                    if kind == GroupKind::Parenthesis {
                        // Unwind to the nearest overflowed parenthesis.
                        while let Some(open) = overflow.pop() {
                            if open == GroupKind::Parenthesis {
                                break;
                            }
                        }
                    } else if overflow.last() == Some(&GroupKind::Case) {
                        overflow.pop();
                    }
                    builder.push(leaf);
                }
                Some(GroupKind::Parenthesis) => {
                    match builder.innermost(GroupKind::Parenthesis) {
                        Some(pos) => {
                            // Close any unterminated CASE inside the parenthesis.
                            while builder.depth() > pos + 1 {
                                builder.close(query, None);
                            }
                            builder.close(query, Some(leaf));
                        }
                        None => builder.push(leaf),
                    }
                }
                Some(GroupKind::Case) if builder.top_kind() == Some(GroupKind::Case) => {
                    builder.close(query, Some(leaf));
                }
                _ => builder.push(leaf),
            }
        }

        while builder.depth() > 0 {
            builder.close(query, None);
        }
        query.push_group(GroupKind::Statement, builder.root)
    }
}

/// Children of the statement root plus the stack of open groups.
#[derive(Debug, Default)]
struct StatementBuilder {
    root: Vec<NodeIndex>,
    stack: SmallVec<[Frame; 16]>,
}

impl StatementBuilder {
    fn depth(&self) -> usize {
        self.stack.len()
    }

    fn top_kind(&self) -> Option<GroupKind> {
        self.stack.last().map(|f| f.kind)
    }

    fn innermost(&self, kind: GroupKind) -> Option<usize> {
        self.stack.iter().rposition(|f| f.kind == kind)
    }

    fn push(&mut self, idx: NodeIndex) {
        match self.stack.last_mut() {
            Some(frame) => frame.children.push(idx),
            None => self.root.push(idx),
        }
    }

    fn open(&mut self, kind: GroupKind, opener: NodeIndex) {
        let mut frame = Frame::new(kind);
        frame.children.push(opener);
        self.stack.push(frame);
    }

    /// Pop the innermost frame, append its closer if any, and attach the
    /// finished group to the enclosing frame.
    fn close(&mut self, query: &mut Query, closer: Option<NodeIndex>) {
        let Some(mut frame) = self.stack.pop() else {
            return;
        };
        if let Some(closer) = closer {
            frame.children.push(closer);
        }
        let group = query.push_group(frame.kind, frame.children);
        self.push(group);
    }
}

fn opener_kind(token: &Token) -> Option<GroupKind> {
    match token.token_type {
        TokenType::ParenOpen => Some(GroupKind::Parenthesis),
        TokenType::Keyword if token.text.eq_ignore_ascii_case("case") => Some(GroupKind::Case),
        _ => None,
    }
}

fn closer_kind(token: &Token) -> Option<GroupKind> {
    match token.token_type {
        TokenType::ParenClose => Some(GroupKind::Parenthesis),
        TokenType::Keyword if token.text.eq_ignore_ascii_case("end") => Some(GroupKind::Case),
        _ => None,
    }
}
