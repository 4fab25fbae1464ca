use compact_str::CompactString;

use crate::filters::{last_leaf, Filter};
use crate::node::{GroupKind, NodeIndex};
use crate::query::Query;
use crate::token::TokenType;

/// Collapses whitespace to single spaces and trims every statement.
///
/// No space is kept after `(` or before `)`, `,` and `;`. Whitespace that
/// follows a `--` comment becomes a newline so the comment cannot swallow
/// the code after it.
pub struct StripWhitespaceFilter;

impl Filter for StripWhitespaceFilter {
    fn name(&self) -> &'static str {
        "strip_whitespace"
    }

    fn process(&self, query: &mut Query) {
        for group in query.groups() {
            let children = std::mem::take(&mut query.arena[group].children);
            let mut kept = collapse_list(query, children);
            if query.node(group).is_group(GroupKind::Statement) {
                trim_statement(query, &mut kept);
            }
            query.set_children(group, kept);
        }
    }
}

fn after_line_comment(query: &Query, prev: Option<NodeIndex>) -> bool {
    prev.is_some_and(|p| query.node(last_leaf(query, p)).is_leaf(TokenType::CommentSingle))
}

fn collapse_list(query: &mut Query, children: Vec<NodeIndex>) -> Vec<NodeIndex> {
    let mut out: Vec<NodeIndex> = Vec::with_capacity(children.len());

    for (i, &child) in children.iter().enumerate() {
        if !query.node(child).is_whitespace() {
            if query.node(child).is_keyword() {
                join_keyword_words(query, child);
            }
            out.push(child);
            continue;
        }

        let prev = out.last().copied();
        // Runs left behind by earlier filters collapse into the first one.
        if prev.is_some_and(|p| query.node(p).is_whitespace()) {
            continue;
        }
        let needs_newline = after_line_comment(query, prev);

        let next = children.get(i + 1).map(|&n| query.node(n));
        let drop = !needs_newline
            && (prev.is_some_and(|p| query.node(p).is_leaf(TokenType::ParenOpen))
                || next.is_some_and(|n| {
                    n.is_leaf(TokenType::ParenClose)
                        || n.is_leaf(TokenType::Comma)
                        || n.is_leaf(TokenType::Semicolon)
                }));
        if drop {
            continue;
        }

        query.arena[child].value = if needs_newline {
            CompactString::const_new("\n")
        } else {
            CompactString::const_new(" ")
        };
        out.push(child);
    }
    out
}

/// `ORDER\n  BY` becomes `ORDER BY`. The letter case is left alone.
fn join_keyword_words(query: &mut Query, idx: NodeIndex) {
    let value = &query.arena[idx].value;
    if !value.contains(|c: char| c.is_ascii_whitespace() && c != ' ') && !value.contains("  ") {
        return;
    }
    let joined = value.split_ascii_whitespace().collect::<Vec<_>>().join(" ");
    query.arena[idx].value = CompactString::from(joined);
}

fn trim_statement(query: &Query, children: &mut Vec<NodeIndex>) {
    let start = children
        .iter()
        .position(|&c| !query.node(c).is_whitespace())
        .unwrap_or(children.len());
    children.drain(..start);
    while children
        .last()
        .is_some_and(|&c| query.node(c).is_whitespace())
    {
        children.pop();
    }
}

/// Puts exactly one space around binary operators and comparisons.
pub struct SpacesAroundOperatorsFilter;

impl Filter for SpacesAroundOperatorsFilter {
    fn name(&self) -> &'static str {
        "spaces_around_operators"
    }

    fn process(&self, query: &mut Query) {
        for group in query.groups() {
            let node = query.node(group);
            if !(node.is_group(GroupKind::Operation) || node.is_group(GroupKind::Comparison)) {
                continue;
            }
            let children = std::mem::take(&mut query.arena[group].children);
            let spaced = space_operators(query, children);
            query.set_children(group, spaced);
        }
    }
}

fn is_symbol_operator(query: &Query, idx: NodeIndex) -> bool {
    matches!(
        query.node(idx).token_type(),
        Some(TokenType::Operator | TokenType::Comparison | TokenType::Wildcard)
    )
}

fn space_operators(query: &mut Query, children: Vec<NodeIndex>) -> Vec<NodeIndex> {
    let mut out: Vec<NodeIndex> = Vec::with_capacity(children.len() + 4);
    let mut space_next = false;

    for (i, &child) in children.iter().enumerate() {
        let is_ws = query.node(child).is_whitespace();
        if std::mem::take(&mut space_next) {
            if is_ws {
                query.arena[child].value = CompactString::const_new(" ");
                out.push(child);
                continue;
            }
            out.push(query.push_leaf(TokenType::Whitespace, CompactString::const_new(" ")));
        }

        // A leading `-`/`+` is a sign, not a binary operator.
        if i > 0 && is_symbol_operator(query, child) {
            match out.last() {
                Some(&p) if query.node(p).is_whitespace() => {
                    query.arena[p].value = CompactString::const_new(" ");
                }
                _ => out.push(query.push_leaf(TokenType::Whitespace, CompactString::const_new(" "))),
            }
            out.push(child);
            space_next = true;
            continue;
        }
        out.push(child);
    }
    out
}
