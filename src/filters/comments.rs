use compact_str::CompactString;

use crate::filters::Filter;
use crate::node::{NodeIndex, NodeKind};
use crate::query::Query;
use crate::token::TokenType;

/// Removes comments. The line break after a `--` comment is kept; a block
/// comment squeezed between two tokens becomes a single space.
pub struct StripCommentsFilter;

impl Filter for StripCommentsFilter {
    fn name(&self) -> &'static str {
        "strip_comments"
    }

    fn process(&self, query: &mut Query) {
        for group in query.groups() {
            let has_comment = query
                .node(group)
                .children
                .iter()
                .any(|&c| query.node(c).is_comment());
            if has_comment {
                let children = std::mem::take(&mut query.arena[group].children);
                let kept = strip_list(query, children);
                query.set_children(group, kept);
            }
        }
    }
}

fn strip_list(query: &mut Query, children: Vec<NodeIndex>) -> Vec<NodeIndex> {
    let mut out: Vec<NodeIndex> = Vec::with_capacity(children.len());
    let mut skip_whitespace = false;

    for (i, &child) in children.iter().enumerate() {
        let node = query.node(child);
        if std::mem::take(&mut skip_whitespace) && node.is_whitespace() {
            continue;
        }
        if !node.is_comment() {
            out.push(child);
            continue;
        }

        let prev = out.last().map(|&p| query.node(p));
        let next = children.get(i + 1).map(|&n| query.node(n));
        let prev_ws = prev.is_some_and(|p| p.is_whitespace());
        let prev_newline = prev.is_some_and(|p| p.has_newline());
        let next_ws = next.is_some_and(|n| n.is_whitespace());
        let next_newline = next.is_some_and(|n| n.has_newline());

        if node.is_leaf(TokenType::CommentSingle) {
            // Drop spaces left dangling at the end of the line.
            if prev_ws && !prev_newline {
                out.pop();
            }
        } else if prev_ws && next_ws {
            if next_newline && !prev_newline {
                out.pop();
            } else {
                skip_whitespace = true;
            }
        } else if !prev_ws && !next_ws && prev.is_some() && next.is_some() {
            let space = &mut query.arena[child];
            space.kind = NodeKind::Leaf(TokenType::Whitespace);
            space.value = CompactString::const_new(" ");
            out.push(child);
        }
    }
    out
}
