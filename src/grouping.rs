use tracing::debug;

use crate::keywords;
use crate::node::{GroupKind, Node, NodeIndex};
use crate::options::GroupingLimits;
use crate::query::Query;
use crate::token::TokenType;

/// Run every grouping pass over the child list of every group in the query.
///
/// Each pass is a single left-to-right scan that builds a new child list, so
/// grouping stays linear in the number of children. Lists longer than
/// `limits.max_tokens` only get the cheap structural passes and otherwise
/// render flat.
pub fn group_query(query: &mut Query, limits: GroupingLimits) {
    for idx in query.groups() {
        group_children(query, idx, limits);
    }
}

fn group_children(query: &mut Query, parent: NodeIndex, limits: GroupingLimits) {
    let mut children = std::mem::take(&mut query.arena[parent].children);
    children = group_functions(query, children);
    children = group_dotted_names(query, children);
    children = group_typecasts(query, children);
    if children.len() > limits.max_tokens {
        debug!(
            children = children.len(),
            max_tokens = limits.max_tokens,
            "token ceiling reached; list left ungrouped"
        );
    } else {
        children = group_operations(query, children);
        children = group_comparisons(query, children);
        children = group_aliases(query, children);
        children = group_identifier_lists(query, children);
        children = group_values(query, children);
    }
    children = group_where(query, children);
    query.set_children(parent, children);
}

fn last_non_whitespace(query: &Query, nodes: &[NodeIndex]) -> Option<usize> {
    nodes.iter().rposition(|&i| !query.node(i).is_whitespace())
}

fn last_non_trivia(query: &Query, nodes: &[NodeIndex]) -> Option<usize> {
    nodes.iter().rposition(|&i| !query.node(i).is_trivia())
}

fn skip_whitespace(query: &Query, nodes: &[NodeIndex], mut i: usize) -> usize {
    while i < nodes.len() && query.node(nodes[i]).is_whitespace() {
        i += 1;
    }
    i
}

/// Replace `out[left_pos..]` with a group holding those nodes plus `last`.
/// If `out[left_pos]` is `extend`, the tail is appended to it instead.
fn fold_tail(
    query: &mut Query,
    out: &mut Vec<NodeIndex>,
    left_pos: usize,
    last: NodeIndex,
    kind: GroupKind,
    extend: Option<NodeIndex>,
) -> NodeIndex {
    let tail = out.split_off(left_pos);
    let left = tail[0];
    let group = if extend == Some(left) {
        for &node in &tail[1..] {
            query.append_child(left, node);
        }
        query.append_child(left, last);
        left
    } else {
        let mut kids = tail;
        kids.push(last);
        query.push_group(kind, kids)
    };
    out.push(group);
    group
}

/// `left op right` with optional whitespace around `op`. Chains fold into the
/// group built for the previous link.
fn fold_binary(
    query: &mut Query,
    out: &mut Vec<NodeIndex>,
    right: NodeIndex,
    kind: GroupKind,
    is_op: fn(&Node) -> bool,
    last: &mut Option<NodeIndex>,
) -> bool {
    let Some(op_pos) = last_non_whitespace(query, out) else {
        return false;
    };
    if !is_op(query.node(out[op_pos])) {
        return false;
    }
    let Some(left_pos) = last_non_whitespace(query, &out[..op_pos]) else {
        return false;
    };
    if !query.node(out[left_pos]).is_operand() {
        return false;
    }
    *last = Some(fold_tail(query, out, left_pos, right, kind, *last));
    true
}

// --- structural passes ---

/// Position of the argument list when `children[i]` is a call. Only `left`
/// and `right` may be separated from it by a space.
fn call_paren(query: &Query, children: &[NodeIndex], i: usize) -> Option<usize> {
    let name = query.node(children[i]);
    if !name.is_leaf(TokenType::Name) {
        return None;
    }
    let is_paren = |pos: usize| {
        children
            .get(pos)
            .is_some_and(|&n| query.node(n).is_group(GroupKind::Parenthesis))
    };
    if is_paren(i + 1) {
        return Some(i + 1);
    }
    let gap = children
        .get(i + 1)
        .is_some_and(|&n| query.node(n).is_whitespace() && !query.node(n).has_newline());
    (gap && keywords::is_join_side(&name.value.to_ascii_lowercase()) && is_paren(i + 2))
        .then_some(i + 2)
}

/// `name(...)`, with trailing `OVER (...)`, `OVER w` and `FILTER (...)`.
fn group_functions(query: &mut Query, children: Vec<NodeIndex>) -> Vec<NodeIndex> {
    let mut out = Vec::with_capacity(children.len());
    let mut i = 0;
    while i < children.len() {
        let Some(paren_pos) = call_paren(query, &children, i) else {
            out.push(children[i]);
            i += 1;
            continue;
        };

        let mut parts = children[i..=paren_pos].to_vec();
        let mut next = paren_pos + 1;
        loop {
            let kw_pos = skip_whitespace(query, &children, next);
            let Some(&kw) = children.get(kw_pos) else {
                break;
            };
            let is_over = query.node(kw).is_keyword_value("over");
            if !is_over && !query.node(kw).is_keyword_value("filter") {
                break;
            }
            let target_pos = skip_whitespace(query, &children, kw_pos + 1);
            let Some(&target) = children.get(target_pos) else {
                break;
            };
            let target = query.node(target);
            if !(target.is_group(GroupKind::Parenthesis)
                || (is_over && target.is_leaf(TokenType::Name)))
            {
                break;
            }
            parts.extend_from_slice(&children[next..=target_pos]);
            next = target_pos + 1;
        }
        out.push(query.push_group(GroupKind::Function, parts));
        i = next;
    }
    out
}

fn is_name_part(node: &Node) -> bool {
    matches!(
        node.token_type(),
        Some(TokenType::Name | TokenType::QuotedName | TokenType::Builtin)
    ) || node.is_group(GroupKind::Function)
}

/// `a.b.c`, `t.*`, `"s"."t"`, `pkg.fn(x)`
fn group_dotted_names(query: &mut Query, children: Vec<NodeIndex>) -> Vec<NodeIndex> {
    let mut out = Vec::with_capacity(children.len());
    let mut i = 0;
    while i < children.len() {
        let start = children[i];
        if !is_name_part(query.node(start)) {
            out.push(start);
            i += 1;
            continue;
        }
        let mut end = i + 1;
        while end + 1 < children.len()
            && query.node(children[end]).is_leaf(TokenType::Dot)
            && {
                let target = query.node(children[end + 1]);
                is_name_part(target) || target.is_leaf(TokenType::Wildcard)
            }
        {
            end += 2;
        }
        if end == i + 1 {
            out.push(start);
        } else {
            out.push(query.push_group(GroupKind::Identifier, children[i..end].to_vec()));
        }
        i = end;
    }
    out
}

fn is_type_name(node: &Node) -> bool {
    is_name_part(node)
}

/// `expr::type`, chained as `expr::a::b`.
fn group_typecasts(query: &mut Query, children: Vec<NodeIndex>) -> Vec<NodeIndex> {
    let mut out: Vec<NodeIndex> = Vec::with_capacity(children.len());
    let mut last_cast = None;
    for child in children {
        let n = out.len();
        let is_cast = n >= 2
            && is_type_name(query.node(child))
            && query.node(out[n - 1]).is_leaf(TokenType::Punctuation)
            && query.node(out[n - 1]).value == "::"
            && query.node(out[n - 2]).is_operand();
        if is_cast {
            last_cast = Some(fold_tail(
                query,
                &mut out,
                n - 2,
                child,
                GroupKind::Identifier,
                last_cast,
            ));
        } else {
            out.push(child);
        }
    }
    out
}

// --- expression passes, skipped above the token ceiling ---

fn is_arithmetic(node: &Node) -> bool {
    node.is_leaf(TokenType::Operator) || node.is_leaf(TokenType::Wildcard)
}

/// Arithmetic and string operators, left-associative. A `-`/`+` directly
/// attached to an operand with no operand before it is a unary sign.
fn group_operations(query: &mut Query, children: Vec<NodeIndex>) -> Vec<NodeIndex> {
    let mut out: Vec<NodeIndex> = Vec::with_capacity(children.len());
    let mut last = None;
    for child in children {
        if !query.node(child).is_operand() {
            out.push(child);
            continue;
        }
        let mut operand = child;
        if let Some(&sign) = out.last() {
            let sign_node = query.node(sign);
            let is_sign = sign_node.is_leaf(TokenType::Operator)
                && matches!(sign_node.value.as_str(), "-" | "+");
            let has_left = last_non_whitespace(query, &out[..out.len() - 1])
                .is_some_and(|pos| query.node(out[pos]).is_operand());
            if is_sign && !has_left {
                out.pop();
                operand = query.push_group(GroupKind::Operation, vec![sign, child]);
            }
        }
        if !fold_binary(query, &mut out, operand, GroupKind::Operation, is_arithmetic, &mut last) {
            out.push(operand);
        }
    }
    out
}

fn is_comparison(node: &Node) -> bool {
    if node.is_leaf(TokenType::Comparison) {
        return true;
    }
    node.is_keyword()
        && matches!(
            node.normalized().as_str(),
            "like" | "ilike" | "rlike" | "regexp" | "in" | "is"
        )
}

fn group_comparisons(query: &mut Query, children: Vec<NodeIndex>) -> Vec<NodeIndex> {
    let mut out: Vec<NodeIndex> = Vec::with_capacity(children.len());
    let mut last = None;
    for child in children {
        if query.node(child).is_operand()
            && fold_binary(query, &mut out, child, GroupKind::Comparison, is_comparison, &mut last)
        {
            continue;
        }
        out.push(child);
    }
    out
}

fn is_as(node: &Node) -> bool {
    node.is_keyword_value("as")
}

fn is_alias_target(node: &Node) -> bool {
    matches!(
        node.token_type(),
        Some(TokenType::Name | TokenType::QuotedName | TokenType::Builtin)
    ) || node.is_group(GroupKind::Function)
        || node.is_group(GroupKind::Parenthesis)
}

fn can_take_implicit_alias(node: &Node) -> bool {
    matches!(
        node.token_type(),
        Some(TokenType::Name | TokenType::QuotedName)
    ) || matches!(
        node.group_kind(),
        Some(
            GroupKind::Identifier
                | GroupKind::Function
                | GroupKind::Parenthesis
                | GroupKind::Case
                | GroupKind::Operation
        )
    )
}

fn is_ordering(node: &Node) -> bool {
    node.is_keyword()
        && matches!(
            node.normalized().as_str(),
            "asc" | "desc" | "nulls first" | "nulls last"
        )
}

/// `expr AS name`, `expr name`, `expr ASC|DESC [NULLS FIRST|LAST]`.
fn group_aliases(query: &mut Query, children: Vec<NodeIndex>) -> Vec<NodeIndex> {
    let mut out: Vec<NodeIndex> = Vec::with_capacity(children.len());
    let mut last_alias = None;
    for child in children {
        let node = query.node(child);

        if is_ordering(node) {
            if let Some(pos) = last_non_whitespace(query, &out) {
                let left = out[pos];
                if last_alias == Some(left) || query.node(left).is_operand() {
                    last_alias = Some(fold_tail(
                        query,
                        &mut out,
                        pos,
                        child,
                        GroupKind::Identifier,
                        last_alias,
                    ));
                    continue;
                }
            }
        }

        if is_alias_target(node) {
            let mut explicit = None;
            if fold_binary(query, &mut out, child, GroupKind::Identifier, is_as, &mut explicit) {
                last_alias = explicit;
                continue;
            }
        }

        let node = query.node(child);
        if matches!(node.token_type(), Some(TokenType::Name | TokenType::QuotedName)) {
            if let Some(pos) = last_non_whitespace(query, &out) {
                let left = out[pos];
                let separated = pos + 1 < out.len();
                if separated
                    && last_alias != Some(left)
                    && can_take_implicit_alias(query.node(left))
                {
                    last_alias = Some(fold_tail(
                        query,
                        &mut out,
                        pos,
                        child,
                        GroupKind::Identifier,
                        None,
                    ));
                    continue;
                }
            }
        }

        out.push(child);
    }
    out
}

fn is_list_item(node: &Node) -> bool {
    node.is_operand() || node.is_leaf(TokenType::Wildcard)
}

/// `item, item, ...` with whitespace or comments around the commas.
fn group_identifier_lists(query: &mut Query, children: Vec<NodeIndex>) -> Vec<NodeIndex> {
    let mut out: Vec<NodeIndex> = Vec::with_capacity(children.len());
    let mut last_list = None;
    for child in children {
        if is_list_item(query.node(child)) {
            if let Some(comma_pos) = last_non_trivia(query, &out) {
                if query.node(out[comma_pos]).is_comma() {
                    if let Some(left_pos) = last_non_trivia(query, &out[..comma_pos]) {
                        let left = out[left_pos];
                        if last_list == Some(left) || is_list_item(query.node(left)) {
                            last_list = Some(fold_tail(
                                query,
                                &mut out,
                                left_pos,
                                child,
                                GroupKind::IdentifierList,
                                last_list,
                            ));
                            continue;
                        }
                    }
                }
            }
        }
        out.push(child);
    }
    out
}

/// `VALUES (...)` or `VALUES (...), (...)`.
fn group_values(query: &mut Query, children: Vec<NodeIndex>) -> Vec<NodeIndex> {
    let mut out: Vec<NodeIndex> = Vec::with_capacity(children.len());
    for child in children {
        let node = query.node(child);
        if node.is_group(GroupKind::Parenthesis) || node.is_group(GroupKind::IdentifierList) {
            if let Some(pos) = last_non_whitespace(query, &out) {
                if query.node(out[pos]).is_keyword_value("values") {
                    fold_tail(query, &mut out, pos, child, GroupKind::Values, None);
                    continue;
                }
            }
        }
        out.push(child);
    }
    out
}

fn ends_where(node: &Node) -> bool {
    if node.is_leaf(TokenType::Semicolon) || node.is_leaf(TokenType::ParenClose) {
        return true;
    }
    node.is_keyword() && keywords::WHERE_TERMINATORS.contains(node.normalized().as_str())
}

/// `WHERE ...` up to the next clause that cannot be part of a condition.
/// Trailing whitespace stays outside the group.
fn group_where(query: &mut Query, children: Vec<NodeIndex>) -> Vec<NodeIndex> {
    let mut out = Vec::with_capacity(children.len());
    let mut i = 0;
    while i < children.len() {
        let child = children[i];
        if !query.node(child).is_keyword_value("where") {
            out.push(child);
            i += 1;
            continue;
        }
        let mut end = i + 1;
        while end < children.len() && !ends_where(query.node(children[end])) {
            end += 1;
        }
        let mut body_end = end;
        while body_end > i + 1 && query.node(children[body_end - 1]).is_whitespace() {
            body_end -= 1;
        }
        out.push(query.push_group(GroupKind::Where, children[i..body_end].to_vec()));
        out.extend_from_slice(&children[body_end..end]);
        i = end;
    }
    out
}
