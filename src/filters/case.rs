use std::collections::HashSet;

use compact_str::CompactString;

use crate::filters::Filter;
use crate::keywords;
use crate::node::{GroupKind, NodeIndex};
use crate::options::Case;
use crate::query::Query;
use crate::token::TokenType;

/// Changes the case of keywords and builtin type names, including sized
/// types such as `varchar(10)` that lex as calls.
pub struct KeywordCaseFilter {
    case: Case,
}

impl KeywordCaseFilter {
    pub fn new(case: Case) -> Self {
        Self { case }
    }
}

impl Filter for KeywordCaseFilter {
    fn name(&self) -> &'static str {
        "keyword_case"
    }

    fn process(&self, query: &mut Query) {
        let types = sized_types(query);
        apply_case(query, self.case, |leaf, t| {
            t.is_keyword() || t == TokenType::Builtin || types.contains(&leaf)
        });
    }
}

/// Changes the case of unquoted names.
pub struct IdentifierCaseFilter {
    case: Case,
}

impl IdentifierCaseFilter {
    pub fn new(case: Case) -> Self {
        Self { case }
    }
}

impl Filter for IdentifierCaseFilter {
    fn name(&self) -> &'static str {
        "identifier_case"
    }

    fn process(&self, query: &mut Query) {
        let types = sized_types(query);
        apply_case(query, self.case, |leaf, t| {
            t == TokenType::Name && !types.contains(&leaf)
        });
    }
}

/// Name leaves of calls whose name is a builtin type, like `varchar` in
/// `varchar(10)`.
fn sized_types(query: &Query) -> HashSet<NodeIndex> {
    query
        .groups()
        .into_iter()
        .filter(|&g| query.node(g).is_group(GroupKind::Function))
        .filter_map(|g| query.node(g).children.first().copied())
        .filter(|&name| {
            let node = query.node(name);
            node.is_leaf(TokenType::Name)
                && keywords::classify_word(&node.value.to_ascii_lowercase())
                    == Some(TokenType::Builtin)
        })
        .collect()
}

fn apply_case(query: &mut Query, case: Case, select: impl Fn(NodeIndex, TokenType) -> bool) {
    for leaf in query.all_leaves() {
        let node = &mut query.arena[leaf];
        if node.token_type().is_some_and(|t| select(leaf, t)) {
            node.value = CompactString::from(case.apply(&node.value));
        }
    }
}
