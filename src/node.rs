use compact_str::CompactString;

use crate::keywords;
use crate::token::TokenType;

/// Index into the node arena (Vec<Node>).
pub type NodeIndex = usize;

/// Kinds of group produced by the grouping engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupKind {
    Statement,
    Parenthesis,
    Case,
    Function,
    Identifier,
    IdentifierList,
    Operation,
    Comparison,
    Where,
    Values,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Leaf(TokenType),
    Group(GroupKind),
}

/// A Node is either a leaf wrapping one token's text, or a group owning an
/// ordered list of children. Nodes live in an arena and refer to each other
/// by index.
#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    /// Token text for leaves; empty for groups.
    pub value: CompactString,
    pub children: Vec<NodeIndex>,
    pub parent: Option<NodeIndex>,
}

impl Node {
    pub fn leaf(token_type: TokenType, value: CompactString) -> Self {
        Self {
            kind: NodeKind::Leaf(token_type),
            value,
            children: Vec::new(),
            parent: None,
        }
    }

    pub fn group(kind: GroupKind, children: Vec<NodeIndex>) -> Self {
        Self {
            kind: NodeKind::Group(kind),
            value: CompactString::default(),
            children,
            parent: None,
        }
    }

    pub fn token_type(&self) -> Option<TokenType> {
        match self.kind {
            NodeKind::Leaf(t) => Some(t),
            NodeKind::Group(_) => None,
        }
    }

    pub fn group_kind(&self) -> Option<GroupKind> {
        match self.kind {
            NodeKind::Group(g) => Some(g),
            NodeKind::Leaf(_) => None,
        }
    }

    pub fn is_group(&self, kind: GroupKind) -> bool {
        self.kind == NodeKind::Group(kind)
    }

    pub fn is_leaf(&self, token_type: TokenType) -> bool {
        self.kind == NodeKind::Leaf(token_type)
    }

    // --- Token type classification ---

    pub fn is_whitespace(&self) -> bool {
        self.is_leaf(TokenType::Whitespace)
    }

    pub fn is_comment(&self) -> bool {
        self.token_type().is_some_and(TokenType::is_comment)
    }

    pub fn is_trivia(&self) -> bool {
        self.token_type().is_some_and(TokenType::is_trivia)
    }

    pub fn is_comma(&self) -> bool {
        self.is_leaf(TokenType::Comma)
    }

    pub fn is_keyword(&self) -> bool {
        self.token_type().is_some_and(TokenType::is_keyword)
    }

    pub fn is_dml(&self) -> bool {
        self.is_leaf(TokenType::Dml)
    }

    /// True if this leaf is the keyword `kw`, compared after normalization.
    /// `kw` must be lowercase with single spaces.
    pub fn is_keyword_value(&self, kw: &str) -> bool {
        self.is_keyword() && self.normalized() == kw
    }

    /// Lowercase, whitespace-collapsed keyword text. Empty for non-keywords.
    pub fn normalized(&self) -> String {
        if self.is_keyword() {
            keywords::normalize_keyword(&self.value)
        } else {
            String::new()
        }
    }

    /// True if the whitespace leaf spans a line break.
    pub fn has_newline(&self) -> bool {
        self.is_whitespace() && self.value.contains('\n')
    }

    /// Nodes that can be used as a value: names, literals, and most groups.
    pub fn is_operand(&self) -> bool {
        match self.kind {
            NodeKind::Leaf(t) => {
                t.is_operand()
                    || (t == TokenType::Keyword
                        && keywords::VALUE_KEYWORDS.contains(self.normalized().as_str()))
            }
            NodeKind::Group(g) => !matches!(
                g,
                GroupKind::Statement | GroupKind::IdentifierList | GroupKind::Where | GroupKind::Values
            ),
        }
    }
}
