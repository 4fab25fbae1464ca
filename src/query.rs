use compact_str::CompactString;

use crate::node::{GroupKind, Node, NodeIndex, NodeKind};
use crate::token::TokenType;

/// A Query holds the node arena and the root `Statement` group of every
/// statement in the source, in order.
#[derive(Debug, Clone, Default)]
pub struct Query {
    pub arena: Vec<Node>,
    pub statements: Vec<NodeIndex>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node(&self, idx: NodeIndex) -> &Node {
        &self.arena[idx]
    }

    pub fn push_leaf(&mut self, token_type: TokenType, value: CompactString) -> NodeIndex {
        self.arena.push(Node::leaf(token_type, value));
        self.arena.len() - 1
    }

    /// Create a group adopting `children`.
    pub fn push_group(&mut self, kind: GroupKind, children: Vec<NodeIndex>) -> NodeIndex {
        let idx = self.arena.len();
        for &child in &children {
            self.arena[child].parent = Some(idx);
        }
        self.arena.push(Node::group(kind, children));
        idx
    }

    /// Replace the children of `parent`, re-pointing their parent links.
    pub fn set_children(&mut self, parent: NodeIndex, children: Vec<NodeIndex>) {
        for &child in &children {
            self.arena[child].parent = Some(parent);
        }
        self.arena[parent].children = children;
    }

    pub fn append_child(&mut self, parent: NodeIndex, child: NodeIndex) {
        self.arena[child].parent = Some(parent);
        self.arena[parent].children.push(child);
    }

    /// All groups reachable from the statement roots, parents before children.
    pub fn groups(&self) -> Vec<NodeIndex> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeIndex> = self.statements.iter().rev().copied().collect();
        while let Some(idx) = stack.pop() {
            let node = &self.arena[idx];
            if let NodeKind::Group(_) = node.kind {
                out.push(idx);
                stack.extend(node.children.iter().rev().copied());
            }
        }
        out
    }

    /// Leaves under `root` in source order.
    pub fn leaves(&self, root: NodeIndex) -> Vec<NodeIndex> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(idx) = stack.pop() {
            let node = &self.arena[idx];
            match node.kind {
                NodeKind::Leaf(_) => out.push(idx),
                NodeKind::Group(_) => stack.extend(node.children.iter().rev().copied()),
            }
        }
        out
    }

    /// Every leaf of every statement, in source order.
    pub fn all_leaves(&self) -> Vec<NodeIndex> {
        self.statements
            .iter()
            .flat_map(|&stmt| self.leaves(stmt))
            .collect()
    }

    /// Append the text of `root` to `out` exactly as stored in the tree.
    pub fn render_node_to(&self, root: NodeIndex, out: &mut String) {
        for leaf in self.leaves(root) {
            out.push_str(&self.arena[leaf].value);
        }
    }

    pub fn render_node(&self, root: NodeIndex) -> String {
        let mut out = String::new();
        self.render_node_to(root, &mut out);
        out
    }

    /// Render the full query without layout changes.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for &stmt in &self.statements {
            self.render_node_to(stmt, &mut out);
        }
        out
    }

    /// Width of `root` rendered on a single line, counting any whitespace run
    /// as one column.
    pub fn flat_width(&self, root: NodeIndex) -> usize {
        self.leaves(root)
            .into_iter()
            .map(|leaf| {
                let node = &self.arena[leaf];
                if node.is_whitespace() {
                    1
                } else {
                    node.value.chars().count()
                }
            })
            .sum()
    }

    /// First child of `idx` that is not whitespace or a comment.
    pub fn first_significant_child(&self, idx: NodeIndex) -> Option<NodeIndex> {
        self.arena[idx]
            .children
            .iter()
            .copied()
            .find(|&c| !self.arena[c].is_trivia())
    }

    /// True if `idx` is a parenthesis wrapping a query, e.g. `(SELECT ...)`.
    pub fn is_subquery(&self, idx: NodeIndex) -> bool {
        let node = &self.arena[idx];
        if !node.is_group(GroupKind::Parenthesis) {
            return false;
        }
        node.children
            .iter()
            .skip(1)
            .copied()
            .find(|&c| !self.arena[c].is_trivia())
            .is_some_and(|c| {
                let child = &self.arena[c];
                child.is_dml() || child.is_leaf(TokenType::Cte)
            })
    }
}
