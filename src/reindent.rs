use crate::keywords;
use crate::node::{GroupKind, Node, NodeIndex};
use crate::options::FormatOptions;
use crate::query::Query;
use crate::token::TokenType;

/// Output buffer that tracks the current column and the indentation of the
/// current line.
struct Writer<'a> {
    options: &'a FormatOptions,
    out: String,
    /// Byte offset where the current line starts.
    line_start: usize,
    line_indent: usize,
    column: usize,
    /// False until a token is written on the current line.
    has_content: bool,
    pending_space: bool,
}

impl<'a> Writer<'a> {
    fn new(options: &'a FormatOptions) -> Self {
        Self {
            options,
            out: String::new(),
            line_start: 0,
            line_indent: 0,
            column: 0,
            has_content: false,
            pending_space: false,
        }
    }

    /// Column the next token will start at.
    fn next_column(&self) -> usize {
        if self.has_content && self.pending_space {
            self.column + 1
        } else {
            self.column
        }
    }

    fn space(&mut self) {
        if self.has_content {
            self.pending_space = true;
        }
    }

    /// Start a new line indented to `indent` columns. On a line that is still
    /// empty this only changes its indentation.
    fn newline(&mut self, indent: usize) {
        if self.has_content {
            self.out.push('\n');
            self.line_start = self.out.len();
        } else {
            self.out.truncate(self.line_start);
        }
        self.push_indent(indent);
        self.line_indent = indent;
        self.column = indent;
        self.has_content = false;
        self.pending_space = false;
    }

    fn push_indent(&mut self, width: usize) {
        if self.options.indent_tabs {
            let step = self.options.indent_width.max(1);
            self.out.extend(std::iter::repeat('\t').take(width / step));
            self.out.extend(std::iter::repeat(' ').take(width % step));
        } else {
            self.out.extend(std::iter::repeat(' ').take(width));
        }
    }

    fn write(&mut self, text: &str) {
        if std::mem::take(&mut self.pending_space) && self.has_content {
            self.out.push(' ');
            self.column += 1;
        }
        self.out.push_str(text);
        match text.rfind('\n') {
            Some(pos) => self.column = text[pos + 1..].chars().count(),
            None => self.column += text.chars().count(),
        }
        self.has_content = true;
    }

    fn finish(mut self) -> String {
        let trimmed = self.out.trim_end().len();
        self.out.truncate(trimmed);
        self.out
    }
}

/// State for one child list being printed.
#[derive(Debug, Clone, Copy)]
struct Frame {
    group: NodeIndex,
    kind: GroupKind,
    pos: usize,
    /// Indent of clause lines in the enclosing query scope.
    base: usize,
    /// A statement or a subquery parenthesis.
    scope: bool,
    /// Clause keywords in this list start new lines: a scope, or a
    /// `WHERE`/`VALUES` group directly inside one.
    clause_level: bool,
    /// Identifier list items each start a new line.
    break_items: bool,
    /// Column list items or `CASE` branches line up with.
    align: usize,
    /// Indent of the closing parenthesis of a subquery.
    close_indent: usize,
    seen_content: bool,
    /// A comma was written; the next item may need a line break.
    break_next: bool,
    /// Inside `BETWEEN x AND y`; the next `AND` stays on the line.
    in_between: bool,
}

impl Frame {
    fn new(group: NodeIndex, kind: GroupKind, base: usize) -> Self {
        Self {
            group,
            kind,
            pos: 0,
            base,
            scope: false,
            clause_level: false,
            break_items: false,
            align: 0,
            close_indent: 0,
            seen_content: false,
            break_next: false,
            in_between: false,
        }
    }

    fn is_subquery(&self) -> bool {
        self.scope && self.kind == GroupKind::Parenthesis
    }
}

/// Lays a statement out across lines: one clause per line, one select column
/// per line, indented subqueries and `CASE` branches.
pub struct Reindenter<'a> {
    query: &'a Query,
    options: &'a FormatOptions,
}

impl<'a> Reindenter<'a> {
    pub fn new(query: &'a Query, options: &'a FormatOptions) -> Self {
        Self { query, options }
    }

    pub fn statement(&self, stmt: NodeIndex) -> String {
        let query = self.query;
        let mut writer = Writer::new(self.options);
        let base = if self.options.indent_after_first {
            self.options.indent_width
        } else {
            0
        };
        let mut root = Frame::new(stmt, GroupKind::Statement, base);
        root.scope = true;
        root.clause_level = true;
        let mut stack = vec![root];

        while let Some(top) = stack.len().checked_sub(1) {
            let children = &query.node(stack[top].group).children;
            let pos = stack[top].pos;
            if pos >= children.len() {
                stack.pop();
                continue;
            }
            stack[top].pos += 1;
            let child = children[pos];
            let node = query.node(child);

            if node.is_whitespace() {
                writer.space();
                continue;
            }

            self.before(&mut stack[top], children, pos, node, &mut writer);
            if !(pos == 0 && stack[top].is_subquery()) && !node.is_comment() {
                stack[top].seen_content = true;
            }

            match node.group_kind() {
                Some(kind) => {
                    let frame = self.enter(&stack[top], child, kind, &mut writer);
                    stack.push(frame);
                }
                None => {
                    writer.write(&node.value);
                    self.after_leaf(&mut stack[top], node, &mut writer);
                }
            }
        }
        writer.finish()
    }

    /// Line breaks due before `node`, the child at `pos` of the frame's list.
    fn before(
        &self,
        frame: &mut Frame,
        children: &[NodeIndex],
        pos: usize,
        node: &Node,
        writer: &mut Writer,
    ) {
        let indent = self.options.indent_width;

        if frame.is_subquery() {
            if node.is_leaf(TokenType::ParenClose) && pos + 1 == children.len() {
                writer.newline(frame.close_indent);
                return;
            }
            if pos > 0 && !frame.seen_content {
                writer.newline(frame.base);
            }
        }

        match frame.kind {
            GroupKind::Case => {
                if node.is_keyword_value("when") || node.is_keyword_value("else") {
                    writer.newline(frame.align + indent);
                } else if node.is_keyword_value("end") {
                    writer.newline(frame.align);
                }
                return;
            }
            GroupKind::IdentifierList => {
                self.before_list_item(frame, children, pos, node, writer);
                return;
            }
            _ => {}
        }

        if !frame.clause_level || !node.is_keyword() {
            return;
        }
        let normalized = node.normalized();
        if keywords::is_clause_keyword(&normalized) || (node.is_dml() && frame.seen_content) {
            writer.newline(frame.base);
        } else if normalized == "between" {
            frame.in_between = true;
        } else if normalized == "and" && frame.in_between {
            frame.in_between = false;
        } else if normalized == "and" || normalized == "or" {
            writer.newline(frame.base + indent);
        }
    }

    fn before_list_item(
        &self,
        frame: &mut Frame,
        children: &[NodeIndex],
        pos: usize,
        node: &Node,
        writer: &mut Writer,
    ) {
        let wrap_after = self.options.wrap_after;
        if node.is_comma() && self.options.comma_first {
            let wrap = frame.break_items
                || (wrap_after > 0
                    && next_item(self.query, children, pos + 1).is_some_and(|item| {
                        writer.column + 2 + self.query.flat_width(item) > wrap_after
                    }));
            if wrap {
                writer.newline(frame.align.saturating_sub(2));
            }
            return;
        }
        if node.is_comment() || !std::mem::take(&mut frame.break_next) {
            return;
        }
        if frame.break_items {
            writer.newline(frame.align);
        } else if wrap_after > 0 {
            let width = self.query.flat_width(children[pos]);
            if writer.column + 1 + width > wrap_after {
                writer.newline(frame.align);
            }
        }
    }

    fn after_leaf(&self, frame: &mut Frame, node: &Node, writer: &mut Writer) {
        if node.is_leaf(TokenType::CommentSingle) {
            writer.newline(writer.line_indent);
            return;
        }
        if frame.kind == GroupKind::IdentifierList && node.is_comma() {
            if self.options.comma_first {
                writer.space();
            } else {
                frame.break_next = true;
            }
            return;
        }
        if frame.clause_level
            && node.is_keyword()
            && keywords::SET_OPERATORS.contains(node.normalized().as_str())
        {
            writer.newline(frame.base);
        }
    }

    /// Frame for a group about to be printed as a child of `parent`.
    fn enter(&self, parent: &Frame, group: NodeIndex, kind: GroupKind, writer: &mut Writer) -> Frame {
        let mut frame = Frame::new(group, kind, parent.base);
        match kind {
            GroupKind::Parenthesis if self.query.is_subquery(group) => {
                frame.scope = true;
                frame.clause_level = true;
                frame.base = writer.line_indent + self.options.indent_width;
                frame.close_indent = writer.line_indent;
            }
            GroupKind::Where | GroupKind::Values => {
                frame.clause_level = parent.clause_level;
            }
            GroupKind::IdentifierList => {
                frame.break_items = parent.clause_level && self.options.wrap_after == 0;
                if frame.break_items && parent.scope && self.options.indent_columns {
                    let indent = parent.base + self.options.indent_width;
                    writer.newline(indent);
                    frame.align = indent;
                } else {
                    frame.align = writer.next_column();
                }
            }
            GroupKind::Case => {
                frame.align = writer.next_column();
            }
            _ => {}
        }
        frame
    }
}

/// Next child from `start` on that is not whitespace or a comment.
fn next_item(query: &Query, children: &[NodeIndex], start: usize) -> Option<NodeIndex> {
    children
        .get(start..)?
        .iter()
        .copied()
        .find(|&c| !query.node(c).is_trivia())
}
