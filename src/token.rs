use compact_str::CompactString;

/// Position in source string (byte offset).
pub type Pos = usize;

/// All token types recognized by the lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenType {
    /// Any run of spaces, tabs, carriage returns and newlines.
    Whitespace,
    /// `-- ...` or `# ...`, without the line terminator.
    CommentSingle,
    /// `/* ... */`
    CommentMultiline,
    Keyword,
    Dml,
    Ddl,
    Cte,
    /// Builtin type names such as `int` or `varchar`.
    Builtin,
    Name,
    QuotedName,
    String,
    Integer,
    Float,
    Operator,
    Comparison,
    Wildcard,
    Comma,
    Semicolon,
    Dot,
    ParenOpen,
    ParenClose,
    Punctuation,
    Placeholder,
    Error,
}

impl TokenType {
    pub fn is_whitespace(self) -> bool {
        self == Self::Whitespace
    }

    pub fn is_comment(self) -> bool {
        matches!(self, Self::CommentSingle | Self::CommentMultiline)
    }

    /// Whitespace and comments: tokens that carry no SQL meaning.
    pub fn is_trivia(self) -> bool {
        self.is_whitespace() || self.is_comment()
    }

    /// Tokens affected by keyword case normalization.
    pub fn is_keyword(self) -> bool {
        matches!(self, Self::Keyword | Self::Dml | Self::Ddl | Self::Cte)
    }

    pub fn is_literal(self) -> bool {
        matches!(self, Self::String | Self::Integer | Self::Float)
    }

    pub fn is_possible_name(self) -> bool {
        matches!(self, Self::Name | Self::QuotedName)
    }

    /// Tokens that may stand on their own as the operand of an expression.
    pub fn is_operand(self) -> bool {
        matches!(
            self,
            Self::Name
                | Self::QuotedName
                | Self::String
                | Self::Integer
                | Self::Float
                | Self::Placeholder
                | Self::Builtin
        )
    }
}

/// An immutable token produced by the lexer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub token_type: TokenType,
    pub text: CompactString,
    pub spos: Pos,
    pub epos: Pos,
}

impl Token {
    pub fn new(token_type: TokenType, text: &str, spos: Pos, epos: Pos) -> Self {
        Self {
            token_type,
            text: CompactString::from(text),
            spos,
            epos,
        }
    }

    /// True if this token is the keyword `kw` (case-insensitive).
    pub fn is_keyword_value(&self, kw: &str) -> bool {
        self.token_type.is_keyword() && self.text.eq_ignore_ascii_case(kw)
    }
}
