use crate::keywords::{self, PAREN_KEYWORDS};
use crate::string_utils::{scan_block_comment, scan_dollar_string, scan_line_comment, scan_quoted};
use crate::token::{Token, TokenType};

/// Lex a SQL source string into tokens.
///
/// Lexing never fails: bytes that start no known token become single
/// `Error` tokens. Concatenating the token texts reproduces `source`.
pub fn lex(source: &str) -> Vec<Token> {
    let bytes = source.as_bytes();
    let mut tokens: Vec<Token> = Vec::with_capacity(source.len() / 3 + 1);
    let mut pos = 0;
    // Last token that is not whitespace; drives the few context-dependent rules.
    let mut prev: Option<TokenType> = None;

    while pos < bytes.len() {
        let (token_type, len) = lex_one(&bytes[pos..], prev);
        let end = pos + len;
        tokens.push(Token::new(token_type, &source[pos..end], pos, end));
        if token_type != TokenType::Whitespace {
            prev = Some(token_type);
        }
        pos = end;
    }
    tokens
}

/// Lex a single token at the start of `bytes`. Returns its type and byte length
/// (always at least 1).
pub fn lex_one(bytes: &[u8], prev: Option<TokenType>) -> (TokenType, usize) {
    let b = bytes[0];
    let next = bytes.get(1).copied();

    if is_space(b) {
        let len = bytes.iter().take_while(|&&c| is_space(c)).count();
        return (TokenType::Whitespace, len);
    }

    match b {
        b'-' if next == Some(b'-') => (TokenType::CommentSingle, scan_line_comment(bytes)),
        b'#' if matches!(next, None | Some(b' ') | Some(b'\t')) => {
            (TokenType::CommentSingle, scan_line_comment(bytes))
        }
        b'/' if next == Some(b'*') => (TokenType::CommentMultiline, scan_block_comment(bytes)),
        b'\'' => (TokenType::String, scan_quoted(bytes, true)),
        b'"' => (TokenType::QuotedName, scan_quoted(bytes, false)),
        b'`' => (TokenType::QuotedName, scan_quoted(bytes, false)),
        b'$' => lex_dollar(bytes),
        b'0'..=b'9' => scan_number(bytes),
        b'.' => {
            let after_name = matches!(
                prev,
                Some(TokenType::Name | TokenType::QuotedName | TokenType::ParenClose)
            );
            if !after_name && next.is_some_and(|c| c.is_ascii_digit()) {
                scan_number(bytes)
            } else {
                (TokenType::Dot, 1)
            }
        }
        b',' => (TokenType::Comma, 1),
        b';' => (TokenType::Semicolon, 1),
        b'(' => (TokenType::ParenOpen, 1),
        b')' => (TokenType::ParenClose, 1),
        b'[' | b']' | b'{' | b'}' => (TokenType::Punctuation, 1),
        b'*' => (TokenType::Wildcard, 1),
        b'?' => (TokenType::Placeholder, 1),
        b'%' => lex_percent(bytes),
        b':' => lex_colon(bytes),
        b'@' => {
            let word = scan_word(&bytes[1..]);
            if word > 0 {
                (TokenType::Placeholder, 1 + word)
            } else if next == Some(b'@') && scan_word(&bytes[2..]) > 0 {
                (TokenType::Placeholder, 2 + scan_word(&bytes[2..]))
            } else if next == Some(b'>') {
                (TokenType::Operator, 2)
            } else {
                (TokenType::Operator, 1)
            }
        }
        b'<' | b'>' | b'=' | b'!' | b'-' | b'+' | b'/' | b'|' | b'&' | b'^' | b'~' | b'#' => {
            scan_operator(bytes)
        }
        _ if is_word_start(b) => lex_word(bytes, prev),
        _ => (TokenType::Error, 1),
    }
}

#[inline]
fn is_space(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r' | 0x0b | 0x0c)
}

#[inline]
fn is_word_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b >= 0x80
}

/// Scan an identifier (alphanumerics, underscore, `$`, and any non-ASCII byte).
/// Returns byte length of the identifier.
#[inline]
fn scan_word(bytes: &[u8]) -> usize {
    match bytes.first() {
        Some(&b) if is_word_start(b) => {}
        _ => return 0,
    }
    bytes
        .iter()
        .take_while(|&&b| b.is_ascii_alphanumeric() || b == b'_' || b == b'$' || b >= 0x80)
        .count()
}

/// Scan a number. Handles hex (`0x...`), decimals and scientific notation.
fn scan_number(bytes: &[u8]) -> (TokenType, usize) {
    let len = bytes.len();

    if bytes[0] == b'0' && len > 2 && matches!(bytes[1], b'x' | b'X') && bytes[2].is_ascii_hexdigit()
    {
        let mut i = 2;
        while i < len && bytes[i].is_ascii_hexdigit() {
            i += 1;
        }
        return (TokenType::Integer, i);
    }

    let mut i = 0;
    let mut is_float = false;
    while i < len && bytes[i].is_ascii_digit() {
        i += 1;
    }
    // `1.5`, `1.` and `.5`, but not the range/dot in `1..2`
    if i < len && bytes[i] == b'.' && bytes.get(i + 1) != Some(&b'.') {
        is_float = true;
        i += 1;
        while i < len && bytes[i].is_ascii_digit() {
            i += 1;
        }
    }
    if i < len && matches!(bytes[i], b'e' | b'E') {
        let mut j = i + 1;
        if j < len && matches!(bytes[j], b'+' | b'-') {
            j += 1;
        }
        if j < len && bytes[j].is_ascii_digit() {
            is_float = true;
            i = j;
            while i < len && bytes[i].is_ascii_digit() {
                i += 1;
            }
        }
    }

    let token_type = if is_float {
        TokenType::Float
    } else {
        TokenType::Integer
    };
    (token_type, i)
}

fn lex_dollar(bytes: &[u8]) -> (TokenType, usize) {
    if let Some(len) = scan_dollar_string(bytes) {
        return (TokenType::String, len);
    }
    let digits = bytes[1..].iter().take_while(|b| b.is_ascii_digit()).count();
    if digits > 0 {
        (TokenType::Placeholder, 1 + digits)
    } else {
        (TokenType::Error, 1)
    }
}

/// `%s`, `%(name)s` placeholders, otherwise the modulo operator.
fn lex_percent(bytes: &[u8]) -> (TokenType, usize) {
    match bytes.get(1) {
        Some(b's') if scan_word(&bytes[1..]) == 1 => (TokenType::Placeholder, 2),
        Some(b'(') => {
            let name = scan_word(&bytes[2..]);
            let close = 2 + name;
            if name > 0 && bytes.get(close) == Some(&b')') && bytes.get(close + 1) == Some(&b's') {
                (TokenType::Placeholder, close + 2)
            } else {
                (TokenType::Operator, 1)
            }
        }
        _ => (TokenType::Operator, 1),
    }
}

/// `::` casts, `:=` assignment, `:name` placeholders.
fn lex_colon(bytes: &[u8]) -> (TokenType, usize) {
    match bytes.get(1) {
        Some(b':') => (TokenType::Punctuation, 2),
        Some(b'=') => (TokenType::Operator, 2),
        _ => {
            let word = scan_word(&bytes[1..]);
            if word > 0 {
                (TokenType::Placeholder, 1 + word)
            } else {
                (TokenType::Punctuation, 1)
            }
        }
    }
}

/// Comparison and arithmetic operators, longest match first.
fn scan_operator(bytes: &[u8]) -> (TokenType, usize) {
    const COMPARISONS: &[&[u8]] = &[b"<=>", b"<=", b">=", b"<>", b"!=", b"==", b"=", b"<", b">"];
    const OPERATORS: &[&[u8]] = &[
        b"->>", b"#>>", b"!~*", b"->", b"#>", b"<<", b">>", b"<@", b"||", b"&&", b"!~", b"~*",
        b"=>",
    ];

    for op in OPERATORS {
        if bytes.starts_with(op) {
            return (TokenType::Operator, op.len());
        }
    }
    for op in COMPARISONS {
        if bytes.starts_with(op) {
            return (TokenType::Comparison, op.len());
        }
    }
    (TokenType::Operator, 1)
}

/// Lex a word: a keyword (possibly multi-word), a function name, a name, or a
/// prefixed string literal such as `E'...'`.
fn lex_word(bytes: &[u8], prev: Option<TokenType>) -> (TokenType, usize) {
    let len = scan_word(bytes);
    let word = &bytes[..len];

    // E'..', N'..', X'..', B'..' string literals
    if len == 1
        && bytes.get(1) == Some(&b'\'')
        && matches!(word[0].to_ascii_lowercase(), b'e' | b'n' | b'x' | b'b')
    {
        return (TokenType::String, 1 + scan_quoted(&bytes[1..], true));
    }

    // Anything after a dot is a name: `t.select`, `s.order`
    if prev == Some(TokenType::Dot) {
        return (TokenType::Name, len);
    }

    let lower = match std::str::from_utf8(word) {
        Ok(s) => s.to_ascii_lowercase(),
        Err(_) => return (TokenType::Name, len),
    };

    for continuation in keywords::multi_word_continuations(&lower) {
        if let Some(extra) = try_sequence(&bytes[len..], continuation) {
            return (TokenType::Keyword, len + extra);
        }
    }

    if bytes.get(len) == Some(&b'(') && !PAREN_KEYWORDS.contains(lower.as_str()) {
        return (TokenType::Name, len);
    }

    match keywords::classify_word(&lower) {
        Some(token_type) => (token_type, len),
        None => (TokenType::Name, len),
    }
}

/// Match `words` (each preceded by whitespace) at the start of `bytes`.
/// Returns the matched byte length, or None.
fn try_sequence(bytes: &[u8], words: &[&str]) -> Option<usize> {
    let mut i = 0;
    for word in words {
        let ws = bytes[i..].iter().take_while(|&&b| is_space(b)).count();
        if ws == 0 {
            return None;
        }
        i += ws;
        let len = scan_word(&bytes[i..]);
        if len != word.len() || !bytes[i..i + len].eq_ignore_ascii_case(word.as_bytes()) {
            return None;
        }
        i += len;
    }
    Some(i)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn types(sql: &str) -> Vec<(TokenType, String)> {
        lex(sql)
            .into_iter()
            .filter(|t| t.token_type != TokenType::Whitespace)
            .map(|t| (t.token_type, t.text.to_string()))
            .collect()
    }

    #[test]
    fn test_lex_is_lossless() {
        let sql = "SELECT a.b, 'x''y', \"Q\" -- c\n/* m */ FROM t WHERE x >= 1.5e3;";
        let joined: String = lex(sql).iter().map(|t| t.text.as_str()).collect();
        assert_eq!(joined, sql);
    }

    #[test]
    fn test_keywords_and_names() {
        let toks = types("select id from users");
        assert_eq!(
            toks,
            vec![
                (TokenType::Dml, "select".into()),
                (TokenType::Name, "id".into()),
                (TokenType::Keyword, "from".into()),
                (TokenType::Name, "users".into()),
            ]
        );
    }

    #[test]
    fn test_multi_word_keywords() {
        let toks = types("ORDER  BY a LEFT OUTER JOIN b UNION ALL GROUP\nBY c");
        assert_eq!(toks[0], (TokenType::Keyword, "ORDER  BY".into()));
        assert_eq!(toks[2], (TokenType::Keyword, "LEFT OUTER JOIN".into()));
        assert_eq!(toks[4], (TokenType::Keyword, "UNION ALL".into()));
        assert_eq!(toks[5], (TokenType::Keyword, "GROUP\nBY".into()));
    }

    #[test]
    fn test_function_name_before_paren() {
        let toks = types("count(*) in (1)");
        assert_eq!(toks[0], (TokenType::Name, "count".into()));
        assert_eq!(toks[2], (TokenType::Wildcard, "*".into()));
        assert_eq!(toks[4], (TokenType::Keyword, "in".into()));
    }

    #[test]
    fn test_bare_join_side_is_name() {
        let toks = types("left (a, 2) left join b right(c, 1)");
        assert_eq!(toks[0], (TokenType::Name, "left".into()));
        assert!(toks.contains(&(TokenType::Keyword, "left join".into())));
        assert!(toks.contains(&(TokenType::Name, "right".into())));
    }

    #[test]
    fn test_keyword_after_dot_is_name() {
        let toks = types("t.order");
        assert_eq!(toks[2], (TokenType::Name, "order".into()));
    }

    #[test]
    fn test_numbers() {
        let toks = types("1 2.5 .5 1e10 0xFF");
        assert_eq!(toks[0].0, TokenType::Integer);
        assert_eq!(toks[1].0, TokenType::Float);
        assert_eq!(toks[2].0, TokenType::Float);
        assert_eq!(toks[3].0, TokenType::Float);
        assert_eq!(toks[4], (TokenType::Integer, "0xFF".into()));
    }

    #[test]
    fn test_operators() {
        let toks = types("a <> b != c <= d || e :: f -> g");
        assert_eq!(toks[1], (TokenType::Comparison, "<>".into()));
        assert_eq!(toks[3], (TokenType::Comparison, "!=".into()));
        assert_eq!(toks[5], (TokenType::Comparison, "<=".into()));
        assert_eq!(toks[7], (TokenType::Operator, "||".into()));
        assert_eq!(toks[9], (TokenType::Punctuation, "::".into()));
        assert_eq!(toks[11], (TokenType::Operator, "->".into()));
    }

    #[test]
    fn test_placeholders() {
        let toks = types("? %s %(name)s :id $1 @var");
        assert!(toks.iter().all(|(t, _)| *t == TokenType::Placeholder));
        assert_eq!(toks.len(), 6);
    }

    #[test]
    fn test_comments() {
        let toks = types("-- hi\n# mysql\n/* block */");
        assert_eq!(toks[0], (TokenType::CommentSingle, "-- hi".into()));
        assert_eq!(toks[1], (TokenType::CommentSingle, "# mysql".into()));
        assert_eq!(toks[2], (TokenType::CommentMultiline, "/* block */".into()));
    }

    #[test]
    fn test_strings_and_quoted_names() {
        let toks = types("'a' E'b\\n' \"Col\" `tbl` $$body$$");
        assert_eq!(toks[0].0, TokenType::String);
        assert_eq!(toks[1], (TokenType::String, "E'b\\n'".into()));
        assert_eq!(toks[2].0, TokenType::QuotedName);
        assert_eq!(toks[3].0, TokenType::QuotedName);
        assert_eq!(toks[4].0, TokenType::String);
    }

    #[test]
    fn test_unknown_bytes_are_error_tokens() {
        let toks = types("select \\ 1");
        assert_eq!(toks[1], (TokenType::Error, "\\".into()));
    }

    #[test]
    fn test_unicode_identifiers() {
        let sql = "select café, naïve from données";
        let joined: String = lex(sql).iter().map(|t| t.text.as_str()).collect();
        assert_eq!(joined, sql);
        let toks = types(sql);
        assert_eq!(toks[1], (TokenType::Name, "café".into()));
    }
}
