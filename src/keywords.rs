use phf::{phf_map, phf_set};

use crate::token::TokenType;

/// Single-word keywords, keyed by their lowercase spelling.
/// Multi-word keywords (`order by`, `left outer join`, ...) are assembled by
/// the lexer from these words and always classify as `Keyword`.
pub static KEYWORDS: phf::Map<&'static str, TokenType> = phf_map! {
    // DML
    "select" => TokenType::Dml,
    "insert" => TokenType::Dml,
    "update" => TokenType::Dml,
    "delete" => TokenType::Dml,
    "merge" => TokenType::Dml,
    "replace" => TokenType::Dml,
    "upsert" => TokenType::Dml,
    // DDL
    "create" => TokenType::Ddl,
    "alter" => TokenType::Ddl,
    "drop" => TokenType::Ddl,
    "truncate" => TokenType::Ddl,
    "rename" => TokenType::Ddl,
    "grant" => TokenType::Ddl,
    "revoke" => TokenType::Ddl,
    // CTE
    "with" => TokenType::Cte,
    // Plain keywords
    "add" => TokenType::Keyword,
    "all" => TokenType::Keyword,
    "analyze" => TokenType::Keyword,
    "and" => TokenType::Keyword,
    "any" => TokenType::Keyword,
    "as" => TokenType::Keyword,
    "asc" => TokenType::Keyword,
    "begin" => TokenType::Keyword,
    "between" => TokenType::Keyword,
    "by" => TokenType::Keyword,
    "cascade" => TokenType::Keyword,
    "case" => TokenType::Keyword,
    "cast" => TokenType::Keyword,
    "check" => TokenType::Keyword,
    "collate" => TokenType::Keyword,
    "column" => TokenType::Keyword,
    "commit" => TokenType::Keyword,
    "conflict" => TokenType::Keyword,
    "constraint" => TokenType::Keyword,
    "cross" => TokenType::Keyword,
    "current_date" => TokenType::Keyword,
    "current_time" => TokenType::Keyword,
    "current_timestamp" => TokenType::Keyword,
    "current_user" => TokenType::Keyword,
    "database" => TokenType::Keyword,
    "declare" => TokenType::Keyword,
    "default" => TokenType::Keyword,
    "desc" => TokenType::Keyword,
    "distinct" => TokenType::Keyword,
    "do" => TokenType::Keyword,
    "each" => TokenType::Keyword,
    "else" => TokenType::Keyword,
    "elsif" => TokenType::Keyword,
    "end" => TokenType::Keyword,
    "escape" => TokenType::Keyword,
    "except" => TokenType::Keyword,
    "execute" => TokenType::Keyword,
    "exists" => TokenType::Keyword,
    "explain" => TokenType::Keyword,
    "false" => TokenType::Keyword,
    "fetch" => TokenType::Keyword,
    "filter" => TokenType::Keyword,
    "following" => TokenType::Keyword,
    "for" => TokenType::Keyword,
    "foreign" => TokenType::Keyword,
    "from" => TokenType::Keyword,
    "full" => TokenType::Keyword,
    "function" => TokenType::Keyword,
    "group" => TokenType::Keyword,
    "having" => TokenType::Keyword,
    "if" => TokenType::Keyword,
    "ilike" => TokenType::Keyword,
    "in" => TokenType::Keyword,
    "index" => TokenType::Keyword,
    "inner" => TokenType::Keyword,
    "intersect" => TokenType::Keyword,
    "into" => TokenType::Keyword,
    "is" => TokenType::Keyword,
    "join" => TokenType::Keyword,
    "key" => TokenType::Keyword,
    "language" => TokenType::Keyword,
    "lateral" => TokenType::Keyword,
    "like" => TokenType::Keyword,
    "limit" => TokenType::Keyword,
    "localtime" => TokenType::Keyword,
    "localtimestamp" => TokenType::Keyword,
    "materialized" => TokenType::Keyword,
    "minus" => TokenType::Keyword,
    "natural" => TokenType::Keyword,
    "not" => TokenType::Keyword,
    "nothing" => TokenType::Keyword,
    "null" => TokenType::Keyword,
    "nulls" => TokenType::Keyword,
    "of" => TokenType::Keyword,
    "offset" => TokenType::Keyword,
    "on" => TokenType::Keyword,
    "only" => TokenType::Keyword,
    "or" => TokenType::Keyword,
    "order" => TokenType::Keyword,
    "outer" => TokenType::Keyword,
    "over" => TokenType::Keyword,
    "partition" => TokenType::Keyword,
    "preceding" => TokenType::Keyword,
    "primary" => TokenType::Keyword,
    "procedure" => TokenType::Keyword,
    "recursive" => TokenType::Keyword,
    "references" => TokenType::Keyword,
    "regexp" => TokenType::Keyword,
    "restrict" => TokenType::Keyword,
    "returning" => TokenType::Keyword,
    "returns" => TokenType::Keyword,
    "rlike" => TokenType::Keyword,
    "rollback" => TokenType::Keyword,
    "rows" => TokenType::Keyword,
    "schema" => TokenType::Keyword,
    "sequence" => TokenType::Keyword,
    "set" => TokenType::Keyword,
    "show" => TokenType::Keyword,
    "similar" => TokenType::Keyword,
    "some" => TokenType::Keyword,
    "straight_join" => TokenType::Keyword,
    "table" => TokenType::Keyword,
    "temp" => TokenType::Keyword,
    "temporary" => TokenType::Keyword,
    "then" => TokenType::Keyword,
    "to" => TokenType::Keyword,
    "top" => TokenType::Keyword,
    "transaction" => TokenType::Keyword,
    "trigger" => TokenType::Keyword,
    "true" => TokenType::Keyword,
    "unbounded" => TokenType::Keyword,
    "union" => TokenType::Keyword,
    "unique" => TokenType::Keyword,
    "using" => TokenType::Keyword,
    "vacuum" => TokenType::Keyword,
    "values" => TokenType::Keyword,
    "view" => TokenType::Keyword,
    "when" => TokenType::Keyword,
    "where" => TokenType::Keyword,
    "window" => TokenType::Keyword,
    "within" => TokenType::Keyword,
    // Builtin type names
    "bigint" => TokenType::Builtin,
    "bigserial" => TokenType::Builtin,
    "blob" => TokenType::Builtin,
    "bool" => TokenType::Builtin,
    "boolean" => TokenType::Builtin,
    "bytea" => TokenType::Builtin,
    "char" => TokenType::Builtin,
    "character" => TokenType::Builtin,
    "clob" => TokenType::Builtin,
    "date" => TokenType::Builtin,
    "datetime" => TokenType::Builtin,
    "decimal" => TokenType::Builtin,
    "double" => TokenType::Builtin,
    "float" => TokenType::Builtin,
    "inet" => TokenType::Builtin,
    "int" => TokenType::Builtin,
    "integer" => TokenType::Builtin,
    "interval" => TokenType::Builtin,
    "json" => TokenType::Builtin,
    "jsonb" => TokenType::Builtin,
    "money" => TokenType::Builtin,
    "nchar" => TokenType::Builtin,
    "numeric" => TokenType::Builtin,
    "nvarchar" => TokenType::Builtin,
    "real" => TokenType::Builtin,
    "serial" => TokenType::Builtin,
    "smallint" => TokenType::Builtin,
    "text" => TokenType::Builtin,
    "time" => TokenType::Builtin,
    "timestamp" => TokenType::Builtin,
    "timestamptz" => TokenType::Builtin,
    "tinyint" => TokenType::Builtin,
    "uuid" => TokenType::Builtin,
    "varchar" => TokenType::Builtin,
    "xml" => TokenType::Builtin,
};

/// Keywords that keep their keyword meaning even when written directly
/// before an opening parenthesis. Any other word followed by `(` is lexed as
/// a function name.
pub static PAREN_KEYWORDS: phf::Set<&'static str> = phf_set! {
    "all", "and", "any", "as", "between", "case", "else", "exists", "from",
    "in", "into", "is", "join", "not", "on", "or", "over", "select", "set",
    "some", "then", "using", "values", "when", "where", "with", "within",
    "filter", "returning", "lateral", "by", "union", "intersect", "except",
};

const BY: &[&[&str]] = &[&["by"]];
const ALL: &[&[&str]] = &[&["all"]];
const FIRST_LAST: &[&[&str]] = &[&["first"], &["last"]];
const SIDE_JOIN: &[&[&str]] = &[&["outer", "join"], &["join"]];
const JOIN: &[&[&str]] = &[&["join"]];
const NATURAL_JOIN: &[&[&str]] = &[
    &["left", "outer", "join"],
    &["right", "outer", "join"],
    &["full", "outer", "join"],
    &["left", "join"],
    &["right", "join"],
    &["full", "join"],
    &["inner", "join"],
    &["join"],
];

/// Multi-word keyword continuations for a lowercase first word, tried
/// longest first.
pub fn multi_word_continuations(first: &str) -> &'static [&'static [&'static str]] {
    match first {
        "order" | "group" | "partition" => BY,
        "union" => ALL,
        "nulls" => FIRST_LAST,
        "left" | "right" | "full" => SIDE_JOIN,
        "inner" | "cross" => JOIN,
        "natural" => NATURAL_JOIN,
        _ => &[],
    }
}

/// `LEFT` and `RIGHT` are keywords only as part of a join. On their own they
/// are the string functions, also when written as `left (s, 2)`.
pub fn is_join_side(lower: &str) -> bool {
    matches!(lower, "left" | "right")
}

/// Keywords that start a new clause line when reindenting.
pub static CLAUSE_KEYWORDS: phf::Set<&'static str> = phf_set! {
    "from", "where", "group by", "order by", "having", "limit", "offset",
    "values", "set", "returning", "window", "union", "union all",
    "intersect", "except", "minus", "straight_join", "fetch",
};

/// Keywords that end a `WHERE` clause.
pub static WHERE_TERMINATORS: phf::Set<&'static str> = phf_set! {
    "group by", "order by", "having", "limit", "offset", "union",
    "union all", "intersect", "except", "minus", "returning", "window",
    "fetch", "for",
};

pub static SET_OPERATORS: phf::Set<&'static str> = phf_set! {
    "union", "union all", "intersect", "except", "minus",
};

/// Keywords that may appear as a list item, e.g. `VALUES (1, NULL, DEFAULT)`.
pub static VALUE_KEYWORDS: phf::Set<&'static str> = phf_set! {
    "null", "true", "false", "default", "current_date", "current_time",
    "current_timestamp", "current_user", "localtime", "localtimestamp",
};

/// Look up a single lowercase word.
pub fn classify_word(lower: &str) -> Option<TokenType> {
    KEYWORDS.get(lower).copied()
}

/// Lowercase a keyword and collapse internal whitespace, so that
/// `ORDER\n  BY` compares equal to `order by`.
pub fn normalize_keyword(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for (i, word) in text.split_ascii_whitespace().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        out.push_str(&word.to_ascii_lowercase());
    }
    out
}

/// True for any flavour of join keyword (`join`, `left outer join`, ...).
pub fn is_join(normalized: &str) -> bool {
    normalized == "join" || normalized == "straight_join" || normalized.ends_with(" join")
}

pub fn is_clause_keyword(normalized: &str) -> bool {
    CLAUSE_KEYWORDS.contains(normalized) || is_join(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_word() {
        assert_eq!(classify_word("select"), Some(TokenType::Dml));
        assert_eq!(classify_word("create"), Some(TokenType::Ddl));
        assert_eq!(classify_word("with"), Some(TokenType::Cte));
        assert_eq!(classify_word("from"), Some(TokenType::Keyword));
        assert_eq!(classify_word("varchar"), Some(TokenType::Builtin));
        assert_eq!(classify_word("users"), None);
        assert_eq!(classify_word("left"), None);
    }

    #[test]
    fn test_normalize_keyword() {
        assert_eq!(normalize_keyword("ORDER\n   BY"), "order by");
        assert_eq!(normalize_keyword("Left  Outer\tJoin"), "left outer join");
        assert_eq!(normalize_keyword("from"), "from");
    }

    #[test]
    fn test_clause_keywords() {
        assert!(is_clause_keyword("from"));
        assert!(is_clause_keyword("left outer join"));
        assert!(is_clause_keyword("join"));
        assert!(is_clause_keyword("order by"));
        assert!(!is_clause_keyword("on"));
        assert!(!is_clause_keyword("and"));
    }

    #[test]
    fn test_set_operators_terminate_where() {
        for op in SET_OPERATORS.iter() {
            assert!(WHERE_TERMINATORS.contains(op), "{op} should end a WHERE");
        }
    }
}
