//! Library-level tests for the public sqlfold API.

use pretty_assertions::assert_eq;
use sqlfold::token::TokenType;
use sqlfold::{format, parse, split, tokenize, Case, FormatOptions, GroupingLimits, SqlfoldError};

fn reindent_upper() -> FormatOptions {
    FormatOptions {
        reindent: true,
        keyword_case: Some(Case::Upper),
        ..FormatOptions::default()
    }
}

fn with_limits(max_depth: usize, max_tokens: usize) -> FormatOptions {
    FormatOptions {
        limits: GroupingLimits {
            max_depth,
            max_tokens,
        },
        ..FormatOptions::default()
    }
}

// ─── Plain rendering ───

#[test]
fn test_default_options_round_trip() {
    let inputs = [
        "",
        "select 1",
        "SELECT a,b FROM t WHERE x='y' -- trailing\n;\n\n",
        "select (((1))) from t where a in ((1, 2), (3, 4))",
        "select $$body$$, 'it''s', \"Quoted\" from `t`",
        "select 1 +",
        "))) select ((( end case",
        "¤ § garbage ~~ 1e ?",
    ];
    for sql in inputs {
        assert_eq!(format(sql, &FormatOptions::default()).unwrap(), sql);
    }
}

#[test]
fn test_round_trip_above_depth_ceiling() {
    let sql = format!("select {}x{} from t", "(".repeat(40), ")".repeat(40));
    let result = format(&sql, &with_limits(10, 10_000)).unwrap();
    assert_eq!(result, sql);
}

#[test]
fn test_round_trip_with_tiny_token_ceiling() {
    let sql = "select a + b, f(x) as y from t where z = 1";
    assert_eq!(format(sql, &with_limits(100, 1)).unwrap(), sql);
}

// ─── Case filters ───

#[test]
fn test_keyword_case() {
    let sql = "Select a From t Order By a";
    let upper = FormatOptions {
        keyword_case: Some(Case::Upper),
        ..FormatOptions::default()
    };
    let lower = FormatOptions {
        keyword_case: Some(Case::Lower),
        ..FormatOptions::default()
    };
    let capitalize = FormatOptions {
        keyword_case: Some(Case::Capitalize),
        ..FormatOptions::default()
    };
    assert_eq!(format(sql, &upper).unwrap(), "SELECT a FROM t ORDER BY a");
    assert_eq!(format(sql, &lower).unwrap(), "select a from t order by a");
    assert_eq!(format(sql, &capitalize).unwrap(), "Select a From t Order by a");
}

#[test]
fn test_identifier_case_leaves_quoted_names() {
    let options = FormatOptions {
        identifier_case: Some(Case::Upper),
        ..FormatOptions::default()
    };
    assert_eq!(
        format("select col, \"Mixed\" from tbl where x = 'abc'", &options).unwrap(),
        "select COL, \"Mixed\" from TBL where X = 'abc'"
    );
}

// ─── Reindent ───

#[test]
fn test_reindent_select_list_and_clauses() {
    let options = FormatOptions {
        reindent: true,
        ..FormatOptions::default()
    };
    assert_eq!(
        format("select id, name from users where active = 1 order by name", &options).unwrap(),
        "select id,\n       name\nfrom users\nwhere active = 1\norder by name"
    );
}

#[test]
fn test_reindent_join_statement() {
    let sql = "select u.id, u.name, p.title from users u join posts p on u.id = p.user_id \
               where u.active = 1 and p.published_at > '2023-01-01' order by p.published_at desc";
    assert_eq!(
        format(sql, &reindent_upper()).unwrap(),
        "SELECT u.id,\n       u.name,\n       p.title\nFROM users u\nJOIN posts p ON u.id = p.user_id\nWHERE u.active = 1\n  AND p.published_at > '2023-01-01'\nORDER BY p.published_at DESC"
    );
}

#[test]
fn test_reindent_multiple_statements() {
    let options = FormatOptions {
        reindent: true,
        ..FormatOptions::default()
    };
    assert_eq!(
        format("select 1;   select 2", &options).unwrap(),
        "select 1;\n\nselect 2"
    );
}

#[test]
fn test_reindent_with_safety_check() {
    let options = FormatOptions {
        safety_check: true,
        strip_comments: true,
        use_space_around_operators: true,
        ..reindent_upper()
    };
    let sql = "with x as (select a, b from t where a>1) \
               select case when a=1 then 'one' else 'other' end as label, count(*) \
               from x -- comment\n group by 1 having count(*)>2";
    let result = format(sql, &options).unwrap();
    assert!(result.contains("WITH x AS ("));
    assert!(result.contains("GROUP BY 1"));
    assert!(!result.contains("comment"));
}

// ─── Token ceiling ───

#[test]
fn test_small_token_ceiling_renders_list_flat() {
    let options = FormatOptions {
        reindent: true,
        limits: GroupingLimits {
            max_depth: 100,
            max_tokens: 5,
        },
        ..FormatOptions::default()
    };
    assert_eq!(
        format("select a, b, c from t", &options).unwrap(),
        "select a, b, c\nfrom t"
    );
}

// ─── Errors ───

#[test]
fn test_invalid_options_are_rejected() {
    let options = FormatOptions {
        truncate_strings: Some(0),
        ..FormatOptions::default()
    };
    assert!(matches!(format("select 1", &options), Err(SqlfoldError::Config(_))));
}

#[test]
fn test_safety_check_failure_is_reported() {
    let result = sqlfold::api::safety_check("select a", "select b", &FormatOptions::default());
    let err = result.unwrap_err();
    assert!(matches!(err, SqlfoldError::Equivalence(_)));
    assert!(err.to_string().contains("equivalence"));
}

// ─── split / parse / tokenize ───

#[test]
fn test_split_statements() {
    assert_eq!(
        split("select 1; select ';' ;\n-- done\n"),
        vec!["select 1;", "select ';' ;", "-- done"]
    );
}

#[test]
fn test_parse_exposes_statements() {
    let query = parse("select 1; select 2", &FormatOptions::default()).unwrap();
    assert_eq!(query.statements.len(), 2);
    assert_eq!(query.render(), "select 1; select 2");
}

#[test]
fn test_tokenize_never_fails() {
    let tokens = tokenize("select 'open");
    assert_eq!(tokens.last().map(|t| t.token_type), Some(TokenType::String));
    let rebuilt: String = tokens.iter().map(|t| t.text.as_str()).collect();
    assert_eq!(rebuilt, "select 'open");
}
