use criterion::{black_box, criterion_group, criterion_main, Criterion};
use sqlfold::{format, tokenize, Case, FormatOptions};

fn reindent_upper() -> FormatOptions {
    FormatOptions {
        reindent: true,
        keyword_case: Some(Case::Upper),
        ..FormatOptions::default()
    }
}

fn bench_format_small(c: &mut Criterion) {
    let sql = "SELECT a, b, c FROM my_table WHERE x = 1 AND y > 2 ORDER BY a\n";
    let options = reindent_upper();
    c.bench_function("format_small", |b| {
        b.iter(|| format(black_box(sql), black_box(&options)).unwrap())
    });
}

fn bench_tuple_list(c: &mut Criterion) {
    let tuples: Vec<String> = (1..=5000).map(|i| format!("(1, {i})")).collect();
    let sql = format!("SELECT * FROM t WHERE (col1, col2) IN ({})", tuples.join(", "));
    let options = reindent_upper();
    c.bench_function("format_tuple_list_5000", |b| {
        b.iter(|| format(black_box(&sql), black_box(&options)).unwrap())
    });
}

fn bench_deep_nesting(c: &mut Criterion) {
    let sql = format!("SELECT {}1{}", "(".repeat(200), ")".repeat(200));
    let options = reindent_upper();
    c.bench_function("format_nested_200", |b| {
        b.iter(|| format(black_box(&sql), black_box(&options)).unwrap())
    });
}

fn bench_wide_select(c: &mut Criterion) {
    let columns: Vec<String> = (0..15000).map(|i| format!("col{i}")).collect();
    let sql = format!("SELECT {} FROM table1", columns.join(", "));
    let options = reindent_upper();
    c.bench_function("format_wide_select_15000", |b| {
        b.iter(|| format(black_box(&sql), black_box(&options)).unwrap())
    });
}

fn bench_lex_only(c: &mut Criterion) {
    let columns: Vec<String> = (0..15000).map(|i| format!("col{i}")).collect();
    let sql = format!("SELECT {} FROM table1", columns.join(", "));
    c.bench_function("lex_only", |b| b.iter(|| tokenize(black_box(&sql))));
}

criterion_group!(
    benches,
    bench_format_small,
    bench_tuple_list,
    bench_deep_nesting,
    bench_wide_select,
    bench_lex_only
);
criterion_main!(benches);
