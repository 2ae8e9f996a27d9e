//! Benchmarks for parsing and unparsing a hosts-style file
//!
//! Run with: cargo bench --no-default-features --bench engine

use anyagent::engine::{grammar_dsl::*, Grammar, Interpreter, LineCache, Value};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

fn hosts_grammar() -> Grammar {
    Grammar::from_value(&list(
        tuple(vec![
            field("ip", ip4_number()),
            whitespace(),
            field("names", list(hostname(), whitespace())),
            lit("\n"),
        ]),
        skip(),
    ))
    .unwrap()
}

fn hosts_text(entries: usize) -> String {
    let mut text = String::from("# generated hosts\n");
    for i in 0..entries {
        text.push_str(&format!(
            "10.{}.{}.{} host{} host{}.example.com\n",
            (i >> 16) & 0xff,
            (i >> 8) & 0xff,
            i & 0xff,
            i,
            i
        ));
        if i % 10 == 0 {
            text.push_str("# block\n");
        }
    }
    text
}

fn bench_parse(c: &mut Criterion) {
    let grammar = hosts_grammar();
    let mut group = c.benchmark_group("parse_hosts");
    for entries in [10usize, 100, 1000] {
        let lines = LineCache::from_text(&hosts_text(entries), "#", false, true);
        group.bench_with_input(BenchmarkId::from_parameter(entries), &lines, |b, lines| {
            b.iter(|| {
                let mut interpreter = Interpreter::new(lines, false);
                black_box(interpreter.parse(black_box(&grammar)).unwrap())
            })
        });
    }
    group.finish();
}

fn bench_unparse(c: &mut Criterion) {
    let grammar = hosts_grammar();
    let mut group = c.benchmark_group("unparse_hosts");
    for entries in [10usize, 100, 1000] {
        let lines = LineCache::from_text(&hosts_text(entries), "#", false, true);
        let value: Value = Interpreter::new(&lines, false)
            .parse(&grammar)
            .unwrap()
            .value
            .unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(entries), &value, |b, value| {
            b.iter(|| {
                let empty = LineCache::default();
                let mut interpreter = Interpreter::new(&empty, false);
                black_box(interpreter.unparse(&grammar, black_box(value)))
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_parse, bench_unparse);
criterion_main!(benches);
