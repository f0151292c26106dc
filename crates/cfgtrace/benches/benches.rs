use std::{env, fs, path::PathBuf};

use cfgtrace::{analysis, grammar::Grammar, reduce};
use criterion::{criterion_group, criterion_main, Criterion};

criterion_main!(benches);
criterion_group!(benches, bench_fixtures, bench_long_chain);

fn bench_fixtures(c: &mut Criterion) {
    bench_analyses(c, "arithmetic", &load("arithmetic"));
    bench_analyses(c, "textbook", &load("textbook"));
    bench_analyses(c, "nullable_chain", &load("nullable_chain"));
}

fn bench_long_chain(c: &mut Criterion) {
    // N000 -> N001 x | N001, ..., N200 -> z
    // termination is discovered one variable per pass from the end of the chain.
    let mut source = String::new();
    for i in 0..200 {
        source.push_str(&format!("N{:03} -> N{:03} x | N{:03}\n", i, i + 1, i + 1));
    }
    source.push_str("N200 -> z\n");
    let grammar: Grammar = source.parse().unwrap();
    bench_analyses(c, "long_chain", &grammar);
}

fn load(name: &str) -> Grammar {
    let project_root = env::var_os("CARGO_MANIFEST_DIR")
        .map(PathBuf::from)
        .expect("missing environment variable: `CARGO_MANIFEST_DIR'");
    fs::read_to_string(project_root.join(format!("tests/grammars/{}.cfg", name)))
        .unwrap()
        .parse()
        .unwrap()
}

fn bench_analyses(c: &mut Criterion, name: &str, grammar: &Grammar) {
    let mut group = c.benchmark_group(name);
    group.bench_function("terminating", |b| {
        b.iter(|| analysis::terminating(grammar));
    });
    group.bench_function("nullable", |b| {
        b.iter(|| analysis::nullable(grammar));
    });
    group.bench_function("reachable", |b| {
        b.iter(|| analysis::reachable(grammar));
    });
    group.bench_function("unit", |b| {
        b.iter(|| analysis::unit_closures(grammar));
    });
    group.bench_function("useless", |b| {
        b.iter(|| reduce::eliminate_useless(grammar));
    });
    group.finish();
}
