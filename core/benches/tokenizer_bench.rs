use criterion::{criterion_group, criterion_main, Criterion};
use searchcore::tokenizer::token_frequencies;

fn bench_tokenize(c: &mut Criterion) {
    let texts: Vec<String> = include_str!("../src/tokenizer.rs")
        .lines()
        .map(|l| l.to_string())
        .collect();
    c.bench_function("token_frequencies_source", |b| b.iter(|| token_frequencies(&texts)));
}

criterion_group!(benches, bench_tokenize);
criterion_main!(benches);
