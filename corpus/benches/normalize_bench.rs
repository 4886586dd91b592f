use criterion::{criterion_group, criterion_main, Criterion};
use corpus::TermDictionary;

const SAMPLE: &str = "The TF-IDF pipeline turns heterogeneous documents into \
per-document term vectors, (cid:14) markers and https://example.com noise \
included, then aggregates corpus-wide document frequencies -- repeatedly.";

fn bench_count_tokens(c: &mut Criterion) {
    let text = SAMPLE.repeat(64);
    c.bench_function("count_tokens", |b| b.iter(|| TermDictionary::from_text(&text)));
}

criterion_group!(benches, bench_count_tokens);
criterion_main!(benches);
