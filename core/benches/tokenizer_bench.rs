use criterion::{criterion_group, criterion_main, Criterion};
use minisearch_core::tokenizer::tokenize;

const TEXT: &str = "Quotes to Scrape. \"The world as we have created it is a process of our thinking. \
It cannot be changed without changing our thinking.\" by Albert Einstein (about) Tags: change \
deep-thoughts thinking world. \"It is our choices, Harry, that show what we truly are, far more than \
our abilities.\" by J.K. Rowling (about) Tags: abilities choices";

fn bench_tokenize(c: &mut Criterion) {
    let text = TEXT.repeat(50);
    c.bench_function("tokenize_page", |b| b.iter(|| tokenize(&text)));
}

criterion_group!(benches, bench_tokenize);
criterion_main!(benches);
