use criterion::{Criterion, criterion_group, criterion_main};
use spettro::{HtmlRenderer, Registry};

const JS_SAMPLE: &str = r#"
// A small but representative chunk of code
const cache = new Map();

async function fetchUser(id) {
    if (cache.has(id)) {
        return cache.get(id);
    }
    const response = await fetch(`/api/users/${id}`);
    const user = await response.json();
    cache.set(id, user);
    return user;
}

export const formatName = ({ first, last }) => `${last}, ${first}`;
const VERSION = "1.4.2";
const pattern = /^[a-z]+(?:-[a-z]+)*$/i;
"#;

const JSON_SAMPLE: &str = r#"{
    "name": "demo",
    "version": "1.4.2",
    "private": true,
    "workspaces": ["packages/*"],
    "dependencies": {"left-pad": "^1.3.0"},
    "counts": [1, 2.5, -3e4, null]
}"#;

const MARKUP_SAMPLE: &str = r#"<!DOCTYPE html>
<html>
<head>
  <style>body { margin: 0; color: #333; }</style>
  <script>document.title = "demo";</script>
</head>
<body onload="init()">
  <p class="intro">Fish &amp; chips</p>
</body>
</html>"#;

fn tokenize_benchmark(c: &mut Criterion) {
    let registry = Registry::new();

    // Warm the cache so grammar construction is not measured
    for lang in ["javascript", "json", "markup"] {
        registry.grammar(lang).unwrap();
    }

    let big_js = JS_SAMPLE.repeat(50);

    c.bench_function("tokenize javascript", |b| {
        b.iter(|| {
            let tokens = registry.tokenize("javascript", &big_js).unwrap();
            std::hint::black_box(tokens);
        })
    });

    c.bench_function("tokenize json", |b| {
        b.iter(|| {
            let tokens = registry.tokenize("json", JSON_SAMPLE).unwrap();
            std::hint::black_box(tokens);
        })
    });

    c.bench_function("tokenize markup", |b| {
        b.iter(|| {
            let tokens = registry.tokenize("markup", MARKUP_SAMPLE).unwrap();
            std::hint::black_box(tokens);
        })
    });
}

fn render_benchmark(c: &mut Criterion) {
    let registry = Registry::new();
    let tokens = registry.tokenize("javascript", JS_SAMPLE).unwrap();
    let renderer = HtmlRenderer::new();

    c.bench_function("render html", |b| {
        b.iter(|| {
            let html = renderer.render_block(&tokens, "javascript");
            std::hint::black_box(html);
        })
    });
}

fn grammar_construction_benchmark(c: &mut Criterion) {
    c.bench_function("build markup grammar", |b| {
        b.iter(|| {
            let grammar = spettro::languages::markup().unwrap();
            std::hint::black_box(grammar);
        })
    });
}

criterion_group!(
    benches,
    tokenize_benchmark,
    render_benchmark,
    grammar_construction_benchmark
);
criterion_main!(benches);
