//! Render pipeline and style compiler throughput.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use mbrkit_render::{RenderOptions, compile_styles, render_component};
use serde_json::{Value as JsonValue, json};

fn template(cards: usize) -> String {
    let mut body = String::new();
    for i in 0..cards {
        body.push_str(&format!(
            r#"<div class="card" mbr-if="showCards" mbr-class="{{'active': active == {i}, 'wide': wide}}" mbr-style="{{'color': 'tColor'}}"><h4>{{{{title}}}} {i}</h4><img src="@PROJECT_PATH@/assets/{i}.jpg"></div>"#
        ));
    }
    format!(
        r##"<section class="features">
<mbr-parameters>
  <input type="checkbox" name="showCards" title="Show cards" checked>
  <input type="range" name="active" min="0" max="{cards}" value="1">
  <input type="color" name="tColor" value="#232323">
</mbr-parameters>
<div class="container">{body}</div>
</section>"##
    )
}

fn params() -> JsonValue {
    json!({
        "showCards": true,
        "active": 1,
        "wide": false,
        "title": "Feature",
        "tColor": "#232323",
        "paddingTop": 3,
        "bg": { "type": "color", "value": "#ffffff" }
    })
}

fn styles() -> JsonValue {
    json!({
        "padding-top": "(@paddingTop * 1rem)",
        "background-color": "@bg-value",
        ".card": {
            "color": "@tColor",
            "&:hover": { "color": "lighten(@tColor, 20%)" }
        },
        "@media (max-width: 767px)": {
            ".card": { "width": "100%" }
        }
    })
}

fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("render_component");
    let options = RenderOptions::new()
        .with_path_prefix("/project/")
        .with_scope_id("u123")
        .with_styles(styles());
    let params = params();

    for cards in [1, 10, 100] {
        let source = template(cards);
        group.bench_with_input(BenchmarkId::from_parameter(cards), &source, |b, source| {
            b.iter(|| render_component(black_box(source), &params, &options))
        });
    }
    group.finish();
}

fn bench_styles(c: &mut Criterion) {
    let spec = styles();
    let params = params();
    c.bench_function("compile_styles", |b| {
        b.iter(|| compile_styles(black_box(&spec), &params, "u123"))
    });
}

criterion_group!(benches, bench_render, bench_styles);
criterion_main!(benches);
