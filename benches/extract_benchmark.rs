//! Benchmarks for extraction and projection performance.
//!
//! Run with: cargo bench
//!
//! These benchmarks use synthetic in-memory documents.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use paragrid::host::{MemoryDocument, MemoryParagraph, TabAlignment};
use paragrid::{extract_records, ExtractOptions, Projection};

/// Creates a lesson-like document with the given number of paragraphs.
fn create_test_document(paragraphs: usize) -> MemoryDocument {
    let mut doc = MemoryDocument::new("bench.docx");
    for i in 0..paragraphs {
        let paragraph = match i % 4 {
            0 => MemoryParagraph::new(format!("Unit {}: Section heading", i / 4 + 1))
                .with_style("Heading 1")
                .with_font("Arial", 16.0)
                .with_emphasis(true, false),
            1 => MemoryParagraph::new(format!("{}.\tSolve x + {} = {}", i, i, i * 2))
                .with_style("List Paragraph")
                .with_indents(-18.0, 36.0)
                .with_list(3, i as i64)
                .with_tab_stop(453_600.0, TabAlignment::Left),
            2 => MemoryParagraph::new("Explain, in your own words, why the answer works.")
                .with_font("Calibri", 11.0),
            _ => MemoryParagraph::new("Answer:\t\t____").with_font("Calibri", 9.0),
        };
        doc = doc.with_paragraph(paragraph);
    }
    doc
}

/// Benchmark extraction at various sizes.
fn bench_extraction(c: &mut Criterion) {
    let mut group = c.benchmark_group("extraction");

    for paragraphs in [10, 100, 500].iter() {
        let doc = create_test_document(*paragraphs);

        group.bench_function(format!("{}_paragraphs", paragraphs), |b| {
            b.iter(|| {
                let options = ExtractOptions::new().lenient();
                let _ = extract_records(black_box(&doc), &options);
            });
        });
    }

    group.finish();
}

/// Benchmark filter and search over a large projection.
fn bench_projection(c: &mut Criterion) {
    let doc = create_test_document(2000);
    let records = extract_records(&doc, &ExtractOptions::default()).unwrap();
    let mut projection = Projection::new();
    projection.load(&records);

    c.bench_function("filter_2000_rows", |b| {
        b.iter(|| {
            let _ = projection.filter(black_box("`Font Size` > 10 and tab_count >= 1"));
        });
    });

    c.bench_function("search_2000_rows", |b| {
        b.iter(|| {
            let _ = projection.search(black_box("answer"));
        });
    });
}

/// Benchmark builder pattern overhead.
fn bench_builder_creation(c: &mut Criterion) {
    c.bench_function("builder_creation", |b| {
        b.iter(|| {
            let _builder = paragrid::Paragrid::new()
                .strict()
                .sequential()
                .with_history("Data/filter_history.json");
        });
    });
}

criterion_group!(
    benches,
    bench_extraction,
    bench_projection,
    bench_builder_creation,
);
criterion_main!(benches);
