/*!
 * Benchmarks for QA validation and pattern detection.
 *
 * Measures performance of:
 * - Translation QA validation over episode-sized texts
 * - Confusable-variant generation
 * - Direct separator-pattern detection
 */

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use seriloc::app_config::SplitterConfig;
use seriloc::glossary::{Glossary, GlossaryTerm, TermCategory};
use seriloc::language_utils::Lang;
use seriloc::qa::TranslationQaValidator;
use seriloc::splitting::PatternDetector;

/// Generate an episode-sized translated text for benchmarking.
fn generate_translated_text(paragraphs: usize, with_issues: bool) -> String {
    let mut text = String::new();
    for i in 0..paragraphs {
        if with_issues && i % 7 == 0 {
            text.push_str("그리고 그는 말했다 ");
        }
        text.push_str("趙輝賢走在黑暗的街道上，雨水順著屋簷落下。");
        text.push_str("他想起了魔塔裡的那一天，以及那把黑劍的重量。\n\n");
    }
    text
}

/// Glossary with character names that exercise the confusable tables.
fn benchmark_glossary() -> Glossary {
    let mut glossary = Glossary::create("bench", Lang::Korean, Lang::TraditionalChinese);
    glossary.add_term(GlossaryTerm::new("조휘현", "趙輝賢", TermCategory::Character, "주인공"));
    glossary.add_term(GlossaryTerm::new("김준수", "金俊秀", TermCategory::Character, ""));
    glossary.add_term(GlossaryTerm::new("이민아", "李敏雅", TermCategory::Character, ""));
    glossary.add_term(GlossaryTerm::new("마탑", "魔塔", TermCategory::Location, ""));
    glossary.add_term(GlossaryTerm::new("흑검", "黑劍", TermCategory::Item, ""));
    glossary
}

/// Generate a marked manuscript for detection benchmarks.
fn generate_manuscript(episodes: usize) -> String {
    let mut text = String::new();
    for n in 1..=episodes {
        text.push_str(&format!("#{}화\n", n));
        for _ in 0..30 {
            text.push_str("그날의 기억은 쉽게 사라지지 않았다. 거리에는 비가 내렸다.\n");
        }
        text.push('\n');
    }
    text
}

fn bench_validation(c: &mut Criterion) {
    let glossary = benchmark_glossary();
    let validator = TranslationQaValidator::new(&glossary);

    let mut group = c.benchmark_group("qa_validation");
    for paragraphs in [10, 50, 200] {
        let clean = generate_translated_text(paragraphs, false);
        let dirty = generate_translated_text(paragraphs, true);

        group.throughput(Throughput::Bytes(clean.len() as u64));
        group.bench_with_input(BenchmarkId::new("clean", paragraphs), &clean, |b, text| {
            b.iter(|| black_box(validator.validate(black_box(text), Some(1))));
        });
        group.bench_with_input(BenchmarkId::new("dirty", paragraphs), &dirty, |b, text| {
            b.iter(|| black_box(validator.validate(black_box(text), Some(1))));
        });
    }
    group.finish();
}

fn bench_confusables(c: &mut Criterion) {
    use seriloc::qa::confusables::similar_alternatives;

    c.bench_function("confusable_generation", |b| {
        b.iter(|| black_box(similar_alternatives(black_box("趙輝賢"))));
    });
}

fn bench_detection(c: &mut Criterion) {
    let detector = PatternDetector::new(SplitterConfig::default());

    let mut group = c.benchmark_group("pattern_detection");
    for episodes in [10, 100] {
        let manuscript = generate_manuscript(episodes);
        group.throughput(Throughput::Bytes(manuscript.len() as u64));
        group.bench_with_input(
            BenchmarkId::new("direct_scan", episodes),
            &manuscript,
            |b, text| {
                b.iter(|| black_box(detector.detect_direct(black_box(text))));
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_validation, bench_confusables, bench_detection);
criterion_main!(benches);
