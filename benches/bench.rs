//! Criterion benchmarks for Jiaodui.
//!
//! Covers the rule-based stages (segmentation and candidate generation) and
//! the full correction loop against a scorer that answers instantly.

use std::hint::black_box;
use std::sync::Arc;

use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use jiaodui::analysis::TextSegmenter;
use jiaodui::config::CorrectorConfig;
use jiaodui::confusion::ConfusionStore;
use jiaodui::error::Result;
use jiaodui::scorer::{MaskedScorer, Prediction};
use jiaodui::spelling::{CandidateGenerator, CorrectionEngine};

const SENTENCES: &[&str] = &[
    "少先队员因该为老人让坐",
    "国物院办公厅关于推动公立医院高高质量发展的见",
    "真麻烦你了。希望你们好好的跳无",
    "机七学习是人工智能领遇最能体现智能的一个分知",
    "一只小鱼船浮在平净的河面上",
];

/// Answers every probe with a fixed, low-confidence prediction.
struct ConstantScorer;

impl MaskedScorer for ConstantScorer {
    fn mask_token(&self) -> &str {
        "[MASK]"
    }

    fn score_masked(&self, _sentence: &str) -> Result<Vec<Prediction>> {
        Ok(vec![Prediction::new("的", 0.2), Prediction::new("是", 0.1)])
    }
}

/// Build a store whose alphabet is every character of the sample sentences.
fn sample_store() -> Arc<ConfusionStore> {
    let mut chars: Vec<char> = SENTENCES.iter().flat_map(|s| s.chars()).collect();
    chars.sort_unstable();
    chars.dedup();

    let common: String = chars.iter().map(|c| format!("{c}\n")).collect();
    let freq: String = chars
        .iter()
        .enumerate()
        .map(|(i, c)| format!("{c} {}\n", 1000 - i))
        .collect();

    let store = ConfusionStore::builder()
        .common_chars(&common)
        .and_then(|b| b.word_freq(&freq))
        .and_then(|b| b.same_pinyin("因\t应音\t引\n坐\t座做\t\n"))
        .map(|b| b.build())
        .unwrap_or_default();
    Arc::new(store)
}

fn bench_segmentation(c: &mut Criterion) {
    let mut group = c.benchmark_group("segmentation");
    let segmenter = TextSegmenter::new();
    let text = SENTENCES.join("，");

    group.bench_function("segment_sentences", |b| {
        b.iter(|| black_box(segmenter.segment(black_box(&text))))
    });

    group.finish();
}

fn bench_candidates(c: &mut Criterion) {
    let mut group = c.benchmark_group("candidates");
    let generator = CandidateGenerator::new(sample_store());

    group.bench_function("generate_candidate_char", |b| {
        b.iter(|| black_box(generator.generate_candidate(black_box("因"))))
    });

    group.bench_function("confusion_words_two_chars", |b| {
        b.iter(|| black_box(generator.confusion_words(black_box("让坐"))))
    });

    group.finish();
}

fn bench_correction(c: &mut Criterion) {
    let mut group = c.benchmark_group("correction");
    group.sample_size(20); // Reduce sample size for faster execution

    let store = sample_store();
    let sequential = CorrectionEngine::new(Arc::clone(&store), Arc::new(ConstantScorer));
    let parallel = CorrectionEngine::with_config(
        store,
        Arc::new(ConstantScorer),
        CorrectorConfig {
            parallel_blocks: true,
            ..Default::default()
        },
    )
    .unwrap();

    group.throughput(Throughput::Elements(SENTENCES.len() as u64));
    group.bench_function("correct_sentences", |b| {
        b.iter(|| {
            for sentence in SENTENCES {
                black_box(sequential.correct(black_box(sentence)).unwrap());
            }
        })
    });

    let text = SENTENCES.join("，");
    group.bench_function("correct_parallel_blocks", |b| {
        b.iter(|| black_box(parallel.correct(black_box(&text)).unwrap()))
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_segmentation,
    bench_candidates,
    bench_correction
);
criterion_main!(benches);
