use criterion::{black_box, criterion_group, criterion_main, Criterion};
use history_compactor::{
    CompactionEngine, CompactionPolicy, HeuristicEstimator, Role, RuleBasedSummarizer, Summarizer,
    TokenEstimator, Turn,
};
use tokio::runtime::Runtime;

fn bench_estimator(c: &mut Criterion) {
    let estimator = HeuristicEstimator;
    let text = "The quick brown fox jumps over the lazy dog. ".repeat(20);
    c.bench_function("heuristic_estimate_900_chars", |b| {
        b.iter(|| estimator.estimate(black_box(&text)))
    });
}

fn bench_rule_based_summary(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let turns: Vec<Turn> = (0..50)
        .flat_map(|i| {
            [
                Turn::new(Role::User, format!("Question {} about a topic. More detail.", i), 10),
                Turn::new(Role::Assistant, format!("Answer {} with an explanation. Done.", i), 10),
            ]
        })
        .collect();

    c.bench_function("rule_based_summarize_50_exchanges", |b| {
        b.iter(|| {
            rt.block_on(async {
                RuleBasedSummarizer
                    .summarize(black_box(&turns), 100)
                    .await
                    .unwrap()
            })
        })
    });
}

fn bench_engine_add_message(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    c.bench_function("engine_add_100_messages_with_compaction", |b| {
        b.iter(|| {
            rt.block_on(async {
                let engine = CompactionEngine::with_policy(CompactionPolicy {
                    max_token_limit: 200,
                    recent_message_count: 3,
                    summarization_ratio: 0.3,
                })
                .unwrap();
                for i in 0..50 {
                    engine
                        .add_user_message(format!("Benchmark question {} with filler text.", i))
                        .await;
                    engine
                        .add_assistant_message(format!("Benchmark answer {} with filler text.", i))
                        .await;
                }
                black_box(engine.estimated_tokens().await)
            })
        })
    });
}

criterion_group!(
    benches,
    bench_estimator,
    bench_rule_based_summary,
    bench_engine_add_message
);
criterion_main!(benches);
