use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use paper_critique::error::{AppError, CapabilityError};
use paper_critique::models::{CritiqueFragment, FieldExtraction, QuestionSet};
use paper_critique::orchestrator::{Analyzer, RunSettings, RunState};
use paper_critique::services::{Capabilities, FnCapability, SharedCapability};
use paper_critique::text::SegmentSettings;

const CRITIQUES: [&str; 4] = [
    "The sample size is far too small.",
    "No ablation study supports the architecture choice.",
    "Statistical significance is never reported.",
    "Related work omits all recent transformer baselines.",
];

const QUESTIONS: [&str; 4] = [
    "Why was this dataset chosen?",
    "How would results change with more random seeds?",
    "What is the computational cost at inference time?",
    "Does the method transfer to other languages?",
];

/// 每段一个 "Segment N content" 段落，在下面的参数下恰好切成 `count` 个分段
fn paper(count: usize) -> String {
    (1..=count)
        .map(|i| format!("Segment {} content", i))
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn settings() -> RunSettings {
    RunSettings {
        segment: SegmentSettings {
            budget: 24,
            overlap: 0,
            lookback: 200,
        },
        call_timeout: Duration::from_secs(5),
        run_deadline: Duration::from_secs(60),
        ..Default::default()
    }
}

fn segment_number(text: &str) -> usize {
    text.split_whitespace()
        .nth(1)
        .and_then(|n| n.parse().ok())
        .unwrap_or(0)
}

/// 按分段编号返回不同内容，`delay` 决定每个分段的耗时
fn numbered_capabilities(delay: fn(usize) -> Duration) -> Capabilities {
    Capabilities::new(
        Arc::new(FnCapability::new("extraction", move |text: String| async move {
            let n = segment_number(&text);
            tokio::time::sleep(delay(n)).await;
            Ok::<_, CapabilityError>(FieldExtraction {
                goal: Some(format!("Goal stated in part {}", n)),
                ..Default::default()
            })
        })),
        Arc::new(FnCapability::new("critique", move |text: String| async move {
            let n = segment_number(&text);
            tokio::time::sleep(delay(n)).await;
            Ok::<_, CapabilityError>(Some(CRITIQUES[n - 1].to_string()))
        })),
        Arc::new(FnCapability::new("questions", move |text: String| async move {
            let n = segment_number(&text);
            tokio::time::sleep(delay(n)).await;
            Ok::<_, CapabilityError>(QuestionSet {
                main_question: None,
                sub_questions: vec![QUESTIONS[n - 1].to_string()],
                addressed_questions: None,
            })
        })),
    )
}

fn failing<T: Send + 'static>(name: &'static str) -> SharedCapability<T> {
    Arc::new(FnCapability::new(name, move |_text: String| async move {
        Err::<T, _>(CapabilityError::malformed(name, "not json"))
    }))
}

fn counting<T: Clone + Send + Sync + 'static>(
    name: &'static str,
    value: T,
    calls: Arc<AtomicUsize>,
) -> SharedCapability<T> {
    Arc::new(FnCapability::new(name, move |_text: String| {
        let value = value.clone();
        calls.fetch_add(1, Ordering::SeqCst);
        async move { Ok::<_, CapabilityError>(value) }
    }))
}

#[tokio::test]
async fn test_single_segment_is_verbatim() {
    let extraction = FieldExtraction {
        goal: Some("Measure caching impact".to_string()),
        hypothesis: Some("Caching reduces latency".to_string()),
        methods: Some("Controlled benchmark".to_string()),
        results: Some("30% faster".to_string()),
        conclusion: Some("Caching helps".to_string()),
    };
    let questions = QuestionSet {
        main_question: Some("Is the benchmark representative?".to_string()),
        sub_questions: vec!["Why 3 runs?".to_string(), "why 3 runs?".to_string()],
        addressed_questions: Some("Warm-up is discussed.".to_string()),
    };

    let analyzer = Analyzer::new(
        Capabilities::new(
            counting("extraction", extraction.clone(), Arc::default()),
            counting::<CritiqueFragment>(
                "critique",
                Some("Only one machine was used.".to_string()),
                Arc::default(),
            ),
            counting("questions", questions.clone(), Arc::default()),
        ),
        settings(),
    );

    let report = analyzer.analyze_text("single", "Segment 1 content").await;
    assert_eq!(
        report.history,
        vec![
            RunState::Pending,
            RunState::Dispatching,
            RunState::Merging,
            RunState::Completed
        ]
    );
    assert_eq!(report.stats.segments, 1);

    let result = tokio_test::assert_ok!(report.outcome);
    assert_eq!(result.fields, extraction);
    assert_eq!(result.critique, "Only one machine was used.");
    assert_eq!(result.reviewer_questions, Some(questions));
}

#[tokio::test]
async fn test_total_failure_returns_only_error() {
    let analyzer = Analyzer::new(
        Capabilities::new(
            failing("extraction"),
            failing("critique"),
            failing("questions"),
        ),
        RunSettings {
            segment: SegmentSettings::with_default_overlap(2),
            ..Default::default()
        },
    );

    let report = analyzer.analyze_text("aaaa", "AAAA").await;
    assert_eq!(report.state, RunState::Failed);
    assert_eq!(report.stats.segments, 2);
    assert_eq!(report.stats.calls, 6);
    assert_eq!(report.stats.failed, 6);
    assert!(matches!(
        report.outcome,
        Err(AppError::TotalFailure {
            segments: 2,
            calls: 6
        })
    ));

    let value = serde_json::to_value(report.into_response()).unwrap();
    let keys: Vec<&String> = value.as_object().unwrap().keys().collect();
    assert_eq!(keys, vec!["error"]);
}

#[tokio::test]
async fn test_partial_fields_are_combined() {
    let analyzer = Analyzer::new(
        Capabilities::new(
            Arc::new(FnCapability::new("extraction", |text: String| async move {
                let mut fields = FieldExtraction::default();
                match segment_number(&text) {
                    1 => fields.goal = Some("X".to_string()),
                    _ => fields.conclusion = Some("Y".to_string()),
                }
                Ok::<_, CapabilityError>(fields)
            })),
            failing("critique"),
            failing("questions"),
        ),
        settings(),
    );

    let report = analyzer.analyze_text("partial", &paper(2)).await;
    assert_eq!(report.state, RunState::Completed);
    assert_eq!(report.stats.succeeded, 2);
    assert_eq!(report.stats.failed, 4);

    let response = report.into_response();
    assert_eq!(response.goal.as_deref(), Some("X"));
    assert_eq!(response.conclusion.as_deref(), Some("Y"));
    assert!(response.hypothesis.is_none());
    assert!(response.methods.is_none());
    assert!(response.results.is_none());
    assert!(response.reviewer_questions.is_none());
    assert!(response.error.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_merge_is_independent_of_completion_order() {
    let text = paper(4);

    let in_order = Analyzer::new(numbered_capabilities(|_| Duration::ZERO), settings())
        .analyze_text("ordered", &text)
        .await;
    let reversed = Analyzer::new(
        numbered_capabilities(|n| Duration::from_millis(100 * (5 - n as u64))),
        settings(),
    )
    .analyze_text("reversed", &text)
    .await;

    assert_eq!(in_order.stats.segments, 4);
    assert_eq!(in_order.response(), reversed.response());

    let result = tokio_test::assert_ok!(reversed.outcome);
    assert_eq!(result.critique, CRITIQUES.join("\n\n"));
    assert_eq!(
        result.fields.goal.as_deref(),
        Some("Goal stated in part 1\n\nGoal stated in part 2\n\nGoal stated in part 3\n\nGoal stated in part 4")
    );
    let questions = result.reviewer_questions.unwrap();
    assert_eq!(questions.main_question.as_deref(), Some(QUESTIONS[0]));
    assert_eq!(questions.sub_questions, QUESTIONS.to_vec());
}

#[tokio::test(start_paused = true)]
async fn test_call_timeout_fails_only_that_call() {
    let analyzer = Analyzer::new(
        numbered_capabilities(|n| {
            if n == 2 {
                Duration::from_secs(30)
            } else {
                Duration::ZERO
            }
        }),
        RunSettings {
            call_timeout: Duration::from_secs(1),
            ..settings()
        },
    );

    let report = analyzer.analyze_text("timeout", &paper(2)).await;
    assert_eq!(report.state, RunState::Completed);
    assert_eq!(report.stats.succeeded, 3);
    assert_eq!(report.stats.failed, 3);
    assert!(!report.stats.deadline_exceeded);

    let result = tokio_test::assert_ok!(report.outcome);
    assert_eq!(result.critique, CRITIQUES[0]);
    assert_eq!(result.fields.goal.as_deref(), Some("Goal stated in part 1"));
}

#[tokio::test(start_paused = true)]
async fn test_run_deadline_merges_settled_results() {
    let analyzer = Analyzer::new(
        numbered_capabilities(|n| {
            if n == 2 {
                Duration::from_secs(3600)
            } else {
                Duration::ZERO
            }
        }),
        RunSettings {
            call_timeout: Duration::from_secs(7200),
            run_deadline: Duration::from_secs(10),
            ..settings()
        },
    );

    let report = analyzer.analyze_text("deadline", &paper(2)).await;
    assert_eq!(report.state, RunState::Completed);
    assert!(report.stats.deadline_exceeded);
    assert_eq!(report.stats.succeeded, 3);
    assert_eq!(report.stats.cancelled, 3);
    assert_eq!(report.stats.failed, 0);

    let response = report.into_response();
    assert_eq!(response.goal.as_deref(), Some("Goal stated in part 1"));
    assert!(response.error.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_run_deadline_without_results_is_total_failure() {
    let analyzer = Analyzer::new(
        numbered_capabilities(|_| Duration::from_secs(3600)),
        RunSettings {
            call_timeout: Duration::from_secs(7200),
            run_deadline: Duration::from_secs(10),
            ..settings()
        },
    );

    let report = analyzer.analyze_text("nothing", &paper(1)).await;
    assert_eq!(report.state, RunState::Failed);
    assert!(report.stats.deadline_exceeded);
    assert_eq!(report.stats.cancelled, 3);
    assert!(report.response().is_failure());
}

#[tokio::test]
async fn test_one_call_per_segment_and_capability() {
    let calls = Arc::new(AtomicUsize::new(0));
    let analyzer = Analyzer::new(
        Capabilities::new(
            counting("extraction", FieldExtraction::default(), calls.clone()),
            counting::<CritiqueFragment>("critique", None, calls.clone()),
            counting("questions", QuestionSet::default(), calls.clone()),
        ),
        settings(),
    );

    let report = analyzer.analyze_text("count", &paper(3)).await;
    assert_eq!(report.stats.segments, 3);
    assert_eq!(calls.load(Ordering::SeqCst), 9);
    assert_eq!(report.stats.succeeded, 9);

    // 成功但为空的输出仍然算作可用结果
    let response = report.into_response();
    assert!(!response.is_failure());
    assert!(response.goal.is_none());
    assert!(response.reviewer_questions.is_none());
}

#[tokio::test]
async fn test_invalid_input_is_rejected_before_dispatch() {
    let calls = Arc::new(AtomicUsize::new(0));
    let analyzer = Analyzer::new(
        Capabilities::new(
            counting("extraction", FieldExtraction::default(), calls.clone()),
            counting::<CritiqueFragment>("critique", None, calls.clone()),
            counting("questions", QuestionSet::default(), calls.clone()),
        ),
        RunSettings {
            max_document_chars: 50,
            ..settings()
        },
    );

    let too_long = "x".repeat(51);
    for text in ["", "   \n ", too_long.as_str()] {
        let report = analyzer.analyze_text("invalid", text).await;
        assert_eq!(report.history, vec![RunState::Pending, RunState::Failed]);
        assert!(matches!(report.outcome, Err(AppError::InvalidInput(_))));
        assert_eq!(report.stats.calls, 0);
    }
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_overlap_not_below_budget_is_invalid() {
    let analyzer = Analyzer::new(
        numbered_capabilities(|_| Duration::ZERO),
        RunSettings {
            segment: SegmentSettings {
                budget: 24,
                overlap: 24,
                lookback: 200,
            },
            ..settings()
        },
    );

    let report = analyzer.analyze_text("overlap", &paper(2)).await;
    assert_eq!(report.state, RunState::Failed);
    assert!(matches!(report.outcome, Err(AppError::InvalidInput(_))));
}

#[tokio::test]
async fn test_concurrency_is_bounded() {
    let active = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));

    fn tracked<T: Clone + Send + Sync + 'static>(
        name: &'static str,
        value: T,
        active: Arc<AtomicUsize>,
        peak: Arc<AtomicUsize>,
    ) -> SharedCapability<T> {
        Arc::new(FnCapability::new(name, move |_text: String| {
            let (value, active, peak) = (value.clone(), active.clone(), peak.clone());
            async move {
                let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(20)).await;
                active.fetch_sub(1, Ordering::SeqCst);
                Ok::<_, CapabilityError>(value)
            }
        }))
    }

    let analyzer = Analyzer::new(
        Capabilities::new(
            tracked("extraction", FieldExtraction::default(), active.clone(), peak.clone()),
            tracked::<CritiqueFragment>("critique", Some("Flaw.".to_string()), active.clone(), peak.clone()),
            tracked("questions", QuestionSet::default(), active.clone(), peak.clone()),
        ),
        RunSettings {
            max_concurrent_calls: 2,
            ..settings()
        },
    );

    let report = analyzer.analyze_text("bounded", &paper(4)).await;
    assert_eq!(report.stats.succeeded, 12);
    assert!(peak.load(Ordering::SeqCst) <= 2);
    assert!(peak.load(Ordering::SeqCst) >= 1);
}
