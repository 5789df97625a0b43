//! Generation and evaluation pipeline tests driven by the mock provider.
//!
//! These exercise the orchestrator, evaluator, and suggester end to end
//! without network access.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use skillcheck_core::aggregate::aggregate;
use skillcheck_core::client::{GenerationClient, ModelSettings};
use skillcheck_core::context::ContextStrategyKind;
use skillcheck_core::evaluator::RubricEvaluator;
use skillcheck_core::model::{EvaluationRubric, GenerationSpec, Level, Question, RubricCriterion, TextAnswer};
use skillcheck_core::orchestrator::{BatchOrchestrator, OrchestratorConfig};
use skillcheck_core::progress::{ChannelSink, NoopSink, ProgressEvent};
use skillcheck_core::skills::SkillSuggester;
use skillcheck_core::AssessmentError;
use skillcheck_providers::mock::{batch_response, MockProvider, MockReply};
use tokio::sync::mpsc::UnboundedReceiver;

fn client(provider: &Arc<MockProvider>) -> GenerationClient {
    GenerationClient::new(provider.clone(), ModelSettings::default())
}

fn orchestrator(provider: &Arc<MockProvider>) -> BatchOrchestrator {
    BatchOrchestrator::new(
        client(provider),
        OrchestratorConfig {
            batch_delay: Duration::ZERO,
            ..Default::default()
        },
    )
}

fn spec(level: Level) -> GenerationSpec {
    GenerationSpec {
        specialization: Some("Software Engineering".into()),
        qualification: Some("bachelors".into()),
        skill: "Rust".into(),
        level,
    }
}

fn drain(rx: &mut UnboundedReceiver<ProgressEvent>) -> Vec<ProgressEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

fn kinds(events: &[ProgressEvent]) -> Vec<&'static str> {
    events.iter().map(ProgressEvent::kind).collect()
}

fn sns(questions: &[Question]) -> Vec<u32> {
    questions.iter().map(Question::question_sn).collect()
}

// --- Generation ---

#[tokio::test]
async fn beginner_is_one_batch_without_context() {
    let provider = Arc::new(MockProvider::with_script([MockReply::Text(batch_response("alpha", 10))]));
    let (sink, mut rx) = ChannelSink::pair();

    let result = orchestrator(&provider).run(spec(Level::Beginner), &sink).await.unwrap();

    assert_eq!(provider.call_count(), 1);
    let prompt = &provider.prompts()[0];
    assert!(prompt.contains("EXACTLY 10 questions"));
    assert!(!prompt.contains("PREVIOUSLY GENERATED"));

    assert_eq!(result.total_questions, 10);
    assert_eq!(result.total_batches, 1);
    assert_eq!(sns(&result.questions), (1..=10).collect::<Vec<_>>());
    assert_eq!(
        kinds(&drain(&mut rx)),
        vec!["started", "batch_start", "batch_complete", "complete"]
    );
}

#[tokio::test]
async fn expert_second_batch_carries_full_history() {
    let provider = Arc::new(MockProvider::with_script([
        MockReply::Text(batch_response("alpha", 20)),
        MockReply::Text(batch_response("beta", 10)),
    ]));
    let (sink, mut rx) = ChannelSink::pair();

    let result = orchestrator(&provider).run(spec(Level::Expert), &sink).await.unwrap();

    assert_eq!(provider.call_count(), 2);
    let prompts = provider.prompts();
    assert!(prompts[0].contains("EXACTLY 20 questions numbered 1 to 20"));
    assert!(prompts[1].contains("EXACTLY 10 questions numbered 21 to 30"));

    let second = &prompts[1];
    assert!(second.contains("PREVIOUSLY GENERATED QUESTIONS (20 so far across 1 batch(es))"));
    for i in 1..=20 {
        assert!(second.contains(&format!("{i}. alpha topic {i}\n")), "missing summary {i}");
    }
    // alpha batch: 6 hard text (10 pts), 7 medium mcq (2 pts), 7 easy mcq (1 pt)
    assert!(second.contains("easy=7, medium=7, hard=6"));
    assert!(second.contains("mcq=14, text=6"));
    assert!(second.contains("Total marks: 81"));

    assert_eq!(sns(&result.questions), (1..=30).collect::<Vec<_>>());
    assert_eq!(result.statistics.total_questions, 30);
    assert_eq!(result.statistics.type_counts.text, 6 + 3);
    assert_eq!(
        result.statistics.total_marks,
        result.questions.iter().map(Question::points).sum::<u32>()
    );

    let events = drain(&mut rx);
    assert_eq!(
        kinds(&events),
        vec!["started", "batch_start", "batch_complete", "batch_start", "batch_complete", "complete"]
    );
    match &events[3] {
        ProgressEvent::BatchStart {
            questions_to_generate,
            progress,
            ..
        } => {
            assert_eq!(*questions_to_generate, 10);
            assert_eq!(*progress, 50);
        }
        other => panic!("expected batch_start, got {other:?}"),
    }
    match events.last() {
        Some(ProgressEvent::Complete { test, progress }) => {
            assert_eq!(test.test_id, result.test_id);
            assert_eq!(*progress, 100);
        }
        other => panic!("expected complete, got {other:?}"),
    }
}

#[tokio::test]
async fn malformed_second_batch_fails_whole_request() {
    let provider = Arc::new(MockProvider::with_script([
        MockReply::Text(batch_response("alpha", 20)),
        MockReply::Text("I'm sorry, I cannot produce more questions right now.".into()),
    ]));
    let (sink, mut rx) = ChannelSink::pair();

    let failure = orchestrator(&provider)
        .run(spec(Level::Expert), &sink)
        .await
        .unwrap_err();

    match &failure.error {
        AssessmentError::MalformedResponse { excerpt, .. } => {
            assert!(excerpt.contains("cannot produce"));
        }
        other => panic!("expected MalformedResponse, got {other:?}"),
    }

    let events = drain(&mut rx);
    assert_eq!(
        kinds(&events),
        vec!["started", "batch_start", "batch_complete", "batch_start", "error"]
    );
    match events.last() {
        Some(ProgressEvent::Error { kind, .. }) => assert_eq!(kind, "malformed_response"),
        other => panic!("expected error, got {other:?}"),
    }

    // completed work is kept in the checkpoint, not in a partial result
    assert_eq!(failure.checkpoint.questions.len(), 20);
    assert_eq!(failure.checkpoint.completed_batches(), 1);
}

#[tokio::test]
async fn resume_regenerates_only_missing_batches() {
    let first = Arc::new(MockProvider::with_script([
        MockReply::Text(batch_response("alpha", 20)),
        MockReply::Fail("upstream 503".into()),
    ]));
    let failure = orchestrator(&first)
        .run(spec(Level::Specialist), &NoopSink)
        .await
        .unwrap_err();
    assert_eq!(failure.error.kind(), "transport_failure");

    // the checkpoint survives a serde round trip, as the CLI stores it on disk
    let saved = serde_json::to_string(&failure.checkpoint).unwrap();
    let checkpoint = serde_json::from_str(&saved).unwrap();

    let second = Arc::new(MockProvider::with_script([MockReply::Text(batch_response("beta", 20))]));
    let (sink, mut rx) = ChannelSink::pair();
    let result = orchestrator(&second).resume(checkpoint, &sink).await.unwrap();

    assert_eq!(second.call_count(), 1);
    assert!(second.prompts()[0].contains("20. alpha topic 20"));
    assert!(second.prompts()[0].contains("batch 2 of 2"));
    assert_eq!(sns(&result.questions), (1..=40).collect::<Vec<_>>());
    assert_eq!(
        kinds(&drain(&mut rx)),
        vec!["started", "batch_start", "batch_complete", "complete"]
    );
}

#[tokio::test]
async fn short_batch_is_schema_violation() {
    let provider = Arc::new(MockProvider::with_script([MockReply::Text(batch_response("alpha", 9))]));
    let (sink, _rx) = ChannelSink::pair();
    let failure = orchestrator(&provider)
        .run(spec(Level::Beginner), &sink)
        .await
        .unwrap_err();
    assert!(matches!(failure.error, AssessmentError::SchemaViolation(_)));
    assert!(failure.checkpoint.questions.is_empty());
}

#[tokio::test]
async fn dropped_receiver_stops_generation() {
    let provider = Arc::new(MockProvider::with_script([
        MockReply::Text(batch_response("alpha", 20)),
        MockReply::Text(batch_response("beta", 20)),
    ]));
    let (sink, rx) = ChannelSink::pair();
    drop(rx);

    let failure = orchestrator(&provider)
        .run(spec(Level::Specialist), &sink)
        .await
        .unwrap_err();
    assert!(matches!(failure.error, AssessmentError::Cancelled));
    assert_eq!(provider.call_count(), 0);
}

#[tokio::test]
async fn rolling_digest_bounds_the_second_prompt() {
    let provider = Arc::new(MockProvider::with_script([
        MockReply::Text(batch_response("alpha", 20)),
        MockReply::Text(batch_response("beta", 20)),
    ]));
    let orchestrator = BatchOrchestrator::new(
        client(&provider),
        OrchestratorConfig {
            batch_delay: Duration::ZERO,
            context_strategy: ContextStrategyKind::RollingDigest,
            digest_window: 5,
        },
    );
    orchestrator.run(spec(Level::Specialist), &NoopSink).await.unwrap();

    let second = &provider.prompts()[1];
    assert!(second.contains("15 older questions omitted"));
    assert!(second.contains("16. alpha topic 16"));
    assert!(!second.contains("15. alpha topic 15\n"));
    assert!(second.contains("Total marks: 81"));
}

// --- Evaluation ---

fn text_answer(sn: u32, answer: serde_json::Value) -> TextAnswer {
    TextAnswer {
        question_sn: sn,
        question: "Explain how the borrow checker prevents use-after-free.".into(),
        answer,
        points: 10,
        difficulty: None,
        evaluation_rubric: EvaluationRubric {
            criteria: vec![
                RubricCriterion { criterion: "Accuracy".into(), weight: 30 },
                RubricCriterion { criterion: "Depth".into(), weight: 30 },
                RubricCriterion { criterion: "Examples".into(), weight: 25 },
                RubricCriterion { criterion: "Clarity".into(), weight: 15 },
            ],
        },
        max_words: Some(100),
    }
}

const LONG_ANSWER: &str = "The borrow checker tracks lifetimes of references and rejects any \
    program where a reference could outlive the value it points to, so freed memory is never read.";

fn evaluation_reply() -> String {
    json!({
        "total_score": 7.6,
        "criterion_scores": [
            {"criterion": "Accuracy", "score": 2.6, "max_score": 3, "feedback": "Correct."},
            {"criterion": "Depth", "score": 2.4, "max_score": 3, "feedback": "Some depth."},
            {"criterion": "Examples", "score": 1.5, "max_score": 3, "feedback": "No example."},
            {"criterion": "Clarity", "score": 2, "max_score": 2, "feedback": "Clear."}
        ],
        "overall_feedback": "Solid answer.",
        "strengths": ["accurate"],
        "improvements": ["add an example"]
    })
    .to_string()
}

#[tokio::test]
async fn short_answers_never_call_the_provider() {
    let provider = Arc::new(MockProvider::failing("must not be called"));
    let evaluator = RubricEvaluator::new(client(&provider));

    let answers = vec![
        text_answer(1, json!("too short")),
        text_answer(2, json!("\"nine words is still not quite enough here ok\"")),
        text_answer(3, json!({"text": ""})),
    ];
    let evaluations = evaluator.evaluate_all(&answers).await.unwrap();

    assert_eq!(provider.call_count(), 0);
    assert!(evaluations.iter().all(|e| e.total_score == 0));
    let maxima: Vec<u32> = evaluations[0].criterion_scores.iter().map(|c| c.max_score).collect();
    assert_eq!(maxima, vec![3, 3, 3, 2]);
    assert_eq!(aggregate(&evaluations).percentage, 0);
}

#[tokio::test]
async fn model_scores_are_forced_to_integers() {
    let provider = Arc::new(MockProvider::with_fixed_response(&format!("```json\n{}\n```", evaluation_reply())));
    let evaluator = RubricEvaluator::new(client(&provider));

    let answers = vec![
        text_answer(4, json!(LONG_ANSWER)),
        text_answer(5, json!({"answer": LONG_ANSWER})),
    ];
    let evaluations = evaluator.evaluate_all(&answers).await.unwrap();

    assert_eq!(provider.call_count(), 2);
    assert!(provider.prompts()[0].contains("Examples (weight 25%, max 3 points)"));
    assert_eq!(evaluations[0].question_sn, 4);
    assert_eq!(evaluations[1].question_sn, 5);

    let scores: Vec<u32> = evaluations[0].criterion_scores.iter().map(|c| c.score).collect();
    assert_eq!(scores, vec![3, 2, 2, 2]);
    for eval in &evaluations {
        // reported 7.6 rounds to 8
        assert_eq!(eval.total_score, 8);
        assert!(eval.total_score <= eval.max_score);
        assert!(eval.criterion_scores.iter().all(|c| c.score <= c.max_score));
    }

    let summary = aggregate(&evaluations);
    assert_eq!(summary.total_text_score, 16);
    assert_eq!(summary.total_max_score, 20);
    assert_eq!(summary.percentage, 80);
}

#[tokio::test]
async fn unscorable_rubrics_are_rejected_before_any_call() {
    let provider = Arc::new(MockProvider::with_fixed_response(
        &json!({"total_score": 7.4, "criterion_scores": []}).to_string(),
    ));
    let evaluator = RubricEvaluator::new(client(&provider));

    let mut no_rubric = text_answer(11, json!(LONG_ANSWER));
    no_rubric.evaluation_rubric.criteria.clear();
    let err = evaluator.evaluate(&no_rubric).await.unwrap_err();
    assert_eq!(err.kind(), "invalid_spec");
    assert_eq!(err.question_sn(), Some(11));

    let mut huge = text_answer(12, json!("short"));
    huge.points = 50_000_000;
    huge.evaluation_rubric.criteria = vec![RubricCriterion { criterion: "All".into(), weight: 100 }];
    let err = evaluator.evaluate_all(&[huge]).await.unwrap_err();
    assert_eq!(err.kind(), "invalid_spec");
    assert_eq!(err.question_sn(), Some(12));

    assert_eq!(provider.call_count(), 0);
}

#[tokio::test]
async fn one_bad_evaluation_fails_the_set() {
    let provider = Arc::new(MockProvider::new(vec![
        ("QUESTION: Bad".to_string(), "not json at all".to_string()),
        ("QUESTION:".to_string(), evaluation_reply()),
    ]));
    let evaluator = RubricEvaluator::new(client(&provider));

    let mut bad = text_answer(8, json!(LONG_ANSWER));
    bad.question = "Bad question".into();
    let answers = vec![text_answer(7, json!(LONG_ANSWER)), bad];

    let err = evaluator.evaluate_all(&answers).await.unwrap_err();
    assert_eq!(err.question_sn(), Some(8));
    assert_eq!(err.kind(), "malformed_response");
}

#[tokio::test]
async fn missing_criterion_scores_are_a_schema_violation() {
    let reply = json!({
        "total_score": 5,
        "criterion_scores": [{"criterion": "Accuracy", "score": 3}]
    });
    let provider = Arc::new(MockProvider::with_fixed_response(&reply.to_string()));
    let evaluator = RubricEvaluator::new(client(&provider));

    let err = evaluator.evaluate(&text_answer(2, json!(LONG_ANSWER))).await.unwrap_err();
    assert_eq!(err.kind(), "schema_violation");
    assert_eq!(err.question_sn(), Some(2));
}

// --- Skill suggestion ---

#[tokio::test]
async fn suggests_skills_from_fenced_reply() {
    let provider = Arc::new(MockProvider::with_fixed_response(
        "```json\n{\"softSkills\": [\"Communication\", \" \"], \"techSkills\": [\"Rust\", \"SQL\"]}\n```",
    ));
    let suggester = SkillSuggester::new(client(&provider));

    let suggestion = suggester.suggest("Computer Science", "masters").await.unwrap();
    assert_eq!(suggestion.soft_skills, vec!["Communication".to_string()]);
    assert_eq!(suggestion.tech_skills.len(), 2);
    assert!(provider.prompts()[0].contains("Computer Science"));

    let err = suggester.suggest("", "masters").await.unwrap_err();
    assert_eq!(err.kind(), "invalid_spec");
    assert_eq!(provider.call_count(), 1);
}
