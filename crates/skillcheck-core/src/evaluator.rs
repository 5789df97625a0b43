//! Rubric-based scoring of free-text answers.
//!
//! Answers shorter than `FAST_PATH_MIN_WORDS` are scored zero locally and
//! never reach the provider. Everything the model returns is forced to
//! integers and clamped to the rubric's maxima before it leaves this module.

use futures::future::try_join_all;
use serde::{Deserialize, Deserializer};

use crate::client::GenerationClient;
use crate::error::AssessmentError;
use crate::model::{AnswerEvaluation, CriterionScore, TextAnswer};
use crate::prompt::evaluation_prompt;
use crate::sanitize::parse_model_json;

/// Answers with fewer words than this skip the external call.
pub const FAST_PATH_MIN_WORDS: u32 = 10;

const FAST_PATH_CRITERION_FEEDBACK: &str = "Answer too short to evaluate.";
const FAST_PATH_OVERALL_FEEDBACK: &str =
    "The answer is too short to be evaluated. At least 10 words are required.";
const FAST_PATH_IMPROVEMENTS: [&str; 2] = [
    "Write a complete answer that addresses the question directly.",
    "Explain your reasoning and support it with relevant examples.",
];

/// Scores text answers against their rubrics.
pub struct RubricEvaluator {
    client: GenerationClient,
}

impl RubricEvaluator {
    pub fn new(client: GenerationClient) -> Self {
        Self { client }
    }

    /// Evaluate every answer concurrently. The first failure fails the set.
    ///
    /// Results are in input order.
    pub async fn evaluate_all(&self, answers: &[TextAnswer]) -> Result<Vec<AnswerEvaluation>, AssessmentError> {
        tracing::info!(answers = answers.len(), "evaluating text answers");
        try_join_all(answers.iter().map(|a| self.evaluate(a))).await
    }

    /// Evaluate one answer. Errors are tagged with the answer's `question_sn`.
    pub async fn evaluate(&self, answer: &TextAnswer) -> Result<AnswerEvaluation, AssessmentError> {
        let wrap = |source: AssessmentError| AssessmentError::Evaluation {
            question_sn: answer.question_sn,
            source: Box::new(source),
        };
        answer.validate().map_err(wrap)?;

        let text = decode_answer(&answer.answer);
        let words = word_count(&text);

        if words < FAST_PATH_MIN_WORDS {
            tracing::debug!(question_sn = answer.question_sn, words, "short answer, skipping model call");
            return Ok(fast_path(answer, words));
        }

        let prompt = evaluation_prompt(answer, &text, words);
        let raw = self.client.complete(prompt).await.map_err(wrap)?;
        let parsed: RawEvaluation = parse_model_json(&raw).map_err(wrap)?;
        normalize(answer, words, parsed).map_err(wrap)
    }
}

/// Decode an answer that may be plain text, a JSON-encoded string, or an
/// object carrying `text` or `answer`.
pub fn decode_answer(value: &serde_json::Value) -> String {
    use serde_json::Value;

    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.starts_with('"') || trimmed.starts_with('{') {
                match serde_json::from_str::<Value>(trimmed) {
                    Ok(inner @ Value::String(_)) => return decode_answer(&inner),
                    Ok(Value::Object(map)) => {
                        if let Some(field) = answer_field(&map) {
                            return decode_answer(field);
                        }
                    }
                    _ => {}
                }
            }
            s.clone()
        }
        // an object without a known key is the candidate's literal answer
        Value::Object(map) => match answer_field(map) {
            Some(field) => decode_answer(field),
            None => value.to_string(),
        },
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn answer_field(map: &serde_json::Map<String, serde_json::Value>) -> Option<&serde_json::Value> {
    map.get("text").or_else(|| map.get("answer"))
}

/// Whitespace-separated word count.
pub fn word_count(text: &str) -> u32 {
    text.split_whitespace().count() as u32
}

/// Zero score without calling the model.
pub fn fast_path(answer: &TextAnswer, words: u32) -> AnswerEvaluation {
    let maxima = answer.evaluation_rubric.max_scores(answer.points);
    let criterion_scores = answer
        .evaluation_rubric
        .criteria
        .iter()
        .zip(maxima)
        .map(|(c, max_score)| CriterionScore {
            criterion: c.criterion.clone(),
            score: 0,
            max_score,
            feedback: FAST_PATH_CRITERION_FEEDBACK.to_string(),
        })
        .collect();

    AnswerEvaluation {
        question_sn: answer.question_sn,
        total_score: 0,
        max_score: answer.points,
        word_count: words,
        criterion_scores,
        overall_feedback: FAST_PATH_OVERALL_FEEDBACK.to_string(),
        strengths: Vec::new(),
        improvements: FAST_PATH_IMPROVEMENTS.iter().map(|s| s.to_string()).collect(),
    }
}

/// Evaluation as the model returns it. Numbers may be fractional or quoted.
#[derive(Debug, Deserialize)]
struct RawEvaluation {
    #[serde(default, deserialize_with = "lenient_number")]
    total_score: Option<f64>,
    #[serde(default)]
    criterion_scores: Vec<RawCriterionScore>,
    #[serde(default)]
    overall_feedback: String,
    #[serde(default)]
    strengths: Vec<String>,
    #[serde(default)]
    improvements: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawCriterionScore {
    #[serde(default)]
    criterion: String,
    #[serde(default, deserialize_with = "lenient_number")]
    score: Option<f64>,
    #[serde(default)]
    feedback: String,
}

fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde_json::Value;

    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    })
}

/// Round half away from zero and clamp into `[0, max]`.
fn to_score(value: f64, max: u32) -> u32 {
    if !value.is_finite() || value <= 0.0 {
        return 0;
    }
    (value.round() as u64).min(max as u64) as u32
}

fn normalize(answer: &TextAnswer, words: u32, raw: RawEvaluation) -> Result<AnswerEvaluation, AssessmentError> {
    let rubric = &answer.evaluation_rubric;
    if raw.criterion_scores.len() != rubric.criteria.len() {
        return Err(AssessmentError::SchemaViolation(format!(
            "expected {} criterion scores, got {}",
            rubric.criteria.len(),
            raw.criterion_scores.len()
        )));
    }

    let maxima = rubric.max_scores(answer.points);
    let criterion_scores: Vec<CriterionScore> = rubric
        .criteria
        .iter()
        .zip(maxima)
        .zip(raw.criterion_scores)
        .map(|((criterion, max_score), scored)| {
            if !scored.criterion.is_empty() && scored.criterion != criterion.criterion {
                tracing::debug!(
                    expected = %criterion.criterion,
                    returned = %scored.criterion,
                    "criterion name mismatch, keeping rubric order"
                );
            }
            CriterionScore {
                criterion: criterion.criterion.clone(),
                score: to_score(scored.score.unwrap_or(0.0), max_score),
                max_score,
                feedback: scored.feedback,
            }
        })
        .collect();

    let criterion_total = criterion_scores
        .iter()
        .fold(0u32, |acc, c| acc.saturating_add(c.score));
    let total_score = match raw.total_score {
        Some(reported) => {
            let total = to_score(reported, answer.points);
            if total != criterion_total.min(answer.points) {
                tracing::debug!(
                    question_sn = answer.question_sn,
                    reported,
                    criterion_total,
                    "model total differs from criterion sum"
                );
            }
            total
        }
        None => criterion_total.min(answer.points),
    };

    Ok(AnswerEvaluation {
        question_sn: answer.question_sn,
        total_score,
        max_score: answer.points,
        word_count: words,
        criterion_scores,
        overall_feedback: raw.overall_feedback,
        strengths: raw.strengths,
        improvements: raw.improvements,
    })
}
