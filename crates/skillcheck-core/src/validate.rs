//! Structural checks on parsed model output.
//!
//! Parsing only proves the text was JSON of roughly the right shape. These
//! checks enforce the invariants the rest of the pipeline relies on.

use std::collections::HashSet;

use crate::error::AssessmentError;
use crate::model::{BatchMetadata, GeneratedBatch, Question};

/// A batch that passed validation, with metadata recomputed from its questions.
#[derive(Debug, Clone)]
pub struct ValidatedBatch {
    pub questions: Vec<Question>,
    pub metadata: BatchMetadata,
}

/// Validate one generated batch against the number of questions requested.
pub fn validate_batch(batch: GeneratedBatch, expected: u32) -> Result<ValidatedBatch, AssessmentError> {
    let GeneratedBatch {
        questions,
        batch_metadata,
    } = batch;

    if questions.len() as u32 != expected {
        return Err(AssessmentError::SchemaViolation(format!(
            "expected {expected} questions, got {}",
            questions.len()
        )));
    }
    for (i, q) in questions.iter().enumerate() {
        validate_question(q).map_err(|msg| {
            AssessmentError::SchemaViolation(format!("question {} of batch: {msg}", i + 1))
        })?;
    }

    let mut metadata = BatchMetadata::from_questions(&questions);
    if let Some(reported) = batch_metadata {
        if reported.questions_count != metadata.questions_count
            || reported.total_marks != metadata.total_marks
            || reported.difficulty_counts != metadata.difficulty_counts
            || reported.type_counts != metadata.type_counts
        {
            tracing::debug!(
                reported_count = reported.questions_count,
                actual_count = metadata.questions_count,
                reported_marks = reported.total_marks,
                actual_marks = metadata.total_marks,
                "batch metadata disagrees with questions, using recomputed counts"
            );
        }
        if reported.questions_summary.len() == questions.len()
            && reported.questions_summary.iter().all(|s| !s.trim().is_empty())
        {
            metadata.questions_summary = reported.questions_summary;
        }
    }

    Ok(ValidatedBatch {
        questions,
        metadata,
    })
}

fn validate_question(q: &Question) -> Result<(), String> {
    if q.text().trim().is_empty() {
        return Err("empty question text".into());
    }
    if q.points() == 0 {
        return Err("points must be positive".into());
    }
    match q {
        Question::Mcq(mcq) => {
            if mcq.options.len() < 2 {
                return Err(format!("mcq has {} option(s), need at least 2", mcq.options.len()));
            }
            let mut ids = HashSet::new();
            for opt in &mcq.options {
                if opt.option_id.trim().is_empty() {
                    return Err("mcq option with empty option_id".into());
                }
                if !ids.insert(opt.option_id.as_str()) {
                    return Err(format!("duplicate option_id {:?}", opt.option_id));
                }
            }
            if !ids.contains(mcq.correct_answer.as_str()) {
                return Err(format!(
                    "correct_answer {:?} is not one of the option ids",
                    mcq.correct_answer
                ));
            }
        }
        Question::Text(text) => {
            if text.evaluation_rubric.criteria.is_empty() {
                return Err("text question has an empty rubric".into());
            }
            if text.max_words == 0 {
                return Err("max_words must be positive".into());
            }
        }
    }
    Ok(())
}
