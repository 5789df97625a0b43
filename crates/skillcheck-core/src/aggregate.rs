//! Reduction of per-answer evaluations into a summary.

use serde::{Deserialize, Serialize};

use crate::model::AnswerEvaluation;

/// Totals over an evaluation set. All integers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationSummary {
    pub total_text_score: u32,
    pub total_max_score: u32,
    /// `round(total_text_score / total_max_score * 100)`, or 0 with no marks.
    pub percentage: u32,
    pub answers_evaluated: u32,
}

/// Sum scores and compute the percentage. Empty input yields a zeroed summary.
pub fn aggregate(evaluations: &[AnswerEvaluation]) -> EvaluationSummary {
    let (total_text_score, total_max_score) = evaluations.iter().fold((0u32, 0u32), |(score, max), e| {
        (score.saturating_add(e.total_score), max.saturating_add(e.max_score))
    });
    EvaluationSummary {
        total_text_score,
        total_max_score,
        percentage: percentage(total_text_score, total_max_score),
        answers_evaluated: evaluations.len() as u32,
    }
}

/// Integer percentage, rounding halves up.
pub fn percentage(score: u32, max: u32) -> u32 {
    if max == 0 {
        return 0;
    }
    let (score, max) = (score as u64, max as u64);
    ((score * 200 + max) / (max * 2)) as u32
}
