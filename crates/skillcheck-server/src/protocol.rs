//! Request and response bodies of the HTTP API.

use serde::{Deserialize, Serialize};

use skillcheck_core::aggregate::EvaluationSummary;
use skillcheck_core::model::{AnswerEvaluation, TextAnswer};
use skillcheck_core::skills::SkillSuggestion;

#[derive(Debug, Serialize)]
pub struct HealthOut {
    pub ok: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct SkillsIn {
    #[serde(default)]
    pub specialization: Option<String>,
    #[serde(default)]
    pub qualification: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SkillsOut {
    pub success: bool,
    #[serde(flatten)]
    pub skills: SkillSuggestion,
}

#[derive(Debug, Deserialize)]
pub struct EvaluateIn {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub test_id: Option<String>,
    #[serde(default)]
    pub text_responses: Vec<TextAnswer>,
}

#[derive(Debug, Serialize)]
pub struct EvaluateOut {
    pub success: bool,
    pub user_id: Option<String>,
    pub test_id: Option<String>,
    pub summary: EvaluationSummary,
    pub evaluations: Vec<AnswerEvaluation>,
}
