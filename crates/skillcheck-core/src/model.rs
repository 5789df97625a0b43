//! Core data model types for skillcheck.
//!
//! These are the fundamental types the pipeline uses to describe a requested
//! test, the questions a generation batch produces, and the per-answer
//! evaluation results.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AssessmentError;

/// Maximum number of questions requested from the model in one call.
pub const BATCH_SIZE: u32 = 20;

// ---------------------------------------------------------------------------
// Generation input
// ---------------------------------------------------------------------------

/// Proficiency tier of a requested test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Level {
    Beginner,
    Intermediate,
    Advanced,
    Expert,
    Specialist,
}

impl Level {
    pub const ALL: [Level; 5] = [
        Level::Beginner,
        Level::Intermediate,
        Level::Advanced,
        Level::Expert,
        Level::Specialist,
    ];

    /// Number of questions in a test of this level.
    pub fn total_questions(self) -> u32 {
        match self {
            Level::Beginner => 10,
            Level::Intermediate => 15,
            Level::Advanced => 20,
            Level::Expert => 30,
            Level::Specialist => 40,
        }
    }

    /// Number of generation calls needed for a test of this level.
    pub fn batch_count(self) -> u32 {
        self.total_questions().div_ceil(BATCH_SIZE)
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Level::Beginner => "Beginner",
            Level::Intermediate => "Intermediate",
            Level::Advanced => "Advanced",
            Level::Expert => "Expert",
            Level::Specialist => "Specialist",
        };
        f.write_str(name)
    }
}

impl FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "beginner" => Ok(Level::Beginner),
            "intermediate" => Ok(Level::Intermediate),
            "advanced" => Ok(Level::Advanced),
            "expert" => Ok(Level::Expert),
            "specialist" => Ok(Level::Specialist),
            other => Err(format!("unknown level: {other}")),
        }
    }
}

/// A test request as it arrives from a client. Nothing is trusted yet.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TestRequest {
    #[serde(default)]
    pub specialization: Option<String>,
    #[serde(default)]
    pub qualification: Option<String>,
    #[serde(default)]
    pub skill: Option<String>,
    #[serde(default)]
    pub level: Option<String>,
}

impl TestRequest {
    /// Check required fields and resolve the level.
    pub fn validate(&self) -> Result<GenerationSpec, AssessmentError> {
        let skill = non_blank(&self.skill)
            .ok_or_else(|| AssessmentError::InvalidSpec("skill is required".into()))?;
        let level_str = non_blank(&self.level)
            .ok_or_else(|| AssessmentError::InvalidSpec("level is required".into()))?;
        let level = level_str.parse::<Level>().map_err(AssessmentError::InvalidSpec)?;

        Ok(GenerationSpec {
            specialization: non_blank(&self.specialization),
            qualification: non_blank(&self.qualification),
            skill,
            level,
        })
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Validated, immutable description of the test to generate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationSpec {
    pub specialization: Option<String>,
    pub qualification: Option<String>,
    pub skill: String,
    pub level: Level,
}

// ---------------------------------------------------------------------------
// Questions
// ---------------------------------------------------------------------------

/// Question difficulty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[serde(alias = "Easy", alias = "EASY")]
    Easy,
    #[serde(alias = "Medium", alias = "MEDIUM")]
    Medium,
    #[serde(alias = "Hard", alias = "HARD")]
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Difficulty::Easy => write!(f, "easy"),
            Difficulty::Medium => write!(f, "medium"),
            Difficulty::Hard => write!(f, "hard"),
        }
    }
}

/// One selectable option of a multiple-choice question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McqOption {
    pub option: String,
    pub option_id: String,
}

/// A multiple-choice question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McqQuestion {
    /// 1-based position in the whole test. Assigned by the orchestrator.
    #[serde(default)]
    pub question_sn: u32,
    pub question: String,
    pub options: Vec<McqOption>,
    /// `option_id` of the correct option.
    pub correct_answer: String,
    pub difficulty: Difficulty,
    pub points: u32,
}

/// A free-text question scored against a rubric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextQuestion {
    #[serde(default)]
    pub question_sn: u32,
    pub question: String,
    pub difficulty: Difficulty,
    pub points: u32,
    pub max_words: u32,
    pub evaluation_rubric: EvaluationRubric,
}

/// A generated question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Question {
    #[serde(alias = "MCQ", alias = "multiple_choice")]
    Mcq(McqQuestion),
    #[serde(alias = "TEXT", alias = "short_answer")]
    Text(TextQuestion),
}

impl Question {
    pub fn question_sn(&self) -> u32 {
        match self {
            Question::Mcq(q) => q.question_sn,
            Question::Text(q) => q.question_sn,
        }
    }

    pub fn set_question_sn(&mut self, sn: u32) {
        match self {
            Question::Mcq(q) => q.question_sn = sn,
            Question::Text(q) => q.question_sn = sn,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Question::Mcq(q) => &q.question,
            Question::Text(q) => &q.question,
        }
    }

    pub fn difficulty(&self) -> Difficulty {
        match self {
            Question::Mcq(q) => q.difficulty,
            Question::Text(q) => q.difficulty,
        }
    }

    pub fn points(&self) -> u32 {
        match self {
            Question::Mcq(q) => q.points,
            Question::Text(q) => q.points,
        }
    }

    pub fn is_mcq(&self) -> bool {
        matches!(self, Question::Mcq(_))
    }
}

/// One weighted scoring criterion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RubricCriterion {
    pub criterion: String,
    /// Share of the question's points, in percent.
    pub weight: u32,
}

/// Weighted criteria attached to a text question.
///
/// Weights are expected to sum to 100 but this is not enforced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRubric {
    #[serde(default)]
    pub criteria: Vec<RubricCriterion>,
}

impl EvaluationRubric {
    pub fn weight_total(&self) -> u32 {
        self.criteria
            .iter()
            .fold(0u32, |acc, c| acc.saturating_add(c.weight))
    }

    /// Per-criterion maximum points for a question worth `points`.
    pub fn max_scores(&self, points: u32) -> Vec<u32> {
        self.criteria
            .iter()
            .map(|c| criterion_max_score(points, c.weight))
            .collect()
    }
}

/// `round(points * weight / 100)`, rounding halves up.
///
/// Allocations are not rebalanced, so the per-criterion maxima may sum to
/// more or less than `points` when rounding accumulates.
pub fn criterion_max_score(points: u32, weight: u32) -> u32 {
    let max = (points as u64 * weight as u64 + 50) / 100;
    max.min(u32::MAX as u64) as u32
}

// ---------------------------------------------------------------------------
// Batch bookkeeping
// ---------------------------------------------------------------------------

/// Counts per difficulty.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DifficultyCounts {
    #[serde(default)]
    pub easy: u32,
    #[serde(default)]
    pub medium: u32,
    #[serde(default)]
    pub hard: u32,
}

impl DifficultyCounts {
    pub fn record(&mut self, difficulty: Difficulty) {
        match difficulty {
            Difficulty::Easy => self.easy += 1,
            Difficulty::Medium => self.medium += 1,
            Difficulty::Hard => self.hard += 1,
        }
    }

    pub fn add(&mut self, other: &DifficultyCounts) {
        self.easy += other.easy;
        self.medium += other.medium;
        self.hard += other.hard;
    }
}

/// Counts per question type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeCounts {
    #[serde(default)]
    pub mcq: u32,
    #[serde(default)]
    pub text: u32,
}

impl TypeCounts {
    pub fn add(&mut self, other: &TypeCounts) {
        self.mcq += other.mcq;
        self.text += other.text;
    }
}

/// Summary of one generated batch, kept in the orchestrator's history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchMetadata {
    /// One short line per question, in question order.
    #[serde(default)]
    pub questions_summary: Vec<String>,
    #[serde(default)]
    pub questions_count: u32,
    #[serde(default)]
    pub difficulty_counts: DifficultyCounts,
    #[serde(default)]
    pub type_counts: TypeCounts,
    #[serde(default)]
    pub total_marks: u32,
}

impl BatchMetadata {
    /// Metadata computed from the questions themselves.
    pub fn from_questions(questions: &[Question]) -> Self {
        let mut meta = BatchMetadata {
            questions_count: questions.len() as u32,
            ..Default::default()
        };
        for q in questions {
            meta.difficulty_counts.record(q.difficulty());
            if q.is_mcq() {
                meta.type_counts.mcq += 1;
            } else {
                meta.type_counts.text += 1;
            }
            meta.total_marks += q.points();
        }
        meta.questions_summary = questions.iter().map(|q| q.text().to_string()).collect();
        meta
    }
}

/// Raw shape of one generation call's output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedBatch {
    pub questions: Vec<Question>,
    #[serde(default)]
    pub batch_metadata: Option<BatchMetadata>,
}

/// Totals across every batch of a test.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestStatistics {
    pub total_questions: u32,
    pub difficulty_counts: DifficultyCounts,
    pub type_counts: TypeCounts,
    pub total_marks: u32,
}

impl TestStatistics {
    /// Sum every field of every batch.
    pub fn from_history(history: &[BatchMetadata]) -> Self {
        let mut stats = TestStatistics::default();
        for batch in history {
            stats.total_questions += batch.questions_count;
            stats.difficulty_counts.add(&batch.difficulty_counts);
            stats.type_counts.add(&batch.type_counts);
            stats.total_marks += batch.total_marks;
        }
        stats
    }
}

/// A fully generated test.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestResult {
    pub test_id: String,
    pub level: Level,
    pub skill: String,
    #[serde(default)]
    pub specialization: Option<String>,
    #[serde(default)]
    pub qualification: Option<String>,
    pub total_questions: u32,
    pub total_batches: u32,
    pub questions: Vec<Question>,
    pub statistics: TestStatistics,
    pub generated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

/// A submitted free-text answer together with the question it answers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextAnswer {
    pub question_sn: u32,
    pub question: String,
    /// Plain text, a JSON-encoded string, or `{ "text": ... }`.
    #[serde(default)]
    pub answer: serde_json::Value,
    pub points: u32,
    #[serde(default)]
    pub difficulty: Option<Difficulty>,
    pub evaluation_rubric: EvaluationRubric,
    #[serde(default)]
    pub max_words: Option<u32>,
}

/// Largest `points` value accepted for a single text answer.
pub const MAX_QUESTION_POINTS: u32 = 1_000;

impl TextAnswer {
    /// Reject answers whose rubric cannot be scored.
    pub fn validate(&self) -> Result<(), AssessmentError> {
        if self.points > MAX_QUESTION_POINTS {
            return Err(AssessmentError::InvalidSpec(format!(
                "points must be at most {MAX_QUESTION_POINTS}, got {}",
                self.points
            )));
        }
        if self.evaluation_rubric.criteria.is_empty() {
            return Err(AssessmentError::InvalidSpec(
                "evaluation_rubric must list at least one criterion".into(),
            ));
        }
        if let Some(c) = self.evaluation_rubric.criteria.iter().find(|c| c.weight > 100) {
            return Err(AssessmentError::InvalidSpec(format!(
                "criterion '{}' has weight {}, above 100",
                c.criterion, c.weight
            )));
        }
        Ok(())
    }
}

/// Score awarded for one rubric criterion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriterionScore {
    pub criterion: String,
    pub score: u32,
    pub max_score: u32,
    pub feedback: String,
}

/// The evaluator's verdict on one answer. All scores are integers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerEvaluation {
    pub question_sn: u32,
    pub total_score: u32,
    pub max_score: u32,
    pub word_count: u32,
    pub criterion_scores: Vec<CriterionScore>,
    pub overall_feedback: String,
    pub strengths: Vec<String>,
    pub improvements: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_table_and_batches() {
        let expected = [(10, 1), (15, 1), (20, 1), (30, 2), (40, 2)];
        for (level, (total, batches)) in Level::ALL.iter().zip(expected) {
            assert_eq!(level.total_questions(), total, "{level}");
            assert_eq!(level.batch_count(), batches, "{level}");
            assert_eq!(
                level.batch_count(),
                (level.total_questions() as f64 / BATCH_SIZE as f64).ceil() as u32
            );
        }
    }

    #[test]
    fn level_parse_is_case_insensitive() {
        assert_eq!("expert".parse::<Level>().unwrap(), Level::Expert);
        assert_eq!(" Specialist ".parse::<Level>().unwrap(), Level::Specialist);
        assert!("guru".parse::<Level>().is_err());
        assert_eq!(Level::Intermediate.to_string(), "Intermediate");
    }

    #[test]
    fn validate_rejects_missing_fields() {
        let missing_skill = TestRequest {
            level: Some("Beginner".into()),
            ..Default::default()
        };
        assert!(matches!(
            missing_skill.validate(),
            Err(AssessmentError::InvalidSpec(_))
        ));

        let blank_level = TestRequest {
            skill: Some("Rust".into()),
            level: Some("   ".into()),
            ..Default::default()
        };
        assert!(matches!(
            blank_level.validate(),
            Err(AssessmentError::InvalidSpec(_))
        ));

        let unknown_level = TestRequest {
            skill: Some("Rust".into()),
            level: Some("Wizard".into()),
            ..Default::default()
        };
        let err = unknown_level.validate().unwrap_err();
        assert!(err.to_string().contains("Wizard") || err.to_string().contains("wizard"));
    }

    #[test]
    fn validate_normalizes_optional_fields() {
        let req = TestRequest {
            specialization: Some("".into()),
            qualification: Some(" masters ".into()),
            skill: Some(" SQL ".into()),
            level: Some("advanced".into()),
        };
        let spec = req.validate().unwrap();
        assert_eq!(spec.skill, "SQL");
        assert_eq!(spec.level, Level::Advanced);
        assert_eq!(spec.specialization, None);
        assert_eq!(spec.qualification.as_deref(), Some("masters"));
    }

    #[test]
    fn criterion_max_score_rounds_half_up_without_rebalancing() {
        let rubric = EvaluationRubric {
            criteria: [30, 30, 25, 15]
                .iter()
                .map(|w| RubricCriterion {
                    criterion: format!("c{w}"),
                    weight: *w,
                })
                .collect(),
        };
        let maxima = rubric.max_scores(10);
        assert_eq!(maxima, vec![3, 3, 3, 2]);
        assert_eq!(maxima.iter().sum::<u32>(), 11);
        assert_eq!(rubric.weight_total(), 100);
    }

    #[test]
    fn criterion_max_score_does_not_overflow() {
        assert_eq!(criterion_max_score(50_000_000, 100), 50_000_000);
        assert_eq!(criterion_max_score(u32::MAX, u32::MAX), u32::MAX);
        let rubric = EvaluationRubric {
            criteria: vec![
                RubricCriterion { criterion: "a".into(), weight: u32::MAX },
                RubricCriterion { criterion: "b".into(), weight: 1 },
            ],
        };
        assert_eq!(rubric.weight_total(), u32::MAX);
    }

    fn text_answer(points: u32, weights: &[u32]) -> TextAnswer {
        TextAnswer {
            question_sn: 1,
            question: "Why?".into(),
            answer: serde_json::Value::Null,
            points,
            difficulty: None,
            evaluation_rubric: EvaluationRubric {
                criteria: weights
                    .iter()
                    .map(|w| RubricCriterion { criterion: format!("w{w}"), weight: *w })
                    .collect(),
            },
            max_words: None,
        }
    }

    #[test]
    fn text_answer_validation_bounds_points_and_weights() {
        assert!(text_answer(10, &[60, 40]).validate().is_ok());
        assert!(text_answer(MAX_QUESTION_POINTS, &[100]).validate().is_ok());

        for bad in [
            text_answer(50_000_000, &[100]),
            text_answer(10, &[]),
            text_answer(10, &[150]),
        ] {
            let err = bad.validate().unwrap_err();
            assert_eq!(err.kind(), "invalid_spec");
        }
    }

    #[test]
    fn question_deserializes_tagged_variants() {
        let json = serde_json::json!([
            {
                "type": "mcq",
                "question_sn": 1,
                "question": "What does `?` do?",
                "options": [
                    {"option": "Propagates errors", "option_id": "A"},
                    {"option": "Panics", "option_id": "B"}
                ],
                "correct_answer": "A",
                "difficulty": "Easy",
                "points": 1
            },
            {
                "type": "text",
                "question": "Explain ownership.",
                "difficulty": "hard",
                "points": 10,
                "max_words": 150,
                "evaluation_rubric": {"criteria": [{"criterion": "Accuracy", "weight": 100}]}
            }
        ]);
        let questions: Vec<Question> = serde_json::from_value(json).unwrap();
        assert!(questions[0].is_mcq());
        assert_eq!(questions[0].difficulty(), Difficulty::Easy);
        assert_eq!(questions[1].question_sn(), 0);
        assert_eq!(questions[1].points(), 10);
    }

    #[test]
    fn statistics_sum_every_batch() {
        let a = BatchMetadata {
            questions_summary: vec!["q".into(); 20],
            questions_count: 20,
            difficulty_counts: DifficultyCounts { easy: 5, medium: 10, hard: 5 },
            type_counts: TypeCounts { mcq: 12, text: 8 },
            total_marks: 70,
        };
        let b = BatchMetadata {
            questions_summary: vec!["q".into(); 10],
            questions_count: 10,
            difficulty_counts: DifficultyCounts { easy: 1, medium: 4, hard: 5 },
            type_counts: TypeCounts { mcq: 5, text: 5 },
            total_marks: 50,
        };
        let stats = TestStatistics::from_history(&[a, b]);
        assert_eq!(stats.total_questions, 30);
        assert_eq!(stats.difficulty_counts, DifficultyCounts { easy: 6, medium: 14, hard: 10 });
        assert_eq!(stats.type_counts, TypeCounts { mcq: 17, text: 13 });
        assert_eq!(stats.total_marks, 120);
    }
}
