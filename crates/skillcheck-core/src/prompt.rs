//! Prompt construction for generation, evaluation, and skill suggestion.
//!
//! Everything here is a pure function of its inputs, which keeps prompts
//! testable without a provider.

use std::fmt::Write as _;

use crate::model::{Difficulty, GenerationSpec, Level, TextAnswer};

/// Question mix requested for a level, in percent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelProfile {
    pub mcq_percent: u32,
    pub text_percent: u32,
    pub easy_percent: u32,
    pub medium_percent: u32,
    pub hard_percent: u32,
}

pub fn level_profile(level: Level) -> LevelProfile {
    let (mcq, easy, medium, hard) = match level {
        Level::Beginner => (80, 60, 30, 10),
        Level::Intermediate => (70, 40, 40, 20),
        Level::Advanced => (60, 25, 45, 30),
        Level::Expert => (50, 10, 40, 50),
        Level::Specialist => (40, 0, 40, 60),
    };
    LevelProfile {
        mcq_percent: mcq,
        text_percent: 100 - mcq,
        easy_percent: easy,
        medium_percent: medium,
        hard_percent: hard,
    }
}

pub fn mcq_points(difficulty: Difficulty) -> u32 {
    match difficulty {
        Difficulty::Easy => 1,
        Difficulty::Medium => 2,
        Difficulty::Hard => 3,
    }
}

pub fn text_points(difficulty: Difficulty) -> u32 {
    match difficulty {
        Difficulty::Easy => 5,
        Difficulty::Medium => 8,
        Difficulty::Hard => 10,
    }
}

/// Word ceiling for a text answer.
pub fn max_words(difficulty: Difficulty) -> u32 {
    match difficulty {
        Difficulty::Easy => 50,
        Difficulty::Medium => 100,
        Difficulty::Hard => 150,
    }
}

/// Position of one batch inside a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchPlan {
    /// 1-based batch number.
    pub batch_num: u32,
    pub batch_count: u32,
    /// Exact number of questions this call must return.
    pub questions_to_generate: u32,
    /// `question_sn` of the first question in this batch.
    pub first_sn: u32,
}

const GENERATION_EXAMPLE: &str = r#"{
  "questions": [
    {
      "type": "mcq",
      "question_sn": 1,
      "question": "Which keyword declares an immutable binding in Rust?",
      "options": [
        {"option": "let", "option_id": "A"},
        {"option": "mut", "option_id": "B"},
        {"option": "static mut", "option_id": "C"},
        {"option": "var", "option_id": "D"}
      ],
      "correct_answer": "A",
      "difficulty": "easy",
      "points": 1
    },
    {
      "type": "text",
      "question_sn": 2,
      "question": "Explain how ownership prevents data races in concurrent code.",
      "difficulty": "medium",
      "points": 8,
      "max_words": 100,
      "evaluation_rubric": {
        "criteria": [
          {"criterion": "Technical accuracy", "weight": 40},
          {"criterion": "Depth of explanation", "weight": 30},
          {"criterion": "Use of examples", "weight": 20},
          {"criterion": "Clarity", "weight": 10}
        ]
      }
    }
  ],
  "batch_metadata": {
    "questions_summary": [
      "Immutable bindings with let",
      "Ownership and data-race prevention"
    ],
    "questions_count": 2,
    "difficulty_counts": {"easy": 1, "medium": 1, "hard": 0},
    "type_counts": {"mcq": 1, "text": 1},
    "total_marks": 9
  }
}"#;

/// Prompt for one generation batch.
pub fn generation_prompt(spec: &GenerationSpec, plan: &BatchPlan, context: Option<&str>) -> String {
    let profile = level_profile(spec.level);
    let last_sn = plan.first_sn + plan.questions_to_generate.saturating_sub(1);
    let mut p = String::new();

    let _ = writeln!(
        p,
        "Generate a skill assessment for the skill \"{}\" at the {} level.",
        spec.skill, spec.level
    );
    if let Some(spec_area) = &spec.specialization {
        let _ = writeln!(p, "Candidate specialization: {spec_area}");
    }
    if let Some(qualification) = &spec.qualification {
        let _ = writeln!(p, "Candidate highest qualification: {qualification}");
    }
    let _ = writeln!(
        p,
        "This is batch {} of {}. Generate EXACTLY {} questions numbered {} to {}.",
        plan.batch_num, plan.batch_count, plan.questions_to_generate, plan.first_sn, last_sn
    );
    let _ = writeln!(p);

    if let Some(ctx) = context {
        let _ = writeln!(p, "{ctx}");
        let _ = writeln!(p);
    }

    let _ = writeln!(p, "QUESTION DISTRIBUTION FOR {} LEVEL:", spec.level.to_string().to_uppercase());
    let _ = writeln!(
        p,
        "- Types: {}% multiple choice (type \"mcq\"), {}% free text (type \"text\")",
        profile.mcq_percent, profile.text_percent
    );
    let _ = writeln!(
        p,
        "- Difficulty: {}% easy, {}% medium, {}% hard",
        profile.easy_percent, profile.medium_percent, profile.hard_percent
    );
    let _ = writeln!(p, "- Points per question:");
    for d in Difficulty::ALL {
        let _ = writeln!(p, "  - {d}: mcq = {}, text = {}", mcq_points(d), text_points(d));
    }
    let _ = writeln!(p, "- Maximum answer length for text questions (max_words):");
    for d in Difficulty::ALL {
        let _ = writeln!(p, "  - {d}: {} words", max_words(d));
    }
    let _ = writeln!(p);

    let _ = writeln!(p, "RULES:");
    let _ = writeln!(
        p,
        "- Text questions must be answerable in prose. NEVER ask the candidate to write, complete, or debug code."
    );
    let _ = writeln!(
        p,
        "- Every mcq question must have at least 4 options with unique option_id values (A, B, C, D, ...) and a correct_answer equal to one of those option_id values."
    );
    let _ = writeln!(
        p,
        "- Every text question must carry an evaluation_rubric whose criterion weights sum to 100."
    );
    let _ = writeln!(
        p,
        "- batch_metadata.questions_summary must contain one short topic line per question, in order."
    );
    let _ = writeln!(
        p,
        "- Return ONLY raw JSON without markdown code fences. The response must start with {{ and end with }}."
    );
    let _ = writeln!(p);
    let _ = writeln!(p, "EXAMPLE OUTPUT SHAPE:");
    p.push_str(GENERATION_EXAMPLE);
    p.push('\n');
    p
}

/// Prompt asking the model to score one text answer against its rubric.
pub fn evaluation_prompt(answer: &TextAnswer, answer_text: &str, word_count: u32) -> String {
    let mut p = String::new();
    let _ = writeln!(p, "Evaluate the candidate's answer to the following question.");
    let _ = writeln!(p);
    let _ = writeln!(p, "QUESTION: {}", answer.question);
    if let Some(d) = answer.difficulty {
        let _ = writeln!(p, "DIFFICULTY: {d}");
    }
    let _ = writeln!(p, "ANSWER:");
    let _ = writeln!(p, "\"\"\"\n{answer_text}\n\"\"\"");
    let _ = writeln!(p);

    let _ = writeln!(p, "RUBRIC (total max points: {}):", answer.points);
    let maxima = answer.evaluation_rubric.max_scores(answer.points);
    for (criterion, max) in answer.evaluation_rubric.criteria.iter().zip(&maxima) {
        let _ = writeln!(
            p,
            "- {} (weight {}%, max {} points)",
            criterion.criterion, criterion.weight, max
        );
    }
    let _ = writeln!(p);
    match answer.max_words {
        Some(limit) => {
            let _ = writeln!(p, "WORD COUNT: expected at most {limit}, actual {word_count}");
        }
        None => {
            let _ = writeln!(p, "WORD COUNT: actual {word_count}");
        }
    }
    let _ = writeln!(p);

    let _ = writeln!(p, "SCORING BANDS (per criterion, as a share of its max points):");
    let _ = writeln!(p, "- Excellent: 90-100% (complete, accurate, well argued)");
    let _ = writeln!(p, "- Good: 70-89% (mostly correct with minor gaps)");
    let _ = writeln!(p, "- Fair: 40-69% (partially correct or superficial)");
    let _ = writeln!(p, "- Poor: 0-39% (incorrect, off-topic, or missing)");
    let _ = writeln!(p);
    let _ = writeln!(
        p,
        "ALL scores MUST be whole integers. Never exceed a criterion's max points. total_score must equal the sum of the criterion scores."
    );
    let _ = writeln!(
        p,
        "Return ONLY raw JSON, one criterion_scores entry per rubric criterion in the order listed:"
    );
    let _ = writeln!(
        p,
        r#"{{"total_score": 0, "criterion_scores": [{{"criterion": "...", "score": 0, "max_score": 0, "feedback": "..."}}], "overall_feedback": "...", "strengths": ["..."], "improvements": ["..."]}}"#
    );
    p
}

/// Prompt for the single-shot skill suggestion call.
pub fn skills_prompt(specialization: &str, qualification: &str) -> String {
    format!(
        "Based on a specialization in {specialization} and a highest qualification of {qualification}, \
         generate a JSON object with two arrays: softSkills and techSkills.\n\n\
         Return ONLY raw JSON without markdown code blocks, backticks, or any other text. \
         The response must start with {{ and end with }}.\n\n\
         Example format: {{\"softSkills\":[\"skill1\",\"skill2\"],\"techSkills\":[\"skill1\",\"skill2\"]}}"
    )
}
