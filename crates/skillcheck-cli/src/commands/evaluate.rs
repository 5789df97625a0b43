//! The `skillcheck evaluate` command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Deserialize;

use skillcheck_core::aggregate::{aggregate, EvaluationSummary};
use skillcheck_core::evaluator::RubricEvaluator;
use skillcheck_core::model::{AnswerEvaluation, TextAnswer};
use skillcheck_providers::load_config_from;

/// A bare answer list, or the HTTP request body shape.
#[derive(Deserialize)]
#[serde(untagged)]
enum AnswersFile {
    List(Vec<TextAnswer>),
    Request { text_responses: Vec<TextAnswer> },
}

pub async fn execute(answers_path: PathBuf, config_path: Option<PathBuf>, format: String) -> Result<()> {
    anyhow::ensure!(
        matches!(format.as_str(), "text" | "json"),
        "unknown format '{format}' (expected text or json)"
    );

    let content = std::fs::read_to_string(&answers_path)
        .with_context(|| format!("failed to read answers: {}", answers_path.display()))?;
    let answers = match serde_json::from_str::<AnswersFile>(&content)
        .with_context(|| format!("failed to parse answers: {}", answers_path.display()))?
    {
        AnswersFile::List(list) => list,
        AnswersFile::Request { text_responses } => text_responses,
    };
    anyhow::ensure!(!answers.is_empty(), "answers file holds no text answers");

    tracing::debug!(answers = answers.len(), path = %answers_path.display(), "answers loaded");

    let config = load_config_from(config_path.as_deref())?;
    let evaluator = RubricEvaluator::new(config.client()?);

    let evaluations = evaluator.evaluate_all(&answers).await?;
    let summary = aggregate(&evaluations);

    if format == "json" {
        let out = serde_json::json!({ "summary": summary, "evaluations": evaluations });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        print_summary(&evaluations, &summary);
    }

    Ok(())
}

fn print_summary(evaluations: &[AnswerEvaluation], summary: &EvaluationSummary) {
    use comfy_table::{Cell, Table};

    let mut table = Table::new();
    table.set_header(vec!["Question", "Score", "Words", "Feedback"]);

    for eval in evaluations {
        table.add_row(vec![
            Cell::new(eval.question_sn),
            Cell::new(format!("{}/{}", eval.total_score, eval.max_score)),
            Cell::new(eval.word_count),
            Cell::new(&eval.overall_feedback),
        ]);
    }

    println!("{table}");
    println!(
        "Total: {}/{} ({}%) across {} answer(s)",
        summary.total_text_score, summary.total_max_score, summary.percentage, summary.answers_evaluated
    );
}
