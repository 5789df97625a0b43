//! Cumulative anti-duplication context fed into every batch after the first.
//!
//! The context tells the model what earlier batches already asked and what
//! the running difficulty/type/marks totals are, so it can avoid repeats and
//! balance the remainder of the test.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::model::{BatchMetadata, TestStatistics};

/// How prior batches are summarised for the next generation prompt.
pub trait ContextStrategy: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Context text for the next batch, or `None` when there is no history.
    fn build(&self, history: &[BatchMetadata]) -> Option<String>;
}

/// Resend every prior question summary. Prompt size grows with the test.
#[derive(Debug, Clone, Copy, Default)]
pub struct FullHistory;

impl ContextStrategy for FullHistory {
    fn name(&self) -> &'static str {
        "full_history"
    }

    fn build(&self, history: &[BatchMetadata]) -> Option<String> {
        if history.is_empty() {
            return None;
        }
        let summaries: Vec<&str> = history
            .iter()
            .flat_map(|b| b.questions_summary.iter().map(String::as_str))
            .collect();
        Some(render(history, &summaries, None))
    }
}

/// Keep only the most recent `window` summaries; totals still cover everything.
#[derive(Debug, Clone, Copy)]
pub struct RollingDigest {
    pub window: usize,
}

impl ContextStrategy for RollingDigest {
    fn name(&self) -> &'static str {
        "rolling_digest"
    }

    fn build(&self, history: &[BatchMetadata]) -> Option<String> {
        if history.is_empty() {
            return None;
        }
        let all: Vec<&str> = history
            .iter()
            .flat_map(|b| b.questions_summary.iter().map(String::as_str))
            .collect();
        let skip = all.len().saturating_sub(self.window);
        let omitted = if skip > 0 { Some(skip) } else { None };
        Some(render(history, &all[skip..], omitted))
    }
}

/// Configuration-level selector for a context strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextStrategyKind {
    #[default]
    FullHistory,
    RollingDigest,
}

impl ContextStrategyKind {
    pub fn build(self, window: usize) -> Box<dyn ContextStrategy> {
        match self {
            ContextStrategyKind::FullHistory => Box::new(FullHistory),
            ContextStrategyKind::RollingDigest => Box::new(RollingDigest { window }),
        }
    }
}

fn render(history: &[BatchMetadata], summaries: &[&str], omitted: Option<usize>) -> String {
    let stats = TestStatistics::from_history(history);
    let mut out = String::new();

    let _ = writeln!(
        out,
        "PREVIOUSLY GENERATED QUESTIONS ({} so far across {} batch(es)):",
        stats.total_questions,
        history.len()
    );
    if let Some(n) = omitted {
        let _ = writeln!(out, "({n} older questions omitted; their topics are covered by the totals below.)");
    }
    let first_number = omitted.unwrap_or(0) + 1;
    for (i, summary) in summaries.iter().enumerate() {
        let _ = writeln!(out, "{}. {}", first_number + i, summary);
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "CUMULATIVE STATISTICS SO FAR:");
    let _ = writeln!(
        out,
        "- Difficulty: easy={}, medium={}, hard={}",
        stats.difficulty_counts.easy, stats.difficulty_counts.medium, stats.difficulty_counts.hard
    );
    let _ = writeln!(
        out,
        "- Type: mcq={}, text={}",
        stats.type_counts.mcq, stats.type_counts.text
    );
    let _ = writeln!(out, "- Total marks: {}", stats.total_marks);
    let _ = writeln!(out);
    let _ = write!(
        out,
        "Do NOT repeat or paraphrase any question listed above. Cover new sub-topics and \
         balance the remaining questions against the cumulative statistics."
    );
    out
}
