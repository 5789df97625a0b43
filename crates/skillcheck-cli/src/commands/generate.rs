//! The `skillcheck generate` command.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use skillcheck_core::model::{GenerationSpec, TestRequest};
use skillcheck_core::orchestrator::{BatchOrchestrator, GenerationCheckpoint};
use skillcheck_core::progress::{ProgressEvent, ProgressSink};
use skillcheck_providers::load_config_from;

/// Checkpoint file used when no `--output` is given.
const DEFAULT_CHECKPOINT: &str = "skillcheck.checkpoint.json";

pub struct GenerateArgs {
    pub skill: String,
    pub level: String,
    pub specialization: Option<String>,
    pub qualification: Option<String>,
    pub output: Option<PathBuf>,
    pub resume_from: Option<PathBuf>,
    pub config: Option<PathBuf>,
}

/// Console progress reporter.
struct ConsoleSink;

impl ProgressSink for ConsoleSink {
    fn emit(&self, event: &ProgressEvent) {
        match event {
            ProgressEvent::Started {
                total_questions,
                total_batches,
            } => eprintln!("Generating {total_questions} questions in {total_batches} batch(es)"),
            ProgressEvent::BatchStart {
                batch,
                total_batches,
                questions_to_generate,
                progress,
            } => eprintln!(
                "  [{progress:>3}%] batch {batch}/{total_batches}: requesting {questions_to_generate} questions"
            ),
            ProgressEvent::BatchComplete {
                batch,
                total_batches,
                questions_generated,
                total_questions,
                progress,
            } => eprintln!(
                "  [{progress:>3}%] batch {batch}/{total_batches} done ({questions_generated}/{total_questions})"
            ),
            ProgressEvent::Complete { test, .. } => {
                eprintln!("Complete: {} ({} questions)", test.test_id, test.total_questions)
            }
            ProgressEvent::Error { message, kind } => eprintln!("  ERROR [{kind}]: {message}"),
        }
    }
}

pub async fn execute(args: GenerateArgs) -> Result<()> {
    let spec = TestRequest {
        specialization: args.specialization.clone(),
        qualification: args.qualification.clone(),
        skill: Some(args.skill.clone()),
        level: Some(args.level.clone()),
    }
    .validate()?;

    let checkpoint = match &args.resume_from {
        Some(path) => load_checkpoint(path, &spec)?,
        None => GenerationCheckpoint::new(spec),
    };

    let config = load_config_from(args.config.as_deref())?;
    let client = config.client()?;
    tracing::info!(
        provider = client.provider_name(),
        model = %client.settings().model,
        resumed_batches = checkpoint.completed_batches(),
        "generate command"
    );
    let orchestrator = BatchOrchestrator::new(client, config.orchestrator_config());

    let test = match orchestrator.resume(checkpoint, &ConsoleSink).await {
        Ok(test) => test,
        Err(failure) => {
            let path = checkpoint_path(args.output.as_deref());
            let json = serde_json::to_string_pretty(&failure.checkpoint)?;
            std::fs::write(&path, json)
                .with_context(|| format!("failed to write checkpoint: {}", path.display()))?;
            eprintln!(
                "Checkpoint with {} completed batch(es) saved to: {}",
                failure.checkpoint.completed_batches(),
                path.display()
            );
            return Err(failure.into());
        }
    };

    let json = serde_json::to_string_pretty(&test)?;
    match &args.output {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("failed to write test: {}", path.display()))?;
            eprintln!("Test saved to: {}", path.display());
        }
        None => println!("{json}"),
    }

    Ok(())
}

fn load_checkpoint(path: &Path, spec: &GenerationSpec) -> Result<GenerationCheckpoint> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read checkpoint: {}", path.display()))?;
    let checkpoint: GenerationCheckpoint = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse checkpoint: {}", path.display()))?;

    anyhow::ensure!(
        checkpoint.spec == *spec,
        "checkpoint was written for {} / {}, not {} / {}",
        checkpoint.spec.skill,
        checkpoint.spec.level,
        spec.skill,
        spec.level
    );
    eprintln!(
        "Resuming after {} completed batch(es)",
        checkpoint.completed_batches()
    );
    Ok(checkpoint)
}

/// `<output>.checkpoint.json` beside the output, or a fixed name in the
/// working directory.
fn checkpoint_path(output: Option<&Path>) -> PathBuf {
    match output {
        Some(out) => out.with_extension("checkpoint.json"),
        None => PathBuf::from(DEFAULT_CHECKPOINT),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checkpoint_sits_beside_output() {
        assert_eq!(
            checkpoint_path(Some(Path::new("out/test.json"))),
            PathBuf::from("out/test.checkpoint.json")
        );
        assert_eq!(checkpoint_path(None), PathBuf::from(DEFAULT_CHECKPOINT));
    }
}
