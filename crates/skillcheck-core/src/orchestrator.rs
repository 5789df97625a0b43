//! The multi-batch test generation loop.
//!
//! Batches run strictly in sequence: every batch's prompt carries the
//! summaries of all batches before it. Progress is reported only through
//! the `ProgressSink`, in the order `started`, (`batch_start`,
//! `batch_complete`)*, then `complete` or `error`.

use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::client::GenerationClient;
use crate::context::ContextStrategyKind;
use crate::error::AssessmentError;
use crate::model::{BatchMetadata, GeneratedBatch, GenerationSpec, Question, TestResult, TestStatistics, BATCH_SIZE};
use crate::progress::{percent, ProgressEvent, ProgressSink};
use crate::prompt::{generation_prompt, BatchPlan};
use crate::sanitize::parse_model_json;
use crate::validate::{validate_batch, ValidatedBatch};

/// Configuration for the batch orchestrator.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Pause between consecutive batches.
    pub batch_delay: Duration,
    /// How earlier batches are summarised for later ones.
    pub context_strategy: ContextStrategyKind,
    /// Summary window for `ContextStrategyKind::RollingDigest`.
    pub digest_window: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            batch_delay: Duration::from_millis(500),
            context_strategy: ContextStrategyKind::FullHistory,
            digest_window: 40,
        }
    }
}

/// Every batch completed so far in a run.
///
/// `run` starts from an empty checkpoint; a failed run hands back the
/// checkpoint it reached so a caller can `resume` it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationCheckpoint {
    pub spec: GenerationSpec,
    #[serde(default)]
    pub questions: Vec<Question>,
    #[serde(default)]
    pub history: Vec<BatchMetadata>,
}

impl GenerationCheckpoint {
    pub fn new(spec: GenerationSpec) -> Self {
        Self {
            spec,
            questions: Vec::new(),
            history: Vec::new(),
        }
    }

    /// Questions generated so far, according to the batch history.
    pub fn questions_generated(&self) -> u32 {
        self.history.iter().map(|b| b.questions_count).sum()
    }

    pub fn completed_batches(&self) -> u32 {
        self.history.len() as u32
    }

    fn check(&self) -> Result<(), AssessmentError> {
        if self.spec.skill.trim().is_empty() {
            return Err(AssessmentError::InvalidSpec("skill is required".into()));
        }
        let generated = self.questions_generated();
        if generated as usize != self.questions.len() {
            return Err(AssessmentError::InvalidSpec(format!(
                "checkpoint history counts {generated} questions but holds {}",
                self.questions.len()
            )));
        }
        if generated > self.spec.level.total_questions() {
            return Err(AssessmentError::InvalidSpec(format!(
                "checkpoint holds {generated} questions, more than the {} a {} test has",
                self.spec.level.total_questions(),
                self.spec.level
            )));
        }
        Ok(())
    }
}

/// A failed run: the error plus every batch that completed before it.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct GenerationFailure {
    #[source]
    pub error: AssessmentError,
    pub checkpoint: GenerationCheckpoint,
}

/// Drives the sequential generation loop for one request.
pub struct BatchOrchestrator {
    client: GenerationClient,
    config: OrchestratorConfig,
}

impl BatchOrchestrator {
    pub fn new(client: GenerationClient, config: OrchestratorConfig) -> Self {
        Self { client, config }
    }

    /// Generate a complete test for `spec`.
    pub async fn run(
        &self,
        spec: GenerationSpec,
        sink: &dyn ProgressSink,
    ) -> Result<TestResult, GenerationFailure> {
        self.resume(GenerationCheckpoint::new(spec), sink).await
    }

    /// Continue a run from `checkpoint`, generating only the missing batches.
    pub async fn resume(
        &self,
        checkpoint: GenerationCheckpoint,
        sink: &dyn ProgressSink,
    ) -> Result<TestResult, GenerationFailure> {
        // Invalid input fails before any event is emitted.
        if let Err(error) = checkpoint.check() {
            return Err(GenerationFailure { error, checkpoint });
        }

        let mut checkpoint = checkpoint;
        let spec = checkpoint.spec.clone();
        let total_questions = spec.level.total_questions();
        let total_batches = spec.level.batch_count();
        let strategy = self
            .config
            .context_strategy
            .build(self.config.digest_window);

        tracing::info!(
            skill = %spec.skill,
            level = %spec.level,
            total_questions,
            total_batches,
            resumed_batches = checkpoint.completed_batches(),
            context = strategy.name(),
            "starting test generation"
        );
        sink.emit(&ProgressEvent::Started {
            total_questions,
            total_batches,
        });

        loop {
            let generated = checkpoint.questions_generated();
            if generated >= total_questions {
                break;
            }
            let batch_num = checkpoint.completed_batches() + 1;

            if sink.is_closed() {
                tracing::info!(batch = batch_num, "progress consumer disconnected, stopping");
                return Err(fail(AssessmentError::Cancelled, checkpoint, sink));
            }

            let questions_to_generate = BATCH_SIZE.min(total_questions - generated);
            sink.emit(&ProgressEvent::BatchStart {
                batch: batch_num,
                total_batches,
                questions_to_generate,
                progress: percent(batch_num - 1, total_batches),
            });

            let plan = BatchPlan {
                batch_num,
                batch_count: total_batches,
                questions_to_generate,
                first_sn: generated + 1,
            };
            let context = strategy.build(&checkpoint.history);
            let prompt = generation_prompt(&spec, &plan, context.as_deref());

            let ValidatedBatch {
                mut questions,
                metadata,
            } = match self.generate_batch(prompt, questions_to_generate).await {
                Ok(batch) => batch,
                Err(error) => {
                    tracing::error!(batch = batch_num, kind = error.kind(), "batch failed: {error}");
                    return Err(fail(error, checkpoint, sink));
                }
            };

            for (i, question) in questions.iter_mut().enumerate() {
                let sn = generated + i as u32 + 1;
                let reported = question.question_sn();
                if reported != 0 && reported != sn {
                    tracing::debug!(reported, assigned = sn, "model numbered a question differently");
                }
                question.set_question_sn(sn);
            }

            checkpoint.questions.extend(questions);
            checkpoint.history.push(metadata);
            let questions_generated = checkpoint.questions_generated();

            tracing::info!(
                batch = batch_num,
                total_batches,
                questions_generated,
                total_questions,
                "batch complete"
            );
            sink.emit(&ProgressEvent::BatchComplete {
                batch: batch_num,
                total_batches,
                questions_generated,
                total_questions,
                progress: percent(batch_num, total_batches),
            });

            if questions_generated < total_questions && !self.config.batch_delay.is_zero() {
                tokio::time::sleep(self.config.batch_delay).await;
            }
        }

        let mut statistics = TestStatistics::from_history(&checkpoint.history);
        statistics.total_questions = checkpoint.questions.len() as u32;

        let result = TestResult {
            test_id: new_test_id(),
            level: spec.level,
            skill: spec.skill,
            specialization: spec.specialization,
            qualification: spec.qualification,
            total_questions: statistics.total_questions,
            total_batches,
            questions: checkpoint.questions,
            statistics,
            generated_at: Utc::now(),
        };

        tracing::info!(test_id = %result.test_id, total_marks = result.statistics.total_marks, "test generated");
        sink.emit(&ProgressEvent::Complete {
            test: Box::new(result.clone()),
            progress: 100,
        });
        Ok(result)
    }

    async fn generate_batch(&self, prompt: String, expected: u32) -> Result<ValidatedBatch, AssessmentError> {
        let raw = self.client.complete(prompt).await?;
        let batch: GeneratedBatch = parse_model_json(&raw)?;
        validate_batch(batch, expected)
    }
}

fn fail(error: AssessmentError, checkpoint: GenerationCheckpoint, sink: &dyn ProgressSink) -> GenerationFailure {
    sink.emit(&ProgressEvent::from_error(&error));
    GenerationFailure { error, checkpoint }
}

/// `test_<unix millis>_<8 random hex chars>`. Unique with high probability only.
fn new_test_id() -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("test_{}_{}", Utc::now().timestamp_millis(), &suffix[..8])
}
