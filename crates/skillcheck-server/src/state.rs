//! Shared application state: the pipeline components every handler uses.

use std::sync::Arc;

use skillcheck_core::client::GenerationClient;
use skillcheck_core::evaluator::RubricEvaluator;
use skillcheck_core::orchestrator::{BatchOrchestrator, OrchestratorConfig};
use skillcheck_core::skills::SkillSuggester;
use skillcheck_providers::SkillcheckConfig;

pub struct AppState {
    pub orchestrator: Arc<BatchOrchestrator>,
    pub evaluator: RubricEvaluator,
    pub suggester: SkillSuggester,
}

impl AppState {
    /// All components share one provider client.
    pub fn new(client: GenerationClient, orchestrator_config: OrchestratorConfig) -> Self {
        Self {
            orchestrator: Arc::new(BatchOrchestrator::new(client.clone(), orchestrator_config)),
            evaluator: RubricEvaluator::new(client.clone()),
            suggester: SkillSuggester::new(client),
        }
    }

    pub fn from_config(config: &SkillcheckConfig) -> anyhow::Result<Self> {
        let client = config.client()?;
        tracing::info!(
            provider = client.provider_name(),
            model = %client.settings().model,
            "pipeline configured"
        );
        Ok(Self::new(client, config.orchestrator_config()))
    }
}
