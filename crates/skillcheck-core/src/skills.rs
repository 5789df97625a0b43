//! Single-shot skill suggestion from a specialization and qualification.

use serde::{Deserialize, Serialize};

use crate::client::GenerationClient;
use crate::error::AssessmentError;
use crate::prompt::skills_prompt;
use crate::sanitize::parse_model_json;

/// Suggested skills, serialized with the camelCase keys clients expect.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillSuggestion {
    #[serde(default)]
    pub soft_skills: Vec<String>,
    #[serde(default)]
    pub tech_skills: Vec<String>,
}

pub struct SkillSuggester {
    client: GenerationClient,
}

impl SkillSuggester {
    pub fn new(client: GenerationClient) -> Self {
        Self { client }
    }

    pub async fn suggest(&self, specialization: &str, qualification: &str) -> Result<SkillSuggestion, AssessmentError> {
        let (specialization, qualification) = (specialization.trim(), qualification.trim());
        if specialization.is_empty() || qualification.is_empty() {
            return Err(AssessmentError::InvalidSpec(
                "specialization and qualification are required".into(),
            ));
        }

        let raw = self
            .client
            .complete(skills_prompt(specialization, qualification))
            .await?;
        let mut suggestion: SkillSuggestion = parse_model_json(&raw)?;
        suggestion.soft_skills.retain(|s| !s.trim().is_empty());
        suggestion.tech_skills.retain(|s| !s.trim().is_empty());
        tracing::debug!(
            soft = suggestion.soft_skills.len(),
            tech = suggestion.tech_skills.len(),
            "skills suggested"
        );
        Ok(suggestion)
    }
}
