//! Mock provider for testing.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use skillcheck_core::traits::{GenerateRequest, GenerateResponse, LlmProvider, ModelInfo, TokenUsage};

/// One scripted reply.
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Return this text as the model output.
    Text(String),
    /// Fail the call with this message.
    Fail(String),
}

/// A mock provider for exercising the pipeline without real API calls.
///
/// Replies are chosen in this order: the next scripted reply, the first
/// prompt rule whose substring occurs in the prompt, then the default.
pub struct MockProvider {
    script: Mutex<VecDeque<MockReply>>,
    /// (prompt substring, response) pairs, checked in insertion order.
    rules: Vec<(String, String)>,
    default_reply: MockReply,
    call_count: AtomicU32,
    prompts: Mutex<Vec<String>>,
}

impl MockProvider {
    /// Create a mock with the given prompt-substring rules.
    pub fn new(rules: Vec<(String, String)>) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            rules,
            default_reply: MockReply::Text("{}".to_string()),
            call_count: AtomicU32::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Create a mock that always returns the same response.
    pub fn with_fixed_response(response: &str) -> Self {
        let mut mock = Self::new(Vec::new());
        mock.default_reply = MockReply::Text(response.to_string());
        mock
    }

    /// Create a mock that answers calls in order from `replies`.
    ///
    /// Calls beyond the script fail.
    pub fn with_script(replies: impl IntoIterator<Item = MockReply>) -> Self {
        let mut mock = Self::new(Vec::new());
        mock.script = Mutex::new(replies.into_iter().collect());
        mock.default_reply = MockReply::Fail("mock script exhausted".to_string());
        mock
    }

    /// Create a mock whose every call fails with `message`.
    pub fn failing(message: &str) -> Self {
        let mut mock = Self::new(Vec::new());
        mock.default_reply = MockReply::Fail(message.to_string());
        mock
    }

    /// Get the number of calls made to this provider.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    /// Every prompt received, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    fn pick(&self, prompt: &str) -> MockReply {
        if let Some(reply) = self.script.lock().unwrap().pop_front() {
            return reply;
        }
        self.rules
            .iter()
            .find(|(key, _)| prompt.contains(key.as_str()))
            .map(|(_, v)| MockReply::Text(v.clone()))
            .unwrap_or_else(|| self.default_reply.clone())
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn generate(&self, request: &GenerateRequest) -> anyhow::Result<GenerateResponse> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        self.prompts.lock().unwrap().push(request.prompt.clone());

        let content = match self.pick(&request.prompt) {
            MockReply::Text(text) => text,
            MockReply::Fail(message) => anyhow::bail!(message),
        };
        let prompt_tokens = (request.prompt.len() / 4) as u32; // Rough estimate
        let completion_tokens = (content.len() / 4) as u32;

        Ok(GenerateResponse {
            content,
            model: request.model.clone(),
            token_usage: TokenUsage {
                prompt_tokens,
                completion_tokens,
                total_tokens: prompt_tokens + completion_tokens,
            },
            latency_ms: 1,
        })
    }

    fn available_models(&self) -> Vec<ModelInfo> {
        vec![ModelInfo {
            id: "mock-model".into(),
            name: "Mock Model".into(),
            provider: "mock".into(),
            max_context: 100_000,
        }]
    }
}

/// JSON for a generation batch of `count` questions.
///
/// Every third question is a text question; the rest are MCQs. Summaries
/// are `"<tag> topic <i>"` so tests can find them in later prompts.
pub fn batch_response(tag: &str, count: u32) -> String {
    let questions: Vec<serde_json::Value> = (1..=count)
        .map(|i| {
            if i % 3 == 0 {
                serde_json::json!({
                    "type": "text",
                    "question_sn": i,
                    "question": format!("Explain {tag} concept {i}."),
                    "difficulty": "hard",
                    "points": 10,
                    "max_words": 150,
                    "evaluation_rubric": {"criteria": [
                        {"criterion": "Accuracy", "weight": 60},
                        {"criterion": "Clarity", "weight": 40}
                    ]}
                })
            } else {
                serde_json::json!({
                    "type": "mcq",
                    "question_sn": i,
                    "question": format!("Which {tag} statement {i} is true?"),
                    "options": [
                        {"option": "first", "option_id": "A"},
                        {"option": "second", "option_id": "B"},
                        {"option": "third", "option_id": "C"},
                        {"option": "fourth", "option_id": "D"}
                    ],
                    "correct_answer": "B",
                    "difficulty": if i % 2 == 0 { "medium" } else { "easy" },
                    "points": if i % 2 == 0 { 2 } else { 1 }
                })
            }
        })
        .collect();
    let summaries: Vec<String> = (1..=count).map(|i| format!("{tag} topic {i}")).collect();
    let body = serde_json::json!({
        "questions": questions,
        "batch_metadata": {
            "questions_summary": summaries,
            "questions_count": count
        }
    });
    format!("```json\n{body:#}\n```")
}
