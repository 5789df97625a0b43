//! The `skillcheck init` command.

use std::path::Path;

use anyhow::Result;

pub fn execute() -> Result<()> {
    write_if_missing("skillcheck.toml", SAMPLE_CONFIG)?;
    write_if_missing("answers.example.json", EXAMPLE_ANSWERS)?;

    println!("\nNext steps:");
    println!("  1. Set GEMINI_API_KEY (or edit skillcheck.toml)");
    println!("  2. Run: skillcheck generate --skill Python --level beginner --output test.json");
    println!("  3. Run: skillcheck evaluate --answers answers.example.json");
    println!("  4. Run: skillcheck serve");

    Ok(())
}

fn write_if_missing(path: &str, content: &str) -> Result<()> {
    if Path::new(path).exists() {
        println!("{path} already exists, skipping.");
    } else {
        std::fs::write(path, content)?;
        println!("Created {path}");
    }
    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# skillcheck configuration

default_provider = "gemini"
default_model = "gemini-2.0-flash"
temperature = 0.7
max_tokens = 8192
request_timeout_secs = 120
batch_delay_ms = 500

# "full_history" or "rolling_digest"
context_strategy = "full_history"
digest_window = 40

[providers.gemini]
type = "gemini"
api_key = "${GEMINI_API_KEY}"

# [providers.openai]
# type = "openai"
# api_key = "${OPENAI_API_KEY}"

[server]
bind = "0.0.0.0:3000"
"#;

const EXAMPLE_ANSWERS: &str = r#"[
  {
    "question_sn": 3,
    "question": "Explain the difference between a list and a tuple in Python.",
    "answer": "A list is mutable so items can be added, removed or changed after creation, while a tuple is immutable and is often used for fixed records or dictionary keys.",
    "points": 5,
    "difficulty": "easy",
    "max_words": 50,
    "evaluation_rubric": {
      "criteria": [
        { "criterion": "Accuracy", "weight": 60 },
        { "criterion": "Clarity", "weight": 40 }
      ]
    }
  },
  {
    "question_sn": 7,
    "question": "When would you use a generator instead of a list?",
    "answer": "For big data.",
    "points": 5,
    "difficulty": "medium",
    "max_words": 50,
    "evaluation_rubric": {
      "criteria": [
        { "criterion": "Accuracy", "weight": 50 },
        { "criterion": "Examples", "weight": 50 }
      ]
    }
  }
]
"#;
