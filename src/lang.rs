//! Two-way language tagging of scraped text.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::llm::ChatModel;

const DETECT_INSTRUCTION: &str =
    "You are a language detector. Respond with only 'en' for English or 'es' for Spanish.";
const DETECT_TEMPERATURE: f32 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    En,
    Es,
    Unknown,
}

impl Language {
    /// Case-folds and trims a model reply; anything but `en`/`es` is `Unknown`.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "en" => Language::En,
            "es" => Language::Es,
            _ => Language::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Es => "es",
            Language::Unknown => "unknown",
        }
    }
}

/// Infallible language tagging: failures degrade to `Language::Unknown`.
pub trait LanguageClassifier {
    async fn classify(&self, sample: &str) -> Language;
}

pub struct LlmClassifier<M> {
    model: M,
}

impl<M: ChatModel> LlmClassifier<M> {
    pub fn new(model: M) -> Self {
        Self { model }
    }
}

impl<M: ChatModel> LanguageClassifier for LlmClassifier<M> {
    async fn classify(&self, sample: &str) -> Language {
        if sample.trim().is_empty() {
            return Language::Unknown;
        }

        let prompt = format!("Detect language: {sample}");
        match self
            .model
            .complete(DETECT_INSTRUCTION, &prompt, DETECT_TEMPERATURE)
            .await
        {
            Ok(reply) => {
                let language = Language::from_label(&reply);
                if language == Language::Unknown {
                    debug!(reply = %reply, "unexpected language label");
                }
                language
            }
            Err(e) => {
                warn!(error = %e, "language detection failed");
                Language::Unknown
            }
        }
    }
}
