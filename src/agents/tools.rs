//! Model-backed helpers the agency can call: sentiment, translation, content briefs.

use chrono::Local;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::lang::Language;
use crate::llm::{ChatModel, strip_code_fence};
use crate::research::{RESULTS_PER_LOCALE, ResearchBundle, TIMESTAMP_FORMAT};
use crate::search::Locale;

const SENTIMENT_INSTRUCTION: &str = "Analyze the sentiment of the following text and respond with a JSON containing 'sentiment' (positive, negative, or neutral) and 'confidence' (0-1).";
const SENTIMENT_TEMPERATURE: f32 = 0.1;
const TRANSLATE_INSTRUCTION: &str =
    "You are a translator. Translate the following text to English, maintaining key terms and context.";
const TRANSLATE_TEMPERATURE: f32 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sentiment {
    pub sentiment: SentimentLabel,
    pub confidence: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Sentiment {
    fn unknown(error: impl ToString) -> Self {
        Self {
            sentiment: SentimentLabel::Unknown,
            confidence: 0.0,
            error: Some(error.to_string()),
        }
    }
}

/// Classifies `text` as positive, negative or neutral. Never fails: model or
/// parse errors yield `unknown` with zero confidence and the error attached.
pub async fn analyze_sentiment(model: &impl ChatModel, text: &str) -> Sentiment {
    let reply = match model
        .complete(SENTIMENT_INSTRUCTION, text, SENTIMENT_TEMPERATURE)
        .await
    {
        Ok(reply) => reply,
        Err(e) => {
            warn!(error = %e, "sentiment analysis failed");
            return Sentiment::unknown(e);
        }
    };

    match serde_json::from_str::<Sentiment>(strip_code_fence(&reply)) {
        Ok(mut sentiment) => {
            sentiment.confidence = sentiment.confidence.clamp(0.0, 1.0);
            sentiment.error = None;
            info!(sentiment = ?sentiment.sentiment, confidence = sentiment.confidence, "sentiment analyzed");
            sentiment
        }
        Err(e) => {
            warn!(error = %e, reply = %reply, "unparseable sentiment reply");
            Sentiment::unknown(e)
        }
    }
}

/// Translates `text` to English; on any failure the input comes back unchanged.
pub async fn translate_to_english(model: &impl ChatModel, text: &str) -> String {
    if text.trim().is_empty() {
        return text.to_string();
    }
    let prompt = format!("Translate to English: {text}");
    match model
        .complete(TRANSLATE_INSTRUCTION, &prompt, TRANSLATE_TEMPERATURE)
        .await
    {
        Ok(translated) => translated,
        Err(e) => {
            warn!(error = %e, "translation failed");
            text.to_string()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SummaryEntry {
    Result {
        title: String,
        snippet: String,
        link: String,
        language: Locale,
    },
    Detail {
        detailed_content: String,
        language: Language,
        source: String,
    },
}

/// Structured material a writer works from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentBrief {
    pub topic: String,
    #[serde(rename = "type")]
    pub content_type: String,
    pub timestamp: String,
    pub research_summary: Vec<SummaryEntry>,
    pub sources: Vec<String>,
}

/// Builds a brief from a research bundle: top results per locale tagged with
/// their language, then the scraped content of each page.
pub fn write_content(topic: &str, content_type: &str, bundle: &ResearchBundle) -> ContentBrief {
    let mut research_summary = Vec::new();
    let mut sources = Vec::new();

    for locale in Locale::ALL {
        for result in bundle.results_for(locale).iter().take(RESULTS_PER_LOCALE) {
            research_summary.push(SummaryEntry::Result {
                title: result.title.clone(),
                snippet: result.snippet.clone(),
                link: result.link.clone(),
                language: locale,
            });
            sources.push(result.link.clone());
        }
    }

    research_summary.extend(bundle.scraped_pages.iter().map(|page| SummaryEntry::Detail {
        detailed_content: page.content.clone(),
        language: page.language,
        source: page.url.clone(),
    }));

    info!(topic, entries = research_summary.len(), "content brief assembled");
    ContentBrief {
        topic: topic.to_string(),
        content_type: content_type.to_string(),
        timestamp: Local::now().format(TIMESTAMP_FORMAT).to_string(),
        research_summary,
        sources,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::ScrapedPage;
    use crate::llm::LlmError;
    use crate::llm::mock::ScriptedModel;
    use crate::search::SearchResult;

    #[tokio::test]
    async fn sentiment_parses_fenced_json() {
        let model = ScriptedModel::replying(&["```json\n{\"sentiment\": \"positive\", \"confidence\": 0.92}\n```"]);
        let sentiment = analyze_sentiment(&model, "¡Me encanta este café!").await;
        assert_eq!(sentiment.sentiment, SentimentLabel::Positive);
        assert!((sentiment.confidence - 0.92).abs() < f32::EPSILON);
        assert!(sentiment.error.is_none());
        assert_eq!(model.requests()[0][0].content, SENTIMENT_INSTRUCTION);
    }

    #[tokio::test]
    async fn sentiment_garbage_degrades_to_unknown() {
        let model = ScriptedModel::replying(&["I think it's positive"]);
        let sentiment = analyze_sentiment(&model, "text").await;
        assert_eq!(sentiment.sentiment, SentimentLabel::Unknown);
        assert_eq!(sentiment.confidence, 0.0);
        assert!(sentiment.error.is_some());
    }

    #[tokio::test]
    async fn sentiment_model_error_degrades_to_unknown() {
        let model = ScriptedModel::new(vec![Err(LlmError::RateLimited)]);
        let sentiment = analyze_sentiment(&model, "text").await;
        assert_eq!(sentiment.sentiment, SentimentLabel::Unknown);
        assert!(sentiment.error.unwrap().contains("rate limit"));
    }

    #[tokio::test]
    async fn sentiment_unexpected_label_and_range_are_normalized() {
        let model = ScriptedModel::replying(&[r#"{"sentiment": "mixed", "confidence": 3}"#]);
        let sentiment = analyze_sentiment(&model, "text").await;
        assert_eq!(sentiment.sentiment, SentimentLabel::Unknown);
        assert_eq!(sentiment.confidence, 1.0);
    }

    #[tokio::test]
    async fn translation_returns_model_text() {
        let model = ScriptedModel::replying(&["Sustainable coffee"]);
        assert_eq!(translate_to_english(&model, "Café sostenible").await, "Sustainable coffee");
        assert_eq!(model.requests()[0][1].content, "Translate to English: Café sostenible");
    }

    #[tokio::test]
    async fn translation_failure_returns_input() {
        let model = ScriptedModel::new(vec![Err(LlmError::EmptyResponse)]);
        assert_eq!(translate_to_english(&model, "Hola").await, "Hola");
    }

    fn result(n: usize) -> SearchResult {
        SearchResult {
            title: format!("t{n}"),
            link: format!("https://s{n}.com"),
            snippet: format!("s{n}"),
        }
    }

    #[test]
    fn brief_tags_results_and_appends_details() {
        let bundle = ResearchBundle {
            query: "q".into(),
            timestamp: "2024-05-01 10:00:00".into(),
            spanish_results: vec![result(1), result(2)],
            english_results: vec![result(3)],
            scraped_pages: vec![ScrapedPage::from_text("https://s1.com", "cuerpo", Language::Es)],
            failed_urls: vec![],
            missing_locales: vec![],
        };

        let brief = write_content("café", "article", &bundle);

        assert_eq!(brief.sources, ["https://s1.com", "https://s2.com", "https://s3.com"]);
        assert_eq!(brief.research_summary.len(), 4);
        assert!(matches!(
            &brief.research_summary[2],
            SummaryEntry::Result { language: Locale::En, title, .. } if title == "t3"
        ));
        assert!(matches!(
            &brief.research_summary[3],
            SummaryEntry::Detail { language: Language::Es, source, .. } if source == "https://s1.com"
        ));

        let json = serde_json::to_value(&brief).unwrap();
        assert_eq!(json["type"], "article");
        assert_eq!(json["research_summary"][0]["language"], "es");
        assert_eq!(json["research_summary"][3]["detailed_content"], "cuerpo");
    }
}
