use serde::{Deserialize, Serialize};

pub const UNTITLED: &str = "Sin título";
pub const NOT_AVAILABLE: &str = "No disponible";

#[derive(Debug, Serialize)]
pub struct SearchRequest<'a> {
    pub q: &'a str,
    pub gl: &'a str,
    pub hl: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub organic: Vec<OrganicResult>,
}

#[derive(Debug, Deserialize)]
pub struct OrganicResult {
    pub title: Option<String>,
    pub link: Option<String>,
    pub snippet: Option<String>,
}

/// One organic hit. Missing API fields are filled with placeholders so
/// downstream formatting never sees an absent value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub link: String,
    pub snippet: String,
}

impl From<OrganicResult> for SearchResult {
    fn from(r: OrganicResult) -> Self {
        Self {
            title: r.title.unwrap_or_else(|| UNTITLED.to_string()),
            link: r.link.unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            snippet: r.snippet.unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_get_placeholders() {
        let raw: OrganicResult = serde_json::from_str(r#"{"link": "https://a.com"}"#).unwrap();
        let result = SearchResult::from(raw);
        assert_eq!(result.title, UNTITLED);
        assert_eq!(result.link, "https://a.com");
        assert_eq!(result.snippet, NOT_AVAILABLE);
    }

    #[test]
    fn empty_snippet_is_kept_as_is() {
        let raw: OrganicResult =
            serde_json::from_str(r#"{"title": "T", "link": "https://a.com", "snippet": ""}"#)
                .unwrap();
        assert_eq!(SearchResult::from(raw).snippet, "");
    }

    #[test]
    fn response_without_organic_is_empty() {
        let body: SearchResponse = serde_json::from_str(r#"{"searchParameters": {}}"#).unwrap();
        assert!(body.organic.is_empty());
    }
}
