//! Renders a research bundle into the opening message of the agent conversation.

use std::fmt::Write;

use super::aggregator::ResearchBundle;
use crate::fetch::truncate_chars;
use crate::search::SearchResult;

/// Per-page excerpt length inside the prompt; the bundle keeps the full 5000.
const PROMPT_EXCERPT_CHARS: usize = 1500;
const NO_RESULTS: &str = "No se encontraron resultados.";

pub fn render_initial_message(brand_task: &str, user_task: &str, bundle: &ResearchBundle) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Analiza y proporciona estrategias para: {}", single_line(user_task));
    let _ = writeln!(out, "Contexto de la empresa/marca: {}", single_line(brand_task));
    out.push('\n');
    out.push_str("Resultados de la investigación en tiempo real:\n\n");

    out.push_str("Resultados en español:\n");
    out.push_str(&format_search_results(&bundle.spanish_results));
    out.push_str("\n\n");

    out.push_str("Resultados en inglés:\n");
    out.push_str(&format_search_results(&bundle.english_results));
    out.push_str("\n\n");

    if !bundle.scraped_pages.is_empty() {
        out.push_str("Contenido extraído de las fuentes:\n\n");
        for page in &bundle.scraped_pages {
            let excerpt = truncate_chars(&page.content, PROMPT_EXCERPT_CHARS);
            let ellipsis = if excerpt.len() < page.content.len() || page.is_truncated() {
                "..."
            } else {
                ""
            };
            let _ = writeln!(
                out,
                "[{}] ({}, idioma: {})\n{excerpt}{ellipsis}\n",
                page.url,
                page.length,
                page.language.as_str(),
            );
        }
    }

    out.push_str(
        "Por favor, proporciona:\n\
         1. Análisis de la situación actual basado en la investigación\n\
         2. Estrategias recomendadas\n\
         3. Plan de acción detallado\n\
         4. Métricas de éxito sugeridas\n",
    );
    out
}

/// Numbered list of results, or a fixed notice when there are none.
pub fn format_search_results(results: &[SearchResult]) -> String {
    if results.is_empty() {
        return NO_RESULTS.to_string();
    }
    results
        .iter()
        .enumerate()
        .map(|(i, r)| {
            format!(
                "{}. {}\n   URL: {}\n   Resumen: {}\n",
                i + 1,
                single_line(&r.title),
                r.link,
                single_line(&r.snippet)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn single_line(s: &str) -> String {
    s.chars()
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::ScrapedPage;
    use crate::lang::Language;

    fn result(title: &str) -> SearchResult {
        SearchResult {
            title: title.into(),
            link: "https://a.com".into(),
            snippet: "Resumen corto".into(),
        }
    }

    fn bundle(pages: Vec<ScrapedPage>) -> ResearchBundle {
        ResearchBundle {
            query: "EcoCafe sostenibilidad".into(),
            timestamp: "2024-05-01 10:00:00".into(),
            spanish_results: vec![result("Café verde"), result("Mercado")],
            english_results: vec![],
            scraped_pages: pages,
            failed_urls: vec![],
            missing_locales: vec![],
        }
    }

    #[test]
    fn numbered_results_format() {
        let text = format_search_results(&[result("Uno"), result("Dos")]);
        assert!(text.starts_with("1. Uno\n   URL: https://a.com\n   Resumen: Resumen corto\n"));
        assert!(text.contains("2. Dos"));
    }

    #[test]
    fn empty_results_notice() {
        assert_eq!(format_search_results(&[]), NO_RESULTS);
    }

    #[test]
    fn titles_are_flattened() {
        let text = format_search_results(&[result("línea uno\nlínea dos")]);
        assert!(text.contains("1. línea uno línea dos"));
    }

    #[test]
    fn initial_message_has_context_and_deliverables() {
        let text = render_initial_message("EcoCafe", "marketing sostenible", &bundle(vec![]));
        assert!(text.contains("Analiza y proporciona estrategias para: marketing sostenible"));
        assert!(text.contains("Contexto de la empresa/marca: EcoCafe"));
        assert!(text.contains("Resultados en español:\n1. Café verde"));
        assert!(text.contains(&format!("Resultados en inglés:\n{NO_RESULTS}")));
        assert!(text.contains("4. Métricas de éxito sugeridas"));
        assert!(!text.contains("Contenido extraído"));
    }

    #[test]
    fn page_excerpts_are_bounded() {
        let long = "a".repeat(4000);
        let page = ScrapedPage::from_text("https://long.com", &long, Language::En);
        let text = render_initial_message("b", "u", &bundle(vec![page]));
        assert!(text.contains("[https://long.com] (4000, idioma: en)"));
        assert!(text.contains(&format!("{}...", "a".repeat(PROMPT_EXCERPT_CHARS))));
        assert!(!text.contains(&"a".repeat(PROMPT_EXCERPT_CHARS + 1)));
    }
}
