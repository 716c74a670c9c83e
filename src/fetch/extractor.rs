use scraper::{ElementRef, Html, Node, Selector};

/// Subtrees that hold code or boilerplate rather than prose.
const REMOVED_TAGS: [&str; 5] = ["script", "style", "iframe", "nav", "footer"];
const CONTENT_TAGS: [&str; 8] = ["p", "h1", "h2", "h3", "h4", "h5", "h6", "article"];
const CONTENT_SELECTOR: &str = "p, h1, h2, h3, h4, h5, h6, article";

/// Extracts whitespace-normalized text from paragraphs, headings and article blocks.
///
/// Content elements nested inside another content element (a `<p>` inside an
/// `<article>`) are read once, through the outermost one.
pub(crate) fn extract_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse(CONTENT_SELECTOR) else {
        return String::new();
    };

    let mut pieces = Vec::new();
    for element in document.select(&selector) {
        if has_ancestor(element, &REMOVED_TAGS) || has_ancestor(element, &CONTENT_TAGS) {
            continue;
        }
        let mut text = String::new();
        collect_text(element, &mut text);
        let text = normalize_whitespace(&text);
        if !text.is_empty() {
            pieces.push(text);
        }
    }

    pieces.join(" ")
}

fn has_ancestor(element: ElementRef<'_>, tags: &[&str]) -> bool {
    element
        .ancestors()
        .filter_map(|node| node.value().as_element())
        .any(|el| tags.contains(&el.name()))
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) => {
                let name = el.name();
                if REMOVED_TAGS.contains(&name) {
                    continue;
                }
                let block = CONTENT_TAGS.contains(&name) || matches!(name, "br" | "div" | "li");
                if block {
                    out.push(' ');
                }
                if let Some(child_ref) = ElementRef::wrap(child) {
                    collect_text(child_ref, out);
                }
                if block {
                    out.push(' ');
                }
            }
            _ => {}
        }
    }
}

/// Collapses every run of whitespace into one space and trims both ends.
fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// First `max_chars` characters of `text`, never splitting a code point.
pub(crate) fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}
