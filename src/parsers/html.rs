use crate::config::SufficiencyConfig;
use crate::parsers::ParseResult;
use crate::results::PageRecord;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;

static TITLE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("title").unwrap());
static META: LazyLock<Selector> = LazyLock::new(|| Selector::parse("meta[name]").unwrap());
static ANCHOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").unwrap());
static DIV_WITH_ID: LazyLock<Selector> = LazyLock::new(|| Selector::parse("div[id]").unwrap());

// Containers are matched so the sufficiency count sees them, but never emit text.
static CONTENT: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h1, h2, h3, p, ul, ol, li, span").unwrap());

/// Parses HTML into a page record and its links
pub fn parse(html: &str, url: &str) -> ParseResult {
    let doc = Html::parse_document(html);

    let record = record_from(&doc, url);
    let links = links_from(&doc);

    ::log::debug!(
        "HTML parser found {} content chars and {} links in {}",
        record.content.len(),
        links.len(),
        url
    );

    ParseResult::new(record, links)
}

/// Returns false when the page probably needs a browser to render
pub fn is_content_sufficient(html: &str, config: &SufficiencyConfig) -> bool {
    sufficient(&Html::parse_document(html), config)
}

fn record_from(doc: &Html, url: &str) -> PageRecord {
    let title = doc
        .select(&TITLE)
        .next()
        .map(|el| normalized_text(&el))
        .unwrap_or_default();

    let description = doc
        .select(&META)
        .find(|el| {
            el.value()
                .attr("name")
                .is_some_and(|name| name.eq_ignore_ascii_case("description"))
        })
        .and_then(|el| el.value().attr("content"))
        .map(|content| content.trim().to_string())
        .unwrap_or_default();

    let content = doc
        .select(&CONTENT)
        .filter(|el| !matches!(el.value().name(), "ul" | "ol"))
        .filter_map(|el| {
            let text = normalized_text(&el);
            if text.is_empty() {
                None
            } else {
                Some(format!("{}: {}", el.value().name().to_ascii_uppercase(), text))
            }
        })
        .collect::<Vec<_>>()
        .join("\n");

    PageRecord::new(url.to_string(), title, description, content)
}

fn links_from(doc: &Html) -> Vec<String> {
    doc.select(&ANCHOR)
        .filter_map(|e| e.value().attr("href"))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn sufficient(doc: &Html, config: &SufficiencyConfig) -> bool {
    if doc.select(&TITLE).next().is_none() {
        return false;
    }

    if doc.select(&CONTENT).count() < config.min_content_elements {
        return false;
    }

    let empty_mount = doc.select(&DIV_WITH_ID).any(|el| {
        let id = el.value().attr("id").unwrap_or_default();
        config.js_root_ids.iter().any(|root| root == id) && normalized_text(&el).is_empty()
    });

    !empty_mount
}

fn normalized_text(el: &ElementRef<'_>) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}
