use serde::{Deserialize, Serialize};

/// One crawled page after extraction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRecord {
    /// URL of the page
    pub url: String,

    /// Text of the `<title>` element, empty if missing
    pub title: String,

    /// Content of `meta[name=description]`, empty if missing
    pub description: String,

    /// Newline-joined `"<TAG>: <text>"` lines in document order
    pub content: String,
}

impl PageRecord {
    /// Create a new page record
    pub fn new(url: String, title: String, description: String, content: String) -> Self {
        Self {
            url,
            title,
            description,
            content,
        }
    }

    /// Characters this record charges against the crawl budget
    pub fn budget_len(&self) -> usize {
        self.content.chars().count() + self.description.chars().count()
    }

    /// Whether the record carries any content worth keeping
    pub fn has_content(&self) -> bool {
        !self.content.trim().is_empty()
    }
}

/// Render pages into the text block that is substituted into prompts
pub fn combine_pages(pages: &[PageRecord]) -> String {
    let mut parts = Vec::with_capacity(pages.len() * 6);
    for page in pages {
        parts.push(format!("URL: {}", page.url));
        parts.push(format!("Title: {}", page.title));
        parts.push(format!("Description: {}", page.description));
        parts.push("Content:".to_string());
        parts.push(page.content.clone());
        parts.push("\n---\n".to_string());
    }
    parts.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_budget_len_counts_chars() {
        let page = PageRecord::new(
            "https://example.com".to_string(),
            "T".to_string(),
            "日本".to_string(),
            "P: abc".to_string(),
        );
        assert_eq!(page.budget_len(), 8);
    }

    #[test]
    fn test_combine_pages_layout() {
        let pages = vec![PageRecord::new(
            "https://example.com/".to_string(),
            "Home".to_string(),
            "Welcome".to_string(),
            "H1: Hello".to_string(),
        )];
        let combined = combine_pages(&pages);
        assert!(combined.starts_with("URL: https://example.com/\nTitle: Home\n"));
        assert!(combined.contains("Content:\nH1: Hello\n"));
        assert!(combined.ends_with("---\n"));
    }
}
