pub mod html;

use crate::results::PageRecord;

/// Result of parsing one HTML document
#[derive(Debug, Clone)]
pub struct ParseResult {
    /// Structured record for the page
    pub record: PageRecord,
    /// Raw `href` targets in document order (unresolved)
    pub links: Vec<String>,
}

impl ParseResult {
    /// Creates a new parse result
    pub fn new(record: PageRecord, links: Vec<String>) -> Self {
        Self { record, links }
    }
}
