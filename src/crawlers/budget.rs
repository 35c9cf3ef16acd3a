use crate::results::PageRecord;

/// Appended on its own line after trimmed content
pub const TRIM_MARKER: &str = "...";

/// Outcome of offering a page to the budget
#[derive(Debug)]
pub enum Admission {
    /// Page fits as is
    Accepted(PageRecord),
    /// First page, cut down to fit the ceiling
    Trimmed(PageRecord),
    /// Page would overflow the ceiling; the crawl stops
    Exhausted { used: usize, needed: usize },
}

/// Running character total across accepted pages
#[derive(Debug, Clone)]
pub struct ContentBudget {
    ceiling: usize,
    used: usize,
}

impl ContentBudget {
    pub fn new(ceiling: usize) -> Self {
        Self { ceiling, used: 0 }
    }

    pub fn used(&self) -> usize {
        self.used
    }

    pub fn ceiling(&self) -> usize {
        self.ceiling
    }

    /// Charge `record` against the budget.
    ///
    /// `first` pages are never rejected: content is trimmed to
    /// `ceiling - description` chars. The description is dropped if it
    /// alone fills the ceiling.
    pub fn admit(&mut self, mut record: PageRecord, first: bool) -> Admission {
        let needed = record.budget_len();
        if self.used + needed <= self.ceiling {
            self.used += needed;
            return Admission::Accepted(record);
        }

        if !first {
            return Admission::Exhausted {
                used: self.used,
                needed,
            };
        }

        if record.description.chars().count() >= self.ceiling {
            record.description.clear();
        }
        let allowance = self
            .ceiling
            .saturating_sub(self.used + record.description.chars().count());
        record.content = trim_to_chars(&record.content, allowance);
        self.used += record.budget_len();
        Admission::Trimmed(record)
    }
}

/// Cut `content` to at most `limit` chars, keeping whole lines where possible
pub fn trim_to_chars(content: &str, limit: usize) -> String {
    if content.chars().count() <= limit {
        return content.to_string();
    }

    let marker_len = TRIM_MARKER.chars().count() + 1;
    if limit <= marker_len {
        return content.chars().take(limit).collect();
    }

    let room = limit - marker_len;
    let mut kept: Vec<&str> = Vec::new();
    let mut kept_len = 0;
    for line in content.lines() {
        let line_len = line.chars().count();
        let joined_len = if kept.is_empty() {
            line_len
        } else {
            kept_len + 1 + line_len
        };
        if joined_len > room {
            break;
        }
        kept.push(line);
        kept_len = joined_len;
    }

    let head = if kept.is_empty() {
        content.chars().take(room).collect::<String>()
    } else {
        kept.join("\n")
    };
    format!("{head}\n{TRIM_MARKER}")
}
