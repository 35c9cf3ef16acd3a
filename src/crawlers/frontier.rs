use std::collections::{HashSet, VecDeque};
use url::Url;

/// Two-tier crawl queue.
///
/// Priority URLs are always popped before regular ones; each tier is FIFO.
/// A URL is accepted at most once for the lifetime of the frontier, so a
/// page that was discarded is never retried.
#[derive(Debug, Default)]
pub struct Frontier {
    priority: VecDeque<Url>,
    regular: VecDeque<Url>,
    queued: HashSet<String>,
}

impl Frontier {
    pub fn new(start: Url) -> Self {
        let mut frontier = Self::default();
        frontier.push(start, false);
        frontier
    }

    /// Queue a URL; returns false if it was seen before
    pub fn push(&mut self, url: Url, priority: bool) -> bool {
        if !self.queued.insert(url.as_str().to_string()) {
            return false;
        }
        if priority {
            self.priority.push_back(url);
        } else {
            self.regular.push_back(url);
        }
        true
    }

    pub fn pop(&mut self) -> Option<Url> {
        self.priority
            .pop_front()
            .or_else(|| self.regular.pop_front())
    }

    pub fn len(&self) -> usize {
        self.priority.len() + self.regular.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
