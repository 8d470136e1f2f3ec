//! Depth-bounded operation history for a tracked resource.
//!
//! Records are kept as a persistent singly-linked list with the most recent
//! entry at the head. Once the chain reaches its target depth, further
//! appends only bump an elided counter so long-lived resources under heavy
//! slicing never grow the chain unboundedly.

use std::sync::Arc;

/// Default number of records retained per handle.
pub const DEFAULT_TARGET_RECORDS: usize = 4;

struct RecordNode {
    site: String,
    depth: usize,
    next: Option<Arc<RecordNode>>,
}

/// Operation history for one leak handle.
///
/// Appends are O(1) and never reallocate existing nodes; nodes are shared
/// between chain generations via `Arc`.
pub struct RecordChain {
    head: Option<Arc<RecordNode>>,
    elided: usize,
    limit: usize,
}

impl Default for RecordChain {
    fn default() -> Self {
        Self::new(DEFAULT_TARGET_RECORDS)
    }
}

impl RecordChain {
    /// Create an empty chain that retains at most `limit` records.
    pub fn new(limit: usize) -> Self {
        Self {
            head: None,
            elided: 0,
            limit,
        }
    }

    /// Append a call-site description.
    ///
    /// Past the depth limit the entry is counted but not stored.
    pub fn append(&mut self, site: &str) {
        if self.len() >= self.limit {
            self.elided += 1;
            return;
        }
        let depth = self.head.as_ref().map_or(0, |n| n.depth) + 1;
        self.head = Some(Arc::new(RecordNode {
            site: site.to_string(),
            depth,
            next: self.head.take(),
        }));
    }

    /// Number of records currently stored (excludes elided entries).
    pub fn len(&self) -> usize {
        self.head.as_ref().map_or(0, |n| n.depth)
    }

    /// True if nothing was ever recorded.
    pub fn is_empty(&self) -> bool {
        self.head.is_none() && self.elided == 0
    }

    /// Number of appends that were elided past the depth limit.
    pub fn elided(&self) -> usize {
        self.elided
    }

    /// Render the chain most-recent-first, one call site per line.
    ///
    /// Elided appends show up as a trailing `+N more` marker. Pure; does not
    /// modify the chain.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let mut node = self.head.as_deref();
        while let Some(n) = node {
            out.push_str(&n.site);
            out.push('\n');
            node = n.next.as_deref();
        }
        if self.elided > 0 {
            out.push_str(&format!("+{} more\n", self.elided));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_prepends_most_recent_first() {
        let mut chain = RecordChain::new(8);
        chain.append("create");
        chain.append("slice");
        chain.append("order");

        let rendered = chain.render();
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines, vec!["order", "slice", "create"]);
    }

    #[test]
    fn empty_chain_renders_empty() {
        let chain = RecordChain::new(4);
        assert!(chain.is_empty());
        assert_eq!(chain.render(), "");
    }

    #[test]
    fn appends_past_limit_are_elided() {
        let mut chain = RecordChain::new(3);
        for i in 0..10 {
            chain.append(&format!("op{i}"));
        }

        assert_eq!(chain.len(), 3);
        assert_eq!(chain.elided(), 7);

        let rendered = chain.render();
        assert_eq!(rendered.lines().count(), 4);
        assert!(rendered.ends_with("+7 more\n"));
    }

    #[test]
    fn bounded_under_many_appends() {
        let mut chain = RecordChain::new(4);
        for _ in 0..100_000 {
            chain.append("slice");
        }
        // Rendered size stays bounded no matter how many appends happened.
        assert!(chain.render().lines().count() <= 5);
        assert_eq!(chain.elided(), 100_000 - 4);
    }

    #[test]
    fn zero_limit_stores_nothing() {
        let mut chain = RecordChain::new(0);
        chain.append("create");
        assert_eq!(chain.len(), 0);
        assert_eq!(chain.elided(), 1);
        assert!(!chain.is_empty());
    }
}
