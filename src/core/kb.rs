//! Shared knowledge base of facts learned about a target, keyed by base URL

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use url::{Position, Url};

/// Facts recorded during a scan, e.g. which database dialect was identified
/// for a URL. Writes are idempotent upserts, so concurrent parameter scans
/// need no coordination beyond the internal lock.
#[derive(Debug, Default)]
pub struct KnowledgeBase {
    entries: Mutex<HashMap<String, BTreeMap<String, String>>>,
}

impl KnowledgeBase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, url: &Url, key: &str, value: &str) {
        let base = base_key(url);
        let mut entries = match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        entries
            .entry(base)
            .or_default()
            .insert(key.to_string(), value.to_string());
    }

    pub fn lookup(&self, url: &Url, key: &str) -> Option<String> {
        let base = base_key(url);
        let entries = match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        entries.get(&base).and_then(|facts| facts.get(key)).cloned()
    }
}

/// The query string is not part of the key: facts apply to the page, not to
/// one particular parameter combination.
fn base_key(url: &Url) -> String {
    url[..Position::AfterPath].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_is_idempotent_and_ignores_query() {
        let kb = KnowledgeBase::new();
        let a = Url::parse("http://example.com/page?id=1").unwrap();
        let b = Url::parse("http://example.com/page?id=2'").unwrap();

        kb.record(&a, "sql/MySQL", "true");
        kb.record(&b, "sql/MySQL", "true");

        assert_eq!(kb.lookup(&a, "sql/MySQL").as_deref(), Some("true"));
        assert_eq!(kb.lookup(&b, "sql/MySQL").as_deref(), Some("true"));
        assert_eq!(kb.lookup(&a, "sql/Oracle"), None);
    }
}
