//! URL frontier: the shared set of every URL admitted for crawling
//!
//! The frontier is the single piece of state every worker mutates. It owns
//! deduplication and enforcement of the total-URL budget. The lock is held
//! only for the admit-or-reject decision, never across task creation or I/O:
//! `try_admit` returns the admitted subset and the caller spawns work for it
//! after the lock is released.

use crate::sync::Guarded;
use crate::url::is_ignored;
use std::collections::HashSet;
use url::Url;

/// The set of all URLs ever admitted into the scan, capped by a budget
pub struct Frontier {
    admitted: Guarded<HashSet<Url>>,
    budget: usize,
}

impl Frontier {
    /// Creates an empty frontier with the given URL budget
    pub fn new(budget: usize) -> Self {
        Self {
            admitted: Guarded::new(HashSet::new()),
            budget,
        }
    }

    /// Decides admission for a batch of candidate URLs
    ///
    /// Admission policy, applied per candidate in discovery order:
    /// 1. drop candidates already admitted (dedup),
    /// 2. drop candidates on the host/extension ignore lists,
    /// 3. admit as many of the rest as fit under the budget; once the budget
    ///    is reached the remainder is dropped. Budget exhaustion is
    ///    saturation, not an error.
    ///
    /// Returns the admitted subset, in discovery order. The caller must
    /// spawn a download task for every returned URL — admission and task
    /// creation are one logical step.
    pub fn try_admit(&self, candidates: Vec<Url>) -> Vec<Url> {
        let mut accepted = Vec::new();

        self.admitted.update(|admitted| {
            for url in candidates {
                if admitted.len() >= self.budget {
                    break;
                }
                if is_ignored(&url) || admitted.contains(&url) {
                    continue;
                }
                admitted.insert(url.clone());
                accepted.push(url);
            }
        });

        accepted
    }

    /// True while the budget has room for at least one more URL
    pub fn has_capacity(&self) -> bool {
        self.admitted.with(|admitted| admitted.len() < self.budget)
    }

    /// Number of URLs admitted so far
    pub fn admitted_count(&self) -> usize {
        self.admitted.with(|admitted| admitted.len())
    }

    /// True if the URL has already been admitted
    pub fn contains(&self, url: &Url) -> bool {
        self.admitted.with(|admitted| admitted.contains(url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    fn urls(list: &[&str]) -> Vec<Url> {
        list.iter().map(|s| url(s)).collect()
    }

    #[test]
    fn test_admits_new_urls() {
        let frontier = Frontier::new(10);
        let admitted = frontier.try_admit(urls(&["http://a.test/", "http://b.test/"]));

        assert_eq!(admitted.len(), 2);
        assert_eq!(frontier.admitted_count(), 2);
        assert!(frontier.contains(&url("http://a.test/")));
    }

    #[test]
    fn test_duplicates_rejected() {
        let frontier = Frontier::new(10);
        frontier.try_admit(urls(&["http://a.test/"]));

        let second = frontier.try_admit(urls(&["http://a.test/", "http://b.test/"]));
        assert_eq!(second, urls(&["http://b.test/"]));
        assert_eq!(frontier.admitted_count(), 2);
    }

    #[test]
    fn test_duplicates_within_one_batch_rejected() {
        let frontier = Frontier::new(10);
        let admitted = frontier.try_admit(urls(&["http://a.test/", "http://a.test/"]));
        assert_eq!(admitted.len(), 1);
    }

    #[test]
    fn test_budget_never_exceeded() {
        let frontier = Frontier::new(3);
        let admitted = frontier.try_admit(urls(&[
            "http://a.test/",
            "http://b.test/",
            "http://c.test/",
            "http://d.test/",
            "http://e.test/",
        ]));

        assert_eq!(admitted.len(), 3);
        assert_eq!(frontier.admitted_count(), 3);
        assert!(!frontier.has_capacity());
    }

    #[test]
    fn test_truncation_keeps_discovery_order() {
        let frontier = Frontier::new(3);
        frontier.try_admit(urls(&["http://a.test/"]));

        let admitted = frontier.try_admit(urls(&[
            "http://b.test/",
            "http://c.test/",
            "http://d.test/",
        ]));
        assert_eq!(admitted, urls(&["http://b.test/", "http://c.test/"]));
        assert!(!frontier.contains(&url("http://d.test/")));
    }

    #[test]
    fn test_full_frontier_admits_nothing() {
        let frontier = Frontier::new(1);
        frontier.try_admit(urls(&["http://a.test/"]));

        let admitted = frontier.try_admit(urls(&["http://b.test/"]));
        assert!(admitted.is_empty());
        assert_eq!(frontier.admitted_count(), 1);
    }

    #[test]
    fn test_ignored_urls_never_admitted() {
        let frontier = Frontier::new(10);
        let admitted = frontier.try_admit(urls(&[
            "https://www.facebook.com/page",
            "https://a.test/photo.jpg",
            "https://a.test/page",
        ]));

        assert_eq!(admitted, urls(&["https://a.test/page"]));
    }

    #[test]
    fn test_ignored_urls_do_not_consume_budget() {
        let frontier = Frontier::new(2);
        let admitted = frontier.try_admit(urls(&[
            "https://a.test/doc.pdf",
            "https://a.test/one",
            "https://a.test/two",
        ]));

        assert_eq!(admitted, urls(&["https://a.test/one", "https://a.test/two"]));
    }

    #[test]
    fn test_budget_invariant_across_many_batches() {
        let frontier = Frontier::new(7);

        for batch in 0..10 {
            let candidates: Vec<Url> = (0..5)
                .map(|i| url(&format!("http://host{}.test/page{}", batch, i)))
                .collect();
            frontier.try_admit(candidates);
            assert!(frontier.admitted_count() <= 7);
        }

        assert_eq!(frontier.admitted_count(), 7);
    }
}
