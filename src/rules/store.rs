//! Ordered rule storage.
//!
//! # Responsibilities
//! - Gate entry of rules (validation + compilation)
//! - Keep rules in registration order
//! - Hand out consistent snapshots to the dispatcher
//!
//! # Design Decisions
//! - Backed by `ArcSwap`: readers load an `Arc<Vec<Rule>>` without locking
//!   and always see either the old or the new sequence in full
//! - Writers copy-on-write; registration is rare compared to dispatch
//! - Invalid rules are logged and skipped, construction never fails

use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::observability::metrics;
use crate::observability::RewriteLogger;
use crate::rules::rule::{RawRule, Rule, RuleError};

/// Shared, ordered collection of compiled rules.
pub struct RuleStore {
    rules: ArcSwap<Vec<Rule>>,
    logger: Arc<dyn RewriteLogger>,
}

impl RuleStore {
    /// Create a store and register `raw_rules` in order.
    pub fn new(raw_rules: impl IntoIterator<Item = RawRule>, logger: Arc<dyn RewriteLogger>) -> Self {
        let store = Self {
            rules: ArcSwap::from_pointee(Vec::new()),
            logger,
        };
        for raw in raw_rules {
            store.register(&raw);
        }
        store
    }

    /// Register a rule. Returns false if it was refused.
    pub fn register(&self, raw: &RawRule) -> bool {
        self.try_register(raw).is_ok()
    }

    /// Register a rule, reporting why it was refused.
    pub fn try_register(&self, raw: &RawRule) -> Result<(), RuleError> {
        let rule = self.compile(raw)?;

        let mut loaded = 0;
        self.rules.rcu(|current| {
            let mut next = Vec::with_capacity(current.len() + 1);
            next.extend(current.iter().cloned());
            next.push(rule.clone());
            loaded = next.len();
            next
        });
        metrics::set_rules_loaded(loaded);
        Ok(())
    }

    /// Drop every rule.
    pub fn reset(&self) {
        self.rules.store(Arc::new(Vec::new()));
        metrics::set_rules_loaded(0);
    }

    /// Swap in a whole new rule sequence. Invalid entries are skipped.
    ///
    /// Returns the number of rules accepted.
    pub fn replace(&self, raw_rules: impl IntoIterator<Item = RawRule>) -> usize {
        let rules: Vec<Rule> = raw_rules
            .into_iter()
            .filter_map(|raw| self.compile(&raw).ok())
            .collect();
        let count = rules.len();

        self.rules.store(Arc::new(rules));
        metrics::set_rules_loaded(count);
        count
    }

    /// Current rule sequence. The snapshot is unaffected by later changes.
    pub fn list(&self) -> Arc<Vec<Rule>> {
        self.rules.load_full()
    }

    pub fn len(&self) -> usize {
        self.rules.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.load().is_empty()
    }

    pub fn logger(&self) -> &dyn RewriteLogger {
        self.logger.as_ref()
    }

    fn compile(&self, raw: &RawRule) -> Result<Rule, RuleError> {
        match Rule::compile(raw) {
            Ok(rule) => {
                self.logger.registered(&rule);
                Ok(rule)
            }
            Err(e) => {
                self.logger.rejected(&e);
                Err(e)
            }
        }
    }
}

impl std::fmt::Debug for RuleStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleStore")
            .field("rules", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::logging::testing::RecordingLogger;
    use crate::observability::metrics::testing::RecordingRecorder;
    use crate::observability::SilentLogger;
    use serde_json::json;

    fn store() -> RuleStore {
        RuleStore::new(Vec::<RawRule>::new(), Arc::new(SilentLogger))
    }

    #[test]
    fn test_register_validation() {
        let store = store();

        assert!(!store.register(&RawRule::new("", "/x")));
        assert!(!store.register(&RawRule::new("/x", "")));
        assert!(!store.register(&RawRule::default()));
        assert_eq!(store.len(), 0);

        assert!(store.register(&RawRule::new("/a", "/b")));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_register_default_redirect() {
        let store = store();
        store.register(&RawRule::new("/a", "/b").with_redirect(true));
        store.register(&RawRule::new("/c", "/d").with_redirect("permanent"));

        let rules = store.list();
        assert_eq!(rules[0].redirect().map(|s| s.as_u16()), Some(302));
        assert_eq!(rules[1].redirect().map(|s| s.as_u16()), Some(302));
    }

    #[test]
    fn test_order_preserved() {
        let store = RuleStore::new(
            vec![
                RawRule::new("^/1$", "/a"),
                RawRule::default(),
                RawRule::new("^/2$", "/b"),
                RawRule::new("^/3$", "/c"),
            ],
            Arc::new(SilentLogger),
        );

        let patterns: Vec<_> = store.list().iter().map(|r| r.from().as_str().to_string()).collect();
        assert_eq!(patterns, vec!["^/1$", "^/2$", "^/3$"]);
    }

    #[test]
    fn test_reset_is_idempotent() {
        let store = RuleStore::new(vec![RawRule::new("/a", "/b")], Arc::new(SilentLogger));
        store.reset();
        assert!(store.list().is_empty());
        store.reset();
        assert!(store.list().is_empty());
        assert!(store.is_empty());
    }

    #[test]
    fn test_snapshot_unaffected_by_later_writes() {
        let store = RuleStore::new(vec![RawRule::new("/a", "/b")], Arc::new(SilentLogger));
        let snapshot = store.list();

        store.register(&RawRule::new("/c", "/d"));
        store.reset();

        assert_eq!(snapshot.len(), 1);
        assert!(store.is_empty());
    }

    #[test]
    fn test_replace_swaps_whole_sequence() {
        let store = RuleStore::new(vec![RawRule::new("/a", "/b")], Arc::new(SilentLogger));
        let accepted = store.replace(vec![
            RawRule::new("/x", "/y"),
            RawRule {
                from: Some(json!(1)),
                ..RawRule::default()
            },
            RawRule::new("/z", "/w"),
        ]);

        assert_eq!(accepted, 2);
        let rules = store.list();
        assert_eq!(rules[0].from().as_str(), "/x");
        assert_eq!(rules[1].from().as_str(), "/z");
    }

    #[test]
    fn test_logging_of_registration() {
        let logger = Arc::new(RecordingLogger::default());
        let store = RuleStore::new(Vec::<RawRule>::new(), logger.clone());

        store.register(&RawRule::new("^/a$", "/b").with_redirect(301));
        let err = store.try_register(&RawRule::new("^/a$", "")).unwrap_err();
        assert!(matches!(err, RuleError::MissingTo));

        let events = logger.events();
        assert_eq!(events[0], "registered [REDIRECT 301: ^/a$ -> /b]");
        assert!(events[1].starts_with("rejected"));
    }

    #[test]
    fn test_rules_loaded_gauge_follows_store() {
        let recorder = RecordingRecorder::default();
        let gauge = || recorder.value(crate::observability::metrics::RULES_LOADED);

        ::metrics::with_local_recorder(&recorder, || {
            let store = RuleStore::new(
                vec![RawRule::new("/a", "/b"), RawRule::new("/c", "/d")],
                Arc::new(SilentLogger),
            );
            assert_eq!(gauge(), Some(2.0));

            store.register(&RawRule::new("/e", "/f"));
            assert_eq!(gauge(), Some(3.0));

            store.replace(vec![RawRule::new("/g", "/h")]);
            assert_eq!(gauge(), Some(1.0));

            store.reset();
            assert_eq!(gauge(), Some(0.0));
        });
    }

    #[test]
    fn test_concurrent_readers_see_full_sequences() {
        let store = Arc::new(RuleStore::new(Vec::<RawRule>::new(), Arc::new(SilentLogger)));

        let writer = {
            let store = store.clone();
            std::thread::spawn(move || {
                for _ in 0..50 {
                    store.replace(vec![RawRule::new("/a", "/1"), RawRule::new("/b", "/2")]);
                    store.reset();
                }
            })
        };

        for _ in 0..200 {
            let len = store.list().len();
            assert!(len == 0 || len == 2);
        }
        writer.join().unwrap();
    }
}
