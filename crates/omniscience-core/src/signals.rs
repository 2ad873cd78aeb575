//! Signal subscriptions: which engine component listens to which raw
//! signal class.
//!
//! Components never hold listeners of their own. Each one declares the set
//! of [`SignalKind`]s it currently wants and the [`SignalRouter`] reconciles
//! that declaration against what is already registered, starting new
//! subscriptions and stopping removed ones. A raw signal nobody subscribes
//! to is dropped at the router, so a dormant component costs nothing.
//!
//! Tearing a component down is `release`; tearing the session down is
//! `release_all`. After either, no subscription for that component remains.

use std::collections::{BTreeMap, BTreeSet};

use omniscience_types::SignalKind;
use tracing::debug;

/// An engine component that can hold signal subscriptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Listener {
    /// The interaction collector.
    Collector,
    /// The awakened resonance of the watcher overlay.
    Resonance,
}

/// Subscriptions started and stopped by one reconciliation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscriptionDiff {
    /// Signal classes newly subscribed.
    pub added: BTreeSet<SignalKind>,
    /// Signal classes no longer subscribed.
    pub removed: BTreeSet<SignalKind>,
}

impl SubscriptionDiff {
    /// Whether the reconciliation changed nothing.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Registry of live signal subscriptions.
#[derive(Debug, Clone, Default)]
pub struct SignalRouter {
    subscriptions: BTreeMap<Listener, BTreeSet<SignalKind>>,
}

impl SignalRouter {
    /// Create a router with no subscriptions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `listener`'s subscriptions equal to `wanted`.
    pub fn reconcile(
        &mut self,
        listener: Listener,
        wanted: &BTreeSet<SignalKind>,
    ) -> SubscriptionDiff {
        let current = self.subscriptions.remove(&listener).unwrap_or_default();
        let diff = SubscriptionDiff {
            added: wanted.difference(&current).copied().collect(),
            removed: current.difference(wanted).copied().collect(),
        };
        if !wanted.is_empty() {
            self.subscriptions.insert(listener, wanted.clone());
        }
        if !diff.is_empty() {
            debug!(
                listener = ?listener,
                added = ?diff.added,
                removed = ?diff.removed,
                "Signal subscriptions reconciled"
            );
        }
        diff
    }

    /// Drop every subscription held by `listener`. Returns how many were
    /// released.
    pub fn release(&mut self, listener: Listener) -> usize {
        let released = self
            .subscriptions
            .remove(&listener)
            .map_or(0, |kinds| kinds.len());
        if released > 0 {
            debug!(listener = ?listener, released, "Signal subscriptions released");
        }
        released
    }

    /// Drop every subscription of every listener. Returns how many were
    /// released.
    pub fn release_all(&mut self) -> usize {
        let released = self.subscription_count();
        self.subscriptions.clear();
        released
    }

    /// Listeners subscribed to `kind`, in a stable order.
    pub fn listeners_for(&self, kind: SignalKind) -> Vec<Listener> {
        self.subscriptions
            .iter()
            .filter(|(_, kinds)| kinds.contains(&kind))
            .map(|(listener, _)| *listener)
            .collect()
    }

    /// Whether `listener` is subscribed to `kind`.
    pub fn is_subscribed(&self, listener: Listener, kind: SignalKind) -> bool {
        self.subscriptions
            .get(&listener)
            .is_some_and(|kinds| kinds.contains(&kind))
    }

    /// Total number of (listener, signal class) subscriptions.
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.values().map(BTreeSet::len).sum()
    }

    /// Whether no subscription is held at all.
    pub fn is_idle(&self) -> bool {
        self.subscriptions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(list: &[SignalKind]) -> BTreeSet<SignalKind> {
        list.iter().copied().collect()
    }

    #[test]
    fn new_router_is_idle() {
        let router = SignalRouter::new();
        assert!(router.is_idle());
        assert!(router.listeners_for(SignalKind::Click).is_empty());
    }

    #[test]
    fn reconcile_reports_added_and_removed() {
        let mut router = SignalRouter::new();
        let diff = router.reconcile(
            Listener::Collector,
            &kinds(&[SignalKind::Click, SignalKind::Scroll]),
        );
        assert_eq!(diff.added.len(), 2);
        assert!(diff.removed.is_empty());

        let diff = router.reconcile(
            Listener::Collector,
            &kinds(&[SignalKind::Click, SignalKind::Focus]),
        );
        assert_eq!(diff.added, kinds(&[SignalKind::Focus]));
        assert_eq!(diff.removed, kinds(&[SignalKind::Scroll]));
        assert_eq!(router.subscription_count(), 2);
    }

    #[test]
    fn unchanged_declaration_is_a_no_op() {
        let mut router = SignalRouter::new();
        let wanted = kinds(&SignalKind::ALL);
        router.reconcile(Listener::Collector, &wanted);
        let diff = router.reconcile(Listener::Collector, &wanted);
        assert!(diff.is_empty());
    }

    #[test]
    fn routes_to_every_subscribed_listener() {
        let mut router = SignalRouter::new();
        router.reconcile(Listener::Collector, &kinds(&SignalKind::ALL));
        router.reconcile(Listener::Resonance, &kinds(&[SignalKind::Click]));

        assert_eq!(
            router.listeners_for(SignalKind::Click),
            vec![Listener::Collector, Listener::Resonance]
        );
        assert_eq!(
            router.listeners_for(SignalKind::KeyPress),
            vec![Listener::Collector]
        );
        assert!(router.is_subscribed(Listener::Resonance, SignalKind::Click));
        assert!(!router.is_subscribed(Listener::Resonance, SignalKind::Focus));
    }

    #[test]
    fn release_drops_only_that_listener() {
        let mut router = SignalRouter::new();
        router.reconcile(Listener::Collector, &kinds(&SignalKind::ALL));
        router.reconcile(Listener::Resonance, &kinds(&[SignalKind::Click]));

        assert_eq!(router.release(Listener::Collector), 5);
        assert_eq!(router.subscription_count(), 1);
        assert_eq!(router.release(Listener::Collector), 0);
    }

    #[test]
    fn release_all_leaves_nothing_behind() {
        let mut router = SignalRouter::new();
        router.reconcile(Listener::Collector, &kinds(&SignalKind::ALL));
        router.reconcile(Listener::Resonance, &kinds(&[SignalKind::Scroll]));
        assert_eq!(router.release_all(), 6);
        assert!(router.is_idle());
    }

    #[test]
    fn empty_declaration_unsubscribes() {
        let mut router = SignalRouter::new();
        router.reconcile(Listener::Resonance, &kinds(&[SignalKind::Scroll]));
        let diff = router.reconcile(Listener::Resonance, &BTreeSet::new());
        assert_eq!(diff.removed, kinds(&[SignalKind::Scroll]));
        assert!(router.is_idle());
    }
}
