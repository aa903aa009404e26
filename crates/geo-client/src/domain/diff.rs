//! # Subscription Diff Engine
//!
//! Turns "currently subscribed" + "now desired" into positional
//! unsubscribe/subscribe lists. A topic present in both lists is replaced by
//! a tombstone (empty string) in both outputs; everything else keeps its
//! original slot.
//!
//! ```text
//! current  ["/1/2/#", "/1/3/#"]      desired  ["/1/2/#", "/1/3/4/#"]
//!              │         │                        │          │
//! unsub    [   "",   "/1/3/#" ]      sub      [   "",   "/1/3/4/#" ]
//! ```
//!
//! Matching is exact string equality, O(n·m); both sides are bounded by the
//! covering's `max_cells`, so the quadratic scan stays tiny.

/// Marker for "no action in this slot".
pub const TOMBSTONE: &str = "";

/// Result of diffing two subscription sets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscriptionDiff {
    /// Same length as `current`; non-tombstone slots must be unsubscribed.
    pub to_unsubscribe: Vec<String>,
    /// Same length as `desired`; non-tombstone slots must be subscribed.
    pub to_subscribe: Vec<String>,
}

impl SubscriptionDiff {
    /// Topics to unsubscribe, tombstones skipped.
    pub fn unsubscribes(&self) -> impl Iterator<Item = &str> {
        live(&self.to_unsubscribe)
    }

    /// Topics to subscribe, tombstones skipped.
    pub fn subscribes(&self) -> impl Iterator<Item = &str> {
        live(&self.to_subscribe)
    }

    /// Whether no transport action is needed.
    pub fn is_empty(&self) -> bool {
        self.unsubscribes().next().is_none() && self.subscribes().next().is_none()
    }
}

fn live(slots: &[String]) -> impl Iterator<Item = &str> {
    slots
        .iter()
        .map(String::as_str)
        .filter(|t| *t != TOMBSTONE)
}

/// Diff two subscription sets.
///
/// Each `current` entry cancels at most one unconsumed equal `desired` entry
/// (first match wins), so duplicates never double-cancel.
pub fn diff_subscriptions(current: &[String], desired: &[String]) -> SubscriptionDiff {
    let mut to_unsubscribe = current.to_vec();
    let mut to_subscribe = desired.to_vec();
    let mut consumed = vec![false; desired.len()];

    for (i, ct) in current.iter().enumerate() {
        if ct == TOMBSTONE {
            continue;
        }
        let matched = desired
            .iter()
            .enumerate()
            .find(|(j, dt)| !consumed[*j] && *dt == ct)
            .map(|(j, _)| j);
        if let Some(j) = matched {
            consumed[j] = true;
            to_unsubscribe[i] = TOMBSTONE.to_owned();
            to_subscribe[j] = TOMBSTONE.to_owned();
        }
    }

    SubscriptionDiff {
        to_unsubscribe,
        to_subscribe,
    }
}
