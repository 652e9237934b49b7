//! Incomplete-order tracking.
//!
//! While a customer fills in a checkout form, the draft is forwarded to a
//! [`DraftSink`] once typing pauses, so abandoned orders can be followed up.
//! Drafts without a usable phone number are not worth a follow-up call and are
//! never forwarded.

use crate::config::TrackingConfig;
use crate::debounce::Debouncer;
use crate::store::CartItem;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Checkout form state captured as the customer types.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDraft {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default)]
    pub items: Vec<CartItem>,
}

impl OrderDraft {
    pub fn phone_digits(&self) -> usize {
        self.customer_phone
            .as_deref()
            .map(|p| p.chars().filter(char::is_ascii_digit).count())
            .unwrap_or(0)
    }

    pub fn is_trackable(&self, min_phone_digits: usize) -> bool {
        self.phone_digits() >= min_phone_digits
    }
}

/// Receives drafts that should be recorded as incomplete orders.
pub trait DraftSink: Send + 'static {
    fn record(&mut self, draft: OrderDraft);
}

impl<F> DraftSink for F
where
    F: FnMut(OrderDraft) + Send + 'static,
{
    fn record(&mut self, draft: OrderDraft) {
        self(draft)
    }
}

pub struct IncompleteOrderTracker {
    debouncer: Debouncer<OrderDraft>,
    min_phone_digits: usize,
}

impl IncompleteOrderTracker {
    /// Must be called from within a tokio runtime.
    pub fn new(delay: Duration, min_phone_digits: usize, mut sink: impl DraftSink) -> Self {
        let mut last_forwarded: Option<OrderDraft> = None;
        let debouncer = Debouncer::new(delay, move |draft: OrderDraft| {
            if last_forwarded.as_ref() == Some(&draft) {
                debug!("Draft unchanged since last forward; skipping");
                return;
            }
            debug!(items = draft.items.len(), "Forwarding incomplete order draft");
            sink.record(draft.clone());
            last_forwarded = Some(draft);
        });
        Self {
            debouncer,
            min_phone_digits,
        }
    }

    pub fn from_config(config: &TrackingConfig, sink: impl DraftSink) -> Self {
        Self::new(
            Duration::from_millis(config.debounce_ms),
            config.min_phone_digits,
            sink,
        )
    }

    /// Record the latest form state. An untrackable draft cancels any
    /// pending one.
    pub fn update(&self, draft: OrderDraft) {
        if draft.is_trackable(self.min_phone_digits) {
            self.debouncer.call(draft);
        } else {
            self.debouncer.cancel();
        }
    }

    /// The order was placed; nothing pending should be reported.
    pub fn submitted(&self) {
        self.debouncer.cancel();
    }

    /// Forward the pending draft now (e.g. the page is being closed).
    pub fn flush(&self) {
        self.debouncer.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tokio::time::sleep;

    fn draft(phone: &str, address: &str) -> OrderDraft {
        OrderDraft {
            customer_name: Some("Karim".into()),
            customer_phone: Some(phone.into()),
            address: Some(address.into()),
            items: Vec::new(),
        }
    }

    fn tracker() -> (IncompleteOrderTracker, Arc<Mutex<Vec<OrderDraft>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let tracker =
            IncompleteOrderTracker::from_config(&TrackingConfig::default(), move |d: OrderDraft| {
                sink.lock().unwrap().push(d)
            });
        (tracker, seen)
    }

    #[test]
    fn test_phone_digits_ignore_formatting() {
        assert_eq!(draft("+880 1711-000000", "").phone_digits(), 13);
        assert!(!draft("01711", "").is_trackable(11));
        assert!(draft("017-1100-0000", "").is_trackable(11));
    }

    #[tokio::test(start_paused = true)]
    async fn test_forwards_after_pause() {
        let (tracker, seen) = tracker();
        tracker.update(draft("01711000000", "Road 1"));
        tracker.update(draft("01711000000", "Road 12"));
        sleep(Duration::from_millis(1500)).await;

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].address.as_deref(), Some("Road 12"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_untrackable_cancels_pending() {
        let (tracker, seen) = tracker();
        tracker.update(draft("01711000000", "Road 1"));
        tracker.update(draft("0171", "Road 1"));
        sleep(Duration::from_millis(1500)).await;
        assert!(seen.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_duplicate_draft_not_forwarded_twice() {
        let (tracker, seen) = tracker();
        tracker.update(draft("01711000000", "Road 1"));
        sleep(Duration::from_millis(1500)).await;
        tracker.update(draft("01711000000", "Road 1"));
        sleep(Duration::from_millis(1500)).await;
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_submitted_suppresses_pending() {
        let (tracker, seen) = tracker();
        tracker.update(draft("01711000000", "Road 1"));
        tracker.submitted();
        sleep(Duration::from_millis(1500)).await;
        assert!(seen.lock().unwrap().is_empty());
    }
}
