//! Synchronous fan-out of engine events.
//!
//! Listeners are called in subscription order on the thread that published the
//! event. A listener that returns an error or panics is logged and skipped; the
//! remaining listeners still receive the event and engine state is untouched.

use std::panic::{catch_unwind, AssertUnwindSafe};
use tokio::sync::mpsc;
use tracing::warn;

use crate::events::{Event, EventKind};

pub type ListenerError = Box<dyn std::error::Error + Send + Sync>;
pub type ListenerResult = Result<(), ListenerError>;

type Listener = Box<dyn FnMut(&Event) -> ListenerResult + Send>;

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct Subscription {
    id: SubscriptionId,
    filter: Option<EventKind>,
    listener: Listener,
}

/// Summary of one publish call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Delivery {
    pub delivered: usize,
    pub failed: usize,
}

#[derive(Default)]
pub struct EventBus {
    next_id: u64,
    subscriptions: Vec<Subscription>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Receive every event.
    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&Event) -> ListenerResult + Send + 'static,
    {
        self.insert(None, Box::new(listener))
    }

    /// Receive only events of `kind`.
    pub fn subscribe_to<F>(&mut self, kind: EventKind, listener: F) -> SubscriptionId
    where
        F: FnMut(&Event) -> ListenerResult + Send + 'static,
    {
        self.insert(Some(kind), Box::new(listener))
    }

    /// Forward every event into an unbounded channel.
    ///
    /// Once the receiver is dropped the subscription removes itself on the
    /// next publish.
    pub fn subscribe_channel(&mut self) -> (SubscriptionId, mpsc::UnboundedReceiver<Event>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = self.subscribe(move |event| {
            tx.send(event.clone())
                .map_err(|_| ListenerError::from(ChannelClosed))
        });
        (id, rx)
    }

    /// Returns false if `id` was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|s| s.id != id);
        self.subscriptions.len() != before
    }

    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    pub fn clear(&mut self) {
        self.subscriptions.clear();
    }

    pub fn publish(&mut self, event: &Event) -> Delivery {
        let kind = event.kind();
        let mut delivery = Delivery::default();
        let mut closed = Vec::new();

        for sub in &mut self.subscriptions {
            if sub.filter.is_some_and(|f| f != kind) {
                continue;
            }
            let outcome = catch_unwind(AssertUnwindSafe(|| (sub.listener)(event)));
            match outcome {
                Ok(Ok(())) => delivery.delivered += 1,
                Ok(Err(e)) => {
                    delivery.failed += 1;
                    if e.is::<ChannelClosed>() {
                        closed.push(sub.id);
                    } else {
                        warn!(subscription = sub.id.0, event = %kind, error = %e, "listener failed");
                    }
                }
                Err(_) => {
                    delivery.failed += 1;
                    warn!(subscription = sub.id.0, event = %kind, "listener panicked");
                }
            }
        }

        if !closed.is_empty() {
            self.subscriptions.retain(|s| !closed.contains(&s.id));
        }
        delivery
    }

    fn insert(&mut self, filter: Option<EventKind>, listener: Listener) -> SubscriptionId {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.subscriptions.push(Subscription {
            id,
            filter,
            listener,
        });
        id
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriptions", &self.subscriptions.len())
            .finish()
    }
}

#[derive(Debug)]
struct ChannelClosed;

impl std::fmt::Display for ChannelClosed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("receiver dropped")
    }
}

impl std::error::Error for ChannelClosed {}

/// Outbound delivery of human-facing notifications (desktop toast, sound,
/// chat message). Only invoked when notifications are enabled.
pub trait Notifier {
    fn notify(&mut self, title: &str, body: &str) -> ListenerResult;
}

/// Title and body for events that warrant a notification.
pub fn notification_for(event: &Event) -> Option<(&'static str, String)> {
    match event {
        Event::WorkSessionCompleted {
            duration_minutes, ..
        } => Some((
            "Work session complete",
            format!("{duration_minutes} minutes done. Time for a break!"),
        )),
        Event::BreakSessionCompleted { .. } => {
            Some(("Break over", "Ready for the next focus session?".to_string()))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::sync::{Arc, Mutex};

    fn break_done() -> Event {
        Event::BreakSessionCompleted {
            task_id: Some("t1".into()),
            at: Utc::now(),
        }
    }

    fn reset() -> Event {
        Event::TimerReset {
            task_id: None,
            mode: crate::timer::TimerMode::Work,
            remaining_secs: 1500,
            at: Utc::now(),
        }
    }

    #[test]
    fn failing_listener_does_not_block_others() {
        let mut bus = EventBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        bus.subscribe(|_| Err("boom".into()));
        bus.subscribe(|_| panic!("listener bug"));
        let sink = seen.clone();
        bus.subscribe(move |event| {
            sink.lock().unwrap().push(event.kind());
            Ok(())
        });

        let delivery = bus.publish(&break_done());
        assert_eq!(delivery, Delivery { delivered: 1, failed: 2 });
        assert_eq!(*seen.lock().unwrap(), vec![EventKind::BreakSessionCompleted]);
        assert_eq!(bus.len(), 3);
    }

    #[test]
    fn filtered_subscription_only_sees_its_kind() {
        let mut bus = EventBus::new();
        let count = Arc::new(Mutex::new(0));
        let c = count.clone();
        bus.subscribe_to(EventKind::TimerReset, move |_| {
            *c.lock().unwrap() += 1;
            Ok(())
        });
        bus.publish(&break_done());
        bus.publish(&reset());
        assert_eq!(*count.lock().unwrap(), 1);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let mut bus = EventBus::new();
        let id = bus.subscribe(|_| Ok(()));
        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        assert_eq!(bus.publish(&reset()).delivered, 0);
    }

    #[test]
    fn channel_subscription_receives_and_self_removes() {
        let mut bus = EventBus::new();
        let (_, mut rx) = bus.subscribe_channel();
        bus.publish(&reset());
        assert_eq!(rx.try_recv().unwrap().kind(), EventKind::TimerReset);

        drop(rx);
        bus.publish(&reset());
        assert!(bus.is_empty());
    }

    #[test]
    fn notifications_only_for_completions() {
        assert!(notification_for(&break_done()).is_some());
        assert!(notification_for(&reset()).is_none());
    }
}
