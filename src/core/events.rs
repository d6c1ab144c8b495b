use tokio::sync::broadcast;
use tokio::sync::broadcast::error::TryRecvError;

use crate::core::models::{Profile, Status};
use crate::core::scope::InstanceScope;

const HUB_CAPACITY: usize = 64;

/// Everything that travels over the app-wide event hub.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    ProfileEdited(Profile),
    MainTabsChanged,
    PreferenceChanged(String),
    QuickReply(Status),
    DrawerFooterClicked(bool),
}

/// Process-wide publish/subscribe hub. Cloning yields another handle to the
/// same channel.
#[derive(Clone)]
pub struct EventHub {
    tx: broadcast::Sender<Event>,
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new()
    }
}

impl EventHub {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(HUB_CAPACITY);
        EventHub { tx }
    }

    /// Publish without waiting for anyone. Events published while nobody is
    /// subscribed are dropped.
    pub fn publish(&self, event: Event) {
        log::trace!("publish {:?}", event);
        let _ = self.tx.send(event);
    }

    /// Subscribe to events matching `filter`. Only events published after
    /// this call are seen; dropping the handle unsubscribes.
    pub fn subscribe<F>(&self, filter: F) -> Subscription
    where
        F: Fn(&Event) -> bool + Send + 'static,
    {
        Subscription {
            rx: self.tx.subscribe(),
            filter: Box::new(filter),
            scope: None,
        }
    }

    /// Like [`subscribe`](Self::subscribe), but the subscription goes quiet
    /// once `scope` is torn down.
    pub fn subscribe_scoped<F>(&self, scope: &InstanceScope, filter: F) -> Subscription
    where
        F: Fn(&Event) -> bool + Send + 'static,
    {
        let mut sub = self.subscribe(filter);
        sub.scope = Some(scope.ticket_token());
        sub
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

pub struct Subscription {
    rx: broadcast::Receiver<Event>,
    filter: Box<dyn Fn(&Event) -> bool + Send>,
    scope: Option<tokio_util::sync::CancellationToken>,
}

impl Subscription {
    pub fn is_cancelled(&self) -> bool {
        self.scope.as_ref().is_some_and(|t| t.is_cancelled())
    }

    /// Take every pending event that passes the filter.
    pub fn drain(&mut self) -> Vec<Event> {
        let mut out = Vec::new();
        self.dispatch(|e| out.push(e));
        out
    }

    /// Feed pending events to `handler` in publish order. Returns how many
    /// were delivered.
    pub fn dispatch(&mut self, mut handler: impl FnMut(Event)) -> usize {
        let mut delivered = 0;
        loop {
            if self.is_cancelled() {
                return delivered;
            }
            match self.rx.try_recv() {
                Ok(event) => {
                    if (self.filter)(&event) {
                        handler(event);
                        delivered += 1;
                    }
                }
                Err(TryRecvError::Lagged(n)) => {
                    log::warn!("Event subscriber lagged, {} events dropped", n);
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return delivered,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pref(key: &str) -> Event {
        Event::PreferenceChanged(key.into())
    }

    #[test]
    fn fan_out_to_every_subscriber() {
        let hub = EventHub::new();
        let mut a = hub.subscribe(|_| true);
        let mut b = hub.subscribe(|_| true);
        hub.publish(Event::MainTabsChanged);
        assert_eq!(a.drain(), vec![Event::MainTabsChanged]);
        assert_eq!(b.drain(), vec![Event::MainTabsChanged]);
    }

    #[test]
    fn filter_applies() {
        let hub = EventHub::new();
        let mut sub = hub.subscribe(|e| matches!(e, Event::PreferenceChanged(_)));
        hub.publish(Event::MainTabsChanged);
        hub.publish(pref("a"));
        hub.publish(Event::DrawerFooterClicked(true));
        assert_eq!(sub.drain(), vec![pref("a")]);
    }

    #[test]
    fn only_events_after_subscribe() {
        let hub = EventHub::new();
        hub.publish(pref("early"));
        let mut sub = hub.subscribe(|_| true);
        hub.publish(pref("late"));
        assert_eq!(sub.drain(), vec![pref("late")]);
    }

    #[test]
    fn drop_unsubscribes() {
        let hub = EventHub::new();
        let sub = hub.subscribe(|_| true);
        assert_eq!(hub.subscriber_count(), 1);
        drop(sub);
        assert_eq!(hub.subscriber_count(), 0);
        // Publishing with no subscribers is fine.
        hub.publish(Event::MainTabsChanged);
    }

    #[test]
    fn scoped_subscription_stops_after_teardown() {
        let hub = EventHub::new();
        let scope = InstanceScope::new(1);
        let mut sub = hub.subscribe_scoped(&scope, |_| true);
        hub.publish(pref("a"));
        assert_eq!(sub.drain().len(), 1);
        hub.publish(pref("b"));
        drop(scope);
        assert!(sub.is_cancelled());
        assert!(sub.drain().is_empty());
    }

    #[test]
    fn lagging_subscriber_keeps_newest() {
        let hub = EventHub::new();
        let mut sub = hub.subscribe(|_| true);
        for i in 0..(HUB_CAPACITY + 10) {
            hub.publish(pref(&i.to_string()));
        }
        let got = sub.drain();
        assert_eq!(got.len(), HUB_CAPACITY);
        assert_eq!(got.last(), Some(&pref(&(HUB_CAPACITY + 9).to_string())));
    }
}
