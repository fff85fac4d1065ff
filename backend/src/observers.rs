//! Per-match fan-out of game events
//!
//! The hub keeps an ordered list of [`Subscriber`]s per match. A subscriber
//! is anything that can accept an event and report when its peer is gone;
//! SSE and WebSocket handlers both use [`ChannelSubscriber`].
//!
//! Broadcasting copies the subscriber list under the lock, releases it, then
//! delivers. A failed delivery prunes that subscriber and never stops the
//! others.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use chess_engine::MatchId;
use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::protocol::GameEvent;

/// The receiving end has disconnected
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Subscriber is gone")]
pub struct SubscriberGone;

/// A push-capable connection watching one match
pub trait Subscriber: Send + Sync {
    /// Deliver without blocking
    fn send(&self, event: &GameEvent) -> Result<(), SubscriberGone>;
}

/// Forwards events into an unbounded channel drained by a connection task
pub struct ChannelSubscriber {
    tx: mpsc::UnboundedSender<GameEvent>,
}

impl ChannelSubscriber {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<GameEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (ChannelSubscriber { tx }, rx)
    }
}

impl Subscriber for ChannelSubscriber {
    fn send(&self, event: &GameEvent) -> Result<(), SubscriberGone> {
        self.tx.send(event.clone()).map_err(|_| SubscriberGone)
    }
}

type SubscriberList = Vec<(u64, Arc<dyn Subscriber>)>;

#[derive(Default)]
pub struct ObserverHub {
    next_id: AtomicU64,
    matches: Mutex<HashMap<MatchId, SubscriberList>>,
}

/// Subscribers of one match at a point in time
pub struct Recipients {
    match_id: MatchId,
    targets: SubscriberList,
}

impl Recipients {
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

/// Keeps a subscriber registered; dropping it unsubscribes
#[must_use = "dropping the subscription unsubscribes immediately"]
pub struct Subscription {
    hub: Weak<ObserverHub>,
    match_id: MatchId,
    id: u64,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(hub) = self.hub.upgrade() {
            hub.unsubscribe(&self.match_id, self.id);
        }
    }
}

impl ObserverHub {
    pub fn new() -> Arc<Self> {
        Arc::new(ObserverHub::default())
    }

    pub fn subscribe(
        self: &Arc<Self>,
        match_id: &MatchId,
        subscriber: Arc<dyn Subscriber>,
    ) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.matches
            .lock()
            .entry(match_id.clone())
            .or_default()
            .push((id, subscriber));

        tracing::debug!("Subscriber {} watching match {}", id, match_id);

        Subscription {
            hub: Arc::downgrade(self),
            match_id: match_id.clone(),
            id,
        }
    }

    /// Subscribe a fresh [`ChannelSubscriber`] and hand back its receiver
    ///
    /// The receiver yields `None` once the match is closed.
    pub fn channel(
        self: &Arc<Self>,
        match_id: &MatchId,
    ) -> (Subscription, mpsc::UnboundedReceiver<GameEvent>) {
        let (subscriber, rx) = ChannelSubscriber::new();
        let subscription = self.subscribe(match_id, Arc::new(subscriber));
        (subscription, rx)
    }

    fn unsubscribe(&self, match_id: &MatchId, id: u64) {
        let mut matches = self.matches.lock();
        if let Some(list) = matches.get_mut(match_id) {
            list.retain(|(sub_id, _)| *sub_id != id);
            if list.is_empty() {
                matches.remove(match_id);
            }
        }
    }

    /// Copy the current subscriber list of a match
    ///
    /// The registry takes this while it still holds the match lock and
    /// delivers after releasing it, so a match closed in between still
    /// reaches everyone who was watching when the event happened.
    pub fn recipients(&self, match_id: &MatchId) -> Recipients {
        let targets = self
            .matches
            .lock()
            .get(match_id)
            .cloned()
            .unwrap_or_default();
        Recipients {
            match_id: match_id.clone(),
            targets,
        }
    }

    /// Best-effort delivery to every current subscriber
    ///
    /// Returns how many subscribers received the event.
    pub fn broadcast(&self, match_id: &MatchId, event: &GameEvent) -> usize {
        self.deliver(self.recipients(match_id), event)
    }

    /// Send to a list taken earlier with [`ObserverHub::recipients`]
    pub fn deliver(&self, recipients: Recipients, event: &GameEvent) -> usize {
        let Recipients { match_id, targets } = recipients;

        let mut delivered = 0;
        let mut gone = Vec::new();
        for (id, subscriber) in &targets {
            match subscriber.send(event) {
                Ok(()) => delivered += 1,
                Err(SubscriberGone) => gone.push(*id),
            }
        }

        if !gone.is_empty() {
            tracing::warn!(
                "Pruning {} disconnected subscriber(s) from match {}",
                gone.len(),
                match_id
            );
            for id in gone {
                self.unsubscribe(&match_id, id);
            }
        }

        delivered
    }

    /// Forget every subscriber of a finished match
    ///
    /// Channel subscribers see their receiver end once the last sender is
    /// dropped here.
    pub fn close(&self, match_id: &MatchId) {
        self.matches.lock().remove(match_id);
    }

    pub fn subscriber_count(&self, match_id: &MatchId) -> usize {
        self.matches.lock().get(match_id).map_or(0, Vec::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::ResignEvent;
    use chess_engine::{Color, Identity};

    fn resign_event() -> GameEvent {
        GameEvent::Resign(ResignEvent {
            resigned_identity: Identity::new("alice"),
            winner: Color::Black,
        })
    }

    struct Broken;

    impl Subscriber for Broken {
        fn send(&self, _event: &GameEvent) -> Result<(), SubscriberGone> {
            Err(SubscriberGone)
        }
    }

    #[test]
    fn test_broadcast_reaches_every_subscriber_in_order() {
        let hub = ObserverHub::new();
        let id = MatchId::from("m");
        let (_first, mut rx1) = hub.channel(&id);
        let (_second, mut rx2) = hub.channel(&id);

        assert_eq!(hub.broadcast(&id, &resign_event()), 2);
        assert_eq!(rx1.try_recv().ok(), Some(resign_event()));
        assert_eq!(rx2.try_recv().ok(), Some(resign_event()));
    }

    #[test]
    fn test_dropping_subscription_unsubscribes() {
        let hub = ObserverHub::new();
        let id = MatchId::from("m");
        let (subscription, _rx) = hub.channel(&id);
        assert_eq!(hub.subscriber_count(&id), 1);
        drop(subscription);
        assert_eq!(hub.subscriber_count(&id), 0);
    }

    #[test]
    fn test_failed_subscriber_is_pruned_without_blocking_others() {
        let hub = ObserverHub::new();
        let id = MatchId::from("m");
        let _broken = hub.subscribe(&id, Arc::new(Broken));
        let (_ok, mut rx) = hub.channel(&id);

        assert_eq!(hub.broadcast(&id, &resign_event()), 1);
        assert!(rx.try_recv().is_ok());
        assert_eq!(hub.subscriber_count(&id), 1);
    }

    #[test]
    fn test_dropped_receiver_is_pruned() {
        let hub = ObserverHub::new();
        let id = MatchId::from("m");
        let (_subscription, rx) = hub.channel(&id);
        drop(rx);
        assert_eq!(hub.broadcast(&id, &resign_event()), 0);
        assert_eq!(hub.subscriber_count(&id), 0);
    }

    #[test]
    fn test_close_ends_receivers() {
        let hub = ObserverHub::new();
        let id = MatchId::from("m");
        let (_subscription, mut rx) = hub.channel(&id);
        hub.close(&id);
        assert!(matches!(
            rx.try_recv(),
            Err(mpsc::error::TryRecvError::Disconnected)
        ));
    }

    #[test]
    fn test_recipients_taken_before_close_still_receive() {
        let hub = ObserverHub::new();
        let id = MatchId::from("m");
        let (_subscription, mut rx) = hub.channel(&id);

        let recipients = hub.recipients(&id);
        hub.close(&id);
        assert_eq!(recipients.len(), 1);

        assert_eq!(hub.deliver(recipients, &resign_event()), 1);
        assert_eq!(rx.try_recv().ok(), Some(resign_event()));
        assert!(matches!(
            rx.try_recv(),
            Err(mpsc::error::TryRecvError::Disconnected)
        ));
    }

    #[test]
    fn test_other_matches_are_untouched() {
        let hub = ObserverHub::new();
        let (_a, mut rx_a) = hub.channel(&MatchId::from("a"));
        let (_b, mut rx_b) = hub.channel(&MatchId::from("b"));
        hub.broadcast(&MatchId::from("a"), &resign_event());
        assert!(rx_a.try_recv().is_ok());
        assert!(rx_b.try_recv().is_err());
    }
}
