//! Per-user session event hub.
//!
//! Sessions subscribe by user identity; publishers address a user and every
//! live subscription of that user receives the event. Delivery is
//! best-effort: with no subscribers the event is dropped, and a slow
//! subscriber loses the oldest events in its bounded queue rather than ever
//! blocking a publisher.

use crate::backplane::EventBackplane;
use darkroom_core::config::NotifyConfig;
use darkroom_core::event::SessionEvent;
use dashmap::DashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use uuid::Uuid;

/// Hub counters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HubStats {
    /// Users with at least one live channel.
    pub channels: usize,
    /// Events published (whether or not anyone received them).
    pub published: u64,
    /// Events published to users with zero live subscriptions.
    pub dropped: u64,
}

struct HubInner {
    channels: DashMap<Uuid, broadcast::Sender<SessionEvent>>,
    /// Bounded per-subscriber queue capacity.
    capacity: usize,
    backplane: Option<Arc<dyn EventBackplane>>,
    published: AtomicU64,
    dropped: AtomicU64,
}

/// Per-user publish/subscribe surface for session events.
#[derive(Clone)]
pub struct SessionHub {
    inner: Arc<HubInner>,
}

impl SessionHub {
    /// Create a new hub.
    pub fn new(config: &NotifyConfig) -> Self {
        Self {
            inner: Arc::new(HubInner {
                channels: DashMap::new(),
                capacity: config.queue_capacity as usize,
                backplane: None,
                published: AtomicU64::new(0),
                dropped: AtomicU64::new(0),
            }),
        }
    }

    /// Attach a cross-process backplane. Forwarding happens on a spawned
    /// task per event; failures are logged and swallowed.
    pub fn with_backplane(config: &NotifyConfig, backplane: Arc<dyn EventBackplane>) -> Self {
        Self {
            inner: Arc::new(HubInner {
                channels: DashMap::new(),
                capacity: config.queue_capacity as usize,
                backplane: Some(backplane),
                published: AtomicU64::new(0),
                dropped: AtomicU64::new(0),
            }),
        }
    }

    /// Register a live session as willing to receive events for `user_id`.
    ///
    /// A user may hold any number of concurrent subscriptions (multiple open
    /// sessions or tabs); each gets its own bounded queue.
    pub fn subscribe(&self, user_id: Uuid) -> SessionSubscription {
        // The receiver is attached while the map entry is locked so a
        // concurrent prune cannot drop the channel between creation and
        // subscription.
        let receiver = {
            let entry = self
                .inner
                .channels
                .entry(user_id)
                .or_insert_with(|| broadcast::channel(self.inner.capacity).0);
            entry.value().subscribe()
        };

        SessionSubscription {
            user_id,
            hub: self.clone(),
            receiver: Some(receiver),
        }
    }

    /// Deliver `event` to every current subscription for `user_id`.
    ///
    /// Synchronous and non-blocking: a publisher is never held up by slow or
    /// absent subscribers. Returns the number of subscriptions the event was
    /// queued for (zero means it was dropped).
    pub fn publish(&self, user_id: Uuid, event: SessionEvent) -> usize {
        self.inner.published.fetch_add(1, Ordering::Relaxed);

        if let Some(backplane) = self.inner.backplane.clone() {
            let forwarded = event.clone();
            tokio::spawn(async move {
                if let Err(err) = backplane.forward(user_id, forwarded).await {
                    tracing::warn!(
                        user_id = %user_id,
                        backplane = backplane.name(),
                        error = %err,
                        "backplane forward failed, event lost cross-process"
                    );
                }
            });
        }

        let sender = self
            .inner
            .channels
            .get(&user_id)
            .map(|entry| entry.value().clone());

        let delivered = match sender {
            Some(sender) => sender.send(event).unwrap_or(0),
            None => 0,
        };

        if delivered == 0 {
            self.inner.dropped.fetch_add(1, Ordering::Relaxed);
            tracing::trace!(user_id = %user_id, "no live subscription, event dropped");
            self.prune(user_id);
        }

        delivered
    }

    /// Remove a subscription. Safe to call multiple times or after the
    /// underlying session has already disconnected.
    pub fn unsubscribe(&self, handle: &mut SessionSubscription) {
        handle.close();
    }

    /// Number of live subscriptions for `user_id`.
    pub fn subscriber_count(&self, user_id: Uuid) -> usize {
        self.inner
            .channels
            .get(&user_id)
            .map(|entry| entry.value().receiver_count())
            .unwrap_or(0)
    }

    /// Current counters.
    pub fn stats(&self) -> HubStats {
        HubStats {
            channels: self.inner.channels.len(),
            published: self.inner.published.load(Ordering::Relaxed),
            dropped: self.inner.dropped.load(Ordering::Relaxed),
        }
    }

    /// Drop the channel for `user_id` if its last receiver is gone.
    fn prune(&self, user_id: Uuid) {
        self.inner
            .channels
            .remove_if(&user_id, |_, sender| sender.receiver_count() == 0);
    }
}

/// A live subscription to one user's events.
///
/// Dropping the subscription unsubscribes it.
pub struct SessionSubscription {
    user_id: Uuid,
    hub: SessionHub,
    receiver: Option<broadcast::Receiver<SessionEvent>>,
}

impl SessionSubscription {
    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    /// Receive the next event.
    ///
    /// Returns `None` once the subscription is closed. A subscriber that
    /// fell behind its bounded queue silently skips the overwritten (oldest)
    /// events and resumes with the oldest still retained.
    pub async fn recv(&mut self) -> Option<SessionEvent> {
        let receiver = self.receiver.as_mut()?;
        loop {
            match receiver.recv().await {
                Ok(event) => return Some(event),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(
                        user_id = %self.user_id,
                        skipped = skipped,
                        "subscriber lagging behind event stream, oldest events dropped"
                    );
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Close the subscription. Idempotent.
    pub fn close(&mut self) {
        if self.receiver.take().is_some() {
            self.hub.prune(self.user_id);
        }
    }
}

impl Drop for SessionSubscription {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{NotifyError, NotifyResult};
    use async_trait::async_trait;
    use darkroom_core::media::MediaKind;
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::time::timeout;

    fn hub() -> SessionHub {
        SessionHub::new(&NotifyConfig::default())
    }

    fn progress(index: u32, total: u32) -> SessionEvent {
        SessionEvent::progress(Uuid::nil(), index, total, MediaKind::Photo, "p.jpg")
    }

    #[tokio::test]
    async fn publish_without_subscribers_returns_immediately() {
        let hub = hub();
        let delivered = timeout(Duration::from_millis(100), async {
            hub.publish(Uuid::new_v4(), progress(1, 1))
        })
        .await
        .expect("publish must not block");

        assert_eq!(delivered, 0);
        assert_eq!(hub.stats().dropped, 1);
    }

    #[tokio::test]
    async fn events_fan_out_to_all_subscriptions_of_a_user() {
        let hub = hub();
        let user = Uuid::new_v4();
        let mut first = hub.subscribe(user);
        let mut second = hub.subscribe(user);
        let mut other = hub.subscribe(Uuid::new_v4());

        let delivered = hub.publish(user, progress(1, 1));
        assert_eq!(delivered, 2);

        assert_eq!(first.recv().await, Some(progress(1, 1)));
        assert_eq!(second.recv().await, Some(progress(1, 1)));

        // The other user's session sees nothing.
        let nothing = timeout(Duration::from_millis(50), other.recv()).await;
        assert!(nothing.is_err());
    }

    #[tokio::test]
    async fn events_arrive_in_publish_order() {
        let hub = hub();
        let user = Uuid::new_v4();
        let mut sub = hub.subscribe(user);

        for index in 1..=5 {
            hub.publish(user, progress(index, 5));
        }

        for index in 1..=5 {
            assert_eq!(sub.recv().await, Some(progress(index, 5)));
        }
    }

    #[tokio::test]
    async fn slow_subscriber_loses_oldest_events() {
        let config = NotifyConfig { queue_capacity: 4 };
        let hub = SessionHub::new(&config);
        let user = Uuid::new_v4();
        let mut sub = hub.subscribe(user);

        // Publish more than the queue holds without receiving anything; the
        // publisher never blocks and the oldest events are overwritten.
        for index in 1..=10 {
            let delivered = timeout(Duration::from_millis(100), async {
                hub.publish(user, progress(index, 10))
            })
            .await
            .expect("publish must not block on a full queue");
            assert_eq!(delivered, 1);
        }

        // The subscriber resumes with the oldest retained event.
        assert_eq!(sub.recv().await, Some(progress(7, 10)));
        assert_eq!(sub.recv().await, Some(progress(8, 10)));
        assert_eq!(sub.recv().await, Some(progress(9, 10)));
        assert_eq!(sub.recv().await, Some(progress(10, 10)));
    }

    #[tokio::test]
    async fn unsubscribe_is_idempotent_and_prunes() {
        let hub = hub();
        let user = Uuid::new_v4();
        let mut sub = hub.subscribe(user);
        assert_eq!(hub.subscriber_count(user), 1);

        hub.unsubscribe(&mut sub);
        hub.unsubscribe(&mut sub);
        assert_eq!(hub.subscriber_count(user), 0);
        assert_eq!(hub.stats().channels, 0);

        assert_eq!(hub.publish(user, progress(1, 1)), 0);
        assert_eq!(sub.recv().await, None);
    }

    #[tokio::test]
    async fn dropping_subscription_prunes_channel() {
        let hub = hub();
        let user = Uuid::new_v4();
        let sub = hub.subscribe(user);
        drop(sub);

        assert_eq!(hub.publish(user, progress(1, 1)), 0);
        assert_eq!(hub.stats().channels, 0);
    }

    #[tokio::test]
    async fn resubscribing_after_prune_works() {
        let hub = hub();
        let user = Uuid::new_v4();
        drop(hub.subscribe(user));

        let mut sub = hub.subscribe(user);
        assert_eq!(hub.publish(user, progress(2, 2)), 1);
        assert_eq!(sub.recv().await, Some(progress(2, 2)));
    }

    struct RecordingBackplane {
        events: Mutex<Vec<(Uuid, SessionEvent)>>,
        fail: bool,
    }

    #[async_trait]
    impl EventBackplane for RecordingBackplane {
        async fn forward(&self, user_id: Uuid, event: SessionEvent) -> NotifyResult<()> {
            if self.fail {
                return Err(NotifyError::Backplane("down".to_string()));
            }
            self.events.lock().unwrap().push((user_id, event));
            Ok(())
        }

        fn name(&self) -> &'static str {
            "recording"
        }
    }

    #[tokio::test]
    async fn backplane_receives_events_even_without_local_subscribers() {
        let backplane = Arc::new(RecordingBackplane {
            events: Mutex::new(Vec::new()),
            fail: false,
        });
        let hub = SessionHub::with_backplane(&NotifyConfig::default(), backplane.clone());
        let user = Uuid::new_v4();

        hub.publish(user, progress(1, 1));

        // Forwarding runs on a spawned task; give it a moment.
        tokio::time::sleep(Duration::from_millis(50)).await;
        let events = backplane.events.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].0, user);
    }

    #[tokio::test]
    async fn backplane_failure_never_reaches_publisher() {
        let backplane = Arc::new(RecordingBackplane {
            events: Mutex::new(Vec::new()),
            fail: true,
        });
        let hub = SessionHub::with_backplane(&NotifyConfig::default(), backplane);
        let user = Uuid::new_v4();
        let mut sub = hub.subscribe(user);

        // Local delivery is unaffected by the failing backplane.
        assert_eq!(hub.publish(user, progress(1, 1)), 1);
        assert_eq!(sub.recv().await, Some(progress(1, 1)));
    }
}
