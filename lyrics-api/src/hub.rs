//! Broadcast hub for song notifications
//!
//! Holds the registry of open notification channels (WebSocket and SSE
//! clients) and fans messages out to all of them.
//!
//! Each channel is the sending half of a bounded queue; the connection task
//! owning the receiving half writes queued messages to its socket. Delivery is
//! at-most-once and best-effort:
//! - a message is serialized once and shared by every channel
//! - every send is bounded by `send_timeout`
//! - a channel that is closed or does not accept the message in time is
//!   unregistered; the failure never reaches the caller of `broadcast`
//!
//! The registry lock is held only for map operations, never across an
//! `.await`. `broadcast` works on a snapshot of the registry so channels can be
//! unregistered while a fan-out is in flight.

use futures::future::join_all;
use lyrics_common::SongEvent;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;
use tokio::sync::mpsc::{self, error::SendTimeoutError};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Message as pushed to a channel (JSON text or a plain notice)
pub type HubMessage = Arc<str>;

/// Sending half of a notification channel
pub type ChannelSender = mpsc::Sender<HubMessage>;

/// Receiving half of a notification channel
pub type ChannelReceiver = mpsc::Receiver<HubMessage>;

/// Opaque handle of a registered channel
///
/// Never reused: a reconnecting client gets a new id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelId(Uuid);

impl ChannelId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Result of one fan-out
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BroadcastOutcome {
    /// Channels that accepted the message
    pub delivered: usize,
    /// Channels that failed and were unregistered
    pub pruned: usize,
}

/// Registry of open notification channels
pub struct BroadcastHub {
    channels: RwLock<HashMap<ChannelId, ChannelSender>>,
    send_timeout: Duration,
    channel_capacity: usize,
}

impl BroadcastHub {
    /// Create an empty hub
    ///
    /// # Arguments
    /// * `send_timeout` - Upper bound on one channel send during a broadcast
    /// * `channel_capacity` - Queue depth for channels made by [`open_channel`](Self::open_channel)
    pub fn new(send_timeout: Duration, channel_capacity: usize) -> Self {
        Self {
            channels: RwLock::new(HashMap::new()),
            send_timeout,
            channel_capacity: channel_capacity.max(1),
        }
    }

    fn read_channels(&self) -> RwLockReadGuard<'_, HashMap<ChannelId, ChannelSender>> {
        self.channels.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_channels(&self) -> RwLockWriteGuard<'_, HashMap<ChannelId, ChannelSender>> {
        self.channels.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add an open channel to the active set
    pub fn register(&self, sender: ChannelSender) -> ChannelId {
        let id = ChannelId::new();
        let count = {
            let mut channels = self.write_channels();
            channels.insert(id, sender);
            channels.len()
        };
        info!("Channel {} registered ({} open)", id, count);
        id
    }

    /// Create a channel with the configured capacity and register it
    pub fn open_channel(&self) -> (ChannelId, ChannelReceiver) {
        let (tx, rx) = mpsc::channel(self.channel_capacity);
        (self.register(tx), rx)
    }

    /// Remove a channel from the active set
    ///
    /// Returns `false` if the channel was not registered; that is not an error.
    pub fn unregister(&self, id: ChannelId) -> bool {
        let (removed, count) = {
            let mut channels = self.write_channels();
            let removed = channels.remove(&id).is_some();
            (removed, channels.len())
        };
        if removed {
            info!("Channel {} unregistered ({} open)", id, count);
        }
        removed
    }

    /// Whether `id` is in the active set
    #[cfg(test)]
    pub(crate) fn is_registered(&self, id: ChannelId) -> bool {
        self.read_channels().contains_key(&id)
    }

    /// Number of open channels
    pub fn connection_count(&self) -> usize {
        self.read_channels().len()
    }

    /// Send a song event to every open channel
    pub async fn broadcast(&self, event: &SongEvent) -> BroadcastOutcome {
        let message = match serde_json::to_string(event) {
            Ok(json) => HubMessage::from(json),
            Err(e) => {
                warn!("Failed to serialize {} event: {}", event.event_type(), e);
                return BroadcastOutcome::default();
            }
        };

        let outcome = self.deliver(message).await;
        debug!(
            "Broadcast {} to {} channels ({} pruned)",
            event.event_type(),
            outcome.delivered,
            outcome.pruned
        );
        outcome
    }

    /// Send a plain informational notice to every open channel
    pub async fn broadcast_text(&self, text: &str) -> BroadcastOutcome {
        self.deliver(HubMessage::from(text)).await
    }

    async fn deliver(&self, message: HubMessage) -> BroadcastOutcome {
        let snapshot: Vec<(ChannelId, ChannelSender)> = self
            .read_channels()
            .iter()
            .map(|(id, sender)| (*id, sender.clone()))
            .collect();

        if snapshot.is_empty() {
            return BroadcastOutcome::default();
        }

        let send_timeout = self.send_timeout;
        let results = join_all(snapshot.into_iter().map(|(id, sender)| {
            let message = Arc::clone(&message);
            async move { (id, sender.send_timeout(message, send_timeout).await) }
        }))
        .await;

        let mut outcome = BroadcastOutcome::default();
        for (id, result) in results {
            match result {
                Ok(()) => outcome.delivered += 1,
                Err(SendTimeoutError::Closed(_)) => {
                    debug!("Channel {} closed, pruning", id);
                    self.unregister(id);
                    outcome.pruned += 1;
                }
                Err(SendTimeoutError::Timeout(_)) => {
                    warn!(
                        "Channel {} did not accept message within {:?}, pruning",
                        id, send_timeout
                    );
                    self.unregister(id);
                    outcome.pruned += 1;
                }
            }
        }
        outcome
    }
}

/// Unregisters its channel when dropped
///
/// Lets stream-based transports (SSE) clean up when the client goes away and
/// the response body is dropped.
pub struct ChannelGuard {
    hub: Arc<BroadcastHub>,
    id: ChannelId,
}

impl ChannelGuard {
    pub fn new(hub: Arc<BroadcastHub>, id: ChannelId) -> Self {
        Self { hub, id }
    }

    pub fn id(&self) -> ChannelId {
        self.id
    }
}

impl Drop for ChannelGuard {
    fn drop(&mut self) {
        self.hub.unregister(self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lyrics_common::{ObjectId, Song, SongEventStatus};

    fn test_hub() -> BroadcastHub {
        BroadcastHub::new(Duration::from_millis(50), 4)
    }

    fn sample_event() -> SongEvent {
        SongEvent::new_song(Song {
            id: Some(ObjectId::from_bytes([7; 12])),
            name: "Yahweh".to_string(),
            lyrics: "You are Yahweh".to_string(),
            artist: "Steve Crown".to_string(),
            album: "Faith Is Rising".to_string(),
            created: 1_700_000_000,
            updated: 1_700_000_000,
        })
    }

    #[tokio::test]
    async fn test_broadcast_reaches_every_channel() {
        let hub = test_hub();
        let mut receivers: Vec<ChannelReceiver> =
            (0..3).map(|_| hub.open_channel().1).collect();

        let outcome = hub.broadcast(&sample_event()).await;
        assert_eq!(outcome, BroadcastOutcome { delivered: 3, pruned: 0 });

        for rx in receivers.iter_mut() {
            let message = rx.try_recv().expect("each channel should get the event");
            let event: SongEvent = serde_json::from_str(&message).unwrap();
            assert_eq!(event.status, SongEventStatus::NewSong);
            assert_eq!(event, sample_event());
        }
    }

    #[tokio::test]
    async fn test_closed_channel_is_pruned_and_others_still_receive() {
        let hub = test_hub();
        let (_, mut rx_a) = hub.open_channel();
        let (closed_id, rx_closed) = hub.open_channel();
        let (_, mut rx_c) = hub.open_channel();
        drop(rx_closed);

        let outcome = hub.broadcast(&sample_event()).await;
        assert_eq!(outcome, BroadcastOutcome { delivered: 2, pruned: 1 });
        assert!(!hub.is_registered(closed_id));
        assert_eq!(hub.connection_count(), 2);

        assert!(rx_a.try_recv().is_ok());
        assert!(rx_c.try_recv().is_ok());
    }

    #[tokio::test]
    async fn test_stalled_channel_times_out_and_is_pruned() {
        let hub = BroadcastHub::new(Duration::from_millis(20), 1);
        let (stalled_id, _rx_stalled) = hub.open_channel();
        let (_, mut rx_live) = hub.open_channel();

        // Fill the stalled channel's single slot; the live one drains.
        hub.broadcast_text("first").await;
        assert_eq!(rx_live.try_recv().unwrap().as_ref(), "first");

        let outcome = hub.broadcast_text("second").await;
        assert_eq!(outcome, BroadcastOutcome { delivered: 1, pruned: 1 });
        assert!(!hub.is_registered(stalled_id));
        assert_eq!(rx_live.try_recv().unwrap().as_ref(), "second");
    }

    #[test]
    fn test_unregister_absent_channel_is_noop() {
        let hub = test_hub();
        let (id, _rx) = hub.open_channel();

        assert!(hub.unregister(id));
        assert_eq!(hub.connection_count(), 0);

        // Second removal changes nothing
        assert!(!hub.unregister(id));
        assert_eq!(hub.connection_count(), 0);
    }

    #[test]
    fn test_unregister_unknown_channel_leaves_registry_unchanged() {
        let hub = test_hub();
        let (_, _rx1) = hub.open_channel();
        let (_, _rx2) = hub.open_channel();

        let other = BroadcastHub::new(Duration::from_millis(10), 1);
        let (foreign_id, _rx3) = other.open_channel();

        assert!(!hub.unregister(foreign_id));
        assert_eq!(hub.connection_count(), 2);
    }

    #[tokio::test]
    async fn test_broadcast_without_channels_is_empty_outcome() {
        let hub = test_hub();
        assert_eq!(hub.broadcast(&sample_event()).await, BroadcastOutcome::default());
    }

    #[tokio::test]
    async fn test_register_accepts_external_sender() {
        let hub = test_hub();
        let (tx, mut rx) = mpsc::channel(2);
        let id = hub.register(tx);
        assert!(hub.is_registered(id));

        hub.broadcast_text("hello").await;
        assert_eq!(rx.recv().await.unwrap().as_ref(), "hello");
    }

    #[test]
    fn test_channel_guard_unregisters_on_drop() {
        let hub = Arc::new(test_hub());
        let (id, _rx) = hub.open_channel();

        let guard = ChannelGuard::new(Arc::clone(&hub), id);
        assert_eq!(guard.id(), id);
        assert!(hub.is_registered(id));

        drop(guard);
        assert!(!hub.is_registered(id));
    }
}
