use crate::config::LimitsConfig;
use crate::error::RoomError;
use chrono::{DateTime, Utc};
use sputnik_proto::{EventBundle, RoomDetail, RoomStreamEvent, SyncFilter};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

/// Unique identifier for a user.
pub type UserId = String;

/// Per-actor limits, taken from [`LimitsConfig`].
#[derive(Debug, Clone, Copy)]
pub struct ActorSettings {
    pub mailbox_capacity: usize,
    pub subscriber_queue_capacity: usize,
    pub storage_timeout: Duration,
    pub default_event_limit: u32,
    pub max_event_limit: u32,
}

impl From<&LimitsConfig> for ActorSettings {
    fn from(limits: &LimitsConfig) -> Self {
        Self {
            mailbox_capacity: limits.room_mailbox_capacity.max(1),
            subscriber_queue_capacity: limits.subscriber_queue_capacity.max(1),
            storage_timeout: limits.storage_timeout(),
            default_event_limit: limits.default_event_limit,
            max_event_limit: limits.max_event_limit.max(1),
        }
    }
}

impl Default for ActorSettings {
    fn default() -> Self {
        Self::from(&LimitsConfig::default())
    }
}

/// Identifier of one live subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    pub(crate) fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Receiving end of a room's state-change stream.
///
/// The stream ends when the room disconnects the subscriber (its queue
/// filled up), on unsubscribe, or when the room actor stops.
#[derive(Debug)]
pub struct Subscription {
    pub id: SubscriptionId,
    pub room_id: Arc<str>,
    pub receiver: mpsc::Receiver<Arc<RoomStreamEvent>>,
}

impl Subscription {
    /// Next pushed event, or `None` once the stream has ended.
    pub async fn recv(&mut self) -> Option<Arc<RoomStreamEvent>> {
        self.receiver.recv().await
    }
}

/// Events that can be sent to a Room Actor.
#[derive(Debug)]
pub enum RoomEvent {
    /// Snapshot of the room and its members.
    GetDetail {
        reply_tx: oneshot::Sender<RoomDetail>,
    },
    /// Persist and apply a member's read marker.
    SetReadMarker {
        user_id: UserId,
        timestamp: DateTime<Utc>,
        reply_tx: oneshot::Sender<Result<RoomDetail, RoomError>>,
    },
    /// Room events visible to a joined member.
    SyncEvents {
        user_id: UserId,
        filter: SyncFilter,
        reply_tx: oneshot::Sender<EventBundle>,
    },
    /// Open a state-change stream for a joined member.
    Subscribe {
        user_id: UserId,
        reply_tx: oneshot::Sender<Result<Subscription, RoomError>>,
    },
    /// Close a stream. Replies whether it was still registered.
    Unsubscribe {
        subscription_id: SubscriptionId,
        reply_tx: oneshot::Sender<bool>,
    },
}

/// Cloneable address of a room actor.
#[derive(Debug, Clone)]
pub struct RoomHandle {
    room_id: Arc<str>,
    tx: mpsc::Sender<RoomEvent>,
}

impl RoomHandle {
    pub(crate) fn new(room_id: Arc<str>, tx: mpsc::Sender<RoomEvent>) -> Self {
        Self { room_id, tx }
    }

    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    /// Whether both handles address the same actor.
    pub fn same_actor(&self, other: &RoomHandle) -> bool {
        self.tx.same_channel(&other.tx)
    }

    /// Enqueue a command and wait for its reply. Waits while the mailbox is full.
    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> RoomEvent,
    ) -> Result<T, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(make(reply_tx))
            .await
            .map_err(|_| RoomError::ActorUnavailable)?;
        reply_rx.await.map_err(|_| RoomError::ActorUnavailable)
    }

    pub async fn get_detail(&self) -> Result<RoomDetail, RoomError> {
        self.request(|reply_tx| RoomEvent::GetDetail { reply_tx })
            .await
    }

    pub async fn set_read_marker(
        &self,
        user_id: impl Into<UserId>,
        timestamp: DateTime<Utc>,
    ) -> Result<RoomDetail, RoomError> {
        let user_id = user_id.into();
        self.request(|reply_tx| RoomEvent::SetReadMarker {
            user_id,
            timestamp,
            reply_tx,
        })
        .await?
    }

    pub async fn sync_events(
        &self,
        user_id: impl Into<UserId>,
        filter: SyncFilter,
    ) -> Result<EventBundle, RoomError> {
        let user_id = user_id.into();
        self.request(|reply_tx| RoomEvent::SyncEvents {
            user_id,
            filter,
            reply_tx,
        })
        .await
    }

    pub async fn subscribe(&self, user_id: impl Into<UserId>) -> Result<Subscription, RoomError> {
        let user_id = user_id.into();
        self.request(|reply_tx| RoomEvent::Subscribe { user_id, reply_tx })
            .await?
    }

    pub async fn unsubscribe(&self, subscription_id: SubscriptionId) -> Result<bool, RoomError> {
        self.request(|reply_tx| RoomEvent::Unsubscribe {
            subscription_id,
            reply_tx,
        })
        .await
    }
}
