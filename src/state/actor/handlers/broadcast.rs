//! Subscriptions and state-change fan-out to subscribers.
//!
//! Delivery never waits: a subscriber whose queue is full or whose receiver
//! is gone is disconnected.

use super::*;
use crate::error::RoomError;
use sputnik_proto::MemberStatus;
use tokio::sync::mpsc::error::TrySendError;
use tracing::warn;

impl RoomActor {
    pub(crate) fn handle_subscribe(&mut self, user_id: UserId) -> Result<Subscription, RoomError> {
        let joined = self
            .members
            .get(&user_id)
            .is_some_and(|m| m.status == MemberStatus::Joined);
        if !joined {
            return Err(RoomError::MemberNotFound(user_id));
        }

        let (sender, receiver) = mpsc::channel(self.settings.subscriber_queue_capacity);
        let id = SubscriptionId::new();
        debug!(user_id = %user_id, subscription = %id, "Subscriber added");
        self.subscribers.insert(id, Subscriber { user_id, sender });

        Ok(Subscription {
            id,
            room_id: self.room_id.clone(),
            receiver,
        })
    }

    pub(crate) fn handle_unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let removed = self.subscribers.remove(&id).is_some();
        if removed {
            debug!(subscription = %id, "Subscriber removed");
        }
        removed
    }

    pub(crate) fn broadcast(&mut self, event: RoomStreamEvent) {
        let event = Arc::new(event);
        let mut dropped = Vec::new();

        for (id, subscriber) in &self.subscribers {
            if let Err(err) = subscriber.sender.try_send(event.clone()) {
                match err {
                    TrySendError::Full(_) => {
                        warn!(user_id = %subscriber.user_id, subscription = %id, "Subscriber queue full, disconnecting");
                    }
                    TrySendError::Closed(_) => {
                        debug!(user_id = %subscriber.user_id, subscription = %id, "Subscriber gone");
                    }
                }
                dropped.push(*id);
            }
        }

        for id in dropped {
            self.subscribers.remove(&id);
            crate::metrics::record_broadcast_dropped();
        }
    }
}
