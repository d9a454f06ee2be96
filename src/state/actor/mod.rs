//! Actor Model for Room State Management.
//!
//! This module implements the `RoomActor`, which owns the state of a single room
//! in an isolated Tokio task. Membership and read state are never shared, so no
//! lock guards them.
//!
//! # Architecture
//!
//! - **State Ownership**: The `RoomActor` owns the room summary, the member map and the subscriber set.
//! - **Message Passing**: All interactions happen via `RoomEvent` messages sent through a [`RoomHandle`].
//! - **Ordering**: Commands are processed one at a time in arrival order.
//! - **Lifecycle**: `Initializing` (member snapshot load) then `Ready`. Commands sent
//!   while initializing wait in the mailbox.

mod assemble;
mod handlers;
mod types;

pub use assemble::assemble_bundle;
pub use types::*;

use crate::store::{Member, RoomStore, StoreError, with_timeout};
use crate::telemetry::{CommandTimer, spans};
use sputnik_proto::{RoomStreamEvent, RoomSummary};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{Instrument, debug, error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ActorState {
    Initializing,
    Ready,
}

struct Subscriber {
    user_id: UserId,
    sender: mpsc::Sender<Arc<RoomStreamEvent>>,
}

/// The Room Actor.
///
/// Owns the state of a single room and processes events sequentially.
pub struct RoomActor {
    room_id: Arc<str>,
    title: String,
    avatar: Option<String>,
    members: HashMap<UserId, Member>,
    subscribers: HashMap<SubscriptionId, Subscriber>,
    store: Arc<dyn RoomStore>,
    settings: ActorSettings,
    state: ActorState,
}

impl RoomActor {
    /// Create a new Room Actor and spawn it.
    ///
    /// The returned receiver resolves once the member snapshot is loaded. On
    /// failure the actor has already exited and the handle is dead.
    pub fn spawn(
        summary: RoomSummary,
        store: Arc<dyn RoomStore>,
        settings: ActorSettings,
    ) -> (RoomHandle, oneshot::Receiver<Result<(), StoreError>>) {
        let (tx, rx) = mpsc::channel(settings.mailbox_capacity);
        let (init_tx, init_rx) = oneshot::channel();

        let room_id: Arc<str> = Arc::from(summary.room_id);
        let actor = Self {
            room_id: room_id.clone(),
            title: summary.title,
            avatar: summary.avatar,
            members: HashMap::new(),
            subscribers: HashMap::new(),
            store,
            settings,
            state: ActorState::Initializing,
        };

        let span = spans::room(&room_id);
        tokio::spawn(actor.run(rx, init_tx).instrument(span));

        (RoomHandle::new(room_id, tx), init_rx)
    }

    /// The main actor loop.
    async fn run(
        mut self,
        mut rx: mpsc::Receiver<RoomEvent>,
        init_tx: oneshot::Sender<Result<(), StoreError>>,
    ) {
        if let Err(e) = self.initialize().await {
            error!(error = %e, "Failed to load room members");
            let _ = init_tx.send(Err(e));
            return;
        }
        let _ = init_tx.send(Ok(()));
        info!(members = self.members.len(), "Room ready");

        while let Some(event) = rx.recv().await {
            self.handle_event(event).await;
        }

        debug!("Room mailbox closed, actor stopping");
    }

    async fn initialize(&mut self) -> Result<(), StoreError> {
        debug_assert_eq!(self.state, ActorState::Initializing);
        let members = with_timeout(
            self.settings.storage_timeout,
            self.store.list_room_members(&self.room_id),
        )
        .await?;

        self.members = members
            .into_iter()
            .map(|member| (member.user_id.clone(), member))
            .collect();
        self.state = ActorState::Ready;
        Ok(())
    }

    async fn handle_event(&mut self, event: RoomEvent) {
        match event {
            RoomEvent::GetDetail { reply_tx } => {
                let _timer = CommandTimer::new("get_detail");
                let _ = reply_tx.send(self.snapshot());
            }
            RoomEvent::SetReadMarker {
                user_id,
                timestamp,
                reply_tx,
            } => {
                let _timer = CommandTimer::new("set_read_marker");
                let result = self.handle_set_read_marker(&user_id, timestamp).await;
                let _ = reply_tx.send(result);
            }
            RoomEvent::SyncEvents {
                user_id,
                filter,
                reply_tx,
            } => {
                let _timer = CommandTimer::new("sync_events");
                let bundle = self.handle_sync_events(&user_id, &filter).await;
                let _ = reply_tx.send(bundle);
            }
            RoomEvent::Subscribe { user_id, reply_tx } => {
                let _timer = CommandTimer::new("subscribe");
                let _ = reply_tx.send(self.handle_subscribe(user_id));
            }
            RoomEvent::Unsubscribe {
                subscription_id,
                reply_tx,
            } => {
                let _timer = CommandTimer::new("unsubscribe");
                let _ = reply_tx.send(self.handle_unsubscribe(subscription_id));
            }
        }
    }
}
