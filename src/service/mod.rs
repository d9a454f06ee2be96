//! Caller-facing chat service.
//!
//! `ChatService` authenticates each call, routes single-room operations to the
//! room's actor through the registry and multi-room ones through the
//! [`SyncCoordinator`]. Every failure leaves as a [`ServiceError`] and is
//! counted per operation.

mod fanout;

pub use fanout::SyncCoordinator;

use crate::error::ServiceError;
use crate::identity::{IdentityError, IdentityVerifier};
use crate::state::{RoomHandle, RoomRegistry, Subscription, SubscriptionId, UserId};
use crate::store::{from_millis, with_timeout};
use crate::telemetry::spans;
use sputnik_proto::{
    CreateRoomRequest, CreateRoomResponse, EventBundle, ListRoomsRequest, ListRoomsResponse,
    ListUsersResponse, RoomDetail, RoomFilter, SetReadMarkerRequest, SyncRoomsRequest,
    SyncRoomsResponse,
};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{Instrument, debug};

pub struct ChatService {
    registry: Arc<RoomRegistry>,
    coordinator: SyncCoordinator,
    identity: Arc<dyn IdentityVerifier>,
}

impl ChatService {
    pub fn new(
        registry: Arc<RoomRegistry>,
        identity: Arc<dyn IdentityVerifier>,
        fanout_timeout: Duration,
    ) -> Self {
        Self {
            coordinator: SyncCoordinator::new(registry.clone(), fanout_timeout),
            registry,
            identity,
        }
    }

    pub fn registry(&self) -> &Arc<RoomRegistry> {
        &self.registry
    }

    /// Resolve the caller's bearer token.
    pub fn authenticate(&self, token: Option<&str>) -> Result<UserId, ServiceError> {
        token
            .filter(|t| !t.is_empty())
            .ok_or(IdentityError::Missing)
            .and_then(|t| self.identity.verify(t))
            .map_err(|e| ServiceError::Unauthorized(e.to_string()))
    }

    /// Authenticate, run `op` inside a service span and count its failure.
    async fn call<T, F, Fut>(
        &self,
        op: &'static str,
        token: Option<&str>,
        body: F,
    ) -> Result<T, ServiceError>
    where
        F: FnOnce(UserId) -> Fut,
        Fut: Future<Output = Result<T, ServiceError>>,
    {
        let result = match self.authenticate(token) {
            Ok(user_id) => {
                let span = spans::service_call(op, Some(&user_id));
                body(user_id).instrument(span).await
            }
            Err(e) => Err(e),
        };

        if let Err(e) = &result {
            debug!(op, error = %e, "Service call failed");
            crate::metrics::record_service_error(op, e.error_code());
        }
        result
    }

    fn room(&self, room_id: &str) -> Result<RoomHandle, ServiceError> {
        self.registry
            .find_room(room_id)
            .ok_or_else(|| ServiceError::NotFound(format!("room {room_id}")))
    }

    pub async fn get_room_detail(
        &self,
        token: Option<&str>,
        room_id: &str,
    ) -> Result<RoomDetail, ServiceError> {
        self.call("get_room_detail", token, |_| async move {
            Ok(self.room(room_id)?.get_detail().await?)
        })
        .await
    }

    /// Move the caller's read marker. Fails with `NotFound` when the room is
    /// not live or the caller has no membership in it.
    pub async fn set_read_marker(
        &self,
        token: Option<&str>,
        request: SetReadMarkerRequest,
    ) -> Result<RoomDetail, ServiceError> {
        self.call("set_read_marker", token, |user_id| async move {
            let handle = self.room(&request.room_id)?;
            let marker = from_millis(request.read_marker_timestamp);
            Ok(handle.set_read_marker(user_id, marker).await?)
        })
        .await
    }

    /// Events of one room. Non-members get an empty bundle.
    pub async fn sync_room_events(
        &self,
        token: Option<&str>,
        request: RoomFilter,
    ) -> Result<EventBundle, ServiceError> {
        self.call("sync_room_events", token, |user_id| async move {
            let handle = self.room(&request.room_id)?;
            Ok(handle.sync_events(user_id, request.filter).await?)
        })
        .await
    }

    pub async fn list_rooms(
        &self,
        token: Option<&str>,
        request: ListRoomsRequest,
    ) -> Result<ListRoomsResponse, ServiceError> {
        self.call("list_rooms", token, |_| async move {
            let details = self.coordinator.list_rooms(&request.room_ids).await;
            Ok(ListRoomsResponse { details })
        })
        .await
    }

    pub async fn sync_rooms(
        &self,
        token: Option<&str>,
        request: SyncRoomsRequest,
    ) -> Result<SyncRoomsResponse, ServiceError> {
        self.call("sync_rooms", token, |user_id| async move {
            self.coordinator
                .sync_rooms(&user_id, &request.room_filters)
                .await
                .map_err(|e| ServiceError::Internal(format!("room memberships: {e}")))
        })
        .await
    }

    /// Persist a room with the caller and `member_ids` joined, then start it.
    pub async fn create_room(
        &self,
        token: Option<&str>,
        request: CreateRoomRequest,
    ) -> Result<CreateRoomResponse, ServiceError> {
        self.call("create_room", token, |user_id| async move {
            let title = request.title.trim();
            if title.is_empty() {
                return Err(ServiceError::InvalidArgument("title is empty".to_string()));
            }
            if !request.member_ids.iter().any(|id| *id != user_id) {
                return Err(ServiceError::InvalidArgument(
                    "a room needs at least one member besides its creator".to_string(),
                ));
            }

            let handle = self
                .registry
                .create_room(title, request.avatar.as_deref(), &user_id, &request.member_ids)
                .await?;
            let detail = handle.get_detail().await?;
            let room = sputnik_proto::RoomSummary {
                room_id: detail.room_id.clone(),
                title: detail.title.clone(),
                avatar: detail.avatar.clone(),
            };
            Ok(CreateRoomResponse { room, detail })
        })
        .await
    }

    pub async fn list_users(&self, token: Option<&str>) -> Result<ListUsersResponse, ServiceError> {
        self.call("list_users", token, |_| async move {
            let settings = self.registry.settings();
            let users = with_timeout(settings.storage_timeout, self.registry.store().list_users())
                .await
                .map_err(|e| ServiceError::Internal(e.to_string()))?;
            Ok(ListUsersResponse { users })
        })
        .await
    }

    /// Open a state-change stream on one room. Only joined members may subscribe.
    pub async fn subscribe_room(
        &self,
        token: Option<&str>,
        room_id: &str,
    ) -> Result<Subscription, ServiceError> {
        self.call("subscribe_room", token, |user_id| async move {
            Ok(self.room(room_id)?.subscribe(user_id).await?)
        })
        .await
    }

    /// Close a stream. Returns whether it was still open.
    pub async fn unsubscribe_room(
        &self,
        token: Option<&str>,
        room_id: &str,
        subscription_id: SubscriptionId,
    ) -> Result<bool, ServiceError> {
        self.call("unsubscribe_room", token, |_| async move {
            Ok(self.room(room_id)?.unsubscribe(subscription_id).await?)
        })
        .await
    }

    pub async fn invite_room_member(
        &self,
        token: Option<&str>,
        _room_id: &str,
        _user_id: &str,
    ) -> Result<(), ServiceError> {
        self.call("invite_room_member", token, |_| async {
            Err(ServiceError::NotImplemented("invite_room_member"))
        })
        .await
    }

    pub async fn remove_room_member(
        &self,
        token: Option<&str>,
        _room_id: &str,
        _user_id: &str,
    ) -> Result<(), ServiceError> {
        self.call("remove_room_member", token, |_| async {
            Err(ServiceError::NotImplemented("remove_room_member"))
        })
        .await
    }

    pub async fn add_room_message(
        &self,
        token: Option<&str>,
        _room_id: &str,
        _content: &str,
    ) -> Result<(), ServiceError> {
        self.call("add_room_message", token, |_| async {
            Err(ServiceError::NotImplemented("add_room_message"))
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::IdentityError;
    use crate::state::ActorSettings;
    use crate::store::{MemoryStore, MessageEvent};
    use sputnik_proto::{MemberStatus, RoomSummary, SyncFilter, UserSummary};

    /// Accepts any non-empty token except "bad" as the user id it names.
    struct NamedTokens;

    impl IdentityVerifier for NamedTokens {
        fn verify(&self, token: &str) -> Result<String, IdentityError> {
            match token {
                "bad" => Err(IdentityError::BadSignature),
                user => Ok(user.to_string()),
            }
        }
    }

    fn user(id: &str) -> UserSummary {
        UserSummary {
            user_id: id.to_string(),
            full_name: id.to_uppercase(),
            avatar: None,
        }
    }

    async fn service() -> (ChatService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        for id in ["alice", "bob", "carol"] {
            store.add_user(user(id));
        }
        store.add_room(RoomSummary {
            room_id: "r1".into(),
            title: "General".into(),
            avatar: None,
        });
        store.add_member("r1", "alice", MemberStatus::Joined);
        store.add_member("r1", "bob", MemberStatus::Invited);
        store.add_message(MessageEvent {
            id: "m1".into(),
            room_id: "r1".into(),
            user_id: "alice".into(),
            client_event_id: 1,
            version: 1,
            content: "hello".into(),
            create_time: from_millis(1_000),
            update_time: None,
        });

        let registry = Arc::new(RoomRegistry::new(store.clone(), ActorSettings::default()));
        registry.start().await.unwrap();
        let service = ChatService::new(registry, Arc::new(NamedTokens), Duration::from_secs(1));
        (service, store)
    }

    #[tokio::test]
    async fn missing_or_invalid_token_is_unauthorized() {
        let (service, _) = service().await;

        let err = service.get_room_detail(None, "r1").await.unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(ref m) if m == "missing token"));
        let err = service.get_room_detail(Some(""), "r1").await.unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(ref m) if m == "missing token"));
        let err = service.list_users(Some("bad")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn unknown_room_is_not_found() {
        let (service, _) = service().await;
        let err = service.get_room_detail(Some("alice"), "nope").await.unwrap_err();
        assert_eq!(err.error_code(), "not_found");

        let err = service
            .set_read_marker(
                Some("alice"),
                SetReadMarkerRequest {
                    room_id: "nope".into(),
                    read_marker_timestamp: 1,
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "not_found");
    }

    #[tokio::test]
    async fn read_marker_of_stranger_is_not_found() {
        let (service, _) = service().await;
        let err = service
            .set_read_marker(
                Some("carol"),
                SetReadMarkerRequest {
                    room_id: "r1".into(),
                    read_marker_timestamp: 1,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn single_room_sync_respects_membership() {
        let (service, _) = service().await;
        let request = RoomFilter {
            room_id: "r1".into(),
            filter: SyncFilter::all(10),
        };

        let joined = service.sync_room_events(Some("alice"), request.clone()).await.unwrap();
        assert_eq!(joined.message_events.len(), 1);
        let invited = service.sync_room_events(Some("bob"), request).await.unwrap();
        assert!(invited.is_empty());
    }

    #[tokio::test]
    async fn create_room_needs_another_member() {
        let (service, _) = service().await;
        let err = service
            .create_room(
                Some("alice"),
                CreateRoomRequest {
                    title: "Solo".into(),
                    avatar: None,
                    member_ids: vec!["alice".into()],
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn create_room_starts_a_live_room() {
        let (service, store) = service().await;
        let created = service
            .create_room(
                Some("alice"),
                CreateRoomRequest {
                    title: "Pair".into(),
                    avatar: Some("pair.png".into()),
                    member_ids: vec!["carol".into()],
                },
            )
            .await
            .unwrap();

        assert_eq!(created.room.title, "Pair");
        assert_eq!(created.detail.members.len(), 2);
        assert!(service.registry().find_room(&created.room.room_id).is_some());
        assert!(store.read_marker(&created.room.room_id, "carol").is_none());
    }

    #[tokio::test]
    async fn list_users_returns_everyone() {
        let (service, _) = service().await;
        let users = service.list_users(Some("alice")).await.unwrap().users;
        assert_eq!(users.len(), 3);
    }

    #[tokio::test]
    async fn stubs_are_not_implemented() {
        let (service, _) = service().await;
        let token = Some("alice");

        let err = service.invite_room_member(token, "r1", "carol").await.unwrap_err();
        assert!(matches!(err, ServiceError::NotImplemented("invite_room_member")));
        let err = service.remove_room_member(token, "r1", "bob").await.unwrap_err();
        assert!(matches!(err, ServiceError::NotImplemented("remove_room_member")));
        let err = service.add_room_message(token, "r1", "hi").await.unwrap_err();
        assert!(matches!(err, ServiceError::NotImplemented("add_room_message")));

        // Authentication still comes first.
        let err = service.add_room_message(None, "r1", "hi").await.unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn subscriber_sees_read_marker_changes() {
        let (service, _) = service().await;
        let mut subscription = service.subscribe_room(Some("alice"), "r1").await.unwrap();

        service
            .set_read_marker(
                Some("alice"),
                SetReadMarkerRequest {
                    room_id: "r1".into(),
                    read_marker_timestamp: 2_000,
                },
            )
            .await
            .unwrap();

        let event = subscription.recv().await.unwrap();
        let sputnik_proto::RoomStreamEvent::RoomStateChanged { detail } = event.as_ref();
        assert_eq!(detail.member("alice").unwrap().last_read_marker, Some(2_000));

        let still_open = service
            .unsubscribe_room(Some("alice"), "r1", subscription.id)
            .await
            .unwrap();
        assert!(still_open);
    }
}
