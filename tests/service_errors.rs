use crate::common::{Fixture, TestHarness};
use sputnik_proto::{CreateRoomRequest, RoomSummary};
use sputnikd::error::{RegistryError, ServiceError};
use sputnikd::identity::HmacTokenVerifier;

mod common;

#[tokio::test]
async fn calls_without_valid_token_are_unauthorized() {
    let h = TestHarness::start(Fixture::three_rooms().store).await;

    let forged = HmacTokenVerifier::new("some-other-secret-entirely")
        .unwrap()
        .sign("alice", chrono::Utc::now().timestamp() + 60);
    let mangled = h.token("alice").replace('.', "!");

    for token in [None, Some(""), Some(forged.as_str()), Some(mangled.as_str())] {
        let err = h.service.list_users(token).await.unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(_)), "{token:?}: {err:?}");
    }
}

#[tokio::test]
async fn starting_a_live_room_again_is_already_exists() {
    let h = TestHarness::start(Fixture::three_rooms().store).await;

    let err = h
        .registry
        .start_room(RoomSummary {
            room_id: "a".into(),
            title: "again".into(),
            avatar: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, RegistryError::AlreadyStarted(_)));
    assert_eq!(ServiceError::from(err).error_code(), "already_exists");
    assert_eq!(h.registry.len(), 3);
}

#[tokio::test]
async fn stub_operations_report_not_implemented() {
    let h = TestHarness::start(Fixture::three_rooms().store).await;
    let token = h.token("alice");
    let token = Some(token.as_str());

    let results = [
        h.service.invite_room_member(token, "a", "carol").await,
        h.service.remove_room_member(token, "a", "bob").await,
        h.service.add_room_message(token, "a", "hello").await,
    ];
    for result in results {
        let err = result.unwrap_err();
        assert_eq!(err.error_code(), "not_implemented");
    }
}

#[tokio::test]
async fn create_room_with_unknown_member_is_not_found() {
    let h = TestHarness::start(Fixture::three_rooms().store).await;
    let token = h.token("alice");

    let err = h
        .service
        .create_room(
            Some(&token),
            CreateRoomRequest {
                title: "Ghosts".into(),
                avatar: None,
                member_ids: vec!["nobody".into()],
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)), "{err:?}");
    assert_eq!(h.registry.len(), 3);
}

#[tokio::test]
async fn subscribe_requires_joined_membership() {
    let h = TestHarness::start(Fixture::three_rooms().store).await;
    let carol = h.token("carol");

    let err = h.service.subscribe_room(Some(&carol), "b").await.unwrap_err();
    assert_eq!(err.error_code(), "not_found");

    let alice = h.token("alice");
    let subscription = h.service.subscribe_room(Some(&alice), "b").await.unwrap();
    let detail = h.service.get_room_detail(Some(&alice), "b").await.unwrap();
    assert!(detail.member("alice").unwrap().is_online);
    assert!(!detail.member("carol").unwrap().is_online);
    drop(subscription);
}
