//! A started registry wired into a `ChatService`.

use super::FlakyStore;
use sputnikd::identity::HmacTokenVerifier;
use sputnikd::service::ChatService;
use sputnikd::state::{ActorSettings, RoomRegistry};
use sputnikd::store::MemoryStore;
use std::sync::Arc;
use std::time::Duration;

pub const SECRET: &str = "integration-test-secret-0123456789";

pub struct TestHarness {
    pub service: ChatService,
    pub registry: Arc<RoomRegistry>,
    pub store: Arc<FlakyStore>,
    verifier: HmacTokenVerifier,
}

#[allow(dead_code)]
impl TestHarness {
    /// Start every room of `store` behind a failure-injecting wrapper.
    pub async fn start(store: Arc<MemoryStore>) -> Self {
        Self::start_with(store, ActorSettings::default(), Duration::from_secs(2)).await
    }

    pub async fn start_with(
        store: Arc<MemoryStore>,
        settings: ActorSettings,
        fanout_timeout: Duration,
    ) -> Self {
        let store = Arc::new(FlakyStore::new(store));
        let registry = Arc::new(RoomRegistry::new(store.clone(), settings));
        let report = registry.start().await.expect("bootstrap");
        assert_eq!(report.failed, 0, "every seeded room should start");

        let verifier = HmacTokenVerifier::new(SECRET).expect("hmac key");
        let service = ChatService::new(
            registry.clone(),
            Arc::new(verifier.clone()),
            fanout_timeout,
        );
        Self {
            service,
            registry,
            store,
            verifier,
        }
    }

    /// A token the service accepts for `user_id`, valid for an hour.
    pub fn token(&self, user_id: &str) -> String {
        self.verifier
            .sign(user_id, chrono::Utc::now().timestamp() + 3600)
    }
}
