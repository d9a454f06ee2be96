//! Integration test common infrastructure.
//!
//! Provides a store wrapper with failure injection, a seeded fixture and a
//! harness that wires a started registry into a `ChatService`.

pub mod fixture;
pub mod harness;
pub mod store;

#[allow(unused_imports)]
pub use fixture::Fixture;
#[allow(unused_imports)]
pub use harness::TestHarness;
#[allow(unused_imports)]
pub use store::FlakyStore;
