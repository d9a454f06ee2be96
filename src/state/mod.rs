//! Room state management.
//!
//! One [`RoomActor`] per live room, addressed through the [`RoomRegistry`].

pub mod actor;
pub mod managers;

pub use actor::{ActorSettings, RoomActor, RoomHandle, Subscription, SubscriptionId, UserId};
pub use managers::{BootstrapReport, RoomRegistry};
