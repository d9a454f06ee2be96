//! # sputnik-proto
//!
//! Wire types shared between the Sputnik chat daemon and its transports.
//!
//! ## Conventions
//!
//! - Every timestamp is Unix time in **milliseconds** (`i64`).
//! - Enums serialize in `camelCase`.
//! - Unread counters that the server does not compute are reported as `-1`.
//!
//! ```rust
//! use sputnik_proto::{EventTypeFilter, SinceFilter, OrderType, SyncFilter};
//!
//! let filter = SyncFilter {
//!     event_type: EventTypeFilter::Message,
//!     since: Some(SinceFilter { since_timestamp: 1_700_000_000_000, order: OrderType::Newest }),
//!     event_limit: 20,
//! };
//! assert!(filter.event_type.includes_messages());
//! assert!(!filter.event_type.includes_system());
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod event;
pub mod room;
pub mod service;

pub use event::{
    AttachmentDetail, EventBundle, EventTypeFilter, MessageEventDetail, OrderType,
    ReactionDetail, SinceFilter, SyncFilter, SystemEventDetail,
};
pub use room::{MemberDetail, MemberStatus, ParseMemberStatusError, RoomDetail, RoomSummary, UserSummary};
pub use service::{
    CreateRoomRequest, CreateRoomResponse, ListRoomsRequest, ListRoomsResponse, ListUsersResponse,
    RoomFilter, RoomStreamEvent, SetReadMarkerRequest, SyncRoomsRequest, SyncRoomsResponse,
};

/// Sentinel reported for counters the server does not compute.
pub const UNREAD_COUNT_UNSET: i64 = -1;
