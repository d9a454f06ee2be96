//! Room repository.
//!
//! Room rows, membership rows and the event tables read by room sync.

mod events;
mod queries;

pub use queries::RoomRepository;
