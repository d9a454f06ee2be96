//! Room actor event handlers.
//!
//! Each submodule handles a category of [`RoomEvent`](super::RoomEvent)
//! messages processed by [`RoomActor`](super::RoomActor).

use super::*;

mod broadcast;
mod detail;
mod read_marker;
mod sync;
