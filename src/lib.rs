//! sputnikd - Sputnik chat daemon.
//!
//! Each live room is an actor owning its member snapshot; a registry maps
//! room ids to actor handles and a coordinator fans multi-room requests out
//! across them. Persistence sits behind [`store::RoomStore`].

pub mod config;
pub mod db;
pub mod error;
pub mod http;
pub mod identity;
pub mod metrics;
pub mod service;
pub mod state;
pub mod store;
pub mod telemetry;
