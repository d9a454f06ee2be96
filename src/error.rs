//! Unified error handling for sputnikd.
//!
//! Errors are layered: storage ([`StoreError`]) feeds room actors
//! ([`RoomError`]) and the registry ([`RegistryError`]); everything a caller
//! sees is a [`ServiceError`].

use crate::store::StoreError;
use thiserror::Error;

// ============================================================================
// Room actor errors
// ============================================================================

/// Errors returned by a room actor command.
#[derive(Debug, Error)]
pub enum RoomError {
    #[error("user {0} is not a member of this room")]
    MemberNotFound(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// The actor's mailbox is closed or it dropped the reply.
    #[error("room actor unavailable")]
    ActorUnavailable,
}

impl RoomError {
    /// Get a static error code string for metrics labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::MemberNotFound(_) => "member_not_found",
            Self::Store(StoreError::Timeout(_)) => "store_timeout",
            Self::Store(_) => "store_error",
            Self::ActorUnavailable => "actor_unavailable",
        }
    }
}

// ============================================================================
// Registry errors
// ============================================================================

/// Errors raised while starting room actors.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("room already started: {0}")]
    AlreadyStarted(String),

    /// The actor could not load its member snapshot.
    #[error("room initialization failed: {0}")]
    Init(StoreError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

// ============================================================================
// Service errors (caller-visible)
// ============================================================================

/// Errors surfaced by [`crate::service::ChatService`].
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("{0} is not implemented")]
    NotImplemented(&'static str),
}

impl ServiceError {
    /// Get a static error code string for metrics labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::Unauthorized(_) => "unauthorized",
            Self::AlreadyExists(_) => "already_exists",
            Self::InvalidArgument(_) => "invalid_argument",
            Self::Internal(_) => "internal",
            Self::NotImplemented(_) => "not_implemented",
        }
    }
}

impl From<RoomError> for ServiceError {
    fn from(err: RoomError) -> Self {
        match err {
            RoomError::MemberNotFound(user) => Self::NotFound(format!("member {user}")),
            RoomError::Store(StoreError::NotFound(what)) => Self::NotFound(what),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<RegistryError> for ServiceError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::AlreadyStarted(id) => Self::AlreadyExists(format!("room {id}")),
            RegistryError::Store(StoreError::NotFound(what)) => Self::NotFound(what),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => Self::NotFound(what),
            other => Self::Internal(other.to_string()),
        }
    }
}
