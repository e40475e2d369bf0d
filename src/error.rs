//! Failure taxonomy for the session and credential lifecycle core.

use thiserror::Error;
use tracing::debug;

use crate::cache::CacheError;
use crate::notify::DeliveryError;
use crate::token::TokenError;

/// Errors surfaced at the caller boundary.
///
/// Authentication failures are deliberately uniform: bad identifier, bad
/// password, and bad/expired/tampered tokens all collapse into
/// [`AuthError::Unauthenticated`] so callers cannot probe which factor failed.
/// The collapse happens in [`AuthError::unauthenticated`], the only place
/// allowed to construct that variant from a concrete cause.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Credentials or token rejected. Carries no detail on purpose.
    #[error("invalid credentials")]
    Unauthenticated,

    /// The account exists but is locked; login and refresh are both blocked.
    #[error("account is locked")]
    AccountLocked,

    /// Old-password mismatch on a password change.
    #[error("current password is incorrect")]
    InvalidCredentials,

    /// Authenticated, but the claim role does not permit the operation.
    #[error("insufficient role")]
    Forbidden,

    /// Supplied OTP code does not match the live challenge.
    #[error("invalid verification code")]
    InvalidCode,

    /// No live OTP challenge for the identifier (expired, consumed, or never issued).
    #[error("verification code expired or unknown identifier")]
    ExpiredOrUnknown,

    /// A registration already exists for the identifier.
    #[error("user already exists")]
    AlreadyRegistered,

    /// The pending registration has neither an email nor a phone number.
    #[error("registration payload has no delivery destination")]
    MissingDestination,

    /// Out-of-band delivery of the OTP code failed; the challenge stays live.
    #[error("failed to deliver verification code")]
    DeliveryFailed(#[source] DeliveryError),

    /// The session cache did not answer. Never conflated with "record absent":
    /// doing so would misfire replay detection on a transient outage.
    #[error("session store unavailable")]
    SessionStoreUnavailable(#[from] CacheError),

    /// The credential store did not answer.
    #[error("credential store failure")]
    CredentialStore(#[source] anyhow::Error),

    /// Token encoding failed. Indicates a programming error, not a user
    /// condition; it should never occur on well-formed input.
    #[error("token encoding failed")]
    Encoding(#[source] TokenError),

    /// Invariant violation inside the crate. Never expected at runtime.
    #[error("internal error")]
    Internal(#[source] anyhow::Error),
}

/// Private cause behind a uniform [`AuthError::Unauthenticated`].
///
/// Logged at `debug` for operators, never exposed to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DenyReason {
    UnknownIdentifier,
    BadPassword,
    TokenRejected,
    RecordMissing,
}

impl AuthError {
    /// The single mapping point for authentication denials.
    pub(crate) fn unauthenticated(reason: DenyReason) -> Self {
        debug!(?reason, "authentication denied");
        Self::Unauthenticated
    }
}
