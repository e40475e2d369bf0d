//! # Aula Auth (Session & Credential Lifecycle Core)
//!
//! `aula-auth` is the session and credential lifecycle core of the Aula
//! learning platform. It mints and rotates access/refresh token pairs,
//! detects refresh-token replay, revokes sessions, and gates registration
//! behind a one-time passcode.
//!
//! ## Token lifecycle
//!
//! - Access and refresh tokens are signed with **independent secrets** and
//!   independent lifetimes (15 minutes / 7 days by default).
//! - Every refresh token is **single-use**: redeeming it atomically consumes
//!   its cache record and issues a successor under a fresh token id.
//! - Presenting a refresh token whose record is gone is treated as **replay**:
//!   every outstanding session for that subject is revoked on the spot.
//! - A password change burns every session, including the caller's.
//!
//! ## Collaborators
//!
//! Relational persistence, password hashing, and message delivery stay
//! outside this crate, behind the [`store::CredentialStore`],
//! [`cache::SessionCache`], and [`notify::Notifier`] traits. Everything is
//! constructor-injected; there is no process-wide state. A
//! [`cache::MemoryCache`] backend ships for tests and single-node use, and a
//! Redis backend is available behind the `redis` feature.
//!
//! ## Error discipline
//!
//! Authentication denials are uniform: unknown identifier, wrong password,
//! and bad tokens all surface as [`error::AuthError::Unauthenticated`] so
//! callers cannot enumerate accounts. Cache outages surface as
//! `SessionStoreUnavailable`, never as "record absent" — replay detection
//! must not misfire on a transient outage.

pub mod cache;
pub mod config;
pub mod error;
pub mod notify;
pub mod otp;
pub mod principal;
#[cfg(feature = "redis")]
pub mod redis_store;
pub mod session;
pub mod store;
pub mod token;

pub use cache::{CacheError, MemoryCache, SessionCache};
pub use config::AuthConfig;
pub use error::AuthError;
pub use notify::{DeliveryError, Destination, Notifier};
pub use otp::OtpManager;
pub use principal::{PendingRegistration, Principal, PrincipalInfo, Role, TokenPair};
#[cfg(feature = "redis")]
pub use redis_store::RedisCache;
pub use session::{AuthenticatedSession, SessionManager};
pub use store::CredentialStore;
pub use token::{Claims, TokenCodec, TokenError, TokenKind};
