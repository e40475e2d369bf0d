//! Credential store seam: identity lookups and the opaque hash primitive.

use async_trait::async_trait;
use uuid::Uuid;

use crate::principal::{PendingRegistration, Principal};

/// Persistent identity owned by the relational layer.
///
/// Lookups are read-only; the only writes this crate triggers are the
/// password-change hash update and the materialization of a verified
/// registration. Password hashing is a black-box one-way hash-and-verify
/// behind this trait, per the platform's security boundary.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Look up by username, email, or phone. `None` when unknown.
    async fn find_by_identifier(&self, identifier: &str) -> anyhow::Result<Option<Principal>>;

    /// Look up by subject id. Used for the lock check and the role re-read at
    /// refresh rotation.
    async fn find_by_id(&self, subject: Uuid) -> anyhow::Result<Option<Principal>>;

    /// Verify a plaintext against a stored hash. Must be constant-time in the
    /// underlying primitive; this crate only sees the boolean.
    async fn verify_hash(&self, plaintext: &str, hash: &str) -> anyhow::Result<bool>;

    /// One-way hash a plaintext for storage.
    async fn hash_credential(&self, plaintext: &str) -> anyhow::Result<String>;

    /// Replace the stored hash for `subject`.
    async fn update_credential_hash(&self, subject: Uuid, new_hash: &str) -> anyhow::Result<()>;

    /// Turn a verified pending registration into a real principal.
    async fn materialize(&self, pending: &PendingRegistration) -> anyhow::Result<Principal>;
}
