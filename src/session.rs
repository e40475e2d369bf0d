//! Session nucleus: login, refresh rotation, revocation, password change.
//!
//! Each refresh lineage member lives in the cache under
//! `refresh:{subject}:{jti}` exactly as long as its token is unredeemed and
//! unrevoked. Redeeming a token deletes its record and mints a successor
//! under a fresh `jti`; presenting a token whose record is gone is treated as
//! a theft signal and burns every session for that subject.

use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::cache::{refresh_key, refresh_prefix, SessionCache, REFRESH_VALID_MARKER};
use crate::config::AuthConfig;
use crate::error::{AuthError, DenyReason};
use crate::principal::{PrincipalInfo, Role, TokenPair};
use crate::store::CredentialStore;
use crate::token::{Claims, TokenCodec, TokenKind};

/// Successful login: a fresh token pair plus the sanitized principal.
#[derive(Debug, Clone)]
pub struct AuthenticatedSession {
    pub tokens: TokenPair,
    pub principal: PrincipalInfo,
}

/// Orchestrates the token codec, session cache, and credential store. The
/// sole reader and writer of `refresh:*` cache keys; all collaborators are
/// constructor-injected, no process-wide state.
pub struct SessionManager {
    store: Arc<dyn CredentialStore>,
    cache: Arc<dyn SessionCache>,
    codec: TokenCodec,
    config: AuthConfig,
}

impl SessionManager {
    #[must_use]
    pub fn new(
        store: Arc<dyn CredentialStore>,
        cache: Arc<dyn SessionCache>,
        config: AuthConfig,
    ) -> Self {
        let codec = TokenCodec::new(&config);
        Self {
            store,
            cache,
            codec,
            config,
        }
    }

    /// Authenticate by identifier and password.
    ///
    /// Unknown identifier and wrong password both map to the uniform
    /// [`AuthError::Unauthenticated`]; only a locked account is
    /// distinguishable.
    ///
    /// # Errors
    /// `Unauthenticated`, `AccountLocked`, or infrastructure failures.
    pub async fn login(
        &self,
        identifier: &str,
        password: &str,
    ) -> Result<AuthenticatedSession, AuthError> {
        let principal = self
            .store
            .find_by_identifier(identifier)
            .await
            .map_err(AuthError::CredentialStore)?
            .ok_or_else(|| AuthError::unauthenticated(DenyReason::UnknownIdentifier))?;

        if principal.locked {
            return Err(AuthError::AccountLocked);
        }

        let matches = self
            .store
            .verify_hash(password, &principal.credential_hash)
            .await
            .map_err(AuthError::CredentialStore)?;
        if !matches {
            return Err(AuthError::unauthenticated(DenyReason::BadPassword));
        }

        let tokens = self.mint(principal.id, principal.role).await?;
        info!(user_id = %principal.id, "login succeeded");
        Ok(AuthenticatedSession {
            tokens,
            principal: principal.info(),
        })
    }

    /// Redeem a refresh token for a new pair, rotating the lineage.
    ///
    /// The record consume is a single atomic delete: of two concurrent calls
    /// on the same token, exactly one observes the record and wins. A missing
    /// record is replay: every outstanding session for the subject is revoked
    /// before the caller is denied.
    ///
    /// # Errors
    /// `Unauthenticated` on any token or record failure, `AccountLocked` when
    /// the subject was locked since issuance, or infrastructure failures.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        let claims = self
            .codec
            .verify(TokenKind::Refresh, refresh_token)
            .map_err(|err| {
                debug!(%err, "refresh token rejected by codec");
                AuthError::unauthenticated(DenyReason::TokenRejected)
            })?;

        // Cache outages surface as SessionStoreUnavailable here; only a
        // definitive "absent" may trigger the replay path.
        let was_present = self
            .cache
            .delete(&refresh_key(claims.sub, claims.jti))
            .await?;
        if !was_present {
            warn!(user_id = %claims.sub, jti = %claims.jti, "refresh token replay detected, revoking all sessions");
            self.revoke_all(claims.sub).await?;
            return Err(AuthError::unauthenticated(DenyReason::RecordMissing));
        }

        // Re-read the principal: lock status must gate issuance, and the role
        // is re-derived at every rotation so a role change propagates within
        // one access-token lifetime.
        let principal = self
            .store
            .find_by_id(claims.sub)
            .await
            .map_err(AuthError::CredentialStore)?
            .ok_or_else(|| AuthError::unauthenticated(DenyReason::UnknownIdentifier))?;
        if principal.locked {
            return Err(AuthError::AccountLocked);
        }

        self.mint(principal.id, principal.role).await
    }

    /// Drop the single refresh record named by the caller's token.
    ///
    /// Absence (already rotated or expired) is success, not an error.
    ///
    /// # Errors
    /// Only infrastructure failures.
    pub async fn logout(&self, subject: Uuid, jti: Option<Uuid>) -> Result<(), AuthError> {
        let Some(jti) = jti else {
            return Ok(());
        };
        let was_present = self.cache.delete(&refresh_key(subject, jti)).await?;
        debug!(user_id = %subject, %jti, was_present, "logout");
        Ok(())
    }

    /// Delete every refresh record for `subject`. No-op safe.
    ///
    /// # Errors
    /// Only infrastructure failures.
    pub async fn revoke_all(&self, subject: Uuid) -> Result<u64, AuthError> {
        let revoked = self.cache.delete_prefix(&refresh_prefix(subject)).await?;
        info!(user_id = %subject, revoked, "revoked all refresh records");
        Ok(revoked)
    }

    /// Change the stored credential and burn every session, including the one
    /// making the request; the caller must log in again.
    ///
    /// # Errors
    /// `InvalidCredentials` on old-password mismatch, or infrastructure
    /// failures.
    pub async fn change_password(
        &self,
        subject: Uuid,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        let principal = self
            .store
            .find_by_id(subject)
            .await
            .map_err(AuthError::CredentialStore)?
            .ok_or_else(|| AuthError::unauthenticated(DenyReason::UnknownIdentifier))?;

        let matches = self
            .store
            .verify_hash(old_password, &principal.credential_hash)
            .await
            .map_err(AuthError::CredentialStore)?;
        if !matches {
            return Err(AuthError::InvalidCredentials);
        }

        let new_hash = self
            .store
            .hash_credential(new_password)
            .await
            .map_err(AuthError::CredentialStore)?;
        self.store
            .update_credential_hash(subject, &new_hash)
            .await
            .map_err(AuthError::CredentialStore)?;

        // Unconditional: a password change invalidates every lineage.
        self.revoke_all(subject).await?;
        info!(user_id = %subject, "password changed");
        Ok(())
    }

    /// Verify an access token and return its claims. Stateless; role checks
    /// run against the embedded role, which is at most one access-token
    /// lifetime stale.
    ///
    /// # Errors
    /// `Unauthenticated` on any token failure.
    pub fn authenticate(&self, access_token: &str) -> Result<Claims, AuthError> {
        self.codec
            .verify(TokenKind::Access, access_token)
            .map_err(|err| {
                debug!(%err, "access token rejected by codec");
                AuthError::unauthenticated(DenyReason::TokenRejected)
            })
    }

    /// Gate an operation on the roles embedded in verified claims.
    ///
    /// # Errors
    /// `Forbidden` when the claim role is not in `allowed`.
    pub fn require_role(claims: &Claims, allowed: &[Role]) -> Result<(), AuthError> {
        if allowed.contains(&claims.role) {
            Ok(())
        } else {
            Err(AuthError::Forbidden)
        }
    }

    /// Mint an access/refresh pair under one fresh `jti` and persist the
    /// refresh record for the refresh lifetime.
    async fn mint(&self, subject: Uuid, role: Role) -> Result<TokenPair, AuthError> {
        let jti = Uuid::new_v4();
        let access_token = self
            .codec
            .issue(TokenKind::Access, subject, role, jti)
            .map_err(AuthError::Encoding)?;
        let refresh_token = self
            .codec
            .issue(TokenKind::Refresh, subject, role, jti)
            .map_err(AuthError::Encoding)?;

        self.cache
            .set(
                &refresh_key(subject, jti),
                REFRESH_VALID_MARKER,
                self.config.refresh_ttl_seconds(),
            )
            .await?;
        debug!(user_id = %subject, %jti, "minted token pair");

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }
}
