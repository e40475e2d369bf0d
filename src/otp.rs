//! One-time-passcode gate for registration.
//!
//! A registration parks its payload plus a short numeric code in the cache
//! under `otp:register:{username}` for five minutes. At most one challenge is
//! live per identifier; re-registering overwrites it. Verification is
//! single-use: a match deletes the challenge before the account is created.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use crate::cache::{otp_key, SessionCache};
use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::notify::{Destination, Notifier};
use crate::principal::{PendingRegistration, PrincipalInfo};
use crate::store::CredentialStore;

/// What sits in the cache while a registration waits for its code.
#[derive(Debug, Serialize, Deserialize)]
struct OtpChallenge {
    pending: PendingRegistration,
    code: String,
}

/// Six-digit numeric code. Guessing resistance comes from the code space
/// bounded by the five-minute TTL, not from cryptographic strength.
fn generate_code() -> String {
    rand::thread_rng().gen_range(100_000..1_000_000).to_string()
}

/// Owns the OtpChallenge lifecycle end to end; nothing else reads or writes
/// `otp:register:*` keys.
pub struct OtpManager {
    store: Arc<dyn CredentialStore>,
    cache: Arc<dyn SessionCache>,
    notifier: Arc<dyn Notifier>,
    ttl_seconds: i64,
}

impl OtpManager {
    #[must_use]
    pub fn new(
        store: Arc<dyn CredentialStore>,
        cache: Arc<dyn SessionCache>,
        notifier: Arc<dyn Notifier>,
        config: &AuthConfig,
    ) -> Self {
        Self {
            store,
            cache,
            notifier,
            ttl_seconds: config.otp_ttl_seconds(),
        }
    }

    /// Open (or reopen) a registration challenge and deliver its code.
    ///
    /// Calling this again for the same username is the resend path: the old
    /// code dies, a fresh one is stored, and the TTL restarts. The challenge
    /// is stored before delivery is attempted, so a delivery failure leaves
    /// it live and the caller may simply retry.
    ///
    /// # Errors
    /// `AlreadyRegistered` for a known identifier, `MissingDestination` when
    /// the payload has neither email nor phone, `DeliveryFailed` when the
    /// dispatcher rejects the message, or infrastructure failures.
    pub async fn register(&self, pending: PendingRegistration) -> Result<(), AuthError> {
        let existing = self
            .store
            .find_by_identifier(pending.identifier())
            .await
            .map_err(AuthError::CredentialStore)?;
        if existing.is_some() {
            return Err(AuthError::AlreadyRegistered);
        }

        let destination =
            Destination::for_registration(&pending).ok_or(AuthError::MissingDestination)?;

        let code = generate_code();
        let challenge = OtpChallenge {
            pending,
            code: code.clone(),
        };
        let record =
            serde_json::to_string(&challenge).map_err(|err| AuthError::Internal(err.into()))?;
        self.cache
            .set(&otp_key(&challenge.pending.username), &record, self.ttl_seconds)
            .await?;

        let body = format!(
            "Your verification code is {code}. It expires in {} minutes.",
            self.ttl_seconds / 60
        );
        self.notifier
            .send(&destination, "Registration verification", &body)
            .await
            .map_err(AuthError::DeliveryFailed)?;

        info!(username = %challenge.pending.username, %destination, "registration code sent");
        Ok(())
    }

    /// Redeem a challenge and materialize the account.
    ///
    /// A mismatched code leaves the challenge live for another try within the
    /// TTL; a match consumes it before the credential store is touched, so a
    /// second call with the same code finds nothing.
    ///
    /// # Errors
    /// `ExpiredOrUnknown` with no live challenge, `InvalidCode` on mismatch,
    /// or infrastructure failures.
    pub async fn verify(&self, username: &str, code: &str) -> Result<PrincipalInfo, AuthError> {
        let key = otp_key(username);
        let record = self
            .cache
            .get(&key)
            .await?
            .ok_or(AuthError::ExpiredOrUnknown)?;

        let challenge: OtpChallenge = match serde_json::from_str(&record) {
            Ok(challenge) => challenge,
            Err(err) => {
                // Unreadable record: burn it rather than keep a challenge
                // nobody can redeem.
                warn!(username, %err, "discarding unreadable challenge record");
                self.cache.delete(&key).await?;
                return Err(AuthError::ExpiredOrUnknown);
            }
        };

        if challenge.code != code {
            return Err(AuthError::InvalidCode);
        }

        // Atomic consume: of two concurrent redemptions with the right code,
        // only the one that observes the record may create the account.
        let was_present = self.cache.delete(&key).await?;
        if !was_present {
            return Err(AuthError::ExpiredOrUnknown);
        }
        let principal = self
            .store
            .materialize(&challenge.pending)
            .await
            .map_err(AuthError::CredentialStore)?;
        info!(username, user_id = %principal.id, "registration verified");
        Ok(principal.info())
    }
}
