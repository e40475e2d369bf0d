//! Identity types shared across the session and registration flows.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Platform roles. Stored with the account and embedded in token claims.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Teacher,
    Admin,
}

impl Default for Role {
    fn default() -> Self {
        Self::Student
    }
}

/// An account as the credential store sees it.
///
/// The credential hash never leaves this crate; callers get
/// [`PrincipalInfo`] projections instead.
#[derive(Debug, Clone)]
pub struct Principal {
    pub id: Uuid,
    pub username: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub role: Role,
    pub credential_hash: String,
    pub locked: bool,
}

impl Principal {
    /// Sanitized projection safe to return to callers.
    #[must_use]
    pub fn info(&self) -> PrincipalInfo {
        PrincipalInfo {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            role: self.role,
        }
    }
}

/// What login and registration hand back: identity without secrets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrincipalInfo {
    pub id: Uuid,
    pub username: String,
    pub email: Option<String>,
    pub role: Role,
}

/// Registration payload parked in the session cache until the OTP is verified.
///
/// `password` is the plaintext supplied at registration; it is hashed by the
/// credential store when the principal is materialized, and the cached record
/// dies with the challenge TTL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingRegistration {
    pub username: String,
    pub password: String,
    pub full_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub school: Option<String>,
    #[serde(default)]
    pub role: Role,
}

impl PendingRegistration {
    /// The identifier a registration is keyed by: email, else phone, else username.
    #[must_use]
    pub fn identifier(&self) -> &str {
        self.email
            .as_deref()
            .or(self.phone.as_deref())
            .unwrap_or(&self.username)
    }
}

/// An access/refresh pair minted together under one fresh token id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

#[cfg(test)]
mod tests {
    use super::{PendingRegistration, Principal, Role};
    use uuid::Uuid;

    fn pending() -> PendingRegistration {
        PendingRegistration {
            username: "student01".to_string(),
            password: "Sup3rSecret!".to_string(),
            full_name: "Student One".to_string(),
            email: None,
            phone: None,
            school: None,
            role: Role::default(),
        }
    }

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Teacher).unwrap(), "\"teacher\"");
        assert_eq!(
            serde_json::from_str::<Role>("\"student\"").unwrap(),
            Role::Student
        );
    }

    #[test]
    fn info_drops_credential_hash() {
        let principal = Principal {
            id: Uuid::new_v4(),
            username: "alice".to_string(),
            email: Some("alice@example.com".to_string()),
            phone: None,
            role: Role::Teacher,
            credential_hash: "hash".to_string(),
            locked: false,
        };
        let info = principal.info();
        assert_eq!(info.id, principal.id);
        let rendered = serde_json::to_string(&info).unwrap();
        assert!(!rendered.contains("hash"));
    }

    #[test]
    fn identifier_prefers_email_then_phone() {
        let mut reg = pending();
        assert_eq!(reg.identifier(), "student01");
        reg.phone = Some("0123456789".to_string());
        assert_eq!(reg.identifier(), "0123456789");
        reg.email = Some("s01@example.com".to_string());
        assert_eq!(reg.identifier(), "s01@example.com");
    }
}
