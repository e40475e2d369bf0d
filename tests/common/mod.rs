//! Shared in-memory collaborators for flow tests.
#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;
use uuid::Uuid;

use aula_auth::{
    CacheError, CredentialStore, DeliveryError, Destination, Notifier, PendingRegistration,
    Principal, Role, SessionCache,
};

fn fake_hash(plaintext: &str) -> String {
    format!("hash::{plaintext}")
}

/// Credential store over a mutexed map. The "hash" is a marked copy of the
/// plaintext; the primitive is opaque to the crate under test either way.
#[derive(Default)]
pub struct InMemoryCredentials {
    accounts: Mutex<HashMap<Uuid, Principal>>,
}

impl InMemoryCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn seed(&self, username: &str, password: &str, role: Role) -> Uuid {
        let principal = Principal {
            id: Uuid::new_v4(),
            username: username.to_string(),
            email: Some(format!("{username}@example.com")),
            phone: None,
            role,
            credential_hash: fake_hash(password),
            locked: false,
        };
        let id = principal.id;
        self.accounts.lock().await.insert(id, principal);
        id
    }

    pub async fn lock(&self, subject: Uuid) {
        if let Some(principal) = self.accounts.lock().await.get_mut(&subject) {
            principal.locked = true;
        }
    }

    pub async fn set_role(&self, subject: Uuid, role: Role) {
        if let Some(principal) = self.accounts.lock().await.get_mut(&subject) {
            principal.role = role;
        }
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentials {
    async fn find_by_identifier(&self, identifier: &str) -> anyhow::Result<Option<Principal>> {
        let accounts = self.accounts.lock().await;
        Ok(accounts
            .values()
            .find(|principal| {
                principal.username == identifier
                    || principal.email.as_deref() == Some(identifier)
                    || principal.phone.as_deref() == Some(identifier)
            })
            .cloned())
    }

    async fn find_by_id(&self, subject: Uuid) -> anyhow::Result<Option<Principal>> {
        Ok(self.accounts.lock().await.get(&subject).cloned())
    }

    async fn verify_hash(&self, plaintext: &str, hash: &str) -> anyhow::Result<bool> {
        Ok(fake_hash(plaintext) == hash)
    }

    async fn hash_credential(&self, plaintext: &str) -> anyhow::Result<String> {
        Ok(fake_hash(plaintext))
    }

    async fn update_credential_hash(&self, subject: Uuid, new_hash: &str) -> anyhow::Result<()> {
        let mut accounts = self.accounts.lock().await;
        let principal = accounts
            .get_mut(&subject)
            .ok_or_else(|| anyhow::anyhow!("unknown subject {subject}"))?;
        principal.credential_hash = new_hash.to_string();
        Ok(())
    }

    async fn materialize(&self, pending: &PendingRegistration) -> anyhow::Result<Principal> {
        let mut accounts = self.accounts.lock().await;
        if accounts
            .values()
            .any(|principal| principal.username == pending.username)
        {
            anyhow::bail!("username {} already exists", pending.username);
        }
        let principal = Principal {
            id: Uuid::new_v4(),
            username: pending.username.clone(),
            email: pending.email.clone(),
            phone: pending.phone.clone(),
            role: pending.role,
            credential_hash: fake_hash(&pending.password),
            locked: false,
        };
        accounts.insert(principal.id, principal.clone());
        Ok(principal)
    }
}

/// Notifier that records every message and can be flipped into failure mode.
#[derive(Default)]
pub struct RecordingNotifier {
    failing: AtomicBool,
    sent: Mutex<Vec<(Destination, String)>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_next_sends(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }

    /// Digits of the code in the most recent message body.
    pub async fn last_code(&self) -> Option<String> {
        let sent = self.sent.lock().await;
        let (_, body) = sent.last()?;
        let code: String = body.chars().filter(char::is_ascii_digit).take(6).collect();
        (code.len() == 6).then_some(code)
    }

    pub async fn last_destination(&self) -> Option<Destination> {
        self.sent.lock().await.last().map(|(dest, _)| dest.clone())
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(
        &self,
        destination: &Destination,
        _subject: &str,
        body: &str,
    ) -> Result<(), DeliveryError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(DeliveryError::new(destination.to_string(), "provider down"));
        }
        self.sent
            .lock()
            .await
            .push((destination.clone(), body.to_string()));
        Ok(())
    }
}

/// Cache wrapper that fails on demand, for outage-path tests.
pub struct OutageCache<C> {
    inner: C,
    down: AtomicBool,
}

impl<C> OutageCache<C> {
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            down: AtomicBool::new(false),
        }
    }

    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), CacheError> {
        if self.down.load(Ordering::SeqCst) {
            Err(CacheError::new("simulated outage"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl<C: SessionCache> SessionCache for OutageCache<C> {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        self.check()?;
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str, ttl_seconds: i64) -> Result<(), CacheError> {
        self.check()?;
        self.inner.set(key, value, ttl_seconds).await
    }

    async fn delete(&self, key: &str) -> Result<bool, CacheError> {
        self.check()?;
        self.inner.delete(key).await
    }

    async fn delete_prefix(&self, prefix: &str) -> Result<u64, CacheError> {
        self.check()?;
        self.inner.delete_prefix(prefix).await
    }
}

pub fn pending_registration(username: &str) -> PendingRegistration {
    PendingRegistration {
        username: username.to_string(),
        password: "Sup3rSecret!".to_string(),
        full_name: "Student One".to_string(),
        email: Some(format!("{username}@example.com")),
        phone: None,
        school: Some("Aula High".to_string()),
        role: Role::Student,
    }
}
