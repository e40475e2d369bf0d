//! Out-of-band delivery seam for OTP codes.

use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

use crate::principal::PendingRegistration;

/// Where a message goes. Email is preferred when a registration carries both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    Email(String),
    Sms(String),
}

impl Destination {
    /// Pick the delivery channel for a pending registration, email first.
    #[must_use]
    pub(crate) fn for_registration(pending: &PendingRegistration) -> Option<Self> {
        if let Some(email) = pending.email.clone() {
            return Some(Self::Email(email));
        }
        pending.phone.clone().map(Self::Sms)
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Email(address) => write!(f, "{address}"),
            Self::Sms(number) => write!(f, "{number}"),
        }
    }
}

/// Delivery failed downstream (provider rejected, channel unreachable).
#[derive(Debug, Error)]
#[error("delivery to {destination} failed: {reason}")]
pub struct DeliveryError {
    destination: String,
    reason: String,
}

impl DeliveryError {
    #[must_use]
    pub fn new(destination: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            destination: destination.into(),
            reason: reason.into(),
        }
    }
}

/// Dispatcher for transactional messages. The subject line is ignored by
/// SMS channels.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(
        &self,
        destination: &Destination,
        subject: &str,
        body: &str,
    ) -> Result<(), DeliveryError>;
}
