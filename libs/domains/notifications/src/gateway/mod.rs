//! Message delivery gateway boundary.
//!
//! The transport behind this trait is an external collaborator: the gateway
//! accepts a rendered message and reports success or failure, and it never
//! propagates an error into the caller. The fan-out engine is free to call
//! it at full-scan frequency.

mod memory;
mod smtp;

pub use memory::{InMemoryGateway, SentMessage};
pub use smtp::{SmtpConfig, SmtpGateway};

use async_trait::async_trait;

/// Outcome of one delivery attempt.
#[derive(Debug, Clone)]
pub struct Delivery {
    /// Whether the transport accepted the message.
    pub accepted: bool,
    /// Transport error text when it did not.
    pub error: Option<String>,
}

impl Delivery {
    pub fn accepted() -> Self {
        Self {
            accepted: true,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            accepted: false,
            error: Some(error.into()),
        }
    }
}

/// Trait for message delivery transports.
#[async_trait]
pub trait DeliveryGateway: Send + Sync {
    /// Attempt to deliver a message. Infallible by contract: every transport
    /// problem is folded into the returned [`Delivery`].
    async fn send(&self, to: &str, subject: &str, body: &str) -> Delivery;

    /// Gateway name for logging.
    fn name(&self) -> &'static str;
}
