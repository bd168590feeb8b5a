//! In-memory delivery gateway for development and tests.

use super::{Delivery, DeliveryGateway};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// A message the in-memory gateway accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Records every accepted message and can be told to fail for specific
/// addresses, which is how tests exercise channel divergence.
#[derive(Debug, Default, Clone)]
pub struct InMemoryGateway {
    sent: Arc<RwLock<Vec<SentMessage>>>,
    failing: Arc<RwLock<HashSet<String>>>,
}

impl InMemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every send to this address fail from now on.
    pub async fn fail_for(&self, address: &str) {
        self.failing.write().await.insert(address.to_lowercase());
    }

    /// All messages accepted so far, in send order.
    pub async fn sent(&self) -> Vec<SentMessage> {
        self.sent.read().await.clone()
    }

    /// Messages accepted for one address.
    pub async fn sent_to(&self, address: &str) -> Vec<SentMessage> {
        self.sent
            .read()
            .await
            .iter()
            .filter(|m| m.to.eq_ignore_ascii_case(address))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl DeliveryGateway for InMemoryGateway {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Delivery {
        if self.failing.read().await.contains(&to.to_lowercase()) {
            debug!(to = %to, "In-memory gateway configured to fail");
            return Delivery::failed("forced failure");
        }

        self.sent.write().await.push(SentMessage {
            to: to.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        });

        Delivery::accepted()
    }

    fn name(&self) -> &'static str {
        "in-memory"
    }
}
