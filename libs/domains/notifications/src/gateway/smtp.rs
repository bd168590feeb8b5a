//! SMTP delivery gateway using lettre.
//!
//! Defaults target a local Mailpit instance for development; production
//! relays get TLS and credentials via configuration.

use super::{Delivery, DeliveryGateway};
use crate::error::{NotificationError, NotificationResult};
use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// SMTP configuration.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    /// SMTP server host.
    pub host: String,
    /// SMTP server port.
    pub port: u16,
    /// Sender email address.
    pub from_email: String,
    /// Sender name.
    pub from_name: String,
    /// SMTP username (optional for dev servers).
    pub username: Option<String>,
    /// SMTP password (optional for dev servers).
    pub password: Option<String>,
    /// Whether to use TLS (false for local dev servers).
    pub use_tls: bool,
}

impl SmtpConfig {
    pub fn new(host: String, port: u16, from_email: String, from_name: String) -> Self {
        Self {
            host,
            port,
            from_email,
            from_name,
            username: None,
            password: None,
            use_tls: false,
        }
    }

    /// Configuration from environment, defaulting to a local Mailpit.
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("SMTP_HOST").unwrap_or_else(|_| "localhost".to_string()),
            port: std::env::var("SMTP_PORT")
                .unwrap_or_else(|_| "1025".to_string())
                .parse()
                .unwrap_or(1025),
            from_email: std::env::var("SMTP_FROM_EMAIL")
                .unwrap_or_else(|_| "compliance@localhost".to_string()),
            from_name: std::env::var("SMTP_FROM_NAME")
                .unwrap_or_else(|_| "Vantage Compliance".to_string()),
            username: std::env::var("SMTP_USERNAME").ok(),
            password: std::env::var("SMTP_PASSWORD").ok(),
            use_tls: std::env::var("SMTP_USE_TLS")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
        }
    }

    pub fn with_tls(mut self, use_tls: bool) -> Self {
        self.use_tls = use_tls;
        self
    }

    pub fn with_credentials(mut self, username: String, password: String) -> Self {
        self.username = Some(username);
        self.password = Some(password);
        self
    }
}

/// SMTP delivery gateway.
pub struct SmtpGateway {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    config: Arc<SmtpConfig>,
}

impl SmtpGateway {
    pub fn new(config: SmtpConfig) -> NotificationResult<Self> {
        let transport = Self::build_transport(&config)?;
        Ok(Self {
            transport,
            config: Arc::new(config),
        })
    }

    fn build_transport(
        config: &SmtpConfig,
    ) -> NotificationResult<AsyncSmtpTransport<Tokio1Executor>> {
        let transport = if config.use_tls {
            let mut builder = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
                .map_err(|e| {
                    NotificationError::GatewayError(format!("Failed to create SMTP relay: {}", e))
                })?
                .port(config.port);

            if let (Some(username), Some(password)) = (&config.username, &config.password) {
                builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
            }

            builder.build()
        } else {
            let mut builder = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
                .port(config.port);

            if let (Some(username), Some(password)) = (&config.username, &config.password) {
                builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
            }

            builder.build()
        };

        Ok(transport)
    }

    fn build_message(&self, to: &str, subject: &str, body: &str) -> NotificationResult<Message> {
        let from: Mailbox = format!("{} <{}>", self.config.from_name, self.config.from_email)
            .parse()
            .map_err(|e| {
                NotificationError::GatewayError(format!("Invalid from address: {}", e))
            })?;

        let to: Mailbox = to.parse().map_err(|e| {
            NotificationError::GatewayError(format!("Invalid to address: {}", e))
        })?;

        Message::builder()
            .from(from)
            .to(to)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| {
                NotificationError::GatewayError(format!("Failed to build message: {}", e))
            })
    }
}

#[async_trait]
impl DeliveryGateway for SmtpGateway {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Delivery {
        debug!(
            to = %to,
            subject = %subject,
            host = %self.config.host,
            port = %self.config.port,
            "Sending message via SMTP"
        );

        let message = match self.build_message(to, subject, body) {
            Ok(message) => message,
            Err(e) => {
                warn!(to = %to, error = %e, "Could not build SMTP message");
                return Delivery::failed(e.to_string());
            }
        };

        match self.transport.send(message).await {
            Ok(_) => {
                info!(to = %to, "Message accepted by SMTP server");
                Delivery::accepted()
            }
            Err(e) => {
                warn!(to = %to, error = %e, "SMTP send failed");
                Delivery::failed(format!("SMTP send failed: {}", e))
            }
        }
    }

    fn name(&self) -> &'static str {
        "SMTP"
    }
}

// AsyncSmtpTransport doesn't implement Clone; rebuild from config
impl Clone for SmtpGateway {
    fn clone(&self) -> Self {
        let transport = Self::build_transport(&self.config)
            .expect("Failed to rebuild SMTP transport for clone");
        Self {
            transport,
            config: Arc::clone(&self.config),
        }
    }
}
