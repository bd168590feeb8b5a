//! Notifications Domain
//!
//! Everything between a domain event and an informed human:
//!
//! ```text
//! ┌─────────────┐
//! │   Fan-out   │  ← recipients, channel isolation
//! └──┬───────┬──┘
//!    │       │
//! ┌──▼───┐ ┌─▼────────┐
//! │Record│ │ Gateway  │  ← persisted notification / email delivery
//! └──────┘ └──────────┘
//! ```
//!
//! The two channels are independent: a failed email never rolls back the
//! persisted record, and a failed record write never blocks the email.

pub mod error;
pub mod fanout;
pub mod gateway;
pub mod models;
pub mod postgres;
pub mod repository;
pub mod templates;

pub use error::{NotificationError, NotificationResult};
pub use fanout::FanoutEngine;
pub use gateway::{Delivery, DeliveryGateway, InMemoryGateway, SmtpConfig, SmtpGateway};
pub use models::{
    Notification, NotificationEvent, NotificationFilter, NotificationKind, Priority,
};
pub use postgres::PostgresNotificationRepository;
pub use repository::{InMemoryNotificationRepository, NotificationRepository};
pub use templates::{MessageCatalog, RenderedMessage};
