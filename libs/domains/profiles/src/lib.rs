//! Profiles Domain
//!
//! The employee record, distinct from the login account. Profiles carry the
//! human-readable VTID (assigned sequentially from a bounded pool, immutable
//! once set), a second independent random staff code, and the contact blocks
//! HR maintains. The profile email is the join key used to locate a matching
//! account when no explicit reference exists.

pub mod error;
pub mod models;
pub mod postgres;
pub mod repository;

pub use error::{ProfileError, ProfileResult};
pub use models::{
    Address, ContactInfo, CreateProfile, EmergencyContact, Profile, ProfileFilter, UpdateProfile,
};
pub use postgres::PostgresProfileRepository;
pub use repository::{InMemoryProfileRepository, ProfileRepository};
