//! Certifications Domain
//!
//! Tracked qualifications with issue/expiry dates. The holder display name is
//! denormalized onto each certification and kept in sync with the owning
//! profile by the synchronization engine; `expiry_notified_at` is the
//! persisted marker that makes expired notices at-most-once.

pub mod error;
pub mod models;
pub mod postgres;
pub mod repository;

pub use error::{CertificationError, CertificationResult};
pub use models::{
    ensure_expiry_after_issue, Certification, CertificationFilter, CertificationStatus,
    CreateCertification, DocumentMeta, UpdateCertification,
};
pub use postgres::PostgresCertificationRepository;
pub use repository::{CertificationRepository, InMemoryCertificationRepository};
