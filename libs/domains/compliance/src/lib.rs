//! Compliance Domain
//!
//! The orchestration core of the platform:
//!
//! - [`sync::SyncEngine`] owns every mutation that touches more than one
//!   entity and keeps accounts, profiles and certifications consistent
//!   before the caller gets its answer back.
//! - [`expiry::ExpiryScanner`] walks the certification set on a clock
//!   cadence, computes day-granular expiry windows and fires reminder
//!   events at fixed thresholds, at most once per certification.
//! - [`queue`] decouples those events from delivery: mutations enqueue,
//!   a background worker drains.
//!
//! Scan handlers take an explicit `today` so tests drive them without a
//! clock; the cron wiring lives in the worker binary.

pub mod error;
pub mod expiry;
pub mod queue;
pub mod sync;

pub use error::{ComplianceError, ComplianceResult};
pub use expiry::{
    today_in, ExpiryScanner, ScanKind, ScanOutcome, APPROACHING_THRESHOLDS, EXPIRED_GRACE_DAYS,
};
pub use queue::{FanoutJob, FanoutQueue, FanoutWorker};
pub use sync::{ProfileProvisioned, ProfileRemoval, SyncEngine};
