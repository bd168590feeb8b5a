//! Accounts Domain
//!
//! Login accounts for the compliance platform: the authentication identity
//! (credential hash, role, verification state) as opposed to the employee
//! profile it may be linked to. At most one profile is ever linked to an
//! account, and the account email mirrors the linked profile's email.

pub mod credentials;
pub mod error;
pub mod models;
pub mod postgres;
pub mod repository;

pub use error::{AccountError, AccountResult};
pub use models::{Account, AccountFilter, Role};
pub use postgres::PostgresAccountRepository;
pub use repository::{AccountRepository, InMemoryAccountRepository};
