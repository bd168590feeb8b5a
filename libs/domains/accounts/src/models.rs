use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Account roles
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            _ => Err(format!("Unknown role: {}", s)),
        }
    }
}

/// Login account - the authentication identity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    /// Unique identifier
    pub id: Uuid,
    /// Account email (unique, matched case-insensitively)
    pub email: String,
    /// Optional unique username
    pub username: Option<String>,
    /// Optional unique short identifier shown to staff
    pub vtid: Option<String>,
    /// Argon2 credential hash (never exposed)
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Account role
    pub role: Role,
    /// Whether the account may log in
    pub is_active: bool,
    /// Whether the email address has been verified
    pub is_verified: bool,
    /// Whether an administrator has approved the account
    pub is_approved: bool,
    /// The linked employee profile, if any (at most one)
    pub profile_id: Option<Uuid>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

/// Query filters for listing accounts
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccountFilter {
    pub role: Option<Role>,
    pub is_active: Option<bool>,
    pub email: Option<String>,
}

impl Account {
    /// Create a new account (credential must already be hashed)
    pub fn new(email: String, username: Option<String>, password_hash: String, role: Role) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            email,
            username,
            vtid: None,
            password_hash,
            role,
            is_active: true,
            is_verified: false,
            is_approved: false,
            profile_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Whether this account's email matches, case-insensitively
    pub fn email_matches(&self, email: &str) -> bool {
        self.email.eq_ignore_ascii_case(email)
    }
}
