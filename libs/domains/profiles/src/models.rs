use chrono::{DateTime, NaiveDate, Utc};
use rand::RngExt;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Bounds of the sequential VTID pool.
///
/// VTIDs are assigned in order and never reused; exhausting the pool is a
/// hard error surfaced to the operator.
pub const VTID_POOL_START: i32 = 1000;
pub const VTID_POOL_END: i32 = 99999;

/// Phone contact block
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInfo {
    pub phone: Option<String>,
    pub mobile: Option<String>,
}

/// Postal address block
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub street: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
}

/// Emergency contact block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmergencyContact {
    pub name: String,
    pub relationship: Option<String>,
    pub phone: String,
}

/// Employee profile entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    /// Unique identifier
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    /// Unique email; the join key towards the account collection
    pub email: String,
    /// Human-readable identifier, sequential from the bounded pool, immutable
    pub vtid: i32,
    /// Independent random unique numeric identifier
    pub staff_code: i64,
    pub job_title: Option<String>,
    pub department: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub contact: ContactInfo,
    pub address: Address,
    pub emergency_contact: Option<EmergencyContact>,
    /// Back-reference to the owning account, if any
    pub account_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// DTO for creating a new profile
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateProfile {
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100))]
    pub last_name: String,
    #[validate(email, length(max = 255))]
    pub email: String,
    pub job_title: Option<String>,
    pub department: Option<String>,
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub contact: ContactInfo,
    #[serde(default)]
    pub address: Address,
    pub emergency_contact: Option<EmergencyContact>,
}

/// DTO for updating an existing profile
///
/// VTID and staff code are deliberately absent: both are immutable once set.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateProfile {
    #[validate(length(min = 1, max = 100))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub last_name: Option<String>,
    #[validate(email, length(max = 255))]
    pub email: Option<String>,
    pub job_title: Option<String>,
    pub department: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub contact: Option<ContactInfo>,
    pub address: Option<Address>,
    pub emergency_contact: Option<EmergencyContact>,
}

/// Query filters for listing profiles
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileFilter {
    pub department: Option<String>,
    pub email: Option<String>,
}

impl Profile {
    /// Create a new profile from the DTO plus the identifiers assigned by the
    /// synchronization layer.
    pub fn new(input: CreateProfile, vtid: i32, staff_code: i64) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            first_name: input.first_name,
            last_name: input.last_name,
            email: input.email,
            vtid,
            staff_code,
            job_title: input.job_title,
            department: input.department,
            start_date: input.start_date,
            contact: input.contact,
            address: input.address,
            emergency_contact: input.emergency_contact,
            account_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// The display name denormalized onto certifications.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Apply an update, returning the names of fields whose value actually
    /// changed (drives the updated-fields payload on the change event).
    pub fn apply_update(&mut self, update: UpdateProfile) -> Vec<&'static str> {
        let mut changed = Vec::new();

        if let Some(first_name) = update.first_name {
            if self.first_name != first_name {
                self.first_name = first_name;
                changed.push("first_name");
            }
        }
        if let Some(last_name) = update.last_name {
            if self.last_name != last_name {
                self.last_name = last_name;
                changed.push("last_name");
            }
        }
        if let Some(email) = update.email {
            if !self.email.eq_ignore_ascii_case(&email) {
                self.email = email;
                changed.push("email");
            }
        }
        if let Some(job_title) = update.job_title {
            if self.job_title.as_deref() != Some(job_title.as_str()) {
                self.job_title = Some(job_title);
                changed.push("job_title");
            }
        }
        if let Some(department) = update.department {
            if self.department.as_deref() != Some(department.as_str()) {
                self.department = Some(department);
                changed.push("department");
            }
        }
        if let Some(start_date) = update.start_date {
            if self.start_date != Some(start_date) {
                self.start_date = Some(start_date);
                changed.push("start_date");
            }
        }
        if let Some(contact) = update.contact {
            if self.contact != contact {
                self.contact = contact;
                changed.push("contact");
            }
        }
        if let Some(address) = update.address {
            if self.address != address {
                self.address = address;
                changed.push("address");
            }
        }
        if let Some(emergency_contact) = update.emergency_contact {
            if self.emergency_contact.as_ref() != Some(&emergency_contact) {
                self.emergency_contact = Some(emergency_contact);
                changed.push("emergency_contact");
            }
        }

        if !changed.is_empty() {
            self.updated_at = Utc::now();
        }

        changed
    }
}

/// Generate a candidate staff code; uniqueness is checked against the store
/// by the caller.
pub fn generate_staff_code() -> i64 {
    rand::rng().random_range(10_000_000..=99_999_999)
}
