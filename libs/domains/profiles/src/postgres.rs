use async_trait::async_trait;
use sea_orm::{ConnectionTrait, DbBackend, FromQueryResult, Statement};
use uuid::Uuid;

use crate::error::{ProfileError, ProfileResult};
use crate::models::{
    Address, ContactInfo, EmergencyContact, Profile, ProfileFilter, VTID_POOL_END, VTID_POOL_START,
};
use crate::repository::ProfileRepository;

/// PostgreSQL implementation of ProfileRepository using SeaORM
#[derive(Clone)]
pub struct PostgresProfileRepository {
    db: sea_orm::DatabaseConnection,
}

impl PostgresProfileRepository {
    pub fn new(db: sea_orm::DatabaseConnection) -> Self {
        Self { db }
    }
}

/// Helper struct for deserializing profile rows from the database
#[derive(Debug, FromQueryResult)]
struct ProfileRow {
    id: Uuid,
    first_name: String,
    last_name: String,
    email: String,
    vtid: i32,
    staff_code: i64,
    job_title: Option<String>,
    department: Option<String>,
    start_date: Option<chrono::NaiveDate>,
    contact: serde_json::Value,
    address: serde_json::Value,
    emergency_contact: Option<serde_json::Value>,
    account_id: Option<Uuid>,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<ProfileRow> for Profile {
    fn from(row: ProfileRow) -> Self {
        // Contact blocks are stored as JSONB; tolerate legacy shapes
        let contact: ContactInfo = serde_json::from_value(row.contact).unwrap_or_default();
        let address: Address = serde_json::from_value(row.address).unwrap_or_default();
        let emergency_contact: Option<EmergencyContact> = row
            .emergency_contact
            .and_then(|v| serde_json::from_value(v).ok());

        Profile {
            id: row.id,
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email,
            vtid: row.vtid,
            staff_code: row.staff_code,
            job_title: row.job_title,
            department: row.department,
            start_date: row.start_date,
            contact,
            address,
            emergency_contact,
            account_id: row.account_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, FromQueryResult)]
struct MaxVtidRow {
    max_vtid: Option<i32>,
}

#[derive(Debug, FromQueryResult)]
struct ExistsRow {
    present: bool,
}

fn json_of<T: serde::Serialize>(value: &T) -> ProfileResult<serde_json::Value> {
    serde_json::to_value(value)
        .map_err(|e| ProfileError::Internal(format!("JSON serialization error: {}", e)))
}

#[async_trait]
impl ProfileRepository for PostgresProfileRepository {
    async fn create(&self, profile: Profile) -> ProfileResult<Profile> {
        let sql = r#"
            INSERT INTO employee_profiles (id, first_name, last_name, email, vtid, staff_code,
                                           job_title, department, start_date, contact, address,
                                           emergency_contact, account_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            RETURNING *
        "#;

        let emergency = match profile.emergency_contact {
            Some(ref ec) => Some(json_of(ec)?),
            None => None,
        };

        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            sql,
            [
                profile.id.into(),
                profile.first_name.clone().into(),
                profile.last_name.clone().into(),
                profile.email.clone().into(),
                profile.vtid.into(),
                profile.staff_code.into(),
                profile.job_title.clone().into(),
                profile.department.clone().into(),
                profile.start_date.into(),
                json_of(&profile.contact)?.into(),
                json_of(&profile.address)?.into(),
                emergency.into(),
                profile.account_id.into(),
                profile.created_at.into(),
                profile.updated_at.into(),
            ],
        );

        let row = ProfileRow::find_by_statement(stmt)
            .one(&self.db)
            .await
            .map_err(|e| {
                let err_str = e.to_string();
                if err_str.contains("duplicate key") || err_str.contains("unique constraint") {
                    ProfileError::DuplicateEmail(profile.email.clone())
                } else {
                    ProfileError::Internal(format!("Database error: {}", e))
                }
            })?
            .ok_or_else(|| ProfileError::Internal("Failed to create profile".to_string()))?;

        Ok(row.into())
    }

    async fn get_by_id(&self, id: Uuid) -> ProfileResult<Option<Profile>> {
        let sql = "SELECT * FROM employee_profiles WHERE id = $1";

        let stmt = Statement::from_sql_and_values(DbBackend::Postgres, sql, [id.into()]);

        let row = ProfileRow::find_by_statement(stmt)
            .one(&self.db)
            .await
            .map_err(|e| ProfileError::Internal(format!("Database error: {}", e)))?;

        Ok(row.map(|r| r.into()))
    }

    async fn get_by_email(&self, email: &str) -> ProfileResult<Option<Profile>> {
        let sql = "SELECT * FROM employee_profiles WHERE LOWER(email) = LOWER($1)";

        let stmt = Statement::from_sql_and_values(DbBackend::Postgres, sql, [email.into()]);

        let row = ProfileRow::find_by_statement(stmt)
            .one(&self.db)
            .await
            .map_err(|e| ProfileError::Internal(format!("Database error: {}", e)))?;

        Ok(row.map(|r| r.into()))
    }

    async fn list(&self, filter: ProfileFilter) -> ProfileResult<Vec<Profile>> {
        let sql = r#"
            SELECT * FROM employee_profiles
            WHERE ($1::text IS NULL OR department = $1)
              AND ($2::text IS NULL OR LOWER(email) = LOWER($2))
            ORDER BY vtid
        "#;

        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            sql,
            [filter.department.into(), filter.email.into()],
        );

        let rows = ProfileRow::find_by_statement(stmt)
            .all(&self.db)
            .await
            .map_err(|e| ProfileError::Internal(format!("Database error: {}", e)))?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    async fn update(&self, profile: Profile) -> ProfileResult<Profile> {
        // VTID is deliberately not in the SET list: immutable once assigned
        let sql = r#"
            UPDATE employee_profiles
            SET first_name = $2, last_name = $3, email = $4, job_title = $5,
                department = $6, start_date = $7, contact = $8, address = $9,
                emergency_contact = $10, account_id = $11, updated_at = NOW()
            WHERE id = $1
            RETURNING *
        "#;

        let emergency = match profile.emergency_contact {
            Some(ref ec) => Some(json_of(ec)?),
            None => None,
        };

        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            sql,
            [
                profile.id.into(),
                profile.first_name.clone().into(),
                profile.last_name.clone().into(),
                profile.email.clone().into(),
                profile.job_title.clone().into(),
                profile.department.clone().into(),
                profile.start_date.into(),
                json_of(&profile.contact)?.into(),
                json_of(&profile.address)?.into(),
                emergency.into(),
                profile.account_id.into(),
            ],
        );

        let row = ProfileRow::find_by_statement(stmt)
            .one(&self.db)
            .await
            .map_err(|e| {
                let err_str = e.to_string();
                if err_str.contains("duplicate key") || err_str.contains("unique constraint") {
                    ProfileError::DuplicateEmail(profile.email.clone())
                } else {
                    ProfileError::Internal(format!("Database error: {}", e))
                }
            })?;

        row.map(|r| r.into()).ok_or(ProfileError::NotFound(profile.id))
    }

    async fn delete(&self, id: Uuid) -> ProfileResult<bool> {
        let sql = "DELETE FROM employee_profiles WHERE id = $1";

        let stmt = Statement::from_sql_and_values(DbBackend::Postgres, sql, [id.into()]);

        let result = self
            .db
            .execute_raw(stmt)
            .await
            .map_err(|e| ProfileError::Internal(format!("Database error: {}", e)))?;

        Ok(result.rows_affected() > 0)
    }

    async fn email_exists(&self, email: &str) -> ProfileResult<bool> {
        Ok(self.get_by_email(email).await?.is_some())
    }

    async fn next_vtid(&self) -> ProfileResult<i32> {
        let sql = "SELECT MAX(vtid) AS max_vtid FROM employee_profiles";

        let stmt = Statement::from_sql_and_values(DbBackend::Postgres, sql, []);

        let row = MaxVtidRow::find_by_statement(stmt)
            .one(&self.db)
            .await
            .map_err(|e| ProfileError::Internal(format!("Database error: {}", e)))?;

        let next = row
            .and_then(|r| r.max_vtid)
            .map(|max| max + 1)
            .unwrap_or(VTID_POOL_START);

        if next > VTID_POOL_END {
            return Err(ProfileError::VtidPoolExhausted(
                VTID_POOL_START,
                VTID_POOL_END,
            ));
        }

        Ok(next)
    }

    async fn staff_code_exists(&self, staff_code: i64) -> ProfileResult<bool> {
        let sql =
            "SELECT EXISTS(SELECT 1 FROM employee_profiles WHERE staff_code = $1) AS present";

        let stmt = Statement::from_sql_and_values(DbBackend::Postgres, sql, [staff_code.into()]);

        let row = ExistsRow::find_by_statement(stmt)
            .one(&self.db)
            .await
            .map_err(|e| ProfileError::Internal(format!("Database error: {}", e)))?;

        Ok(row.map(|r| r.present).unwrap_or(false))
    }
}
