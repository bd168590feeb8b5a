use async_trait::async_trait;
use sea_orm::{ConnectionTrait, DbBackend, FromQueryResult, Statement};
use uuid::Uuid;

use crate::error::{AccountError, AccountResult};
use crate::models::{Account, AccountFilter, Role};
use crate::repository::AccountRepository;

/// PostgreSQL implementation of AccountRepository using SeaORM
#[derive(Clone)]
pub struct PostgresAccountRepository {
    db: sea_orm::DatabaseConnection,
}

impl PostgresAccountRepository {
    pub fn new(db: sea_orm::DatabaseConnection) -> Self {
        Self { db }
    }
}

/// Helper struct for deserializing account rows from the database
#[derive(Debug, FromQueryResult)]
struct AccountRow {
    id: Uuid,
    email: String,
    username: Option<String>,
    vtid: Option<String>,
    password_hash: String,
    role: String,
    is_active: bool,
    is_verified: bool,
    is_approved: bool,
    profile_id: Option<Uuid>,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<AccountRow> for Account {
    fn from(row: AccountRow) -> Self {
        use std::str::FromStr;

        Account {
            id: row.id,
            email: row.email,
            username: row.username,
            vtid: row.vtid,
            password_hash: row.password_hash,
            role: Role::from_str(&row.role).unwrap_or_default(),
            is_active: row.is_active,
            is_verified: row.is_verified,
            is_approved: row.is_approved,
            profile_id: row.profile_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

fn map_unique_violation(e: sea_orm::DbErr, account: &Account) -> AccountError {
    let err_str = e.to_string();
    if err_str.contains("duplicate key") || err_str.contains("unique constraint") {
        if err_str.contains("username") {
            AccountError::DuplicateUsername(account.username.clone().unwrap_or_default())
        } else {
            AccountError::DuplicateEmail(account.email.clone())
        }
    } else {
        AccountError::Internal(format!("Database error: {}", e))
    }
}

#[async_trait]
impl AccountRepository for PostgresAccountRepository {
    async fn create(&self, account: Account) -> AccountResult<Account> {
        let sql = r#"
            INSERT INTO accounts (id, email, username, vtid, password_hash, role,
                                  is_active, is_verified, is_approved, profile_id,
                                  created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING *
        "#;

        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            sql,
            [
                account.id.into(),
                account.email.clone().into(),
                account.username.clone().into(),
                account.vtid.clone().into(),
                account.password_hash.clone().into(),
                account.role.to_string().into(),
                account.is_active.into(),
                account.is_verified.into(),
                account.is_approved.into(),
                account.profile_id.into(),
                account.created_at.into(),
                account.updated_at.into(),
            ],
        );

        let row = AccountRow::find_by_statement(stmt)
            .one(&self.db)
            .await
            .map_err(|e| map_unique_violation(e, &account))?
            .ok_or_else(|| AccountError::Internal("Failed to create account".to_string()))?;

        Ok(row.into())
    }

    async fn get_by_id(&self, id: Uuid) -> AccountResult<Option<Account>> {
        let sql = "SELECT * FROM accounts WHERE id = $1";

        let stmt = Statement::from_sql_and_values(DbBackend::Postgres, sql, [id.into()]);

        let row = AccountRow::find_by_statement(stmt)
            .one(&self.db)
            .await
            .map_err(|e| AccountError::Internal(format!("Database error: {}", e)))?;

        Ok(row.map(|r| r.into()))
    }

    async fn get_by_email(&self, email: &str) -> AccountResult<Option<Account>> {
        let sql = "SELECT * FROM accounts WHERE LOWER(email) = LOWER($1)";

        let stmt = Statement::from_sql_and_values(DbBackend::Postgres, sql, [email.into()]);

        let row = AccountRow::find_by_statement(stmt)
            .one(&self.db)
            .await
            .map_err(|e| AccountError::Internal(format!("Database error: {}", e)))?;

        Ok(row.map(|r| r.into()))
    }

    async fn get_by_profile_id(&self, profile_id: Uuid) -> AccountResult<Option<Account>> {
        let sql = "SELECT * FROM accounts WHERE profile_id = $1";

        let stmt = Statement::from_sql_and_values(DbBackend::Postgres, sql, [profile_id.into()]);

        let row = AccountRow::find_by_statement(stmt)
            .one(&self.db)
            .await
            .map_err(|e| AccountError::Internal(format!("Database error: {}", e)))?;

        Ok(row.map(|r| r.into()))
    }

    async fn list(&self, filter: AccountFilter) -> AccountResult<Vec<Account>> {
        let sql = r#"
            SELECT * FROM accounts
            WHERE ($1::text IS NULL OR role = $1)
              AND ($2::boolean IS NULL OR is_active = $2)
              AND ($3::text IS NULL OR LOWER(email) = LOWER($3))
            ORDER BY created_at
        "#;

        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            sql,
            [
                filter.role.map(|r| r.to_string()).into(),
                filter.is_active.into(),
                filter.email.into(),
            ],
        );

        let rows = AccountRow::find_by_statement(stmt)
            .all(&self.db)
            .await
            .map_err(|e| AccountError::Internal(format!("Database error: {}", e)))?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    async fn list_admins(&self) -> AccountResult<Vec<Account>> {
        self.list(AccountFilter {
            role: Some(Role::Admin),
            ..Default::default()
        })
        .await
    }

    async fn update(&self, account: Account) -> AccountResult<Account> {
        let sql = r#"
            UPDATE accounts
            SET email = $2, username = $3, vtid = $4, password_hash = $5, role = $6,
                is_active = $7, is_verified = $8, is_approved = $9, profile_id = $10,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
        "#;

        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            sql,
            [
                account.id.into(),
                account.email.clone().into(),
                account.username.clone().into(),
                account.vtid.clone().into(),
                account.password_hash.clone().into(),
                account.role.to_string().into(),
                account.is_active.into(),
                account.is_verified.into(),
                account.is_approved.into(),
                account.profile_id.into(),
            ],
        );

        let row = AccountRow::find_by_statement(stmt)
            .one(&self.db)
            .await
            .map_err(|e| map_unique_violation(e, &account))?;

        row.map(|r| r.into()).ok_or(AccountError::NotFound(account.id))
    }

    async fn delete(&self, id: Uuid) -> AccountResult<bool> {
        let sql = "DELETE FROM accounts WHERE id = $1";

        let stmt = Statement::from_sql_and_values(DbBackend::Postgres, sql, [id.into()]);

        let result = self
            .db
            .execute_raw(stmt)
            .await
            .map_err(|e| AccountError::Internal(format!("Database error: {}", e)))?;

        Ok(result.rows_affected() > 0)
    }

    async fn email_exists(&self, email: &str) -> AccountResult<bool> {
        Ok(self.get_by_email(email).await?.is_some())
    }
}
