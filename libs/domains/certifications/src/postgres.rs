use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{ConnectionTrait, DbBackend, FromQueryResult, Statement};
use uuid::Uuid;

use crate::error::{CertificationError, CertificationResult};
use crate::models::{Certification, CertificationFilter, CertificationStatus, DocumentMeta};
use crate::repository::CertificationRepository;

/// PostgreSQL implementation of CertificationRepository using SeaORM
#[derive(Clone)]
pub struct PostgresCertificationRepository {
    db: sea_orm::DatabaseConnection,
}

impl PostgresCertificationRepository {
    pub fn new(db: sea_orm::DatabaseConnection) -> Self {
        Self { db }
    }
}

/// Helper struct for deserializing certification rows from the database
#[derive(Debug, FromQueryResult)]
struct CertificationRow {
    id: Uuid,
    name: String,
    category: String,
    profile_id: Option<Uuid>,
    holder_name: String,
    issue_date: Option<chrono::NaiveDate>,
    expiry_date: Option<chrono::NaiveDate>,
    status: String,
    document: Option<serde_json::Value>,
    cost: Option<f64>,
    expiry_notified_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CertificationRow> for Certification {
    fn from(row: CertificationRow) -> Self {
        use std::str::FromStr;

        let document: Option<DocumentMeta> =
            row.document.and_then(|v| serde_json::from_value(v).ok());

        Certification {
            id: row.id,
            name: row.name,
            category: row.category,
            profile_id: row.profile_id,
            holder_name: row.holder_name,
            issue_date: row.issue_date,
            expiry_date: row.expiry_date,
            status: CertificationStatus::from_str(&row.status).unwrap_or_default(),
            document,
            cost: row.cost,
            expiry_notified_at: row.expiry_notified_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

fn document_json(document: &Option<DocumentMeta>) -> CertificationResult<Option<serde_json::Value>> {
    document
        .as_ref()
        .map(|d| {
            serde_json::to_value(d).map_err(|e| {
                CertificationError::Internal(format!("JSON serialization error: {}", e))
            })
        })
        .transpose()
}

#[async_trait]
impl CertificationRepository for PostgresCertificationRepository {
    async fn create(&self, certification: Certification) -> CertificationResult<Certification> {
        let sql = r#"
            INSERT INTO certifications (id, name, category, profile_id, holder_name,
                                        issue_date, expiry_date, status, document, cost,
                                        expiry_notified_at, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING *
        "#;

        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            sql,
            [
                certification.id.into(),
                certification.name.clone().into(),
                certification.category.clone().into(),
                certification.profile_id.into(),
                certification.holder_name.clone().into(),
                certification.issue_date.into(),
                certification.expiry_date.into(),
                certification.status.to_string().into(),
                document_json(&certification.document)?.into(),
                certification.cost.into(),
                certification.expiry_notified_at.into(),
                certification.created_at.into(),
                certification.updated_at.into(),
            ],
        );

        let row = CertificationRow::find_by_statement(stmt)
            .one(&self.db)
            .await
            .map_err(|e| CertificationError::Internal(format!("Database error: {}", e)))?
            .ok_or_else(|| {
                CertificationError::Internal("Failed to create certification".to_string())
            })?;

        Ok(row.into())
    }

    async fn get_by_id(&self, id: Uuid) -> CertificationResult<Option<Certification>> {
        let sql = "SELECT * FROM certifications WHERE id = $1";

        let stmt = Statement::from_sql_and_values(DbBackend::Postgres, sql, [id.into()]);

        let row = CertificationRow::find_by_statement(stmt)
            .one(&self.db)
            .await
            .map_err(|e| CertificationError::Internal(format!("Database error: {}", e)))?;

        Ok(row.map(|r| r.into()))
    }

    async fn list(&self, filter: CertificationFilter) -> CertificationResult<Vec<Certification>> {
        let sql = r#"
            SELECT * FROM certifications
            WHERE ($1::uuid IS NULL OR profile_id = $1)
              AND ($2::text IS NULL OR category = $2)
              AND ($3::text IS NULL OR status = $3)
            ORDER BY created_at
        "#;

        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            sql,
            [
                filter.profile_id.into(),
                filter.category.into(),
                filter.status.map(|s| s.to_string()).into(),
            ],
        );

        let rows = CertificationRow::find_by_statement(stmt)
            .all(&self.db)
            .await
            .map_err(|e| CertificationError::Internal(format!("Database error: {}", e)))?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    async fn list_with_expiry(&self) -> CertificationResult<Vec<Certification>> {
        let sql = "SELECT * FROM certifications WHERE expiry_date IS NOT NULL ORDER BY expiry_date";

        let stmt = Statement::from_sql_and_values(DbBackend::Postgres, sql, []);

        let rows = CertificationRow::find_by_statement(stmt)
            .all(&self.db)
            .await
            .map_err(|e| CertificationError::Internal(format!("Database error: {}", e)))?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    async fn update(&self, certification: Certification) -> CertificationResult<Certification> {
        let sql = r#"
            UPDATE certifications
            SET name = $2, category = $3, profile_id = $4, holder_name = $5,
                issue_date = $6, expiry_date = $7, status = $8, document = $9,
                cost = $10, expiry_notified_at = $11, updated_at = NOW()
            WHERE id = $1
            RETURNING *
        "#;

        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            sql,
            [
                certification.id.into(),
                certification.name.clone().into(),
                certification.category.clone().into(),
                certification.profile_id.into(),
                certification.holder_name.clone().into(),
                certification.issue_date.into(),
                certification.expiry_date.into(),
                certification.status.to_string().into(),
                document_json(&certification.document)?.into(),
                certification.cost.into(),
                certification.expiry_notified_at.into(),
            ],
        );

        let row = CertificationRow::find_by_statement(stmt)
            .one(&self.db)
            .await
            .map_err(|e| CertificationError::Internal(format!("Database error: {}", e)))?;

        row.map(|r| r.into())
            .ok_or(CertificationError::NotFound(certification.id))
    }

    async fn delete(&self, id: Uuid) -> CertificationResult<bool> {
        let sql = "DELETE FROM certifications WHERE id = $1";

        let stmt = Statement::from_sql_and_values(DbBackend::Postgres, sql, [id.into()]);

        let result = self
            .db
            .execute_raw(stmt)
            .await
            .map_err(|e| CertificationError::Internal(format!("Database error: {}", e)))?;

        Ok(result.rows_affected() > 0)
    }

    async fn update_holder_name(
        &self,
        profile_id: Uuid,
        holder_name: &str,
    ) -> CertificationResult<u64> {
        // Single bulk statement; the scan volume makes row-by-row writes wasteful
        let sql = r#"
            UPDATE certifications
            SET holder_name = $2, updated_at = NOW()
            WHERE profile_id = $1
        "#;

        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            sql,
            [profile_id.into(), holder_name.into()],
        );

        let result = self
            .db
            .execute_raw(stmt)
            .await
            .map_err(|e| CertificationError::Internal(format!("Database error: {}", e)))?;

        Ok(result.rows_affected())
    }

    async fn delete_by_profile(
        &self,
        profile_id: Uuid,
    ) -> CertificationResult<Vec<Certification>> {
        let sql = "DELETE FROM certifications WHERE profile_id = $1 RETURNING *";

        let stmt = Statement::from_sql_and_values(DbBackend::Postgres, sql, [profile_id.into()]);

        let rows = CertificationRow::find_by_statement(stmt)
            .all(&self.db)
            .await
            .map_err(|e| CertificationError::Internal(format!("Database error: {}", e)))?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    async fn mark_expiry_notified(
        &self,
        id: Uuid,
        at: DateTime<Utc>,
    ) -> CertificationResult<()> {
        let sql = "UPDATE certifications SET expiry_notified_at = $2 WHERE id = $1";

        let stmt =
            Statement::from_sql_and_values(DbBackend::Postgres, sql, [id.into(), at.into()]);

        let result = self
            .db
            .execute_raw(stmt)
            .await
            .map_err(|e| CertificationError::Internal(format!("Database error: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(CertificationError::NotFound(id));
        }

        Ok(())
    }
}
