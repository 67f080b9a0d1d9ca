//! Partnership applications.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite};

use super::{Database, Repository};
use crate::error::{AppError, Result};
use crate::models::{Pagination, PartnershipApplication, PartnershipStatus};

const APPLICATION_COLUMNS: &str = "id, company_name, contact_name, phone, city, message, status, \
     staff_note, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct PartnershipRepository {
    db: Database,
}

impl PartnershipRepository {
    #[must_use]
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn create(&self, application: &PartnershipApplication) -> Result<PartnershipApplication> {
        sqlx::query(&format!(
            "INSERT INTO partnership_applications ({APPLICATION_COLUMNS}) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
        ))
        .bind(&application.id)
        .bind(&application.company_name)
        .bind(&application.contact_name)
        .bind(&application.phone)
        .bind(&application.city)
        .bind(&application.message)
        .bind(application.status)
        .bind(&application.staff_note)
        .bind(application.created_at)
        .bind(application.updated_at)
        .execute(self.db.pool())
        .await?;

        self.find_by_id(&application.id)
            .await?
            .ok_or_else(|| AppError::Internal("Failed to save application".to_string()))
    }

    pub async fn list(
        &self,
        status: Option<PartnershipStatus>,
        pagination: &Pagination,
    ) -> Result<(Vec<PartnershipApplication>, i64)> {
        let mut count_query = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM partnership_applications");
        if let Some(status) = status {
            count_query.push(" WHERE status = ").push_bind(status);
        }
        let total: i64 = count_query
            .build_query_scalar()
            .fetch_one(self.db.pool())
            .await?;

        let mut query = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {APPLICATION_COLUMNS} FROM partnership_applications"
        ));
        if let Some(status) = status {
            query.push(" WHERE status = ").push_bind(status);
        }
        query
            .push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(pagination.limit())
            .push(" OFFSET ")
            .push_bind(pagination.offset());

        let applications = query
            .build_query_as::<PartnershipApplication>()
            .fetch_all(self.db.pool())
            .await?;

        Ok((applications, total))
    }

    /// Compare-and-set on the status; a `None` note keeps the existing one.
    pub async fn update_status(
        &self,
        id: &str,
        from: PartnershipStatus,
        to: PartnershipStatus,
        staff_note: Option<&str>,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE partnership_applications
            SET status = ?, staff_note = COALESCE(?, staff_note), updated_at = ?
            WHERE id = ? AND status = ?
            "#,
        )
        .bind(to)
        .bind(staff_note)
        .bind(Utc::now())
        .bind(id)
        .bind(from)
        .execute(self.db.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn count_by_status(&self, status: PartnershipStatus) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM partnership_applications WHERE status = ?",
        )
        .bind(status)
        .fetch_one(self.db.pool())
        .await?;

        Ok(count)
    }
}

#[async_trait]
impl Repository for PartnershipRepository {
    type Entity = PartnershipApplication;
    type Id = str;

    async fn find_by_id(&self, id: &str) -> Result<Option<PartnershipApplication>> {
        let application = sqlx::query_as::<_, PartnershipApplication>(&format!(
            "SELECT {APPLICATION_COLUMNS} FROM partnership_applications WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(application)
    }

    async fn find_all(&self) -> Result<Vec<PartnershipApplication>> {
        let applications = sqlx::query_as::<_, PartnershipApplication>(&format!(
            "SELECT {APPLICATION_COLUMNS} FROM partnership_applications ORDER BY created_at DESC"
        ))
        .fetch_all(self.db.pool())
        .await?;

        Ok(applications)
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM partnership_applications WHERE id = ?")
            .bind(id)
            .execute(self.db.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn count(&self) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM partnership_applications")
            .fetch_one(self.db.pool())
            .await?;

        Ok(count)
    }
}
