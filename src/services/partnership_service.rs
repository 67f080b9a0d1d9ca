//! Partnership applications from prospective resellers.

use chrono::Utc;
use tracing::{info, instrument};
use validator::Validate;

use super::Service;
use crate::{
    database::{PartnershipRepository, Repository},
    error::{AppError, Result},
    models::{
        new_id, PaginatedResult, Pagination, PartnershipApplication, PartnershipQuery,
        PartnershipRequest, PartnershipStatus, UpdatePartnershipStatusRequest,
    },
    utils::{mask_string, non_blank, normalize_phone},
};

#[derive(Debug, Clone)]
pub struct PartnershipService {
    repo: PartnershipRepository,
}

impl Service for PartnershipService {}

impl PartnershipService {
    #[must_use]
    pub fn new(repo: PartnershipRepository) -> Self {
        Self { repo }
    }

    #[instrument(skip(self, request), fields(company = %request.company_name))]
    pub async fn submit(&self, request: PartnershipRequest) -> Result<PartnershipApplication> {
        request.validate()?;

        let company_name = request.company_name.trim().to_string();
        let contact_name = request.contact_name.trim().to_string();
        if company_name.is_empty() || contact_name.is_empty() {
            return Err(AppError::BadRequest(
                "Company and contact name are required".to_string(),
            ));
        }

        let now = Utc::now();
        let application = PartnershipApplication {
            id: new_id(),
            company_name,
            contact_name,
            phone: normalize_phone(&request.phone),
            city: non_blank(request.city),
            message: non_blank(request.message),
            status: PartnershipStatus::Pending,
            staff_note: None,
            created_at: now,
            updated_at: now,
        };

        let application = self.repo.create(&application).await?;
        info!(
            application_id = %application.id,
            phone = %mask_string(&application.phone, 4),
            "Partnership application received"
        );
        Ok(application)
    }

    pub async fn list(&self, query: &PartnershipQuery) -> Result<PaginatedResult<PartnershipApplication>> {
        let pagination = Pagination::new(query.page, query.per_page);
        let (applications, total) = self.repo.list(query.status, &pagination).await?;

        Ok(PaginatedResult::new(
            applications,
            &pagination,
            u64::try_from(total).unwrap_or_default(),
        ))
    }

    /// # Errors
    /// `Conflict` when the workflow does not allow the move.
    #[instrument(skip(self, request))]
    pub async fn update_status(
        &self,
        id: &str,
        request: UpdatePartnershipStatusRequest,
    ) -> Result<PartnershipApplication> {
        request.validate()?;

        let current = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Application", id))?;

        if !current.status.can_transition_to(request.status) {
            return Err(AppError::Conflict(format!(
                "Application cannot go from {:?} to {:?}",
                current.status, request.status
            )));
        }

        let note = non_blank(request.staff_note);
        if !self
            .repo
            .update_status(id, current.status, request.status, note.as_deref())
            .await?
        {
            return Err(AppError::Conflict(
                "Application was changed by someone else, reload and retry".to_string(),
            ));
        }

        info!(application_id = %id, status = ?request.status, "Application status changed");

        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Application", id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Database;

    fn request() -> PartnershipRequest {
        PartnershipRequest {
            company_name: "Samarqand Savdo".to_string(),
            contact_name: "Dilshod".to_string(),
            phone: "+998 66 233 44 55".to_string(),
            city: Some("Samarqand".to_string()),
            message: Some("  ".to_string()),
        }
    }

    fn status(status: PartnershipStatus, note: Option<&str>) -> UpdatePartnershipStatusRequest {
        UpdatePartnershipStatusRequest {
            status,
            staff_note: note.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn review_workflow_with_notes() {
        let service = PartnershipService::new(PartnershipRepository::new(Database::in_memory().await.unwrap()));
        let application = service.submit(request()).await.unwrap();
        assert_eq!(application.status, PartnershipStatus::Pending);
        assert_eq!(application.message, None);
        assert_eq!(application.phone, "+998662334455");

        let err = service
            .update_status(&application.id, status(PartnershipStatus::Approved, None))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let contacted = service
            .update_status(&application.id, status(PartnershipStatus::Contacted, Some("Called, wants price list")))
            .await
            .unwrap();
        assert_eq!(contacted.staff_note.as_deref(), Some("Called, wants price list"));

        let approved = service
            .update_status(&application.id, status(PartnershipStatus::Approved, None))
            .await
            .unwrap();
        assert_eq!(approved.status, PartnershipStatus::Approved);
        // the earlier note is kept
        assert_eq!(approved.staff_note.as_deref(), Some("Called, wants price list"));

        let pending = service
            .list(&PartnershipQuery {
                status: Some(PartnershipStatus::Pending),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(pending.data.is_empty());
    }
}
