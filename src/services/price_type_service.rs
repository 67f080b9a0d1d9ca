//! Price types (customer tiers).

use tracing::{info, instrument};
use validator::Validate;

use super::Service;
use crate::{
    database::{PriceTypeRepository, Repository},
    error::{AppError, Result},
    models::{new_id, CreatePriceTypeRequest, PriceType, UpdatePriceTypeRequest},
    utils::VALID_CODE,
};

#[derive(Debug, Clone)]
pub struct PriceTypeService {
    repo: PriceTypeRepository,
}

impl Service for PriceTypeService {}

impl PriceTypeService {
    #[must_use]
    pub fn new(repo: PriceTypeRepository) -> Self {
        Self { repo }
    }

    pub async fn list(&self) -> Result<Vec<PriceType>> {
        self.repo.find_all().await
    }

    pub async fn get(&self, id: &str) -> Result<PriceType> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Price type", id))
    }

    /// The first price type created becomes the default.
    #[instrument(skip(self, request), fields(code = %request.code))]
    pub async fn create(&self, request: CreatePriceTypeRequest) -> Result<PriceType> {
        request.validate()?;
        let code = checked_code(&request.code)?;
        let name = checked_name(&request.name)?;

        let price_type = self
            .repo
            .create(&new_id(), &code, &name, request.is_default)
            .await?;

        info!(price_type_id = %price_type.id, is_default = price_type.is_default, "Price type created");
        Ok(price_type)
    }

    #[instrument(skip(self, request))]
    pub async fn update(&self, id: &str, request: UpdatePriceTypeRequest) -> Result<PriceType> {
        request.validate()?;
        let current = self.get(id).await?;

        let code = match request.code {
            Some(code) => checked_code(&code)?,
            None => current.code,
        };
        let name = match request.name {
            Some(name) => checked_name(&name)?,
            None => current.name,
        };

        self.repo
            .update(id, &code, &name)
            .await?
            .ok_or_else(|| AppError::not_found("Price type", id))
    }

    /// Make `id` the only default price type.
    #[instrument(skip(self))]
    pub async fn set_default(&self, id: &str) -> Result<PriceType> {
        if !self.repo.set_default(id).await? {
            return Err(AppError::not_found("Price type", id));
        }

        info!(price_type_id = %id, "Default price type changed");
        self.get(id).await
    }

    /// Refused for the default type and for types customers are assigned
    /// to. The type's product prices are removed with it.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> Result<()> {
        let price_type = self.get(id).await?;

        if price_type.is_default {
            return Err(AppError::Conflict(
                "The default price type cannot be deleted".to_string(),
            ));
        }

        let customers = self.repo.customer_count(id).await?;
        if customers > 0 {
            return Err(AppError::Conflict(format!(
                "Price type '{}' is assigned to {customers} customer(s)",
                price_type.code
            )));
        }

        self.repo.delete(id).await?;
        info!(price_type_id = %id, "Price type deleted");
        Ok(())
    }
}

fn checked_code(code: &str) -> Result<String> {
    let code = code.trim().to_lowercase();
    if VALID_CODE.is_match(&code) {
        Ok(code)
    } else {
        Err(AppError::BadRequest(
            "Code may only contain a-z, 0-9, '_' and '-'".to_string(),
        ))
    }
}

fn checked_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("Name is required".to_string()));
    }
    Ok(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Database;

    fn request(code: &str, is_default: bool) -> CreatePriceTypeRequest {
        CreatePriceTypeRequest {
            code: code.to_string(),
            name: code.to_uppercase(),
            is_default,
        }
    }

    #[tokio::test]
    async fn default_type_cannot_be_deleted() {
        let service = PriceTypeService::new(PriceTypeRepository::new(Database::in_memory().await.unwrap()));
        let retail = service.create(request("retail", false)).await.unwrap();
        let vip = service.create(request("VIP", false)).await.unwrap();

        assert!(retail.is_default);
        assert_eq!(vip.code, "vip");

        let err = service.delete(&retail.id).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        service.set_default(&vip.id).await.unwrap();
        service.delete(&retail.id).await.unwrap();

        let remaining = service.list().await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert!(remaining[0].is_default);
    }

    #[tokio::test]
    async fn codes_are_checked() {
        let service = PriceTypeService::new(PriceTypeRepository::new(Database::in_memory().await.unwrap()));

        let err = service.create(request("whole sale", false)).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
