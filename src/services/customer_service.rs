//! # Customer service
//!
//! Back office customer management and storefront self-registration.

use tracing::{info, instrument};
use validator::Validate;

use super::Service;
use crate::{
    database::{CustomerRepository, PriceTypeRepository, Repository},
    error::{AppError, Result},
    models::{
        hash_password, new_id, CreateCustomerRequest, Customer, CustomerQuery, CustomerResponse,
        NewCustomer, NicknameAvailability, PaginatedResult, Pagination, RegisterCustomerRequest,
        UpdateCustomerRequest,
    },
    utils::{nickname_problem, non_blank, normalize_nickname, normalize_phone},
};

#[derive(Debug, Clone)]
pub struct CustomerService {
    repo: CustomerRepository,
    price_types: PriceTypeRepository,
}

impl Service for CustomerService {}

impl CustomerService {
    #[must_use]
    pub fn new(repo: CustomerRepository, price_types: PriceTypeRepository) -> Self {
        Self { repo, price_types }
    }

    /// Whether a nickname can still be registered. Malformed nicknames are
    /// reported as unavailable, with the reason.
    pub async fn nickname_available(&self, nickname: &str) -> Result<NicknameAvailability> {
        let nickname = normalize_nickname(nickname);

        if let Some(problem) = nickname_problem(&nickname) {
            return Ok(NicknameAvailability {
                nickname,
                available: false,
                reason: Some(problem.to_string()),
            });
        }

        let taken = self.repo.nickname_exists(&nickname).await?;
        Ok(NicknameAvailability {
            available: !taken,
            reason: taken.then(|| "Nickname is already taken".to_string()),
            nickname,
        })
    }

    pub async fn get(&self, id: &str) -> Result<Customer> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Customer", id))
    }

    pub async fn find_by_nickname(&self, nickname: &str) -> Result<Option<Customer>> {
        self.repo.find_by_nickname(&normalize_nickname(nickname)).await
    }

    pub async fn list(&self, query: &CustomerQuery) -> Result<PaginatedResult<CustomerResponse>> {
        let pagination = Pagination::new(query.page, query.per_page);
        let search = non_blank(query.q.clone());

        let (customers, total) = self.repo.list(search.as_deref(), &pagination).await?;

        Ok(PaginatedResult::new(
            customers.into_iter().map(CustomerResponse::from).collect(),
            &pagination,
            u64::try_from(total).unwrap_or_default(),
        ))
    }

    /// Customer created by staff; they cannot log in until a password is set.
    #[instrument(skip(self, request), fields(nickname = %request.nickname))]
    pub async fn create(&self, request: CreateCustomerRequest) -> Result<Customer> {
        request.validate()?;
        check_coordinates(request.latitude, request.longitude)?;

        let price_type_id = non_blank(request.price_type_id);
        if let Some(id) = &price_type_id {
            self.ensure_price_type(id).await?;
        }

        let customer = NewCustomer {
            id: new_id(),
            nickname: self.checked_nickname(&request.nickname, None).await?,
            full_name: checked_full_name(&request.full_name)?,
            phone: normalize_phone(&request.phone),
            address: non_blank(request.address),
            latitude: request.latitude,
            longitude: request.longitude,
            price_type_id,
            password_hash: None,
        };

        let customer = self.repo.create(&customer).await?;
        info!(customer_id = %customer.id, "Customer created");
        Ok(customer)
    }

    /// Storefront sign-up. The customer is put on the default price type.
    #[instrument(skip(self, request), fields(nickname = %request.nickname))]
    pub async fn register(&self, request: RegisterCustomerRequest) -> Result<Customer> {
        request.validate()?;

        let nickname = self.checked_nickname(&request.nickname, None).await?;
        let default_type = self.price_types.find_default().await?;

        let customer = NewCustomer {
            id: new_id(),
            nickname,
            full_name: checked_full_name(&request.full_name)?,
            phone: normalize_phone(&request.phone),
            address: non_blank(request.address),
            latitude: None,
            longitude: None,
            price_type_id: default_type.map(|p| p.id),
            password_hash: Some(hash_password(&request.password)?),
        };

        let customer = self.repo.create(&customer).await?;
        info!(customer_id = %customer.id, "Customer registered");
        Ok(customer)
    }

    /// Apply the fields present in `request`. An empty `price_type_id`
    /// puts the customer back on default prices.
    #[instrument(skip(self, request))]
    pub async fn update(&self, id: &str, request: UpdateCustomerRequest) -> Result<Customer> {
        request.validate()?;
        let mut customer = self.get(id).await?;

        if let Some(nickname) = request.nickname {
            customer.nickname = self.checked_nickname(&nickname, Some(id)).await?;
        }
        if let Some(full_name) = request.full_name {
            customer.full_name = checked_full_name(&full_name)?;
        }
        if let Some(phone) = request.phone {
            customer.phone = normalize_phone(&phone);
        }
        if let Some(address) = request.address {
            customer.address = non_blank(Some(address));
        }
        let has_coordinates = request.latitude.is_some() || request.longitude.is_some();
        if request.clear_location {
            if has_coordinates {
                return Err(AppError::BadRequest(
                    "clear_location cannot be combined with coordinates".to_string(),
                ));
            }
            customer.latitude = None;
            customer.longitude = None;
        } else if has_coordinates {
            check_coordinates(request.latitude, request.longitude)?;
            customer.latitude = request.latitude;
            customer.longitude = request.longitude;
        }
        if let Some(price_type_id) = request.price_type_id {
            let price_type_id = non_blank(Some(price_type_id));
            if let Some(id) = &price_type_id {
                self.ensure_price_type(id).await?;
            }
            customer.price_type_id = price_type_id;
        }
        if let Some(is_active) = request.is_active {
            customer.is_active = is_active;
        }

        self.repo
            .update(&customer)
            .await?
            .ok_or_else(|| AppError::not_found("Customer", id))
    }

    /// Orders of the customer are kept as placed.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> Result<()> {
        if !self.repo.delete(id).await? {
            return Err(AppError::not_found("Customer", id));
        }

        info!(customer_id = %id, "Customer deleted");
        Ok(())
    }

    async fn ensure_price_type(&self, id: &str) -> Result<()> {
        match self.price_types.find_by_id(id).await? {
            Some(_) => Ok(()),
            None => Err(AppError::BadRequest(format!("Price type '{id}' does not exist"))),
        }
    }

    /// Normalised nickname that is well-formed and not used by anyone but
    /// `owner`.
    async fn checked_nickname(&self, nickname: &str, owner: Option<&str>) -> Result<String> {
        let nickname = normalize_nickname(nickname);

        if let Some(problem) = nickname_problem(&nickname) {
            return Err(AppError::BadRequest(problem.to_string()));
        }

        if let Some(existing) = self.repo.find_by_nickname(&nickname).await? {
            if Some(existing.id.as_str()) != owner {
                return Err(AppError::Conflict(format!("Nickname '{nickname}' is taken")));
            }
        }

        Ok(nickname)
    }
}

fn checked_full_name(full_name: &str) -> Result<String> {
    let full_name = full_name.trim();
    if full_name.chars().count() < 2 {
        return Err(AppError::BadRequest("Name must be 2-120 characters".to_string()));
    }
    Ok(full_name.to_string())
}

/// Coordinates come as a pair or not at all.
///
/// # Errors
/// `BadRequest` when only one is given or either is out of range.
pub fn check_coordinates(latitude: Option<f64>, longitude: Option<f64>) -> Result<()> {
    match (latitude, longitude) {
        (None, None) => Ok(()),
        (Some(lat), Some(lng))
            if (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lng) =>
        {
            Ok(())
        }
        (Some(_), Some(_)) => Err(AppError::BadRequest("Coordinates out of range".to_string())),
        _ => Err(AppError::BadRequest(
            "Latitude and longitude must be given together".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Database;

    async fn service() -> CustomerService {
        let db = Database::in_memory().await.unwrap();
        let price_types = PriceTypeRepository::new(db.clone());
        price_types.create("retail", "retail", "Retail", true).await.unwrap();
        price_types.create("vip", "vip", "VIP", false).await.unwrap();

        CustomerService::new(CustomerRepository::new(db), price_types)
    }

    fn register(nickname: &str) -> RegisterCustomerRequest {
        RegisterCustomerRequest {
            nickname: nickname.to_string(),
            full_name: "Ali Valiyev".to_string(),
            phone: "+998 90 123 45 67".to_string(),
            password: "secret-pass".to_string(),
            address: None,
        }
    }

    #[tokio::test]
    async fn registration_assigns_default_price_type() {
        let service = service().await;
        let customer = service.register(register("Ali.V")).await.unwrap();

        assert_eq!(customer.nickname, "ali.v");
        assert_eq!(customer.phone, "+998901234567");
        assert_eq!(customer.price_type_id.as_deref(), Some("retail"));
        assert!(customer.password_hash.is_some());
    }

    #[tokio::test]
    async fn nickname_availability() {
        let service = service().await;
        service.register(register("ali")).await.unwrap();

        let taken = service.nickname_available("ALI").await.unwrap();
        assert!(!taken.available);

        let free = service.nickname_available("vali").await.unwrap();
        assert!(free.available);
        assert_eq!(free.reason, None);

        let bad = service.nickname_available("a b").await.unwrap();
        assert!(!bad.available);
        assert!(bad.reason.is_some());

        let err = service.register(register("Ali")).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn update_changes_tier_and_keeps_own_nickname() {
        let service = service().await;
        let customer = service.register(register("ali")).await.unwrap();

        let updated = service
            .update(
                &customer.id,
                UpdateCustomerRequest {
                    nickname: Some("ali".to_string()),
                    price_type_id: Some("vip".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.price_type_id.as_deref(), Some("vip"));

        let cleared = service
            .update(
                &customer.id,
                UpdateCustomerRequest {
                    price_type_id: Some(String::new()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(cleared.price_type_id, None);

        let err = service
            .update(
                &customer.id,
                UpdateCustomerRequest {
                    price_type_id: Some("gold".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn update_sets_and_clears_location() {
        let service = service().await;
        let customer = service.register(register("ali")).await.unwrap();

        let located = service
            .update(
                &customer.id,
                UpdateCustomerRequest {
                    latitude: Some(41.31),
                    longitude: Some(69.28),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(located.latitude, Some(41.31));

        // nulls alone leave the location as it was
        let unchanged = service
            .update(&customer.id, UpdateCustomerRequest::default())
            .await
            .unwrap();
        assert_eq!(unchanged.longitude, Some(69.28));

        let err = service
            .update(
                &customer.id,
                UpdateCustomerRequest {
                    latitude: Some(40.0),
                    longitude: Some(70.0),
                    clear_location: true,
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        let cleared = service
            .update(
                &customer.id,
                UpdateCustomerRequest {
                    clear_location: true,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!((cleared.latitude, cleared.longitude), (None, None));
    }

    #[test]
    fn coordinates_must_be_a_pair() {
        assert!(check_coordinates(None, None).is_ok());
        assert!(check_coordinates(Some(41.31), Some(69.28)).is_ok());
        assert!(check_coordinates(Some(41.31), None).is_err());
        assert!(check_coordinates(Some(91.0), Some(0.0)).is_err());
    }
}
