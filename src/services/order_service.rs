//! # Order service
//!
//! Checkout and the order status workflow.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument, warn};
use validator::Validate;

use super::{check_coordinates, CatalogService, CustomerService, Service};
use crate::{
    database::{OrderRepository, Repository},
    error::{AppError, Result},
    models::{
        new_id, CheckoutRequest, Customer, Locale, Order, OrderDetail, OrderItem, OrderQuery,
        OrderStatus, PaginatedResult, Pagination,
    },
    utils::{generate_order_number, non_blank, normalize_phone},
};

/// Attempts at finding an unused order number.
const ORDER_NUMBER_ATTEMPTS: usize = 5;

#[derive(Debug, Clone)]
pub struct OrderService {
    repo: OrderRepository,
    catalog: Arc<CatalogService>,
    customers: Arc<CustomerService>,
}

impl Service for OrderService {}

impl OrderService {
    #[must_use]
    pub fn new(repo: OrderRepository, catalog: Arc<CatalogService>, customers: Arc<CustomerService>) -> Self {
        Self {
            repo,
            catalog,
            customers,
        }
    }

    /// Turn a cart into an order.
    ///
    /// Guests must give name, phone and address; a logged-in customer's
    /// profile fills in whatever they leave out. Prices come from the
    /// customer's tier, or the default tier for guests.
    ///
    /// # Errors
    /// - `BadRequest`: empty cart, missing contact details, or a line that
    ///   cannot be priced
    /// - `Forbidden`: the customer account is deactivated
    #[instrument(skip(self, request))]
    pub async fn checkout(
        &self,
        request: CheckoutRequest,
        customer_id: Option<&str>,
        locale: Locale,
    ) -> Result<OrderDetail> {
        request.validate()?;

        let cart = request.cart.normalized();
        if cart.is_empty() {
            return Err(AppError::BadRequest("Cart is empty".to_string()));
        }

        let customer = match customer_id {
            Some(id) => Some(self.active_customer(id).await?),
            None => None,
        };

        let tier = self
            .catalog
            .tier_for(customer.as_ref().and_then(|c| c.price_type_id.as_deref()))
            .await?;
        let quote = self.catalog.quote(&cart, tier.as_ref(), locale).await?;

        let contact = Contact::resolve(&request, customer.as_ref())?;
        let now = Utc::now();
        let order_id = uuid::Uuid::new_v4().to_string();

        let items: Vec<OrderItem> = quote
            .lines
            .iter()
            .zip(0_i64..)
            .map(|(line, position)| OrderItem {
                id: new_id(),
                order_id: order_id.clone(),
                product_id: line.product_id.clone(),
                product_name: line.name.clone(),
                unit: line.unit,
                quantity: i64::from(line.quantity),
                unit_price: line.unit_price,
                line_total: line.line_total,
                position,
            })
            .collect();

        let mut order = Order {
            id: order_id,
            order_number: generate_order_number(now),
            customer_id: customer.as_ref().map(|c| c.id.clone()),
            customer_name: contact.name,
            phone: contact.phone,
            address: contact.address,
            latitude: contact.latitude,
            longitude: contact.longitude,
            note: non_blank(request.note),
            price_type_id: quote.price_type_id.clone(),
            status: OrderStatus::Pending,
            subtotal: quote.subtotal,
            total_quantity: quote.total_quantity,
            created_at: now,
            updated_at: now,
        };

        let mut attempt = 1;
        let order = loop {
            match self.repo.create(&order, &items).await {
                Ok(order) => break order,
                Err(AppError::Conflict(_)) if attempt < ORDER_NUMBER_ATTEMPTS => {
                    warn!(order_number = %order.order_number, "Order number collision, retrying");
                    order.order_number = generate_order_number(now);
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        };

        info!(
            order_id = %order.id,
            order_number = %order.order_number,
            subtotal = order.subtotal,
            "Order placed"
        );

        self.get(&order.id).await
    }

    pub async fn get(&self, id: &str) -> Result<OrderDetail> {
        let order = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Order", id))?;
        let items = self.repo.items(id).await?;

        Ok(OrderDetail { order, items })
    }

    pub async fn list(&self, query: &OrderQuery) -> Result<PaginatedResult<Order>> {
        let pagination = Pagination::new(query.page, query.per_page);
        let (orders, total) = self.repo.list(query.status, &pagination).await?;

        Ok(PaginatedResult::new(
            orders,
            &pagination,
            u64::try_from(total).unwrap_or_default(),
        ))
    }

    /// Order history of one customer, newest first.
    pub async fn for_customer(&self, customer_id: &str) -> Result<Vec<Order>> {
        self.repo.find_by_customer(customer_id).await
    }

    /// Advance an order along its workflow.
    ///
    /// # Errors
    /// `Conflict` when `status` is not reachable from the current state.
    #[instrument(skip(self))]
    pub async fn update_status(&self, id: &str, status: OrderStatus) -> Result<OrderDetail> {
        let current = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Order", id))?;

        if !current.status.can_transition_to(status) {
            return Err(AppError::Conflict(format!(
                "Order cannot go from {} to {}",
                current.status.as_str(),
                status.as_str()
            )));
        }

        if !self.repo.update_status(id, current.status, status).await? {
            return Err(AppError::Conflict(
                "Order was changed by someone else, reload and retry".to_string(),
            ));
        }

        info!(order_id = %id, from = current.status.as_str(), to = status.as_str(), "Order status changed");
        self.get(id).await
    }

    async fn active_customer(&self, id: &str) -> Result<Customer> {
        let customer = self.customers.get(id).await?;
        if !customer.is_active {
            return Err(AppError::Forbidden("Account is deactivated".to_string()));
        }
        Ok(customer)
    }
}

/// Delivery contact of an order.
struct Contact {
    name: String,
    phone: String,
    address: String,
    latitude: Option<f64>,
    longitude: Option<f64>,
}

impl Contact {
    fn resolve(request: &CheckoutRequest, customer: Option<&Customer>) -> Result<Self> {
        let name = non_blank(request.customer_name.clone())
            .or_else(|| customer.map(|c| c.full_name.clone()))
            .ok_or_else(|| AppError::BadRequest("Name is required".to_string()))?;

        let phone = non_blank(request.phone.clone())
            .map(|p| normalize_phone(&p))
            .or_else(|| customer.map(|c| c.phone.clone()))
            .filter(|p| !p.is_empty())
            .ok_or_else(|| AppError::BadRequest("Phone is required".to_string()))?;

        let address = non_blank(request.address.clone())
            .or_else(|| customer.and_then(|c| c.address.clone()))
            .ok_or_else(|| AppError::BadRequest("Address is required".to_string()))?;

        let (latitude, longitude) = match (request.latitude, request.longitude) {
            (None, None) => customer.map_or((None, None), |c| (c.latitude, c.longitude)),
            given => given,
        };
        check_coordinates(latitude, longitude)?;

        Ok(Self {
            name,
            phone,
            address,
            latitude,
            longitude,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{
        CategoryRepository, CustomerRepository, Database, PriceTypeRepository, ProductRepository,
    };
    use crate::models::{
        Cart, CreateProductRequest, LocalizedText, PriceInput, PurchaseUnit, RegisterCustomerRequest,
        UpdateCustomerRequest,
    };

    struct Fixture {
        orders: OrderService,
        customers: Arc<CustomerService>,
        product_id: String,
    }

    async fn fixture() -> Fixture {
        let db = Database::in_memory().await.unwrap();
        let price_types = PriceTypeRepository::new(db.clone());
        price_types.create("retail", "retail", "Retail", true).await.unwrap();
        price_types.create("vip", "vip", "VIP", false).await.unwrap();

        let catalog = Arc::new(CatalogService::new(
            CategoryRepository::new(db.clone()),
            price_types.clone(),
            ProductRepository::new(db.clone()),
        ));
        let customers = Arc::new(CustomerService::new(CustomerRepository::new(db.clone()), price_types));

        let product = catalog
            .create_product(CreateProductRequest {
                sku: "WATER-1".to_string(),
                category_id: None,
                name: LocalizedText::new("Suv", "Вода", "Su"),
                description: None,
                image_url: None,
                volume_ml: Some(1000),
                units_per_box: 6,
                in_stock: true,
                is_active: true,
                prices: vec![
                    PriceInput { price_type_id: "retail".into(), unit_price: 3000, box_price: None },
                    PriceInput { price_type_id: "vip".into(), unit_price: 2500, box_price: Some(14_000) },
                ],
            })
            .await
            .unwrap();

        Fixture {
            orders: OrderService::new(OrderRepository::new(db), catalog, customers.clone()),
            customers,
            product_id: product.product.id,
        }
    }

    fn checkout(cart: Cart) -> CheckoutRequest {
        CheckoutRequest {
            cart,
            customer_name: Some("Guest Buyer".to_string()),
            phone: Some("+998 90 000 00 00".to_string()),
            address: Some("Yunusobod 12".to_string()),
            latitude: None,
            longitude: None,
            note: None,
        }
    }

    #[tokio::test]
    async fn guest_checkout_snapshots_prices() {
        let f = fixture().await;
        let mut cart = Cart::default();
        cart.add(f.product_id.as_str(), 2, PurchaseUnit::Box);
        cart.add(f.product_id.as_str(), 3, PurchaseUnit::Unit);

        let detail = f.orders.checkout(checkout(cart), None, Locale::Ru).await.unwrap();

        assert_eq!(detail.order.status, OrderStatus::Pending);
        assert_eq!(detail.order.price_type_id, "retail");
        assert_eq!(detail.order.subtotal, 2 * 18_000 + 3 * 3000);
        assert_eq!(detail.order.total_quantity, 15);
        assert_eq!(detail.order.phone, "+998900000000");
        assert_eq!(detail.items.len(), 2);
        assert_eq!(detail.items[0].product_name, "Вода");
        assert_eq!(detail.order.order_number.len(), 13);
    }

    #[tokio::test]
    async fn customer_checkout_uses_profile_and_tier() {
        let f = fixture().await;
        let customer = f
            .customers
            .register(RegisterCustomerRequest {
                nickname: "bahor_market".to_string(),
                full_name: "Bahor Market".to_string(),
                phone: "+998711112233".to_string(),
                password: "secret-pass".to_string(),
                address: Some("Chilonzor 9".to_string()),
            })
            .await
            .unwrap();
        f.customers
            .update(
                &customer.id,
                UpdateCustomerRequest { price_type_id: Some("vip".into()), ..Default::default() },
            )
            .await
            .unwrap();

        let mut cart = Cart::default();
        cart.add(f.product_id.as_str(), 1, PurchaseUnit::Box);
        let request = CheckoutRequest {
            cart,
            customer_name: None,
            phone: None,
            address: None,
            latitude: None,
            longitude: None,
            note: Some("  ".to_string()),
        };

        let detail = f.orders.checkout(request, Some(&customer.id), Locale::Uz).await.unwrap();

        assert_eq!(detail.order.customer_name, "Bahor Market");
        assert_eq!(detail.order.address, "Chilonzor 9");
        assert_eq!(detail.order.price_type_id, "vip");
        assert_eq!(detail.order.subtotal, 14_000);
        assert_eq!(detail.order.note, None);

        let history = f.orders.for_customer(&customer.id).await.unwrap();
        assert_eq!(history.len(), 1);
    }

    #[tokio::test]
    async fn empty_cart_and_missing_contact_are_rejected() {
        let f = fixture().await;

        let err = f.orders.checkout(checkout(Cart::default()), None, Locale::Uz).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        let mut cart = Cart::default();
        cart.add(f.product_id.as_str(), 1, PurchaseUnit::Unit);
        let mut request = checkout(cart);
        request.address = None;
        let err = f.orders.checkout(request, None, Locale::Uz).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn status_workflow_is_enforced() {
        let f = fixture().await;
        let mut cart = Cart::default();
        cart.add(f.product_id.as_str(), 1, PurchaseUnit::Unit);
        let id = f.orders.checkout(checkout(cart), None, Locale::Uz).await.unwrap().order.id;

        let err = f.orders.update_status(&id, OrderStatus::Delivered).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        for status in [OrderStatus::Confirmed, OrderStatus::Delivering, OrderStatus::Delivered] {
            let detail = f.orders.update_status(&id, status).await.unwrap();
            assert_eq!(detail.order.status, status);
        }

        let err = f.orders.update_status(&id, OrderStatus::Cancelled).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }
}
