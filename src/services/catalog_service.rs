//! # Catalog service
//!
//! Categories, products, tier prices and cart quotes.

use std::collections::{HashMap, HashSet};

use chrono::Utc;
use tracing::{info, instrument};
use validator::Validate;

use super::{pricing, PriceTier, Service};
use crate::{
    database::{CategoryRepository, PriceTypeRepository, ProductFilter, ProductRepository, Repository},
    error::{AppError, OptionExt, Result},
    models::{
        new_id, Cart, CartQuote, Category, CategoryRequest, CategoryView, CreateProductRequest,
        Locale, LocalizedText, PaginatedResult, Pagination, PriceInput, PricedProduct, Product,
        ProductDetail, ProductPrice, ProductQuery, ProductView, UpdateProductRequest,
    },
    utils::{self, non_blank, MAX_DESCRIPTION_LENGTH, VALID_SKU, VALID_SLUG},
};

#[derive(Debug, Clone)]
pub struct CatalogService {
    categories: CategoryRepository,
    price_types: PriceTypeRepository,
    products: ProductRepository,
}

impl Service for CatalogService {}

impl CatalogService {
    #[must_use]
    pub fn new(
        categories: CategoryRepository,
        price_types: PriceTypeRepository,
        products: ProductRepository,
    ) -> Self {
        Self {
            categories,
            price_types,
            products,
        }
    }

    // =====================================
    // Price tiers
    // =====================================
    /// Tier a shopper is priced at: their own price type when assigned,
    /// else the default. `None` when no price type exists at all.
    pub async fn tier_for(&self, customer_price_type: Option<&str>) -> Result<Option<PriceTier>> {
        let Some(default) = self.price_types.find_default().await? else {
            return Ok(None);
        };

        let own = customer_price_type.unwrap_or(default.id.as_str());
        Ok(Some(PriceTier::new(own, default.id.as_str())))
    }

    // =====================================
    // Categories
    // =====================================
    pub async fn list_categories(&self, locale: Locale) -> Result<Vec<CategoryView>> {
        let categories = self.categories.find_all().await?;

        Ok(categories
            .iter()
            .map(|c| CategoryView::from_category(c, locale))
            .collect())
    }

    #[instrument(skip(self, request), fields(slug = %request.slug))]
    pub async fn create_category(&self, request: CategoryRequest) -> Result<Category> {
        let request = normalize_category(request)?;
        let category = self.categories.create(&new_id(), &request).await?;

        info!(category_id = %category.id, "Category created");
        Ok(category)
    }

    #[instrument(skip(self, request))]
    pub async fn update_category(&self, id: &str, request: CategoryRequest) -> Result<Category> {
        let request = normalize_category(request)?;

        self.categories
            .update(id, &request)
            .await?
            .ok_or_else(|| AppError::not_found("Category", id))
    }

    /// Products in the category are kept, without a category.
    #[instrument(skip(self))]
    pub async fn delete_category(&self, id: &str) -> Result<()> {
        if !self.categories.delete(id).await? {
            return Err(AppError::not_found("Category", id));
        }

        info!(category_id = %id, "Category deleted");
        Ok(())
    }

    // =====================================
    // Products (shopper view)
    // =====================================
    /// Product listing for shoppers. Inactive products are only included
    /// when `include_inactive` is set, which callers allow for staff only.
    pub async fn list_products(
        &self,
        query: &ProductQuery,
        locale: Locale,
        tier: Option<&PriceTier>,
        include_inactive: bool,
    ) -> Result<PaginatedResult<ProductView>> {
        let pagination = Pagination::new(query.page, query.per_page);
        let filter = ProductFilter {
            category_id: non_blank(query.category.clone()),
            search: non_blank(query.q.clone()),
            include_inactive,
        };

        let (products, total) = self.products.list(&filter, &pagination).await?;
        let prices = self.resolve_for(&products, tier).await?;

        let views = products
            .iter()
            .map(|p| ProductView::new(p, locale, prices.get(&p.id).copied()))
            .collect();

        Ok(PaginatedResult::new(
            views,
            &pagination,
            u64::try_from(total).unwrap_or_default(),
        ))
    }

    pub async fn get_product(
        &self,
        id: &str,
        locale: Locale,
        tier: Option<&PriceTier>,
        include_inactive: bool,
    ) -> Result<ProductView> {
        let product = self
            .products
            .find_by_id(id)
            .await?
            .filter(|p| p.is_active || include_inactive)
            .ok_or_else(|| AppError::not_found("Product", id))?;

        let prices = self.resolve_for(std::slice::from_ref(&product), tier).await?;

        Ok(ProductView::new(&product, locale, prices.get(&product.id).copied()))
    }

    async fn resolve_for(
        &self,
        products: &[Product],
        tier: Option<&PriceTier>,
    ) -> Result<HashMap<String, crate::models::ResolvedPrice>> {
        let Some(tier) = tier else {
            return Ok(HashMap::new());
        };

        let ids: Vec<String> = products.iter().map(|p| p.id.clone()).collect();
        let rows = self.products.prices_for(&ids, &tier.ids()).await?;
        let per_box: HashMap<String, i64> = products
            .iter()
            .map(|p| (p.id.clone(), p.units_per_box))
            .collect();

        Ok(pricing::resolve_prices(&rows, tier, &per_box))
    }

    // =====================================
    // Cart
    // =====================================
    /// Price a cart for a tier, with product names in `locale`.
    ///
    /// # Errors
    /// `BadRequest` when a product is unknown, unavailable or unpriced, or
    /// when no price type is configured and the cart is not empty.
    pub async fn quote(&self, cart: &Cart, tier: Option<&PriceTier>, locale: Locale) -> Result<CartQuote> {
        let cart = cart.normalized();

        let Some(tier) = tier else {
            if cart.is_empty() {
                return Ok(CartQuote {
                    price_type_id: String::new(),
                    lines: Vec::new(),
                    subtotal: 0,
                    total_quantity: 0,
                    line_count: 0,
                });
            }
            return Err(AppError::BadRequest("No price type is configured".to_string()));
        };

        let ids: Vec<String> = cart
            .lines
            .iter()
            .map(|l| l.product_id.clone())
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();

        let products = self.products.find_many(&ids).await?;
        let prices = self.resolve_for(&products, Some(tier)).await?;

        let priced: HashMap<String, PricedProduct> = products
            .into_iter()
            .map(|p| {
                let priced = PricedProduct {
                    product_id: p.id.clone(),
                    sku: p.sku.clone(),
                    name: p.name().get(locale).to_string(),
                    units_per_box: p.units_per_box,
                    orderable: p.is_orderable(),
                    price: prices.get(&p.id).copied(),
                };
                (p.id, priced)
            })
            .collect();

        pricing::quote(&cart, &priced, &tier.price_type_id)
    }

    // =====================================
    // Products (back office)
    // =====================================
    pub async fn get_product_detail(&self, id: &str) -> Result<ProductDetail> {
        let product = self
            .products
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Product", id))?;
        let prices = self.products.prices(id).await?;

        Ok(ProductDetail { product, prices })
    }

    #[instrument(skip(self, request), fields(sku = %request.sku))]
    pub async fn create_product(&self, request: CreateProductRequest) -> Result<ProductDetail> {
        request.validate()?;

        let sku = request.sku.trim().to_string();
        check_sku(&sku)?;
        let category_id = self.checked_category(non_blank(request.category_id)).await?;
        let description = request.description.unwrap_or_default();
        check_description(&description)?;
        let image_url = checked_image_url(non_blank(request.image_url))?;

        let id = new_id();
        let prices = self.checked_prices(&id, &request.prices).await?;
        let now = Utc::now();
        let name = checked_name(request.name)?;

        let product = Product {
            id,
            sku,
            category_id,
            name_uz: name.uz,
            name_ru: name.ru,
            name_tr: name.tr,
            description_uz: description.uz.trim().to_string(),
            description_ru: description.ru.trim().to_string(),
            description_tr: description.tr.trim().to_string(),
            image_url,
            volume_ml: request.volume_ml,
            units_per_box: request.units_per_box,
            in_stock: request.in_stock,
            is_active: request.is_active,
            created_at: now,
            updated_at: now,
        };

        let product = self.products.create(&product, &prices).await?;
        info!(product_id = %product.id, "Product created");

        self.get_product_detail(&product.id).await
    }

    /// Apply the fields present in `request`.
    #[instrument(skip(self, request))]
    pub async fn update_product(&self, id: &str, request: UpdateProductRequest) -> Result<ProductDetail> {
        request.validate()?;

        let mut product = self
            .products
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Product", id))?;

        if let Some(sku) = request.sku {
            let sku = sku.trim().to_string();
            check_sku(&sku)?;
            product.sku = sku;
        }
        if let Some(category_id) = request.category_id {
            // an empty id detaches the product
            product.category_id = self.checked_category(non_blank(Some(category_id))).await?;
        }
        if let Some(name) = request.name {
            let name = checked_name(name)?;
            product.name_uz = name.uz;
            product.name_ru = name.ru;
            product.name_tr = name.tr;
        }
        if let Some(description) = request.description {
            check_description(&description)?;
            product.description_uz = description.uz.trim().to_string();
            product.description_ru = description.ru.trim().to_string();
            product.description_tr = description.tr.trim().to_string();
        }
        if let Some(image_url) = request.image_url {
            product.image_url = checked_image_url(non_blank(Some(image_url)))?;
        }
        if let Some(volume_ml) = request.volume_ml {
            product.volume_ml = Some(volume_ml);
        }
        if let Some(units_per_box) = request.units_per_box {
            product.units_per_box = units_per_box;
        }
        if let Some(in_stock) = request.in_stock {
            product.in_stock = in_stock;
        }
        if let Some(is_active) = request.is_active {
            product.is_active = is_active;
        }
        product.updated_at = Utc::now();

        self.products
            .update(&product)
            .await?
            .ok_or_else(|| AppError::not_found("Product", id))?;

        self.get_product_detail(id).await
    }

    #[instrument(skip(self))]
    pub async fn delete_product(&self, id: &str) -> Result<()> {
        if !self.products.delete(id).await? {
            return Err(AppError::not_found("Product", id));
        }

        info!(product_id = %id, "Product deleted");
        Ok(())
    }

    /// Replace every tier price of a product.
    #[instrument(skip(self, prices))]
    pub async fn set_prices(&self, id: &str, prices: &[PriceInput]) -> Result<Vec<ProductPrice>> {
        self.products
            .find_by_id(id)
            .await?
            .ok_or_not_found(format!("Product '{id}' not found"))?;

        let prices = self.checked_prices(id, prices).await?;
        self.products.set_prices(id, &prices).await
    }

    async fn checked_category(&self, category_id: Option<String>) -> Result<Option<String>> {
        match category_id {
            Some(id) if !self.categories.exists(&id).await? => {
                Err(AppError::BadRequest(format!("Category '{id}' does not exist")))
            }
            other => Ok(other),
        }
    }

    /// Every price must name an existing price type, at most once.
    async fn checked_prices(&self, product_id: &str, inputs: &[PriceInput]) -> Result<Vec<ProductPrice>> {
        let known: HashSet<String> = self
            .price_types
            .find_all()
            .await?
            .into_iter()
            .map(|p| p.id)
            .collect();

        let mut seen = HashSet::new();
        let mut prices = Vec::with_capacity(inputs.len());

        for input in inputs {
            input.validate()?;

            if !known.contains(&input.price_type_id) {
                return Err(AppError::BadRequest(format!(
                    "Price type '{}' does not exist",
                    input.price_type_id
                )));
            }
            if !seen.insert(input.price_type_id.as_str()) {
                return Err(AppError::BadRequest(format!(
                    "Price type '{}' is listed twice",
                    input.price_type_id
                )));
            }

            prices.push(ProductPrice {
                product_id: product_id.to_string(),
                price_type_id: input.price_type_id.clone(),
                unit_price: input.unit_price,
                box_price: input.box_price,
            });
        }

        Ok(prices)
    }
}

fn normalize_category(mut request: CategoryRequest) -> Result<CategoryRequest> {
    request.validate()?;
    request.slug = request.slug.trim().to_lowercase();
    request.name = checked_name(request.name)?;

    if !VALID_SLUG.is_match(&request.slug) {
        return Err(AppError::BadRequest(
            "Slug may only contain a-z, 0-9 and single dashes".to_string(),
        ));
    }

    Ok(request)
}

/// Validated name with surrounding whitespace removed.
fn checked_name(text: LocalizedText) -> Result<LocalizedText> {
    text.validate()?;
    let text = LocalizedText::new(text.uz.trim(), text.ru.trim(), text.tr.trim());

    if text.uz.is_empty() {
        return Err(AppError::BadRequest("Uzbek name is required".to_string()));
    }
    Ok(text)
}

fn check_sku(sku: &str) -> Result<()> {
    if VALID_SKU.is_match(sku) {
        Ok(())
    } else {
        Err(AppError::BadRequest(
            "SKU may only contain letters, digits, '.', '_' and '-'".to_string(),
        ))
    }
}

fn check_description(description: &LocalizedText) -> Result<()> {
    let too_long = [&description.uz, &description.ru, &description.tr]
        .iter()
        .any(|d| d.chars().count() > MAX_DESCRIPTION_LENGTH);

    if too_long {
        return Err(AppError::BadRequest(format!(
            "Description is limited to {MAX_DESCRIPTION_LENGTH} characters"
        )));
    }
    Ok(())
}

fn checked_image_url(url: Option<String>) -> Result<Option<String>> {
    match url {
        Some(url) if !utils::is_valid_url(&url) => {
            Err(AppError::BadRequest("Image URL must be http(s)".to_string()))
        }
        other => Ok(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Database;
    use crate::models::PurchaseUnit;

    async fn service() -> CatalogService {
        let db = Database::in_memory().await.unwrap();
        let price_types = PriceTypeRepository::new(db.clone());
        price_types.create("retail", "retail", "Retail", true).await.unwrap();
        price_types.create("vip", "vip", "VIP", false).await.unwrap();

        CatalogService::new(
            CategoryRepository::new(db.clone()),
            price_types,
            ProductRepository::new(db),
        )
    }

    fn cola(prices: Vec<PriceInput>) -> CreateProductRequest {
        CreateProductRequest {
            sku: "COLA-05".to_string(),
            category_id: None,
            name: LocalizedText::new("Koka-kola", "Кока-кола", ""),
            description: None,
            image_url: None,
            volume_ml: Some(500),
            units_per_box: 12,
            in_stock: true,
            is_active: true,
            prices,
        }
    }

    fn price(price_type_id: &str, unit_price: i64) -> PriceInput {
        PriceInput {
            price_type_id: price_type_id.to_string(),
            unit_price,
            box_price: None,
        }
    }

    #[tokio::test]
    async fn vip_falls_back_to_default_price() {
        let catalog = service().await;
        let product = catalog.create_product(cola(vec![price("retail", 6000)])).await.unwrap();

        let tier = catalog.tier_for(Some("vip")).await.unwrap().unwrap();
        let view = catalog
            .get_product(&product.product.id, Locale::Tr, Some(&tier), false)
            .await
            .unwrap();

        let price = view.price.unwrap();
        assert_eq!(price.unit_price, 6000);
        assert_eq!(price.box_price, 72_000);
        // Turkish name is empty, so Uzbek is shown
        assert_eq!(view.name, "Koka-kola");
    }

    #[tokio::test]
    async fn unknown_or_duplicate_price_types_are_rejected() {
        let catalog = service().await;

        let err = catalog.create_product(cola(vec![price("gold", 1)])).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        let err = catalog
            .create_product(cola(vec![price("retail", 1), price("retail", 2)]))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn inactive_products_are_hidden_from_shoppers() {
        let catalog = service().await;
        let product = catalog.create_product(cola(vec![price("retail", 6000)])).await.unwrap();
        let id = product.product.id.clone();

        catalog
            .update_product(&id, UpdateProductRequest { is_active: Some(false), ..Default::default() })
            .await
            .unwrap();

        let err = catalog.get_product(&id, Locale::Uz, None, false).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert!(catalog.get_product(&id, Locale::Uz, None, true).await.is_ok());

        let mut cart = Cart::default();
        cart.add(id.as_str(), 1, PurchaseUnit::Unit);
        let tier = catalog.tier_for(None).await.unwrap();
        let err = catalog.quote(&cart, tier.as_ref(), Locale::Uz).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn deleting_category_detaches_products() {
        let catalog = service().await;
        let category = catalog
            .create_category(CategoryRequest {
                slug: "Soft-Drinks".to_string(),
                name: LocalizedText::new("Gazli ichimliklar", "Газировка", ""),
                sort_order: 1,
            })
            .await
            .unwrap();
        assert_eq!(category.slug, "soft-drinks");

        let mut request = cola(vec![]);
        request.category_id = Some(category.id.clone());
        let product = catalog.create_product(request).await.unwrap();

        catalog.delete_category(&category.id).await.unwrap();

        let detail = catalog.get_product_detail(&product.product.id).await.unwrap();
        assert_eq!(detail.product.category_id, None);
    }
}
