//! # Price resolution and cart quoting
//!
//! Pure functions: no database access, so the arithmetic can be tested
//! exhaustively.

use std::collections::HashMap;

use crate::{
    error::{AppError, Result},
    models::{Cart, CartQuote, PricedProduct, ProductPrice, PurchaseUnit, QuotedLine, ResolvedPrice},
};

/// Which price rows apply to a shopper: their own tier, then the default
/// tier when the product has no row for theirs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceTier {
    pub price_type_id: String,
    /// `None` when the shopper's tier already is the default
    pub fallback_id: Option<String>,
}

impl PriceTier {
    #[must_use]
    pub fn new(price_type_id: impl Into<String>, default_id: impl Into<String>) -> Self {
        let price_type_id = price_type_id.into();
        let default_id = default_id.into();
        let fallback_id = (default_id != price_type_id).then_some(default_id);

        Self {
            price_type_id,
            fallback_id,
        }
    }

    /// Price type ids to load, most specific first.
    #[must_use]
    pub fn ids(&self) -> Vec<&str> {
        std::iter::once(self.price_type_id.as_str())
            .chain(self.fallback_id.as_deref())
            .collect()
    }
}

/// Box price: the explicit one, else `unit_price × units_per_box`.
/// `None` when the product would cost more than fits in an `i64`.
#[must_use]
pub fn box_price(unit_price: i64, explicit: Option<i64>, units_per_box: i64) -> Option<i64> {
    match explicit {
        Some(price) => Some(price),
        None => unit_price.checked_mul(units_per_box.max(1)),
    }
}

/// Pick the row for the shopper's tier, else the fallback tier's row.
///
/// # Example
/// ```rust
/// use drinks_storefront::models::ProductPrice;
/// use drinks_storefront::services::{resolve_price, PriceTier};
///
/// let retail = ProductPrice {
///     product_id: "cola".into(),
///     price_type_id: "retail".into(),
///     unit_price: 6_000,
///     box_price: None,
/// };
/// let tier = PriceTier::new("vip", "retail");
///
/// let price = resolve_price(&[retail], &tier, 12).unwrap();
/// assert_eq!(price.unit_price, 6_000);
/// assert_eq!(price.box_price, 72_000);
/// ```
#[must_use]
pub fn resolve_price(prices: &[ProductPrice], tier: &PriceTier, units_per_box: i64) -> Option<ResolvedPrice> {
    let row = tier
        .ids()
        .into_iter()
        .find_map(|id| prices.iter().find(|p| p.price_type_id == id))?;

    Some(ResolvedPrice {
        unit_price: row.unit_price,
        box_price: box_price(row.unit_price, row.box_price, units_per_box)?,
    })
}

/// Resolve prices for many products at once; rows may belong to any of them.
#[must_use]
pub fn resolve_prices(
    rows: &[ProductPrice],
    tier: &PriceTier,
    units_per_box: &HashMap<String, i64>,
) -> HashMap<String, ResolvedPrice> {
    let mut by_product: HashMap<&str, Vec<ProductPrice>> = HashMap::new();
    for row in rows {
        by_product.entry(row.product_id.as_str()).or_default().push(row.clone());
    }

    by_product
        .into_iter()
        .filter_map(|(product_id, prices)| {
            let per_box = units_per_box.get(product_id).copied().unwrap_or(1);
            resolve_price(&prices, tier, per_box).map(|price| (product_id.to_string(), price))
        })
        .collect()
}

fn overflow() -> AppError {
    AppError::BadRequest("Order total is too large".to_string())
}

/// Price every line of `cart`.
///
/// The cart is normalised first. Every line must refer to a known,
/// orderable and priced product.
///
/// # Errors
/// `BadRequest` naming the offending product, or when a total overflows.
pub fn quote(cart: &Cart, products: &HashMap<String, PricedProduct>, price_type_id: &str) -> Result<CartQuote> {
    let cart = cart.normalized();
    let mut lines = Vec::with_capacity(cart.lines.len());
    let mut subtotal: i64 = 0;
    let mut total_quantity: i64 = 0;

    for line in &cart.lines {
        let product = products.get(&line.product_id).ok_or_else(|| {
            AppError::BadRequest(format!("Product '{}' not found", line.product_id))
        })?;

        if !product.orderable {
            return Err(AppError::BadRequest(format!(
                "Product '{}' is not available",
                product.name
            )));
        }

        let price = product.price.ok_or_else(|| {
            AppError::BadRequest(format!("Product '{}' has no price", product.name))
        })?;

        let quantity = i64::from(line.quantity);
        let unit_price = price.for_unit(line.unit);
        let line_total = unit_price.checked_mul(quantity).ok_or_else(overflow)?;
        let item_count = match line.unit {
            PurchaseUnit::Unit => quantity,
            PurchaseUnit::Box => quantity.checked_mul(product.units_per_box).ok_or_else(overflow)?,
        };

        subtotal = subtotal.checked_add(line_total).ok_or_else(overflow)?;
        total_quantity = total_quantity.checked_add(item_count).ok_or_else(overflow)?;

        lines.push(QuotedLine {
            product_id: product.product_id.clone(),
            sku: product.sku.clone(),
            name: product.name.clone(),
            unit: line.unit,
            quantity: line.quantity,
            units_per_box: product.units_per_box,
            unit_price,
            line_total,
            item_count,
        });
    }

    Ok(CartQuote {
        price_type_id: price_type_id.to_string(),
        line_count: lines.len(),
        lines,
        subtotal,
        total_quantity,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn row(product_id: &str, price_type_id: &str, unit_price: i64, box_price: Option<i64>) -> ProductPrice {
        ProductPrice {
            product_id: product_id.to_string(),
            price_type_id: price_type_id.to_string(),
            unit_price,
            box_price,
        }
    }

    fn priced(id: &str, unit_price: i64, units_per_box: i64) -> PricedProduct {
        PricedProduct {
            product_id: id.to_string(),
            sku: id.to_uppercase(),
            name: id.to_string(),
            units_per_box,
            orderable: true,
            price: Some(ResolvedPrice {
                unit_price,
                box_price: unit_price * units_per_box,
            }),
        }
    }

    fn catalog(items: Vec<PricedProduct>) -> HashMap<String, PricedProduct> {
        items.into_iter().map(|p| (p.product_id.clone(), p)).collect()
    }

    #[test]
    fn own_tier_wins_over_default() {
        let prices = [row("cola", "retail", 6000, None), row("cola", "vip", 5000, Some(55_000))];

        let vip = resolve_price(&prices, &PriceTier::new("vip", "retail"), 12).unwrap();
        assert_eq!(vip, ResolvedPrice { unit_price: 5000, box_price: 55_000 });

        let retail = resolve_price(&prices, &PriceTier::new("retail", "retail"), 12).unwrap();
        assert_eq!(retail, ResolvedPrice { unit_price: 6000, box_price: 72_000 });
    }

    #[test]
    fn missing_rows_leave_product_unpriced() {
        let prices = [row("cola", "wholesale", 5500, None)];
        assert_eq!(resolve_price(&prices, &PriceTier::new("vip", "retail"), 12), None);
    }

    #[test]
    fn tier_ids_skip_duplicate_default() {
        assert_eq!(PriceTier::new("retail", "retail").ids(), vec!["retail"]);
        assert_eq!(PriceTier::new("vip", "retail").ids(), vec!["vip", "retail"]);
    }

    #[test]
    fn resolve_prices_groups_by_product() {
        let rows = [
            row("cola", "retail", 6000, None),
            row("water", "retail", 2000, None),
            row("water", "vip", 1800, None),
        ];
        let per_box: HashMap<String, i64> =
            [("cola".to_string(), 12), ("water".to_string(), 6)].into_iter().collect();

        let resolved = resolve_prices(&rows, &PriceTier::new("vip", "retail"), &per_box);
        assert_eq!(resolved["cola"].box_price, 72_000);
        assert_eq!(resolved["water"].unit_price, 1800);
        assert_eq!(resolved["water"].box_price, 10_800);
    }

    #[test]
    fn quote_counts_box_contents() {
        let products = catalog(vec![priced("cola", 6000, 12), priced("water", 2000, 6)]);
        let mut cart = Cart::default();
        cart.add("cola", 2, PurchaseUnit::Box);
        cart.add("water", 3, PurchaseUnit::Unit);

        let quote = quote(&cart, &products, "retail").unwrap();

        assert_eq!(quote.line_count, 2);
        assert_eq!(quote.lines[0].line_total, 144_000);
        assert_eq!(quote.lines[0].item_count, 24);
        assert_eq!(quote.subtotal, 150_000);
        assert_eq!(quote.total_quantity, 27);
    }

    #[test]
    fn quote_rejects_unknown_unavailable_and_unpriced() {
        let mut hidden = priced("old", 1000, 1);
        hidden.orderable = false;
        let mut free = priced("free", 0, 1);
        free.price = None;
        let products = catalog(vec![hidden, free]);

        for id in ["ghost", "old", "free"] {
            let mut cart = Cart::default();
            cart.add(id, 1, PurchaseUnit::Unit);
            let err = quote(&cart, &products, "retail").unwrap_err();
            assert!(matches!(err, AppError::BadRequest(_)), "{id}");
        }
    }

    #[test]
    fn quote_reports_overflow() {
        let mut products = catalog(vec![priced("gold", 1, 1)]);
        products.get_mut("gold").unwrap().price = Some(ResolvedPrice {
            unit_price: i64::MAX,
            box_price: i64::MAX,
        });

        let mut cart = Cart::default();
        cart.add("gold", 2, PurchaseUnit::Unit);

        assert!(matches!(quote(&cart, &products, "retail"), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn quote_merges_duplicate_lines() {
        let products = catalog(vec![priced("cola", 6000, 12)]);
        let cart = Cart {
            lines: vec![
                crate::models::CartLine { product_id: "cola".into(), quantity: 1, unit: PurchaseUnit::Unit },
                crate::models::CartLine { product_id: "cola".into(), quantity: 0, unit: PurchaseUnit::Box },
                crate::models::CartLine { product_id: "cola".into(), quantity: 2, unit: PurchaseUnit::Unit },
            ],
        };

        let quote = quote(&cart, &products, "retail").unwrap();
        assert_eq!(quote.line_count, 1);
        assert_eq!(quote.lines[0].quantity, 3);
        assert_eq!(quote.subtotal, 18_000);
    }

    proptest! {
        #[test]
        fn subtotal_is_sum_of_lines(
            lines in prop::collection::vec((0usize..4, 1u32..200, any::<bool>()), 0..12),
            prices in prop::collection::vec(0i64..1_000_000, 4),
            boxes in prop::collection::vec(1i64..48, 4),
        ) {
            let products = catalog(
                (0..4)
                    .map(|i| priced(&format!("p{i}"), prices[i], boxes[i]))
                    .collect(),
            );

            let mut cart = Cart::default();
            for (idx, qty, is_box) in &lines {
                let unit = if *is_box { PurchaseUnit::Box } else { PurchaseUnit::Unit };
                cart.add(format!("p{idx}"), *qty, unit);
            }

            let quote = quote(&cart, &products, "retail").unwrap();

            let sum: i64 = quote.lines.iter().map(|l| l.line_total).sum();
            let items: i64 = quote.lines.iter().map(|l| l.item_count).sum();
            prop_assert_eq!(quote.subtotal, sum);
            prop_assert_eq!(quote.total_quantity, items);
            prop_assert_eq!(quote.line_count, cart.lines.len());

            for line in &quote.lines {
                prop_assert_eq!(line.line_total, line.unit_price * i64::from(line.quantity));
            }
        }

        #[test]
        fn derived_box_price_is_unit_times_count(unit in 0i64..10_000_000, per_box in 1i64..10_000) {
            prop_assert_eq!(box_price(unit, None, per_box), Some(unit * per_box));
            prop_assert_eq!(box_price(unit, Some(7), per_box), Some(7));
        }
    }
}
