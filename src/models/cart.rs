//! # Cart
//!
//! The cart lives with the client (it is persisted in browser storage) and
//! is sent to the server for pricing and checkout. This type carries the
//! editing rules so that both sides agree on them.

use serde::{Deserialize, Serialize};

use super::{PurchaseUnit, ResolvedPrice};

/// Largest quantity a single line may hold.
pub const MAX_LINE_QUANTITY: u32 = 9_999;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: String,
    pub quantity: u32,
    #[serde(default)]
    pub unit: PurchaseUnit,
}

/// Shopping cart: an ordered list of lines, one per product and unit.
///
/// # Example
/// ```rust
/// use drinks_storefront::models::{Cart, PurchaseUnit};
///
/// let mut cart = Cart::default();
/// cart.add("cola-05", 2, PurchaseUnit::Unit);
/// cart.add("cola-05", 1, PurchaseUnit::Unit);
/// cart.add("cola-05", 1, PurchaseUnit::Box);
/// assert_eq!(cart.lines.len(), 2);
/// assert_eq!(cart.lines[0].quantity, 3);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    #[serde(default)]
    pub lines: Vec<CartLine>,
}

impl Cart {
    fn position(&self, product_id: &str, unit: PurchaseUnit) -> Option<usize> {
        self.lines
            .iter()
            .position(|line| line.product_id == product_id && line.unit == unit)
    }

    /// Add `quantity` of a product, merging with an existing line of the
    /// same product and unit. Quantities saturate at [`MAX_LINE_QUANTITY`].
    pub fn add(&mut self, product_id: impl Into<String>, quantity: u32, unit: PurchaseUnit) {
        if quantity == 0 {
            return;
        }

        let product_id = product_id.into();
        match self.position(&product_id, unit) {
            Some(idx) => {
                let line = &mut self.lines[idx];
                line.quantity = line.quantity.saturating_add(quantity).min(MAX_LINE_QUANTITY);
            }
            None => self.lines.push(CartLine {
                product_id,
                quantity: quantity.min(MAX_LINE_QUANTITY),
                unit,
            }),
        }
    }

    /// Set the quantity of a line; zero removes it. Setting a line that
    /// does not exist adds it.
    pub fn set_quantity(&mut self, product_id: &str, unit: PurchaseUnit, quantity: u32) {
        match (self.position(product_id, unit), quantity) {
            (Some(idx), 0) => {
                self.lines.remove(idx);
            }
            (Some(idx), q) => self.lines[idx].quantity = q.min(MAX_LINE_QUANTITY),
            (None, q) => self.add(product_id, q, unit),
        }
    }

    /// Remove a line. Returns whether one was removed.
    pub fn remove(&mut self, product_id: &str, unit: PurchaseUnit) -> bool {
        match self.position(product_id, unit) {
            Some(idx) => {
                self.lines.remove(idx);
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Canonical form of a cart received from a client: duplicate lines are
    /// merged in first-seen order and zero-quantity lines dropped.
    #[must_use]
    pub fn normalized(&self) -> Self {
        let mut cart = Self::default();
        for line in &self.lines {
            cart.add(line.product_id.clone(), line.quantity, line.unit);
        }
        cart
    }
}

// =====================================
// Quote
// =====================================
/// A cart line after pricing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotedLine {
    pub product_id: String,
    pub sku: String,
    pub name: String,
    pub unit: PurchaseUnit,
    pub quantity: u32,
    pub units_per_box: i64,
    pub unit_price: i64,
    pub line_total: i64,
    /// Single items this line represents
    pub item_count: i64,
}

/// Priced cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartQuote {
    pub price_type_id: String,
    pub lines: Vec<QuotedLine>,
    pub subtotal: i64,
    /// Single items across all lines (boxes count as their contents)
    pub total_quantity: i64,
    pub line_count: usize,
}

/// Everything the pricing step needs to know about one product.
#[derive(Debug, Clone)]
pub struct PricedProduct {
    pub product_id: String,
    pub sku: String,
    pub name: String,
    pub units_per_box: i64,
    pub orderable: bool,
    pub price: Option<ResolvedPrice>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn add_merges_same_product_and_unit() {
        let mut cart = Cart::default();
        cart.add("water", 2, PurchaseUnit::Unit);
        cart.add("water", 3, PurchaseUnit::Unit);
        cart.add("water", 1, PurchaseUnit::Box);
        cart.add("juice", 0, PurchaseUnit::Unit);

        assert_eq!(cart.lines.len(), 2);
        assert_eq!(cart.lines[0].quantity, 5);
        assert_eq!(cart.lines[1].unit, PurchaseUnit::Box);
    }

    #[test]
    fn set_quantity_zero_removes_line() {
        let mut cart = Cart::default();
        cart.add("water", 2, PurchaseUnit::Unit);
        cart.set_quantity("water", PurchaseUnit::Unit, 7);
        assert_eq!(cart.lines[0].quantity, 7);

        cart.set_quantity("water", PurchaseUnit::Unit, 0);
        assert!(cart.is_empty());
    }

    #[test]
    fn quantities_are_capped() {
        let mut cart = Cart::default();
        cart.add("water", MAX_LINE_QUANTITY, PurchaseUnit::Unit);
        cart.add("water", 5, PurchaseUnit::Unit);
        assert_eq!(cart.lines[0].quantity, MAX_LINE_QUANTITY);
    }

    #[test]
    fn remove_and_clear() {
        let mut cart = Cart::default();
        cart.add("water", 1, PurchaseUnit::Unit);
        cart.add("juice", 1, PurchaseUnit::Unit);

        assert!(cart.remove("water", PurchaseUnit::Unit));
        assert!(!cart.remove("water", PurchaseUnit::Unit));
        assert_eq!(cart.lines.len(), 1);

        cart.clear();
        assert!(cart.is_empty());
    }

    #[test]
    fn normalized_merges_client_duplicates() {
        let cart: Cart = serde_json::from_str(
            r#"{"lines":[
                {"product_id":"a","quantity":1},
                {"product_id":"b","quantity":0},
                {"product_id":"a","quantity":2,"unit":"unit"},
                {"product_id":"a","quantity":1,"unit":"box"}
            ]}"#,
        )
        .unwrap();

        let normalized = cart.normalized();
        assert_eq!(
            normalized.lines,
            vec![
                CartLine { product_id: "a".into(), quantity: 3, unit: PurchaseUnit::Unit },
                CartLine { product_id: "a".into(), quantity: 1, unit: PurchaseUnit::Box },
            ]
        );
    }
}
