//! # Cart
//!
//! The shopping cart that accepted scans feed into.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Operations                                      │
//! │                                                                         │
//! │  Source                   Operation               Cart Change           │
//! │  ──────                   ─────────               ───────────           │
//! │                                                                         │
//! │  Accepted scan ──────────► add_product(p, 1) ───► qty += 1 or push     │
//! │  Catalog click ──────────► add_product(p, 1) ───► qty += 1 or push     │
//! │                                                                         │
//! │  +/- buttons ────────────► adjust_quantity() ───► qty += delta (≥ 1)   │
//! │                                                                         │
//! │  Quantity field ─────────► update_quantity() ───► qty = n (0 removes)  │
//! │                                                                         │
//! │  Remove ─────────────────► remove_item() ───────► items.remove(i)      │
//! │                                                                         │
//! │  New sale ───────────────► clear() ─────────────► items.clear()        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every operation either applies completely or leaves the cart untouched.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::Product;
use crate::validation::validate_quantity;
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY};

/// An item in the shopping cart.
///
/// Name and price are frozen when the item is first added, so a catalog
/// change mid-sale does not reprice lines already in the cart. `stock` is
/// frozen too and bounds later quantity changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub product_id: u32,
    pub barcode: String,
    pub name: String,
    pub unit_price_cents: i64,
    pub quantity: i64,
    pub stock: i64,
    #[ts(as = "String")]
    pub added_at: DateTime<Utc>,
}

impl CartItem {
    pub fn from_product(product: &Product, quantity: i64) -> Self {
        CartItem {
            product_id: product.id,
            barcode: product.barcode.clone(),
            name: product.name.clone(),
            unit_price_cents: product.price_cents,
            quantity,
            stock: product.stock,
            added_at: Utc::now(),
        }
    }

    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// Unit price × quantity.
    pub fn line_total(&self) -> Money {
        self.unit_price().multiply_quantity(self.quantity)
    }
}

/// The shopping cart.
///
/// ## Invariants
/// - Items are unique by `product_id` (adding the same product increases quantity)
/// - Quantity is always in 1..=MAX_ITEM_QUANTITY and never above the frozen stock
/// - At most MAX_CART_ITEMS unique items
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub items: Vec<CartItem>,
    pub created_at: DateTime<Utc>,
}

impl Cart {
    pub fn new() -> Self {
        Cart {
            items: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Adds `quantity` units of a product, merging with an existing line.
    ///
    /// ## Errors
    /// - `Validation` if `quantity` is not positive
    /// - `InsufficientStock` if the merged quantity exceeds stock
    /// - `QuantityTooLarge` if the merged quantity exceeds MAX_ITEM_QUANTITY
    /// - `CartTooLarge` if a new line would exceed MAX_CART_ITEMS
    pub fn add_product(&mut self, product: &Product, quantity: i64) -> CoreResult<&CartItem> {
        validate_quantity(quantity)?;

        if let Some(index) = self.position(product.id) {
            let item = &mut self.items[index];
            let new_qty = item.quantity + quantity;
            check_quantity(&item.name, new_qty, product.stock)?;
            item.quantity = new_qty;
            item.stock = product.stock;
            return Ok(&self.items[index]);
        }

        if self.items.len() >= MAX_CART_ITEMS {
            return Err(CoreError::CartTooLarge {
                max: MAX_CART_ITEMS,
            });
        }

        check_quantity(&product.name, quantity, product.stock)?;
        self.items.push(CartItem::from_product(product, quantity));
        Ok(&self.items[self.items.len() - 1])
    }

    /// Sets the quantity of a line. Zero removes it.
    pub fn update_quantity(&mut self, product_id: u32, quantity: i64) -> CoreResult<()> {
        if quantity == 0 {
            return self.remove_item(product_id);
        }

        validate_quantity(quantity)?;

        let item = self
            .items
            .iter_mut()
            .find(|i| i.product_id == product_id)
            .ok_or(CoreError::NotInCart(product_id))?;

        check_quantity(&item.name, quantity, item.stock)?;
        item.quantity = quantity;
        Ok(())
    }

    /// Changes a line's quantity by `delta`. A result below one is ignored,
    /// the way the +/- buttons never drop a line on their own.
    pub fn adjust_quantity(&mut self, product_id: u32, delta: i64) -> CoreResult<()> {
        let current = self
            .items
            .iter()
            .find(|i| i.product_id == product_id)
            .map(|i| i.quantity)
            .ok_or(CoreError::NotInCart(product_id))?;

        let target = current + delta;
        if target < 1 {
            return Ok(());
        }

        self.update_quantity(product_id, target)
    }

    pub fn remove_item(&mut self, product_id: u32) -> CoreResult<()> {
        let initial_len = self.items.len();
        self.items.retain(|i| i.product_id != product_id);

        if self.items.len() == initial_len {
            Err(CoreError::NotInCart(product_id))
        } else {
            Ok(())
        }
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.created_at = Utc::now();
    }

    pub fn quantity_of(&self, product_id: u32) -> i64 {
        self.items
            .iter()
            .find(|i| i.product_id == product_id)
            .map(|i| i.quantity)
            .unwrap_or(0)
    }

    /// Number of unique items.
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn total_quantity(&self) -> i64 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    pub fn total(&self) -> Money {
        self.items.iter().map(CartItem::line_total).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn position(&self, product_id: u32) -> Option<usize> {
        self.items.iter().position(|i| i.product_id == product_id)
    }
}

impl Default for Cart {
    fn default() -> Self {
        Self::new()
    }
}

fn check_quantity(name: &str, requested: i64, stock: i64) -> CoreResult<()> {
    if requested > MAX_ITEM_QUANTITY {
        return Err(CoreError::QuantityTooLarge {
            requested,
            max: MAX_ITEM_QUANTITY,
        });
    }

    if requested > stock {
        return Err(CoreError::InsufficientStock {
            name: name.to_string(),
            available: stock,
            requested,
        });
    }

    Ok(())
}

/// Cart totals summary for the UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartTotals {
    pub item_count: usize,
    pub total_quantity: i64,
    pub total_cents: i64,
}

impl From<&Cart> for CartTotals {
    fn from(cart: &Cart) -> Self {
        CartTotals {
            item_count: cart.item_count(),
            total_quantity: cart.total_quantity(),
            total_cents: cart.total().cents(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;

    fn test_product(id: u32, price_cents: i64, stock: i64) -> Product {
        Product {
            id,
            name: format!("Product {}", id),
            price_cents,
            category: "meat".to_string(),
            barcode: format!("880123456{:04}", id),
            stock,
        }
    }

    #[test]
    fn test_cart_add_product() {
        let mut cart = Cart::new();
        let product = test_product(1, 10363, 100);

        cart.add_product(&product, 3).unwrap();

        assert_eq!(cart.item_count(), 1);
        assert_eq!(cart.total_quantity(), 3);
        assert_eq!(cart.total().cents(), 31089);
    }

    #[test]
    fn test_cart_add_same_product_increases_quantity() {
        let mut cart = Cart::new();
        let product = test_product(1, 999, 100);

        cart.add_product(&product, 2).unwrap();
        let item = cart.add_product(&product, 3).unwrap();
        assert_eq!(item.quantity, 5);

        assert_eq!(cart.item_count(), 1);
        assert_eq!(cart.total_quantity(), 5);
    }

    #[test]
    fn test_cart_respects_stock() {
        let mut cart = Cart::new();
        let product = test_product(1, 500, 2);

        cart.add_product(&product, 2).unwrap();
        let err = cart.add_product(&product, 1).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InsufficientStock {
                available: 2,
                requested: 3,
                ..
            }
        ));
        // Untouched on failure
        assert_eq!(cart.quantity_of(1), 2);
    }

    #[test]
    fn test_cart_rejects_non_positive_quantity() {
        let mut cart = Cart::new();
        let product = test_product(1, 500, 10);
        assert!(matches!(
            cart.add_product(&product, 0),
            Err(CoreError::Validation(ValidationError::MustBePositive { .. }))
        ));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_cart_quantity_limit() {
        let mut cart = Cart::new();
        let product = test_product(1, 1, 5000);

        cart.add_product(&product, MAX_ITEM_QUANTITY).unwrap();
        assert!(matches!(
            cart.add_product(&product, 1),
            Err(CoreError::QuantityTooLarge { .. })
        ));
    }

    #[test]
    fn test_cart_item_limit() {
        let mut cart = Cart::new();
        for id in 0..MAX_CART_ITEMS as u32 {
            cart.add_product(&test_product(id, 100, 10), 1).unwrap();
        }
        let err = cart
            .add_product(&test_product(9999, 100, 10), 1)
            .unwrap_err();
        assert!(matches!(err, CoreError::CartTooLarge { max } if max == MAX_CART_ITEMS));
    }

    #[test]
    fn test_update_and_adjust_quantity() {
        let mut cart = Cart::new();
        cart.add_product(&test_product(1, 100, 10), 1).unwrap();

        cart.update_quantity(1, 4).unwrap();
        assert_eq!(cart.quantity_of(1), 4);

        cart.adjust_quantity(1, -3).unwrap();
        assert_eq!(cart.quantity_of(1), 1);

        // Never drops below one through the buttons
        cart.adjust_quantity(1, -1).unwrap();
        assert_eq!(cart.quantity_of(1), 1);

        assert!(cart.update_quantity(1, 11).is_err());
        assert!(matches!(cart.update_quantity(7, 1), Err(CoreError::NotInCart(7))));

        cart.update_quantity(1, 0).unwrap();
        assert!(cart.is_empty());
    }

    #[test]
    fn test_cart_remove_and_clear() {
        let mut cart = Cart::new();
        cart.add_product(&test_product(1, 100, 10), 1).unwrap();
        cart.add_product(&test_product(2, 100, 10), 1).unwrap();

        cart.remove_item(1).unwrap();
        assert!(cart.remove_item(1).is_err());
        assert_eq!(cart.item_count(), 1);

        cart.clear();
        assert!(cart.is_empty());
    }

    #[test]
    fn test_cart_totals() {
        let mut cart = Cart::new();
        cart.add_product(&test_product(1, 23000, 100), 2).unwrap();
        cart.add_product(&test_product(2, 8913, 100), 1).unwrap();

        let totals = CartTotals::from(&cart);
        assert_eq!(totals.item_count, 2);
        assert_eq!(totals.total_quantity, 3);
        assert_eq!(totals.total_cents, 54913);
    }
}
