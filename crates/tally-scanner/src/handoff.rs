//! # Cart Hand-off
//!
//! Turns accepted scans into cart lines.
//!
//! ```text
//! on_barcode_detected("8801234567891")
//!      │
//!      ├── catalog.find_by_barcode ── none ──► warning "Unknown barcode"
//!      │
//!      └── cart.add_product(product, 1) ── err ──► warning "Cannot add item"
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tally_core::{Cart, CartTotals, Catalog, CoreError};
use tracing::{info, warn};

use crate::feedback::{Notification, ScanHandler};
use crate::platform::FeedbackSink;

/// Adds one unit of the scanned product to a shared cart.
#[derive(Clone)]
pub struct CartHandoff {
    catalog: Arc<Catalog>,
    cart: Arc<Mutex<Cart>>,
    sink: Arc<dyn FeedbackSink>,
}

impl CartHandoff {
    pub fn new(catalog: Arc<Catalog>, sink: Arc<dyn FeedbackSink>) -> Self {
        CartHandoff {
            catalog,
            cart: Arc::new(Mutex::new(Cart::new())),
            sink,
        }
    }

    /// Executes a function with read access to the cart.
    pub fn with_cart<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&Cart) -> R,
    {
        f(&self.lock())
    }

    /// Executes a function with write access to the cart.
    pub fn with_cart_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut Cart) -> R,
    {
        f(&mut self.lock())
    }

    pub fn totals(&self) -> CartTotals {
        self.with_cart(|cart| CartTotals::from(cart))
    }

    fn lock(&self) -> MutexGuard<'_, Cart> {
        self.cart.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn add_scanned(&self, code: &str) -> Result<(), CoreError> {
        let product = self.catalog.require_barcode(code)?;
        let quantity = self.with_cart_mut(|cart| {
            cart.add_product(product, 1).map(|item| item.quantity)
        })?;

        info!(barcode = %code, product_id = product.id, quantity, "Scanned item added to cart");
        Ok(())
    }
}

impl ScanHandler for CartHandoff {
    fn on_barcode_detected(&self, code: &str) {
        if let Err(e) = self.add_scanned(code) {
            warn!(barcode = %code, error = %e, "Scan not added to cart");
            let notification = match e {
                CoreError::UnknownBarcode(_) => Notification::warning(
                    "Unknown barcode",
                    format!("No product found for code {}", code),
                ),
                other => Notification::warning("Cannot add item", other.to_string()),
            };
            self.sink.notify(&notification);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::RecordingFeedback;
    use tally_core::Product;

    fn handoff(catalog: Catalog) -> (CartHandoff, Arc<RecordingFeedback>) {
        let sink = Arc::new(RecordingFeedback::new());
        (CartHandoff::new(Arc::new(catalog), sink.clone()), sink)
    }

    #[test]
    fn test_scan_adds_one_unit() {
        let (handoff, sink) = handoff(Catalog::seeded());

        handoff.on_barcode_detected("8801234567891");
        handoff.on_barcode_detected("8801234567891");
        handoff.on_barcode_detected("8801234567893");

        let totals = handoff.totals();
        assert_eq!(totals.item_count, 2);
        assert_eq!(totals.total_quantity, 3);
        assert_eq!(totals.total_cents, 23000 * 2 + 21500);
        assert!(sink.notifications().is_empty());
    }

    #[test]
    fn test_unknown_barcode_warns() {
        let (handoff, sink) = handoff(Catalog::seeded());

        handoff.on_barcode_detected("0000000000000");

        assert!(handoff.with_cart(|cart| cart.is_empty()));
        assert_eq!(sink.titles(), vec!["Unknown barcode".to_string()]);
    }

    #[test]
    fn test_out_of_stock_warns() {
        let catalog = Catalog::from_products(vec![Product {
            id: 1,
            name: "Bacon (Per kg)".to_string(),
            price_cents: 21500,
            category: "meat".to_string(),
            barcode: "8801234567893".to_string(),
            stock: 1,
        }])
        .unwrap();
        let (handoff, sink) = handoff(catalog);

        handoff.on_barcode_detected("8801234567893");
        handoff.on_barcode_detected("8801234567893");

        assert_eq!(handoff.with_cart(|cart| cart.quantity_of(1)), 1);
        let notes = sink.notifications();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].title, "Cannot add item");
        assert!(notes[0].description.contains("Insufficient stock"));
    }
}
