//! # Product Catalog
//!
//! Barcode → product lookup for the storefront.
//!
//! ## Lookup Flow
//! ```text
//! accepted scan "8801234567817"
//!      │
//!      ▼
//! Catalog::find_by_barcode ──► Some(Garlic (Per kg), ₱103.63)
//!      │
//!      └── None ──► CoreError::UnknownBarcode ──► warning toast
//! ```
//!
//! Lookups are exact string matches on the trimmed code. The catalog is
//! immutable once built; stock is tracked by the cart, not here.

use std::collections::HashMap;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::types::Product;
use crate::validation::{validate_barcode, validate_price_cents, validate_product_name};

/// An indexed, read-only product list.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    products: Vec<Product>,
    by_barcode: HashMap<String, usize>,
}

impl Catalog {
    /// Builds a catalog, validating every product.
    ///
    /// ## Errors
    /// - Invalid name, price or barcode shape
    /// - Two products sharing a barcode or an id
    pub fn from_products(products: Vec<Product>) -> CoreResult<Self> {
        let mut by_barcode = HashMap::with_capacity(products.len());
        let mut seen_ids = HashMap::with_capacity(products.len());

        for (index, product) in products.iter().enumerate() {
            validate_product_name(&product.name)?;
            validate_price_cents(product.price_cents)?;
            validate_barcode(&product.barcode)?;

            if seen_ids.insert(product.id, index).is_some() {
                return Err(ValidationError::Duplicate {
                    field: "product id".to_string(),
                    value: product.id.to_string(),
                }
                .into());
            }

            let key = product.barcode.trim().to_string();
            if by_barcode.insert(key, index).is_some() {
                return Err(ValidationError::Duplicate {
                    field: "barcode".to_string(),
                    value: product.barcode.clone(),
                }
                .into());
            }
        }

        Ok(Catalog {
            products,
            by_barcode,
        })
    }

    /// The storefront's built-in product list.
    pub fn seeded() -> Self {
        let products = SEED
            .iter()
            .map(|&(id, name, price_cents, category, barcode)| Product {
                id,
                name: name.to_string(),
                price_cents,
                category: category.to_string(),
                barcode: barcode.to_string(),
                stock: SEED_STOCK,
            })
            .collect::<Vec<_>>();

        let by_barcode = products
            .iter()
            .enumerate()
            .map(|(index, product)| (product.barcode.clone(), index))
            .collect();

        Catalog {
            products,
            by_barcode,
        }
    }

    /// Finds the product printed with `code`.
    pub fn find_by_barcode(&self, code: &str) -> Option<&Product> {
        self.by_barcode
            .get(code.trim())
            .and_then(|&index| self.products.get(index))
    }

    /// Like [`Catalog::find_by_barcode`] but reports a miss as an error.
    pub fn require_barcode(&self, code: &str) -> CoreResult<&Product> {
        self.find_by_barcode(code)
            .ok_or_else(|| CoreError::UnknownBarcode(code.trim().to_string()))
    }

    pub fn find_by_id(&self, id: u32) -> Option<&Product> {
        self.products.iter().find(|product| product.id == id)
    }

    /// Products in one category, in catalog order.
    pub fn by_category<'a>(&'a self, category: &'a str) -> impl Iterator<Item = &'a Product> + 'a {
        self.products
            .iter()
            .filter(move |product| product.category == category)
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

// =============================================================================
// Seed Data
// =============================================================================

const SEED_STOCK: i64 = 100;

/// (id, name, price in centavos, category, barcode)
const SEED: [(u32, &str, i64, &str, &str); 26] = [
    (1, "Liempo (Per kg)", 23000, "meat", "8801234567891"),
    (2, "Lechon Roll (Per kg)", 20000, "meat", "8801234567892"),
    (3, "Bacon (Per kg)", 21500, "meat", "8801234567893"),
    (4, "Chicken Drumsticks (Per kg)", 18000, "meat", "8801234567894"),
    (5, "Chicken Wings (Per kg)", 12000, "meat", "8801234567895"),
    (6, "Papaitan Regular (Per kg)", 26500, "meat", "8801234567896"),
    (7, "Camto Ribs (Per kg)", 38000, "meat", "8801234567897"),
    (8, "Giniling na Baka (Per kg)", 44000, "meat", "8801234567898"),
    (9, "Bulalo (Per kg)", 38000, "meat", "8801234567899"),
    (10, "Pork Adobo Cut (Per kg)", 35500, "meat", "8801234567810"),
    (11, "Roundsteak (Per kg)", 44000, "meat", "8801234567811"),
    (12, "Buto-buto (Per kg)", 29000, "meat", "8801234567812"),
    (13, "Eggplant (Per kg)", 4000, "vegetable", "8801234567813"),
    (14, "Carrots (Per kg)", 8000, "vegetable", "8801234567814"),
    (15, "Sayote (Per kg)", 5000, "vegetable", "8801234567815"),
    (16, "Potatoes (Per kg)", 8000, "vegetable", "8801234567816"),
    (17, "Garlic (Per kg)", 10363, "vegetable", "8801234567817"),
    (18, "Onion (Per kg)", 8913, "vegetable", "8801234567818"),
    (19, "Okra (Per kg)", 7000, "vegetable", "8801234567819"),
    (20, "Luya (Per kg)", 20000, "vegetable", "8801234567820"),
    (21, "Green ice lettuce (Per kg)", 1600, "vegetable", "8801234567821"),
    (22, "Celery", 800, "vegetable", "8801234567822"),
    (23, "Bell pepper (Per kg)", 5000, "vegetable", "8801234567823"),
    (24, "Siling labuyo (Per kg)", 28000, "vegetable", "8801234567824"),
    (25, "Ampalaya (Per kg)", 10000, "vegetable", "8801234567825"),
    (26, "Japanese cucumber (Per kg)", 5500, "vegetable", "8801234567826"),
];

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: u32, barcode: &str) -> Product {
        Product {
            id,
            name: format!("Product {}", id),
            price_cents: 1000,
            category: "meat".to_string(),
            barcode: barcode.to_string(),
            stock: 10,
        }
    }

    #[test]
    fn test_seeded_catalog_lookup() {
        let catalog = Catalog::seeded();
        assert_eq!(catalog.len(), 26);

        let garlic = catalog.find_by_barcode("8801234567817").unwrap();
        assert_eq!(garlic.name, "Garlic (Per kg)");
        assert_eq!(garlic.price().to_string(), "₱103.63");

        assert!(catalog.find_by_barcode("0000000000000").is_none());
    }

    #[test]
    fn test_seeded_catalog_passes_validation() {
        let seeded = Catalog::seeded();
        let rebuilt = Catalog::from_products(seeded.products().to_vec()).unwrap();
        assert_eq!(rebuilt.len(), seeded.len());
    }

    #[test]
    fn test_lookup_trims_whitespace() {
        let catalog = Catalog::seeded();
        assert_eq!(catalog.find_by_barcode(" 8801234567891\n").unwrap().id, 1);
    }

    #[test]
    fn test_require_barcode_reports_unknown() {
        let catalog = Catalog::seeded();
        let err = catalog.require_barcode("123").unwrap_err();
        assert!(matches!(err, CoreError::UnknownBarcode(code) if code == "123"));
    }

    #[test]
    fn test_duplicate_barcode_rejected() {
        let result = Catalog::from_products(vec![product(1, "111"), product(2, "111")]);
        assert!(matches!(
            result,
            Err(CoreError::Validation(ValidationError::Duplicate { .. }))
        ));
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let result = Catalog::from_products(vec![product(1, "111"), product(1, "222")]);
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_product_rejected() {
        let mut bad = product(1, "111");
        bad.price_cents = -5;
        assert!(Catalog::from_products(vec![bad]).is_err());

        assert!(Catalog::from_products(vec![product(1, "")]).is_err());
    }

    #[test]
    fn test_by_category() {
        let catalog = Catalog::seeded();
        assert_eq!(catalog.by_category("meat").count(), 12);
        assert_eq!(catalog.by_category("vegetable").count(), 14);
        assert_eq!(catalog.find_by_id(22).unwrap().name, "Celery");
    }
}
