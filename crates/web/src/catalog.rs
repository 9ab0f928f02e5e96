//! Product catalog.
//!
//! The backend has no product endpoint; the catalog ships with the shell as a
//! JSON file and is loaded once at startup.

use std::path::Path;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use gamekart_core::{LineItem, ProductId};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("catalog lists product {0} more than once")]
    DuplicateProduct(ProductId),
    #[error("product {0} has no colour or size variants")]
    NoVariants(ProductId),
    #[error("product not found: {0}")]
    NotFound(ProductId),
    #[error("{0} is out of stock")]
    OutOfStock(String),
    #[error("{product} is not available in colour {color}")]
    UnknownColor { product: String, color: String },
    #[error("{product} is not available in size {size}")]
    UnknownSize { product: String, size: String },
    #[error("quantity must be at least 1")]
    InvalidQuantity,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variants {
    pub colors: Vec<String>,
    pub sizes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_price: Option<Decimal>,
    pub image: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub description: String,
    pub variants: Variants,
    pub in_stock: bool,
}

/// All products, in display order.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    products: Vec<Product>,
}

impl Catalog {
    /// Load the catalog from a JSON array of products.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if a product
    /// is listed twice or has no variants to choose from.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    /// # Errors
    ///
    /// See [`Catalog::load`].
    pub fn from_json(raw: &str) -> Result<Self, CatalogError> {
        let products: Vec<Product> = serde_json::from_str(raw)?;
        Self::new(products)
    }

    /// # Errors
    ///
    /// See [`Catalog::load`].
    pub fn new(products: Vec<Product>) -> Result<Self, CatalogError> {
        for (index, product) in products.iter().enumerate() {
            if products.iter().take(index).any(|p| p.id == product.id) {
                return Err(CatalogError::DuplicateProduct(product.id.clone()));
            }
            if product.variants.colors.is_empty() || product.variants.sizes.is_empty() {
                return Err(CatalogError::NoVariants(product.id.clone()));
            }
        }
        Ok(Self { products })
    }

    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.products.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// # Errors
    ///
    /// Returns [`CatalogError::NotFound`] for an unknown id.
    pub fn get(&self, id: &ProductId) -> Result<&Product, CatalogError> {
        self.products
            .iter()
            .find(|product| &product.id == id)
            .ok_or_else(|| CatalogError::NotFound(id.clone()))
    }

    /// Build a cart line for a product variant.
    ///
    /// Omitted colour or size default to the first listed variant.
    ///
    /// # Errors
    ///
    /// Unknown products, out-of-stock products, variants the product does not
    /// come in and zero quantities are rejected.
    pub fn line_item(
        &self,
        id: &ProductId,
        color: Option<&str>,
        size: Option<&str>,
        quantity: u32,
    ) -> Result<LineItem, CatalogError> {
        let product = self.get(id)?;
        if !product.in_stock {
            return Err(CatalogError::OutOfStock(product.name.clone()));
        }
        if quantity == 0 {
            return Err(CatalogError::InvalidQuantity);
        }

        let color = pick_variant(&product.variants.colors, color).ok_or_else(|| {
            CatalogError::UnknownColor {
                product: product.name.clone(),
                color: color.unwrap_or_default().to_string(),
            }
        })?;
        let size = pick_variant(&product.variants.sizes, size).ok_or_else(|| {
            CatalogError::UnknownSize {
                product: product.name.clone(),
                size: size.unwrap_or_default().to_string(),
            }
        })?;

        Ok(LineItem {
            product_id: product.id.clone(),
            name: product.name.clone(),
            color: color.to_string(),
            size: size.to_string(),
            unit_price: product.price,
            quantity,
            image: Some(product.image.clone()),
        })
    }
}

fn pick_variant<'a>(options: &'a [String], requested: Option<&str>) -> Option<&'a str> {
    match requested.map(str::trim).filter(|s| !s.is_empty()) {
        Some(wanted) => options
            .iter()
            .find(|option| option.as_str() == wanted)
            .map(String::as_str),
        None => options.first().map(String::as_str),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use super::*;

    const SAMPLE: &str = r#"[
        {"id": "playstation-5", "name": "PlayStation 5", "price": "41650.00",
         "image": "ps5.jpg", "variants": {"colors": ["White", "Black"],
         "sizes": ["Standard Edition", "Digital Edition"]}, "inStock": true},
        {"id": "wireless-controller", "name": "Wireless Controller", "price": 4999,
         "image": "pad.jpg", "variants": {"colors": ["Black"], "sizes": ["Standard"]},
         "inStock": false}
    ]"#;

    fn catalog() -> Catalog {
        Catalog::from_json(SAMPLE).unwrap()
    }

    #[test]
    fn test_bundled_catalog_parses() {
        let raw = include_str!("../catalog.json");
        let catalog = Catalog::from_json(raw).unwrap();
        assert_eq!(catalog.len(), 5);
        assert!(catalog.get(&ProductId::new("playstation-5")).is_ok());
    }

    #[test]
    fn test_line_item_defaults_to_first_variant() {
        let item = catalog()
            .line_item(&ProductId::new("playstation-5"), None, Some(" "), 1)
            .unwrap();
        assert_eq!(item.color, "White");
        assert_eq!(item.size, "Standard Edition");
        assert_eq!(item.unit_price, Decimal::from_str("41650").unwrap());
        assert_eq!(item.image.as_deref(), Some("ps5.jpg"));
    }

    #[test]
    fn test_line_item_uses_requested_variant() {
        let item = catalog()
            .line_item(
                &ProductId::new("playstation-5"),
                Some("Black"),
                Some("Digital Edition"),
                2,
            )
            .unwrap();
        assert_eq!(item.color, "Black");
        assert_eq!(item.size, "Digital Edition");
        assert_eq!(item.quantity, 2);
    }

    #[test]
    fn test_line_item_rejections() {
        let catalog = catalog();
        let ps5 = ProductId::new("playstation-5");

        assert!(matches!(
            catalog.line_item(&ProductId::new("n64"), None, None, 1),
            Err(CatalogError::NotFound(_))
        ));
        assert!(matches!(
            catalog.line_item(&ProductId::new("wireless-controller"), None, None, 1),
            Err(CatalogError::OutOfStock(_))
        ));
        assert!(matches!(
            catalog.line_item(&ps5, Some("Gold"), None, 1),
            Err(CatalogError::UnknownColor { .. })
        ));
        assert!(matches!(
            catalog.line_item(&ps5, None, Some("Pro"), 1),
            Err(CatalogError::UnknownSize { .. })
        ));
        assert!(matches!(
            catalog.line_item(&ps5, None, None, 0),
            Err(CatalogError::InvalidQuantity)
        ));
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let mut products = catalog().products().to_vec();
        products.push(products[0].clone());
        assert!(matches!(
            Catalog::new(products),
            Err(CatalogError::DuplicateProduct(_))
        ));
    }
}
