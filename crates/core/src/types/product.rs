//! Product rows.

use serde::{Deserialize, Serialize};

use super::catalog::{Category, SizeSet};
use super::form::FormError;
use super::id::ProductId;
use super::price::Price;

/// A product row as returned by the catalog store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub product_id: ProductId,
    pub name: String,
    pub price: Price,
    pub category: Category,
    pub sizes: SizeSet,
    pub image_url: String,
}

/// A product row before the store assigns its id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub price: Price,
    pub category: Category,
    pub sizes: SizeSet,
    pub image_url: String,
}

impl NewProduct {
    /// Build a row, trimming the name.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::Blank`] if the name is empty after trimming.
    pub fn new(
        name: &str,
        price: Price,
        category: Category,
        sizes: SizeSet,
        image_url: impl Into<String>,
    ) -> Result<Self, FormError> {
        let name = FormError::require("name", name)?;
        Ok(Self {
            name,
            price,
            category,
            sizes,
            image_url: image_url.into(),
        })
    }

    /// Attach the id the store assigned.
    #[must_use]
    pub fn into_product(self, product_id: ProductId) -> Product {
        Product {
            product_id,
            name: self.name,
            price: self.price,
            category: self.category,
            sizes: self.sizes,
            image_url: self.image_url,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::catalog::Size;

    #[test]
    fn test_new_product_requires_name() {
        let sizes = SizeSet::new([Size::M]).unwrap();
        let err = NewProduct::new("   ", Price::new(10), Category::Men, sizes, "x").unwrap_err();
        assert_eq!(err, FormError::Blank("name"));
    }

    #[test]
    fn test_product_row_shape() {
        let json = r#"{
            "product_id": 3,
            "name": "Linen Kurta",
            "price": 4500,
            "category": "Men",
            "sizes": ["M", "S"],
            "image_url": "https://cdn.example/kurta.jpg"
        }"#;
        let product: Product = serde_json::from_str(json).unwrap();
        assert_eq!(product.product_id, ProductId::new(3));
        assert_eq!(product.sizes.as_slice(), &[Size::S, Size::M]);
        assert_eq!(product.price.display_with_currency(), "PKR 4,500");
    }
}
