//! Seed the catalog from a YAML file.
//!
//! Each entry is created through the admin dashboard service, so the same
//! validation and image upload apply as for the inventory form. Runs against
//! whatever backend the storefront environment selects.
//!
//! ```yaml
//! products:
//!   - name: Silk Kurta
//!     price: 4500
//!     category: Men
//!     sizes: [S, M, L]
//!     image: images/silk-kurta.jpg   # relative to the YAML file
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{error, info};

use thread_hanger_core::{Category, Price, Size};
use thread_hanger_storefront::config::StorefrontConfig;
use thread_hanger_storefront::dashboard::{AdminDashboard, ImageUpload, ProductForm};
use thread_hanger_storefront::store::Backends;

/// Top-level seed file.
#[derive(Debug, Deserialize)]
pub struct CatalogSeed {
    pub products: Vec<SeedProduct>,
}

/// One product to create.
#[derive(Debug, Deserialize)]
pub struct SeedProduct {
    pub name: String,
    pub price: Price,
    pub category: Category,
    pub sizes: Vec<Size>,
    pub image: PathBuf,
}

impl SeedProduct {
    fn form(&self) -> ProductForm {
        ProductForm {
            name: self.name.clone(),
            price: self.price.units().to_string(),
            category: self.category,
            sizes: self.sizes.clone(),
        }
    }
}

/// Guess an image MIME type from its extension.
fn content_type(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        _ => "application/octet-stream",
    }
}

/// Create every product in `file`.
///
/// Entries are independent: a failing entry is logged and the rest still
/// run. Returns an error when any entry failed.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, the backend cannot
/// be reached, or any product could not be created.
pub async fn catalog(file: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let content = tokio::fs::read_to_string(file)
        .await
        .map_err(|e| format!("File not found: {}: {e}", file.display()))?;
    let seed: CatalogSeed = serde_yaml::from_str(&content)?;
    info!(path = %file.display(), products = seed.products.len(), "Parsed catalog");

    let config = StorefrontConfig::from_env()?;
    let backends = Backends::connect(&config).await?;
    let dashboard = AdminDashboard::new(
        backends.catalog.clone(),
        backends.orders.clone(),
        backends.assets.clone(),
    );

    let base_dir = file.parent().unwrap_or_else(|| Path::new("."));
    let mut failed = 0_usize;

    for entry in &seed.products {
        let image_path = base_dir.join(&entry.image);
        let image = match tokio::fs::read(&image_path).await {
            Ok(bytes) => ImageUpload {
                filename: entry
                    .image
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default(),
                content_type: content_type(&image_path).to_owned(),
                bytes,
            },
            Err(e) => {
                error!(product = %entry.name, path = %image_path.display(), error = %e, "Image unreadable");
                failed += 1;
                continue;
            }
        };

        let now_ms = chrono::Utc::now().timestamp_millis();
        match dashboard.create_product(entry.form(), Some(image), now_ms).await {
            Ok(product) => info!(id = %product.product_id, name = %product.name, "Created product"),
            Err(e) => {
                error!(product = %entry.name, error = %e, "Could not create product");
                failed += 1;
            }
        }
    }

    info!(
        created = seed.products.len() - failed,
        failed, "Seeding complete"
    );

    if failed > 0 {
        return Err(format!("{failed} products failed").into());
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_seed_file() {
        let seed: CatalogSeed = serde_yaml::from_str(
            r"
products:
  - name: Silk Kurta
    price: 4500
    category: Men
    sizes: [M, L]
    image: images/kurta.jpg
  - name: Lawn Suit
    price: '3200'
    category: Women
    sizes: [S]
    image: lawn.png
",
        )
        .unwrap();

        assert_eq!(seed.products.len(), 2);
        assert_eq!(seed.products[0].price, Price::new(4500));
        assert_eq!(seed.products[1].price, Price::new(3200));
        assert_eq!(seed.products[1].category, Category::Women);

        let form = seed.products[0].form();
        assert_eq!(form.price, "4500");
        assert_eq!(form.sizes, vec![Size::M, Size::L]);
    }

    #[test]
    fn test_content_type_from_extension() {
        assert_eq!(content_type(Path::new("a/b.JPG")), "image/jpeg");
        assert_eq!(content_type(Path::new("b.webp")), "image/webp");
        assert_eq!(content_type(Path::new("noext")), "application/octet-stream");
    }
}
