//! Seed the database with demo data.
//!
//! Writes the delivery settings, one category and a product for each stock
//! model. Products are only inserted into an empty catalog, so running the
//! command twice does not duplicate them.

use atelier_core::Money;
use atelier_core::pricing::{DeliveryPolicy, PricingError};
use atelier_core::stock::SizeStock;
use atelier_server::db::RepositoryError;
use atelier_server::db::categories::CategoryRepository;
use atelier_server::db::products::ProductRepository;
use atelier_server::db::settings::SettingsRepository;
use atelier_server::models::ProductDraft;
use thiserror::Error;

use super::ConnectError;

const CATEGORY: &str = "Dresses";

/// 1x1 transparent PNG used as the placeholder for every demo image.
const PLACEHOLDER_PNG: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F,
    0x15, 0xC4, 0x89, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x00,
    0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00, 0x00, 0x00, 0x00, 0x49,
    0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
];

#[derive(Debug, Error)]
pub enum SeedError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error("Invalid delivery settings: {0}")]
    Settings(#[from] PricingError),

    #[error("Database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Insert the demo settings, category and products.
pub async fn demo() -> Result<(), SeedError> {
    let pool = super::connect().await?;

    let policy = DeliveryPolicy::new(Some(Money::from_units(5000)), Money::from_units(250))?;
    SettingsRepository::new(&pool).save(&policy).await?;
    tracing::info!(
        delivery_fee = %policy.delivery_fee,
        "Delivery settings saved"
    );

    match CategoryRepository::new(&pool)
        .create(CATEGORY, PLACEHOLDER_PNG)
        .await
    {
        Ok(category) => tracing::info!(id = %category.id, "Category {CATEGORY} created"),
        Err(RepositoryError::Conflict(_)) => {
            tracing::info!("Category {CATEGORY} already exists, skipping");
        }
        Err(e) => return Err(e.into()),
    }

    let products = ProductRepository::new(&pool);
    if !products.list().await?.is_empty() {
        tracing::info!("Catalog is not empty, skipping demo products");
        return Ok(());
    }

    for (draft, featured) in demo_products() {
        let product = products.create(&draft, featured).await?;
        tracing::info!(id = %product.id, title = %product.title, featured, "Product created");
    }

    tracing::info!("Seeding complete!");
    Ok(())
}

fn demo_products() -> Vec<(ProductDraft, bool)> {
    vec![
        (
            ProductDraft {
                category: CATEGORY.to_owned(),
                title: "Linen Wrap Dress".to_owned(),
                price: Money::from_units(4500),
                description: "Relaxed wrap dress in washed linen.".to_owned(),
                design_details: "Tie waist, side pockets, midi length.".to_owned(),
                sizes: vec![
                    SizeStock::new("S", 4),
                    SizeStock::new("M", 6),
                    SizeStock::new("L", 2),
                ],
                stock: 0,
                images: vec![PLACEHOLDER_PNG.to_vec()],
            },
            true,
        ),
        (
            ProductDraft {
                category: CATEGORY.to_owned(),
                title: "Embroidered Silk Dupatta".to_owned(),
                price: Money::from_units(2200),
                description: "Hand-finished silk dupatta.".to_owned(),
                design_details: "One size, tassel edging.".to_owned(),
                sizes: Vec::new(),
                stock: 10,
                images: vec![PLACEHOLDER_PNG.to_vec()],
            },
            false,
        ),
    ]
}
