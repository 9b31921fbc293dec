//! Seed the catalog with demo groups and products.
//!
//! The data lives in `seed.yaml` next to this module and is embedded in the
//! binary, so the command works from any directory. Seeding is skipped when
//! the catalog already has groups, making it safe to run repeatedly.

use rust_decimal::Decimal;
use secrecy::SecretString;
use serde::Deserialize;
use tracing::info;

use curio_api::db::{self, GroupRepository, NewProduct, ProductRepository};

static SEED_YAML: &str = include_str!("seed.yaml");

#[derive(Debug, Deserialize)]
struct SeedConfig {
    groups: Vec<SeedGroup>,
}

#[derive(Debug, Deserialize)]
struct SeedGroup {
    name: String,
    logo_image_url: Option<String>,
    #[serde(default)]
    products: Vec<SeedProduct>,
}

#[derive(Debug, Deserialize)]
struct SeedProduct {
    name: String,
    version: Option<String>,
    description: Option<String>,
    // Quoted in the YAML so the decimal parses exactly
    price: Decimal,
    image_url: Option<String>,
    stock_quantity: i64,
}

/// Seed the catalog from the embedded YAML.
///
/// # Errors
///
/// Returns an error if the database URL is missing, the YAML is malformed,
/// or a database operation fails.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let database_url = std::env::var("CURIO_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| "CURIO_DATABASE_URL not set")?;

    let config: SeedConfig = serde_yaml::from_str(SEED_YAML)?;
    info!(groups = config.groups.len(), "Parsed seed configuration");

    let pool = db::create_pool(&database_url).await?;
    info!("Connected to database");

    let groups = GroupRepository::new(&pool);
    if !groups.list().await?.is_empty() {
        info!("Catalog already has groups, skipping seed");
        return Ok(());
    }

    let products = ProductRepository::new(&pool);
    let mut product_count = 0_usize;

    for seed_group in &config.groups {
        let group = groups
            .create(&seed_group.name, seed_group.logo_image_url.as_deref())
            .await?;

        for seed_product in &seed_group.products {
            products
                .create(NewProduct {
                    name: &seed_product.name,
                    group_id: Some(group.id),
                    version: seed_product.version.as_deref(),
                    description: seed_product.description.as_deref(),
                    price: seed_product.price,
                    image_url: seed_product.image_url.as_deref(),
                    stock_quantity: seed_product.stock_quantity,
                })
                .await?;
            product_count += 1;
        }
    }

    info!("Seeding complete!");
    info!("  Groups inserted: {}", config.groups.len());
    info!("  Products inserted: {product_count}");

    Ok(())
}
