//! Seed the database with a demo catalog.
//!
//! Reads a YAML catalog (the bundled `seed/catalog.yaml` unless `--file` is
//! given), validates it, then inserts the category tree parents-first and
//! the products after it. Slugs that already exist are skipped, so the
//! command can be re-run safely.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::{error, info};

use autocatalog_core::{CategoryId, Discount, ProductType};
use autocatalog_storefront::db::{CategoryRepository, ProductRepository, RepositoryError};
use autocatalog_storefront::models::category::{CategoryQuery, NewCategory};
use autocatalog_storefront::models::product::{NewProduct, ProductDetails};

/// The bundled demo catalog.
const DEMO_CATALOG: &str = include_str!("../../seed/catalog.yaml");

/// A catalog file.
#[derive(Debug, Deserialize)]
pub struct SeedCatalog {
    #[serde(default)]
    pub categories: Vec<SeedCategory>,
    #[serde(default)]
    pub products: Vec<SeedProduct>,
}

/// A category and its subcategories.
#[derive(Debug, Deserialize)]
pub struct SeedCategory {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub image: Option<String>,
    #[serde(default)]
    pub children: Vec<SeedCategory>,
}

/// A product, filed under a category slug.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedProduct {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub price: f64,
    pub discount: Option<Discount>,
    #[serde(default)]
    pub images: Vec<String>,
    pub product_type: ProductType,
    pub category: String,
    #[serde(default)]
    pub featured: bool,
    #[serde(flatten)]
    pub details: ProductDetails,
}

/// Counts reported after seeding.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub categories_created: usize,
    pub categories_skipped: usize,
    pub products_created: usize,
    pub products_skipped: usize,
}

/// Seed the catalog from `file`, or from the bundled demo data.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, fails validation,
/// or a database operation fails.
pub async fn catalog(file: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let content = match file {
        Some(path) => {
            if !Path::new(path).exists() {
                return Err(format!("File not found: {path}").into());
            }
            info!(path, "Loading catalog from file");
            tokio::fs::read_to_string(path).await?
        }
        None => DEMO_CATALOG.to_owned(),
    };

    let catalog: SeedCatalog = serde_yaml::from_str(&content)?;

    let errors = validate(&catalog);
    if !errors.is_empty() {
        error!("Catalog validation failed:");
        for err in &errors {
            error!("  - {err}");
        }
        return Err(format!("{} validation errors found", errors.len()).into());
    }

    let pool = super::connect().await?;
    let summary = seed(&pool, &catalog).await?;

    info!("Seeding complete!");
    info!(
        "  Categories: {} created, {} already present",
        summary.categories_created, summary.categories_skipped
    );
    info!(
        "  Products: {} created, {} already present",
        summary.products_created, summary.products_skipped
    );
    Ok(())
}

fn walk<'a>(categories: &'a [SeedCategory], out: &mut Vec<(&'a SeedCategory, Option<&'a str>)>) {
    fn go<'a>(
        category: &'a SeedCategory,
        parent: Option<&'a str>,
        out: &mut Vec<(&'a SeedCategory, Option<&'a str>)>,
    ) {
        out.push((category, parent));
        for child in &category.children {
            go(child, Some(category.slug.as_str()), out);
        }
    }
    for category in categories {
        go(category, None, out);
    }
}

/// Problems that would make the seed fail half-way.
fn validate(catalog: &SeedCatalog) -> Vec<String> {
    let mut errors = Vec::new();

    let mut categories = Vec::new();
    walk(&catalog.categories, &mut categories);

    let mut category_slugs = HashSet::new();
    for (category, _) in &categories {
        if category.name.trim().is_empty() || category.slug.trim().is_empty() {
            errors.push(format!("category '{}' needs a name and a slug", category.slug));
        }
        if !category_slugs.insert(category.slug.as_str()) {
            errors.push(format!("duplicate category slug '{}'", category.slug));
        }
    }

    let mut product_slugs = HashSet::new();
    for product in &catalog.products {
        if !product_slugs.insert(product.slug.as_str()) {
            errors.push(format!("duplicate product slug '{}'", product.slug));
        }
        if !product.price.is_finite() || product.price < 0.0 {
            errors.push(format!("product '{}' has an invalid price", product.slug));
        }
        if !category_slugs.contains(product.category.as_str()) {
            errors.push(format!(
                "product '{}' refers to unknown category '{}'",
                product.slug, product.category
            ));
        }
    }

    errors
}

/// Insert whatever part of `catalog` is not in the database yet.
async fn seed(pool: &SqlitePool, catalog: &SeedCatalog) -> Result<SeedSummary, RepositoryError> {
    let mut summary = SeedSummary::default();

    let category_repo = CategoryRepository::new(pool);
    let mut ids: HashMap<String, CategoryId> = category_repo
        .list(&CategoryQuery::default())
        .await?
        .into_iter()
        .map(|detail| (detail.category.slug, detail.category.id))
        .collect();

    let mut categories = Vec::new();
    walk(&catalog.categories, &mut categories);

    for (category, parent) in categories {
        if ids.contains_key(&category.slug) {
            summary.categories_skipped += 1;
            continue;
        }
        let created = category_repo
            .create(&NewCategory {
                name: category.name.clone(),
                slug: category.slug.clone(),
                description: category.description.clone(),
                image: category.image.clone(),
                parent_id: parent.and_then(|slug| ids.get(slug).cloned()),
            })
            .await?;
        ids.insert(created.slug, created.id);
        summary.categories_created += 1;
    }

    let product_repo = ProductRepository::new(pool);
    for product in &catalog.products {
        let Some(category_id) = ids.get(&product.category) else {
            return Err(RepositoryError::ForeignKey(product.category.clone()));
        };
        let input = NewProduct {
            name: product.name.clone(),
            slug: product.slug.clone(),
            description: product.description.clone(),
            price: product.price,
            discount: product.discount.unwrap_or(Discount::NONE),
            images: product.images.clone(),
            details: product.details.clone(),
            product_type: product.product_type,
            category_id: category_id.clone(),
            is_active: true,
            featured: product.featured,
        };
        match product_repo.create(&input).await {
            Ok(created) => {
                info!(slug = %created.slug, "Product created");
                summary.products_created += 1;
            }
            Err(RepositoryError::Conflict(_)) => summary.products_skipped += 1,
            Err(e) => return Err(e),
        }
    }

    Ok(summary)
}
