//! Public category listing.

use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;
use tracing::instrument;

use autocatalog_core::CategoryId;

use crate::db::CategoryRepository;
use crate::error::Result;
use crate::models::category::{CategoryDetail, CategoryQuery};
use crate::state::AppState;

/// `?parentId=&includeProducts=` shared by the public and admin lists.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryListQuery {
    pub parent_id: Option<String>,
    pub include_products: Option<String>,
}

impl CategoryListQuery {
    /// Repository query; `active_only` restricts counts and products to the
    /// public catalog.
    #[must_use]
    pub fn into_query(self, active_only: bool) -> CategoryQuery {
        CategoryQuery {
            parent_id: self
                .parent_id
                .filter(|id| !id.is_empty())
                .map(CategoryId::new),
            include_products: self.include_products.as_deref() == Some("true"),
            active_only,
        }
    }
}

/// List categories with parent, children and active product counts.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<CategoryListQuery>,
) -> Result<Json<Vec<CategoryDetail>>> {
    let categories = CategoryRepository::new(state.pool())
        .list(&query.into_query(true))
        .await?;
    Ok(Json(categories))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_flags() {
        let query = CategoryListQuery {
            parent_id: Some(String::new()),
            include_products: Some("true".to_owned()),
        }
        .into_query(true);
        assert!(query.parent_id.is_none());
        assert!(query.include_products);

        let query = CategoryListQuery {
            parent_id: Some("cat-1".to_owned()),
            include_products: Some("1".to_owned()),
        }
        .into_query(false);
        assert_eq!(query.parent_id, Some(CategoryId::new("cat-1")));
        assert!(!query.include_products);
    }
}
