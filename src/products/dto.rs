use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::{error::ProductError, repo_types::Product};

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddProductRequest {
    pub product_id: Option<i64>,
    pub name: Option<String>,
    pub stock: Option<i64>,
}

/// Checked form of `AddProductRequest`.
#[derive(Debug)]
pub struct NewProduct {
    pub product_id: i64,
    pub name: String,
    pub stock: i64,
}

impl TryFrom<AddProductRequest> for NewProduct {
    type Error = ProductError;

    fn try_from(req: AddProductRequest) -> Result<Self, Self::Error> {
        let product_id = req
            .product_id
            .ok_or_else(|| ProductError::Validation("Product ID must be an integer".into()))?;
        let name = req
            .name
            .filter(|n| !n.trim().is_empty())
            .ok_or_else(|| ProductError::Validation("Product name must be a string".into()))?;
        let stock = req
            .stock
            .ok_or_else(|| ProductError::Validation("Stock must be an integer".into()))?;
        Ok(Self {
            product_id,
            name,
            stock,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddProductResponse {
    pub id: i64,
    pub product_id: i64,
}

/// Query string is parsed leniently: junk or non-positive values fall back to defaults.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct Pagination {
    pub page: Option<String>,
    pub limit: Option<String>,
}

const DEFAULT_PAGE: i64 = 1;
const DEFAULT_LIMIT: i64 = 10;

fn positive_or(raw: Option<&str>, default: i64) -> i64 {
    raw.and_then(|v| v.trim().parse::<i64>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(default)
}

impl Pagination {
    pub fn page(&self) -> i64 {
        positive_or(self.page.as_deref(), DEFAULT_PAGE)
    }

    pub fn limit(&self) -> i64 {
        positive_or(self.limit.as_deref(), DEFAULT_LIMIT)
    }

    pub fn offset(&self) -> i64 {
        (self.page() - 1).saturating_mul(self.limit())
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductPage {
    pub page: i64,
    pub limit: i64,
    pub products: Vec<Product>,
}
