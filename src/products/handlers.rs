use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument};

use super::{
    dto::{AddProductRequest, AddProductResponse, NewProduct, Pagination, ProductPage},
    error::ProductError,
    repo_types::Product,
};
use crate::{
    auth::{
        error::ErrorBody,
        extractors::{require_role, AuthUser},
        ADMIN_ROLE,
    },
    state::AppState,
};

pub fn read_routes() -> Router<AppState> {
    Router::new().route("/products", get(list_products))
}

pub fn write_routes() -> Router<AppState> {
    Router::new().route("/addProduct", post(add_product))
}

/// Admin only. Auth and role are checked before the body is even looked at.
#[utoipa::path(
    post,
    path = "/addProduct",
    request_body = AddProductRequest,
    responses(
        (status = 201, description = "Product stored", body = AddProductResponse),
        (status = 400, description = "Missing or malformed fields", body = ErrorBody),
        (status = 401, description = "No token presented", body = ErrorBody),
        (status = 403, description = "Invalid token or not an admin", body = ErrorBody),
        (status = 409, description = "Product id already used", body = ErrorBody),
    ),
    security(("bearerAuth" = [])),
    tag = "products"
)]
#[instrument(skip(state, payload))]
pub async fn add_product(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    payload: Result<Json<AddProductRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AddProductResponse>), ProductError> {
    require_role(&claims, ADMIN_ROLE)?;

    let Json(body) = payload.map_err(|e| ProductError::Validation(e.body_text()))?;
    let new = NewProduct::try_from(body)?;

    let id = Product::create(&state.db, &new).await?;
    info!(id, product_id = new.product_id, "product added");

    Ok((
        StatusCode::CREATED,
        Json(AddProductResponse {
            id,
            product_id: new.product_id,
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/products",
    params(Pagination),
    responses(
        (status = 200, description = "One page of products", body = ProductPage),
    ),
    tag = "products"
)]
#[instrument(skip(state))]
pub async fn list_products(
    State(state): State<AppState>,
    Query(p): Query<Pagination>,
) -> Result<Json<ProductPage>, ProductError> {
    let products = Product::list(&state.db, p.limit(), p.offset()).await?;
    Ok(Json(ProductPage {
        page: p.page(),
        limit: p.limit(),
        products,
    }))
}
