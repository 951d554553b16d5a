use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::{self, error::ErrorBody},
    products,
    state::AppState,
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "authcat",
        description = "User registration, token login and an admin-guarded product catalog"
    ),
    paths(
        auth::handlers::register,
        auth::handlers::login,
        auth::handlers::get_me,
        products::handlers::add_product,
        products::handlers::list_products,
    ),
    components(schemas(ErrorBody)),
    modifiers(&BearerAuth),
    tags(
        (name = "users", description = "Registration, login and token identity"),
        (name = "products", description = "Product catalog"),
    )
)]
struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearerAuth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

/// Swagger UI at `/api-docs`, raw document at `/api-docs/openapi.json`.
pub fn router() -> Router<AppState> {
    Router::new().merge(SwaggerUi::new("/api-docs").url("/api-docs/openapi.json", openapi()))
}
