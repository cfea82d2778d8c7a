use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::config::SecurityConfig;
use crate::handlers::{protected, public};
use crate::middleware::{authenticate, authorize};
use crate::state::AppState;

/// Full HTTP surface of the API.
///
/// Every request goes through the authentication gate and then the access
/// policy, including routes with no handler, so a broken token is refused
/// before the 404 fallback is ever reached.
pub fn router(state: AppState) -> Router {
    let max_body = state.config.api.max_request_size_bytes;
    let cors = cors_layer(&state.config.security);

    Router::new()
        // Public
        .route("/", get(public::root))
        .route("/health", get(public::health))
        .merge(auth_public_routes())
        // Protected API
        .merge(account_routes())
        .merge(catalog_routes())
        .fallback(public::not_found)
        // Gate runs first, then the policy
        .layer(
            ServiceBuilder::new()
                .layer(from_fn_with_state(state.clone(), authenticate))
                .layer(from_fn_with_state(state.clone(), authorize)),
        )
        // Global middleware
        .layer(DefaultBodyLimit::max(max_body))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn auth_public_routes() -> Router<AppState> {
    use public::auth;

    Router::new()
        .route("/auth/register", post(auth::register_post))
        .route("/auth/login", post(auth::login_post))
}

fn account_routes() -> Router<AppState> {
    use protected::account;

    Router::new().route(
        "/api/accounts/me",
        get(account::me_get)
            .put(account::me_put)
            .delete(account::me_delete),
    )
}

fn catalog_routes() -> Router<AppState> {
    use axum::routing::delete;
    use protected::{category, product};

    Router::new()
        .route(
            "/api/categories",
            get(category::categories_get).post(category::categories_post),
        )
        .route("/api/categories/:id", delete(category::category_delete))
        .route(
            "/api/products",
            get(product::products_get).post(product::products_post),
        )
        .route(
            "/api/products/:id",
            get(product::product_get)
                .put(product::product_put)
                .delete(product::product_delete),
        )
}

/// Cross-origin access for the configured origins. With CORS disabled the
/// layer still answers preflights, but allows no origin.
fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    let origins = if !security.enable_cors {
        AllowOrigin::list(Vec::<HeaderValue>::new())
    } else if security.cors_origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(security.cors_origins.iter().filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        }))
    };

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .expose_headers([AUTHORIZATION])
}
