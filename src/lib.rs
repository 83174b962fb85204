// src/lib.rs

use axum::{
    Router,
    http::{
        Method,
        header::{ACCEPT_LANGUAGE, AUTHORIZATION, CONTENT_TYPE},
    },
    middleware as axum_middleware,
    routing::{get, patch, post, put},
};
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod common;
pub mod config;
pub mod db;
pub mod docs;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;

use crate::config::AppState;
use crate::docs::ApiDoc;
use crate::middleware::auth::auth_guard;

/// Monta o router completo. Rotas de leitura pública aceitam token opcional
/// (`MaybeUser`); as demais passam pelo `auth_guard`.
pub fn app(app_state: AppState) -> Router {
    let guard = || axum_middleware::from_fn_with_state(app_state.clone(), auth_guard);

    // Rotas de autenticação (públicas)
    let auth_routes = Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login));

    let user_routes = Router::new()
        .route("/me", get(handlers::auth::get_me))
        .route("/me/companies", get(handlers::auth::get_my_companies))
        .layer(guard());

    let company_public = Router::new()
        .route("/", get(handlers::companies::list_companies))
        .route("/{id}", get(handlers::companies::get_company))
        .route(
            "/{id}/can-view-products",
            get(handlers::companies::can_view_products),
        );

    let company_private = Router::new()
        .route("/", post(handlers::companies::create_company))
        .route("/follow-status", post(handlers::companies::follow_status_batch))
        .route("/followed/me", get(handlers::companies::followed_companies))
        .route(
            "/{id}",
            put(handlers::companies::update_company).delete(handlers::companies::delete_company),
        )
        .route("/{id}/visibility", patch(handlers::companies::update_visibility))
        .route("/{id}/resubmit", post(handlers::companies::resubmit_company))
        .route("/{id}/history", get(handlers::companies::company_history))
        .route(
            "/{id}/follow",
            post(handlers::companies::follow_company).delete(handlers::companies::unfollow_company),
        )
        .route("/{id}/follow-status", get(handlers::companies::follow_status))
        .route("/{id}/followers", get(handlers::companies::list_followers))
        .layer(guard());

    let product_public = Router::new()
        .route("/", get(handlers::products::list_products))
        .route("/{id}", get(handlers::products::get_product));

    let product_private = Router::new()
        .route("/", post(handlers::products::create_product))
        .route(
            "/{id}",
            put(handlers::products::update_product).delete(handlers::products::delete_product),
        )
        .route("/{id}/resubmit", post(handlers::products::resubmit_product))
        .route("/{id}/history", get(handlers::products::product_history))
        .route("/{id}/variants", post(handlers::products::create_variant))
        .route(
            "/{id}/variants/{variant_id}",
            put(handlers::products::update_variant).delete(handlers::products::delete_variant),
        )
        .route("/{id}/images", post(handlers::products::presign_image))
        .route(
            "/{id}/images/{image_id}",
            axum::routing::delete(handlers::products::delete_image),
        )
        .route(
            "/{id}/images/{image_id}/primary",
            put(handlers::products::set_primary_image),
        )
        .layer(guard());

    // Todas exigem papel ADMIN (extrator AdminUser)
    let admin_routes = Router::new()
        .route(
            "/companies/{id}/approve",
            post(handlers::admin::approve_company),
        )
        .route("/companies/{id}/reject", post(handlers::admin::reject_company))
        .route(
            "/companies/{id}/deactivate",
            post(handlers::admin::deactivate_company),
        )
        .route("/products/{id}/approve", post(handlers::admin::approve_product))
        .route("/products/{id}/reject", post(handlers::admin::reject_product))
        .route("/pending", get(handlers::admin::pending_counts))
        .layer(guard());

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT_LANGUAGE]);

    let request_timeout = app_state.settings.request_timeout;

    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api/auth", auth_routes)
        .nest("/api/users", user_routes)
        .nest("/api/companies", company_public.merge(company_private))
        .nest("/api/products", product_public.merge(product_private))
        .nest("/api/admin", admin_routes)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
