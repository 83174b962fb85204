// src/handlers/admin.rs

use axum::{
    Json,
    extract::{Path, State},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{i18n::Locale, rbac::AdminUser},
    models::approval::{ApprovePayload, PendingCounts, RejectPayload},
    models::company::Company,
    models::product::Product,
};

// POST /api/admin/companies/{id}/approve
#[utoipa::path(
    post,
    path = "/api/admin/companies/{id}/approve",
    tag = "Admin",
    request_body = ApprovePayload,
    params(("id" = Uuid, Path, description = "ID da empresa")),
    responses(
        (status = 200, description = "Empresa aprovada", body = Company),
        (status = 409, description = "Empresa não está PENDING (ou outra revisão venceu)", body = ApiError)
    ),
    security(("api_jwt" = []))
)]
pub async fn approve_company(
    State(app_state): State<AppState>,
    locale: Locale,
    AdminUser(admin): AdminUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ApprovePayload>,
) -> Result<Json<Company>, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let company = app_state
        .company_service
        .approve(&admin, id, payload.notes)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(company))
}

// POST /api/admin/companies/{id}/reject
#[utoipa::path(
    post,
    path = "/api/admin/companies/{id}/reject",
    tag = "Admin",
    request_body = RejectPayload,
    params(("id" = Uuid, Path, description = "ID da empresa")),
    responses(
        (status = 200, description = "Empresa rejeitada", body = Company),
        (status = 400, description = "Motivo com menos de 10 caracteres", body = ApiError)
    ),
    security(("api_jwt" = []))
)]
pub async fn reject_company(
    State(app_state): State<AppState>,
    locale: Locale,
    AdminUser(admin): AdminUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<RejectPayload>,
) -> Result<Json<Company>, ApiError> {
    let company = app_state
        .company_service
        .reject(&admin, id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(company))
}

// POST /api/admin/companies/{id}/deactivate
#[utoipa::path(
    post,
    path = "/api/admin/companies/{id}/deactivate",
    tag = "Admin",
    params(("id" = Uuid, Path, description = "ID da empresa")),
    responses((status = 200, description = "Empresa fora do ar", body = Company)),
    security(("api_jwt" = []))
)]
pub async fn deactivate_company(
    State(app_state): State<AppState>,
    locale: Locale,
    AdminUser(admin): AdminUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Company>, ApiError> {
    let company = app_state
        .company_service
        .deactivate(&admin, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(company))
}

// POST /api/admin/products/{id}/approve
#[utoipa::path(
    post,
    path = "/api/admin/products/{id}/approve",
    tag = "Admin",
    request_body = ApprovePayload,
    params(("id" = Uuid, Path, description = "ID do produto")),
    responses(
        (status = 200, description = "Produto aprovado", body = Product),
        (status = 409, description = "Produto não está PENDING ou empresa fora do ar", body = ApiError)
    ),
    security(("api_jwt" = []))
)]
pub async fn approve_product(
    State(app_state): State<AppState>,
    locale: Locale,
    AdminUser(admin): AdminUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ApprovePayload>,
) -> Result<Json<Product>, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let product = app_state
        .product_service
        .approve(&admin, id, payload.notes)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(product))
}

// POST /api/admin/products/{id}/reject
#[utoipa::path(
    post,
    path = "/api/admin/products/{id}/reject",
    tag = "Admin",
    request_body = RejectPayload,
    params(("id" = Uuid, Path, description = "ID do produto")),
    responses((status = 200, description = "Produto rejeitado", body = Product)),
    security(("api_jwt" = []))
)]
pub async fn reject_product(
    State(app_state): State<AppState>,
    locale: Locale,
    AdminUser(admin): AdminUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<RejectPayload>,
) -> Result<Json<Product>, ApiError> {
    let product = app_state
        .product_service
        .reject(&admin, id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(product))
}

// GET /api/admin/pending
#[utoipa::path(
    get,
    path = "/api/admin/pending",
    tag = "Admin",
    responses((status = 200, description = "Itens ativos aguardando revisão", body = PendingCounts)),
    security(("api_jwt" = []))
)]
pub async fn pending_counts(
    State(app_state): State<AppState>,
    locale: Locale,
    AdminUser(admin): AdminUser,
) -> Result<Json<PendingCounts>, ApiError> {
    let (companies, products) = tokio::try_join!(
        app_state.company_service.count_pending(&admin),
        app_state.product_service.count_pending(&admin),
    )
    .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(PendingCounts {
        companies,
        products,
    }))
}
