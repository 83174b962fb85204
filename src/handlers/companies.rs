// src/handlers/companies.rs

use std::collections::HashMap;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    common::pagination::{Page, PageRequest},
    config::AppState,
    middleware::{
        auth::{AuthenticatedUser, MaybeUser},
        i18n::Locale,
    },
    models::approval::ApprovalHistory,
    models::company::{
        CanViewProductsResponse, Company, CompanyFollower, CompanyListQuery, CompanyResponse,
        CreateCompanyPayload, FollowStatus, FollowerEntry, PageQuery, UpdateCompanyPayload,
        UpdateVisibilityPayload,
    },
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FollowStatusBatchPayload {
    #[validate(length(min = 1, max = 100, message = "Informe entre 1 e 100 empresas."))]
    pub company_ids: Vec<Uuid>,
}

// ---
// Leitura pública (token opcional)
// ---

// GET /api/companies
#[utoipa::path(
    get,
    path = "/api/companies",
    tag = "Companies",
    params(CompanyListQuery),
    responses((status = 200, description = "Empresas visíveis para quem pergunta", body = Page<CompanyResponse>))
)]
pub async fn list_companies(
    State(app_state): State<AppState>,
    locale: Locale,
    viewer: MaybeUser,
    Query(query): Query<CompanyListQuery>,
) -> Result<Json<Page<CompanyResponse>>, ApiError> {
    let page = app_state
        .company_service
        .list(query, viewer.actor())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(page))
}

// GET /api/companies/{id}
#[utoipa::path(
    get,
    path = "/api/companies/{id}",
    tag = "Companies",
    params(("id" = Uuid, Path, description = "ID da empresa")),
    responses(
        (status = 200, description = "Empresa", body = CompanyResponse),
        (status = 403, description = "Empresa ainda não publicada", body = ApiError),
        (status = 404, description = "Empresa não encontrada", body = ApiError)
    )
)]
pub async fn get_company(
    State(app_state): State<AppState>,
    locale: Locale,
    viewer: MaybeUser,
    Path(id): Path<Uuid>,
) -> Result<Json<CompanyResponse>, ApiError> {
    let company = app_state
        .company_service
        .get_by_id(id, viewer.actor())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(company))
}

// GET /api/companies/{id}/can-view-products
#[utoipa::path(
    get,
    path = "/api/companies/{id}/can-view-products",
    tag = "Companies",
    params(("id" = Uuid, Path, description = "ID da empresa")),
    responses((status = 200, description = "Resultado do gate de visibilidade", body = CanViewProductsResponse))
)]
pub async fn can_view_products(
    State(app_state): State<AppState>,
    locale: Locale,
    viewer: MaybeUser,
    Path(id): Path<Uuid>,
) -> Result<Json<CanViewProductsResponse>, ApiError> {
    let can_view = app_state
        .company_service
        .can_view_products(id, viewer.actor())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(CanViewProductsResponse {
        company_id: id,
        can_view,
    }))
}

// ---
// Dono
// ---

// POST /api/companies
#[utoipa::path(
    post,
    path = "/api/companies",
    tag = "Companies",
    request_body = CreateCompanyPayload,
    responses(
        (status = 201, description = "Empresa criada em PENDING", body = Company),
        (status = 409, description = "Nome já usado por este dono", body = ApiError)
    ),
    security(("api_jwt" = []))
)]
pub async fn create_company(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
    Json(payload): Json<CreateCompanyPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let company = app_state
        .company_service
        .create(&actor, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(company)))
}

// PUT /api/companies/{id}
#[utoipa::path(
    put,
    path = "/api/companies/{id}",
    tag = "Companies",
    request_body = UpdateCompanyPayload,
    params(("id" = Uuid, Path, description = "ID da empresa")),
    responses(
        (status = 200, description = "Empresa atualizada", body = Company),
        (status = 409, description = "Empresa aprovada não pode ser editada", body = ApiError)
    ),
    security(("api_jwt" = []))
)]
pub async fn update_company(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCompanyPayload>,
) -> Result<Json<Company>, ApiError> {
    let company = app_state
        .company_service
        .update(&actor, id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(company))
}

// PATCH /api/companies/{id}/visibility
#[utoipa::path(
    patch,
    path = "/api/companies/{id}/visibility",
    tag = "Companies",
    request_body = UpdateVisibilityPayload,
    params(("id" = Uuid, Path, description = "ID da empresa")),
    responses((status = 200, description = "Visibilidade alterada", body = Company)),
    security(("api_jwt" = []))
)]
pub async fn update_visibility(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateVisibilityPayload>,
) -> Result<Json<Company>, ApiError> {
    let company = app_state
        .company_service
        .update_visibility(&actor, id, payload.product_visibility)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(company))
}

// DELETE /api/companies/{id}
#[utoipa::path(
    delete,
    path = "/api/companies/{id}",
    tag = "Companies",
    params(("id" = Uuid, Path, description = "ID da empresa")),
    responses((status = 204, description = "Empresa desativada")),
    security(("api_jwt" = []))
)]
pub async fn delete_company(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    app_state
        .company_service
        .delete(&actor, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// POST /api/companies/{id}/resubmit
#[utoipa::path(
    post,
    path = "/api/companies/{id}/resubmit",
    tag = "Companies",
    params(("id" = Uuid, Path, description = "ID da empresa")),
    responses(
        (status = 200, description = "Empresa de volta para PENDING", body = Company),
        (status = 409, description = "Só empresas REJECTED podem ser reenviadas", body = ApiError)
    ),
    security(("api_jwt" = []))
)]
pub async fn resubmit_company(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Company>, ApiError> {
    let company = app_state
        .company_service
        .resubmit(&actor, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(company))
}

// GET /api/companies/{id}/history
#[utoipa::path(
    get,
    path = "/api/companies/{id}/history",
    tag = "Companies",
    params(("id" = Uuid, Path, description = "ID da empresa")),
    responses((status = 200, description = "Histórico de aprovação, mais recente primeiro", body = Vec<ApprovalHistory>)),
    security(("api_jwt" = []))
)]
pub async fn company_history(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<ApprovalHistory>>, ApiError> {
    let history = app_state
        .company_service
        .approval_history(&actor, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(history))
}

// GET /api/companies/{id}/followers
#[utoipa::path(
    get,
    path = "/api/companies/{id}/followers",
    tag = "Followers",
    params(("id" = Uuid, Path, description = "ID da empresa"), PageQuery),
    responses((status = 200, description = "Seguidores da empresa", body = Page<FollowerEntry>)),
    security(("api_jwt" = []))
)]
pub async fn list_followers(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<FollowerEntry>>, ApiError> {
    let page = PageRequest::new(query.page, query.limit)
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    let followers = app_state
        .company_service
        .list_followers(&actor, id, page)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(followers))
}

// ---
// Seguir / deixar de seguir
// ---

// POST /api/companies/{id}/follow
#[utoipa::path(
    post,
    path = "/api/companies/{id}/follow",
    tag = "Followers",
    params(("id" = Uuid, Path, description = "ID da empresa")),
    responses(
        (status = 201, description = "Seguindo", body = CompanyFollower),
        (status = 400, description = "Não é possível seguir a própria empresa", body = ApiError),
        (status = 409, description = "Empresa não aprovada", body = ApiError)
    ),
    security(("api_jwt" = []))
)]
pub async fn follow_company(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let follower = app_state
        .company_service
        .follow(&actor, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(follower)))
}

// DELETE /api/companies/{id}/follow
#[utoipa::path(
    delete,
    path = "/api/companies/{id}/follow",
    tag = "Followers",
    params(("id" = Uuid, Path, description = "ID da empresa")),
    responses((status = 204, description = "Não segue mais (idempotente)")),
    security(("api_jwt" = []))
)]
pub async fn unfollow_company(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    app_state
        .company_service
        .unfollow(&actor, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// GET /api/companies/{id}/follow-status
#[utoipa::path(
    get,
    path = "/api/companies/{id}/follow-status",
    tag = "Followers",
    params(("id" = Uuid, Path, description = "ID da empresa")),
    responses((status = 200, description = "Status de seguimento", body = FollowStatus)),
    security(("api_jwt" = []))
)]
pub async fn follow_status(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<FollowStatus>, ApiError> {
    let status = app_state
        .company_service
        .follow_status(&actor, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(status))
}

// POST /api/companies/follow-status
#[utoipa::path(
    post,
    path = "/api/companies/follow-status",
    tag = "Followers",
    request_body = FollowStatusBatchPayload,
    responses((status = 200, description = "Mapa empresa -> seguindo (todas as empresas pedidas)", body = HashMap<Uuid, bool>)),
    security(("api_jwt" = []))
)]
pub async fn follow_status_batch(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
    Json(payload): Json<FollowStatusBatchPayload>,
) -> Result<Json<HashMap<Uuid, bool>>, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let status = app_state
        .company_service
        .follow_status_batch(&actor, &payload.company_ids)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(status))
}

// GET /api/companies/followed/me
#[utoipa::path(
    get,
    path = "/api/companies/followed/me",
    tag = "Followers",
    params(PageQuery),
    responses((status = 200, description = "Empresas que o usuário segue", body = Page<CompanyResponse>)),
    security(("api_jwt" = []))
)]
pub async fn followed_companies(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<CompanyResponse>>, ApiError> {
    let page = PageRequest::new(query.page, query.limit)
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    let companies = app_state
        .company_service
        .list_followed_companies(&actor, page)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(companies))
}
