// src/handlers/products.rs

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use crate::{
    common::error::ApiError,
    common::pagination::Page,
    config::AppState,
    middleware::{
        auth::{AuthenticatedUser, MaybeUser},
        i18n::Locale,
    },
    models::approval::ApprovalHistory,
    models::product::{
        CreateProductPayload, CreateVariantPayload, ImageUploadPayload, ImageUploadResponse,
        Product, ProductListQuery, ProductResponse, ProductVariant, UpdateProductPayload,
        UpdateVariantPayload,
    },
};

// ---
// Catálogo (token opcional)
// ---

// GET /api/products
#[utoipa::path(
    get,
    path = "/api/products",
    tag = "Products",
    params(ProductListQuery),
    responses((status = 200, description = "Produtos visíveis para quem pergunta", body = Page<ProductResponse>))
)]
pub async fn list_products(
    State(app_state): State<AppState>,
    locale: Locale,
    viewer: MaybeUser,
    Query(query): Query<ProductListQuery>,
) -> Result<Json<Page<ProductResponse>>, ApiError> {
    let page = app_state
        .product_service
        .list(query, viewer.actor())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(page))
}

// GET /api/products/{id}
#[utoipa::path(
    get,
    path = "/api/products/{id}",
    tag = "Products",
    params(("id" = Uuid, Path, description = "ID do produto")),
    responses(
        (status = 200, description = "Produto com imagens e variantes", body = ProductResponse),
        (status = 403, description = "Produto não visível para quem pergunta", body = ApiError),
        (status = 404, description = "Produto não encontrado", body = ApiError)
    )
)]
pub async fn get_product(
    State(app_state): State<AppState>,
    locale: Locale,
    viewer: MaybeUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ProductResponse>, ApiError> {
    let product = app_state
        .product_service
        .get_by_id(id, viewer.actor())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(product))
}

// ---
// Dono da empresa
// ---

// POST /api/products
#[utoipa::path(
    post,
    path = "/api/products",
    tag = "Products",
    request_body = CreateProductPayload,
    responses(
        (status = 201, description = "Produto criado em PENDING", body = ProductResponse),
        (status = 409, description = "Empresa não aprovada", body = ApiError)
    ),
    security(("api_jwt" = []))
)]
pub async fn create_product(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
    Json(payload): Json<CreateProductPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let product = app_state
        .product_service
        .create(&actor, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(product)))
}

// PUT /api/products/{id}
#[utoipa::path(
    put,
    path = "/api/products/{id}",
    tag = "Products",
    request_body = UpdateProductPayload,
    params(("id" = Uuid, Path, description = "ID do produto")),
    responses(
        (status = 200, description = "Produto atualizado", body = ProductResponse),
        (status = 409, description = "Produto aprovado não pode ser editado", body = ApiError)
    ),
    security(("api_jwt" = []))
)]
pub async fn update_product(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateProductPayload>,
) -> Result<Json<ProductResponse>, ApiError> {
    let product = app_state
        .product_service
        .update(&actor, id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(product))
}

// DELETE /api/products/{id}
#[utoipa::path(
    delete,
    path = "/api/products/{id}",
    tag = "Products",
    params(("id" = Uuid, Path, description = "ID do produto")),
    responses((status = 204, description = "Produto desativado")),
    security(("api_jwt" = []))
)]
pub async fn delete_product(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    app_state
        .product_service
        .delete(&actor, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// POST /api/products/{id}/resubmit
#[utoipa::path(
    post,
    path = "/api/products/{id}/resubmit",
    tag = "Products",
    params(("id" = Uuid, Path, description = "ID do produto")),
    responses((status = 200, description = "Produto de volta para PENDING", body = Product)),
    security(("api_jwt" = []))
)]
pub async fn resubmit_product(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Product>, ApiError> {
    let product = app_state
        .product_service
        .resubmit(&actor, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(product))
}

// GET /api/products/{id}/history
#[utoipa::path(
    get,
    path = "/api/products/{id}/history",
    tag = "Products",
    params(("id" = Uuid, Path, description = "ID do produto")),
    responses((status = 200, description = "Histórico de aprovação", body = Vec<ApprovalHistory>)),
    security(("api_jwt" = []))
)]
pub async fn product_history(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<ApprovalHistory>>, ApiError> {
    let history = app_state
        .product_service
        .approval_history(&actor, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(history))
}

// ---
// Variantes
// ---

// POST /api/products/{id}/variants
#[utoipa::path(
    post,
    path = "/api/products/{id}/variants",
    tag = "Variants",
    request_body = CreateVariantPayload,
    params(("id" = Uuid, Path, description = "ID do produto")),
    responses((status = 201, description = "Variante criada", body = ProductVariant)),
    security(("api_jwt" = []))
)]
pub async fn create_variant(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<CreateVariantPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let variant = app_state
        .product_service
        .create_variant(&actor, id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(variant)))
}

// PUT /api/products/{id}/variants/{variant_id}
#[utoipa::path(
    put,
    path = "/api/products/{id}/variants/{variant_id}",
    tag = "Variants",
    request_body = UpdateVariantPayload,
    params(
        ("id" = Uuid, Path, description = "ID do produto"),
        ("variant_id" = Uuid, Path, description = "ID da variante")
    ),
    responses((status = 200, description = "Variante atualizada", body = ProductVariant)),
    security(("api_jwt" = []))
)]
pub async fn update_variant(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path((id, variant_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<UpdateVariantPayload>,
) -> Result<Json<ProductVariant>, ApiError> {
    let variant = app_state
        .product_service
        .update_variant(&actor, id, variant_id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(variant))
}

// DELETE /api/products/{id}/variants/{variant_id}
#[utoipa::path(
    delete,
    path = "/api/products/{id}/variants/{variant_id}",
    tag = "Variants",
    params(
        ("id" = Uuid, Path, description = "ID do produto"),
        ("variant_id" = Uuid, Path, description = "ID da variante")
    ),
    responses(
        (status = 204, description = "Variante removida"),
        (status = 409, description = "Produto precisa de ao menos uma variante", body = ApiError)
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_variant(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path((id, variant_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError> {
    app_state
        .product_service
        .delete_variant(&actor, id, variant_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// ---
// Imagens
// ---

// POST /api/products/{id}/images
#[utoipa::path(
    post,
    path = "/api/products/{id}/images",
    tag = "Images",
    request_body = ImageUploadPayload,
    params(("id" = Uuid, Path, description = "ID do produto")),
    responses((status = 201, description = "URL de upload assinada", body = ImageUploadResponse)),
    security(("api_jwt" = []))
)]
pub async fn presign_image(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ImageUploadPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let upload = app_state
        .product_service
        .presign_image(&actor, id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(upload)))
}

// DELETE /api/products/{id}/images/{image_id}
#[utoipa::path(
    delete,
    path = "/api/products/{id}/images/{image_id}",
    tag = "Images",
    params(
        ("id" = Uuid, Path, description = "ID do produto"),
        ("image_id" = Uuid, Path, description = "ID da imagem")
    ),
    responses((status = 204, description = "Imagem removida")),
    security(("api_jwt" = []))
)]
pub async fn delete_image(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path((id, image_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError> {
    app_state
        .product_service
        .delete_image(&actor, id, image_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// PUT /api/products/{id}/images/{image_id}/primary
#[utoipa::path(
    put,
    path = "/api/products/{id}/images/{image_id}/primary",
    tag = "Images",
    params(
        ("id" = Uuid, Path, description = "ID do produto"),
        ("image_id" = Uuid, Path, description = "ID da imagem")
    ),
    responses((status = 204, description = "Imagem principal definida")),
    security(("api_jwt" = []))
)]
pub async fn set_primary_image(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path((id, image_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError> {
    app_state
        .product_service
        .set_primary_image(&actor, id, image_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}
