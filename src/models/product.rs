// src/models/product.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::common::pagination::PageRequest;
use crate::models::approval::{Approvable, ApprovalState, ApprovalStatus, EntityKind};
use crate::models::auth::ViewerScope;

pub const ALLOWED_IMAGE_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp"];

// --- 1. Produto (tabela 'products') ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub company_id: Uuid,
    pub category_id: Option<Uuid>,
    pub name: String,
    pub description: Option<String>,
    pub unit: String,
    pub origin: Option<String>,
    pub base_price: Decimal,

    #[sqlx(flatten)]
    #[serde(flatten)]
    pub approval: ApprovalState,

    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub fn can_be_modified(&self) -> bool {
        self.approval.can_be_modified()
    }

    pub fn is_visible(&self) -> bool {
        self.approval.is_approved() && self.is_active
    }

    pub fn apply_changes(&mut self, changes: UpdateProductPayload) {
        if changes.category_id.is_some() {
            self.category_id = changes.category_id;
        }
        if let Some(name) = changes.name {
            self.name = name.trim().to_string();
        }
        if changes.description.is_some() {
            self.description = changes.description;
        }
        if let Some(unit) = changes.unit {
            self.unit = unit;
        }
        if changes.origin.is_some() {
            self.origin = changes.origin;
        }
        if let Some(price) = changes.base_price {
            self.base_price = price;
        }
    }
}

impl Approvable for Product {
    const KIND: EntityKind = EntityKind::Product;

    fn approval(&self) -> &ApprovalState {
        &self.approval
    }

    fn is_active(&self) -> bool {
        self.is_active
    }
}

// --- 2. Variantes ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductVariant {
    pub id: Uuid,
    pub product_id: Uuid,
    pub label: String,
    pub quantity_value: Decimal,
    pub quantity_unit: String,
    pub price: Decimal,
    pub stock_quantity: Option<i32>,
    pub low_stock_threshold: Option<i32>,
    pub is_available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProductVariant {
    /// Só é "estoque baixo" quando os dois números existem.
    pub fn is_low_stock(&self) -> bool {
        match (self.stock_quantity, self.low_stock_threshold) {
            (Some(stock), Some(threshold)) => stock <= threshold,
            _ => false,
        }
    }

    pub fn apply_changes(&mut self, changes: UpdateVariantPayload) {
        if let Some(label) = changes.label {
            self.label = label;
        }
        if let Some(value) = changes.quantity_value {
            self.quantity_value = value;
        }
        if let Some(unit) = changes.quantity_unit {
            self.quantity_unit = unit;
        }
        if let Some(price) = changes.price {
            self.price = price;
        }
        if changes.stock_quantity.is_some() {
            self.stock_quantity = changes.stock_quantity;
        }
        if changes.low_stock_threshold.is_some() {
            self.low_stock_threshold = changes.low_stock_threshold;
        }
        if let Some(available) = changes.is_available {
            self.is_available = available;
        }
    }
}

// --- 3. Imagens ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductImage {
    pub id: Uuid,
    pub product_id: Uuid,
    pub image_url: String,
    #[serde(skip_serializing)]
    pub storage_key: String,
    pub is_primary: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Registro da imagem criado junto com a URL de upload.
#[derive(Debug, Clone)]
pub struct NewImage {
    pub id: Uuid,
    pub product_id: Uuid,
    pub image_url: String,
    pub storage_key: String,
    pub is_primary: bool,
}

pub fn image_storage_key(product_id: Uuid, image_id: Uuid) -> String {
    format!("products/{product_id}/images/{image_id}")
}

// --- 4. Respostas ---
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VariantResponse {
    #[serde(flatten)]
    pub variant: ProductVariant,
    pub is_low_stock: bool,
}

impl From<ProductVariant> for VariantResponse {
    fn from(variant: ProductVariant) -> Self {
        let is_low_stock = variant.is_low_stock();
        Self {
            variant,
            is_low_stock,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductResponse {
    #[serde(flatten)]
    pub product: Product,
    pub images: Vec<ProductImage>,
    pub variants: Vec<VariantResponse>,
    pub can_be_modified: bool,
    pub is_visible: bool,
}

impl ProductResponse {
    /// Imagem principal primeiro, o resto na ordem de criação.
    pub fn assemble(
        product: Product,
        mut images: Vec<ProductImage>,
        variants: Vec<ProductVariant>,
    ) -> Self {
        images.sort_by(|a, b| {
            b.is_primary
                .cmp(&a.is_primary)
                .then(a.created_at.cmp(&b.created_at))
        });
        Self {
            can_be_modified: product.can_be_modified(),
            is_visible: product.is_visible(),
            product,
            images,
            variants: variants.into_iter().map(VariantResponse::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImageUploadResponse {
    pub image_id: Uuid,
    pub upload_url: String,
    pub image_url: String,
    pub storage_key: String,
    pub expires_in: i64,
}

// --- 5. Filtro de listagem ---
#[derive(Debug, Clone)]
pub struct ProductFilter {
    pub viewer: ViewerScope,
    pub company_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub search: Option<String>,
    pub approval_status: Option<ApprovalStatus>,
    pub is_active: Option<bool>,
    pub page: PageRequest,
}

// --- 6. Payloads ---

fn positive_decimal(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_positive() && !value.is_zero() {
        Ok(())
    } else {
        Err(ValidationError::new("positive").with_message("Deve ser maior que zero.".into()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateVariantPayload {
    #[validate(length(min = 2, max = 100, message = "O rótulo deve ter entre 2 e 100 caracteres."))]
    pub label: String,
    #[validate(custom(function = "positive_decimal"))]
    pub quantity_value: Decimal,
    #[validate(length(min = 1, max = 20))]
    pub quantity_unit: String,
    #[validate(custom(function = "positive_decimal"))]
    pub price: Decimal,
    #[validate(range(min = 0))]
    pub stock_quantity: Option<i32>,
    #[validate(range(min = 0))]
    pub low_stock_threshold: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateVariantPayload {
    #[validate(length(min = 2, max = 100, message = "O rótulo deve ter entre 2 e 100 caracteres."))]
    pub label: Option<String>,
    #[validate(custom(function = "positive_decimal"))]
    pub quantity_value: Option<Decimal>,
    #[validate(length(min = 1, max = 20))]
    pub quantity_unit: Option<String>,
    #[validate(custom(function = "positive_decimal"))]
    pub price: Option<Decimal>,
    #[validate(range(min = 0))]
    pub stock_quantity: Option<i32>,
    #[validate(range(min = 0))]
    pub low_stock_threshold: Option<i32>,
    pub is_available: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductPayload {
    pub company_id: Uuid,
    pub category_id: Option<Uuid>,
    #[validate(length(min = 3, max = 255, message = "O nome deve ter entre 3 e 255 caracteres."))]
    pub name: String,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[validate(length(min = 1, max = 50))]
    pub unit: String,
    #[validate(length(max = 100))]
    pub origin: Option<String>,
    #[validate(custom(function = "positive_decimal"))]
    pub base_price: Decimal,
    #[validate(length(min = 1, message = "Informe ao menos uma variante."), nested)]
    pub variants: Vec<CreateVariantPayload>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductPayload {
    pub category_id: Option<Uuid>,
    #[validate(length(min = 3, max = 255, message = "O nome deve ter entre 3 e 255 caracteres."))]
    pub name: Option<String>,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[validate(length(min = 1, max = 50))]
    pub unit: Option<String>,
    #[validate(length(max = 100))]
    pub origin: Option<String>,
    #[validate(custom(function = "positive_decimal"))]
    pub base_price: Option<Decimal>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImageUploadPayload {
    #[validate(length(min = 1, max = 100))]
    pub content_type: String,
    #[serde(default)]
    pub is_primary: bool,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ProductListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub company_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub search: Option<String>,
    pub approval_status: Option<ApprovalStatus>,
    pub is_active: Option<bool>,
}
