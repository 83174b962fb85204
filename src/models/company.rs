// src/models/company.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::common::pagination::PageRequest;
use crate::models::approval::{Approvable, ApprovalState, ApprovalStatus, EntityKind};
use crate::models::auth::ViewerScope;

// --- 1. Visibilidade dos produtos da empresa ---
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema,
)]
#[sqlx(type_name = "product_visibility", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductVisibility {
    #[default]
    Public,
    FollowersOnly,
    Private,
}

// --- 2. Empresa (tabela 'companies') ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub logo_url: Option<String>,
    pub business_email: Option<String>,
    pub business_phone: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub pincode: Option<String>,
    #[serde(skip_serializing)] // Documento fiscal: não vai para a vitrine
    pub gst_number: Option<String>,
    #[serde(skip_serializing)]
    pub pan_number: Option<String>,

    #[sqlx(flatten)]
    #[serde(flatten)]
    pub approval: ApprovalState,

    pub product_visibility: ProductVisibility,
    pub follower_count: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Company {
    pub fn can_be_modified(&self) -> bool {
        self.approval.can_be_modified()
    }

    /// Só empresas APPROVED e ativas recebem produtos novos.
    pub fn can_create_products(&self) -> bool {
        self.approval.is_approved() && self.is_active
    }

    pub fn can_be_followed(&self) -> bool {
        self.approval.is_approved() && self.is_active
    }

    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.owner_id == user_id
    }

    /// Aplica os campos presentes no payload (PATCH semântico).
    pub fn apply_changes(&mut self, changes: UpdateCompanyPayload) {
        if let Some(name) = changes.name {
            self.name = name.trim().to_string();
        }
        if changes.description.is_some() {
            self.description = changes.description;
        }
        if changes.logo_url.is_some() {
            self.logo_url = changes.logo_url;
        }
        if changes.business_email.is_some() {
            self.business_email = changes.business_email;
        }
        if changes.business_phone.is_some() {
            self.business_phone = changes.business_phone;
        }
        if changes.city.is_some() {
            self.city = changes.city;
        }
        if changes.state.is_some() {
            self.state = changes.state;
        }
        if changes.pincode.is_some() {
            self.pincode = changes.pincode;
        }
        if changes.gst_number.is_some() {
            self.gst_number = changes.gst_number;
        }
        if changes.pan_number.is_some() {
            self.pan_number = changes.pan_number;
        }
        if let Some(visibility) = changes.product_visibility {
            self.product_visibility = visibility;
        }
    }
}

impl Approvable for Company {
    const KIND: EntityKind = EntityKind::Company;

    fn approval(&self) -> &ApprovalState {
        &self.approval
    }

    fn is_active(&self) -> bool {
        self.is_active
    }
}

// --- 3. Seguidores ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompanyFollower {
    pub id: Uuid,
    pub company_id: Uuid,
    pub user_id: Uuid,
    pub followed_at: DateTime<Utc>,
}

// Seguidor com dados do usuário (lista do dono)
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FollowerEntry {
    pub id: Uuid,
    pub company_id: Uuid,
    pub user_id: Uuid,
    pub user_name: String,
    pub user_email: String,
    pub followed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FollowStatus {
    pub company_id: Uuid,
    pub is_following: bool,
    pub followed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CanViewProductsResponse {
    pub company_id: Uuid,
    pub can_view: bool,
}

// --- 4. Resposta ---
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompanyResponse {
    #[serde(flatten)]
    pub company: Company,
    /// Presente só quando há um usuário identificado
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_following: Option<bool>,
    pub can_be_modified: bool,
}

impl CompanyResponse {
    pub fn new(company: Company, is_following: Option<bool>) -> Self {
        let can_be_modified = company.can_be_modified();
        Self {
            company,
            is_following,
            can_be_modified,
        }
    }
}

// --- 5. Filtro de listagem (montado pelo service) ---
#[derive(Debug, Clone)]
pub struct CompanyFilter {
    pub viewer: ViewerScope,
    pub owner_id: Option<Uuid>,
    pub search: Option<String>,
    pub approval_status: Option<ApprovalStatus>,
    pub is_active: Option<bool>,
    pub page: PageRequest,
}

// --- 6. Payloads ---

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCompanyPayload {
    #[validate(length(min = 3, max = 255, message = "O nome deve ter entre 3 e 255 caracteres."))]
    pub name: String,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[validate(url(message = "URL do logo inválida."))]
    pub logo_url: Option<String>,
    #[validate(email(message = "E-mail comercial inválido."))]
    pub business_email: Option<String>,
    #[validate(length(max = 50))]
    pub business_phone: Option<String>,
    #[validate(length(max = 100))]
    pub city: Option<String>,
    #[validate(length(max = 100))]
    pub state: Option<String>,
    #[validate(length(max = 20))]
    pub pincode: Option<String>,
    #[validate(length(max = 20))]
    pub gst_number: Option<String>,
    #[validate(length(max = 20))]
    pub pan_number: Option<String>,
    pub product_visibility: Option<ProductVisibility>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCompanyPayload {
    #[validate(length(min = 3, max = 255, message = "O nome deve ter entre 3 e 255 caracteres."))]
    pub name: Option<String>,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[validate(url(message = "URL do logo inválida."))]
    pub logo_url: Option<String>,
    #[validate(email(message = "E-mail comercial inválido."))]
    pub business_email: Option<String>,
    #[validate(length(max = 50))]
    pub business_phone: Option<String>,
    #[validate(length(max = 100))]
    pub city: Option<String>,
    #[validate(length(max = 100))]
    pub state: Option<String>,
    #[validate(length(max = 20))]
    pub pincode: Option<String>,
    #[validate(length(max = 20))]
    pub gst_number: Option<String>,
    #[validate(length(max = 20))]
    pub pan_number: Option<String>,
    pub product_visibility: Option<ProductVisibility>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateVisibilityPayload {
    pub product_visibility: ProductVisibility,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct CompanyListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub search: Option<String>,
    pub approval_status: Option<ApprovalStatus>,
    pub owner_id: Option<Uuid>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}
