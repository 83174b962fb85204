// src/db/stores.rs

// ---
// Contratos de persistência. Os services dependem destes traits (Arc<dyn ...>);
// o Postgres implementa em produção e o InMemoryStore nos testes.
// ---

use std::collections::HashMap;

use async_trait::async_trait;
use uuid::Uuid;

use crate::common::error::AppError;
use crate::common::pagination::{Page, PageRequest};
use crate::models::approval::{ApprovalHistory, Transition};
use crate::models::auth::User;
use crate::models::company::{
    Company, CompanyFilter, CompanyFollower, CreateCompanyPayload, FollowerEntry,
    ProductVisibility,
};
use crate::models::product::{
    CreateProductPayload, CreateVariantPayload, NewImage, Product, ProductFilter, ProductImage,
    ProductVariant,
};

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError>;
    /// Falha com `EmailAlreadyExists` quando o e-mail já está em uso.
    async fn create(&self, name: &str, email: &str, password_hash: &str) -> Result<User, AppError>;
}

#[async_trait]
pub trait CompanyStore: Send + Sync {
    /// Insere a empresa (PENDING) e o histórico SUBMITTED na mesma transação.
    async fn create(&self, owner_id: Uuid, payload: &CreateCompanyPayload)
    -> Result<Company, AppError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Company>, AppError>;
    async fn find_by_owner_and_name(
        &self,
        owner_id: Uuid,
        name: &str,
    ) -> Result<Option<Company>, AppError>;
    async fn list(&self, filter: &CompanyFilter) -> Result<Page<Company>, AppError>;

    /// UPDATE condicional (status != APPROVED); `TransitionConflict` se ninguém foi afetado.
    async fn update_profile(&self, company: &Company) -> Result<Company, AppError>;
    async fn set_visibility(
        &self,
        id: Uuid,
        visibility: ProductVisibility,
    ) -> Result<Company, AppError>;
    /// Soft delete do dono: só PENDING/REJECTED.
    async fn soft_delete(&self, id: Uuid) -> Result<(), AppError>;
    /// Desativação administrativa, qualquer status.
    async fn deactivate(&self, id: Uuid) -> Result<Company, AppError>;

    async fn transition(&self, id: Uuid, transition: &Transition) -> Result<Company, AppError>;
    async fn approval_history(&self, id: Uuid) -> Result<Vec<ApprovalHistory>, AppError>;
    async fn count_pending(&self) -> Result<i64, AppError>;
}

#[async_trait]
pub trait FollowerStore: Send + Sync {
    /// Idempotente: seguir de novo devolve o vínculo existente.
    async fn follow(&self, company_id: Uuid, user_id: Uuid) -> Result<CompanyFollower, AppError>;
    /// `true` se havia vínculo e ele foi removido.
    async fn unfollow(&self, company_id: Uuid, user_id: Uuid) -> Result<bool, AppError>;
    async fn find(
        &self,
        company_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<CompanyFollower>, AppError>;
    async fn is_following(&self, company_id: Uuid, user_id: Uuid) -> Result<bool, AppError>;
    /// Mapa completo: toda empresa pedida aparece, `false` por padrão.
    async fn follow_status_batch(
        &self,
        company_ids: &[Uuid],
        user_id: Uuid,
    ) -> Result<HashMap<Uuid, bool>, AppError>;
    async fn list_followers(
        &self,
        company_id: Uuid,
        page: PageRequest,
    ) -> Result<Page<FollowerEntry>, AppError>;
    /// Empresas ativas seguidas pelo usuário, mais recentes primeiro.
    async fn list_followed_companies(
        &self,
        user_id: Uuid,
        page: PageRequest,
    ) -> Result<Page<Company>, AppError>;
}

#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Produto + variantes + histórico SUBMITTED numa única transação.
    async fn create(
        &self,
        payload: &CreateProductPayload,
        submitted_by: Uuid,
    ) -> Result<(Product, Vec<ProductVariant>), AppError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Product>, AppError>;
    async fn list(&self, filter: &ProductFilter) -> Result<Page<Product>, AppError>;
    async fn update(&self, product: &Product) -> Result<Product, AppError>;
    async fn soft_delete(&self, id: Uuid) -> Result<(), AppError>;
    async fn transition(&self, id: Uuid, transition: &Transition) -> Result<Product, AppError>;
    async fn approval_history(&self, id: Uuid) -> Result<Vec<ApprovalHistory>, AppError>;
    async fn count_pending(&self) -> Result<i64, AppError>;
    async fn category_exists(&self, id: Uuid) -> Result<bool, AppError>;

    // --- Variantes ---
    async fn list_variants(&self, product_id: Uuid) -> Result<Vec<ProductVariant>, AppError>;
    async fn list_variants_for(
        &self,
        product_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, Vec<ProductVariant>>, AppError>;
    async fn find_variant(&self, id: Uuid) -> Result<Option<ProductVariant>, AppError>;
    async fn create_variant(
        &self,
        product_id: Uuid,
        payload: &CreateVariantPayload,
    ) -> Result<ProductVariant, AppError>;
    async fn update_variant(&self, variant: &ProductVariant) -> Result<ProductVariant, AppError>;
    /// `false` quando a remoção deixaria o produto sem variantes (nada é apagado).
    async fn delete_variant(&self, product_id: Uuid, variant_id: Uuid) -> Result<bool, AppError>;

    // --- Imagens ---
    /// Se `is_primary`, desmarca as outras na mesma transação.
    async fn create_image(&self, image: &NewImage) -> Result<ProductImage, AppError>;
    async fn find_image(&self, id: Uuid) -> Result<Option<ProductImage>, AppError>;
    async fn list_images(&self, product_id: Uuid) -> Result<Vec<ProductImage>, AppError>;
    async fn list_images_for(
        &self,
        product_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, Vec<ProductImage>>, AppError>;
    async fn delete_image(&self, id: Uuid) -> Result<(), AppError>;
    async fn set_primary_image(&self, product_id: Uuid, image_id: Uuid) -> Result<(), AppError>;
}
