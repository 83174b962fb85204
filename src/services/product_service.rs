// src/services/product_service.rs

use std::sync::Arc;

use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    common::pagination::{Page, PageRequest},
    db::stores::{CompanyStore, ProductStore},
    models::approval::{ApprovalHistory, EntityKind, LifecycleAction, RejectPayload, Transition},
    models::auth::{Actor, ViewerScope},
    models::company::Company,
    models::product::{
        CreateProductPayload, CreateVariantPayload, ImageUploadPayload, ImageUploadResponse,
        NewImage, Product, ProductFilter, ProductListQuery, ProductResponse, ProductVariant,
        UpdateProductPayload, UpdateVariantPayload, image_storage_key,
    },
    services::company_service::default_status,
    services::guard,
    services::storage::{ObjectStore, ensure_image_content_type},
    services::visibility::VisibilityGate,
};

#[derive(Clone)]
pub struct ProductService {
    products: Arc<dyn ProductStore>,
    companies: Arc<dyn CompanyStore>,
    gate: VisibilityGate,
    storage: Arc<dyn ObjectStore>,
}

impl ProductService {
    pub fn new(
        products: Arc<dyn ProductStore>,
        companies: Arc<dyn CompanyStore>,
        gate: VisibilityGate,
        storage: Arc<dyn ObjectStore>,
    ) -> Self {
        Self {
            products,
            companies,
            gate,
            storage,
        }
    }

    /// Produto + empresa dona (a posse do produto vem da empresa).
    async fn load(&self, id: Uuid) -> Result<(Product, Company), AppError> {
        let product = guard::found(self.products.find_by_id(id).await?, EntityKind::Product)?;
        let company = self
            .companies
            .find_by_id(product.company_id)
            .await?
            .ok_or(AppError::CompanyNotFound)?;
        Ok((product, company))
    }

    /// Carrega e confere dono; com `action`, confere também o status.
    async fn load_owned(
        &self,
        actor: &Actor,
        id: Uuid,
        action: Option<LifecycleAction>,
    ) -> Result<(Product, Company), AppError> {
        let (product, company) = self.load(id).await?;
        match action {
            Some(action) => guard::authorize(actor, &product, company.owner_id, action)?,
            None => guard::require_owner(actor, company.owner_id, EntityKind::Product)?,
        }
        Ok((product, company))
    }

    async fn ensure_category(&self, category_id: Option<Uuid>) -> Result<(), AppError> {
        if let Some(id) = category_id {
            if !self.products.category_exists(id).await? {
                return Err(AppError::CategoryNotFound);
            }
        }
        Ok(())
    }

    async fn assemble(&self, product: Product) -> Result<ProductResponse, AppError> {
        let images = self.products.list_images(product.id).await?;
        let variants = self.products.list_variants(product.id).await?;
        Ok(ProductResponse::assemble(product, images, variants))
    }

    // ---
    // CRUD
    // ---

    pub async fn create(
        &self,
        actor: &Actor,
        payload: CreateProductPayload,
    ) -> Result<ProductResponse, AppError> {
        payload.validate()?;

        let company = self
            .companies
            .find_by_id(payload.company_id)
            .await?
            .ok_or(AppError::CompanyNotFound)?;
        guard::require_owner(actor, company.owner_id, EntityKind::Company)?;
        if !company.can_create_products() {
            return Err(AppError::CompanyNotApproved(company.id));
        }
        self.ensure_category(payload.category_id).await?;

        let (product, variants) = self.products.create(&payload, actor.id).await?;
        tracing::info!(
            "📦 Produto {} criado na empresa {} com {} variante(s)",
            product.id,
            company.id,
            variants.len()
        );
        Ok(ProductResponse::assemble(product, Vec::new(), variants))
    }

    /// Mesma regra da listagem: não aprovado só para o dono (ou admin),
    /// aprovado passa pelo gate de visibilidade da empresa.
    pub async fn get_by_id(
        &self,
        id: Uuid,
        viewer: Option<&Actor>,
    ) -> Result<ProductResponse, AppError> {
        let (product, company) = self.load(id).await?;

        let privileged = viewer.is_some_and(|a| a.is_admin() || company.is_owned_by(a.id));
        if !privileged {
            if !product.is_visible() {
                return Err(AppError::forbidden("produto ainda não está disponível"));
            }
            if !self.gate.check(&company, viewer.map(|a| a.id)).await? {
                return Err(AppError::forbidden(
                    "os produtos desta empresa não estão visíveis para você",
                ));
            }
        }

        self.assemble(product).await
    }

    pub async fn list(
        &self,
        query: ProductListQuery,
        viewer: Option<&Actor>,
    ) -> Result<Page<ProductResponse>, AppError> {
        let scope = ViewerScope::of(viewer);
        let filter = ProductFilter {
            viewer: scope,
            company_id: query.company_id,
            category_id: query.category_id,
            search: query.search,
            approval_status: default_status(query.approval_status, scope),
            is_active: Some(query.is_active.unwrap_or(true)),
            page: PageRequest::new(query.page, query.limit)?,
        };

        let page = self.products.list(&filter).await?;

        // Imagens e variantes em lote, sem N+1
        let ids: Vec<Uuid> = page.data.iter().map(|p| p.id).collect();
        let mut images = self.products.list_images_for(&ids).await?;
        let mut variants = self.products.list_variants_for(&ids).await?;

        Ok(page.map(|product| {
            let product_images = images.remove(&product.id).unwrap_or_default();
            let product_variants = variants.remove(&product.id).unwrap_or_default();
            ProductResponse::assemble(product, product_images, product_variants)
        }))
    }

    pub async fn update(
        &self,
        actor: &Actor,
        id: Uuid,
        payload: UpdateProductPayload,
    ) -> Result<ProductResponse, AppError> {
        payload.validate()?;
        let (mut product, _) = self
            .load_owned(actor, id, Some(LifecycleAction::Modify))
            .await?;
        self.ensure_category(payload.category_id).await?;

        product.apply_changes(payload);
        let updated = self.products.update(&product).await?;
        tracing::info!("✏️ Produto {} atualizado por {}", id, actor.id);
        self.assemble(updated).await
    }

    pub async fn delete(&self, actor: &Actor, id: Uuid) -> Result<(), AppError> {
        self.load_owned(actor, id, Some(LifecycleAction::Deactivate))
            .await?;
        self.products.soft_delete(id).await?;
        tracing::info!("🗑️ Produto {} desativado pelo dono {}", id, actor.id);
        Ok(())
    }

    // ---
    // Fluxo de aprovação
    // ---

    pub async fn resubmit(&self, actor: &Actor, id: Uuid) -> Result<Product, AppError> {
        self.load_owned(actor, id, Some(LifecycleAction::Resubmit))
            .await?;
        let updated = self
            .products
            .transition(id, &Transition::resubmit(actor.id))
            .await?;
        tracing::info!("🔁 Produto {} reenviado por {}", id, actor.id);
        Ok(updated)
    }

    /// Além do status, a empresa precisa continuar APPROVED e ativa.
    pub async fn approve(
        &self,
        actor: &Actor,
        id: Uuid,
        notes: Option<String>,
    ) -> Result<Product, AppError> {
        let (product, company) = self.load(id).await?;
        guard::authorize(actor, &product, company.owner_id, LifecycleAction::Approve)?;
        if !company.can_create_products() {
            return Err(AppError::CompanyNotApproved(company.id));
        }

        let updated = self
            .products
            .transition(id, &Transition::approve(actor.id, notes))
            .await?;
        tracing::info!("✅ Produto {} aprovado por {}", id, actor.id);
        Ok(updated)
    }

    pub async fn reject(
        &self,
        actor: &Actor,
        id: Uuid,
        payload: RejectPayload,
    ) -> Result<Product, AppError> {
        payload.validate()?;
        let (product, company) = self.load(id).await?;
        guard::authorize(actor, &product, company.owner_id, LifecycleAction::Reject)?;

        let transition = Transition::reject(actor.id, &payload.reason, payload.notes)?;
        let updated = self.products.transition(id, &transition).await?;
        tracing::info!("⛔ Produto {} rejeitado por {}", id, actor.id);
        Ok(updated)
    }

    pub async fn approval_history(
        &self,
        actor: &Actor,
        id: Uuid,
    ) -> Result<Vec<ApprovalHistory>, AppError> {
        let (_, company) = self.load(id).await?;
        guard::require_owner_or_admin(actor, company.owner_id, EntityKind::Product)?;
        self.products.approval_history(id).await
    }

    pub async fn count_pending(&self, actor: &Actor) -> Result<i64, AppError> {
        guard::require_admin(actor)?;
        self.products.count_pending().await
    }

    // ---
    // Variantes (conteúdo do produto: mesma regra de edição)
    // ---

    async fn load_variant(
        &self,
        product_id: Uuid,
        variant_id: Uuid,
    ) -> Result<ProductVariant, AppError> {
        match self.products.find_variant(variant_id).await? {
            Some(variant) if variant.product_id == product_id => Ok(variant),
            _ => Err(AppError::VariantNotFound),
        }
    }

    pub async fn create_variant(
        &self,
        actor: &Actor,
        product_id: Uuid,
        payload: CreateVariantPayload,
    ) -> Result<ProductVariant, AppError> {
        payload.validate()?;
        self.load_owned(actor, product_id, Some(LifecycleAction::Modify))
            .await?;
        self.products.create_variant(product_id, &payload).await
    }

    pub async fn update_variant(
        &self,
        actor: &Actor,
        product_id: Uuid,
        variant_id: Uuid,
        payload: UpdateVariantPayload,
    ) -> Result<ProductVariant, AppError> {
        payload.validate()?;
        self.load_owned(actor, product_id, Some(LifecycleAction::Modify))
            .await?;
        let mut variant = self.load_variant(product_id, variant_id).await?;

        variant.apply_changes(payload);
        self.products.update_variant(&variant).await
    }

    pub async fn delete_variant(
        &self,
        actor: &Actor,
        product_id: Uuid,
        variant_id: Uuid,
    ) -> Result<(), AppError> {
        self.load_owned(actor, product_id, Some(LifecycleAction::Modify))
            .await?;
        self.load_variant(product_id, variant_id).await?;

        if !self.products.delete_variant(product_id, variant_id).await? {
            return Err(AppError::LastVariant);
        }
        tracing::info!("🗑️ Variante {} removida do produto {}", variant_id, product_id);
        Ok(())
    }

    // ---
    // Imagens
    // ---

    /// Gera a URL de upload e já registra a imagem (chave definida pelo servidor).
    pub async fn presign_image(
        &self,
        actor: &Actor,
        product_id: Uuid,
        payload: ImageUploadPayload,
    ) -> Result<ImageUploadResponse, AppError> {
        payload.validate()?;
        ensure_image_content_type(&payload.content_type)?;
        self.load_owned(actor, product_id, None).await?;

        let image_id = Uuid::new_v4();
        let key = image_storage_key(product_id, image_id);
        let upload = self
            .storage
            .presign_upload(&key, &payload.content_type)
            .await?;

        let image = self
            .products
            .create_image(&NewImage {
                id: image_id,
                product_id,
                image_url: self.storage.public_url(&key),
                storage_key: key,
                is_primary: payload.is_primary,
            })
            .await?;

        Ok(ImageUploadResponse {
            image_id: image.id,
            upload_url: upload.url,
            image_url: image.image_url,
            storage_key: upload.key,
            expires_in: upload.expires_in,
        })
    }

    pub async fn delete_image(
        &self,
        actor: &Actor,
        product_id: Uuid,
        image_id: Uuid,
    ) -> Result<(), AppError> {
        self.load_owned(actor, product_id, None).await?;
        let image = match self.products.find_image(image_id).await? {
            Some(image) if image.product_id == product_id => image,
            _ => return Err(AppError::ImageNotFound),
        };

        // Objeto primeiro: se falhar, o registro continua apontando para ele
        self.storage.delete(&image.storage_key).await?;
        self.products.delete_image(image_id).await
    }

    pub async fn set_primary_image(
        &self,
        actor: &Actor,
        product_id: Uuid,
        image_id: Uuid,
    ) -> Result<(), AppError> {
        self.load_owned(actor, product_id, None).await?;
        self.products.set_primary_image(product_id, image_id).await
    }
}
