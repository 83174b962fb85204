// src/services/company_service.rs

use std::collections::HashMap;
use std::sync::Arc;

use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    common::pagination::{Page, PageRequest},
    db::stores::{CompanyStore, FollowerStore},
    models::approval::{
        ApprovalHistory, ApprovalStatus, EntityKind, LifecycleAction, RejectPayload, Transition,
    },
    models::auth::{Actor, ViewerScope},
    models::company::{
        Company, CompanyFilter, CompanyFollower, CompanyListQuery, CompanyResponse,
        CreateCompanyPayload, FollowStatus, FollowerEntry, ProductVisibility,
        UpdateCompanyPayload,
    },
    services::guard,
    services::visibility::VisibilityGate,
};

#[derive(Clone)]
pub struct CompanyService {
    companies: Arc<dyn CompanyStore>,
    followers: Arc<dyn FollowerStore>,
    gate: VisibilityGate,
}

impl CompanyService {
    pub fn new(companies: Arc<dyn CompanyStore>, followers: Arc<dyn FollowerStore>) -> Self {
        let gate = VisibilityGate::new(companies.clone(), followers.clone());
        Self {
            companies,
            followers,
            gate,
        }
    }

    pub fn gate(&self) -> &VisibilityGate {
        &self.gate
    }

    async fn load(&self, id: Uuid) -> Result<Company, AppError> {
        guard::found(self.companies.find_by_id(id).await?, EntityKind::Company)
    }

    // ---
    // CRUD
    // ---

    /// Cria a empresa em PENDING, com histórico SUBMITTED.
    pub async fn create(
        &self,
        actor: &Actor,
        payload: CreateCompanyPayload,
    ) -> Result<Company, AppError> {
        payload.validate()?;

        let already_exists = self
            .companies
            .find_by_owner_and_name(actor.id, &payload.name)
            .await?
            .is_some();
        if already_exists {
            return Err(AppError::CompanyNameAlreadyExists(
                payload.name.trim().to_string(),
            ));
        }

        let company = self.companies.create(actor.id, &payload).await?;
        tracing::info!("🏢 Empresa {} criada por {} (PENDING)", company.id, actor.id);
        Ok(company)
    }

    /// Não aprovadas/inativas só para o dono ou admin.
    pub async fn get_by_id(
        &self,
        id: Uuid,
        viewer: Option<&Actor>,
    ) -> Result<CompanyResponse, AppError> {
        let company = self.load(id).await?;

        let privileged = viewer.is_some_and(|a| a.is_admin() || company.is_owned_by(a.id));
        if !company.can_be_followed() && !privileged {
            return Err(AppError::forbidden("empresa ainda não está disponível"));
        }

        let is_following = match viewer {
            Some(actor) => Some(self.followers.is_following(company.id, actor.id).await?),
            None => None,
        };
        Ok(CompanyResponse::new(company, is_following))
    }

    pub async fn list(
        &self,
        query: CompanyListQuery,
        viewer: Option<&Actor>,
    ) -> Result<Page<CompanyResponse>, AppError> {
        let scope = ViewerScope::of(viewer);
        let filter = CompanyFilter {
            viewer: scope,
            owner_id: query.owner_id,
            search: query.search,
            approval_status: default_status(query.approval_status, scope),
            is_active: Some(query.is_active.unwrap_or(true)),
            page: PageRequest::new(query.page, query.limit)?,
        };

        let page = self.companies.list(&filter).await?;
        self.with_follow_status(page, viewer).await
    }

    /// Empresas do próprio usuário, em qualquer status de aprovação.
    pub async fn list_owned(
        &self,
        actor: &Actor,
        page: PageRequest,
    ) -> Result<Page<CompanyResponse>, AppError> {
        let filter = CompanyFilter {
            viewer: ViewerScope::User(actor.id),
            owner_id: Some(actor.id),
            search: None,
            approval_status: None,
            is_active: Some(true),
            page,
        };
        let page = self.companies.list(&filter).await?;
        Ok(page.map(|company| CompanyResponse::new(company, None)))
    }

    async fn with_follow_status(
        &self,
        page: Page<Company>,
        viewer: Option<&Actor>,
    ) -> Result<Page<CompanyResponse>, AppError> {
        let status = match viewer {
            Some(actor) => {
                let ids: Vec<Uuid> = page.data.iter().map(|c| c.id).collect();
                Some(self.followers.follow_status_batch(&ids, actor.id).await?)
            }
            None => None,
        };
        Ok(page.map(|company| {
            let following = status
                .as_ref()
                .map(|s| s.get(&company.id).copied().unwrap_or(false));
            CompanyResponse::new(company, following)
        }))
    }

    pub async fn update(
        &self,
        actor: &Actor,
        id: Uuid,
        payload: UpdateCompanyPayload,
    ) -> Result<Company, AppError> {
        payload.validate()?;
        let mut company = self.load(id).await?;
        guard::authorize(actor, &company, company.owner_id, LifecycleAction::Modify)?;

        if let Some(name) = payload.name.as_deref().map(str::trim) {
            if name != company.name {
                if let Some(other) = self.companies.find_by_owner_and_name(actor.id, name).await? {
                    if other.id != company.id {
                        return Err(AppError::CompanyNameAlreadyExists(name.to_string()));
                    }
                }
            }
        }

        company.apply_changes(payload);
        let updated = self.companies.update_profile(&company).await?;
        tracing::info!("✏️ Empresa {} atualizada por {}", id, actor.id);
        Ok(updated)
    }

    /// Política de acesso, não conteúdo: o dono muda em qualquer status.
    pub async fn update_visibility(
        &self,
        actor: &Actor,
        id: Uuid,
        visibility: ProductVisibility,
    ) -> Result<Company, AppError> {
        let company = self.load(id).await?;
        guard::require_owner(actor, company.owner_id, EntityKind::Company)?;

        let updated = self.companies.set_visibility(id, visibility).await?;
        tracing::info!("👁️ Empresa {} agora com visibilidade {:?}", id, visibility);
        Ok(updated)
    }

    pub async fn delete(&self, actor: &Actor, id: Uuid) -> Result<(), AppError> {
        let company = self.load(id).await?;
        guard::authorize(actor, &company, company.owner_id, LifecycleAction::Deactivate)?;

        self.companies.soft_delete(id).await?;
        tracing::info!("🗑️ Empresa {} desativada pelo dono {}", id, actor.id);
        Ok(())
    }

    // ---
    // Fluxo de aprovação
    // ---

    pub async fn resubmit(&self, actor: &Actor, id: Uuid) -> Result<Company, AppError> {
        let company = self.load(id).await?;
        guard::authorize(actor, &company, company.owner_id, LifecycleAction::Resubmit)?;

        let updated = self
            .companies
            .transition(id, &Transition::resubmit(actor.id))
            .await?;
        tracing::info!("🔁 Empresa {} reenviada por {}", id, actor.id);
        Ok(updated)
    }

    pub async fn approve(
        &self,
        actor: &Actor,
        id: Uuid,
        notes: Option<String>,
    ) -> Result<Company, AppError> {
        let company = self.load(id).await?;
        guard::authorize(actor, &company, company.owner_id, LifecycleAction::Approve)?;

        let updated = self
            .companies
            .transition(id, &Transition::approve(actor.id, notes))
            .await?;
        tracing::info!("✅ Empresa {} aprovada por {}", id, actor.id);
        Ok(updated)
    }

    pub async fn reject(
        &self,
        actor: &Actor,
        id: Uuid,
        payload: RejectPayload,
    ) -> Result<Company, AppError> {
        payload.validate()?;
        let company = self.load(id).await?;
        guard::authorize(actor, &company, company.owner_id, LifecycleAction::Reject)?;

        let transition = Transition::reject(actor.id, &payload.reason, payload.notes)?;
        let updated = self.companies.transition(id, &transition).await?;
        tracing::info!("⛔ Empresa {} rejeitada por {}", id, actor.id);
        Ok(updated)
    }

    /// Caminho explícito para tirar uma vitrine aprovada do ar.
    pub async fn deactivate(&self, actor: &Actor, id: Uuid) -> Result<Company, AppError> {
        guard::require_admin(actor)?;
        self.load(id).await?;

        let updated = self.companies.deactivate(id).await?;
        tracing::info!("🚫 Empresa {} desativada pelo admin {}", id, actor.id);
        Ok(updated)
    }

    pub async fn approval_history(
        &self,
        actor: &Actor,
        id: Uuid,
    ) -> Result<Vec<ApprovalHistory>, AppError> {
        let company = self.load(id).await?;
        guard::require_owner_or_admin(actor, company.owner_id, EntityKind::Company)?;
        self.companies.approval_history(id).await
    }

    pub async fn count_pending(&self, actor: &Actor) -> Result<i64, AppError> {
        guard::require_admin(actor)?;
        self.companies.count_pending().await
    }

    // ---
    // Seguidores
    // ---

    pub async fn follow(&self, actor: &Actor, id: Uuid) -> Result<CompanyFollower, AppError> {
        let company = self.load(id).await?;
        if company.is_owned_by(actor.id) {
            return Err(AppError::CannotFollowOwnCompany);
        }
        if !company.can_be_followed() {
            return Err(AppError::CompanyNotApproved(id));
        }

        let follower = self.followers.follow(id, actor.id).await?;
        tracing::info!("➕ Usuário {} segue a empresa {}", actor.id, id);
        Ok(follower)
    }

    /// Deixar de seguir sem estar seguindo não é erro.
    pub async fn unfollow(&self, actor: &Actor, id: Uuid) -> Result<(), AppError> {
        self.load(id).await?;
        let removed = self.followers.unfollow(id, actor.id).await?;
        if removed {
            tracing::info!("➖ Usuário {} deixou de seguir a empresa {}", actor.id, id);
        }
        Ok(())
    }

    pub async fn follow_status(&self, actor: &Actor, id: Uuid) -> Result<FollowStatus, AppError> {
        self.load(id).await?;
        let follow = self.followers.find(id, actor.id).await?;
        Ok(FollowStatus {
            company_id: id,
            is_following: follow.is_some(),
            followed_at: follow.map(|f| f.followed_at),
        })
    }

    pub async fn follow_status_batch(
        &self,
        actor: &Actor,
        company_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, bool>, AppError> {
        self.followers.follow_status_batch(company_ids, actor.id).await
    }

    /// Lista de seguidores expõe e-mails: só dono ou admin.
    pub async fn list_followers(
        &self,
        actor: &Actor,
        id: Uuid,
        page: PageRequest,
    ) -> Result<Page<FollowerEntry>, AppError> {
        let company = self.load(id).await?;
        guard::require_owner_or_admin(actor, company.owner_id, EntityKind::Company)?;
        self.followers.list_followers(id, page).await
    }

    pub async fn list_followed_companies(
        &self,
        actor: &Actor,
        page: PageRequest,
    ) -> Result<Page<CompanyResponse>, AppError> {
        let companies = self.followers.list_followed_companies(actor.id, page).await?;
        Ok(companies.map(|c| CompanyResponse::new(c, Some(true))))
    }

    pub async fn can_view_products(
        &self,
        id: Uuid,
        viewer: Option<&Actor>,
    ) -> Result<bool, AppError> {
        self.gate.can_view_products(id, viewer.map(|a| a.id)).await
    }
}

/// Sem filtro explícito, quem não é admin só vê APPROVED.
pub(crate) fn default_status(
    requested: Option<ApprovalStatus>,
    viewer: ViewerScope,
) -> Option<ApprovalStatus> {
    match (requested, viewer) {
        (Some(status), _) => Some(status),
        (None, ViewerScope::Admin) => None,
        (None, _) => Some(ApprovalStatus::Approved),
    }
}
