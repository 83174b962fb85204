// src/db/memory.rs

// Store em memória para os testes dos services (sem banco).
// Um único Mutex faz o papel da transação: cada método é atômico.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::common::error::AppError;
use crate::common::pagination::{Page, PageRequest};
use crate::db::stores::{CompanyStore, FollowerStore, ProductStore, UserStore};
use crate::models::approval::{
    ApprovalAction, ApprovalHistory, ApprovalState, ApprovalStatus, EntityKind, Transition,
};
use crate::models::auth::{Role, User, ViewerScope};
use crate::models::company::{
    Company, CompanyFilter, CompanyFollower, CreateCompanyPayload, FollowerEntry,
    ProductVisibility,
};
use crate::models::product::{
    CreateProductPayload, CreateVariantPayload, NewImage, Product, ProductFilter, ProductImage,
    ProductVariant,
};
use crate::services::visibility::{Visibility, evaluate};

#[derive(Default)]
struct State {
    users: HashMap<Uuid, User>,
    companies: HashMap<Uuid, Company>,
    products: HashMap<Uuid, Product>,
    variants: HashMap<Uuid, ProductVariant>,
    images: HashMap<Uuid, ProductImage>,
    followers: Vec<CompanyFollower>,
    categories: HashSet<Uuid>,
    company_history: Vec<ApprovalHistory>,
    product_history: Vec<ApprovalHistory>,
    // Relógio monotônico: evita empates de timestamp na ordenação
    ticks: i64,
}

impl State {
    fn now(&mut self) -> DateTime<Utc> {
        self.ticks += 1;
        DateTime::<Utc>::UNIX_EPOCH + Duration::days(20_000) + Duration::milliseconds(self.ticks)
    }

    fn history_mut(&mut self, kind: EntityKind) -> &mut Vec<ApprovalHistory> {
        match kind {
            EntityKind::Company => &mut self.company_history,
            EntityKind::Product => &mut self.product_history,
        }
    }

    fn record(
        &mut self,
        kind: EntityKind,
        entity_id: Uuid,
        action: ApprovalAction,
        performed_by_id: Uuid,
        reason: Option<&str>,
        notes: Option<&str>,
    ) {
        let created_at = self.now();
        self.history_mut(kind).push(ApprovalHistory {
            id: Uuid::new_v4(),
            entity_id,
            action,
            performed_by_id,
            reason: reason.map(str::to_string),
            notes: notes.map(str::to_string),
            created_at,
        });
    }

    fn history(&self, kind: EntityKind, entity_id: Uuid) -> Vec<ApprovalHistory> {
        let rows = match kind {
            EntityKind::Company => &self.company_history,
            EntityKind::Product => &self.product_history,
        };
        let mut out: Vec<_> = rows.iter().filter(|h| h.entity_id == entity_id).cloned().collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        out
    }

    fn is_following(&self, company_id: Uuid, user_id: Uuid) -> bool {
        self.followers
            .iter()
            .any(|f| f.company_id == company_id && f.user_id == user_id)
    }

    // Mesma regra do lock_editable do repositório
    fn ensure_editable(&self, product_id: Uuid) -> Result<(), AppError> {
        match self.products.get(&product_id) {
            Some(p) if p.is_active && !p.approval.is_approved() => Ok(()),
            Some(p) if p.is_active => Err(AppError::TransitionConflict {
                entity: EntityKind::Product,
                id: product_id,
                expected: ApprovalStatus::Pending,
            }),
            _ => Err(AppError::ProductNotFound),
        }
    }

    fn product_listable(&self, product: &Product, viewer: ViewerScope) -> bool {
        let Some(company) = self.companies.get(&product.company_id) else {
            return false;
        };
        match viewer {
            ViewerScope::Admin => true,
            ViewerScope::User(id) if company.owner_id == id => true,
            _ if !product.is_visible() => false,
            _ => match evaluate(company, viewer.user_id()) {
                Visibility::Allowed => true,
                Visibility::Denied => false,
                Visibility::RequiresFollow(user_id) => self.is_following(company.id, user_id),
            },
        }
    }
}

fn paginate<T: Clone>(mut rows: Vec<T>, page: PageRequest) -> Page<T> {
    let total = rows.len() as i64;
    let offset = page.offset() as usize;
    let data = if offset >= rows.len() {
        Vec::new()
    } else {
        rows.drain(offset..).take(page.limit as usize).collect()
    };
    Page::new(data, total, page)
}

fn matches_search(name: &str, description: Option<&str>, search: Option<&str>) -> bool {
    let Some(term) = search.map(|s| s.trim().to_lowercase()).filter(|s| !s.is_empty()) else {
        return true;
    };
    name.to_lowercase().contains(&term)
        || description.is_some_and(|d| d.to_lowercase().contains(&term))
}

#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<State>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().expect("memory store poisoned")
    }

    pub fn add_category(&self) -> Uuid {
        let id = Uuid::new_v4();
        self.lock().categories.insert(id);
        id
    }

    pub fn insert_user(&self, name: &str, role: Role) -> User {
        let mut state = self.lock();
        let now = state.now();
        let user = User {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            password_hash: String::new(),
            role,
            created_at: now,
            updated_at: now,
        };
        state.users.insert(user.id, user.clone());
        user
    }

    pub fn company_history(&self, id: Uuid) -> Vec<ApprovalHistory> {
        self.lock().history(EntityKind::Company, id)
    }

    pub fn product_history(&self, id: Uuid) -> Vec<ApprovalHistory> {
        self.lock().history(EntityKind::Product, id)
    }

    pub fn company(&self, id: Uuid) -> Option<Company> {
        self.lock().companies.get(&id).cloned()
    }

    pub fn product(&self, id: Uuid) -> Option<Product> {
        self.lock().products.get(&id).cloned()
    }
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self.lock().users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self.lock().users.get(&id).cloned())
    }

    async fn create(&self, name: &str, email: &str, password_hash: &str) -> Result<User, AppError> {
        let mut state = self.lock();
        if state.users.values().any(|u| u.email == email) {
            return Err(AppError::EmailAlreadyExists);
        }
        let now = state.now();
        let user = User {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            role: Role::User,
            created_at: now,
            updated_at: now,
        };
        state.users.insert(user.id, user.clone());
        Ok(user)
    }
}

#[async_trait]
impl CompanyStore for InMemoryStore {
    async fn create(
        &self,
        owner_id: Uuid,
        payload: &CreateCompanyPayload,
    ) -> Result<Company, AppError> {
        let mut state = self.lock();
        let name = payload.name.trim().to_string();
        if state
            .companies
            .values()
            .any(|c| c.owner_id == owner_id && c.name == name)
        {
            return Err(AppError::CompanyNameAlreadyExists(name));
        }

        let now = state.now();
        let company = Company {
            id: Uuid::new_v4(),
            owner_id,
            name,
            description: payload.description.clone(),
            logo_url: payload.logo_url.clone(),
            business_email: payload.business_email.clone(),
            business_phone: payload.business_phone.clone(),
            city: payload.city.clone(),
            state: payload.state.clone(),
            pincode: payload.pincode.clone(),
            gst_number: payload.gst_number.clone(),
            pan_number: payload.pan_number.clone(),
            approval: ApprovalState::submitted(now),
            product_visibility: payload.product_visibility.unwrap_or_default(),
            follower_count: 0,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        state.companies.insert(company.id, company.clone());
        state.record(
            EntityKind::Company,
            company.id,
            ApprovalAction::Submitted,
            owner_id,
            None,
            None,
        );
        Ok(company)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Company>, AppError> {
        Ok(self.lock().companies.get(&id).cloned())
    }

    async fn find_by_owner_and_name(
        &self,
        owner_id: Uuid,
        name: &str,
    ) -> Result<Option<Company>, AppError> {
        let name = name.trim();
        Ok(self
            .lock()
            .companies
            .values()
            .find(|c| c.owner_id == owner_id && c.name == name)
            .cloned())
    }

    async fn list(&self, filter: &CompanyFilter) -> Result<Page<Company>, AppError> {
        let state = self.lock();
        let mut rows: Vec<Company> = state
            .companies
            .values()
            .filter(|c| match filter.viewer {
                ViewerScope::Admin => true,
                ViewerScope::Anonymous => c.can_be_followed(),
                ViewerScope::User(id) => c.can_be_followed() || c.owner_id == id,
            })
            .filter(|c| filter.owner_id.is_none_or(|o| c.owner_id == o))
            .filter(|c| {
                filter
                    .approval_status
                    .is_none_or(|s| c.approval.approval_status == s)
            })
            .filter(|c| filter.is_active.is_none_or(|a| c.is_active == a))
            .filter(|c| matches_search(&c.name, c.description.as_deref(), filter.search.as_deref()))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.approval.submitted_at.cmp(&a.approval.submitted_at));
        Ok(paginate(rows, filter.page))
    }

    async fn update_profile(&self, company: &Company) -> Result<Company, AppError> {
        let mut state = self.lock();
        let now = state.now();
        let conflict = state.companies.values().any(|c| {
            c.id != company.id && c.owner_id == company.owner_id && c.name == company.name
        });
        if conflict {
            return Err(AppError::CompanyNameAlreadyExists(company.name.clone()));
        }
        let stored = state
            .companies
            .get_mut(&company.id)
            .ok_or(AppError::CompanyNotFound)?;
        if !stored.is_active || stored.approval.is_approved() {
            return Err(AppError::TransitionConflict {
                entity: EntityKind::Company,
                id: company.id,
                expected: company.approval.approval_status,
            });
        }
        let approval = stored.approval.clone();
        let follower_count = stored.follower_count;
        *stored = Company {
            approval,
            follower_count,
            updated_at: now,
            ..company.clone()
        };
        Ok(stored.clone())
    }

    async fn set_visibility(
        &self,
        id: Uuid,
        visibility: ProductVisibility,
    ) -> Result<Company, AppError> {
        let mut state = self.lock();
        let now = state.now();
        let stored = state.companies.get_mut(&id).ok_or(AppError::CompanyNotFound)?;
        stored.product_visibility = visibility;
        stored.updated_at = now;
        Ok(stored.clone())
    }

    async fn soft_delete(&self, id: Uuid) -> Result<(), AppError> {
        let mut state = self.lock();
        let stored = state.companies.get_mut(&id).ok_or(AppError::CompanyNotFound)?;
        if !stored.is_active || stored.approval.is_approved() {
            return Err(AppError::TransitionConflict {
                entity: EntityKind::Company,
                id,
                expected: ApprovalStatus::Pending,
            });
        }
        stored.is_active = false;
        Ok(())
    }

    async fn deactivate(&self, id: Uuid) -> Result<Company, AppError> {
        let mut state = self.lock();
        let stored = state.companies.get_mut(&id).ok_or(AppError::CompanyNotFound)?;
        stored.is_active = false;
        Ok(stored.clone())
    }

    async fn transition(&self, id: Uuid, transition: &Transition) -> Result<Company, AppError> {
        let mut state = self.lock();
        let now = state.now();
        let stored = state.companies.get_mut(&id).ok_or(AppError::TransitionConflict {
            entity: EntityKind::Company,
            id,
            expected: transition.from_status(),
        })?;
        if !stored.is_active || !stored.approval.apply(transition, now) {
            return Err(AppError::TransitionConflict {
                entity: EntityKind::Company,
                id,
                expected: transition.from_status(),
            });
        }
        stored.updated_at = now;
        let updated = stored.clone();
        state.record(
            EntityKind::Company,
            id,
            transition.history_action(),
            transition.performed_by(),
            transition.reason(),
            transition.notes(),
        );
        Ok(updated)
    }

    async fn approval_history(&self, id: Uuid) -> Result<Vec<ApprovalHistory>, AppError> {
        Ok(self.lock().history(EntityKind::Company, id))
    }

    async fn count_pending(&self) -> Result<i64, AppError> {
        Ok(self
            .lock()
            .companies
            .values()
            .filter(|c| c.approval.is_pending() && c.is_active)
            .count() as i64)
    }
}

#[async_trait]
impl FollowerStore for InMemoryStore {
    async fn follow(&self, company_id: Uuid, user_id: Uuid) -> Result<CompanyFollower, AppError> {
        let mut state = self.lock();
        if let Some(existing) = state
            .followers
            .iter()
            .find(|f| f.company_id == company_id && f.user_id == user_id)
        {
            return Ok(existing.clone());
        }
        let followed_at = state.now();
        let follower = CompanyFollower {
            id: Uuid::new_v4(),
            company_id,
            user_id,
            followed_at,
        };
        state.followers.push(follower.clone());
        if let Some(company) = state.companies.get_mut(&company_id) {
            company.follower_count += 1;
        }
        Ok(follower)
    }

    async fn unfollow(&self, company_id: Uuid, user_id: Uuid) -> Result<bool, AppError> {
        let mut state = self.lock();
        let before = state.followers.len();
        state
            .followers
            .retain(|f| !(f.company_id == company_id && f.user_id == user_id));
        let removed = state.followers.len() < before;
        if removed {
            if let Some(company) = state.companies.get_mut(&company_id) {
                company.follower_count = (company.follower_count - 1).max(0);
            }
        }
        Ok(removed)
    }

    async fn find(
        &self,
        company_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<CompanyFollower>, AppError> {
        Ok(self
            .lock()
            .followers
            .iter()
            .find(|f| f.company_id == company_id && f.user_id == user_id)
            .cloned())
    }

    async fn is_following(&self, company_id: Uuid, user_id: Uuid) -> Result<bool, AppError> {
        Ok(self.lock().is_following(company_id, user_id))
    }

    async fn follow_status_batch(
        &self,
        company_ids: &[Uuid],
        user_id: Uuid,
    ) -> Result<HashMap<Uuid, bool>, AppError> {
        let state = self.lock();
        Ok(company_ids
            .iter()
            .map(|id| (*id, state.is_following(*id, user_id)))
            .collect())
    }

    async fn list_followers(
        &self,
        company_id: Uuid,
        page: PageRequest,
    ) -> Result<Page<FollowerEntry>, AppError> {
        let state = self.lock();
        let mut rows: Vec<FollowerEntry> = state
            .followers
            .iter()
            .filter(|f| f.company_id == company_id)
            .filter_map(|f| {
                state.users.get(&f.user_id).map(|u| FollowerEntry {
                    id: f.id,
                    company_id: f.company_id,
                    user_id: f.user_id,
                    user_name: u.name.clone(),
                    user_email: u.email.clone(),
                    followed_at: f.followed_at,
                })
            })
            .collect();
        rows.sort_by(|a, b| b.followed_at.cmp(&a.followed_at));
        Ok(paginate(rows, page))
    }

    async fn list_followed_companies(
        &self,
        user_id: Uuid,
        page: PageRequest,
    ) -> Result<Page<Company>, AppError> {
        let state = self.lock();
        let mut follows: Vec<&CompanyFollower> =
            state.followers.iter().filter(|f| f.user_id == user_id).collect();
        follows.sort_by(|a, b| b.followed_at.cmp(&a.followed_at));
        let rows: Vec<Company> = follows
            .into_iter()
            .filter_map(|f| state.companies.get(&f.company_id))
            .filter(|c| c.is_active)
            .cloned()
            .collect();
        Ok(paginate(rows, page))
    }
}

#[async_trait]
impl ProductStore for InMemoryStore {
    async fn create(
        &self,
        payload: &CreateProductPayload,
        submitted_by: Uuid,
    ) -> Result<(Product, Vec<ProductVariant>), AppError> {
        let mut state = self.lock();
        let now = state.now();
        let product = Product {
            id: Uuid::new_v4(),
            company_id: payload.company_id,
            category_id: payload.category_id,
            name: payload.name.trim().to_string(),
            description: payload.description.clone(),
            unit: payload.unit.clone(),
            origin: payload.origin.clone(),
            base_price: payload.base_price,
            approval: ApprovalState::submitted(now),
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        state.products.insert(product.id, product.clone());

        let mut variants = Vec::new();
        for input in &payload.variants {
            let variant = new_variant(&mut state, product.id, input);
            state.variants.insert(variant.id, variant.clone());
            variants.push(variant);
        }

        state.record(
            EntityKind::Product,
            product.id,
            ApprovalAction::Submitted,
            submitted_by,
            None,
            None,
        );
        Ok((product, variants))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Product>, AppError> {
        Ok(self.lock().products.get(&id).cloned())
    }

    async fn list(&self, filter: &ProductFilter) -> Result<Page<Product>, AppError> {
        let state = self.lock();
        let mut rows: Vec<Product> = state
            .products
            .values()
            .filter(|p| state.product_listable(p, filter.viewer))
            .filter(|p| filter.company_id.is_none_or(|c| p.company_id == c))
            .filter(|p| filter.category_id.is_none_or(|c| p.category_id == Some(c)))
            .filter(|p| {
                filter
                    .approval_status
                    .is_none_or(|s| p.approval.approval_status == s)
            })
            .filter(|p| filter.is_active.is_none_or(|a| p.is_active == a))
            .filter(|p| matches_search(&p.name, p.description.as_deref(), filter.search.as_deref()))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.approval.submitted_at.cmp(&a.approval.submitted_at));
        Ok(paginate(rows, filter.page))
    }

    async fn update(&self, product: &Product) -> Result<Product, AppError> {
        let mut state = self.lock();
        let now = state.now();
        let stored = state
            .products
            .get_mut(&product.id)
            .ok_or(AppError::ProductNotFound)?;
        if !stored.is_active || stored.approval.is_approved() {
            return Err(AppError::TransitionConflict {
                entity: EntityKind::Product,
                id: product.id,
                expected: product.approval.approval_status,
            });
        }
        let approval = stored.approval.clone();
        *stored = Product {
            approval,
            updated_at: now,
            ..product.clone()
        };
        Ok(stored.clone())
    }

    async fn soft_delete(&self, id: Uuid) -> Result<(), AppError> {
        let mut state = self.lock();
        let stored = state.products.get_mut(&id).ok_or(AppError::ProductNotFound)?;
        if !stored.is_active || stored.approval.is_approved() {
            return Err(AppError::TransitionConflict {
                entity: EntityKind::Product,
                id,
                expected: ApprovalStatus::Pending,
            });
        }
        stored.is_active = false;
        Ok(())
    }

    async fn transition(&self, id: Uuid, transition: &Transition) -> Result<Product, AppError> {
        let mut state = self.lock();
        let now = state.now();
        let conflict = AppError::TransitionConflict {
            entity: EntityKind::Product,
            id,
            expected: transition.from_status(),
        };
        let Some(stored) = state.products.get_mut(&id) else {
            return Err(conflict);
        };
        if !stored.is_active || !stored.approval.apply(transition, now) {
            return Err(conflict);
        }
        stored.updated_at = now;
        let updated = stored.clone();
        state.record(
            EntityKind::Product,
            id,
            transition.history_action(),
            transition.performed_by(),
            transition.reason(),
            transition.notes(),
        );
        Ok(updated)
    }

    async fn approval_history(&self, id: Uuid) -> Result<Vec<ApprovalHistory>, AppError> {
        Ok(self.lock().history(EntityKind::Product, id))
    }

    async fn count_pending(&self) -> Result<i64, AppError> {
        Ok(self
            .lock()
            .products
            .values()
            .filter(|p| p.approval.is_pending() && p.is_active)
            .count() as i64)
    }

    async fn category_exists(&self, id: Uuid) -> Result<bool, AppError> {
        Ok(self.lock().categories.contains(&id))
    }

    async fn list_variants(&self, product_id: Uuid) -> Result<Vec<ProductVariant>, AppError> {
        let mut rows: Vec<ProductVariant> = self
            .lock()
            .variants
            .values()
            .filter(|v| v.product_id == product_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(rows)
    }

    async fn list_variants_for(
        &self,
        product_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, Vec<ProductVariant>>, AppError> {
        let mut grouped: HashMap<Uuid, Vec<ProductVariant>> = HashMap::new();
        for id in product_ids {
            grouped.insert(*id, self.list_variants(*id).await?);
        }
        Ok(grouped)
    }

    async fn find_variant(&self, id: Uuid) -> Result<Option<ProductVariant>, AppError> {
        Ok(self.lock().variants.get(&id).cloned())
    }

    async fn create_variant(
        &self,
        product_id: Uuid,
        payload: &CreateVariantPayload,
    ) -> Result<ProductVariant, AppError> {
        let mut state = self.lock();
        state.ensure_editable(product_id)?;
        let variant = new_variant(&mut state, product_id, payload);
        state.variants.insert(variant.id, variant.clone());
        Ok(variant)
    }

    async fn update_variant(&self, variant: &ProductVariant) -> Result<ProductVariant, AppError> {
        let mut state = self.lock();
        state.ensure_editable(variant.product_id)?;
        let now = state.now();
        let stored = state
            .variants
            .get_mut(&variant.id)
            .filter(|v| v.product_id == variant.product_id)
            .ok_or(AppError::VariantNotFound)?;
        *stored = ProductVariant {
            updated_at: now,
            ..variant.clone()
        };
        Ok(stored.clone())
    }

    async fn delete_variant(&self, product_id: Uuid, variant_id: Uuid) -> Result<bool, AppError> {
        let mut state = self.lock();
        state.ensure_editable(product_id)?;
        let siblings = state
            .variants
            .values()
            .filter(|v| v.product_id == product_id)
            .count();
        match state.variants.get(&variant_id) {
            Some(v) if v.product_id == product_id => {}
            _ => return Err(AppError::VariantNotFound),
        }
        if siblings <= 1 {
            return Ok(false);
        }
        state.variants.remove(&variant_id);
        Ok(true)
    }

    async fn create_image(&self, image: &NewImage) -> Result<ProductImage, AppError> {
        let mut state = self.lock();
        let now = state.now();
        if image.is_primary {
            for other in state
                .images
                .values_mut()
                .filter(|i| i.product_id == image.product_id)
            {
                other.is_primary = false;
            }
        }
        let created = ProductImage {
            id: image.id,
            product_id: image.product_id,
            image_url: image.image_url.clone(),
            storage_key: image.storage_key.clone(),
            is_primary: image.is_primary,
            created_at: now,
            updated_at: now,
        };
        state.images.insert(created.id, created.clone());
        Ok(created)
    }

    async fn find_image(&self, id: Uuid) -> Result<Option<ProductImage>, AppError> {
        Ok(self.lock().images.get(&id).cloned())
    }

    async fn list_images(&self, product_id: Uuid) -> Result<Vec<ProductImage>, AppError> {
        let mut rows: Vec<ProductImage> = self
            .lock()
            .images
            .values()
            .filter(|i| i.product_id == product_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            b.is_primary
                .cmp(&a.is_primary)
                .then(a.created_at.cmp(&b.created_at))
        });
        Ok(rows)
    }

    async fn list_images_for(
        &self,
        product_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, Vec<ProductImage>>, AppError> {
        let mut grouped = HashMap::new();
        for id in product_ids {
            grouped.insert(*id, self.list_images(*id).await?);
        }
        Ok(grouped)
    }

    async fn delete_image(&self, id: Uuid) -> Result<(), AppError> {
        self.lock()
            .images
            .remove(&id)
            .map(|_| ())
            .ok_or(AppError::ImageNotFound)
    }

    async fn set_primary_image(&self, product_id: Uuid, image_id: Uuid) -> Result<(), AppError> {
        let mut state = self.lock();
        match state.images.get(&image_id) {
            Some(i) if i.product_id == product_id => {}
            _ => return Err(AppError::ImageNotFound),
        }
        for image in state
            .images
            .values_mut()
            .filter(|i| i.product_id == product_id)
        {
            image.is_primary = image.id == image_id;
        }
        Ok(())
    }
}

fn new_variant(
    state: &mut State,
    product_id: Uuid,
    input: &CreateVariantPayload,
) -> ProductVariant {
    let now = state.now();
    ProductVariant {
        id: Uuid::new_v4(),
        product_id,
        label: input.label.trim().to_string(),
        quantity_value: input.quantity_value,
        quantity_unit: input.quantity_unit.clone(),
        price: input.price,
        stock_quantity: input.stock_quantity,
        low_stock_threshold: input.low_stock_threshold,
        is_available: true,
        created_at: now,
        updated_at: now,
    }
}
