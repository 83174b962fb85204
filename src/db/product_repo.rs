// src/db/product_repo.rs

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{Executor, PgConnection, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::common::db_utils::like_pattern;
use crate::common::error::AppError;
use crate::common::pagination::Page;
use crate::db::approval_sql::{self, PRODUCT_APPROVAL};
use crate::db::stores::ProductStore;
use crate::models::approval::{ApprovalAction, ApprovalHistory, ApprovalStatus, Transition};
use crate::models::auth::ViewerScope;
use crate::models::product::{
    CreateProductPayload, CreateVariantPayload, NewImage, Product, ProductFilter, ProductImage,
    ProductVariant,
};

#[derive(Clone)]
pub struct ProductRepository {
    pool: PgPool,
}

impl ProductRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn insert_variant<'e, E>(
        &self,
        executor: E,
        product_id: Uuid,
        payload: &CreateVariantPayload,
    ) -> Result<ProductVariant, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let variant = sqlx::query_as::<_, ProductVariant>(
            r#"
            INSERT INTO product_variants (
                product_id, label, quantity_value, quantity_unit, price,
                stock_quantity, low_stock_threshold
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(product_id)
        .bind(payload.label.trim())
        .bind(payload.quantity_value)
        .bind(&payload.quantity_unit)
        .bind(payload.price)
        .bind(payload.stock_quantity)
        .bind(payload.low_stock_threshold)
        .fetch_one(executor)
        .await?;
        Ok(variant)
    }
}

/// Trava a linha do produto até o fim da transação. Variantes são conteúdo revisado:
/// com o produto APPROVED (ou removido) a escrita perde, mesmo que o guard tenha passado.
async fn lock_editable(conn: &mut PgConnection, product_id: Uuid) -> Result<(), AppError> {
    let status: Option<ApprovalStatus> = sqlx::query_scalar(
        "SELECT approval_status FROM products WHERE id = $1 AND is_active FOR UPDATE",
    )
    .bind(product_id)
    .fetch_optional(&mut *conn)
    .await?;

    match status {
        None => Err(AppError::ProductNotFound),
        Some(ApprovalStatus::Approved) => Err(AppError::TransitionConflict {
            entity: PRODUCT_APPROVAL.kind,
            id: product_id,
            expected: ApprovalStatus::Pending,
        }),
        Some(_) => Ok(()),
    }
}

// Regra de visibilidade da listagem, espelho do gate de leitura
fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &ProductFilter) {
    const PUBLICLY_LISTED: &str = "(p.approval_status = 'APPROVED' AND p.is_active \
         AND c.approval_status = 'APPROVED' AND c.is_active";

    match filter.viewer {
        ViewerScope::Admin => {}
        ViewerScope::Anonymous => {
            qb.push(" AND ")
                .push(PUBLICLY_LISTED)
                .push(" AND c.product_visibility = 'PUBLIC')");
        }
        ViewerScope::User(user_id) => {
            qb.push(" AND (c.owner_id = ")
                .push_bind(user_id)
                .push(" OR ")
                .push(PUBLICLY_LISTED)
                .push(
                    " AND (c.product_visibility = 'PUBLIC' OR (c.product_visibility = 'FOLLOWERS_ONLY' \
                     AND EXISTS (SELECT 1 FROM company_followers f WHERE f.company_id = c.id AND f.user_id = ",
                )
                .push_bind(user_id)
                .push(")))))");
        }
    }

    if let Some(company_id) = filter.company_id {
        qb.push(" AND p.company_id = ").push_bind(company_id);
    }
    if let Some(category_id) = filter.category_id {
        qb.push(" AND p.category_id = ").push_bind(category_id);
    }
    if let Some(status) = filter.approval_status {
        qb.push(" AND p.approval_status = ").push_bind(status);
    }
    if let Some(is_active) = filter.is_active {
        qb.push(" AND p.is_active = ").push_bind(is_active);
    }
    if let Some(search) = filter.search.as_deref().filter(|s| !s.trim().is_empty()) {
        let pattern = like_pattern(search);
        qb.push(" AND (p.name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR p.description ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

fn group_by_product<T>(rows: Vec<T>, key: impl Fn(&T) -> Uuid) -> HashMap<Uuid, Vec<T>> {
    let mut grouped: HashMap<Uuid, Vec<T>> = HashMap::new();
    for row in rows {
        grouped.entry(key(&row)).or_default().push(row);
    }
    grouped
}

#[async_trait]
impl ProductStore for ProductRepository {
    async fn create(
        &self,
        payload: &CreateProductPayload,
        submitted_by: Uuid,
    ) -> Result<(Product, Vec<ProductVariant>), AppError> {
        // 1. Inicia Transação
        let mut tx = self.pool.begin().await?;

        // 2. Produto (PENDING)
        let product = sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (company_id, category_id, name, description, unit, origin, base_price)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(payload.company_id)
        .bind(payload.category_id)
        .bind(payload.name.trim())
        .bind(&payload.description)
        .bind(&payload.unit)
        .bind(&payload.origin)
        .bind(payload.base_price)
        .fetch_one(&mut *tx)
        .await?;

        // 3. Variantes
        let mut variants = Vec::with_capacity(payload.variants.len());
        for variant in &payload.variants {
            variants.push(self.insert_variant(&mut *tx, product.id, variant).await?);
        }

        // 4. Histórico SUBMITTED
        approval_sql::record_history(
            &mut *tx,
            &PRODUCT_APPROVAL,
            product.id,
            ApprovalAction::Submitted,
            submitted_by,
            None,
            None,
        )
        .await?;

        tx.commit().await?;
        Ok((product, variants))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Product>, AppError> {
        let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(product)
    }

    async fn list(&self, filter: &ProductFilter) -> Result<Page<Product>, AppError> {
        let mut count_qb = QueryBuilder::<Postgres>::new(
            "SELECT COUNT(*) FROM products p JOIN companies c ON c.id = p.company_id WHERE 1 = 1",
        );
        push_filters(&mut count_qb, filter);
        let total = count_qb
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;

        let mut qb = QueryBuilder::<Postgres>::new(
            "SELECT p.* FROM products p JOIN companies c ON c.id = p.company_id WHERE 1 = 1",
        );
        push_filters(&mut qb, filter);
        qb.push(" ORDER BY p.submitted_at DESC, p.id LIMIT ")
            .push_bind(filter.page.limit)
            .push(" OFFSET ")
            .push_bind(filter.page.offset());
        let products = qb
            .build_query_as::<Product>()
            .fetch_all(&self.pool)
            .await?;

        Ok(Page::new(products, total, filter.page))
    }

    async fn update(&self, product: &Product) -> Result<Product, AppError> {
        let updated = sqlx::query_as::<_, Product>(
            r#"
            UPDATE products SET
                category_id = $2, name = $3, description = $4, unit = $5,
                origin = $6, base_price = $7, updated_at = NOW()
            WHERE id = $1 AND is_active AND approval_status <> 'APPROVED'
            RETURNING *
            "#,
        )
        .bind(product.id)
        .bind(product.category_id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(&product.unit)
        .bind(&product.origin)
        .bind(product.base_price)
        .fetch_optional(&self.pool)
        .await?;

        updated.ok_or(AppError::TransitionConflict {
            entity: PRODUCT_APPROVAL.kind,
            id: product.id,
            expected: product.approval.approval_status,
        })
    }

    async fn soft_delete(&self, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE products SET is_active = FALSE, updated_at = NOW() \
             WHERE id = $1 AND is_active AND approval_status <> 'APPROVED'",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::TransitionConflict {
                entity: PRODUCT_APPROVAL.kind,
                id,
                expected: ApprovalStatus::Pending,
            });
        }
        Ok(())
    }

    async fn transition(&self, id: Uuid, transition: &Transition) -> Result<Product, AppError> {
        approval_sql::apply_transition(&self.pool, &PRODUCT_APPROVAL, id, transition).await
    }

    async fn approval_history(&self, id: Uuid) -> Result<Vec<ApprovalHistory>, AppError> {
        approval_sql::fetch_history(&self.pool, &PRODUCT_APPROVAL, id).await
    }

    async fn count_pending(&self) -> Result<i64, AppError> {
        approval_sql::count_pending(&self.pool, &PRODUCT_APPROVAL).await
    }

    async fn category_exists(&self, id: Uuid) -> Result<bool, AppError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM categories WHERE id = $1)")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    // --- Variantes ---

    async fn list_variants(&self, product_id: Uuid) -> Result<Vec<ProductVariant>, AppError> {
        let variants = sqlx::query_as::<_, ProductVariant>(
            "SELECT * FROM product_variants WHERE product_id = $1 ORDER BY created_at, id",
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(variants)
    }

    async fn list_variants_for(
        &self,
        product_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, Vec<ProductVariant>>, AppError> {
        if product_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let rows = sqlx::query_as::<_, ProductVariant>(
            "SELECT * FROM product_variants WHERE product_id = ANY($1) ORDER BY created_at, id",
        )
        .bind(product_ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(group_by_product(rows, |v| v.product_id))
    }

    async fn find_variant(&self, id: Uuid) -> Result<Option<ProductVariant>, AppError> {
        let variant =
            sqlx::query_as::<_, ProductVariant>("SELECT * FROM product_variants WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(variant)
    }

    async fn create_variant(
        &self,
        product_id: Uuid,
        payload: &CreateVariantPayload,
    ) -> Result<ProductVariant, AppError> {
        let mut tx = self.pool.begin().await?;
        lock_editable(&mut tx, product_id).await?;

        let variant = self.insert_variant(&mut *tx, product_id, payload).await?;

        tx.commit().await?;
        Ok(variant)
    }

    async fn update_variant(&self, variant: &ProductVariant) -> Result<ProductVariant, AppError> {
        let mut tx = self.pool.begin().await?;
        lock_editable(&mut tx, variant.product_id).await?;

        let updated = sqlx::query_as::<_, ProductVariant>(
            r#"
            UPDATE product_variants SET
                label = $2, quantity_value = $3, quantity_unit = $4, price = $5,
                stock_quantity = $6, low_stock_threshold = $7, is_available = $8,
                updated_at = NOW()
            WHERE id = $1 AND product_id = $9
            RETURNING *
            "#,
        )
        .bind(variant.id)
        .bind(&variant.label)
        .bind(variant.quantity_value)
        .bind(&variant.quantity_unit)
        .bind(variant.price)
        .bind(variant.stock_quantity)
        .bind(variant.low_stock_threshold)
        .bind(variant.is_available)
        .bind(variant.product_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(AppError::VariantNotFound)?;

        tx.commit().await?;
        Ok(updated)
    }

    async fn delete_variant(&self, product_id: Uuid, variant_id: Uuid) -> Result<bool, AppError> {
        let mut tx = self.pool.begin().await?;
        lock_editable(&mut tx, product_id).await?;

        // Trava as variantes do produto: dois DELETEs concorrentes não podem zerar a lista
        let ids: Vec<Uuid> = sqlx::query_scalar(
            "SELECT id FROM product_variants WHERE product_id = $1 FOR UPDATE",
        )
        .bind(product_id)
        .fetch_all(&mut *tx)
        .await?;

        if !ids.contains(&variant_id) {
            return Err(AppError::VariantNotFound);
        }
        if ids.len() <= 1 {
            return Ok(false);
        }

        sqlx::query("DELETE FROM product_variants WHERE id = $1 AND product_id = $2")
            .bind(variant_id)
            .bind(product_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(true)
    }

    // --- Imagens ---

    async fn create_image(&self, image: &NewImage) -> Result<ProductImage, AppError> {
        let mut tx = self.pool.begin().await?;

        if image.is_primary {
            sqlx::query("UPDATE product_images SET is_primary = FALSE, updated_at = NOW() WHERE product_id = $1 AND is_primary")
                .bind(image.product_id)
                .execute(&mut *tx)
                .await?;
        }

        let created = sqlx::query_as::<_, ProductImage>(
            r#"
            INSERT INTO product_images (id, product_id, image_url, storage_key, is_primary)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(image.id)
        .bind(image.product_id)
        .bind(&image.image_url)
        .bind(&image.storage_key)
        .bind(image.is_primary)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(created)
    }

    async fn find_image(&self, id: Uuid) -> Result<Option<ProductImage>, AppError> {
        let image = sqlx::query_as::<_, ProductImage>("SELECT * FROM product_images WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(image)
    }

    async fn list_images(&self, product_id: Uuid) -> Result<Vec<ProductImage>, AppError> {
        let images = sqlx::query_as::<_, ProductImage>(
            "SELECT * FROM product_images WHERE product_id = $1 ORDER BY is_primary DESC, created_at",
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(images)
    }

    async fn list_images_for(
        &self,
        product_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, Vec<ProductImage>>, AppError> {
        if product_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let rows = sqlx::query_as::<_, ProductImage>(
            "SELECT * FROM product_images WHERE product_id = ANY($1) ORDER BY is_primary DESC, created_at",
        )
        .bind(product_ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(group_by_product(rows, |i| i.product_id))
    }

    async fn delete_image(&self, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM product_images WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::ImageNotFound);
        }
        Ok(())
    }

    async fn set_primary_image(&self, product_id: Uuid, image_id: Uuid) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        // 1. Desmarca todas
        sqlx::query("UPDATE product_images SET is_primary = FALSE, updated_at = NOW() WHERE product_id = $1 AND is_primary")
            .bind(product_id)
            .execute(&mut *tx)
            .await?;

        // 2. Marca a escolhida
        let result = sqlx::query(
            "UPDATE product_images SET is_primary = TRUE, updated_at = NOW() WHERE id = $1 AND product_id = $2",
        )
        .bind(image_id)
        .bind(product_id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            // Sem commit: o passo 1 é desfeito
            return Err(AppError::ImageNotFound);
        }

        tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::error::ErrorKind;
    use crate::common::pagination::PageRequest;
    use crate::db::fixtures;
    use crate::db::stores::{CompanyStore, FollowerStore};
    use crate::db::{CompanyRepository, FollowerRepository};
    use crate::models::company::ProductVisibility;
    use rust_decimal::Decimal;

    const BASE: &str =
        "SELECT p.* FROM products p JOIN companies c ON c.id = p.company_id WHERE 1 = 1";

    fn filter(viewer: ViewerScope) -> ProductFilter {
        ProductFilter {
            viewer,
            company_id: None,
            category_id: None,
            search: None,
            approval_status: None,
            is_active: None,
            page: PageRequest::new(None, None).unwrap(),
        }
    }

    fn sql_for(filter: &ProductFilter) -> String {
        let mut qb = QueryBuilder::<Postgres>::new(BASE);
        push_filters(&mut qb, filter);
        qb.sql().to_string()
    }

    fn balanced(sql: &str) -> bool {
        sql.matches('(').count() == sql.matches(')').count()
    }

    #[test]
    fn admin_listing_has_no_scope_predicate() {
        assert_eq!(sql_for(&filter(ViewerScope::Admin)), BASE);
    }

    #[test]
    fn anonymous_listing_needs_live_product_and_public_company() {
        assert_eq!(
            sql_for(&filter(ViewerScope::Anonymous)),
            format!(
                "{BASE} AND (p.approval_status = 'APPROVED' AND p.is_active \
                 AND c.approval_status = 'APPROVED' AND c.is_active \
                 AND c.product_visibility = 'PUBLIC')"
            )
        );
    }

    #[test]
    fn user_listing_covers_owner_public_and_followers() {
        let sql = sql_for(&filter(ViewerScope::User(Uuid::new_v4())));
        let clause = sql.strip_prefix(BASE).unwrap();
        assert!(clause.starts_with(" AND (c.owner_id = $1 OR (p.approval_status = 'APPROVED'"));
        assert!(clause.contains("c.product_visibility = 'PUBLIC' OR"));
        assert!(clause.contains(
            "c.product_visibility = 'FOLLOWERS_ONLY' AND EXISTS (SELECT 1 FROM company_followers f \
             WHERE f.company_id = c.id AND f.user_id = $2)"
        ));
        assert!(!clause.contains("'PRIVATE'"));
        assert!(balanced(clause));
    }

    #[test]
    fn filters_follow_the_scope_with_fresh_placeholders() {
        let mut f = filter(ViewerScope::User(Uuid::new_v4()));
        f.company_id = Some(Uuid::new_v4());
        f.approval_status = Some(ApprovalStatus::Pending);
        f.is_active = Some(true);
        f.search = Some("  ".into());
        let sql = sql_for(&f);
        let tail = " AND p.company_id = $3 AND p.approval_status = $4 AND p.is_active = $5";
        assert!(sql.ends_with(tail));
        assert!(balanced(&sql));
    }

    async fn visible_to(repo: &ProductRepository, viewer: ViewerScope) -> i64 {
        repo.list(&filter(viewer)).await.unwrap().total
    }

    #[sqlx::test]
    #[ignore] // Requires database
    async fn listing_applies_company_visibility(pool: PgPool) {
        let repo = ProductRepository::new(pool.clone());
        let companies = CompanyRepository::new(pool.clone());
        let followers = FollowerRepository::new(pool.clone());
        let owner = fixtures::user(&pool, "Owner").await;
        let admin = fixtures::user(&pool, "Admin").await;
        let fan = fixtures::user(&pool, "Fan").await;
        let stranger = fixtures::user(&pool, "Stranger").await;

        let company = fixtures::approved_company(&pool, owner, admin).await;
        let (live, _) = fixtures::product(&pool, company.id, owner).await;
        repo.transition(live.id, &Transition::approve(admin, None))
            .await
            .unwrap();
        fixtures::product(&pool, company.id, owner).await;
        followers.follow(company.id, fan).await.unwrap();

        assert_eq!(visible_to(&repo, ViewerScope::Anonymous).await, 1);
        assert_eq!(visible_to(&repo, ViewerScope::User(owner)).await, 2);
        assert_eq!(visible_to(&repo, ViewerScope::Admin).await, 2);

        companies
            .set_visibility(company.id, ProductVisibility::FollowersOnly)
            .await
            .unwrap();
        assert_eq!(visible_to(&repo, ViewerScope::Anonymous).await, 0);
        assert_eq!(visible_to(&repo, ViewerScope::User(stranger)).await, 0);
        assert_eq!(visible_to(&repo, ViewerScope::User(fan)).await, 1);

        companies
            .set_visibility(company.id, ProductVisibility::Private)
            .await
            .unwrap();
        assert_eq!(visible_to(&repo, ViewerScope::User(fan)).await, 0);
        assert_eq!(visible_to(&repo, ViewerScope::User(owner)).await, 2);
    }

    #[sqlx::test]
    #[ignore] // Requires database
    async fn variant_writes_are_refused_once_approved(pool: PgPool) {
        let repo = ProductRepository::new(pool.clone());
        let owner = fixtures::user(&pool, "Owner").await;
        let admin = fixtures::user(&pool, "Admin").await;
        let company = fixtures::approved_company(&pool, owner, admin).await;
        let (product, variants) = fixtures::product(&pool, company.id, owner).await;

        let mut changed = variants[0].clone();
        changed.price = Decimal::new(500, 2);
        let updated = repo.update_variant(&changed).await.unwrap();
        assert_eq!(updated.price, Decimal::new(500, 2));

        repo.transition(product.id, &Transition::approve(admin, None))
            .await
            .unwrap();

        changed.price = Decimal::new(999, 2);
        let err = repo.update_variant(&changed).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        let err = repo
            .create_variant(product.id, &fixtures::variant("2 kg"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        let err = repo.delete_variant(product.id, changed.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);

        let stored = repo.find_variant(changed.id).await.unwrap().unwrap();
        assert_eq!(stored.price, Decimal::new(500, 2));
        assert_eq!(repo.list_variants(product.id).await.unwrap().len(), 2);
    }
}
