// src/db/company_repo.rs

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::common::db_utils::{is_unique_violation, like_pattern};
use crate::common::error::AppError;
use crate::common::pagination::Page;
use crate::db::approval_sql::{self, COMPANY_APPROVAL};
use crate::db::stores::CompanyStore;
use crate::models::approval::{ApprovalAction, ApprovalHistory, ApprovalStatus, Transition};
use crate::models::auth::ViewerScope;
use crate::models::company::{Company, CompanyFilter, CreateCompanyPayload, ProductVisibility};

const OWNER_NAME_CONSTRAINT: &str = "companies_owner_name_key";

#[derive(Clone)]
pub struct CompanyRepository {
    pool: PgPool,
}

impl CompanyRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn map_write_error(e: sqlx::Error, name: &str) -> AppError {
        if is_unique_violation(&e, OWNER_NAME_CONSTRAINT) {
            return AppError::CompanyNameAlreadyExists(name.to_string());
        }
        AppError::DatabaseError(e)
    }
}

/// WHERE compartilhado entre o COUNT e a página.
fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &CompanyFilter) {
    match filter.viewer {
        ViewerScope::Admin => {}
        ViewerScope::Anonymous => {
            qb.push(" AND c.approval_status = 'APPROVED' AND c.is_active");
        }
        // Não aprovadas só aparecem para o próprio dono
        ViewerScope::User(user_id) => {
            qb.push(" AND ((c.approval_status = 'APPROVED' AND c.is_active) OR c.owner_id = ");
            qb.push_bind(user_id);
            qb.push(")");
        }
    }

    if let Some(owner_id) = filter.owner_id {
        qb.push(" AND c.owner_id = ").push_bind(owner_id);
    }
    if let Some(status) = filter.approval_status {
        qb.push(" AND c.approval_status = ").push_bind(status);
    }
    if let Some(is_active) = filter.is_active {
        qb.push(" AND c.is_active = ").push_bind(is_active);
    }
    if let Some(search) = filter.search.as_deref().filter(|s| !s.trim().is_empty()) {
        let pattern = like_pattern(search);
        qb.push(" AND (c.name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR c.description ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

#[async_trait]
impl CompanyStore for CompanyRepository {
    async fn create(
        &self,
        owner_id: Uuid,
        payload: &CreateCompanyPayload,
    ) -> Result<Company, AppError> {
        let name = payload.name.trim();

        // 1. Inicia Transação
        let mut tx = self.pool.begin().await?;

        // 2. Empresa nasce PENDING (default da coluna)
        let company = sqlx::query_as::<_, Company>(
            r#"
            INSERT INTO companies (
                owner_id, name, description, logo_url, business_email, business_phone,
                city, state, pincode, gst_number, pan_number, product_visibility
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING *
            "#,
        )
        .bind(owner_id)
        .bind(name)
        .bind(&payload.description)
        .bind(&payload.logo_url)
        .bind(&payload.business_email)
        .bind(&payload.business_phone)
        .bind(&payload.city)
        .bind(&payload.state)
        .bind(&payload.pincode)
        .bind(&payload.gst_number)
        .bind(&payload.pan_number)
        .bind(payload.product_visibility.unwrap_or_default())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| Self::map_write_error(e, name))?;

        // 3. Histórico SUBMITTED
        approval_sql::record_history(
            &mut *tx,
            &COMPANY_APPROVAL,
            company.id,
            ApprovalAction::Submitted,
            owner_id,
            None,
            None,
        )
        .await?;

        tx.commit().await?;
        Ok(company)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Company>, AppError> {
        let company = sqlx::query_as::<_, Company>("SELECT * FROM companies WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(company)
    }

    async fn find_by_owner_and_name(
        &self,
        owner_id: Uuid,
        name: &str,
    ) -> Result<Option<Company>, AppError> {
        let company = sqlx::query_as::<_, Company>(
            "SELECT * FROM companies WHERE owner_id = $1 AND name = $2",
        )
        .bind(owner_id)
        .bind(name.trim())
        .fetch_optional(&self.pool)
        .await?;
        Ok(company)
    }

    async fn list(&self, filter: &CompanyFilter) -> Result<Page<Company>, AppError> {
        let mut count_qb =
            QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM companies c WHERE 1 = 1");
        push_filters(&mut count_qb, filter);
        let total = count_qb
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;

        let mut qb = QueryBuilder::<Postgres>::new("SELECT c.* FROM companies c WHERE 1 = 1");
        push_filters(&mut qb, filter);
        qb.push(" ORDER BY c.submitted_at DESC, c.id LIMIT ")
            .push_bind(filter.page.limit)
            .push(" OFFSET ")
            .push_bind(filter.page.offset());
        let companies = qb
            .build_query_as::<Company>()
            .fetch_all(&self.pool)
            .await?;

        Ok(Page::new(companies, total, filter.page))
    }

    async fn update_profile(&self, company: &Company) -> Result<Company, AppError> {
        let updated = sqlx::query_as::<_, Company>(
            r#"
            UPDATE companies SET
                name = $2, description = $3, logo_url = $4, business_email = $5,
                business_phone = $6, city = $7, state = $8, pincode = $9,
                gst_number = $10, pan_number = $11, product_visibility = $12,
                updated_at = NOW()
            WHERE id = $1 AND is_active AND approval_status <> 'APPROVED'
            RETURNING *
            "#,
        )
        .bind(company.id)
        .bind(&company.name)
        .bind(&company.description)
        .bind(&company.logo_url)
        .bind(&company.business_email)
        .bind(&company.business_phone)
        .bind(&company.city)
        .bind(&company.state)
        .bind(&company.pincode)
        .bind(&company.gst_number)
        .bind(&company.pan_number)
        .bind(company.product_visibility)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| Self::map_write_error(e, &company.name))?;

        // Aprovada no meio do caminho: a edição perde
        updated.ok_or(AppError::TransitionConflict {
            entity: COMPANY_APPROVAL.kind,
            id: company.id,
            expected: company.approval.approval_status,
        })
    }

    async fn set_visibility(
        &self,
        id: Uuid,
        visibility: ProductVisibility,
    ) -> Result<Company, AppError> {
        sqlx::query_as::<_, Company>(
            "UPDATE companies SET product_visibility = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(visibility)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::CompanyNotFound)
    }

    async fn soft_delete(&self, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE companies SET is_active = FALSE, updated_at = NOW() \
             WHERE id = $1 AND is_active AND approval_status <> 'APPROVED'",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::TransitionConflict {
                entity: COMPANY_APPROVAL.kind,
                id,
                expected: ApprovalStatus::Pending,
            });
        }
        Ok(())
    }

    async fn deactivate(&self, id: Uuid) -> Result<Company, AppError> {
        sqlx::query_as::<_, Company>(
            "UPDATE companies SET is_active = FALSE, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::CompanyNotFound)
    }

    async fn transition(&self, id: Uuid, transition: &Transition) -> Result<Company, AppError> {
        approval_sql::apply_transition(&self.pool, &COMPANY_APPROVAL, id, transition).await
    }

    async fn approval_history(&self, id: Uuid) -> Result<Vec<ApprovalHistory>, AppError> {
        approval_sql::fetch_history(&self.pool, &COMPANY_APPROVAL, id).await
    }

    async fn count_pending(&self) -> Result<i64, AppError> {
        approval_sql::count_pending(&self.pool, &COMPANY_APPROVAL).await
    }
}
