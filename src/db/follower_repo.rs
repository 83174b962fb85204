// src/db/follower_repo.rs

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::common::error::AppError;
use crate::common::pagination::{Page, PageRequest};
use crate::db::stores::FollowerStore;
use crate::models::company::{Company, CompanyFollower, FollowerEntry};

#[derive(Clone)]
pub struct FollowerRepository {
    pool: PgPool,
}

impl FollowerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FollowerStore for FollowerRepository {
    async fn follow(&self, company_id: Uuid, user_id: Uuid) -> Result<CompanyFollower, AppError> {
        let mut tx = self.pool.begin().await?;

        // ON CONFLICT: seguir duas vezes não duplica nem incrementa o contador
        let inserted = sqlx::query_as::<_, CompanyFollower>(
            r#"
            INSERT INTO company_followers (company_id, user_id)
            VALUES ($1, $2)
            ON CONFLICT (company_id, user_id) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(company_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;

        let follower = match inserted {
            Some(follower) => {
                sqlx::query(
                    "UPDATE companies SET follower_count = follower_count + 1 WHERE id = $1",
                )
                .bind(company_id)
                .execute(&mut *tx)
                .await?;
                follower
            }
            None => {
                sqlx::query_as::<_, CompanyFollower>(
                    "SELECT * FROM company_followers WHERE company_id = $1 AND user_id = $2",
                )
                .bind(company_id)
                .bind(user_id)
                .fetch_one(&mut *tx)
                .await?
            }
        };

        tx.commit().await?;
        Ok(follower)
    }

    async fn unfollow(&self, company_id: Uuid, user_id: Uuid) -> Result<bool, AppError> {
        let mut tx = self.pool.begin().await?;

        let result =
            sqlx::query("DELETE FROM company_followers WHERE company_id = $1 AND user_id = $2")
                .bind(company_id)
                .bind(user_id)
                .execute(&mut *tx)
                .await?;

        let removed = result.rows_affected() > 0;
        if removed {
            sqlx::query(
                "UPDATE companies SET follower_count = GREATEST(follower_count - 1, 0) WHERE id = $1",
            )
            .bind(company_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(removed)
    }

    async fn find(
        &self,
        company_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<CompanyFollower>, AppError> {
        let follower = sqlx::query_as::<_, CompanyFollower>(
            "SELECT * FROM company_followers WHERE company_id = $1 AND user_id = $2",
        )
        .bind(company_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(follower)
    }

    async fn is_following(&self, company_id: Uuid, user_id: Uuid) -> Result<bool, AppError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM company_followers WHERE company_id = $1 AND user_id = $2)",
        )
        .bind(company_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn follow_status_batch(
        &self,
        company_ids: &[Uuid],
        user_id: Uuid,
    ) -> Result<HashMap<Uuid, bool>, AppError> {
        let mut status: HashMap<Uuid, bool> = company_ids.iter().map(|id| (*id, false)).collect();
        if company_ids.is_empty() {
            return Ok(status);
        }

        let followed: Vec<Uuid> = sqlx::query_scalar(
            "SELECT company_id FROM company_followers WHERE user_id = $1 AND company_id = ANY($2)",
        )
        .bind(user_id)
        .bind(company_ids)
        .fetch_all(&self.pool)
        .await?;

        for id in followed {
            status.insert(id, true);
        }
        Ok(status)
    }

    async fn list_followers(
        &self,
        company_id: Uuid,
        page: PageRequest,
    ) -> Result<Page<FollowerEntry>, AppError> {
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM company_followers WHERE company_id = $1")
                .bind(company_id)
                .fetch_one(&self.pool)
                .await?;

        let followers = sqlx::query_as::<_, FollowerEntry>(
            r#"
            SELECT f.id, f.company_id, f.user_id, u.name AS user_name, u.email AS user_email, f.followed_at
            FROM company_followers f
            JOIN users u ON u.id = f.user_id
            WHERE f.company_id = $1
            ORDER BY f.followed_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(company_id)
        .bind(page.limit)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok(Page::new(followers, total, page))
    }

    async fn list_followed_companies(
        &self,
        user_id: Uuid,
        page: PageRequest,
    ) -> Result<Page<Company>, AppError> {
        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM company_followers f
            JOIN companies c ON c.id = f.company_id
            WHERE f.user_id = $1 AND c.is_active
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        let companies = sqlx::query_as::<_, Company>(
            r#"
            SELECT c.*
            FROM company_followers f
            JOIN companies c ON c.id = f.company_id
            WHERE f.user_id = $1 AND c.is_active
            ORDER BY f.followed_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(page.limit)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok(Page::new(companies, total, page))
    }
}
