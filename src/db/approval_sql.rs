// src/db/approval_sql.rs

// ---
// SQL compartilhado pelas duas tabelas aprováveis (companies / products).
// ---

use sqlx::{Executor, FromRow, PgPool, Postgres, postgres::PgRow};
use uuid::Uuid;

use crate::common::error::AppError;
use crate::models::approval::{ApprovalAction, ApprovalHistory, EntityKind, Transition};

/// Nomes de tabela/coluna de uma entidade aprovável.
pub(crate) struct ApprovalTable {
    pub kind: EntityKind,
    pub entity: &'static str,
    pub history: &'static str,
    pub fk: &'static str,
}

pub(crate) const COMPANY_APPROVAL: ApprovalTable = ApprovalTable {
    kind: EntityKind::Company,
    entity: "companies",
    history: "company_approval_history",
    fk: "company_id",
};

pub(crate) const PRODUCT_APPROVAL: ApprovalTable = ApprovalTable {
    kind: EntityKind::Product,
    entity: "products",
    history: "product_approval_history",
    fk: "product_id",
};

pub(crate) async fn record_history<'e, E>(
    executor: E,
    table: &ApprovalTable,
    entity_id: Uuid,
    action: ApprovalAction,
    performed_by: Uuid,
    reason: Option<&str>,
    notes: Option<&str>,
) -> Result<(), AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    let sql = format!(
        "INSERT INTO {} ({}, action, performed_by_id, reason, notes) VALUES ($1, $2, $3, $4, $5)",
        table.history, table.fk
    );
    sqlx::query(&sql)
        .bind(entity_id)
        .bind(action)
        .bind(performed_by)
        .bind(reason)
        .bind(notes)
        .execute(executor)
        .await?;
    Ok(())
}

fn transition_sql(table: &ApprovalTable, transition: &Transition) -> String {
    let set = match transition {
        Transition::Approve { .. } => {
            "approval_status = 'APPROVED', reviewed_by_id = $2, reviewed_at = NOW(), \
             rejection_reason = NULL"
        }
        Transition::Reject { .. } => {
            "approval_status = 'REJECTED', reviewed_by_id = $2, reviewed_at = NOW(), \
             rejection_reason = $3"
        }
        Transition::Resubmit { .. } => {
            "approval_status = 'PENDING', reviewed_by_id = NULL, reviewed_at = NULL, \
             rejection_reason = NULL, submitted_at = NOW()"
        }
    };
    format!(
        "UPDATE {} SET {}, updated_at = NOW() \
         WHERE id = $1 AND is_active AND approval_status = '{}' RETURNING *",
        table.entity,
        set,
        transition.from_status().as_str()
    )
}

/// Aplica a transição: UPDATE condicional no status de origem + INSERT no histórico,
/// ambos na mesma transação. Se nenhuma linha casar, outra requisição chegou antes
/// (ou a entidade foi removida).
pub(crate) async fn apply_transition<T>(
    pool: &PgPool,
    table: &ApprovalTable,
    id: Uuid,
    transition: &Transition,
) -> Result<T, AppError>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    let sql = transition_sql(table, transition);

    // 1. Inicia Transação
    let mut tx = pool.begin().await?;

    // 2. UPDATE condicional
    let mut query = sqlx::query_as::<_, T>(&sql).bind(id);
    match transition {
        Transition::Approve { reviewer_id, .. } => query = query.bind(*reviewer_id),
        Transition::Reject {
            reviewer_id,
            reason,
            ..
        } => query = query.bind(*reviewer_id).bind(reason.as_str()),
        Transition::Resubmit { .. } => {}
    }
    let updated = query.fetch_optional(&mut *tx).await?;

    let Some(updated) = updated else {
        // tx é descartada aqui -> ROLLBACK
        tracing::warn!(
            "⚠️ Transição {:?} de {} {} não aplicada: status mudou",
            transition.history_action(),
            table.kind,
            id
        );
        return Err(AppError::TransitionConflict {
            entity: table.kind,
            id,
            expected: transition.from_status(),
        });
    };

    // 3. Histórico
    record_history(
        &mut *tx,
        table,
        id,
        transition.history_action(),
        transition.performed_by(),
        transition.reason(),
        transition.notes(),
    )
    .await?;

    // 4. Commit
    tx.commit().await?;

    Ok(updated)
}

pub(crate) async fn fetch_history(
    pool: &PgPool,
    table: &ApprovalTable,
    entity_id: Uuid,
) -> Result<Vec<ApprovalHistory>, AppError> {
    let sql = format!(
        "SELECT id, {fk} AS entity_id, action, performed_by_id, reason, notes, created_at \
         FROM {history} WHERE {fk} = $1 ORDER BY created_at DESC",
        fk = table.fk,
        history = table.history
    );
    let rows = sqlx::query_as::<_, ApprovalHistory>(&sql)
        .bind(entity_id)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub(crate) async fn count_pending(pool: &PgPool, table: &ApprovalTable) -> Result<i64, AppError> {
    let sql = format!(
        "SELECT COUNT(*) FROM {} WHERE approval_status = 'PENDING' AND is_active",
        table.entity
    );
    let count: i64 = sqlx::query_scalar(&sql).fetch_one(pool).await?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transition_sql_is_conditional_on_source_status() {
        let approve = transition_sql(&COMPANY_APPROVAL, &Transition::approve(Uuid::nil(), None));
        assert!(approve.starts_with("UPDATE companies SET approval_status = 'APPROVED'"));
        assert!(approve.contains("WHERE id = $1 AND is_active AND approval_status = 'PENDING'"));

        let resubmit = transition_sql(&PRODUCT_APPROVAL, &Transition::resubmit(Uuid::nil()));
        assert!(resubmit.starts_with("UPDATE products"));
        assert!(resubmit.contains("approval_status = 'REJECTED' RETURNING *"));
        assert!(resubmit.contains("rejection_reason = NULL"));
    }
}
