// src/models/approval.rs

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::common::error::AppError;

/// Tamanho mínimo do motivo de rejeição (após trim).
pub const MIN_REJECTION_REASON_LEN: usize = 10;

/// Nota gravada no histórico quando o dono reenvia para análise.
pub const RESUBMIT_NOTE: &str = "Reenviado para análise após rejeição";

// ---
// 1. Status e Ações
// ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "approval_status", rename_all = "SCREAMING_SNAKE_CASE")] // Banco
#[serde(rename_all = "SCREAMING_SNAKE_CASE")] // JSON
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

impl ApprovalStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ApprovalStatus::Pending => "PENDING",
            ApprovalStatus::Approved => "APPROVED",
            ApprovalStatus::Rejected => "REJECTED",
        }
    }

    pub fn permits(self, action: LifecycleAction) -> bool {
        action.allowed_from().contains(&self)
    }

    /// Falha com `InvalidStateTransition` se a ação não for legal a partir deste status.
    pub fn ensure(self, action: LifecycleAction, entity: EntityKind) -> Result<(), AppError> {
        if self.permits(action) {
            return Ok(());
        }
        Err(AppError::InvalidStateTransition {
            entity,
            action,
            current: self,
            expected: action.allowed_from(),
        })
    }
}

impl fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// O que fica gravado no histórico (append-only).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "approval_action", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApprovalAction {
    Submitted,
    Approved,
    Rejected,
    Resubmitted,
}

/// Quem pode disparar uma ação.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorScope {
    Owner,
    Admin,
}

/// Todas as ações que tocam uma entidade aprovável.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleAction {
    Approve,
    Reject,
    Resubmit,
    Modify,
    Deactivate,
}

impl LifecycleAction {
    pub fn scope(self) -> ActorScope {
        match self {
            LifecycleAction::Approve | LifecycleAction::Reject => ActorScope::Admin,
            LifecycleAction::Resubmit | LifecycleAction::Modify | LifecycleAction::Deactivate => {
                ActorScope::Owner
            }
        }
    }

    pub fn allowed_from(self) -> &'static [ApprovalStatus] {
        match self {
            LifecycleAction::Approve | LifecycleAction::Reject => &[ApprovalStatus::Pending],
            LifecycleAction::Resubmit => &[ApprovalStatus::Rejected],
            // Entidades APPROVED estão "no ar": nada de edição ou remoção silenciosa
            LifecycleAction::Modify | LifecycleAction::Deactivate => {
                &[ApprovalStatus::Pending, ApprovalStatus::Rejected]
            }
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LifecycleAction::Approve => "approve",
            LifecycleAction::Reject => "reject",
            LifecycleAction::Resubmit => "resubmit",
            LifecycleAction::Modify => "modify",
            LifecycleAction::Deactivate => "deactivate",
        }
    }
}

impl fmt::Display for LifecycleAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Company,
    Product,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Company => "company",
            EntityKind::Product => "product",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub(crate) fn join_statuses(statuses: &[ApprovalStatus]) -> String {
    statuses.iter().map(|s| s.as_str()).collect::<Vec<_>>().join(" | ")
}

// ---
// 2. Transições que mudam o status
// ---

#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    Approve {
        reviewer_id: Uuid,
        notes: Option<String>,
    },
    Reject {
        reviewer_id: Uuid,
        reason: String,
        notes: Option<String>,
    },
    Resubmit {
        owner_id: Uuid,
    },
}

impl Transition {
    pub fn approve(reviewer_id: Uuid, notes: Option<String>) -> Self {
        Transition::Approve { reviewer_id, notes }
    }

    /// Rejeição sempre exige um motivo legível (>= 10 caracteres).
    pub fn reject(
        reviewer_id: Uuid,
        reason: &str,
        notes: Option<String>,
    ) -> Result<Self, AppError> {
        let reason = reason.trim();
        if reason.chars().count() < MIN_REJECTION_REASON_LEN {
            return Err(AppError::InvalidField {
                field: "reason",
                message: format!(
                    "o motivo da rejeição precisa ter ao menos {} caracteres",
                    MIN_REJECTION_REASON_LEN
                ),
            });
        }
        Ok(Transition::Reject {
            reviewer_id,
            reason: reason.to_string(),
            notes,
        })
    }

    pub fn resubmit(owner_id: Uuid) -> Self {
        Transition::Resubmit { owner_id }
    }

    pub fn lifecycle_action(&self) -> LifecycleAction {
        match self {
            Transition::Approve { .. } => LifecycleAction::Approve,
            Transition::Reject { .. } => LifecycleAction::Reject,
            Transition::Resubmit { .. } => LifecycleAction::Resubmit,
        }
    }

    /// Status de origem exigido pelo UPDATE condicional.
    pub fn from_status(&self) -> ApprovalStatus {
        match self {
            Transition::Approve { .. } | Transition::Reject { .. } => ApprovalStatus::Pending,
            Transition::Resubmit { .. } => ApprovalStatus::Rejected,
        }
    }

    pub fn to_status(&self) -> ApprovalStatus {
        match self {
            Transition::Approve { .. } => ApprovalStatus::Approved,
            Transition::Reject { .. } => ApprovalStatus::Rejected,
            Transition::Resubmit { .. } => ApprovalStatus::Pending,
        }
    }

    pub fn history_action(&self) -> ApprovalAction {
        match self {
            Transition::Approve { .. } => ApprovalAction::Approved,
            Transition::Reject { .. } => ApprovalAction::Rejected,
            Transition::Resubmit { .. } => ApprovalAction::Resubmitted,
        }
    }

    pub fn performed_by(&self) -> Uuid {
        match self {
            Transition::Approve { reviewer_id, .. } | Transition::Reject { reviewer_id, .. } => {
                *reviewer_id
            }
            Transition::Resubmit { owner_id } => *owner_id,
        }
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Transition::Reject { reason, .. } => Some(reason),
            _ => None,
        }
    }

    pub fn notes(&self) -> Option<&str> {
        match self {
            Transition::Approve { notes, .. } | Transition::Reject { notes, .. } => {
                notes.as_deref()
            }
            Transition::Resubmit { .. } => Some(RESUBMIT_NOTE),
        }
    }
}

// ---
// 3. Campos de aprovação (mesmo formato em companies e products)
// ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalState {
    pub approval_status: ApprovalStatus,
    pub submitted_at: DateTime<Utc>,
    pub reviewed_by_id: Option<Uuid>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
}

impl ApprovalState {
    /// Toda entidade nasce PENDING.
    pub fn submitted(now: DateTime<Utc>) -> Self {
        Self {
            approval_status: ApprovalStatus::Pending,
            submitted_at: now,
            reviewed_by_id: None,
            reviewed_at: None,
            rejection_reason: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.approval_status == ApprovalStatus::Pending
    }

    pub fn is_approved(&self) -> bool {
        self.approval_status == ApprovalStatus::Approved
    }

    pub fn is_rejected(&self) -> bool {
        self.approval_status == ApprovalStatus::Rejected
    }

    pub fn can_be_modified(&self) -> bool {
        self.approval_status.permits(LifecycleAction::Modify)
    }

    /// rejection_reason != null <=> REJECTED; reviewed_* != null <=> APPROVED | REJECTED
    pub fn is_consistent(&self) -> bool {
        let reason_ok = self.rejection_reason.is_some() == self.is_rejected();
        let reviewed = self.reviewed_by_id.is_some() && self.reviewed_at.is_some();
        let unreviewed = self.reviewed_by_id.is_none() && self.reviewed_at.is_none();
        let review_ok = if self.is_pending() { unreviewed } else { reviewed };
        reason_ok && review_ok
    }

    /// Espelho em memória do UPDATE condicional: devolve `false` (sem alterar nada)
    /// quando o status atual não é o status de origem da transição.
    pub fn apply(&mut self, transition: &Transition, now: DateTime<Utc>) -> bool {
        if self.approval_status != transition.from_status() {
            return false;
        }
        match transition {
            Transition::Approve { reviewer_id, .. } => {
                self.approval_status = ApprovalStatus::Approved;
                self.reviewed_by_id = Some(*reviewer_id);
                self.reviewed_at = Some(now);
                self.rejection_reason = None;
            }
            Transition::Reject {
                reviewer_id,
                reason,
                ..
            } => {
                self.approval_status = ApprovalStatus::Rejected;
                self.reviewed_by_id = Some(*reviewer_id);
                self.reviewed_at = Some(now);
                self.rejection_reason = Some(reason.clone());
            }
            Transition::Resubmit { .. } => {
                self.approval_status = ApprovalStatus::Pending;
                self.reviewed_by_id = None;
                self.reviewed_at = None;
                self.rejection_reason = None;
                self.submitted_at = now;
            }
        }
        true
    }
}

/// Entidades que passam pelo fluxo de aprovação.
pub trait Approvable {
    const KIND: EntityKind;

    fn approval(&self) -> &ApprovalState;
    fn is_active(&self) -> bool;
}

// ---
// 4. Histórico
// ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalHistory {
    pub id: Uuid,
    /// company_id ou product_id, conforme a tabela
    pub entity_id: Uuid,
    pub action: ApprovalAction,
    pub performed_by_id: Uuid,
    pub reason: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

// ---
// 5. Payloads de revisão (admin)
// ---

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct ApprovePayload {
    #[validate(length(max = 500, message = "As notas devem ter no máximo 500 caracteres."))]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct RejectPayload {
    #[validate(length(
        min = 10,
        max = 500,
        message = "O motivo deve ter entre 10 e 500 caracteres."
    ))]
    pub reason: String,
    #[validate(length(max = 500, message = "As notas devem ter no máximo 500 caracteres."))]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PendingCounts {
    pub companies: i64,
    pub products: i64,
}
