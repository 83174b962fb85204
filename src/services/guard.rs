// src/services/guard.rs

// ---
// Toda mutação passa por três checagens, nesta ordem:
//   1. a entidade existe  -> NotFound (removida = inexistente)
//   2. quem pede pode     -> Forbidden (dono ou admin, conforme a ação)
//   3. o status permite   -> InvalidStateTransition
// ---

use uuid::Uuid;

use crate::common::error::AppError;
use crate::models::approval::{ActorScope, Approvable, EntityKind, LifecycleAction};
use crate::models::auth::Actor;

/// Passo 1.
pub fn found<T>(entity: Option<T>, kind: EntityKind) -> Result<T, AppError> {
    entity.ok_or_else(|| AppError::not_found(kind))
}

pub fn require_admin(actor: &Actor) -> Result<(), AppError> {
    if actor.is_admin() {
        return Ok(());
    }
    Err(AppError::forbidden("apenas administradores podem executar esta ação"))
}

pub fn require_owner(actor: &Actor, owner_id: Uuid, kind: EntityKind) -> Result<(), AppError> {
    if actor.id == owner_id {
        return Ok(());
    }
    Err(AppError::forbidden(format!("você não é o dono deste(a) {kind}")))
}

/// Dono ou admin (leituras restritas: histórico, seguidores).
pub fn require_owner_or_admin(
    actor: &Actor,
    owner_id: Uuid,
    kind: EntityKind,
) -> Result<(), AppError> {
    if actor.is_admin() {
        return Ok(());
    }
    require_owner(actor, owner_id, kind)
}

/// Passos 1 a 3 para uma entidade já carregada.
pub fn authorize<T: Approvable>(
    actor: &Actor,
    entity: &T,
    owner_id: Uuid,
    action: LifecycleAction,
) -> Result<(), AppError> {
    // Soft delete não volta para a fila de revisão
    if !entity.is_active() {
        return Err(AppError::not_found(T::KIND));
    }
    match action.scope() {
        ActorScope::Admin => require_admin(actor)?,
        ActorScope::Owner => require_owner(actor, owner_id, T::KIND)?,
    }
    entity.approval().approval_status.ensure(action, T::KIND)
}
