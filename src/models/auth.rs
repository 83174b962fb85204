// src/models/auth.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "user_role", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    User,
    Admin,
}

// Representa um usuário vindo do banco de dados
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,

    #[serde(skip_serializing)] // IMPORTANTE para segurança
    pub password_hash: String,

    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn actor(&self) -> Actor {
        Actor {
            id: self.id,
            role: self.role,
        }
    }
}

/// Quem está executando a operação (resolvido a partir do token).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub id: Uuid,
    pub role: Role,
}

impl Actor {
    pub fn user(id: Uuid) -> Self {
        Self { id, role: Role::User }
    }

    pub fn admin(id: Uuid) -> Self {
        Self {
            id,
            role: Role::Admin,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Como as consultas de listagem enxergam o solicitante.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerScope {
    Anonymous,
    User(Uuid),
    Admin,
}

impl ViewerScope {
    pub fn of(actor: Option<&Actor>) -> Self {
        match actor {
            None => ViewerScope::Anonymous,
            Some(a) if a.is_admin() => ViewerScope::Admin,
            Some(a) => ViewerScope::User(a.id),
        }
    }

    pub fn user_id(&self) -> Option<Uuid> {
        match self {
            ViewerScope::User(id) => Some(*id),
            _ => None,
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, ViewerScope::Admin)
    }
}

// Dados para registro de um novo usuário
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterUserPayload {
    #[validate(length(min = 2, max = 255, message = "O nome deve ter entre 2 e 255 caracteres."))]
    pub name: String,
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: String,
    #[validate(length(min = 6, message = "A senha deve ter no mínimo 6 caracteres."))]
    pub password: String,
}

// Dados para login
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginUserPayload {
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: String,
    #[validate(length(min = 6, message = "A senha deve ter no mínimo 6 caracteres."))]
    pub password: String,
}

// Resposta de autenticação com o token
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
}

// Estrutura de dados ("claims") dentro do JWT
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,  // Subject (ID do usuário)
    pub role: Role, // Só informativo: o papel efetivo vem do banco
    pub exp: usize,
    pub iat: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn viewer_scope_from_actor() {
        let id = Uuid::new_v4();
        assert_eq!(ViewerScope::of(None), ViewerScope::Anonymous);
        assert_eq!(ViewerScope::of(Some(&Actor::user(id))), ViewerScope::User(id));
        assert_eq!(ViewerScope::of(Some(&Actor::admin(id))), ViewerScope::Admin);
        assert_eq!(ViewerScope::Admin.user_id(), None);
    }
}
