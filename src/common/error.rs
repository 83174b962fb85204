// src/common/error.rs

use std::collections::HashMap;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Value, json};
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::common::i18n::I18nStore;
use crate::middleware::i18n::Locale;
use crate::models::approval::{ApprovalStatus, EntityKind, LifecycleAction, join_statuses};

// Erro de domínio único: services, stores e extractors devolvem sempre este tipo.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Campo inválido '{field}': {message}")]
    InvalidField {
        field: &'static str,
        message: String,
    },

    #[error("E-mail já existe")]
    EmailAlreadyExists,

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Usuário não encontrado")]
    UserNotFound,

    #[error("Empresa não encontrada")]
    CompanyNotFound,

    #[error("Produto não encontrado")]
    ProductNotFound,

    #[error("Variante não encontrada")]
    VariantNotFound,

    #[error("Imagem não encontrada")]
    ImageNotFound,

    #[error("Categoria não encontrada")]
    CategoryNotFound,

    #[error("Acesso negado: {0}")]
    Forbidden(String),

    #[error(
        "Não é possível executar '{action}' em {entity} com status {current} (esperado: {})",
        join_statuses(.expected)
    )]
    InvalidStateTransition {
        entity: EntityKind,
        action: LifecycleAction,
        current: ApprovalStatus,
        expected: &'static [ApprovalStatus],
    },

    #[error("Já existe uma empresa chamada '{0}' para este dono")]
    CompanyNameAlreadyExists(String),

    // UPDATE condicional não afetou nenhuma linha: outra requisição mudou o status antes
    #[error("{entity} {id} não está mais em {expected}")]
    TransitionConflict {
        entity: EntityKind,
        id: Uuid,
        expected: ApprovalStatus,
    },

    #[error("O produto precisa manter ao menos uma variante")]
    LastVariant,

    #[error("A empresa {0} não está aprovada e ativa")]
    CompanyNotApproved(Uuid),

    #[error("Não é possível seguir a própria empresa")]
    CannotFollowOwnCompany,

    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

/// Classificação usada pelos chamadores (e pelo mapeamento HTTP).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Forbidden,
    InvalidStateTransition,
    Conflict,
    ValidationFailed,
    Unauthorized,
    Internal,
}

impl ErrorKind {
    pub fn status(self) -> StatusCode {
        match self {
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Forbidden => StatusCode::FORBIDDEN,
            ErrorKind::InvalidStateTransition | ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::ValidationFailed => StatusCode::BAD_REQUEST,
            ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::UserNotFound
            | AppError::CompanyNotFound
            | AppError::ProductNotFound
            | AppError::VariantNotFound
            | AppError::ImageNotFound
            | AppError::CategoryNotFound => ErrorKind::NotFound,
            AppError::Forbidden(_) => ErrorKind::Forbidden,
            AppError::InvalidStateTransition { .. } => ErrorKind::InvalidStateTransition,
            AppError::CompanyNameAlreadyExists(_)
            | AppError::EmailAlreadyExists
            | AppError::TransitionConflict { .. }
            | AppError::LastVariant
            | AppError::CompanyNotApproved(_) => ErrorKind::Conflict,
            AppError::ValidationError(_)
            | AppError::InvalidField { .. }
            | AppError::CannotFollowOwnCompany => ErrorKind::ValidationFailed,
            AppError::InvalidCredentials | AppError::InvalidToken => ErrorKind::Unauthorized,
            AppError::DatabaseError(_)
            | AppError::InternalServerError(_)
            | AppError::BcryptError(_)
            | AppError::JwtError(_) => ErrorKind::Internal,
        }
    }

    /// Chave do catálogo de mensagens.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "VALIDATION_FAILED",
            AppError::InvalidField { .. } => "INVALID_FIELD",
            AppError::EmailAlreadyExists => "EMAIL_ALREADY_EXISTS",
            AppError::InvalidCredentials => "INVALID_CREDENTIALS",
            AppError::InvalidToken => "INVALID_TOKEN",
            AppError::UserNotFound => "USER_NOT_FOUND",
            AppError::CompanyNotFound => "COMPANY_NOT_FOUND",
            AppError::ProductNotFound => "PRODUCT_NOT_FOUND",
            AppError::VariantNotFound => "VARIANT_NOT_FOUND",
            AppError::ImageNotFound => "IMAGE_NOT_FOUND",
            AppError::CategoryNotFound => "CATEGORY_NOT_FOUND",
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::InvalidStateTransition { .. } => "INVALID_STATE_TRANSITION",
            AppError::CompanyNameAlreadyExists(_) => "COMPANY_NAME_ALREADY_EXISTS",
            AppError::TransitionConflict { .. } => "TRANSITION_CONFLICT",
            AppError::LastVariant => "LAST_VARIANT",
            AppError::CompanyNotApproved(_) => "COMPANY_NOT_APPROVED",
            AppError::CannotFollowOwnCompany => "CANNOT_FOLLOW_OWN_COMPANY",
            _ => "INTERNAL_ERROR",
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        AppError::Forbidden(message.into())
    }

    pub fn not_found(entity: EntityKind) -> Self {
        match entity {
            EntityKind::Company => AppError::CompanyNotFound,
            EntityKind::Product => AppError::ProductNotFound,
        }
    }

    // Parâmetros interpolados nas mensagens do catálogo ({name}, {current}, ...)
    fn params(&self) -> Vec<(&'static str, String)> {
        match self {
            AppError::InvalidField { field, message } => {
                vec![("field", field.to_string()), ("message", message.clone())]
            }
            AppError::Forbidden(reason) => vec![("reason", reason.clone())],
            AppError::InvalidStateTransition {
                entity,
                action,
                current,
                expected,
            } => vec![
                ("entity", entity.to_string()),
                ("action", action.to_string()),
                ("current", current.to_string()),
                ("expected", join_statuses(expected)),
            ],
            AppError::CompanyNameAlreadyExists(name) => vec![("name", name.clone())],
            AppError::TransitionConflict {
                entity,
                id,
                expected,
            } => vec![
                ("entity", entity.to_string()),
                ("id", id.to_string()),
                ("expected", expected.to_string()),
            ],
            AppError::CompanyNotApproved(id) => vec![("id", id.to_string())],
            _ => Vec::new(),
        }
    }

    fn details(&self) -> Option<Value> {
        match self {
            AppError::ValidationError(errors) => {
                let mut details = HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .map(|e| {
                            e.message
                                .as_ref()
                                .map(|m| m.to_string())
                                .unwrap_or_else(|| e.code.to_string())
                        })
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                Some(json!(details))
            }
            AppError::InvalidStateTransition {
                current, expected, ..
            } => Some(json!({
                "currentStatus": current,
                "expectedStatus": expected,
            })),
            _ => None,
        }
    }

    /// Converte para o formato de resposta, traduzindo a mensagem para o idioma pedido.
    pub fn to_api_error(&self, locale: &Locale, i18n: &I18nStore) -> ApiError {
        let kind = self.kind();
        if kind == ErrorKind::Internal {
            // O detalhe fica só no log
            tracing::error!("Erro Interno do Servidor: {:?}", self);
        }

        let error = i18n
            .translate(&locale.0, self.code(), &self.params())
            .unwrap_or_else(|| self.to_string());

        ApiError {
            status: kind.status(),
            error,
            code: self.code(),
            details: self.details(),
        }
    }
}

// Formato de erro que vai para o cliente
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiError {
    #[serde(skip)]
    pub status: StatusCode,
    pub error: String,
    #[schema(value_type = String, example = "INVALID_STATE_TRANSITION")]
    pub code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub details: Option<Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

// Usado onde não há Locale disponível (middleware, extractors)
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.to_api_error(&Locale::default(), &I18nStore::default())
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_map_to_http_statuses() {
        assert_eq!(AppError::CompanyNotFound.kind().status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::forbidden("x").kind().status(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::LastVariant.kind().status(), StatusCode::CONFLICT);
        assert_eq!(AppError::InvalidToken.kind().status(), StatusCode::UNAUTHORIZED);
        let err = AppError::InvalidStateTransition {
            entity: EntityKind::Company,
            action: LifecycleAction::Approve,
            current: ApprovalStatus::Approved,
            expected: LifecycleAction::Approve.allowed_from(),
        };
        assert_eq!(err.kind(), ErrorKind::InvalidStateTransition);
        assert_eq!(err.kind().status(), StatusCode::CONFLICT);
    }

    #[test]
    fn api_error_is_localised_and_keeps_details() {
        let i18n = I18nStore::new();
        let err = AppError::InvalidStateTransition {
            entity: EntityKind::Product,
            action: LifecycleAction::Modify,
            current: ApprovalStatus::Approved,
            expected: LifecycleAction::Modify.allowed_from(),
        };

        let en = err.to_api_error(&Locale("en".into()), &i18n);
        assert_eq!(en.status, StatusCode::CONFLICT);
        assert_eq!(en.code, "INVALID_STATE_TRANSITION");
        assert!(en.error.contains("APPROVED"), "{}", en.error);
        assert!(en.error.contains("PENDING | REJECTED"), "{}", en.error);
        let details = en.details.expect("details");
        assert_eq!(details["currentStatus"], "APPROVED");

        let pt = err.to_api_error(&Locale("pt".into()), &i18n);
        assert_ne!(pt.error, en.error);
    }

    #[test]
    fn unknown_language_falls_back_to_default_catalog() {
        let i18n = I18nStore::new();
        let api = AppError::CompanyNotFound.to_api_error(&Locale("de".into()), &i18n);
        assert_eq!(api.status, StatusCode::NOT_FOUND);
        assert!(!api.error.is_empty());
    }
}
