// src/middleware/rbac.rs

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::auth::Actor,
};

/// Guardião das rotas /api/admin: exige papel ADMIN.
#[derive(Debug, Clone, Copy)]
pub struct AdminUser(pub Actor);

impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let locale = Locale::from_request_parts(parts, state)
            .await
            .unwrap_or_default();

        let AuthenticatedUser(actor) = AuthenticatedUser::from_request_parts(parts, state)
            .await
            .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

        if !actor.is_admin() {
            return Err(AppError::forbidden("apenas administradores")
                .to_api_error(&locale, &app_state.i18n_store));
        }

        Ok(AdminUser(actor))
    }
}
