// src/middleware/auth.rs

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::{HeaderMap, request::Parts},
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::i18n::Locale,
    models::auth::Actor,
};

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .typed_get::<Authorization<Bearer>>()
        .map(|Authorization(bearer)| bearer.token().to_string())
}

fn locale_of(headers: &HeaderMap) -> Locale {
    Locale::from_header(
        headers
            .get(axum::http::header::ACCEPT_LANGUAGE)
            .and_then(|v| v.to_str().ok()),
    )
}

// Rotas que exigem login: resolve o token e guarda Actor + User na requisição
pub async fn auth_guard(
    State(app_state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let locale = locale_of(request.headers());

    let Some(token) = bearer_token(request.headers()) else {
        return Err(AppError::InvalidToken.to_api_error(&locale, &app_state.i18n_store));
    };

    let user = app_state
        .auth_service
        .validate_token(&token)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    request.extensions_mut().insert(user.actor());
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

// Extrator para obter o ator autenticado diretamente nos handlers
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedUser(pub Actor);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Actor>()
            .copied()
            .map(AuthenticatedUser)
            .ok_or(AppError::InvalidToken)
    }
}

/// Leitura pública: sem token é anônimo, token inválido é 401.
#[derive(Debug, Clone, Copy)]
pub struct MaybeUser(pub Option<Actor>);

impl MaybeUser {
    pub fn actor(&self) -> Option<&Actor> {
        self.0.as_ref()
    }
}

impl<S> FromRequestParts<S> for MaybeUser
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(actor) = parts.extensions.get::<Actor>() {
            return Ok(MaybeUser(Some(*actor)));
        }

        let Some(token) = bearer_token(&parts.headers) else {
            return Ok(MaybeUser(None));
        };

        let app_state = AppState::from_ref(state);
        let actor = app_state
            .auth_service
            .resolve_actor(&token)
            .await
            .map_err(|e| e.to_api_error(&locale_of(&parts.headers), &app_state.i18n_store))?;

        parts.extensions.insert(actor);
        Ok(MaybeUser(Some(actor)))
    }
}
