// src/services/auth.rs

use std::sync::Arc;

use async_trait::async_trait;
use bcrypt::{hash, verify};
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};

use crate::{
    common::error::AppError,
    db::stores::UserStore,
    models::auth::{Actor, Claims, User},
};

// ---
// Colaboradores (hash de senha e emissão de token)
// ---

#[async_trait]
pub trait PasswordHasher: Send + Sync {
    async fn hash(&self, password: &str) -> Result<String, AppError>;
    async fn verify(&self, password: &str, password_hash: &str) -> Result<bool, AppError>;
}

pub trait TokenIssuer: Send + Sync {
    fn issue(&self, user: &User) -> Result<String, AppError>;
    fn decode(&self, token: &str) -> Result<Claims, AppError>;
}

pub struct BcryptHasher {
    cost: u32,
}

impl BcryptHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }
}

impl Default for BcryptHasher {
    fn default() -> Self {
        Self::new(bcrypt::DEFAULT_COST)
    }
}

#[async_trait]
impl PasswordHasher for BcryptHasher {
    async fn hash(&self, password: &str) -> Result<String, AppError> {
        let password = password.to_owned();
        let cost = self.cost;
        // bcrypt é CPU-bound: fora do runtime
        let hashed = tokio::task::spawn_blocking(move || hash(&password, cost))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;
        Ok(hashed)
    }

    async fn verify(&self, password: &str, password_hash: &str) -> Result<bool, AppError> {
        let password = password.to_owned();
        let password_hash = password_hash.to_owned();
        let valid = tokio::task::spawn_blocking(move || verify(&password, &password_hash))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;
        Ok(valid)
    }
}

pub struct JwtIssuer {
    secret: String,
    ttl_days: i64,
}

impl JwtIssuer {
    pub fn new(secret: impl Into<String>, ttl_days: i64) -> Self {
        Self {
            secret: secret.into(),
            ttl_days,
        }
    }
}

impl TokenIssuer for JwtIssuer {
    fn issue(&self, user: &User) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = now + chrono::Duration::days(self.ttl_days);

        let claims = Claims {
            sub: user.id,
            role: user.role,
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_ref()),
        )?)
    }

    fn decode(&self, token: &str) -> Result<Claims, AppError> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_ref()),
            &Validation::default(),
        )
        .map_err(|_| AppError::InvalidToken)?;
        Ok(token_data.claims)
    }
}

// ---
// Serviço
// ---

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    hasher: Arc<dyn PasswordHasher>,
    tokens: Arc<dyn TokenIssuer>,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserStore>,
        hasher: Arc<dyn PasswordHasher>,
        tokens: Arc<dyn TokenIssuer>,
    ) -> Self {
        Self {
            users,
            hasher,
            tokens,
        }
    }

    pub async fn register_user(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<String, AppError> {
        let email = email.trim().to_lowercase();
        let password_hash = self.hasher.hash(password).await?;
        let user = self.users.create(name.trim(), &email, &password_hash).await?;

        tracing::info!("👤 Usuário registrado: {}", user.id);
        self.tokens.issue(&user)
    }

    pub async fn login_user(&self, email: &str, password: &str) -> Result<String, AppError> {
        let email = email.trim().to_lowercase();
        let user = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        if !self.hasher.verify(password, &user.password_hash).await? {
            return Err(AppError::InvalidCredentials);
        }

        self.tokens.issue(&user)
    }

    /// Token -> usuário atual. O papel vem do banco, não do token.
    pub async fn validate_token(&self, token: &str) -> Result<User, AppError> {
        let claims = self.tokens.decode(token)?;
        self.users
            .find_by_id(claims.sub)
            .await?
            .ok_or(AppError::InvalidToken)
    }

    pub async fn resolve_actor(&self, token: &str) -> Result<Actor, AppError> {
        Ok(self.validate_token(token).await?.actor())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::error::ErrorKind;
    use crate::db::memory::InMemoryStore;
    use crate::models::auth::Role;

    fn service(store: &InMemoryStore) -> AuthService {
        AuthService::new(
            Arc::new(store.clone()),
            // custo mínimo: testes rápidos
            Arc::new(BcryptHasher::new(4)),
            Arc::new(JwtIssuer::new("test-secret", 1)),
        )
    }

    #[tokio::test]
    async fn register_then_login_resolves_the_same_actor() {
        let store = InMemoryStore::new();
        let auth = service(&store);

        let token = auth
            .register_user("Ana", "Ana@Example.com", "secret123")
            .await
            .unwrap();
        let actor = auth.resolve_actor(&token).await.unwrap();
        assert_eq!(actor.role, Role::User);

        let token = auth.login_user("ana@example.com", "secret123").await.unwrap();
        assert_eq!(auth.resolve_actor(&token).await.unwrap(), actor);
    }

    #[tokio::test]
    async fn wrong_password_and_duplicate_email_fail() {
        let store = InMemoryStore::new();
        let auth = service(&store);
        auth.register_user("Ana", "ana@example.com", "secret123")
            .await
            .unwrap();

        let err = auth.login_user("ana@example.com", "nope-nope").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidCredentials));

        let err = auth
            .register_user("Ana 2", "ana@example.com", "secret123")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn garbage_token_is_rejected() {
        let auth = service(&InMemoryStore::new());
        let err = auth.resolve_actor("not-a-jwt").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
    }
}
