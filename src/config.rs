// src/config.rs

use std::{env, str::FromStr, sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::{PgPool, postgres::PgPoolOptions};

use crate::{
    common::i18n::I18nStore,
    db::{CompanyRepository, FollowerRepository, ProductRepository, UserRepository},
    services::{
        auth::{AuthService, BcryptHasher, JwtIssuer},
        company_service::CompanyService,
        product_service::ProductService,
        storage::SignedUrlStore,
    },
};

// ---
// Configuração (variáveis de ambiente)
// ---

#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_ttl_days: i64,
    pub server_addr: String,
    pub db_max_connections: u32,
    pub db_acquire_timeout: Duration,
    pub request_timeout: Duration,
    pub storage_public_url: String,
    pub storage_signing_secret: String,
    pub upload_url_ttl: Duration,
}

fn required(key: &str) -> anyhow::Result<String> {
    env::var(key).with_context(|| format!("{key} deve ser definida"))
}

fn optional<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .with_context(|| format!("{key} inválida: '{raw}'")),
        Err(_) => Ok(default),
    }
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            jwt_ttl_days: optional("JWT_TTL_DAYS", 7)?,
            server_addr: optional("SERVER_ADDR", "0.0.0.0:3000".to_string())?,
            db_max_connections: optional("DB_MAX_CONNECTIONS", 5)?,
            db_acquire_timeout: Duration::from_secs(optional("DB_ACQUIRE_TIMEOUT_SECS", 3)?),
            request_timeout: Duration::from_secs(optional("REQUEST_TIMEOUT_SECS", 30)?),
            storage_public_url: optional(
                "STORAGE_PUBLIC_URL",
                "http://localhost:9000/agromart".to_string(),
            )?,
            storage_signing_secret: required("STORAGE_SIGNING_SECRET")?,
            upload_url_ttl: Duration::from_secs(optional("UPLOAD_URL_TTL_SECS", 900)?),
        })
    }
}

// ---
// Estado compartilhado
// ---

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub settings: Arc<Settings>,
    pub i18n_store: I18nStore,
    pub auth_service: AuthService,
    pub company_service: CompanyService,
    pub product_service: ProductService,
}

impl AppState {
    pub async fn new(settings: Settings) -> anyhow::Result<Self> {
        let db_pool = PgPoolOptions::new()
            .max_connections(settings.db_max_connections)
            .acquire_timeout(settings.db_acquire_timeout)
            .connect(&settings.database_url)
            .await
            .context("Falha ao conectar ao banco de dados")?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        Ok(Self::from_pool(db_pool, settings))
    }

    /// Monta o gráfico de dependências sobre um pool já aberto.
    pub fn from_pool(db_pool: PgPool, settings: Settings) -> Self {
        let users = Arc::new(UserRepository::new(db_pool.clone()));
        let companies = Arc::new(CompanyRepository::new(db_pool.clone()));
        let followers = Arc::new(FollowerRepository::new(db_pool.clone()));
        let products = Arc::new(ProductRepository::new(db_pool.clone()));

        let auth_service = AuthService::new(
            users,
            Arc::new(BcryptHasher::default()),
            Arc::new(JwtIssuer::new(settings.jwt_secret.clone(), settings.jwt_ttl_days)),
        );
        let company_service = CompanyService::new(companies.clone(), followers);
        let storage = Arc::new(SignedUrlStore::new(
            settings.storage_public_url.clone(),
            settings.storage_signing_secret.clone(),
            settings.upload_url_ttl,
        ));
        let product_service = ProductService::new(
            products,
            companies,
            company_service.gate().clone(),
            storage,
        );

        Self {
            db_pool,
            settings: Arc::new(settings),
            i18n_store: I18nStore::new(),
            auth_service,
            company_service,
            product_service,
        }
    }
}
