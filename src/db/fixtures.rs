// src/db/fixtures.rs

// Dados mínimos para os testes contra Postgres (#[sqlx::test]).

use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::stores::{CompanyStore, ProductStore, UserStore};
use crate::db::{CompanyRepository, ProductRepository, UserRepository};
use crate::models::approval::Transition;
use crate::models::company::{Company, CreateCompanyPayload};
use crate::models::product::{CreateProductPayload, CreateVariantPayload, Product, ProductVariant};

pub async fn user(pool: &PgPool, name: &str) -> Uuid {
    let email = format!("{}@example.com", name.to_lowercase());
    UserRepository::new(pool.clone())
        .create(name, &email, "not-a-hash")
        .await
        .unwrap()
        .id
}

pub async fn company(pool: &PgPool, owner_id: Uuid, name: &str) -> Company {
    let payload = CreateCompanyPayload {
        name: name.into(),
        description: None,
        logo_url: None,
        business_email: None,
        business_phone: None,
        city: None,
        state: None,
        pincode: None,
        gst_number: None,
        pan_number: None,
        product_visibility: None,
    };
    CompanyRepository::new(pool.clone())
        .create(owner_id, &payload)
        .await
        .unwrap()
}

pub async fn approved_company(pool: &PgPool, owner_id: Uuid, admin_id: Uuid) -> Company {
    let company = company(pool, owner_id, "Green Farm").await;
    CompanyRepository::new(pool.clone())
        .transition(company.id, &Transition::approve(admin_id, None))
        .await
        .unwrap()
}

pub fn variant(label: &str) -> CreateVariantPayload {
    CreateVariantPayload {
        label: label.into(),
        quantity_value: Decimal::ONE,
        quantity_unit: "kg".into(),
        price: Decimal::new(450, 2),
        stock_quantity: Some(10),
        low_stock_threshold: None,
    }
}

pub async fn product(
    pool: &PgPool,
    company_id: Uuid,
    submitted_by: Uuid,
) -> (Product, Vec<ProductVariant>) {
    let payload = CreateProductPayload {
        company_id,
        category_id: None,
        name: "Tomatoes".into(),
        description: None,
        unit: "kg".into(),
        origin: None,
        base_price: Decimal::new(400, 2),
        variants: vec![variant("1 kg"), variant("5 kg")],
    };
    ProductRepository::new(pool.clone())
        .create(&payload, submitted_by)
        .await
        .unwrap()
}
