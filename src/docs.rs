// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};

use crate::common::error::ApiError;
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::register,
        handlers::auth::login,

        // --- Users ---
        handlers::auth::get_me,
        handlers::auth::get_my_companies,

        // --- Companies ---
        handlers::companies::list_companies,
        handlers::companies::get_company,
        handlers::companies::can_view_products,
        handlers::companies::create_company,
        handlers::companies::update_company,
        handlers::companies::update_visibility,
        handlers::companies::delete_company,
        handlers::companies::resubmit_company,
        handlers::companies::company_history,

        // --- Followers ---
        handlers::companies::follow_company,
        handlers::companies::unfollow_company,
        handlers::companies::follow_status,
        handlers::companies::follow_status_batch,
        handlers::companies::list_followers,
        handlers::companies::followed_companies,

        // --- Products ---
        handlers::products::list_products,
        handlers::products::get_product,
        handlers::products::create_product,
        handlers::products::update_product,
        handlers::products::delete_product,
        handlers::products::resubmit_product,
        handlers::products::product_history,
        handlers::products::create_variant,
        handlers::products::update_variant,
        handlers::products::delete_variant,
        handlers::products::presign_image,
        handlers::products::delete_image,
        handlers::products::set_primary_image,

        // --- Admin ---
        handlers::admin::approve_company,
        handlers::admin::reject_company,
        handlers::admin::deactivate_company,
        handlers::admin::approve_product,
        handlers::admin::reject_product,
        handlers::admin::pending_counts,
    ),
    components(
        schemas(
            ApiError,

            // --- Auth ---
            models::auth::Role,
            models::auth::User,
            models::auth::RegisterUserPayload,
            models::auth::LoginUserPayload,
            models::auth::AuthResponse,

            // --- Aprovação ---
            models::approval::ApprovalStatus,
            models::approval::ApprovalAction,
            models::approval::ApprovalState,
            models::approval::ApprovalHistory,
            models::approval::ApprovePayload,
            models::approval::RejectPayload,
            models::approval::PendingCounts,

            // --- Companies ---
            models::company::ProductVisibility,
            models::company::Company,
            models::company::CompanyResponse,
            models::company::CompanyFollower,
            models::company::FollowerEntry,
            models::company::FollowStatus,
            models::company::CanViewProductsResponse,
            models::company::CreateCompanyPayload,
            models::company::UpdateCompanyPayload,
            models::company::UpdateVisibilityPayload,
            handlers::companies::FollowStatusBatchPayload,

            // --- Products ---
            models::product::Product,
            models::product::ProductVariant,
            models::product::ProductImage,
            models::product::VariantResponse,
            models::product::ProductResponse,
            models::product::ImageUploadResponse,
            models::product::CreateProductPayload,
            models::product::UpdateProductPayload,
            models::product::CreateVariantPayload,
            models::product::UpdateVariantPayload,
            models::product::ImageUploadPayload,
        )
    ),
    tags(
        (name = "Auth", description = "Autenticação e Registro"),
        (name = "Users", description = "Dados do Usuário"),
        (name = "Companies", description = "Vitrines e fluxo de aprovação do dono"),
        (name = "Followers", description = "Seguir empresas"),
        (name = "Products", description = "Catálogo e fluxo de aprovação de produtos"),
        (name = "Variants", description = "Variantes de produto"),
        (name = "Images", description = "Imagens de produto (upload assinado)"),
        (name = "Admin", description = "Revisão de empresas e produtos")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_protected_and_public_routes() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/companies/{id}/follow"));
        assert!(doc.paths.paths.contains_key("/api/admin/pending"));
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("api_jwt"));
    }
}
