// src/common/i18n.rs

use std::{collections::HashMap, sync::Arc};

pub const DEFAULT_LANG: &str = "pt";

type Catalog = HashMap<&'static str, &'static str>;

const PT: &[(&str, &str)] = &[
    ("VALIDATION_FAILED", "Um ou mais campos são inválidos."),
    ("INVALID_FIELD", "Campo '{field}' inválido: {message}."),
    ("EMAIL_ALREADY_EXISTS", "Este e-mail já está em uso."),
    ("INVALID_CREDENTIALS", "E-mail ou senha inválidos."),
    ("INVALID_TOKEN", "Token de autenticação inválido ou ausente."),
    ("USER_NOT_FOUND", "Usuário não encontrado."),
    ("COMPANY_NOT_FOUND", "Empresa não encontrada."),
    ("PRODUCT_NOT_FOUND", "Produto não encontrado."),
    ("VARIANT_NOT_FOUND", "Variante não encontrada."),
    ("IMAGE_NOT_FOUND", "Imagem não encontrada."),
    ("CATEGORY_NOT_FOUND", "Categoria não encontrada."),
    ("FORBIDDEN", "Acesso negado: {reason}."),
    (
        "INVALID_STATE_TRANSITION",
        "Não é possível executar '{action}' em {entity} com status {current}. Status esperado: {expected}.",
    ),
    (
        "COMPANY_NAME_ALREADY_EXISTS",
        "Você já possui uma empresa chamada '{name}'.",
    ),
    (
        "TRANSITION_CONFLICT",
        "O status de {entity} {id} mudou durante a operação (esperado: {expected}). Recarregue e tente novamente.",
    ),
    ("LAST_VARIANT", "O produto precisa manter ao menos uma variante."),
    ("COMPANY_NOT_APPROVED", "A empresa {id} não está aprovada e ativa."),
    ("CANNOT_FOLLOW_OWN_COMPANY", "Você não pode seguir a sua própria empresa."),
    ("INTERNAL_ERROR", "Ocorreu um erro inesperado."),
];

const EN: &[(&str, &str)] = &[
    ("VALIDATION_FAILED", "One or more fields are invalid."),
    ("INVALID_FIELD", "Invalid field '{field}': {message}."),
    ("EMAIL_ALREADY_EXISTS", "This e-mail is already in use."),
    ("INVALID_CREDENTIALS", "Invalid e-mail or password."),
    ("INVALID_TOKEN", "Missing or invalid authentication token."),
    ("USER_NOT_FOUND", "User not found."),
    ("COMPANY_NOT_FOUND", "Company not found."),
    ("PRODUCT_NOT_FOUND", "Product not found."),
    ("VARIANT_NOT_FOUND", "Variant not found."),
    ("IMAGE_NOT_FOUND", "Image not found."),
    ("CATEGORY_NOT_FOUND", "Category not found."),
    ("FORBIDDEN", "Access denied: {reason}."),
    (
        "INVALID_STATE_TRANSITION",
        "Cannot {action} {entity} with status {current}. Expected status: {expected}.",
    ),
    (
        "COMPANY_NAME_ALREADY_EXISTS",
        "You already own a company named '{name}'.",
    ),
    (
        "TRANSITION_CONFLICT",
        "The status of {entity} {id} changed concurrently (expected {expected}). Reload and try again.",
    ),
    ("LAST_VARIANT", "A product must keep at least one variant."),
    ("COMPANY_NOT_APPROVED", "Company {id} is not approved and active."),
    ("CANNOT_FOLLOW_OWN_COMPANY", "You cannot follow your own company."),
    ("INTERNAL_ERROR", "An unexpected error occurred."),
];

/// Catálogo de mensagens por idioma, compartilhado via `AppState`.
#[derive(Clone)]
pub struct I18nStore {
    catalogs: Arc<HashMap<&'static str, Catalog>>,
}

impl I18nStore {
    pub fn new() -> Self {
        let mut catalogs = HashMap::new();
        catalogs.insert("pt", PT.iter().copied().collect::<Catalog>());
        catalogs.insert("en", EN.iter().copied().collect::<Catalog>());
        Self {
            catalogs: Arc::new(catalogs),
        }
    }

    pub fn supports(&self, lang: &str) -> bool {
        self.catalogs.contains_key(lang)
    }

    /// Idioma desconhecido cai no catálogo padrão; código desconhecido devolve `None`.
    pub fn translate(&self, lang: &str, code: &str, params: &[(&str, String)]) -> Option<String> {
        let catalog = self
            .catalogs
            .get(lang)
            .or_else(|| self.catalogs.get(DEFAULT_LANG))?;
        let template = catalog.get(code)?;

        let mut message = template.to_string();
        for (key, value) in params {
            message = message.replace(&format!("{{{key}}}"), value);
        }
        Some(message)
    }
}

impl Default for I18nStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_catalogs_cover_the_same_codes() {
        let pt: Vec<_> = PT.iter().map(|(code, _)| *code).collect();
        let en: Vec<_> = EN.iter().map(|(code, _)| *code).collect();
        assert_eq!(pt, en);
    }

    #[test]
    fn interpolates_params() {
        let store = I18nStore::new();
        let msg = store
            .translate("en", "COMPANY_NAME_ALREADY_EXISTS", &[("name", "Green Farm".into())])
            .unwrap();
        assert_eq!(msg, "You already own a company named 'Green Farm'.");
    }

    #[test]
    fn unknown_code_returns_none() {
        assert!(I18nStore::new().translate("pt", "NOPE", &[]).is_none());
    }
}
