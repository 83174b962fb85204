// src/services/visibility.rs

use std::sync::Arc;

use uuid::Uuid;

use crate::common::error::AppError;
use crate::db::stores::{CompanyStore, FollowerStore};
use crate::models::company::{Company, ProductVisibility};

/// Resultado da regra pura; `RequiresFollow` ainda depende de uma consulta.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Allowed,
    Denied,
    RequiresFollow(Uuid),
}

/// Pode `viewer` ver os produtos de `company`?
pub fn evaluate(company: &Company, viewer: Option<Uuid>) -> Visibility {
    let is_owner = viewer == Some(company.owner_id);

    if !(company.approval.is_approved() && company.is_active) {
        return if is_owner {
            Visibility::Allowed
        } else {
            Visibility::Denied
        };
    }

    match (company.product_visibility, viewer) {
        (ProductVisibility::Public, _) => Visibility::Allowed,
        (_, None) => Visibility::Denied,
        _ if is_owner => Visibility::Allowed,
        (ProductVisibility::Private, Some(_)) => Visibility::Denied,
        (ProductVisibility::FollowersOnly, Some(user_id)) => Visibility::RequiresFollow(user_id),
    }
}

#[derive(Clone)]
pub struct VisibilityGate {
    companies: Arc<dyn CompanyStore>,
    followers: Arc<dyn FollowerStore>,
}

impl VisibilityGate {
    pub fn new(companies: Arc<dyn CompanyStore>, followers: Arc<dyn FollowerStore>) -> Self {
        Self {
            companies,
            followers,
        }
    }

    pub async fn can_view_products(
        &self,
        company_id: Uuid,
        viewer: Option<Uuid>,
    ) -> Result<bool, AppError> {
        let company = self
            .companies
            .find_by_id(company_id)
            .await?
            .ok_or(AppError::CompanyNotFound)?;
        self.check(&company, viewer).await
    }

    pub async fn check(&self, company: &Company, viewer: Option<Uuid>) -> Result<bool, AppError> {
        match evaluate(company, viewer) {
            Visibility::Allowed => Ok(true),
            Visibility::Denied => Ok(false),
            Visibility::RequiresFollow(user_id) => {
                self.followers.is_following(company.id, user_id).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::approval::{ApprovalState, ApprovalStatus};
    use chrono::Utc;

    fn company(status: ApprovalStatus, active: bool, visibility: ProductVisibility) -> Company {
        let now = Utc::now();
        let mut approval = ApprovalState::submitted(now);
        approval.approval_status = status;
        Company {
            id: Uuid::new_v4(),
            owner_id: Uuid::from_u128(42),
            name: "Green Farm".into(),
            description: None,
            logo_url: None,
            business_email: None,
            business_phone: None,
            city: None,
            state: None,
            pincode: None,
            gst_number: None,
            pan_number: None,
            approval,
            product_visibility: visibility,
            follower_count: 0,
            is_active: active,
            created_at: now,
            updated_at: now,
        }
    }

    const OWNER: Uuid = Uuid::from_u128(42);
    const OTHER: Uuid = Uuid::from_u128(7);

    #[test]
    fn unapproved_or_inactive_companies_are_owner_only() {
        for (status, active) in [
            (ApprovalStatus::Pending, true),
            (ApprovalStatus::Rejected, true),
            (ApprovalStatus::Approved, false),
        ] {
            let c = company(status, active, ProductVisibility::Public);
            assert_eq!(evaluate(&c, Some(OWNER)), Visibility::Allowed);
            assert_eq!(evaluate(&c, Some(OTHER)), Visibility::Denied);
            assert_eq!(evaluate(&c, None), Visibility::Denied);
        }
    }

    #[test]
    fn public_is_open_to_everyone() {
        let c = company(ApprovalStatus::Approved, true, ProductVisibility::Public);
        assert_eq!(evaluate(&c, None), Visibility::Allowed);
        assert_eq!(evaluate(&c, Some(OTHER)), Visibility::Allowed);
    }

    #[test]
    fn private_is_owner_only() {
        let c = company(ApprovalStatus::Approved, true, ProductVisibility::Private);
        assert_eq!(evaluate(&c, None), Visibility::Denied);
        assert_eq!(evaluate(&c, Some(OTHER)), Visibility::Denied);
        assert_eq!(evaluate(&c, Some(OWNER)), Visibility::Allowed);
    }

    #[test]
    fn followers_only_needs_a_follow_lookup() {
        let c = company(ApprovalStatus::Approved, true, ProductVisibility::FollowersOnly);
        assert_eq!(evaluate(&c, None), Visibility::Denied);
        assert_eq!(evaluate(&c, Some(OWNER)), Visibility::Allowed);
        assert_eq!(evaluate(&c, Some(OTHER)), Visibility::RequiresFollow(OTHER));
    }
}
