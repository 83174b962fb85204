pub mod auth;
pub mod company_service;
pub mod guard;
pub mod product_service;
pub mod storage;
pub mod visibility;
