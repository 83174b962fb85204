pub mod approval;
pub mod auth;
pub mod company;
pub mod product;
