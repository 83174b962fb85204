pub(crate) mod approval_sql;
pub mod stores;

pub mod company_repo;
pub use company_repo::CompanyRepository;
pub mod follower_repo;
pub use follower_repo::FollowerRepository;
pub mod product_repo;
pub use product_repo::ProductRepository;
pub mod user_repo;
pub use user_repo::UserRepository;

#[cfg(test)]
pub(crate) mod memory;

#[cfg(test)]
pub(crate) mod fixtures;
