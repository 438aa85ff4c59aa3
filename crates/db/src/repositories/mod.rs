//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument. Every call runs under a fixed
//! deadline and returns [`StoreError`](crate::StoreError).

pub mod movie_repo;
pub mod permission_repo;
pub mod token_repo;
pub mod user_repo;

pub use movie_repo::MovieRepo;
pub use permission_repo::PermissionRepo;
pub use token_repo::TokenRepo;
pub use user_repo::UserRepo;
