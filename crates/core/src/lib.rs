//! Domain logic for the Marquee catalog service.
//!
//! Pure, database-free building blocks shared by the repository layer and
//! the HTTP boundary: validation, filter resolution, entity rules, password
//! hashing and token generation.

pub mod error;
pub mod filters;
pub mod hashing;
pub mod movies;
pub mod password;
pub mod permissions;
pub mod tokens;
pub mod types;
pub mod users;
pub mod validator;
