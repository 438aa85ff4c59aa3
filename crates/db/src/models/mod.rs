//! Domain model structs and DTOs.
//!
//! Each submodule contains a `FromRow` entity struct matching the database
//! row plus the create/update DTOs used to write it.

pub mod movie;
pub mod user;
