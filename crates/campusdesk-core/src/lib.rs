//! # CampusDesk Core
//!
//! Foundational types shared by every CampusDesk crate:
//!
//! - [`errors`]: the [`AppError`] type and its JSON response shape
//! - [`pagination`]: limit/offset query parameters for list endpoints
//! - [`password`]: bcrypt hashing helpers
//! - [`serde`]: lenient query-string deserializers

pub mod errors;
pub mod pagination;
pub mod password;
pub mod serde;

pub use errors::AppError;
pub use pagination::{PaginationMeta, PaginationParams};
pub use password::{hash_password, verify_password};
