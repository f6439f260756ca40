//! # CampusDesk Auth
//!
//! Identity and authorization for the CampusDesk API.
//!
//! - [`roles`]: [`Role`] and [`MemberKind`], stored as Postgres enums
//! - [`claims`]: access and refresh token claim sets
//! - [`jwt`]: token creation and verification
//! - [`gate`]: the operation/role table and the [`authorize`] check

pub mod claims;
pub mod gate;
pub mod jwt;
pub mod roles;

pub use claims::{Claims, RefreshTokenClaims};
pub use gate::{CallerIdentity, Operation, authenticate, authorize};
pub use jwt::{create_access_token, create_refresh_token, verify_refresh_token, verify_token};
pub use roles::{MemberKind, Role};
