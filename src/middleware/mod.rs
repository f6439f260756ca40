//! Middleware and extractors for cross-cutting request concerns.
//!
//! - [`auth`]: bearer-token authentication and the per-operation gate extractors
//! - [`role`]: layer-level role checks for whole route groups
//! - [`rate_limit`]: per-client request quotas
//!
//! # Authorization Flow
//!
//! 1. Client sends `Authorization: Bearer <token>`
//! 2. [`auth::AuthUser`] verifies the JWT and yields the caller's id and role
//! 3. A gate extractor such as [`auth::RequireMarkAttendance`] checks the role
//!    against the operation's role set and rejects with 403 before the handler runs
//! 4. Services then apply ownership checks (subject teacher, own records)
//!
//! ```ignore
//! async fn mark(
//!     State(state): State<AppState>,
//!     RequireMarkAttendance(caller): RequireMarkAttendance,
//!     ValidatedJson(dto): ValidatedJson<MarkAttendanceDto>,
//! ) -> Result<Json<MarkAttendanceAck>, AppError> { ... }
//! ```

pub mod auth;
pub mod rate_limit;
pub mod role;
