//! # CampusDesk API
//!
//! Backend for a small college's academic administration, built on Axum and
//! PostgreSQL. Three roles share one portal:
//!
//! | Role | Can |
//! |------|-----|
//! | Administrator | manage users and the catalog, decide leave, answer feedback |
//! | Staff | mark attendance and record results for subjects they teach, apply for leave |
//! | Student | read their own attendance and results, apply for leave |
//!
//! Every handler takes a `Require*` extractor from [`middleware::auth`], which
//! authenticates the bearer token and checks the caller's role against
//! [`campusdesk_auth::Operation::required_roles`] before the handler body runs.
//!
//! ## Layout
//!
//! ```text
//! src/
//! ├── middleware/      # gate extractors, route-group guards, rate limiting
//! ├── modules/         # one directory per feature
//! │   ├── attendance/  # marking, daily log, summaries
//! │   ├── leave/       # submit and decide leave
//! │   └── ...
//! ├── docs.rs          # OpenAPI document
//! ├── logging.rs       # tracing setup and request logging
//! ├── metrics.rs       # Prometheus recorder and business counters
//! └── router.rs        # route tree
//! ```
//!
//! Each feature module is split into `controller.rs` (handlers), `service.rs`
//! (queries and rules), `model.rs` (DTOs, re-exported from
//! `campusdesk-models`) and `router.rs`.
//!
//! ## API documentation
//!
//! - Swagger UI: `http://localhost:3000/swagger-ui`
//! - Scalar: `http://localhost:3000/scalar`

pub mod docs;
pub mod logging;
pub mod metrics;
pub mod middleware;
pub mod modules;
pub mod router;
pub mod state;
pub mod validator;

pub use campusdesk_auth;
pub use campusdesk_config;
pub use campusdesk_core;
pub use campusdesk_db;
pub use campusdesk_models;
