use axum::http::{HeaderValue, Method, header};
use axum::{Router, middleware};
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable as _};
use utoipa_swagger_ui::SwaggerUi;

use crate::docs::ApiDoc;
use crate::logging::logging_middleware;
use crate::metrics::metrics_middleware;
use crate::middleware::rate_limit::general_rate_limit;
use crate::middleware::role::require_admin;
use crate::modules::attendance::router::init_attendance_router;
use crate::modules::auth::router::init_auth_router;
use crate::modules::courses::router::init_courses_router;
use crate::modules::dashboard::router::init_dashboard_router;
use crate::modules::feedback::router::init_feedback_router;
use crate::modules::leave::router::init_leave_router;
use crate::modules::results::router::init_results_router;
use crate::modules::sessions::router::init_sessions_router;
use crate::modules::subjects::router::init_subjects_router;
use crate::modules::users::router::{init_profile_router, init_users_router};
use crate::state::AppState;

fn cors_layer(state: &AppState) -> CorsLayer {
    let allowed_origins: Vec<HeaderValue> = state
        .cors_config
        .allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .allow_credentials(true)
}

pub fn init_router(state: AppState) -> Router {
    let api = Router::new()
        .nest("/auth", init_auth_router(state.clone()))
        .nest(
            "/users",
            init_users_router()
                .route_layer(middleware::from_fn_with_state(state.clone(), require_admin)),
        )
        .nest("/profile", init_profile_router())
        .nest("/dashboard", init_dashboard_router())
        .nest("/courses", init_courses_router())
        .nest("/sessions", init_sessions_router())
        .nest("/subjects", init_subjects_router())
        .nest("/attendance", init_attendance_router())
        .nest("/leave", init_leave_router())
        .nest("/feedback", init_feedback_router())
        .nest("/results", init_results_router())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            general_rate_limit,
        ));

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(Scalar::with_url("/scalar", ApiDoc::openapi()))
        .nest("/api", api)
        .with_state(state.clone())
        .layer(cors_layer(&state))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(logging_middleware))
}
