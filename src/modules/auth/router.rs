use axum::{Router, middleware, routing::post};

use crate::middleware::rate_limit::auth_rate_limit;
use crate::state::AppState;

use super::controller::{login_user, refresh_token, register_user};

pub fn init_auth_router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/register", post(register_user))
        .route("/login", post(login_user))
        .route("/refresh", post(refresh_token))
        .route_layer(middleware::from_fn_with_state(state, auth_rate_limit))
}
