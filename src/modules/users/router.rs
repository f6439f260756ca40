use axum::{
    Router,
    routing::{get, put},
};

use crate::state::AppState;

use super::controller::{create_user, delete_user, get_profile, get_user, get_users, set_enrollment};

pub fn init_users_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_users).post(create_user))
        .route("/{id}", get(get_user).delete(delete_user))
        .route("/{id}/enrollment", put(set_enrollment))
}

pub fn init_profile_router() -> Router<AppState> {
    Router::new().route("/", get(get_profile))
}
