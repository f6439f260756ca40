use axum::{Router, routing::get};

use crate::state::AppState;

use super::controller::{create_session, delete_session, get_session, get_sessions, update_session};

pub fn init_sessions_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_sessions).post(create_session))
        .route(
            "/{id}",
            get(get_session).put(update_session).delete(delete_session),
        )
}
