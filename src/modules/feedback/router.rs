use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

use super::controller::{create_feedback, get_all_feedback, get_my_feedback, reply_feedback};

pub fn init_feedback_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_all_feedback).post(create_feedback))
        .route("/mine", get(get_my_feedback))
        .route("/{id}/reply", post(reply_feedback))
}
