use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

use super::controller::{decide_leave, get_all_leave, get_leave_queue, get_my_leave, submit_leave};

pub fn init_leave_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_all_leave).post(submit_leave))
        .route("/mine", get(get_my_leave))
        .route("/queue", get(get_leave_queue))
        .route("/{id}/decision", post(decide_leave))
}
