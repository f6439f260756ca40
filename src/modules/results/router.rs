use axum::{Router, routing::get};

use crate::state::AppState;

use super::controller::{get_my_results, get_results, upsert_result};

pub fn init_results_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_results).put(upsert_result))
        .route("/mine", get(get_my_results))
}
