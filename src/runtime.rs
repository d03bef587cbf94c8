use std::convert::Infallible;

use tracing::info;
use warp::Filter;

use crate::handlers::http::{self, HttpState};

pub fn chat_route(
    state: HttpState,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    warp::post()
        .and(warp::path::end())
        .and(warp::body::json())
        .and(with_state(state))
        .and_then(|request, state| http::handle_chat(state, request))
}

fn with_state(
    state: HttpState,
) -> impl Filter<Extract = (HttpState,), Error = Infallible> + Clone {
    warp::any().map(move || state.clone())
}

pub async fn run_api(state: HttpState, port: u16) {
    info!(port, "starting HTTP chat surface");
    warp::serve(chat_route(state)).run(([0, 0, 0, 0], port)).await;
}
