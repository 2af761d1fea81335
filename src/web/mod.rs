use axum::{
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use http::header::{HeaderValue, CACHE_CONTROL};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;

pub mod middleware;
pub mod routes;
pub mod state;

use self::middleware::flow_session;
use self::routes::{availability, form};
use self::state::AppState;

pub fn router(state: AppState) -> Router {
    let form_routes = Router::new()
        .route("/", get(form::form_page_handler))
        .route("/flow", post(form::flow_command_handler))
        .layer(from_fn(flow_session::load_flow_state));

    Router::new()
        .merge(form_routes)
        .route(
            "/api/availability/:day",
            get(availability::availability_handler),
        )
        .nest_service("/assets", ServeDir::new("assets"))
        .layer(SetResponseHeaderLayer::if_not_present(
            CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(CatchPanicLayer::new())
        .with_state(state)
}
