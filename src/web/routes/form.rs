use askama::Template;
use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    Extension, Form,
};
use serde::Deserialize;
use tracing::{info, warn};

use crate::services::form_flow_service::{self, FlowAction, FlowState, FormView, Step};
use crate::web::middleware::flow_session;
use crate::web::state::AppState;

#[derive(Template)]
#[template(path = "register.html")]
pub struct RegisterTemplate {
    pub view: FormView,
    pub refresh_after_secs: Option<u64>,
}

pub async fn form_page_handler(
    Extension(flow): Extension<FlowState>,
    State(app): State<AppState>,
) -> Response {
    let view = form_flow_service::build_view(&app.flow_context(), &flow).await;

    // Notices show once. A completed flow starts over on the next load.
    let (next, refresh_after_secs) = if flow.step == Step::Completed {
        (FlowState::default(), Some(app.reset_delay.as_secs()))
    } else {
        (
            FlowState {
                notice: None,
                ..flow
            },
            None,
        )
    };

    let template = RegisterTemplate {
        view,
        refresh_after_secs,
    };
    let mut response = match template.render() {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            warn!("register template render failed: {}", e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };
    flow_session::set_flow_cookie(&mut response, &next);
    response
}

#[derive(Debug, Deserialize)]
pub struct FlowCommandForm {
    pub action: String, // institution|participant|confirm_day1|submit|restart
    pub value: Option<String>,
}

pub async fn flow_command_handler(
    Extension(flow): Extension<FlowState>,
    State(app): State<AppState>,
    Form(form): Form<FlowCommandForm>,
) -> Response {
    let Some(action) = FlowAction::from_form(&form.action, form.value) else {
        info!(action = %form.action, "unknown form action");
        return StatusCode::BAD_REQUEST.into_response();
    };

    let next = form_flow_service::apply(&app.flow_context(), flow, action).await;

    let mut response = Redirect::to("/").into_response();
    flow_session::set_flow_cookie(&mut response, &next);
    response
}
