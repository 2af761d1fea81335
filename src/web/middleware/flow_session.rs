use axum::{
    extract::Request,
    http::{header, HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use base64::{engine::general_purpose, Engine as _};
use cookie::{Cookie, SameSite};
use tracing::{debug, warn};

use crate::services::form_flow_service::FlowState;

pub const FLOW_COOKIE: &str = "flow_state";

/// Puts the caller's [`FlowState`] into the request extensions.
///
/// A missing or unreadable cookie yields a fresh flow.
pub async fn load_flow_state(mut request: Request, next: Next) -> Response {
    let state = read_flow_state(request.headers());
    request.extensions_mut().insert(state);
    next.run(request).await
}

pub fn read_flow_state(headers: &HeaderMap) -> FlowState {
    let raw = headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|hv| hv.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .map(str::trim)
        .find_map(|c| c.strip_prefix("flow_state="));

    let Some(raw) = raw else {
        return FlowState::default();
    };

    match decode(raw) {
        Some(state) => state,
        None => {
            debug!("discarding unreadable flow_state cookie");
            FlowState::default()
        }
    }
}

fn decode(raw: &str) -> Option<FlowState> {
    let bytes = general_purpose::URL_SAFE_NO_PAD.decode(raw).ok()?;
    serde_json::from_slice::<FlowState>(&bytes).ok()
}

pub fn encode(state: &FlowState) -> Result<String, serde_json::Error> {
    let json = serde_json::to_vec(state)?;
    Ok(general_purpose::URL_SAFE_NO_PAD.encode(json))
}

pub fn set_flow_cookie(response: &mut Response, state: &FlowState) {
    let value = match encode(state) {
        Ok(v) => v,
        Err(e) => {
            warn!("flow state serialization failed: {}", e);
            return;
        }
    };

    let mut cookie = Cookie::new(FLOW_COOKIE, value);
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);

    match HeaderValue::from_str(&cookie.to_string()) {
        Ok(hv) => {
            response.headers_mut().append(header::SET_COOKIE, hv);
        }
        Err(e) => warn!("invalid flow_state cookie header: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::form_flow_service::{InstitutionChoice, Notice, Step};

    fn headers_with(cookie: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_str(cookie).unwrap());
        headers
    }

    #[test]
    fn state_survives_the_cookie() {
        let state = FlowState {
            step: Step::SelectDay2Workshop,
            institution: Some(InstitutionChoice {
                code: 10,
                name: "UFMG".to_string(),
            }),
            participant: Some("Ana".to_string()),
            workshop_day1: Some("RELATÓRIOS".to_string()),
            registration: None,
            notice: Some(Notice::error("Sem vagas")),
        };
        let cookie = format!("other=1; flow_state={}", encode(&state).unwrap());
        assert_eq!(read_flow_state(&headers_with(&cookie)), state);
    }

    #[test]
    fn garbage_cookie_starts_a_fresh_flow() {
        assert_eq!(
            read_flow_state(&headers_with("flow_state=%%%not-base64")),
            FlowState::default()
        );
        assert_eq!(read_flow_state(&HeaderMap::new()), FlowState::default());
    }
}
