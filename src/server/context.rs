//! Per-request caller resolution
//!
//! Runs before every route and attaches a [`Caller`] to the request. Any
//! failure along the way (no cookie, bad or expired token, unknown user,
//! no storage) leaves the caller anonymous instead of failing the request.

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use crate::server::AppState;
use crate::session;
use crate::user::User;

#[derive(Debug, Clone, Default)]
pub struct Caller {
    pub user: Option<User>,
    /// The request reached us over HTTPS (directly or via a proxy)
    pub secure: bool,
}

impl Caller {
    pub fn anonymous(secure: bool) -> Self {
        Self { user: None, secure }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    pub fn require_user(&self) -> crate::Result<&User> {
        self.user.as_ref().ok_or(crate::Error::Unauthorized)
    }
}

pub async fn resolve_caller(
    State(state): State<Arc<AppState>>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let caller = authenticate(&state, req.headers()).await;
    req.extensions_mut().insert(caller);
    next.run(req).await
}

pub async fn authenticate(state: &AppState, headers: &HeaderMap) -> Caller {
    let secure = is_secure(headers);

    let Some(token) = session_token(headers, &state.cookie_name) else {
        return Caller::anonymous(secure);
    };

    let claims = match session::verify_token(&token, state.session_secret.as_bytes()) {
        Ok(claims) => claims,
        Err(e) => {
            tracing::warn!("Ignoring session cookie: {}", e);
            return Caller::anonymous(secure);
        }
    };

    let store = match state.store().await {
        Ok(store) => store,
        Err(e) => {
            tracing::warn!("Cannot resolve session user: {}", e);
            return Caller::anonymous(secure);
        }
    };

    match store.get_user_by_open_id(&claims.open_id) {
        Ok(Some(user)) => Caller { user: Some(user), secure },
        Ok(None) => {
            tracing::warn!("Session names unknown user {}", claims.open_id);
            Caller::anonymous(secure)
        }
        Err(e) => {
            tracing::warn!("User lookup failed: {}", e);
            Caller::anonymous(secure)
        }
    }
}

fn session_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find_map(|cookies| session::read_cookie(cookies, cookie_name))
        .map(str::to_string)
}

fn is_secure(headers: &HeaderMap) -> bool {
    headers
        .get("x-forwarded-proto")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .is_some_and(|proto| proto.trim().eq_ignore_ascii_case("https"))
}
