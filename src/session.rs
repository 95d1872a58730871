//! Session tokens and the session cookie
//!
//! A session token is a compact HS256 JWT whose claims carry the caller's
//! open identifier:
//!
//! ```text
//! base64url({"alg":"HS256","typ":"JWT"}) . base64url({"openId":..,"iat":..,"exp":..}) . base64url(hmac)
//! ```
//!
//! Tokens live for seven days. Verification failures are reported as
//! [`SessionError`]; the server degrades them to an anonymous caller.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Seven days, in seconds.
pub const SESSION_TTL_SECS: i64 = 7 * 24 * 60 * 60;
pub const DEFAULT_COOKIE_NAME: &str = "app_session_id";
const MAX_TOKEN_LEN: usize = 4096;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("malformed session token")]
    Malformed,
    #[error("unsupported session token algorithm")]
    UnsupportedAlgorithm,
    #[error("session token signature mismatch")]
    BadSignature,
    #[error("session token expired")]
    Expired,
    #[error("session token has no open id")]
    MissingOpenId,
    #[error("invalid session secret")]
    InvalidSecret,
    #[error("failed to encode session token: {0}")]
    Encoding(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct TokenHeader {
    alg: String,
    #[serde(default)]
    typ: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionClaims {
    pub open_id: String,
    pub iat: i64,
    pub exp: i64,
}

fn mac_for(secret: &[u8]) -> Result<HmacSha256, SessionError> {
    HmacSha256::new_from_slice(secret).map_err(|_| SessionError::InvalidSecret)
}

fn encode_part<T: Serialize>(value: &T) -> Result<String, SessionError> {
    let bytes = serde_json::to_vec(value).map_err(|e| SessionError::Encoding(e.to_string()))?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

/// Sign a session token for `open_id`, issued at `now` (unix seconds).
pub fn issue_token_at(open_id: &str, secret: &[u8], now: i64) -> Result<String, SessionError> {
    let header = TokenHeader {
        alg: "HS256".to_string(),
        typ: Some("JWT".to_string()),
    };
    let claims = SessionClaims {
        open_id: open_id.to_string(),
        iat: now,
        exp: now + SESSION_TTL_SECS,
    };
    let signing_input = format!("{}.{}", encode_part(&header)?, encode_part(&claims)?);

    let mut mac = mac_for(secret)?;
    mac.update(signing_input.as_bytes());
    let sig_part = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());
    Ok(format!("{}.{}", signing_input, sig_part))
}

pub fn issue_token(open_id: &str, secret: &[u8]) -> Result<String, SessionError> {
    issue_token_at(open_id, secret, chrono::Utc::now().timestamp())
}

/// Verify a session token against `secret` as of `now` (unix seconds).
pub fn verify_token_at(token: &str, secret: &[u8], now: i64) -> Result<SessionClaims, SessionError> {
    if token.is_empty() || token.len() > MAX_TOKEN_LEN {
        return Err(SessionError::Malformed);
    }
    let mut parts = token.split('.');
    let (Some(header_part), Some(claims_part), Some(sig_part), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(SessionError::Malformed);
    };

    let header_bytes = URL_SAFE_NO_PAD
        .decode(header_part)
        .map_err(|_| SessionError::Malformed)?;
    let header: TokenHeader =
        serde_json::from_slice(&header_bytes).map_err(|_| SessionError::Malformed)?;
    if header.alg != "HS256" {
        return Err(SessionError::UnsupportedAlgorithm);
    }

    let expected = URL_SAFE_NO_PAD
        .decode(sig_part)
        .map_err(|_| SessionError::Malformed)?;
    let mut mac = mac_for(secret)?;
    mac.update(header_part.as_bytes());
    mac.update(b".");
    mac.update(claims_part.as_bytes());
    mac.verify_slice(&expected)
        .map_err(|_| SessionError::BadSignature)?;

    let claims_bytes = URL_SAFE_NO_PAD
        .decode(claims_part)
        .map_err(|_| SessionError::Malformed)?;
    let claims: SessionClaims =
        serde_json::from_slice(&claims_bytes).map_err(|_| SessionError::Malformed)?;
    if claims.exp <= now {
        return Err(SessionError::Expired);
    }
    if claims.open_id.is_empty() {
        return Err(SessionError::MissingOpenId);
    }
    Ok(claims)
}

pub fn verify_token(token: &str, secret: &[u8]) -> Result<SessionClaims, SessionError> {
    verify_token_at(token, secret, chrono::Utc::now().timestamp())
}

/// Find a cookie value in a `Cookie` request header.
pub fn read_cookie<'a>(cookie_header: &'a str, name: &str) -> Option<&'a str> {
    cookie_header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim_matches('"'))
        .filter(|value| !value.is_empty())
}

/// `Set-Cookie` value carrying a fresh session token.
pub fn session_cookie(name: &str, token: &str, secure: bool) -> String {
    cookie_with_max_age(name, token, SESSION_TTL_SECS, secure)
}

/// `Set-Cookie` value that clears the session cookie.
pub fn cleared_cookie(name: &str, secure: bool) -> String {
    cookie_with_max_age(name, "", 0, secure)
}

fn cookie_with_max_age(name: &str, value: &str, max_age: i64, secure: bool) -> String {
    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=None; Max-Age={}",
        name, value, max_age
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}
