//! RPC envelope, procedure registry and dispatch
//!
//! Success responses are `{"result":{"data":...}}`; failures are
//! `{"error":{"code","message","httpStatus","path"}}`. Dispatch order is
//! fixed: resolve the procedure, check the HTTP method against its kind,
//! check access, and only then parse and validate input.

use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Extension,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use crate::server::{procedures, AppState, Caller};
use crate::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcedureKind {
    Query,
    Mutation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    Protected,
}

#[derive(Debug, Clone, Copy)]
pub struct Procedure {
    pub name: &'static str,
    pub kind: ProcedureKind,
    pub access: Access,
}

const fn procedure(name: &'static str, kind: ProcedureKind, access: Access) -> Procedure {
    Procedure { name, kind, access }
}

pub const PROCEDURES: &[Procedure] = &[
    procedure("auth.me", ProcedureKind::Query, Access::Public),
    procedure("auth.logout", ProcedureKind::Mutation, Access::Public),
    procedure("wedding.getOrCreate", ProcedureKind::Query, Access::Protected),
    procedure("wedding.update", ProcedureKind::Mutation, Access::Protected),
    procedure("marketplace.searchVendors", ProcedureKind::Query, Access::Public),
    procedure("marketplace.getVendor", ProcedureKind::Query, Access::Public),
    procedure("marketplace.getVendorReviews", ProcedureKind::Query, Access::Public),
    procedure("marketplace.submitReview", ProcedureKind::Mutation, Access::Protected),
    procedure("marketplace.saveVendor", ProcedureKind::Mutation, Access::Protected),
    procedure("marketplace.unsaveVendor", ProcedureKind::Mutation, Access::Protected),
    procedure("marketplace.getSavedVendors", ProcedureKind::Query, Access::Protected),
    procedure("inquiries.create", ProcedureKind::Mutation, Access::Protected),
    procedure("inquiries.getMyInquiries", ProcedureKind::Query, Access::Protected),
    procedure("inquiries.updateStatus", ProcedureKind::Mutation, Access::Protected),
];

pub fn find_procedure(name: &str) -> Option<&'static Procedure> {
    PROCEDURES.iter().find(|p| p.name == name)
}

/// A procedure's successful result, plus a cookie to set if any
#[derive(Debug)]
pub struct Reply {
    pub data: Value,
    pub set_cookie: Option<String>,
}

impl Reply {
    pub fn data<T: Serialize>(value: &T) -> crate::Result<Self> {
        Ok(Self {
            data: serde_json::to_value(value)?,
            set_cookie: None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RpcCode {
    BadRequest,
    Unauthorized,
    NotFound,
    MethodNotSupported,
    InternalServerError,
}

impl RpcCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RpcCode::BadRequest => "BAD_REQUEST",
            RpcCode::Unauthorized => "UNAUTHORIZED",
            RpcCode::NotFound => "NOT_FOUND",
            RpcCode::MethodNotSupported => "METHOD_NOT_SUPPORTED",
            RpcCode::InternalServerError => "INTERNAL_SERVER_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            RpcCode::BadRequest => StatusCode::BAD_REQUEST,
            RpcCode::Unauthorized => StatusCode::UNAUTHORIZED,
            RpcCode::NotFound => StatusCode::NOT_FOUND,
            RpcCode::MethodNotSupported => StatusCode::METHOD_NOT_ALLOWED,
            RpcCode::InternalServerError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RpcError {
    pub code: RpcCode,
    pub message: String,
}

impl RpcError {
    pub fn new(code: RpcCode, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }
}

impl From<Error> for RpcError {
    fn from(err: Error) -> Self {
        let code = match &err {
            Error::Validation(_) => RpcCode::BadRequest,
            Error::Unauthorized => RpcCode::Unauthorized,
            Error::NotFound(_) => RpcCode::NotFound,
            Error::Storage(_)
            | Error::StorageUnavailable
            | Error::Io(_)
            | Error::Json(_) => {
                tracing::error!("Procedure failed: {}", err);
                RpcCode::InternalServerError
            }
        };
        Self::new(code, err.to_string())
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody<'a> {
    code: &'static str,
    message: &'a str,
    http_status: u16,
    path: &'a str,
}

fn error_response(path: &str, err: &RpcError) -> Response {
    let status = err.code.status();
    let body = serde_json::json!({
        "error": ErrorBody {
            code: err.code.as_str(),
            message: &err.message,
            http_status: status.as_u16(),
            path,
        }
    });
    (status, Json(body)).into_response()
}

fn success_response(reply: Reply) -> Response {
    let body = Json(serde_json::json!({ "result": { "data": reply.data } }));
    match reply.set_cookie {
        Some(cookie) => (StatusCode::OK, [(header::SET_COOKIE, cookie)], body).into_response(),
        None => (StatusCode::OK, body).into_response(),
    }
}

/// Parse raw input text. Absent or blank input means "no input" (`null`).
fn parse_input(raw: Option<&str>) -> Result<Value, RpcError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(Value::Null),
        Some(text) => serde_json::from_str(text)
            .map_err(|e| RpcError::new(RpcCode::BadRequest, format!("Input is not valid JSON: {}", e))),
    }
}

pub async fn dispatch(
    state: &AppState,
    caller: &Caller,
    name: &str,
    kind: ProcedureKind,
    raw_input: Option<&str>,
) -> Result<Reply, RpcError> {
    let Some(procedure) = find_procedure(name) else {
        return Err(RpcError::new(
            RpcCode::NotFound,
            format!("No procedure found on path \"{}\"", name),
        ));
    };
    if procedure.kind != kind {
        let expected = match procedure.kind {
            ProcedureKind::Query => "GET",
            ProcedureKind::Mutation => "POST",
        };
        return Err(RpcError::new(
            RpcCode::MethodNotSupported,
            format!("{} must be called with {}", name, expected),
        ));
    }
    if procedure.access == Access::Protected && !caller.is_authenticated() {
        return Err(Error::Unauthorized.into());
    }

    let input = parse_input(raw_input)?;
    tracing::debug!("Dispatching {}", name);
    procedures::invoke(state, caller, procedure.name, input)
        .await
        .map_err(RpcError::from)
}

#[derive(Debug, Deserialize)]
pub struct RpcQuery {
    pub input: Option<String>,
}

pub async fn handle_query(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    Path(name): Path<String>,
    params: Result<Query<RpcQuery>, QueryRejection>,
) -> Response {
    let params = match params {
        Ok(Query(params)) => params,
        Err(rejection) => {
            let err = RpcError::new(RpcCode::BadRequest, rejection.body_text());
            return error_response(&name, &err);
        }
    };
    match dispatch(&state, &caller, &name, ProcedureKind::Query, params.input.as_deref()).await {
        Ok(reply) => success_response(reply),
        Err(err) => error_response(&name, &err),
    }
}

pub async fn handle_mutation(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    Path(name): Path<String>,
    body: Bytes,
) -> Response {
    let raw = match std::str::from_utf8(&body) {
        Ok(text) => text,
        Err(_) => {
            let err = RpcError::new(RpcCode::BadRequest, "Input is not valid UTF-8");
            return error_response(&name, &err);
        }
    };
    match dispatch(&state, &caller, &name, ProcedureKind::Mutation, Some(raw)).await {
        Ok(reply) => success_response(reply),
        Err(err) => error_response(&name, &err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_is_complete() {
        assert_eq!(PROCEDURES.len(), 14);
        let protected = PROCEDURES.iter().filter(|p| p.access == Access::Protected).count();
        assert_eq!(protected, 9);
        assert!(find_procedure("marketplace.searchVendors").is_some());
        assert!(find_procedure("system.health").is_none());
    }

    #[test]
    fn test_error_mapping() {
        assert_eq!(RpcError::from(Error::Validation("x".into())).code, RpcCode::BadRequest);
        assert_eq!(RpcError::from(Error::Unauthorized).code, RpcCode::Unauthorized);
        assert_eq!(RpcError::from(Error::NotFound("vendor 1".into())).code, RpcCode::NotFound);
        assert_eq!(RpcError::from(Error::StorageUnavailable).code, RpcCode::InternalServerError);
        let json_err = serde_json::from_str::<Value>("{").unwrap_err();
        assert_eq!(RpcError::from(Error::from(json_err)).code, RpcCode::InternalServerError);
        assert_eq!(RpcCode::MethodNotSupported.status().as_u16(), 405);
    }

    #[test]
    fn test_parse_input() {
        assert_eq!(parse_input(None).unwrap(), Value::Null);
        assert_eq!(parse_input(Some("  ")).unwrap(), Value::Null);
        assert_eq!(parse_input(Some("42")).unwrap(), serde_json::json!(42));
        assert_eq!(parse_input(Some("{oops")).unwrap_err().code, RpcCode::BadRequest);
    }
}
