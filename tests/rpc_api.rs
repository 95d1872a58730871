use std::net::SocketAddr;
use std::sync::Arc;

use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use vowmarket::config::MarketConfig;
use vowmarket::server::{build_router, AppState};
use vowmarket::storage::SqliteStore;
use vowmarket::{session, NewVendor, UpsertUser, VendorCategory};

const SECRET: &str = "integration-secret";

struct Fixture {
    addr: SocketAddr,
    cookie: String,
    vendor_ids: Vec<i64>,
}

async fn spawn_server(store: Option<SqliteStore>) -> SocketAddr {
    let settings = MarketConfig {
        session_secret: Some(SECRET.to_string()),
        ..Default::default()
    }
    .resolve();
    let state = Arc::new(AppState::new(store, &settings));
    let app = build_router(state, None);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });
    addr
}

async fn fixture() -> Fixture {
    let store = SqliteStore::open_in_memory().expect("store");
    store
        .upsert_user(&UpsertUser::new("couple-1"), None)
        .expect("user");

    let mut vendor_ids = Vec::new();
    for (name, category, location) in [
        ("Golden Hour Studio", VendorCategory::Photographer, "Austin, TX"),
        ("Lens & Light", VendorCategory::Photographer, "Dallas, TX"),
        ("Hill Country Feast", VendorCategory::Catering, "Austin, TX"),
    ] {
        let vendor = store
            .insert_vendor(&NewVendor {
                location: Some(location.to_string()),
                ..NewVendor::new(name, category)
            })
            .expect("vendor");
        vendor_ids.push(vendor.id);
    }

    let token = session::issue_token("couple-1", SECRET.as_bytes()).expect("token");
    Fixture {
        addr: spawn_server(Some(store)).await,
        cookie: format!("{}={}", session::DEFAULT_COOKIE_NAME, token),
        vendor_ids,
    }
}

fn encode_component(raw: &str) -> String {
    raw.bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                (b as char).to_string()
            }
            _ => format!("%{:02X}", b),
        })
        .collect()
}

async fn send_raw(
    addr: SocketAddr,
    method: &str,
    path: &str,
    headers: &[(&str, &str)],
    body: Option<&str>,
) -> (u16, String, String) {
    let mut stream = tokio::net::TcpStream::connect(addr)
        .await
        .expect("connect server");
    let mut req = format!("{method} {path} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n");
    for (k, v) in headers {
        req.push_str(&format!("{k}: {v}\r\n"));
    }
    let body = body.unwrap_or("");
    if method == "POST" {
        req.push_str("Content-Type: application/json\r\n");
        req.push_str(&format!("Content-Length: {}\r\n", body.len()));
    }
    req.push_str("\r\n");
    req.push_str(body);
    stream
        .write_all(req.as_bytes())
        .await
        .expect("write request");
    let mut response = String::new();
    stream
        .read_to_string(&mut response)
        .await
        .expect("read response");
    let (head, body) = response
        .split_once("\r\n\r\n")
        .expect("http response must have separator");
    let status = head
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|s| s.parse::<u16>().ok())
        .expect("http status");
    (status, head.to_string(), body.to_string())
}

async fn query(addr: SocketAddr, procedure: &str, input: Option<Value>, cookie: Option<&str>) -> (u16, Value) {
    let path = match input {
        Some(input) => format!(
            "/api/rpc/{}?input={}",
            procedure,
            encode_component(&input.to_string())
        ),
        None => format!("/api/rpc/{}", procedure),
    };
    let headers: Vec<(&str, &str)> = cookie.map(|c| ("Cookie", c)).into_iter().collect();
    let (status, _, body) = send_raw(addr, "GET", &path, &headers, None).await;
    (status, serde_json::from_str(&body).expect("json body"))
}

async fn mutate(addr: SocketAddr, procedure: &str, input: Value, cookie: Option<&str>) -> (u16, Value) {
    let path = format!("/api/rpc/{}", procedure);
    let headers: Vec<(&str, &str)> = cookie.map(|c| ("Cookie", c)).into_iter().collect();
    let body = input.to_string();
    let (status, _, body) = send_raw(addr, "POST", &path, &headers, Some(&body)).await;
    (status, serde_json::from_str(&body).expect("json body"))
}

#[tokio::test]
async fn health_reports_ok() {
    let addr = spawn_server(None).await;
    let (status, _, body) = send_raw(addr, "GET", "/health", &[], None).await;
    assert_eq!(status, 200);
    assert_eq!(serde_json::from_str::<Value>(&body).unwrap(), json!({"status": "ok"}));
}

#[tokio::test]
async fn protected_procedures_reject_anonymous_callers_uniformly() {
    let fx = fixture().await;
    let bad_cookie = format!("{}=garbage.token.value", session::DEFAULT_COOKIE_NAME);

    let queries = [
        "wedding.getOrCreate",
        "marketplace.getSavedVendors",
        "inquiries.getMyInquiries",
    ];
    let mutations = [
        "wedding.update",
        "marketplace.submitReview",
        "marketplace.saveVendor",
        "marketplace.unsaveVendor",
        "inquiries.create",
        "inquiries.updateStatus",
    ];

    for cookie in [None, Some(bad_cookie.as_str())] {
        for name in queries {
            let (status, body) = query(fx.addr, name, None, cookie).await;
            assert_eq!(status, 401, "{name}");
            assert_eq!(body["error"]["code"], "UNAUTHORIZED", "{name}");
            assert_eq!(body["error"]["path"], name);
        }
        // Invalid input must not leak a validation error before auth
        for name in mutations {
            let (status, body) = mutate(fx.addr, name, json!("not-an-object"), cookie).await;
            assert_eq!(status, 401, "{name}");
            assert_eq!(body["error"]["code"], "UNAUTHORIZED", "{name}");
        }
    }
}

#[tokio::test]
async fn auth_me_reflects_session() {
    let fx = fixture().await;

    let (status, body) = query(fx.addr, "auth.me", None, None).await;
    assert_eq!(status, 200);
    assert_eq!(body["result"]["data"], Value::Null);

    let (_, body) = query(fx.addr, "auth.me", None, Some(fx.cookie.as_str())).await;
    assert_eq!(body["result"]["data"]["openId"], "couple-1");
}

#[tokio::test]
async fn logout_clears_cookie() {
    let fx = fixture().await;
    let (status, head, body) = send_raw(
        fx.addr,
        "POST",
        "/api/rpc/auth.logout",
        &[("Cookie", fx.cookie.as_str()), ("X-Forwarded-Proto", "https")],
        Some(""),
    )
    .await;
    assert_eq!(status, 200);
    let head = head.to_ascii_lowercase();
    assert!(head.contains("set-cookie: app_session_id=;"));
    assert!(head.contains("max-age=0"));
    assert!(head.contains("secure"));
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["result"]["data"]["success"], true);
}

#[tokio::test]
async fn search_filters_and_orders_by_rating() {
    let fx = fixture().await;
    let cookie = Some(fx.cookie.as_str());

    mutate(fx.addr, "marketplace.submitReview", json!({"vendorId": fx.vendor_ids[1], "rating": 5}), cookie).await;
    mutate(fx.addr, "marketplace.submitReview", json!({"vendorId": fx.vendor_ids[0], "rating": 2}), cookie).await;

    let (status, body) = query(fx.addr, "marketplace.searchVendors", Some(json!({})), None).await;
    assert_eq!(status, 200);
    let ids: Vec<i64> = body["result"]["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![fx.vendor_ids[1], fx.vendor_ids[0], fx.vendor_ids[2]]);

    let (_, body) = query(
        fx.addr,
        "marketplace.searchVendors",
        Some(json!({"category": "photographer", "location": "Austin"})),
        None,
    )
    .await;
    let data = body["result"]["data"].as_array().unwrap();
    assert_eq!(data.len(), 1);
    assert_eq!(data[0]["name"], "Golden Hour Studio");

    let (_, body) = query(fx.addr, "marketplace.searchVendors", Some(json!({"keyword": "nothing"})), None).await;
    assert_eq!(body["result"]["data"], json!([]));
}

#[tokio::test]
async fn review_flow_recomputes_rating() {
    let fx = fixture().await;
    let cookie = Some(fx.cookie.as_str());
    let vendor_id = fx.vendor_ids[2];

    for rating in [5, 3, 4] {
        let (status, body) = mutate(
            fx.addr,
            "marketplace.submitReview",
            json!({"vendorId": vendor_id, "rating": rating, "title": "Great"}),
            cookie,
        )
        .await;
        assert_eq!(status, 200);
        assert_eq!(body["result"]["data"]["rating"], rating);
    }

    let (_, body) = query(fx.addr, "marketplace.getVendor", Some(json!(vendor_id)), None).await;
    assert_eq!(body["result"]["data"]["rating"], json!(4.0));
    assert_eq!(body["result"]["data"]["reviewCount"], 3);

    let (_, body) = query(fx.addr, "marketplace.getVendorReviews", Some(json!(vendor_id)), None).await;
    assert_eq!(body["result"]["data"].as_array().unwrap().len(), 3);

    let (status, body) = mutate(
        fx.addr,
        "marketplace.submitReview",
        json!({"vendorId": vendor_id, "rating": 6}),
        cookie,
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");

    let (status, body) = mutate(
        fx.addr,
        "marketplace.submitReview",
        json!({"vendorId": 9999, "rating": 4}),
        cookie,
    )
    .await;
    assert_eq!(status, 404);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn unknown_vendor_reads_return_null() {
    let fx = fixture().await;
    let (status, body) = query(fx.addr, "marketplace.getVendor", Some(json!(424242)), None).await;
    assert_eq!(status, 200);
    assert_eq!(body["result"]["data"], Value::Null);
}

#[tokio::test]
async fn saved_vendor_toggle() {
    let fx = fixture().await;
    let cookie = Some(fx.cookie.as_str());
    let vendor_id = fx.vendor_ids[0];

    let (_, first) = mutate(fx.addr, "marketplace.saveVendor", json!(vendor_id), cookie).await;
    let (_, second) = mutate(fx.addr, "marketplace.saveVendor", json!(vendor_id), cookie).await;
    assert_eq!(first["result"]["data"]["id"], second["result"]["data"]["id"]);

    let (_, body) = query(fx.addr, "marketplace.getSavedVendors", None, cookie).await;
    assert_eq!(body["result"]["data"].as_array().unwrap().len(), 1);

    let (status, body) = mutate(fx.addr, "marketplace.unsaveVendor", json!(fx.vendor_ids[1]), cookie).await;
    assert_eq!(status, 200);
    assert_eq!(body["result"]["data"], true);

    mutate(fx.addr, "marketplace.unsaveVendor", json!(vendor_id), cookie).await;
    let (_, body) = query(fx.addr, "marketplace.getSavedVendors", None, cookie).await;
    assert_eq!(body["result"]["data"], json!([]));
}

#[tokio::test]
async fn inquiry_lifecycle() {
    let fx = fixture().await;
    let cookie = Some(fx.cookie.as_str());

    let (_, wedding) = query(fx.addr, "wedding.getOrCreate", None, cookie).await;
    let wedding_id = wedding["result"]["data"]["id"].as_i64().unwrap();

    let (status, body) = mutate(
        fx.addr,
        "inquiries.create",
        json!({"vendorId": fx.vendor_ids[0], "weddingId": wedding_id, "message": "Free on June 6?", "status": "booked"}),
        cookie,
    )
    .await;
    assert_eq!(status, 200);
    let inquiry = &body["result"]["data"];
    assert_eq!(inquiry["status"], "pending");
    let inquiry_id = inquiry["id"].as_i64().unwrap();

    let (_, body) = mutate(
        fx.addr,
        "inquiries.updateStatus",
        json!({"id": inquiry_id, "status": "booked", "vendorResponse": "See you there"}),
        cookie,
    )
    .await;
    assert_eq!(body["result"]["data"]["status"], "booked");

    let (status, body) = mutate(
        fx.addr,
        "inquiries.updateStatus",
        json!({"id": inquiry_id, "status": "pending"}),
        cookie,
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["result"]["data"]["status"], "pending");
    assert_eq!(body["result"]["data"]["vendorResponse"], "See you there");

    let (_, body) = query(fx.addr, "inquiries.getMyInquiries", None, cookie).await;
    assert_eq!(body["result"]["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn wedding_profile_update() {
    let fx = fixture().await;
    let cookie = Some(fx.cookie.as_str());

    let (_, first) = query(fx.addr, "wedding.getOrCreate", None, cookie).await;
    let (_, second) = query(fx.addr, "wedding.getOrCreate", None, cookie).await;
    let id = first["result"]["data"]["id"].clone();
    assert_eq!(id, second["result"]["data"]["id"]);

    let (status, body) = mutate(
        fx.addr,
        "wedding.update",
        json!({"id": id, "partnerName": "Sam", "budget": "25000.50", "guestCount": 120}),
        cookie,
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["result"]["data"]["partnerName"], "Sam");
    assert_eq!(body["result"]["data"]["budget"], json!(25000.5));

    let (status, _) = mutate(fx.addr, "wedding.update", json!({"id": id, "budget": "a lot"}), cookie).await;
    assert_eq!(status, 400);
}

#[tokio::test]
async fn routing_errors() {
    let fx = fixture().await;

    let (status, body) = query(fx.addr, "marketplace.nope", None, None).await;
    assert_eq!(status, 404);
    assert_eq!(body["error"]["code"], "NOT_FOUND");

    let (status, body) = mutate(fx.addr, "marketplace.searchVendors", json!({}), None).await;
    assert_eq!(status, 405);
    assert_eq!(body["error"]["code"], "METHOD_NOT_SUPPORTED");

    let (status, body) = query(fx.addr, "marketplace.searchVendors", Some(json!({"limit": -1})), None).await;
    assert_eq!(status, 400);
    assert_eq!(body["error"]["httpStatus"], 400);

    let (status, _, _) = send_raw(fx.addr, "GET", "/api/rpc/marketplace.getVendor?input=%7Bbroken", &[], None).await;
    assert_eq!(status, 400);
}

#[tokio::test]
async fn malformed_query_string_uses_error_envelope() {
    let fx = fixture().await;

    let (status, head, body) = send_raw(
        fx.addr,
        "GET",
        "/api/rpc/marketplace.getVendor?input=1&input=2",
        &[],
        None,
    )
    .await;
    assert_eq!(status, 400);
    assert!(head.to_ascii_lowercase().contains("content-type: application/json"));
    let body: Value = serde_json::from_str(&body).expect("json body");
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
    assert_eq!(body["error"]["httpStatus"], 400);
    assert_eq!(body["error"]["path"], "marketplace.getVendor");
}

#[tokio::test]
async fn search_limit_is_unbounded_and_zero_means_all() {
    let fx = fixture().await;

    let (status, body) = query(fx.addr, "marketplace.searchVendors", Some(json!({"limit": 150})), None).await;
    assert_eq!(status, 200);
    assert_eq!(body["result"]["data"].as_array().map(Vec::len), Some(3));

    let (status, body) = query(fx.addr, "marketplace.searchVendors", Some(json!({"limit": 0})), None).await;
    assert_eq!(status, 200);
    assert_eq!(body["result"]["data"].as_array().map(Vec::len), Some(3));

    let (status, body) = query(
        fx.addr,
        "marketplace.searchVendors",
        Some(json!({"limit": 0, "offset": 1})),
        None,
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["result"]["data"].as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn storage_unavailable_is_internal_error() {
    let addr = spawn_server(None).await;

    let (status, body) = query(addr, "marketplace.searchVendors", None, None).await;
    assert_eq!(status, 500);
    assert_eq!(body["error"]["code"], "INTERNAL_SERVER_ERROR");

    let (status, body) = query(addr, "auth.me", None, None).await;
    assert_eq!(status, 200);
    assert_eq!(body["result"]["data"], Value::Null);
}
