// End-to-end tests: the full router against a mocked platform backend.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use http_body_util::BodyExt;
use secrecy::Secret;
use serde_json::json;
use tower::util::ServiceExt;
use wiremock::matchers::{body_json, body_partial_json, header as header_is, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use iot_gui::startup::build_router;
use iot_gui::utils::crypto::RefererSigner;
use iot_gui::AppState;
use iot_sdk::{Sdk, SdkConfig};

const REFERER_KEY: &str = "router-test-key";
const BOUNDARY: &str = "XBOUNDARYX";

// Helpers

fn signer() -> RefererSigner {
    RefererSigner::new(Secret::new(REFERER_KEY.to_string())).unwrap()
}

async fn setup() -> (MockServer, Router) {
    let server = MockServer::start().await;
    let sdk = Arc::new(Sdk::new(SdkConfig::with_base_url(&server.uri())).unwrap());
    let state = AppState::new(sdk, signer(), "test-instance".to_string(), false);
    (server, build_router(state, "static"))
}

fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

fn post_form(uri: &str, cookie: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn post_file(uri: &str, fields: &[(&str, &str)], file: (&str, &str, &str)) -> Request<Body> {
    let (field, file_name, content) = file;
    let mut body = String::new();
    for (name, value) in fields {
        body.push_str(&format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
        ));
    }
    body.push_str(&format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\nContent-Type: text/csv\r\n\r\n{content}\r\n--{BOUNDARY}--\r\n"
    ));

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .header(header::COOKIE, "token=tok")
        .body(Body::from(body))
        .unwrap()
}

fn location(response: &Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

fn set_cookies(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok().map(str::to_string))
        .collect()
}

async fn body_text(response: Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

// Session

#[tokio::test]
async fn login_sets_cookies_and_redirects_home() {
    let (server, app) = setup().await;

    Mock::given(method("POST"))
        .and(path("/users/tokens/issue"))
        .and(body_json(json!({"identity": "admin@example.com", "secret": "12345678"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "access_token": "at",
            "refresh_token": "rt",
            "access_type": "Bearer"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let response = app
        .oneshot(post_form(
            "/login",
            None,
            "username=admin%40example.com&password=12345678",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), "/");
    let cookies = set_cookies(&response);
    assert!(cookies.iter().any(|c| c.starts_with("token=at")));
    assert!(cookies.iter().any(|c| c.starts_with("refresh_token=rt")));
    assert!(cookies.iter().all(|c| c.contains("HttpOnly")));
}

#[tokio::test]
async fn rejected_login_goes_back_to_login() {
    let (server, app) = setup().await;

    Mock::given(method("POST"))
        .and(path("/users/tokens/issue"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let response = app
        .oneshot(post_form("/login", None, "username=a&password=wrong"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), "/login");
    assert!(set_cookies(&response).is_empty());
}

#[tokio::test]
async fn pages_without_token_cookie_redirect_to_login() {
    let (_server, app) = setup().await;

    for uri in ["/things", "/users", "/channels/c1/things", "/"] {
        let response = app.clone().oneshot(get(uri, None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::FOUND, "{uri}");
        assert_eq!(location(&response), "/login", "{uri}");
    }
}

#[tokio::test]
async fn logout_expires_both_cookies() {
    let (_server, app) = setup().await;

    let response = app.oneshot(get("/logout", Some("token=t"))).await.unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), "/login");
    let cookies = set_cookies(&response);
    assert_eq!(cookies.len(), 2);
    assert!(cookies.iter().all(|c| c.contains("Max-Age=0")));
}

// Refresh redirect

#[tokio::test]
async fn expired_token_redirects_to_signed_refresh() {
    let (server, app) = setup().await;

    Mock::given(method("GET"))
        .and(path("/things"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let response = app
        .oneshot(get("/things?offset=10", Some("token=old")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let expected = signer().refresh_location("/things?offset=10").unwrap();
    assert_eq!(location(&response), expected);
    assert!(expected.starts_with("/refresh_token?ref=%2Fthings%3Foffset%3D10&sig="));
}

#[tokio::test]
async fn refresh_returns_to_signed_target() {
    let (server, app) = setup().await;

    Mock::given(method("POST"))
        .and(path("/users/tokens/refresh"))
        .and(header_is("authorization", "Bearer rt"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "access_token": "at2",
            "refresh_token": "rt2"
        })))
        .expect(2)
        .mount(&server)
        .await;

    let signed = signer().refresh_location("/channels").unwrap();
    let response = app
        .clone()
        .oneshot(get(&signed, Some("refresh_token=rt")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), "/channels");
    assert!(set_cookies(&response)
        .iter()
        .any(|c| c.starts_with("token=at2")));

    let tampered = "/refresh_token?ref=%2Fusers&sig=00";
    let response = app
        .oneshot(get(tampered, Some("refresh_token=rt")))
        .await
        .unwrap();
    assert_eq!(location(&response), "/");
}

#[tokio::test]
async fn refresh_without_cookie_goes_to_login() {
    let (_server, app) = setup().await;

    let response = app.oneshot(get("/refresh_token", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), "/login");
}

// Bulk imports

#[tokio::test]
async fn users_import_stops_at_first_malformed_row() {
    let (server, app) = setup().await;

    Mock::given(method("POST"))
        .and(path("/users"))
        .and(body_json(json!({
            "name": "alice",
            "credentials": {"identity": "alice@example.com", "secret": "pw1"}
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": "u1"})))
        .expect(1)
        .mount(&server)
        .await;

    let csv = "alice,alice@example.com,pw1\nbob,bob@example.com\ncarol,carol@example.com,pw3\n";
    let response = app
        .oneshot(post_file("/users/bulk", &[], ("usersFile", "users.csv", csv)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_text(response).await.contains("1 rows created"));
}

#[tokio::test]
async fn users_import_creates_rows_in_file_order() {
    let (server, app) = setup().await;

    for name in ["alice", "bob"] {
        Mock::given(method("POST"))
            .and(path("/users"))
            .and(body_json(json!({
                "name": name,
                "credentials": {"identity": format!("{name}@example.com"), "secret": "pw"}
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": name})))
            .expect(1)
            .mount(&server)
            .await;
    }

    let csv = "alice,alice@example.com,pw\nbob,bob@example.com,pw\n";
    let response = app
        .oneshot(post_file("/users/bulk", &[], ("usersFile", "users.csv", csv)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/users");

    let received = server.received_requests().await.unwrap();
    let names: Vec<String> = received
        .iter()
        .map(|r| serde_json::from_slice::<serde_json::Value>(&r.body).unwrap()["name"].to_string())
        .collect();
    assert_eq!(names, vec!["\"alice\"", "\"bob\""]);
}

#[tokio::test]
async fn users_import_stops_at_first_backend_failure() {
    let (server, app) = setup().await;

    let replies = [
        ("alice", ResponseTemplate::new(201).set_body_json(json!({"id": "u1"})), 1u64),
        ("bob", ResponseTemplate::new(409).set_body_string("<script>alert(1)</script>"), 1u64),
        ("carol", ResponseTemplate::new(201).set_body_json(json!({"id": "u3"})), 0u64),
    ];
    for (name, reply, calls) in replies {
        Mock::given(method("POST"))
            .and(path("/users"))
            .and(body_partial_json(json!({"name": name})))
            .respond_with(reply)
            .expect(calls)
            .mount(&server)
            .await;
    }

    let csv = "alice,alice@example.com,pw
bob,bob@example.com,pw
carol,carol@example.com,pw
";
    let response = app
        .oneshot(post_file("/users/bulk", &[], ("usersFile", "users.csv", csv)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = body_text(response).await;
    assert!(body.contains("1 rows created"));
    assert!(body.contains("&lt;script&gt;"));
    assert!(!body.contains("<script>"));
}

#[tokio::test]
async fn groups_import_with_expired_token_redirects_to_refresh() {
    let (server, app) = setup().await;

    let replies = [
        ("ops", ResponseTemplate::new(201).set_body_json(json!({"id": "g1"})), 1u64),
        ("lab", ResponseTemplate::new(401), 1u64),
        ("field", ResponseTemplate::new(201).set_body_json(json!({"id": "g3"})), 0u64),
    ];
    for (name, reply, calls) in replies {
        Mock::given(method("POST"))
            .and(path("/groups"))
            .and(body_partial_json(json!({"name": name})))
            .respond_with(reply)
            .expect(calls)
            .mount(&server)
            .await;
    }

    let response = app
        .oneshot(post_file(
            "/groups/bulk",
            &[],
            ("groupsFile", "groups.csv", "ops\nlab\nfield\n"),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        location(&response),
        signer().refresh_location("/groups/bulk").unwrap()
    );
}

#[tokio::test]
async fn non_csv_upload_is_rejected_without_backend_calls() {
    let (server, app) = setup().await;

    Mock::given(method("POST"))
        .and(path("/things/bulk"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"things": []})))
        .expect(0)
        .mount(&server)
        .await;

    let response = app
        .oneshot(post_file("/things/bulk", &[], ("thingsFile", "things.txt", "t1\n")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn things_import_is_one_bulk_call() {
    let (server, app) = setup().await;

    Mock::given(method("POST"))
        .and(path("/things/bulk"))
        .and(body_json(json!([
            {"name": "a", "credentials": {}},
            {"name": "b", "credentials": {}}
        ])))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"things": [{"id": "t1"}, {"id": "t2"}]})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let response = app
        .oneshot(post_file("/things/bulk", &[], ("thingsFile", "things.csv", "a\nb\n")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/things");
}

#[tokio::test]
async fn csv_connect_pairs_every_thing_with_the_channel() {
    let (server, app) = setup().await;

    Mock::given(method("POST"))
        .and(path("/connect"))
        .and(body_json(json!({
            "channel_ids": ["c1", "c1"],
            "thing_ids": ["t1", "t2"]
        })))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let response = app
        .oneshot(post_file(
            "/connect",
            &[("chanID", "c1")],
            ("thingsFile", "things.csv", "t1\nt2\n"),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/channels/c1/things");
}

// Connections and messages

#[tokio::test]
async fn connect_thing_issues_one_pair_connect() {
    let (server, app) = setup().await;

    Mock::given(method("POST"))
        .and(path("/connect"))
        .and(body_json(json!({"channel_ids": ["c1"], "thing_ids": ["t1"]})))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let response = app
        .oneshot(post_form(
            "/channels/c1/connectThing",
            Some("token=tok"),
            "thingID=t1",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/channels/c1/things");
}

#[tokio::test]
async fn connect_thing_alias_takes_channel_from_path() {
    let (server, app) = setup().await;

    Mock::given(method("POST"))
        .and(path("/connect"))
        .and(body_json(json!({"channel_ids": ["c9"], "thing_ids": ["t1"]})))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let response = app
        .oneshot(post_form(
            "/things/c9/connectThing",
            Some("token=tok"),
            "thingID=t1",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn malformed_subtopic_is_rejected_before_publishing() {
    let (server, app) = setup().await;

    Mock::given(method("POST"))
        .and(path("/channels/c1/messages"))
        .respond_with(ResponseTemplate::new(202))
        .expect(0)
        .mount(&server)
        .await;

    let response = app
        .oneshot(post_form(
            "/messages",
            Some("token=tok"),
            "channelID=c1&subtopic=room%2F%2A&thingKey=k&message=%5B%5D",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn publish_uses_thing_key_and_subtopic() {
    let (server, app) = setup().await;

    Mock::given(method("POST"))
        .and(path("/channels/c1/messages/room/temp"))
        .and(header_is("authorization", "Thing k"))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&server)
        .await;

    let response = app
        .oneshot(post_form(
            "/messages",
            Some("token=tok"),
            "channelID=c1&subtopic=room%2Ftemp&thingKey=k&message=%5B%5D",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/readmessages?channelID=c1");
}

#[tokio::test]
async fn publish_redirect_encodes_channel_id() {
    let (server, app) = setup().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&server)
        .await;

    let response = app
        .oneshot(post_form(
            "/messages",
            Some("token=tok"),
            "channelID=c%26x%3D1&thingKey=k&message=%5B%5D",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/readmessages?channelID=c%26x%3D1");
}

// Pages and JSON updates

#[tokio::test]
async fn things_page_renders_backend_items() {
    let (server, app) = setup().await;

    Mock::given(method("GET"))
        .and(path("/things"))
        .and(header_is("authorization", "Bearer tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total": 1,
            "offset": 0,
            "limit": 10,
            "things": [{"id": "t1", "name": "thermometer"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let response = app
        .oneshot(get("/things", Some("token=tok")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/html; charset=utf-8"
    );
    assert!(body_text(response).await.contains("thermometer"));
}

#[tokio::test]
async fn json_update_answers_empty_ok() {
    let (server, app) = setup().await;

    Mock::given(method("PATCH"))
        .and(path("/things/t1"))
        .and(body_json(json!({"name": "renamed", "metadata": null})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "t1"})))
        .expect(1)
        .mount(&server)
        .await;

    let request = Request::builder()
        .method("POST")
        .uri("/things/t1")
        .header(header::COOKIE, "token=tok")
        .body(Body::from(r#"{"name":"renamed"}"#))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.is_empty());
}

#[tokio::test]
async fn invalid_json_update_is_bad_request() {
    let (_server, app) = setup().await;

    let request = Request::builder()
        .method("POST")
        .uri("/users/u1/tags")
        .header(header::COOKIE, "token=tok")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// Backend failures

#[tokio::test]
async fn backend_statuses_map_to_ui_statuses() {
    for (backend, expected) in [
        (403, StatusCode::FORBIDDEN),
        (500, StatusCode::SERVICE_UNAVAILABLE),
        (404, StatusCode::SERVICE_UNAVAILABLE),
    ] {
        let (server, app) = setup().await;
        Mock::given(method("GET"))
            .and(path("/channels"))
            .respond_with(ResponseTemplate::new(backend))
            .mount(&server)
            .await;

        let response = app
            .oneshot(get("/channels", Some("token=tok")))
            .await
            .unwrap();
        assert_eq!(response.status(), expected, "backend {backend}");
    }
}

// Service endpoints

#[tokio::test]
async fn health_and_version() {
    let (_server, app) = setup().await;

    let response = app.clone().oneshot(get("/health", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "OK");

    let response = app.oneshot(get("/version", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(body["status"], "pass");
    assert_eq!(body["instance_id"], "test-instance");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn metrics_expose_matched_routes() {
    iot_gui::services::metrics::init_metrics().unwrap();
    let (_server, app) = setup().await;

    app.clone().oneshot(get("/health", None)).await.unwrap();
    let response = app.oneshot(get("/metrics", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let text = body_text(response).await;
    assert!(text.contains("http_requests_total"));
    assert!(text.contains("path=\"/health\""));
}

#[tokio::test]
async fn request_id_is_echoed() {
    let (_server, app) = setup().await;

    let request = Request::builder()
        .uri("/health")
        .header("x-request-id", "req-42")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.headers()["x-request-id"], "req-42");
}
