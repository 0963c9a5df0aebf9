//! End-to-end tests: the real router and covid-193 provider talking to a
//! wiremock server that stands in for the RapidAPI upstream.

use std::time::Duration;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use covid_proxy::{config::Config, state::AppState};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tower::ServiceExt;
use wiremock::matchers::{header as header_eq, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const API_KEY: &str = "test-key";

fn config_for(endpoint: &str, timeout: u64) -> Config {
    let mut config = Config::new(API_KEY);
    config.upstream.endpoint = endpoint.to_string();
    config.upstream.timeout = timeout;
    config
}

async fn call(config: Config, request: Request<Body>) -> (StatusCode, Value) {
    let app = covid_proxy::app(AppState::from_config(&config).unwrap());
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert!(!bytes.is_empty(), "every response must carry a body");
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_data(country: &str, date: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/data")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({"country": country, "date": date}).to_string()))
        .unwrap()
}

fn upstream_body(response: Value) -> Value {
    json!({"get": "endpoint", "parameters": [], "errors": [], "results": 0, "response": response})
}

#[tokio::test]
async fn country_list_sends_credentials_and_returns_names() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/countries"))
        .and(header_eq("x-rapidapi-key", API_KEY))
        .and(header_eq("x-rapidapi-host", "covid-193.p.rapidapi.com"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(upstream_body(json!(["Afghanistan", "Albania", "Algeria"]))),
        )
        .expect(1)
        .mount(&server)
        .await;

    let (status, body) = call(config_for(&server.uri(), 5), get("/countryList")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"success": true, "data": ["Afghanistan", "Albania", "Algeria"]})
    );
}

#[tokio::test]
async fn data_forwards_country_and_day() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/history"))
        .and(query_param("country", "USA"))
        .and(query_param("day", "2021-01-01"))
        .respond_with(ResponseTemplate::new(200).set_body_json(upstream_body(json!([
            {
                "continent": "North-America",
                "country": "USA",
                "population": 331000000,
                "cases": {"new": "+1", "active": 100, "critical": null, "recovered": 0, "total": 150},
                "deaths": {"new": null, "total": 50},
                "day": "2021-01-01"
            }
        ]))))
        .expect(1)
        .mount(&server)
        .await;

    let (status, body) = call(config_for(&server.uri(), 5), post_data("USA", "2021-01-01")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "success": true,
            "data": {"population": 331000000, "recovered": 0, "deaths": 50, "active": 100}
        })
    );
}

#[tokio::test]
async fn data_encodes_country_with_spaces() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/history"))
        .and(query_param("country", "South Korea"))
        .respond_with(ResponseTemplate::new(200).set_body_json(upstream_body(json!([
            {"population": null, "cases": {"active": null, "recovered": null}, "deaths": {"total": null}}
        ]))))
        .expect(1)
        .mount(&server)
        .await;

    let (status, body) =
        call(config_for(&server.uri(), 5), post_data("South Korea", "2021-01-01")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["data"],
        json!({"population": 0, "recovered": 0, "deaths": 0, "active": 0})
    );
}

#[tokio::test]
async fn data_for_unknown_country_returns_sentinel() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/history"))
        .respond_with(ResponseTemplate::new(200).set_body_json(upstream_body(json!([]))))
        .mount(&server)
        .await;

    let (status, body) =
        call(config_for(&server.uri(), 5), post_data("Atlantis", "2021-01-01")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "success": false,
            "data": {"population": -1, "recovered": -1, "deaths": -1, "active": -1}
        })
    );
}

#[tokio::test]
async fn invalid_body_never_reaches_upstream() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/data")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"date":"2021-01-01"}"#))
        .unwrap();
    let (status, body) = call(config_for(&server.uri(), 5), request).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["kind"], "invalid_request_body");
}

#[tokio::test]
async fn all_projects_statistics() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/statistics"))
        .respond_with(ResponseTemplate::new(200).set_body_json(upstream_body(json!([
            {"country": "France", "population": 65000000, "cases": {"active": 10, "recovered": 5}, "deaths": {"total": 2}},
            {"country": "Peru", "cases": {"active": null}, "deaths": {"total": 7}}
        ]))))
        .mount(&server)
        .await;

    let (status, body) = call(config_for(&server.uri(), 5), get("/all")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "success": true,
            "data": [
                {"country": "France", "deaths": 2, "active": 10},
                {"country": "Peru", "deaths": 7, "active": 0}
            ]
        })
    );
}

#[tokio::test]
async fn upstream_500_is_bad_gateway_on_every_data_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
        .mount(&server)
        .await;

    for request in [get("/countryList"), post_data("USA", "2021-01-01"), get("/all")] {
        let (status, body) = call(config_for(&server.uri(), 5), request).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["kind"], "upstream_http_error");
        assert_eq!(body["error"]["message"], "upstream returned status 500");
    }
}

#[tokio::test]
async fn non_json_body_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/countries"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let (status, body) = call(config_for(&server.uri(), 5), get("/countryList")).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"]["kind"], "upstream_malformed_response");
}

#[tokio::test]
async fn missing_response_key_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/statistics"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"errors": {"token": "Missing application key."}})),
        )
        .mount(&server)
        .await;

    let (status, body) = call(config_for(&server.uri(), 5), get("/all")).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"]["kind"], "upstream_malformed_response");
}

#[tokio::test]
async fn invalid_utf8_body_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/countries"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(b"{\"response\":[\"Fran\xe7e\"]}".to_vec(), "application/json"),
        )
        .mount(&server)
        .await;

    let (status, body) = call(config_for(&server.uri(), 5), get("/countryList")).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"]["kind"], "upstream_malformed_response");
}

#[tokio::test]
async fn connection_dropped_mid_body_is_unreachable() {
    // Promises 100 bytes, sends a few, then hangs up.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = [0u8; 1024];
        let _ = socket.read(&mut request).await;
        socket
            .write_all(
                b"HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 100\r\n\r\n{\"response\":",
            )
            .await
            .unwrap();
        socket.shutdown().await.unwrap();
    });

    let (status, body) = call(config_for(&format!("http://{addr}"), 5), get("/countryList")).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"]["kind"], "upstream_unreachable");
}

#[tokio::test]
async fn slow_upstream_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/countries"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(upstream_body(json!([])))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let (status, body) = call(config_for(&server.uri(), 1), get("/countryList")).await;
    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(body["error"]["kind"], "upstream_timeout");
}

#[tokio::test]
async fn refused_connection_is_unreachable() {
    // Nothing listens on port 1.
    let (status, body) = call(config_for("http://127.0.0.1:1", 5), get("/all")).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["kind"], "upstream_unreachable");
}

#[tokio::test]
async fn liveness_does_not_touch_upstream() {
    let (status, body) = call(config_for("http://127.0.0.1:1", 5), get("/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["status"], "Up & Running fine. UwU");
}
