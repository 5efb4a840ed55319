mod support;

use axum::{http::StatusCode, routing::get, Router};
use microjson::{handlers::up::up, state::ServiceInfo, types::DateTime};
use tower::ServiceExt;

use support::{get as get_request, response_json};

#[tokio::test]
async fn up_reports_service_identity() {
    let service = ServiceInfo::new("2.3.4", "api-1");
    let booted = service.booted;
    let app = Router::new().route("/up", get(up)).with_state(service);

    let response = app.oneshot(get_request("/up")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["status"], "OK");
    assert_eq!(body["version"], "2.3.4");
    assert_eq!(body["hostname"], "api-1");
    assert_eq!(body["booted"], booted.to_string());
    assert!(body["uptime"].as_f64().is_some_and(|uptime| uptime >= 0.0));

    let parsed: DateTime = body["booted"].as_str().unwrap().parse().unwrap();
    assert_eq!(parsed.to_string(), booted.to_string());
}
