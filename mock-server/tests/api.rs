use axum::http::{Request, StatusCode};
use axum::response::Response;
use http_body_util::BodyExt;
use mock_server::{app, app_with_state, MockConfig, MockState, DEFAULT_CONSUMER_KEY};
use tower::ServiceExt;

async fn body_string(response: Response) -> String {
    let bytes: bytes::Bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn x_error(response: &Response) -> &str {
    response.headers()["X-Error"].to_str().unwrap()
}

/// POST with the content type Pocket clients actually send.
fn pocket_request(uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("Content-Type", "application-json; charset=UTF8")
        .body(body.to_string())
        .unwrap()
}

fn form_value(body: &str, key: &str) -> Option<String> {
    url::form_urlencoded::parse(body.as_bytes())
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}

// --- request token ---

#[tokio::test]
async fn request_token_issues_code() {
    let resp = app(MockConfig::default())
        .oneshot(pocket_request(
            "/v3/oauth/request",
            &format!(r#"{{"consumer_key":"{DEFAULT_CONSUMER_KEY}","redirect_uri":"app:done"}}"#),
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers()["Content-Type"],
        "application/x-www-form-urlencoded"
    );
    let body = body_string(resp).await;
    assert!(!form_value(&body, "code").unwrap().is_empty());
}

#[tokio::test]
async fn request_token_bad_consumer_key_returns_403() {
    let resp = app(MockConfig::default())
        .oneshot(pocket_request(
            "/v3/oauth/request",
            r#"{"consumer_key":"wrong","redirect_uri":"app:done"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert_eq!(x_error(&resp), "Invalid consumer key.");
    assert_eq!(resp.headers()["X-Error-Code"], "152");
}

#[tokio::test]
async fn request_token_missing_redirect_returns_400() {
    let resp = app(MockConfig::default())
        .oneshot(pocket_request(
            "/v3/oauth/request",
            &format!(r#"{{"consumer_key":"{DEFAULT_CONSUMER_KEY}","redirect_uri":""}}"#),
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(x_error(&resp), "Missing redirect url.");
}

#[tokio::test]
async fn malformed_body_returns_400() {
    let resp = app(MockConfig::default())
        .oneshot(pocket_request("/v3/oauth/request", "consumer_key=x"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(x_error(&resp), "Invalid request body.");
}

// --- authorize ---

#[tokio::test]
async fn authorize_unknown_code_returns_403() {
    let resp = app(MockConfig::default())
        .oneshot(pocket_request(
            "/v3/oauth/authorize",
            &format!(r#"{{"consumer_key":"{DEFAULT_CONSUMER_KEY}","code":"never-issued"}}"#),
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert_eq!(x_error(&resp), "User rejected code.");
}

// --- add ---

#[tokio::test]
async fn add_unknown_access_token_returns_401() {
    let resp = app(MockConfig::default())
        .oneshot(pocket_request(
            "/v3/add",
            &format!(
                r#"{{"consumer_key":"{DEFAULT_CONSUMER_KEY}","access_token":"nope","url":"https://example.com"}}"#
            ),
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(x_error(&resp), "Invalid access token.");
}

// --- full authorization flow ---

#[tokio::test]
async fn authorization_flow_and_add() {
    use tower::Service;

    let state = MockState::new(MockConfig {
        consumer_key: "flow-key".to_string(),
        username: "reader".to_string(),
    });
    let mut app = app_with_state(state.clone()).into_service();

    // request token
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(pocket_request(
            "/v3/oauth/request",
            r#"{"consumer_key":"flow-key","redirect_uri":"app:done"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let code = form_value(&body_string(resp).await, "code").unwrap();

    // authorize
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(pocket_request(
            "/v3/oauth/authorize",
            &format!(r#"{{"consumer_key":"flow-key","code":"{code}"}}"#),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_string(resp).await;
    let access_token = form_value(&body, "access_token").unwrap();
    assert_eq!(form_value(&body, "username").as_deref(), Some("reader"));

    // the code is single use
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(pocket_request(
            "/v3/oauth/authorize",
            &format!(r#"{{"consumer_key":"flow-key","code":"{code}"}}"#),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    // add
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(pocket_request(
            "/v3/add",
            &format!(
                r#"{{"consumer_key":"flow-key","access_token":"{access_token}","url":"https://example.com","title":"Example","tags":"a,b"}}"#
            ),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body_string(resp).await).unwrap();
    assert_eq!(json["status"], 1);
    assert_eq!(json["item"]["url"], "https://example.com");

    let items = state.items().await;
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].title, "Example");
    assert_eq!(items[0].tags, vec!["a", "b"]);
    assert_eq!(items[0].username, "reader");
}
