use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use ai_llm_service::GeminiConfig;
use axum::{
    Json, Router,
    body::Body,
    http::{HeaderMap, Method, Request, StatusCode, header},
    routing::post,
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use site_connector::{InMemorySiteStore, OAuthConfig};
use tower::ServiceExt;

use crate::{
    build_router,
    core::app_state::{AppConfig, AppState},
    middleware_layer::request_context::REQUEST_ID_HEADER,
};

async fn spawn_stub(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn unreachable_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

/// Gemini stub that always answers with `text`.
async fn llm_stub(text: &'static str) -> String {
    let app = Router::new().route(
        "/v1beta/models/{model}",
        post(move || async move {
            Json(json!({"candidates":[{"content":{"parts":[{"text": text}]}}]}))
        }),
    );
    spawn_stub(app).await
}

fn app(llm_endpoint: String, api_key: Option<&str>) -> Router {
    app_from(config(llm_endpoint, api_key))
}

fn app_from(cfg: AppConfig) -> Router {
    build_router(AppState::new(cfg, Arc::new(InMemorySiteStore::new())).unwrap())
}

fn config(llm_endpoint: String, api_key: Option<&str>) -> AppConfig {
    AppConfig {
        gemini: GeminiConfig {
            api_key: api_key.map(str::to_string),
            model: "gemini-test".into(),
            endpoint: llm_endpoint,
            timeout_secs: Some(5),
        },
        oauth: OAuthConfig {
            client_id: Some("cid".into()),
            client_secret: Some("secret".into()),
            redirect_uri: Some("http://localhost:5000/auth/callback".into()),
            authorize_url: Some("https://wp.example/oauth2/authorize".into()),
            token_url: Some("https://wp.example/oauth2/token".into()),
            api_base: "https://wp.example/rest/v1.1".into(),
        },
        frontend_url: "http://localhost:3000".into(),
        bind_addr: "127.0.0.1:0".into(),
    }
}

const CODE_REPLY: &str =
    r#"{"code": ".btn { padding: 12px; }", "code_type": "CSS", "description": "Bigger button"}"#;

/// Plugin stub that echoes the received payload when the key is `site-key`.
async fn site_stub() -> String {
    async fn echo(headers: HeaderMap, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
        if headers.get("x-api-key").and_then(|v| v.to_str().ok()) == Some("site-key") {
            (StatusCode::OK, Json(json!({"success": true, "received": body})))
        } else {
            (StatusCode::FORBIDDEN, Json(json!({"code": "rest_forbidden"})))
        }
    }
    spawn_stub(
        Router::new()
            .route("/wp-json/ai-code-deployer/v1/deploy", post(echo))
            .route("/wp-json/ai-code-deployer/v1/deploy-batch", post(echo)),
    )
    .await
}

fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_json(resp: axum::response::Response) -> Value {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_reports_key_and_request_id() {
    let app = app(unreachable_url(), Some("k"));
    let resp = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().contains_key(&REQUEST_ID_HEADER));
    assert_eq!(body_json(resp).await, json!({"status": "ok", "hasKey": true}));
}

#[tokio::test]
async fn incoming_request_id_is_echoed() {
    let app = app(unreachable_url(), None);
    let req = Request::builder()
        .uri("/api/health")
        .header("x-request-id", "abc-123")
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.headers()[&REQUEST_ID_HEADER], "abc-123");
    assert_eq!(body_json(resp).await["hasKey"], false);
}

#[tokio::test]
async fn generate_prompt_returns_model_text() {
    let app = app(llm_stub("Increase button size").await, Some("k"));
    let resp = app
        .oneshot(json_request(
            Method::POST,
            "/generate-prompt",
            json!({"review": "button too small"}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await, json!({"prompt": "Increase button size"}));
}

#[tokio::test]
async fn missing_review_is_a_bad_request() {
    let app = app(unreachable_url(), Some("k"));
    let resp = app
        .oneshot(json_request(Method::POST, "/api/generate-prompt", json!({})))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = body_json(resp).await;
    assert_eq!(body["error"], "Review required");
    assert_eq!(body["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn unparseable_code_forwards_raw_text() {
    let app = app(llm_stub("no code here").await, Some("k"));
    let resp = app
        .oneshot(json_request(
            Method::POST,
            "/generate-code",
            json!({"prompt": "make it blue"}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(resp).await;
    assert_eq!(body["code"], "PARSE_ERROR");
    assert_eq!(body["raw"], "no code here");
}

#[tokio::test]
async fn setup_direct_with_unreachable_site_is_unauthorized_with_hints() {
    let app = app(unreachable_url(), None);
    let resp = app
        .oneshot(json_request(
            Method::POST,
            "/setup/direct",
            json!({"userId": "u1", "siteUrl": unreachable_url(), "apiKey": "key"}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(resp).await;
    assert!(!body["hints"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn deploy_code_rejects_unknown_type_without_contacting_site() {
    let hits = Arc::new(AtomicUsize::new(0));
    let h = hits.clone();
    let site = spawn_stub(Router::new().route(
        "/wp-json/ai-code-deployer/v1/deploy",
        post(move || {
            let hits = h.clone();
            async move {
                hits.fetch_add(1, Ordering::SeqCst);
                Json(json!({}))
            }
        }),
    ))
    .await;

    let app = app(unreachable_url(), None);
    let resp = app
        .oneshot(json_request(
            Method::POST,
            "/deploy-code",
            json!({"siteUrl": site, "apiKey": "k", "code": "<x/>", "codeType": "xml"}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn register_then_list_hides_api_keys() {
    let app = app(unreachable_url(), None);
    let resp = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/wordpress/register",
            json!({"userId": "u1", "siteUrl": "https://a.com/", "apiKey": "secret"}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["site"]["siteUrl"], "https://a.com");
    assert!(body["site"].get("apiKey").is_none());

    let resp = app.oneshot(get("/wordpress/sites/u1")).await.unwrap();
    let body = body_json(resp).await;
    assert_eq!(body["sites"].as_array().unwrap().len(), 1);
    assert!(!body.to_string().contains("secret"));
}

#[tokio::test]
async fn callback_redirects_to_frontend() {
    let app = app(unreachable_url(), None);
    let resp = app
        .clone()
        .oneshot(get("/auth/callback?code=abc&state=xyz"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(
        resp.headers()[header::LOCATION],
        "http://localhost:3000?code=abc&state=xyz"
    );

    let resp = app.oneshot(get("/auth/callback")).await.unwrap();
    assert_eq!(
        resp.headers()[header::LOCATION],
        "http://localhost:3000?error=no_code"
    );
}

#[tokio::test]
async fn authorize_url_is_built_from_config() {
    let app = app(unreachable_url(), None);
    let resp = app.oneshot(get("/oauth/authorize-url")).await.unwrap();
    let body = body_json(resp).await;
    let url = body["authorizeUrl"].as_str().unwrap();
    assert!(url.starts_with("https://wp.example/oauth2/authorize?client_id=cid"));
    assert!(url.contains(body["state"].as_str().unwrap()));
}

#[tokio::test]
async fn list_sites_requires_bearer_token() {
    let app = app(unreachable_url(), None);
    let resp = app.oneshot(get("/list-wordpress-sites")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["error"], "Missing authorization token");
}

#[tokio::test]
async fn malformed_json_becomes_error_body() {
    let app = app(unreachable_url(), None);
    let req = Request::builder()
        .method(Method::POST)
        .uri("/generate-prompt")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn workflow_routes_drive_a_review() {
    let app = app(llm_stub("Increase button size").await, Some("k"));

    let resp = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/reviews",
            json!({"text": "button too small"}),
        ))
        .await
        .unwrap();
    let id = body_json(resp).await["review"]["id"].as_u64().unwrap();

    let resp = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            &format!("/api/reviews/{id}/select"),
            json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            &format!("/api/reviews/{id}/generate-prompt"),
            json!({}),
        ))
        .await
        .unwrap();
    let body = body_json(resp).await;
    assert_eq!(body["review"]["status"], "promptGenerated");
    assert_eq!(body["review"]["promptDraft"], "Increase button size");

    let resp = app
        .clone()
        .oneshot(json_request(
            Method::PUT,
            &format!("/api/reviews/{id}/prompt-draft"),
            json!({"promptDraft": "Make the button 48px tall"}),
        ))
        .await
        .unwrap();
    assert_eq!(
        body_json(resp).await["review"]["promptDraft"],
        "Make the button 48px tall"
    );

    let resp = app.clone().oneshot(get("/api/reviews/selected")).await.unwrap();
    assert_eq!(
        body_json(resp).await["review"]["promptDraft"],
        "Make the button 48px tall"
    );

    let resp = app.clone().oneshot(get("/stats")).await.unwrap();
    assert_eq!(
        body_json(resp).await,
        json!({"total": 1, "pending": 1, "generated": 0, "successRate": 0})
    );

    let resp = app.clone().oneshot(get("/reviews/999")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = app.oneshot(get("/reviews/not-a-number")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn deploy_codes_accepts_both_code_type_spellings() {
    let site = site_stub().await;
    let app = app(unreachable_url(), None);
    let resp = app
        .oneshot(json_request(
            Method::POST,
            "/deploy-codes",
            json!({
                "siteUrl": format!("{site}/"),
                "apiKey": "site-key",
                "deployments": [
                    {"code": "a{}", "codeType": "css"},
                    {"code": "b()", "code_type": "JS"}
                ]
            }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["success"], true);
    let sent = &body["deployment"]["received"]["deployments"];
    assert_eq!(sent[0]["code_type"], "css");
    assert_eq!(sent[1]["code_type"], "js");
}

#[tokio::test]
async fn token_route_returns_pair_or_exchange_error() {
    let provider = spawn_stub(Router::new().route(
        "/oauth2/token",
        post(|body: String| async move {
            if body.contains("code=abc") {
                (StatusCode::OK, Json(json!({"access_token": "at", "refresh_token": "rt"})))
            } else {
                (StatusCode::BAD_REQUEST, Json(json!({"error": "invalid_grant"})))
            }
        }),
    ))
    .await;
    let mut cfg = config(unreachable_url(), None);
    cfg.oauth.token_url = Some(format!("{provider}/oauth2/token"));
    let app = app_from(cfg);

    let resp = app
        .clone()
        .oneshot(json_request(Method::POST, "/oauth/token", json!({"code": "abc"})))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        body_json(resp).await,
        json!({"access_token": "at", "refresh_token": "rt"})
    );

    let resp = app
        .clone()
        .oneshot(json_request(Method::POST, "/oauth/token", json!({"code": "zzz"})))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(resp).await;
    assert_eq!(body["code"], "TOKEN_EXCHANGE_FAILED");
    assert_eq!(body["details"]["error"], "invalid_grant");

    let resp = app
        .oneshot(json_request(Method::POST, "/oauth/token", json!({})))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn review_to_deploy_returns_pipeline_and_records_history() {
    let site = site_stub().await;
    let app = app(llm_stub(CODE_REPLY).await, Some("k"));
    let resp = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/review-to-deploy",
            json!({"review": "button too small", "siteUrl": site, "apiKey": "site-key", "userId": "u1"}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["pipeline"]["codeType"], "CSS");
    assert_eq!(body["pipeline"]["code"], ".btn { padding: 12px; }");
    assert_eq!(body["pipeline"]["deployment"]["received"]["code_type"], "css");

    let resp = app.oneshot(get("/deployments")).await.unwrap();
    let body = body_json(resp).await;
    assert_eq!(body["deployments"].as_array().unwrap().len(), 1);
    assert_eq!(body["deployments"][0]["codeType"], "css");
}

#[tokio::test]
async fn review_to_deploy_uses_registered_site_when_credentials_are_omitted() {
    let site = site_stub().await;
    let app = app(llm_stub(CODE_REPLY).await, Some("k"));

    let resp = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/review-to-deploy",
            json!({"review": "button too small", "userId": "u1"}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(resp).await["error"],
        "Missing required parameters: siteUrl, apiKey"
    );

    app.clone()
        .oneshot(json_request(
            Method::POST,
            "/wordpress/register",
            json!({"userId": "u1", "siteUrl": site, "apiKey": "site-key"}),
        ))
        .await
        .unwrap();

    let resp = app
        .oneshot(json_request(
            Method::POST,
            "/review-to-deploy",
            json!({"review": "button too small", "userId": "u1"}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["success"], true);
}

#[tokio::test]
async fn review_deploy_route_records_lowercased_override() {
    let site = site_stub().await;
    let app = app(llm_stub(CODE_REPLY).await, Some("k"));

    let resp = app
        .clone()
        .oneshot(json_request(Method::POST, "/reviews", json!({"text": "slow menu"})))
        .await
        .unwrap();
    let id = body_json(resp).await["review"]["id"].as_u64().unwrap();

    let deploy = |app: Router| {
        let site = site.clone();
        async move {
            app.oneshot(json_request(
                Method::POST,
                &format!("/reviews/{id}/deploy"),
                json!({"siteUrl": site, "apiKey": "site-key", "codeType": "JS"}),
            ))
            .await
            .unwrap()
        }
    };

    let resp = deploy(app.clone()).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    for stage in ["generate-prompt", "generate-code"] {
        let resp = app
            .clone()
            .oneshot(json_request(
                Method::POST,
                &format!("/reviews/{id}/{stage}"),
                json!({}),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK, "{stage}");
    }

    let resp = deploy(app.clone()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["record"]["codeType"], "js");
    assert_eq!(body["record"]["reviewId"], id);
    assert_eq!(body["deployment"]["received"]["code_type"], "js");

    let resp = app.oneshot(get(&format!("/reviews/{id}"))).await.unwrap();
    assert_eq!(body_json(resp).await["review"]["status"], "deployed");
}

#[tokio::test]
async fn setup_oauth_records_site_without_token() {
    let app = app(unreachable_url(), None);
    let resp = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/setup/oauth",
            json!({"userId": "u1", "siteUrl": "https://blog.example/", "accessToken": "tok-secret", "name": "Blog"}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["site"]["siteUrl"], "https://blog.example");
    assert_eq!(body["site"]["name"], "Blog");

    let resp = app
        .clone()
        .oneshot(get("/wordpress/sites/u1"))
        .await
        .unwrap();
    let body = body_json(resp).await;
    assert_eq!(body["sites"].as_array().unwrap().len(), 1);
    assert!(!body.to_string().contains("tok-secret"));

    let resp = app
        .oneshot(json_request(
            Method::POST,
            "/setup/oauth",
            json!({"userId": "u1", "siteUrl": "https://blog.example"}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
