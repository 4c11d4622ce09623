//! Modelkit Bridge
//!
//! 모델/라우트 설정 파일에서 생성한 CRUD 엔드포인트를 HTTP로 제공합니다.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::get,
    Router,
};
use mk_core::permissions::HEALTH_PATH;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod error;
mod handlers;
mod middleware;
mod routes;
mod state;
mod storage;

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 환경변수 로드
    dotenvy::dotenv().ok();

    // 로깅 초기화
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            "mk_bridge=debug,mk_core=debug,tower_http=debug".into()
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 설정 로드
    let config = Config::from_env()?;
    tracing::info!("Starting Bridge with config: {:?}", config);

    // 앱 상태 초기화 (설정 에러는 여기서 종료)
    let state = AppState::new(&config).await?;
    let state = Arc::new(state);

    // 라우터 구성
    let app = create_router(state);

    // 서버 시작
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Bridge listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// 라우터 생성
fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check
        .route(HEALTH_PATH, get(handlers::health::health_check))
        // Generated resources
        .merge(routes::resource_router(&state))
        .fallback(handlers::resource::not_found)
        // Middleware
        .layer(from_fn_with_state(state.clone(), middleware::authenticate))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(from_fn(middleware::request_id))
        // State
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use mk_core::storage::{filter_eq, MemoryStorage, Storage};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::config::StorageUrl;

    const ALICE: &str = "64b00000000000000000000a";
    const BOB: &str = "64b00000000000000000000b";
    const NOBODY: &str = "64b000000000000000000999";

    const CONFIG: &str = r#"
models:
  Users:
    fields:
      _id: [ObjectId, "rd"]
      email: [String, "cru"]
      password_hash: [String, "c"]
routes:
  - path: /users
    model: Users
    rules:
      c: "@req_user._id=@req_user._id"
      r: { allow: "@user._id=@req_user._id", where: "_id" }
      u: { allow: "@user._id=@req_user._id", where: "_id" }
"#;

    fn app() -> (Router, Arc<MemoryStorage>) {
        let config = Config {
            port: 0,
            models_path: "config/models.yaml".into(),
            storage_url: StorageUrl::Memory,
            paseto_keys: Vec::new(),
            disable_auth: false,
        };
        let compiled = mk_core::register_config(CONFIG).unwrap();
        let storage = Arc::new(MemoryStorage::new());
        let state = AppState::from_parts(&config, compiled, storage.clone());
        (create_router(Arc::new(state)), storage)
    }

    fn request(method: &str, uri: &str, user: Option<&str>, body: Option<Value>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(id) = user {
            builder = builder.header("authorization", format!(r#"Bearer json:{{"_id":"{}"}}"#, id));
        }
        match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
        let resp = app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    async fn seed_user(storage: &MemoryStorage, id: &str, email: &str) {
        let record = json!({ "_id": id, "email": email, "password_hash": "secret" });
        storage
            .insert_one("users", record.as_object().cloned().unwrap())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_health_and_request_id() {
        let (app, _) = app();
        let resp = app
            .clone()
            .oneshot(request("GET", "/health", None, None))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(resp.headers().contains_key("x-request-id"));

        let (_, body) = send(&app, request("GET", "/health", None, None)).await;
        assert_eq!(body, json!({ "ok": true }));
    }

    #[tokio::test]
    async fn test_create_stores_all_and_returns_readable() {
        let (app, storage) = app();

        let (status, body) = send(
            &app,
            request(
                "POST",
                "/users",
                Some(ALICE),
                Some(json!({ "email": "a@b.com", "password_hash": "x" })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["email"], json!("a@b.com"));
        assert!(body.get("password_hash").is_none());

        let id = body["_id"].as_str().unwrap().to_string();
        let stored = storage
            .find_one("users", &filter_eq("_id", json!(id.clone())))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored["password_hash"], json!("x"));

        let (status, body) = send(
            &app,
            request("GET", &format!("/users/{}", id), Some(&id), None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_object().unwrap().len(), 2);
        assert!(body.get("password_hash").is_none());
    }

    #[tokio::test]
    async fn test_read_by_owner_other_and_missing() {
        let (app, storage) = app();
        seed_user(&storage, ALICE, "alice@b.com").await;

        let uri = format!("/users/{}", ALICE);
        let (status, body) = send(&app, request("GET", &uri, Some(ALICE), None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["email"], json!("alice@b.com"));

        let (status, body) = send(&app, request("GET", &uri, Some(BOB), None)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"]["code"], json!("FORBIDDEN"));

        let missing = format!("/users/{}", NOBODY);
        let (status, _) = send(&app, request("GET", &missing, Some(ALICE), None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_missing_rule_is_not_found() {
        let (app, storage) = app();
        seed_user(&storage, ALICE, "alice@b.com").await;

        let uri = format!("/users/{}", ALICE);
        let (status, body) = send(&app, request("DELETE", &uri, Some(ALICE), None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], json!("NOT_FOUND"));
        assert_eq!(storage.count("users").unwrap(), 1);

        // 규칙 없는 rA
        let (status, _) = send(&app, request("GET", "/users", Some(ALICE), None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&app, request("GET", "/nothing", None, None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_update_drops_undeclared_keys() {
        let (app, storage) = app();
        seed_user(&storage, ALICE, "alice@b.com").await;

        let uri = format!("/users/{}", ALICE);
        let (status, body) = send(
            &app,
            request(
                "PUT",
                &uri,
                Some(ALICE),
                Some(json!({ "email": "new@b.com", "is_admin": true })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["email"], json!("new@b.com"));
        assert!(body.get("is_admin").is_none());

        let stored = storage
            .find_one("users", &filter_eq("_id", json!(ALICE)))
            .await
            .unwrap()
            .unwrap();
        assert!(stored.get("is_admin").is_none());
        assert_eq!(stored["password_hash"], json!("secret"));
    }

    #[tokio::test]
    async fn test_rejected_credential_is_unauthorized() {
        let (app, storage) = app();
        seed_user(&storage, ALICE, "alice@b.com").await;

        let req = Request::builder()
            .method("GET")
            .uri(format!("/users/{}", ALICE))
            .header("authorization", "Bearer not-a-token")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(&app, req).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], json!("UNAUTHORIZED"));
        assert!(body["error"]["requestId"].is_string());
    }

    #[tokio::test]
    async fn test_invalid_body_is_bad_request() {
        let (app, _) = app();
        let req = Request::builder()
            .method("POST")
            .uri("/users")
            .header("authorization", format!(r#"Bearer json:{{"_id":"{}"}}"#, ALICE))
            .body(Body::from("{not json"))
            .unwrap();
        let (status, _) = send(&app, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
