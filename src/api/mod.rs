// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::StatusCode,
    routing::{get, MethodFilter},
    Router,
};
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::{Authenticate, Authorize, Claims, ROLE_ADMIN},
    error::{ErrorResponse, FieldError},
    metrics::MetricsSnapshot,
    models::{NewUser, StatusResponse, TokenResponse, User},
    mw,
    state::AppState,
    web::{App, Middleware},
};

pub mod health;
pub mod status;
pub mod users;

/// Global middleware, outermost first.
pub fn global_middleware(state: &AppState) -> Vec<Arc<dyn Middleware>> {
    vec![
        Arc::new(mw::Logger),
        Arc::new(mw::Errors),
        Arc::new(mw::Metrics::new(state.metrics.clone())),
        Arc::new(mw::Panics::new(state.metrics.clone())),
    ]
}

/// Pipeline routes without transport layers or docs.
pub fn routes(state: AppState) -> App {
    let authen: Arc<dyn Middleware> = Arc::new(Authenticate::new(state.auth.clone()));
    let admin: Arc<dyn Middleware> = Arc::new(Authorize::new([ROLE_ADMIN]));

    App::new(state.shutdown.clone(), global_middleware(&state))
        .handle(MethodFilter::GET, "v1", "/test", status::test, &[])
        .handle(
            MethodFilter::GET,
            "v1",
            "/testauth",
            status::test_auth,
            &[authen.clone(), admin.clone()],
        )
        .handle(
            MethodFilter::GET,
            "v1",
            "/users/token",
            users::token_handler(state.clone()),
            &[],
        )
        .handle(
            MethodFilter::GET,
            "v1",
            "/users/{id}",
            users::query_by_id_handler(state.clone()),
            &[authen.clone()],
        )
        .handle(
            MethodFilter::POST,
            "v1",
            "/users",
            users::create_handler(state),
            &[authen, admin],
        )
}

/// The public API router.
pub fn api_mux(state: AppState, write_timeout: Duration) -> Router {
    Router::new()
        .merge(routes(state).into_router())
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(write_timeout_layer(write_timeout))
        .layer(CorsLayer::permissive())
}

/// Transport-level deadline; requests still running after it get a 408.
pub fn write_timeout_layer(write_timeout: Duration) -> TimeoutLayer {
    TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, write_timeout)
}

/// The debug router. Runs outside the pipeline.
pub fn debug_mux(state: AppState) -> Router {
    Router::new()
        .route("/debug/liveness", get(health::liveness))
        .route("/debug/readiness", get(health::readiness))
        .route("/debug/vars", get(health::vars))
        .with_state(state)
}

#[derive(OpenApi)]
#[openapi(
    paths(
        status::test,
        status::test_auth,
        users::token,
        users::query_by_id,
        users::create
    ),
    components(
        schemas(
            StatusResponse,
            TokenResponse,
            User,
            NewUser,
            Claims,
            ErrorResponse,
            FieldError,
            MetricsSnapshot
        )
    ),
    tags(
        (name = "Status", description = "Pipeline probes"),
        (name = "Users", description = "Token issuance, user lookup and creation")
    )
)]
struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Authenticator, KeyStore, PrivateKey, ROLE_USER};
    use crate::error::Error;
    use crate::store::InMemoryUserStore;
    use crate::web::{Context, HandlerResult, ResponseWriter};
    use axum::{
        body::Body,
        extract::Request,
        http::header::{AUTHORIZATION, CONTENT_TYPE},
        response::Response,
    };
    use base64::{engine::general_purpose::STANDARD, Engine};
    use chrono::Utc;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    struct Fixture {
        state: AppState,
        admin: User,
        user: User,
    }

    fn fixture() -> Fixture {
        let keys = KeyStore::new();
        keys.add("k1", PrivateKey::generate().unwrap());
        let auth = Arc::new(Authenticator::new(Arc::new(keys), "k1").unwrap());

        let store = InMemoryUserStore::new("gatehouse");
        let admin = store
            .insert(
                NewUser {
                    name: "Admin Gopher".into(),
                    email: "admin@example.com".into(),
                    roles: vec![ROLE_ADMIN.into()],
                    password: "gophers".into(),
                },
                Utc::now(),
            )
            .unwrap();
        let user = store
            .insert(
                NewUser {
                    name: "User Gopher".into(),
                    email: "user@example.com".into(),
                    roles: vec![ROLE_USER.into()],
                    password: "gophers".into(),
                },
                Utc::now(),
            )
            .unwrap();

        Fixture {
            state: AppState::new("test", auth, Arc::new(store)),
            admin,
            user,
        }
    }

    fn request(uri: &str, authorization: Option<String>) -> Request {
        let mut builder = Request::builder().uri(uri);
        if let Some(value) = authorization {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn token_for(router: &Router, email: &str, password: &str) -> String {
        let basic = STANDARD.encode(format!("{email}:{password}"));
        let response = router
            .clone()
            .oneshot(request("/v1/users/token", Some(format!("Basic {basic}"))))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        body_json(response).await["token"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_route_is_open() {
        let fx = fixture();
        let router = api_mux(fx.state.clone(), Duration::from_secs(5));

        let response = router.oneshot(request("/v1/test", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({"status": "ok"}));
        assert_eq!(fx.state.metrics.snapshot().requests, 1);
    }

    #[tokio::test]
    async fn testauth_requires_admin() {
        let fx = fixture();
        let router = api_mux(fx.state.clone(), Duration::from_secs(5));

        let response = router
            .clone()
            .oneshot(request("/v1/testauth", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let user_token = token_for(&router, "user@example.com", "gophers").await;
        let response = router
            .clone()
            .oneshot(request("/v1/testauth", Some(format!("Bearer {user_token}"))))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let admin_token = token_for(&router, "admin@example.com", "gophers").await;
        let response = router
            .oneshot(request("/v1/testauth", Some(format!("Bearer {admin_token}"))))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let snap = fx.state.metrics.snapshot();
        assert_eq!(snap.requests, 5);
        assert_eq!(snap.errors, 2);
    }

    #[tokio::test]
    async fn token_failures() {
        let fx = fixture();
        let router = api_mux(fx.state, Duration::from_secs(5));

        let response = router
            .clone()
            .oneshot(request("/v1/users/token", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let wrong = STANDARD.encode("admin@example.com:cats");
        let response = router
            .clone()
            .oneshot(request("/v1/users/token", Some(format!("Basic {wrong}"))))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let unknown = STANDARD.encode("nobody@example.com:gophers");
        let response = router
            .oneshot(request("/v1/users/token", Some(format!("Basic {unknown}"))))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn query_by_id_rules() {
        let fx = fixture();
        let router = api_mux(fx.state, Duration::from_secs(5));
        let user_token = token_for(&router, "user@example.com", "gophers").await;
        let admin_token = token_for(&router, "admin@example.com", "gophers").await;

        let get = |id: String, token: &str| request(&format!("/v1/users/{id}"), Some(format!("Bearer {token}")));

        // Self.
        let response = router.clone().oneshot(get(fx.user.id.to_string(), &user_token)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["email"], "user@example.com");

        // Someone else.
        let response = router.clone().oneshot(get(fx.admin.id.to_string(), &user_token)).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        // Admin reads anyone.
        let response = router.clone().oneshot(get(fx.user.id.to_string(), &admin_token)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        // Unknown id.
        let response = router
            .clone()
            .oneshot(get(uuid::Uuid::new_v4().to_string(), &admin_token))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        // Malformed id.
        let response = router.oneshot(get("not-a-uuid".into(), &admin_token)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await,
            json!({"error": "ID is not in its proper form"})
        );
    }

    fn post_user(body: &str, token: &str) -> Request {
        Request::builder()
            .method("POST")
            .uri("/v1/users")
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn create_user_validates_fields() {
        let fx = fixture();
        let router = api_mux(fx.state, Duration::from_secs(5));
        let admin_token = token_for(&router, "admin@example.com", "gophers").await;

        let response = router
            .clone()
            .oneshot(post_user(r#"{"name":"","email":"gopher","roles":["USER"]}"#, &admin_token))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await,
            json!({
                "error": "data validation error",
                "fields": [
                    {"field": "name", "error": "name is a required field"},
                    {"field": "email", "error": "email must be a valid email address"},
                    {"field": "password", "error": "password is a required field"}
                ]
            })
        );

        // Malformed JSON is a plain 400 without fields.
        let response = router
            .clone()
            .oneshot(post_user("{not json", &admin_token))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_json(response).await.get("fields").is_none());
    }

    #[tokio::test]
    async fn create_user_then_sign_in() {
        let fx = fixture();
        let router = api_mux(fx.state, Duration::from_secs(5));
        let admin_token = token_for(&router, "admin@example.com", "gophers").await;
        let user_token = token_for(&router, "user@example.com", "gophers").await;
        let body = r#"{"name":"New Gopher","email":"new@example.com","roles":["USER"],"password":"burrow"}"#;

        let response = router.clone().oneshot(post_user(body, &user_token)).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = router.clone().oneshot(post_user(body, &admin_token)).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let created = body_json(response).await;
        assert_eq!(created["email"], "new@example.com");
        assert!(created.get("password").is_none());

        let response = router.clone().oneshot(post_user(body, &admin_token)).await.unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        token_for(&router, "new@example.com", "burrow").await;
    }

    #[tokio::test]
    async fn panic_is_contained() {
        let fx = fixture();
        let router = App::new(fx.state.shutdown.clone(), global_middleware(&fx.state))
            .handle(
                MethodFilter::GET,
                "v1",
                "/panic",
                |_ctx: Context, _w: ResponseWriter, _req: Request| async {
                    let items: Vec<u32> = Vec::new();
                    if items[0] > 0 {
                        return HandlerResult::Err(Error::internal("unreachable"));
                    }
                    HandlerResult::Ok(())
                },
                &[],
            )
            .into_router();

        let response = router.clone().oneshot(request("/v1/panic", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(response).await, json!({"error": "internal error"}));

        let snap = fx.state.metrics.snapshot();
        assert_eq!(snap.panics, 1);
        assert_eq!(snap.errors, 1);
        assert!(!fx.state.shutdown.is_signalled());

        // The service keeps serving.
        let response = router.oneshot(request("/v1/panic", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(fx.state.metrics.snapshot().panics, 2);
    }

    #[tokio::test]
    async fn concurrent_shutdown_errors_signal_once() {
        let fx = fixture();
        let router = App::new(fx.state.shutdown.clone(), global_middleware(&fx.state))
            .handle(
                MethodFilter::GET,
                "v1",
                "/corrupt",
                |_ctx: Context, _w: ResponseWriter, _req: Request| async {
                    HandlerResult::Err(Error::shutdown("integrity check failed"))
                },
                &[],
            )
            .into_router();

        let mut handles = Vec::new();
        for _ in 0..32 {
            let router = router.clone();
            handles.push(tokio::spawn(async move {
                router.oneshot(request("/v1/corrupt", None)).await.unwrap().status()
            }));
        }
        for handle in handles {
            assert_eq!(handle.await.unwrap(), StatusCode::INTERNAL_SERVER_ERROR);
        }

        assert!(fx.state.shutdown.is_signalled());
        assert!(!fx.state.shutdown.signal("second"));
        assert_eq!(fx.state.shutdown.reason(), Some("integrity check failed"));
    }

    #[tokio::test]
    async fn slow_requests_time_out_with_408() {
        let router = Router::new()
            .route(
                "/slow",
                get(|| async {
                    tokio::time::sleep(Duration::from_millis(500)).await;
                    "done"
                }),
            )
            .layer(write_timeout_layer(Duration::from_millis(20)));

        let response = router.oneshot(request("/slow", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
    }

    #[tokio::test]
    async fn debug_routes() {
        let fx = fixture();
        let router = debug_mux(fx.state.clone());

        let response = router
            .clone()
            .oneshot(request("/debug/readiness", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({"status": "ok"}));

        let response = router
            .clone()
            .oneshot(request("/debug/liveness", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["build"], "test");

        fx.state.metrics.add_request();
        let response = router.oneshot(request("/debug/vars", None)).await.unwrap();
        assert_eq!(body_json(response).await["requests"], 1);
    }

    #[tokio::test]
    async fn openapi_lists_routes() {
        let doc = serde_json::to_value(ApiDoc::openapi()).unwrap();
        for path in ["/v1/test", "/v1/testauth", "/v1/users/token", "/v1/users/{id}", "/v1/users"] {
            assert!(doc["paths"].get(path).is_some(), "{path}");
        }
    }
}
