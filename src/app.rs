use std::{net::SocketAddr, sync::Arc};

use axum::{middleware, routing::get, Router};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::{
    auth::{
        self,
        guard::{authorize, GuardState, RoutePolicy},
        RouteRule,
    },
    boards, schools,
    state::AppState,
    users,
};

/// Every guarded route with the roles it admits.
pub fn policies() -> Vec<RouteRule> {
    let mut rules = auth::policies();
    rules.extend(boards::policies());
    rules.extend(schools::policies());
    rules.extend(users::policies());
    rules
}

pub fn build_app(state: AppState) -> Router {
    let guard = GuardState {
        auth: state.auth.clone(),
        policy: Arc::new(RoutePolicy::from_rules(policies())),
    };

    let protected = Router::new()
        .merge(auth::protected_router())
        .merge(boards::router())
        .merge(schools::router())
        .merge(users::router())
        .route_layer(middleware::from_fn_with_state(guard, authorize));

    let public = Router::new()
        .merge(auth::public_router())
        .route("/health", get(|| async { "ok" }))
        .nest_service("/uploads", ServeDir::new(&state.config.upload_dir));

    Router::new()
        .merge(public)
        .merge(protected)
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!(
                        "http_request",
                        %method,
                        uri = %uri,
                        status = tracing::field::Empty
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     _latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        if status.is_server_error() {
                            tracing::error!(%status, "response");
                        } else {
                            tracing::info!(%status, "response");
                        }
                    },
                ),
        )
}

pub async fn serve(app: Router, host: &str, port: u16) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{
        claims::{Principal, Role},
        repo::memory::MemoryCredentialStore,
    };
    use axum::{
        body::Body,
        http::{header, Method, Request, StatusCode},
        response::Response,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn state() -> AppState {
        AppState::fake(
            MemoryCredentialStore::default()
                .with_user(1, "a@x.com", "secret1", Role::Admin, 1, 0)
                .with_user(2, "off@x.com", "secret1", Role::Teacher, 0, 0),
        )
    }

    fn token(state: &AppState, role: Role) -> String {
        state
            .auth
            .keys()
            .sign(&Principal {
                id: 9,
                name: "tester".into(),
                role,
            })
            .unwrap()
    }

    fn request(method: Method, uri: &str, bearer: Option<&str>, body: Option<Value>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(t) = bearer {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", t));
        }
        match body {
            Some(v) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(v.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn body_json(res: Response) -> Value {
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_is_public() {
        let res = build_app(state())
            .oneshot(request(Method::GET, "/health", None, None))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn missing_token_is_unauthorized() {
        let res = build_app(state())
            .oneshot(request(Method::GET, "/api/board/all", None, None))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        let body = body_json(res).await;
        assert_eq!(body["statusCode"], 401);
        assert_eq!(body["error"], "Unauthorized");
    }

    #[tokio::test]
    async fn garbage_token_is_unauthorized() {
        let res = build_app(state())
            .oneshot(request(Method::GET, "/api/board/all", Some("not.a.jwt"), None))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn teacher_cannot_list_boards() {
        let st = state();
        let t = token(&st, Role::Teacher);
        let res = build_app(st)
            .oneshot(request(Method::GET, "/api/board/all", Some(&t), None))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
        assert_eq!(body_json(res).await["message"], "Access denied");
    }

    #[tokio::test]
    async fn logout_admits_admin_and_end_user_only() {
        for (role, expected) in [
            (Role::Admin, StatusCode::OK),
            (Role::EndUser, StatusCode::OK),
            (Role::Teacher, StatusCode::FORBIDDEN),
        ] {
            let st = state();
            let t = token(&st, role);
            let res = build_app(st)
                .oneshot(request(Method::POST, "/api/auth/logout", Some(&t), None))
                .await
                .unwrap();
            assert_eq!(res.status(), expected, "{:?}", role);
            if expected == StatusCode::OK {
                let body = body_json(res).await;
                assert_eq!(body["message"], "User logout successfully");
                assert!(body["data"].is_null());
            }
        }
    }

    #[tokio::test]
    async fn login_issues_token_that_opens_protected_routes() {
        let st = state();
        let app = build_app(st);
        let res = app
            .clone()
            .oneshot(request(
                Method::POST,
                "/api/auth/login",
                None,
                Some(json!({"email": "A@X.com", "password": "secret1"})),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body = body_json(res).await;
        assert_eq!(body["message"], "User login successfully");
        let t = body["data"]["token"].as_str().unwrap().to_string();
        assert!(!t.is_empty());

        let res = app
            .oneshot(request(Method::POST, "/api/auth/logout", Some(&t), None))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn login_failures_keep_their_messages() {
        for (email, password, message) in [
            ("a@x.com", "wrong-pass", "Password not matched."),
            ("nobody@x.com", "secret1", "Email not found."),
            ("off@x.com", "secret1", "User is inactive or deleted."),
        ] {
            let res = build_app(state())
                .oneshot(request(
                    Method::POST,
                    "/api/auth/login",
                    None,
                    Some(json!({"email": email, "password": password})),
                ))
                .await
                .unwrap();
            assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
            assert_eq!(body_json(res).await["message"], message);
        }
    }

    #[tokio::test]
    async fn malformed_path_id_is_bad_request() {
        let st = state();
        let t = token(&st, Role::Admin);
        let res = build_app(st)
            .oneshot(request(Method::GET, "/api/board/view/abc", Some(&t), None))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unknown_sort_column_is_bad_request() {
        let st = state();
        let t = token(&st, Role::Teacher);
        let res = build_app(st)
            .oneshot(request(Method::GET, "/api/user/all?sort=password", Some(&t), None))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn invalid_board_is_rejected_before_any_query() {
        let st = state();
        let t = token(&st, Role::Admin);
        let res = build_app(st)
            .oneshot(request(
                Method::POST,
                "/api/board/create",
                Some(&t),
                Some(json!({
                    "name": "",
                    "address": "1 Main St",
                    "phone": "555",
                    "email": "nope",
                    "established_year": 1800,
                    "is_active": 3
                })),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body = body_json(res).await;
        assert_eq!(body["message"].as_array().map(|a| a.len()), Some(4));
    }

    fn multipart(content_type: &str) -> (String, Body) {
        let boundary = "X-BOUNDARY";
        let body = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"logo.png\"\r\n\
             Content-Type: {ct}\r\n\r\nPNGDATA\r\n--{b}--\r\n",
            b = boundary,
            ct = content_type
        );
        (format!("multipart/form-data; boundary={}", boundary), Body::from(body))
    }

    #[tokio::test]
    async fn upload_accepts_png_and_returns_public_path() {
        let st = state();
        let t = token(&st, Role::Admin);
        let (ct, body) = multipart("image/png");
        let req = Request::builder()
            .method(Method::POST)
            .uri("/api/school/upload")
            .header(header::AUTHORIZATION, format!("Bearer {}", t))
            .header(header::CONTENT_TYPE, ct)
            .body(body)
            .unwrap();
        let res = build_app(st).oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body = body_json(res).await;
        assert_eq!(body["message"], "School image uploaded successfully.");
        let path = body["data"]["path"].as_str().unwrap();
        assert!(path.starts_with("https://fake.local/uploads/"));
        assert!(path.ends_with("-logo.png"));
    }

    #[tokio::test]
    async fn upload_rejects_other_types() {
        let st = state();
        let t = token(&st, Role::Admin);
        let (ct, body) = multipart("application/pdf");
        let req = Request::builder()
            .method(Method::POST)
            .uri("/api/school/upload")
            .header(header::AUTHORIZATION, format!("Bearer {}", t))
            .header(header::CONTENT_TYPE, ct)
            .body(body)
            .unwrap();
        let res = build_app(st).oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(res).await["message"],
            "Invalid file type. only jpeg, jpg, and png are allowed."
        );
    }

    #[tokio::test]
    async fn route_without_policy_is_forbidden() {
        let st = state();
        let t = token(&st, Role::Admin);
        let guard = GuardState {
            auth: st.auth.clone(),
            policy: Arc::new(RoutePolicy::from_rules(policies())),
        };
        let app: Router = Router::new()
            .route("/api/secret", get(|| async { "hidden" }))
            .route_layer(middleware::from_fn_with_state(guard, authorize));
        let res = app
            .oneshot(request(Method::GET, "/api/secret", Some(&t), None))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn every_rule_is_unique_and_declares_roles() {
        let rules = policies();
        let mut seen = std::collections::HashSet::new();
        for r in &rules {
            assert!(!r.roles.is_empty(), "{} {}", r.method, r.path);
            assert!(seen.insert((r.method.clone(), r.path)), "duplicate {} {}", r.method, r.path);
        }
        assert_eq!(rules.len(), 17);
    }
}
