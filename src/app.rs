use std::{net::SocketAddr, time::Duration};

use axum::{
    body::Body,
    http::{Request, Response},
    routing::get,
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{field, Span};

use crate::state::AppState;
use crate::{artworks, auth, users};

async fn health() -> &'static str {
    "ok"
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .merge(auth::router())
        .merge(users::router())
        .merge(artworks::router())
}

pub fn build_app(state: AppState) -> Router {
    let trace = TraceLayer::new_for_http()
        .make_span_with(|req: &Request<Body>| {
            tracing::info_span!(
                "request",
                method = %req.method(),
                path = %req.uri().path(),
                status = field::Empty
            )
        })
        .on_response(|res: &Response<Body>, latency: Duration, span: &Span| {
            let status = res.status();
            span.record("status", status.as_u16());
            let latency_ms = latency.as_millis() as u64;
            if status.is_server_error() {
                tracing::error!(%status, latency_ms, "response");
            } else if status.is_client_error() {
                tracing::warn!(%status, latency_ms, "response");
            } else {
                tracing::info!(%status, latency_ms, "response");
            }
        });

    Router::new()
        .nest("/api/v1", api_routes())
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(trace)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "ctrl-c handler failed");
    }
    tracing::info!("shutting down");
}

pub async fn serve(app: Router) -> anyhow::Result<()> {
    let host = std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = match std::env::var("APP_PORT") {
        Ok(v) => v.parse()?,
        Err(_) => 8080,
    };
    let addr = SocketAddr::new(host.parse()?, port);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "artmarket listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::JwtKeys;
    use crate::memstore::tests::seed_user;
    use crate::users::repo::UserRepo;
    use axum::{
        body::{to_bytes, Body},
        extract::FromRef,
        http::{header, Method, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn call(
        app: &Router,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(t) = token {
            req = req.header(header::AUTHORIZATION, format!("Bearer {t}"));
        }
        let req = match body {
            Some(b) => req
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(b.to_string())),
            None => req.body(Body::empty()),
        }
        .unwrap();

        let res = app.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
        (status, value)
    }

    fn token_for(state: &AppState, username: &str) -> String {
        JwtKeys::from_ref(state).sign_access(username).unwrap()
    }

    #[tokio::test]
    async fn health_is_open() {
        let app = build_app(AppState::fake());
        let (status, body) = call(&app, Method::GET, "/api/v1/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "ok");
    }

    #[tokio::test]
    async fn register_hides_password_and_login_issues_tokens() {
        let (state, store) = AppState::fake_with_store();
        let app = build_app(state);

        let (status, body) = call(
            &app,
            Method::POST,
            "/api/v1/users",
            None,
            Some(json!({"username": "amy", "email": "a@x.com", "password": "pw", "is_artist": true})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["username"], "amy");
        assert_eq!(body["is_artist"], true);
        assert!(body.get("password").is_none());
        assert!(body.get("password_hash").is_none());

        let stored = store.find_by_username("amy").await.unwrap().unwrap();
        assert_ne!(stored.password_hash, "pw");

        let (status, body) = call(
            &app,
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({"username": "amy", "password": "pw"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let access = body["access_token"].as_str().unwrap().to_string();
        let refresh = body["refresh_token"].as_str().unwrap().to_string();

        let (status, me) = call(&app, Method::GET, "/api/v1/me", Some(&access), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(me["id"], stored.id);

        // a refresh token is not accepted as an access token
        let (status, _) = call(&app, Method::GET, "/api/v1/me", Some(&refresh), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, body) = call(
            &app,
            Method::POST,
            "/api/v1/auth/refresh",
            None,
            Some(json!({"refresh_token": refresh})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"]["username"], "amy");
    }

    #[tokio::test]
    async fn wrong_password_is_unauthorized() {
        let (state, _store) = AppState::fake_with_store();
        let app = build_app(state);
        call(
            &app,
            Method::POST,
            "/api/v1/users",
            None,
            Some(json!({"username": "amy", "email": "a@x.com", "password": "pw"})),
        )
        .await;

        let (status, _) = call(
            &app,
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({"username": "amy", "password": "pX"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn privileged_registration_is_forbidden_with_or_without_token() {
        let (state, store) = AppState::fake_with_store();
        seed_user(&store, "amy", false).await;
        let token = token_for(&state, "amy");
        let app = build_app(state);

        for auth in [None, Some(token.as_str())] {
            let (status, body) = call(
                &app,
                Method::POST,
                "/api/v1/users",
                auth,
                Some(json!({"username": "eve", "email": "e@x.com", "password": "pw", "is_staff": true})),
            )
            .await;
            assert_eq!(status, StatusCode::FORBIDDEN);
            assert_eq!(body, "Forbidden");
        }
        assert!(store.find_by_username("eve").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn foreign_staff_flag_update_is_forbidden() {
        let (state, store) = AppState::fake_with_store();
        let amy = seed_user(&store, "amy", false).await;
        let bob = seed_user(&store, "bob", false).await;
        assert_eq!((amy.id, bob.id), (1, 2));
        let token = token_for(&state, "amy");
        let app = build_app(state);

        let (status, _) = call(
            &app,
            Method::PUT,
            "/api/v1/users/2",
            Some(&token),
            Some(json!({"is_staff": true})),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let after = store.find_by_id(bob.id).await.unwrap().unwrap();
        assert_eq!(after, bob);
    }

    #[tokio::test]
    async fn artwork_owner_comes_from_the_token() {
        let (state, store) = AppState::fake_with_store();
        seed_user(&store, "amy", false).await;
        let token = token_for(&state, "amy");
        let app = build_app(state);

        let (status, body) = call(
            &app,
            Method::POST,
            "/api/v1/artworks",
            Some(&token),
            Some(json!({"owner": 99, "name": "X"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["owner"], 1);
        assert_eq!(body["name"], "X");
    }

    #[tokio::test]
    async fn stranger_artwork_delete_is_forbidden() {
        let (state, store) = AppState::fake_with_store();
        seed_user(&store, "amy", false).await;
        seed_user(&store, "bob", false).await;
        let amy_token = token_for(&state, "amy");
        let bob_token = token_for(&state, "bob");
        let app = build_app(state);

        let (_, art) = call(
            &app,
            Method::POST,
            "/api/v1/artworks",
            Some(&amy_token),
            Some(json!({"name": "X", "type": "print", "public": true})),
        )
        .await;
        let uri = format!("/api/v1/artworks/{}", art["id"]);

        let (status, _) = call(&app, Method::DELETE, &uri, Some(&bob_token), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = call(&app, Method::GET, &uri, Some(&amy_token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["type"], "print");
    }

    #[tokio::test]
    async fn malformed_bodies_are_bad_requests() {
        let (state, store) = AppState::fake_with_store();
        seed_user(&store, "amy", false).await;
        let token = token_for(&state, "amy");
        let app = build_app(state);

        let (status, body) = call(
            &app,
            Method::POST,
            "/api/v1/users",
            None,
            Some(json!({"username": "bob", "email": "b@x.com"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.as_str().unwrap().contains("password"));
        assert!(store.find_by_username("bob").await.unwrap().is_none());

        let (status, _) = call(
            &app,
            Method::POST,
            "/api/v1/artworks",
            Some(&token),
            Some(json!({"type": "print"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = call(
            &app,
            Method::PUT,
            "/api/v1/users/1",
            Some(&token),
            Some(json!({"is_staff": "yes"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = call(
            &app,
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({"username": "amy"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = call(&app, Method::GET, "/api/v1/artworks?owner=abc", Some(&token), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn hidden_artwork_is_absent_to_strangers_on_every_verb() {
        let (state, store) = AppState::fake_with_store();
        seed_user(&store, "amy", false).await;
        seed_user(&store, "bob", false).await;
        let amy_token = token_for(&state, "amy");
        let bob_token = token_for(&state, "bob");
        let app = build_app(state);

        let (_, art) = call(
            &app,
            Method::POST,
            "/api/v1/artworks",
            Some(&amy_token),
            Some(json!({"name": "X", "public": false})),
        )
        .await;
        let uri = format!("/api/v1/artworks/{}", art["id"]);

        let (status, _) = call(&app, Method::GET, &uri, Some(&bob_token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = call(&app, Method::PUT, &uri, Some(&bob_token), Some(json!({"name": "Y"}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = call(&app, Method::DELETE, &uri, Some(&bob_token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, me) = call(&app, Method::GET, "/api/v1/me", Some(&amy_token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(me["artworks"][0]["name"], "X");
    }

    #[tokio::test]
    async fn transport_rejections() {
        let (state, store) = AppState::fake_with_store();
        seed_user(&store, "amy", false).await;
        let token = token_for(&state, "amy");
        let ghost = token_for(&state, "ghost");
        let app = build_app(state);

        let (status, _) = call(&app, Method::GET, "/api/v1/users", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = call(&app, Method::GET, "/api/v1/users", Some(&ghost), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, body) = call(&app, Method::GET, "/api/v1/users/abc", Some(&token), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, "Invalid ID: must be numerical");

        let (status, _) = call(&app, Method::GET, "/api/v1/users/42", Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
