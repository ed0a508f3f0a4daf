//! Router and handlers.
//!
//! # Responsibilities
//! - Build the Axum router shared by both listeners
//! - Index page: route listing, access URLs, environment dump
//! - Outbound proxy routes against fixed origins
//! - Catch-all 404 with a fixed plaintext body
//!
//! Outbound fetches follow redirects and deliberately carry no timeout or
//! retry, matching the historical behavior of this service.

use std::fmt::Write as _;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::tls::backend::CryptoBackend;

/// Fixed outbound proxy targets: route path, origin, index-page label.
const PROXY_TARGETS: [(&str, &str, &str); 5] = [
    ("/google", "http://google.com", "Google homepage"),
    ("/amazon", "https://amazon.com", "Amazon homepage"),
    ("/walmart", "https://walmart.com", "Walmart homepage"),
    ("/nike", "https://nike.com", "Nike homepage"),
    ("/github", "https://github.com", "GitHub homepage"),
];

/// Immutable state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub client: reqwest::Client,
    pub backend: CryptoBackend,
    pub plain_port: u16,
    pub tls_port: u16,
}

impl AppState {
    pub fn new(backend: CryptoBackend, plain_port: u16, tls_port: u16) -> Self {
        Self {
            client: reqwest::Client::new(),
            backend,
            plain_port,
            tls_port,
        }
    }
}

/// Build the router shared by the plaintext and TLS listeners.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/google", get(proxy_google))
        .route("/amazon", get(proxy_amazon))
        .route("/walmart", get(proxy_walmart))
        .route("/nike", get(proxy_nike))
        .route("/github", get(proxy_github))
        .fallback(not_found)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Index page: greeting, route listing, both access URLs, environment dump.
async fn index(State(state): State<AppState>) -> Html<String> {
    let mut output = String::from("Hello world! Version 3. Now with test-suite! </br></br>");

    output.push_str("Available routes: </br>");
    for (path, _, label) in PROXY_TARGETS {
        let _ = write!(output, "<a href='{path}'>{path}</a> - {label} </br>");
    }
    output.push_str("</br>");

    let _ = write!(
        output,
        "Access URLs: </br>\
         HTTP: <a href='http://localhost:{plain}'>http://localhost:{plain}</a> </br>\
         HTTPS: <a href='https://localhost:{tls}'>https://localhost:{tls}</a> </br></br>",
        plain = state.plain_port,
        tls = state.tls_port,
    );
    let _ = write!(output, "Crypto backend: {} </br></br>", state.backend);

    let env: Vec<(String, String)> = std::env::vars().collect();
    let env_string = serde_json::to_string_pretty(&env)
        .unwrap_or_default()
        .replace('\n', "</br>");
    let _ = write!(output, "Environment: </br> {env_string} </br>");

    Html(output)
}

async fn proxy_google(state: State<AppState>) -> Response {
    fetch_origin(state, PROXY_TARGETS[0].1).await
}

async fn proxy_amazon(state: State<AppState>) -> Response {
    fetch_origin(state, PROXY_TARGETS[1].1).await
}

async fn proxy_walmart(state: State<AppState>) -> Response {
    fetch_origin(state, PROXY_TARGETS[2].1).await
}

async fn proxy_nike(state: State<AppState>) -> Response {
    fetch_origin(state, PROXY_TARGETS[3].1).await
}

async fn proxy_github(state: State<AppState>) -> Response {
    fetch_origin(state, PROXY_TARGETS[4].1).await
}

/// GET the fixed origin and pass its body through.
async fn fetch_origin(State(state): State<AppState>, origin: &'static str) -> Response {
    match state.client.get(origin).send().await {
        Ok(response) => {
            let status = response.status();
            match response.text().await {
                Ok(body) => Html(body).into_response(),
                Err(e) => {
                    tracing::warn!(origin, status = %status, error = %e, "upstream body read failed");
                    (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response()
                }
            }
        }
        Err(e) => {
            tracing::warn!(origin, error = %e, "upstream request failed");
            (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response()
        }
    }
}

/// Catch-all for unmatched paths.
async fn not_found() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "404 - Page not found")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn test_router() -> Router {
        build_router(AppState::new(CryptoBackend::Native, 4567, 4568))
    }

    #[tokio::test]
    async fn test_index_lists_routes_and_backend() {
        let response = test_router()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = String::from_utf8(body.to_vec()).unwrap();
        assert!(body.contains("Hello world!"));
        assert!(body.contains("<a href='/github'>/github</a>"));
        assert!(body.contains("Crypto backend: native"));
        assert!(body.contains("Environment:"));
    }

    #[tokio::test]
    async fn test_unmatched_path_is_plaintext_404() {
        let response = test_router()
            .oneshot(
                Request::builder()
                    .uri("/no-such-page")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response
            .headers()
            .get("content-type")
            .unwrap()
            .to_str()
            .unwrap()
            .starts_with("text/plain"));

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"404 - Page not found");
    }
}
