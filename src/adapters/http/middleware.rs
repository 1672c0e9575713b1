//! Cross-cutting HTTP layers.

use axum::http::{HeaderValue, Method};
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::{FeatureFlags, ServerConfig};

/// Wraps the router with timeout, CORS, tracing and request-id layers.
///
/// Requests get an `x-request-id` (generated when absent) that is echoed on
/// the response.
pub fn with_middleware(router: Router, server: &ServerConfig, features: &FeatureFlags) -> Router {
    let mut router = router
        .layer(TimeoutLayer::new(server.request_timeout()))
        .layer(cors_layer(server));

    if features.enable_tracing {
        router = router.layer(TraceLayer::new_for_http());
    }

    router
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

/// Any origin when none are configured, otherwise only the listed ones.
fn cors_layer(server: &ServerConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = server
        .cors_origins_list()
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    if origins.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(AllowOrigin::list(origins))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::routing::get;
    use tower::ServiceExt;

    fn app(features: &FeatureFlags) -> Router {
        let router = Router::new().route("/ping", get(|| async { "pong" }));
        with_middleware(router, &ServerConfig::default(), features)
    }

    #[tokio::test]
    async fn responses_carry_request_id() {
        let response = app(&FeatureFlags::default())
            .oneshot(Request::get("/ping").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn incoming_request_id_is_kept() {
        let response = app(&FeatureFlags::default())
            .oneshot(
                Request::get("/ping")
                    .header("x-request-id", "req-42")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.headers()["x-request-id"], "req-42");
    }

    #[tokio::test]
    async fn tracing_can_be_disabled() {
        let features = FeatureFlags {
            enable_tracing: false,
            ..Default::default()
        };
        let response = app(&features)
            .oneshot(Request::get("/ping").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn invalid_origins_are_skipped() {
        let server = ServerConfig {
            cors_origins: Some("http://localhost:5173,\u{7f}bad".to_string()),
            ..Default::default()
        };
        let _ = cors_layer(&server);
    }
}
