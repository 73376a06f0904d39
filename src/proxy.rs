//! Credential-hiding passthrough: forwards browser requests to the remote
//! base URL, injecting the service credential so it never reaches clients.

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use axum::{Json, Router};
use serde_json::json;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{debug, warn};

/// Path prefix the passthrough is mounted under; everything after it is the
/// upstream path.
pub const MOUNT_PREFIX: &str = "/api/remote";

const NOT_CONFIGURED_BODY: &str = "remote proxy is not configured";

/// Upstream settings. Either field missing means the proxy answers every
/// request with a fixed configuration error instead of forwarding.
#[derive(Debug, Clone, Default)]
pub struct ProxyConfig {
    pub upstream_url: Option<String>,
    pub service_key: Option<String>,
}

impl ProxyConfig {
    fn resolved(&self) -> Option<(String, String)> {
        let url = self.upstream_url.as_deref()?.trim().trim_end_matches('/');
        let key = self.service_key.as_deref()?.trim();
        (!url.is_empty() && !key.is_empty()).then(|| (url.to_string(), key.to_string()))
    }
}

#[derive(Clone)]
struct ProxyState {
    config: ProxyConfig,
    client: reqwest::Client,
}

/// Build the passthrough router.
///
/// CORS is permissive by design: the reflected request origin, the common
/// verbs, a fixed request-header set, and credentials. Preflight requests
/// are answered with just these headers and never forwarded.
pub fn router(config: ProxyConfig) -> Router {
    let state = ProxyState {
        config,
        client: reqwest::Client::new(),
    };
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods(vec![
            Method::GET,
            Method::HEAD,
            Method::PUT,
            Method::PATCH,
            Method::POST,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(vec![
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            HeaderName::from_static("apikey"),
            HeaderName::from_static("prefer"),
        ])
        .allow_credentials(true);

    Router::new()
        .route(MOUNT_PREFIX, any(forward))
        .route(&format!("{MOUNT_PREFIX}/*path"), any(forward))
        .layer(cors)
        .with_state(state)
}

async fn forward(
    State(state): State<ProxyState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let Some((upstream_base, service_key)) = state.config.resolved() else {
        return (StatusCode::INTERNAL_SERVER_ERROR, NOT_CONFIGURED_BODY).into_response();
    };

    let suffix = uri.path().strip_prefix(MOUNT_PREFIX).unwrap_or_default();
    let mut target = format!("{upstream_base}{suffix}");
    if let Some(query) = uri.query() {
        target.push('?');
        target.push_str(query);
    }
    debug!("forwarding {} {} -> {}", method, uri.path(), target);

    let outbound = outbound_headers(&headers, &upstream_base, &service_key);
    let upstream_method = reqwest::Method::from_bytes(method.as_str().as_bytes())
        .unwrap_or(reqwest::Method::GET);
    let mut request = state
        .client
        .request(upstream_method, &target)
        .headers(outbound);
    if method != Method::GET && method != Method::HEAD {
        request = request.body(body.to_vec());
    }

    let upstream = match request.send().await {
        Ok(response) => response,
        Err(err) => {
            warn!("upstream request failed: {}", err);
            return (
                StatusCode::BAD_GATEWAY,
                Json(json!({ "error": err.to_string() })),
            )
                .into_response();
        }
    };

    mirror_response(upstream).await
}

/// Copy the inbound headers for the upstream call: drop `host`, inject the
/// service credential, add a default bearer only when the client sent no
/// authorization of its own, and rewrite `origin` to the upstream's.
fn outbound_headers(
    inbound: &HeaderMap,
    upstream_base: &str,
    service_key: &str,
) -> reqwest::header::HeaderMap {
    let mut outbound = reqwest::header::HeaderMap::new();
    for (name, value) in inbound {
        if name == header::HOST {
            continue;
        }
        let Ok(name) = reqwest::header::HeaderName::from_bytes(name.as_str().as_bytes()) else {
            continue;
        };
        let Ok(value) = reqwest::header::HeaderValue::from_bytes(value.as_bytes()) else {
            continue;
        };
        outbound.append(name, value);
    }
    if let Ok(value) = reqwest::header::HeaderValue::from_str(service_key) {
        outbound.insert("apikey", value);
    }
    if !outbound.contains_key(reqwest::header::AUTHORIZATION) {
        if let Ok(value) =
            reqwest::header::HeaderValue::from_str(&format!("Bearer {service_key}"))
        {
            outbound.insert(reqwest::header::AUTHORIZATION, value);
        }
    }
    if let Some(origin) = origin_of(upstream_base) {
        if let Ok(value) = reqwest::header::HeaderValue::from_str(&origin) {
            outbound.insert(reqwest::header::ORIGIN, value);
        }
    }
    outbound
}

/// Rebuild the upstream response (status, headers, body) as our own,
/// leaving out framing headers that no longer apply.
async fn mirror_response(upstream: reqwest::Response) -> Response {
    let status = StatusCode::from_u16(upstream.status().as_u16())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut headers = HeaderMap::new();
    for (name, value) in upstream.headers() {
        if matches!(
            name.as_str(),
            "transfer-encoding" | "connection" | "content-length"
        ) {
            continue;
        }
        let Ok(name) = HeaderName::from_bytes(name.as_str().as_bytes()) else {
            continue;
        };
        let Ok(value) = HeaderValue::from_bytes(value.as_bytes()) else {
            continue;
        };
        headers.append(name, value);
    }

    let body = match upstream.bytes().await {
        Ok(bytes) => bytes,
        Err(err) => {
            warn!("failed to read upstream body: {}", err);
            return (
                StatusCode::BAD_GATEWAY,
                Json(json!({ "error": err.to_string() })),
            )
                .into_response();
        }
    };

    let mut response = Response::new(Body::from(body.to_vec()));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}

fn origin_of(base: &str) -> Option<String> {
    let scheme_end = base.find("://")? + 3;
    let host_end = base[scheme_end..]
        .find('/')
        .map(|offset| scheme_end + offset)
        .unwrap_or(base.len());
    Some(base[..host_end].to_string())
}
