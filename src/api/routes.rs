use crate::api::api_error::APIError;
use crate::api::model::{valid_hostname, AvailabilityResult, RegistrationResult, UpdateResult};
use crate::api::server::AppState;
use crate::config::Config;
use crate::error::Error;
use crate::host_store::Host;
use axum::extract::{ConnectInfo, Path, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use axum_extra::extract::WithRejection;
use serde_json::json;
use std::net::{IpAddr, SocketAddr};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

const FORWARDED_FOR: &str = "x-forwarded-for";

pub(super) fn new(state: AppState) -> Router {
    Router::new()
        .route("/healthcheck", get(health_check))
        .route("/available/:hostname", get(available))
        .route("/new/:hostname", get(register))
        .route("/update/:hostname/:token", get(update))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(state.config.api_timeout))
        .with_state(state)
}

#[allow(clippy::unused_async)]
async fn health_check() -> impl IntoResponse {
    Json(json!({"ok":"healthy"}))
}

async fn available(
    State(state): State<AppState>,
    WithRejection(Path(hostname), _): WithRejection<Path<String>, APIError>,
) -> Result<Json<AvailabilityResult>, APIError> {
    let available = match valid_hostname(&hostname) {
        Ok(hostname) => !state.hosts.read().await.host_exists(&hostname).await?,
        Err(_) => false,
    };
    Ok(Json(AvailabilityResult { available }))
}

async fn register(
    State(state): State<AppState>,
    WithRejection(Path(hostname), _): WithRejection<Path<String>, APIError>,
) -> Result<Json<RegistrationResult>, APIError> {
    let hostname = valid_hostname(&hostname)?;

    // Hold the write lock across the check and the insert so concurrent registrations of the
    // same name can't both succeed.
    let mut hosts = state.hosts.write().await;
    if hosts.host_exists(&hostname).await? {
        tracing::debug!("rejected registration of taken hostname \"{hostname}\"");
        return Err(Error::HostAlreadyRegistered(hostname).into());
    }

    let host = Host::register(&hostname);
    hosts.set_host(host.clone()).await?;
    tracing::info!("registered \"{hostname}\"");

    Ok(Json(RegistrationResult {
        update_link: format!("/update/{}/{}", host.hostname, host.token),
        hostname: host.hostname,
        token: host.token,
    }))
}

async fn update(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    WithRejection(Path((hostname, token)), _): WithRejection<Path<(String, String)>, APIError>,
) -> Result<Json<UpdateResult>, APIError> {
    let hostname = valid_hostname(&hostname)?;

    let mut hosts = state.hosts.write().await;
    let mut host = hosts.get_host(&hostname).await?;
    if host.token != token {
        tracing::debug!("rejected update from {peer} for \"{hostname}\": wrong token");
        return Err(Error::TokenMismatch(hostname).into());
    }

    let client_ip = client_ip(&state.config, peer.ip(), &headers)?;
    host.ip = client_ip.to_string();
    hosts.set_host(host).await?;
    tracing::info!("updated \"{hostname}\" to {client_ip}");

    Ok(Json(UpdateResult {
        current_ip: client_ip.to_string(),
        status: "Successfully updated".to_string(),
    }))
}

/// The address of the client: the first `X-Forwarded-For` entry when the peer is a trusted
/// proxy, the peer itself otherwise. IPv4-mapped IPv6 addresses are reported as IPv4.
fn client_ip(config: &Config, peer: IpAddr, headers: &HeaderMap) -> Result<IpAddr, Error> {
    let ip = match headers.get(FORWARDED_FOR) {
        Some(forwarded) if config.is_trusted_proxy(peer) => {
            let forwarded = forwarded
                .to_str()
                .map_err(|_| Error::InvalidRemoteAddr(format!("{forwarded:?}")))?;
            let first = forwarded.split(',').next().unwrap_or_default().trim();
            first
                .parse::<IpAddr>()
                .map_err(|_| Error::InvalidRemoteAddr(first.to_string()))?
        }
        _ => peer,
    };
    Ok(match ip {
        IpAddr::V6(v6) => v6.to_ipv4_mapped().map_or(ip, IpAddr::V4),
        IpAddr::V4(_) => ip,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host_store::{DynHostStore, InMemoryHostStore};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::RwLock;
    use tower::ServiceExt;

    fn state() -> AppState {
        let mut config = Config::new("example.org", "dns.example.org").unwrap();
        config.trusted_proxies = vec!["10.0.0.0/8".parse().unwrap()];
        let hosts: DynHostStore = Arc::new(RwLock::new(InMemoryHostStore::new(
            Duration::from_secs(3600),
        )));
        AppState {
            config: Arc::new(config),
            hosts,
        }
    }

    async fn call(
        state: &AppState,
        uri: &str,
        peer: &str,
        forwarded: Option<&str>,
    ) -> (StatusCode, Value) {
        let peer: SocketAddr = peer.parse().unwrap();
        let mut request = Request::builder().uri(uri).extension(ConnectInfo(peer));
        if let Some(forwarded) = forwarded {
            request = request.header(FORWARDED_FOR, forwarded);
        }
        let response = new(state.clone())
            .oneshot(request.body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = hyper::body::to_bytes(response.into_body()).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn health_check_is_healthy() {
        let (status, body) = call(&state(), "/healthcheck", "127.0.0.1:1234", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"ok": "healthy"}));
    }

    #[tokio::test]
    async fn register_then_update() {
        let state = state();

        let (status, body) = call(&state, "/available/Pi", "127.0.0.1:1234", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"available": true}));

        let (status, body) = call(&state, "/new/Pi", "127.0.0.1:1234", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["hostname"], "pi");
        let token = body["token"].as_str().unwrap().to_string();
        assert_eq!(body["update_link"], format!("/update/pi/{token}"));
        let stored = state.hosts.read().await.get_host("pi").await.unwrap();
        assert_eq!(stored.ip, "127.0.0.1");
        assert_eq!(stored.token, token);

        let (_, body) = call(&state, "/available/pi", "127.0.0.1:1234", None).await;
        assert_eq!(body, json!({"available": false}));

        let (status, body) = call(
            &state,
            &format!("/update/pi/{token}"),
            "[2001:db8::7]:4321",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["current_ip"], "2001:db8::7");
        let stored = state.hosts.read().await.get_host("pi").await.unwrap();
        assert_eq!(stored.ip, "2001:db8::7");
        assert_eq!(stored.token, token);
    }

    #[tokio::test]
    async fn duplicate_registration_is_forbidden() {
        let state = state();
        let (status, _) = call(&state, "/new/www", "127.0.0.1:1234", None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, body) = call(&state, "/new/WWW", "127.0.0.1:1234", None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert!(body["error"].as_str().unwrap().contains("www"));
    }

    #[tokio::test]
    async fn invalid_hostnames() {
        let state = state();
        let (status, body) = call(&state, "/available/-bad", "127.0.0.1:1234", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"available": false}));

        let (status, _) = call(&state, "/new/bad_name", "127.0.0.1:1234", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = call(&state, "/update/bad_name/token", "127.0.0.1:1234", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn update_requires_registration_and_token() {
        let state = state();
        let (status, _) = call(&state, "/update/ghost/token", "127.0.0.1:1234", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        call(&state, "/new/www", "127.0.0.1:1234", None).await;
        let (status, _) = call(&state, "/update/www/wrong", "192.0.2.1:1234", None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let stored = state.hosts.read().await.get_host("www").await.unwrap();
        assert_eq!(stored.ip, "127.0.0.1");
    }

    #[tokio::test]
    async fn forwarded_for_only_from_trusted_proxies() {
        let state = state();
        let (_, body) = call(&state, "/new/www", "127.0.0.1:1234", None).await;
        let update = format!("/update/www/{}", body["token"].as_str().unwrap());

        let forwarded = Some("198.51.100.7, 10.1.1.1");
        let (_, body) = call(&state, &update, "10.1.1.1:1234", forwarded).await;
        assert_eq!(body["current_ip"], "198.51.100.7");

        let (_, body) = call(&state, &update, "192.0.2.1:1234", Some("198.51.100.8")).await;
        assert_eq!(body["current_ip"], "192.0.2.1");

        let (status, _) = call(&state, &update, "10.1.1.1:1234", Some("unknown")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn mapped_addresses_are_ipv4() {
        let config = Config::new("example.org", "dns.example.org").unwrap();
        let peer = "::ffff:192.0.2.1".parse().unwrap();
        let ip = client_ip(&config, peer, &HeaderMap::new()).unwrap();
        assert_eq!(ip, "192.0.2.1".parse::<IpAddr>().unwrap());
    }
}
