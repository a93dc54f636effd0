use std::{
    net::{IpAddr, Ipv4Addr, UdpSocket},
    time::Duration,
};

use anyhow::Context;
use reqwest::{Client, Response, StatusCode};
use tracing::{debug, info};

use buttonbox_common::{
    ButtonBoxInfoPayload, ClockStartForm, Endpoints, RemoteConfig, RemoteError,
};

/// Never sent anywhere; connecting a UDP socket only selects the outbound
/// interface.
const UNROUTABLE_PROBE_ADDR: (Ipv4Addr, u16) = (Ipv4Addr::new(10, 254, 254, 254), 1);

pub struct WebClient {
    http: Client,
    endpoints: Endpoints,
    username: String,
    password: String,
    probe_timeout: Duration,
}

impl WebClient {
    pub fn new(
        base_url: &str,
        remote: &RemoteConfig,
        probe_timeout: Duration,
    ) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(remote.request_timeout())
            .build()
            .context("failed to build http client")?;
        Ok(Self {
            http,
            endpoints: Endpoints::new(base_url),
            username: remote.username.clone(),
            password: remote.password.clone(),
            probe_timeout,
        })
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Unauthenticated reachability probe. `Ok` carries a 2xx status.
    pub async fn health_check(&self) -> Result<u16, RemoteError> {
        let response = self
            .http
            .get(&self.endpoints.health_check)
            .timeout(self.probe_timeout)
            .send()
            .await
            .map_err(classify_error)?;
        let status = response.status();
        debug!("health check answered {status}");
        accept_status(status)
    }

    /// Sent once per heat press, with no retry.
    pub async fn notify_start(&self, start_time_ms: i64) -> Result<u16, RemoteError> {
        let response = self
            .http
            .post(&self.endpoints.clock_start)
            .basic_auth(&self.username, Some(&self.password))
            .form(&ClockStartForm {
                start_time: start_time_ms,
            })
            .send()
            .await
            .map_err(classify_error)?;
        accept_status(log_response(&response))
    }

    pub async fn send_diagnostics(&self, ip_address: &str) -> Result<u16, RemoteError> {
        info!("sending diagnostics, ip address: {ip_address}");
        let response = self
            .http
            .post(&self.endpoints.button_box_info)
            .basic_auth(&self.username, Some(&self.password))
            .json(&ButtonBoxInfoPayload::new(ip_address))
            .send()
            .await
            .map_err(classify_error)?;
        accept_status(log_response(&response))
    }
}

/// Best-effort address of the interface that would carry outbound traffic,
/// falling back to loopback.
pub fn local_ip() -> IpAddr {
    probe_local_ip().unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST))
}

fn probe_local_ip() -> std::io::Result<IpAddr> {
    let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))?;
    socket.connect(UNROUTABLE_PROBE_ADDR)?;
    Ok(socket.local_addr()?.ip())
}

fn log_response(response: &Response) -> StatusCode {
    let status = response.status();
    info!(
        "website response code: {} reason: {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or("unknown")
    );
    status
}

fn accept_status(status: StatusCode) -> Result<u16, RemoteError> {
    if status.is_success() {
        Ok(status.as_u16())
    } else {
        Err(RemoteError::Rejected {
            status: status.as_u16(),
        })
    }
}

fn classify_error(err: reqwest::Error) -> RemoteError {
    if err.is_timeout() {
        RemoteError::Timeout
    } else {
        RemoteError::Transport(err.to_string())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    };

    use axum::{
        extract::State,
        http::{header::AUTHORIZATION, HeaderMap, StatusCode},
        routing::{get, post},
        Form, Json, Router,
    };
    use pretty_assertions::assert_eq;
    use tokio::net::TcpListener;

    use super::*;

    /// What the fake scoring service saw, in arrival order.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub(crate) enum Seen {
        ClockStart {
            auth: Option<String>,
            start_time: i64,
        },
        ButtonBoxInfo {
            auth: Option<String>,
            ip_address: String,
        },
    }

    #[derive(Clone)]
    pub(crate) struct FakeSite {
        pub(crate) seen: Arc<Mutex<Vec<Seen>>>,
        pub(crate) health_status: StatusCode,
        pub(crate) health_delay: Duration,
        pub(crate) health_checks: Arc<AtomicUsize>,
    }

    impl FakeSite {
        pub(crate) fn healthy() -> Self {
            Self {
                seen: Arc::default(),
                health_status: StatusCode::OK,
                health_delay: Duration::ZERO,
                health_checks: Arc::default(),
            }
        }

        pub(crate) fn health_checks(&self) -> usize {
            self.health_checks.load(Ordering::SeqCst)
        }

        pub(crate) fn seen(&self) -> Vec<Seen> {
            self.seen.lock().unwrap().clone()
        }

        pub(crate) async fn serve(self) -> String {
            let router = Router::new()
                .route("/health_check", get(health_check))
                .route("/clock_start", post(clock_start))
                .route("/button_box_info", post(button_box_info))
                .with_state(self);
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });
            format!("http://{addr}")
        }
    }

    fn auth(headers: &HeaderMap) -> Option<String> {
        headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    }

    async fn health_check(State(site): State<FakeSite>) -> StatusCode {
        site.health_checks.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(site.health_delay).await;
        site.health_status
    }

    async fn clock_start(
        State(site): State<FakeSite>,
        headers: HeaderMap,
        Form(form): Form<ClockStartForm>,
    ) -> StatusCode {
        site.seen.lock().unwrap().push(Seen::ClockStart {
            auth: auth(&headers),
            start_time: form.start_time,
        });
        StatusCode::CREATED
    }

    async fn button_box_info(
        State(site): State<FakeSite>,
        headers: HeaderMap,
        Json(payload): Json<ButtonBoxInfoPayload>,
    ) -> StatusCode {
        site.seen.lock().unwrap().push(Seen::ButtonBoxInfo {
            auth: auth(&headers),
            ip_address: payload.button_box_info.ip_address,
        });
        StatusCode::OK
    }

    pub(crate) const BASIC_AUTH: &str = "Basic Ym94dXNlcjpzZWNyZXQ=";

    pub(crate) fn client(base_url: &str, probe_timeout: Duration) -> WebClient {
        let remote = RemoteConfig {
            username: "boxuser".into(),
            password: "secret".into(),
            request_timeout_secs: 2,
            ..RemoteConfig::default()
        };
        WebClient::new(base_url, &remote, probe_timeout).unwrap()
    }

    #[tokio::test]
    async fn clock_start_posts_form_with_basic_auth() {
        let site = FakeSite::healthy();
        let base = site.clone().serve().await;

        let status = client(&base, Duration::from_secs(1))
            .notify_start(1_760_000_000_123)
            .await;

        assert_eq!(status, Ok(201));
        assert_eq!(
            site.seen(),
            vec![Seen::ClockStart {
                auth: Some(BASIC_AUTH.into()),
                start_time: 1_760_000_000_123,
            }]
        );
    }

    #[tokio::test]
    async fn diagnostics_post_nested_json() {
        let site = FakeSite::healthy();
        let base = site.clone().serve().await;

        let status = client(&base, Duration::from_secs(1))
            .send_diagnostics("192.168.4.20")
            .await;

        assert_eq!(status, Ok(200));
        assert_eq!(
            site.seen(),
            vec![Seen::ButtonBoxInfo {
                auth: Some(BASIC_AUTH.into()),
                ip_address: "192.168.4.20".into(),
            }]
        );
    }

    #[tokio::test]
    async fn health_check_maps_outcomes() {
        let healthy = FakeSite::healthy().serve().await;
        assert_eq!(
            client(&healthy, Duration::from_secs(1)).health_check().await,
            Ok(200)
        );

        let down = FakeSite {
            health_status: StatusCode::SERVICE_UNAVAILABLE,
            ..FakeSite::healthy()
        }
        .serve()
        .await;
        assert_eq!(
            client(&down, Duration::from_secs(1)).health_check().await,
            Err(RemoteError::Rejected { status: 503 })
        );

        let slow = FakeSite {
            health_delay: Duration::from_secs(2),
            ..FakeSite::healthy()
        }
        .serve()
        .await;
        assert_eq!(
            client(&slow, Duration::from_millis(100))
                .health_check()
                .await,
            Err(RemoteError::Timeout)
        );
    }

    #[tokio::test]
    async fn refused_connection_is_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let result = client(&format!("http://{addr}"), Duration::from_secs(1))
            .health_check()
            .await;

        assert!(matches!(result, Err(RemoteError::Transport(_))));
    }

    #[test]
    fn local_ip_never_fails() {
        let ip = local_ip();
        assert!(!ip.is_unspecified());
    }
}
