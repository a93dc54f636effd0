use tracing::{info, warn};

use buttonbox_common::{HealthReport, NetworkHealthMonitor, Reachability};

use crate::{
    dispatch::{BoxCommand, CommandSender},
    web::{local_ip, WebClient},
};

/// Runs one reachability probe and its side effects: the website LED is
/// updated through the dispatcher and, when the site is up, the local
/// address is pushed. `now_ms` is read after the probe completes.
pub async fn poll_health(
    monitor: &mut NetworkHealthMonitor,
    client: &WebClient,
    commands: &CommandSender,
    now_ms: impl Fn() -> u64,
) -> HealthReport {
    info!("connecting... {}", client.endpoints().base_url);
    let probe = client.health_check().await;
    if let Err(err) = &probe {
        warn!("health check failed: {err}");
    }

    let report = monitor.record(Reachability::classify(&probe), now_ms());
    info!(
        "network: {}, website: {}",
        report.reachability.network_label(),
        report.reachability.website_label()
    );

    if commands
        .send(BoxCommand::WebsiteStatus(report.website_good))
        .is_err()
    {
        warn!("heat dispatcher stopped; website status not shown");
    }

    if report.push_diagnostics {
        let ip_address = local_ip().to_string();
        if let Err(err) = client.send_diagnostics(&ip_address).await {
            warn!("diagnostic push failed: {err}");
        }
    }

    report
}
