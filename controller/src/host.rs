use std::{
    fs::OpenOptions,
    future::Future,
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, OnceLock},
    thread,
    time::{Duration, Instant},
};

use anyhow::Context;
use chrono::Utc;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use buttonbox_common::{DeploymentTier, NetworkHealthMonitor, RuntimeConfig};

use crate::{
    dispatch::{self, BoxCommand, CommandSender},
    monitor,
    web::WebClient,
};

#[cfg(feature = "rpi")]
use crate::rpi as board;
#[cfg(not(feature = "rpi"))]
use crate::sim as board;

const DEFAULT_LOG_FILE: &str = "engine_builder_showdown.log";
const DEFAULT_CONFIG_FILE: &str = "button_box.json";

pub async fn run() -> anyhow::Result<()> {
    init_logging()?;

    let tier = DeploymentTier::from_env_value(std::env::var("CLOCK_ENVIRONMENT").ok().as_deref());
    let config_path = std::env::var("BUTTON_BOX_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE));
    let mut config = load_runtime_config(&config_path).await.unwrap_or_else(|err| {
        warn!(
            "failed to load runtime config from {}: {err:#}",
            config_path.display()
        );
        RuntimeConfig::default()
    });
    if let Ok(username) = std::env::var("WEB_APP_USER_NAME") {
        config.remote.username = username;
    }
    if let Ok(password) = std::env::var("WEB_APP_PASSWORD") {
        config.remote.password = password;
    }
    config.validate().context("invalid runtime config")?;

    let base_url = config
        .remote
        .base_url(tier)
        .context("no website configured for this environment")?
        .to_string();
    info!("button box starting in {} against {base_url}", tier.as_str());

    let client = Arc::new(WebClient::new(
        &base_url,
        &config.remote,
        config.health.probe_timeout(),
    )?);

    let (commands, command_rx) = mpsc::unbounded_channel();
    let (notifier, markers) = dispatch::queued_notifier();
    let notifier_task = dispatch::spawn_notifier(client.clone(), markers);

    let (controller, inputs) = board::open(&config, notifier, commands.clone())
        .context("failed to set up button box hardware")?;
    let dispatcher = dispatch::spawn_dispatcher(controller, command_rx)
        .context("failed to start heat dispatcher")?;
    info!("button box ready");

    let mut health = NetworkHealthMonitor::new(config.health);
    let shutdown = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!("failed to listen for ctrl-c: {err}");
        }
    };
    run_health_loop(
        &mut health,
        &client,
        &commands,
        config.health.wait_slice(),
        monotonic_ms,
        shutdown,
    )
    .await;

    info!("shutting down");
    let drain = config.remote.request_timeout() + Duration::from_secs(1);
    shut_down(|| inputs.close(), &commands, dispatcher, notifier_task, drain).await;
    info!("button box stopped");
    Ok(())
}

/// Polls website health whenever `health` says a check is due on `now_ms`,
/// idling one wait slice between wake-ups, until `shutdown` resolves. A
/// check in flight is abandoned on shutdown.
pub(crate) async fn run_health_loop(
    health: &mut NetworkHealthMonitor,
    client: &WebClient,
    commands: &CommandSender,
    wait_slice: Duration,
    now_ms: impl Fn() -> u64,
    shutdown: impl Future<Output = ()>,
) {
    tokio::pin!(shutdown);

    loop {
        let cycle = async {
            if health.is_due(now_ms()) {
                monitor::poll_health(&mut *health, client, commands, &now_ms).await;
            }
            tokio::time::sleep(wait_slice).await;
        };
        tokio::select! {
            _ = &mut shutdown => break,
            _ = cycle => {}
        }
    }
}

/// Stops input first so nothing new is queued, lets the dispatcher finish
/// its queue and release the relays, then drops the hardware and drains the
/// notifications still waiting to be posted.
pub(crate) async fn shut_down<C: Send + 'static>(
    close_inputs: impl FnOnce(),
    commands: &CommandSender,
    dispatcher: thread::JoinHandle<C>,
    notifier_task: tokio::task::JoinHandle<()>,
    drain: Duration,
) {
    close_inputs();
    if commands.send(BoxCommand::Shutdown).is_err() {
        warn!("heat dispatcher already stopped");
    }
    match tokio::task::spawn_blocking(move || dispatcher.join()).await {
        // Dropping the controller returns every pin to the board.
        Ok(Ok(controller)) => drop(controller),
        Ok(Err(_)) => warn!("heat dispatcher panicked"),
        Err(err) => warn!("failed to join heat dispatcher: {err}"),
    }

    if tokio::time::timeout(drain, notifier_task).await.is_err() {
        warn!("gave up waiting for pending clock start notifications");
    }
}

fn init_logging() -> anyhow::Result<()> {
    let path = std::env::var("BUTTON_BOX_LOG_FILE").unwrap_or_else(|_| DEFAULT_LOG_FILE.into());
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("failed to open log file {path}"))?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}

async fn load_runtime_config(path: &Path) -> anyhow::Result<RuntimeConfig> {
    match tokio::fs::read(path).await {
        Ok(raw) => Ok(serde_json::from_slice::<RuntimeConfig>(&raw)?),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(RuntimeConfig::default()),
        Err(err) => Err(err.into()),
    }
}

/// Wall-clock milliseconds since the Unix epoch, stamped on button events.
pub fn wall_clock_ms() -> i64 {
    Utc::now().timestamp_millis()
}

fn monotonic_ms() -> u64 {
    static START: OnceLock<Instant> = OnceLock::new();
    let start = START.get_or_init(Instant::now);
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}
