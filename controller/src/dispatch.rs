//! The single consumer that owns the hardware.
//!
//! Every relay, LED and the heat state live inside one [`HeatController`]
//! on the `heat-dispatch` thread. Button edges and website status updates
//! reach it only through the command channel, so two presses can never
//! interleave their pulses. Heat markers leave through a second channel to
//! an async task that posts them in arrival order.

use std::{
    io,
    sync::Arc,
    thread::{self, JoinHandle},
};

use embedded_hal::{delay::DelayNs, digital::OutputPin};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};

use buttonbox_common::{ButtonEvent, HeatController, Notifier};

use crate::web::WebClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoxCommand {
    Button(ButtonEvent),
    WebsiteStatus(bool),
    Shutdown,
}

pub type CommandSender = UnboundedSender<BoxCommand>;

/// Queues heat markers for [`spawn_notifier`]; never waits on the network.
pub struct QueuedNotifier {
    tx: UnboundedSender<i64>,
}

impl Notifier for QueuedNotifier {
    fn notify_start(&mut self, start_time_ms: i64) {
        if self.tx.send(start_time_ms).is_err() {
            warn!("notifier task stopped; dropping heat marker {start_time_ms}");
        }
    }
}

pub fn queued_notifier() -> (QueuedNotifier, UnboundedReceiver<i64>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (QueuedNotifier { tx }, rx)
}

/// Posts queued heat markers one at a time. Ends once every
/// [`QueuedNotifier`] is dropped and the queue is drained.
pub fn spawn_notifier(
    client: Arc<WebClient>,
    mut markers: UnboundedReceiver<i64>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(start_time_ms) = markers.recv().await {
            if let Err(err) = client.notify_start(start_time_ms).await {
                warn!("clock start notification for {start_time_ms} failed: {err}");
            }
        }
        debug!("notifier queue closed");
    })
}

/// Hands the controller back once a `Shutdown` arrives or every sender is
/// gone, after driving all relays inactive.
pub fn spawn_dispatcher<P, D, N>(
    controller: HeatController<P, D, N>,
    commands: UnboundedReceiver<BoxCommand>,
) -> io::Result<JoinHandle<HeatController<P, D, N>>>
where
    P: OutputPin + Send + 'static,
    D: DelayNs + Send + 'static,
    N: Notifier + Send + 'static,
{
    thread::Builder::new()
        .name("heat-dispatch".into())
        .spawn(move || run_dispatcher(controller, commands))
}

fn run_dispatcher<P, D, N>(
    mut controller: HeatController<P, D, N>,
    mut commands: UnboundedReceiver<BoxCommand>,
) -> HeatController<P, D, N>
where
    P: OutputPin,
    D: DelayNs,
    N: Notifier,
{
    while let Some(command) = commands.blocking_recv() {
        match command {
            BoxCommand::Button(event) => match controller.handle(event) {
                Ok(transition) => debug!(
                    "{} {:?} -> {transition:?}",
                    event.button.as_str(),
                    event.edge
                ),
                Err(err) => warn!("{} handler failed: {err}", event.button.as_str()),
            },
            BoxCommand::WebsiteStatus(reachable) => {
                if let Err(err) = controller.set_website_status(reachable) {
                    warn!("website status led update failed: {err}");
                }
            }
            BoxCommand::Shutdown => break,
        }
    }

    if let Err(err) = controller.shutdown() {
        warn!("failed to release relays on shutdown: {err}");
    }
    info!("heat dispatcher stopped");
    controller
}
