mod dispatch;
mod host;
mod monitor;
#[cfg(feature = "rpi")]
mod rpi;
#[cfg(not(feature = "rpi"))]
mod sim;
mod web;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    host::run().await
}
