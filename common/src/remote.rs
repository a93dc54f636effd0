use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RemoteError {
    #[error("request timed out")]
    Timeout,
    #[error("transport error: {0}")]
    Transport(String),
    #[error("remote rejected request with status {status}")]
    Rejected { status: u16 },
}

/// Sink for heat start and pause/resume markers. Implementations must not
/// block on the network and must swallow their own failures, so the clocks
/// keep running whatever the remote service does.
pub trait Notifier {
    fn notify_start(&mut self, start_time_ms: i64);
}

