//! Reachability tracking and the adaptive health-check interval.
//!
//! The interval runs backwards from the usual backoff: while the remote
//! service is failing it is probed every `interval_min_secs` so recovery
//! shows up quickly, and once it answers it is left alone for
//! `interval_max_secs`. Intervals are measured from the completion of the
//! previous check.

use std::time::Duration;

use crate::{config::HealthCheckConfig, remote::RemoteError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reachability {
    Up,
    Down,
    Timeout,
    Unknown,
}

impl Reachability {
    /// `probe` is the HTTP status of a 2xx answer, or the failure.
    pub fn classify(probe: &Result<u16, RemoteError>) -> Self {
        match probe {
            Ok(_) => Self::Up,
            Err(RemoteError::Rejected { .. }) => Self::Down,
            Err(RemoteError::Timeout) => Self::Timeout,
            Err(RemoteError::Transport(_)) => Self::Unknown,
        }
    }

    pub fn is_up(self) -> bool {
        self == Self::Up
    }

    /// Whether the network carried the request at all.
    pub fn network_label(self) -> &'static str {
        match self {
            Self::Up | Self::Down => "Up",
            Self::Timeout => "Timeout",
            Self::Unknown => "Unknown",
        }
    }

    pub fn website_label(self) -> &'static str {
        match self {
            Self::Up => "Up",
            Self::Down => "Down",
            Self::Timeout | Self::Unknown => "Inaccessible",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkStatus {
    pub reachability: Reachability,
    pub failing: bool,
    pub last_checked_at_ms: Option<u64>,
}

impl Default for NetworkStatus {
    fn default() -> Self {
        Self {
            reachability: Reachability::Unknown,
            failing: false,
            last_checked_at_ms: None,
        }
    }
}

/// Side effects the caller owes after a check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealthReport {
    pub reachability: Reachability,
    pub website_good: bool,
    pub push_diagnostics: bool,
}

#[derive(Debug, Clone)]
pub struct NetworkHealthMonitor {
    config: HealthCheckConfig,
    status: NetworkStatus,
}

impl NetworkHealthMonitor {
    pub fn new(config: HealthCheckConfig) -> Self {
        Self {
            config,
            status: NetworkStatus::default(),
        }
    }

    pub fn status(&self) -> NetworkStatus {
        self.status
    }

    pub fn interval(&self) -> Duration {
        let secs = if self.status.failing {
            self.config.interval_min_secs
        } else {
            self.config.interval_max_secs
        };
        Duration::from_secs(secs)
    }

    /// Monotonic milliseconds. The first check is due immediately.
    pub fn is_due(&self, now_ms: u64) -> bool {
        match self.status.last_checked_at_ms {
            Some(last) => {
                u128::from(now_ms.saturating_sub(last)) >= self.interval().as_millis()
            }
            None => true,
        }
    }

    pub fn record(&mut self, reachability: Reachability, now_ms: u64) -> HealthReport {
        let up = reachability.is_up();
        self.status = NetworkStatus {
            reachability,
            failing: !up,
            last_checked_at_ms: Some(now_ms),
        };
        HealthReport {
            reachability,
            website_good: up,
            push_diagnostics: up,
        }
    }
}
