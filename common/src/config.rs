use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{ButtonId, LedPair, RelayLine};

/// Highest BCM GPIO number broken out on the Raspberry Pi header.
pub const MAX_BCM_PIN: u8 = 27;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("GPIO{pin} is assigned to both {first} and {second}")]
    DuplicatePin {
        pin: u8,
        first: &'static str,
        second: &'static str,
    },
    #[error("GPIO{pin} for {target} is outside BCM 0..=27")]
    PinOutOfRange { pin: u8, target: &'static str },
    #[error("no base url configured for the {0} tier")]
    MissingBaseUrl(&'static str),
    #[error("invalid timing: {0}")]
    InvalidTiming(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentTier {
    Production,
    Staging,
    Development,
}

impl DeploymentTier {
    /// Anything that is not `production` or `staging` falls back to development.
    pub fn from_env_value(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("production") => Self::Production,
            Some("staging") => Self::Staging,
            _ => Self::Development,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Production => "production",
            Self::Staging => "staging",
            Self::Development => "development",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ButtonPins {
    pub heat_start_stop: u8,
    pub team_1_start_stop: u8,
    pub team_2_start_stop: u8,
    pub reset_teams: u8,
}

impl ButtonPins {
    pub fn pin(&self, button: ButtonId) -> u8 {
        match button {
            ButtonId::HeatStartStop => self.heat_start_stop,
            ButtonId::Team1StartStop => self.team_1_start_stop,
            ButtonId::Team2StartStop => self.team_2_start_stop,
            ButtonId::ResetTeams => self.reset_teams,
        }
    }
}

impl Default for ButtonPins {
    fn default() -> Self {
        Self {
            heat_start_stop: 6,
            team_1_start_stop: 5,
            team_2_start_stop: 11,
            reset_teams: 9,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayPins {
    pub team_1_clock: u8,
    pub team_2_clock: u8,
    pub reset_all_clocks: u8,
    pub air_horn: u8,
}

impl RelayPins {
    pub fn pin(&self, line: RelayLine) -> u8 {
        match line {
            RelayLine::Team1Clock => self.team_1_clock,
            RelayLine::Team2Clock => self.team_2_clock,
            RelayLine::ResetAllClocks => self.reset_all_clocks,
            RelayLine::AirHorn => self.air_horn,
        }
    }
}

impl Default for RelayPins {
    fn default() -> Self {
        Self {
            team_1_clock: 4,
            team_2_clock: 17,
            reset_all_clocks: 27,
            air_horn: 22,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedPairConfig {
    pub green: u8,
    pub red: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedPins {
    pub website: LedPairConfig,
    pub team_1: LedPairConfig,
    pub team_2: LedPairConfig,
}

impl LedPins {
    pub fn pair(&self, pair: LedPair) -> LedPairConfig {
        match pair {
            LedPair::Website => self.website,
            LedPair::Team1 => self.team_1,
            LedPair::Team2 => self.team_2,
        }
    }
}

impl Default for LedPins {
    fn default() -> Self {
        Self {
            // The box lights GPIO24 when the site answers, so 24 is "good".
            website: LedPairConfig { green: 24, red: 23 },
            team_1: LedPairConfig { green: 7, red: 10 },
            team_2: LedPairConfig { green: 25, red: 8 },
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PinConfig {
    pub buttons: ButtonPins,
    pub relays: RelayPins,
    pub leds: LedPins,
}

impl PinConfig {
    fn assignments(&self) -> Vec<(u8, &'static str)> {
        let mut assigned = Vec::with_capacity(14);
        for button in ButtonId::ALL {
            assigned.push((self.buttons.pin(button), button.as_str()));
        }
        for line in RelayLine::ALL {
            assigned.push((self.relays.pin(line), line.as_str()));
        }
        for (pair, green, red) in [
            (self.leds.website, "website green led", "website red led"),
            (self.leds.team_1, "team 1 green led", "team 1 red led"),
            (self.leds.team_2, "team 2 green led", "team 2 red led"),
        ] {
            assigned.push((pair.green, green));
            assigned.push((pair.red, red));
        }
        assigned
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let assigned = self.assignments();
        for (index, &(pin, target)) in assigned.iter().enumerate() {
            if pin > MAX_BCM_PIN {
                return Err(ConfigError::PinOutOfRange { pin, target });
            }
            if let Some(&(_, first)) = assigned[..index].iter().find(|(other, _)| *other == pin) {
                return Err(ConfigError::DuplicatePin {
                    pin,
                    first,
                    second: target,
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub debounce_ms: u64,
    pub air_horn_ms: u64,
    pub relay_ms: u64,
}

impl TimingConfig {
    pub fn air_horn(&self) -> Duration {
        Duration::from_millis(self.air_horn_ms)
    }

    pub fn relay(&self) -> Duration {
        Duration::from_millis(self.relay_ms)
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 400,
            air_horn_ms: 150,
            relay_ms: 1_000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthCheckConfig {
    pub interval_min_secs: u64,
    pub interval_max_secs: u64,
    pub wait_slice_ms: u64,
    pub probe_timeout_secs: u64,
}

impl HealthCheckConfig {
    pub fn wait_slice(&self) -> Duration {
        Duration::from_millis(self.wait_slice_ms)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            interval_min_secs: 5,
            interval_max_secs: 300,
            wait_slice_ms: 200,
            probe_timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    pub production_url: String,
    pub staging_url: String,
    pub development_url: String,
    pub username: String,
    pub password: String,
    pub request_timeout_secs: u64,
}

impl RemoteConfig {
    pub fn base_url(&self, tier: DeploymentTier) -> Result<&str, ConfigError> {
        let url = match tier {
            DeploymentTier::Production => &self.production_url,
            DeploymentTier::Staging => &self.staging_url,
            DeploymentTier::Development => &self.development_url,
        };
        let url = url.trim();
        if url.is_empty() {
            return Err(ConfigError::MissingBaseUrl(tier.as_str()));
        }
        Ok(url)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            production_url: String::new(),
            staging_url: String::new(),
            development_url: "http://localhost:3000".to_string(),
            username: String::new(),
            password: String::new(),
            request_timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuntimeConfig {
    #[serde(default)]
    pub pins: PinConfig,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub health: HealthCheckConfig,
    #[serde(default)]
    pub remote: RemoteConfig,
}

impl RuntimeConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.pins.validate()?;

        if self.timing.air_horn_ms == 0 || self.timing.relay_ms == 0 {
            return Err(ConfigError::InvalidTiming("pulse durations must be non-zero"));
        }
        if self.timing.debounce_ms == 0 {
            return Err(ConfigError::InvalidTiming("debounce window must be non-zero"));
        }
        if self.health.interval_min_secs == 0 {
            return Err(ConfigError::InvalidTiming(
                "minimum health check interval must be non-zero",
            ));
        }
        if self.health.interval_min_secs > self.health.interval_max_secs {
            return Err(ConfigError::InvalidTiming(
                "minimum health check interval exceeds the maximum",
            ));
        }
        if self.health.wait_slice_ms == 0 || self.health.probe_timeout_secs == 0 {
            return Err(ConfigError::InvalidTiming(
                "wait slice and probe timeout must be non-zero",
            ));
        }
        if self.remote.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidTiming(
                "website request timeout must be non-zero",
            ));
        }
        Ok(())
    }
}
