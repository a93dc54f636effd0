pub mod config;
pub mod debounce;
pub mod endpoints;
pub mod gpio;
pub mod health;
pub mod heat;
pub mod led;
pub mod relay;
pub mod remote;
pub mod sim;
pub mod types;

pub use config::{
    ConfigError, DeploymentTier, HealthCheckConfig, PinConfig, RemoteConfig, RuntimeConfig,
    TimingConfig,
};
pub use debounce::{Debouncer, LineDebouncer};
pub use endpoints::Endpoints;
pub use gpio::GpioError;
pub use health::{HealthReport, NetworkHealthMonitor, NetworkStatus, Reachability};
pub use heat::{HeatController, HeatTransition};
pub use led::{LedBank, LedIndicator, LedPairPins};
pub use relay::{RelayActuator, RelayBank, RelayHold};
pub use remote::{Notifier, RemoteError};
pub use types::{
    ButtonBoxInfoPayload, ButtonEvent, ButtonId, ClockSide, ClockStartForm, Edge, HeatState,
    LedColor, LedPair, Level, RelayLine,
};
