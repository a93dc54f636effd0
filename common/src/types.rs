use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonId {
    HeatStartStop,
    Team1StartStop,
    Team2StartStop,
    ResetTeams,
}

impl ButtonId {
    pub const ALL: [ButtonId; 4] = [
        Self::HeatStartStop,
        Self::Team1StartStop,
        Self::Team2StartStop,
        Self::ResetTeams,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::HeatStartStop => "heat start/stop",
            Self::Team1StartStop => "team 1 start/stop",
            Self::Team2StartStop => "team 2 start/stop",
            Self::ResetTeams => "reset teams",
        }
    }

    pub fn index(self) -> usize {
        match self {
            Self::HeatStartStop => 0,
            Self::Team1StartStop => 1,
            Self::Team2StartStop => 2,
            Self::ResetTeams => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Low,
    High,
}

impl Level {
    pub fn is_high(self) -> bool {
        self == Self::High
    }
}

impl From<bool> for Level {
    fn from(high: bool) -> Self {
        if high {
            Self::High
        } else {
            Self::Low
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Rising,
    Falling,
}

impl From<Level> for Edge {
    fn from(level: Level) -> Self {
        match level {
            Level::High => Self::Rising,
            Level::Low => Self::Falling,
        }
    }
}

/// A debounced transition on one button line. `at_ms` is wall-clock
/// milliseconds since the Unix epoch, captured when the edge was seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonEvent {
    pub button: ButtonId,
    pub edge: Edge,
    pub at_ms: i64,
}

impl ButtonEvent {
    pub fn is_press(&self) -> bool {
        self.edge == Edge::Rising
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockSide {
    Team1,
    Team2,
}

impl ClockSide {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Team1 => "team 1",
            Self::Team2 => "team 2",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedPair {
    Website,
    Team1,
    Team2,
}

impl LedPair {
    pub const ALL: [LedPair; 3] = [Self::Website, Self::Team1, Self::Team2];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Website => "website",
            Self::Team1 => "team 1",
            Self::Team2 => "team 2",
        }
    }
}

impl From<ClockSide> for LedPair {
    fn from(side: ClockSide) -> Self {
        match side {
            ClockSide::Team1 => Self::Team1,
            ClockSide::Team2 => Self::Team2,
        }
    }
}

/// Green means stopped/ready (or reachable, for the website pair); red means
/// running (or unreachable).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedColor {
    Green,
    Red,
}

impl LedColor {
    pub fn toggled(self) -> Self {
        match self {
            Self::Green => Self::Red,
            Self::Red => Self::Green,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Green => "green",
            Self::Red => "red",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayLine {
    Team1Clock,
    Team2Clock,
    ResetAllClocks,
    AirHorn,
}

impl RelayLine {
    pub const ALL: [RelayLine; 4] = [
        Self::Team1Clock,
        Self::Team2Clock,
        Self::ResetAllClocks,
        Self::AirHorn,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Team1Clock => "team 1 clock relay",
            Self::Team2Clock => "team 2 clock relay",
            Self::ResetAllClocks => "reset-all relay",
            Self::AirHorn => "air horn relay",
        }
    }
}

impl From<ClockSide> for RelayLine {
    fn from(side: ClockSide) -> Self {
        match side {
            ClockSide::Team1 => Self::Team1Clock,
            ClockSide::Team2 => Self::Team2Clock,
        }
    }
}

/// Empty means no heat is open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeatState {
    start_time_ms: Option<i64>,
}

impl HeatState {
    pub fn start_time_ms(&self) -> Option<i64> {
        self.start_time_ms
    }

    pub fn is_open(&self) -> bool {
        self.start_time_ms.is_some()
    }

    pub(crate) fn open(&mut self, at_ms: i64) {
        self.start_time_ms = Some(at_ms);
    }

    pub(crate) fn clear(&mut self) {
        self.start_time_ms = None;
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClockStartForm {
    pub start_time: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ButtonBoxInfo {
    pub ip_address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ButtonBoxInfoPayload {
    pub button_box_info: ButtonBoxInfo,
}

impl ButtonBoxInfoPayload {
    pub fn new(ip_address: impl Into<String>) -> Self {
        Self {
            button_box_info: ButtonBoxInfo {
                ip_address: ip_address.into(),
            },
        }
    }
}
