use embedded_hal::digital::OutputPin;
use tracing::info;

use crate::{
    gpio::{drive, GpioError},
    types::{LedColor, LedPair, Level},
};

#[derive(Debug)]
pub struct LedPairPins<P> {
    pub green: P,
    pub red: P,
}

#[derive(Debug)]
pub struct LedBank<P> {
    pub website: LedPairPins<P>,
    pub team_1: LedPairPins<P>,
    pub team_2: LedPairPins<P>,
}

struct PairState<P> {
    pins: LedPairPins<P>,
    active: LedColor,
}

/// Green/red indicator pairs. Exactly one member of each pair is lit; the
/// tracked colour only changes once both pins have been driven.
pub struct LedIndicator<P> {
    website: PairState<P>,
    team_1: PairState<P>,
    team_2: PairState<P>,
}

impl<P: OutputPin> LedIndicator<P> {
    /// Team pairs start ready (green); the website pair starts red until the
    /// first health check says otherwise.
    pub fn new(bank: LedBank<P>) -> Result<Self, GpioError> {
        let mut leds = Self {
            website: PairState {
                pins: bank.website,
                active: LedColor::Red,
            },
            team_1: PairState {
                pins: bank.team_1,
                active: LedColor::Green,
            },
            team_2: PairState {
                pins: bank.team_2,
                active: LedColor::Green,
            },
        };
        for pair in LedPair::ALL {
            let color = leds.color(pair);
            leds.apply(pair, color)?;
        }
        Ok(leds)
    }

    pub fn color(&self, pair: LedPair) -> LedColor {
        self.state(pair).active
    }

    pub fn pins(&self, pair: LedPair) -> &LedPairPins<P> {
        &self.state(pair).pins
    }

    pub fn toggle(&mut self, pair: LedPair) -> Result<LedColor, GpioError> {
        let from = self.color(pair);
        let to = from.toggled();
        self.apply(pair, to)?;
        info!(
            "turning off {} {} and turning on {} {}",
            pair.as_str(),
            from.as_str(),
            pair.as_str(),
            to.as_str()
        );
        Ok(to)
    }

    pub fn set_pair(&mut self, pair: LedPair, color: LedColor) -> Result<(), GpioError> {
        self.apply(pair, color)?;
        info!("{} led set {}", pair.as_str(), color.as_str());
        Ok(())
    }

    pub fn set_website_status(&mut self, reachable: bool) -> Result<(), GpioError> {
        let color = if reachable {
            LedColor::Green
        } else {
            LedColor::Red
        };
        if self.website.active == color {
            return Ok(());
        }
        self.set_pair(LedPair::Website, color)
    }

    fn state(&self, pair: LedPair) -> &PairState<P> {
        match pair {
            LedPair::Website => &self.website,
            LedPair::Team1 => &self.team_1,
            LedPair::Team2 => &self.team_2,
        }
    }

    fn state_mut(&mut self, pair: LedPair) -> &mut PairState<P> {
        match pair {
            LedPair::Website => &mut self.website,
            LedPair::Team1 => &mut self.team_1,
            LedPair::Team2 => &mut self.team_2,
        }
    }

    fn apply(&mut self, pair: LedPair, color: LedColor) -> Result<(), GpioError> {
        let (green_target, red_target) = match pair {
            LedPair::Website => ("website green led", "website red led"),
            LedPair::Team1 => ("team 1 green led", "team 1 red led"),
            LedPair::Team2 => ("team 2 green led", "team 2 red led"),
        };
        let state = self.state_mut(pair);
        let previous = state.active;
        let LedPairPins { green, red } = &mut state.pins;
        let (incoming, incoming_target, outgoing, outgoing_target) = match color {
            LedColor::Green => (green, green_target, red, red_target),
            LedColor::Red => (red, red_target, green, green_target),
        };
        // Outgoing member goes dark before the incoming one lights.
        drive(outgoing, Level::Low, outgoing_target)?;
        if let Err(err) = drive(incoming, Level::High, incoming_target) {
            if previous != color {
                let _ = drive(outgoing, Level::High, outgoing_target);
            }
            return Err(err);
        }
        state.active = color;
        Ok(())
    }
}
