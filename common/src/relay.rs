//! Bounded relay actuation.
//!
//! Lines are only ever driven active through a [`RelayHold`], which drives
//! every line it took back to inactive when released or dropped. A pulse is
//! a hold plus a wait, so a failed write, a panicking delay or an early return
//! still leaves the relay open.

use std::time::Duration;

use embedded_hal::{delay::DelayNs, digital::OutputPin};
use tracing::{info, warn};

use crate::{
    gpio::{drive, GpioError},
    types::{Level, RelayLine},
};

#[derive(Debug)]
pub struct RelayBank<P> {
    pub team_1_clock: P,
    pub team_2_clock: P,
    pub reset_all_clocks: P,
    pub air_horn: P,
}

impl<P> RelayBank<P> {
    fn pin_mut(&mut self, line: RelayLine) -> &mut P {
        match line {
            RelayLine::Team1Clock => &mut self.team_1_clock,
            RelayLine::Team2Clock => &mut self.team_2_clock,
            RelayLine::ResetAllClocks => &mut self.reset_all_clocks,
            RelayLine::AirHorn => &mut self.air_horn,
        }
    }
}

pub struct RelayActuator<P, D> {
    bank: RelayBank<P>,
    delay: D,
}

impl<P: OutputPin, D: DelayNs> RelayActuator<P, D> {
    /// Drives every line inactive before handing the actuator out.
    pub fn new(bank: RelayBank<P>, delay: D) -> Result<Self, GpioError> {
        let mut actuator = Self { bank, delay };
        actuator.release(&RelayLine::ALL)?;
        Ok(actuator)
    }

    pub fn bank(&self) -> &RelayBank<P> {
        &self.bank
    }

    /// Drives `lines` active until the returned hold is released or dropped.
    pub fn hold(&mut self, lines: &[RelayLine]) -> Result<RelayHold<'_, P, D>, GpioError> {
        let mut hold = RelayHold {
            actuator: self,
            lines: Vec::with_capacity(lines.len()),
            released: false,
        };
        for &line in lines {
            // Tracked before the write so a half-applied hold is still undone.
            hold.lines.push(line);
            drive(hold.actuator.bank.pin_mut(line), Level::High, line.as_str())?;
        }
        info!("energised {}", describe(lines));
        Ok(hold)
    }

    pub fn pulse(&mut self, lines: &[RelayLine], duration: Duration) -> Result<(), GpioError> {
        let mut hold = self.hold(lines)?;
        hold.wait(duration);
        hold.release()
    }

    /// Forces `lines` inactive without a hold, attempting every line even if
    /// one fails.
    pub fn release(&mut self, lines: &[RelayLine]) -> Result<(), GpioError> {
        let mut first_err = None;
        for &line in lines {
            if let Err(err) = drive(self.bank.pin_mut(line), Level::Low, line.as_str()) {
                warn!("{err}");
                first_err.get_or_insert(err);
            }
        }
        first_err.map_or(Ok(()), Err)
    }

    fn wait(&mut self, duration: Duration) {
        let ms = u32::try_from(duration.as_millis()).unwrap_or(u32::MAX);
        self.delay.delay_ms(ms);
    }
}

pub struct RelayHold<'a, P: OutputPin, D: DelayNs> {
    actuator: &'a mut RelayActuator<P, D>,
    lines: Vec<RelayLine>,
    released: bool,
}

impl<P: OutputPin, D: DelayNs> RelayHold<'_, P, D> {
    pub fn wait(&mut self, duration: Duration) {
        self.actuator.wait(duration);
    }

    /// Pulses a line not covered by this hold while the held lines stay active.
    pub fn pulse(&mut self, lines: &[RelayLine], duration: Duration) -> Result<(), GpioError> {
        self.actuator.pulse(lines, duration)
    }

    pub fn release(mut self) -> Result<(), GpioError> {
        self.release_lines()
    }

    fn release_lines(&mut self) -> Result<(), GpioError> {
        self.released = true;
        let result = self.actuator.release(&self.lines);
        info!("released {}", describe(&self.lines));
        result
    }
}

impl<P: OutputPin, D: DelayNs> Drop for RelayHold<'_, P, D> {
    fn drop(&mut self) {
        if !self.released {
            warn!("relay hold dropped early; releasing {}", describe(&self.lines));
            let _ = self.release_lines();
        }
    }
}

fn describe(lines: &[RelayLine]) -> String {
    lines
        .iter()
        .map(|line| line.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
