//! Raspberry Pi board through `rppal`.
//!
//! Outputs are claimed low. Each button line is pulled down and watched on
//! both edges by an interrupt callback that owns its own debouncer, so lines
//! never share debounce state.

use anyhow::Context;
use rppal::{
    gpio::{Event, Gpio, InputPin, OutputPin, Trigger},
    hal::Delay,
};
use tracing::{info, warn};

use buttonbox_common::{
    ButtonId, HeatController, LedBank, LedIndicator, LedPair, LedPairPins, Level, LineDebouncer,
    RelayActuator, RelayBank, RuntimeConfig,
};

use crate::{
    dispatch::{BoxCommand, CommandSender, QueuedNotifier},
    host::wall_clock_ms,
};

pub type BoardController = HeatController<OutputPin, Delay, QueuedNotifier>;

pub struct Inputs {
    pins: Vec<InputPin>,
}

impl Inputs {
    /// Stops the interrupt callbacks; the pins themselves are released on drop.
    pub fn close(mut self) {
        for pin in &mut self.pins {
            if let Err(err) = pin.clear_async_interrupt() {
                warn!("failed to clear interrupt on BCM {}: {err}", pin.pin());
            }
        }
        info!("button interrupts cleared");
    }
}

pub fn open(
    config: &RuntimeConfig,
    notifier: QueuedNotifier,
    commands: CommandSender,
) -> anyhow::Result<(BoardController, Inputs)> {
    let gpio = Gpio::new().context("failed to open GPIO")?;
    let output = |bcm: u8| -> anyhow::Result<OutputPin> {
        Ok(gpio
            .get(bcm)
            .with_context(|| format!("failed to claim output BCM {bcm}"))?
            .into_output_low())
    };

    let relay_pins = &config.pins.relays;
    let relays = RelayActuator::new(
        RelayBank {
            team_1_clock: output(relay_pins.team_1_clock)?,
            team_2_clock: output(relay_pins.team_2_clock)?,
            reset_all_clocks: output(relay_pins.reset_all_clocks)?,
            air_horn: output(relay_pins.air_horn)?,
        },
        Delay::new(),
    )?;

    let pair = |pair: LedPair| -> anyhow::Result<LedPairPins<OutputPin>> {
        let pins = config.pins.leds.pair(pair);
        Ok(LedPairPins {
            green: output(pins.green)?,
            red: output(pins.red)?,
        })
    };
    let leds = LedIndicator::new(LedBank {
        website: pair(LedPair::Website)?,
        team_1: pair(LedPair::Team1)?,
        team_2: pair(LedPair::Team2)?,
    })?;

    let mut inputs = Vec::with_capacity(ButtonId::ALL.len());
    for button in ButtonId::ALL {
        let bcm = config.pins.buttons.pin(button);
        let mut pin = gpio
            .get(bcm)
            .with_context(|| format!("failed to claim input BCM {bcm}"))?
            .into_input_pulldown();
        let mut debouncer = LineDebouncer::new(button, config.timing.debounce_ms);
        let commands = commands.clone();
        pin.set_async_interrupt(Trigger::Both, None, move |event: Event| {
            let level = match event.trigger {
                Trigger::RisingEdge => Level::High,
                _ => Level::Low,
            };
            if let Some(event) = debouncer.accept(level, wall_clock_ms()) {
                if commands.send(BoxCommand::Button(event)).is_err() {
                    warn!("heat dispatcher stopped; dropping {}", button.as_str());
                }
            }
        })
        .with_context(|| format!("failed to watch {} on BCM {bcm}", button.as_str()))?;
        info!("watching {} on BCM {bcm}", button.as_str());
        inputs.push(pin);
    }

    let controller = HeatController::new(relays, leds, notifier, config.timing);
    Ok((controller, Inputs { pins: inputs }))
}
