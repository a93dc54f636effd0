//! Board without GPIO: in-memory pins and button presses typed on stdin.

use std::{
    io::{self, BufRead},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
};

use anyhow::Context;
use tracing::{info, warn};

use buttonbox_common::{
    sim::{SimClock, SimDelay, SimPin},
    ButtonId, Debouncer, HeatController, LedBank, LedIndicator, LedPairPins, Level,
    RelayActuator, RelayBank, RuntimeConfig,
};

use crate::{
    dispatch::{BoxCommand, CommandSender, QueuedNotifier},
    host::wall_clock_ms,
};

pub type BoardController = HeatController<SimPin, SimDelay, QueuedNotifier>;

/// Handle on the stdin reader. The reader thread blocks on stdin and cannot
/// be joined, so closing only stops it from forwarding further presses.
pub struct Inputs {
    closed: Arc<AtomicBool>,
}

impl Inputs {
    pub fn close(self) {
        self.closed.store(true, Ordering::SeqCst);
        info!("stdin button source closed");
    }
}

pub fn open(
    config: &RuntimeConfig,
    notifier: QueuedNotifier,
    commands: CommandSender,
) -> anyhow::Result<(BoardController, Inputs)> {
    let clock = SimClock::default();
    let pin = |name| SimPin::new(name, clock.clone());

    let relays = RelayActuator::new(
        RelayBank {
            team_1_clock: pin("team 1 clock relay"),
            team_2_clock: pin("team 2 clock relay"),
            reset_all_clocks: pin("reset-all relay"),
            air_horn: pin("air horn relay"),
        },
        SimDelay::realtime(clock.clone()),
    )
    .context("failed to release relays")?;
    let leds = LedIndicator::new(LedBank {
        website: LedPairPins {
            green: pin("website green led"),
            red: pin("website red led"),
        },
        team_1: LedPairPins {
            green: pin("team 1 green led"),
            red: pin("team 1 red led"),
        },
        team_2: LedPairPins {
            green: pin("team 2 green led"),
            red: pin("team 2 red led"),
        },
    })
    .context("failed to initialise leds")?;

    let closed = Arc::new(AtomicBool::new(false));
    let reader_closed = closed.clone();
    let debouncer = Debouncer::new(config.timing.debounce_ms);
    thread::Builder::new()
        .name("stdin-buttons".into())
        .spawn(move || read_buttons(io::stdin().lock(), debouncer, commands, &reader_closed))
        .context("failed to start stdin reader")?;
    info!("simulated board ready; type heat, team1, team2 or reset");

    let controller = HeatController::new(relays, leds, notifier, config.timing);
    Ok((controller, Inputs { closed }))
}

pub fn parse_button(line: &str) -> Option<ButtonId> {
    match line.trim().to_ascii_lowercase().as_str() {
        "heat" => Some(ButtonId::HeatStartStop),
        "team1" => Some(ButtonId::Team1StartStop),
        "team2" => Some(ButtonId::Team2StartStop),
        "reset" => Some(ButtonId::ResetTeams),
        _ => None,
    }
}

/// Each recognised line is one press of that button, debounced the same way
/// a physical line would be.
fn read_buttons(
    input: impl BufRead,
    mut debouncer: Debouncer,
    commands: CommandSender,
    closed: &AtomicBool,
) {
    for line in input.lines() {
        let line = match line {
            Ok(line) => line,
            Err(err) => {
                warn!("stdin read failed: {err}");
                break;
            }
        };
        if closed.load(Ordering::SeqCst) {
            break;
        }
        let Some(button) = parse_button(&line) else {
            if !line.trim().is_empty() {
                warn!("unknown button {:?}", line.trim());
            }
            continue;
        };
        let Some(event) = debouncer.accept(button, Level::High, wall_clock_ms()) else {
            continue;
        };
        if commands.send(BoxCommand::Button(event)).is_err() {
            break;
        }
    }
}
