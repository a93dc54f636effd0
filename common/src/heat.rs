use embedded_hal::{delay::DelayNs, digital::OutputPin};
use tracing::info;

use crate::{
    config::TimingConfig,
    gpio::GpioError,
    led::LedIndicator,
    relay::RelayActuator,
    remote::Notifier,
    types::{ButtonEvent, ButtonId, ClockSide, Edge, HeatState, LedColor, LedPair, RelayLine},
};

const CLOCK_RELAYS: [RelayLine; 2] = [RelayLine::Team1Clock, RelayLine::Team2Clock];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeatTransition {
    HeatStarted { at_ms: i64 },
    /// Pause or resume of an open heat; the remote service tells them apart
    /// by arrival order.
    HeatMarked { at_ms: i64 },
    TeamToggled { side: ClockSide, color: LedColor },
    TeamsReset,
    ClocksReleased,
}

/// Owns every relay, LED and the heat state. Callers feed it debounced
/// events one at a time; each call returns only after its pulses finish.
pub struct HeatController<P: OutputPin, D: DelayNs, N: Notifier> {
    relays: RelayActuator<P, D>,
    leds: LedIndicator<P>,
    notifier: N,
    timing: TimingConfig,
    heat: HeatState,
}

impl<P: OutputPin, D: DelayNs, N: Notifier> HeatController<P, D, N> {
    pub fn new(
        relays: RelayActuator<P, D>,
        leds: LedIndicator<P>,
        notifier: N,
        timing: TimingConfig,
    ) -> Self {
        Self {
            relays,
            leds,
            notifier,
            timing,
            heat: HeatState::default(),
        }
    }

    pub fn heat(&self) -> HeatState {
        self.heat
    }

    pub fn leds(&self) -> &LedIndicator<P> {
        &self.leds
    }

    pub fn relays(&self) -> &RelayActuator<P, D> {
        &self.relays
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn handle(&mut self, event: ButtonEvent) -> Result<HeatTransition, GpioError> {
        match (event.button, event.edge) {
            // Releases never start an action; they only force the clock
            // lines inactive.
            (_, Edge::Falling) => {
                self.relays.release(&CLOCK_RELAYS)?;
                Ok(HeatTransition::ClocksReleased)
            }
            (ButtonId::HeatStartStop, Edge::Rising) => self.heat_start_stop(event.at_ms),
            (ButtonId::Team1StartStop, Edge::Rising) => self.team_start_stop(ClockSide::Team1),
            (ButtonId::Team2StartStop, Edge::Rising) => self.team_start_stop(ClockSide::Team2),
            (ButtonId::ResetTeams, Edge::Rising) => self.reset_teams(),
        }
    }

    pub fn set_website_status(&mut self, reachable: bool) -> Result<(), GpioError> {
        self.leds.set_website_status(reachable)
    }

    /// Drives every relay inactive.
    pub fn shutdown(&mut self) -> Result<(), GpioError> {
        self.relays.release(&RelayLine::ALL)
    }

    fn heat_start_stop(&mut self, at_ms: i64) -> Result<HeatTransition, GpioError> {
        info!("toggling both clocks");
        let mut hold = self.relays.hold(&CLOCK_RELAYS)?;
        hold.pulse(&[RelayLine::AirHorn], self.timing.air_horn())?;
        info!("pushed button at {at_ms}");

        self.leds.toggle(LedPair::Team1)?;
        self.leds.toggle(LedPair::Team2)?;

        // The clocks need the full relay time after the horn to latch.
        hold.wait(self.timing.relay());
        hold.release()?;

        if self.heat.is_open() {
            info!("pausing/unpausing");
            self.notifier.notify_start(at_ms);
            info!("queued pause/restart time for website: {at_ms}");
            Ok(HeatTransition::HeatMarked { at_ms })
        } else {
            info!("starting a heat");
            self.heat.open(at_ms);
            self.notifier.notify_start(at_ms);
            info!("queued start time for website: {at_ms}");
            Ok(HeatTransition::HeatStarted { at_ms })
        }
    }

    fn team_start_stop(&mut self, side: ClockSide) -> Result<HeatTransition, GpioError> {
        info!("start/stop {}", side.as_str());
        let mut hold = self.relays.hold(&[RelayLine::from(side)])?;
        let color = self.leds.toggle(LedPair::from(side))?;
        hold.wait(self.timing.relay());
        hold.release()?;
        Ok(HeatTransition::TeamToggled { side, color })
    }

    fn reset_teams(&mut self) -> Result<HeatTransition, GpioError> {
        info!("resetting both teams");
        self.relays
            .pulse(&[RelayLine::ResetAllClocks], self.timing.relay())?;
        info!("resetting clocks");

        self.heat.clear();
        info!("clearing heat start time");

        self.leds.set_pair(LedPair::Team1, LedColor::Green)?;
        self.leds.set_pair(LedPair::Team2, LedColor::Green)?;
        info!("resetting LEDs");
        Ok(HeatTransition::TeamsReset)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{
        led::{LedBank, LedPairPins},
        relay::RelayBank,
        sim::{SimClock, SimDelay, SimPin},
        types::Level,
    };

    #[derive(Debug, Default)]
    struct RecordingNotifier {
        sent: Vec<i64>,
    }

    impl Notifier for RecordingNotifier {
        fn notify_start(&mut self, start_time_ms: i64) {
            self.sent.push(start_time_ms);
        }
    }

    type TestController = HeatController<SimPin, SimDelay, RecordingNotifier>;

    fn controller() -> (TestController, SimClock) {
        let clock = SimClock::default();
        let pin = |name| SimPin::new(name, clock.clone());
        let relays = RelayActuator::new(
            RelayBank {
                team_1_clock: pin("team 1 clock"),
                team_2_clock: pin("team 2 clock"),
                reset_all_clocks: pin("reset all"),
                air_horn: pin("air horn"),
            },
            SimDelay::new(clock.clone()),
        )
        .unwrap();
        let leds = LedIndicator::new(LedBank {
            website: LedPairPins {
                green: pin("website green"),
                red: pin("website red"),
            },
            team_1: LedPairPins {
                green: pin("team 1 green"),
                red: pin("team 1 red"),
            },
            team_2: LedPairPins {
                green: pin("team 2 green"),
                red: pin("team 2 red"),
            },
        })
        .unwrap();
        let controller = HeatController::new(
            relays,
            leds,
            RecordingNotifier::default(),
            TimingConfig::default(),
        );
        (controller, clock)
    }

    fn press(button: ButtonId, at_ms: i64) -> ButtonEvent {
        ButtonEvent {
            button,
            edge: Edge::Rising,
            at_ms,
        }
    }

    fn release(button: ButtonId, at_ms: i64) -> ButtonEvent {
        ButtonEvent {
            button,
            edge: Edge::Falling,
            at_ms,
        }
    }

    const T0: i64 = 1_760_000_000_000;

    #[test]
    fn heat_press_from_idle_starts_heat() {
        let (mut controller, clock) = controller();

        let transition = controller.handle(press(ButtonId::HeatStartStop, T0)).unwrap();

        assert_eq!(transition, HeatTransition::HeatStarted { at_ms: T0 });
        assert_eq!(controller.heat().start_time_ms(), Some(T0));
        assert_eq!(controller.notifier().sent, vec![T0]);

        let bank = controller.relays().bank();
        assert_eq!(
            bank.air_horn.history(),
            vec![(0, Level::Low), (0, Level::High), (150, Level::Low)]
        );
        for relay in [&bank.team_1_clock, &bank.team_2_clock] {
            assert_eq!(
                relay.history(),
                vec![(0, Level::Low), (0, Level::High), (1_150, Level::Low)]
            );
        }
        assert_eq!(bank.reset_all_clocks.history(), vec![(0, Level::Low)]);
        assert_eq!(controller.leds().color(LedPair::Team1), LedColor::Red);
        assert_eq!(controller.leds().color(LedPair::Team2), LedColor::Red);
        assert_eq!(clock.now_ms(), 1_150);
    }

    #[test]
    fn heat_press_while_running_reports_press_time() {
        let (mut controller, _) = controller();
        let t1 = T0 + 42_000;

        controller.handle(press(ButtonId::HeatStartStop, T0)).unwrap();
        let transition = controller.handle(press(ButtonId::HeatStartStop, t1)).unwrap();

        assert_eq!(transition, HeatTransition::HeatMarked { at_ms: t1 });
        assert_eq!(controller.notifier().sent, vec![T0, t1]);
        assert_eq!(controller.heat().start_time_ms(), Some(T0));
        assert_eq!(controller.leds().color(LedPair::Team1), LedColor::Green);
        assert_eq!(controller.leds().color(LedPair::Team2), LedColor::Green);
    }

    #[test]
    fn team_press_is_local_only() {
        let (mut controller, _) = controller();
        controller.handle(press(ButtonId::HeatStartStop, T0)).unwrap();

        let transition = controller
            .handle(press(ButtonId::Team1StartStop, T0 + 5_000))
            .unwrap();

        assert_eq!(
            transition,
            HeatTransition::TeamToggled {
                side: ClockSide::Team1,
                color: LedColor::Green,
            }
        );
        assert_eq!(controller.heat().start_time_ms(), Some(T0));
        assert_eq!(controller.notifier().sent, vec![T0]);
        assert_eq!(controller.leds().color(LedPair::Team2), LedColor::Red);

        let team_1 = controller.relays().bank().team_1_clock.history();
        assert_eq!(team_1.last(), Some(&(2_150, Level::Low)));
        assert_eq!(team_1[team_1.len() - 2], (1_150, Level::High));
    }

    #[test]
    fn team_press_from_idle_keeps_heat_empty() {
        let (mut controller, _) = controller();

        controller
            .handle(press(ButtonId::Team2StartStop, T0))
            .unwrap();

        assert!(!controller.heat().is_open());
        assert!(controller.notifier().sent.is_empty());
        assert_eq!(controller.leds().color(LedPair::Team2), LedColor::Red);
        assert_eq!(controller.leds().color(LedPair::Team1), LedColor::Green);
        assert_eq!(
            controller.relays().bank().team_1_clock.history(),
            vec![(0, Level::Low)]
        );
    }

    #[test]
    fn reset_clears_heat_and_readies_teams() {
        let (mut controller, _) = controller();
        controller.handle(press(ButtonId::HeatStartStop, T0)).unwrap();
        controller
            .handle(press(ButtonId::Team2StartStop, T0 + 1_000))
            .unwrap();

        let transition = controller
            .handle(press(ButtonId::ResetTeams, T0 + 9_000))
            .unwrap();

        assert_eq!(transition, HeatTransition::TeamsReset);
        assert!(!controller.heat().is_open());
        assert_eq!(controller.notifier().sent, vec![T0]);
        assert_eq!(controller.leds().color(LedPair::Team1), LedColor::Green);
        assert_eq!(controller.leds().color(LedPair::Team2), LedColor::Green);
        assert_eq!(
            controller.relays().bank().reset_all_clocks.history(),
            vec![(0, Level::Low), (2_150, Level::High), (3_150, Level::Low)]
        );
    }

    #[test]
    fn heat_after_reset_starts_a_new_heat() {
        let (mut controller, _) = controller();
        controller.handle(press(ButtonId::HeatStartStop, T0)).unwrap();
        controller.handle(press(ButtonId::ResetTeams, T0 + 60_000)).unwrap();

        let transition = controller
            .handle(press(ButtonId::HeatStartStop, T0 + 120_000))
            .unwrap();

        assert_eq!(
            transition,
            HeatTransition::HeatStarted {
                at_ms: T0 + 120_000
            }
        );
        assert_eq!(controller.heat().start_time_ms(), Some(T0 + 120_000));
    }

    #[test]
    fn releases_only_force_clock_lines_inactive() {
        let (mut controller, clock) = controller();
        controller.handle(press(ButtonId::HeatStartStop, T0)).unwrap();

        for button in ButtonId::ALL {
            assert_eq!(
                controller.handle(release(button, T0 + 500)).unwrap(),
                HeatTransition::ClocksReleased
            );
        }

        assert_eq!(controller.heat().start_time_ms(), Some(T0));
        assert_eq!(controller.notifier().sent, vec![T0]);
        assert_eq!(clock.now_ms(), 1_150);
        assert_eq!(controller.leds().color(LedPair::Team1), LedColor::Red);
        let bank = controller.relays().bank();
        assert!(!bank.team_1_clock.is_high());
        assert!(!bank.team_2_clock.is_high());
        assert_eq!(bank.reset_all_clocks.history(), vec![(0, Level::Low)]);
    }

    #[test]
    fn relay_fault_leaves_heat_untouched() {
        let (mut controller, _) = controller();
        controller.relays().bank().air_horn.set_faulty(true);

        assert!(controller.handle(press(ButtonId::HeatStartStop, T0)).is_err());

        assert!(!controller.heat().is_open());
        assert!(controller.notifier().sent.is_empty());
        let bank = controller.relays().bank();
        assert!(!bank.team_1_clock.is_high());
        assert!(!bank.team_2_clock.is_high());
    }
}
