//! Controller front end.
//!
//! [`Controller::write`] is meant to be called in a loop with the latest input
//! state. Each call blocks until the console sends a command (or the
//! configured wait runs out), answers it and returns.

use n64_hal::{Delay, Interrupts, NoInterrupts, Pin, irq};

use crate::{
    codec::ReceiveError,
    config::{Config, ConfigError, FollowUp},
    dispatch::{Cycle, ProtocolOutcome, Responder},
    frame::Transport,
    report::{InputReport, StatusReport},
};

/// Outcomes of one [`Controller::exchange`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Exchange {
    /// Outcome of the first cycle.
    pub first: ProtocolOutcome,
    /// Outcome of the follow-up cycle, if one ran.
    pub follow_up: Option<ProtocolOutcome>,
}

impl Exchange {
    /// Outcome of the last cycle that ran.
    #[inline]
    pub fn last(&self) -> ProtocolOutcome {
        self.follow_up.unwrap_or(self.first)
    }

    /// Returns `true` if any cycle answered a command.
    #[inline]
    pub fn answered(&self) -> bool {
        self.first.answered() || self.follow_up.is_some_and(ProtocolOutcome::answered)
    }
}

/// An emulated N64 controller on one data line.
///
/// Generic over the pin, the microsecond delay and the interrupt controller.
/// Respond cycles run with interrupts disabled through `I`; on targets where
/// nothing can preempt the bus, leave it as [`NoInterrupts`].
///
/// # Examples
///
/// ```ignore
/// let mut pad = Controller::new(pin, delay, irq, Config::DEFAULT)?;
///
/// loop {
///     let report = InputReport::NEUTRAL
///         .with_buttons(read_buttons())
///         .with_stick(stick_x(), stick_y());
///     pad.write(&report);
/// }
/// ```
pub struct Controller<P, D, I = NoInterrupts> {
    responder: Responder<P, D>,
    irq: I,
    config: Config,
    last: ProtocolOutcome,
}

impl<P: Pin, D: Delay> Controller<P, D> {
    /// Creates a controller that does not mask interrupts.
    pub fn without_interrupts(pin: P, delay: D, config: Config) -> Result<Self, ConfigError> {
        Self::new(pin, delay, NoInterrupts, config)
    }
}

impl<P: Pin, D: Delay, I: Interrupts> Controller<P, D, I> {
    /// Creates a controller after validating `config`.
    ///
    /// The pin is not touched until the first call to
    /// [`write`](Controller::write).
    pub fn new(pin: P, delay: D, irq: I, config: Config) -> Result<Self, ConfigError> {
        config.validate()?;

        let transport = Transport::new(pin, delay, config.timing)?;
        let responder = Responder::new(transport, config.status);

        Ok(Self {
            responder,
            irq,
            config,
            last: ProtocolOutcome::NoCommand,
        })
    }

    /// Serves the console with `report` as the current input state.
    ///
    /// Runs one respond cycle, plus a second one when the follow-up policy
    /// asks for it. Returns `true` if a command was answered.
    pub fn write(&mut self, report: &InputReport) -> bool {
        self.exchange(report).answered()
    }

    /// Like [`write`](Controller::write), returning the outcome of every cycle.
    pub fn exchange(&mut self, report: &InputReport) -> Exchange {
        let follow_up = self.config.follow_up;

        let responder = &mut self.responder;
        let (first, second) = irq::free(&mut self.irq, || run_cycles(responder, follow_up, report));

        log_cycle(&first);
        if let Some(second) = &second {
            log_cycle(second);
        }

        let exchange = Exchange {
            first: first.outcome,
            follow_up: second.map(|cycle| cycle.outcome),
        };
        self.last = exchange.last();
        exchange
    }

    /// Runs exactly one respond cycle.
    pub fn respond_once(&mut self, report: &InputReport) -> ProtocolOutcome {
        let responder = &mut self.responder;
        let cycle = irq::free(&mut self.irq, || responder.respond(report));

        log_cycle(&cycle);
        self.last = cycle.outcome;
        cycle.outcome
    }

    /// Outcome of the last cycle run, [`ProtocolOutcome::NoCommand`] before
    /// the first.
    #[inline]
    pub fn last_outcome(&self) -> ProtocolOutcome {
        self.last
    }

    /// The status report sent in answer to Identify.
    #[inline]
    pub fn status(&self) -> &StatusReport {
        self.responder.status()
    }

    /// The configuration in use.
    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Releases the pin, the delay and the interrupt controller.
    pub fn release(self) -> (P, D, I) {
        let (pin, delay) = self.responder.into_transport().into_parts();
        (pin, delay, self.irq)
    }
}

fn run_cycles<P: Pin, D: Delay>(
    responder: &mut Responder<P, D>,
    follow_up: FollowUp,
    report: &InputReport,
) -> (Cycle, Option<Cycle>) {
    let first = responder.respond(report);
    let second = if follow_up.applies(first.outcome) {
        Some(responder.respond(report))
    } else {
        None
    };
    (first, second)
}

fn log_cycle(cycle: &Cycle) {
    match (cycle.outcome, cycle.received) {
        (_, Err(ReceiveError::Timeout)) => log::trace!("no command before the wait limit"),
        (_, Err(err)) => log::debug!("no command: {err}"),
        (ProtocolOutcome::NoCommand, Ok(len)) => match cycle.opcode() {
            Some(opcode) => log::debug!("ignored {len} byte frame, opcode {opcode:#04x}"),
            None => log::debug!("ignored truncated frame"),
        },
        (outcome, Ok(_)) => log::trace!("{outcome:?}"),
    }
}

#[cfg(test)]
mod tests {
    use n64_sim::{SimBus, SimDelay, SimInterrupts, SimPin};

    use super::*;
    use crate::{
        proto::cmds,
        report::Buttons,
        timing::{Timing, TimingError, WaitLimit},
    };

    fn config() -> Config {
        Config::new().with_timing(Timing::new().with_command_wait(WaitLimit::Spins(10_000)))
    }

    fn controller(bus: &SimBus, config: Config) -> Controller<SimPin, SimDelay, SimInterrupts> {
        Controller::new(bus.pin(), bus.delay(), bus.interrupts(), config).unwrap()
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let bus = SimBus::new();
        let config = Config::new().with_timing(Timing::new().with_sample_delay_us(3));

        let result = Controller::new(bus.pin(), bus.delay(), bus.interrupts(), config);

        assert!(matches!(
            result,
            Err(ConfigError::Timing(TimingError::SampleOutOfRange { .. }))
        ));
    }

    #[test]
    fn test_new_does_not_touch_pin() {
        let bus = SimBus::new();

        let controller = controller(&bus, config());

        assert!(bus.pin_events().is_empty());
        assert_eq!(controller.last_outcome(), ProtocolOutcome::NoCommand);
        assert_eq!(controller.status(), &StatusReport::DEFAULT);
    }

    #[test]
    fn test_identify_then_poll_in_one_call() {
        let bus = SimBus::new();
        bus.queue_command(&[cmds::IDENTIFY]);
        bus.queue_command(&[cmds::POLL]);
        let mut controller = controller(&bus, config());
        let report = InputReport::NEUTRAL
            .with_buttons(Buttons::B | Buttons::Z)
            .with_stick(-128, 127);

        let exchange = controller.exchange(&report);

        assert_eq!(exchange.first, ProtocolOutcome::IdentifyAnswered);
        assert_eq!(exchange.follow_up, Some(ProtocolOutcome::PollAnswered));
        assert!(exchange.answered());
        assert_eq!(controller.last_outcome(), ProtocolOutcome::PollAnswered);
        assert_eq!(
            bus.transmitted_bytes(),
            vec![vec![0x05, 0x00, 0x02], vec![0x60, 0x00, 0x80, 0x7F]]
        );
        assert_eq!(bus.pending_frames(), 0);
    }

    #[test]
    fn test_poll_alone_runs_one_cycle() {
        let bus = SimBus::new();
        bus.queue_command(&[cmds::POLL]);
        bus.queue_command(&[cmds::POLL]);
        let mut controller = controller(&bus, config());

        let exchange = controller.exchange(&InputReport::NEUTRAL);

        assert_eq!(exchange.first, ProtocolOutcome::PollAnswered);
        assert_eq!(exchange.follow_up, None);
        assert_eq!(bus.transmitted_bytes(), vec![vec![0x00, 0x00, 0x00, 0x00]]);
        assert_eq!(bus.pending_frames(), 1);
    }

    #[test]
    fn test_follow_up_never() {
        let bus = SimBus::new();
        bus.queue_command(&[cmds::IDENTIFY]);
        bus.queue_command(&[cmds::POLL]);
        let mut controller = controller(&bus, config().with_follow_up(FollowUp::Never));

        let exchange = controller.exchange(&InputReport::NEUTRAL);

        assert_eq!(exchange.first, ProtocolOutcome::IdentifyAnswered);
        assert_eq!(exchange.follow_up, None);
        assert_eq!(bus.pending_frames(), 1);
    }

    #[test]
    fn test_write_returns_answered() {
        let bus = SimBus::new();
        bus.queue_command(&[cmds::POLL]);
        let mut controller = controller(&bus, config());

        assert!(controller.write(&InputReport::NEUTRAL));
        assert!(!controller.write(&InputReport::NEUTRAL));
        assert_eq!(controller.last_outcome(), ProtocolOutcome::NoCommand);
    }

    #[test]
    fn test_write_counts_identify_when_follow_up_times_out() {
        let bus = SimBus::new();
        bus.queue_command(&[cmds::IDENTIFY]);
        let mut controller = controller(&bus, config());

        let exchange = controller.exchange(&InputReport::NEUTRAL);

        assert_eq!(exchange.first, ProtocolOutcome::IdentifyAnswered);
        assert_eq!(exchange.follow_up, Some(ProtocolOutcome::NoCommand));
        assert_eq!(exchange.last(), ProtocolOutcome::NoCommand);
        assert!(exchange.answered());
    }

    #[test]
    fn test_bus_access_with_interrupts_masked() {
        let bus = SimBus::new();
        bus.queue_command(&[cmds::IDENTIFY]);
        bus.queue_command(&[cmds::POLL]);
        let mut controller = controller(&bus, config());

        controller.write(&InputReport::NEUTRAL);

        assert_eq!(bus.unguarded_accesses(), 0);
        assert!(bus.interrupts_enabled());
    }

    #[test]
    fn test_respond_once() {
        let bus = SimBus::new();
        bus.queue_command(&[cmds::IDENTIFY]);
        bus.queue_command(&[cmds::POLL]);
        let mut controller = controller(&bus, config());

        let outcome = controller.respond_once(&InputReport::NEUTRAL);

        assert_eq!(outcome, ProtocolOutcome::IdentifyAnswered);
        assert_eq!(controller.last_outcome(), ProtocolOutcome::IdentifyAnswered);
        assert_eq!(bus.pending_frames(), 1);
        assert_eq!(bus.unguarded_accesses(), 0);
    }

    #[test]
    fn test_custom_status() {
        let bus = SimBus::new();
        bus.queue_command(&[cmds::IDENTIFY]);
        let status = StatusReport::DEFAULT.with_rumble(true);
        let config = config().with_status(status).with_follow_up(FollowUp::Never);
        let mut controller = controller(&bus, config);

        controller.write(&InputReport::NEUTRAL);

        assert_eq!(bus.transmitted_bytes(), vec![vec![0x05, 0x00, 0x0A]]);
    }

    #[test]
    fn test_without_interrupts() {
        let bus = SimBus::new();
        bus.queue_command(&[cmds::POLL]);
        let mut controller =
            Controller::without_interrupts(bus.pin(), bus.delay(), config()).unwrap();

        assert!(controller.write(&InputReport::NEUTRAL.with_buttons(Buttons::C_RIGHT)));
        assert_eq!(bus.transmitted_bytes(), vec![vec![0x00, 0x01, 0x00, 0x00]]);
    }

    #[test]
    fn test_release() {
        let bus = SimBus::new();
        let controller = controller(&bus, config());

        let (_pin, _delay, _irq) = controller.release();

        assert!(bus.interrupts_enabled());
    }
}
