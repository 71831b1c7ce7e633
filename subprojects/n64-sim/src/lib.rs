//! # n64-sim
//!
//! Host-side simulation of the N64 controller data line.
//!
//! A [`SimBus`] keeps a virtual clock (nanoseconds) and models the line as a
//! wired-AND of two drivers: the scripted console and the device under test.
//! The device side is accessed through [`SimPin`], [`SimDelay`] and
//! [`SimInterrupts`], which implement the `n64-hal` traits:
//!
//! - [`SimDelay`] advances the clock by exactly the requested time;
//! - every [`SimPin::read`] costs a configurable number of nanoseconds, so
//!   busy-wait loops make progress;
//! - [`SimInterrupts`] tracks the global enable bit, and every pin access made
//!   while interrupts are enabled is counted.
//!
//! Console frames queued with [`SimBus::queue_command`] are driven onto the
//! line each time the device switches its pin to input. Whatever the device
//! drives while its pin is an output is captured as a [`Transmission`].

use std::{cell::RefCell, collections::VecDeque, rc::Rc};

use n64_hal::{Delay, Direction, Interrupts, Level, Pin, Pull};

mod capture;
mod console;

pub use self::{
    capture::{PulseWidth, Transmission},
    console::ConsoleFrame,
};

/// Default cost of a single pin read, in nanoseconds.
pub const DEFAULT_READ_COST_NS: u64 = 20;

/// Default time between the device entering receive mode and the console
/// starting its frame, in nanoseconds.
pub const DEFAULT_LEAD_IN_NS: u64 = 5_000;

/// A pin configuration change observed on the device side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinEvent {
    Direction(Direction),
    Pull(Pull),
    OpenDrain(bool),
}

struct BusState {
    now_ns: u64,
    read_cost_ns: u64,
    lead_in_ns: u64,

    direction: Direction,
    out_level: Level,
    events: Vec<PinEvent>,

    queue: VecDeque<ConsoleFrame>,
    console_lows: Vec<(u64, u64)>,
    frames_started: usize,

    capture: Option<Vec<(u64, Level)>>,
    transmissions: Vec<Transmission>,

    irq_enabled: bool,
    unguarded_accesses: usize,
}

impl BusState {
    fn line_level(&self, t: u64) -> Level {
        if self.direction == Direction::Output && self.out_level.is_low() {
            return Level::Low;
        }

        let console_low = self
            .console_lows
            .iter()
            .any(|&(start, end)| start <= t && t < end);

        // Both sides are open-drain with a pull-up on the console end
        if console_low { Level::Low } else { Level::High }
    }

    fn console_busy(&self) -> bool {
        self.console_lows
            .last()
            .is_some_and(|&(_, end)| self.now_ns < end)
    }

    fn note_access(&mut self) {
        if self.irq_enabled {
            self.unguarded_accesses += 1;
        }
    }

    fn finish_capture(&mut self) {
        if let Some(edges) = self.capture.take() {
            if let Some(transmission) = Transmission::from_edges(&edges) {
                self.transmissions.push(transmission);
            }
        }
    }

    fn start_console_frame(&mut self) {
        if self.console_busy() {
            return;
        }

        let Some(frame) = self.queue.pop_front() else {
            return;
        };

        let start = self.now_ns + self.lead_in_ns;
        log::trace!(
            "console frame #{} with {} bits starts at {} ns",
            self.frames_started,
            frame.bits().len(),
            start
        );
        self.console_lows.extend(frame.low_intervals(start));
        self.frames_started += 1;
    }
}

/// Shared simulated bus.
///
/// Cloning the bus is cheap; all clones and handles refer to the same line.
#[derive(Clone)]
pub struct SimBus {
    state: Rc<RefCell<BusState>>,
}

impl SimBus {
    /// Creates an idle bus at time zero, with interrupts enabled and the
    /// device pin configured as an input.
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(BusState {
                now_ns: 0,
                read_cost_ns: DEFAULT_READ_COST_NS,
                lead_in_ns: DEFAULT_LEAD_IN_NS,
                direction: Direction::Input,
                out_level: Level::High,
                events: Vec::new(),
                queue: VecDeque::new(),
                console_lows: Vec::new(),
                frames_started: 0,
                capture: None,
                transmissions: Vec::new(),
                irq_enabled: true,
                unguarded_accesses: 0,
            })),
        }
    }

    /// Sets the virtual cost of one pin read.
    pub fn with_read_cost_ns(self, ns: u64) -> Self {
        self.state.borrow_mut().read_cost_ns = ns;
        self
    }

    /// Sets the delay between the device entering receive mode and the start
    /// of the next console frame.
    pub fn with_lead_in_ns(self, ns: u64) -> Self {
        self.state.borrow_mut().lead_in_ns = ns;
        self
    }

    /// Returns a pin handle for the device side.
    pub fn pin(&self) -> SimPin {
        SimPin { bus: self.clone() }
    }

    /// Returns a delay handle advancing this bus' clock.
    pub fn delay(&self) -> SimDelay {
        SimDelay { bus: self.clone() }
    }

    /// Returns an interrupt controller handle.
    pub fn interrupts(&self) -> SimInterrupts {
        SimInterrupts { bus: self.clone() }
    }

    /// Queues a console command: `bytes` MSB first followed by a stop bit.
    pub fn queue_command(&self, bytes: &[u8]) {
        self.queue_frame(ConsoleFrame::from_bytes(bytes));
    }

    /// Queues an arbitrary console frame.
    pub fn queue_frame(&self, frame: ConsoleFrame) {
        self.state.borrow_mut().queue.push_back(frame);
    }

    /// Number of queued console frames not yet driven onto the line.
    pub fn pending_frames(&self) -> usize {
        self.state.borrow().queue.len()
    }

    /// Current virtual time in nanoseconds.
    pub fn now_ns(&self) -> u64 {
        self.state.borrow().now_ns
    }

    /// Line level at the current virtual time.
    pub fn line_level(&self) -> Level {
        let state = self.state.borrow();
        state.line_level(state.now_ns)
    }

    /// Returns every frame the device transmitted so far.
    ///
    /// A transmission is closed when the device switches its pin back to
    /// input; one still in progress is included as well.
    pub fn transmissions(&self) -> Vec<Transmission> {
        let state = self.state.borrow();
        let mut out = state.transmissions.clone();
        if let Some(edges) = &state.capture {
            out.extend(Transmission::from_edges(edges));
        }
        out
    }

    /// Decoded bytes of every transmission.
    pub fn transmitted_bytes(&self) -> Vec<Vec<u8>> {
        self.transmissions().iter().map(Transmission::bytes).collect()
    }

    /// Pin configuration changes, in order.
    pub fn pin_events(&self) -> Vec<PinEvent> {
        self.state.borrow().events.clone()
    }

    /// Whether interrupts are currently enabled.
    pub fn interrupts_enabled(&self) -> bool {
        self.state.borrow().irq_enabled
    }

    /// Number of pin accesses made while interrupts were enabled.
    pub fn unguarded_accesses(&self) -> usize {
        self.state.borrow().unguarded_accesses
    }
}

impl Default for SimBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Device-side pin on a [`SimBus`].
pub struct SimPin {
    bus: SimBus,
}

impl Pin for SimPin {
    fn set_direction(&mut self, direction: Direction) {
        let mut state = self.bus.state.borrow_mut();
        state.note_access();
        state.events.push(PinEvent::Direction(direction));

        match direction {
            Direction::Output => {
                state.finish_capture();
                state.capture = Some(Vec::new());
                state.direction = Direction::Output;
            }
            Direction::Input => {
                state.finish_capture();
                state.direction = Direction::Input;
                state.start_console_frame();
            }
        }
    }

    fn set_pull(&mut self, pull: Pull) {
        let mut state = self.bus.state.borrow_mut();
        state.note_access();
        state.events.push(PinEvent::Pull(pull));
    }

    fn set_open_drain(&mut self, enabled: bool) {
        let mut state = self.bus.state.borrow_mut();
        state.note_access();
        state.events.push(PinEvent::OpenDrain(enabled));
    }

    fn write(&mut self, level: Level) {
        let mut state = self.bus.state.borrow_mut();
        state.note_access();
        state.out_level = level;

        let now = state.now_ns;
        if let Some(edges) = state.capture.as_mut() {
            edges.push((now, level));
        }
    }

    fn read(&mut self) -> Level {
        let mut state = self.bus.state.borrow_mut();
        state.note_access();
        let cost = state.read_cost_ns;
        state.now_ns += cost;
        state.line_level(state.now_ns)
    }
}

/// Busy-wait delay on a [`SimBus`] clock.
pub struct SimDelay {
    bus: SimBus,
}

impl Delay for SimDelay {
    fn delay_us(&mut self, us: u32) {
        self.bus.state.borrow_mut().now_ns += u64::from(us) * 1_000;
    }
}

/// Global interrupt enable bit of a [`SimBus`].
pub struct SimInterrupts {
    bus: SimBus,
}

impl Interrupts for SimInterrupts {
    type State = bool;

    fn disable(&mut self) -> bool {
        core::mem::replace(&mut self.bus.state.borrow_mut().irq_enabled, false)
    }

    fn restore(&mut self, state: bool) {
        self.bus.state.borrow_mut().irq_enabled = state;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idle_line_is_high() {
        let bus = SimBus::new();
        let mut pin = bus.pin();

        assert_eq!(pin.read(), Level::High);
        assert_eq!(bus.now_ns(), DEFAULT_READ_COST_NS);
    }

    #[test]
    fn test_delay_advances_clock() {
        let bus = SimBus::new();
        let mut delay = bus.delay();

        delay.delay_us(3);

        assert_eq!(bus.now_ns(), 3_000);
    }

    #[test]
    fn test_console_frame_starts_on_input() {
        let bus = SimBus::new().with_lead_in_ns(1_000);
        bus.queue_command(&[0x80]);
        let mut pin = bus.pin();
        let mut delay = bus.delay();

        pin.set_direction(Direction::Input);
        assert_eq!(bus.pending_frames(), 0);

        // Lead-in: high
        assert_eq!(bus.line_level(), Level::High);

        // First bit is a 1: one unit low, three units high
        delay.delay_us(1);
        assert_eq!(bus.line_level(), Level::Low);
        delay.delay_us(1);
        assert_eq!(bus.line_level(), Level::High);

        // Second bit is a 0: three units low
        delay.delay_us(3);
        assert_eq!(bus.line_level(), Level::Low);
        delay.delay_us(2);
        assert_eq!(bus.line_level(), Level::Low);
        delay.delay_us(1);
        assert_eq!(bus.line_level(), Level::High);
    }

    #[test]
    fn test_device_drive_wins_over_pull_up() {
        let bus = SimBus::new();
        let mut pin = bus.pin();

        pin.set_direction(Direction::Output);
        pin.write(Level::Low);
        assert_eq!(bus.line_level(), Level::Low);

        pin.write(Level::High);
        assert_eq!(bus.line_level(), Level::High);
    }

    #[test]
    fn test_transmission_capture() {
        let bus = SimBus::new();
        let mut pin = bus.pin();
        let mut delay = bus.delay();

        pin.set_direction(Direction::Output);
        pin.write(Level::High);
        // A single 1 bit then a 2us stop bit
        pin.write(Level::Low);
        delay.delay_us(1);
        pin.write(Level::High);
        delay.delay_us(3);
        pin.write(Level::Low);
        delay.delay_us(2);
        pin.write(Level::High);
        pin.set_direction(Direction::Input);

        let transmissions = bus.transmissions();
        assert_eq!(transmissions.len(), 1);

        let tx = &transmissions[0];
        assert_eq!(
            tx.pulses,
            vec![PulseWidth {
                low_ns: 1_000,
                high_ns: 3_000
            }]
        );
        assert_eq!(tx.stop_low_ns, Some(2_000));
        assert!(tx.released);
    }

    #[test]
    fn test_interrupt_tracking() {
        let bus = SimBus::new();
        let mut pin = bus.pin();
        let mut irq = bus.interrupts();

        pin.read();
        assert_eq!(bus.unguarded_accesses(), 1);

        let previous = irq.disable();
        assert!(previous);
        pin.read();
        irq.restore(previous);

        assert_eq!(bus.unguarded_accesses(), 1);
        assert!(bus.interrupts_enabled());
    }

    #[test]
    fn test_pin_events_recorded_in_order() {
        let bus = SimBus::new();
        let mut pin = bus.pin();

        pin.set_direction(Direction::Output);
        pin.set_pull(Pull::Up);
        pin.set_open_drain(false);

        assert_eq!(
            bus.pin_events(),
            vec![
                PinEvent::Direction(Direction::Output),
                PinEvent::Pull(Pull::Up),
                PinEvent::OpenDrain(false),
            ]
        );
    }
}
