//! Frame transport.
//!
//! A frame is one or more encoded bytes followed by a stop bit. The same pin
//! carries both directions, so every send and receive starts by reconfiguring
//! it. Callers must not assume the pin mode survives a call.

use n64_hal::{Delay, Direction, Level, Pin, Pull};

use crate::{
    codec::{self, ReceiveError},
    timing::{Timing, TimingError},
};

/// Sends and receives whole frames on the data line.
///
/// Owns the pin and the delay for as long as the bus is in use; use
/// [`into_parts`](Transport::into_parts) to get them back.
pub struct Transport<P, D> {
    pin: P,
    delay: D,
    timing: Timing,
}

impl<P: Pin, D: Delay> Transport<P, D> {
    /// Creates a transport after validating `timing`.
    pub fn new(pin: P, delay: D, timing: Timing) -> Result<Self, TimingError> {
        timing.validate()?;
        Ok(Self { pin, delay, timing })
    }

    /// Returns the timing in use.
    #[inline]
    pub fn timing(&self) -> &Timing {
        &self.timing
    }

    /// Sends `buf` followed by the stop bit.
    ///
    /// The pin is switched to a push-pull output idling high before the first
    /// bit, and left released high after the stop bit.
    pub fn send_frame(&mut self, buf: &[u8]) {
        self.pin.set_direction(Direction::Output);
        self.pin.set_pull(Pull::Up);
        self.pin.set_open_drain(false);
        self.pin.write(Level::High);

        codec::send_bytes(&mut self.pin, &mut self.delay, &self.timing, buf);

        self.pin.write(Level::Low);
        self.delay.delay_us(self.timing.stop_us());
        self.pin.write(Level::High);
    }

    /// Receives a frame into `buf`.
    ///
    /// The pin is switched to an open-drain input with pull-up first. Returns the
    /// number of complete bytes seen on the line; see
    /// [`codec::receive_bytes`].
    pub fn receive_frame(&mut self, buf: &mut [u8]) -> Result<usize, ReceiveError> {
        self.pin.set_direction(Direction::Input);
        self.pin.set_pull(Pull::Up);
        self.pin.set_open_drain(true);

        codec::receive_bytes(&mut self.pin, &mut self.delay, &self.timing, buf)
    }

    /// Releases the pin and the delay.
    pub fn into_parts(self) -> (P, D) {
        (self.pin, self.delay)
    }
}
