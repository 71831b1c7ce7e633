//! Pulse-width bit codec.
//!
//! Every bit on the joybus is four time units long and starts with a falling
//! edge. The width of the low phase carries the value:
//!
//! ```text
//!  0 bit:  ‾‾\___________/‾‾‾   3 units low, 1 unit high
//!  1 bit:  ‾‾\___/‾‾‾‾‾‾‾‾‾‾‾   1 unit low, 3 units high
//! ```
//!
//! Bytes are sent most significant bit first. The receive path detects each
//! falling edge, waits for the configured sample delay and reads the line: high
//! means the low phase was short (a 1), low means it was long (a 0).

use core::{iter::FusedIterator, slice};

use n64_hal::{Delay, Level, Pin};

use crate::{
    proto::BITS_PER_BYTE,
    timing::{Timing, WaitLimit},
};

/// One encoded bit: a low phase followed by a high phase, in time units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Pulse {
    pub low_units: u8,
    pub high_units: u8,
}

impl Pulse {
    /// Width of every bit, in units.
    pub const UNITS: u8 = 4;

    /// Encoding of a 0 bit.
    pub const ZERO: Self = Self {
        low_units: 3,
        high_units: 1,
    };

    /// Encoding of a 1 bit.
    pub const ONE: Self = Self {
        low_units: 1,
        high_units: 3,
    };

    /// Returns the pulse encoding `bit`.
    #[inline]
    pub const fn for_bit(bit: bool) -> Self {
        if bit { Self::ONE } else { Self::ZERO }
    }

    /// Returns the bit value carried by this pulse.
    #[inline]
    pub const fn bit(self) -> bool {
        self.low_units < self.high_units
    }
}

/// Encodes one byte as eight pulses, most significant bit first.
pub const fn encode_byte(byte: u8) -> [Pulse; 8] {
    let mut pulses = [Pulse::ZERO; 8];
    let mut i = 0;
    while i < 8 {
        pulses[i] = Pulse::for_bit(byte & (0x80 >> i) != 0);
        i += 1;
    }
    pulses
}

/// Returns an iterator over the pulses encoding `bytes`.
pub fn pulses(bytes: &[u8]) -> Pulses<'_> {
    Pulses {
        bytes: bytes.iter(),
        current: 0,
        remaining: 0,
    }
}

/// Iterator over the pulses of a byte stream. See [`pulses`].
#[derive(Debug, Clone)]
pub struct Pulses<'a> {
    bytes: slice::Iter<'a, u8>,
    current: u8,
    remaining: u8,
}

impl Iterator for Pulses<'_> {
    type Item = Pulse;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            self.current = *self.bytes.next()?;
            self.remaining = BITS_PER_BYTE;
        }

        self.remaining -= 1;
        Some(Pulse::for_bit(self.current & (1 << self.remaining) != 0))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.bytes.len() * BITS_PER_BYTE as usize + self.remaining as usize;
        (len, Some(len))
    }
}

impl ExactSizeIterator for Pulses<'_> {}

impl FusedIterator for Pulses<'_> {}

/// Accumulates received bits into bytes, most significant bit first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ByteAccumulator {
    value: u8,
    bits: u8,
}

impl ByteAccumulator {
    /// Creates an empty accumulator.
    pub const fn new() -> Self {
        Self { value: 0, bits: 0 }
    }

    /// Shifts in one bit. Returns the byte once eight bits were pushed, and
    /// starts over with the next one.
    #[inline]
    pub fn push(&mut self, bit: bool) -> Option<u8> {
        self.value = (self.value << 1) | u8::from(bit);
        self.bits += 1;

        if self.bits == BITS_PER_BYTE {
            let byte = self.value;
            *self = Self::new();
            Some(byte)
        } else {
            None
        }
    }

    /// Number of bits of the incomplete byte.
    #[inline]
    pub const fn pending_bits(&self) -> u8 {
        self.bits
    }
}

/// Drives `bytes` onto the line.
///
/// The pin must already be an output idling high. No stop bit is sent; see
/// [`Transport::send_frame`](crate::frame::Transport::send_frame).
pub fn send_bytes<P: Pin, D: Delay>(pin: &mut P, delay: &mut D, timing: &Timing, bytes: &[u8]) {
    for pulse in pulses(bytes) {
        pin.write(Level::Low);
        delay.delay_us(timing.units(pulse.low_units));
        pin.write(Level::High);
        delay.delay_us(timing.units(pulse.high_units));
    }
}

/// Receives a frame from the line into `buf`.
///
/// Waits for an idle (high) line, then for the first falling edge, both bounded
/// by [`Timing::command_wait`]. Bits are then sampled until no falling edge
/// shows up within [`Timing::bit_gap_spins`], which marks the end of the frame.
/// A trailing incomplete byte (such as the console's stop bit) is dropped.
///
/// Returns the number of complete bytes on the line. This may be larger than
/// `buf.len()`, in which case the excess bytes were not stored.
pub fn receive_bytes<P: Pin, D: Delay>(
    pin: &mut P,
    delay: &mut D,
    timing: &Timing,
    buf: &mut [u8],
) -> Result<usize, ReceiveError> {
    let gap = WaitLimit::Spins(timing.bit_gap_spins);

    // A frame already in progress cannot be decoded
    wait_for(pin, Level::High, timing.command_wait).map_err(|_| ReceiveError::Timeout)?;
    wait_for(pin, Level::Low, timing.command_wait).map_err(|_| ReceiveError::Timeout)?;

    let mut acc = ByteAccumulator::new();
    let mut received = 0;

    loop {
        delay.delay_us(timing.sample_delay_us);
        let bit = pin.read().is_high();

        if let Some(byte) = acc.push(bit) {
            if let Some(slot) = buf.get_mut(received) {
                *slot = byte;
            }
            received += 1;
        }

        wait_for(pin, Level::High, gap).map_err(|_| ReceiveError::LineStuckLow)?;
        if wait_for(pin, Level::Low, gap).is_err() {
            break;
        }
    }

    Ok(received)
}

/// Busy-waits until the line reads `level`.
#[inline(always)]
fn wait_for<P: Pin>(pin: &mut P, level: Level, limit: WaitLimit) -> Result<(), Expired> {
    match limit {
        WaitLimit::Unbounded => {
            while pin.read() != level {}
            Ok(())
        }
        WaitLimit::Spins(max) => {
            for _ in 0..max {
                if pin.read() == level {
                    return Ok(());
                }
            }
            Err(Expired)
        }
    }
}

/// A bounded wait ran out of spins.
struct Expired;

/// Errors of the receive path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReceiveError {
    /// No command frame started within the command wait limit.
    #[error("no command frame before the wait limit")]
    Timeout,
    /// The line did not return high within a bit period.
    #[error("data line stuck low")]
    LineStuckLow,
}
