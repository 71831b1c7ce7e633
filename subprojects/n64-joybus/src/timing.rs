//! Bus timing configuration.
//!
//! All pulse widths derive from a single time unit (nominally 1 µs). The
//! console tolerates roughly ±0.5 µs per phase, so the unit is a compile-time
//! choice of the board, not something to tune at runtime.
//!
//! Waiting for the console is a busy-wait on the pin level. Each wait is bounded
//! by a spin budget (one spin = one pin read), except the wait for a new command
//! which may be [`WaitLimit::Unbounded`].

use crate::codec::Pulse;

/// Default time unit, in microseconds.
pub const DEFAULT_UNIT_US: u32 = 1;

/// Default stop bit width, in units.
pub const DEFAULT_STOP_UNITS: u32 = 2;

/// Default delay between a falling edge and the bit sample, in microseconds.
///
/// Two units is the middle of a bit: a 1 bit is high again after one unit, a 0
/// bit stays low for three.
pub const DEFAULT_SAMPLE_DELAY_US: u32 = 2;

/// Default spin budget between two bits of a frame.
pub const DEFAULT_BIT_GAP_SPINS: u32 = 256;

/// Upper bound of a busy-wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WaitLimit {
    /// Wait until the level shows up, however long that takes.
    Unbounded,
    /// Give up after this many pin reads.
    Spins(u32),
}

/// Timing parameters of the bit codec and frame transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Timing {
    /// Base pulse width quantum, in microseconds.
    pub unit_us: u32,
    /// Width of the stop bit sent after a response, in units.
    pub stop_units: u32,
    /// Delay between a falling edge and the bit sample, in microseconds.
    pub sample_delay_us: u32,
    /// Limit of the wait for the first edge of a command frame.
    pub command_wait: WaitLimit,
    /// Spin budget between two bits. Running out of it ends the frame.
    pub bit_gap_spins: u32,
}

impl Timing {
    /// Default timing: 1 µs unit, 2 unit stop bit, mid-bit sampling and an
    /// unbounded wait for commands.
    pub const DEFAULT: Self = Self::new();

    /// Creates the default timing.
    pub const fn new() -> Self {
        Self {
            unit_us: DEFAULT_UNIT_US,
            stop_units: DEFAULT_STOP_UNITS,
            sample_delay_us: DEFAULT_SAMPLE_DELAY_US,
            command_wait: WaitLimit::Unbounded,
            bit_gap_spins: DEFAULT_BIT_GAP_SPINS,
        }
    }

    /// Sets the time unit.
    pub const fn with_unit_us(mut self, unit_us: u32) -> Self {
        self.unit_us = unit_us;
        self
    }

    /// Sets the stop bit width, in units.
    pub const fn with_stop_units(mut self, stop_units: u32) -> Self {
        self.stop_units = stop_units;
        self
    }

    /// Sets the sample delay.
    ///
    /// `1` samples right after the low phase of a 1 bit, as the first
    /// firmware did; the default samples in the middle of the bit.
    pub const fn with_sample_delay_us(mut self, sample_delay_us: u32) -> Self {
        self.sample_delay_us = sample_delay_us;
        self
    }

    /// Sets the limit of the wait for a command frame.
    pub const fn with_command_wait(mut self, command_wait: WaitLimit) -> Self {
        self.command_wait = command_wait;
        self
    }

    /// Sets the spin budget between two bits.
    pub const fn with_bit_gap_spins(mut self, bit_gap_spins: u32) -> Self {
        self.bit_gap_spins = bit_gap_spins;
        self
    }

    /// Converts a number of units to microseconds.
    #[inline]
    pub const fn units(&self, units: u8) -> u32 {
        (units as u32).saturating_mul(self.unit_us)
    }

    /// Stop bit width, in microseconds.
    #[inline]
    pub const fn stop_us(&self) -> u32 {
        self.stop_units.saturating_mul(self.unit_us)
    }

    /// Checks that the parameters describe a decodable bus.
    pub fn validate(&self) -> Result<(), TimingError> {
        if self.unit_us == 0 {
            return Err(TimingError::ZeroUnit);
        }

        if self.stop_units == 0 {
            return Err(TimingError::ZeroStopBit);
        }

        // A whole bit and the stop bit must be representable in microseconds
        let bit_us = self.unit_us.checked_mul(u32::from(Pulse::UNITS));
        let stop_us = self.stop_units.checked_mul(self.unit_us);
        let (Some(_), Some(_)) = (bit_us, stop_us) else {
            return Err(TimingError::Overflow);
        };

        // The sample must land after the low phase of a 1 bit and before the
        // end of the low phase of a 0 bit.
        let min = self.unit_us;
        let max = self.units(Pulse::ZERO.low_units);
        if self.sample_delay_us < min || self.sample_delay_us >= max {
            return Err(TimingError::SampleOutOfRange {
                sample_us: self.sample_delay_us,
                min_us: min,
                max_us: max,
            });
        }

        if self.bit_gap_spins == 0 {
            return Err(TimingError::ZeroGapLimit);
        }

        if self.command_wait == WaitLimit::Spins(0) {
            return Err(TimingError::ZeroCommandWait);
        }

        Ok(())
    }
}

impl Default for Timing {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Invalid [`Timing`] parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimingError {
    /// The time unit is zero.
    #[error("time unit must be non-zero")]
    ZeroUnit,
    /// The stop bit is zero units wide.
    #[error("stop bit must be at least one unit wide")]
    ZeroStopBit,
    /// The sample point does not separate a 1 bit from a 0 bit.
    #[error("sample delay {sample_us}us outside [{min_us}us, {max_us}us)")]
    SampleOutOfRange {
        sample_us: u32,
        min_us: u32,
        max_us: u32,
    },
    /// A bit or the stop bit is too long to express in microseconds.
    #[error("bit or stop bit width overflows u32 microseconds")]
    Overflow,
    /// The inter-bit spin budget is zero.
    #[error("bit gap spin budget must be non-zero")]
    ZeroGapLimit,
    /// The command wait is bounded to zero spins.
    #[error("command wait spin budget must be non-zero")]
    ZeroCommandWait,
}
