//! Data line pin capability.

use core::ops::Not;

/// Logic level on the data line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Level {
    Low,
    High,
}

impl Level {
    /// Returns `true` if the level is [`Level::High`].
    #[inline]
    pub const fn is_high(self) -> bool {
        matches!(self, Level::High)
    }

    /// Returns `true` if the level is [`Level::Low`].
    #[inline]
    pub const fn is_low(self) -> bool {
        matches!(self, Level::Low)
    }
}

impl From<bool> for Level {
    #[inline]
    fn from(high: bool) -> Self {
        if high { Level::High } else { Level::Low }
    }
}

impl From<Level> for bool {
    #[inline]
    fn from(level: Level) -> Self {
        level.is_high()
    }
}

impl Not for Level {
    type Output = Level;

    #[inline]
    fn not(self) -> Self::Output {
        match self {
            Level::Low => Level::High,
            Level::High => Level::Low,
        }
    }
}

/// Pin direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    Input,
    Output,
}

/// Internal pull resistor configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Pull {
    /// Pull-up enabled. The idle bus level is high.
    Up,
    /// No internal pull. The bus relies on the console's pull-up.
    None,
}

/// A single GPIO pin wired to the controller data line.
///
/// These five primitives are the only hardware access the protocol engine
/// performs. Implementations must be cheap: `read` and `write` are called from
/// busy-wait loops where every cycle counts against the bus timing budget.
pub trait Pin {
    /// Switches the pin between input and output.
    fn set_direction(&mut self, direction: Direction);

    /// Configures the internal pull resistor.
    fn set_pull(&mut self, pull: Pull);

    /// Enables or disables open-drain drive mode.
    fn set_open_drain(&mut self, enabled: bool);

    /// Drives the pin to the given level.
    fn write(&mut self, level: Level);

    /// Samples the current line level.
    fn read(&mut self) -> Level;
}

impl<P: Pin + ?Sized> Pin for &mut P {
    #[inline]
    fn set_direction(&mut self, direction: Direction) {
        P::set_direction(self, direction)
    }

    #[inline]
    fn set_pull(&mut self, pull: Pull) {
        P::set_pull(self, pull)
    }

    #[inline]
    fn set_open_drain(&mut self, enabled: bool) {
        P::set_open_drain(self, enabled)
    }

    #[inline]
    fn write(&mut self, level: Level) {
        P::write(self, level)
    }

    #[inline]
    fn read(&mut self) -> Level {
        P::read(self)
    }
}
