//! Busy-wait delay capability.

/// Busy-wait delay with microsecond resolution.
///
/// The joybus tolerates roughly half a microsecond of error per pulse, so
/// implementations must be calibrated against the core clock and must not
/// yield to a scheduler.
pub trait Delay {
    /// Spins for `us` microseconds.
    fn delay_us(&mut self, us: u32);
}

impl<D: Delay + ?Sized> Delay for &mut D {
    #[inline]
    fn delay_us(&mut self, us: u32) {
        D::delay_us(self, us)
    }
}
