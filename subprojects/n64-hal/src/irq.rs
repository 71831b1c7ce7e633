//! Global interrupt control.
//!
//! Joybus pulses are one to three microseconds wide; a single interrupt
//! handler running in the middle of a frame corrupts it. Every bus exchange
//! therefore runs inside an [`InterruptGuard`], which disables interrupts when
//! created and restores the previous state when dropped.

use core::fmt;

/// Global interrupt enable/disable.
pub trait Interrupts {
    /// Opaque snapshot of the interrupt state taken by [`disable`].
    ///
    /// [`disable`]: Interrupts::disable
    type State: Copy;

    /// Disables interrupts and returns the state that was active before.
    fn disable(&mut self) -> Self::State;

    /// Restores a state previously returned by [`disable`].
    ///
    /// [`disable`]: Interrupts::disable
    fn restore(&mut self, state: Self::State);
}

impl<I: Interrupts + ?Sized> Interrupts for &mut I {
    type State = I::State;

    #[inline]
    fn disable(&mut self) -> Self::State {
        I::disable(self)
    }

    #[inline]
    fn restore(&mut self, state: Self::State) {
        I::restore(self, state)
    }
}

/// Interrupt controller for targets without preemption (or where the caller
/// already masks interrupts).
#[derive(Debug, Default, Clone, Copy)]
pub struct NoInterrupts;

impl Interrupts for NoInterrupts {
    type State = ();

    #[inline]
    fn disable(&mut self) -> Self::State {}

    #[inline]
    fn restore(&mut self, _state: Self::State) {}
}

/// RAII guard keeping interrupts disabled.
///
/// Interrupts are disabled when the guard is created. When the guard goes out
/// of scope the state captured at creation is restored, so nested guards leave
/// interrupts disabled until the outermost one is dropped.
pub struct InterruptGuard<'a, I: Interrupts> {
    irq: &'a mut I,
    state: I::State,
}

impl<'a, I: Interrupts> InterruptGuard<'a, I> {
    /// Disables interrupts until the returned guard is dropped.
    #[inline]
    pub fn new(irq: &'a mut I) -> Self {
        let state = irq.disable();
        Self { irq, state }
    }
}

impl<I: Interrupts> Drop for InterruptGuard<'_, I> {
    #[inline]
    fn drop(&mut self) {
        self.irq.restore(self.state);
    }
}

impl<I: Interrupts> fmt::Debug for InterruptGuard<'_, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterruptGuard").finish_non_exhaustive()
    }
}

/// Runs `f` with interrupts disabled, restoring the previous state afterwards.
#[inline]
pub fn free<I: Interrupts, R>(irq: &mut I, f: impl FnOnce() -> R) -> R {
    let _guard = InterruptGuard::new(irq);
    f()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Models a single global enable bit.
    #[derive(Default)]
    struct GlobalEnable {
        enabled: bool,
        restores: usize,
    }

    impl Interrupts for GlobalEnable {
        type State = bool;

        fn disable(&mut self) -> bool {
            core::mem::replace(&mut self.enabled, false)
        }

        fn restore(&mut self, state: bool) {
            self.enabled = state;
            self.restores += 1;
        }
    }

    #[test]
    fn test_guard_restores_previous_state() {
        let mut irq = GlobalEnable {
            enabled: true,
            restores: 0,
        };

        {
            let guard = InterruptGuard::new(&mut irq);
            assert!(!guard.irq.enabled);
        }

        assert!(irq.enabled);
        assert_eq!(irq.restores, 1);
    }

    #[test]
    fn test_nested_guards_keep_interrupts_disabled() {
        let mut irq = GlobalEnable {
            enabled: true,
            restores: 0,
        };

        {
            let mut outer = InterruptGuard::new(&mut irq);
            {
                let inner = InterruptGuard::new(&mut *outer.irq);
                assert!(!inner.irq.enabled);
            }
            // Inner guard restored the state it saw: disabled.
            assert!(!outer.irq.enabled);
        }

        assert!(irq.enabled);
        assert_eq!(irq.restores, 2);
    }

    #[test]
    fn test_free_returns_closure_value() {
        let mut irq = GlobalEnable::default();
        irq.enabled = true;

        let value = free(&mut irq, || 42);

        assert_eq!(value, 42);
        assert!(irq.enabled);
    }

    #[test]
    fn test_guard_restores_on_early_return() {
        fn bail(irq: &mut GlobalEnable) -> Result<(), ()> {
            let _guard = InterruptGuard::new(irq);
            Err(())
        }

        let mut irq = GlobalEnable {
            enabled: true,
            restores: 0,
        };
        assert!(bail(&mut irq).is_err());
        assert!(irq.enabled);
    }
}
