//! # n64-hal
//!
//! Hardware capabilities required to drive the N64 controller data line.
//!
//! The protocol engine never touches registers directly. Instead, the board
//! support code hands it three objects:
//! - a [`Pin`]: the single open-drain data line (direction, pull, drive mode,
//!   level read/write);
//! - a [`Delay`]: a busy-wait delay with microsecond resolution;
//! - an [`Interrupts`] controller: global interrupt disable/restore.
//!
//! All three are plain traits so a simulated bus can stand in for real
//! hardware on the host.

#![cfg_attr(not(test), no_std)]

pub mod delay;
pub mod irq;
pub mod pin;

pub use self::{
    delay::Delay,
    irq::{InterruptGuard, Interrupts, NoInterrupts},
    pin::{Direction, Level, Pin, Pull},
};
