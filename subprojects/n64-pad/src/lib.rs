//! # n64-pad
//!
//! Turn a microcontroller into an N64 controller.
//!
//! Implement the [`hal`] traits for the board, then hand the data pin to a
//! [`Controller`] and call [`Controller::write`] with the current input state
//! in a loop.
//!
//! # Features
//! - `joybus` (default): the protocol engine, re-exported at the crate root.
//! - `hal`: the hardware traits only.
//! - `sim`: the host-side bus simulator, for tests.
//! - `defmt`: `defmt::Format` on the public types.
//! - `panic-handler`: halt on panic in debug builds, abort in release builds.

#![cfg_attr(not(feature = "sim"), no_std)]

pub mod hal {
    pub use n64_hal::*;
}

#[cfg(feature = "joybus")]
pub use n64_joybus::*;

#[cfg(feature = "sim")]
pub mod sim {
    pub use n64_sim::*;
}

/// #[panic_handler]
///
/// - 'dev': halt on panic. A breakpoint on `rust_begin_unwind` catches it.
/// - 'release': abort on panic.
#[cfg(all(feature = "panic-handler", not(test), not(debug_assertions)))]
#[allow(unused_imports)]
use panic_abort as _;
#[cfg(all(feature = "panic-handler", not(test), debug_assertions))]
#[allow(unused_imports)]
use panic_halt as _;
