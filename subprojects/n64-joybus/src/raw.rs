//! Wire layout of the controller reports.
//!
//! Zero-copy structs matching the bytes on the bus, in transmission order.
//! Multi-byte fields are big-endian: the most significant byte goes out first.
//! For typed access to buttons and flags, see the [`report`](crate::report)
//! module.

use static_assertions::const_assert_eq;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, big_endian::U16};

use crate::proto::{INPUT_REPORT_LEN, STATUS_REPORT_LEN};

/// Poll response.
///
/// | Byte | Bits (MSB first) |
/// | --- | --- |
/// | 0 | A, B, Z, Start, D-Up, D-Down, D-Left, D-Right |
/// | 1 | Reset, reserved, L, R, C-Up, C-Down, C-Left, C-Right |
/// | 2 | Stick X, signed |
/// | 3 | Stick Y, signed |
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, FromBytes, IntoBytes, KnownLayout, Immutable)]
#[repr(C)]
pub struct RawInputReport {
    /// Button word
    pub buttons: U16,
    /// Stick X axis
    pub x_axis: i8,
    /// Stick Y axis
    pub y_axis: i8,
}

const_assert_eq!(size_of::<RawInputReport>(), INPUT_REPORT_LEN);

/// Identify response.
///
/// | Byte | Content |
/// | --- | --- |
/// | 0-1 | Device word, bit 15 first |
/// | 2 | Controller status |
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, FromBytes, IntoBytes, KnownLayout, Immutable)]
#[repr(C)]
pub struct RawStatusReport {
    /// Device class word
    pub device: U16,
    /// Controller status byte
    pub status: u8,
}

const_assert_eq!(size_of::<RawStatusReport>(), STATUS_REPORT_LEN);
