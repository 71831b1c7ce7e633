//! Controller input and status reports.
//!
//! Typed views over the [`raw`](crate::raw) wire structs. Bit positions are
//! spelled out in the flag definitions and conversion to and from bytes is
//! explicit, so the wire format never depends on compiler bit-field layout.

use bitflags::bitflags;
use zerocopy::{FromBytes, big_endian::U16};

use crate::{
    proto::{INPUT_REPORT_LEN, STATUS_REPORT_LEN},
    raw::{RawInputReport, RawStatusReport},
};

bitflags! {
    /// Button word of the input report. Bit 15 is transmitted first.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    #[repr(transparent)]
    pub struct Buttons: u16 {
        const A = 1 << 15;
        const B = 1 << 14;
        const Z = 1 << 13;
        const START = 1 << 12;
        const D_UP = 1 << 11;
        const D_DOWN = 1 << 10;
        const D_LEFT = 1 << 9;
        const D_RIGHT = 1 << 8;
        /// Set by a real controller while L+R+Start reset the stick origin
        const RESET = 1 << 7;
        /// Reserved, always 0 on a real controller
        const RESERVED = 1 << 6;
        const L = 1 << 5;
        const R = 1 << 4;
        const C_UP = 1 << 3;
        const C_DOWN = 1 << 2;
        const C_LEFT = 1 << 1;
        const C_RIGHT = 1 << 0;
    }
}

impl Buttons {
    /// The four directional pad bits.
    pub const D_PAD: Self = Self::D_UP
        .union(Self::D_DOWN)
        .union(Self::D_LEFT)
        .union(Self::D_RIGHT);

    /// The four C buttons.
    pub const C_PAD: Self = Self::C_UP
        .union(Self::C_DOWN)
        .union(Self::C_LEFT)
        .union(Self::C_RIGHT);
}

/// Live controller state, sent in answer to a Poll.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct InputReport {
    /// Pressed buttons
    pub buttons: Buttons,
    /// Stick X axis, negative is left
    pub x: i8,
    /// Stick Y axis, negative is down
    pub y: i8,
}

impl InputReport {
    /// No button pressed, stick centered.
    pub const NEUTRAL: Self = Self::new(Buttons::empty(), 0, 0);

    /// Creates a report.
    pub const fn new(buttons: Buttons, x: i8, y: i8) -> Self {
        Self { buttons, x, y }
    }

    /// Returns a copy with `buttons` pressed in addition.
    pub const fn with_buttons(mut self, buttons: Buttons) -> Self {
        self.buttons = self.buttons.union(buttons);
        self
    }

    /// Returns a copy with the stick at `(x, y)`.
    pub const fn with_stick(mut self, x: i8, y: i8) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    /// Returns `true` if all of `buttons` are pressed.
    #[inline]
    pub fn pressed(&self, buttons: Buttons) -> bool {
        self.buttons.contains(buttons)
    }

    /// Presses or releases `buttons`.
    #[inline]
    pub fn set(&mut self, buttons: Buttons, pressed: bool) {
        self.buttons.set(buttons, pressed);
    }

    /// Converts to the wire layout.
    pub fn to_raw(&self) -> RawInputReport {
        RawInputReport {
            buttons: U16::new(self.buttons.bits()),
            x_axis: self.x,
            y_axis: self.y,
        }
    }

    /// Converts from the wire layout, keeping unknown bits.
    pub fn from_raw(raw: &RawInputReport) -> Self {
        Self {
            buttons: Buttons::from_bits_retain(raw.buttons.get()),
            x: raw.x_axis,
            y: raw.y_axis,
        }
    }

    /// Encodes the report in transmission order.
    pub fn to_bytes(&self) -> [u8; INPUT_REPORT_LEN] {
        zerocopy::transmute!(self.to_raw())
    }

    /// Decodes a report from the first four bytes of `bytes`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, FromBytesError> {
        let (raw, _) =
            RawInputReport::read_from_prefix(bytes).map_err(|_| FromBytesError::BufferTooSmall {
                required: INPUT_REPORT_LEN,
                available: bytes.len(),
            })?;
        Ok(Self::from_raw(&raw))
    }

    /// The report as a single word, byte 0 in the most significant position.
    pub fn to_u32(&self) -> u32 {
        u32::from_be_bytes(self.to_bytes())
    }
}

impl From<[u8; INPUT_REPORT_LEN]> for InputReport {
    fn from(bytes: [u8; INPUT_REPORT_LEN]) -> Self {
        let raw: RawInputReport = zerocopy::transmute!(bytes);
        Self::from_raw(&raw)
    }
}

impl From<InputReport> for [u8; INPUT_REPORT_LEN] {
    fn from(report: InputReport) -> Self {
        report.to_bytes()
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for InputReport {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(
            f,
            "InputReport {{ buttons: {=u16:#x}, x: {}, y: {} }}",
            self.buttons.bits(),
            self.x,
            self.y
        )
    }
}

bitflags! {
    /// Device class word of the status report. Bit 15 is transmitted first.
    ///
    /// Bit meanings follow the identify word shared with later Nintendo
    /// controllers; a standard wired N64 controller reports
    /// [`DeviceFlags::N64_CONTROLLER`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    #[repr(transparent)]
    pub struct DeviceFlags: u16 {
        /// Wireless controller (0: wired)
        const WIRELESS = 1 << 15;
        /// Wireless receiver (0: wired receive)
        const WIRELESS_RECEIVE = 1 << 14;
        /// No rumble support
        const NO_RUMBLE = 1 << 13;
        /// Controller type, high bit (always 0)
        const TYPE_B1 = 1 << 12;
        /// GameCube controller (0: N64)
        const GAMECUBE = 1 << 11;
        /// Wireless type RF (0: IF)
        const WIRELESS_RF = 1 << 10;
        /// Wireless state fixed (0: variable)
        const WIRELESS_FIXED = 1 << 9;
        /// Standard controller (0: non-standard)
        const STANDARD = 1 << 8;
        /// Wireless origin valid
        const WIRELESS_ORIGIN = 1 << 5;
        /// Wireless id fixed
        const WIRELESS_FIXED_ID = 1 << 4;
        /// Non-controller wireless device
        const NON_CONTROLLER = 1 << 3;
        /// Lite controller
        const LITE = 1 << 2;
        /// Other wireless type bits
        const WIRELESS_OTHER = 0b11;

        const _ = !0;
    }
}

impl DeviceFlags {
    /// Device word of a standard wired N64 controller (`0x0500`).
    pub const N64_CONTROLLER: Self = Self::WIRELESS_RF.union(Self::STANDARD);
}

bitflags! {
    /// Controller status byte of the status report.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    #[repr(transparent)]
    pub struct StatusFlags: u8 {
        /// Reserved status, bits 0-2
        const RESERVED_LOW = 0b0000_0111;
        /// Rumble pack present
        const RUMBLE = 1 << 3;
        /// Reserved status, bits 4-7
        const RESERVED_HIGH = 0b1111_0000;

        const _ = !0;
    }
}

impl StatusFlags {
    /// Status byte of a controller with no pack inserted (`0x02`).
    pub const NO_PACK: Self = Self::from_bits_retain(0x02);
}

/// Static controller capabilities, sent in answer to an Identify.
///
/// Fixed at construction: no command can change it afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StatusReport {
    device: DeviceFlags,
    status: StatusFlags,
}

impl StatusReport {
    /// Standard wired N64 controller without a pack: `{0x05, 0x00, 0x02}`.
    pub const DEFAULT: Self = Self::new(DeviceFlags::N64_CONTROLLER, StatusFlags::NO_PACK);

    /// Creates a status report.
    pub const fn new(device: DeviceFlags, status: StatusFlags) -> Self {
        Self { device, status }
    }

    /// Returns a copy advertising a rumble pack, or none.
    pub const fn with_rumble(self, present: bool) -> Self {
        let status = if present {
            self.status.union(StatusFlags::RUMBLE)
        } else {
            self.status.difference(StatusFlags::RUMBLE)
        };
        Self::new(self.device, status)
    }

    /// Device class word.
    #[inline]
    pub const fn device(&self) -> DeviceFlags {
        self.device
    }

    /// Controller status byte.
    #[inline]
    pub const fn status(&self) -> StatusFlags {
        self.status
    }

    /// Whether a rumble pack is advertised.
    #[inline]
    pub const fn rumble_present(&self) -> bool {
        self.status.contains(StatusFlags::RUMBLE)
    }

    /// Converts to the wire layout.
    pub fn to_raw(&self) -> RawStatusReport {
        RawStatusReport {
            device: U16::new(self.device.bits()),
            status: self.status.bits(),
        }
    }

    /// Converts from the wire layout.
    pub fn from_raw(raw: &RawStatusReport) -> Self {
        Self::new(
            DeviceFlags::from_bits_retain(raw.device.get()),
            StatusFlags::from_bits_retain(raw.status),
        )
    }

    /// Encodes the report in transmission order.
    pub fn to_bytes(&self) -> [u8; STATUS_REPORT_LEN] {
        zerocopy::transmute!(self.to_raw())
    }

    /// Decodes a report from the first three bytes of `bytes`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, FromBytesError> {
        let (raw, _) =
            RawStatusReport::read_from_prefix(bytes).map_err(|_| FromBytesError::BufferTooSmall {
                required: STATUS_REPORT_LEN,
                available: bytes.len(),
            })?;
        Ok(Self::from_raw(&raw))
    }
}

impl Default for StatusReport {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for StatusReport {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(
            f,
            "StatusReport {{ device: {=u16:#x}, status: {=u8:#x} }}",
            self.device.bits(),
            self.status.bits()
        )
    }
}

/// Errors decoding a report from bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum FromBytesError {
    /// Buffer is too small to contain the report
    #[error("buffer too small: need {required} bytes, have {available}")]
    BufferTooSmall {
        /// Number of bytes required
        required: usize,
        /// Number of bytes available
        available: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neutral_report_is_all_zero() {
        assert_eq!(InputReport::NEUTRAL.to_bytes(), [0, 0, 0, 0]);
        assert_eq!(InputReport::default(), InputReport::NEUTRAL);
    }

    #[test]
    fn test_a_button_is_msb_of_first_byte() {
        let report = InputReport::NEUTRAL.with_buttons(Buttons::A);

        assert_eq!(report.to_bytes(), [0x80, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn test_button_byte_layout() {
        let cases = [
            (Buttons::B, [0x40, 0x00]),
            (Buttons::Z, [0x20, 0x00]),
            (Buttons::START, [0x10, 0x00]),
            (Buttons::D_UP, [0x08, 0x00]),
            (Buttons::D_DOWN, [0x04, 0x00]),
            (Buttons::D_LEFT, [0x02, 0x00]),
            (Buttons::D_RIGHT, [0x01, 0x00]),
            (Buttons::RESET, [0x00, 0x80]),
            (Buttons::RESERVED, [0x00, 0x40]),
            (Buttons::L, [0x00, 0x20]),
            (Buttons::R, [0x00, 0x10]),
            (Buttons::C_UP, [0x00, 0x08]),
            (Buttons::C_DOWN, [0x00, 0x04]),
            (Buttons::C_LEFT, [0x00, 0x02]),
            (Buttons::C_RIGHT, [0x00, 0x01]),
        ];

        for (button, expected) in cases {
            let bytes = InputReport::NEUTRAL.with_buttons(button).to_bytes();
            assert_eq!(bytes[..2], expected, "{button:?}");
        }
    }

    #[test]
    fn test_pad_groups() {
        assert_eq!(Buttons::D_PAD.bits(), 0x0F00);
        assert_eq!(Buttons::C_PAD.bits(), 0x000F);
    }

    #[test]
    fn test_axes_are_signed_bytes() {
        let report = InputReport::NEUTRAL.with_stick(-128, 127);

        assert_eq!(report.to_bytes(), [0x00, 0x00, 0x80, 0x7F]);
        assert_eq!(report.to_u32(), 0x0000_807F);
    }

    #[test]
    fn test_input_report_from_bytes() {
        let report = InputReport::from_bytes(&[0x90, 0x30, 0xF6, 0x0A, 0xEE]).unwrap();

        assert!(report.pressed(Buttons::A | Buttons::START | Buttons::L | Buttons::R));
        assert!(!report.pressed(Buttons::B));
        assert_eq!(report.x, -10);
        assert_eq!(report.y, 10);
    }

    #[test]
    fn test_input_report_from_short_buffer() {
        assert_eq!(
            InputReport::from_bytes(&[0x80, 0x00]),
            Err(FromBytesError::BufferTooSmall {
                required: 4,
                available: 2
            })
        );
    }

    #[test]
    fn test_set_releases_buttons() {
        let mut report = InputReport::NEUTRAL.with_buttons(Buttons::A | Buttons::Z);

        report.set(Buttons::A, false);

        assert_eq!(report.buttons, Buttons::Z);
        assert_eq!(<[u8; 4]>::from(report), [0x20, 0, 0, 0]);
    }

    #[test]
    fn test_default_status_bytes() {
        assert_eq!(StatusReport::DEFAULT.to_bytes(), [0x05, 0x00, 0x02]);
        assert_eq!(StatusReport::default(), StatusReport::DEFAULT);
        assert_eq!(DeviceFlags::N64_CONTROLLER.bits(), 0x0500);
        assert!(!StatusReport::DEFAULT.rumble_present());
    }

    #[test]
    fn test_status_with_rumble() {
        let status = StatusReport::DEFAULT.with_rumble(true);

        assert!(status.rumble_present());
        assert_eq!(status.to_bytes(), [0x05, 0x00, 0x0A]);
        assert_eq!(status.with_rumble(false), StatusReport::DEFAULT);
    }

    #[test]
    fn test_status_keeps_unknown_bits() {
        let status = StatusReport::from_bytes(&[0xFF, 0xC0, 0x01]).unwrap();

        assert_eq!(status.device().bits(), 0xFFC0);
        assert_eq!(status.status().bits(), 0x01);
        assert_eq!(status.to_bytes(), [0xFF, 0xC0, 0x01]);
    }

    #[test]
    fn test_device_flag_positions() {
        let status = StatusReport::new(
            DeviceFlags::WIRELESS | DeviceFlags::GAMECUBE | DeviceFlags::LITE,
            StatusFlags::empty(),
        );

        assert_eq!(status.to_bytes(), [0x88, 0x04, 0x00]);
    }
}
