//! Joybus protocol constants.

/// Command opcodes (first byte of a console frame).
pub mod cmds {
    /// Identify: the controller answers with its 3-byte status.
    pub const IDENTIFY: u8 = 0x00;

    /// Poll: the controller answers with its 4-byte input report.
    pub const POLL: u8 = 0x01;

    // Controller pak access. Recognized by name only; never answered.
    pub const READ_EXPANSION: u8 = 0x02;
    pub const WRITE_EXPANSION: u8 = 0x03;

    /// Reset and identify. Not answered.
    pub const RESET: u8 = 0xFF;
}

/// Size of the buffer a command frame is received into.
pub const COMMAND_FRAME_LEN: usize = 3;

/// Length of a command frame the dispatcher answers.
pub const COMMAND_LEN: usize = 1;

/// Length of the Identify response.
pub const STATUS_REPORT_LEN: usize = 3;

/// Length of the Poll response.
pub const INPUT_REPORT_LEN: usize = 4;

/// Bits per byte on the wire.
pub const BITS_PER_BYTE: u8 = 8;
