//! Command dispatcher.
//!
//! One respond cycle receives a command frame, classifies it and sends the
//! matching response:
//!
//! ```text
//!            receive             1 byte, 0x00 / 0x01
//!   Idle ───────────────► Classifying ───────────────► Responding
//!    ▲                        │
//!    └────────────────────────┘
//!      anything else: silence
//! ```
//!
//! A cycle either sends nothing or exactly one complete response frame.

use n64_hal::{Delay, Pin};

use crate::{
    codec::ReceiveError,
    frame::Transport,
    proto::{COMMAND_FRAME_LEN, COMMAND_LEN, cmds},
    report::{InputReport, StatusReport},
};

/// A command the controller answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    /// Report controller type and status.
    Identify,
    /// Report current input state.
    Poll,
}

impl Command {
    /// Opcode of the command on the wire.
    pub const fn opcode(self) -> u8 {
        match self {
            Command::Identify => cmds::IDENTIFY,
            Command::Poll => cmds::POLL,
        }
    }

    /// Classifies a received frame.
    ///
    /// `received` is the number of complete bytes seen on the line, which may
    /// exceed `frame.len()`. Only single-byte frames are commands.
    pub fn classify(frame: &[u8], received: usize) -> Option<Self> {
        if received != COMMAND_LEN {
            return None;
        }

        match frame.first().copied()? {
            cmds::IDENTIFY => Some(Command::Identify),
            cmds::POLL => Some(Command::Poll),
            _ => None,
        }
    }
}

/// Result of one respond cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ProtocolOutcome {
    /// Nothing recognizable was received; nothing was sent.
    NoCommand,
    /// An Identify was answered with the status report.
    IdentifyAnswered,
    /// A Poll was answered with the input report.
    PollAnswered,
    /// Controller pak read. Not produced by the current command decoding.
    ReadExpansion,
    /// Controller pak write. Not produced by the current command decoding.
    WriteExpansion,
}

impl ProtocolOutcome {
    /// Returns `true` if a response frame was sent.
    #[inline]
    pub const fn answered(self) -> bool {
        matches!(
            self,
            ProtocolOutcome::IdentifyAnswered | ProtocolOutcome::PollAnswered
        )
    }
}

/// Dispatcher state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum State {
    /// Waiting for a command frame.
    Idle,
    /// A frame was received and is being inspected.
    Classifying,
    /// A recognized command was answered. Terminal for the cycle.
    Responding,
}

/// Everything one respond cycle observed.
///
/// Kept apart from the cycle itself so it can be logged once the timing
/// critical section is over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cycle {
    /// Outcome of the cycle.
    pub outcome: ProtocolOutcome,
    /// Receive result: the number of complete bytes, or why nothing came in.
    pub received: Result<usize, ReceiveError>,
    /// The command frame buffer.
    pub frame: [u8; COMMAND_FRAME_LEN],
}

impl Cycle {
    /// First byte of the command frame, if one was received.
    pub fn opcode(&self) -> Option<u8> {
        match self.received {
            Ok(n) if n > 0 => Some(self.frame[0]),
            _ => None,
        }
    }
}

/// Answers Identify and Poll commands on a [`Transport`].
pub struct Responder<P, D> {
    transport: Transport<P, D>,
    status: StatusReport,
    state: State,
}

impl<P: Pin, D: Delay> Responder<P, D> {
    /// Creates a responder answering Identify with `status`.
    pub fn new(transport: Transport<P, D>, status: StatusReport) -> Self {
        Self {
            transport,
            status,
            state: State::Idle,
        }
    }

    /// Current state. After a cycle this is [`State::Responding`] if a command
    /// was answered, [`State::Idle`] otherwise.
    #[inline]
    pub fn state(&self) -> State {
        self.state
    }

    /// The status report sent in answer to Identify.
    #[inline]
    pub fn status(&self) -> &StatusReport {
        &self.status
    }

    /// Runs one respond cycle, answering Poll with `report`.
    ///
    /// Timing critical: run with interrupts disabled.
    pub fn respond(&mut self, report: &InputReport) -> Cycle {
        self.state = State::Idle;

        let mut frame = [0u8; COMMAND_FRAME_LEN];
        let received = self.transport.receive_frame(&mut frame);

        let outcome = match received {
            Ok(len) => {
                self.state = State::Classifying;
                match Command::classify(&frame, len) {
                    Some(command) => self.answer(command, report),
                    None => {
                        self.state = State::Idle;
                        ProtocolOutcome::NoCommand
                    }
                }
            }
            Err(_) => ProtocolOutcome::NoCommand,
        };

        Cycle {
            outcome,
            received,
            frame,
        }
    }

    fn answer(&mut self, command: Command, report: &InputReport) -> ProtocolOutcome {
        self.state = State::Responding;

        match command {
            Command::Identify => {
                self.transport.send_frame(&self.status.to_bytes());
                ProtocolOutcome::IdentifyAnswered
            }
            Command::Poll => {
                self.transport.send_frame(&report.to_bytes());
                ProtocolOutcome::PollAnswered
            }
        }
    }

    /// Releases the transport.
    pub fn into_transport(self) -> Transport<P, D> {
        self.transport
    }
}
