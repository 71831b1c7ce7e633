//! # n64-joybus
//!
//! Device-side implementation of the N64 controller bus ("joybus").
//!
//! The console is the bus master. It drives a command frame onto a single
//! open-drain data line and expects the controller to answer on the same line
//! within a few microseconds. This crate implements the controller end:
//!
//! - [`codec`]: pulse-width encoding and decoding of bytes (1 unit low + 3 high
//!   for a 1 bit, 3 low + 1 high for a 0 bit, MSB first);
//! - [`frame`]: frame send/receive with pin configuration and stop bit;
//! - [`raw`] and [`report`]: wire layout of the input and status reports;
//! - [`dispatch`]: the Identify/Poll command state machine;
//! - [`controller`]: the public entry point, one call per polling cycle.
//!
//! Hardware access goes through the `n64-hal` traits, so the whole engine can
//! run against the `n64-sim` bus on the host.
//!
//! # References
//! - <https://n64brew.dev/wiki/Joybus_Protocol>
//! - <https://n64brew.dev/wiki/Controller>

#![cfg_attr(not(test), no_std)]

pub mod codec;
pub mod config;
pub mod controller;
pub mod dispatch;
pub mod frame;
pub mod proto;
pub mod raw;
pub mod report;
pub mod timing;

pub use self::{
    codec::{Pulse, ReceiveError},
    config::{Config, ConfigError, FollowUp},
    controller::{Controller, Exchange},
    dispatch::{Command, ProtocolOutcome, Responder},
    frame::Transport,
    report::{Buttons, DeviceFlags, FromBytesError, InputReport, StatusFlags, StatusReport},
    timing::{Timing, TimingError, WaitLimit},
};
