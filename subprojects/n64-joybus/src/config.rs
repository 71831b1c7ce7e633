//! Controller configuration.

use crate::{
    dispatch::ProtocolOutcome,
    report::StatusReport,
    timing::{Timing, TimingError},
};

/// When a [`Controller`](crate::Controller) runs a second respond cycle in the
/// same call.
///
/// The console follows Identify with a Poll almost immediately, often before
/// the caller gets a chance to call again.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FollowUp {
    /// One cycle per call.
    Never,
    /// A second cycle after an answered Identify.
    #[default]
    AfterIdentify,
    /// A second cycle after any answered command.
    AfterAnswer,
}

impl FollowUp {
    /// Returns `true` if a cycle ending with `outcome` is followed by another.
    pub const fn applies(self, outcome: ProtocolOutcome) -> bool {
        match self {
            FollowUp::Never => false,
            FollowUp::AfterIdentify => matches!(outcome, ProtocolOutcome::IdentifyAnswered),
            FollowUp::AfterAnswer => outcome.answered(),
        }
    }
}

/// Controller configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    /// Bus timing
    pub timing: Timing,
    /// Identify response
    pub status: StatusReport,
    /// Second cycle policy
    pub follow_up: FollowUp,
}

impl Config {
    /// Standard controller, no pak, nominal timing.
    pub const DEFAULT: Self = Self::new();

    /// Creates the default configuration.
    pub const fn new() -> Self {
        Self {
            timing: Timing::DEFAULT,
            status: StatusReport::DEFAULT,
            follow_up: FollowUp::AfterIdentify,
        }
    }

    /// Sets the bus timing.
    pub const fn with_timing(mut self, timing: Timing) -> Self {
        self.timing = timing;
        self
    }

    /// Sets the Identify response.
    pub const fn with_status(mut self, status: StatusReport) -> Self {
        self.status = status;
        self
    }

    /// Sets the second cycle policy.
    pub const fn with_follow_up(mut self, follow_up: FollowUp) -> Self {
        self.follow_up = follow_up;
        self
    }

    /// Checks the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.timing.validate()?;
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Errors of [`Config::validate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// The timing is unusable.
    #[error("invalid timing: {0}")]
    Timing(#[from] TimingError),
}
