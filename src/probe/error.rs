// ABOUTME: Hard probe errors with SNAFU pattern.
// ABOUTME: Only misconfigured targets land here; an unready service is not an error.

use snafu::Snafu;

/// A probe that cannot be attempted at all.
///
/// Connection refusals, unexpected HTTP statuses and non-zero exit codes are
/// reported as [`Readiness::NotReady`](super::Readiness::NotReady) instead.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ProbeError {
    #[snafu(display("invalid probe URL {url:?}: {reason}"))]
    InvalidUrl { url: String, reason: String },

    #[snafu(display("unsupported scheme in probe URL {url:?}; only http is supported"))]
    UnsupportedScheme { url: String },

    #[snafu(display("probe URL {url:?} has no host"))]
    MissingHost { url: String },

    #[snafu(display("invalid TCP address {address:?}: {reason}"))]
    InvalidAddress { address: String, reason: String },

    #[snafu(display("probe command is empty"))]
    EmptyCommand,

    #[snafu(display("probe command not found: {program}"))]
    CommandNotFound { program: String },
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeErrorKind {
    /// The target could not be parsed.
    InvalidTarget,
    /// The target is well-formed but not probeable by this build.
    Unsupported,
    /// The probe program is missing or empty.
    Command,
}

impl ProbeError {
    pub fn kind(&self) -> ProbeErrorKind {
        match self {
            ProbeError::InvalidUrl { .. }
            | ProbeError::MissingHost { .. }
            | ProbeError::InvalidAddress { .. } => ProbeErrorKind::InvalidTarget,
            ProbeError::UnsupportedScheme { .. } => ProbeErrorKind::Unsupported,
            ProbeError::EmptyCommand | ProbeError::CommandNotFound { .. } => {
                ProbeErrorKind::Command
            }
        }
    }
}
