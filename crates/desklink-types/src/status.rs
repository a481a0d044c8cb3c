//! Connection and communication status vocabulary.

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Link state of a peripheral session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[non_exhaustive]
pub enum ConnectionStatus {
    /// A link to the peripheral is established.
    Connected,
    /// No link to the peripheral exists.
    Disconnected,
}

impl ConnectionStatus {
    /// Returns `true` for [`ConnectionStatus::Connected`].
    #[must_use]
    pub const fn is_connected(self) -> bool {
        matches!(self, ConnectionStatus::Connected)
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionStatus::Connected => write!(f, "connected"),
            ConnectionStatus::Disconnected => write!(f, "disconnected"),
        }
    }
}

/// Outcome of a GATT service or characteristic exchange.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new outcomes
/// in future versions without breaking downstream code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[non_exhaustive]
pub enum CommunicationStatus {
    /// The exchange completed and its results are usable.
    Success,
    /// The peripheral could not be reached.
    Unreachable,
    /// The peripheral answered with an ATT protocol error; the error
    /// code travels alongside wherever this status is reported.
    ProtocolError,
    /// The platform denied access to the attribute.
    AccessDenied,
}

impl CommunicationStatus {
    /// Returns `true` for [`CommunicationStatus::Success`].
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, CommunicationStatus::Success)
    }
}

impl fmt::Display for CommunicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommunicationStatus::Success => write!(f, "success"),
            CommunicationStatus::Unreachable => write!(f, "unreachable"),
            CommunicationStatus::ProtocolError => write!(f, "protocol error"),
            CommunicationStatus::AccessDenied => write!(f, "access denied"),
        }
    }
}
