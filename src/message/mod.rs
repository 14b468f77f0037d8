//! SNMP message envelopes and message processing.
//!
//! - [`CommunityMessage`] - the v1/v2c wire envelope
//! - [`MessageProcessingModel`] - wraps and unwraps PDUs, delegating the
//!   security field to the model's [`SecurityModel`](crate::security::SecurityModel)
//! - [`unwrap_message`] - entry point for inbound datagrams

mod community;
mod processing;

pub use community::CommunityMessage;
pub use processing::{IncomingMessage, MessageProcessingModel, unwrap_message};

use std::fmt;

/// Required protection for a security name (RFC 3411 SnmpSecurityLevel).
///
/// Ordered by strength, so `level >= SecurityLevel::AuthNoPriv` means
/// "authenticated".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum SecurityLevel {
    /// No authentication, no privacy
    #[default]
    NoAuthNoPriv,
    /// Authentication only
    AuthNoPriv,
    /// Authentication and privacy (encryption)
    AuthPriv,
}

impl SecurityLevel {
    /// Create from the SNMP-FRAMEWORK-MIB value (1, 2 or 3).
    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            1 => Some(Self::NoAuthNoPriv),
            2 => Some(Self::AuthNoPriv),
            3 => Some(Self::AuthPriv),
            _ => None,
        }
    }

    /// SNMP-FRAMEWORK-MIB value.
    pub fn as_i32(self) -> i32 {
        match self {
            Self::NoAuthNoPriv => 1,
            Self::AuthNoPriv => 2,
            Self::AuthPriv => 3,
        }
    }

    /// Check if authentication is required.
    pub fn requires_auth(self) -> bool {
        matches!(self, Self::AuthNoPriv | Self::AuthPriv)
    }

    /// Check if privacy (encryption) is required.
    pub fn requires_priv(self) -> bool {
        matches!(self, Self::AuthPriv)
    }
}

impl fmt::Display for SecurityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoAuthNoPriv => write!(f, "noAuthNoPriv"),
            Self::AuthNoPriv => write!(f, "authNoPriv"),
            Self::AuthPriv => write!(f, "authPriv"),
        }
    }
}
