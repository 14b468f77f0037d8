//! Security models.
//!
//! A security model turns a security name into the credential fields of an
//! outgoing envelope and recovers the security name from an incoming one.
//! Models are a closed set selected by [`SecurityModelId`]; only the
//! community-based models are implemented.

mod community;

use bytes::Bytes;
use std::fmt;

use crate::config::LocalConfig;
use crate::error::{Error, Result, SecurityErrorKind};
use crate::message::SecurityLevel;

/// Security model number (RFC 3411 SnmpSecurityModel).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SecurityModelId {
    /// Wildcard, "any model"
    Any,
    /// SNMPv1 community-based
    V1,
    /// SNMPv2c community-based
    V2c,
}

impl SecurityModelId {
    /// Create from the registered number.
    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(Self::Any),
            1 => Some(Self::V1),
            2 => Some(Self::V2c),
            _ => None,
        }
    }

    /// Registered number.
    pub fn as_i32(self) -> i32 {
        match self {
            Self::Any => 0,
            Self::V1 => 1,
            Self::V2c => 2,
        }
    }
}

impl fmt::Display for SecurityModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => write!(f, "any"),
            Self::V1 => write!(f, "SNMPv1"),
            Self::V2c => write!(f, "SNMPv2c"),
        }
    }
}

/// Security envelope fields produced for an outgoing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecurityParameters {
    /// Community string, carried verbatim.
    Community(Bytes),
}

/// Result of validating an incoming envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingSecurity {
    pub security_name: String,
    pub security_level: SecurityLevel,
}

/// An implemented security model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurityModel {
    /// Community-based security, tagged with the model it stands in for.
    Community(SecurityModelId),
}

impl SecurityModel {
    /// Select the implementation for a model number.
    pub fn for_id(id: SecurityModelId) -> Result<Self> {
        match id {
            SecurityModelId::V1 | SecurityModelId::V2c => Ok(Self::Community(id)),
            SecurityModelId::Any => Err(Error::security(
                SecurityErrorKind::UnsupportedSecurityModel(id.as_i32()),
            )),
        }
    }

    /// Model number this implementation serves.
    pub fn id(self) -> SecurityModelId {
        match self {
            Self::Community(id) => id,
        }
    }

    /// Produce the security fields for a message sent as `security_name`.
    pub fn authenticate_outgoing(
        self,
        security_name: &str,
        security_level: SecurityLevel,
        config: &LocalConfig,
    ) -> Result<SecurityParameters> {
        match self {
            Self::Community(id) => community::outgoing(id, security_name, security_level, config)
                .map(SecurityParameters::Community),
        }
    }

    /// Validate the security fields of a received message.
    pub fn authenticate_incoming(
        self,
        parameters: &SecurityParameters,
        config: &LocalConfig,
    ) -> Result<IncomingSecurity> {
        match (self, parameters) {
            (Self::Community(id), SecurityParameters::Community(community)) => {
                community::incoming(id, community, config)
            }
        }
    }
}
