//! Detail kinds carried by [`Error`](super::Error) variants.

use std::fmt;

use crate::message::SecurityLevel;
use crate::pdu::PduType;
use crate::security::SecurityModelId;
use crate::transport::TransportDomain;
use crate::version::Version;

/// Configuration table an entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigTable {
    /// Security identities (security name -> credential).
    SecurityIdentity,
    /// Target parameters (params name -> security name, level, version).
    TargetParams,
    /// Target addresses (target name -> domain, address, params name).
    TargetAddress,
}

impl fmt::Display for ConfigTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SecurityIdentity => write!(f, "security identity"),
            Self::TargetParams => write!(f, "target parameters"),
            Self::TargetAddress => write!(f, "target address"),
        }
    }
}

/// Link in a target's resolution chain that could not be followed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnresolvedReference {
    /// No target address with the requested name.
    TargetAddress,
    /// The target address names parameters that do not exist.
    TargetParams(String),
    /// The parameters name a security identity that does not exist.
    SecurityName(String),
}

impl fmt::Display for UnresolvedReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TargetAddress => write!(f, "no such target address"),
            Self::TargetParams(name) => write!(f, "no target parameters named '{}'", name),
            Self::SecurityName(name) => write!(f, "no security identity named '{}'", name),
        }
    }
}

/// Configuration error detail.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigErrorKind {
    /// An entry with this name exists with different contents.
    Duplicate { table: ConfigTable, name: String },
    /// Target name (or something it references) is absent.
    UnknownTarget {
        target: String,
        missing: UnresolvedReference,
    },
    /// Entry to remove does not exist.
    NotFound { table: ConfigTable, name: String },
    /// Target address is referenced by an in-flight request.
    TargetInUse { target: String },
    /// No endpoint is registered for the transport domain.
    NoEndpoint(TransportDomain),
    /// An endpoint is already registered for the transport domain.
    DuplicateEndpoint(TransportDomain),
    /// Engine identifiers must be 5..=32 octets.
    InvalidEngineId { length: usize },
    /// Maximum message size is below the protocol minimum.
    InvalidMaxMessageSize { size: usize },
    /// The message version cannot carry this PDU type.
    UnsupportedPduType { pdu_type: PduType, version: Version },
}

impl fmt::Display for ConfigErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Duplicate { table, name } => {
                write!(f, "{} '{}' already exists with different settings", table, name)
            }
            Self::UnknownTarget { target, missing } => {
                write!(f, "unknown target '{}': {}", target, missing)
            }
            Self::NotFound { table, name } => write!(f, "{} '{}' not found", table, name),
            Self::TargetInUse { target } => {
                write!(f, "target '{}' is referenced by an in-flight request", target)
            }
            Self::NoEndpoint(domain) => write!(f, "no endpoint registered for {}", domain),
            Self::DuplicateEndpoint(domain) => {
                write!(f, "endpoint already registered for {}", domain)
            }
            Self::InvalidEngineId { length } => {
                write!(f, "engine ID must be 5-32 octets, got {}", length)
            }
            Self::InvalidMaxMessageSize { size } => {
                write!(f, "maximum message size must be at least 484, got {}", size)
            }
            Self::UnsupportedPduType { pdu_type, version } => {
                write!(f, "{} cannot be sent with {}", pdu_type, version)
            }
        }
    }
}

/// Security processing error detail.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SecurityErrorKind {
    /// Received community string matches no configured identity.
    UnknownCommunity,
    /// No identity is configured under this security name.
    UnknownSecurityName(String),
    /// The security model cannot provide the requested level.
    UnsupportedSecurityLevel {
        model: SecurityModelId,
        level: SecurityLevel,
    },
    /// No security model with this id is registered.
    UnsupportedSecurityModel(i32),
}

impl fmt::Display for SecurityErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownCommunity => write!(f, "unknown community name"),
            Self::UnknownSecurityName(name) => write!(f, "unknown security name '{}'", name),
            Self::UnsupportedSecurityLevel { model, level } => {
                write!(f, "{} security model does not support {}", model, level)
            }
            Self::UnsupportedSecurityModel(id) => write!(f, "unsupported security model {}", id),
        }
    }
}

/// BER decoding error detail.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DecodeErrorKind {
    /// Input ended before the value did.
    TruncatedData,
    /// Declared content extends past the available bytes.
    InsufficientData { needed: usize, available: usize },
    /// Tag differs from the one required at this position.
    UnexpectedTag { expected: u8, actual: u8 },
    /// Indefinite-length form (0x80) is not accepted.
    IndefiniteLength,
    /// Long-form length with more than four length octets.
    LengthTooLong { octets: usize },
    /// Length exceeds the decoder's sanity limit.
    LengthExceedsMax { length: usize, max: usize },
    /// INTEGER with no content octets.
    ZeroLengthInteger,
    /// Counter64 content longer than nine octets.
    Integer64TooLong { length: usize },
    /// Subidentifier does not fit in 32 bits.
    IntegerOverflow,
    /// NULL with non-zero length.
    InvalidNull,
    /// IpAddress not exactly four octets.
    InvalidIpAddressLength { length: usize },
    /// Constructed OCTET STRING encoding.
    ConstructedOctetString,
    /// OID exceeds the arc limit.
    OidTooLong { count: usize, max: usize },
    /// PDU tag outside the known set.
    UnknownPduType(u8),
    /// Bytes remain after the outermost value.
    TrailingData { remaining: usize },
}

impl fmt::Display for DecodeErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TruncatedData => write!(f, "unexpected end of data"),
            Self::InsufficientData { needed, available } => {
                write!(f, "need {} bytes but only {} remaining", needed, available)
            }
            Self::UnexpectedTag { expected, actual } => {
                write!(f, "expected tag 0x{:02X}, got 0x{:02X}", expected, actual)
            }
            Self::IndefiniteLength => write!(f, "indefinite length encoding not supported"),
            Self::LengthTooLong { octets } => {
                write!(f, "length encoding too long ({} octets)", octets)
            }
            Self::LengthExceedsMax { length, max } => {
                write!(f, "length {} exceeds maximum {}", length, max)
            }
            Self::ZeroLengthInteger => write!(f, "zero-length integer"),
            Self::Integer64TooLong { length } => {
                write!(f, "integer64 too long: {} bytes", length)
            }
            Self::IntegerOverflow => write!(f, "integer overflow"),
            Self::InvalidNull => write!(f, "NULL with non-zero length"),
            Self::InvalidIpAddressLength { length } => {
                write!(f, "IP address must be 4 bytes, got {}", length)
            }
            Self::ConstructedOctetString => write!(f, "constructed OCTET STRING not supported"),
            Self::OidTooLong { count, max } => {
                write!(f, "OID has {} arcs, exceeds maximum {}", count, max)
            }
            Self::UnknownPduType(tag) => write!(f, "unknown PDU type 0x{:02X}", tag),
            Self::TrailingData { remaining } => {
                write!(f, "{} trailing bytes after message", remaining)
            }
        }
    }
}

/// OID validation error detail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum OidErrorKind {
    /// An arc is not a non-negative 32-bit integer.
    InvalidArc,
    /// First arc must be 0, 1, or 2.
    InvalidFirstArc(u32),
    /// Second arc must be <= 39 when the first arc is 0 or 1.
    InvalidSecondArc { first: u32, second: u32 },
    /// Too many arcs.
    TooManyArcs { count: usize, max: usize },
}

impl fmt::Display for OidErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArc => write!(f, "invalid arc value"),
            Self::InvalidFirstArc(arc) => write!(f, "first arc must be 0, 1, or 2, got {}", arc),
            Self::InvalidSecondArc { first, second } => write!(
                f,
                "second arc must be <= 39 when first arc is {}, got {}",
                first, second
            ),
            Self::TooManyArcs { count, max } => {
                write!(f, "OID has {} arcs, exceeds maximum {}", count, max)
            }
        }
    }
}
