//! Error types for snmp-engine.
//!
//! This module provides:
//!
//! - [`Error`] - The main error type, covering configuration, security,
//!   transport, timeout and decoding failures
//! - [`ErrorStatus`] - SNMP protocol errors carried in a response PDU (RFC 3416)
//! - Kind enums ([`ConfigErrorKind`], [`SecurityErrorKind`], [`DecodeErrorKind`],
//!   [`OidErrorKind`]) giving the detail behind each category
//!
//! # Where errors surface
//!
//! Only malformed bindings are rejected synchronously by
//! [`SnmpEngine::send_request`](crate::SnmpEngine::send_request). Every other
//! failure of a submitted request reaches the caller exactly once, through the
//! `error_indication` field of the [`Outcome`](crate::Outcome) handed to the
//! request callback.
//!
//! ```rust
//! use snmp_engine::{Error, Outcome};
//!
//! fn report(outcome: &Outcome) {
//!     match outcome.error_indication.as_deref() {
//!         None => println!("{} bindings", outcome.varbinds.len()),
//!         Some(Error::Timeout { target, retries, .. }) => {
//!             println!("{} unreachable after {} retries", target, retries);
//!         }
//!         Some(e) => println!("request failed: {}", e),
//!     }
//! }
//! ```

mod kind;

pub use kind::{
    ConfigErrorKind, ConfigTable, DecodeErrorKind, OidErrorKind, SecurityErrorKind,
    UnresolvedReference,
};

use std::net::SocketAddr;
use std::time::Duration;

use crate::oid::Oid;

/// Result type alias using the library's boxed Error type.
pub type Result<T> = std::result::Result<T, Box<Error>>;

/// The main error type for all snmp-engine operations.
///
/// The variants follow the engine's failure taxonomy:
///
/// | Variant | Retried | Notes |
/// |---|---|---|
/// | [`Config`](Error::Config) | never | unknown/duplicate names, missing endpoints |
/// | [`Security`](Error::Security) | never | same credentials cannot succeed later |
/// | [`Transport`](Error::Transport) | up to the retry limit | send failure |
/// | [`Timeout`](Error::Timeout) | up to the retry limit | no reply before the deadline |
/// | [`MalformedMessage`](Error::MalformedMessage) | n/a | inbound only; the datagram is dropped |
///
/// ```
/// use snmp_engine::Error;
///
/// fn is_retriable(error: &Error) -> bool {
///     matches!(error, Error::Timeout { .. } | Error::Transport { .. })
/// }
/// ```
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Local configuration problem (duplicate or unknown name, missing endpoint).
    #[error("configuration error: {0}")]
    Config(ConfigErrorKind),

    /// Credential stamping or validation failed.
    #[error("security error: {0}")]
    Security(SecurityErrorKind),

    /// Sending a datagram failed.
    #[error("transport error communicating with {target}: {source}")]
    Transport {
        target: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// No reply arrived before the final deadline.
    #[error("timeout after {elapsed:?} waiting for {target} ({retries} retries)")]
    Timeout {
        target: SocketAddr,
        elapsed: Duration,
        retries: u32,
    },

    /// Inbound bytes could not be decoded.
    #[error("malformed message at offset {offset}: {kind}")]
    MalformedMessage { offset: usize, kind: DecodeErrorKind },

    /// Message declares a version no registered message-processing model handles.
    #[error("unsupported message version {0}")]
    UnsupportedVersion(i32),

    /// A request id was allocated while a request with the same id is pending.
    #[error("request id {0} is already pending")]
    DuplicateRequestId(i32),

    /// Invalid OID format or arcs.
    #[error("invalid OID{}: {kind}", input.as_deref().map(|s| format!(" '{}'", s)).unwrap_or_default())]
    InvalidOid {
        kind: OidErrorKind,
        input: Option<Box<str>>,
    },

    /// A binding cannot be carried by the requested PDU.
    #[error("invalid binding for {oid}: {reason}")]
    InvalidBinding { oid: Oid, reason: &'static str },

    /// The agent answered with a non-zero error status.
    ///
    /// Produced by [`Outcome::into_result`](crate::Outcome::into_result); the
    /// callback itself sees the raw status and index.
    #[error("agent returned {status} (index {index}{})", oid.as_ref().map(|o| format!(", {}", o)).unwrap_or_default())]
    Snmp {
        status: ErrorStatus,
        index: u32,
        oid: Option<Oid>,
    },

    /// Encoded message exceeds the engine's maximum message size.
    #[error("message of {size} bytes exceeds maximum message size {max}")]
    MessageTooLarge { size: usize, max: usize },
}

impl Error {
    /// Box this error (convenience for constructing boxed errors).
    pub fn boxed(self) -> Box<Self> {
        Box::new(self)
    }

    /// Build a boxed decode error, logging the detail at debug level.
    pub(crate) fn decode(offset: usize, kind: DecodeErrorKind) -> Box<Self> {
        tracing::debug!(target: "snmp_engine::ber", { snmp.offset = offset, kind = %kind }, "decode error");
        Error::MalformedMessage { offset, kind }.boxed()
    }

    pub(crate) fn config(kind: ConfigErrorKind) -> Box<Self> {
        Error::Config(kind).boxed()
    }

    pub(crate) fn security(kind: SecurityErrorKind) -> Box<Self> {
        Error::Security(kind).boxed()
    }

    pub(crate) fn invalid_oid(kind: OidErrorKind) -> Box<Self> {
        Error::InvalidOid { kind, input: None }.boxed()
    }

    pub(crate) fn invalid_oid_with_input(kind: OidErrorKind, input: impl Into<Box<str>>) -> Box<Self> {
        Error::InvalidOid {
            kind,
            input: Some(input.into()),
        }
        .boxed()
    }

    /// Whether the command generator may retry after this error.
    pub fn is_retriable(&self) -> bool {
        matches!(self, Error::Timeout { .. } | Error::Transport { .. })
    }
}

macro_rules! error_statuses {
    (
        $(#[$outer:meta])*
        enum ErrorStatus {
            $($(#[$doc:meta])* $variant:ident = $code:literal => $name:literal,)*
        }
    ) => {
        $(#[$outer])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[non_exhaustive]
        pub enum ErrorStatus {
            $($(#[$doc])* $variant,)*
            /// Status code outside RFC 3416's range.
            Unknown(i32),
        }

        impl ErrorStatus {
            /// Create from raw status code.
            pub fn from_i32(value: i32) -> Self {
                match value {
                    $($code => Self::$variant,)*
                    other => {
                        tracing::warn!(target: "snmp_engine::error", { snmp.error_status = other }, "unknown SNMP error status");
                        Self::Unknown(other)
                    }
                }
            }

            /// Convert to raw status code.
            pub fn as_i32(&self) -> i32 {
                match self {
                    $(Self::$variant => $code,)*
                    Self::Unknown(code) => *code,
                }
            }
        }

        impl std::fmt::Display for ErrorStatus {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(Self::$variant => f.write_str($name),)*
                    Self::Unknown(code) => write!(f, "unknown({})", code),
                }
            }
        }
    };
}

error_statuses! {
    /// SNMP protocol error status codes (RFC 3416).
    ///
    /// Carried in the error-status field of a response PDU and handed to the
    /// request callback unchanged. Codes 0-5 exist in SNMPv1; 6-18 were added by
    /// SNMPv2.
    ///
    /// `NoSuchName` (2) is how an SNMPv1 agent reports an unknown object. The
    /// engine passes it through like any other status; it is never retried.
    ///
    /// # Example
    ///
    /// ```
    /// use snmp_engine::ErrorStatus;
    ///
    /// let status = ErrorStatus::from_i32(2);
    /// assert_eq!(status, ErrorStatus::NoSuchName);
    /// assert_eq!(status.as_i32(), 2);
    /// assert_eq!(status.to_string(), "noSuchName");
    /// ```
    enum ErrorStatus {
        NoError = 0 => "noError",
        /// Response would not fit in a message.
        TooBig = 1 => "tooBig",
        /// SNMPv1 only: the object is absent. v2c agents return exception values instead.
        NoSuchName = 2 => "noSuchName",
        BadValue = 3 => "badValue",
        ReadOnly = 4 => "readOnly",
        GenErr = 5 => "genErr",
        NoAccess = 6 => "noAccess",
        WrongType = 7 => "wrongType",
        WrongLength = 8 => "wrongLength",
        WrongEncoding = 9 => "wrongEncoding",
        WrongValue = 10 => "wrongValue",
        NoCreation = 11 => "noCreation",
        InconsistentValue = 12 => "inconsistentValue",
        ResourceUnavailable = 13 => "resourceUnavailable",
        CommitFailed = 14 => "commitFailed",
        /// The agent could not roll back a failed SET.
        UndoFailed = 15 => "undoFailed",
        AuthorizationError = 16 => "authorizationError",
        NotWritable = 17 => "notWritable",
        InconsistentName = 18 => "inconsistentName",
    }
}

impl ErrorStatus {
    /// Whether this status reports success.
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::NoError)
    }
}
