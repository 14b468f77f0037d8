//! Engine construction.

use std::time::Duration;

use bytes::Bytes;

use super::SnmpEngine;
use crate::cmdgen::Retry;
use crate::config::validate_engine_id;
use crate::error::{ConfigErrorKind, Error, Result};

/// Default time to wait for a response: snmpTargetAddrTimeout DEFVAL
/// (1500 centiseconds, RFC 3413).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Default maximum message size: the largest UDP payload over IPv4.
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 65507;

/// Smallest maximum message size an engine may advertise (RFC 3417).
pub const MIN_MAX_MESSAGE_SIZE: usize = 484;

/// Builder for [`SnmpEngine`].
///
/// # Example
///
/// ```rust
/// use snmp_engine::{Retry, SnmpEngine};
/// use std::time::Duration;
///
/// let engine = SnmpEngine::builder()
///     .engine_id(b"\x80\x00\x4f\xb8\x04manager")
///     .timeout(Duration::from_secs(2))
///     .retry(Retry::immediate(3))
///     .build()
///     .unwrap();
/// assert_eq!(engine.engine_boots(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct EngineBuilder {
    engine_id: Option<Bytes>,
    engine_boots: u32,
    timeout: Duration,
    retry: Retry,
    max_message_size: usize,
}

impl EngineBuilder {
    /// Create a builder with default settings.
    ///
    /// Defaults:
    /// - Engine ID: generated from the enterprise prefix and the process id
    /// - Engine boots: 1
    /// - Timeout: 15 seconds
    /// - Retry: none (each request is sent once)
    /// - Max message size: 65507 bytes
    pub fn new() -> Self {
        Self {
            engine_id: None,
            engine_boots: 1,
            timeout: DEFAULT_TIMEOUT,
            retry: Retry::default(),
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
        }
    }

    /// Set the snmpEngineID (5 to 32 octets).
    pub fn engine_id(mut self, engine_id: impl AsRef<[u8]>) -> Self {
        self.engine_id = Some(Bytes::copy_from_slice(engine_id.as_ref()));
        self
    }

    /// Set snmpEngineBoots.
    pub fn engine_boots(mut self, boots: u32) -> Self {
        self.engine_boots = boots;
        self
    }

    /// Set the default response timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the default retry policy.
    pub fn retry(mut self, retry: impl Into<Retry>) -> Self {
        self.retry = retry.into();
        self
    }

    /// Set snmpEngineMaxMessageSize. Larger outgoing messages are rejected.
    pub fn max_message_size(mut self, size: usize) -> Self {
        self.max_message_size = size;
        self
    }

    /// Validate the settings and construct the engine.
    pub fn build(self) -> Result<SnmpEngine> {
        let engine_id = match self.engine_id {
            Some(engine_id) => {
                validate_engine_id(&engine_id)?;
                engine_id
            }
            None => default_engine_id(),
        };

        if self.max_message_size < MIN_MAX_MESSAGE_SIZE {
            return Err(Error::config(ConfigErrorKind::InvalidMaxMessageSize {
                size: self.max_message_size,
            }));
        }

        tracing::debug!(
            target: "snmp_engine::config",
            {
                snmp.engine_id = %hex::encode(&engine_id),
                snmp.engine_boots = self.engine_boots,
                snmp.max_message_size = self.max_message_size,
                timeout = ?self.timeout,
                retries = self.retry.retries
            },
            "engine built"
        );

        Ok(SnmpEngine::from_parts(
            engine_id,
            self.engine_boots,
            self.timeout,
            self.retry,
            self.max_message_size,
        ))
    }
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// RFC 3411 text-format engine ID: enterprise 20408 with the high bit set,
/// format 4, then an administratively assigned string.
fn default_engine_id() -> Bytes {
    let mut id = vec![0x80, 0x00, 0x4f, 0xb8, 0x04];
    id.extend_from_slice(format!("snmp-engine-{}", std::process::id()).as_bytes());
    Bytes::from(id)
}
