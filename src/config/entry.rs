//! Configuration table entries.

use bytes::Bytes;
use std::net::SocketAddr;
use std::time::Duration;

use crate::message::SecurityLevel;
use crate::transport::TransportDomain;
use crate::version::Version;

/// A security name and the credential that proves it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityIdentity {
    /// Model-independent name used by target parameters.
    pub security_name: String,
    /// Community string carried on the wire.
    pub community: Bytes,
    /// Authoritative engine the identity is scoped to, if any (5..=32 octets).
    pub engine_id: Option<Bytes>,
}

impl SecurityIdentity {
    /// Community-based identity.
    pub fn community(security_name: impl Into<String>, community: impl AsRef<[u8]>) -> Self {
        Self {
            security_name: security_name.into(),
            community: Bytes::copy_from_slice(community.as_ref()),
            engine_id: None,
        }
    }

    /// Scope the identity to an authoritative engine.
    pub fn with_engine_id(mut self, engine_id: impl AsRef<[u8]>) -> Self {
        self.engine_id = Some(Bytes::copy_from_slice(engine_id.as_ref()));
        self
    }
}

/// How to talk to a target: who we are and which message format to use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetParams {
    /// Entry name, referenced by target addresses.
    pub name: String,
    /// Security identity to send as.
    pub security_name: String,
    /// Required protection level.
    pub security_level: SecurityLevel,
    /// Message-processing model.
    pub version: Version,
}

impl TargetParams {
    pub fn new(
        name: impl Into<String>,
        security_name: impl Into<String>,
        security_level: SecurityLevel,
        version: Version,
    ) -> Self {
        Self {
            name: name.into(),
            security_name: security_name.into(),
            security_level,
            version,
        }
    }
}

/// Where a target lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetAddress {
    /// Target name used when submitting requests.
    pub name: String,
    /// Transport domain, selecting the endpoint to send through.
    pub domain: TransportDomain,
    /// Socket address of the agent.
    pub address: SocketAddr,
    /// Target parameters to use.
    pub params_name: String,
    /// Timeout overriding the engine default.
    pub timeout: Option<Duration>,
    /// Retry count overriding the engine default.
    pub retries: Option<u32>,
}

impl TargetAddress {
    pub fn new(
        name: impl Into<String>,
        domain: TransportDomain,
        address: SocketAddr,
        params_name: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            domain,
            address,
            params_name: params_name.into(),
            timeout: None,
            retries: None,
        }
    }

    /// UDP target, picking the IPv4 or IPv6 domain from the address.
    pub fn udp(name: impl Into<String>, address: SocketAddr, params_name: impl Into<String>) -> Self {
        Self::new(name, TransportDomain::for_addr(&address), address, params_name)
    }

    /// Set the per-target timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the per-target retry count.
    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = Some(retries);
        self
    }
}
