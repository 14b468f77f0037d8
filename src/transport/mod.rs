//! Transport endpoints.
//!
//! An [`Endpoint`] is a bound, non-blocking datagram socket owned by the
//! [`Dispatcher`](crate::dispatcher::Dispatcher). The dispatcher polls every
//! endpoint for readability from its single event loop and sends through
//! them without awaiting.

mod udp;

#[cfg(any(test, feature = "testing"))]
mod mock;

pub use udp::*;

#[cfg(any(test, feature = "testing"))]
pub use mock::*;

use bytes::Bytes;
use std::fmt;
use std::io;
use std::net::SocketAddr;
use std::task::{Context, Poll};

use crate::oid::Oid;

/// Largest UDP payload an endpoint will read.
pub const MAX_DATAGRAM_SIZE: usize = 65535;

/// Transport domain an endpoint serves (RFC 3417, RFC 3419).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TransportDomain {
    /// snmpUDPDomain, UDP over IPv4.
    Udp,
    /// transportDomainUdpIpv6.
    Udp6,
}

impl TransportDomain {
    /// Registered OID of the domain.
    pub fn oid(self) -> Oid {
        match self {
            Self::Udp => crate::oid!(1, 3, 6, 1, 6, 1, 1),
            Self::Udp6 => crate::oid!(1, 3, 6, 1, 2, 1, 100, 1, 2),
        }
    }

    /// Domain matching the address family of `addr`.
    pub fn for_addr(addr: &SocketAddr) -> Self {
        if addr.is_ipv6() { Self::Udp6 } else { Self::Udp }
    }
}

impl fmt::Display for TransportDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Udp => write!(f, "snmpUDPDomain"),
            Self::Udp6 => write!(f, "transportDomainUdpIpv6"),
        }
    }
}

/// A bound datagram socket driven by the dispatcher.
///
/// Implementations never block: `poll_recv` registers the task's waker when
/// no datagram is queued, and `send_to` either hands the datagram to the OS
/// or fails immediately.
pub trait Endpoint {
    /// Poll for one received datagram and its source address.
    fn poll_recv(&self, cx: &mut Context<'_>) -> Poll<io::Result<(Bytes, SocketAddr)>>;

    /// Send one datagram.
    fn send_to(&self, data: &[u8], target: SocketAddr) -> io::Result<()>;

    /// Local bind address.
    fn local_addr(&self) -> io::Result<SocketAddr>;
}
