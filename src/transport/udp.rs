//! UDP endpoint backed by a tokio socket.

use super::{Endpoint, MAX_DATAGRAM_SIZE, TransportDomain};
use crate::error::{Error, Result};
use bytes::{Bytes, BytesMut};
use socket2::{Domain, Protocol, Socket, Type};
use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::task::{Context, Poll, ready};
use tokio::net::UdpSocket;

/// UDP endpoint.
///
/// One socket serves every target in its domain; replies are matched to
/// requests by request id, not by socket.
pub struct UdpEndpoint {
    socket: UdpSocket,
    local_addr: SocketAddr,
}

impl UdpEndpoint {
    /// Bind to a specific local address.
    pub async fn bind(addr: SocketAddr) -> Result<Self> {
        let bind_error = |source| Error::Transport { target: addr, source }.boxed();
        let socket = open_socket(addr).map_err(bind_error)?;
        let local_addr = socket.local_addr().map_err(bind_error)?;
        tracing::debug!(target: "snmp_engine::transport", { snmp.local_addr = %local_addr }, "UDP endpoint bound");
        Ok(Self { socket, local_addr })
    }

    /// Bind to an ephemeral port on the unspecified address of `domain`.
    ///
    /// This is the usual choice for a command generator, which only needs a
    /// source port to receive replies on.
    pub async fn client(domain: TransportDomain) -> Result<Self> {
        let addr = match domain {
            TransportDomain::Udp => SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0)),
            TransportDomain::Udp6 => SocketAddr::from((Ipv6Addr::UNSPECIFIED, 0)),
        };
        Self::bind(addr).await
    }
}

/// Non-blocking UDP socket registered with the current tokio reactor.
///
/// IPv6 sockets are v6-only so `Udp` and `Udp6` endpoints can share a port.
fn open_socket(addr: SocketAddr) -> io::Result<UdpSocket> {
    let domain = match addr {
        SocketAddr::V4(_) => Domain::IPV4,
        SocketAddr::V6(_) => Domain::IPV6,
    };
    let socket = Socket::new(domain, Type::DGRAM, Some(Protocol::UDP))?;
    if domain == Domain::IPV6 {
        socket.set_only_v6(true)?;
    }
    socket.set_nonblocking(true)?;
    socket.bind(&addr.into())?;
    UdpSocket::from_std(socket.into())
}

impl Endpoint for UdpEndpoint {
    fn poll_recv(&self, cx: &mut Context<'_>) -> Poll<io::Result<(Bytes, SocketAddr)>> {
        loop {
            ready!(self.socket.poll_recv_ready(cx))?;

            let mut buf = BytesMut::zeroed(MAX_DATAGRAM_SIZE);
            match self.socket.try_recv_from(&mut buf) {
                Ok((len, source)) => {
                    buf.truncate(len);
                    tracing::trace!(target: "snmp_engine::transport", { snmp.source = %source, snmp.bytes = len }, "UDP recv");
                    return Poll::Ready(Ok((buf.freeze(), source)));
                }
                // readiness was stale; poll again to re-register interest
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => continue,
                Err(e) => return Poll::Ready(Err(e)),
            }
        }
    }

    fn send_to(&self, data: &[u8], target: SocketAddr) -> io::Result<()> {
        tracing::trace!(target: "snmp_engine::transport", { snmp.target = %target, snmp.bytes = data.len() }, "UDP send");
        self.socket.try_send_to(data, target).map(|_| ())
    }

    fn local_addr(&self) -> io::Result<SocketAddr> {
        Ok(self.local_addr)
    }
}
