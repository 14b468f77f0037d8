//! Mock endpoint for testing.
//!
//! Records every datagram the engine sends and delivers replies produced by
//! a programmable responder, so engine behavior can be exercised without a
//! network and with a paused clock.

use super::Endpoint;
use bytes::Bytes;
use std::collections::VecDeque;
use std::io;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll, Waker};

type Responder = Box<dyn FnMut(&[u8], SocketAddr) -> Option<Bytes> + Send>;

/// A datagram sent through the mock endpoint.
#[derive(Clone, Debug)]
pub struct SentDatagram {
    /// Raw message bytes.
    pub data: Bytes,
    /// Destination address.
    pub target: SocketAddr,
}

struct MockEndpointInner {
    local_addr: SocketAddr,
    sent: Vec<SentDatagram>,
    inbox: VecDeque<(Bytes, SocketAddr)>,
    responder: Option<Responder>,
    failing_sends: usize,
    waker: Option<Waker>,
}

impl MockEndpointInner {
    fn deliver(&mut self, data: Bytes, source: SocketAddr) {
        self.inbox.push_back((data, source));
        if let Some(waker) = self.waker.take() {
            waker.wake();
        }
    }
}

/// Programmable in-memory endpoint.
///
/// Clones share state: register one clone with the engine and keep another
/// to inspect traffic or inject datagrams.
///
/// ```rust,ignore
/// use snmp_engine::transport::MockEndpoint;
/// use bytes::Bytes;
///
/// let mock = MockEndpoint::new("127.0.0.1:50000".parse().unwrap());
/// // echo every request straight back
/// mock.set_responder(|data, _target| Some(Bytes::copy_from_slice(data)));
/// assert!(mock.sent().is_empty());
/// ```
#[derive(Clone)]
pub struct MockEndpoint {
    inner: Arc<Mutex<MockEndpointInner>>,
}

impl MockEndpoint {
    /// Create a mock endpoint reporting `local_addr`.
    pub fn new(local_addr: SocketAddr) -> Self {
        Self {
            inner: Arc::new(Mutex::new(MockEndpointInner {
                local_addr,
                sent: Vec::new(),
                inbox: VecDeque::new(),
                responder: None,
                failing_sends: 0,
                waker: None,
            })),
        }
    }

    /// Reply to each sent datagram with whatever `responder` returns.
    ///
    /// The reply appears to come from the address the request was sent to.
    pub fn set_responder<F>(&self, responder: F)
    where
        F: FnMut(&[u8], SocketAddr) -> Option<Bytes> + Send + 'static,
    {
        self.inner.lock().unwrap().responder = Some(Box::new(responder));
    }

    /// Stop replying.
    pub fn clear_responder(&self) {
        self.inner.lock().unwrap().responder = None;
    }

    /// Queue a datagram as if received from `source`.
    pub fn inject(&self, data: impl Into<Bytes>, source: SocketAddr) {
        self.inner.lock().unwrap().deliver(data.into(), source);
    }

    /// Make the next `count` sends fail with an I/O error.
    pub fn fail_sends(&self, count: usize) {
        self.inner.lock().unwrap().failing_sends = count;
    }

    /// All datagrams sent so far, in order.
    pub fn sent(&self) -> Vec<SentDatagram> {
        self.inner.lock().unwrap().sent.clone()
    }

    /// Number of datagrams sent so far.
    pub fn sent_count(&self) -> usize {
        self.inner.lock().unwrap().sent.len()
    }
}

impl Endpoint for MockEndpoint {
    fn poll_recv(&self, cx: &mut Context<'_>) -> Poll<io::Result<(Bytes, SocketAddr)>> {
        let mut inner = self.inner.lock().unwrap();
        match inner.inbox.pop_front() {
            Some(datagram) => Poll::Ready(Ok(datagram)),
            None => {
                inner.waker = Some(cx.waker().clone());
                Poll::Pending
            }
        }
    }

    fn send_to(&self, data: &[u8], target: SocketAddr) -> io::Result<()> {
        let mut inner = self.inner.lock().unwrap();
        let data = Bytes::copy_from_slice(data);
        inner.sent.push(SentDatagram {
            data: data.clone(),
            target,
        });

        if inner.failing_sends > 0 {
            inner.failing_sends -= 1;
            return Err(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                "simulated send failure",
            ));
        }

        let reply = inner
            .responder
            .as_mut()
            .and_then(|responder| responder(&data, target));
        if let Some(reply) = reply {
            inner.deliver(reply, target);
        }
        Ok(())
    }

    fn local_addr(&self) -> io::Result<SocketAddr> {
        Ok(self.inner.lock().unwrap().local_addr)
    }
}
