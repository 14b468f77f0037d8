//! Transport and timer multiplexing.
//!
//! The [`Dispatcher`] owns the registered endpoints and the table of armed
//! timers. Each call to [`poll_events`](Dispatcher::poll_events) suspends
//! until at least one endpoint is readable or the earliest timer is due, then
//! reports everything observed in that step: at most one datagram (or
//! receive error) per endpoint in registration order, followed by every
//! expired timer in deadline order.
//!
//! The dispatcher never interprets datagrams or timer payloads; the engine
//! routes them to message processing and the command generator.

mod timer;

pub use timer::TimerId;

use bytes::Bytes;
use std::future::{Future, poll_fn};
use std::io;
use std::net::SocketAddr;
use std::pin::pin;
use std::task::Poll;
use std::time::Duration;
use tokio::time::Instant;

use crate::error::{ConfigErrorKind, Error, Result};
use crate::transport::{Endpoint, TransportDomain};
use timer::TimerTable;

/// Something observed during one poll step.
#[derive(Debug)]
pub enum DispatchEvent<T> {
    /// A datagram arrived on the endpoint serving `domain`.
    Datagram {
        domain: TransportDomain,
        source: SocketAddr,
        data: Bytes,
    },
    /// Reading from the endpoint serving `domain` failed.
    ReceiveError {
        domain: TransportDomain,
        error: io::Error,
    },
    /// A timer reached its deadline.
    TimerExpired(T),
}

/// Endpoint and timer owner for a single-threaded event loop.
pub struct Dispatcher<T> {
    endpoints: Vec<(TransportDomain, Box<dyn Endpoint>)>,
    timers: TimerTable<T>,
}

impl<T> Dispatcher<T> {
    /// Create a dispatcher with no endpoints or timers.
    pub fn new() -> Self {
        Self {
            endpoints: Vec::new(),
            timers: TimerTable::new(),
        }
    }

    /// Register the endpoint serving `domain`. One endpoint per domain.
    pub fn register_endpoint(
        &mut self,
        domain: TransportDomain,
        endpoint: impl Endpoint + 'static,
    ) -> Result<()> {
        if self.endpoint(domain).is_some() {
            return Err(Error::config(ConfigErrorKind::DuplicateEndpoint(domain)));
        }
        tracing::debug!(
            target: "snmp_engine::dispatcher",
            { snmp.domain = %domain, snmp.local_addr = ?endpoint.local_addr().ok() },
            "endpoint registered"
        );
        self.endpoints.push((domain, Box::new(endpoint)));
        Ok(())
    }

    /// Whether an endpoint serves `domain`.
    pub fn has_endpoint(&self, domain: TransportDomain) -> bool {
        self.endpoint(domain).is_some()
    }

    fn endpoint(&self, domain: TransportDomain) -> Option<&dyn Endpoint> {
        self.endpoints
            .iter()
            .find(|(d, _)| *d == domain)
            .map(|(_, endpoint)| endpoint.as_ref())
    }

    /// Send `data` to `target` through the endpoint serving `domain`.
    pub fn send(&self, domain: TransportDomain, target: SocketAddr, data: &[u8]) -> Result<()> {
        let endpoint = self
            .endpoint(domain)
            .ok_or_else(|| Error::config(ConfigErrorKind::NoEndpoint(domain)))?;

        endpoint.send_to(data, target).map_err(|source| {
            tracing::warn!(target: "snmp_engine::dispatcher", { snmp.target = %target, error = %source }, "send failed");
            Error::Transport { target, source }.boxed()
        })
    }

    /// Arm a one-shot timer that reports `payload` after `delay`.
    pub fn arm_timer(&mut self, delay: Duration, payload: T) -> TimerId {
        self.timers.arm(delay, payload)
    }

    /// Disarm a timer, returning its payload if it had not fired.
    pub fn cancel_timer(&mut self, id: TimerId) -> Option<T> {
        self.timers.cancel(id)
    }

    /// Number of armed timers.
    pub fn timer_count(&self) -> usize {
        self.timers.len()
    }

    /// Wait for the next batch of events.
    ///
    /// Never returns an empty batch. With no endpoints and no timers this
    /// waits forever, so callers select it against their own stop signal.
    pub async fn poll_events(&mut self) -> Vec<DispatchEvent<T>> {
        let sleep = self.timers.next_deadline().map(tokio::time::sleep_until);
        let mut sleep = pin!(sleep);
        let endpoints = &self.endpoints;

        let mut events = poll_fn(|cx| {
            let mut events = Vec::new();
            for (domain, endpoint) in endpoints {
                match endpoint.poll_recv(cx) {
                    Poll::Ready(Ok((data, source))) => events.push(DispatchEvent::Datagram {
                        domain: *domain,
                        source,
                        data,
                    }),
                    Poll::Ready(Err(error)) => {
                        tracing::warn!(target: "snmp_engine::dispatcher", { snmp.domain = %domain, error = %error }, "receive failed");
                        events.push(DispatchEvent::ReceiveError {
                            domain: *domain,
                            error,
                        });
                    }
                    Poll::Pending => {}
                }
            }

            let timer_due = match sleep.as_mut().as_pin_mut() {
                Some(sleep) => sleep.poll(cx).is_ready(),
                None => false,
            };

            if events.is_empty() && !timer_due {
                Poll::Pending
            } else {
                Poll::Ready(events)
            }
        })
        .await;

        events.extend(
            self.timers
                .expire(Instant::now())
                .into_iter()
                .map(DispatchEvent::TimerExpired),
        );
        events
    }
}

impl<T> Default for Dispatcher<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MockEndpoint;

    fn mock() -> MockEndpoint {
        MockEndpoint::new("127.0.0.1:40000".parse().unwrap())
    }

    #[test]
    fn test_duplicate_endpoint_rejected() {
        let mut dispatcher: Dispatcher<()> = Dispatcher::new();
        dispatcher.register_endpoint(TransportDomain::Udp, mock()).unwrap();
        let err = dispatcher
            .register_endpoint(TransportDomain::Udp, mock())
            .unwrap_err();
        assert!(matches!(
            *err,
            Error::Config(ConfigErrorKind::DuplicateEndpoint(TransportDomain::Udp))
        ));
    }

    #[test]
    fn test_send_without_endpoint() {
        let dispatcher: Dispatcher<()> = Dispatcher::new();
        let err = dispatcher
            .send(TransportDomain::Udp6, "[::1]:161".parse().unwrap(), b"x")
            .unwrap_err();
        assert!(matches!(
            *err,
            Error::Config(ConfigErrorKind::NoEndpoint(TransportDomain::Udp6))
        ));
    }

    #[test]
    fn test_send_failure_is_transport_error() {
        let endpoint = mock();
        endpoint.fail_sends(1);
        let mut dispatcher: Dispatcher<()> = Dispatcher::new();
        dispatcher.register_endpoint(TransportDomain::Udp, endpoint.clone()).unwrap();

        let target: SocketAddr = "192.0.2.1:161".parse().unwrap();
        let err = dispatcher.send(TransportDomain::Udp, target, b"x").unwrap_err();
        assert!(matches!(*err, Error::Transport { target: t, .. } if t == target));

        // only the first send was set to fail
        dispatcher.send(TransportDomain::Udp, target, b"y").unwrap();
        assert_eq!(endpoint.sent_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_datagram_and_timer_events() {
        let endpoint = mock();
        let mut dispatcher = Dispatcher::new();
        dispatcher.register_endpoint(TransportDomain::Udp, endpoint.clone()).unwrap();

        let source: SocketAddr = "192.0.2.7:161".parse().unwrap();
        endpoint.inject(Bytes::from_static(b"hello"), source);
        dispatcher.arm_timer(Duration::from_secs(1), "tick");

        let events = dispatcher.poll_events().await;
        assert_eq!(events.len(), 1);
        assert!(matches!(
            &events[0],
            DispatchEvent::Datagram { source: s, data, .. } if *s == source && &data[..] == b"hello"
        ));

        // nothing readable: waits for the timer
        let events = dispatcher.poll_events().await;
        assert!(matches!(events[..], [DispatchEvent::TimerExpired("tick")]));
        assert_eq!(dispatcher.timer_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_timer_never_fires() {
        let mut dispatcher: Dispatcher<u32> = Dispatcher::new();
        let cancelled = dispatcher.arm_timer(Duration::from_secs(1), 1);
        dispatcher.arm_timer(Duration::from_secs(2), 2);
        assert_eq!(dispatcher.cancel_timer(cancelled), Some(1));

        let start = Instant::now();
        let events = dispatcher.poll_events().await;
        assert!(matches!(events[..], [DispatchEvent::TimerExpired(2)]));
        assert_eq!(start.elapsed(), Duration::from_secs(2));
    }
}
