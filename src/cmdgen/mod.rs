//! Command generator (RFC 3413 section 3.1).
//!
//! Owns the pending-request table and drives each request through its
//! lifecycle:
//!
//! 1. the PDU is built and given a request id no pending request holds
//! 2. the target is resolved, the PDU wrapped and the message sent
//! 3. a response timer is armed
//! 4. on timeout the message is retransmitted (same request id, same bytes)
//!    until the retry budget is spent
//! 5. a matching response, exhausted retries, a terminal error or
//!    cancellation removes the record
//!
//! Completed and failed requests are queued; the engine drains the queue and
//! runs each callback exactly once. Cancellation drops the callback instead.

mod outcome;
mod request;
mod retry;

pub use outcome::{Outcome, RequestHandle};
pub use request::{RequestKind, RequestOptions, RequestState};
pub use retry::{Backoff, Retry, RetryBuilder};

pub(crate) use request::build_pdu;

use bytes::Bytes;
use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::time::Instant;

use crate::config::{LocalConfig, ResolvedTarget};
use crate::dispatcher::{Dispatcher, TimerId};
use crate::engine::SnmpEngine;
use crate::error::{Error, ErrorStatus};
use crate::message::{IncomingMessage, MessageProcessingModel};
use crate::pdu::{Pdu, PduType};
use crate::security::SecurityModelId;

/// Continuation run once when a request completes or fails.
///
/// Receives the engine so it can submit follow-up requests or stop the loop.
/// Caller context is whatever the closure captures.
pub type ResponseCallback = Box<dyn FnOnce(&mut SnmpEngine, RequestHandle, Outcome)>;

/// Why a request timer was armed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TimerKind {
    /// No response arrived within the request timeout.
    ResponseTimeout,
    /// Backoff elapsed; send again.
    Retransmit,
}

/// Timer payload carried through the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TimerEvent {
    pub(crate) request_id: i32,
    pub(crate) kind: TimerKind,
}

/// Engine-wide defaults applied when neither the request nor the target
/// address overrides them.
#[derive(Debug, Clone)]
pub(crate) struct RequestDefaults {
    pub(crate) timeout: Duration,
    pub(crate) retry: Retry,
    pub(crate) max_message_size: usize,
}

struct PendingRequest {
    target: ResolvedTarget,
    pdu_type: PduType,
    message: Bytes,
    timeout: Duration,
    retry: Retry,
    /// Retransmissions so far.
    attempt: u32,
    state: RequestState,
    timer: Option<TimerId>,
    started: Instant,
    /// Send failure of the latest attempt, reported if the budget runs out.
    last_error: Option<Box<Error>>,
    callback: ResponseCallback,
}

/// A finished request waiting for its callback to run.
pub(crate) struct Completion {
    pub(crate) handle: RequestHandle,
    pub(crate) state: RequestState,
    pub(crate) outcome: Outcome,
    pub(crate) callback: ResponseCallback,
}

pub(crate) struct CommandGenerator {
    pending: HashMap<i32, PendingRequest>,
    completions: VecDeque<Completion>,
    next_request_id: i32,
}

impl CommandGenerator {
    pub(crate) fn new() -> Self {
        // Random start so a restarted process does not accept replies meant
        // for its predecessor.
        let initial_request_id = {
            use std::time::{SystemTime, UNIX_EPOCH};
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_nanos() as i32)
                .unwrap_or(1)
                .wrapping_abs()
                .max(1)
        };
        Self::with_initial_request_id(initial_request_id)
    }

    pub(crate) fn with_initial_request_id(initial_request_id: i32) -> Self {
        Self {
            pending: HashMap::new(),
            completions: VecDeque::new(),
            next_request_id: initial_request_id.max(1),
        }
    }

    /// Allocate a positive request id that no pending request holds.
    pub(crate) fn allocate_request_id(&mut self) -> i32 {
        loop {
            let id = self.next_request_id;
            self.next_request_id = match id.checked_add(1) {
                Some(next) => next,
                None => 1,
            };
            if !self.pending.contains_key(&id) {
                return id;
            }
        }
    }

    /// Submit a built PDU to `target`.
    ///
    /// Never fails synchronously: resolution, security and transport
    /// failures are queued as completions for the callback.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn submit(
        &mut self,
        target: &str,
        pdu: Pdu,
        options: RequestOptions,
        callback: ResponseCallback,
        defaults: &RequestDefaults,
        config: &LocalConfig,
        dispatcher: &mut Dispatcher<TimerEvent>,
    ) -> RequestHandle {
        let request_id = pdu.request_id;
        let handle = RequestHandle(request_id);
        tracing::trace!(
            target: "snmp_engine::cmdgen",
            { snmp.request_id = request_id, snmp.target = target, snmp.pdu_type = %pdu.pdu_type },
            "request built"
        );

        if self.pending.contains_key(&request_id) {
            self.push_failure(handle, Error::DuplicateRequestId(request_id).boxed(), callback);
            return handle;
        }

        let prepared = config.resolve(target).and_then(|resolved| {
            let mp = MessageProcessingModel::for_version(resolved.version);
            let message = mp.wrap(
                SecurityModelId::Any,
                &resolved.security_name,
                resolved.security_level,
                &pdu,
                config,
                defaults.max_message_size,
            )?;
            Ok((resolved, message))
        });
        let (resolved, message) = match prepared {
            Ok(prepared) => prepared,
            Err(error) => {
                tracing::debug!(
                    target: "snmp_engine::cmdgen",
                    { snmp.request_id = request_id, snmp.target = target, error = %error },
                    "request rejected before sending"
                );
                self.push_failure(handle, error, callback);
                return handle;
            }
        };

        let timeout = options
            .timeout
            .or(resolved.timeout)
            .unwrap_or(defaults.timeout);
        let retry = options
            .retry
            .or_else(|| {
                resolved.retries.map(|retries| Retry {
                    retries,
                    backoff: defaults.retry.backoff.clone(),
                })
            })
            .unwrap_or_else(|| defaults.retry.clone());

        self.pending.insert(
            request_id,
            PendingRequest {
                target: resolved,
                pdu_type: pdu.pdu_type,
                message,
                timeout,
                retry,
                attempt: 0,
                state: RequestState::Submitted,
                timer: None,
                started: Instant::now(),
                last_error: None,
                callback,
            },
        );
        self.transmit(request_id, dispatcher);
        handle
    }

    /// Send the stored message and arm the response timer.
    fn transmit(&mut self, request_id: i32, dispatcher: &mut Dispatcher<TimerEvent>) {
        let Some(pending) = self.pending.get_mut(&request_id) else {
            return;
        };

        match dispatcher.send(
            pending.target.domain,
            pending.target.address,
            &pending.message,
        ) {
            Ok(()) => {
                pending.last_error = None;
                tracing::trace!(
                    target: "snmp_engine::cmdgen",
                    {
                        snmp.request_id = request_id,
                        snmp.target = %pending.target.address,
                        snmp.attempt = pending.attempt,
                        snmp.bytes = pending.message.len()
                    },
                    "request sent"
                );
            }
            // Counts as an attempt; the timeout below drives the retry.
            Err(error) if error.is_retriable() => {
                pending.last_error = Some(error);
            }
            Err(error) => {
                self.finish_failed(request_id, error, dispatcher);
                return;
            }
        }

        pending.state = RequestState::AwaitingResponse;
        pending.timer = Some(dispatcher.arm_timer(
            pending.timeout,
            TimerEvent {
                request_id,
                kind: TimerKind::ResponseTimeout,
            },
        ));
    }

    /// Handle an expired request timer.
    pub(crate) fn on_timer(&mut self, event: TimerEvent, dispatcher: &mut Dispatcher<TimerEvent>) {
        let request_id = event.request_id;
        let Some(pending) = self.pending.get_mut(&request_id) else {
            tracing::trace!(target: "snmp_engine::cmdgen", { snmp.request_id = request_id }, "timer for finished request");
            return;
        };
        pending.timer = None;

        match event.kind {
            TimerKind::Retransmit => self.transmit(request_id, dispatcher),
            TimerKind::ResponseTimeout if pending.attempt < pending.retry.retries => {
                let delay = pending.retry.compute_delay(pending.attempt);
                pending.attempt += 1;
                pending.state = RequestState::Retrying;
                tracing::debug!(
                    target: "snmp_engine::cmdgen",
                    {
                        snmp.request_id = request_id,
                        snmp.target = %pending.target.address,
                        snmp.attempt = pending.attempt,
                        snmp.max_retries = pending.retry.retries,
                        ?delay
                    },
                    "response timeout, retrying"
                );
                if delay.is_zero() {
                    self.transmit(request_id, dispatcher);
                } else {
                    pending.timer = Some(dispatcher.arm_timer(
                        delay,
                        TimerEvent {
                            request_id,
                            kind: TimerKind::Retransmit,
                        },
                    ));
                }
            }
            TimerKind::ResponseTimeout => {
                let error = pending.last_error.take().unwrap_or_else(|| {
                    Error::Timeout {
                        target: pending.target.address,
                        elapsed: pending.started.elapsed(),
                        retries: pending.attempt,
                    }
                    .boxed()
                });
                tracing::debug!(
                    target: "snmp_engine::cmdgen",
                    { snmp.request_id = request_id, snmp.target = %pending.target.address, error = %error },
                    "request failed after retries"
                );
                self.finish_failed(request_id, error, dispatcher);
            }
        }
    }

    /// Match an authenticated inbound message against the pending table.
    ///
    /// Anything that is not a Response to a pending request sent with the
    /// same version, security model and credential is dropped and the
    /// request keeps waiting. Identities sharing a community are
    /// indistinguishable on the wire, so any of them matches.
    pub(crate) fn on_message(
        &mut self,
        incoming: IncomingMessage,
        source: SocketAddr,
        config: &LocalConfig,
        dispatcher: &mut Dispatcher<TimerEvent>,
    ) {
        let request_id = incoming.pdu.request_id;
        if incoming.pdu.pdu_type != PduType::Response {
            tracing::debug!(
                target: "snmp_engine::cmdgen",
                { snmp.request_id = request_id, snmp.source = %source, snmp.pdu_type = %incoming.pdu.pdu_type },
                "discarding unexpected PDU type"
            );
            return;
        }

        let Some(pending) = self.pending.get(&request_id) else {
            tracing::debug!(
                target: "snmp_engine::cmdgen",
                { snmp.request_id = request_id, snmp.source = %source },
                "discarding response for unknown request"
            );
            return;
        };

        let expected_model = MessageProcessingModel::for_version(pending.target.version)
            .security_model()
            .id();
        if incoming.version != pending.target.version
            || incoming.security_model != expected_model
            || !same_credential(config, &incoming.security_name, &pending.target.security_name)
        {
            tracing::debug!(
                target: "snmp_engine::cmdgen",
                {
                    snmp.request_id = request_id,
                    snmp.source = %source,
                    snmp.version = %incoming.version,
                    snmp.security_name = %incoming.security_name
                },
                "discarding response with mismatched security parameters"
            );
            return;
        }

        let Some(mut pending) = self.pending.remove(&request_id) else {
            return;
        };
        if let Some(timer) = pending.timer.take() {
            dispatcher.cancel_timer(timer);
        }

        let pdu = incoming.pdu;
        tracing::debug!(
            target: "snmp_engine::cmdgen",
            {
                snmp.request_id = request_id,
                snmp.source = %source,
                snmp.request_type = %pending.pdu_type,
                snmp.error_status = pdu.error_status,
                elapsed = ?pending.started.elapsed()
            },
            "response matched"
        );
        let outcome = Outcome::response(
            ErrorStatus::from_i32(pdu.error_status),
            u32::try_from(pdu.error_index).unwrap_or(0),
            pdu.varbinds,
        );
        self.completions.push_back(Completion {
            handle: RequestHandle(request_id),
            state: RequestState::Completed,
            outcome,
            callback: pending.callback,
        });
    }

    /// Drop a request and its callback. Returns whether anything was removed.
    pub(crate) fn cancel(&mut self, handle: RequestHandle, dispatcher: &mut Dispatcher<TimerEvent>) -> bool {
        if let Some(mut pending) = self.pending.remove(&handle.0) {
            if let Some(timer) = pending.timer.take() {
                dispatcher.cancel_timer(timer);
            }
            tracing::debug!(target: "snmp_engine::cmdgen", { snmp.request_id = handle.0 }, "request cancelled");
            return true;
        }

        let before = self.completions.len();
        self.completions.retain(|c| c.handle != handle);
        before != self.completions.len()
    }

    /// Current state, or `None` once the callback has run or the request
    /// was cancelled.
    pub(crate) fn request_state(&self, handle: RequestHandle) -> Option<RequestState> {
        if let Some(pending) = self.pending.get(&handle.0) {
            return Some(pending.state);
        }
        self.completions
            .iter()
            .find(|c| c.handle == handle)
            .map(|c| c.state)
    }

    /// Whether a pending request was addressed to `target`.
    pub(crate) fn is_target_in_use(&self, target: &str) -> bool {
        self.pending.values().any(|p| p.target.target == target)
    }

    pub(crate) fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub(crate) fn is_idle(&self) -> bool {
        self.pending.is_empty() && self.completions.is_empty()
    }

    pub(crate) fn next_completion(&mut self) -> Option<Completion> {
        self.completions.pop_front()
    }

    fn finish_failed(&mut self, request_id: i32, error: Box<Error>, dispatcher: &mut Dispatcher<TimerEvent>) {
        let Some(mut pending) = self.pending.remove(&request_id) else {
            return;
        };
        if let Some(timer) = pending.timer.take() {
            dispatcher.cancel_timer(timer);
        }
        self.push_failure(RequestHandle(request_id), error, pending.callback);
    }

    fn push_failure(&mut self, handle: RequestHandle, error: Box<Error>, callback: ResponseCallback) {
        self.completions.push_back(Completion {
            handle,
            state: RequestState::Failed,
            outcome: Outcome::failed(error),
            callback,
        });
    }
}

fn same_credential(config: &LocalConfig, received: &str, expected: &str) -> bool {
    if received == expected {
        return true;
    }
    match (config.identity(received), config.identity(expected)) {
        (Some(received), Some(expected)) => received.community == expected.community,
        _ => false,
    }
}
