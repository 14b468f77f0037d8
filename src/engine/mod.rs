//! The SNMP engine.
//!
//! [`SnmpEngine`] is the composition root: it owns the local configuration
//! store, the dispatcher with its endpoints and timers, and the command
//! generator's pending-request table. Everything runs on the task that calls
//! [`run`](SnmpEngine::run); request callbacks receive `&mut SnmpEngine` and
//! may submit further requests, change configuration or stop the loop.
//!
//! # Example
//!
//! ```rust,no_run
//! use snmp_engine::{
//!     SecurityIdentity, SecurityLevel, SnmpEngine, TargetAddress, TargetParams,
//!     TransportDomain, UdpEndpoint, Value, VarBind, Version, oid,
//! };
//!
//! # async fn example() -> snmp_engine::Result<()> {
//! let mut engine = SnmpEngine::builder().build()?;
//! engine.add_identity(SecurityIdentity::community("my-area", "private"))?;
//! engine.add_target_params(TargetParams::new(
//!     "my-creds",
//!     "my-area",
//!     SecurityLevel::NoAuthNoPriv,
//!     Version::V1,
//! ))?;
//! engine.add_target_address(TargetAddress::udp(
//!     "my-router",
//!     "192.0.2.1:161".parse().unwrap(),
//!     "my-creds",
//! ))?;
//! engine.register_endpoint(
//!     TransportDomain::Udp,
//!     UdpEndpoint::client(TransportDomain::Udp).await?,
//! )?;
//!
//! engine.set(
//!     "my-router",
//!     vec![VarBind::new(oid!(1, 3, 6, 1, 2, 1, 1, 5, 0), Value::from("core-1"))],
//!     |_engine, _handle, outcome| match outcome.into_result() {
//!         Ok(varbinds) => println!("set {} objects", varbinds.len()),
//!         Err(e) => eprintln!("set failed: {}", e),
//!     },
//! )?;
//!
//! engine.run_until_complete().await;
//! # Ok(())
//! # }
//! ```

mod builder;

pub use builder::{DEFAULT_MAX_MESSAGE_SIZE, DEFAULT_TIMEOUT, EngineBuilder, MIN_MAX_MESSAGE_SIZE};

use std::time::Duration;

use bytes::Bytes;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::cmdgen::{
    CommandGenerator, Outcome, RequestDefaults, RequestHandle, RequestKind, RequestOptions,
    RequestState, Retry, TimerEvent, build_pdu,
};
use crate::config::{LocalConfig, SecurityIdentity, TargetAddress, TargetParams};
use crate::dispatcher::{DispatchEvent, Dispatcher};
use crate::error::{ConfigErrorKind, Error, Result};
use crate::message::unwrap_message;
use crate::oid::Oid;
use crate::transport::{Endpoint, TransportDomain};
use crate::varbind::VarBind;

/// An SNMP engine running a command generator.
///
/// Not `Send`: all configuration, submission and callbacks happen on the
/// task driving [`run`](Self::run). Other threads control the loop through
/// an [`EngineHandle`].
pub struct SnmpEngine {
    engine_id: Bytes,
    engine_boots: u32,
    started: Instant,
    defaults: RequestDefaults,
    config: LocalConfig,
    dispatcher: Dispatcher<TimerEvent>,
    cmdgen: CommandGenerator,
    stop: CancellationToken,
    shutdown: CancellationToken,
}

impl SnmpEngine {
    /// Create a builder for configuring the engine.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    pub(crate) fn from_parts(
        engine_id: Bytes,
        engine_boots: u32,
        timeout: Duration,
        retry: Retry,
        max_message_size: usize,
    ) -> Self {
        Self {
            engine_id,
            engine_boots,
            started: Instant::now(),
            defaults: RequestDefaults {
                timeout,
                retry,
                max_message_size,
            },
            config: LocalConfig::new(),
            dispatcher: Dispatcher::new(),
            cmdgen: CommandGenerator::new(),
            stop: CancellationToken::new(),
            shutdown: CancellationToken::new(),
        }
    }

    /// snmpEngineID.
    pub fn engine_id(&self) -> &[u8] {
        &self.engine_id
    }

    /// snmpEngineBoots.
    pub fn engine_boots(&self) -> u32 {
        self.engine_boots
    }

    /// snmpEngineTime: seconds since the engine was built, capped at 2^31-1.
    pub fn engine_time(&self) -> u32 {
        self.started.elapsed().as_secs().min(i32::MAX as u64) as u32
    }

    /// snmpEngineMaxMessageSize.
    pub fn max_message_size(&self) -> usize {
        self.defaults.max_message_size
    }

    /// Read access to the local configuration store.
    pub fn config(&self) -> &LocalConfig {
        &self.config
    }

    // ----- configuration -----

    /// Add a security identity. Re-adding identical data is a no-op.
    pub fn add_identity(&mut self, identity: SecurityIdentity) -> Result<()> {
        self.config.add_identity(identity)
    }

    /// Remove a security identity.
    pub fn remove_identity(&mut self, security_name: &str) -> Result<SecurityIdentity> {
        self.config.remove_identity(security_name)
    }

    /// Add target parameters. Re-adding identical data is a no-op.
    pub fn add_target_params(&mut self, params: TargetParams) -> Result<()> {
        self.config.add_target_params(params)
    }

    /// Remove target parameters.
    pub fn remove_target_params(&mut self, name: &str) -> Result<TargetParams> {
        self.config.remove_target_params(name)
    }

    /// Add a target address. Re-adding identical data is a no-op.
    pub fn add_target_address(&mut self, address: TargetAddress) -> Result<()> {
        self.config.add_target_address(address)
    }

    /// Remove a target address.
    ///
    /// Fails with [`ConfigErrorKind::TargetInUse`] while a request to the
    /// target is pending.
    pub fn remove_target_address(&mut self, name: &str) -> Result<TargetAddress> {
        if self.cmdgen.is_target_in_use(name) {
            return Err(Error::config(ConfigErrorKind::TargetInUse {
                target: name.to_string(),
            }));
        }
        self.config.remove_target_address(name)
    }

    /// Register the endpoint serving `domain`.
    pub fn register_endpoint(
        &mut self,
        domain: TransportDomain,
        endpoint: impl Endpoint + 'static,
    ) -> Result<()> {
        self.dispatcher.register_endpoint(domain, endpoint)
    }

    // ----- requests -----

    /// Submit a request to `target`.
    ///
    /// Fails synchronously only when a binding cannot be carried by the PDU.
    /// Every other outcome, success or failure, reaches `callback` exactly
    /// once from inside [`run`](Self::run), unless the request is cancelled
    /// first.
    pub fn send_request<F>(
        &mut self,
        target: &str,
        kind: RequestKind,
        varbinds: Vec<VarBind>,
        options: RequestOptions,
        callback: F,
    ) -> Result<RequestHandle>
    where
        F: FnOnce(&mut SnmpEngine, RequestHandle, Outcome) + 'static,
    {
        let request_id = self.cmdgen.allocate_request_id();
        let pdu = build_pdu(kind, request_id, varbinds)?;
        Ok(self.cmdgen.submit(
            target,
            pdu,
            options,
            Box::new(callback),
            &self.defaults,
            &self.config,
            &mut self.dispatcher,
        ))
    }

    /// GET the given OIDs.
    pub fn get<F>(&mut self, target: &str, oids: &[Oid], callback: F) -> Result<RequestHandle>
    where
        F: FnOnce(&mut SnmpEngine, RequestHandle, Outcome) + 'static,
    {
        let varbinds = oids.iter().cloned().map(VarBind::null).collect();
        self.send_request(
            target,
            RequestKind::Get,
            varbinds,
            RequestOptions::default(),
            callback,
        )
    }

    /// GETNEXT the given OIDs.
    pub fn get_next<F>(&mut self, target: &str, oids: &[Oid], callback: F) -> Result<RequestHandle>
    where
        F: FnOnce(&mut SnmpEngine, RequestHandle, Outcome) + 'static,
    {
        let varbinds = oids.iter().cloned().map(VarBind::null).collect();
        self.send_request(
            target,
            RequestKind::GetNext,
            varbinds,
            RequestOptions::default(),
            callback,
        )
    }

    /// SET the given bindings.
    pub fn set<F>(&mut self, target: &str, varbinds: Vec<VarBind>, callback: F) -> Result<RequestHandle>
    where
        F: FnOnce(&mut SnmpEngine, RequestHandle, Outcome) + 'static,
    {
        self.send_request(
            target,
            RequestKind::Set,
            varbinds,
            RequestOptions::default(),
            callback,
        )
    }

    /// GETBULK (SNMPv2c targets only).
    pub fn get_bulk<F>(
        &mut self,
        target: &str,
        non_repeaters: i32,
        max_repetitions: i32,
        oids: &[Oid],
        callback: F,
    ) -> Result<RequestHandle>
    where
        F: FnOnce(&mut SnmpEngine, RequestHandle, Outcome) + 'static,
    {
        let varbinds = oids.iter().cloned().map(VarBind::null).collect();
        self.send_request(
            target,
            RequestKind::GetBulk {
                non_repeaters,
                max_repetitions,
            },
            varbinds,
            RequestOptions::default(),
            callback,
        )
    }

    /// Cancel a request before its callback runs.
    ///
    /// Removes the record and its timer; the callback is dropped without
    /// being called. Returns `false` if the request already finished.
    pub fn cancel(&mut self, handle: RequestHandle) -> bool {
        self.cmdgen.cancel(handle, &mut self.dispatcher)
    }

    /// Current state of a request, or `None` once its callback has run.
    pub fn request_state(&self, handle: RequestHandle) -> Option<RequestState> {
        self.cmdgen.request_state(handle)
    }

    /// Number of requests waiting for a response.
    pub fn pending_count(&self) -> usize {
        self.cmdgen.pending_count()
    }

    // ----- lifecycle -----

    /// Ask [`run`](Self::run) to return once no work remains. Idempotent.
    pub fn stop(&self) {
        self.stop.cancel();
    }

    /// Make [`run`](Self::run) return at the next opportunity, abandoning
    /// pending requests. Callbacks still queued are dropped without running.
    /// Idempotent.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    /// A `Send` handle for stopping the engine from elsewhere.
    pub fn handle(&self) -> EngineHandle {
        EngineHandle {
            stop: self.stop.clone(),
            shutdown: self.shutdown.clone(),
        }
    }

    fn is_idle(&self) -> bool {
        self.cmdgen.is_idle() && self.dispatcher.timer_count() == 0
    }

    /// Drive the engine until stopped and idle, or shut down.
    ///
    /// Each iteration runs queued callbacks, then waits for endpoints and
    /// timers. Errors never escape the loop: inbound failures are logged and
    /// dropped, request failures go to their callbacks.
    pub async fn run(&mut self) {
        let stop = self.stop.clone();
        let shutdown = self.shutdown.clone();
        tracing::debug!(target: "snmp_engine::dispatcher", { snmp.pending = self.pending_count() }, "engine running");

        loop {
            self.deliver_completions();

            if shutdown.is_cancelled() {
                tracing::debug!(
                    target: "snmp_engine::dispatcher",
                    { snmp.pending = self.pending_count() },
                    "engine shut down"
                );
                break;
            }
            if stop.is_cancelled() && self.is_idle() {
                tracing::debug!(target: "snmp_engine::dispatcher", "engine stopped");
                break;
            }

            let events = tokio::select! {
                biased;
                _ = shutdown.cancelled() => continue,
                _ = stop.cancelled(), if !stop.is_cancelled() => continue,
                events = self.dispatcher.poll_events() => events,
            };

            for event in events {
                self.handle_event(event);
            }
        }
    }

    /// Stop once all submitted requests have finished, then run.
    pub async fn run_until_complete(&mut self) {
        self.stop();
        self.run().await;
    }

    fn handle_event(&mut self, event: DispatchEvent<TimerEvent>) {
        match event {
            DispatchEvent::Datagram {
                domain,
                source,
                data,
            } => {
                tracing::trace!(
                    target: "snmp_engine::dispatcher",
                    { snmp.domain = %domain, snmp.source = %source, snmp.bytes = data.len() },
                    "datagram received"
                );
                match unwrap_message(data, &self.config) {
                    Ok(incoming) => {
                        self.cmdgen
                            .on_message(incoming, source, &self.config, &mut self.dispatcher)
                    }
                    Err(error) => {
                        tracing::debug!(
                            target: "snmp_engine::mp",
                            { snmp.source = %source, error = %error },
                            "discarding inbound message"
                        );
                    }
                }
            }
            // Already logged by the dispatcher; the endpoint stays registered.
            DispatchEvent::ReceiveError { .. } => {}
            DispatchEvent::TimerExpired(timer) => {
                self.cmdgen.on_timer(timer, &mut self.dispatcher);
            }
        }
    }

    fn deliver_completions(&mut self) {
        while !self.shutdown.is_cancelled() {
            let Some(completion) = self.cmdgen.next_completion() else {
                break;
            };
            tracing::trace!(
                target: "snmp_engine::cmdgen",
                { snmp.request_id = completion.handle.request_id(), state = ?completion.state },
                "running callback"
            );
            (completion.callback)(self, completion.handle, completion.outcome);
        }
    }
}

impl std::fmt::Debug for SnmpEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnmpEngine")
            .field("engine_id", &hex::encode(&self.engine_id))
            .field("engine_boots", &self.engine_boots)
            .field("pending", &self.cmdgen.pending_count())
            .finish_non_exhaustive()
    }
}

/// Cloneable, `Send` control handle for a running [`SnmpEngine`].
#[derive(Debug, Clone)]
pub struct EngineHandle {
    stop: CancellationToken,
    shutdown: CancellationToken,
}

impl EngineHandle {
    /// See [`SnmpEngine::stop`].
    pub fn stop(&self) {
        self.stop.cancel();
    }

    /// See [`SnmpEngine::shutdown`].
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }
}
