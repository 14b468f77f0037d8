//! In-process SNMP agent for testing.
//!
//! Serves a small MIB over a real UDP socket on an ephemeral localhost port.
//! Messages are decoded with the library's own message-processing code, so
//! anything the engine sends is understood the same way it would be by the
//! engine itself. The agent shuts down cleanly on drop.

use crate::common::fixtures::{self, COMMUNITY};

use bytes::Bytes;
use snmp_engine::message::{CommunityMessage, unwrap_message};
use snmp_engine::{
    ErrorStatus, LocalConfig, Oid, Pdu, PduType, SecurityIdentity, Value, VarBind, Version,
};
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::ops::Bound;
use std::sync::{Arc, Mutex};
use tokio::net::UdpSocket;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// An in-process SNMP agent for testing.
///
/// ```ignore
/// let agent = TestAgent::new().await;
/// let mut engine = engine_for(agent.addr(), Version::V2c, timeout, Retry::none()).await;
/// // Agent automatically stops when dropped
/// ```
pub struct TestAgent {
    addr: SocketAddr,
    state: Arc<Mutex<AgentState>>,
    cancel: CancellationToken,
    _task: JoinHandle<()>,
}

struct AgentState {
    data: BTreeMap<Oid, Value>,
    /// Requests received, including dropped ones.
    requests: usize,
    /// Requests still to drop without reply.
    drop_next: usize,
    silent: bool,
}

impl TestAgent {
    /// Create an agent with the system MIB.
    pub async fn new() -> Self {
        Self::with_data(fixtures::system_mib()).await
    }

    /// Create an agent with custom initial data.
    pub async fn with_data(data: BTreeMap<Oid, Value>) -> Self {
        let socket = UdpSocket::bind("127.0.0.1:0")
            .await
            .expect("failed to bind test agent");
        let addr = socket.local_addr().expect("test agent address");

        let mut config = LocalConfig::new();
        config
            .add_identity(SecurityIdentity::community("agent", COMMUNITY))
            .expect("agent identity");

        let state = Arc::new(Mutex::new(AgentState {
            data,
            requests: 0,
            drop_next: 0,
            silent: false,
        }));
        let cancel = CancellationToken::new();
        let task = tokio::spawn(serve(socket, config, state.clone(), cancel.clone()));

        Self {
            addr,
            state,
            cancel,
            _task: task,
        }
    }

    /// Get the agent's listening address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Get a value from the MIB (cloned).
    pub fn get(&self, oid: &Oid) -> Option<Value> {
        self.state.lock().unwrap().data.get(oid).cloned()
    }

    /// Insert or update a value in the MIB.
    pub fn set(&self, oid: Oid, value: Value) {
        self.state.lock().unwrap().data.insert(oid, value);
    }

    /// Number of authenticated requests received so far.
    pub fn requests(&self) -> usize {
        self.state.lock().unwrap().requests
    }

    /// Drop the next `count` requests without replying.
    pub fn drop_next(&self, count: usize) {
        self.state.lock().unwrap().drop_next = count;
    }

    /// Stop replying altogether (requests are still counted).
    pub fn set_silent(&self, silent: bool) {
        self.state.lock().unwrap().silent = silent;
    }

    /// Explicitly stop the agent.
    pub fn stop(&self) {
        self.cancel.cancel();
    }
}

impl Drop for TestAgent {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn serve(
    socket: UdpSocket,
    config: LocalConfig,
    state: Arc<Mutex<AgentState>>,
    cancel: CancellationToken,
) {
    let mut buf = vec![0u8; 65535];

    loop {
        let (len, source) = tokio::select! {
            result = socket.recv_from(&mut buf) => match result {
                Ok(received) => received,
                Err(_) => continue,
            },
            _ = cancel.cancelled() => return,
        };

        // unknown community or garbage: stay silent like a real agent
        let Ok(incoming) = unwrap_message(Bytes::copy_from_slice(&buf[..len]), &config) else {
            continue;
        };

        let response = {
            let mut state = state.lock().unwrap();
            state.requests += 1;
            if state.silent {
                continue;
            }
            if state.drop_next > 0 {
                state.drop_next -= 1;
                continue;
            }
            state.respond(incoming.version, &incoming.pdu)
        };

        let reply = CommunityMessage::new(incoming.version, COMMUNITY.as_bytes().to_vec(), response)
            .encode();
        let _ = socket.send_to(&reply, source).await;
    }
}

fn response(request: &Pdu, varbinds: Vec<VarBind>) -> Pdu {
    Pdu {
        pdu_type: PduType::Response,
        request_id: request.request_id,
        error_status: 0,
        error_index: 0,
        varbinds,
    }
}

impl AgentState {
    fn respond(&mut self, version: Version, pdu: &Pdu) -> Pdu {
        match pdu.pdu_type {
            PduType::GetRequest => self.get(version, pdu),
            PduType::GetNextRequest => self.get_next(version, pdu),
            PduType::SetRequest => self.set(pdu),
            PduType::GetBulkRequest => self.get_bulk(pdu),
            _ => pdu.to_response(ErrorStatus::GenErr, 0),
        }
    }

    fn get(&self, version: Version, pdu: &Pdu) -> Pdu {
        let mut varbinds = Vec::with_capacity(pdu.varbinds.len());
        for (index, vb) in pdu.varbinds.iter().enumerate() {
            match self.data.get(&vb.oid) {
                Some(value) => varbinds.push(VarBind::new(vb.oid.clone(), value.clone())),
                None if version == Version::V1 => {
                    return pdu.to_response(ErrorStatus::NoSuchName, index as i32 + 1);
                }
                None => varbinds.push(VarBind::new(vb.oid.clone(), Value::NoSuchObject)),
            }
        }
        response(pdu, varbinds)
    }

    fn successor(&self, oid: &Oid) -> Option<VarBind> {
        self.data
            .range((Bound::Excluded(oid.clone()), Bound::Unbounded))
            .next()
            .map(|(oid, value)| VarBind::new(oid.clone(), value.clone()))
    }

    fn get_next(&self, version: Version, pdu: &Pdu) -> Pdu {
        let mut varbinds = Vec::with_capacity(pdu.varbinds.len());
        for (index, vb) in pdu.varbinds.iter().enumerate() {
            match self.successor(&vb.oid) {
                Some(next) => varbinds.push(next),
                None if version == Version::V1 => {
                    return pdu.to_response(ErrorStatus::NoSuchName, index as i32 + 1);
                }
                None => varbinds.push(VarBind::new(vb.oid.clone(), Value::EndOfMibView)),
            }
        }
        response(pdu, varbinds)
    }

    fn set(&mut self, pdu: &Pdu) -> Pdu {
        for vb in &pdu.varbinds {
            self.data.insert(vb.oid.clone(), vb.value.clone());
        }
        response(pdu, pdu.varbinds.clone())
    }

    fn get_bulk(&self, pdu: &Pdu) -> Pdu {
        let non_repeaters = (pdu.error_status.max(0) as usize).min(pdu.varbinds.len());
        let max_repetitions = pdu.error_index.max(0) as usize;
        let end_of_view = |oid: &Oid| VarBind::new(oid.clone(), Value::EndOfMibView);

        let mut varbinds = Vec::new();
        for vb in &pdu.varbinds[..non_repeaters] {
            varbinds.push(self.successor(&vb.oid).unwrap_or_else(|| end_of_view(&vb.oid)));
        }

        let mut cursors: Vec<Oid> = pdu.varbinds[non_repeaters..]
            .iter()
            .map(|vb| vb.oid.clone())
            .collect();
        for _ in 0..max_repetitions {
            if cursors.is_empty() {
                break;
            }
            for cursor in &mut cursors {
                let next = self.successor(cursor).unwrap_or_else(|| end_of_view(cursor));
                *cursor = next.oid.clone();
                varbinds.push(next);
            }
        }
        response(pdu, varbinds)
    }
}
