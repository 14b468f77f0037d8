//! Standard test fixtures with realistic MIB data.

use snmp_engine::{
    Oid, Retry, SecurityIdentity, SecurityLevel, SnmpEngine, TargetAddress, TargetParams,
    TransportDomain, UdpEndpoint, Value, VarBind, Version, oid,
};
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::time::Duration;

/// Community the test agent accepts by default.
pub const COMMUNITY: &str = "private";

/// Security name the engine maps [`COMMUNITY`] to.
pub const SECURITY_NAME: &str = "my-area";

/// Target name the engine fixtures configure.
pub const TARGET: &str = "my-router";

/// Standard system MIB entries (1.3.6.1.2.1.1).
pub fn system_mib() -> BTreeMap<Oid, Value> {
    let mut data = BTreeMap::new();

    data.insert(sys_descr(), Value::from("Test SNMP Agent"));
    data.insert(
        oid!(1, 3, 6, 1, 2, 1, 1, 2, 0),
        Value::ObjectIdentifier(oid!(1, 3, 6, 1, 4, 1, 99999)),
    );
    data.insert(oid!(1, 3, 6, 1, 2, 1, 1, 3, 0), Value::TimeTicks(123456));
    data.insert(oid!(1, 3, 6, 1, 2, 1, 1, 4, 0), Value::from("admin@test.local"));
    data.insert(sys_name(), Value::from("test-agent"));
    data.insert(sys_location(), Value::from("Test Lab"));
    data.insert(sys_services(), Value::Integer(72));

    data
}

pub fn sys_descr() -> Oid {
    oid!(1, 3, 6, 1, 2, 1, 1, 1, 0)
}

pub fn sys_name() -> Oid {
    oid!(1, 3, 6, 1, 2, 1, 1, 5, 0)
}

pub fn sys_location() -> Oid {
    oid!(1, 3, 6, 1, 2, 1, 1, 6, 0)
}

pub fn sys_services() -> Oid {
    oid!(1, 3, 6, 1, 2, 1, 1, 7, 0)
}

pub fn system_subtree() -> Oid {
    oid!(1, 3, 6, 1, 2, 1, 1)
}

/// An OID no fixture populates.
pub fn nonexistent_oid() -> Oid {
    oid!(1, 3, 6, 1, 99, 99, 99, 0)
}

/// The two scalars written by the reference SET exchange.
pub fn reference_scalars() -> Vec<VarBind> {
    vec![
        VarBind::new(sys_descr(), Value::from("my value")),
        VarBind::new(sys_services(), Value::Integer(123)),
    ]
}

/// Engine with a UDP endpoint and [`TARGET`] pointing at `agent`.
pub async fn engine_for(agent: SocketAddr, version: Version, timeout: Duration, retry: Retry) -> SnmpEngine {
    let mut engine = SnmpEngine::builder()
        .timeout(timeout)
        .retry(retry)
        .build()
        .expect("build engine");
    engine
        .add_identity(SecurityIdentity::community(SECURITY_NAME, COMMUNITY))
        .unwrap();
    engine
        .add_target_params(TargetParams::new(
            "my-creds",
            SECURITY_NAME,
            SecurityLevel::NoAuthNoPriv,
            version,
        ))
        .unwrap();
    engine
        .add_target_address(TargetAddress::udp(TARGET, agent, "my-creds"))
        .unwrap();
    engine
        .register_endpoint(
            TransportDomain::Udp,
            UdpEndpoint::bind("127.0.0.1:0".parse().unwrap())
                .await
                .expect("bind engine endpoint"),
        )
        .unwrap();
    engine
}
