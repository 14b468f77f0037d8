//! Local configuration store.
//!
//! Three tables describe how to reach a target:
//!
//! ```text
//! target address ──params name──▶ target params ──security name──▶ security identity
//! (domain, addr)                  (level, version)                 (community)
//! ```
//!
//! Entries are keyed by name. Adding an entry whose name already exists is
//! accepted when the data is identical and rejected otherwise. References
//! between tables are checked lazily by [`LocalConfig::resolve`], not when
//! entries are added.

mod entry;

pub use entry::{SecurityIdentity, TargetAddress, TargetParams};

use bytes::Bytes;
use std::collections::{BTreeMap, HashMap};
use std::net::SocketAddr;

use crate::error::{ConfigErrorKind, ConfigTable, Error, Result, UnresolvedReference};
use crate::message::SecurityLevel;
use crate::transport::TransportDomain;
use crate::version::Version;

/// Everything needed to send a request to a target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    /// Target name the request was addressed to.
    pub target: String,
    /// Transport domain of the address.
    pub domain: TransportDomain,
    /// Socket address.
    pub address: SocketAddr,
    /// Security name from the target parameters.
    pub security_name: String,
    /// Security level from the target parameters.
    pub security_level: SecurityLevel,
    /// Message-processing model from the target parameters.
    pub version: Version,
    /// Timeout override from the target address.
    pub timeout: Option<std::time::Duration>,
    /// Retry count override from the target address.
    pub retries: Option<u32>,
}

/// The engine's configuration tables.
#[derive(Debug, Default)]
pub struct LocalConfig {
    identities: BTreeMap<String, SecurityIdentity>,
    // community -> security name, first identity added wins
    communities: HashMap<Bytes, String>,
    params: BTreeMap<String, TargetParams>,
    addresses: BTreeMap<String, TargetAddress>,
}

fn insert_unique<T: PartialEq>(
    table: &mut BTreeMap<String, T>,
    kind: ConfigTable,
    name: &str,
    entry: T,
) -> Result<bool> {
    match table.get(name) {
        Some(existing) if *existing == entry => Ok(false),
        Some(_) => Err(Error::config(ConfigErrorKind::Duplicate {
            table: kind,
            name: name.to_string(),
        })),
        None => {
            table.insert(name.to_string(), entry);
            Ok(true)
        }
    }
}

/// Engine identifiers are 5 to 32 octets (SNMP-FRAMEWORK-MIB SnmpEngineID).
pub(crate) fn validate_engine_id(engine_id: &[u8]) -> Result<()> {
    if !(5..=32).contains(&engine_id.len()) {
        return Err(Error::config(ConfigErrorKind::InvalidEngineId {
            length: engine_id.len(),
        }));
    }
    Ok(())
}

fn not_found(table: ConfigTable, name: &str) -> Box<Error> {
    Error::config(ConfigErrorKind::NotFound {
        table,
        name: name.to_string(),
    })
}

impl LocalConfig {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a security identity.
    pub fn add_identity(&mut self, identity: SecurityIdentity) -> Result<()> {
        if let Some(engine_id) = &identity.engine_id {
            validate_engine_id(engine_id)?;
        }
        let name = identity.security_name.clone();
        let community = identity.community.clone();
        if insert_unique(&mut self.identities, ConfigTable::SecurityIdentity, &name, identity)? {
            self.communities.entry(community).or_insert_with(|| name.clone());
            tracing::debug!(target: "snmp_engine::config", { snmp.security_name = %name }, "security identity added");
        }
        Ok(())
    }

    /// Remove a security identity.
    pub fn remove_identity(&mut self, security_name: &str) -> Result<SecurityIdentity> {
        let identity = self
            .identities
            .remove(security_name)
            .ok_or_else(|| not_found(ConfigTable::SecurityIdentity, security_name))?;

        if self.communities.get(&identity.community).map(String::as_str) == Some(security_name) {
            self.communities.remove(&identity.community);
            // another identity sharing the community takes over the mapping
            if let Some(other) = self
                .identities
                .values()
                .find(|other| other.community == identity.community)
            {
                self.communities
                    .insert(other.community.clone(), other.security_name.clone());
            }
        }
        Ok(identity)
    }

    /// Look up an identity by security name.
    pub fn identity(&self, security_name: &str) -> Option<&SecurityIdentity> {
        self.identities.get(security_name)
    }

    /// Look up the identity whose community equals `community`.
    pub fn identity_by_community(&self, community: &[u8]) -> Option<&SecurityIdentity> {
        self.communities
            .get(community)
            .and_then(|name| self.identities.get(name))
    }

    /// Add target parameters.
    pub fn add_target_params(&mut self, params: TargetParams) -> Result<()> {
        let name = params.name.clone();
        if insert_unique(&mut self.params, ConfigTable::TargetParams, &name, params)? {
            tracing::debug!(target: "snmp_engine::config", { snmp.params = %name }, "target parameters added");
        }
        Ok(())
    }

    /// Remove target parameters.
    pub fn remove_target_params(&mut self, name: &str) -> Result<TargetParams> {
        self.params
            .remove(name)
            .ok_or_else(|| not_found(ConfigTable::TargetParams, name))
    }

    /// Look up target parameters by name.
    pub fn target_params(&self, name: &str) -> Option<&TargetParams> {
        self.params.get(name)
    }

    /// Add a target address.
    pub fn add_target_address(&mut self, address: TargetAddress) -> Result<()> {
        let name = address.name.clone();
        if insert_unique(&mut self.addresses, ConfigTable::TargetAddress, &name, address)? {
            tracing::debug!(target: "snmp_engine::config", { snmp.target = %name }, "target address added");
        }
        Ok(())
    }

    /// Remove a target address.
    ///
    /// The engine refuses this while a request to the target is in flight;
    /// see [`SnmpEngine::remove_target_address`](crate::SnmpEngine::remove_target_address).
    pub fn remove_target_address(&mut self, name: &str) -> Result<TargetAddress> {
        self.addresses
            .remove(name)
            .ok_or_else(|| not_found(ConfigTable::TargetAddress, name))
    }

    /// Look up a target address by name.
    pub fn target_address(&self, name: &str) -> Option<&TargetAddress> {
        self.addresses.get(name)
    }

    /// Follow `target` through all three tables.
    pub fn resolve(&self, target: &str) -> Result<ResolvedTarget> {
        let unknown = |missing| {
            Error::config(ConfigErrorKind::UnknownTarget {
                target: target.to_string(),
                missing,
            })
        };

        let address = self
            .addresses
            .get(target)
            .ok_or_else(|| unknown(UnresolvedReference::TargetAddress))?;
        let params = self.params.get(&address.params_name).ok_or_else(|| {
            unknown(UnresolvedReference::TargetParams(address.params_name.clone()))
        })?;
        if !self.identities.contains_key(&params.security_name) {
            return Err(unknown(UnresolvedReference::SecurityName(
                params.security_name.clone(),
            )));
        }

        Ok(ResolvedTarget {
            target: target.to_string(),
            domain: address.domain,
            address: address.address,
            security_name: params.security_name.clone(),
            security_level: params.security_level,
            version: params.version,
            timeout: address.timeout,
            retries: address.retries,
        })
    }
}
