//! Message processing models (RFC 3412 section 4, RFC 3584).

use bytes::Bytes;

use super::{CommunityMessage, SecurityLevel};
use crate::ber::Decoder;
use crate::config::LocalConfig;
use crate::error::{ConfigErrorKind, DecodeErrorKind, Error, Result, SecurityErrorKind};
use crate::pdu::Pdu;
use crate::security::{SecurityModel, SecurityModelId, SecurityParameters};
use crate::version::Version;

/// A message-processing model, one per supported [`Version`].
///
/// Both models frame the PDU in the same three-element community envelope
/// and hand the community field to their fixed security model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageProcessingModel {
    /// SNMPv1, secured by the SNMPv1 community model.
    V1,
    /// SNMPv2c, secured by the SNMPv2c community model.
    V2c,
}

impl MessageProcessingModel {
    /// Select the model for a message version.
    pub fn for_version(version: Version) -> Self {
        match version {
            Version::V1 => Self::V1,
            Version::V2c => Self::V2c,
        }
    }

    /// Version written into the envelope.
    pub fn version(self) -> Version {
        match self {
            Self::V1 => Version::V1,
            Self::V2c => Version::V2c,
        }
    }

    /// The security model this message format is bound to.
    pub fn security_model(self) -> SecurityModel {
        match self {
            Self::V1 => SecurityModel::Community(SecurityModelId::V1),
            Self::V2c => SecurityModel::Community(SecurityModelId::V2c),
        }
    }

    /// Encode `pdu` for sending as `security_name`.
    ///
    /// `security_model` may be [`SecurityModelId::Any`] to accept the
    /// model's own; any other mismatch is a security error.
    pub fn wrap(
        self,
        security_model: SecurityModelId,
        security_name: &str,
        security_level: SecurityLevel,
        pdu: &Pdu,
        config: &LocalConfig,
        max_message_size: usize,
    ) -> Result<Bytes> {
        let model = self.security_model();
        if security_model != SecurityModelId::Any && security_model != model.id() {
            return Err(Error::security(SecurityErrorKind::UnsupportedSecurityModel(
                security_model.as_i32(),
            )));
        }

        if self == Self::V1 && pdu.pdu_type.is_v2_only() {
            return Err(Error::config(ConfigErrorKind::UnsupportedPduType {
                pdu_type: pdu.pdu_type,
                version: Version::V1,
            }));
        }

        let SecurityParameters::Community(community) =
            model.authenticate_outgoing(security_name, security_level, config)?;

        let data = CommunityMessage::new(self.version(), community, pdu.clone()).encode();
        if data.len() > max_message_size {
            return Err(Error::MessageTooLarge {
                size: data.len(),
                max: max_message_size,
            }
            .boxed());
        }

        tracing::trace!(
            target: "snmp_engine::mp",
            { snmp.request_id = pdu.request_id, snmp.version = %self.version(), snmp.bytes = data.len() },
            "message wrapped"
        );
        Ok(data)
    }

    fn unwrap_body(self, seq: &mut Decoder, config: &LocalConfig) -> Result<IncomingMessage> {
        let pdu_offset = seq.offset();
        let message = CommunityMessage::decode_from_sequence(seq, self.version())?;

        if self == Self::V1 && message.pdu.pdu_type.is_v2_only() {
            return Err(Error::decode(
                pdu_offset,
                DecodeErrorKind::UnknownPduType(message.pdu.pdu_type.tag()),
            ));
        }

        let model = self.security_model();
        let security = model
            .authenticate_incoming(&SecurityParameters::Community(message.community), config)?;

        Ok(IncomingMessage {
            version: message.version,
            security_model: model.id(),
            security_name: security.security_name,
            security_level: security.security_level,
            pdu: message.pdu,
        })
    }
}

/// A received message that passed message and security processing.
#[derive(Debug, Clone, PartialEq)]
pub struct IncomingMessage {
    pub version: Version,
    pub security_model: SecurityModelId,
    pub security_name: String,
    pub security_level: SecurityLevel,
    pub pdu: Pdu,
}

/// Decode and authenticate an inbound datagram.
///
/// The version field is read first; an unsupported version fails with
/// [`Error::UnsupportedVersion`] before any security processing.
pub fn unwrap_message(data: Bytes, config: &LocalConfig) -> Result<IncomingMessage> {
    let mut decoder = Decoder::new(data);
    let mut seq = decoder.read_sequence()?;
    decoder.expect_end()?;

    let version_num = seq.read_integer()?;
    let Some(version) = Version::from_i32(version_num) else {
        return Err(Error::UnsupportedVersion(version_num).boxed());
    };

    MessageProcessingModel::for_version(version).unwrap_body(&mut seq, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SecurityIdentity;
    use crate::oid;
    use crate::value::Value;
    use crate::varbind::VarBind;

    const MAX: usize = 65507;

    fn config() -> LocalConfig {
        let mut config = LocalConfig::new();
        config
            .add_identity(SecurityIdentity::community("my-area", "private"))
            .unwrap();
        config
    }

    fn set_pdu() -> Pdu {
        Pdu::set_request(
            99,
            vec![
                VarBind::new(oid!(1, 3, 6, 1, 2, 1, 1, 1, 0), Value::from("my value")),
                VarBind::new(oid!(1, 3, 6, 1, 2, 1, 1, 7, 0), Value::Integer(123)),
            ],
        )
    }

    #[test]
    fn test_wrap_unwrap() {
        let config = config();
        for version in [Version::V1, Version::V2c] {
            let mp = MessageProcessingModel::for_version(version);
            let data = mp
                .wrap(
                    SecurityModelId::Any,
                    "my-area",
                    SecurityLevel::NoAuthNoPriv,
                    &set_pdu(),
                    &config,
                    MAX,
                )
                .unwrap();

            let incoming = unwrap_message(data, &config).unwrap();
            assert_eq!(incoming.version, version);
            assert_eq!(incoming.security_name, "my-area");
            assert_eq!(incoming.security_model, mp.security_model().id());
            assert_eq!(incoming.pdu, set_pdu());
        }
    }

    #[test]
    fn test_unsupported_version_checked_before_community() {
        // version 3 with a community nobody knows
        let data = Bytes::from_static(&[
            0x30, 0x0D, 0x02, 0x01, 0x03, 0x04, 0x01, b'x', 0xA2, 0x05, 0x02, 0x01, 0x01, 0x02,
            0x01,
        ]);
        let err = unwrap_message(data, &config()).unwrap_err();
        assert!(matches!(*err, Error::UnsupportedVersion(3)));
    }

    #[test]
    fn test_unknown_community_rejected() {
        let data = CommunityMessage::new(Version::V2c, Bytes::from_static(b"public"), set_pdu()).encode();
        let err = unwrap_message(data, &config()).unwrap_err();
        assert!(matches!(
            *err,
            Error::Security(SecurityErrorKind::UnknownCommunity)
        ));
    }

    #[test]
    fn test_get_bulk_not_wrapped_for_v1() {
        let pdu = Pdu::get_bulk(1, 0, 10, vec![VarBind::null(oid!(1, 3, 6, 1, 2, 1))]);
        let err = MessageProcessingModel::V1
            .wrap(
                SecurityModelId::Any,
                "my-area",
                SecurityLevel::NoAuthNoPriv,
                &pdu,
                &config(),
                MAX,
            )
            .unwrap_err();
        assert!(matches!(
            *err,
            Error::Config(ConfigErrorKind::UnsupportedPduType {
                version: Version::V1,
                ..
            })
        ));
    }

    #[test]
    fn test_security_model_mismatch() {
        let err = MessageProcessingModel::V2c
            .wrap(
                SecurityModelId::V1,
                "my-area",
                SecurityLevel::NoAuthNoPriv,
                &set_pdu(),
                &config(),
                MAX,
            )
            .unwrap_err();
        assert!(matches!(
            *err,
            Error::Security(SecurityErrorKind::UnsupportedSecurityModel(1))
        ));
    }

    #[test]
    fn test_message_too_large() {
        let err = MessageProcessingModel::V2c
            .wrap(
                SecurityModelId::Any,
                "my-area",
                SecurityLevel::NoAuthNoPriv,
                &set_pdu(),
                &config(),
                20,
            )
            .unwrap_err();
        assert!(matches!(*err, Error::MessageTooLarge { max: 20, .. }));
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        let mut data = CommunityMessage::new(Version::V1, Bytes::from_static(b"private"), set_pdu())
            .encode()
            .to_vec();
        data.push(0x00);
        let err = unwrap_message(Bytes::from(data), &config()).unwrap_err();
        assert!(matches!(
            *err,
            Error::MalformedMessage {
                kind: DecodeErrorKind::TrailingData { remaining: 1 },
                ..
            }
        ));
    }
}
