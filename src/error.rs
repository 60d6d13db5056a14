use simple_asn1::{ASN1DecodeErr, ASN1EncodeErr};
use std::collections::TryReserveError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("unknown extension name: {0}")]
    UnknownExtension(String),

    #[error("invalid {name} value {value:?}: {reason}")]
    InvalidValue {
        name: String,
        value: String,
        reason: String,
    },

    #[error("unable to compose extension value: {0}")]
    Alloc(#[from] TryReserveError),

    #[error("unable to decode {what}: {reason}")]
    Decode { what: String, reason: String },

    #[error("DER serialization failed: {0:?}")]
    Serialize(ASN1EncodeErr),

    #[error("DER parsing failed: {0:?}")]
    Deserialize(ASN1DecodeErr),

    #[error("expected SEQUENCE at index {0}")]
    Seq(usize),

    #[error("expected SET at index {0}")]
    Set(usize),

    #[error("missing or malformed certificate field: {0}")]
    Field(&'static str),

    #[error("timestamp {0} is out of range")]
    Time(i64),

    #[error("certificate has no public key")]
    NoPubKey,

    #[error("certificate has no issuer name")]
    NoIssuerName,

    #[error("certificate has no subject name")]
    NoSubjectName,

    #[error("certificate has no validity period")]
    NoValidityTime,

    #[error("certificate is not signed")]
    NoSignature,

    #[error("signature callback failed")]
    Signature,
}

impl Error {
    pub(crate) fn decode(what: &str, reason: impl ToString) -> Error {
        Error::Decode {
            what: what.to_string(),
            reason: reason.to_string(),
        }
    }
}
