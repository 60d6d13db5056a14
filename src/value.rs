use crate::asn::{self, hex_colon};
use crate::general_name::{self, encode_names, GeneralName};
use crate::name::X509Name;
use crate::{registry, Error};
use simple_asn1::{ASN1Block, BigInt};

/// A named bit of a BIT STRING extension such as keyUsage.
#[derive(Debug, PartialEq)]
pub struct NamedBit {
    pub bit: usize,
    pub short_name: &'static str,
    pub long_name: &'static str,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AuthorityKeyId {
    pub key_id: Option<Vec<u8>>,
    pub issuer: Option<Vec<GeneralName>>,
    /// Two's complement content octets of the serial INTEGER.
    pub serial: Option<Vec<u8>>,
}

impl AuthorityKeyId {
    pub(crate) fn issuer_dir_name(name: &[X509Name]) -> Vec<GeneralName> {
        vec![GeneralName::DirName(name.to_vec())]
    }
}

/// The distributionPoint field of a CRL distribution point.
#[derive(Debug, Clone, PartialEq)]
pub enum DistPointName {
    FullName(Vec<GeneralName>),
    /// Encoded RelativeDistinguishedName contents, kept but not printed.
    RelativeName(Vec<u8>),
}

/// The decoded form of an extension payload.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtValue {
    BasicConstraints { ca: bool, path_len: Option<u64> },
    Bits(Vec<&'static NamedBit>),
    ObjectIds(Vec<Vec<u64>>),
    OctetString(Vec<u8>),
    Ia5String(String),
    AuthorityKeyId(AuthorityKeyId),
    GeneralNames(Vec<GeneralName>),
    /// Distribution points by name; `None` when a point only names a
    /// cRLIssuer.
    DistributionPoints(Vec<Option<DistPointName>>),
}

impl ExtValue {
    pub(crate) fn to_der(&self) -> Result<Vec<u8>, Error> {
        asn::serialize(&self.to_block()?)
    }

    fn to_block(&self) -> Result<ASN1Block, Error> {
        let block = match self {
            ExtValue::BasicConstraints { ca, path_len } => {
                let mut seq = Vec::new();
                // cA is DEFAULT FALSE
                if *ca {
                    seq.push(ASN1Block::Boolean(0, true));
                }
                if let Some(n) = path_len {
                    seq.push(ASN1Block::Integer(0, BigInt::from(*n)));
                }
                ASN1Block::Sequence(0, seq)
            }
            ExtValue::Bits(bits) => {
                let n = bits.iter().map(|b| b.bit + 1).max().unwrap_or(0);
                let mut bytes = vec![0_u8; (n + 7) / 8];
                for b in bits {
                    bytes[b.bit / 8] |= 0x80 >> (b.bit % 8);
                }
                ASN1Block::BitString(0, n, bytes)
            }
            ExtValue::ObjectIds(oids) => ASN1Block::Sequence(
                0,
                oids.iter()
                    .map(|o| ASN1Block::ObjectIdentifier(0, asn::oid_new(o)))
                    .collect(),
            ),
            ExtValue::OctetString(bytes) => ASN1Block::OctetString(0, bytes.clone()),
            ExtValue::Ia5String(s) => ASN1Block::IA5String(0, s.clone()),
            ExtValue::AuthorityKeyId(aki) => {
                let mut seq = Vec::new();
                if let Some(key_id) = &aki.key_id {
                    seq.push(asn::implicit_primitive(0, key_id.clone()));
                }
                if let Some(issuer) = &aki.issuer {
                    seq.push(asn::implicit_constructed(1, &encode_names(issuer)?)?);
                }
                if let Some(serial) = &aki.serial {
                    seq.push(asn::implicit_primitive(2, serial.clone()));
                }
                ASN1Block::Sequence(0, seq)
            }
            ExtValue::GeneralNames(names) => ASN1Block::Sequence(0, encode_names(names)?),
            ExtValue::DistributionPoints(points) => {
                let mut seq = Vec::with_capacity(points.len());
                for point in points {
                    let name = match point {
                        Some(DistPointName::FullName(names)) => {
                            asn::implicit_constructed(0, &encode_names(names)?)?
                        }
                        Some(DistPointName::RelativeName(rdn)) => {
                            asn::implicit_constructed_raw(1, rdn)
                        }
                        None => {
                            seq.push(ASN1Block::Sequence(0, Vec::new()));
                            continue;
                        }
                    };
                    seq.push(ASN1Block::Sequence(0, vec![asn::explicit(0, name)]));
                }
                ASN1Block::Sequence(0, seq)
            }
        };

        Ok(block)
    }

    /// Writes the single-line text form, entries joined by `", "`.
    pub(crate) fn print(&self, out: &mut Vec<u8>) {
        let mut parts: Vec<Vec<u8>> = Vec::new();

        match self {
            ExtValue::BasicConstraints { ca, path_len } => {
                let ca = if *ca { "CA:TRUE" } else { "CA:FALSE" };
                parts.push(ca.as_bytes().to_vec());
                if let Some(n) = path_len {
                    parts.push(format!("pathlen:{}", n).into_bytes());
                }
            }
            ExtValue::Bits(bits) => {
                parts.extend(bits.iter().map(|b| b.long_name.as_bytes().to_vec()));
            }
            ExtValue::ObjectIds(oids) => {
                parts.extend(
                    oids.iter()
                        .map(|o| registry::oid_to_long_name(o).into_owned().into_bytes()),
                );
            }
            ExtValue::OctetString(bytes) => parts.push(hex_colon(bytes).into_bytes()),
            ExtValue::Ia5String(s) => {
                let mut part = Vec::new();
                asn::write_printable(&mut part, s.as_bytes());
                parts.push(part);
            }
            ExtValue::AuthorityKeyId(aki) => {
                if let Some(key_id) = &aki.key_id {
                    parts.push(format!("keyid:{}", hex_colon(key_id)).into_bytes());
                }
                for name in aki.issuer.iter().flatten() {
                    let mut part = Vec::new();
                    general_name::print(&mut part, name);
                    parts.push(part);
                }
                if let Some(serial) = &aki.serial {
                    parts.push(format!("serial:{}", hex_colon(serial)).into_bytes());
                }
            }
            ExtValue::GeneralNames(names) => {
                for name in names {
                    let mut part = Vec::new();
                    general_name::print(&mut part, name);
                    parts.push(part);
                }
            }
            ExtValue::DistributionPoints(points) => {
                for point in points.iter().flatten() {
                    match point {
                        DistPointName::FullName(names) => {
                            let mut part = b"Full Name:".to_vec();
                            for name in names {
                                part.push(b' ');
                                general_name::print(&mut part, name);
                            }
                            parts.push(part);
                        }
                        DistPointName::RelativeName(_) => {
                            parts.push(b"Relative Name:<unsupported>".to_vec());
                        }
                    }
                }
            }
        }

        out.extend_from_slice(&parts.join(&b", "[..]));
    }
}

/// The serial number as AKI carries it.
pub(crate) fn serial_contents(sn: &[u8]) -> Result<Vec<u8>, Error> {
    let der = asn::serialize(&ASN1Block::Integer(0, BigInt::from_signed_bytes_be(sn)))?;
    asn::der_contents(&der)
        .map(|c| c.to_vec())
        .ok_or(Error::Field("serial number"))
}
