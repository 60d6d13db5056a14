//! The GeneralName choice used by subjectAltName, issuerAltName,
//! authorityKeyIdentifier and crlDistributionPoints.
//!
//! ```text
//! GeneralName ::= CHOICE {
//!      otherName                       [0]     OtherName,
//!      rfc822Name                      [1]     IA5String,
//!      dNSName                         [2]     IA5String,
//!      x400Address                     [3]     ORAddress,
//!      directoryName                   [4]     Name,
//!      ediPartyName                    [5]     EDIPartyName,
//!      uniformResourceIdentifier       [6]     IA5String,
//!      iPAddress                       [7]     OCTET STRING,
//!      registeredID                    [8]     OBJECT IDENTIFIER }
//! ```

use crate::asn::{self, context_tag, implicit_bytes, implicit_children};
use crate::name::{decode_name, encode_name, oneline, X509Name};
use crate::{registry, Error};
use simple_asn1::ASN1Block;
use std::net::IpAddr;

/// String forms (`Email`, `Dns`, `Uri`) keep the exact content octets,
/// embedded NULs included.
#[derive(Debug, Clone, PartialEq)]
pub enum GeneralName {
    OtherName { type_id: Vec<u64>, value: Vec<u8> },
    Email(Vec<u8>),
    Dns(Vec<u8>),
    X400Address(Vec<u8>),
    DirName(Vec<X509Name>),
    EdiPartyName(Vec<u8>),
    Uri(Vec<u8>),
    IpAddress(Vec<u8>),
    RegisteredId(Vec<u64>),
}

const WHAT: &str = "GeneralName";

impl GeneralName {
    /// Parses one `kind:value` entry of the configuration grammar.
    pub(crate) fn parse(kind: &str, value: &str) -> Result<GeneralName, String> {
        match kind {
            "email" => Ok(GeneralName::Email(value.as_bytes().to_vec())),
            "DNS" => Ok(GeneralName::Dns(value.as_bytes().to_vec())),
            "URI" => Ok(GeneralName::Uri(value.as_bytes().to_vec())),
            "IP" => match value.parse::<IpAddr>() {
                Ok(IpAddr::V4(ip)) => Ok(GeneralName::IpAddress(ip.octets().to_vec())),
                Ok(IpAddr::V6(ip)) => Ok(GeneralName::IpAddress(ip.octets().to_vec())),
                Err(_) => Err(format!("bad IP address {}", value)),
            },
            "RID" => registry::name_to_oid(value)
                .map(GeneralName::RegisteredId)
                .ok_or_else(|| format!("bad object identifier {}", value)),
            "otherName" => parse_other_name(value),
            "dirName" => Err(format!(
                "dirName:{} needs a configuration section, none is available",
                value
            )),
            _ => Err(format!("unsupported option {}", kind)),
        }
    }

    pub(crate) fn to_block(&self) -> Result<ASN1Block, Error> {
        let block = match self {
            GeneralName::OtherName { type_id, value } => {
                let wrapped = asn::implicit_constructed_raw(0, value);
                asn::implicit_constructed(
                    0,
                    &[
                        ASN1Block::ObjectIdentifier(0, asn::oid_new(type_id)),
                        wrapped,
                    ],
                )?
            }
            GeneralName::Email(s) => asn::implicit_primitive(1, s.clone()),
            GeneralName::Dns(s) => asn::implicit_primitive(2, s.clone()),
            GeneralName::X400Address(body) => asn::implicit_constructed_raw(3, body),
            GeneralName::DirName(name) => asn::explicit(4, encode_name(name)),
            GeneralName::EdiPartyName(body) => asn::implicit_constructed_raw(5, body),
            GeneralName::Uri(s) => asn::implicit_primitive(6, s.clone()),
            GeneralName::IpAddress(ip) => asn::implicit_primitive(7, ip.clone()),
            GeneralName::RegisteredId(oid) => asn::implicit_primitive(8, asn::oid_contents(oid)?),
        };

        Ok(block)
    }

    pub(crate) fn from_block(block: &ASN1Block) -> Result<GeneralName, Error> {
        let tag = context_tag(block).ok_or_else(|| Error::decode(WHAT, "not a context tagged choice"))?;
        let primitive = || {
            implicit_bytes(block)
                .map(|b| b.to_vec())
                .ok_or_else(|| Error::decode(WHAT, format!("[{}] must be primitive", tag)))
        };

        let name = match tag {
            0 => {
                let children = implicit_children(block, WHAT)?;
                let type_id = match children.get(0) {
                    Some(ASN1Block::ObjectIdentifier(_, o)) => asn::oid_vec(o)?,
                    _ => return Err(Error::decode(WHAT, "otherName without type-id")),
                };
                let value = match children.get(1) {
                    Some(v) if context_tag(v) == Some(0) => asn::constructed_contents(v, WHAT)?,
                    _ => return Err(Error::decode(WHAT, "otherName without value")),
                };
                GeneralName::OtherName { type_id, value }
            }
            1 => GeneralName::Email(primitive()?),
            2 => GeneralName::Dns(primitive()?),
            3 => GeneralName::X400Address(asn::constructed_contents(block, WHAT)?),
            4 => {
                let children = implicit_children(block, WHAT)?;
                match children.as_slice() {
                    [name] => GeneralName::DirName(decode_name(name)?),
                    _ => return Err(Error::decode(WHAT, "directoryName must hold one Name")),
                }
            }
            5 => GeneralName::EdiPartyName(asn::constructed_contents(block, WHAT)?),
            6 => GeneralName::Uri(primitive()?),
            7 => GeneralName::IpAddress(primitive()?),
            8 => GeneralName::RegisteredId(asn::oid_from_contents(&primitive()?)?),
            _ => return Err(Error::decode(WHAT, format!("unknown choice [{}]", tag))),
        };

        Ok(name)
    }
}

fn parse_other_name(value: &str) -> Result<GeneralName, String> {
    let (oid, rest) = value
        .split_once(';')
        .ok_or_else(|| format!("otherName {} is missing ';'", value))?;
    let type_id =
        registry::name_to_oid(oid.trim()).ok_or_else(|| format!("bad object identifier {}", oid))?;

    let text = rest
        .strip_prefix("UTF8:")
        .or_else(|| rest.strip_prefix("UTF8String:"))
        .ok_or_else(|| format!("otherName value {} is not UTF8:<text>", rest))?;

    let value = asn::serialize(&ASN1Block::UTF8String(0, text.to_string())).map_err(|e| e.to_string())?;

    Ok(GeneralName::OtherName { type_id, value })
}

pub(crate) fn encode_names(names: &[GeneralName]) -> Result<Vec<ASN1Block>, Error> {
    names.iter().map(GeneralName::to_block).collect()
}

pub(crate) fn decode_names(blocks: &[ASN1Block]) -> Result<Vec<GeneralName>, Error> {
    blocks.iter().map(GeneralName::from_block).collect()
}

/// Generic single name printer. String forms are written through the
/// printable filter, so this is not the length-exact path.
pub fn print(out: &mut Vec<u8>, name: &GeneralName) {
    match name {
        GeneralName::OtherName { type_id, value } => {
            out.extend_from_slice(b"othername:");
            match asn::deserialize_one(value, WHAT) {
                Ok(ASN1Block::UTF8String(_, s)) => {
                    out.extend_from_slice(registry::oid_to_short_name(type_id).as_bytes());
                    out.push(b':');
                    asn::write_printable(out, s.as_bytes());
                }
                _ => out.extend_from_slice(b"<unsupported>"),
            }
        }
        GeneralName::Email(s) => {
            out.extend_from_slice(b"email:");
            asn::write_printable(out, s);
        }
        GeneralName::Dns(s) => {
            out.extend_from_slice(b"DNS:");
            asn::write_printable(out, s);
        }
        GeneralName::X400Address(_) => out.extend_from_slice(b"X400Name:<unsupported>"),
        GeneralName::DirName(name) => {
            out.extend_from_slice(b"DirName:");
            out.extend_from_slice(oneline(name).as_bytes());
        }
        GeneralName::EdiPartyName(_) => out.extend_from_slice(b"EdiPartyName:<unsupported>"),
        GeneralName::Uri(s) => {
            out.extend_from_slice(b"URI:");
            asn::write_printable(out, s);
        }
        GeneralName::IpAddress(ip) => {
            out.extend_from_slice(b"IP Address:");
            out.extend_from_slice(format_ip(ip).as_bytes());
        }
        GeneralName::RegisteredId(oid) => {
            out.extend_from_slice(b"Registered ID:");
            out.extend_from_slice(registry::oid_to_long_name(oid).as_bytes());
        }
    }
}

fn format_ip(ip: &[u8]) -> String {
    match ip.len() {
        4 => format!("{}.{}.{}.{}", ip[0], ip[1], ip[2], ip[3]),
        16 => ip
            .chunks(2)
            .map(|pair| format!("{:X}", u16::from_be_bytes([pair[0], pair[1]])))
            .collect::<Vec<_>>()
            .join(":"),
        _ => "<invalid>".to_string(),
    }
}
