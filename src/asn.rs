use crate::Error;
use num_traits::cast::ToPrimitive;
use simple_asn1::{ASN1Block, ASN1Class, BigUint, OID};

pub(crate) fn serialize(a: &ASN1Block) -> Result<Vec<u8>, Error> {
    simple_asn1::to_der(a).map_err(Error::Serialize)
}

/// Parses `der` into its top level elements.
pub(crate) fn deserialize(der: &[u8], what: &str) -> Result<Vec<ASN1Block>, Error> {
    // from_der refuses a SEQUENCE with an empty body
    if der == [0x30, 0x00] {
        return Ok(vec![ASN1Block::Sequence(0, Vec::new())]);
    }

    simple_asn1::from_der(der).map_err(|e| Error::decode(what, format!("{:?}", e)))
}

/// Parses `der` as exactly one top level element.
pub(crate) fn deserialize_one(der: &[u8], what: &str) -> Result<ASN1Block, Error> {
    let mut blocks = deserialize(der, what)?;
    if blocks.len() != 1 {
        return Err(Error::decode(
            what,
            format!("expected one element, found {}", blocks.len()),
        ));
    }

    Ok(blocks.remove(0))
}

pub(crate) fn oid_new(id: &[u64]) -> OID {
    OID::new(id.iter().map(|arc| BigUint::from(*arc)).collect())
}

pub(crate) fn oid_vec(oid: &OID) -> Result<Vec<u64>, Error> {
    let v: Vec<u64> = oid.as_vec().map_err(Error::Deserialize)?;
    Ok(v)
}

/// Dotted decimal, rejecting arcs DER cannot carry.
pub(crate) fn parse_oid(s: &str) -> Option<Vec<u64>> {
    let arcs = s
        .split('.')
        .map(|arc| arc.parse::<u64>().ok())
        .collect::<Option<Vec<u64>>>()?;

    match arcs.as_slice() {
        [first, second, ..] if *first < 2 && *second < 40 => Some(arcs),
        [2, _, ..] => Some(arcs),
        _ => None,
    }
}

pub(crate) fn oid_to_string(oid: &[u64]) -> String {
    oid.iter()
        .map(|arc| arc.to_string())
        .collect::<Vec<_>>()
        .join(".")
}

pub(crate) fn context_tag(block: &ASN1Block) -> Option<u64> {
    match block {
        ASN1Block::Explicit(ASN1Class::ContextSpecific, _, tag, _) => tag.to_u64(),
        ASN1Block::Unknown(ASN1Class::ContextSpecific, _, _, tag, _) => tag.to_u64(),
        _ => None,
    }
}

/// Content octets of an IMPLICIT primitive.
pub(crate) fn implicit_bytes(block: &ASN1Block) -> Option<&[u8]> {
    match block {
        ASN1Block::Unknown(_, false, _, _, body) => Some(body),
        _ => None,
    }
}

/// Elements inside an IMPLICIT constructed value. The parser reports a
/// constructed context tag holding a single element as `Explicit`, so both
/// shapes are accepted.
pub(crate) fn implicit_children(block: &ASN1Block, what: &str) -> Result<Vec<ASN1Block>, Error> {
    match block {
        ASN1Block::Explicit(_, _, _, inner) => Ok(vec![(**inner).clone()]),
        ASN1Block::Unknown(_, true, _, _, body) => deserialize(body, what),
        _ => Err(Error::decode(what, "expected a constructed element")),
    }
}

/// Content octets of a constructed context tag, whichever way it was parsed.
pub(crate) fn constructed_contents(block: &ASN1Block, what: &str) -> Result<Vec<u8>, Error> {
    match block {
        ASN1Block::Explicit(_, _, _, inner) => serialize(inner),
        ASN1Block::Unknown(_, true, _, _, body) => Ok(body.clone()),
        _ => Err(Error::decode(what, "expected a constructed element")),
    }
}

pub(crate) fn implicit_primitive(tag: u64, body: Vec<u8>) -> ASN1Block {
    ASN1Block::Unknown(ASN1Class::ContextSpecific, false, 0, BigUint::from(tag), body)
}

pub(crate) fn implicit_constructed(tag: u64, children: &[ASN1Block]) -> Result<ASN1Block, Error> {
    let mut body = Vec::new();
    for child in children {
        body.extend(serialize(child)?);
    }

    Ok(ASN1Block::Unknown(
        ASN1Class::ContextSpecific,
        true,
        0,
        BigUint::from(tag),
        body,
    ))
}

/// An IMPLICIT constructed value around already encoded contents.
pub(crate) fn implicit_constructed_raw(tag: u64, body: &[u8]) -> ASN1Block {
    ASN1Block::Unknown(
        ASN1Class::ContextSpecific,
        true,
        0,
        BigUint::from(tag),
        body.to_vec(),
    )
}

pub(crate) fn explicit(tag: u64, inner: ASN1Block) -> ASN1Block {
    ASN1Block::Explicit(
        ASN1Class::ContextSpecific,
        0,
        BigUint::from(tag),
        Box::new(inner),
    )
}

/// Strips the identifier and length octets of a single DER element.
pub(crate) fn der_contents(der: &[u8]) -> Option<&[u8]> {
    let len = *der.get(1)?;
    let start = if len < 0x80 {
        2
    } else {
        2 + (len & 0x7f) as usize
    };

    der.get(start..)
}

/// Re-reads the contents of an IMPLICIT [n] OBJECT IDENTIFIER.
pub(crate) fn oid_from_contents(body: &[u8]) -> Result<Vec<u64>, Error> {
    let retagged = serialize(&ASN1Block::Unknown(
        ASN1Class::Universal,
        false,
        0,
        BigUint::from(6_u32),
        body.to_vec(),
    ))?;

    match deserialize_one(&retagged, "registered ID")? {
        ASN1Block::ObjectIdentifier(_, o) => oid_vec(&o),
        _ => Err(Error::decode("registered ID", "not an object identifier")),
    }
}

pub(crate) fn oid_contents(oid: &[u64]) -> Result<Vec<u8>, Error> {
    let der = serialize(&ASN1Block::ObjectIdentifier(0, oid_new(oid)))?;
    der_contents(&der)
        .map(|c| c.to_vec())
        .ok_or(Error::Field("object identifier"))
}

pub(crate) fn hex_colon(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| hex::encode_upper([*b]))
        .collect::<Vec<_>>()
        .join(":")
}

/// Accepts `ABCD` as well as `AB:CD`; a colon may only follow a full octet.
pub(crate) fn parse_hex(s: &str) -> Option<Vec<u8>> {
    let mut digits = String::with_capacity(s.len());

    for c in s.chars() {
        if c == ':' {
            if digits.len() % 2 != 0 {
                return None;
            }
            continue;
        }
        digits.push(c);
    }

    match hex::decode(&digits) {
        Ok(out) if !out.is_empty() => Some(out),
        _ => None,
    }
}

/// Bytes outside printable ASCII become `.`, as the generic string
/// printer has always done.
pub(crate) fn write_printable(out: &mut Vec<u8>, bytes: &[u8]) {
    out.extend(bytes.iter().map(|&b| {
        if b > b'~' || (b < b' ' && b != b'\n' && b != b'\r') {
            b'.'
        } else {
            b
        }
    }));
}
