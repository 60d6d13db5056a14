//! Known objects and the extension methods that encode, decode and print
//! them.

use crate::asn::{self, context_tag, implicit_bytes, implicit_children};
use crate::conf::{self, ExtContext};
use crate::general_name::{decode_names, GeneralName};
use crate::value::{AuthorityKeyId, DistPointName, ExtValue, NamedBit};
use crate::{Error, X509Ext};
use num_traits::cast::ToPrimitive;
use simple_asn1::ASN1Block;
use std::borrow::Cow;

pub const SUBJECT_KEY_IDENTIFIER: &[u64] = &[2, 5, 29, 14];
pub const KEY_USAGE: &[u64] = &[2, 5, 29, 15];
pub const SUBJECT_ALT_NAME: &[u64] = &[2, 5, 29, 17];
pub const ISSUER_ALT_NAME: &[u64] = &[2, 5, 29, 18];
pub const BASIC_CONSTRAINTS: &[u64] = &[2, 5, 29, 19];
pub const CRL_DISTRIBUTION_POINTS: &[u64] = &[2, 5, 29, 31];
pub const AUTHORITY_KEY_IDENTIFIER: &[u64] = &[2, 5, 29, 35];
pub const EXT_KEY_USAGE: &[u64] = &[2, 5, 29, 37];
pub const NS_CERT_TYPE: &[u64] = &[2, 16, 840, 1, 113730, 1, 1];
pub const NS_COMMENT: &[u64] = &[2, 16, 840, 1, 113730, 1, 13];
pub const EMAIL_ADDRESS: &[u64] = &[1, 2, 840, 113549, 1, 9, 1];

pub struct Object {
    pub oid: &'static [u64],
    pub short_name: &'static str,
    pub long_name: &'static str,
}

macro_rules! object {
    ($oid:expr, $sn:expr, $ln:expr) => {
        Object {
            oid: $oid,
            short_name: $sn,
            long_name: $ln,
        }
    };
}

static OBJECTS: &[Object] = &[
    /* Extensions */
    object!(SUBJECT_KEY_IDENTIFIER, "subjectKeyIdentifier", "X509v3 Subject Key Identifier"),
    object!(KEY_USAGE, "keyUsage", "X509v3 Key Usage"),
    object!(SUBJECT_ALT_NAME, "subjectAltName", "X509v3 Subject Alternative Name"),
    object!(ISSUER_ALT_NAME, "issuerAltName", "X509v3 Issuer Alternative Name"),
    object!(BASIC_CONSTRAINTS, "basicConstraints", "X509v3 Basic Constraints"),
    object!(&[2, 5, 29, 30], "nameConstraints", "X509v3 Name Constraints"),
    object!(CRL_DISTRIBUTION_POINTS, "crlDistributionPoints", "X509v3 CRL Distribution Points"),
    object!(&[2, 5, 29, 32], "certificatePolicies", "X509v3 Certificate Policies"),
    object!(AUTHORITY_KEY_IDENTIFIER, "authorityKeyIdentifier", "X509v3 Authority Key Identifier"),
    object!(EXT_KEY_USAGE, "extendedKeyUsage", "X509v3 Extended Key Usage"),
    object!(&[1, 3, 6, 1, 5, 5, 7, 1, 1], "authorityInfoAccess", "Authority Information Access"),
    object!(&[1, 3, 6, 1, 4, 1, 11129, 2, 4, 2], "ct_precert_scts", "CT Precertificate SCTs"),
    object!(NS_CERT_TYPE, "nsCertType", "Netscape Cert Type"),
    object!(NS_COMMENT, "nsComment", "Netscape Comment"),
    /* Extended key usage purposes */
    object!(&[1, 3, 6, 1, 5, 5, 7, 3, 1], "serverAuth", "TLS Web Server Authentication"),
    object!(&[1, 3, 6, 1, 5, 5, 7, 3, 2], "clientAuth", "TLS Web Client Authentication"),
    object!(&[1, 3, 6, 1, 5, 5, 7, 3, 3], "codeSigning", "Code Signing"),
    object!(&[1, 3, 6, 1, 5, 5, 7, 3, 4], "emailProtection", "E-mail Protection"),
    object!(&[1, 3, 6, 1, 5, 5, 7, 3, 8], "timeStamping", "Time Stamping"),
    object!(&[1, 3, 6, 1, 5, 5, 7, 3, 9], "OCSPSigning", "OCSP Signing"),
    object!(&[2, 5, 29, 37, 0], "anyExtendedKeyUsage", "Any Extended Key Usage"),
    /* Name attributes */
    object!(&[2, 5, 4, 3], "CN", "commonName"),
    object!(&[2, 5, 4, 5], "serialNumber", "serialNumber"),
    object!(&[2, 5, 4, 6], "C", "countryName"),
    object!(&[2, 5, 4, 7], "L", "localityName"),
    object!(&[2, 5, 4, 8], "ST", "stateOrProvinceName"),
    object!(&[2, 5, 4, 10], "O", "organizationName"),
    object!(&[2, 5, 4, 11], "OU", "organizationalUnitName"),
    object!(EMAIL_ADDRESS, "emailAddress", "emailAddress"),
    object!(&[0, 9, 2342, 19200300, 100, 1, 25], "DC", "domainComponent"),
    /* otherName types */
    object!(&[1, 3, 6, 1, 4, 1, 311, 20, 2, 3], "msUPN", "Microsoft User Principal Name"),
];

macro_rules! bit {
    ($bit:expr, $sn:expr, $ln:expr) => {
        NamedBit {
            bit: $bit,
            short_name: $sn,
            long_name: $ln,
        }
    };
}

pub const KEY_USAGE_BITS: &[NamedBit] = &[
    bit!(0, "digitalSignature", "Digital Signature"),
    bit!(1, "nonRepudiation", "Non Repudiation"),
    bit!(2, "keyEncipherment", "Key Encipherment"),
    bit!(3, "dataEncipherment", "Data Encipherment"),
    bit!(4, "keyAgreement", "Key Agreement"),
    bit!(5, "keyCertSign", "Certificate Sign"),
    bit!(6, "cRLSign", "CRL Sign"),
    bit!(7, "encipherOnly", "Encipher Only"),
    bit!(8, "decipherOnly", "Decipher Only"),
];

pub const NS_CERT_TYPE_BITS: &[NamedBit] = &[
    bit!(0, "client", "SSL Client"),
    bit!(1, "server", "SSL Server"),
    bit!(2, "email", "S/MIME"),
    bit!(3, "objsign", "Object Signing"),
    bit!(4, "reserved", "Unused"),
    bit!(5, "sslCA", "SSL CA"),
    bit!(6, "emailCA", "S/MIME CA"),
    bit!(7, "objCA", "Object Signing CA"),
];

/// ASN.1 shapes decoded without extension specific code.
#[derive(Debug)]
pub enum Template {
    GeneralNames,
    NamedBits(&'static [NamedBit]),
    ObjectIds,
    OctetString,
    Ia5String,
}

impl Template {
    fn decode(&self, block: &ASN1Block, what: &str) -> Result<ExtValue, Error> {
        match (self, block) {
            (Template::GeneralNames, ASN1Block::Sequence(_, items)) => {
                Ok(ExtValue::GeneralNames(decode_names(items)?))
            }
            (Template::NamedBits(table), ASN1Block::BitString(_, nbits, bytes)) => {
                let table: &'static [NamedBit] = *table;
                let is_set = |bit: usize| {
                    bit < *nbits
                        && bytes
                            .get(bit / 8)
                            .map_or(false, |b| b & (0x80 >> (bit % 8)) != 0)
                };
                Ok(ExtValue::Bits(table.iter().filter(|b| is_set(b.bit)).collect()))
            }
            (Template::ObjectIds, ASN1Block::Sequence(_, items)) => {
                let mut oids = Vec::with_capacity(items.len());
                for item in items {
                    match item {
                        ASN1Block::ObjectIdentifier(_, o) => oids.push(asn::oid_vec(o)?),
                        _ => return Err(Error::decode(what, "expected OBJECT IDENTIFIER")),
                    }
                }
                Ok(ExtValue::ObjectIds(oids))
            }
            (Template::OctetString, ASN1Block::OctetString(_, bytes)) => {
                Ok(ExtValue::OctetString(bytes.clone()))
            }
            (Template::Ia5String, ASN1Block::IA5String(_, s)) => Ok(ExtValue::Ia5String(s.clone())),
            _ => Err(Error::decode(what, format!("value is not a {:?}", self))),
        }
    }
}

/// How an extension type turns DER into an [`ExtValue`]. Chosen once per
/// type: either a [`Template`] or a bespoke function.
pub enum Decoder {
    Template(Template),
    Function(fn(&ASN1Block) -> Result<ExtValue, Error>),
}

pub struct ExtMethod {
    pub oid: &'static [u64],
    pub decoder: Decoder,
    parse: fn(&str, &ExtContext<'_>) -> Result<ExtValue, String>,
}

impl ExtMethod {
    pub fn decode(&self, der: &[u8]) -> Result<ExtValue, Error> {
        let what = oid_to_short_name(self.oid);
        let block = asn::deserialize_one(der, &what)?;

        match &self.decoder {
            Decoder::Template(t) => t.decode(&block, &what),
            Decoder::Function(f) => f(&block),
        }
    }
}

static EXTENSIONS: &[ExtMethod] = &[
    ExtMethod {
        oid: BASIC_CONSTRAINTS,
        decoder: Decoder::Function(decode_basic_constraints),
        parse: conf::basic_constraints,
    },
    ExtMethod {
        oid: KEY_USAGE,
        decoder: Decoder::Template(Template::NamedBits(KEY_USAGE_BITS)),
        parse: conf::key_usage,
    },
    ExtMethod {
        oid: EXT_KEY_USAGE,
        decoder: Decoder::Template(Template::ObjectIds),
        parse: conf::ext_key_usage,
    },
    ExtMethod {
        oid: SUBJECT_KEY_IDENTIFIER,
        decoder: Decoder::Template(Template::OctetString),
        parse: conf::subject_key_id,
    },
    ExtMethod {
        oid: AUTHORITY_KEY_IDENTIFIER,
        decoder: Decoder::Function(decode_authority_key_id),
        parse: conf::authority_key_id,
    },
    ExtMethod {
        oid: SUBJECT_ALT_NAME,
        decoder: Decoder::Template(Template::GeneralNames),
        parse: conf::subject_alt_name,
    },
    ExtMethod {
        oid: ISSUER_ALT_NAME,
        decoder: Decoder::Template(Template::GeneralNames),
        parse: conf::issuer_alt_name,
    },
    ExtMethod {
        oid: CRL_DISTRIBUTION_POINTS,
        decoder: Decoder::Function(decode_crl_distribution_points),
        parse: conf::crl_distribution_points,
    },
    ExtMethod {
        oid: NS_CERT_TYPE,
        decoder: Decoder::Template(Template::NamedBits(NS_CERT_TYPE_BITS)),
        parse: conf::ns_cert_type,
    },
    ExtMethod {
        oid: NS_COMMENT,
        decoder: Decoder::Template(Template::Ia5String),
        parse: conf::ns_comment,
    },
];

fn sequence<'a>(block: &'a ASN1Block, what: &str) -> Result<&'a [ASN1Block], Error> {
    match block {
        ASN1Block::Sequence(_, items) => Ok(items),
        _ => Err(Error::decode(what, "expected SEQUENCE")),
    }
}

fn decode_basic_constraints(block: &ASN1Block) -> Result<ExtValue, Error> {
    let what = "basicConstraints";
    let mut rest = sequence(block, what)?;

    let mut ca = false;
    if let Some((ASN1Block::Boolean(_, b), tail)) = rest.split_first() {
        ca = *b;
        rest = tail;
    }

    let path_len = match rest {
        [] => None,
        [ASN1Block::Integer(_, n)] => {
            Some(n.to_u64().ok_or_else(|| Error::decode(what, "pathlen out of range"))?)
        }
        _ => return Err(Error::decode(what, "unexpected element")),
    };

    Ok(ExtValue::BasicConstraints { ca, path_len })
}

fn decode_authority_key_id(block: &ASN1Block) -> Result<ExtValue, Error> {
    let what = "authorityKeyIdentifier";
    let mut aki = AuthorityKeyId::default();

    for item in sequence(block, what)? {
        let primitive = || {
            implicit_bytes(item)
                .map(|b| b.to_vec())
                .ok_or_else(|| Error::decode(what, "expected a primitive element"))
        };

        match context_tag(item) {
            Some(0) => aki.key_id = Some(primitive()?),
            Some(1) => aki.issuer = Some(decode_names(&implicit_children(item, what)?)?),
            Some(2) => aki.serial = Some(primitive()?),
            _ => return Err(Error::decode(what, "unexpected element")),
        }
    }

    Ok(ExtValue::AuthorityKeyId(aki))
}

fn dist_point_name(choice: &ASN1Block, what: &str) -> Result<DistPointName, Error> {
    match context_tag(choice) {
        Some(0) => Ok(DistPointName::FullName(decode_names(&implicit_children(choice, what)?)?)),
        Some(1) => Ok(DistPointName::RelativeName(asn::constructed_contents(choice, what)?)),
        _ => Err(Error::decode(what, "unknown distribution point name")),
    }
}

fn decode_crl_distribution_points(block: &ASN1Block) -> Result<ExtValue, Error> {
    let what = "crlDistributionPoints";
    let mut points = Vec::new();

    for point in sequence(block, what)? {
        let mut name = None;
        // reasons [1] and cRLIssuer [2] are not printed
        for field in sequence(point, what)? {
            if context_tag(field) != Some(0) {
                continue;
            }
            for choice in implicit_children(field, what)? {
                name = Some(dist_point_name(&choice, what)?);
            }
        }
        points.push(name);
    }

    Ok(ExtValue::DistributionPoints(points))
}

fn object(oid: &[u64]) -> Option<&'static Object> {
    OBJECTS.iter().find(|o| o.oid == oid)
}

pub fn ext_method(oid: &[u64]) -> Option<&'static ExtMethod> {
    EXTENSIONS.iter().find(|m| m.oid == oid)
}

/// Resolves a short name, a long name or a dotted OID.
pub fn name_to_oid(name: &str) -> Option<Vec<u64>> {
    OBJECTS
        .iter()
        .find(|o| o.short_name == name || o.long_name == name)
        .map(|o| o.oid.to_vec())
        .or_else(|| asn::parse_oid(name))
}

/// Name of an OID with no arcs.
pub const UNDEF: &str = "UNDEF";

fn dotted(oid: &[u64]) -> Cow<'static, str> {
    if oid.is_empty() {
        return Cow::Borrowed(UNDEF);
    }

    Cow::Owned(asn::oid_to_string(oid))
}

/// Never fails or comes back empty: unknown OIDs come back in dotted form.
pub fn oid_to_short_name(oid: &[u64]) -> Cow<'static, str> {
    match object(oid) {
        Some(o) => Cow::Borrowed(o.short_name),
        None => dotted(oid),
    }
}

pub fn oid_to_long_name(oid: &[u64]) -> Cow<'static, str> {
    match object(oid) {
        Some(o) => Cow::Borrowed(o.long_name),
        None => dotted(oid),
    }
}

const CRITICAL: &str = "critical,";

/// Encodes `value` in the configuration grammar of extension `name`.
///
/// A leading `critical,` marks the extension critical. `DER:<hex>` supplies
/// the payload directly and works for any type, including unregistered
/// dotted OIDs.
pub fn text_to_der(name: &str, value: &str, ctx: &ExtContext<'_>) -> Result<X509Ext<'static>, Error> {
    let (critical, value) = match value.strip_prefix(CRITICAL) {
        Some(rest) => (true, rest.trim_start_matches(|c: char| c.is_ascii_whitespace())),
        None => (false, value),
    };

    let oid = name_to_oid(name).ok_or_else(|| Error::UnknownExtension(name.to_string()))?;

    if let Some(hex) = value.strip_prefix("DER:") {
        let data = asn::parse_hex(hex)
            .ok_or_else(|| conf::invalid(name, value, format!("invalid hex string {}", hex)))?;
        let checked = match ext_method(&oid) {
            Some(method) => method.decode(&data).map(|_| ()),
            None => asn::deserialize_one(&data, name).map(|_| ()),
        };
        checked.map_err(|e| conf::invalid(name, value, e.to_string()))?;

        return Ok(X509Ext::raw(oid, critical, data));
    }

    if value.starts_with("ASN1:") {
        return Err(conf::invalid(
            name,
            value,
            "ASN1 generator syntax is not supported".to_string(),
        ));
    }

    let method = ext_method(&oid).ok_or_else(|| Error::UnknownExtension(name.to_string()))?;
    let ext_value = (method.parse)(value, ctx).map_err(|reason| conf::invalid(name, value, reason))?;

    Ok(X509Ext::raw(oid, critical, ext_value.to_der()?))
}

/// Prints any extension. Types without a registered method are dumped as
/// colon separated hex.
pub fn generic_print(out: &mut Vec<u8>, ext: &X509Ext<'_>) -> Result<(), Error> {
    let method = match ext_method(ext.oid()) {
        Some(m) => m,
        None => {
            log::trace!("no method for {}, dumping {} bytes", ext.short_name(), ext.data().len());
            out.extend_from_slice(asn::hex_colon(ext.data()).as_bytes());
            return Ok(());
        }
    };

    let value = method.decode(ext.data()).map_err(|e| {
        log::warn!("malformed {} extension: {}", ext.short_name(), e);
        e
    })?;
    value.print(out);

    Ok(())
}

pub fn decode_general_names(ext: &X509Ext<'_>) -> Result<Vec<GeneralName>, Error> {
    let what = ext.short_name();
    let method = ext_method(ext.oid()).ok_or_else(|| Error::decode(&what, "no decoder registered"))?;

    match method.decode(ext.data())? {
        ExtValue::GeneralNames(names) => Ok(names),
        _ => Err(Error::decode(&what, "not a GeneralNames extension")),
    }
}
