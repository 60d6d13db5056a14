//! The textual configuration grammar of extension values.
//!
//! A value is a comma separated list of `name` or `name:value` items with
//! surrounding whitespace ignored, e.g. `CA:TRUE, pathlen:0` or
//! `DNS:example.com,IP:192.0.2.1`.

use crate::general_name::GeneralName;
use crate::registry::{self, KEY_USAGE_BITS, NS_CERT_TYPE_BITS};
use crate::value::{AuthorityKeyId, DistPointName, ExtValue, NamedBit};
use crate::{x509::X509, Error};
use ring::digest;

/// Certificates an extension value may refer to. Built for a single
/// encode call and never stored.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtContext<'a> {
    pub subject: Option<&'a X509>,
    pub issuer: Option<&'a X509>,
}

#[derive(Debug, PartialEq)]
pub(crate) struct ConfValue<'a> {
    pub name: &'a str,
    pub value: Option<&'a str>,
}

fn strip(s: &str) -> &str {
    s.trim_matches(|c: char| c.is_ascii_whitespace())
}

pub(crate) fn parse_list(line: &str) -> Result<Vec<ConfValue<'_>>, String> {
    let mut values = Vec::new();

    for item in line.split(',') {
        let (name, value) = match item.split_once(':') {
            Some((name, value)) => (strip(name), Some(strip(value))),
            None => (strip(item), None),
        };

        if name.is_empty() {
            return Err("invalid null name".to_string());
        }
        if value == Some("") {
            return Err(format!("invalid null value for {}", name));
        }

        values.push(ConfValue { name, value });
    }

    Ok(values)
}

pub(crate) fn value_bool(value: &str) -> Option<bool> {
    match value {
        "TRUE" | "true" | "Y" | "y" | "YES" | "yes" => Some(true),
        "FALSE" | "false" | "N" | "n" | "NO" | "no" => Some(false),
        _ => None,
    }
}

pub(crate) fn value_int(value: &str) -> Option<u64> {
    match value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
    {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => value.parse().ok(),
    }
}

pub(crate) fn basic_constraints(line: &str, _ctx: &ExtContext<'_>) -> Result<ExtValue, String> {
    let mut ca = false;
    let mut path_len = None;

    for cv in parse_list(line)? {
        match (cv.name, cv.value) {
            ("CA", Some(v)) => {
                ca = value_bool(v).ok_or_else(|| format!("invalid boolean {}", v))?;
            }
            ("pathlen", Some(v)) => {
                path_len = Some(value_int(v).ok_or_else(|| format!("invalid integer {}", v))?);
            }
            (name, _) => return Err(format!("invalid name {}", name)),
        }
    }

    Ok(ExtValue::BasicConstraints { ca, path_len })
}

fn named_bits(line: &str, table: &'static [NamedBit]) -> Result<ExtValue, String> {
    let mut bits: Vec<&'static NamedBit> = Vec::new();

    for cv in parse_list(line)? {
        let bit = table
            .iter()
            .find(|b| b.short_name == cv.name || b.long_name == cv.name)
            .ok_or_else(|| format!("unknown bit string argument {}", cv.name))?;
        if !bits.contains(&bit) {
            bits.push(bit);
        }
    }

    bits.sort_by_key(|b| b.bit);

    Ok(ExtValue::Bits(bits))
}

pub(crate) fn key_usage(line: &str, _ctx: &ExtContext<'_>) -> Result<ExtValue, String> {
    named_bits(line, KEY_USAGE_BITS)
}

pub(crate) fn ns_cert_type(line: &str, _ctx: &ExtContext<'_>) -> Result<ExtValue, String> {
    named_bits(line, NS_CERT_TYPE_BITS)
}

pub(crate) fn ext_key_usage(line: &str, _ctx: &ExtContext<'_>) -> Result<ExtValue, String> {
    let mut oids = Vec::new();

    for cv in parse_list(line)? {
        if let Some(v) = cv.value {
            return Err(format!("invalid object identifier {}:{}", cv.name, v));
        }
        let oid = registry::name_to_oid(cv.name)
            .ok_or_else(|| format!("invalid object identifier {}", cv.name))?;
        oids.push(oid);
    }

    Ok(ExtValue::ObjectIds(oids))
}

pub(crate) fn subject_key_id(line: &str, ctx: &ExtContext<'_>) -> Result<ExtValue, String> {
    let line = strip(line);
    if line != "hash" {
        return asn_hex(line).map(ExtValue::OctetString);
    }

    let subject = ctx.subject.ok_or("no public key: subject certificate required")?;
    let bits = subject.pub_key_bits().map_err(|e| e.to_string())?;
    let hash = digest::digest(&digest::SHA1_FOR_LEGACY_USE_ONLY, &bits);

    Ok(ExtValue::OctetString(hash.as_ref().to_vec()))
}

fn asn_hex(s: &str) -> Result<Vec<u8>, String> {
    crate::asn::parse_hex(s).ok_or_else(|| format!("invalid hex string {}", s))
}

#[derive(Clone, Copy, PartialEq, PartialOrd)]
enum Want {
    No,
    Yes,
    Always,
}

pub(crate) fn authority_key_id(line: &str, ctx: &ExtContext<'_>) -> Result<ExtValue, String> {
    let mut keyid = Want::No;
    let mut issuer = Want::No;

    for cv in parse_list(line)? {
        let want = match cv.value {
            None => Want::Yes,
            Some("always") => Want::Always,
            Some(v) => return Err(format!("unknown option {}:{}", cv.name, v)),
        };
        match cv.name {
            "keyid" => keyid = want,
            "issuer" => issuer = want,
            name => return Err(format!("unknown option {}", name)),
        }
    }

    let cert = ctx.issuer.ok_or("no issuer certificate")?;
    let mut aki = AuthorityKeyId::default();

    if keyid > Want::No {
        aki.key_id = cert.subject_key_id();
        if keyid == Want::Always && aki.key_id.is_none() {
            return Err("unable to get issuer keyid".to_string());
        }
    }

    if issuer == Want::Always || (issuer == Want::Yes && aki.key_id.is_none()) {
        if cert.issuer.is_empty() {
            return Err("unable to get issuer details".to_string());
        }
        aki.issuer = Some(AuthorityKeyId::issuer_dir_name(&cert.issuer));
        aki.serial = Some(crate::value::serial_contents(&cert.sn).map_err(|e| e.to_string())?);
    }

    Ok(ExtValue::AuthorityKeyId(aki))
}

fn general_name(cv: &ConfValue<'_>) -> Result<GeneralName, String> {
    let value = cv
        .value
        .ok_or_else(|| format!("missing value for {}", cv.name))?;

    GeneralName::parse(cv.name, value)
}

pub(crate) fn subject_alt_name(line: &str, ctx: &ExtContext<'_>) -> Result<ExtValue, String> {
    let mut names = Vec::new();

    for cv in parse_list(line)? {
        if cv.name == "email" && cv.value == Some("copy") {
            let subject = ctx.subject.ok_or("no subject details")?;
            names.extend(
                subject
                    .email_addresses()
                    .into_iter()
                    .map(|e| GeneralName::Email(e.into_bytes())),
            );
            continue;
        }

        names.push(general_name(&cv)?);
    }

    Ok(ExtValue::GeneralNames(names))
}

pub(crate) fn issuer_alt_name(line: &str, ctx: &ExtContext<'_>) -> Result<ExtValue, String> {
    let mut names = Vec::new();

    for cv in parse_list(line)? {
        if cv.name == "issuer" && cv.value == Some("copy") {
            let issuer = ctx.issuer.ok_or("no issuer details")?;
            if let Some(ext) = issuer.extension(registry::SUBJECT_ALT_NAME) {
                let copied = registry::decode_general_names(&ext).map_err(|e| e.to_string())?;
                names.extend(copied);
            }
            continue;
        }

        names.push(general_name(&cv)?);
    }

    Ok(ExtValue::GeneralNames(names))
}

pub(crate) fn crl_distribution_points(line: &str, _ctx: &ExtContext<'_>) -> Result<ExtValue, String> {
    let mut points = Vec::new();

    for cv in parse_list(line)? {
        if cv.value.is_none() {
            return Err(format!(
                "distribution point section {} needs a configuration database",
                cv.name
            ));
        }
        points.push(Some(DistPointName::FullName(vec![general_name(&cv)?])));
    }

    Ok(ExtValue::DistributionPoints(points))
}

pub(crate) fn ns_comment(line: &str, _ctx: &ExtContext<'_>) -> Result<ExtValue, String> {
    if !line.is_ascii() {
        return Err("comment is not an IA5String".to_string());
    }

    Ok(ExtValue::Ia5String(line.to_string()))
}

pub(crate) fn invalid(name: &str, value: &str, reason: String) -> Error {
    Error::InvalidValue {
        name: name.to_string(),
        value: value.to_string(),
        reason,
    }
}
