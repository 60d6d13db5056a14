use crate::asn::{self, oid_new, oid_vec};
use crate::name::{decode_name, encode_name, X509Name};
use crate::registry::{self, EMAIL_ADDRESS, SUBJECT_KEY_IDENTIFIER};
use crate::value::ExtValue;
use crate::{Error, X509Ext};
use chrono::{TimeZone, Utc};
use num_traits::cast::ToPrimitive;
use simple_asn1::{ASN1Block, BigInt};

#[derive(Debug, Clone, PartialEq)]
pub enum X509Time {
    Utc(i64),
    Gen(i64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RsaPub {
    pub pub_oid: Vec<u64>,
    pub n: Vec<u8>,
    pub e: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EcPub {
    pub pub_oid: Vec<u64>,
    pub key: Vec<u8>,
    pub curve: Vec<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PubKey {
    Rsa(RsaPub),
    Ec(EcPub),
    Any(Vec<ASN1Block>),
}

/// A certificate as far as extensions need one: names, serial, key and
/// its own extension list.
#[derive(Debug, Clone, PartialEq)]
pub struct X509 {
    pub version: Option<u64>,
    pub sn: Vec<u8>,
    pub issuer: Vec<X509Name>,
    pub subject: Vec<X509Name>,
    pub not_before: Option<X509Time>,
    pub not_after: Option<X509Time>,
    pub pub_key: Option<PubKey>,
    pub ext: Vec<X509Ext<'static>>,
    pub sign_oid: Vec<u64>,
    pub sign: Vec<u8>,
}

fn time_block(t: &X509Time) -> Result<ASN1Block, Error> {
    let at = |secs: i64| Utc.timestamp_opt(secs, 0).single().ok_or(Error::Time(secs));

    Ok(match t {
        X509Time::Utc(secs) => ASN1Block::UTCTime(0, at(*secs)?),
        X509Time::Gen(secs) => ASN1Block::GeneralizedTime(0, at(*secs)?),
    })
}

fn algorithm(pub_key: &PubKey, sign_oid: &[u64]) -> ASN1Block {
    let mut alg = vec![ASN1Block::ObjectIdentifier(0, oid_new(sign_oid))];
    /* RSA signatures carry explicit NULL parameters */
    if let PubKey::Rsa(_) = pub_key {
        alg.push(ASN1Block::Null(0));
    }

    ASN1Block::Sequence(0, alg)
}

fn spki(pub_key: &PubKey) -> Result<Vec<ASN1Block>, Error> {
    match pub_key {
        PubKey::Rsa(rsa) => {
            let key = ASN1Block::Sequence(
                0,
                vec![
                    ASN1Block::Integer(0, BigInt::from_signed_bytes_be(&rsa.n)),
                    ASN1Block::Integer(0, BigInt::from(rsa.e)),
                ],
            );
            let der = asn::serialize(&key)?;

            Ok(vec![
                ASN1Block::Sequence(
                    0,
                    vec![
                        ASN1Block::ObjectIdentifier(0, oid_new(&rsa.pub_oid)),
                        ASN1Block::Null(0),
                    ],
                ),
                ASN1Block::BitString(0, der.len() * 8, der),
            ])
        }
        PubKey::Ec(ec) => Ok(vec![
            ASN1Block::Sequence(
                0,
                vec![
                    ASN1Block::ObjectIdentifier(0, oid_new(&ec.pub_oid)),
                    ASN1Block::ObjectIdentifier(0, oid_new(&ec.curve)),
                ],
            ),
            ASN1Block::BitString(0, ec.key.len() * 8, ec.key.clone()),
        ]),
        PubKey::Any(key) => Ok(key.clone()),
    }
}

fn ext_block(e: &X509Ext<'_>) -> ASN1Block {
    let mut seq = vec![ASN1Block::ObjectIdentifier(0, oid_new(e.oid()))];
    /* critical is DEFAULT FALSE */
    if e.critical() {
        seq.push(ASN1Block::Boolean(0, true));
    }
    seq.push(ASN1Block::OctetString(0, e.data().to_vec()));

    ASN1Block::Sequence(0, seq)
}

fn tbs_certificate(x: &X509) -> Result<ASN1Block, Error> {
    let pub_key = x.pub_key.as_ref().ok_or(Error::NoPubKey)?;
    let mut body = Vec::new();

    if let Some(v) = x.version {
        body.push(asn::explicit(0, ASN1Block::Integer(0, BigInt::from(v))));
    }

    body.push(ASN1Block::Integer(0, BigInt::from_signed_bytes_be(&x.sn)));
    body.push(algorithm(pub_key, &x.sign_oid));

    if x.issuer.is_empty() {
        return Err(Error::NoIssuerName);
    }
    body.push(encode_name(&x.issuer));

    match (&x.not_before, &x.not_after) {
        (Some(nb), Some(na)) => {
            body.push(ASN1Block::Sequence(0, vec![time_block(nb)?, time_block(na)?]));
        }
        _ => return Err(Error::NoValidityTime),
    }

    if x.subject.is_empty() {
        return Err(Error::NoSubjectName);
    }
    body.push(encode_name(&x.subject));

    body.push(ASN1Block::Sequence(0, spki(pub_key)?));

    if !x.ext.is_empty() {
        let ext = x.ext.iter().map(ext_block).collect();
        body.push(asn::explicit(3, ASN1Block::Sequence(0, ext)));
    }

    Ok(ASN1Block::Sequence(0, body))
}

impl X509 {
    pub fn builder() -> X509Builder {
        X509Builder::default()
    }

    /// Signs the DER of the TBSCertificate with `sign_cb(data, sign_key)`.
    pub fn sign<F>(mut self, sign_cb: F, sign_key: &[u8]) -> Result<X509, Error>
    where
        F: Fn(&[u8], &[u8]) -> Option<Vec<u8>>,
    {
        let data = asn::serialize(&tbs_certificate(&self)?)?;
        self.sign = sign_cb(&data, sign_key).ok_or(Error::Signature)?;

        Ok(self)
    }

    pub fn x509_enc(&self) -> Result<Vec<u8>, Error> {
        let pub_key = self.pub_key.as_ref().ok_or(Error::NoPubKey)?;
        if self.sign.is_empty() {
            return Err(Error::NoSignature);
        }

        let cert = ASN1Block::Sequence(
            0,
            vec![
                tbs_certificate(self)?,
                algorithm(pub_key, &self.sign_oid),
                ASN1Block::BitString(0, self.sign.len() * 8, self.sign.clone()),
            ],
        );

        asn::serialize(&cert)
    }

    /// Views of the extension list. The views borrow their payload.
    pub fn extensions(&self) -> impl Iterator<Item = X509Ext<'_>> + '_ {
        self.ext
            .iter()
            .map(|e| X509Ext::borrowed(e.oid(), e.critical(), e.data()))
    }

    pub fn extension(&self, oid: &[u64]) -> Option<X509Ext<'_>> {
        self.extensions().find(|e| e.oid() == oid)
    }

    /// The subjectPublicKey BIT STRING contents, as hashed into key
    /// identifiers.
    pub fn pub_key_bits(&self) -> Result<Vec<u8>, Error> {
        let key = spki(self.pub_key.as_ref().ok_or(Error::NoPubKey)?)?;
        match key.get(1) {
            Some(ASN1Block::BitString(_, _, bits)) => Ok(bits.clone()),
            _ => Err(Error::Field("subjectPublicKey")),
        }
    }

    pub fn subject_key_id(&self) -> Option<Vec<u8>> {
        let ext = self.extension(SUBJECT_KEY_IDENTIFIER)?;
        let method = registry::ext_method(SUBJECT_KEY_IDENTIFIER)?;

        match method.decode(ext.data()) {
            Ok(ExtValue::OctetString(id)) => Some(id),
            Ok(_) => None,
            Err(e) => {
                log::warn!("ignoring malformed subjectKeyIdentifier: {}", e);
                None
            }
        }
    }

    pub fn email_addresses(&self) -> Vec<String> {
        self.subject
            .iter()
            .map(X509Name::entry)
            .filter(|e| e.oid == EMAIL_ADDRESS)
            .map(|e| e.data.clone())
            .collect()
    }
}

#[derive(Default)]
pub struct X509Builder {
    version: Option<u64>,
    sn: Vec<u8>,
    issuer: Vec<X509Name>,
    subject: Vec<X509Name>,
    not_before: Option<X509Time>,
    not_after: Option<X509Time>,
    pub_key: Option<PubKey>,
    ext: Vec<X509Ext<'static>>,
    sign_oid: Vec<u64>,
}

impl X509Builder {
    pub fn new(sn: Vec<u8>) -> X509Builder {
        X509Builder {
            sn,
            ..Default::default()
        }
    }

    pub fn version(mut self, version: u64) -> X509Builder {
        self.version = Some(version);
        self
    }

    pub fn issuer(mut self, name: X509Name) -> X509Builder {
        self.issuer.push(name);
        self
    }

    pub fn subject(mut self, name: X509Name) -> X509Builder {
        self.subject.push(name);
        self
    }

    pub fn issuer_utf8(self, oid: Vec<u64>, data: &str) -> X509Builder {
        self.issuer(X509Name::utf8(oid, data))
    }

    pub fn issuer_prstr(self, oid: Vec<u64>, data: &str) -> X509Builder {
        self.issuer(X509Name::prstr(oid, data))
    }

    pub fn subject_utf8(self, oid: Vec<u64>, data: &str) -> X509Builder {
        self.subject(X509Name::utf8(oid, data))
    }

    pub fn subject_prstr(self, oid: Vec<u64>, data: &str) -> X509Builder {
        self.subject(X509Name::prstr(oid, data))
    }

    pub fn subject_ia5(self, oid: Vec<u64>, data: &str) -> X509Builder {
        self.subject(X509Name::ia5str(oid, data))
    }

    pub fn not_before(mut self, t: X509Time) -> X509Builder {
        self.not_before = Some(t);
        self
    }

    pub fn not_after(mut self, t: X509Time) -> X509Builder {
        self.not_after = Some(t);
        self
    }

    pub fn not_before_utc(self, secs: i64) -> X509Builder {
        self.not_before(X509Time::Utc(secs))
    }

    pub fn not_after_utc(self, secs: i64) -> X509Builder {
        self.not_after(X509Time::Utc(secs))
    }

    pub fn pub_key_rsa(mut self, pub_oid: Vec<u64>, n: Vec<u8>, e: u32) -> X509Builder {
        self.pub_key = Some(PubKey::Rsa(RsaPub { pub_oid, n, e }));
        self
    }

    pub fn pub_key_ec(mut self, pub_oid: Vec<u64>, key: Vec<u8>, curve: Vec<u64>) -> X509Builder {
        self.pub_key = Some(PubKey::Ec(EcPub { pub_oid, key, curve }));
        self
    }

    pub fn ext(mut self, ext: X509Ext<'_>) -> X509Builder {
        self.ext.push(ext.into_owned());
        self
    }

    pub fn sign_oid(mut self, oid: Vec<u64>) -> X509Builder {
        self.sign_oid = oid;
        self
    }

    pub fn build(self) -> X509 {
        X509 {
            version: self.version,
            sn: self.sn,
            issuer: self.issuer,
            subject: self.subject,
            not_before: self.not_before,
            not_after: self.not_after,
            pub_key: self.pub_key,
            ext: self.ext,
            sign_oid: self.sign_oid,
            sign: Vec::new(),
        }
    }
}

fn get_asn1_seq(v: &[ASN1Block], idx: usize) -> Result<&Vec<ASN1Block>, Error> {
    match v.get(idx) {
        Some(ASN1Block::Sequence(_, vec)) => Ok(vec),
        _ => Err(Error::Seq(idx)),
    }
}

fn get_oid(v: &[ASN1Block], idx: usize, field: &'static str) -> Result<Vec<u64>, Error> {
    match v.get(idx) {
        Some(ASN1Block::ObjectIdentifier(_, o)) => oid_vec(o),
        _ => Err(Error::Field(field)),
    }
}

fn get_x509_time(block: Option<&ASN1Block>) -> Result<X509Time, Error> {
    match block {
        Some(ASN1Block::UTCTime(_, t)) => Ok(X509Time::Utc(t.timestamp())),
        Some(ASN1Block::GeneralizedTime(_, t)) => Ok(X509Time::Gen(t.timestamp())),
        _ => Err(Error::Field("validity")),
    }
}

fn get_rsa_pub_key(spki: &[ASN1Block]) -> Result<PubKey, Error> {
    let alg = get_asn1_seq(spki, 0)?;
    let pub_oid = get_oid(alg, 0, "RSA key algorithm")?;

    let der = match spki.get(1) {
        Some(ASN1Block::BitString(_, _, d)) => d,
        _ => return Err(Error::Field("RSA public key")),
    };

    let key = simple_asn1::from_der(der).map_err(Error::Deserialize)?;
    let key = get_asn1_seq(&key, 0)?;
    let n = match key.get(0) {
        Some(ASN1Block::Integer(_, n)) => n.to_signed_bytes_be(),
        _ => return Err(Error::Field("RSA modulus")),
    };
    let e = match key.get(1) {
        Some(ASN1Block::Integer(_, e)) => e.to_u32().ok_or(Error::Field("RSA public exponent"))?,
        _ => return Err(Error::Field("RSA public exponent")),
    };

    Ok(PubKey::Rsa(RsaPub { pub_oid, n, e }))
}

fn get_ec_pub_key(spki: &[ASN1Block]) -> Result<PubKey, Error> {
    let alg = get_asn1_seq(spki, 0)?;
    let pub_oid = get_oid(alg, 0, "EC key algorithm")?;
    let curve = get_oid(alg, 1, "EC curve")?;

    let key = match spki.get(1) {
        Some(ASN1Block::BitString(_, _, k)) => k.clone(),
        _ => return Err(Error::Field("EC public key")),
    };

    Ok(PubKey::Ec(EcPub {
        pub_oid,
        key,
        curve,
    }))
}

fn get_pub_key(v: &[ASN1Block], idx: usize) -> Result<PubKey, Error> {
    let spki = get_asn1_seq(v, idx)?;

    get_rsa_pub_key(spki)
        .or_else(|_| get_ec_pub_key(spki))
        .or_else(|_| Ok(PubKey::Any(spki.clone())))
}

fn get_extensions(v: &[ASN1Block], idx: usize) -> Result<Vec<X509Ext<'static>>, Error> {
    let exts = match v.get(idx) {
        None => return Ok(Vec::new()),
        Some(block) if asn::context_tag(block) == Some(3) => {
            let children = asn::implicit_children(block, "extensions")?;
            match children.into_iter().next() {
                Some(ASN1Block::Sequence(_, exts)) => exts,
                _ => return Err(Error::Field("extensions")),
            }
        }
        Some(_) => return Err(Error::Field("extensions")),
    };

    let mut ret = Vec::with_capacity(exts.len());
    for i in 0..exts.len() {
        let seq = get_asn1_seq(&exts, i)?;
        let oid = get_oid(seq, 0, "extension id")?;

        let (critical, data) = match (seq.get(1), seq.get(2)) {
            (Some(ASN1Block::Boolean(_, c)), Some(ASN1Block::OctetString(_, d))) => (*c, d),
            (Some(ASN1Block::OctetString(_, d)), None) => (false, d),
            _ => return Err(Error::Field("extension value")),
        };

        log::trace!("extension {}: {} bytes", asn::oid_to_string(&oid), data.len());
        ret.push(X509Ext::raw(oid, critical, data.clone()));
    }

    Ok(ret)
}

pub trait X509Deserialize {
    fn x509_dec(&self) -> Result<X509, Error>;
}

impl X509Deserialize for Vec<u8> {
    fn x509_dec(&self) -> Result<X509, Error> {
        x509_decode(self)
    }
}

impl X509Deserialize for &[u8] {
    fn x509_dec(&self) -> Result<X509, Error> {
        x509_decode(self)
    }
}

fn x509_decode(der: &[u8]) -> Result<X509, Error> {
    let full = simple_asn1::from_der(der).map_err(Error::Deserialize)?;
    let cert = get_asn1_seq(&full, 0)?;
    let body = get_asn1_seq(cert, 0)?;

    /* Version */
    let version = match body.get(0) {
        Some(block) if asn::context_tag(block) == Some(0) => {
            match asn::implicit_children(block, "version")?.first() {
                Some(ASN1Block::Integer(_, v)) => v.to_u64(),
                _ => return Err(Error::Field("version")),
            }
        }
        _ => None,
    };
    let mut idx = if version.is_some() { 1 } else { 0 };

    /* Serial Number */
    let sn = match body.get(idx) {
        Some(ASN1Block::Integer(_, n)) => n.to_signed_bytes_be(),
        _ => return Err(Error::Field("serial number")),
    };
    idx += 1;

    /* Signature Algorithm */
    let sign_oid = get_oid(get_asn1_seq(body, idx)?, 0, "signature algorithm")?;
    idx += 1;

    let issuer = decode_name(body.get(idx).ok_or(Error::NoIssuerName)?)?;
    idx += 1;

    let validity = get_asn1_seq(body, idx)?;
    let not_before = get_x509_time(validity.get(0))?;
    let not_after = get_x509_time(validity.get(1))?;
    idx += 1;

    let subject = decode_name(body.get(idx).ok_or(Error::NoSubjectName)?)?;
    idx += 1;

    let pub_key = get_pub_key(body, idx)?;
    idx += 1;

    /* issuerUniqueID and subjectUniqueID are not kept */
    while matches!(body.get(idx).and_then(asn::context_tag), Some(1) | Some(2)) {
        idx += 1;
    }

    let ext = get_extensions(body, idx)?;

    let sign = match cert.get(2) {
        Some(ASN1Block::BitString(_, _, s)) => s.clone(),
        _ => return Err(Error::NoSignature),
    };

    log::debug!(
        "decoded certificate {} with {} extensions",
        crate::name::oneline(&subject),
        ext.len()
    );

    Ok(X509 {
        version,
        sn,
        issuer,
        subject,
        not_before: Some(not_before),
        not_after: Some(not_after),
        pub_key: Some(pub_key),
        ext,
        sign_oid,
        sign,
    })
}
