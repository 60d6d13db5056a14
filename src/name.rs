use crate::asn::{oid_new, oid_vec};
use crate::{registry, Error};
use simple_asn1::ASN1Block;

#[derive(Debug, Clone, PartialEq)]
pub struct OidStr {
    pub oid: Vec<u64>,
    pub data: String,
}

/// One attribute of a distinguished name, tagged by its string type.
#[derive(Debug, Clone, PartialEq)]
pub enum X509Name {
    Utf8(OidStr),
    PrStr(OidStr),
    TtxStr(OidStr),
    Ia5Str(OidStr),
}

impl X509Name {
    pub fn utf8(oid: Vec<u64>, data: &str) -> X509Name {
        X509Name::Utf8(OidStr {
            oid,
            data: data.to_string(),
        })
    }

    pub fn prstr(oid: Vec<u64>, data: &str) -> X509Name {
        X509Name::PrStr(OidStr {
            oid,
            data: data.to_string(),
        })
    }

    pub fn ttxstr(oid: Vec<u64>, data: &str) -> X509Name {
        X509Name::TtxStr(OidStr {
            oid,
            data: data.to_string(),
        })
    }

    pub fn ia5str(oid: Vec<u64>, data: &str) -> X509Name {
        X509Name::Ia5Str(OidStr {
            oid,
            data: data.to_string(),
        })
    }

    pub fn entry(&self) -> &OidStr {
        match self {
            X509Name::Utf8(s) | X509Name::PrStr(s) | X509Name::TtxStr(s) | X509Name::Ia5Str(s) => s,
        }
    }

    fn to_rdn(&self) -> ASN1Block {
        let e = self.entry();
        let value = match self {
            X509Name::Utf8(_) => ASN1Block::UTF8String(0, e.data.clone()),
            X509Name::PrStr(_) => ASN1Block::PrintableString(0, e.data.clone()),
            X509Name::TtxStr(_) => ASN1Block::TeletexString(0, e.data.clone()),
            X509Name::Ia5Str(_) => ASN1Block::IA5String(0, e.data.clone()),
        };

        let attr = ASN1Block::Sequence(
            0,
            vec![ASN1Block::ObjectIdentifier(0, oid_new(&e.oid)), value],
        );

        ASN1Block::Set(0, vec![attr])
    }
}

pub(crate) fn encode_name(name: &[X509Name]) -> ASN1Block {
    ASN1Block::Sequence(0, name.iter().map(X509Name::to_rdn).collect())
}

pub(crate) fn decode_name(block: &ASN1Block) -> Result<Vec<X509Name>, Error> {
    let rdns = match block {
        ASN1Block::Sequence(_, rdns) => rdns,
        _ => return Err(Error::Field("name")),
    };

    let mut ret = Vec::with_capacity(rdns.len());
    for (i, rdn) in rdns.iter().enumerate() {
        let attr = match rdn {
            ASN1Block::Set(_, set) => set.first().ok_or(Error::Set(i))?,
            _ => return Err(Error::Set(i)),
        };

        let seq = match attr {
            ASN1Block::Sequence(_, seq) => seq,
            _ => return Err(Error::Seq(i)),
        };

        let oid = match seq.get(0) {
            Some(ASN1Block::ObjectIdentifier(_, o)) => oid_vec(o)?,
            _ => return Err(Error::Field("name attribute type")),
        };

        let name = match seq.get(1) {
            Some(ASN1Block::UTF8String(_, d)) => X509Name::utf8(oid, d),
            Some(ASN1Block::PrintableString(_, d)) => X509Name::prstr(oid, d),
            Some(ASN1Block::TeletexString(_, d)) => X509Name::ttxstr(oid, d),
            Some(ASN1Block::IA5String(_, d)) => X509Name::ia5str(oid, d),
            _ => return Err(Error::Field("name attribute value")),
        };

        ret.push(name);
    }

    Ok(ret)
}

/// The `/C=AU/O=Example/CN=example.com` form.
pub fn oneline(name: &[X509Name]) -> String {
    let mut s = String::new();
    for n in name {
        let e = n.entry();
        s.push('/');
        s.push_str(&registry::oid_to_short_name(&e.oid));
        s.push('=');
        s.push_str(&e.data);
    }

    s
}
