#![allow(dead_code)]

use ring::rand::SystemRandom;
use ring::signature::{self, EcdsaKeyPair, KeyPair};
use x509_ext::*;

pub const COUNTRY: &[u64] = &[2, 5, 4, 6];
pub const COMMON_NAME: &[u64] = &[2, 5, 4, 3];

pub const EC_PUBLIC_KEY: &[u64] = &[1, 2, 840, 10045, 2, 1];
pub const PRIME256V1: &[u64] = &[1, 2, 840, 10045, 3, 1, 7];
pub const ECDSA_WITH_SHA256: &[u64] = &[1, 2, 840, 10045, 4, 3, 2];

pub struct TestKey {
    pub pkcs8: Vec<u8>,
    pub public: Vec<u8>,
}

pub fn ec_key() -> TestKey {
    let alg = &signature::ECDSA_P256_SHA256_ASN1_SIGNING;
    let rng = SystemRandom::new();
    let pkcs8 = EcdsaKeyPair::generate_pkcs8(alg, &rng).unwrap();
    let key = EcdsaKeyPair::from_pkcs8(alg, pkcs8.as_ref()).unwrap();

    TestKey {
        pkcs8: pkcs8.as_ref().to_vec(),
        public: key.public_key().as_ref().to_vec(),
    }
}

pub fn ec_sign_fn(data: &[u8], sign_key: &[u8]) -> Option<Vec<u8>> {
    let key =
        EcdsaKeyPair::from_pkcs8(&signature::ECDSA_P256_SHA256_ASN1_SIGNING, sign_key).ok()?;
    let rng = SystemRandom::new();
    let sig = key.sign(&rng, data).ok()?;

    Some(sig.as_ref().to_vec())
}

pub fn builder(sn: Vec<u8>, issuer_cn: &str, subject_cn: &str, key: &TestKey) -> X509Builder {
    X509Builder::new(sn)
        .version(2)
        .issuer_prstr(COUNTRY.to_vec(), "AU")
        .issuer_utf8(COMMON_NAME.to_vec(), issuer_cn)
        .subject_prstr(COUNTRY.to_vec(), "AU")
        .subject_utf8(COMMON_NAME.to_vec(), subject_cn)
        .not_before_utc(1_619_014_703)
        .not_after_utc(1_650_550_703)
        .pub_key_ec(EC_PUBLIC_KEY.to_vec(), key.public.clone(), PRIME256V1.to_vec())
        .sign_oid(ECDSA_WITH_SHA256.to_vec())
}

/// A self signed CA carrying a subjectKeyIdentifier and a subjectAltName.
pub fn ca_cert(key: &TestKey) -> X509 {
    let unsigned = builder(vec![0x01, 0x02], "Test CA", "Test CA", key).build();
    let ski = X509Ext::new("subjectKeyIdentifier", false, "hash", Some(&unsigned), None).unwrap();
    let san = X509Ext::new("subjectAltName", false, "DNS:ca.example", None, None).unwrap();

    builder(vec![0x01, 0x02], "Test CA", "Test CA", key)
        .ext(ski)
        .ext(san)
        .build()
        .sign(ec_sign_fn, &key.pkcs8)
        .unwrap()
}
