mod common;

use common::*;
use hex_literal::hex;
use x509_ext::registry::{self, AUTHORITY_KEY_IDENTIFIER, ISSUER_ALT_NAME, SUBJECT_ALT_NAME};
use x509_ext::*;

#[test]
fn basic_constraints_not_ca() {
    let ext = X509Ext::new("basicConstraints", false, "CA:FALSE", None, None).unwrap();

    assert!(!ext.critical());
    assert_eq!(ext.oid(), &[2, 5, 29, 19]);
    assert_eq!(ext.short_name(), "basicConstraints");
    assert_eq!(ext.data(), hex!("30 00"));
    assert!(ext.owns_data());
    assert_eq!(ext.render().unwrap(), "CA:FALSE");
}

#[test]
fn critical_flag_matches_prefix() {
    let flagged = X509Ext::new("basicConstraints", true, "CA:FALSE", None, None).unwrap();
    let prefixed = X509Ext::new("basicConstraints", false, "critical,CA:FALSE", None, None).unwrap();
    let plain = X509Ext::new("basicConstraints", false, "CA:FALSE", None, None).unwrap();

    assert!(flagged.critical());
    assert_eq!(flagged, prefixed);
    assert_eq!(flagged.data(), plain.data());
}

#[test]
fn basic_constraints_path_len() {
    let ext = X509Ext::new("basicConstraints", true, "CA:TRUE, pathlen:1", None, None).unwrap();

    assert_eq!(ext.data(), hex!("30 06 01 01 FF 02 01 01"));
    assert_eq!(ext.render().unwrap(), "CA:TRUE, pathlen:1");
    assert_eq!(ext.to_string(), "CA:TRUE, pathlen:1");
}

#[test]
fn key_usage_bits() {
    let ext = X509Ext::new(
        "keyUsage",
        true,
        "digitalSignature,keyEncipherment,dataEncipherment",
        None,
        None,
    )
    .unwrap();

    assert_eq!(ext.data(), hex!("03 02 04 B0"));
    assert_eq!(
        ext.render().unwrap(),
        "Digital Signature, Key Encipherment, Data Encipherment"
    );

    let bad = X509Ext::new("keyUsage", false, "digitalSignature,flying", None, None);
    assert!(matches!(bad, Err(Error::InvalidValue { .. })));
}

#[test]
fn ns_cert_type_bits() {
    let ext = X509Ext::new("nsCertType", false, "server, client", None, None).unwrap();

    assert_eq!(ext.data(), hex!("03 02 06 C0"));
    assert_eq!(ext.render().unwrap(), "SSL Client, SSL Server");
}

#[test]
fn ext_key_usage_purposes() {
    let ext = X509Ext::new("extendedKeyUsage", false, "serverAuth,clientAuth", None, None).unwrap();

    assert_eq!(
        ext.data(),
        hex!("30 14 06 08 2B 06 01 05 05 07 03 01 06 08 2B 06 01 05 05 07 03 02")
    );
    assert_eq!(
        ext.render().unwrap(),
        "TLS Web Server Authentication, TLS Web Client Authentication"
    );

    let dotted = X509Ext::new("extendedKeyUsage", false, "1.3.6.1.5.5.7.3.1", None, None).unwrap();
    assert_eq!(dotted.render().unwrap(), "TLS Web Server Authentication");
}

#[test]
fn ns_comment_text() {
    let ext = X509Ext::new("nsComment", false, "hello", None, None).unwrap();

    assert_eq!(ext.data(), hex!("16 05 68 65 6C 6C 6F"));
    assert_eq!(ext.render().unwrap(), "hello");
}

#[test]
fn crl_distribution_point_uri() {
    let ext = X509Ext::new(
        "crlDistributionPoints",
        false,
        "URI:http://a.b/c.crl",
        None,
        None,
    )
    .unwrap();

    assert_eq!(
        ext.data(),
        hex!("30 18 30 16 A0 14 A0 12 86 10 68 74 74 70 3A 2F 2F 61 2E 62 2F 63 2E 63 72 6C")
    );
    assert_eq!(ext.render().unwrap(), "Full Name: URI:http://a.b/c.crl");
}

#[test]
fn short_names() {
    let san = X509Ext::new("subjectAltName", false, "DNS:example.com", None, None).unwrap();
    assert_eq!(san.short_name(), "subjectAltName");

    let long = X509Ext::new("X509v3 Subject Alternative Name", false, "DNS:example.com", None, None)
        .unwrap();
    assert_eq!(long, san);

    let custom = X509Ext::raw(vec![1, 2, 3, 4], false, hex!("05 00").to_vec());
    assert_eq!(custom.short_name(), "1.2.3.4");
    assert_eq!(custom.render().unwrap(), "05:00");
}

#[test]
fn subject_alt_name_entries() {
    let ext = X509Ext::new(
        "subjectAltName",
        false,
        "DNS:a.com, DNS:b.com, email:me@a.com, URI:https://a.com/, IP:192.0.2.1, IP:2001:db8::1",
        None,
        None,
    )
    .unwrap();

    assert_eq!(
        ext.render().unwrap(),
        "DNS:a.com, DNS:b.com, email:me@a.com, URI:https://a.com/, \
         IP Address:192.0.2.1, IP Address:2001:DB8:0:0:0:0:0:1"
    );
}

#[test]
fn subject_alt_name_other_name_and_rid() {
    let ext = X509Ext::new(
        "subjectAltName",
        false,
        "otherName:msUPN;UTF8:user@corp, RID:1.2.3.4",
        None,
        None,
    )
    .unwrap();

    assert_eq!(
        ext.render().unwrap(),
        "othername:msUPN:user@corp, Registered ID:1.2.3.4"
    );
}

#[test]
fn subject_alt_name_keeps_nul() {
    let der = hex!("30 13 82 11 73 61 66 65 2E 63 6F 6D 00 65 76 69 6C 2E 63 6F 6D");
    let san = X509Ext::raw(SUBJECT_ALT_NAME.to_vec(), false, der.to_vec());

    let bytes = san.render_bytes().unwrap();
    assert_eq!(bytes, b"DNS:safe.com\0evil.com");
    assert_eq!(bytes.len(), 21);
    assert_eq!(san.render().unwrap(), "DNS:safe.com\0evil.com");

    /* the generic printer still masks it */
    let ian = X509Ext::raw(ISSUER_ALT_NAME.to_vec(), false, der.to_vec());
    assert_eq!(ian.render().unwrap(), "DNS:safe.com.evil.com");
}

#[test]
fn render_is_repeatable() {
    let ext = X509Ext::new("subjectAltName", false, "DNS:a.com,DNS:b.com", None, None).unwrap();

    let first = ext.render_bytes().unwrap();
    let second = ext.render_bytes().unwrap();
    assert_eq!(first, second);
    assert_eq!(first, b"DNS:a.com, DNS:b.com");
}

#[test]
fn unknown_extension_name() {
    let err = X509Ext::new("bogusExtension", false, "whatever", None, None).unwrap_err();
    assert!(matches!(err, Error::UnknownExtension(ref n) if n == "bogusExtension"));

    let err = X509Ext::new("bogus-extension-name", false, "x", None, None).unwrap_err();
    assert!(matches!(err, Error::UnknownExtension(ref n) if n == "bogus-extension-name"));

    /* known object without a method */
    let err = X509Ext::new("certificatePolicies", false, "1.2.3.4", None, None).unwrap_err();
    assert!(matches!(err, Error::UnknownExtension(_)));
}

#[test]
fn invalid_values() {
    let cases = [
        ("basicConstraints", "CA:maybe"),
        ("basicConstraints", "pathlen:-1"),
        ("basicConstraints", "CA:"),
        ("extendedKeyUsage", "notAPurpose"),
        ("subjectAltName", "DNS"),
        ("subjectAltName", "IP:300.1.1.1"),
        ("subjectAltName", "dirName:section"),
        ("subjectAltName", "fax:123"),
        ("subjectKeyIdentifier", "XYZ"),
        ("nsComment", "caf\u{e9}"),
        ("basicConstraints", "ASN1:UTF8:x"),
        ("basicConstraints", "DER:3"),
        ("basicConstraints", "DER:0400"),
        ("keyUsage", "DER:3000"),
        ("subjectAltName", "DER:0400"),
        ("subjectKeyIdentifier", "0:102"),
        ("subjectKeyIdentifier", "01::0"),
    ];

    for (name, value) in cases.iter() {
        let res = X509Ext::new(name, false, value, None, None);
        assert!(
            matches!(res, Err(Error::InvalidValue { .. })),
            "{} = {}: {:?}",
            name,
            value,
            res
        );
    }
}

#[test]
fn der_value_for_custom_oid() {
    let ext = X509Ext::new("1.2.3.4", true, "DER:04:02:AB:CD", None, None).unwrap();

    assert!(ext.critical());
    assert_eq!(ext.oid(), &[1, 2, 3, 4]);
    assert_eq!(ext.data(), hex!("04 02 AB CD"));
    assert_eq!(ext.render().unwrap(), "04:02:AB:CD");

    let bc = X509Ext::new("basicConstraints", false, "DER:3000", None, None).unwrap();
    assert_eq!(bc.render().unwrap(), "CA:FALSE");
}

#[test]
fn subject_key_id_hash() {
    let key = ec_key();
    let subject = builder(vec![0x05], "Test CA", "leaf", &key).build();

    let ext = X509Ext::new("subjectKeyIdentifier", false, "hash", Some(&subject), None).unwrap();
    let hash = ring::digest::digest(&ring::digest::SHA1_FOR_LEGACY_USE_ONLY, &key.public);

    assert_eq!(&ext.data()[..2], &hex!("04 14"));
    assert_eq!(&ext.data()[2..], hash.as_ref());

    let missing = X509Ext::new("subjectKeyIdentifier", false, "hash", None, None);
    assert!(matches!(missing, Err(Error::InvalidValue { .. })));

    let literal = X509Ext::new("subjectKeyIdentifier", false, "01:02:03", None, None).unwrap();
    assert_eq!(literal.data(), hex!("04 03 01 02 03"));
    assert_eq!(literal.render().unwrap(), "01:02:03");
}

#[test]
fn authority_key_id_from_issuer() {
    let _ = env_logger::builder().is_test(true).try_init();

    let key = ec_key();
    let ca = ca_cert(&key);
    let keyid = ca.subject_key_id().unwrap();

    let ext = X509Ext::new(
        "authorityKeyIdentifier",
        false,
        "keyid,issuer:always",
        None,
        Some(&ca),
    )
    .unwrap();
    assert_eq!(ext.oid(), AUTHORITY_KEY_IDENTIFIER);

    let expected = format!(
        "keyid:{}, DirName:/C=AU/CN=Test CA, serial:01:02",
        keyid
            .iter()
            .map(|b| format!("{:02X}", b))
            .collect::<Vec<_>>()
            .join(":")
    );
    assert_eq!(ext.render().unwrap(), expected);

    let keyid_only = X509Ext::new("authorityKeyIdentifier", false, "keyid", None, Some(&ca)).unwrap();
    assert!(keyid_only.render().unwrap().starts_with("keyid:"));
    assert!(!keyid_only.render().unwrap().contains("serial"));
}

#[test]
fn authority_key_id_without_issuer_keyid() {
    let key = ec_key();
    let bare = builder(vec![0x03], "Bare CA", "Bare CA", &key).build();

    let ext = X509Ext::new("authorityKeyIdentifier", false, "keyid,issuer", None, Some(&bare)).unwrap();
    assert_eq!(ext.render().unwrap(), "DirName:/C=AU/CN=Bare CA, serial:03");

    let always = X509Ext::new("authorityKeyIdentifier", false, "keyid:always", None, Some(&bare));
    assert!(matches!(always, Err(Error::InvalidValue { .. })));

    let no_issuer = X509Ext::new("authorityKeyIdentifier", false, "keyid", None, None);
    assert!(matches!(no_issuer, Err(Error::InvalidValue { .. })));
}

#[test]
fn copied_names() {
    let key = ec_key();
    let ca = ca_cert(&key);

    let ian = X509Ext::new("issuerAltName", false, "issuer:copy", None, Some(&ca)).unwrap();
    assert_eq!(ian.render().unwrap(), "DNS:ca.example");

    let subject = builder(vec![0x09], "Test CA", "leaf", &key)
        .subject_ia5(registry::EMAIL_ADDRESS.to_vec(), "leaf@example.com")
        .build();
    let san = X509Ext::new(
        "subjectAltName",
        false,
        "email:copy, DNS:leaf.example",
        Some(&subject),
        None,
    )
    .unwrap();
    assert_eq!(
        san.render().unwrap(),
        "email:leaf@example.com, DNS:leaf.example"
    );
}

#[test]
fn malformed_payload() {
    let san = X509Ext::raw(SUBJECT_ALT_NAME.to_vec(), false, hex!("30 03 82").to_vec());
    assert!(matches!(san.render(), Err(Error::Decode { .. })));

    let bc = X509Ext::raw(registry::BASIC_CONSTRAINTS.to_vec(), false, hex!("04 00").to_vec());
    assert!(matches!(bc.render_bytes(), Err(Error::Decode { .. })));
}

#[test]
fn invalid_utf8_render() {
    let der = hex!("30 03 82 01 FF");
    let san = X509Ext::raw(SUBJECT_ALT_NAME.to_vec(), false, der.to_vec());

    assert_eq!(san.render_bytes().unwrap(), b"DNS:\xFF");
    assert!(matches!(san.render(), Err(Error::Decode { .. })));
}

#[test]
fn display_falls_back_to_hex() {
    let malformed = X509Ext::raw(SUBJECT_ALT_NAME.to_vec(), false, hex!("30 03 82").to_vec());
    assert!(malformed.render().is_err());
    assert_eq!(malformed.to_string(), "30:03:82");

    let not_utf8 = X509Ext::raw(SUBJECT_ALT_NAME.to_vec(), false, hex!("30 03 82 01 FF").to_vec());
    assert_eq!(format!("{}", not_utf8), "DNS:\u{FFFD}");

    let bc = X509Ext::raw(registry::BASIC_CONSTRAINTS.to_vec(), false, hex!("04 00").to_vec());
    assert_eq!(bc.to_string(), "04:00");

    let ok = X509Ext::new("subjectAltName", false, "DNS:a.com", None, None).unwrap();
    assert_eq!(ok.to_string(), ok.render().unwrap());
}

#[test]
fn empty_directory_name() {
    let san = X509Ext::raw(SUBJECT_ALT_NAME.to_vec(), false, hex!("30 04 A4 02 30 00").to_vec());
    assert_eq!(san.render().unwrap(), "DirName:");

    let aki = X509Ext::raw(
        AUTHORITY_KEY_IDENTIFIER.to_vec(),
        false,
        hex!("30 06 A1 04 A4 02 30 00").to_vec(),
    );
    assert_eq!(aki.render().unwrap(), "DirName:");
}

#[test]
fn empty_oid_has_a_name() {
    let ext = X509Ext::raw(Vec::new(), false, hex!("05 00").to_vec());

    assert_eq!(ext.short_name(), "UNDEF");
    assert_eq!(ext.render().unwrap(), "05:00");
}

#[test]
fn crl_distribution_point_names() {
    /* nameRelativeToCRLIssuer CN=a */
    let relative = X509Ext::raw(
        registry::CRL_DISTRIBUTION_POINTS.to_vec(),
        false,
        hex!("30 10 30 0E A0 0C A1 0A 30 08 06 03 55 04 03 0C 01 61").to_vec(),
    );
    assert_eq!(relative.render().unwrap(), "Relative Name:<unsupported>");

    /* a full name point followed by one that only names its cRLIssuer */
    let mixed = X509Ext::raw(
        registry::CRL_DISTRIBUTION_POINTS.to_vec(),
        false,
        hex!(
            "30 20 30 16 A0 14 A0 12 86 10 68 74 74 70 3A 2F 2F 61 2E 62 2F 63 2E 63 72 6C"
            "30 06 A2 04 A4 02 30 00"
        )
        .to_vec(),
    );
    assert_eq!(mixed.render().unwrap(), "Full Name: URI:http://a.b/c.crl");
}

#[test]
fn hex_values() {
    let plain = X509Ext::new("subjectKeyIdentifier", false, "0a0B0c", None, None).unwrap();
    let colons = X509Ext::new("subjectKeyIdentifier", false, "0A:0B:0C", None, None).unwrap();

    assert_eq!(plain, colons);
    assert_eq!(plain.render().unwrap(), "0A:0B:0C");
}
