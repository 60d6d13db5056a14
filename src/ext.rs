use crate::conf::ExtContext;
use crate::general_name::{self, GeneralName};
use crate::x509::X509;
use crate::{asn, registry, Error};
use std::borrow::Cow;
use std::fmt;

const CRITICAL: &str = "critical,";

/// A single X509v3 extension: type, critical flag and DER payload.
///
/// The payload is either owned by the extension or borrowed from the
/// certificate it was read from, see [`X509Ext::owns_data`].
#[derive(Debug, Clone, PartialEq)]
pub struct X509Ext<'a> {
    oid: Vec<u64>,
    critical: bool,
    data: Cow<'a, [u8]>,
}

impl X509Ext<'static> {
    /// Builds an extension from the textual configuration form of its value,
    /// e.g. `("basicConstraints", true, "CA:TRUE,pathlen:0")`.
    ///
    /// `subject` and `issuer` are only read during the call, by values such
    /// as `subjectKeyIdentifier = hash` or `authorityKeyIdentifier = keyid`.
    pub fn new(
        type_name: &str,
        critical: bool,
        value: &str,
        subject: Option<&X509>,
        issuer: Option<&X509>,
    ) -> Result<X509Ext<'static>, Error> {
        let ctx = ExtContext { subject, issuer };
        let value = with_critical(critical, value)?;

        let ext = registry::text_to_der(type_name, &value, &ctx).map_err(|e| {
            log::debug!("unable to encode {} extension: {}", type_name, e);
            e
        })?;

        log::debug!(
            "encoded {} extension: {} bytes, critical={}",
            ext.short_name(),
            ext.data.len(),
            ext.critical
        );

        Ok(ext)
    }

    /// An extension around an already encoded payload.
    pub fn raw(oid: Vec<u64>, critical: bool, data: Vec<u8>) -> X509Ext<'static> {
        X509Ext {
            oid,
            critical,
            data: Cow::Owned(data),
        }
    }
}

/// The grammar carries criticality inside the value.
fn with_critical(critical: bool, value: &str) -> Result<Cow<'_, str>, Error> {
    if !critical {
        return Ok(Cow::Borrowed(value));
    }

    let mut s = String::new();
    s.try_reserve_exact(CRITICAL.len() + value.len())?;
    s.push_str(CRITICAL);
    s.push_str(value);

    Ok(Cow::Owned(s))
}

impl<'a> X509Ext<'a> {
    pub(crate) fn borrowed(oid: &[u64], critical: bool, data: &'a [u8]) -> X509Ext<'a> {
        X509Ext {
            oid: oid.to_vec(),
            critical,
            data: Cow::Borrowed(data),
        }
    }

    pub fn critical(&self) -> bool {
        self.critical
    }

    pub fn oid(&self) -> &[u64] {
        &self.oid
    }

    pub fn short_name(&self) -> Cow<'static, str> {
        registry::oid_to_short_name(&self.oid)
    }

    /// The DER encoded extension value.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// False for views into a certificate's extension list.
    pub fn owns_data(&self) -> bool {
        matches!(self.data, Cow::Owned(_))
    }

    pub fn into_owned(self) -> X509Ext<'static> {
        X509Ext {
            oid: self.oid,
            critical: self.critical,
            data: Cow::Owned(self.data.into_owned()),
        }
    }

    /// The text form of the value, byte for byte as written. Names in a
    /// subjectAltName keep embedded NUL bytes.
    pub fn render_bytes(&self) -> Result<Vec<u8>, Error> {
        let mut out = Vec::new();

        if self.oid == registry::SUBJECT_ALT_NAME {
            print_subject_alt_name(&mut out, self)?;
        } else {
            registry::generic_print(&mut out, self)?;
        }

        Ok(out)
    }

    pub fn render(&self) -> Result<String, Error> {
        String::from_utf8(self.render_bytes()?).map_err(|e| Error::decode(&self.short_name(), e))
    }
}

/// Email, DNS and URI names are copied with their exact length instead of
/// going through the generic printer.
fn print_subject_alt_name(out: &mut Vec<u8>, ext: &X509Ext<'_>) -> Result<(), Error> {
    let names = registry::decode_general_names(ext)?;

    for (i, name) in names.iter().enumerate() {
        if i > 0 {
            out.extend_from_slice(b", ");
        }

        match name {
            GeneralName::Email(s) => {
                out.extend_from_slice(b"email:");
                out.extend_from_slice(s);
            }
            GeneralName::Dns(s) => {
                out.extend_from_slice(b"DNS:");
                out.extend_from_slice(s);
            }
            GeneralName::Uri(s) => {
                out.extend_from_slice(b"URI:");
                out.extend_from_slice(s);
            }
            _ => general_name::print(out, name),
        }
    }

    Ok(())
}

/// Lossy text form. A payload that does not decode is shown as a colon hex
/// dump; use [`X509Ext::render`] to see the error.
impl fmt::Display for X509Ext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.render_bytes() {
            Ok(bytes) => f.write_str(&String::from_utf8_lossy(&bytes)),
            Err(e) => {
                log::debug!("showing {} as hex: {}", self.short_name(), e);
                f.write_str(&asn::hex_colon(&self.data))
            }
        }
    }
}
