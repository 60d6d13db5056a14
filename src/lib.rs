//! X509v3 certificate extensions: encoding from the OpenSSL style text
//! form, decoding and printing.
//!
//! ```
//! use x509_ext::X509Ext;
//!
//! let bc = X509Ext::new("basicConstraints", true, "CA:TRUE,pathlen:0", None, None)?;
//! assert!(bc.critical());
//! assert_eq!(bc.render()?, "CA:TRUE, pathlen:0");
//! # Ok::<(), x509_ext::Error>(())
//! ```
//!
//! The library is based on simple_asn1: https://crates.io/crates/simple_asn1

mod asn;
pub mod conf;
pub mod error;
pub mod ext;
pub mod general_name;
pub mod name;
pub mod registry;
pub mod value;
pub mod x509;

pub use conf::ExtContext;
pub use error::Error;
pub use ext::X509Ext;
pub use general_name::GeneralName;
pub use name::{OidStr, X509Name};
pub use value::{AuthorityKeyId, DistPointName, ExtValue, NamedBit};
pub use x509::*;
