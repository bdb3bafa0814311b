//! Safe accessors over an X.509 certificate object model.
//!
//! [`Certificate`] reads and writes the serial number, validity window,
//! version, names, public key and extensions of a certificate. Field access is
//! routed through a [`shim::Layout`] chosen once per process for the configured
//! toolkit shape, and every value handed out is owned by the caller.
//!
//! ```no_run
//! use x509compat::{cert::name::Name, BigNum, Certificate, PKey};
//!
//! # fn main() -> Result<(), x509compat::errors::X509Error> {
//! let key = PKey::generate()?;
//! let mut name = Name::new();
//! name.add("CN", "example.com")?;
//!
//! let mut cert = Certificate::new()?;
//! cert.set_serial_number(&BigNum::from(1u64))?;
//! cert.set_subject_name(&name)?;
//! cert.set_issuer_name(&name)?;
//! cert.set_pubkey(&key)?;
//! cert.sign(&key, None)?;
//!
//! println!("{}", cert.to_pem()?);
//! # Ok(())
//! # }
//! ```

pub mod bn;
pub mod cert;
pub mod config;
pub mod digest;
pub mod errors;
pub mod objects;
pub mod ownership;
pub mod pkey;
pub mod shim;
pub mod utils;

pub use der;

pub use crate::{
    bn::BigNum,
    cert::{Certificate, Field},
    digest::{Algorithm, Digest},
    errors::{X509Error, X509ErrorKind},
    ownership::{Kind, Owned, Value},
    pkey::PKey,
};
