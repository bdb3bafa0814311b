//! Typed extension values and their codecs.
//!
//! Each type converts between its typed form and the DER bytes stored in an
//! [`X509Extension`]. Decoded values own their elements outright.

use std::fmt::Display;

use crate::errors::{X509Error, X509ErrorKind};

pub mod constraints;
pub mod crl;
pub mod name;

mod access;
mod altname;
mod extension;

pub use access::{AccessDescription, InfoAccess};
pub use altname::AltName;
pub use der::oid::AssociatedOid;
pub use extension::X509Extension;

/// Conversion between a typed extension value and its encoded form.
pub trait ExtensionCodec: Sized {
    fn decode(der: &[u8]) -> Result<Self, X509Error>;

    fn encode(self: &Self) -> Result<Vec<u8>, X509Error>;
}

pub(crate) fn decode_failed(err: impl Display) -> X509Error {
    X509Error::op(X509ErrorKind::Decode, "decode failed", err)
}

pub(crate) fn encode_failed(err: impl Display) -> X509Error {
    X509Error::op(X509ErrorKind::NativeOperation, "encode failed", err)
}
