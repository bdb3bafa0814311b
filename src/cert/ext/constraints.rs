use std::fmt::Display;

use der::{
    oid::{db::rfc5280::ID_CE_BASIC_CONSTRAINTS, AssociatedOid, ObjectIdentifier},
    Decode, Encode,
};

use crate::errors::{X509Error, X509ErrorKind};

use super::{decode_failed, encode_failed, ExtensionCodec};

/// CA flag and optional path length.
///
/// Whether a path length makes sense without the CA flag is left to the
/// caller; the codec encodes whatever it is given.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct BasicConstraints {
    pub ca: bool,
    pub pathlen: Option<u32>,
}

impl AssociatedOid for BasicConstraints {
    const OID: ObjectIdentifier = ID_CE_BASIC_CONSTRAINTS;
}

impl BasicConstraints {
    pub fn new(ca: bool, pathlen: Option<u32>) -> Self {
        Self { ca, pathlen }
    }

    /// Path length, 0 when none is recorded.
    pub fn path_len(self: &Self) -> u32 {
        self.pathlen.unwrap_or(0)
    }

    pub fn duplicate(self: &Self) -> Self {
        *self
    }

    /// Builds the complete encodable value; nothing is replaced on failure.
    fn to_native(self: &Self) -> Result<x509_cert::ext::pkix::BasicConstraints, X509Error> {
        let path_len_constraint = match self.pathlen {
            Some(pathlen) => Some(u8::try_from(pathlen).map_err(|_| {
                X509Error::op(
                    X509ErrorKind::NativeOperation,
                    "ASN1_INTEGER_set",
                    format!("path length {} out of range", pathlen),
                )
            })?),
            None => None,
        };

        Ok(x509_cert::ext::pkix::BasicConstraints {
            ca: self.ca,
            path_len_constraint,
        })
    }
}

impl ExtensionCodec for BasicConstraints {
    fn decode(der: &[u8]) -> Result<Self, X509Error> {
        let native =
            x509_cert::ext::pkix::BasicConstraints::from_der(der).map_err(decode_failed)?;

        Ok(Self {
            ca: native.ca,
            pathlen: native.path_len_constraint.map(u32::from),
        })
    }

    fn encode(self: &Self) -> Result<Vec<u8>, X509Error> {
        self.to_native()?.to_der().map_err(encode_failed)
    }
}

impl Display for BasicConstraints {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CA:{}", match self.ca {
            true => "TRUE",
            false => "FALSE",
        })?;
        if let Some(pathlen) = self.pathlen {
            write!(f, ", pathlen:{}", pathlen)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ca_flag_encodes_as_all_bits_set() {
        let der = BasicConstraints::new(true, Some(2)).encode().unwrap();

        assert_eq!(der, [0x30, 0x06, 0x01, 0x01, 0xff, 0x02, 0x01, 0x02]);
        assert_eq!(BasicConstraints::decode(&der).unwrap(), BasicConstraints::new(true, Some(2)));
    }

    #[test]
    fn false_flag_is_omitted() {
        let der = BasicConstraints::new(false, None).encode().unwrap();
        let decoded = BasicConstraints::decode(&der).unwrap();

        assert_eq!(der, [0x30, 0x00]);
        assert!(!decoded.ca);
        assert_eq!(decoded.path_len(), 0);
    }

    #[test]
    fn pathlen_without_ca_is_encoded() {
        let value = BasicConstraints::new(false, Some(1));

        assert_eq!(BasicConstraints::decode(&value.encode().unwrap()).unwrap(), value);
    }

    #[test]
    fn oversized_pathlen_fails() {
        let err = BasicConstraints::new(true, Some(256)).encode().unwrap_err();

        assert_eq!(err.kind, X509ErrorKind::NativeOperation);
    }
}
