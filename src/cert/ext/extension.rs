use std::fmt::Display;

use der::{
    asn1::OctetString,
    oid::{
        db::{
            rfc5280::{ID_CE_BASIC_CONSTRAINTS, ID_CE_CRL_DISTRIBUTION_POINTS, ID_PE_AUTHORITY_INFO_ACCESS},
            rfc5912::{ID_CE_ISSUER_ALT_NAME, ID_CE_SUBJECT_ALT_NAME},
        },
        AssociatedOid, ObjectIdentifier,
    },
};
use x509_cert::ext::Extension;

use crate::{
    errors::{X509Error, X509ErrorKind, X509Result},
    objects::{oid2ln, oid2txt, Identifier},
    ownership::{Duplicate, Owned},
    utils::{to_colon_hex, IndentString},
};

use super::{
    constraints::BasicConstraints, crl::DistributionPoints, AltName, ExtensionCodec, InfoAccess,
};

/// An extension record: identifier, encoded value and critical flag.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct X509Extension(Owned<Extension>);

impl X509Extension {
    /// Record with an already encoded `value`.
    pub fn new(id: impl Into<Identifier>, value: &[u8], critical: bool) -> Result<Self, X509Error> {
        let oid = id.into().resolve()?;

        Self::from_parts(oid, value.to_vec(), critical)
    }

    /// Encodes `value` under its own identifier.
    pub fn from_typed<T>(value: &T, critical: bool) -> Result<Self, X509Error>
    where
        T: ExtensionCodec + AssociatedOid,
    {
        Self::encode_as(T::OID, value, critical)
    }

    /// Encodes `value` under `oid`, for types that serve more than one extension.
    pub fn encode_as<T: ExtensionCodec>(
        oid: ObjectIdentifier,
        value: &T,
        critical: bool,
    ) -> Result<Self, X509Error> {
        Self::from_parts(oid, value.encode()?, critical)
    }

    fn from_parts(oid: ObjectIdentifier, value: Vec<u8>, critical: bool) -> Result<Self, X509Error> {
        let extn_value = OctetString::new(value)
            .map_op_err(X509ErrorKind::Allocation, "X509_EXTENSION_create_by_OBJ")?;

        Ok(Self(Owned::new(Extension {
            extn_id: oid,
            critical,
            extn_value,
        })))
    }

    pub(crate) fn from_owned(owned: Owned<Extension>) -> Self {
        Self(owned)
    }

    pub(crate) fn as_native(self: &Self) -> &Extension {
        &self.0
    }

    pub fn oid(self: &Self) -> ObjectIdentifier {
        self.0.extn_id
    }

    /// Short name of the identifier.
    pub fn name(self: &Self) -> String {
        oid2txt(&self.0.extn_id)
    }

    pub fn critical(self: &Self) -> bool {
        self.0.critical
    }

    pub fn set_critical(self: &mut Self, critical: bool) {
        self.0.critical = critical;
    }

    /// The encoded value.
    pub fn value(self: &Self) -> &[u8] {
        self.0.extn_value.as_bytes()
    }

    pub fn decode<T: ExtensionCodec>(self: &Self) -> Result<T, X509Error> {
        T::decode(self.value())
    }

    pub fn duplicate(self: &Self) -> Result<Self, X509Error> {
        Ok(Self(Owned::new(self.as_native().duplicate()?)))
    }

    fn describe_value(self: &Self) -> String {
        let described = match self.oid() {
            ID_CE_SUBJECT_ALT_NAME | ID_CE_ISSUER_ALT_NAME => {
                self.decode::<AltName>().map(|v| v.to_string())
            }
            ID_CE_BASIC_CONSTRAINTS => self.decode::<BasicConstraints>().map(|v| v.to_string()),
            ID_PE_AUTHORITY_INFO_ACCESS => self.decode::<InfoAccess>().map(|v| v.to_string()),
            ID_CE_CRL_DISTRIBUTION_POINTS => {
                self.decode::<DistributionPoints>().map(|v| v.to_string())
            }
            _ => Ok(to_colon_hex(self.value())),
        };

        described.unwrap_or_else(|_| to_colon_hex(self.value()))
    }
}

impl Display for X509Extension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.critical() {
            true => writeln!(f, "{}: critical", oid2ln(&self.oid()))?,
            false => writeln!(f, "{}:", oid2ln(&self.oid()))?,
        }
        write!(f, "{}", self.describe_value().indent(4))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn textual_and_numeric_ids_agree() {
        let by_text = X509Extension::new("basicConstraints", &[0x30, 0x00], true).unwrap();
        let by_oid = X509Extension::new(ID_CE_BASIC_CONSTRAINTS, &[0x30, 0x00], true).unwrap();

        assert_eq!(by_text, by_oid);
        assert_eq!(by_text.name(), "basicConstraints");
    }

    #[test]
    fn unknown_text_id_fails() {
        let err = X509Extension::new("noSuchExtension", &[], false).unwrap_err();

        assert_eq!(err.kind, X509ErrorKind::UnknownIdentifier);
    }

    #[test]
    fn typed_round_trip() {
        let ext = X509Extension::from_typed(&BasicConstraints::new(true, Some(0)), false).unwrap();

        assert_eq!(ext.oid(), ID_CE_BASIC_CONSTRAINTS);
        assert_eq!(
            ext.decode::<BasicConstraints>().unwrap(),
            BasicConstraints::new(true, Some(0))
        );
        assert_eq!(
            ext.to_string(),
            "X509v3 Basic Constraints:\n    CA:TRUE, pathlen:0"
        );
    }

    #[test]
    fn duplicate_is_independent() {
        let mut ext = X509Extension::new("2.5.29.19", &[0x30, 0x00], false).unwrap();
        let copy = ext.duplicate().unwrap();

        ext.set_critical(true);

        assert!(!copy.critical());
        assert!(ext.critical());
    }
}
