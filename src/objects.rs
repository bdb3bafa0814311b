//! Object identifier database.
//!
//! Extension identifiers arrive either as an [`ObjectIdentifier`] or as text.
//! Text is resolved, in order, against the short and long names below, the
//! `const-oid` database and finally dotted notation.

use std::fmt::Display;

use der::oid::{
    db::{
        rfc5280::{
            ID_CE_AUTHORITY_KEY_IDENTIFIER, ID_CE_BASIC_CONSTRAINTS, ID_CE_CERTIFICATE_POLICIES,
            ID_CE_CRL_DISTRIBUTION_POINTS, ID_CE_EXT_KEY_USAGE, ID_CE_NAME_CONSTRAINTS,
            ID_PE_AUTHORITY_INFO_ACCESS, ID_PE_SUBJECT_INFO_ACCESS,
        },
        rfc5912::{ID_CE_ISSUER_ALT_NAME, ID_CE_SUBJECT_ALT_NAME, ID_CE_SUBJECT_KEY_IDENTIFIER},
        DB,
    },
    ObjectIdentifier,
};

use crate::errors::{X509Error, X509ErrorKind};

pub const ID_CE_KEY_USAGE: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.29.15");
pub const ID_AD_OCSP: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.48.1");
pub const ID_AD_CA_ISSUERS: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.48.2");

/// (short name, long name, identifier)
static OBJECTS: &[(&str, &str, ObjectIdentifier)] = &[
    ("basicConstraints", "X509v3 Basic Constraints", ID_CE_BASIC_CONSTRAINTS),
    ("subjectAltName", "X509v3 Subject Alternative Name", ID_CE_SUBJECT_ALT_NAME),
    ("issuerAltName", "X509v3 Issuer Alternative Name", ID_CE_ISSUER_ALT_NAME),
    ("authorityInfoAccess", "Authority Information Access", ID_PE_AUTHORITY_INFO_ACCESS),
    ("subjectInfoAccess", "Subject Information Access", ID_PE_SUBJECT_INFO_ACCESS),
    ("crlDistributionPoints", "X509v3 CRL Distribution Points", ID_CE_CRL_DISTRIBUTION_POINTS),
    ("keyUsage", "X509v3 Key Usage", ID_CE_KEY_USAGE),
    ("extendedKeyUsage", "X509v3 Extended Key Usage", ID_CE_EXT_KEY_USAGE),
    ("subjectKeyIdentifier", "X509v3 Subject Key Identifier", ID_CE_SUBJECT_KEY_IDENTIFIER),
    ("authorityKeyIdentifier", "X509v3 Authority Key Identifier", ID_CE_AUTHORITY_KEY_IDENTIFIER),
    ("certificatePolicies", "X509v3 Certificate Policies", ID_CE_CERTIFICATE_POLICIES),
    ("nameConstraints", "X509v3 Name Constraints", ID_CE_NAME_CONSTRAINTS),
    ("OCSP", "OCSP", ID_AD_OCSP),
    ("caIssuers", "CA Issuers", ID_AD_CA_ISSUERS),
];

/// An extension or object identifier as supplied by a caller.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Identifier {
    Oid(ObjectIdentifier),
    Text(String),
}

impl From<ObjectIdentifier> for Identifier {
    fn from(value: ObjectIdentifier) -> Self {
        Self::Oid(value)
    }
}

impl From<&ObjectIdentifier> for Identifier {
    fn from(value: &ObjectIdentifier) -> Self {
        Self::Oid(*value)
    }
}

impl From<&str> for Identifier {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for Identifier {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl Display for Identifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Identifier::Oid(oid) => write!(f, "{}", oid),
            Identifier::Text(text) => write!(f, "{}", text),
        }
    }
}

impl Identifier {
    pub fn resolve(self: &Self) -> Result<ObjectIdentifier, X509Error> {
        match self {
            Identifier::Oid(oid) => Ok(*oid),
            Identifier::Text(text) => txt2oid(text),
        }
    }
}

pub fn txt2oid(text: &str) -> Result<ObjectIdentifier, X509Error> {
    if let Some((_, _, oid)) = OBJECTS
        .iter()
        .find(|(short, long, _)| *short == text || *long == text)
    {
        return Ok(*oid);
    }

    if let Some(oid) = DB.by_name(text) {
        return Ok(*oid);
    }

    if text.contains('.') {
        if let Ok(oid) = ObjectIdentifier::new(text) {
            return Ok(oid);
        }
    }

    Err(X509Error {
        kind: X509ErrorKind::UnknownIdentifier,
        message: format!("invalid NID text {}", text),
    })
}

/// Short name of `oid`, falling back to the `const-oid` name and dotted notation.
pub fn oid2txt(oid: &ObjectIdentifier) -> String {
    if let Some((short, _, _)) = OBJECTS.iter().find(|(_, _, candidate)| candidate == oid) {
        return short.to_string();
    }

    match DB.by_oid(oid) {
        Some(name) => name.to_owned(),
        None => oid.to_string(),
    }
}

/// Long name of `oid` where one is known.
pub fn oid2ln(oid: &ObjectIdentifier) -> String {
    match OBJECTS.iter().find(|(_, _, candidate)| candidate == oid) {
        Some((_, long, _)) => long.to_string(),
        None => oid2txt(oid),
    }
}
