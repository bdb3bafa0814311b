use std::{fmt::Display, str::FromStr};

use crate::{
    errors::{X509Error, X509ErrorKind},
    ownership::Kind,
};

/// Certificate fields reachable through [`Certificate::get`](super::Certificate::get)
/// and [`Certificate::set`](super::Certificate::set).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Field {
    SerialNumber,
    NotBefore,
    NotAfter,
    Version,
    Pubkey,
    SubjectName,
    IssuerName,
    SubjectAltName,
    IssuerAltName,
    BasicConstraints,
    InfoAccess,
    CrlDistributionPoints,
}

static FIELDS: [(Field, &str, Kind); 12] = [
    (Field::SerialNumber, "serial_number", Kind::BigNum),
    (Field::NotBefore, "not_before", Kind::Time),
    (Field::NotAfter, "not_after", Kind::Time),
    (Field::Version, "version", Kind::Version),
    (Field::Pubkey, "pubkey", Kind::PKey),
    (Field::SubjectName, "subject_name", Kind::Name),
    (Field::IssuerName, "issuer_name", Kind::Name),
    (Field::SubjectAltName, "subject_alt_name", Kind::AltName),
    (Field::IssuerAltName, "issuer_alt_name", Kind::AltName),
    (Field::BasicConstraints, "basic_constraints", Kind::BasicConstraints),
    (Field::InfoAccess, "info_access", Kind::InfoAccess),
    (
        Field::CrlDistributionPoints,
        "crl_distribution_points",
        Kind::DistributionPoints,
    ),
];

impl Field {
    fn entry(self: Self) -> &'static (Field, &'static str, Kind) {
        FIELDS
            .iter()
            .find(|(field, _, _)| *field == self)
            .unwrap_or_else(|| unreachable!("{:?} missing from the field table", self))
    }

    pub fn name(self: Self) -> &'static str {
        self.entry().1
    }

    /// Kind of value the field holds.
    pub fn kind(self: Self) -> Kind {
        self.entry().2
    }

    pub fn all() -> impl Iterator<Item = Field> {
        FIELDS.iter().map(|(field, _, _)| *field)
    }
}

impl Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Field {
    type Err = X509Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FIELDS
            .iter()
            .find(|(_, name, _)| *name == s)
            .map(|(field, _, _)| *field)
            .ok_or_else(|| {
                X509Error::new(X509ErrorKind::ArgumentType, format!("unknown field {}", s))
            })
    }
}
