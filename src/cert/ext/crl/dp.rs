use std::fmt::Display;

pub use x509_cert::ext::pkix::crl::dp::ReasonFlags;
use x509_cert::{
    ext::pkix::name::{
        DistributionPointName as NativeDistributionPointName, GeneralName as NativeGeneralName,
    },
    name::RdnSequence,
};

use crate::{
    cert::{
        ext::name::{GeneralName, GeneralNames},
        name::Name,
    },
    errors::{X509Error, X509ErrorKind},
    ownership::Owned,
    utils::IndentString,
};

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DistributionPointName {
    FullName(GeneralNames),

    /// Holds a single RDN relative to the CRL issuer.
    RelativeToIssuer(Name),
}

impl TryFrom<NativeDistributionPointName> for DistributionPointName {
    type Error = X509Error;

    fn try_from(value: NativeDistributionPointName) -> Result<Self, Self::Error> {
        match value {
            NativeDistributionPointName::FullName(names) => Ok(Self::FullName(
                names
                    .into_iter()
                    .map(GeneralName::try_from)
                    .collect::<Result<Vec<_>, _>>()?,
            )),
            NativeDistributionPointName::NameRelativeToCRLIssuer(rdn) => Ok(
                Self::RelativeToIssuer(Name::from_owned(Owned::new(RdnSequence(vec![rdn])))),
            ),
        }
    }
}

impl TryFrom<&DistributionPointName> for NativeDistributionPointName {
    type Error = X509Error;

    fn try_from(value: &DistributionPointName) -> Result<Self, Self::Error> {
        match value {
            DistributionPointName::FullName(names) => Ok(Self::FullName(
                names
                    .iter()
                    .map(NativeGeneralName::try_from)
                    .collect::<Result<Vec<_>, _>>()?,
            )),
            DistributionPointName::RelativeToIssuer(name) => match name.as_native().0.as_slice() {
                [rdn] => Ok(Self::NameRelativeToCRLIssuer(rdn.clone())),
                _ => Err(X509Error::new(
                    X509ErrorKind::ArgumentType,
                    "relative distribution point name must hold exactly one RDN",
                )),
            },
        }
    }
}

impl Display for DistributionPointName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DistributionPointName::FullName(names) => {
                writeln!(f, "Full Name:")?;
                let names = names
                    .iter()
                    .map(|v| v.to_string())
                    .collect::<Vec<String>>()
                    .join("\n");
                write!(f, "{}", names.indent(4))
            }
            DistributionPointName::RelativeToIssuer(name) => {
                writeln!(f, "Name Relative To CRL Issuer:")?;
                write!(f, "{}", name.to_string().indent(4))
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DistributionPoint {
    pub name: Option<DistributionPointName>,
    pub reasons: Option<ReasonFlags>,
    pub crl_issuer: Option<GeneralNames>,
}

impl DistributionPoint {
    pub fn from_uri(uri: &str) -> Self {
        Self {
            name: Some(DistributionPointName::FullName(vec![
                GeneralName::UniformResourceIdentifier(uri.to_owned()),
            ])),
            reasons: None,
            crl_issuer: None,
        }
    }

    pub fn uris(self: &Self) -> Vec<String> {
        match &self.name {
            Some(DistributionPointName::FullName(names)) => names
                .iter()
                .filter_map(GeneralName::uri)
                .map(str::to_owned)
                .collect(),
            _ => vec![],
        }
    }
}

impl TryFrom<x509_cert::ext::pkix::crl::dp::DistributionPoint> for DistributionPoint {
    type Error = X509Error;

    fn try_from(value: x509_cert::ext::pkix::crl::dp::DistributionPoint) -> Result<Self, Self::Error> {
        Ok(Self {
            name: value
                .distribution_point
                .map(DistributionPointName::try_from)
                .transpose()?,
            reasons: value.reasons,
            crl_issuer: value
                .crl_issuer
                .map(|names| {
                    names
                        .into_iter()
                        .map(GeneralName::try_from)
                        .collect::<Result<Vec<_>, _>>()
                })
                .transpose()?,
        })
    }
}

impl TryFrom<&DistributionPoint> for x509_cert::ext::pkix::crl::dp::DistributionPoint {
    type Error = X509Error;

    fn try_from(value: &DistributionPoint) -> Result<Self, Self::Error> {
        Ok(Self {
            distribution_point: value
                .name
                .as_ref()
                .map(NativeDistributionPointName::try_from)
                .transpose()?,
            reasons: value.reasons,
            crl_issuer: value
                .crl_issuer
                .as_ref()
                .map(|names| {
                    names
                        .iter()
                        .map(NativeGeneralName::try_from)
                        .collect::<Result<Vec<_>, _>>()
                })
                .transpose()?,
        })
    }
}

impl Display for DistributionPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.name {
            Some(vv) => write!(f, "{}", vv),
            None => match &self.crl_issuer {
                Some(vv) => write!(
                    f,
                    "CRL Issuer: {}",
                    vv.iter()
                        .map(|v| v.to_string())
                        .collect::<Vec<String>>()
                        .join(", ")
                ),
                None => write!(f, "None"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use x509_cert::ext::pkix::crl::dp::Reasons;

    use crate::cert::ext::{crl::DistributionPoints, ExtensionCodec};

    use super::*;

    fn round_trip(point: DistributionPoint) -> DistributionPoint {
        let points: DistributionPoints = [point].into_iter().collect();
        let decoded = DistributionPoints::decode(&points.encode().unwrap()).unwrap();

        decoded.get(0).unwrap().clone()
    }

    #[test]
    fn relative_name_round_trip() {
        let mut rdn = Name::new();
        rdn.add("CN", "CRL1").unwrap();
        let point = DistributionPoint {
            name: Some(DistributionPointName::RelativeToIssuer(rdn)),
            reasons: None,
            crl_issuer: None,
        };

        let decoded = round_trip(point.clone());

        assert_eq!(decoded, point);
        assert!(decoded.uris().is_empty());
        assert_eq!(
            decoded.to_string(),
            "Name Relative To CRL Issuer:\n    CN=CRL1"
        );
    }

    #[test]
    fn relative_name_needs_one_rdn() {
        let mut rdns = Name::new();
        rdns.add("CN", "CRL1").unwrap().add("O", "Example").unwrap();
        let name = DistributionPointName::RelativeToIssuer(rdns);

        let err = NativeDistributionPointName::try_from(&name).unwrap_err();
        assert_eq!(err.kind, X509ErrorKind::ArgumentType);

        let points: DistributionPoints = [DistributionPoint {
            name: Some(name),
            reasons: None,
            crl_issuer: None,
        }]
        .into_iter()
        .collect();
        assert_eq!(points.encode().unwrap_err().kind, X509ErrorKind::ArgumentType);
    }

    #[test]
    fn reasons_and_issuer_survive() {
        let mut issuer = Name::new();
        issuer.add("CN", "Example CA").unwrap();
        let point = DistributionPoint {
            name: Some(DistributionPointName::FullName(vec![
                GeneralName::UniformResourceIdentifier("http://crl.example/ca.crl".to_owned()),
            ])),
            reasons: Some(Reasons::KeyCompromise | Reasons::CaCompromise),
            crl_issuer: Some(vec![GeneralName::DirectoryName(issuer)]),
        };

        let decoded = round_trip(point.clone());

        assert_eq!(decoded, point);
        assert_eq!(decoded.uris(), vec!["http://crl.example/ca.crl"]);
        let reasons = decoded.reasons.unwrap();
        assert!(reasons.contains(Reasons::KeyCompromise));
        assert!(!reasons.contains(Reasons::AffiliationChanged));
    }
}
