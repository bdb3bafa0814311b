use std::fmt::Display;

use der::{
    oid::{db::rfc5280::ID_CE_CRL_DISTRIBUTION_POINTS, AssociatedOid, ObjectIdentifier},
    Decode, Encode,
};

use crate::errors::X509Error;

use super::{decode_failed, encode_failed, ExtensionCodec};

pub mod dp;

pub use dp::{DistributionPoint, DistributionPointName, ReasonFlags};

/// CRL distribution points.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct DistributionPoints(Vec<DistributionPoint>);

impl AssociatedOid for DistributionPoints {
    const OID: ObjectIdentifier = ID_CE_CRL_DISTRIBUTION_POINTS;
}

impl DistributionPoints {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(self: &mut Self, point: DistributionPoint) -> &mut Self {
        self.0.push(point);
        self
    }

    pub fn get(self: &Self, index: usize) -> Option<&DistributionPoint> {
        self.0.get(index)
    }

    pub fn iter(self: &Self) -> std::slice::Iter<'_, DistributionPoint> {
        self.0.iter()
    }

    pub fn len(self: &Self) -> usize {
        self.0.len()
    }

    pub fn is_empty(self: &Self) -> bool {
        self.0.is_empty()
    }

    pub fn duplicate(self: &Self) -> Self {
        self.clone()
    }

    /// Full-name URIs across all points, in order.
    pub fn uris(self: &Self) -> Vec<String> {
        self.0.iter().flat_map(DistributionPoint::uris).collect()
    }
}

impl FromIterator<DistributionPoint> for DistributionPoints {
    fn from_iter<I: IntoIterator<Item = DistributionPoint>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a DistributionPoints {
    type Item = &'a DistributionPoint;
    type IntoIter = std::slice::Iter<'a, DistributionPoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl ExtensionCodec for DistributionPoints {
    fn decode(der: &[u8]) -> Result<Self, X509Error> {
        x509_cert::ext::pkix::CrlDistributionPoints::from_der(der)
            .map_err(decode_failed)?
            .0
            .into_iter()
            .map(DistributionPoint::try_from)
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }

    fn encode(self: &Self) -> Result<Vec<u8>, X509Error> {
        let points = self
            .0
            .iter()
            .map(x509_cert::ext::pkix::crl::dp::DistributionPoint::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        x509_cert::ext::pkix::CrlDistributionPoints(points)
            .to_der()
            .map_err(encode_failed)
    }
}

impl Display for DistributionPoints {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            self.0
                .iter()
                .map(|v| v.to_string())
                .collect::<Vec<String>>()
                .join("\n")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uris_flatten_full_names() {
        let points: DistributionPoints = [
            DistributionPoint::from_uri("http://crl.example/a.crl"),
            DistributionPoint::from_uri("http://crl.example/b.crl"),
        ]
        .into_iter()
        .collect();

        let decoded = DistributionPoints::decode(&points.encode().unwrap()).unwrap();

        assert_eq!(decoded, points);
        assert_eq!(
            decoded.uris(),
            vec!["http://crl.example/a.crl", "http://crl.example/b.crl"]
        );
    }

    #[test]
    fn empty_points() {
        let points = DistributionPoints::new();

        assert!(points.uris().is_empty());
        assert!(points.get(0).is_none());
    }
}
