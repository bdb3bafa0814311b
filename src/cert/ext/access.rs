use std::fmt::Display;

use der::{
    oid::{db::rfc5280::ID_PE_AUTHORITY_INFO_ACCESS, AssociatedOid, ObjectIdentifier},
    Decode, Encode,
};

use crate::{
    errors::X509Error,
    objects::{oid2ln, ID_AD_CA_ISSUERS, ID_AD_OCSP},
    utils::IndentString,
};

use super::{decode_failed, encode_failed, name::GeneralName, ExtensionCodec};

/// Authority information access.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct InfoAccess(Vec<AccessDescription>);

impl AssociatedOid for InfoAccess {
    const OID: ObjectIdentifier = ID_PE_AUTHORITY_INFO_ACCESS;
}

impl InfoAccess {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(self: &mut Self, description: AccessDescription) -> &mut Self {
        self.0.push(description);
        self
    }

    pub fn get(self: &Self, index: usize) -> Option<&AccessDescription> {
        self.0.get(index)
    }

    pub fn iter(self: &Self) -> std::slice::Iter<'_, AccessDescription> {
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

    /// URIs of every entry with the given access method, in order.
    pub fn uris(self: &Self, method: ObjectIdentifier) -> Vec<String> {
        self.0
            .iter()
            .filter(|ad| ad.method == method)
            .filter_map(|ad| ad.location.uri())
            .map(str::to_owned)
            .collect()
    }

    pub fn ocsp_uris(self: &Self) -> Vec<String> {
        self.uris(ID_AD_OCSP)
    }

    pub fn ca_issuers_uris(self: &Self) -> Vec<String> {
        self.uris(ID_AD_CA_ISSUERS)
    }
}

impl FromIterator<AccessDescription> for InfoAccess {
    fn from_iter<I: IntoIterator<Item = AccessDescription>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a InfoAccess {
    type Item = &'a AccessDescription;
    type IntoIter = std::slice::Iter<'a, AccessDescription>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl ExtensionCodec for InfoAccess {
    fn decode(der: &[u8]) -> Result<Self, X509Error> {
        x509_cert::ext::pkix::AuthorityInfoAccessSyntax::from_der(der)
            .map_err(decode_failed)?
            .0
            .into_iter()
            .map(AccessDescription::try_from)
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }

    fn encode(self: &Self) -> Result<Vec<u8>, X509Error> {
        let descriptions = self
            .0
            .iter()
            .map(x509_cert::ext::pkix::AccessDescription::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        x509_cert::ext::pkix::AuthorityInfoAccessSyntax(descriptions)
            .to_der()
            .map_err(encode_failed)
    }
}

impl Display for InfoAccess {
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

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AccessDescription {
    pub method: ObjectIdentifier,
    pub location: GeneralName,
}

impl AccessDescription {
    pub fn new(method: ObjectIdentifier, location: GeneralName) -> Self {
        Self { method, location }
    }

    pub fn ocsp(uri: &str) -> Self {
        Self::new(ID_AD_OCSP, GeneralName::UniformResourceIdentifier(uri.to_owned()))
    }

    pub fn ca_issuers(uri: &str) -> Self {
        Self::new(
            ID_AD_CA_ISSUERS,
            GeneralName::UniformResourceIdentifier(uri.to_owned()),
        )
    }
}

impl TryFrom<x509_cert::ext::pkix::AccessDescription> for AccessDescription {
    type Error = X509Error;

    fn try_from(value: x509_cert::ext::pkix::AccessDescription) -> Result<Self, Self::Error> {
        Ok(Self {
            method: value.access_method,
            location: value.access_location.try_into()?,
        })
    }
}

impl TryFrom<&AccessDescription> for x509_cert::ext::pkix::AccessDescription {
    type Error = X509Error;

    fn try_from(value: &AccessDescription) -> Result<Self, Self::Error> {
        Ok(Self {
            access_method: value.method,
            access_location: (&value.location).try_into()?,
        })
    }
}

impl Display for AccessDescription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{} -", oid2ln(&self.method))?;
        write!(f, "{}", self.location.to_string().indent(4))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ocsp_uris_skip_other_methods() {
        let access: InfoAccess = [
            AccessDescription::ca_issuers("http://ca.example/root.crt"),
            AccessDescription::ocsp("http://ocsp.example"),
            AccessDescription::ocsp("http://ocsp2.example"),
        ]
        .into_iter()
        .collect();

        let decoded = InfoAccess::decode(&access.encode().unwrap()).unwrap();

        assert_eq!(decoded.len(), 3);
        assert_eq!(
            decoded.ocsp_uris(),
            vec!["http://ocsp.example", "http://ocsp2.example"]
        );
        assert_eq!(decoded.ca_issuers_uris(), vec!["http://ca.example/root.crt"]);
    }

    #[test]
    fn display_names_the_method() {
        let access: InfoAccess = [AccessDescription::ocsp("http://ocsp.example")]
            .into_iter()
            .collect();

        assert_eq!(access.to_string(), "OCSP -\n    URI:http://ocsp.example");
    }
}
