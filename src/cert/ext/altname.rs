use std::fmt::Display;

use der::{Decode, Encode};
use x509_cert::ext::pkix::name::GeneralName as NativeGeneralName;

use crate::errors::X509Error;

use super::{decode_failed, encode_failed, name::GeneralName, ExtensionCodec};

/// Subject or issuer alternative names.
///
/// The same value serves both extensions; the certificate accessor picks the
/// identifier.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct AltName(Vec<GeneralName>);

impl AltName {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(self: &mut Self, name: GeneralName) -> &mut Self {
        self.0.push(name);
        self
    }

    pub fn get(self: &Self, index: usize) -> Option<&GeneralName> {
        self.0.get(index)
    }

    pub fn iter(self: &Self) -> std::slice::Iter<'_, GeneralName> {
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

    pub fn dns_names(self: &Self) -> Vec<&str> {
        self.0.iter().filter_map(GeneralName::dns).collect()
    }
}

impl FromIterator<GeneralName> for AltName {
    fn from_iter<I: IntoIterator<Item = GeneralName>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a AltName {
    type Item = &'a GeneralName;
    type IntoIter = std::slice::Iter<'a, GeneralName>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl ExtensionCodec for AltName {
    fn decode(der: &[u8]) -> Result<Self, X509Error> {
        Vec::<NativeGeneralName>::from_der(der)
            .map_err(decode_failed)?
            .into_iter()
            .map(GeneralName::try_from)
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }

    fn encode(self: &Self) -> Result<Vec<u8>, X509Error> {
        let names = self
            .0
            .iter()
            .map(NativeGeneralName::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        names.to_der().map_err(encode_failed)
    }
}

impl Display for AltName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names = self
            .0
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<String>>()
            .join(", ");
        write!(f, "{}", names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codec_keeps_order() {
        let names: AltName = ["DNS:a.example", "URI:http://b.example/", "IP:127.0.0.1"]
            .iter()
            .map(|v| v.parse().unwrap())
            .collect();

        let decoded = AltName::decode(&names.encode().unwrap()).unwrap();

        assert_eq!(decoded, names);
        assert_eq!(decoded.get(1).and_then(GeneralName::uri), Some("http://b.example/"));
        assert_eq!(decoded.get(3), None);
        assert_eq!(decoded.dns_names(), vec!["a.example"]);
    }

    #[test]
    fn garbage_fails_to_decode() {
        let err = AltName::decode(&[0x04, 0x01, 0x00]).unwrap_err();

        assert_eq!(err.kind, crate::errors::X509ErrorKind::Decode);
        assert!(err.message.starts_with("decode failed"));
    }
}
