use std::{fmt::Display, net::IpAddr, str::FromStr};

use der::{
    asn1::{Ia5String, OctetString},
    oid::ObjectIdentifier,
    Decode, Encode,
};
use x509_cert::ext::pkix::name::GeneralName as NativeGeneralName;

use crate::{
    cert::name::Name,
    errors::{X509Error, X509ErrorKind, X509Result},
    ownership::Owned,
    utils::to_colon_hex,
};

pub type GeneralNames = Vec<GeneralName>;

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum GeneralName {
    Rfc822Name(String),
    DnsName(String),
    UniformResourceIdentifier(String),
    IpAddress(IpAddr),
    DirectoryName(Name),
    RegisteredId(ObjectIdentifier),

    /// Any other form, kept as its DER encoding.
    Other(Vec<u8>),
}

impl GeneralName {
    pub fn uri(self: &Self) -> Option<&str> {
        match self {
            GeneralName::UniformResourceIdentifier(uri) => Some(uri),
            _ => None,
        }
    }

    pub fn dns(self: &Self) -> Option<&str> {
        match self {
            GeneralName::DnsName(dns) => Some(dns),
            _ => None,
        }
    }
}

fn ia5(value: &str) -> Result<Ia5String, X509Error> {
    Ia5String::new(value).map_op_err(X509ErrorKind::NativeOperation, "ASN1_IA5STRING_set")
}

impl TryFrom<&GeneralName> for NativeGeneralName {
    type Error = X509Error;

    fn try_from(value: &GeneralName) -> Result<Self, Self::Error> {
        Ok(match value {
            GeneralName::Rfc822Name(email) => Self::Rfc822Name(ia5(email)?),
            GeneralName::DnsName(dns) => Self::DnsName(ia5(dns)?),
            GeneralName::UniformResourceIdentifier(uri) => Self::UniformResourceIdentifier(ia5(uri)?),
            GeneralName::IpAddress(ip) => {
                let octets = match ip {
                    IpAddr::V4(v4) => v4.octets().to_vec(),
                    IpAddr::V6(v6) => v6.octets().to_vec(),
                };
                Self::IpAddress(OctetString::new(octets).map_unknown_err()?)
            }
            GeneralName::DirectoryName(name) => Self::DirectoryName(name.as_native().clone()),
            GeneralName::RegisteredId(oid) => Self::RegisteredId(*oid),
            GeneralName::Other(der) => {
                Self::from_der(der).map_op_err(X509ErrorKind::Decode, "decode failed")?
            }
        })
    }
}

impl TryFrom<NativeGeneralName> for GeneralName {
    type Error = X509Error;

    fn try_from(value: NativeGeneralName) -> Result<Self, Self::Error> {
        Ok(match value {
            NativeGeneralName::Rfc822Name(email) => Self::Rfc822Name(email.to_string()),
            NativeGeneralName::DnsName(dns) => Self::DnsName(dns.to_string()),
            NativeGeneralName::UniformResourceIdentifier(uri) => {
                Self::UniformResourceIdentifier(uri.to_string())
            }
            NativeGeneralName::DirectoryName(name) => Self::DirectoryName(Name::from_owned(Owned::new(name))),
            NativeGeneralName::RegisteredId(oid) => Self::RegisteredId(oid),
            NativeGeneralName::IpAddress(ref octets) => match octets.as_bytes().len() {
                4 | 16 => {
                    let ip = match <[u8; 4]>::try_from(octets.as_bytes()) {
                        Ok(v4) => IpAddr::from(v4),
                        Err(_) => {
                            let mut v6 = [0u8; 16];
                            v6.copy_from_slice(octets.as_bytes());
                            IpAddr::from(v6)
                        }
                    };
                    Self::IpAddress(ip)
                }
                _ => Self::Other(value.to_der().map_unknown_err()?),
            },
            other => Self::Other(other.to_der().map_unknown_err()?),
        })
    }
}

impl Display for GeneralName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeneralName::Rfc822Name(email) => write!(f, "email:{}", email),
            GeneralName::DnsName(dns) => write!(f, "DNS:{}", dns),
            GeneralName::UniformResourceIdentifier(uri) => write!(f, "URI:{}", uri),
            GeneralName::IpAddress(ip) => write!(f, "IP Address:{}", ip),
            GeneralName::DirectoryName(name) => write!(f, "DirName:{}", name),
            GeneralName::RegisteredId(oid) => write!(f, "Registered ID:{}", oid),
            GeneralName::Other(der) => write!(f, "othername:{}", to_colon_hex(der)),
        }
    }
}

/// Parses the `TYPE:value` form used on command lines and in config files.
impl FromStr for GeneralName {
    type Err = X509Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, value) = s.split_once(':').ok_or_else(|| {
            X509Error::new(
                X509ErrorKind::ArgumentType,
                format!("missing name type in \"{}\"", s),
            )
        })?;

        match kind {
            "email" => Ok(Self::Rfc822Name(value.to_owned())),
            "DNS" => Ok(Self::DnsName(value.to_owned())),
            "URI" => Ok(Self::UniformResourceIdentifier(value.to_owned())),
            "IP" => Ok(Self::IpAddress(
                value.parse().map_app_err(X509ErrorKind::ArgumentType)?,
            )),
            "RID" => Ok(Self::RegisteredId(
                ObjectIdentifier::new(value).map_err(|_| {
                    X509Error::new(
                        X509ErrorKind::UnknownIdentifier,
                        format!("invalid registered id {}", value),
                    )
                })?,
            )),
            _ => Err(X509Error::new(
                X509ErrorKind::ArgumentType,
                format!("unsupported name type {}", kind),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_typed_text() {
        assert_eq!(
            "DNS:example.com".parse::<GeneralName>().unwrap(),
            GeneralName::DnsName("example.com".to_owned())
        );
        assert_eq!(
            "IP:10.0.0.1".parse::<GeneralName>().unwrap().to_string(),
            "IP Address:10.0.0.1"
        );
        assert!("example.com".parse::<GeneralName>().is_err());
        assert!("X400:foo".parse::<GeneralName>().is_err());
    }

    #[test]
    fn native_conversion_keeps_ip_family() {
        for text in ["IP:192.168.1.1", "IP:2001:db8::1"] {
            let name: GeneralName = text.parse().unwrap();
            let native = NativeGeneralName::try_from(&name).unwrap();

            assert_eq!(GeneralName::try_from(native).unwrap(), name);
        }
    }

    #[test]
    fn non_ascii_uri_is_rejected() {
        let name = GeneralName::UniformResourceIdentifier("http://例え.jp".to_owned());
        let err = NativeGeneralName::try_from(&name).unwrap_err();

        assert_eq!(err.kind, X509ErrorKind::NativeOperation);
    }
}
