//! Process configuration.
//!
//! Values come from the environment and are read once per process through
//! [`global`]. The toolkit version decides which accessor shape the
//! [`shim`](crate::shim) hands out, so it must be settled before the first
//! certificate is created.

use std::{env, sync::OnceLock};

use crate::errors::{X509Error, X509ErrorKind};

pub const ENV_TOOLKIT_VERSION: &str = "X509_COMPAT_TOOLKIT_VERSION";
pub const ENV_DIGEST: &str = "X509_COMPAT_DIGEST";
pub const ENV_SIGN_DIGEST: &str = "X509_COMPAT_SIGN_DIGEST";
pub const ENV_RSA_BITS: &str = "X509_COMPAT_RSA_BITS";

/// Version number reported by the toolkit build this crate links against.
pub const LINKED_TOOLKIT_VERSION: u64 = 0x3000_0020;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Config {
    /// Numeric toolkit version, `0xMNNFFPPS` style.
    pub toolkit_version: u64,

    /// Digest used by fingerprint operations when none is named.
    pub default_digest: String,

    /// Digest used when signing without an explicit digest.
    pub sign_digest: String,

    /// Modulus size for freshly generated RSA keys.
    pub rsa_bits: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            toolkit_version: LINKED_TOOLKIT_VERSION,
            default_digest: "sha1".to_owned(),
            sign_digest: "sha256".to_owned(),
            rsa_bits: 2048,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, X509Error> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, X509Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup(ENV_TOOLKIT_VERSION) {
            config.toolkit_version = parse_version(&value).ok_or_else(|| {
                X509Error::new(
                    X509ErrorKind::InvalidConfig,
                    format!("{}: not a version number: {}", ENV_TOOLKIT_VERSION, value),
                )
            })?;
        }
        if let Some(value) = lookup(ENV_DIGEST) {
            config.default_digest = value;
        }
        if let Some(value) = lookup(ENV_SIGN_DIGEST) {
            config.sign_digest = value;
        }
        if let Some(value) = lookup(ENV_RSA_BITS) {
            config.rsa_bits = value.trim().parse().map_err(|_| {
                X509Error::new(
                    X509ErrorKind::InvalidConfig,
                    format!("{}: not a bit count: {}", ENV_RSA_BITS, value),
                )
            })?;
        }

        Ok(config)
    }
}

fn parse_version(value: &str) -> Option<u64> {
    let value = value.trim();

    match value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
    {
        Some(hex) => u64::from_str_radix(&hex.replace('_', ""), 16).ok(),
        None => value.parse().ok(),
    }
}

/// Configuration shared by the whole process.
pub fn global() -> &'static Config {
    static CONFIG: OnceLock<Config> = OnceLock::new();

    CONFIG.get_or_init(|| match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            log::warn!("ignoring environment configuration: {}", err.message);
            Config::default()
        }
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_environment() {
        let config = Config::from_lookup(lookup(&[])).unwrap();

        assert_eq!(config, Config::default());
        assert_eq!(config.default_digest, "sha1");
    }

    #[test]
    fn version_accepts_hex_and_decimal() {
        let config =
            Config::from_lookup(lookup(&[(ENV_TOOLKIT_VERSION, "0x1000_2000")])).unwrap();
        assert_eq!(config.toolkit_version, 0x1000_2000);

        let config = Config::from_lookup(lookup(&[(ENV_TOOLKIT_VERSION, "269484032")])).unwrap();
        assert_eq!(config.toolkit_version, 0x1010_0000);
    }

    #[test]
    fn bad_values_name_the_variable() {
        let err = Config::from_lookup(lookup(&[(ENV_RSA_BITS, "lots")])).unwrap_err();

        assert_eq!(err.kind, X509ErrorKind::InvalidConfig);
        assert!(err.message.contains(ENV_RSA_BITS));
    }
}
