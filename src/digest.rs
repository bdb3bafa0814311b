use std::{fmt::Display, str::FromStr};

use der::oid::{
    db::rfc5912::{
        ID_SHA_1, ID_SHA_224, ID_SHA_256, ID_SHA_384, ID_SHA_512, SHA_1_WITH_RSA_ENCRYPTION,
        SHA_224_WITH_RSA_ENCRYPTION, SHA_256_WITH_RSA_ENCRYPTION, SHA_384_WITH_RSA_ENCRYPTION,
        SHA_512_WITH_RSA_ENCRYPTION,
    },
    ObjectIdentifier,
};
use ::digest::{Digest as _, DynDigest};
use rsa::Pkcs1v15Sign;
use sha1::Sha1;
use sha2::{Sha224, Sha256, Sha384, Sha512};

use crate::errors::{X509Error, X509ErrorKind};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Algorithm {
    Sha1,
    Sha224,
    Sha256,
    Sha384,
    Sha512,
}

impl Display for Algorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Algorithm {
    type Err = X509Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "").as_str() {
            "sha1" => Ok(Self::Sha1),
            "sha224" => Ok(Self::Sha224),
            "sha256" => Ok(Self::Sha256),
            "sha384" => Ok(Self::Sha384),
            "sha512" => Ok(Self::Sha512),
            _ => Err(X509Error {
                kind: X509ErrorKind::UnknownDigest,
                message: format!("invalid digest type \"{}\"", s),
            }),
        }
    }
}

impl Algorithm {
    pub fn name(self: &Self) -> &'static str {
        match self {
            Algorithm::Sha1 => "sha1",
            Algorithm::Sha224 => "sha224",
            Algorithm::Sha256 => "sha256",
            Algorithm::Sha384 => "sha384",
            Algorithm::Sha512 => "sha512",
        }
    }

    pub fn oid(self: &Self) -> ObjectIdentifier {
        match self {
            Algorithm::Sha1 => ID_SHA_1,
            Algorithm::Sha224 => ID_SHA_224,
            Algorithm::Sha256 => ID_SHA_256,
            Algorithm::Sha384 => ID_SHA_384,
            Algorithm::Sha512 => ID_SHA_512,
        }
    }

    /// Signature algorithm identifier for RSA with this digest.
    pub fn rsa_signature_oid(self: &Self) -> ObjectIdentifier {
        match self {
            Algorithm::Sha1 => SHA_1_WITH_RSA_ENCRYPTION,
            Algorithm::Sha224 => SHA_224_WITH_RSA_ENCRYPTION,
            Algorithm::Sha256 => SHA_256_WITH_RSA_ENCRYPTION,
            Algorithm::Sha384 => SHA_384_WITH_RSA_ENCRYPTION,
            Algorithm::Sha512 => SHA_512_WITH_RSA_ENCRYPTION,
        }
    }

    pub fn from_rsa_signature_oid(oid: &ObjectIdentifier) -> Option<Self> {
        match *oid {
            SHA_1_WITH_RSA_ENCRYPTION => Some(Self::Sha1),
            SHA_224_WITH_RSA_ENCRYPTION => Some(Self::Sha224),
            SHA_256_WITH_RSA_ENCRYPTION => Some(Self::Sha256),
            SHA_384_WITH_RSA_ENCRYPTION => Some(Self::Sha384),
            SHA_512_WITH_RSA_ENCRYPTION => Some(Self::Sha512),
            _ => None,
        }
    }

    pub fn new_digest(self: &Self) -> Box<dyn DynDigest> {
        match self {
            Algorithm::Sha1 => Sha1::new().box_clone(),
            Algorithm::Sha224 => Sha224::new().box_clone(),
            Algorithm::Sha256 => Sha256::new().box_clone(),
            Algorithm::Sha384 => Sha384::new().box_clone(),
            Algorithm::Sha512 => Sha512::new().box_clone(),
        }
    }

    pub fn new_pkcs1v15sign(self: &Self) -> Pkcs1v15Sign {
        match self {
            Algorithm::Sha1 => Pkcs1v15Sign::new::<Sha1>(),
            Algorithm::Sha224 => Pkcs1v15Sign::new::<Sha224>(),
            Algorithm::Sha256 => Pkcs1v15Sign::new::<Sha256>(),
            Algorithm::Sha384 => Pkcs1v15Sign::new::<Sha384>(),
            Algorithm::Sha512 => Pkcs1v15Sign::new::<Sha512>(),
        }
    }

    /// One-shot hash of `data`.
    pub fn hash(self: &Self, data: &[u8]) -> Vec<u8> {
        let mut hasher = self.new_digest();
        hasher.update(data);
        hasher.finalize().to_vec()
    }
}

/// A named, initialized message digest context.
pub struct Digest {
    algorithm: Algorithm,
    ctx: Box<dyn DynDigest>,
}

impl std::fmt::Debug for Digest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Digest")
            .field("algorithm", &self.algorithm)
            .finish()
    }
}

impl Clone for Digest {
    fn clone(&self) -> Self {
        Self {
            algorithm: self.algorithm,
            ctx: self.ctx.box_clone(),
        }
    }
}

impl Digest {
    /// Creates a context for the named algorithm, `sha1` when `None`.
    pub fn new(name: Option<&str>) -> Result<Self, X509Error> {
        Ok(Self::with_algorithm(name.unwrap_or("sha1").parse()?))
    }

    pub fn with_algorithm(algorithm: Algorithm) -> Self {
        Self {
            algorithm,
            ctx: algorithm.new_digest(),
        }
    }

    pub fn algorithm(self: &Self) -> Algorithm {
        self.algorithm
    }

    pub fn update(self: &mut Self, data: &[u8]) -> &mut Self {
        self.ctx.update(data);
        self
    }

    pub fn finalize(self: Self) -> Vec<u8> {
        self.ctx.finalize().to_vec()
    }
}
