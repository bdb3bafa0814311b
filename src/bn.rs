use std::fmt::Display;

use num_traits::{Num, ToPrimitive};
use rsa::BigUint;
use x509_cert::serial_number::SerialNumber;

use crate::{
    errors::{X509Error, X509ErrorKind},
    utils::to_hex_str,
};

/// Arbitrary precision unsigned integer, used for serial numbers.
#[derive(Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
pub struct BigNum(BigUint);

impl From<u64> for BigNum {
    fn from(value: u64) -> Self {
        Self(BigUint::from(value))
    }
}

impl Display for BigNum {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl BigNum {
    /// Big-endian magnitude.
    pub fn from_binary(bytes: &[u8]) -> Self {
        Self(BigUint::from_bytes_be(bytes))
    }

    pub fn to_binary(self: &Self) -> Vec<u8> {
        self.0.to_bytes_be()
    }

    pub fn to_u64(self: &Self) -> Option<u64> {
        self.0.to_u64()
    }

    pub fn to_hex(self: &Self) -> String {
        to_hex_str(&self.to_binary())
    }

    /// Converts the certificate's integer representation.
    pub fn from_serial(serial: &SerialNumber) -> Self {
        Self::from_binary(serial.as_bytes())
    }

    pub fn to_serial(self: &Self) -> Result<SerialNumber, X509Error> {
        SerialNumber::new(&self.to_binary()).map_err(|err| {
            X509Error::op(X509ErrorKind::NativeOperation, "BN_to_ASN1_INTEGER", err)
        })
    }

    pub fn duplicate(self: &Self) -> Self {
        self.clone()
    }

    /// Hex digits only, no prefix or sign.
    pub fn parse_hex(text: &str) -> Result<Self, X509Error> {
        let invalid = || {
            X509Error::new(
                X509ErrorKind::ArgumentType,
                format!("not a hex integer: {}", text),
            )
        };

        if text.is_empty() || !text.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        BigUint::from_str_radix(text, 16)
            .map(Self)
            .map_err(|_| invalid())
    }

    pub fn parse_decimal(text: &str) -> Result<Self, X509Error> {
        BigUint::from_str_radix(text.trim(), 10)
            .map(Self)
            .map_err(|_| {
                X509Error::new(
                    X509ErrorKind::ArgumentType,
                    format!("not a decimal integer: {}", text),
                )
            })
    }
}

impl std::str::FromStr for BigNum {
    type Err = X509Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            Some(hex) => Self::parse_hex(hex),
            None => Self::parse_decimal(s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serial_round_trip() {
        let bn = BigNum::from(23333u64);
        let serial = bn.to_serial().unwrap();

        assert_eq!(BigNum::from_serial(&serial), bn);
        assert_eq!(bn.to_u64(), Some(23333));
        assert_eq!(bn.to_string(), "23333");
    }

    #[test]
    fn high_bit_serial_stays_positive() {
        let bn = BigNum::from_binary(&[0x80, 0x01]);
        let serial = bn.to_serial().unwrap();

        assert_eq!(BigNum::from_serial(&serial), bn);
    }

    #[test]
    fn parse_text() {
        assert_eq!("0x5b25".parse::<BigNum>().unwrap(), BigNum::from(23333u64));
        assert_eq!("23333".parse::<BigNum>().unwrap().to_hex(), "5b25");
        assert!("x".parse::<BigNum>().is_err());
    }

    #[test]
    fn parse_hex_edges() {
        assert_eq!("0XFF".parse::<BigNum>().unwrap(), BigNum::from(255u64));
        assert_eq!("0xabc".parse::<BigNum>().unwrap(), BigNum::from(0xabcu64));

        for text in ["0x", "0x+f+f", "0x_ff", "0x-1", "0xfg"] {
            let err = text.parse::<BigNum>().unwrap_err();
            assert_eq!(err.kind, X509ErrorKind::ArgumentType, "{}", text);
        }
    }
}
