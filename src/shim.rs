//! Toolkit version shim.
//!
//! The toolkit comes in two shapes. The 1.0 series exposes the validity
//! window as a nested structure that callers walk themselves. From 1.1 on the
//! structure is opaque: times are read through accessors that hand back a
//! system time, and written by building a fresh time value. Everything else
//! dispatches identically in both shapes.
//!
//! [`Layout`] captures the logical accessors. [`layout`] picks the
//! implementation once per process from the configured toolkit version and
//! nothing outside this module looks at the version again.

use std::{fmt, sync::OnceLock, time::Duration};

use chrono::{DateTime, Datelike, Timelike, Utc};
use der::{
    asn1::{GeneralizedTime, UtcTime},
    DateTime as AsnDateTime,
};
use x509_cert::{
    certificate::{TbsCertificate, Version},
    name::Name,
    serial_number::SerialNumber,
    spki::SubjectPublicKeyInfoOwned,
    time::Time,
};

use crate::{
    config,
    errors::{X509Error, X509ErrorKind, X509Result},
    ownership::Native,
};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Shape {
    /// 1.0 series: validity reached by walking the nested structure.
    Nested,

    /// 1.1 series and later: validity behind accessor calls.
    Opaque,
}

impl Shape {
    pub fn detect(version: u64) -> Option<Self> {
        match version {
            0x1000_0000..=0x100f_ffff => Some(Shape::Nested),
            0x1010_0000..=0x3fff_ffff => Some(Shape::Opaque),
            _ => None,
        }
    }

    pub fn layout(self: Self) -> &'static dyn Layout {
        match self {
            Shape::Nested => &NestedValidity,
            Shape::Opaque => &OpaqueAccessors,
        }
    }
}

/// Logical certificate accessors, bound to one toolkit shape.
pub trait Layout: Send + Sync + fmt::Debug {
    fn shape(&self) -> Shape;

    fn not_before(&self, tbs: &TbsCertificate) -> Result<i64, X509Error>;

    fn set_not_before(&self, tbs: &mut TbsCertificate, secs: i64) -> Result<(), X509Error>;

    fn not_after(&self, tbs: &TbsCertificate) -> Result<i64, X509Error>;

    fn set_not_after(&self, tbs: &mut TbsCertificate, secs: i64) -> Result<(), X509Error>;

    /// Stored version number, one less than the public one.
    fn version(&self, tbs: &TbsCertificate) -> u8 {
        tbs.version as u8
    }

    fn set_version(&self, tbs: &mut TbsCertificate, stored: u8) -> Result<(), X509Error> {
        tbs.version = match stored {
            0 => Version::V1,
            1 => Version::V2,
            2 => Version::V3,
            _ => {
                return Err(X509Error::op(
                    X509ErrorKind::NativeOperation,
                    "X509_set_version",
                    format!("unsupported stored version {}", stored),
                ))
            }
        };

        Ok(())
    }

    fn serial_number<'a>(&self, tbs: &'a TbsCertificate) -> Native<'a, SerialNumber> {
        Native::Borrowed(&tbs.serial_number)
    }

    fn set_serial_number(&self, tbs: &mut TbsCertificate, serial: SerialNumber) {
        tbs.serial_number = serial;
    }

    fn subject_name<'a>(&self, tbs: &'a TbsCertificate) -> Native<'a, Name> {
        Native::Borrowed(&tbs.subject)
    }

    fn set_subject_name(&self, tbs: &mut TbsCertificate, name: Name) {
        tbs.subject = name;
    }

    fn issuer_name<'a>(&self, tbs: &'a TbsCertificate) -> Native<'a, Name> {
        Native::Borrowed(&tbs.issuer)
    }

    fn set_issuer_name(&self, tbs: &mut TbsCertificate, name: Name) {
        tbs.issuer = name;
    }

    /// A fresh copy of the key info; the certificate keeps its own.
    fn pubkey<'a>(&self, tbs: &'a TbsCertificate) -> Native<'a, SubjectPublicKeyInfoOwned> {
        Native::Fresh(tbs.subject_public_key_info.clone())
    }

    fn set_pubkey(&self, tbs: &mut TbsCertificate, spki: SubjectPublicKeyInfoOwned) {
        tbs.subject_public_key_info = spki;
    }
}

#[derive(Debug)]
pub struct NestedValidity;

impl NestedValidity {
    fn read(time: &Time) -> i64 {
        time.to_unix_duration().as_secs() as i64
    }

    fn write(slot: &mut Time, secs: i64, op: &str) -> Result<(), X509Error> {
        let secs = u64::try_from(secs).map_err(|_| {
            X509Error::op(X509ErrorKind::NativeOperation, op, "time before the epoch")
        })?;
        let at = AsnDateTime::from_unix_duration(Duration::from_secs(secs))
            .map_op_err(X509ErrorKind::NativeOperation, op)?;

        *slot = rfc5280_time(at, op)?;
        Ok(())
    }
}

impl Layout for NestedValidity {
    fn shape(&self) -> Shape {
        Shape::Nested
    }

    fn not_before(&self, tbs: &TbsCertificate) -> Result<i64, X509Error> {
        Ok(Self::read(&tbs.validity.not_before))
    }

    fn set_not_before(&self, tbs: &mut TbsCertificate, secs: i64) -> Result<(), X509Error> {
        Self::write(&mut tbs.validity.not_before, secs, "X509_set_notBefore")
    }

    fn not_after(&self, tbs: &TbsCertificate) -> Result<i64, X509Error> {
        Ok(Self::read(&tbs.validity.not_after))
    }

    fn set_not_after(&self, tbs: &mut TbsCertificate, secs: i64) -> Result<(), X509Error> {
        Self::write(&mut tbs.validity.not_after, secs, "X509_set_notAfter")
    }
}

#[derive(Debug)]
pub struct OpaqueAccessors;

impl OpaqueAccessors {
    fn get0(tbs: &TbsCertificate, after: bool) -> &Time {
        match after {
            true => &tbs.validity.not_after,
            false => &tbs.validity.not_before,
        }
    }

    fn getm(tbs: &mut TbsCertificate, after: bool) -> &mut Time {
        match after {
            true => &mut tbs.validity.not_after,
            false => &mut tbs.validity.not_before,
        }
    }

    fn read(time: &Time) -> i64 {
        DateTime::<Utc>::from(time.to_system_time()).timestamp()
    }

    fn build(secs: i64, op: &str) -> Result<Time, X509Error> {
        let at = DateTime::<Utc>::from_timestamp(secs, 0).ok_or_else(|| {
            X509Error::op(X509ErrorKind::NativeOperation, op, "time out of range")
        })?;
        let year = u16::try_from(at.year()).map_err(|_| {
            X509Error::op(X509ErrorKind::NativeOperation, op, "time out of range")
        })?;
        let at = AsnDateTime::new(
            year,
            at.month() as u8,
            at.day() as u8,
            at.hour() as u8,
            at.minute() as u8,
            at.second() as u8,
        )
        .map_op_err(X509ErrorKind::NativeOperation, op)?;

        rfc5280_time(at, op)
    }
}

impl Layout for OpaqueAccessors {
    fn shape(&self) -> Shape {
        Shape::Opaque
    }

    fn not_before(&self, tbs: &TbsCertificate) -> Result<i64, X509Error> {
        Ok(Self::read(Self::get0(tbs, false)))
    }

    fn set_not_before(&self, tbs: &mut TbsCertificate, secs: i64) -> Result<(), X509Error> {
        let time = Self::build(secs, "X509_set1_notBefore")?;
        *Self::getm(tbs, false) = time;
        Ok(())
    }

    fn not_after(&self, tbs: &TbsCertificate) -> Result<i64, X509Error> {
        Ok(Self::read(Self::get0(tbs, true)))
    }

    fn set_not_after(&self, tbs: &mut TbsCertificate, secs: i64) -> Result<(), X509Error> {
        let time = Self::build(secs, "X509_set1_notAfter")?;
        *Self::getm(tbs, true) = time;
        Ok(())
    }
}

/// UTCTime through 2049, GeneralizedTime from 2050 on.
fn rfc5280_time(at: AsnDateTime, op: &str) -> Result<Time, X509Error> {
    if at.year() < 2050 {
        let utc = UtcTime::from_date_time(at).map_op_err(X509ErrorKind::NativeOperation, op)?;
        Ok(Time::UtcTime(utc))
    } else {
        Ok(Time::GeneralTime(GeneralizedTime::from_date_time(at)))
    }
}

/// Layout for `version`.
///
/// # Panics
///
/// When `version` is neither of the supported shapes.
pub fn select(version: u64) -> &'static dyn Layout {
    match Shape::detect(version) {
        Some(shape) => {
            log::debug!("toolkit version {:#x} uses the {:?} layout", version, shape);
            shape.layout()
        }
        None => panic!("unsupported toolkit version {:#x}", version),
    }
}

/// The process-wide layout, chosen on first use.
pub fn layout() -> &'static dyn Layout {
    static LAYOUT: OnceLock<&'static dyn Layout> = OnceLock::new();

    *LAYOUT.get_or_init(|| select(config::global().toolkit_version))
}
