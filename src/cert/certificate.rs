use std::{fmt::Display, io::Read, time::Duration};

use chrono::{DateTime, Utc};
use der::{
    asn1::{Any, BitString, Null, UtcTime},
    oid::{
        db::rfc5912::{ID_CE_ISSUER_ALT_NAME, ID_CE_SUBJECT_ALT_NAME, RSA_ENCRYPTION, SHA_256_WITH_RSA_ENCRYPTION},
        AssociatedOid, ObjectIdentifier,
    },
    pem::LineEnding,
    Decode, Encode, EncodePem,
};
use x509_cert::{
    certificate::{TbsCertificate, Version},
    ext::Extension,
    name::RdnSequence,
    serial_number::SerialNumber,
    spki::{AlgorithmIdentifierOwned, SubjectPublicKeyInfoOwned},
    time::{Time, Validity},
};

use crate::{
    bn::BigNum,
    config,
    digest::{Algorithm, Digest},
    errors::{X509Error, X509ErrorKind, X509Result},
    objects::{oid2txt, Identifier},
    ownership::{adopt, Accessor, Duplicate, Native, Owned, Value},
    pkey::PKey,
    shim::{self, Layout},
    utils::IndentString,
};

use super::{
    ext::{
        constraints::BasicConstraints, crl::DistributionPoints, AltName, ExtensionCodec,
        InfoAccess, X509Extension,
    },
    name::Name,
    Field,
};

type NativeCertificate = x509_cert::Certificate;

fn release_handle(cert: NativeCertificate) {
    log::debug!("releasing certificate handle");
    drop(cert);
}

fn rsa_algorithm(oid: ObjectIdentifier) -> AlgorithmIdentifierOwned {
    AlgorithmIdentifierOwned {
        oid,
        parameters: Some(Any::from(Null)),
    }
}

fn missing_extension(op: &str, oid: &ObjectIdentifier) -> X509Error {
    X509Error::op(
        X509ErrorKind::NativeOperation,
        op,
        format!("no {} extension", oid2txt(oid)),
    )
}

/// An X.509 certificate.
///
/// Owns exactly one certificate handle, released when the value is dropped.
/// Field access goes through the [`Layout`] chosen for the running toolkit.
/// Cloning deep-copies the handle.
#[derive(Clone, Debug)]
pub struct Certificate {
    handle: Owned<NativeCertificate>,
    layout: &'static dyn Layout,
}

impl Certificate {
    /// A fresh certificate: version 3, serial 0, empty names, valid from now until now.
    pub fn new() -> Result<Self, X509Error> {
        Self::with_layout(shim::layout())
    }

    pub fn with_layout(layout: &'static dyn Layout) -> Result<Self, X509Error> {
        let epoch = Time::UtcTime(
            UtcTime::from_unix_duration(Duration::ZERO)
                .map_op_err(X509ErrorKind::Allocation, "X509_new")?,
        );
        let empty = || BitString::from_bytes(&[]).map_op_err(X509ErrorKind::Allocation, "X509_new");

        let tbs = TbsCertificate {
            version: Version::V3,
            serial_number: SerialNumber::new(&[0])
                .map_op_err(X509ErrorKind::Allocation, "X509_new")?,
            signature: rsa_algorithm(SHA_256_WITH_RSA_ENCRYPTION),
            issuer: RdnSequence::default(),
            validity: Validity {
                not_before: epoch.clone(),
                not_after: epoch,
            },
            subject: RdnSequence::default(),
            subject_public_key_info: SubjectPublicKeyInfoOwned {
                algorithm: rsa_algorithm(RSA_ENCRYPTION),
                subject_public_key: empty()?,
            },
            issuer_unique_id: None,
            subject_unique_id: None,
            extensions: None,
        };
        let native = NativeCertificate {
            tbs_certificate: tbs,
            signature_algorithm: rsa_algorithm(SHA_256_WITH_RSA_ENCRYPTION),
            signature: empty()?,
        };

        let mut cert = Self {
            handle: Owned::own(native, release_handle),
            layout,
        };
        let now = Utc::now().timestamp();
        cert.set_lifetime(Some(now), Some(now))?;

        log::debug!("created certificate with {:?} layout", layout.shape());
        Ok(cert)
    }

    pub fn from_pem(pem: impl AsRef<[u8]>) -> Result<Self, X509Error> {
        Self::from_pem_with_layout(pem, shim::layout())
    }

    /// Decodes a PEM certificate; the base64 line width is detected.
    pub fn from_pem_with_layout(
        pem: impl AsRef<[u8]>,
        layout: &'static dyn Layout,
    ) -> Result<Self, X509Error> {
        let pem = pem.as_ref().trim_ascii();

        let mut decoder = pem_rfc7468::Decoder::new_detect_wrap(pem)
            .map_op_err(X509ErrorKind::Decode, "PEM_read_bio_X509")?;
        if decoder.type_label() != "CERTIFICATE" {
            return Err(X509Error::op(
                X509ErrorKind::Decode,
                "PEM_read_bio_X509",
                format!("unexpected label {}", decoder.type_label()),
            ));
        }

        let mut der = vec![];
        decoder
            .read_to_end(&mut der)
            .map_op_err(X509ErrorKind::Decode, "PEM_read_bio_X509")?;
        let native =
            NativeCertificate::from_der(&der).map_op_err(X509ErrorKind::Decode, "d2i_X509")?;

        log::debug!("decoded {} byte certificate", der.len());
        Ok(Self {
            handle: Owned::own(native, release_handle),
            layout,
        })
    }

    pub fn to_pem(self: &Self) -> Result<String, X509Error> {
        self.handle
            .to_pem(LineEnding::LF)
            .map_op_err(X509ErrorKind::ExportPemError, "PEM_write_bio_X509")
    }

    /// A copy with its own handle.
    pub fn duplicate(self: &Self) -> Result<Self, X509Error> {
        Ok(Self {
            handle: Owned::own(self.native().duplicate()?, release_handle),
            layout: self.layout,
        })
    }

    pub fn layout(self: &Self) -> &'static dyn Layout {
        self.layout
    }

    fn native(self: &Self) -> &NativeCertificate {
        &self.handle
    }

    pub(crate) fn tbs_certificate(self: &Self) -> &TbsCertificate {
        &self.handle.tbs_certificate
    }

    fn tbs_mut(self: &mut Self) -> &mut TbsCertificate {
        &mut self.handle.tbs_certificate
    }

    pub fn serial_number(self: &Self) -> Result<BigNum, X509Error> {
        let serial = adopt(
            Accessor::SerialNumber,
            self.layout.serial_number(self.tbs_certificate()),
        )?;

        Ok(BigNum::from_serial(&serial))
    }

    pub fn set_serial_number(self: &mut Self, serial: &BigNum) -> Result<(), X509Error> {
        let serial = serial.to_serial()?;
        let layout = self.layout;

        layout.set_serial_number(self.tbs_mut(), serial);
        Ok(())
    }

    pub fn not_before(self: &Self) -> Result<i64, X509Error> {
        self.layout.not_before(self.tbs_certificate())
    }

    pub fn set_not_before(self: &mut Self, secs: i64) -> Result<(), X509Error> {
        let layout = self.layout;
        layout.set_not_before(self.tbs_mut(), secs)
    }

    pub fn not_after(self: &Self) -> Result<i64, X509Error> {
        self.layout.not_after(self.tbs_certificate())
    }

    pub fn set_not_after(self: &mut Self, secs: i64) -> Result<(), X509Error> {
        let layout = self.layout;
        layout.set_not_after(self.tbs_mut(), secs)
    }

    /// `(not_before, not_after)` in seconds since the epoch.
    pub fn lifetime(self: &Self) -> Result<(i64, i64), X509Error> {
        Ok((self.not_before()?, self.not_after()?))
    }

    /// Sets whichever bounds are given, stopping at the first failure.
    pub fn set_lifetime(
        self: &mut Self,
        not_before: Option<i64>,
        not_after: Option<i64>,
    ) -> Result<(), X509Error> {
        if let Some(secs) = not_before {
            self.set_not_before(secs)?;
        }
        if let Some(secs) = not_after {
            self.set_not_after(secs)?;
        }
        Ok(())
    }

    /// Public version number, one more than the stored value.
    pub fn version(self: &Self) -> Result<u8, X509Error> {
        Ok(self.layout.version(self.tbs_certificate()) + 1)
    }

    pub fn set_version(self: &mut Self, version: u8) -> Result<(), X509Error> {
        if !(1..=3).contains(&version) {
            return Err(X509Error::op(
                X509ErrorKind::ArgumentType,
                "X509_set_version",
                format!("invalid version {}", version),
            ));
        }
        let layout = self.layout;

        layout.set_version(self.tbs_mut(), version - 1)
    }

    /// The subject key, independent of this certificate.
    pub fn pubkey(self: &Self) -> Result<PKey, X509Error> {
        let spki = adopt(Accessor::Pubkey, self.layout.pubkey(self.tbs_certificate()))?;

        PKey::from_spki(&spki)
    }

    pub fn set_pubkey(self: &mut Self, key: &PKey) -> Result<(), X509Error> {
        let spki = key.to_spki()?;
        let layout = self.layout;

        layout.set_pubkey(self.tbs_mut(), spki);
        Ok(())
    }

    pub fn subject_name(self: &Self) -> Result<Name, X509Error> {
        let name = adopt(
            Accessor::SubjectName,
            self.layout.subject_name(self.tbs_certificate()),
        )?;

        Ok(Name::from_owned(name))
    }

    pub fn set_subject_name(self: &mut Self, name: &Name) -> Result<(), X509Error> {
        let name = name.as_native().duplicate()?;
        let layout = self.layout;

        layout.set_subject_name(self.tbs_mut(), name);
        Ok(())
    }

    pub fn issuer_name(self: &Self) -> Result<Name, X509Error> {
        let name = adopt(
            Accessor::IssuerName,
            self.layout.issuer_name(self.tbs_certificate()),
        )?;

        Ok(Name::from_owned(name))
    }

    pub fn set_issuer_name(self: &mut Self, name: &Name) -> Result<(), X509Error> {
        let name = name.as_native().duplicate()?;
        let layout = self.layout;

        layout.set_issuer_name(self.tbs_mut(), name);
        Ok(())
    }

    fn extensions(self: &Self) -> &[Extension] {
        self.tbs_certificate()
            .extensions
            .as_deref()
            .unwrap_or(&[])
    }

    /// Zero-based index of the first `oid` extension at or after `start`.
    fn find_extension(self: &Self, oid: ObjectIdentifier, start: usize) -> Option<usize> {
        self.extensions()
            .iter()
            .enumerate()
            .skip(start)
            .find(|(_, ext)| ext.extn_id == oid)
            .map(|(index, _)| index)
    }

    /// Next extension matching `id` after the 1-based position `last_pos`.
    ///
    /// Returns a copy of the record with its 1-based position, which can be
    /// passed back as `last_pos` to continue the search.
    pub fn get_extension(
        self: &Self,
        id: impl Into<Identifier>,
        last_pos: Option<usize>,
    ) -> Result<Option<(X509Extension, usize)>, X509Error> {
        let oid = id.into().resolve()?;

        match self.find_extension(oid, last_pos.unwrap_or(0)) {
            Some(index) => {
                let record = adopt(
                    Accessor::Extension,
                    Native::Borrowed(&self.extensions()[index]),
                )?;
                Ok(Some((X509Extension::from_owned(record), index + 1)))
            }
            None => Ok(None),
        }
    }

    /// Appends a copy of `record`.
    pub fn add_extension(self: &mut Self, record: &X509Extension) -> Result<(), X509Error> {
        let copy = record.as_native().duplicate()?;

        self.tbs_mut()
            .extensions
            .get_or_insert_with(Vec::new)
            .push(copy);
        Ok(())
    }

    /// Replaces the first extension with the same identifier after `last_pos`
    /// in place, or inserts `record` at the start of the list.
    pub fn set_extension(
        self: &mut Self,
        record: &X509Extension,
        last_pos: Option<usize>,
    ) -> Result<(), X509Error> {
        let copy = record.as_native().duplicate()?;
        let found = self.find_extension(copy.extn_id, last_pos.unwrap_or(0));
        let extensions = self.tbs_mut().extensions.get_or_insert_with(Vec::new);

        match found {
            Some(index) => {
                log::trace!("replacing extension {} at {}", copy.extn_id, index + 1);
                extensions[index] = copy;
            }
            None => extensions.insert(0, copy),
        }
        Ok(())
    }

    pub fn extension_critical(self: &Self, id: impl Into<Identifier>) -> Result<bool, X509Error> {
        let oid = id.into().resolve()?;

        self.extensions()
            .iter()
            .find(|ext| ext.extn_id == oid)
            .map(|ext| ext.critical)
            .ok_or_else(|| missing_extension("X509_EXTENSION_get_critical", &oid))
    }

    pub fn set_extension_critical(
        self: &mut Self,
        id: impl Into<Identifier>,
        critical: bool,
    ) -> Result<(), X509Error> {
        let oid = id.into().resolve()?;
        let ext = self
            .tbs_mut()
            .extensions
            .iter_mut()
            .flatten()
            .find(|ext| ext.extn_id == oid)
            .ok_or_else(|| missing_extension("X509_EXTENSION_set_critical", &oid))?;

        ext.critical = critical;
        Ok(())
    }

    fn typed_extension<T: ExtensionCodec>(
        self: &Self,
        oid: ObjectIdentifier,
    ) -> Result<Option<T>, X509Error> {
        self.get_extension(oid, None)?
            .map(|(record, _)| record.decode::<T>())
            .transpose()
    }

    /// Encodes the full replacement first; the certificate is untouched on failure.
    fn set_typed_extension<T: ExtensionCodec>(
        self: &mut Self,
        oid: ObjectIdentifier,
        value: &T,
    ) -> Result<(), X509Error> {
        let critical = self
            .find_extension(oid, 0)
            .map(|index| self.extensions()[index].critical)
            .unwrap_or(false);
        let record = X509Extension::encode_as(oid, value, critical)?;

        self.set_extension(&record, None)
    }

    pub fn subject_alt_name(self: &Self) -> Result<Option<AltName>, X509Error> {
        self.typed_extension(ID_CE_SUBJECT_ALT_NAME)
    }

    pub fn set_subject_alt_name(self: &mut Self, names: &AltName) -> Result<(), X509Error> {
        self.set_typed_extension(ID_CE_SUBJECT_ALT_NAME, names)
    }

    pub fn issuer_alt_name(self: &Self) -> Result<Option<AltName>, X509Error> {
        self.typed_extension(ID_CE_ISSUER_ALT_NAME)
    }

    pub fn set_issuer_alt_name(self: &mut Self, names: &AltName) -> Result<(), X509Error> {
        self.set_typed_extension(ID_CE_ISSUER_ALT_NAME, names)
    }

    pub fn basic_constraints(self: &Self) -> Result<Option<BasicConstraints>, X509Error> {
        self.typed_extension(BasicConstraints::OID)
    }

    pub fn set_basic_constraints(
        self: &mut Self,
        constraints: &BasicConstraints,
    ) -> Result<(), X509Error> {
        self.set_typed_extension(BasicConstraints::OID, constraints)
    }

    pub fn info_access(self: &Self) -> Result<Option<InfoAccess>, X509Error> {
        self.typed_extension(InfoAccess::OID)
    }

    pub fn set_info_access(self: &mut Self, access: &InfoAccess) -> Result<(), X509Error> {
        self.set_typed_extension(InfoAccess::OID, access)
    }

    pub fn crl_distribution_points(self: &Self) -> Result<Option<DistributionPoints>, X509Error> {
        self.typed_extension(DistributionPoints::OID)
    }

    pub fn set_crl_distribution_points(
        self: &mut Self,
        points: &DistributionPoints,
    ) -> Result<(), X509Error> {
        self.set_typed_extension(DistributionPoints::OID, points)
    }

    /// First OCSP responder URI.
    pub fn ocsp_url(self: &Self) -> Result<Option<String>, X509Error> {
        Ok(self.ocsp_urls()?.into_iter().next())
    }

    pub fn ocsp_urls(self: &Self) -> Result<Vec<String>, X509Error> {
        Ok(self
            .info_access()?
            .map(|access| access.ocsp_uris())
            .unwrap_or_default())
    }

    /// First CRL distribution point URI.
    pub fn crl_url(self: &Self) -> Result<Option<String>, X509Error> {
        Ok(self.crl_urls()?.into_iter().next())
    }

    pub fn crl_urls(self: &Self) -> Result<Vec<String>, X509Error> {
        Ok(self
            .crl_distribution_points()?
            .map(|points| points.uris())
            .unwrap_or_default())
    }

    pub fn get(self: &Self, field: Field) -> Result<Option<Value>, X509Error> {
        Ok(match field {
            Field::SerialNumber => Some(self.serial_number()?.into()),
            Field::NotBefore => Some(Value::Time(self.not_before()?)),
            Field::NotAfter => Some(Value::Time(self.not_after()?)),
            Field::Version => Some(Value::Version(self.version()?)),
            Field::Pubkey => Some(self.pubkey()?.into()),
            Field::SubjectName => Some(self.subject_name()?.into()),
            Field::IssuerName => Some(self.issuer_name()?.into()),
            Field::SubjectAltName => self.subject_alt_name()?.map(Value::from),
            Field::IssuerAltName => self.issuer_alt_name()?.map(Value::from),
            Field::BasicConstraints => self.basic_constraints()?.map(Value::from),
            Field::InfoAccess => self.info_access()?.map(Value::from),
            Field::CrlDistributionPoints => self.crl_distribution_points()?.map(Value::from),
        })
    }

    /// Sets `field` from a value whose kind is checked at runtime.
    pub fn set(self: &mut Self, field: Field, value: Value) -> Result<(), X509Error> {
        if !value.is_of_kind(field.kind()) {
            return Err(X509Error::new(
                X509ErrorKind::ArgumentType,
                format!(
                    "set_{}: expected {:?}, got {:?}",
                    field,
                    field.kind(),
                    value.kind()
                ),
            ));
        }

        match (field, value) {
            (Field::SerialNumber, Value::BigNum(serial)) => self.set_serial_number(&serial),
            (Field::NotBefore, Value::Time(secs)) => self.set_not_before(secs),
            (Field::NotAfter, Value::Time(secs)) => self.set_not_after(secs),
            (Field::Version, Value::Version(version)) => self.set_version(version),
            (Field::Pubkey, Value::PKey(key)) => self.set_pubkey(&key),
            (Field::SubjectName, Value::Name(name)) => self.set_subject_name(&name),
            (Field::IssuerName, Value::Name(name)) => self.set_issuer_name(&name),
            (Field::SubjectAltName, Value::AltName(names)) => self.set_subject_alt_name(&names),
            (Field::IssuerAltName, Value::AltName(names)) => self.set_issuer_alt_name(&names),
            (Field::BasicConstraints, Value::BasicConstraints(bc)) => {
                self.set_basic_constraints(&bc)
            }
            (Field::InfoAccess, Value::InfoAccess(access)) => self.set_info_access(&access),
            (Field::CrlDistributionPoints, Value::DistributionPoints(points)) => {
                self.set_crl_distribution_points(&points)
            }
            (field, value) => unreachable!("{} accepted a {:?} value", field, value.kind()),
        }
    }

    fn digest_algorithm(name: Option<&str>) -> Result<Algorithm, X509Error> {
        name.unwrap_or(&config::global().default_digest).parse()
    }

    /// Digest of the DER encoded certificate, `sha1` unless configured otherwise.
    pub fn digest(self: &Self, name: Option<&str>) -> Result<Vec<u8>, X509Error> {
        let algorithm = Self::digest_algorithm(name)?;
        let der = self
            .handle
            .to_der()
            .map_op_err(X509ErrorKind::NativeOperation, "X509_digest")?;

        Ok(algorithm.hash(&der))
    }

    /// Digest of the subject public key bits.
    pub fn pubkey_digest(self: &Self, name: Option<&str>) -> Result<Vec<u8>, X509Error> {
        let algorithm = Self::digest_algorithm(name)?;
        let spki = &self.tbs_certificate().subject_public_key_info;

        Ok(algorithm.hash(spki.subject_public_key.raw_bytes()))
    }

    /// Signs with PKCS#1 v1.5, using `sha256` unless a digest is given.
    pub fn sign(self: &mut Self, key: &PKey, digest: Option<&Digest>) -> Result<(), X509Error> {
        let algorithm = match digest {
            Some(digest) => digest.algorithm(),
            None => config::global().sign_digest.parse()?,
        };
        let signature_algorithm = rsa_algorithm(algorithm.rsa_signature_oid());

        let mut tbs = self.tbs_certificate().clone();
        tbs.signature = signature_algorithm.clone();
        let tbs_der = tbs
            .to_der()
            .map_op_err(X509ErrorKind::NativeOperation, "X509_sign")?;
        let signature = key.sign(algorithm, &tbs_der)?;
        let signature =
            BitString::from_bytes(&signature).map_op_err(X509ErrorKind::NativeOperation, "X509_sign")?;

        log::debug!("signed certificate with {}", algorithm);
        self.handle.tbs_certificate = tbs;
        self.handle.signature_algorithm = signature_algorithm;
        self.handle.signature = signature;
        Ok(())
    }

    pub fn verify_signature(self: &Self, key: &PKey) -> Result<bool, X509Error> {
        let oid = self.native().signature_algorithm.oid;
        let algorithm = Algorithm::from_rsa_signature_oid(&oid).ok_or_else(|| {
            X509Error::new(
                X509ErrorKind::UnsupportedAlgorithm,
                format!("signature algorithm {}", oid2txt(&oid)),
            )
        })?;
        let tbs_der = self
            .tbs_certificate()
            .to_der()
            .map_op_err(X509ErrorKind::NativeOperation, "X509_verify")?;

        Ok(key.verify(algorithm, &tbs_der, self.native().signature.raw_bytes()))
    }

    /// Whether `key` is the key pair for the certified public key.
    pub fn check_private_key(self: &Self, key: &PKey) -> Result<bool, X509Error> {
        Ok(self.pubkey()?.matches(key))
    }

    pub fn signature_name(self: &Self) -> String {
        oid2txt(&self.native().signature_algorithm.oid)
    }
}

fn format_time(secs: i64) -> String {
    match DateTime::<Utc>::from_timestamp(secs, 0) {
        Some(at) => at.format("%b %e %H:%M:%S %Y GMT").to_string(),
        None => secs.to_string(),
    }
}

impl Display for Certificate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let version = self.version().map_err(|_| std::fmt::Error)?;
        let (not_before, not_after) = self.lifetime().map_err(|_| std::fmt::Error)?;
        let serial = self.serial_number().map_err(|_| std::fmt::Error)?;
        let subject = self.subject_name().map_err(|_| std::fmt::Error)?;
        let issuer = self.issuer_name().map_err(|_| std::fmt::Error)?;
        let key = match self.pubkey() {
            Ok(key) => key.to_string(),
            Err(_) => "<unsupported>".to_owned(),
        };

        let mut body = vec![
            format!("Version: {} (0x{:x})", version, version - 1),
            format!("Serial Number: {} (0x{})", serial, serial.to_hex()),
            format!("Signature Algorithm: {}", self.signature_name()),
            format!("Issuer: {}", issuer),
            format!(
                "Validity:\n{}",
                format!(
                    "Not Before: {}\nNot After : {}",
                    format_time(not_before),
                    format_time(not_after)
                )
                .indent(4)
            ),
            format!("Subject: {}", subject),
            format!("Subject Public Key Info:\n{}", key.indent(4)),
        ];

        if !self.extensions().is_empty() {
            let extensions = self
                .extensions()
                .iter()
                .map(|ext| X509Extension::from_owned(Owned::new(ext.clone())).to_string())
                .collect::<Vec<String>>()
                .join("\n");
            body.push(format!("X509v3 extensions:\n{}", extensions.indent(4)));
        }

        writeln!(f, "Certificate:")?;
        write!(f, "{}", body.join("\n").indent(4))
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        cert::ext::{crl::DistributionPoint, name::GeneralName, AccessDescription},
        ownership::Kind,
        shim::{NestedValidity, OpaqueAccessors},
    };

    use super::*;

    fn fresh() -> Certificate {
        Certificate::new().unwrap()
    }

    #[test]
    fn fresh_defaults() {
        let cert = fresh();
        let (not_before, not_after) = cert.lifetime().unwrap();

        assert_eq!(cert.version().unwrap(), 3);
        assert_eq!(cert.serial_number().unwrap(), BigNum::from(0u64));
        assert_eq!(not_before, not_after);
        assert!((Utc::now().timestamp() - not_before).abs() < 60);
        assert!(cert.subject_name().unwrap().is_empty());
    }

    #[test]
    fn version_is_one_more_than_stored() {
        let mut cert = fresh();

        for version in 1..=3 {
            cert.set_version(version).unwrap();
            assert_eq!(cert.version().unwrap(), version);
            assert_eq!(cert.tbs_certificate().version as u8, version - 1);
        }

        assert_eq!(cert.set_version(0).unwrap_err().kind, X509ErrorKind::ArgumentType);
        assert_eq!(cert.set_version(4).unwrap_err().kind, X509ErrorKind::ArgumentType);
        assert_eq!(cert.version().unwrap(), 3);
    }

    #[test]
    fn set_lifetime_applies_given_bounds() {
        let mut cert = fresh();
        cert.set_lifetime(Some(0), Some(31536000)).unwrap();
        cert.set_lifetime(None, Some(63072000)).unwrap();

        assert_eq!(cert.lifetime().unwrap(), (0, 63072000));
    }

    #[test]
    fn set_lifetime_stops_at_first_failure() {
        let mut cert = fresh();
        cert.set_lifetime(Some(100), Some(200)).unwrap();

        assert!(cert.set_lifetime(Some(-1), Some(300)).is_err());
        assert_eq!(cert.lifetime().unwrap(), (100, 200));
    }

    #[test]
    fn both_layouts_read_the_same_certificate() {
        let mut nested = Certificate::with_layout(&NestedValidity).unwrap();
        nested.set_lifetime(Some(1_000_000), Some(2_000_000)).unwrap();

        let pem = nested.to_pem().unwrap();
        let opaque = Certificate::from_pem_with_layout(&pem, &OpaqueAccessors).unwrap();

        assert_eq!(opaque.lifetime().unwrap(), (1_000_000, 2_000_000));
        assert_eq!(opaque.layout().shape(), shim::Shape::Opaque);
    }

    #[test]
    fn set_extension_replaces_in_place() {
        let mut cert = fresh();
        cert.add_extension(&X509Extension::new("keyUsage", &[0x03, 0x02, 0x05, 0xa0], true).unwrap())
            .unwrap();
        cert.add_extension(&X509Extension::new("basicConstraints", &[0x30, 0x00], false).unwrap())
            .unwrap();

        let first = X509Extension::from_typed(&BasicConstraints::new(true, None), false).unwrap();
        let second = X509Extension::from_typed(&BasicConstraints::new(true, Some(1)), true).unwrap();
        cert.set_extension(&first, None).unwrap();
        cert.set_extension(&second, None).unwrap();

        let (found, pos) = cert.get_extension("basicConstraints", None).unwrap().unwrap();
        assert_eq!(pos, 2);
        assert_eq!(found, second);
        assert!(cert.get_extension("basicConstraints", Some(pos)).unwrap().is_none());
        assert_eq!(cert.extensions().len(), 2);
    }

    #[test]
    fn set_extension_without_match_inserts_first() {
        let mut cert = fresh();
        cert.add_extension(&X509Extension::new("keyUsage", &[0x03, 0x02, 0x05, 0xa0], true).unwrap())
            .unwrap();

        let bc = X509Extension::from_typed(&BasicConstraints::new(false, None), false).unwrap();
        cert.set_extension(&bc, None).unwrap();

        let (_, pos) = cert.get_extension(BasicConstraints::OID, None).unwrap().unwrap();
        assert_eq!(pos, 1);
    }

    #[test]
    fn get_extension_resumes_after_position() {
        let mut cert = fresh();
        let san = |dns: &str| {
            let names: AltName = [format!("DNS:{}", dns).parse::<GeneralName>().unwrap()]
                .into_iter()
                .collect();
            X509Extension::encode_as(ID_CE_SUBJECT_ALT_NAME, &names, false).unwrap()
        };

        cert.add_extension(&san("a.example")).unwrap();
        cert.add_extension(&X509Extension::new("basicConstraints", &[0x30, 0x00], false).unwrap())
            .unwrap();
        cert.add_extension(&san("b.example")).unwrap();

        let mut positions = vec![];
        let mut last_pos = None;
        while let Some((record, pos)) = cert.get_extension("subjectAltName", last_pos).unwrap() {
            positions.push((pos, record.decode::<AltName>().unwrap().dns_names()[0].to_owned()));
            last_pos = Some(pos);
        }

        assert_eq!(
            positions,
            vec![(1, "a.example".to_owned()), (3, "b.example".to_owned())]
        );
    }

    #[test]
    fn added_record_stays_independent() {
        let mut cert = fresh();
        let mut record = X509Extension::new("basicConstraints", &[0x30, 0x00], false).unwrap();

        cert.add_extension(&record).unwrap();
        record.set_critical(true);

        assert!(!cert.extension_critical("basicConstraints").unwrap());
    }

    #[test]
    fn critical_flag_requires_extension() {
        let mut cert = fresh();

        let err = cert.extension_critical("basicConstraints").unwrap_err();
        assert_eq!(err.kind, X509ErrorKind::NativeOperation);
        assert!(cert.set_extension_critical("basicConstraints", true).is_err());

        cert.set_basic_constraints(&BasicConstraints::new(true, None)).unwrap();
        cert.set_extension_critical("basicConstraints", true).unwrap();
        assert!(cert.extension_critical(BasicConstraints::OID).unwrap());

        cert.set_basic_constraints(&BasicConstraints::new(true, Some(3))).unwrap();
        assert!(cert.extension_critical("basicConstraints").unwrap());
    }

    #[test]
    fn basic_constraints_read_back() {
        let mut cert = fresh();

        cert.set_basic_constraints(&BasicConstraints::new(true, Some(2))).unwrap();
        assert_eq!(
            cert.basic_constraints().unwrap(),
            Some(BasicConstraints::new(true, Some(2)))
        );

        cert.set_basic_constraints(&BasicConstraints::new(false, None)).unwrap();
        let bc = cert.basic_constraints().unwrap().unwrap();
        assert!(!bc.ca);
        assert_eq!(bc.path_len(), 0);
    }

    #[test]
    fn failed_basic_constraints_keep_previous_value() {
        let mut cert = fresh();
        cert.set_basic_constraints(&BasicConstraints::new(true, Some(2))).unwrap();

        let err = cert
            .set_basic_constraints(&BasicConstraints::new(true, Some(1000)))
            .unwrap_err();

        assert_eq!(err.kind, X509ErrorKind::NativeOperation);
        assert_eq!(
            cert.basic_constraints().unwrap(),
            Some(BasicConstraints::new(true, Some(2)))
        );
    }

    #[test]
    fn url_helpers() {
        let mut cert = fresh();

        assert_eq!(cert.crl_url().unwrap(), None);
        assert!(cert.crl_urls().unwrap().is_empty());
        assert_eq!(cert.ocsp_url().unwrap(), None);

        cert.set_crl_distribution_points(&DistributionPoints::new()).unwrap();
        assert_eq!(cert.crl_url().unwrap(), None);

        let access: InfoAccess = [
            AccessDescription::ca_issuers("http://ca.example/ca.crt"),
            AccessDescription::ocsp("http://ocsp.example"),
            AccessDescription::ocsp("http://ocsp2.example"),
        ]
        .into_iter()
        .collect();
        cert.set_info_access(&access).unwrap();
        let points: DistributionPoints = [DistributionPoint::from_uri("http://crl.example/ca.crl")]
            .into_iter()
            .collect();
        cert.set_crl_distribution_points(&points).unwrap();

        assert_eq!(cert.ocsp_url().unwrap().as_deref(), Some("http://ocsp.example"));
        assert_eq!(cert.ocsp_urls().unwrap().len(), 2);
        assert_eq!(cert.crl_urls().unwrap(), vec!["http://crl.example/ca.crl"]);
    }

    #[test]
    fn dynamic_set_checks_kind() {
        let mut cert = fresh();

        let err = cert
            .set(Field::SerialNumber, Value::Name(Name::new()))
            .unwrap_err();
        assert_eq!(err.kind, X509ErrorKind::ArgumentType);
        assert!(err.message.starts_with("set_serial_number"));

        cert.set(Field::SerialNumber, BigNum::from(42u64).into()).unwrap();
        cert.set(Field::Version, Value::Version(2)).unwrap();

        let serial = cert.get(Field::SerialNumber).unwrap().unwrap();
        assert!(serial.is_of_kind(Kind::BigNum));
        assert_eq!(cert.serial_number().unwrap().to_u64(), Some(42));
        assert_eq!(cert.version().unwrap(), 2);
        assert!(cert.get(Field::SubjectAltName).unwrap().is_none());
    }

    #[test]
    fn digests() {
        let cert = fresh();

        assert_eq!(cert.digest(None).unwrap().len(), 20);
        assert_eq!(cert.digest(Some("sha256")).unwrap().len(), 32);
        assert_eq!(
            cert.digest(Some("whirlpool")).unwrap_err().kind,
            X509ErrorKind::UnknownDigest
        );
        assert_eq!(cert.pubkey_digest(Some("sha512")).unwrap().len(), 64);
    }

    #[test]
    fn digests_cover_the_right_bytes() {
        let key = PKey::generate_rsa(1024).unwrap();
        let mut cert = fresh();
        cert.set_pubkey(&key).unwrap();

        let spki = &cert.tbs_certificate().subject_public_key_info;
        assert_eq!(
            cert.pubkey_digest(Some("sha512")).unwrap(),
            Algorithm::Sha512.hash(spki.subject_public_key.raw_bytes())
        );
        assert_ne!(
            cert.pubkey_digest(Some("sha256")).unwrap(),
            Algorithm::Sha256.hash(&spki.to_der().unwrap())
        );

        let der = cert.native().to_der().unwrap();
        assert_eq!(cert.digest(Some("sha256")).unwrap(), Algorithm::Sha256.hash(&der));
        assert_eq!(cert.digest(None).unwrap(), Algorithm::Sha1.hash(&der));
    }

    #[test]
    fn set_extension_after_position_skips_earlier_match() {
        let mut cert = fresh();
        let record = |bc: BasicConstraints| X509Extension::from_typed(&bc, false).unwrap();

        cert.add_extension(&record(BasicConstraints::new(true, Some(1))))
            .unwrap();
        cert.add_extension(&X509Extension::new("keyUsage", &[0x03, 0x02, 0x05, 0xa0], true).unwrap())
            .unwrap();
        cert.add_extension(&record(BasicConstraints::new(true, Some(7))))
            .unwrap();

        cert.set_extension(&record(BasicConstraints::new(false, None)), Some(1))
            .unwrap();

        let mut found = vec![];
        let mut last_pos = None;
        while let Some((ext, pos)) = cert.get_extension("basicConstraints", last_pos).unwrap() {
            found.push((pos, ext.decode::<BasicConstraints>().unwrap()));
            last_pos = Some(pos);
        }

        assert_eq!(
            found,
            vec![
                (1, BasicConstraints::new(true, Some(1))),
                (3, BasicConstraints::new(false, None)),
            ]
        );
        assert_eq!(cert.extensions().len(), 3);
    }

    #[test]
    fn sign_and_verify() {
        let key = PKey::generate_rsa(1024).unwrap();
        let mut cert = fresh();
        cert.set_pubkey(&key).unwrap();
        cert.sign(&key, None).unwrap();

        assert_eq!(cert.signature_name(), "sha256WithRSAEncryption");
        assert!(cert.verify_signature(&key).unwrap());
        assert!(cert.check_private_key(&key).unwrap());

        let sha1 = Digest::new(Some("sha1")).unwrap();
        cert.sign(&key, Some(&sha1)).unwrap();
        assert_eq!(cert.signature_name(), "sha1WithRSAEncryption");
        assert!(cert.verify_signature(&key).unwrap());

        let other = PKey::generate_rsa(1024).unwrap();
        assert!(!cert.verify_signature(&other).unwrap());
    }

    #[test]
    fn public_key_cannot_sign() {
        let key = PKey::generate_rsa(1024).unwrap();
        let public = PKey::from_public_pem(&key.public_key_to_pem().unwrap()).unwrap();

        let err = fresh().sign(&public, None).unwrap_err();
        assert_eq!(err.kind, X509ErrorKind::ArgumentType);
    }

    #[test]
    fn bad_pem_is_a_decode_error() {
        let err = Certificate::from_pem("not a certificate").unwrap_err();
        assert_eq!(err.kind, X509ErrorKind::Decode);

        let key = PKey::generate_rsa(1024).unwrap();
        let err = Certificate::from_pem(key.public_key_to_pem().unwrap()).unwrap_err();
        assert_eq!(err.kind, X509ErrorKind::Decode);
    }

    #[test]
    fn display_lists_fields() {
        let mut cert = fresh();
        let mut name = Name::new();
        name.add("CN", "display.example").unwrap();
        cert.set_subject_name(&name).unwrap();
        cert.set_basic_constraints(&BasicConstraints::new(true, None)).unwrap();

        let text = cert.to_string();

        assert!(text.starts_with("Certificate:\n    Version: 3 (0x2)"));
        assert!(text.contains("Subject: CN=display.example"));
        assert!(text.contains("X509v3 Basic Constraints:"));
    }
}
