//! Ownership discipline for values crossing the toolkit boundary.
//!
//! Every value a [`Layout`](crate::shim::Layout) accessor hands back is either
//! a reference into the certificate structure or a value produced just for the
//! caller. Which of the two it is depends on the accessor alone and is recorded
//! in [`CLASSIFICATION`]. [`adopt`] applies that table: borrowed references are
//! deep-copied, fresh values are taken over as they are. Either way the caller
//! ends up holding an [`Owned`] with exactly one release obligation.

use std::{
    fmt,
    mem::{self, ManuallyDrop},
    ops::{Deref, DerefMut},
};

use der::{DecodeOwned, Encode};

use crate::{
    bn::BigNum,
    cert::{
        ext::{constraints::BasicConstraints, crl::DistributionPoints, AltName, InfoAccess},
        name::Name,
    },
    errors::{X509Error, X509ErrorKind},
    pkey::PKey,
};

/// A value with exactly one scheduled release.
///
/// The release function runs when the wrapper is dropped, on every exit path.
/// Taking the value by move at construction means the same value can never
/// carry two obligations.
pub struct Owned<T> {
    value: ManuallyDrop<T>,
    release: fn(T),
}

impl<T> Owned<T> {
    /// Takes `value` over, scheduling `release` for the end of the wrapper's life.
    pub fn own(value: T, release: fn(T)) -> Self {
        Self {
            value: ManuallyDrop::new(value),
            release,
        }
    }

    /// Takes `value` over with a plain drop as its release.
    pub fn new(value: T) -> Self {
        Self::own(value, mem::drop::<T>)
    }
}

impl<T> Drop for Owned<T> {
    fn drop(&mut self) {
        // SAFETY: the value is taken exactly once, here, and never touched again.
        let value = unsafe { ManuallyDrop::take(&mut self.value) };
        log::trace!("releasing {}", std::any::type_name::<T>());
        (self.release)(value);
    }
}

impl<T> Deref for Owned<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

impl<T> DerefMut for Owned<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.value
    }
}

impl<T: Clone> Clone for Owned<T> {
    fn clone(&self) -> Self {
        Self::own(T::clone(&self.value), self.release)
    }
}

impl<T: fmt::Debug> fmt::Debug for Owned<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Owned").field(&*self.value).finish()
    }
}

impl<T: PartialEq> PartialEq for Owned<T> {
    fn eq(&self, other: &Self) -> bool {
        *self.value == *other.value
    }
}

impl<T: Eq> Eq for Owned<T> {}

/// Deep copy of a value that may be borrowed from a longer-lived structure.
pub trait Duplicate: Sized {
    fn duplicate(&self) -> Result<Self, X509Error>;
}

/// Structures are copied by re-encoding, so the copy shares nothing with its source.
impl<T> Duplicate for T
where
    T: Encode + DecodeOwned,
{
    fn duplicate(&self) -> Result<Self, X509Error> {
        let der = self.to_der().map_err(|err| {
            X509Error::op(X509ErrorKind::Allocation, "duplicate", err)
        })?;

        T::from_der(&der).map_err(|err| X509Error::op(X509ErrorKind::Allocation, "duplicate", err))
    }
}

/// What a layout accessor hands back.
#[derive(Debug)]
pub enum Native<'a, T> {
    /// Points into the certificate; must be duplicated before it is kept.
    Borrowed(&'a T),

    /// Produced for this call; the receiver owns it.
    Fresh(T),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Ownership {
    Borrowed,
    Fresh,
}

/// Logical accessors whose results cross the boundary as structures.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Accessor {
    SerialNumber,
    SubjectName,
    IssuerName,
    Pubkey,
    Extension,
}

pub static CLASSIFICATION: [(Accessor, Ownership); 5] = [
    (Accessor::SerialNumber, Ownership::Borrowed),
    (Accessor::SubjectName, Ownership::Borrowed),
    (Accessor::IssuerName, Ownership::Borrowed),
    (Accessor::Pubkey, Ownership::Fresh),
    (Accessor::Extension, Ownership::Borrowed),
];

pub fn classify(accessor: Accessor) -> Ownership {
    CLASSIFICATION
        .iter()
        .find(|(candidate, _)| *candidate == accessor)
        .map(|(_, ownership)| *ownership)
        .unwrap_or_else(|| unreachable!("{:?} has no ownership classification", accessor))
}

/// Turns an accessor result into an owned value according to [`CLASSIFICATION`].
///
/// # Panics
///
/// When the layout returned a variant that disagrees with the table. That is
/// a bug in the layout, not a condition callers can recover from.
pub fn adopt<T: Duplicate>(accessor: Accessor, native: Native<'_, T>) -> Result<Owned<T>, X509Error> {
    match (classify(accessor), native) {
        (Ownership::Borrowed, Native::Borrowed(borrowed)) => Ok(Owned::new(borrowed.duplicate()?)),
        (Ownership::Fresh, Native::Fresh(value)) => Ok(Owned::new(value)),
        (expected, _) => panic!(
            "{:?} is classified {:?} but the layout returned the other kind",
            accessor, expected
        ),
    }
}

/// Kinds of companion objects accepted at the dynamic boundary.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Kind {
    BigNum,
    Time,
    Version,
    Name,
    PKey,
    AltName,
    BasicConstraints,
    InfoAccess,
    DistributionPoints,
}

/// A caller-supplied value whose kind is only known at runtime.
#[derive(Clone, Debug)]
pub enum Value {
    BigNum(BigNum),
    Time(i64),
    Version(u8),
    Name(Name),
    PKey(PKey),
    AltName(AltName),
    BasicConstraints(BasicConstraints),
    InfoAccess(InfoAccess),
    DistributionPoints(DistributionPoints),
}

impl Value {
    pub fn kind(&self) -> Kind {
        match self {
            Value::BigNum(_) => Kind::BigNum,
            Value::Time(_) => Kind::Time,
            Value::Version(_) => Kind::Version,
            Value::Name(_) => Kind::Name,
            Value::PKey(_) => Kind::PKey,
            Value::AltName(_) => Kind::AltName,
            Value::BasicConstraints(_) => Kind::BasicConstraints,
            Value::InfoAccess(_) => Kind::InfoAccess,
            Value::DistributionPoints(_) => Kind::DistributionPoints,
        }
    }

    pub fn is_of_kind(&self, kind: Kind) -> bool {
        self.kind() == kind
    }
}

pub fn is_of_type(value: &Value, kind: Kind) -> bool {
    value.is_of_kind(kind)
}

/// Implemented by every companion object that can travel inside a [`Value`].
pub trait Typed {
    const KIND: Kind;

    fn is_of_kind(value: &Value) -> bool {
        value.is_of_kind(Self::KIND)
    }
}

macro_rules! impl_typed {
    ($($ty:ty => $kind:ident),* $(,)?) => {
        $(
            impl Typed for $ty {
                const KIND: Kind = Kind::$kind;
            }

            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::$kind(value)
                }
            }
        )*
    };
}

impl_typed! {
    BigNum => BigNum,
    Name => Name,
    PKey => PKey,
    AltName => AltName,
    BasicConstraints => BasicConstraints,
    InfoAccess => InfoAccess,
    DistributionPoints => DistributionPoints,
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use x509_cert::name::RdnSequence;

    use super::*;

    static RELEASED: AtomicUsize = AtomicUsize::new(0);

    fn counting_release(_: Vec<u8>) {
        RELEASED.fetch_add(1, Ordering::SeqCst);
    }

    #[test]
    fn release_runs_exactly_once() {
        let before = RELEASED.load(Ordering::SeqCst);
        {
            let mut owned = Owned::own(vec![1u8, 2, 3], counting_release);
            owned.push(4);
            assert_eq!(owned.len(), 4);
        }
        assert_eq!(RELEASED.load(Ordering::SeqCst), before + 1);
    }

    #[test]
    fn release_runs_on_error_path() {
        fn fails(owned: Owned<Vec<u8>>) -> Result<(), X509Error> {
            if owned.is_empty() {
                return Err(X509Error::new(X509ErrorKind::Unknown, "empty"));
            }
            Ok(())
        }

        let before = RELEASED.load(Ordering::SeqCst);
        assert!(fails(Owned::own(vec![], counting_release)).is_err());
        assert_eq!(RELEASED.load(Ordering::SeqCst), before + 1);
    }

    #[test]
    fn every_accessor_is_classified() {
        for accessor in [
            Accessor::SerialNumber,
            Accessor::SubjectName,
            Accessor::IssuerName,
            Accessor::Pubkey,
            Accessor::Extension,
        ] {
            classify(accessor);
        }
        assert_eq!(classify(Accessor::Pubkey), Ownership::Fresh);
        assert_eq!(classify(Accessor::SubjectName), Ownership::Borrowed);
    }

    #[test]
    fn adopt_copies_borrowed_values() {
        let source = RdnSequence::default();
        let owned = adopt(Accessor::SubjectName, Native::Borrowed(&source)).unwrap();

        assert_eq!(*owned, source);
    }

    #[test]
    #[should_panic(expected = "classified")]
    fn adopt_rejects_misclassified_results() {
        let _ = adopt(Accessor::SubjectName, Native::Fresh(RdnSequence::default()));
    }

    #[test]
    fn value_kind_checks() {
        let value = Value::from(BigNum::from(7u64));

        assert!(is_of_type(&value, Kind::BigNum));
        assert!(!value.is_of_kind(Kind::Name));
        assert!(BigNum::is_of_kind(&value));
        assert!(!Name::is_of_kind(&value));
    }
}
