use std::fmt::Display;

use der::{
    asn1::{Any, BmpString, Ia5StringRef, PrintableStringRef, SetOfVec, TeletexStringRef, Utf8StringRef},
    oid::{db::DB, ObjectIdentifier},
    Decode, Encode, Tag, Tagged,
};
use x509_cert::{
    attr::AttributeTypeAndValue,
    name::{RdnSequence, RelativeDistinguishedName},
};

use crate::{
    errors::{X509Error, X509ErrorKind, X509Result},
    ownership::{Duplicate, Owned},
};

/// Attribute short names accepted by [`Name::add`] ahead of the OID database.
static ATTRIBUTES: &[(&str, ObjectIdentifier)] = &[
    ("CN", ObjectIdentifier::new_unwrap("2.5.4.3")),
    ("SN", ObjectIdentifier::new_unwrap("2.5.4.4")),
    ("serialNumber", ObjectIdentifier::new_unwrap("2.5.4.5")),
    ("C", ObjectIdentifier::new_unwrap("2.5.4.6")),
    ("L", ObjectIdentifier::new_unwrap("2.5.4.7")),
    ("ST", ObjectIdentifier::new_unwrap("2.5.4.8")),
    ("street", ObjectIdentifier::new_unwrap("2.5.4.9")),
    ("O", ObjectIdentifier::new_unwrap("2.5.4.10")),
    ("OU", ObjectIdentifier::new_unwrap("2.5.4.11")),
    ("title", ObjectIdentifier::new_unwrap("2.5.4.12")),
    ("GN", ObjectIdentifier::new_unwrap("2.5.4.42")),
    ("emailAddress", ObjectIdentifier::new_unwrap("1.2.840.113549.1.9.1")),
    ("DC", ObjectIdentifier::new_unwrap("0.9.2342.19200300.100.1.25")),
    ("UID", ObjectIdentifier::new_unwrap("0.9.2342.19200300.100.1.1")),
];

/// A distinguished name.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Name(Owned<RdnSequence>);

impl Default for Name {
    fn default() -> Self {
        Self::new()
    }
}

impl Name {
    pub fn new() -> Self {
        Self(Owned::new(RdnSequence::default()))
    }

    pub(crate) fn from_owned(owned: Owned<RdnSequence>) -> Self {
        Self(owned)
    }

    pub(crate) fn as_native(self: &Self) -> &RdnSequence {
        &self.0
    }

    /// Appends `field=value` as its own RDN.
    ///
    /// `field` is an attribute short name (`CN`, `O`, ...), any name the OID
    /// database knows (`commonName`), or a dotted OID.
    pub fn add(self: &mut Self, field: &str, value: &str) -> Result<&mut Self, X509Error> {
        let oid = attribute_oid(field)?;
        let value = Any::new(Tag::Utf8String, value.as_bytes())
            .map_op_err(X509ErrorKind::NativeOperation, "X509_NAME_add_entry_by_txt")?;

        let mut set = SetOfVec::new();
        set.insert(AttributeTypeAndValue { oid, value })
            .map_op_err(X509ErrorKind::NativeOperation, "X509_NAME_add_entry_by_txt")?;
        let rdns: &mut RdnSequence = &mut self.0;
        rdns.0.push(RelativeDistinguishedName(set));

        Ok(self)
    }

    /// First value recorded for `field`.
    pub fn find(self: &Self, field: &str) -> Result<Option<String>, X509Error> {
        let oid = attribute_oid(field)?;

        Ok(self
            .as_native()
            .0
            .iter()
            .flat_map(|rdn| rdn.0.iter())
            .find(|atv| atv.oid == oid)
            .map(|atv| attribute_value(&atv.value).unwrap_or_else(|| hex_value(&atv.value))))
    }

    /// `(key, value)` for every attribute, in encoding order.
    pub fn entries(self: &Self) -> Vec<(String, String)> {
        self.as_native()
            .0
            .iter()
            .flat_map(|rdn| rdn.0.iter())
            .map(|atv| {
                let value = attribute_value(&atv.value).unwrap_or_else(|| hex_value(&atv.value));
                (attribute_key(&atv.oid), value)
            })
            .collect()
    }

    pub fn len(self: &Self) -> usize {
        self.as_native().0.len()
    }

    pub fn is_empty(self: &Self) -> bool {
        self.as_native().0.is_empty()
    }

    pub fn duplicate(self: &Self) -> Result<Self, X509Error> {
        Ok(Self(Owned::new(self.as_native().duplicate()?)))
    }

    pub fn to_der(self: &Self) -> Result<Vec<u8>, X509Error> {
        self.as_native().to_der().map_unknown_err()
    }
}

impl Display for Name {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let rdns = self
            .as_native()
            .0
            .iter()
            .map(format_rdn)
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "{}", rdns)
    }
}

fn attribute_oid(field: &str) -> Result<ObjectIdentifier, X509Error> {
    if let Some((_, oid)) = ATTRIBUTES.iter().find(|(short, _)| *short == field) {
        return Ok(*oid);
    }

    if let Some(oid) = DB.by_name(field) {
        return Ok(*oid);
    }

    ObjectIdentifier::new(field).map_err(|_| X509Error {
        kind: X509ErrorKind::UnknownIdentifier,
        message: format!("unknown name attribute {}", field),
    })
}

/// Shortest known name for `oid`, upper-cased, or the dotted form.
fn attribute_key(oid: &ObjectIdentifier) -> String {
    DB.find_names_for_oid(*oid)
        .min_by_key(|name| name.len())
        .map(|name| name.to_ascii_uppercase())
        .unwrap_or_else(|| oid.to_string())
}

fn attribute_value(value: &Any) -> Option<String> {
    match value.tag() {
        Tag::PrintableString => PrintableStringRef::try_from(value).ok().map(|s| s.to_string()),
        Tag::Utf8String => Utf8StringRef::try_from(value).ok().map(|s| s.to_string()),
        Tag::Ia5String => Ia5StringRef::try_from(value).ok().map(|s| s.to_string()),
        Tag::TeletexString => TeletexStringRef::try_from(value).ok().map(|s| s.to_string()),
        // UTF-16
        Tag::BmpString => value
            .to_der()
            .ok()
            .and_then(|der| BmpString::from_der(&der).ok())
            .map(|s| s.to_string()),
        _ => None,
    }
}

fn hex_value(value: &Any) -> String {
    let der = value.to_der().unwrap_or_default();

    der.iter()
        .fold("#".to_owned(), |acc, c| acc + &format!("{:02x}", c))
}

/// RFC 4514 escaping.
fn escape_value(val: &str) -> String {
    let mut val_ss = String::new();
    let mut iter = val.char_indices().peekable();

    while let Some((i, c)) = iter.next() {
        match c {
            '#' if i == 0 => val_ss.push_str("\\#"),
            ' ' if i == 0 || iter.peek().is_none() => val_ss.push_str("\\ "),
            '"' | '+' | ',' | ';' | '<' | '>' | '\\' => {
                val_ss = val_ss + &format!("\\{}", c);
            }
            '\x00'..='\x1f' | '\x7f' => val_ss = val_ss + &format!("\\{:02x}", c as u8),
            _ => val_ss.push(c),
        }
    }

    val_ss
}

fn format_rdn(rdn: &RelativeDistinguishedName) -> String {
    rdn.0
        .iter()
        .map(|tv| {
            let val_ss = match attribute_value(&tv.value) {
                Some(val) => escape_value(&val),
                None => hex_value(&tv.value),
            };

            format!("{}={}", attribute_key(&tv.oid), val_ss)
        })
        .collect::<Vec<_>>()
        .join(" + ")
}
