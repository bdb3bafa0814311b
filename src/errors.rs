use std::fmt;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum X509ErrorKind {
    /// Wrong companion object kind passed to a setter.
    ArgumentType,

    /// The toolkit reported failure for an operation.
    NativeOperation,

    /// Input bytes did not parse as a certificate or extension.
    Decode,

    /// Textual extension or object name did not resolve.
    UnknownIdentifier,

    /// Digest name did not resolve.
    UnknownDigest,

    /// A required copy or allocation could not be produced.
    Allocation,

    /// Unsupported Algorithm.
    UnsupportedAlgorithm,

    /// Export as PEM Error.
    ExportPemError,

    /// Invalid configuration value.
    InvalidConfig,

    /// Unknown Error.
    Unknown,
}

#[derive(Debug)]
pub struct X509Error {
    pub kind: X509ErrorKind,
    pub message: String,
}

impl fmt::Display for X509Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for X509Error {}

impl X509Error {
    pub fn new(kind: X509ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Error tagged with the name of the operation that produced it.
    pub fn op(kind: X509ErrorKind, op: &str, detail: impl fmt::Display) -> Self {
        Self {
            kind,
            message: format!("{}: {}", op, detail),
        }
    }
}

pub trait X509Result<T> {
    fn map_app_err(self: Self, kind: X509ErrorKind) -> Result<T, X509Error>;
    fn map_op_err(self: Self, kind: X509ErrorKind, op: &str) -> Result<T, X509Error>;
    fn map_unknown_err(self: Self) -> Result<T, X509Error>;
}

impl<T, E> X509Result<T> for std::result::Result<T, E>
where
    E: std::error::Error + 'static,
{
    fn map_app_err(self: Self, kind: X509ErrorKind) -> Result<T, X509Error> {
        self.map_err(|err| X509Error {
            kind: kind,
            message: err.to_string(),
        })
    }

    fn map_op_err(self: Self, kind: X509ErrorKind, op: &str) -> Result<T, X509Error> {
        self.map_err(|err| X509Error::op(kind, op, err))
    }

    fn map_unknown_err(self: Self) -> Result<T, X509Error> {
        self.map_app_err(X509ErrorKind::Unknown)
    }
}
