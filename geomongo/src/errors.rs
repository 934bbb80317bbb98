use backtrace::Backtrace;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::result::Result;

use crate::common::{atomic, Atomic};

/// Error kinds for geomongo operations.
///
/// Each kind names one category of failure so callers can decide whether to
/// skip a document, abort a query or give up on the store altogether.
///
/// # Examples
///
/// ```rust
/// use geomongo::errors::{ErrorKind, GeoMongoError, GeoMongoResult};
///
/// fn example() -> GeoMongoResult<()> {
///     Err(GeoMongoError::new("no geometry at 'loc'", ErrorKind::GeometryPathNotFound))
/// }
///
/// assert_eq!(example().unwrap_err().kind(), &ErrorKind::GeometryPathNotFound);
/// ```
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ErrorKind {
    // Geometry codec errors
    /// The `type` tag is unknown or the coordinates have the wrong arity
    InvalidGeometryEncoding,
    /// The geometry variant has no wire representation in the chosen codec
    UnsupportedGeometryVariant,

    // Collection mapper errors
    /// The document does not have the shape the mapper requires
    MalformedDocument,
    /// The geometry field of a document cannot be determined unambiguously
    AmbiguousGeometryField,
    /// The configured geometry path resolves to nothing
    GeometryPathNotFound,

    // Filter errors
    /// The predicate cannot be expressed as a native query
    UnsupportedPredicate,

    // Writer errors
    /// `write()` was called before `next()`
    NoCurrentFeature,
    /// The operation is not available for this capability
    UnsupportedOperation,

    // Store errors
    /// The store could not be reached
    ConnectionFailed,
    /// The store rejected the supplied credentials
    AuthenticationFailed,
    /// Generic IO failure while talking to the store
    IOError,
    /// The cursor was used after it had been closed
    CursorClosed,
    /// The requested collection does not exist
    CollectionNotFound,

    // Validation errors
    /// The operation is not valid in the current context
    InvalidOperation,
    /// Generic validation error
    ValidationError,
    /// Invalid data type for the operation
    InvalidDataType,
    /// Error encoding or decoding data
    EncodingError,

    /// Internal error (usually indicates a bug)
    InternalError,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::InvalidGeometryEncoding => write!(f, "Invalid geometry encoding"),
            ErrorKind::UnsupportedGeometryVariant => write!(f, "Unsupported geometry variant"),
            ErrorKind::MalformedDocument => write!(f, "Malformed document"),
            ErrorKind::AmbiguousGeometryField => write!(f, "Ambiguous geometry field"),
            ErrorKind::GeometryPathNotFound => write!(f, "Geometry path not found"),
            ErrorKind::UnsupportedPredicate => write!(f, "Unsupported predicate"),
            ErrorKind::NoCurrentFeature => write!(f, "No current feature"),
            ErrorKind::UnsupportedOperation => write!(f, "Unsupported operation"),
            ErrorKind::ConnectionFailed => write!(f, "Connection failed"),
            ErrorKind::AuthenticationFailed => write!(f, "Authentication failed"),
            ErrorKind::IOError => write!(f, "IO error"),
            ErrorKind::CursorClosed => write!(f, "Cursor closed"),
            ErrorKind::CollectionNotFound => write!(f, "Collection not found"),
            ErrorKind::InvalidOperation => write!(f, "Invalid operation"),
            ErrorKind::ValidationError => write!(f, "Validation error"),
            ErrorKind::InvalidDataType => write!(f, "Invalid data type"),
            ErrorKind::EncodingError => write!(f, "Encoding error"),
            ErrorKind::InternalError => write!(f, "Internal error"),
        }
    }
}

/// The error type of this crate.
///
/// `GeoMongoError` carries a message, an [ErrorKind] and an optional cause so
/// that store failures can be reported with the underlying reason attached.
/// A backtrace is captured at construction and printed by `Debug` when there
/// is no cause.
#[derive(Clone)]
pub struct GeoMongoError {
    message: String,
    error_kind: ErrorKind,
    cause: Option<Box<GeoMongoError>>,
    backtrace: Atomic<Backtrace>,
}

impl GeoMongoError {
    /// Creates a new error with the specified message and kind.
    pub fn new(message: &str, error_kind: ErrorKind) -> Self {
        GeoMongoError {
            message: message.to_string(),
            error_kind,
            cause: None,
            backtrace: atomic(Backtrace::new()),
        }
    }

    /// Creates a new error that wraps `cause`.
    pub fn new_with_cause(message: &str, error_kind: ErrorKind, cause: GeoMongoError) -> Self {
        GeoMongoError {
            message: message.to_string(),
            error_kind,
            cause: Some(Box::new(cause)),
            backtrace: atomic(Backtrace::new()),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.error_kind
    }

    pub fn cause(&self) -> Option<&GeoMongoError> {
        self.cause.as_deref()
    }
}

impl Display for GeoMongoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Debug for GeoMongoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.cause {
            Some(cause) => write!(f, "{}\nCaused by: {:?}", self.message, cause),
            None => write!(f, "{}\n{:?}", self.message, self.backtrace.read()),
        }
    }
}

impl Error for GeoMongoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.cause {
            Some(cause) => Some(cause.as_ref()),
            None => None,
        }
    }
}

/// Shorthand for `Result<T, GeoMongoError>`.
pub type GeoMongoResult<T> = Result<T, GeoMongoError>;

impl From<std::io::Error> for GeoMongoError {
    fn from(err: std::io::Error) -> Self {
        let error_kind = match err.kind() {
            std::io::ErrorKind::ConnectionRefused
            | std::io::ErrorKind::ConnectionReset
            | std::io::ErrorKind::ConnectionAborted
            | std::io::ErrorKind::NotConnected => ErrorKind::ConnectionFailed,
            _ => ErrorKind::IOError,
        };
        GeoMongoError::new(&format!("IO error: {}", err), error_kind)
    }
}

impl From<serde_json::Error> for GeoMongoError {
    fn from(err: serde_json::Error) -> Self {
        GeoMongoError::new(&format!("JSON error: {}", err), ErrorKind::EncodingError)
    }
}

impl From<regex::Error> for GeoMongoError {
    fn from(err: regex::Error) -> Self {
        GeoMongoError::new(&format!("Invalid pattern: {}", err), ErrorKind::ValidationError)
    }
}

impl From<argon2::password_hash::Error> for GeoMongoError {
    fn from(err: argon2::password_hash::Error) -> Self {
        let error_kind = match err {
            argon2::password_hash::Error::Password => ErrorKind::AuthenticationFailed,
            _ => ErrorKind::EncodingError,
        };
        GeoMongoError::new(&format!("Password hash error: {}", err), error_kind)
    }
}

impl From<std::num::ParseIntError> for GeoMongoError {
    fn from(err: std::num::ParseIntError) -> Self {
        GeoMongoError::new(
            &format!("Integer parsing error: {}", err),
            ErrorKind::InvalidDataType,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_error_has_no_cause() {
        let error = GeoMongoError::new("bad geometry", ErrorKind::InvalidGeometryEncoding);
        assert_eq!(error.message(), "bad geometry");
        assert_eq!(error.kind(), &ErrorKind::InvalidGeometryEncoding);
        assert!(error.cause().is_none());
        assert!(error.source().is_none());
    }

    #[test]
    fn cause_is_chained() {
        let cause = GeoMongoError::new("connection refused", ErrorKind::IOError);
        let error = GeoMongoError::new_with_cause(
            "could not open store",
            ErrorKind::ConnectionFailed,
            cause,
        );
        assert_eq!(error.cause().unwrap().message(), "connection refused");
        assert!(error.source().is_some());

        let debug = format!("{:?}", error);
        assert!(debug.contains("Caused by: connection refused"));
    }

    #[test]
    fn display_prints_message_only() {
        let error = GeoMongoError::new("no current feature", ErrorKind::NoCurrentFeature);
        assert_eq!(error.to_string(), "no current feature");
    }

    #[test]
    fn io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let error: GeoMongoError = io.into();
        assert_eq!(error.kind(), &ErrorKind::ConnectionFailed);

        let io = std::io::Error::other("disk");
        let error: GeoMongoError = io.into();
        assert_eq!(error.kind(), &ErrorKind::IOError);
    }

    #[test]
    fn json_error_conversion() {
        let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let error: GeoMongoError = err.into();
        assert_eq!(error.kind(), &ErrorKind::EncodingError);
    }

    #[test]
    fn error_kind_display() {
        assert_eq!(ErrorKind::NoCurrentFeature.to_string(), "No current feature");
        assert_eq!(ErrorKind::GeometryPathNotFound.to_string(), "Geometry path not found");
    }
}
