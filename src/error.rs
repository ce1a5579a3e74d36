use thiserror::Error;

/// The error type for access control requests.
#[derive(Debug, Error)]
pub enum Error {
    /// A canned ACL string outside of the recognized keywords.
    #[error("invalid x-amz-acl: {value:?} is not a canned ACL")]
    InvalidAclKeyword {
        /// The rejected keyword.
        value: String,
    },
    /// A grantee whose fields match none of the grantee types.
    #[error("invalid grantee: fields {fields:?} match no grantee type")]
    InvalidGranteeShape {
        /// Names of the fields that were present.
        fields: Vec<String>,
    },
    /// An object key that cannot address an object.
    #[error("invalid object key: {value:?}")]
    InvalidObjectKey {
        /// The rejected key.
        value: String,
    },
    /// A permission outside of the five ACL permission levels.
    #[error("invalid permission: {value:?}")]
    InvalidPermission {
        /// The rejected permission.
        value: String,
    },
    /// The service answered with something other than `200 OK`.
    #[error("service error ({status}): {code}: {message}")]
    Service {
        /// HTTP status returned by the service.
        status: http::StatusCode,
        /// S3 error code, empty when the body carried none.
        code: String,
        /// Message provided by the service.
        message: String,
    },
    /// The transport failed to deliver the request.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
    /// Malformed XML document.
    #[error("XML error: {0}")]
    Xml(String),
    /// Malformed JSON policy input.
    #[error("JSON error: {0}")]
    Json(#[from] json::Error),
    /// A value could not be used in an HTTP request.
    #[error("HTTP error: {0}")]
    Http(#[from] http::Error),
    /// Unusable client configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Failure reported by a [`Transport`](crate::storage::Transport).
#[derive(Debug, Error)]
pub enum TransportError {
    /// Error raised by the bundled `reqwest` transport.
    #[cfg(feature = "reqwest-transport")]
    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),
    /// Error raised by a custom transport.
    #[error("{0}")]
    Other(String),
}

/// A `Result` alias defaulting to this crate's [`Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;

impl From<std::convert::Infallible> for Error {
    fn from(never: std::convert::Infallible) -> Self {
        match never {}
    }
}

impl From<http::header::InvalidHeaderValue> for Error {
    fn from(err: http::header::InvalidHeaderValue) -> Self {
        Error::Http(err.into())
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::Xml(err.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for Error {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        Error::Xml(err.to_string())
    }
}

impl From<quick_xml::DeError> for Error {
    fn from(err: quick_xml::DeError) -> Self {
        Error::Xml(err.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Xml(err.to_string())
    }
}
