use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use http::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE, DATE};
use http::{Method, StatusCode};

use crate::error::Error;
use crate::storage::api::{Acl, AclRequestOptions};
use crate::storage::checksum::Hasher;
use crate::storage::xml;

pub(crate) const AMZ_ACL_HEADER: &str = "x-amz-acl";
pub(crate) const XML_CONTENT_TYPE: &str = "application/xml";
const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// URL scheme used to reach the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scheme {
    Http,
    #[default]
    Https,
}

impl Scheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }
}

impl FromStr for Scheme {
    type Err = Error;

    fn from_str(s: &str) -> Result<Scheme, Error> {
        match s {
            "http" => Ok(Scheme::Http),
            "https" => Ok(Scheme::Https),
            other => Err(Error::Config(format!("unsupported scheme: {}", other))),
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully-assembled request, ready to be signed and sent.
#[derive(Debug, Clone)]
pub struct Request {
    pub scheme: Scheme,
    pub method: Method,
    pub host: String,
    /// Percent-encoded path, starting with `/`.
    pub path: String,
    /// Query parameters in order; a `None` value renders as a bare marker.
    pub query: Vec<(String, Option<String>)>,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl Request {
    /// The value of a query parameter, `Some(None)` for a bare marker.
    pub fn query_param(&self, name: &str) -> Option<Option<&str>> {
        self.query
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_deref())
    }

    /// Render the query string, e.g. `acl&versionId=3`.
    pub fn query_string(&self) -> String {
        self.query
            .iter()
            .map(|(key, value)| match value {
                Some(value) => format!("{}={}", percent_encode(key), percent_encode(value)),
                None => percent_encode(key),
            })
            .collect::<Vec<_>>()
            .join("&")
    }

    pub fn url(&self) -> String {
        let mut url = format!("{}://{}{}", self.scheme, self.host, self.path);
        if !self.query.is_empty() {
            url.push('?');
            url.push_str(&self.query_string());
        }
        url
    }
}

/// The service's answer to a [`Request`].
#[derive(Debug, Clone)]
pub struct Response {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl Response {
    pub fn new(status: StatusCode, body: impl Into<Vec<u8>>) -> Response {
        Response {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }
}

/// Assemble a `PUT ?acl` request against `bucket` on `host`.
///
/// Targets the object `key` when given, the bucket itself otherwise.
pub(crate) fn acl_request(
    scheme: Scheme,
    host: &str,
    bucket: &str,
    key: Option<&str>,
    acl: &Acl,
    options: &AclRequestOptions,
    now: DateTime<Utc>,
) -> Result<Request, Error> {
    let mut query = vec![("acl".to_string(), None)];
    if let Some(version_id) = &options.version_id {
        query.push(("versionId".to_string(), Some(version_id.clone())));
    }

    let mut headers = HeaderMap::new();
    let body = match acl {
        Acl::Policy(policy) => {
            let body = xml::to_xml(policy)?;
            headers.insert(CONTENT_TYPE, HeaderValue::from_static(XML_CONTENT_TYPE));
            body
        }
        Acl::Canned(canned) => {
            headers.insert(
                HeaderName::from_static(AMZ_ACL_HEADER),
                HeaderValue::from_static(canned.as_str()),
            );
            Vec::new()
        }
    };

    let checksum = Hasher::Md5.checksum(&body);
    headers.insert(
        HeaderName::from_static(checksum.header_name()),
        HeaderValue::from_str(&checksum.to_string())?,
    );
    headers.insert(
        DATE,
        HeaderValue::from_str(&now.format(HTTP_DATE_FORMAT).to_string())?,
    );

    let path = match key {
        Some(key) => format!("/{}", percent_encode(key)),
        None => "/".to_string(),
    };

    Ok(Request {
        scheme,
        method: Method::PUT,
        host: format!("{}.{}", bucket, host),
        path,
        query,
        headers,
        body,
    })
}

/// Percent-encode every byte outside the RFC 3986 unreserved set.
fn percent_encode(s: &str) -> String {
    let mut result = String::with_capacity(s.len());

    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                result.push(byte as char);
            }
            _ => result.push_str(&format!("%{:02X}", byte)),
        }
    }

    result
}
