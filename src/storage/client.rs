use std::env;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use http::StatusCode;
use serde::Deserialize;

use crate::storage::api::{Acl, AclRequestOptions};
use crate::storage::request::{self, Request, Response, Scheme};
use crate::storage::{Error, Transport};

/// Where the service lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Service host; buckets are addressed as `<bucket>.<host>`.
    pub host: String,
    pub scheme: Scheme,
}

impl ClientConfig {
    pub fn new(host: impl Into<String>) -> ClientConfig {
        ClientConfig {
            host: host.into(),
            scheme: Scheme::default(),
        }
    }

    /// Build a configuration from the environment.
    ///
    /// The host is looked up in the `S3_HOST` environment variable and the
    /// scheme in `S3_SCHEME`, both falling back to the defaults.
    pub fn from_env() -> Result<ClientConfig, Error> {
        let host = env::var("S3_HOST").unwrap_or_else(|_| Client::DEFAULT_HOST.to_string());
        let scheme = match env::var("S3_SCHEME") {
            Ok(scheme) => scheme.parse()?,
            Err(_) => Scheme::default(),
        };
        if host.is_empty() {
            return Err(Error::Config("S3_HOST is empty".to_string()));
        }
        Ok(ClientConfig { host, scheme })
    }

    pub fn with_scheme(mut self, scheme: Scheme) -> ClientConfig {
        self.scheme = scheme;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> ClientConfig {
        ClientConfig::new(Client::DEFAULT_HOST)
    }
}

/// The S3 access control client, tied to a specific service host.
#[derive(Clone)]
pub struct Client {
    pub(crate) config: ClientConfig,
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) clock: fn() -> DateTime<Utc>,
}

/// S3 `<Error>` response document.
#[derive(Debug, Deserialize)]
#[serde(rename = "Error")]
struct ServiceErrorBody {
    #[serde(rename = "Code")]
    code: String,
    #[serde(rename = "Message")]
    message: Option<String>,
}

impl Client {
    pub(crate) const DEFAULT_HOST: &'static str = "s3.amazonaws.com";

    /// Create a new client sending its requests through `transport`.
    pub fn new(config: ClientConfig, transport: impl Transport + 'static) -> Client {
        Client {
            config,
            transport: Arc::new(transport),
            clock: Utc::now,
        }
    }

    /// Replace the clock used for the `Date` header.
    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Client {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Change the access control list of an object.
    ///
    /// `acl` is either an [`AccessControlPolicy`](crate::storage::AccessControlPolicy),
    /// a [`CannedAcl`](crate::storage::CannedAcl) or a canned ACL keyword such as
    /// `"public-read"`. Keywords are validated before anything is sent.
    ///
    /// An empty `object` is rejected with [`Error::InvalidObjectKey`]; use
    /// [`put_bucket_acl`](Client::put_bucket_acl) to change the bucket itself.
    pub async fn put_object_acl<A>(
        &self,
        bucket: &str,
        object: &str,
        acl: A,
        options: AclRequestOptions,
    ) -> Result<Response, Error>
    where
        A: TryInto<Acl>,
        Error: From<A::Error>,
    {
        if object.is_empty() {
            return Err(Error::InvalidObjectKey {
                value: object.to_string(),
            });
        }
        let acl: Acl = acl.try_into()?;
        let request = request::acl_request(
            self.config.scheme,
            &self.config.host,
            bucket,
            Some(object),
            &acl,
            &options,
            (self.clock)(),
        )?;
        self.dispatch(request).await
    }

    /// Change the access control list of a bucket.
    pub async fn put_bucket_acl<A>(&self, bucket: &str, acl: A) -> Result<Response, Error>
    where
        A: TryInto<Acl>,
        Error: From<A::Error>,
    {
        let acl: Acl = acl.try_into()?;
        let request = request::acl_request(
            self.config.scheme,
            &self.config.host,
            bucket,
            None,
            &acl,
            &AclRequestOptions::default(),
            (self.clock)(),
        )?;
        self.dispatch(request).await
    }

    async fn dispatch(&self, request: Request) -> Result<Response, Error> {
        tracing::debug!(
            method = %request.method,
            host = %request.host,
            path = %request.path,
            body_len = request.body.len(),
            "sending ACL request"
        );
        tracing::trace!(body = %String::from_utf8_lossy(&request.body));

        let response = self.transport.send(request).await?;
        if response.status != StatusCode::OK {
            let error = service_error(&response);
            tracing::warn!(status = %response.status, "ACL request rejected: {}", error);
            return Err(error);
        }
        Ok(response)
    }
}

fn service_error(response: &Response) -> Error {
    let body = String::from_utf8_lossy(&response.body);
    match quick_xml::de::from_str::<ServiceErrorBody>(&body) {
        Ok(error) => Error::Service {
            status: response.status,
            code: error.code,
            message: error.message.unwrap_or_default(),
        },
        Err(_) => Error::Service {
            status: response.status,
            code: String::new(),
            message: body.into_owned(),
        },
    }
}
