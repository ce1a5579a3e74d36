//! Asynchronous access control requests for S3-compatible object storage.
//!
//! The [`storage::Client`] turns an access control policy, or one of the
//! canned ACL keywords, into a fully-formed `PUT ?acl` request and hands
//! it to a pluggable [`storage::Transport`].
//!
//! ```no_run
//! # async fn run() -> Result<(), s3_acl::Error> {
//! use s3_acl::storage::{AclRequestOptions, Client, ClientConfig, ReqwestTransport};
//!
//! let client = Client::new(ClientConfig::from_env()?, ReqwestTransport::new()?);
//! client
//!     .put_object_acl("mybucket", "key.txt", "public-read", AclRequestOptions::default())
//!     .await?;
//! # Ok(())
//! # }
//! ```

/// Error types.
pub mod error;
/// Access control requests against S3-compatible storage.
pub mod storage;

pub use error::{Error, Result};
