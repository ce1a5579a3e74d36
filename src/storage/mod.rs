mod api;
mod checksum;
mod client;
mod request;
mod transport;
mod xml;

pub use self::api::*;
pub use self::checksum::{Checksum, Hasher};
pub use self::client::{Client, ClientConfig};
pub use self::request::{Request, Response, Scheme};
#[cfg(feature = "reqwest-transport")]
pub use self::transport::ReqwestTransport;
pub use self::transport::Transport;

pub use crate::error::{Error, TransportError};
