use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use url::Url;

use crate::{
    error::NetError,
    timeout::TimeoutNet,
    types::{Headers, HttpResponse},
};

#[cfg_attr(feature = "mock", unimock::unimock(api = NetMock))]
#[async_trait]
pub trait Net: Send + Sync {
    /// Fetch a URL and return the full response, whatever its status.
    ///
    /// `Err` means the transport failed (connection, timeout), never that
    /// the server answered with a non-success status.
    async fn get(&self, url: Url, headers: Option<Headers>) -> Result<HttpResponse, NetError>;

    /// Fetch a URL and return its body. Non-success statuses are errors.
    async fn get_bytes(&self, url: Url, headers: Option<Headers>) -> Result<Bytes, NetError>;

    /// HEAD request; returns the response headers.
    async fn head(&self, url: Url, headers: Option<Headers>) -> Result<Headers, NetError>;
}

pub trait NetExt: Net + Sized {
    /// Add timeout layer
    fn with_timeout(self, timeout: Duration) -> TimeoutNet<Self> {
        TimeoutNet::new(self, timeout)
    }
}

impl<T: Net> NetExt for T {}
