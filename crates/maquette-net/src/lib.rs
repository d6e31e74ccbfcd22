#![forbid(unsafe_code)]

mod client;
mod error;
mod timeout;
mod traits;
mod types;

pub use crate::{
    client::HttpClient,
    error::{NetError, NetResult},
    timeout::TimeoutNet,
    traits::{Net, NetExt},
    types::{Headers, HttpResponse, NetOptions},
};

#[cfg(feature = "mock")]
pub mod mock {
    pub use crate::traits::NetMock;
}
