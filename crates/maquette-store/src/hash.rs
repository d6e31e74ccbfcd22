use sha2::{Digest, Sha256};
use url::Url;

/// Filesystem key for a cache entry, derived from the request URL.
///
/// Fragments are ignored; query strings participate (a signed URL is a
/// different resource).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EntryHash([u8; 32]);

impl EntryHash {
    #[must_use]
    pub fn from_url(url: &Url) -> Self {
        let mut canonical = url.clone();
        canonical.set_fragment(None);
        let hash = Sha256::digest(canonical.as_str().as_bytes());
        Self(hash.into())
    }

    #[must_use]
    pub fn to_hex(self) -> String {
        hex::encode(self.0)
    }
}
